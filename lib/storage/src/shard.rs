use anyhow::{Context, Result};
use meshstat_core::RecordSink;
use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// `<out>.<n>.csv`
pub fn shard_path<P: AsRef<Path>>(output: P, shard: usize) -> PathBuf {
    let mut name = output.as_ref().as_os_str().to_owned();
    name.push(format!(".{}.csv", shard));
    PathBuf::from(name)
}

/// Line-oriented output owned by one writer thread. Each record is written
/// as its `Display` form followed by a newline.
pub struct ShardWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    records: u64,
}

impl ShardWriter {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("Failed to create shard {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
            records: 0,
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Flush and fdatasync.
    pub fn sync(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()
    }
}

impl<R: Display> RecordSink<R> for ShardWriter {
    #[inline]
    fn write(&mut self, record: &R) -> meshstat_core::Result<()> {
        writeln!(self.writer, "{}", record)?;
        self.records += 1;
        Ok(())
    }

    fn flush(&mut self) -> meshstat_core::Result<()> {
        self.sync()?;
        Ok(())
    }
}

/// Concatenates the shards into `output` in shard order, then deletes them.
/// Returns the number of bytes written.
pub fn merge_shards<P: AsRef<Path>>(output: P, shards: &[PathBuf]) -> Result<u64> {
    let output = output.as_ref();
    let file =
        File::create(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let mut out = BufWriter::new(file);
    let mut bytes = 0;
    for shard in shards {
        let mut input =
            File::open(shard).with_context(|| format!("Failed to open shard {}", shard.display()))?;
        bytes += io::copy(&mut input, &mut out)?;
    }
    out.flush()?;

    for shard in shards {
        fs::remove_file(shard)
            .with_context(|| format!("Failed to remove shard {}", shard.display()))?;
    }
    tracing::info!(
        "Merged {} shards into {} ({} bytes)",
        shards.len(),
        output.display(),
        bytes
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_naming() {
        assert_eq!(shard_path("out/sims", 1), PathBuf::from("out/sims.1.csv"));
        assert_eq!(shard_path("sims.csv", 0), PathBuf::from("sims.csv.0.csv"));
    }

    #[test]
    fn test_write_then_merge_in_shard_order() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("sims.csv");
        let paths: Vec<PathBuf> = (0..3).map(|n| shard_path(&output, n)).collect();

        for (n, path) in paths.iter().enumerate() {
            let mut shard = ShardWriter::create(path).unwrap();
            for i in 0..2 {
                RecordSink::<String>::write(&mut shard, &format!("{},{}", n, i)).unwrap();
            }
            RecordSink::<String>::flush(&mut shard).unwrap();
            assert_eq!(shard.records(), 2);
        }

        let bytes = merge_shards(&output, &paths).unwrap();
        let merged = fs::read_to_string(&output).unwrap();
        assert_eq!(merged, "0,0\n0,1\n1,0\n1,1\n2,0\n2,1\n");
        assert_eq!(bytes, merged.len() as u64);
        assert!(paths.iter().all(|p| !p.exists()));
    }

    #[test]
    fn test_missing_shard_fails() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");
        let err = merge_shards(&output, &[dir.path().join("gone.0.csv")]).unwrap_err();
        assert!(err.to_string().contains("gone.0.csv"));
    }
}

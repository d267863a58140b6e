// Co-occurrence matrix snapshots: bincode, gzip, written atomically, with a
// SHA-256 sidecar checked on load.
use anyhow::{anyhow, bail, Context, Result};
use atomicwrites::{AllowOverwrite, AtomicFile};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use meshstat_cooccurrence::{CooccurrenceMatrix, DocumentTally};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixSnapshot {
    pub terms: Vec<String>,
    pub dim: usize,
    /// Row-major cells.
    pub cells: Vec<u64>,
    /// Per-term document counts.
    pub document_counts: Vec<u64>,
    pub documents: u64,
    pub created_at: DateTime<Utc>,
}

impl MatrixSnapshot {
    pub fn from_matrix(matrix: &CooccurrenceMatrix) -> Self {
        Self {
            terms: matrix.terms().to_vec(),
            dim: matrix.dim(),
            cells: matrix.to_row_major(),
            document_counts: matrix.tally().counts.clone(),
            documents: matrix.documents(),
            created_at: Utc::now(),
        }
    }

    pub fn into_matrix(self) -> Result<CooccurrenceMatrix> {
        if self.dim != self.terms.len() {
            bail!(
                "Snapshot declares {} terms but lists {}",
                self.dim,
                self.terms.len()
            );
        }
        let tally = DocumentTally {
            counts: self.document_counts,
            documents: self.documents,
        };
        Ok(CooccurrenceMatrix::from_row_major(self.terms, self.cells, tally)?)
    }
}

/// `<path>.sha256`
pub fn checksum_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let mut name = path.as_ref().as_os_str().to_owned();
    name.push(".sha256");
    PathBuf::from(name)
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    AtomicFile::new(path, AllowOverwrite)
        .write(|f| f.write_all(bytes))
        .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))
}

/// Saves `matrix` to `path` and its checksum to the sidecar. Returns the
/// hex digest of the compressed file.
pub fn save_matrix<P: AsRef<Path>>(path: P, matrix: &CooccurrenceMatrix) -> Result<String> {
    let path = path.as_ref();
    let snapshot = MatrixSnapshot::from_matrix(matrix);

    let data = bincode::serialize(&snapshot)
        .map_err(|e| anyhow!("Serialization error: {}", e))?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&data)?;
    let compressed = encoder.finish()?;

    let checksum = format!("{:x}", Sha256::digest(&compressed));
    atomic_write(path, &compressed)?;
    atomic_write(&checksum_path(path), format!("{}\n", checksum).as_bytes())?;

    tracing::info!(
        "Saved {}x{} co-occurrence matrix to {} ({} bytes, created {})",
        snapshot.dim,
        snapshot.dim,
        path.display(),
        compressed.len(),
        snapshot.created_at.format("%Y-%m-%dT%H:%M:%SZ")
    );
    Ok(checksum)
}

pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<MatrixSnapshot> {
    let path = path.as_ref();
    let compressed =
        fs::read(path).with_context(|| format!("Failed to read snapshot {}", path.display()))?;

    let sidecar = checksum_path(path);
    let expected = fs::read_to_string(&sidecar)
        .with_context(|| format!("Failed to read checksum {}", sidecar.display()))?;
    let actual = format!("{:x}", Sha256::digest(&compressed));
    if expected.trim() != actual {
        bail!(
            "Checksum mismatch for {}: expected {}, got {}",
            path.display(),
            expected.trim(),
            actual
        );
    }

    let mut data = Vec::new();
    GzDecoder::new(compressed.as_slice()).read_to_end(&mut data)?;
    let snapshot: MatrixSnapshot = bincode::deserialize(&data)
        .map_err(|e| anyhow!("Deserialization error: {}", e))?;
    Ok(snapshot)
}

/// Loads and verifies a snapshot, rebuilding the matrix.
pub fn load_matrix<P: AsRef<Path>>(path: P) -> Result<CooccurrenceMatrix> {
    load_snapshot(path)?.into_matrix()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn matrix() -> CooccurrenceMatrix {
        CooccurrenceMatrix::new(
            vec!["a".into(), "b".into(), "c".into()],
            arr2(&[[2u64, 1, 1], [1, 2, 1], [1, 1, 2]]),
            DocumentTally {
                counts: vec![2, 2, 2],
                documents: 3,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cooc.bin.gz");

        let checksum = save_matrix(&path, &matrix()).unwrap();
        assert_eq!(checksum.len(), 64);
        assert_eq!(
            fs::read_to_string(checksum_path(&path)).unwrap().trim(),
            checksum
        );

        let loaded = load_matrix(&path).unwrap();
        assert_eq!(loaded, matrix());
        assert_eq!(loaded.documents(), 3);
    }

    #[test]
    fn test_corrupted_snapshot_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cooc.bin.gz");
        save_matrix(&path, &matrix()).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, &bytes).unwrap();

        let err = load_matrix(&path).unwrap_err();
        assert!(err.to_string().contains("Checksum mismatch"));
    }

    #[test]
    fn test_missing_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cooc.bin.gz");
        save_matrix(&path, &matrix()).unwrap();
        fs::remove_file(checksum_path(&path)).unwrap();
        assert!(load_matrix(&path).is_err());
    }

    #[test]
    fn test_inconsistent_dimensions() {
        let mut snapshot = MatrixSnapshot::from_matrix(&matrix());
        snapshot.cells.pop();
        assert!(snapshot.into_matrix().is_err());
    }
}

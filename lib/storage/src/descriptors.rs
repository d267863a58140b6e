// Descriptor table reader.
//
// One term per line, tab-separated:
//   uid <TAB> name [<TAB> min_depth <TAB> position_count] <TAB> pos,pos,...
// Only the first two columns and the last one are read; the optional
// middle columns are derived data and are recomputed from the positions.

use anyhow::{Context, Result};
use meshstat_core::{Error, TermRecord};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parses one non-blank table line. `line_no` is 1-based.
pub fn parse_descriptor_line(line: &str, line_no: usize) -> meshstat_core::Result<TermRecord> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() < 3 {
        return Err(Error::Parse {
            line: line_no,
            reason: format!("expected at least 3 tab-separated columns, found {}", columns.len()),
        });
    }

    let uid = columns[0].trim();
    if uid.is_empty() {
        return Err(Error::Parse {
            line: line_no,
            reason: "empty term identifier".to_string(),
        });
    }

    let positions = columns[columns.len() - 1]
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    Ok(TermRecord {
        uid: uid.to_string(),
        name: columns[1].trim().to_string(),
        positions,
    })
}

pub fn parse_descriptor_table<R: BufRead>(reader: R) -> Result<Vec<TermRecord>> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        records.push(parse_descriptor_line(line, idx + 1)?);
    }
    Ok(records)
}

pub fn read_descriptor_table<P: AsRef<Path>>(path: P) -> Result<Vec<TermRecord>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open descriptor table {}", path.display()))?;
    let records = parse_descriptor_table(BufReader::new(file))
        .with_context(|| format!("Failed to read descriptor table {}", path.display()))?;
    tracing::info!("Loaded {} descriptors from {}", records.len(), path.display());
    Ok(records)
}

use crate::descriptors::read_descriptor_table;
use crate::documents::DocumentReader;
use anyhow::{Context, Result};
use meshstat_core::{Error, FrequencyTable, Ontology, TermCounter, TermRecord};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Parses `term_id,count` lines. Blank lines are ignored.
pub fn parse_term_counts<R: BufRead>(reader: R) -> Result<Vec<(String, u64)>> {
    let mut counts = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parse_error = |reason: String| Error::Parse {
            line: idx + 1,
            reason,
        };
        let (uid, count) = line
            .split_once(',')
            .ok_or_else(|| parse_error(format!("expected term_id,count, got {:?}", line)))?;
        let count = count
            .trim()
            .parse::<u64>()
            .map_err(|e| parse_error(format!("invalid count {:?}: {}", count, e)))?;
        counts.push((uid.trim().to_string(), count));
    }
    Ok(counts)
}

pub fn read_term_counts<P: AsRef<Path>>(path: P) -> Result<Vec<(String, u64)>> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open term counts {}", path.display()))?;
    parse_term_counts(BufReader::new(file))
        .with_context(|| format!("Failed to read term counts {}", path.display()))
}

/// Counts, per descriptor, the documents annotated with it. Every
/// descriptor starts at zero; an unknown term in a document is an error.
pub fn term_counts_from_documents<P: AsRef<Path>>(
    records: &[TermRecord],
    documents: P,
) -> Result<Vec<(String, u64)>> {
    let path = documents.as_ref();
    let mut counter = TermCounter::new(records.iter().map(|r| r.uid.as_str()));
    for document in DocumentReader::open(path)? {
        counter.observe(&document?)?;
    }
    tracing::info!(
        "Counted terms over {} documents from {}",
        counter.documents(),
        path.display()
    );
    Ok(counter.into_counts())
}

/// Where raw term counts come from.
#[derive(Debug, Clone, Copy)]
pub enum CountSource<'a> {
    /// A `term_id,count` file.
    Counts(&'a Path),
    /// A document-terms file, counted on load.
    Documents(&'a Path),
}

/// Reads the descriptor table and joins it with raw counts.
pub fn load_ontology<P: AsRef<Path>>(descriptors: P, counts: CountSource<'_>) -> Result<Ontology> {
    let records = read_descriptor_table(descriptors)?;
    let counts = match counts {
        CountSource::Counts(path) => read_term_counts(path)?,
        CountSource::Documents(path) => term_counts_from_documents(&records, path)?,
    };
    Ok(Ontology::build(records, counts)?)
}

/// Writes `term_id,frequency` for every term, in ontology order.
pub fn write_frequencies<P: AsRef<Path>>(
    path: P,
    ontology: &Ontology,
    frequencies: &FrequencyTable,
) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for (term, frequency) in frequencies.iter() {
        writeln!(out, "{},{}", ontology.uid(term), frequency)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshstat_core::FrequencyAggregator;
    use std::io::Cursor;

    fn records() -> Vec<TermRecord> {
        vec![
            TermRecord::new("A", "a", &["1"]),
            TermRecord::new("B", "b", &["1.001"]),
            TermRecord::new("C", "c", &["1.001.001"]),
        ]
    }

    #[test]
    fn test_parse_counts() {
        let counts = parse_term_counts(Cursor::new("A,2\n\nB, 3\nC,5\n")).unwrap();
        assert_eq!(
            counts,
            vec![("A".into(), 2), ("B".into(), 3), ("C".into(), 5)]
        );

        let err = parse_term_counts(Cursor::new("A,2\nB,x\n")).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Parse { line: 2, .. })));
        let err = parse_term_counts(Cursor::new("A 2\n")).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Parse { line: 1, .. })));
    }

    #[test]
    fn test_counts_from_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.csv");
        std::fs::write(&path, "1,A,B\n2,B\n3,\n4,C,B,B\n").unwrap();

        let counts = term_counts_from_documents(&records(), &path).unwrap();
        assert_eq!(
            counts,
            vec![("A".into(), 1), ("B".into(), 3), ("C".into(), 1)]
        );

        std::fs::write(&path, "1,A,Q\n").unwrap();
        let err = term_counts_from_documents(&records(), &path).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::UnknownTerm(t)) if t == "Q"));
    }

    #[test]
    fn test_load_ontology_from_either_source() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("mesh_data.tab");
        let counts = dir.path().join("counts.csv");
        let docs = dir.path().join("docs.csv");
        std::fs::write(&table, "A\ta\t1\nB\tb\t1.001\nC\tc\t1.001.001\n").unwrap();
        std::fs::write(&counts, "A,2\nB,3\nC,5\n").unwrap();
        std::fs::write(&docs, "1,A\n2,C,B\n").unwrap();

        let ontology = load_ontology(&table, CountSource::Counts(&counts)).unwrap();
        assert_eq!(ontology.count(ontology.term_id("C").unwrap()), 5);

        let ontology = load_ontology(&table, CountSource::Documents(&docs)).unwrap();
        assert_eq!(ontology.count(ontology.term_id("B").unwrap()), 1);

        std::fs::write(&counts, "A,2\nB,3\n").unwrap();
        let err = load_ontology(&table, CountSource::Counts(&counts)).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::MissingCount(t)) if t == "C"));
    }

    #[test]
    fn test_write_frequencies() {
        let ontology = Ontology::build(
            records(),
            vec![("A".into(), 2), ("B".into(), 3), ("C".into(), 5)],
        )
        .unwrap();
        let table = FrequencyAggregator::new(&ontology).compute_all().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("freqs.csv");
        write_frequencies(&path, &ontology, &table).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "A,10\nB,8\nC,5\n");
    }
}

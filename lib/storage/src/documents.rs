use anyhow::{Context, Result};
use meshstat_cooccurrence::TermSubset;
use meshstat_core::DocumentTerms;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

/// Parses `doc_id,term,term,...`. Empty term fields are dropped, so a bare
/// trailing comma means a document without terms. Returns `None` for a
/// line without a document id.
pub fn parse_document_line(line: &str) -> Option<DocumentTerms> {
    let mut fields = line.split(',');
    let doc_id = fields.next()?.trim();
    if doc_id.is_empty() {
        return None;
    }
    Some(DocumentTerms {
        doc_id: doc_id.to_string(),
        terms: fields
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

/// Streams documents from a document-terms file. Malformed lines, including
/// lines that are not UTF-8, are logged and skipped; read failures end the
/// stream with an error.
pub struct DocumentReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_no: usize,
    skipped: u64,
}

impl DocumentReader<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open document file {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> DocumentReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            line_no: 0,
            skipped: 0,
        }
    }

    /// Lines skipped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl<R: BufRead> Iterator for DocumentReader<R> {
    type Item = meshstat_core::Result<DocumentTerms>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line_no += 1;
            let line = match std::str::from_utf8(&self.buf) {
                Ok(line) => line.trim_end_matches(['\n', '\r']),
                Err(e) => {
                    self.skipped += 1;
                    warn!("Skipping document line {}: {}", self.line_no, e);
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match parse_document_line(line) {
                Some(document) => return Some(Ok(document)),
                None => {
                    self.skipped += 1;
                    warn!("Skipping malformed document line {}: {:?}", self.line_no, line);
                }
            }
        }
    }
}

/// Reads a term subset list: one identifier per line, blanks ignored,
/// duplicates rejected.
pub fn read_term_subset<P: AsRef<Path>>(path: P) -> Result<TermSubset> {
    let path = path.as_ref();
    let file =
        File::open(path).with_context(|| format!("Failed to open term subset {}", path.display()))?;
    let mut terms = Vec::new();
    for line in BufReader::new(file).lines() {
        let line = line?;
        let term = line.trim();
        if !term.is_empty() {
            terms.push(term.to_string());
        }
    }
    let subset = TermSubset::new(terms)
        .with_context(|| format!("Invalid term subset {}", path.display()))?;
    tracing::info!("Loaded {} subset terms from {}", subset.len(), path.display());
    Ok(subset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshstat_core::Error;
    use std::io::Cursor;

    #[test]
    fn test_line_forms() {
        assert_eq!(
            parse_document_line("123,D1,D2"),
            Some(DocumentTerms::new("123", &["D1", "D2"]))
        );
        assert_eq!(parse_document_line("123,"), Some(DocumentTerms::new("123", &[])));
        assert_eq!(parse_document_line("123"), Some(DocumentTerms::new("123", &[])));
        assert_eq!(
            parse_document_line("123,D1,,D2,"),
            Some(DocumentTerms::new("123", &["D1", "D2"]))
        );
        assert_eq!(parse_document_line(",D1"), None);
    }

    #[test]
    fn test_reader_skips_malformed_lines() {
        let mut reader = DocumentReader::new(Cursor::new("1,A\n,B\n\n2,\n3,C,A\n"));
        let docs: Vec<DocumentTerms> = reader.by_ref().map(|d| d.unwrap()).collect();
        assert_eq!(
            docs.iter().map(|d| d.doc_id.as_str()).collect::<Vec<_>>(),
            vec!["1", "2", "3"]
        );
        assert!(docs[1].terms.is_empty());
        assert_eq!(reader.skipped(), 1);
    }

    #[test]
    fn test_reader_skips_invalid_utf8_lines() {
        let input: &[u8] = b"1,D1,D2\n2,D1,\xff\xfe\n3,D1,D2\r\n";
        let mut reader = DocumentReader::new(Cursor::new(input));
        let docs: Vec<DocumentTerms> = reader.by_ref().map(|d| d.unwrap()).collect();
        assert_eq!(
            docs,
            vec![
                DocumentTerms::new("1", &["D1", "D2"]),
                DocumentTerms::new("3", &["D1", "D2"]),
            ]
        );
        assert_eq!(reader.skipped(), 1);
    }

    #[test]
    fn test_subset_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subset_terms_list");
        std::fs::write(&path, "D2\n\nD1\n").unwrap();
        let subset = read_term_subset(&path).unwrap();
        assert_eq!(subset.terms(), &["D2".to_string(), "D1".to_string()]);

        std::fs::write(&path, "D2\nD1\nD2\n").unwrap();
        let err = read_term_subset(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::DuplicateTerm(t)) if t == "D2"));
    }
}

use ahash::AHashMap;
use meshstat_core::{Error, Ontology, Result};

/// Ordered list of the terms a co-occurrence matrix is built over. Row and
/// column `i` of every matrix belong to `terms()[i]`.
#[derive(Debug, Clone)]
pub struct TermSubset {
    terms: Vec<String>,
    columns: AHashMap<String, usize>,
}

impl TermSubset {
    /// Builds a subset in the given order. Repeated identifiers are rejected.
    pub fn new<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordered = Vec::new();
        let mut columns = AHashMap::new();
        for term in terms {
            let term = term.into();
            if columns.contains_key(&term) {
                return Err(Error::DuplicateTerm(term));
            }
            columns.insert(term.clone(), ordered.len());
            ordered.push(term);
        }
        Ok(Self {
            terms: ordered,
            columns,
        })
    }

    /// Every ontology term, in ontology order.
    pub fn from_ontology(ontology: &Ontology) -> Self {
        let terms: Vec<String> = ontology
            .term_ids()
            .map(|t| ontology.uid(t).to_string())
            .collect();
        let columns = terms
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { terms, columns }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[inline]
    pub fn column(&self, term: &str) -> Option<usize> {
        self.columns.get(term).copied()
    }

    #[inline]
    pub fn term(&self, column: usize) -> &str {
        &self.terms[column]
    }

    #[inline]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Fails on the first subset term the ontology does not know.
    pub fn check_known(&self, ontology: &Ontology) -> Result<()> {
        match self.terms.iter().find(|t| ontology.term_id(t).is_none()) {
            Some(unknown) => Err(Error::UnknownTerm(unknown.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshstat_core::TermRecord;

    #[test]
    fn test_columns_follow_input_order() {
        let subset = TermSubset::new(["D3", "D1", "D2"]).unwrap();
        assert_eq!(subset.len(), 3);
        assert_eq!(subset.column("D1"), Some(1));
        assert_eq!(subset.term(2), "D2");
        assert_eq!(subset.column("D9"), None);
    }

    #[test]
    fn test_duplicate_rejected() {
        let err = TermSubset::new(["D1", "D2", "D1"]).unwrap_err();
        assert!(matches!(err, Error::DuplicateTerm(t) if t == "D1"));
    }

    #[test]
    fn test_from_ontology_and_check_known() {
        let ontology = Ontology::build(
            vec![
                TermRecord::new("A", "a", &["1"]),
                TermRecord::new("B", "b", &["1.001"]),
            ],
            vec![("A".to_string(), 1), ("B".to_string(), 1)],
        )
        .unwrap();

        let all = TermSubset::from_ontology(&ontology);
        assert_eq!(all.terms(), &["A".to_string(), "B".to_string()]);
        assert!(all.check_known(&ontology).is_ok());

        let foreign = TermSubset::new(["B", "Q"]).unwrap();
        assert!(matches!(foreign.check_known(&ontology), Err(Error::UnknownTerm(t)) if t == "Q"));
    }
}

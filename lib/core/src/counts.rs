use crate::{DocumentTerms, Error, Result};
use ahash::{AHashMap, AHashSet};

/// Tallies raw term occurrence counts from annotated documents.
///
/// A term counts once per document that carries it, which keeps raw counts
/// consistent with per-document incidence rows.
#[derive(Debug, Clone)]
pub struct TermCounter {
    counts: AHashMap<String, u64>,
    order: Vec<String>,
    documents: u64,
}

impl TermCounter {
    /// Starts every known term at zero.
    pub fn new<I, S>(uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let order: Vec<String> = uids.into_iter().map(Into::into).collect();
        let counts = order.iter().map(|uid| (uid.clone(), 0)).collect();
        Self {
            counts,
            order,
            documents: 0,
        }
    }

    /// Adds one document. An annotation for a term the counter does not
    /// know fails with [`Error::UnknownTerm`].
    pub fn observe(&mut self, document: &DocumentTerms) -> Result<()> {
        let mut seen = AHashSet::with_capacity(document.terms.len());
        for uid in &document.terms {
            if !seen.insert(uid.as_str()) {
                continue;
            }
            let count = self
                .counts
                .get_mut(uid)
                .ok_or_else(|| Error::UnknownTerm(uid.clone()))?;
            *count += 1;
        }
        self.documents += 1;
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn documents(&self) -> u64 {
        self.documents
    }

    pub fn get(&self, uid: &str) -> Option<u64> {
        self.counts.get(uid).copied()
    }

    /// Counts in the order the terms were registered.
    pub fn into_counts(mut self) -> Vec<(String, u64)> {
        self.order
            .into_iter()
            .map(|uid| {
                let count = self.counts.remove(&uid).unwrap_or(0);
                (uid, count)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_once_per_document() {
        let mut counter = TermCounter::new(["A", "B", "C"]);
        counter.observe(&DocumentTerms::new("1", &["A", "B", "A"])).unwrap();
        counter.observe(&DocumentTerms::new("2", &["B"])).unwrap();
        counter.observe(&DocumentTerms::new("3", &[])).unwrap();

        assert_eq!(counter.documents(), 3);
        assert_eq!(
            counter.into_counts(),
            vec![
                ("A".to_string(), 1),
                ("B".to_string(), 2),
                ("C".to_string(), 0)
            ]
        );
    }

    #[test]
    fn test_unknown_annotation_rejected() {
        let mut counter = TermCounter::new(["A"]);
        let err = counter.observe(&DocumentTerms::new("1", &["Q"])).unwrap_err();
        assert!(matches!(err, Error::UnknownTerm(ref uid) if uid == "Q"));
    }
}

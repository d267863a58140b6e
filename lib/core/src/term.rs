use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense handle into the term arena, assigned in input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TermId(u32);

impl TermId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    #[must_use]
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A descriptor as produced by the ontology parser: identifier, display
/// name and hierarchy positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRecord {
    pub uid: String,
    pub name: String,
    /// Dot-delimited tree positions. Empty for terms outside every tree.
    pub positions: Vec<String>,
}

impl TermRecord {
    #[inline]
    #[must_use]
    pub fn new(uid: impl Into<String>, name: impl Into<String>, positions: &[&str]) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            positions: positions.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

/// Terms annotated on one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTerms {
    pub doc_id: String,
    pub terms: Vec<String>,
}

impl DocumentTerms {
    #[inline]
    #[must_use]
    pub fn new(doc_id: impl Into<String>, terms: &[&str]) -> Self {
        Self {
            doc_id: doc_id.into(),
            terms: terms.iter().map(|t| (*t).to_string()).collect(),
        }
    }
}

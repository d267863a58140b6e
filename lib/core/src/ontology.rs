use crate::hierarchy::Hierarchy;
use crate::position::PositionIndex;
use crate::{Error, Result, TermId, TermRecord};
use tracing::info;

/// Descriptor hierarchy joined with corpus occurrence counts.
#[derive(Debug, Clone)]
pub struct Ontology {
    index: PositionIndex,
    hierarchy: Hierarchy,
    names: Vec<String>,
    counts: Vec<u64>,
}

impl Ontology {
    /// Joins descriptors with their raw counts. Both sides must be keyed by
    /// the same identifiers: a count for an unknown term fails with
    /// [`Error::UnknownTerm`], a term without a count with
    /// [`Error::MissingCount`].
    pub fn build<I>(records: Vec<TermRecord>, counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, u64)>,
    {
        let index = PositionIndex::build(&records)?;

        let mut slots: Vec<Option<u64>> = vec![None; index.term_count()];
        for (uid, count) in counts {
            let term = index.term_id(&uid).ok_or(Error::UnknownTerm(uid))?;
            slots[term.index()] = Some(count);
        }
        let counts = slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.ok_or_else(|| Error::MissingCount(records[idx].uid.clone()))
            })
            .collect::<Result<Vec<u64>>>()?;

        let hierarchy = Hierarchy::new(&index);
        info!(
            "Ontology built: {} terms, {} positions",
            index.term_count(),
            index.position_count()
        );

        Ok(Self {
            index,
            hierarchy,
            names: records.into_iter().map(|r| r.name).collect(),
            counts,
        })
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[inline]
    pub fn index(&self) -> &PositionIndex {
        &self.index
    }

    #[inline]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    #[inline]
    pub fn term_id(&self, uid: &str) -> Option<TermId> {
        self.index.term_id(uid)
    }

    /// Like [`Ontology::term_id`], failing with [`Error::UnknownTerm`].
    pub fn require(&self, uid: &str) -> Result<TermId> {
        self.term_id(uid)
            .ok_or_else(|| Error::UnknownTerm(uid.to_string()))
    }

    #[inline]
    pub fn uid(&self, term: TermId) -> &str {
        self.index.uid(term)
    }

    #[inline]
    pub fn name(&self, term: TermId) -> &str {
        &self.names[term.index()]
    }

    #[inline]
    pub fn count(&self, term: TermId) -> u64 {
        self.counts[term.index()]
    }

    pub fn term_ids(&self) -> impl Iterator<Item = TermId> + '_ {
        (0..self.len()).map(TermId::from_index)
    }

    /// Children of `term`, first-seen order.
    #[inline]
    pub fn children(&self, term: TermId) -> &[TermId] {
        self.hierarchy.children(term)
    }

    /// Ancestors of `term`, including itself.
    pub fn ancestors(&self, term: TermId) -> Vec<TermId> {
        self.hierarchy.ancestors(&self.index, term)
    }
}

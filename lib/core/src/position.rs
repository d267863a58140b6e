//! Position index over dot-delimited tree numbers.
//!
//! Every position string is interned once into an arena and addressed by a
//! [`PositionId`]. Parent links are resolved at build time, so hierarchy
//! walks compare integers instead of splitting strings.

use crate::{Error, Result, TermId, TermRecord};
use ahash::AHashMap;
use smallvec::SmallVec;

pub type PositionList = SmallVec<[PositionId; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionId(u32);

impl PositionId {
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone)]
struct PositionEntry {
    path: String,
    owner: TermId,
    depth: usize,
    parent: Option<PositionId>,
}

/// Forward (term -> positions) and reverse (position -> term) maps.
#[derive(Debug, Clone)]
pub struct PositionIndex {
    uids: Vec<String>,
    term_index: AHashMap<String, TermId>,
    entries: Vec<PositionEntry>,
    by_path: AHashMap<String, PositionId>,
    term_positions: Vec<PositionList>,
    child_positions: Vec<PositionList>,
}

/// The path with its final segment dropped, or `None` at depth 1.
#[inline]
pub fn parent_path(path: &str) -> Option<&str> {
    path.rsplit_once('.').map(|(parent, _)| parent)
}

impl PositionIndex {
    /// Builds both maps. Term handles are assigned in record order.
    pub fn build(records: &[TermRecord]) -> Result<Self> {
        let mut uids = Vec::with_capacity(records.len());
        let mut term_index = AHashMap::with_capacity(records.len());
        let mut entries: Vec<PositionEntry> = Vec::new();
        let mut by_path: AHashMap<String, PositionId> = AHashMap::new();
        let mut term_positions = Vec::with_capacity(records.len());

        for (idx, record) in records.iter().enumerate() {
            let term = TermId::from_index(idx);
            if term_index.insert(record.uid.clone(), term).is_some() {
                return Err(Error::DuplicateTerm(record.uid.clone()));
            }
            uids.push(record.uid.clone());

            let mut positions = PositionList::new();
            for path in record.positions.iter().filter(|p| !p.is_empty()) {
                if path.split('.').any(str::is_empty) {
                    return Err(Error::InvalidPosition {
                        term: record.uid.clone(),
                        position: path.clone(),
                    });
                }
                if let Some(&existing) = by_path.get(path.as_str()) {
                    let owner = entries[existing.index()].owner;
                    if owner == term {
                        continue;
                    }
                    return Err(Error::AmbiguousPosition {
                        position: path.clone(),
                        first: uids[owner.index()].clone(),
                        second: record.uid.clone(),
                    });
                }
                let id = PositionId(entries.len() as u32);
                entries.push(PositionEntry {
                    path: path.clone(),
                    owner: term,
                    depth: path.split('.').count(),
                    parent: None,
                });
                by_path.insert(path.clone(), id);
                positions.push(id);
            }
            term_positions.push(positions);
        }

        let mut child_positions = vec![PositionList::new(); entries.len()];
        for idx in 0..entries.len() {
            let Some(parent) = parent_path(&entries[idx].path) else {
                continue;
            };
            let Some(&parent_id) = by_path.get(parent) else {
                let entry = &entries[idx];
                return Err(Error::DanglingPosition {
                    term: uids[entry.owner.index()].clone(),
                    position: entry.path.clone(),
                    parent: parent.to_string(),
                });
            };
            entries[idx].parent = Some(parent_id);
            child_positions[parent_id.index()].push(PositionId(idx as u32));
        }

        Ok(Self {
            uids,
            term_index,
            entries,
            by_path,
            term_positions,
            child_positions,
        })
    }

    #[inline]
    #[must_use]
    pub fn term_count(&self) -> usize {
        self.uids.len()
    }

    #[inline]
    #[must_use]
    pub fn position_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn term_id(&self, uid: &str) -> Option<TermId> {
        self.term_index.get(uid).copied()
    }

    #[inline]
    pub fn uid(&self, term: TermId) -> &str {
        &self.uids[term.index()]
    }

    /// Reverse lookup: the position handle for a path string.
    #[inline]
    pub fn lookup(&self, path: &str) -> Option<PositionId> {
        self.by_path.get(path).copied()
    }

    /// Reverse lookup: the term owning a path string.
    pub fn owner_of(&self, path: &str) -> Option<TermId> {
        self.lookup(path).map(|id| self.owner(id))
    }

    #[inline]
    pub fn owner(&self, position: PositionId) -> TermId {
        self.entries[position.index()].owner
    }

    #[inline]
    pub fn parent(&self, position: PositionId) -> Option<PositionId> {
        self.entries[position.index()].parent
    }

    #[inline]
    pub fn depth(&self, position: PositionId) -> usize {
        self.entries[position.index()].depth
    }

    #[inline]
    pub fn path(&self, position: PositionId) -> &str {
        &self.entries[position.index()].path
    }

    #[inline]
    pub fn positions_of(&self, term: TermId) -> &[PositionId] {
        &self.term_positions[term.index()]
    }

    #[inline]
    pub fn child_positions(&self, position: PositionId) -> &[PositionId] {
        &self.child_positions[position.index()]
    }

    /// Deepest position of the term, 0 for terms outside every tree.
    pub fn max_depth(&self, term: TermId) -> usize {
        self.positions_of(term)
            .iter()
            .map(|&p| self.depth(p))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<TermRecord> {
        vec![
            TermRecord::new("A", "Anatomy", &["1"]),
            TermRecord::new("B", "Body Regions", &["1.001", "2.004"]),
            TermRecord::new("C", "Chest", &["1.001.001"]),
            TermRecord::new("D", "Diseases", &["2"]),
            TermRecord::new("F", "Female", &[""]),
        ]
    }

    #[test]
    fn test_forward_and_reverse_maps() {
        let index = PositionIndex::build(&records()).unwrap();
        assert_eq!(index.term_count(), 5);
        assert_eq!(index.position_count(), 5);

        let b = index.term_id("B").unwrap();
        let paths: Vec<&str> = index.positions_of(b).iter().map(|&p| index.path(p)).collect();
        assert_eq!(paths, vec!["1.001", "2.004"]);
        assert_eq!(index.owner_of("2.004"), Some(b));
        assert_eq!(index.owner_of("3"), None);
    }

    #[test]
    fn test_parent_links_and_depth() {
        let index = PositionIndex::build(&records()).unwrap();
        let chest = index.lookup("1.001.001").unwrap();
        let parent = index.parent(chest).unwrap();
        assert_eq!(index.path(parent), "1.001");
        assert_eq!(index.depth(chest), 3);
        assert_eq!(index.parent(index.lookup("1").unwrap()), None);
        assert_eq!(index.child_positions(parent), &[chest]);
    }

    #[test]
    fn test_empty_positions_are_dropped() {
        let index = PositionIndex::build(&records()).unwrap();
        let female = index.term_id("F").unwrap();
        assert!(index.positions_of(female).is_empty());
        assert_eq!(index.max_depth(female), 0);
    }

    #[test]
    fn test_ambiguous_position_rejected() {
        let records = vec![
            TermRecord::new("A", "a", &["1"]),
            TermRecord::new("B", "b", &["1"]),
        ];
        let err = PositionIndex::build(&records).unwrap_err();
        assert!(matches!(err, Error::AmbiguousPosition { ref position, .. } if position == "1"));
        assert!(err.is_data_integrity());
    }

    #[test]
    fn test_repeated_position_of_same_term_is_merged() {
        let records = vec![TermRecord::new("A", "a", &["1", "1"])];
        let index = PositionIndex::build(&records).unwrap();
        assert_eq!(index.positions_of(index.term_id("A").unwrap()).len(), 1);
    }

    #[test]
    fn test_dangling_and_invalid_positions_rejected() {
        let dangling = vec![TermRecord::new("A", "a", &["1.002"])];
        assert!(matches!(
            PositionIndex::build(&dangling),
            Err(Error::DanglingPosition { .. })
        ));

        let invalid = vec![TermRecord::new("A", "a", &["1..2"])];
        assert!(matches!(
            PositionIndex::build(&invalid),
            Err(Error::InvalidPosition { .. })
        ));
    }

    #[test]
    fn test_duplicate_uid_rejected() {
        let records = vec![
            TermRecord::new("A", "a", &["1"]),
            TermRecord::new("A", "again", &["2"]),
        ];
        assert!(matches!(
            PositionIndex::build(&records),
            Err(Error::DuplicateTerm(uid)) if uid == "A"
        ));
    }
}

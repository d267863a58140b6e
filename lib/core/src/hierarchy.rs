//! Term-level navigation derived from position structure.
//!
//! A term's children are the owners of the positions one level below any of
//! its positions; its ancestors are the fixed point of "owner of the parent
//! of any position of a known term". Both are materialized once so repeated
//! queries cost a slice lookup.

use crate::position::PositionIndex;
use crate::TermId;
use ahash::AHashSet;
use rayon::prelude::*;

#[derive(Debug, Clone)]
pub struct Hierarchy {
    children: Vec<Vec<TermId>>,
    parents: Vec<Vec<TermId>>,
    max_depth: Vec<usize>,
}

/// Ancestor sets for every term, each sorted by [`TermId`] and including
/// the term itself.
#[derive(Debug, Clone)]
pub struct AncestorTable {
    sets: Vec<Vec<TermId>>,
}

impl AncestorTable {
    #[inline]
    pub fn get(&self, term: TermId) -> &[TermId] {
        &self.sets[term.index()]
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

/// Pushes `term` unless it was already seen, keeping first-seen order.
#[inline]
fn push_unique(out: &mut Vec<TermId>, seen: &mut AHashSet<TermId>, term: TermId) {
    if seen.insert(term) {
        out.push(term);
    }
}

impl Hierarchy {
    pub fn new(index: &PositionIndex) -> Self {
        let n = index.term_count();
        let mut children = Vec::with_capacity(n);
        let mut parents = Vec::with_capacity(n);
        let mut max_depth = Vec::with_capacity(n);

        for idx in 0..n {
            let term = TermId::from_index(idx);

            let mut seen = AHashSet::new();
            let mut kids = Vec::new();
            for &position in index.positions_of(term) {
                for &child in index.child_positions(position) {
                    let owner = index.owner(child);
                    if owner != term {
                        push_unique(&mut kids, &mut seen, owner);
                    }
                }
            }
            children.push(kids);

            seen.clear();
            let mut ups = Vec::new();
            for &position in index.positions_of(term) {
                if let Some(parent) = index.parent(position) {
                    let owner = index.owner(parent);
                    if owner != term {
                        push_unique(&mut ups, &mut seen, owner);
                    }
                }
            }
            parents.push(ups);

            max_depth.push(index.max_depth(term));
        }

        Self {
            children,
            parents,
            max_depth,
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    #[inline]
    pub fn children(&self, term: TermId) -> &[TermId] {
        &self.children[term.index()]
    }

    #[inline]
    pub fn parents(&self, term: TermId) -> &[TermId] {
        &self.parents[term.index()]
    }

    #[inline]
    pub fn is_leaf(&self, term: TermId) -> bool {
        self.children[term.index()].is_empty()
    }

    #[inline]
    pub fn max_depth(&self, term: TermId) -> usize {
        self.max_depth[term.index()]
    }

    /// Ancestors of `term`, including `term`, sorted by handle.
    ///
    /// Expands positions to a fixed point: each known position is resolved
    /// to its owner, and every position of that owner contributes its
    /// parent. Depth strictly decreases along parent links, so the frontier
    /// is finite.
    pub fn ancestors(&self, index: &PositionIndex, term: TermId) -> Vec<TermId> {
        let mut known: Vec<_> = index.positions_of(term).to_vec();
        let mut seen: AHashSet<_> = known.iter().copied().collect();

        let mut cursor = 0;
        while cursor < known.len() {
            let owner = index.owner(known[cursor]);
            for &position in index.positions_of(owner) {
                if let Some(parent) = index.parent(position) {
                    if seen.insert(parent) {
                        known.push(parent);
                    }
                }
            }
            cursor += 1;
        }

        let mut terms: Vec<TermId> = known.into_iter().map(|p| index.owner(p)).collect();
        terms.push(term);
        terms.sort_unstable();
        terms.dedup();
        terms
    }

    /// Every term's ancestor set, computed in parallel.
    pub fn ancestor_table(&self, index: &PositionIndex) -> AncestorTable {
        let sets = (0..self.len())
            .into_par_iter()
            .map(|idx| self.ancestors(index, TermId::from_index(idx)))
            .collect();
        AncestorTable { sets }
    }

    /// All terms ordered by deepest position, deepest first. Terms outside
    /// every tree come last; ties keep input order.
    pub fn depth_descending(&self) -> Vec<TermId> {
        let mut terms: Vec<TermId> = (0..self.len()).map(TermId::from_index).collect();
        terms.sort_by(|a, b| self.max_depth(*b).cmp(&self.max_depth(*a)));
        terms
    }

    /// Parent-to-child edges. Undirected output keeps one edge per
    /// unordered pair.
    pub fn edges(&self, directed: bool) -> Vec<(TermId, TermId)> {
        let mut seen = AHashSet::new();
        let mut edges = Vec::new();
        for (idx, kids) in self.children.iter().enumerate() {
            let parent = TermId::from_index(idx);
            for &child in kids {
                let key = if directed || parent < child {
                    (parent, child)
                } else {
                    (child, parent)
                };
                if seen.insert(key) {
                    edges.push((parent, child));
                }
            }
        }
        edges
    }
}

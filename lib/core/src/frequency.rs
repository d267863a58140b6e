//! Aggregate term frequencies (Song et al.): a term's own count plus the
//! aggregate frequency of each of its children.
//!
//! Evaluation is an explicit post-order walk over the materialized
//! hierarchy with a memo table, so deep trees never grow the call stack.
//! Children reached through several parents are counted once per path.

use crate::ontology::Ontology;
use crate::{Error, Result, TermId};
use std::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Fresh,
    Open,
    Done,
}

struct Frame {
    term: TermId,
    next_child: usize,
    total: u64,
}

pub struct FrequencyAggregator<'a> {
    ontology: &'a Ontology,
    memo: Vec<Option<u64>>,
    visit: Vec<Visit>,
}

/// Immutable aggregate frequencies for every term.
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    values: Vec<u64>,
    root: u64,
}

impl FrequencyTable {
    #[inline]
    pub fn get(&self, term: TermId) -> u64 {
        self.values[term.index()]
    }

    /// Sum of every term's aggregate frequency; the denominator of term
    /// probabilities.
    #[inline]
    #[must_use]
    pub fn root_frequency(&self) -> u64 {
        self.root
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TermId, u64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(idx, &value)| (TermId::from_index(idx), value))
    }
}

impl<'a> FrequencyAggregator<'a> {
    pub fn new(ontology: &'a Ontology) -> Self {
        Self {
            ontology,
            memo: vec![None; ontology.len()],
            visit: vec![Visit::Fresh; ontology.len()],
        }
    }

    fn add(&self, total: u64, value: u64, term: TermId) -> Result<u64> {
        total
            .checked_add(value)
            .ok_or_else(|| Error::FrequencyOverflow(self.ontology.uid(term).to_string()))
    }

    /// Aggregate frequency of `term`, memoized.
    pub fn frequency(&mut self, term: TermId) -> Result<u64> {
        if let Some(value) = self.memo[term.index()] {
            return Ok(value);
        }

        let ontology = self.ontology;
        let hierarchy = ontology.hierarchy();
        let mut stack = vec![Frame {
            term,
            next_child: 0,
            total: ontology.count(term),
        }];
        self.visit[term.index()] = Visit::Open;

        while let Some(frame) = stack.last_mut() {
            let children = hierarchy.children(frame.term);
            if let Some(&child) = children.get(frame.next_child) {
                frame.next_child += 1;
                match self.visit[child.index()] {
                    Visit::Done => {
                        let value = self.memo[child.index()].unwrap_or(0);
                        frame.total = self.add(frame.total, value, frame.term)?;
                    }
                    Visit::Open => {
                        return Err(Error::CyclicHierarchy {
                            term: ontology.uid(child).to_string(),
                        });
                    }
                    Visit::Fresh => {
                        self.visit[child.index()] = Visit::Open;
                        stack.push(Frame {
                            term: child,
                            next_child: 0,
                            total: ontology.count(child),
                        });
                    }
                }
            } else {
                let done = frame.term;
                let total = frame.total;
                stack.pop();
                self.memo[done.index()] = Some(total);
                self.visit[done.index()] = Visit::Done;
                if let Some(parent) = stack.last_mut() {
                    parent.total = self.add(parent.total, total, parent.term)?;
                }
            }
        }

        Ok(self.memo[term.index()].unwrap_or(0))
    }

    /// Computes every term, deepest terms first.
    pub fn compute_all(mut self) -> Result<FrequencyTable> {
        let start = Instant::now();
        for term in self.ontology.hierarchy().depth_descending() {
            self.frequency(term)?;
        }

        let values: Vec<u64> = self.memo.into_iter().map(|v| v.unwrap_or(0)).collect();
        let root = values
            .iter()
            .try_fold(0u64, |acc, &v| acc.checked_add(v))
            .ok_or_else(|| Error::FrequencyOverflow("<root>".to_string()))?;

        info!(
            "Term frequencies computed in {:.1} seconds (root frequency {})",
            start.elapsed().as_secs_f64(),
            root
        );
        Ok(FrequencyTable { values, root })
    }
}

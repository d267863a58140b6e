use crate::incidence::DocumentTally;
use meshstat_core::{Error, Result};
use ndarray::Array2;

/// Co-occurrence counts of one incidence chunk: `chunkᵀ · chunk`.
///
/// Cell `(i, j)` is the number of chunk documents containing both term `i`
/// and term `j`; the diagonal holds per-term document counts.
#[inline]
pub fn partial_cooccurrence(chunk: &Array2<u64>) -> Array2<u64> {
    chunk.t().dot(chunk)
}

/// Full co-occurrence matrix over a term subset, with the document tally it
/// was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct CooccurrenceMatrix {
    terms: Vec<String>,
    cells: Array2<u64>,
    tally: DocumentTally,
}

impl CooccurrenceMatrix {
    pub fn new(terms: Vec<String>, cells: Array2<u64>, tally: DocumentTally) -> Result<Self> {
        let dim = terms.len();
        let check = |actual: usize| {
            if actual == dim {
                Ok(())
            } else {
                Err(Error::DimensionMismatch {
                    expected: dim,
                    actual,
                })
            }
        };
        check(cells.nrows())?;
        check(cells.ncols())?;
        check(tally.counts.len())?;
        Ok(Self {
            terms,
            cells,
            tally,
        })
    }

    /// Rebuilds a matrix from row-major cells.
    pub fn from_row_major(terms: Vec<String>, cells: Vec<u64>, tally: DocumentTally) -> Result<Self> {
        let dim = terms.len();
        if cells.len() != dim * dim {
            return Err(Error::DimensionMismatch {
                expected: dim * dim,
                actual: cells.len(),
            });
        }
        let cells = Array2::from_shape_vec((dim, dim), cells).map_err(|_| {
            Error::DimensionMismatch {
                expected: dim * dim,
                actual: 0,
            }
        })?;
        Self::new(terms, cells, tally)
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    #[inline]
    pub fn term(&self, index: usize) -> &str {
        &self.terms[index]
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> u64 {
        self.cells[[i, j]]
    }

    #[inline]
    pub fn cells(&self) -> &Array2<u64> {
        &self.cells
    }

    pub fn to_row_major(&self) -> Vec<u64> {
        self.cells.iter().copied().collect()
    }

    #[inline]
    pub fn tally(&self) -> &DocumentTally {
        &self.tally
    }

    /// Documents that contained term `i`.
    #[inline]
    pub fn document_count(&self, i: usize) -> u64 {
        self.tally.counts[i]
    }

    /// Documents the matrix was built from.
    #[inline]
    pub fn documents(&self) -> u64 {
        self.tally.documents
    }

    pub fn is_symmetric(&self) -> bool {
        self.cells == self.cells.t()
    }

    /// Sum of every cell off the diagonal; each co-occurring pair counts twice.
    pub fn off_diagonal_total(&self) -> u64 {
        self.cells
            .indexed_iter()
            .filter(|((i, j), _)| i != j)
            .map(|(_, &v)| v)
            .sum()
    }
}

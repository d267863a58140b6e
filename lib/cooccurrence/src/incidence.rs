//! Document-term incidence chunks.
//!
//! Documents are streamed into `chunk_size x subset.len()` 0/1 matrices.
//! Every chunk but the last holds exactly `chunk_size` rows; the last holds
//! whatever remains. While chunking, the number of documents containing
//! each subset term is tallied over exactly the documents emitted.

use crate::subset::TermSubset;
use meshstat_core::{DocumentTerms, Error, Result};
use ndarray::{Array2, ArrayViewMut1};

/// Per-term document counts over the documents that were chunked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTally {
    pub counts: Vec<u64>,
    pub documents: u64,
}

impl DocumentTally {
    pub fn new(dim: usize) -> Self {
        Self {
            counts: vec![0; dim],
            documents: 0,
        }
    }

    /// Total of the per-term counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Terms outside the subset are ignored; repeats count once.
fn fill_row(subset: &TermSubset, document: &DocumentTerms, mut row: ArrayViewMut1<u64>) {
    for term in &document.terms {
        if let Some(column) = subset.column(term) {
            row[column] = 1;
        }
    }
}

/// Builds the incidence matrix of a whole document slice at once.
pub fn incidence_matrix(subset: &TermSubset, documents: &[DocumentTerms]) -> Array2<u64> {
    let mut matrix = Array2::zeros((documents.len(), subset.len()));
    for (document, row) in documents.iter().zip(matrix.rows_mut()) {
        fill_row(subset, document, row);
    }
    matrix
}

/// Streams documents into fixed-size incidence chunks.
pub struct Chunker<'s, I> {
    subset: &'s TermSubset,
    documents: I,
    chunk_size: usize,
    remaining: Option<u64>,
    tally: DocumentTally,
    chunks: u64,
}

impl<'s, I> Chunker<'s, I>
where
    I: Iterator<Item = Result<DocumentTerms>>,
{
    pub fn new(
        subset: &'s TermSubset,
        documents: I,
        chunk_size: usize,
        max_documents: Option<u64>,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk size must be positive".into()));
        }
        Ok(Self {
            subset,
            documents,
            chunk_size,
            remaining: max_documents,
            tally: DocumentTally::new(subset.len()),
            chunks: 0,
        })
    }

    #[inline]
    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    #[inline]
    pub fn tally(&self) -> &DocumentTally {
        &self.tally
    }

    pub fn into_tally(self) -> DocumentTally {
        self.tally
    }

    fn next_document(&mut self) -> Option<Result<DocumentTerms>> {
        if self.remaining == Some(0) {
            return None;
        }
        let document = self.documents.next()?;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        Some(document)
    }
}

impl<'s, I> Iterator for Chunker<'s, I>
where
    I: Iterator<Item = Result<DocumentTerms>>,
{
    type Item = Result<Array2<u64>>;

    fn next(&mut self) -> Option<Self::Item> {
        let dim = self.subset.len();
        let mut rows: Vec<u64> = Vec::with_capacity(self.chunk_size * dim);
        let mut filled = 0;

        while filled < self.chunk_size {
            let document = match self.next_document() {
                Some(Ok(document)) => document,
                Some(Err(e)) => return Some(Err(e)),
                None => break,
            };
            let start = rows.len();
            rows.resize(start + dim, 0);
            fill_row(self.subset, &document, ArrayViewMut1::from(&mut rows[start..]));
            for (count, &cell) in self.tally.counts.iter_mut().zip(&rows[start..]) {
                *count += cell;
            }
            self.tally.documents += 1;
            filled += 1;
        }

        if filled == 0 {
            return None;
        }
        self.chunks += 1;
        Some(
            Array2::from_shape_vec((filled, dim), rows)
                .map_err(|e| Error::InvalidConfig(format!("incidence chunk shape: {}", e))),
        )
    }
}

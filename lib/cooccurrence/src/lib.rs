//! # meshstat Co-occurrence
//!
//! Term co-occurrence over a document corpus, restricted to a term subset.
//!
//! - [`TermSubset`] - Ordered terms; row/column `i` of every matrix
//! - [`Chunker`] - Streams documents into 0/1 incidence chunks
//! - [`CooccurrencePipeline`] - `chunkᵀ · chunk` on builder threads, summed
//!   on accumulator threads
//! - [`log_likelihoods`] - Observed over expected co-occurrence, per pair
//!
//! ## Example
//!
//! ```rust
//! use meshstat_cooccurrence::{log_likelihoods, CooccurrenceConfig, CooccurrencePipeline, TermSubset};
//! use meshstat_core::DocumentTerms;
//!
//! let subset = TermSubset::new(["a", "b", "c"]).unwrap();
//! let documents = vec![
//!     Ok(DocumentTerms::new("1", &["a", "b"])),
//!     Ok(DocumentTerms::new("2", &["b", "c"])),
//!     Ok(DocumentTerms::new("3", &["a", "c"])),
//! ];
//!
//! let pipeline = CooccurrencePipeline::new(CooccurrenceConfig::default());
//! let (matrix, _report) = pipeline.run(&subset, documents).unwrap();
//! assert_eq!(matrix.get(0, 1), 1);
//!
//! let llr = log_likelihoods(&matrix);
//! assert_eq!(llr.records.len(), 3);
//! ```

pub mod subset;
pub mod incidence;
pub mod matrix;
pub mod likelihood;
pub mod pipeline;

pub use subset::TermSubset;
pub use incidence::{incidence_matrix, Chunker, DocumentTally};
pub use matrix::{partial_cooccurrence, CooccurrenceMatrix};
pub use likelihood::{
    cooccurrence_total, log_likelihood_ratio, log_likelihoods, marginals, LikelihoodRecord,
    LikelihoodReport,
};
pub use pipeline::{CooccurrenceConfig, CooccurrencePipeline, CooccurrenceReport};

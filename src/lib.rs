//! # meshstat
//!
//! Corpus statistics over the MeSH descriptor hierarchy.
//!
//! meshstat computes two things for a set of annotated documents:
//!
//! - **Semantic similarity** between every pair of terms, using aggregate
//!   information content: a term's frequency includes the frequencies of
//!   all its descendants, and two terms are similar to the extent that the
//!   weight of their shared ancestry dominates their total weight.
//! - **Term co-occurrence**: how often subset terms appear in the same
//!   document, and the log-likelihood ratio of that against independence.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! meshstat similarity --descriptors mesh_data.tab --counts term_counts.csv -o sims.csv
//! meshstat cooccurrence --documents doc_terms.csv --subset subset_terms_list -o llr.csv
//! meshstat frequencies --descriptors mesh_data.tab --documents doc_terms.csv -o freqs.csv
//! meshstat edges --descriptors mesh_data.tab -o edges.tsv --directed
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use meshstat::prelude::*;
//! use std::sync::Arc;
//!
//! let records = vec![
//!     TermRecord::new("D1", "Anatomy", &["A01"]),
//!     TermRecord::new("D2", "Body Regions", &["A01.001"]),
//!     TermRecord::new("D3", "Abdomen", &["A01.001.001"]),
//!     TermRecord::new("D4", "Cells", &["A02"]),
//! ];
//! let counts = vec![
//!     ("D1".to_string(), 4),
//!     ("D2".to_string(), 3),
//!     ("D3".to_string(), 2),
//!     ("D4".to_string(), 6),
//! ];
//! let ontology = Ontology::build(records, counts).unwrap();
//! let engine = SimilarityEngine::new(Arc::new(ontology)).unwrap();
//!
//! assert!(engine.similarity_by_id("D2", "D3").unwrap() > 0.0);
//! assert_eq!(engine.similarity_by_id("D3", "D4").unwrap(), 0.0);
//! ```
//!
//! ## Crate Structure
//!
//! - `meshstat-core` - Positions, hierarchy, frequencies, queues and worker pools
//! - `meshstat-similarity` - Information model, similarity engine, pairwise pipeline
//! - `meshstat-cooccurrence` - Incidence chunks, co-occurrence pipeline, log-likelihoods
//! - `meshstat-storage` - Input readers, output shards, matrix snapshots

pub mod commands;

// Re-export core types
pub use meshstat_core::{
    AncestorTable, BoundedQueue, CancelToken, DocumentTerms, Error, FrequencyAggregator,
    FrequencyTable, Hierarchy, Job, Measure, Ontology, PositionIndex, Result, TermCounter, TermId,
    TermRecord, Undefined, WorkerPool,
};

pub use meshstat_similarity::{
    InformationModel, PairRecord, PairwiseConfig, PairwisePipeline, PairwiseReport,
    SimilarityEngine,
};

pub use meshstat_cooccurrence::{
    log_likelihoods, CooccurrenceConfig, CooccurrenceMatrix, CooccurrencePipeline,
    CooccurrenceReport, LikelihoodRecord, TermSubset,
};

pub use meshstat_storage::{
    load_matrix, load_ontology, save_matrix, CountSource, EdgeLabel, MatrixSnapshot,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CancelToken, CooccurrenceConfig, CooccurrenceMatrix, CooccurrencePipeline, DocumentTerms,
        Error, FrequencyAggregator, Ontology, PairwiseConfig, PairwisePipeline, Result,
        SimilarityEngine, TermId, TermRecord, TermSubset,
    };
}

//! # meshstat Similarity
//!
//! Aggregate information-content semantic similarity between ontology terms.
//!
//! - [`InformationModel`] - Probability, information content, knowledge and
//!   semantic weight/value per term
//! - [`SimilarityEngine`] - Pairwise similarity over shared ancestors
//! - [`PairwisePipeline`] - All-pairs computation on worker and writer threads
//!
//! ## Example
//!
//! ```rust
//! use meshstat_core::{Ontology, TermRecord};
//! use meshstat_similarity::SimilarityEngine;
//! use std::sync::Arc;
//!
//! let records = vec![
//!     TermRecord::new("A", "Anatomy", &["1"]),
//!     TermRecord::new("B", "Body Regions", &["1.001"]),
//!     TermRecord::new("C", "Cells", &["1.002"]),
//! ];
//! let counts = vec![("A".to_string(), 2), ("B".to_string(), 3), ("C".to_string(), 5)];
//! let ontology = Ontology::build(records, counts).unwrap();
//!
//! let engine = SimilarityEngine::new(Arc::new(ontology)).unwrap();
//! let sim = engine.similarity_by_id("B", "C").unwrap();
//! assert!(sim > 0.0 && sim < 1.0);
//! assert_eq!(engine.similarity_by_id("B", "B").unwrap(), 1.0);
//! ```

pub mod information;
pub mod engine;
pub mod pipeline;

pub use information::{information_content, knowledge, probability, semantic_weight, InformationModel};
pub use engine::SimilarityEngine;
pub use pipeline::{
    pair_count, unordered_pairs, PairRecord, PairwiseConfig, PairwiseOutput, PairwisePipeline,
    PairwiseReport, WorkerStats,
};

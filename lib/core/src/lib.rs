//! # meshstat Core
//!
//! Core library for meshstat.
//!
//! This crate provides the hierarchy model the statistics are computed on:
//!
//! - [`PositionIndex`] - Term <-> tree position maps over integer handles
//! - [`Hierarchy`] - Children, parents and ancestors derived from positions
//! - [`Ontology`] - Descriptors joined with raw corpus counts
//! - [`FrequencyAggregator`] - Aggregate (own + descendant) frequencies
//! - [`BoundedQueue`] / [`WorkerPool`] - Building blocks for the pipelines
//!
//! ## Example
//!
//! ```rust
//! use meshstat_core::{FrequencyAggregator, Ontology, TermRecord};
//!
//! let records = vec![
//!     TermRecord::new("A", "Anatomy", &["1"]),
//!     TermRecord::new("B", "Body Regions", &["1.001"]),
//!     TermRecord::new("C", "Chest", &["1.001.001"]),
//! ];
//! let counts = vec![("A".to_string(), 2), ("B".to_string(), 3), ("C".to_string(), 5)];
//! let ontology = Ontology::build(records, counts).unwrap();
//!
//! let table = FrequencyAggregator::new(&ontology).compute_all().unwrap();
//! assert_eq!(table.get(ontology.term_id("A").unwrap()), 10);
//! ```

pub mod error;
pub mod measure;
pub mod term;
pub mod position;
pub mod hierarchy;
pub mod ontology;
pub mod counts;
pub mod frequency;
pub mod queue;
pub mod pool;
pub mod sink;

pub use error::{Error, Result};
pub use measure::{finite, Measure, Undefined};
pub use term::{DocumentTerms, TermId, TermRecord};
pub use position::{PositionId, PositionIndex};
pub use hierarchy::{AncestorTable, Hierarchy};
pub use ontology::Ontology;
pub use counts::TermCounter;
pub use frequency::{FrequencyAggregator, FrequencyTable};
pub use queue::{BoundedQueue, Job};
pub use pool::{root_cause, CancelToken, Closable, WorkerPool};
pub use sink::RecordSink;

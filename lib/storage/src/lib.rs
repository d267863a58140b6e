//! File formats for meshstat: descriptor tables, count and document files,
//! similarity shards, co-occurrence snapshots and result tables.

pub mod descriptors;
pub mod documents;
pub mod counts;
pub mod shard;
pub mod snapshot;
pub mod output;

pub use descriptors::{parse_descriptor_line, parse_descriptor_table, read_descriptor_table};
pub use documents::{parse_document_line, read_term_subset, DocumentReader};
pub use counts::{
    load_ontology, parse_term_counts, read_term_counts, term_counts_from_documents,
    write_frequencies, CountSource,
};
pub use shard::{merge_shards, shard_path, ShardWriter};
pub use snapshot::{checksum_path, load_matrix, load_snapshot, save_matrix, MatrixSnapshot};
pub use output::{write_edges, write_likelihoods, EdgeLabel};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Position {position} claimed by both {first} and {second}")]
    AmbiguousPosition {
        position: String,
        first: String,
        second: String,
    },

    #[error("Duplicate term identifier: {0}")]
    DuplicateTerm(String),

    #[error("Invalid position string {position:?} for term {term}")]
    InvalidPosition { term: String, position: String },

    #[error("Position {position} of term {term} has no owner for parent position {parent}")]
    DanglingPosition {
        term: String,
        position: String,
        parent: String,
    },

    #[error("Unknown term: {0}")]
    UnknownTerm(String),

    #[error("No occurrence count for term: {0}")]
    MissingCount(String),

    #[error("Hierarchy cycle detected at term {term}")]
    CyclicHierarchy { term: String },

    #[error("Aggregate frequency overflow at term {0}")]
    FrequencyOverflow(String),

    #[error("Matrix dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("{role} {index} failed: {reason}")]
    WorkerFailed {
        role: &'static str,
        index: usize,
        reason: String,
    },

    #[error("Queue closed")]
    QueueClosed,

    #[error("Run cancelled")]
    Cancelled,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parse error on line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Data integrity violations abort the run and are never retried.
    pub fn is_data_integrity(&self) -> bool {
        matches!(
            self,
            Error::AmbiguousPosition { .. }
                | Error::DuplicateTerm(_)
                | Error::InvalidPosition { .. }
                | Error::DanglingPosition { .. }
                | Error::UnknownTerm(_)
                | Error::MissingCount(_)
                | Error::CyclicHierarchy { .. }
                | Error::FrequencyOverflow(_)
                | Error::DimensionMismatch { .. }
        )
    }
}

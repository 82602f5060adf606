use thiserror::Error;

/// Errors returned by the partitioning engine and the record loader.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// No points were supplied.
    #[error("empty input")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Requested cluster count is incompatible with the dataset.
    #[error(
        "invalid cluster count: requested {requested}, but dataset has {distinct} distinct points"
    )]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of distinct coordinates in the dataset.
        distinct: usize,
    },

    /// The same point id occurs more than once.
    #[error("duplicate point id {id}")]
    DuplicateId {
        /// The repeated identifier.
        id: i32,
    },

    /// A point carries a NaN or infinite coordinate.
    #[error("point {id} has a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Identifier of the offending point.
        id: i32,
    },
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;

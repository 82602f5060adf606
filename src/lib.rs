//! Geographic k-means partitioning.
//!
//! `geocluster` assigns latitude/longitude points to a fixed number of clusters
//! with Lloyd's algorithm and reports a stable point id → cluster index mapping.
//!
//! - [`cluster`]: the partitioning engine (seeding, assignment, update,
//!   convergence, orchestration). Pure in-memory; no I/O.
//! - [`records`]: the JSON file contract used by the `geocluster` binary.

#![forbid(unsafe_code)]

pub mod cluster;
pub mod error;
pub mod records;

pub use cluster::{
    partition, Centroid, Clustering, Convergence, Coordinate, Init, Kmeans, KmeansFit, Metric,
    Point, Termination,
};
pub use error::{Error, Result};

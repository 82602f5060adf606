//! K-means partitioning of latitude/longitude points.
//!
//! ## The Pieces
//!
//! - [`Point`] / [`Coordinate`] / [`Centroid`]: the closed data model.
//! - [`distance`] and [`Metric`]: Euclidean distance, with Manhattan as the
//!   only alternative.
//! - [`Init`]: how the K starting centroids are picked.
//! - [`assign`], [`update`], [`has_converged`]: one Lloyd step each.
//! - [`Kmeans`] / [`partition`]: the orchestrator that drives those steps to a
//!   terminal state.
//!
//! **Objective**: minimize the within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! Latitude and longitude are treated as plane coordinates. That is fine for
//! grouping nearby places; it is not a geodesic clustering.
//!
//! ## Usage
//!
//! ```rust
//! use geocluster::cluster::{partition, Clustering, Kmeans, Point};
//!
//! let points = vec![
//!     Point::new(1, 0.0, 0.0),
//!     Point::new(2, 0.0, 1.0),
//!     Point::new(3, 10.0, 10.0),
//!     Point::new(4, 10.0, 11.0),
//! ];
//!
//! // id -> cluster index
//! let mapping = partition(&points, 2, 0.05, 96).unwrap();
//! assert_eq!(mapping[&1], mapping[&2]);
//! assert_ne!(mapping[&1], mapping[&3]);
//!
//! // labels in input order
//! let labels = Kmeans::new(2).fit_predict(&points).unwrap();
//! assert_eq!(labels[2], labels[3]);
//! ```

mod distance;
mod init;
mod kmeans;
mod point;
mod traits;

pub use distance::{distance, squared_distance, Metric};
pub use init::{initialize, Init};
pub use kmeans::{
    assign, assign_with, has_converged, max_shift, partition, suggested_cluster_count, total_shift,
    update, Convergence, Kmeans, KmeansFit, Termination, DEFAULT_MAX_ITERATIONS, DEFAULT_THRESHOLD,
};
pub use point::{Centroid, Coordinate, Point};
pub use traits::Clustering;

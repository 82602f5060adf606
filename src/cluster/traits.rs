use super::point::Point;
use crate::error::Result;

/// Common interface for hard partitioners (one label per point).
pub trait Clustering {
    /// Fit the model and return one cluster label per input point, in input order.
    fn fit_predict(&self, points: &[Point]) -> Result<Vec<usize>>;

    /// The configured number of clusters.
    fn n_clusters(&self) -> usize;
}

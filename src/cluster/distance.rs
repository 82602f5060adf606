//! Distance functions over 2-D coordinates.

use super::point::Coordinate;

/// Euclidean distance.
#[inline]
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Squared Euclidean distance. Same argmin as [`distance`], without the root.
#[inline]
pub fn squared_distance(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = a.lat - b.lat;
    let dlng = a.lng - b.lng;
    dlat.mul_add(dlat, dlng * dlng)
}

/// Metric used by the assignment step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// Straight-line distance.
    #[default]
    Euclidean,
    /// Sum of absolute component differences.
    Manhattan,
}

impl Metric {
    /// Distance between `a` and `b` under this metric.
    #[inline]
    pub fn distance(self, a: Coordinate, b: Coordinate) -> f64 {
        match self {
            Metric::Euclidean => distance(a, b),
            Metric::Manhattan => (a.lat - b.lat).abs() + (a.lng - b.lng).abs(),
        }
    }

    /// A monotone stand-in for `distance`, cheaper where possible.
    #[inline]
    pub(crate) fn rank(self, a: Coordinate, b: Coordinate) -> f64 {
        match self {
            Metric::Euclidean => squared_distance(a, b),
            Metric::Manhattan => self.distance(a, b),
        }
    }
}

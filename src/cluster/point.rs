//! Closed data model: points, coordinates, centroids.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A latitude/longitude pair.
///
/// The k-means math treats the two components as a flat 2-D plane; no
/// great-circle correction is applied.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl Coordinate {
    /// Build a coordinate from latitude and longitude.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when neither component is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Bit-level key used for distinctness checks. `-0.0` folds onto `0.0`.
    pub(crate) fn key(&self) -> (u64, u64) {
        let norm = |v: f64| if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() };
        (norm(self.lat), norm(self.lng))
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self { lat, lng }
    }
}

/// An immutable input point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Caller-assigned identifier, unique within one input.
    pub id: i32,
    /// Position of the point.
    #[serde(flatten)]
    pub coordinate: Coordinate,
}

impl Point {
    /// Build a point from its id and position.
    pub const fn new(id: i32, lat: f64, lng: f64) -> Self {
        Self {
            id,
            coordinate: Coordinate::new(lat, lng),
        }
    }
}

/// Representative coordinate of one cluster.
///
/// `index` is stable for the lifetime of a run: index 3 always names the same
/// logical cluster even as its coordinate moves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Centroid {
    /// Cluster index in `0..k`.
    pub index: usize,
    /// Current mean of the cluster's members.
    pub coordinate: Coordinate,
}

/// Distinct coordinates in first-seen input order.
pub(crate) fn distinct_coordinates(points: &[Point]) -> Vec<Coordinate> {
    let mut seen = HashSet::with_capacity(points.len());
    points
        .iter()
        .map(|p| p.coordinate)
        .filter(|c| seen.insert(c.key()))
        .collect()
}

/// Reject repeated ids; the id-keyed output would otherwise lose points.
pub(crate) fn ensure_unique_ids(points: &[Point]) -> Result<()> {
    let mut seen = HashSet::with_capacity(points.len());
    for p in points {
        if !seen.insert(p.id) {
            return Err(Error::DuplicateId { id: p.id });
        }
    }
    Ok(())
}

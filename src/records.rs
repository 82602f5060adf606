//! JSON file contract around the partitioning engine.
//!
//! Input is an array of `{"id": i32, "lat": f64, "lng": f64}` objects. Output is
//! an object mapping each id (as a string key) to its cluster index, e.g.
//! `{"1":0,"2":0,"3":1}`. An optional centroid dump lists
//! `{"cluster", "lat", "lng", "size"}` per cluster.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::cluster::{KmeansFit, Point};

/// Errors raised while reading or writing record files.
#[derive(Debug, Error)]
pub enum RecordError {
    /// The file could not be read or written.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The input is not a JSON array of `{id, lat, lng}` objects.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The input decoded but holds invalid points.
    #[error(transparent)]
    Invalid(#[from] crate::Error),
}

/// One row of the centroid dump.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CentroidRecord {
    /// Cluster index.
    pub cluster: usize,
    /// Centroid latitude.
    pub lat: f64,
    /// Centroid longitude.
    pub lng: f64,
    /// Number of member points.
    pub size: usize,
}

/// Decode points from a JSON reader and reject non-finite coordinates.
pub fn read_points<R: Read>(reader: R) -> Result<Vec<Point>, RecordError> {
    let points: Vec<Point> = serde_json::from_reader(reader)?;
    validate(&points)?;
    Ok(points)
}

/// Decode points from a JSON string.
pub fn parse_points(json: &str) -> Result<Vec<Point>, RecordError> {
    let points: Vec<Point> = serde_json::from_str(json)?;
    validate(&points)?;
    Ok(points)
}

/// Decode points from the file at `path`.
pub fn load_points(path: &Path) -> Result<Vec<Point>, RecordError> {
    let file = File::open(path)?;
    let points = read_points(BufReader::new(file))?;
    debug!(path = %path.display(), count = points.len(), "loaded points");
    Ok(points)
}

fn validate(points: &[Point]) -> Result<(), crate::Error> {
    match points.iter().find(|p| !p.coordinate.is_finite()) {
        Some(p) => Err(crate::Error::NonFiniteCoordinate { id: p.id }),
        None => Ok(()),
    }
}

/// Encode an id → cluster mapping.
pub fn write_assignment<W: Write>(
    writer: W,
    assignment: &BTreeMap<i32, usize>,
) -> Result<(), RecordError> {
    serde_json::to_writer(writer, assignment)?;
    Ok(())
}

/// Write an id → cluster mapping to the file at `path`.
pub fn save_assignment(path: &Path, assignment: &BTreeMap<i32, usize>) -> Result<(), RecordError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_assignment(&mut writer, assignment)?;
    writer.flush()?;
    debug!(path = %path.display(), count = assignment.len(), "wrote assignment");
    Ok(())
}

/// Centroid rows of a finished run, ordered by cluster index.
pub fn centroid_records(fit: &KmeansFit) -> Vec<CentroidRecord> {
    fit.centroids
        .iter()
        .zip(fit.sizes())
        .map(|(c, size)| CentroidRecord {
            cluster: c.index,
            lat: c.coordinate.lat,
            lng: c.coordinate.lng,
            size,
        })
        .collect()
}

/// Write the centroid dump of `fit` to the file at `path`.
pub fn save_centroids(path: &Path, fit: &KmeansFit) -> Result<(), RecordError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &centroid_records(fit))?;
    writer.flush()?;
    Ok(())
}

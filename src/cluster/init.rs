//! Centroid seeding.
//!
//! Every policy draws from the *distinct* coordinates of the input, in
//! first-seen order, so two starting centroids never coincide. The seeded
//! policies take their seed explicitly; there is no entropy-seeded variant, so
//! a run is always reproducible from its configuration.

use rand::prelude::*;
use rand::seq::index;

use super::distance::squared_distance;
use super::point::{distinct_coordinates, Centroid, Coordinate, Point};
use crate::error::{Error, Result};

/// How starting centroids are chosen.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Init {
    /// The first K distinct coordinates in input order.
    #[default]
    FirstDistinct,
    /// Every `floor(d / K)`-th distinct coordinate, `d` being the distinct count.
    Strided,
    /// K distinct coordinates drawn uniformly (Forgy).
    Random { seed: u64 },
    /// k-means++: each next seed is drawn with probability proportional to D².
    PlusPlus { seed: u64 },
    /// Caller-supplied starting coordinates, one per cluster.
    Explicit(Vec<Coordinate>),
}

impl Init {
    /// Choose `k` starting centroids for `points`.
    pub fn initialize(&self, points: &[Point], k: usize) -> Result<Vec<Centroid>> {
        if points.is_empty() {
            return Err(Error::EmptyInput);
        }

        let distinct = distinct_coordinates(points);
        if k == 0 || k > distinct.len() {
            return Err(Error::InvalidClusterCount {
                requested: k,
                distinct: distinct.len(),
            });
        }

        let coords = match self {
            Init::FirstDistinct => distinct[..k].to_vec(),
            Init::Strided => {
                let stride = distinct.len() / k;
                distinct.iter().step_by(stride).take(k).copied().collect()
            }
            Init::Random { seed } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                index::sample(&mut rng, distinct.len(), k)
                    .into_iter()
                    .map(|i| distinct[i])
                    .collect()
            }
            Init::PlusPlus { seed } => {
                let mut rng = StdRng::seed_from_u64(*seed);
                plus_plus(&distinct, k, &mut rng)
            }
            Init::Explicit(coords) => {
                if coords.len() != k {
                    return Err(Error::InvalidClusterCount {
                        requested: k,
                        distinct: coords.len(),
                    });
                }
                if !coords.iter().all(Coordinate::is_finite) {
                    return Err(Error::InvalidParameter {
                        name: "init",
                        message: "explicit centroids must be finite",
                    });
                }
                coords.clone()
            }
        };

        Ok(coords
            .into_iter()
            .enumerate()
            .map(|(index, coordinate)| Centroid { index, coordinate })
            .collect())
    }
}

/// Seed with the default [`Init::FirstDistinct`] policy.
pub fn initialize(points: &[Point], k: usize) -> Result<Vec<Centroid>> {
    Init::FirstDistinct.initialize(points, k)
}

fn plus_plus(distinct: &[Coordinate], k: usize, rng: &mut impl Rng) -> Vec<Coordinate> {
    let n = distinct.len();
    let mut chosen = Vec::with_capacity(k);
    chosen.push(distinct[rng.random_range(0..n)]);

    let mut min_dist: Vec<f64> = distinct
        .iter()
        .map(|&c| squared_distance(c, chosen[0]))
        .collect();

    while chosen.len() < k {
        let total: f64 = min_dist.iter().sum();
        // Distinct coordinates guarantee a positive total while k <= n.
        let threshold = rng.random::<f64>() * total;
        let mut cumsum = 0.0;
        let mut selected = None;
        for (j, &d) in min_dist.iter().enumerate() {
            if d <= 0.0 {
                continue;
            }
            selected = Some(j);
            cumsum += d;
            if cumsum >= threshold {
                break;
            }
        }

        let Some(selected) = selected else { break };
        let next = distinct[selected];
        chosen.push(next);
        for (d, &c) in min_dist.iter_mut().zip(distinct) {
            *d = d.min(squared_distance(c, next));
        }
    }

    chosen
}

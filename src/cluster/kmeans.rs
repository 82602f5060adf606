//! K-means partitioning (Lloyd's algorithm).
//!
//! # The Algorithm
//!
//! 1. Seed K centroids (see [`Init`]).
//! 2. **Assign**: every point goes to its nearest centroid.
//! 3. **Update**: every centroid moves to the mean of its members.
//! 4. Stop when the centroids stop moving (within a threshold) or the
//!    iteration cap is hit.
//!
//! ```text
//! Initialized ──► Iterating ──► Converged
//!                     │
//!                     └───────► IterationLimitReached
//! ```
//!
//! Both terminal states yield labels. Running out of iterations is not an
//! error; the last centroids are still a usable partition.
//!
//! ## Determinism
//!
//! - Ties in the assignment step go to the lowest centroid index.
//! - A cluster that loses all of its members keeps its previous coordinate.
//!   It is never reseeded, so no randomness enters after initialization.
//! - The default seeding ([`Init::FirstDistinct`]) is deterministic; the
//!   random policies take an explicit seed.
//!
//! ## Complexity
//!
//! - **Time**: O(n · K) per pass.
//! - **Space**: O(n + K).

use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::distance::{distance, squared_distance, Metric};
use super::init::Init;
use super::point::{distinct_coordinates, ensure_unique_ids, Centroid, Coordinate, Point};
use super::traits::Clustering;
use crate::error::{Error, Result};

/// Default convergence threshold, in degrees of total centroid movement.
pub const DEFAULT_THRESHOLD: f64 = 0.05;

/// Default cap on Lloyd passes.
pub const DEFAULT_MAX_ITERATIONS: usize = 96;

/// Stopping rule evaluated after every update step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Convergence {
    /// Sum of per-centroid displacements is at most the threshold.
    #[default]
    TotalShift,
    /// Largest single centroid displacement is at most the threshold.
    MaxShift,
    /// Fewer than `threshold * n` points changed cluster in the last pass.
    ///
    /// The threshold is a fraction in `(0, 1)` under this rule.
    Reassigned,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The stopping rule was satisfied.
    Converged,
    /// The iteration cap was exhausted first.
    IterationLimitReached,
}

/// Nearest-centroid label for every point, in input order.
///
/// Uses Euclidean distance. Exact ties resolve to the lowest index.
pub fn assign(points: &[Point], centroids: &[Centroid]) -> Vec<usize> {
    assign_with(points, centroids, Metric::Euclidean)
}

/// [`assign`] under an arbitrary metric.
#[cfg(not(feature = "parallel"))]
pub fn assign_with(points: &[Point], centroids: &[Centroid], metric: Metric) -> Vec<usize> {
    points
        .iter()
        .map(|p| nearest(p.coordinate, centroids, metric))
        .collect()
}

/// [`assign`] under an arbitrary metric.
///
/// Points are labelled in parallel; each writes only its own slot and the
/// centroids are shared read-only.
#[cfg(feature = "parallel")]
pub fn assign_with(points: &[Point], centroids: &[Centroid], metric: Metric) -> Vec<usize> {
    points
        .par_iter()
        .map(|p| nearest(p.coordinate, centroids, metric))
        .collect()
}

#[inline]
fn nearest(point: Coordinate, centroids: &[Centroid], metric: Metric) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (k, c) in centroids.iter().enumerate() {
        let d = metric.rank(point, c.coordinate);
        // Strict comparison keeps the lowest index on ties.
        if d < best_dist {
            best_dist = d;
            best = k;
        }
    }
    best
}

/// Recompute each centroid as the mean of its members.
///
/// `labels[i]` is the cluster of `points[i]`. A cluster without members keeps
/// its coordinate from `previous`.
pub fn update(points: &[Point], labels: &[usize], previous: &[Centroid]) -> Vec<Centroid> {
    debug_assert_eq!(points.len(), labels.len());

    let k = previous.len();
    let mut sums = vec![(0.0f64, 0.0f64); k];
    let mut counts = vec![0usize; k];

    for (p, &label) in points.iter().zip(labels) {
        debug_assert!(label < k, "label {label} out of range for k = {k}");
        sums[label].0 += p.coordinate.lat;
        sums[label].1 += p.coordinate.lng;
        counts[label] += 1;
    }

    previous
        .iter()
        .zip(sums.iter().zip(&counts))
        .map(|(prev, (&(lat, lng), &count))| {
            if count == 0 {
                return *prev;
            }
            let n = count as f64;
            Centroid {
                index: prev.index,
                coordinate: Coordinate::new(lat / n, lng / n),
            }
        })
        .collect()
}

/// Sum of per-centroid Euclidean displacements.
pub fn total_shift(old: &[Centroid], new: &[Centroid]) -> f64 {
    old.iter()
        .zip(new)
        .map(|(a, b)| distance(a.coordinate, b.coordinate))
        .sum()
}

/// Largest single centroid displacement.
pub fn max_shift(old: &[Centroid], new: &[Centroid]) -> f64 {
    old.iter()
        .zip(new)
        .map(|(a, b)| distance(a.coordinate, b.coordinate))
        .fold(0.0, f64::max)
}

/// True when the total centroid movement is at most `threshold`.
pub fn has_converged(old: &[Centroid], new: &[Centroid], threshold: f64) -> bool {
    total_shift(old, new) <= threshold
}

/// Partition `points` into `k` clusters with the default settings and return
/// the id → cluster index mapping.
///
/// Never fails because of non-convergence; a run that exhausts
/// `max_iterations` still returns its last assignment.
pub fn partition(
    points: &[Point],
    k: usize,
    threshold: f64,
    max_iterations: usize,
) -> Result<BTreeMap<i32, usize>> {
    let fit = Kmeans::new(k)
        .with_threshold(threshold)
        .with_max_iterations(max_iterations)
        .fit(points)?;
    Ok(fit.assignment())
}

/// Cluster count sized to the data: `round(sqrt(n / 2))`, clamped to
/// `[1, distinct coordinates]`. Returns 0 only for empty input.
pub fn suggested_cluster_count(points: &[Point]) -> usize {
    let distinct = distinct_coordinates(points).len();
    if distinct == 0 {
        return 0;
    }
    let k = (points.len() as f64 / 2.0).sqrt().round() as usize;
    k.clamp(1, distinct)
}

/// K-means configuration.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Stopping threshold, interpreted by `convergence`.
    threshold: f64,
    /// Maximum Lloyd passes.
    max_iterations: usize,
    init: Init,
    metric: Metric,
    convergence: Convergence,
}

impl Kmeans {
    /// Create a new K-means partitioner with the default settings.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            threshold: DEFAULT_THRESHOLD,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            init: Init::default(),
            metric: Metric::default(),
            convergence: Convergence::default(),
        }
    }

    /// Set the convergence threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the seeding policy.
    pub fn with_init(mut self, init: Init) -> Self {
        self.init = init;
        self
    }

    /// Set the assignment metric.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the stopping rule.
    pub fn with_convergence(mut self, convergence: Convergence) -> Self {
        self.convergence = convergence;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(Error::InvalidParameter {
                name: "threshold",
                message: "must be finite and non-negative",
            });
        }
        if self.convergence == Convergence::Reassigned
            && !(self.threshold > 0.0 && self.threshold < 1.0)
        {
            return Err(Error::InvalidParameter {
                name: "threshold",
                message: "must lie in (0, 1) when counting reassigned points",
            });
        }
        if self.max_iterations == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iterations",
                message: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Run Lloyd's algorithm to a terminal state.
    pub fn fit(&self, points: &[Point]) -> Result<KmeansFit> {
        if points.is_empty() {
            return Err(Error::EmptyInput);
        }
        self.validate()?;
        ensure_unique_ids(points)?;

        let centroids = self.init.initialize(points, self.k)?;
        let mut state = RunState {
            centroids,
            labels: vec![usize::MAX; points.len()],
            iteration: 0,
            prior_shift: f64::INFINITY,
        };

        let termination = loop {
            let pass = state.step(points, self.metric);
            debug!(
                iteration = state.iteration,
                total_shift = pass.total_shift,
                max_shift = pass.max_shift,
                reassigned = pass.reassigned,
                "lloyd pass"
            );

            let converged = match self.convergence {
                Convergence::TotalShift => pass.total_shift <= self.threshold,
                Convergence::MaxShift => pass.max_shift <= self.threshold,
                Convergence::Reassigned => {
                    (pass.reassigned as f64) < self.threshold * points.len() as f64
                }
            };

            if converged {
                break Termination::Converged;
            }
            if state.iteration >= self.max_iterations {
                break Termination::IterationLimitReached;
            }
        };

        // Report labels that agree with the centroids we hand back.
        let labels = assign_with(points, &state.centroids, self.metric);
        let inertia: f64 = points
            .iter()
            .zip(&labels)
            .map(|(p, &l)| squared_distance(p.coordinate, state.centroids[l].coordinate))
            .sum();

        match termination {
            Termination::Converged => info!(
                k = self.k,
                iterations = state.iteration,
                inertia,
                "k-means converged"
            ),
            Termination::IterationLimitReached => warn!(
                k = self.k,
                iterations = state.iteration,
                last_shift = state.prior_shift,
                "k-means hit the iteration cap before converging"
            ),
        }

        Ok(KmeansFit {
            ids: points.iter().map(|p| p.id).collect(),
            centroids: state.centroids,
            labels,
            iterations: state.iteration,
            termination,
            final_shift: state.prior_shift,
            inertia,
        })
    }
}

impl Default for Kmeans {
    fn default() -> Self {
        Self::new(1)
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, points: &[Point]) -> Result<Vec<usize>> {
        Ok(self.fit(points)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

/// Mutable state of one run. Never outlives [`Kmeans::fit`].
struct RunState {
    centroids: Vec<Centroid>,
    labels: Vec<usize>,
    iteration: usize,
    prior_shift: f64,
}

struct Pass {
    total_shift: f64,
    max_shift: f64,
    reassigned: usize,
}

impl RunState {
    /// One assign/update pass. The update only ever sees a complete
    /// assignment from this pass.
    fn step(&mut self, points: &[Point], metric: Metric) -> Pass {
        let labels = assign_with(points, &self.centroids, metric);
        let reassigned = labels
            .iter()
            .zip(&self.labels)
            .filter(|(new, old)| new != old)
            .count();

        let centroids = update(points, &labels, &self.centroids);
        let pass = Pass {
            total_shift: total_shift(&self.centroids, &centroids),
            max_shift: max_shift(&self.centroids, &centroids),
            reassigned,
        };

        self.centroids = centroids;
        self.labels = labels;
        self.iteration += 1;
        self.prior_shift = pass.total_shift;
        pass
    }
}

/// Outcome of [`Kmeans::fit`].
#[derive(Debug, Clone)]
pub struct KmeansFit {
    ids: Vec<i32>,
    /// Final centroids, `centroids[i].index == i`.
    pub centroids: Vec<Centroid>,
    /// Cluster index of each input point, in input order.
    pub labels: Vec<usize>,
    /// Number of Lloyd passes executed.
    pub iterations: usize,
    /// Why the loop stopped.
    pub termination: Termination,
    /// Total centroid movement during the last pass.
    pub final_shift: f64,
    /// Within-cluster sum of squared distances.
    pub inertia: f64,
}

impl KmeansFit {
    /// Id → cluster index. Every input id appears exactly once.
    pub fn assignment(&self) -> BTreeMap<i32, usize> {
        self.ids.iter().copied().zip(self.labels.iter().copied()).collect()
    }

    /// Member ids of each cluster, indexed by cluster.
    pub fn clusters(&self) -> Vec<Vec<i32>> {
        let mut out = vec![Vec::new(); self.centroids.len()];
        for (&id, &label) in self.ids.iter().zip(&self.labels) {
            out[label].push(id);
        }
        out
    }

    /// Member count of each cluster.
    pub fn sizes(&self) -> Vec<usize> {
        let mut out = vec![0; self.centroids.len()];
        for &label in &self.labels {
            out[label] += 1;
        }
        out
    }

    /// True when the stopping rule was met before the iteration cap.
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn example() -> Vec<Point> {
        vec![
            Point::new(1, 0.0, 0.0),
            Point::new(2, 0.0, 1.0),
            Point::new(3, 10.0, 10.0),
            Point::new(4, 10.0, 11.0),
        ]
    }

    fn centroid(index: usize, lat: f64, lng: f64) -> Centroid {
        Centroid {
            index,
            coordinate: Coordinate::new(lat, lng),
        }
    }

    #[test]
    fn test_partition_example() {
        let mapping = partition(&example(), 2, DEFAULT_THRESHOLD, DEFAULT_MAX_ITERATIONS).unwrap();
        assert_eq!(mapping.len(), 4);
        assert_eq!(mapping[&1], mapping[&2]);
        assert_eq!(mapping[&3], mapping[&4]);
        assert_ne!(mapping[&1], mapping[&3]);
    }

    #[test]
    fn test_fit_example_centroids() {
        let fit = Kmeans::new(2).fit(&example()).unwrap();
        assert!(fit.converged());
        let mut centers: Vec<(f64, f64)> = fit
            .centroids
            .iter()
            .map(|c| (c.coordinate.lat, c.coordinate.lng))
            .collect();
        centers.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(centers, vec![(0.0, 0.5), (10.0, 10.5)]);
        assert!((fit.inertia - 1.0).abs() < 1e-12);
        assert_eq!(fit.sizes(), vec![2, 2]);
    }

    #[test]
    fn test_assign_tie_goes_to_lowest_index() {
        let points = [Point::new(1, 0.0, 0.0)];
        let centroids = [centroid(0, 1.0, 0.0), centroid(1, -1.0, 0.0)];
        assert_eq!(assign(&points, &centroids), vec![0]);

        let centroids = [centroid(0, 5.0, 0.0), centroid(1, 1.0, 0.0), centroid(2, -1.0, 0.0)];
        assert_eq!(assign(&points, &centroids), vec![1]);
    }

    #[test]
    fn test_update_means() {
        let points = example();
        let labels = [0, 0, 1, 1];
        let prev = [centroid(0, 0.0, 0.0), centroid(1, 0.0, 0.0)];
        let next = update(&points, &labels, &prev);
        assert_eq!(next, vec![centroid(0, 0.0, 0.5), centroid(1, 10.0, 10.5)]);
    }

    #[test]
    fn test_update_empty_cluster_keeps_coordinate() {
        let points = example();
        let labels = [0, 0, 0, 0];
        let prev = [centroid(0, 1.0, 1.0), centroid(1, -42.0, 17.5)];
        let next = update(&points, &labels, &prev);
        assert_eq!(next[0], centroid(0, 5.0, 5.5));
        assert_eq!(next[1], prev[1]);
    }

    #[test]
    fn test_fit_with_unreachable_centroid() {
        // The far centroid never wins a point; it must stay put and the run
        // must still terminate normally.
        let far = Coordinate::new(1000.0, 1000.0);
        let fit = Kmeans::new(2)
            .with_init(Init::Explicit(vec![Coordinate::new(0.0, 0.0), far]))
            .fit(&example())
            .unwrap();
        assert_eq!(fit.centroids[1].coordinate, far);
        assert_eq!(fit.sizes(), vec![4, 0]);
        assert!(fit.converged());
    }

    #[test]
    fn test_convergence_monitor() {
        let old = [centroid(0, 0.0, 0.0), centroid(1, 1.0, 1.0)];
        let new = [centroid(0, 0.03, 0.04), centroid(1, 1.0, 1.0)];
        assert!((total_shift(&old, &new) - 0.05).abs() < 1e-12);
        assert!(has_converged(&old, &new, 0.05 + 1e-12));
        assert!(!has_converged(&old, &new, 0.04));
        assert!(has_converged(&old, &old, 0.0));

        let new = [centroid(0, 0.03, 0.04), centroid(1, 1.0, 1.1)];
        assert!((max_shift(&old, &new) - 0.1).abs() < 1e-12);
        assert!(total_shift(&old, &new) > max_shift(&old, &new));
    }

    #[test]
    fn test_iteration_limit_is_not_an_error() {
        let points: Vec<Point> = (0..40)
            .map(|i| Point::new(i, (i % 7) as f64, (i / 7) as f64 * 1.3))
            .collect();
        let fit = Kmeans::new(4)
            .with_threshold(0.0)
            .with_max_iterations(1)
            .fit(&points)
            .unwrap();
        assert_eq!(fit.iterations, 1);
        assert_eq!(fit.termination, Termination::IterationLimitReached);
        assert_eq!(fit.assignment().len(), points.len());
    }

    #[test]
    fn test_k_one_all_zero() {
        let mapping = partition(&example(), 1, DEFAULT_THRESHOLD, DEFAULT_MAX_ITERATIONS).unwrap();
        assert!(mapping.values().all(|&l| l == 0));
    }

    #[test]
    fn test_k_equals_distinct_points() {
        let mapping = partition(&example(), 4, DEFAULT_THRESHOLD, DEFAULT_MAX_ITERATIONS).unwrap();
        let unique: HashSet<_> = mapping.values().collect();
        assert_eq!(unique.len(), 4);
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(partition(&[], 1, 0.05, 10), Err(Error::EmptyInput));
        assert_eq!(
            partition(&example(), 0, 0.05, 10),
            Err(Error::InvalidClusterCount {
                requested: 0,
                distinct: 4
            })
        );
        assert!(matches!(
            partition(&example(), 5, 0.05, 10),
            Err(Error::InvalidClusterCount { requested: 5, .. })
        ));
        assert!(matches!(
            partition(&example(), 2, -1.0, 10),
            Err(Error::InvalidParameter { name: "threshold", .. })
        ));
        assert!(matches!(
            partition(&example(), 2, 0.05, 0),
            Err(Error::InvalidParameter { name: "max_iterations", .. })
        ));

        let mut dup = example();
        dup.push(Point::new(2, 3.0, 3.0));
        assert_eq!(partition(&dup, 2, 0.05, 10), Err(Error::DuplicateId { id: 2 }));
    }

    #[test]
    fn test_duplicate_coordinates_limit_k() {
        let points = vec![
            Point::new(1, 0.0, 0.0),
            Point::new(2, 0.0, 0.0),
            Point::new(3, 0.0, 0.0),
        ];
        assert!(matches!(
            partition(&points, 2, 0.05, 10),
            Err(Error::InvalidClusterCount {
                requested: 2,
                distinct: 1
            })
        ));
    }

    #[test]
    fn test_reassigned_rule() {
        let fit = Kmeans::new(2)
            .with_convergence(Convergence::Reassigned)
            .fit(&example())
            .unwrap();
        assert!(fit.converged());
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_ne!(fit.labels[0], fit.labels[2]);

        let err = Kmeans::new(2)
            .with_convergence(Convergence::Reassigned)
            .with_threshold(1.5)
            .fit(&example());
        assert!(err.is_err());
    }

    #[test]
    fn test_max_shift_rule() {
        let fit = Kmeans::new(2)
            .with_convergence(Convergence::MaxShift)
            .with_threshold(0.0)
            .fit(&example())
            .unwrap();
        assert_eq!(fit.termination, Termination::Converged);
        assert_eq!(fit.labels, vec![0, 0, 1, 1]);
        assert_eq!(fit.centroids[0], centroid(0, 0.0, 0.5));
        assert_eq!(fit.centroids[1], centroid(1, 10.0, 10.5));

        // The first pass drags centroid 1 across the plane.
        let capped = Kmeans::new(2)
            .with_convergence(Convergence::MaxShift)
            .with_max_iterations(1)
            .fit(&example())
            .unwrap();
        assert_eq!(capped.termination, Termination::IterationLimitReached);
    }

    #[test]
    fn test_clusters_partition_ids() {
        let fit = Kmeans::new(2).fit(&example()).unwrap();
        let mut members = fit.clusters();
        for m in &mut members {
            m.sort_unstable();
        }
        members.sort();
        assert_eq!(members, vec![vec![1, 2], vec![3, 4]]);
    }

    #[test]
    fn test_manhattan_metric_separates_example() {
        let labels = Kmeans::new(2)
            .with_metric(Metric::Manhattan)
            .fit_predict(&example())
            .unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn test_suggested_cluster_count() {
        assert_eq!(suggested_cluster_count(&[]), 0);
        assert_eq!(suggested_cluster_count(&example()[..1]), 1);
        assert_eq!(suggested_cluster_count(&example()), 1);

        let grid: Vec<Point> = (0..200).map(|i| Point::new(i, i as f64, 0.0)).collect();
        assert_eq!(suggested_cluster_count(&grid), 10);

        let same: Vec<Point> = (0..200).map(|i| Point::new(i, 1.0, 1.0)).collect();
        assert_eq!(suggested_cluster_count(&same), 1);
    }
}

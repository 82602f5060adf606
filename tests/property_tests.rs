use std::collections::HashSet;

use geocluster::cluster::{distance, Clustering, Coordinate, Init, Kmeans, Point};
use proptest::prelude::*;

fn points_strategy() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec((-90.0f64..90.0, -180.0f64..180.0), 1..40).prop_map(|coords| {
        coords
            .into_iter()
            .enumerate()
            .map(|(i, (lat, lng))| Point::new(i as i32 * 3 + 1, lat, lng))
            .collect()
    })
}

fn distinct(points: &[Point]) -> usize {
    points
        .iter()
        // `+ 0.0` folds -0.0 onto 0.0
        .map(|p| ((p.coordinate.lat + 0.0).to_bits(), (p.coordinate.lng + 0.0).to_bits()))
        .collect::<HashSet<_>>()
        .len()
}

proptest! {
    #[test]
    fn prop_kmeans_all_assigned(points in points_strategy(), k in 1usize..6) {
        // Skip if k exceeds the distinct coordinates
        if k <= distinct(&points) {
            let fit = Kmeans::new(k).fit(&points).unwrap();
            let mapping = fit.assignment();

            prop_assert_eq!(mapping.len(), points.len());
            for p in &points {
                prop_assert!(mapping[&p.id] < k);
            }
        }
    }

    #[test]
    fn prop_kmeans_deterministic(points in points_strategy(), k in 1usize..6, seed in any::<u64>()) {
        if k <= distinct(&points) {
            for init in [Init::FirstDistinct, Init::PlusPlus { seed }, Init::Random { seed }] {
                let model = Kmeans::new(k).with_init(init);
                prop_assert_eq!(model.fit_predict(&points).unwrap(), model.fit_predict(&points).unwrap());
            }
        }
    }

    #[test]
    fn prop_labels_are_nearest_centroid(points in points_strategy(), k in 1usize..6) {
        if k <= distinct(&points) {
            let fit = Kmeans::new(k).fit(&points).unwrap();
            for (p, &label) in points.iter().zip(&fit.labels) {
                let own = distance(p.coordinate, fit.centroids[label].coordinate);
                for c in &fit.centroids {
                    prop_assert!(own <= distance(p.coordinate, c.coordinate));
                }
            }
        }
    }

    #[test]
    fn prop_distance_symmetric(a in (-90.0f64..90.0, -180.0f64..180.0), b in (-90.0f64..90.0, -180.0f64..180.0)) {
        let (a, b) = (Coordinate::from(a), Coordinate::from(b));
        prop_assert_eq!(distance(a, b), distance(b, a));
        prop_assert_eq!(distance(a, a), 0.0);
        prop_assert!(distance(a, b) >= 0.0);
    }
}

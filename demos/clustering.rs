//! K-means on three small groups of places.

use geocluster::cluster::{Init, Kmeans, Point};
use geocluster::records::centroid_records;

fn main() {
    let points = vec![
        // Around New York
        Point::new(1, 40.71, -74.00),
        Point::new(2, 40.73, -73.99),
        Point::new(3, 40.68, -73.97),
        Point::new(4, 40.76, -73.98),
        // Around Chicago
        Point::new(5, 41.88, -87.63),
        Point::new(6, 41.90, -87.65),
        Point::new(7, 41.85, -87.62),
        Point::new(8, 41.95, -87.66),
        // Around Los Angeles
        Point::new(9, 34.05, -118.24),
        Point::new(10, 34.07, -118.25),
        Point::new(11, 34.02, -118.28),
        Point::new(12, 34.10, -118.33),
    ];

    let fit = Kmeans::new(3)
        .with_init(Init::PlusPlus { seed: 42 })
        .fit(&points)
        .unwrap();

    println!(
        "=== K-means (k=3): {:?} after {} iterations ===",
        fit.termination, fit.iterations
    );
    for (p, label) in points.iter().zip(&fit.labels) {
        println!(
            "  point {:2} ({:6.2}, {:7.2}) => cluster {}",
            p.id, p.coordinate.lat, p.coordinate.lng, label
        );
    }

    println!("\n=== Centroids ===");
    for row in centroid_records(&fit) {
        println!(
            "  cluster {} at ({:6.2}, {:7.2}) with {} points",
            row.cluster, row.lat, row.lng, row.size
        );
    }
}

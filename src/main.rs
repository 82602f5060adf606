//! geocluster CLI
//!
//! Reads a JSON array of `{id, lat, lng}` points, partitions them with k-means
//! and writes a JSON object mapping each id to its cluster index.
//!
//! ```text
//! geocluster 8 centroids.json clusters.json
//! geocluster auto centroids.json clusters.json --init plus-plus --seed 7 -v
//! ```
//!
//! Any failure is reported on stderr and the process exits with status 1.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use geocluster::cluster::{
    suggested_cluster_count, Convergence, Init, Kmeans, Metric, DEFAULT_MAX_ITERATIONS,
    DEFAULT_THRESHOLD,
};
use geocluster::records;

/// Partition latitude/longitude points into clusters with k-means.
#[derive(Parser, Debug)]
#[command(name = "geocluster", version, about)]
struct Cli {
    /// Number of clusters, or `auto` for round(sqrt(n / 2))
    clusters: ClusterCount,

    /// Input JSON file: [{"id": 1, "lat": 0.0, "lng": 0.0}, ...]
    input: PathBuf,

    /// Output JSON file: {"<id>": <cluster index>, ...}
    output: PathBuf,

    /// Convergence threshold (degrees of centroid movement, or a fraction of
    /// reassigned points with `--convergence reassigned`)
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Maximum number of Lloyd iterations
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,

    /// Centroid seeding policy
    #[arg(long, value_enum, default_value_t = InitArg::FirstDistinct)]
    init: InitArg,

    /// Seed for the `random` and `plus-plus` seeding policies
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Stopping rule
    #[arg(long, value_enum, default_value_t = ConvergenceArg::TotalShift)]
    convergence: ConvergenceArg,

    /// Distance used to pick the nearest centroid
    #[arg(long, value_enum, default_value_t = MetricArg::Euclidean)]
    metric: MetricArg,

    /// Also write the final centroids to this JSON file
    #[arg(long)]
    centroids: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ClusterCount {
    Auto,
    Fixed(usize),
}

impl FromStr for ClusterCount {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            return Ok(ClusterCount::Auto);
        }
        match s.parse::<usize>() {
            Ok(0) => Err("cluster count must be positive".to_string()),
            Ok(k) => Ok(ClusterCount::Fixed(k)),
            Err(_) => Err(format!("expected a positive integer or `auto`, got `{s}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum InitArg {
    FirstDistinct,
    Strided,
    Random,
    PlusPlus,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConvergenceArg {
    TotalShift,
    MaxShift,
    Reassigned,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MetricArg {
    Euclidean,
    Manhattan,
}

impl Cli {
    fn init(&self) -> Init {
        match self.init {
            InitArg::FirstDistinct => Init::FirstDistinct,
            InitArg::Strided => Init::Strided,
            InitArg::Random => Init::Random { seed: self.seed },
            InitArg::PlusPlus => Init::PlusPlus { seed: self.seed },
        }
    }

    fn convergence(&self) -> Convergence {
        match self.convergence {
            ConvergenceArg::TotalShift => Convergence::TotalShift,
            ConvergenceArg::MaxShift => Convergence::MaxShift,
            ConvergenceArg::Reassigned => Convergence::Reassigned,
        }
    }

    fn metric(&self) -> Metric {
        match self.metric {
            MetricArg::Euclidean => Metric::Euclidean,
            MetricArg::Manhattan => Metric::Manhattan,
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let points = records::load_points(&cli.input)
        .with_context(|| format!("failed to read points from {}", cli.input.display()))?;

    let k = match cli.clusters {
        ClusterCount::Fixed(k) => k,
        ClusterCount::Auto => suggested_cluster_count(&points),
    };
    info!(
        points = points.len(),
        k,
        input = %cli.input.display(),
        output = %cli.output.display(),
        "partitioning"
    );

    let fit = Kmeans::new(k)
        .with_threshold(cli.threshold)
        .with_max_iterations(cli.max_iterations)
        .with_init(cli.init())
        .with_convergence(cli.convergence())
        .with_metric(cli.metric())
        .fit(&points)
        .context("partitioning failed")?;

    records::save_assignment(&cli.output, &fit.assignment())
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    if let Some(path) = &cli.centroids {
        records::save_centroids(path, &fit)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    info!(
        iterations = fit.iterations,
        termination = ?fit.termination,
        inertia = fit.inertia,
        "done"
    );
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(&cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

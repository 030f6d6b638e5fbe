//! NitroGIS CLI - well nitrate vs. tract disease rate analysis

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use nitrogis_algorithms::interpolation::{grid_to_features, idw, sample_points, GridParams, IdwParams};
use nitrogis_algorithms::statistics::RegressionResult;
use nitrogis_algorithms::vector::{collection_bounds, BoundingBox};
use nitrogis_core::FeatureCollection;
use nitrogis_pipeline::{spawn_analysis, AnalysisConfig, AnalysisMessage, AnalysisRequest};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "nitrogis")]
#[command(author, version, about = "Correlate well nitrate levels with tract disease rates", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis on a request file
    Run {
        /// Request JSON (measurementPoints, regions, interpolationPower, boundingBox)
        #[arg(short, long)]
        request: PathBuf,
        /// Write the result message here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Analysis configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the request's interpolation power
        #[arg(short, long)]
        power: Option<f64>,
        /// Grid spacing in coordinate units
        #[arg(long)]
        cell_size: Option<f64>,
        /// IDW search radius in coordinate units
        #[arg(long)]
        radius: Option<f64>,
        /// Most samples weighted per grid point
        #[arg(long)]
        max_points: Option<usize>,
        /// Ignore the search radius and weight every sample
        #[arg(long, conflicts_with = "radius")]
        unbounded: bool,
    },
    /// Build a request file from two GeoJSON files
    Assemble {
        /// Measurement points (GeoJSON FeatureCollection)
        #[arg(long)]
        points: PathBuf,
        /// Region polygons (GeoJSON FeatureCollection)
        #[arg(long)]
        regions: PathBuf,
        /// IDW distance exponent
        #[arg(short, long, default_value = "2.0")]
        power: f64,
        /// Bounding box as west,south,east,north (default: extent of the points)
        #[arg(short, long, allow_hyphen_values = true)]
        bbox: Option<String>,
        /// Output request file
        #[arg(long)]
        out: PathBuf,
    },
    /// Interpolate measurement points onto a grid
    Interpolate {
        /// Measurement points (GeoJSON FeatureCollection)
        #[arg(long)]
        points: PathBuf,
        /// Bounding box as west,south,east,north
        #[arg(short, long, allow_hyphen_values = true)]
        bbox: String,
        /// IDW distance exponent
        #[arg(short, long, default_value = "2.0")]
        power: f64,
        /// Grid spacing in coordinate units
        #[arg(long)]
        cell_size: Option<f64>,
        /// Output grid (GeoJSON FeatureCollection)
        #[arg(long)]
        out: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {}", e);
    }
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn percent_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{bar:40.cyan/blue} {pos:>3}% {msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb
}

fn read_features(path: &Path) -> Result<FeatureCollection> {
    let pb = spinner(&format!("Reading {}...", path.display()));
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let features = FeatureCollection::from_geojson_str(&text)
        .with_context(|| format!("Failed to parse GeoJSON from {}", path.display()))?;
    pb.finish_and_clear();
    info!("{}: {} features", path.display(), features.len());
    Ok(features)
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_bbox(s: &str) -> Result<BoundingBox> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        anyhow::bail!("Bounding box must be 'west,south,east,north', got: {}", s);
    }
    let mut values = [0.0; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .with_context(|| format!("Invalid bounding box value: {}", part))?;
    }
    let bbox = BoundingBox::from_array(values);
    if !bbox.is_finite() {
        anyhow::bail!("Bounding box values must be finite, got: {}", s);
    }
    Ok(bbox)
}

fn print_regression(regression: Option<&RegressionResult>) {
    let Some(r) = regression else {
        println!("Regression: insufficient data (fewer than 3 valid regions)");
        return;
    };
    println!("Regression over {} regions:", r.n);
    println!("  rate = {:.6} * nitrate + {:.6}", r.slope, r.intercept);
    println!("  R²: {:.4}", r.r_squared);
    println!("  Correlation: {:.4}", r.correlation);
    println!(
        "  Residuals: mean {:.4}, std {:.4}, range [{:.4}, {:.4}]",
        r.residuals.mean, r.residuals.standard_deviation, r.residuals.min, r.residuals.max
    );
}

// ─── Commands ───────────────────────────────────────────────────────────

struct RunOverrides {
    power: Option<f64>,
    cell_size: Option<f64>,
    radius: Option<f64>,
    max_points: Option<usize>,
    unbounded: bool,
}

fn load_config(path: Option<&Path>, overrides: &RunOverrides) -> Result<AnalysisConfig> {
    let mut config = match path {
        Some(p) => AnalysisConfig::load(p)
            .with_context(|| format!("Failed to load configuration {}", p.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(cell) = overrides.cell_size {
        config.grid.cell_size = cell;
    }
    if let Some(r) = overrides.radius {
        config.idw.max_radius = Some(r);
    }
    if overrides.unbounded {
        config.idw.max_radius = None;
    }
    if let Some(k) = overrides.max_points {
        config.idw.max_points = Some(k);
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run(
    request_path: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    overrides: RunOverrides,
) -> Result<()> {
    let config = load_config(config_path, &overrides)?;
    let mut request = AnalysisRequest::from_path(request_path)
        .with_context(|| format!("Failed to read request {}", request_path.display()))?;
    if let Some(p) = overrides.power {
        request.interpolation_power = Some(p);
    }

    let start = Instant::now();
    let handle = spawn_analysis(request, config).context("Failed to start analysis")?;
    let pb = percent_bar();
    let terminal = handle.wait(|p| {
        pb.set_position(p.percent.round() as u64);
        pb.set_message(p.message);
    });
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    let json = terminal.to_json_pretty().context("Failed to serialize result")?;
    match output {
        Some(path) => {
            write_text(path, &json)?;
            done("Result", path, elapsed);
        }
        None => println!("{}", json),
    }

    match terminal {
        AnalysisMessage::Complete {
            updated_regions,
            regression,
            ..
        } => {
            if output.is_some() {
                println!("Regions: {}", updated_regions.len());
                print_regression(regression.as_ref());
            }
            Ok(())
        }
        AnalysisMessage::Error { message, .. } => anyhow::bail!("Analysis failed: {}", message),
        AnalysisMessage::Progress(_) => anyhow::bail!("Analysis ended without a result"),
    }
}

fn assemble(points: &Path, regions: &Path, power: f64, bbox: Option<&str>, out: &Path) -> Result<()> {
    let points = read_features(points)?;
    let regions = read_features(regions)?;
    let bbox = match bbox {
        Some(s) => parse_bbox(s)?,
        None => collection_bounds(&points).context("Measurement points have no extent")?,
    };

    let request = AnalysisRequest::new(points, regions, power, bbox);
    request.validate().context("Assembled request is invalid")?;
    write_text(out, &request.to_json().context("Failed to serialize request")?)?;

    let [w, s, e, n] = bbox.to_array();
    println!("Request saved to: {}", out.display());
    println!("  Bounding box: [{:.6}, {:.6}, {:.6}, {:.6}]", w, s, e, n);
    Ok(())
}

fn interpolate(points: &Path, bbox: &str, power: f64, cell_size: Option<f64>, out: &Path) -> Result<()> {
    let config = AnalysisConfig::default();
    let bbox = parse_bbox(bbox)?;
    let features = read_features(points)?;
    let samples = sample_points(&features, &config.properties.measurement)
        .context("Failed to read measurement points")?;

    let start = Instant::now();
    let grid_params = GridParams {
        cell_size: cell_size.unwrap_or(config.grid.cell_size),
        ..config.grid
    };
    let grid = grid_params.grid(bbox).context("Invalid grid")?;
    info!("Created grid with {} points", grid.len());
    let params = IdwParams {
        power,
        ..config.idw
    };
    let pb = spinner("Interpolating...");
    let values = idw(&samples, &grid, &params).context("Interpolation failed")?;
    pb.finish_and_clear();

    let collection = grid_to_features(&values, &config.properties.grid_value);
    write_text(out, &collection.to_geojson_string().context("Failed to serialize grid")?)?;
    done("Grid", out, start.elapsed());
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            request,
            output,
            config,
            power,
            cell_size,
            radius,
            max_points,
            unbounded,
        } => run(
            &request,
            output.as_deref(),
            config.as_deref(),
            RunOverrides {
                power,
                cell_size,
                radius,
                max_points,
                unbounded,
            },
        ),

        Commands::Assemble {
            points,
            regions,
            power,
            bbox,
            out,
        } => assemble(&points, &regions, power, bbox.as_deref(), &out),

        Commands::Interpolate {
            points,
            bbox,
            power,
            cell_size,
            out,
        } => interpolate(&points, &bbox, power, cell_size, &out),
    }
}

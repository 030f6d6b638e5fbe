//! Runs the analysis stages in sequence.
//!
//! [`run_analysis`] validates the request, then runs grid construction, IDW,
//! zonal aggregation and regression, reporting progress at each stage
//! boundary. [`execute`] wraps it in the failure boundary: every outcome,
//! including a panic, ends in exactly one terminal [`AnalysisMessage`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use nitrogis_algorithms::interpolation::{grid_to_features, idw, sample_points, IdwParams};
use nitrogis_algorithms::statistics::{aggregate_regions, regression_analysis, RegressionResult};
use nitrogis_core::{FeatureCollection, Progress, Result};
use tracing::{error, info};

use crate::config::AnalysisConfig;
use crate::protocol::{AnalysisMessage, AnalysisRequest};

/// Result of a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutput {
    /// Grid points carrying the interpolated value
    pub interpolated_grid: FeatureCollection,
    /// Copy of the input regions with aggregation results
    pub updated_regions: FeatureCollection,
    pub regression: Option<RegressionResult>,
}

impl From<AnalysisOutput> for AnalysisMessage {
    fn from(output: AnalysisOutput) -> Self {
        AnalysisMessage::Complete {
            interpolated_grid: output.interpolated_grid,
            updated_regions: output.updated_regions,
            regression: output.regression,
        }
    }
}

/// Validate the request and run every stage.
///
/// Nothing is reported through `on_progress` when validation fails.
pub fn run_analysis(
    request: &AnalysisRequest,
    config: &AnalysisConfig,
    mut on_progress: impl FnMut(Progress),
) -> Result<AnalysisOutput> {
    let input = request.validate()?;
    config.validate()?;
    let milestones = &config.milestones;
    let keys = &config.properties;
    let start = Instant::now();

    on_progress(Progress::new("Starting IDW interpolation...", milestones.started));

    let points = sample_points(input.measurement_points, &keys.measurement)?;
    let grid = config.grid.grid(input.bbox)?;
    info!("Created grid with {} points", grid.len());

    let params = IdwParams {
        power: input.power,
        ..config.idw.clone()
    };
    let values = idw(&points, &grid, &params)?;
    info!("IDW completed for {} grid points from {} samples", values.len(), points.len());

    on_progress(Progress::new(
        "IDW complete. Starting zonal aggregation...",
        milestones.interpolated,
    ));

    let zonal = aggregate_regions(input.regions, &values, &config.zonal, keys, &mut on_progress);

    on_progress(Progress::new(
        "Aggregation complete. Running regression...",
        milestones.aggregated,
    ));

    let regression = regression_analysis(&zonal.regions, &config.regression, keys);

    on_progress(Progress::new("Analysis complete!", milestones.finished));
    info!("Analysis completed in {:.2}s", start.elapsed().as_secs_f64());

    Ok(AnalysisOutput {
        interpolated_grid: grid_to_features(&values, &keys.grid_value),
        updated_regions: zonal.regions,
        regression,
    })
}

/// Run the analysis and deliver every message to `sink`.
///
/// `sink` receives the progress messages followed by exactly one
/// `Complete` or `Error` message. Errors and panics inside the pipeline
/// become an `Error` message.
pub fn execute(
    request: &AnalysisRequest,
    config: &AnalysisConfig,
    mut sink: impl FnMut(AnalysisMessage),
) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        run_analysis(request, config, |p| sink(AnalysisMessage::Progress(p)))
    }));

    let terminal = match outcome {
        Ok(Ok(output)) => output.into(),
        Ok(Err(e)) => {
            error!("Analysis failed: {}", e);
            AnalysisMessage::error(e.to_string())
        }
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            error!("Analysis panicked: {}", reason);
            AnalysisMessage::error(format!("Analysis failed: {}", reason))
        }
    };
    sink(terminal);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

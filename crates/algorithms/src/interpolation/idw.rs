//! Inverse Distance Weighting (IDW) interpolation
//!
//! Estimates values at unknown locations as a weighted average of nearby
//! sample points, where weights are inversely proportional to distance
//! raised to a power parameter.
//!
//! The search is bounded: only samples within `max_radius` take part, and
//! of those only the `max_points` nearest. A location with no sample in
//! range takes the value of the globally nearest sample, so every grid
//! point receives a defined value.
//!
//! Distances are planar Euclidean in the units of the input coordinates.
//! For longitude/latitude input this ignores the shrinking of a degree of
//! longitude away from the equator.
//!
//! Reference:
//! Shepard, D. (1968). A two-dimensional interpolation function for
//! irregularly-spaced data. ACM National Conference.

use nitrogis_core::{Algorithm, Error, Feature, FeatureCollection, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{RegularGrid, SamplePoint};

/// Parameters for IDW interpolation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdwParams {
    /// Power parameter (default: 2.0).
    /// Higher values give more weight to nearby points.
    pub power: f64,
    /// Maximum search radius (default: 0.3). Points beyond this distance
    /// are ignored. `None` means all points are used (global IDW).
    pub max_radius: Option<f64>,
    /// Maximum number of nearest points to use (default: 8).
    /// `None` means use all points within radius.
    pub max_points: Option<usize>,
    /// Minimum distance threshold (default: 0.001). If the nearest sample
    /// is closer than this to the target location, its value is used
    /// directly (avoids singularity).
    pub snap_distance: f64,
}

impl Default for IdwParams {
    fn default() -> Self {
        Self {
            power: 2.0,
            max_radius: Some(0.3),
            max_points: Some(8),
            snap_distance: 0.001,
        }
    }
}

impl IdwParams {
    /// Check that every parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.power.is_finite() || self.power <= 0.0 {
            return Err(Error::invalid_parameter("power", self.power, "must be a positive number"));
        }
        if let Some(r) = self.max_radius {
            if !r.is_finite() || r < 0.0 {
                return Err(Error::invalid_parameter("max_radius", r, "must be a non-negative number"));
            }
        }
        if self.max_points == Some(0) {
            return Err(Error::invalid_parameter("max_points", 0, "must be at least 1"));
        }
        if !self.snap_distance.is_finite() || self.snap_distance < 0.0 {
            return Err(Error::invalid_parameter(
                "snap_distance",
                self.snap_distance,
                "must be a non-negative number",
            ));
        }
        Ok(())
    }
}

/// An interpolated grid location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridValue {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

/// Perform IDW interpolation from scattered points onto a regular grid.
///
/// # Algorithm
///
/// For each grid location (x, y):
///
/// ```text
/// z(x,y) = Σ(wi * zi) / Σ(wi)
/// where wi = 1 / d(x,y, xi,yi)^p
/// ```
///
/// over the `max_points` nearest samples within `max_radius`.
///
/// # Arguments
/// * `points` - Scattered sample points with values
/// * `grid` - Locations to estimate
/// * `params` - IDW parameters (power, radius, neighbor count, snap distance)
///
/// # Returns
/// One value per grid location, in grid order.
pub fn idw(points: &[SamplePoint], grid: &RegularGrid, params: &IdwParams) -> Result<Vec<GridValue>> {
    if points.is_empty() {
        return Err(Error::Algorithm("No sample points provided".into()));
    }
    params.validate()?;

    let mut candidates: Vec<(f64, f64)> = Vec::with_capacity(points.len());
    let mut fallbacks = 0usize;

    let values: Vec<GridValue> = grid
        .iter()
        .map(|(x, y)| {
            let (value, fallback) = estimate(points, x, y, params, &mut candidates);
            fallbacks += usize::from(fallback);
            GridValue { x, y, value }
        })
        .collect();

    debug!(
        "IDW estimated {} locations from {} samples ({} outside search radius)",
        values.len(),
        points.len(),
        fallbacks
    );

    Ok(values)
}

/// Estimate one location. Returns the value and whether the nearest-sample
/// fallback was used.
///
/// `candidates` is scratch space reused across calls.
fn estimate(
    points: &[SamplePoint],
    x: f64,
    y: f64,
    params: &IdwParams,
    candidates: &mut Vec<(f64, f64)>,
) -> (f64, bool) {
    candidates.clear();

    let mut nearest_dist = f64::INFINITY;
    let mut nearest_value = points[0].value;

    for pt in points {
        let d = pt.dist(x, y);
        if d < nearest_dist {
            nearest_dist = d;
            nearest_value = pt.value;
        }
        if params.max_radius.map_or(true, |r| d <= r) {
            candidates.push((d, pt.value));
        }
    }

    if candidates.is_empty() {
        return (nearest_value, true);
    }

    candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

    let (closest, closest_value) = candidates[0];
    if closest < params.snap_distance {
        return (closest_value, false);
    }

    if let Some(k) = params.max_points {
        candidates.truncate(k);
    }

    let mut sum_w = 0.0;
    let mut sum_wz = 0.0;
    for &(d, value) in candidates.iter() {
        let w = 1.0 / d.powf(params.power);
        sum_w += w;
        sum_wz += w * value;
    }

    if sum_w > 0.0 && sum_w.is_finite() {
        (sum_wz / sum_w, false)
    } else {
        (nearest_value, true)
    }
}

/// Build point features carrying the interpolated value under `value_key`.
pub fn grid_to_features(values: &[GridValue], value_key: &str) -> FeatureCollection {
    values
        .iter()
        .map(|g| Feature::point(g.x, g.y).with_property(value_key, g.value))
        .collect()
}

/// Input for the [`Idw`] algorithm
#[derive(Debug, Clone)]
pub struct IdwInput {
    pub points: Vec<SamplePoint>,
    pub grid: RegularGrid,
}

/// IDW algorithm
#[derive(Debug, Clone, Default)]
pub struct Idw;

impl Algorithm for Idw {
    type Input = IdwInput;
    type Output = Vec<GridValue>;
    type Params = IdwParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "IDW"
    }

    fn description(&self) -> &'static str {
        "Inverse Distance Weighting interpolation with bounded radius and neighbor count"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        idw(&input.points, &input.grid, &params)
    }
}

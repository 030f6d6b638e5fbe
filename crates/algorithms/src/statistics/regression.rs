//! Ordinary least-squares regression between two region variables
//!
//! Relates the aggregated interpolated value of each region (independent
//! variable) to a rate property carried by the region (dependent variable).
//! Only regions with strictly positive values for both variables and at least
//! one contributing grid point take part.
//!
//! Descriptive statistics use the sample (n-1) definitions from `statrs`.

use nitrogis_core::{Algorithm, Error, FeatureCollection, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use statrs::statistics::Statistics;
use tracing::{debug, info, warn};

use crate::keys::PropertyKeys;

/// Parameters for the regression analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionParams {
    /// Fewest valid region pairs that produce a result (default: 3)
    pub min_pairs: usize,
}

impl Default for RegressionParams {
    fn default() -> Self {
        Self { min_pairs: 3 }
    }
}

/// One region's contribution to the fit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSample {
    pub region_id: Value,
    pub independent: f64,
    pub dependent: f64,
    pub point_count: usize,
}

/// Summary of the fit residuals (observed - predicted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResidualStats {
    pub values: Vec<f64>,
    pub mean: f64,
    pub standard_deviation: f64,
    pub min: f64,
    pub max: f64,
}

/// Descriptive statistics of one variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariableStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std: f64,
}

impl VariableStats {
    fn of(values: &[f64]) -> Self {
        Self {
            mean: values.iter().mean(),
            min: Statistics::min(values.iter()),
            max: Statistics::max(values.iter()),
            std: values.iter().std_dev(),
        }
    }
}

/// Result of a linear regression `dependent = slope * independent + intercept`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination, in [0, 1]
    pub r_squared: f64,
    /// Number of region pairs used
    pub n: usize,
    pub residuals: ResidualStats,
    pub independent: VariableStats,
    pub dependent: VariableStats,
    /// Pearson correlation, in [-1, 1]
    pub correlation: f64,
    pub regions: Vec<RegionSample>,
}

impl RegressionResult {
    /// Predicted dependent value for `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Extract the valid (independent, dependent) pairs from aggregated regions.
///
/// A region is kept when its average and rate are both finite and strictly
/// positive and its count is at least 1. The region id is the first
/// non-empty `keys.region_id` property, then the feature id, then the index.
pub fn collect_samples(regions: &FeatureCollection, keys: &PropertyKeys) -> Vec<RegionSample> {
    regions
        .iter()
        .enumerate()
        .filter_map(|(index, feature)| {
            let independent = feature.number_property(&[keys.average.as_str()]).unwrap_or(0.0);
            let dependent = feature.number_property(&keys.disease_rate).unwrap_or(0.0);
            let count = feature.number_property(&[keys.count.as_str()]).unwrap_or(0.0);

            let valid = independent > 0.0 && dependent > 0.0 && count >= 1.0;
            if !valid {
                return None;
            }

            let region_id = feature
                .label_property(&keys.region_id)
                .or(feature.id.as_ref())
                .cloned()
                .unwrap_or_else(|| Value::from(index));

            Some(RegionSample {
                region_id,
                independent,
                dependent,
                point_count: count as usize,
            })
        })
        .collect()
}

/// Fit a least-squares line through the samples.
///
/// Returns `None` when fewer than `params.min_pairs` samples are given, or
/// when every sample has the same independent value and no line is defined.
///
/// A constant dependent variable fits the flat line `y = mean`: slope 0,
/// zero residuals, with `r_squared` and `correlation` both reported as 0.
pub fn linear_regression(
    samples: Vec<RegionSample>,
    params: &RegressionParams,
) -> Option<RegressionResult> {
    let n = samples.len();
    if n < params.min_pairs.max(2) {
        return None;
    }

    let xs: Vec<f64> = samples.iter().map(|s| s.independent).collect();
    let ys: Vec<f64> = samples.iter().map(|s| s.dependent).collect();

    let independent = VariableStats::of(&xs);
    if independent.min == independent.max {
        warn!("Regression skipped: {} pairs share one independent value", n);
        return None;
    }
    let dependent = VariableStats::of(&ys);
    let constant_y = dependent.min == dependent.max;

    let (slope, correlation) = if constant_y {
        debug!("Dependent variable is constant across {} pairs", n);
        (0.0, 0.0)
    } else {
        let cov = xs.iter().covariance(ys.iter());
        let r = cov / (independent.std * dependent.std);
        (cov / xs.iter().variance(), r.clamp(-1.0, 1.0))
    };
    let intercept = dependent.mean - slope * independent.mean;

    let residual_values: Vec<f64> = xs
        .iter()
        .zip(&ys)
        .map(|(x, y)| y - (slope * x + intercept))
        .collect();
    let r_squared = if constant_y {
        0.0
    } else {
        let ss_res: f64 = residual_values.iter().map(|r| r * r).sum();
        let ss_tot = ys.iter().variance() * (n - 1) as f64;
        (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
    };

    let residuals = ResidualStats {
        mean: residual_values.iter().mean(),
        standard_deviation: residual_values.iter().std_dev(),
        min: Statistics::min(residual_values.iter()),
        max: Statistics::max(residual_values.iter()),
        values: residual_values,
    };

    Some(RegressionResult {
        slope,
        intercept,
        r_squared,
        n,
        residuals,
        independent,
        dependent,
        correlation,
        regions: samples,
    })
}

/// Collect valid pairs from the aggregated regions and fit them.
pub fn regression_analysis(
    regions: &FeatureCollection,
    params: &RegressionParams,
    keys: &PropertyKeys,
) -> Option<RegressionResult> {
    let samples = collect_samples(regions, keys);
    info!("Regression on {} valid region pairs", samples.len());
    if samples.len() < params.min_pairs {
        info!(
            "Insufficient data for regression (need at least {} pairs)",
            params.min_pairs
        );
        return None;
    }
    linear_regression(samples, params)
}

/// Regression analysis as an [`Algorithm`]
#[derive(Debug, Clone, Default)]
pub struct RegressionAnalysis {
    pub keys: PropertyKeys,
}

impl Algorithm for RegressionAnalysis {
    type Input = FeatureCollection;
    type Output = Option<RegressionResult>;
    type Params = RegressionParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Regression"
    }

    fn description(&self) -> &'static str {
        "Least-squares regression of region rates on aggregated values"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        Ok(regression_analysis(&input, &params, &self.keys))
    }
}

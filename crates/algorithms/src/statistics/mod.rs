//! Statistical analysis
//!
//! - Zonal aggregation of grid values into polygon regions
//! - Ordinary least-squares regression between two region variables

mod regression;
mod zonal;

pub use regression::{
    collect_samples, linear_regression, regression_analysis, RegionSample, RegressionAnalysis,
    RegressionParams, RegressionResult, ResidualStats, VariableStats,
};
pub use zonal::{
    aggregate_regions, summarize_region, RegionError, RegionOutcome, ZonalOutput, ZonalParams,
    ZonalSummary,
};

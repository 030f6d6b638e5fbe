//! # NitroGIS Algorithms
//!
//! Analysis algorithms for correlating point-sampled measurements with
//! area-aggregated rates.
//!
//! ## Available Algorithm Categories
//!
//! - **interpolation**: regular sampling grid, bounded IDW
//! - **statistics**: polygon zonal aggregation, OLS regression
//! - **vector**: bounding boxes, point-in-polygon

pub mod interpolation;
pub mod keys;
pub mod statistics;
pub mod vector;

pub use keys::PropertyKeys;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::interpolation::{
        grid_to_features, idw, sample_points, GridParams, GridValue, Idw, IdwInput, IdwParams,
        RegularGrid, SamplePoint,
    };
    pub use crate::keys::PropertyKeys;
    pub use crate::statistics::{
        aggregate_regions, linear_regression, regression_analysis, RegionError, RegionSample,
        RegressionAnalysis, RegressionParams, RegressionResult, ZonalOutput, ZonalParams,
        ZonalSummary,
    };
    pub use crate::vector::{bounding_box, contains_point, BoundingBox};
    pub use nitrogis_core::prelude::*;
}

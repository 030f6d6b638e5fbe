//! Spatial interpolation algorithms
//!
//! Interpolate scattered point data onto a regular sampling grid:
//! - Grid: regular lattice of sampling locations over a bounding box
//! - IDW: Inverse Distance Weighting with bounded radius and neighbor count

mod grid;
mod idw;

pub use grid::{GridIter, GridParams, RegularGrid};
pub use idw::{grid_to_features, idw, GridValue, Idw, IdwInput, IdwParams};

use nitrogis_core::{Error, Feature, FeatureCollection, Result};

/// A sample point with x, y coordinates and a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub value: f64,
}

impl SamplePoint {
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    /// Read a sample from a point feature. The value is the first usable
    /// number among `value_keys`; a missing value reads as 0.
    pub fn from_feature<S: AsRef<str>>(feature: &Feature, value_keys: &[S]) -> Result<Self> {
        if let Some(reason) = &feature.geometry_error {
            return Err(Error::InvalidGeometry(reason.clone()));
        }
        let (x, y) = feature.as_point().ok_or_else(|| {
            Error::InvalidGeometry("measurement feature is not a point".into())
        })?;
        let value = feature.number_property(value_keys).unwrap_or(0.0);
        Ok(Self::new(x, y, value))
    }

    /// Squared Euclidean distance to another point
    #[inline]
    pub fn dist_sq(&self, other_x: f64, other_y: f64) -> f64 {
        let dx = self.x - other_x;
        let dy = self.y - other_y;
        dx * dx + dy * dy
    }

    /// Euclidean distance to another point
    #[inline]
    pub fn dist(&self, other_x: f64, other_y: f64) -> f64 {
        self.dist_sq(other_x, other_y).sqrt()
    }
}

/// Read every feature of a point collection as a sample.
///
/// Fails on the first feature that is not a point; the error names its index.
pub fn sample_points<S: AsRef<str>>(
    collection: &FeatureCollection,
    value_keys: &[S],
) -> Result<Vec<SamplePoint>> {
    collection
        .iter()
        .enumerate()
        .map(|(i, f)| {
            SamplePoint::from_feature(f, value_keys).map_err(|e| match e {
                Error::InvalidGeometry(reason) => {
                    Error::InvalidGeometry(format!("feature {}: {}", i, reason))
                }
                other => other,
            })
        })
        .collect()
}

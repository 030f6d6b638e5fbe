//! Request payload and the messages a run sends back.
//!
//! Both are JSON with camelCase keys. The request also accepts the legacy
//! field names `wellData`, `tractData`, `k` and `bbox`.

use std::path::Path;

use nitrogis_algorithms::statistics::RegressionResult;
use nitrogis_algorithms::vector::BoundingBox;
use nitrogis_core::{Error, FeatureCollection, Progress, Result};
use serde::{Deserialize, Serialize};

/// Input for one analysis run.
///
/// Every field is optional at the type level so that an incomplete payload
/// still parses and is rejected by [`AnalysisRequest::validate`] instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Point features carrying a measurement value
    #[serde(alias = "wellData", default)]
    pub measurement_points: Option<FeatureCollection>,
    /// Polygon features carrying a rate value
    #[serde(alias = "tractData", default)]
    pub regions: Option<FeatureCollection>,
    /// IDW distance exponent
    #[serde(alias = "k", default)]
    pub interpolation_power: Option<f64>,
    /// `[west, south, east, north]`
    #[serde(alias = "bbox", default)]
    pub bounding_box: Option<Vec<f64>>,
}

/// A request that passed validation
#[derive(Debug, Clone, Copy)]
pub struct ValidatedRequest<'a> {
    pub measurement_points: &'a FeatureCollection,
    pub regions: &'a FeatureCollection,
    pub power: f64,
    pub bbox: BoundingBox,
}

impl AnalysisRequest {
    pub fn new(
        measurement_points: FeatureCollection,
        regions: FeatureCollection,
        interpolation_power: f64,
        bbox: BoundingBox,
    ) -> Self {
        Self {
            measurement_points: Some(measurement_points),
            regions: Some(regions),
            interpolation_power: Some(interpolation_power),
            bounding_box: Some(bbox.to_array().to_vec()),
        }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check that both datasets are present and non-empty, that the power
    /// is a positive number and that the bounding box holds 4 finite numbers.
    pub fn validate(&self) -> Result<ValidatedRequest<'_>> {
        let measurement_points = self
            .measurement_points
            .as_ref()
            .filter(|fc| !fc.is_empty())
            .ok_or_else(|| Error::InvalidInput("measurement points are missing or empty".into()))?;
        let regions = self
            .regions
            .as_ref()
            .filter(|fc| !fc.is_empty())
            .ok_or_else(|| Error::InvalidInput("regions are missing or empty".into()))?;

        let power = self
            .interpolation_power
            .ok_or_else(|| Error::InvalidInput("interpolation power is missing".into()))?;
        if !power.is_finite() || power <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "interpolation power must be a positive number, got {}",
                power
            )));
        }

        let bbox = self
            .bounding_box
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("bounding box is missing".into()))?;
        let bbox: [f64; 4] = bbox.try_into().map_err(|_| {
            Error::InvalidInput(format!(
                "bounding box needs 4 numbers [west, south, east, north], got {}",
                bbox.len()
            ))
        })?;
        if bbox.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidInput("bounding box has non-finite values".into()));
        }

        Ok(ValidatedRequest {
            measurement_points,
            regions,
            power,
            bbox: BoundingBox::from_array(bbox),
        })
    }
}

/// A message sent from a running analysis.
///
/// A run sends zero or more `Progress` messages followed by exactly one
/// `Complete` or `Error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AnalysisMessage {
    Progress(Progress),

    #[serde(rename_all = "camelCase")]
    Complete {
        interpolated_grid: FeatureCollection,
        updated_regions: FeatureCollection,
        /// `None` when too few regions had valid values
        regression: Option<RegressionResult>,
    },

    /// The result fields are always null.
    #[serde(rename_all = "camelCase")]
    Error {
        message: String,
        #[serde(default)]
        interpolated_grid: (),
        #[serde(default)]
        updated_regions: (),
        #[serde(default)]
        regression: (),
    },
}

impl AnalysisMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            interpolated_grid: (),
            updated_regions: (),
            regression: (),
        }
    }

    /// `Complete` or `Error`
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nitrogis_core::Feature;
    use serde_json::json;

    fn one_point() -> FeatureCollection {
        vec![Feature::point(0.0, 0.0)].into_iter().collect()
    }

    fn request() -> AnalysisRequest {
        AnalysisRequest::new(
            one_point(),
            one_point(),
            2.0,
            BoundingBox::new(0.0, 0.0, 1.0, 1.0),
        )
    }

    #[test]
    fn test_legacy_field_names() {
        let req = AnalysisRequest::from_json(
            r#"{
                "wellData": {"type": "FeatureCollection", "features": []},
                "tractData": {"type": "FeatureCollection", "features": []},
                "k": 2.5,
                "bbox": [-92.9, 42.5, -86.8, 47.1]
            }"#,
        )
        .unwrap();
        assert_eq!(req.interpolation_power, Some(2.5));
        assert_eq!(req.bounding_box, Some(vec![-92.9, 42.5, -86.8, 47.1]));
        assert!(req.measurement_points.unwrap().is_empty());
    }

    #[test]
    fn test_camel_case_roundtrip() {
        let text = request().to_json().unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert!(v.get("measurementPoints").is_some());
        assert!(v.get("interpolationPower").is_some());
        assert_eq!(AnalysisRequest::from_json(&text).unwrap(), request());
    }

    #[test]
    fn test_validate_ok() {
        let req = request();
        let valid = req.validate().unwrap();
        assert_eq!(valid.power, 2.0);
        assert_eq!(valid.bbox, BoundingBox::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn test_validate_failures() {
        let cases: Vec<(AnalysisRequest, &str)> = vec![
            (AnalysisRequest { measurement_points: None, ..request() }, "measurement points"),
            (
                AnalysisRequest { regions: Some(FeatureCollection::new()), ..request() },
                "regions",
            ),
            (AnalysisRequest { interpolation_power: None, ..request() }, "power"),
            (AnalysisRequest { interpolation_power: Some(0.0), ..request() }, "power"),
            (AnalysisRequest { interpolation_power: Some(f64::NAN), ..request() }, "power"),
            (AnalysisRequest { bounding_box: None, ..request() }, "bounding box"),
            (AnalysisRequest { bounding_box: Some(vec![0.0, 1.0]), ..request() }, "4 numbers"),
            (
                AnalysisRequest { bounding_box: Some(vec![0.0, 0.0, f64::INFINITY, 1.0]), ..request() },
                "non-finite",
            ),
        ];

        for (req, needle) in cases {
            let msg = req.validate().unwrap_err().to_string();
            assert!(msg.starts_with("Invalid input data"), "{}", msg);
            assert!(msg.contains(needle), "{} should mention {}", msg, needle);
        }
    }

    #[test]
    fn test_message_json_shape() {
        let progress = AnalysisMessage::Progress(Progress::new("Starting", 10.0));
        assert_eq!(
            serde_json::to_value(&progress).unwrap(),
            json!({"kind": "progress", "message": "Starting", "percent": 10.0})
        );

        let error = AnalysisMessage::error("Invalid input data: bounding box is missing");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({
                "kind": "error",
                "message": "Invalid input data: bounding box is missing",
                "interpolatedGrid": null,
                "updatedRegions": null,
                "regression": null
            })
        );
        assert!(error.is_terminal());
        assert!(!progress.is_terminal());

        let complete = AnalysisMessage::Complete {
            interpolated_grid: FeatureCollection::new(),
            updated_regions: FeatureCollection::new(),
            regression: None,
        };
        let v = serde_json::to_value(&complete).unwrap();
        assert_eq!(v["kind"], json!("complete"));
        assert_eq!(v["interpolatedGrid"]["type"], json!("FeatureCollection"));
        assert_eq!(v["regression"], json!(null));
    }

    #[test]
    fn test_message_parse() {
        let msg: AnalysisMessage =
            serde_json::from_str(r#"{"kind": "error", "message": "boom"}"#).unwrap();
        assert_eq!(msg, AnalysisMessage::error("boom"));
    }
}

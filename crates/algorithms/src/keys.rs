//! Property names read from and written to features.

use serde::{Deserialize, Serialize};

/// Names of the feature properties the analysis reads and writes.
///
/// Lists are tried in order; the first usable value wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyKeys {
    /// Concentration value on measurement points
    pub measurement: Vec<String>,
    /// Interpolated value written on grid points
    pub grid_value: String,
    /// Average interpolated value written on regions
    pub average: String,
    /// Contributing grid point count written on regions
    pub count: String,
    /// Reason a region could not be aggregated, written only on failure
    pub aggregation_error: String,
    /// Disease rate on regions
    pub disease_rate: Vec<String>,
    /// Region identifier
    pub region_id: Vec<String>,
}

impl Default for PropertyKeys {
    fn default() -> Self {
        Self {
            measurement: strings(&["nitrateValue", "nitr_ran"]),
            grid_value: "idwValue".into(),
            average: "average".into(),
            count: "count".into(),
            aggregation_error: "aggregationError".into(),
            disease_rate: strings(&["diseaseRate", "canrate", "cancer_rate"]),
            region_id: strings(&["GEOID", "TRACT"]),
        }
    }
}

fn strings(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

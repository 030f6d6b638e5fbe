//! Analysis configuration
//!
//! Every stage's parameters grouped in one struct. All fields have defaults,
//! so a TOML file only needs the values it changes:
//!
//! ```toml
//! [grid]
//! cell_size = 0.1
//!
//! [idw]
//! max_radius = 0.5
//! max_points = 12
//! ```

use std::path::Path;

use nitrogis_algorithms::interpolation::{GridParams, IdwParams};
use nitrogis_algorithms::statistics::{RegressionParams, ZonalParams};
use nitrogis_algorithms::PropertyKeys;
use nitrogis_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Percent reported at each stage boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressMilestones {
    /// Before interpolation starts (default: 10)
    pub started: f64,
    /// After interpolation (default: 40)
    pub interpolated: f64,
    /// After zonal aggregation (default: 90)
    pub aggregated: f64,
    /// After regression (default: 100)
    pub finished: f64,
}

impl Default for ProgressMilestones {
    fn default() -> Self {
        Self {
            started: 10.0,
            interpolated: 40.0,
            aggregated: 90.0,
            finished: 100.0,
        }
    }
}

impl ProgressMilestones {
    fn validate(&self) -> Result<()> {
        let steps = [
            ("started", self.started),
            ("interpolated", self.interpolated),
            ("aggregated", self.aggregated),
            ("finished", self.finished),
        ];
        for (name, value) in steps {
            if !(0.0..=100.0).contains(&value) {
                return Err(Error::invalid_parameter(name, value, "must be within 0..=100"));
            }
        }
        for pair in steps.windows(2) {
            if pair[1].1 < pair[0].1 {
                return Err(Error::invalid_parameter(
                    pair[1].0,
                    pair[1].1,
                    format!("must not be below {} ({})", pair[0].0, pair[0].1),
                ));
            }
        }
        Ok(())
    }
}

/// Parameters for a full analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub grid: GridParams,
    /// The request's interpolation power replaces `idw.power`.
    pub idw: IdwParams,
    pub zonal: ZonalParams,
    pub regression: RegressionParams,
    pub milestones: ProgressMilestones,
    pub properties: PropertyKeys,
}

impl AnalysisConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| Error::Other(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a TOML file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check that every stage parameter is usable.
    pub fn validate(&self) -> Result<()> {
        let cell = self.grid.cell_size;
        if !cell.is_finite() || cell <= 0.0 {
            return Err(Error::invalid_parameter("cell_size", cell, "must be a positive number"));
        }
        if self.grid.max_points == 0 {
            return Err(Error::invalid_parameter("max_points", 0, "the grid needs at least one point"));
        }
        self.idw.validate()?;
        if self.regression.min_pairs < 2 {
            return Err(Error::invalid_parameter(
                "min_pairs",
                self.regression.min_pairs,
                "a line needs at least 2 pairs",
            ));
        }
        self.milestones.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.grid.cell_size, 0.05);
        assert_eq!(config.grid.max_points, 25_000_000);
        assert_eq!(config.idw.power, 2.0);
        assert_eq!(config.idw.max_radius, Some(0.3));
        assert_eq!(config.idw.max_points, Some(8));
        assert_eq!(config.zonal.progress_every, 50);
        assert_eq!(config.regression.min_pairs, 3);
        assert_eq!(config.milestones.interpolated, 40.0);
        assert_eq!(config.properties.grid_value, "idwValue");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            [grid]
            cell_size = 0.1

            [idw]
            max_points = 12

            [properties]
            disease_rate = ["rate"]
            "#,
        )
        .unwrap();

        assert_eq!(config.grid.cell_size, 0.1);
        assert_eq!(config.idw.max_points, Some(12));
        assert_eq!(config.idw.max_radius, Some(0.3));
        assert_eq!(config.properties.disease_rate, vec!["rate".to_string()]);
        assert_eq!(config.properties.average, "average");
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(AnalysisConfig::from_toml_str("").unwrap(), AnalysisConfig::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = AnalysisConfig::from_toml_str("[grid]\ncell_size = 0.0").unwrap_err();
        assert!(err.to_string().contains("cell_size"));

        let err = AnalysisConfig::from_toml_str("[idw]\nmax_points = 0").unwrap_err();
        assert!(err.to_string().contains("max_points"));

        let err = AnalysisConfig::from_toml_str("[grid]\nmax_points = 0").unwrap_err();
        assert!(err.to_string().contains("max_points"));

        let err = AnalysisConfig::from_toml_str("[milestones]\naggregated = 20.0").unwrap_err();
        assert!(err.to_string().contains("aggregated"));

        let err = AnalysisConfig::from_toml_str("[grid]\ncell_size = \"big\"").unwrap_err();
        assert!(err.to_string().contains("Invalid configuration"));
    }
}

//! # NitroGIS Core
//!
//! Core types and traits shared by the NitroGIS crates.
//!
//! This crate provides:
//! - `Feature` / `FeatureCollection`: vector features backed by `geo-types`
//! - GeoJSON (de)serialization of features and collections
//! - `Progress`: progress notification payload
//! - `Error` / `Result` used across the workspace
//! - Algorithm trait for consistent API

pub mod error;
pub mod progress;
pub mod vector;

pub use error::{Error, Result};
pub use progress::Progress;
pub use vector::{Feature, FeatureCollection, Properties};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::progress::Progress;
    pub use crate::vector::{Feature, FeatureCollection, Properties};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in NitroGIS.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}

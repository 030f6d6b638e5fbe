//! # NitroGIS Pipeline
//!
//! Runs the three-stage analysis (IDW interpolation, zonal aggregation,
//! regression) on a background thread and reports progress over a channel.
//!
//! - `config`: analysis parameters, loadable from TOML
//! - `protocol`: request payload and the messages sent back to the caller
//! - `orchestrator`: validation, stage sequencing and the failure boundary
//! - `worker`: background thread and the handle used to receive messages

pub mod config;
pub mod orchestrator;
pub mod protocol;
pub mod worker;

pub use config::{AnalysisConfig, ProgressMilestones};
pub use orchestrator::{execute, run_analysis, AnalysisOutput};
pub use protocol::{AnalysisMessage, AnalysisRequest, ValidatedRequest};
pub use worker::{spawn_analysis, AnalysisHandle};

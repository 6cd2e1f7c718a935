pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::TokioCommandRunner;
pub use config::BuildSettings;
pub use crate::core::locator::SystemToolLocator;
pub use crate::core::pipeline::{BuildPipeline, BuildPlan, BuildReport};
pub use utils::error::{BuildError, Result};

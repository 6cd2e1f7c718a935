use crate::config::toml_config::TomlConfig;
use crate::config::BuildSettings;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "mlens-protoc")]
#[command(about = "Compile mlens .proto schemas into Python and JavaScript packages")]
pub struct CliConfig {
    /// Root directory holding the package directory with the .proto files
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Package directory name under the output directory
    #[arg(long)]
    pub package: Option<String>,

    /// Protobuf package whose JavaScript exports are collected into index.js
    #[arg(long)]
    pub js_namespace: Option<String>,

    /// Maximum number of concurrent per-file Python compilations
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Remove generated modules whose .proto file no longer exists
    #[arg(long)]
    pub clean_stale: bool,

    /// Show the commands that would run without executing them
    #[arg(long)]
    pub dry_run: bool,

    /// Print the build report as JSON on success
    #[arg(long)]
    pub report_json: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// 預設值 < 設定檔 < 命令列參數
    pub fn resolve(&self) -> Result<BuildSettings> {
        let mut settings = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                TomlConfig::from_file(path)?.to_settings()
            }
            None => BuildSettings::default(),
        };

        if let Some(output_dir) = &self.output_dir {
            settings.output_dir = output_dir.clone();
        }
        if let Some(package) = &self.package {
            settings.package = package.clone();
        }
        if let Some(namespace) = &self.js_namespace {
            settings.js_namespace = namespace.clone();
        }
        if let Some(jobs) = self.jobs {
            settings.jobs = jobs;
        }
        if self.clean_stale {
            settings.clean_stale = true;
        }

        Ok(settings)
    }
}

#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::path::PathBuf;

pub const DEFAULT_PACKAGE: &str = "mlens_proto";
pub const DEFAULT_JS_NAMESPACE: &str = "mlens.v1";
pub const DEFAULT_JS_IMPORT_STYLE: &str = "commonjs,binary";
pub const DEFAULT_PROTOC_ENV: &str = "PROTOC";
pub const DEFAULT_PROTOC_BINARY: &str = "protoc";
pub const DEFAULT_STUBGEN_BINARY: &str = "stubgen";

/// 合併 CLI 與設定檔之後的最終建置設定，所有階段只讀取這個值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSettings {
    pub output_dir: PathBuf,
    pub package: String,
    pub js_namespace: String,
    pub js_import_style: String,
    pub protoc_env_var: String,
    pub protoc_path: Option<PathBuf>,
    pub protoc_binary: String,
    pub stubgen_binary: String,
    pub jobs: usize,
    pub clean_stale: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            package: DEFAULT_PACKAGE.to_string(),
            js_namespace: DEFAULT_JS_NAMESPACE.to_string(),
            js_import_style: DEFAULT_JS_IMPORT_STYLE.to_string(),
            protoc_env_var: DEFAULT_PROTOC_ENV.to_string(),
            protoc_path: None,
            protoc_binary: DEFAULT_PROTOC_BINARY.to_string(),
            stubgen_binary: DEFAULT_STUBGEN_BINARY.to_string(),
            jobs: 1,
            clean_stale: false,
        }
    }
}

impl BuildSettings {
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// `<output_dir>/<package>`，schema 與產生的檔案都放在這裡
    pub fn package_dir(&self) -> PathBuf {
        self.output_dir.join(&self.package)
    }

    pub fn python_init_path(&self) -> PathBuf {
        self.package_dir().join("__init__.py")
    }

    pub fn js_index_path(&self) -> PathBuf {
        self.package_dir().join("index.js")
    }
}

impl Validate for BuildSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_path("output_dir", &self.output_dir.to_string_lossy())?;
        validation::validate_package_name("package", &self.package)?;
        validation::validate_namespace("js_namespace", &self.js_namespace)?;
        validation::validate_non_empty_string("js_import_style", &self.js_import_style)?;
        validation::validate_non_empty_string("protoc_env_var", &self.protoc_env_var)?;
        validation::validate_non_empty_string("protoc_binary", &self.protoc_binary)?;
        validation::validate_non_empty_string("stubgen_binary", &self.stubgen_binary)?;
        if let Some(path) = &self.protoc_path {
            validation::validate_path("protoc.path", &path.to_string_lossy())?;
        }
        validation::validate_positive_number("jobs", self.jobs, 1)?;
        Ok(())
    }
}

use crate::config::BuildSettings;
use crate::utils::error::{BuildError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `mlens-protoc.toml` 設定檔，所有區段皆為選填
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    #[serde(default)]
    pub layout: Option<LayoutConfig>,
    #[serde(default)]
    pub protoc: Option<ProtocConfig>,
    #[serde(default)]
    pub javascript: Option<JavascriptConfig>,
    #[serde(default)]
    pub stubs: Option<StubsConfig>,
    #[serde(default)]
    pub build: Option<BuildOptions>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub output_dir: Option<String>,
    pub package: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtocConfig {
    pub path: Option<String>,
    pub env_var: Option<String>,
    pub binary: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JavascriptConfig {
    pub namespace: Option<String>,
    pub import_style: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StubsConfig {
    pub tool: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildOptions {
    pub jobs: Option<usize>,
    pub clean_stale: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${PROTOC})，找不到的變數保留原文
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BuildError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 將設定檔的值套用到預設設定上
    pub fn apply_to(&self, mut settings: BuildSettings) -> BuildSettings {
        if let Some(layout) = &self.layout {
            if let Some(output_dir) = &layout.output_dir {
                settings.output_dir = PathBuf::from(output_dir);
            }
            if let Some(package) = &layout.package {
                settings.package = package.clone();
            }
        }
        if let Some(protoc) = &self.protoc {
            if let Some(path) = &protoc.path {
                // 未展開的 ${VAR} 代表環境變數不存在，視同未設定
                if !path.contains("${") {
                    settings.protoc_path = Some(PathBuf::from(path));
                }
            }
            if let Some(env_var) = &protoc.env_var {
                settings.protoc_env_var = env_var.clone();
            }
            if let Some(binary) = &protoc.binary {
                settings.protoc_binary = binary.clone();
            }
        }
        if let Some(js) = &self.javascript {
            if let Some(namespace) = &js.namespace {
                settings.js_namespace = namespace.clone();
            }
            if let Some(style) = &js.import_style {
                settings.js_import_style = style.clone();
            }
        }
        if let Some(tool) = self.stubs.as_ref().and_then(|s| s.tool.as_ref()) {
            settings.stubgen_binary = tool.clone();
        }
        if let Some(build) = &self.build {
            if let Some(jobs) = build.jobs {
                settings.jobs = jobs;
            }
            if let Some(clean_stale) = build.clean_stale {
                settings.clean_stale = clean_stale;
            }
        }
        settings
    }

    pub fn to_settings(&self) -> BuildSettings {
        self.apply_to(BuildSettings::default())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.to_settings().validate()
    }
}

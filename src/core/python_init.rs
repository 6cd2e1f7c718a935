//! Python 套件入口：從產生的模組靜態分析出公開類別，寫出 `__init__.py`。
//!
//! 不載入產生的程式碼。優先讀取 mypy 外掛輸出的 `_pb2.pyi`，只有在沒有
//! 型別檔時才退回舊版 `_pb2.py` 的 `GeneratedProtocolMessageType` 宣告。

use crate::domain::model::{GeneratedModule, ModuleSymbols};
use crate::utils::error::{BuildError, Result};
use regex::Regex;
use std::path::Path;

const PYTHON_MODULE_SUFFIX: &str = "_pb2.py";

struct PythonScanner {
    stub_class: Regex,
    legacy_message: Regex,
}

impl PythonScanner {
    fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| BuildError::ConfigError {
                message: format!("Invalid scanner pattern: {}", e),
            })
        };
        Ok(Self {
            stub_class: compile(r"^class\s+([A-Za-z_][A-Za-z0-9_]*)\s*(?:\((.*)\))?\s*:")?,
            legacy_message: compile(
                r"^([A-Za-z][A-Za-z0-9_]*)\s*=\s*_reflection\.GeneratedProtocolMessageType\(",
            )?,
        })
    }

    /// `.pyi` 頂層的 `class` 宣告；私有名稱與 enum（metaclass 包裝）不算執行期類別
    fn stub_classes(&self, content: &str) -> Vec<String> {
        content
            .lines()
            .filter_map(|line| self.stub_class.captures(line))
            .filter(|caps| {
                let bases = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
                !caps[1].starts_with('_') && !bases.contains("metaclass=")
            })
            .map(|caps| caps[1].to_string())
            .collect()
    }

    fn legacy_classes(&self, content: &str) -> Vec<String> {
        content
            .lines()
            .filter_map(|line| self.legacy_message.captures(line))
            .map(|caps| caps[1].to_string())
            .collect()
    }
}

/// 列出 `*_pb2.py`，依檔名排序
pub fn list_python_modules(package_dir: &Path) -> Result<Vec<GeneratedModule>> {
    let mut modules = Vec::new();
    for entry in std::fs::read_dir(package_dir)? {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if path.is_file() && file_name.ends_with(PYTHON_MODULE_SUFFIX) {
            let name = file_name.trim_end_matches(".py").to_string();
            modules.push(GeneratedModule::new(name, path));
        }
    }
    modules.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(modules)
}

fn scan_module(scanner: &PythonScanner, module: &GeneratedModule) -> Result<ModuleSymbols> {
    let manifest = module.path.with_extension("pyi");
    let mut symbols = if manifest.is_file() {
        let content = std::fs::read_to_string(&manifest)?;
        scanner.stub_classes(&content)
    } else {
        let content = std::fs::read_to_string(&module.path)?;
        let legacy = scanner.legacy_classes(&content);
        if legacy.is_empty() && content.contains("_builder.") {
            return Err(BuildError::ManifestMissing {
                module: module.path.clone(),
                message: format!(
                    "builder-style module without {}; run protoc with --mypy_out",
                    manifest.display()
                ),
            });
        }
        legacy
    };

    symbols.sort();
    symbols.dedup();
    tracing::debug!("{}: {} classes", module.name, symbols.len());

    Ok(ModuleSymbols {
        module: module.name.clone(),
        symbols,
    })
}

pub fn scan_python_modules(package_dir: &Path) -> Result<Vec<ModuleSymbols>> {
    let scanner = PythonScanner::new()?;
    list_python_modules(package_dir)?
        .iter()
        .map(|module| scan_module(&scanner, module))
        .collect()
}

pub fn render_python_init(modules: &[ModuleSymbols]) -> String {
    let mut content = String::new();
    for module in modules {
        for symbol in &module.symbols {
            content.push_str(&format!("from .{} import {}\n", module.module, symbol));
        }
    }
    content
}

/// 產生 `__init__.py`，每次都完整覆寫
pub fn generate_python_init(package_dir: &Path, init_path: &Path) -> Result<Vec<ModuleSymbols>> {
    tracing::info!("Generating __init__.py:");
    let modules = scan_python_modules(package_dir)?;
    std::fs::write(init_path, render_python_init(&modules))?;
    Ok(modules)
}

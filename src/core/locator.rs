use crate::config::BuildSettings;
use crate::domain::ports::ToolLocator;
use crate::utils::error::{BuildError, Result};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// 依序檢查覆寫路徑，第一個存在的路徑勝出；否則在搜尋路徑中尋找執行檔。
/// 回傳絕對路徑，工具可能在其他工作目錄中執行
pub fn locate_tool(
    overrides: &[PathBuf],
    binary: &str,
    search_path: Option<&OsStr>,
) -> Option<PathBuf> {
    for candidate in overrides {
        if candidate.exists() {
            return Some(absolute(candidate));
        }
        tracing::debug!(
            "Ignoring override {} for {}: path does not exist",
            candidate.display(),
            binary
        );
    }

    search_path
        .and_then(|paths| find_in_path(binary, paths))
        .map(|found| absolute(&found))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

pub fn find_in_path(binary: &str, search_path: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_path)
        .filter(|dir| !dir.as_os_str().is_empty())
        .flat_map(|dir| candidate_names(binary).map(move |name| dir.join(name)))
        .find(|candidate| is_executable(candidate))
}

#[cfg(windows)]
fn candidate_names(binary: &str) -> impl Iterator<Item = String> {
    vec![binary.to_string(), format!("{}.exe", binary)].into_iter()
}

#[cfg(not(windows))]
fn candidate_names(binary: &str) -> impl Iterator<Item = String> {
    std::iter::once(binary.to_string())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// 尋找 protoc：設定檔路徑、環境變數覆寫、最後才是 PATH
pub fn locate_protoc(settings: &BuildSettings) -> Result<PathBuf> {
    let mut overrides = Vec::new();
    if let Some(path) = &settings.protoc_path {
        overrides.push(path.clone());
    }
    if let Some(path) = std::env::var_os(&settings.protoc_env_var) {
        overrides.push(PathBuf::from(path));
    }

    let search_path: Option<OsString> = std::env::var_os("PATH");
    locate_tool(&overrides, &settings.protoc_binary, search_path.as_deref()).ok_or_else(|| {
        BuildError::ToolNotFound {
            tool: "protobuf-compiler".to_string(),
            hint: format!(
                "Install protoc or set the {} environment variable to the path of the protoc binary",
                settings.protoc_env_var
            ),
        }
    })
}

pub fn locate_stubgen(settings: &BuildSettings) -> Result<PathBuf> {
    let search_path = std::env::var_os("PATH");
    locate_tool(&[], &settings.stubgen_binary, search_path.as_deref()).ok_or_else(|| {
        BuildError::ToolNotFound {
            tool: settings.stubgen_binary.clone(),
            hint: "Install mypy (`pip install mypy`) to get stubgen".to_string(),
        }
    })
}

/// 讀取目前行程的環境變數與 PATH
#[derive(Debug, Clone, Default)]
pub struct SystemToolLocator;

impl ToolLocator for SystemToolLocator {
    fn locate_protoc(&self, settings: &BuildSettings) -> Result<PathBuf> {
        locate_protoc(settings)
    }

    fn locate_stubgen(&self, settings: &BuildSettings) -> Result<PathBuf> {
        locate_stubgen(settings)
    }
}

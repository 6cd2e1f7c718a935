use serde::Serialize;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// 在套件目錄中找到的 `.proto` 檔案
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SchemaFile {
    pub path: PathBuf,
}

impl SchemaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 不含副檔名的檔名，例如 `a.proto` -> `a`
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }
}

/// 編譯器產生的模組檔案
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    /// 模組名稱，例如 `a_pb2` 或 `a_pb`
    pub name: String,
    pub path: PathBuf,
}

impl GeneratedModule {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// 單一模組中發現的公開符號，依發現順序排列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSymbols {
    pub module: String,
    pub symbols: Vec<String>,
}

/// 一次外部程序呼叫
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// 以字串形式取得參數，方便測試與日誌
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            let arg = arg.to_string_lossy();
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        if let Some(cwd) = &self.cwd {
            write!(f, " (in {})", cwd.display())?;
        }
        Ok(())
    }
}

/// 建置流程的五個階段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Locate,
    Compile,
    InitPython,
    Stubs,
    InitJs,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Locate,
        Stage::Compile,
        Stage::InitPython,
        Stage::Stubs,
        Stage::InitJs,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Locate => "locate",
            Stage::Compile => "compile",
            Stage::InitPython => "init-python",
            Stage::Stubs => "stubs",
            Stage::InitJs => "init-js",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_stem() {
        let schema = SchemaFile::new("./mlens_proto/model_run.proto");
        assert_eq!(schema.stem(), "model_run");
    }

    #[test]
    fn test_invocation_display() {
        let invocation = Invocation::new("/usr/bin/stubgen")
            .args(["-o", ".", "--no-import", "-m", "mlens_proto"])
            .current_dir("out dir");
        assert_eq!(
            invocation.to_string(),
            "/usr/bin/stubgen -o . --no-import -m mlens_proto (in out dir)"
        );

        let quoted = Invocation::new("protoc").arg("a b.proto");
        assert_eq!(quoted.to_string(), "protoc 'a b.proto'");
    }
}

use crate::config::BuildSettings;
use crate::domain::model::{Invocation, SchemaFile};
use crate::domain::ports::CommandRunner;
use crate::utils::error::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// 產生檔案的後綴，依此判斷產物對應哪個 schema
const GENERATED_SUFFIXES: [&str; 3] = ["_pb2.py", "_pb2.pyi", "_pb.js"];

/// 列出 `<root>/<package>/*.proto`，依檔名排序，不遞迴
pub fn discover_schemas(root: &Path, package: &str) -> Result<Vec<SchemaFile>> {
    let package_dir = root.join(package);
    if !package_dir.is_dir() {
        tracing::warn!("Package directory {} does not exist", package_dir.display());
        return Ok(Vec::new());
    }

    let mut schemas = Vec::new();
    for entry in std::fs::read_dir(&package_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "proto") {
            schemas.push(SchemaFile::new(path));
        }
    }
    schemas.sort();
    Ok(schemas)
}

/// 刪除對應 `.proto` 已不存在的產生檔，回傳刪除的檔案
pub fn remove_stale_modules(package_dir: &Path, schemas: &[SchemaFile]) -> Result<Vec<PathBuf>> {
    let live: HashSet<&str> = schemas.iter().map(|s| s.stem()).collect();
    let mut removed = Vec::new();

    if !package_dir.is_dir() {
        return Ok(removed);
    }

    for entry in std::fs::read_dir(package_dir)? {
        let path = entry?.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let stem = GENERATED_SUFFIXES
            .iter()
            .find_map(|suffix| file_name.strip_suffix(suffix));
        if let Some(stem) = stem {
            if !live.contains(stem) {
                tracing::info!("🧹 Removing stale generated module: {}", path.display());
                std::fs::remove_file(&path)?;
                removed.push(path);
            }
        }
    }

    removed.sort();
    Ok(removed)
}

fn flag(name: &str, value: &Path) -> OsString {
    let mut flag = OsString::from(name);
    flag.push(value.as_os_str());
    flag
}

/// 單一 schema 的 Python 與 mypy 產生指令，output 目錄同時作為 include 路徑
pub fn python_invocation(protoc: &Path, root: &Path, schema: &SchemaFile) -> Invocation {
    Invocation::new(protoc)
        .arg(flag("--proto_path=", root))
        .arg(flag("--mypy_out=", root))
        .arg(flag("--python_out=", root))
        .arg(schema.path.as_os_str())
}

/// 所有 schema 一次編譯成 JavaScript，在 output 目錄中執行，
/// 因此 include 與輸出路徑都是 `.`，schema 以相對 output 目錄的路徑傳入
pub fn js_invocation(
    protoc: &Path,
    root: &Path,
    import_style: &str,
    schemas: &[SchemaFile],
) -> Invocation {
    Invocation::new(protoc)
        .arg("--proto_path=.")
        .arg(format!("--js_out=import_style={}:.", import_style))
        .args(schemas.iter().map(|s| {
            s.path
                .strip_prefix(root)
                .unwrap_or(&s.path)
                .as_os_str()
                .to_os_string()
        }))
        .current_dir(root)
}

pub struct SchemaCompiler<'a, R: CommandRunner> {
    runner: &'a R,
    settings: &'a BuildSettings,
    protoc: PathBuf,
}

impl<'a, R: CommandRunner> SchemaCompiler<'a, R> {
    pub fn new(runner: &'a R, settings: &'a BuildSettings, protoc: PathBuf) -> Self {
        Self {
            runner,
            settings,
            protoc,
        }
    }

    /// 所有會執行的指令，依執行順序排列
    pub fn plan(&self, schemas: &[SchemaFile]) -> Vec<Invocation> {
        let root = &self.settings.output_dir;
        let mut plan: Vec<Invocation> = schemas
            .iter()
            .map(|schema| python_invocation(&self.protoc, root, schema))
            .collect();
        if !schemas.is_empty() {
            plan.push(js_invocation(
                &self.protoc,
                root,
                &self.settings.js_import_style,
                schemas,
            ));
        }
        plan
    }

    pub async fn compile_all(&self, schemas: &[SchemaFile]) -> Result<()> {
        self.compile_python(schemas).await?;
        self.compile_js(schemas).await
    }

    /// 逐檔編譯；jobs > 1 時以有限並行執行，第一個失敗即中止其餘呼叫
    pub async fn compile_python(&self, schemas: &[SchemaFile]) -> Result<()> {
        tracing::info!("Compiling protos for python:");
        let root = &self.settings.output_dir;
        let jobs = self.settings.jobs.max(1);

        if jobs == 1 {
            for schema in schemas {
                self.compile_one(python_invocation(&self.protoc, root, schema), schema)
                    .await?;
            }
            return Ok(());
        }

        stream::iter(schemas)
            .map(|schema| self.compile_one(python_invocation(&self.protoc, root, schema), schema))
            .buffered(jobs)
            .try_collect::<Vec<()>>()
            .await?;
        Ok(())
    }

    async fn compile_one(&self, invocation: Invocation, schema: &SchemaFile) -> Result<()> {
        tracing::debug!("  {}", schema.path.display());
        let context = format!("Error compiling proto file {}", schema.path.display());
        self.runner.run(&invocation, &context).await
    }

    pub async fn compile_js(&self, schemas: &[SchemaFile]) -> Result<()> {
        tracing::info!("Compiling protos for js:");
        if schemas.is_empty() {
            tracing::info!("No proto files found, skipping js compilation");
            return Ok(());
        }

        let invocation = js_invocation(
            &self.protoc,
            &self.settings.output_dir,
            &self.settings.js_import_style,
            schemas,
        );
        self.runner
            .run(&invocation, "Error compiling proto file for js")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::BuildError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct RecordingRunner {
        calls: Mutex<Vec<Invocation>>,
        fail_on: Option<String>,
    }

    impl RecordingRunner {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: None,
            }
        }

        fn failing_on(needle: &str) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_on: Some(needle.to_string()),
            }
        }

        fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, invocation: &Invocation, context: &str) -> Result<()> {
            self.calls.lock().unwrap().push(invocation.clone());
            let rendered = invocation.to_string();
            match &self.fail_on {
                Some(needle) if rendered.contains(needle.as_str()) => {
                    Err(BuildError::CommandFailed {
                        context: context.to_string(),
                        command: rendered,
                        status: "exit status: 1".to_string(),
                    })
                }
                _ => Ok(()),
            }
        }
    }

    fn setup_schemas(names: &[&str]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let package_dir = temp_dir.path().join("mlens_proto");
        std::fs::create_dir_all(&package_dir).unwrap();
        for name in names {
            std::fs::write(package_dir.join(name), "syntax = \"proto3\";\n").unwrap();
        }
        temp_dir
    }

    #[test]
    fn test_discover_schemas_sorted_and_filtered() {
        let temp_dir = setup_schemas(&["b.proto", "a.proto", "notes.txt", "a_pb2.py"]);
        std::fs::create_dir(temp_dir.path().join("mlens_proto/nested.proto")).unwrap();

        let schemas = discover_schemas(temp_dir.path(), "mlens_proto").unwrap();
        let stems: Vec<&str> = schemas.iter().map(|s| s.stem()).collect();
        assert_eq!(stems, vec!["a", "b"]);
    }

    #[test]
    fn test_discover_missing_package_dir() {
        let temp_dir = TempDir::new().unwrap();
        let schemas = discover_schemas(temp_dir.path(), "mlens_proto").unwrap();
        assert!(schemas.is_empty());
    }

    #[test]
    fn test_python_invocation_arguments() {
        let schema = SchemaFile::new("./mlens_proto/a.proto");
        let invocation = python_invocation(Path::new("/usr/bin/protoc"), Path::new("."), &schema);
        assert_eq!(
            invocation.args_lossy(),
            vec![
                "--proto_path=.",
                "--mypy_out=.",
                "--python_out=.",
                "./mlens_proto/a.proto"
            ]
        );
    }

    #[test]
    fn test_js_invocation_batches_all_files() {
        let schemas = vec![
            SchemaFile::new("./mlens_proto/a.proto"),
            SchemaFile::new("./mlens_proto/b.proto"),
        ];
        let invocation = js_invocation(Path::new("protoc"), Path::new("."), "commonjs,binary", &schemas);
        assert_eq!(
            invocation.args_lossy(),
            vec![
                "--proto_path=.",
                "--js_out=import_style=commonjs,binary:.",
                "mlens_proto/a.proto",
                "mlens_proto/b.proto"
            ]
        );
        assert_eq!(invocation.cwd.as_deref(), Some(Path::new(".")));
    }

    #[test]
    fn test_js_invocation_runs_inside_output_dir() {
        let root = Path::new("build/out");
        let schemas = vec![SchemaFile::new(root.join("mlens_proto/run.proto"))];
        let invocation = js_invocation(Path::new("protoc"), root, "commonjs,binary", &schemas);

        // 輸出位置 = cwd/<js_out>/<相對 proto_path 的路徑> = build/out/mlens_proto/run_pb.js
        assert_eq!(invocation.cwd.as_deref(), Some(root));
        assert_eq!(
            invocation.args_lossy(),
            vec![
                "--proto_path=.",
                "--js_out=import_style=commonjs,binary:.",
                "mlens_proto/run.proto"
            ]
        );
    }

    #[tokio::test]
    async fn test_compile_all_runs_one_python_call_per_file_then_one_js_call() {
        let temp_dir = setup_schemas(&["a.proto", "b.proto", "c.proto"]);
        let settings = BuildSettings::default().with_output_dir(temp_dir.path());
        let schemas = discover_schemas(temp_dir.path(), "mlens_proto").unwrap();
        let runner = RecordingRunner::new();

        let compiler = SchemaCompiler::new(&runner, &settings, PathBuf::from("protoc"));
        compiler.compile_all(&schemas).await.unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls[..3]
            .iter()
            .all(|c| c.args_lossy().iter().any(|a| a.starts_with("--python_out="))));
        assert!(calls[3].args_lossy()[1].starts_with("--js_out="));
        assert_eq!(calls, compiler.plan(&schemas));
    }

    #[tokio::test]
    async fn test_first_failure_stops_python_loop() {
        let temp_dir = setup_schemas(&["a.proto", "b.proto", "c.proto"]);
        let settings = BuildSettings::default().with_output_dir(temp_dir.path());
        let schemas = discover_schemas(temp_dir.path(), "mlens_proto").unwrap();
        let runner = RecordingRunner::failing_on("b.proto");

        let compiler = SchemaCompiler::new(&runner, &settings, PathBuf::from("protoc"));
        let err = compiler.compile_all(&schemas).await.unwrap_err();

        assert!(matches!(err, BuildError::CommandFailed { .. }));
        // a.proto 與 b.proto 已呼叫，c.proto 與 js 不應執行
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_parallel_failure_aborts_and_skips_js() {
        let temp_dir = setup_schemas(&["a.proto", "b.proto", "c.proto", "d.proto"]);
        let settings = BuildSettings {
            jobs: 2,
            ..BuildSettings::default().with_output_dir(temp_dir.path())
        };
        let schemas = discover_schemas(temp_dir.path(), "mlens_proto").unwrap();
        let runner = RecordingRunner::failing_on("a.proto");

        let compiler = SchemaCompiler::new(&runner, &settings, PathBuf::from("protoc"));
        assert!(compiler.compile_all(&schemas).await.is_err());

        let calls = runner.calls();
        assert!(calls.len() < 5);
        assert!(calls
            .iter()
            .all(|c| !c.args_lossy().iter().any(|a| a.starts_with("--js_out="))));
    }

    #[tokio::test]
    async fn test_no_schemas_skips_js() {
        let temp_dir = setup_schemas(&[]);
        let settings = BuildSettings::default().with_output_dir(temp_dir.path());
        let runner = RecordingRunner::new();

        let compiler = SchemaCompiler::new(&runner, &settings, PathBuf::from("protoc"));
        compiler.compile_all(&[]).await.unwrap();
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn test_remove_stale_modules() {
        let temp_dir = setup_schemas(&["a.proto"]);
        let package_dir = temp_dir.path().join("mlens_proto");
        for name in ["a_pb2.py", "a_pb.js", "gone_pb2.py", "gone_pb2.pyi", "gone_pb.js", "README.md"] {
            std::fs::write(package_dir.join(name), "").unwrap();
        }
        let schemas = discover_schemas(temp_dir.path(), "mlens_proto").unwrap();

        let removed = remove_stale_modules(&package_dir, &schemas).unwrap();

        assert_eq!(removed.len(), 3);
        assert!(package_dir.join("a_pb2.py").exists());
        assert!(package_dir.join("a_pb.js").exists());
        assert!(package_dir.join("README.md").exists());
        assert!(!package_dir.join("gone_pb2.pyi").exists());
    }
}

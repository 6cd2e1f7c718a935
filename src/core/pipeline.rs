use crate::config::BuildSettings;
use crate::core::compiler::{self, SchemaCompiler};
use crate::core::{js_index, python_init, stubs};
use crate::domain::model::{Invocation, SchemaFile, Stage};
use crate::domain::ports::{CommandRunner, ToolLocator};
use crate::utils::error::{BuildError, Result};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// 單一階段的執行結果
#[derive(Debug, Clone, Serialize)]
pub struct StageResult {
    pub stage: Stage,
    pub duration_ms: u64,
    pub artifacts: Vec<PathBuf>,
    pub note: String,
}

/// 整次建置的摘要
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub schema_count: usize,
    pub python_symbols: usize,
    pub js_symbols: usize,
    pub stale_removed: Vec<PathBuf>,
    pub stages: Vec<StageResult>,
    pub total_duration_ms: u64,
}

/// `--dry-run` 的輸出：會執行的指令，但不執行
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub protoc: PathBuf,
    pub schemas: Vec<SchemaFile>,
    pub commands: Vec<Invocation>,
    pub writes: Vec<PathBuf>,
}

/// Locate -> Compile -> InitPython -> Stubs -> InitJs，任一階段失敗即結束
pub struct BuildPipeline<R: CommandRunner, L: ToolLocator> {
    runner: R,
    locator: L,
    settings: BuildSettings,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

async fn timed<T, F>(stage: Stage, work: F) -> Result<(T, u64)>
where
    F: Future<Output = Result<T>>,
{
    tracing::debug!("▶️ Stage {} started", stage);
    let start = Instant::now();
    match work.await {
        Ok(value) => {
            let elapsed = millis(start.elapsed());
            tracing::info!("✅ Stage {} finished in {}ms", stage, elapsed);
            Ok((value, elapsed))
        }
        Err(e) => {
            tracing::error!("❌ Stage {} failed: {}", stage, e);
            Err(e)
        }
    }
}

impl<R: CommandRunner, L: ToolLocator> BuildPipeline<R, L> {
    pub fn new(runner: R, locator: L, settings: BuildSettings) -> Self {
        Self {
            runner,
            locator,
            settings,
        }
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub async fn run(&self) -> Result<BuildReport> {
        let started = Instant::now();
        let settings = &self.settings;
        let package_dir = settings.package_dir();
        let mut stages = Vec::with_capacity(Stage::ALL.len());

        // Locate
        let (protoc, elapsed) =
            timed(Stage::Locate, async { self.locator.locate_protoc(settings) }).await?;
        stages.push(StageResult {
            stage: Stage::Locate,
            duration_ms: elapsed,
            artifacts: Vec::new(),
            note: format!("protoc at {}", protoc.display()),
        });

        // Compile
        let ((schemas, stale_removed), elapsed) = timed(Stage::Compile, async {
            std::fs::create_dir_all(&settings.output_dir)?;
            let schemas = compiler::discover_schemas(&settings.output_dir, &settings.package)?;
            tracing::info!("Found {} proto files to compile.", schemas.len());

            let stale_removed = if settings.clean_stale {
                compiler::remove_stale_modules(&package_dir, &schemas)?
            } else {
                Vec::new()
            };

            SchemaCompiler::new(&self.runner, settings, protoc.clone())
                .compile_all(&schemas)
                .await?;
            Ok::<_, BuildError>((schemas, stale_removed))
        })
        .await?;
        stages.push(StageResult {
            stage: Stage::Compile,
            duration_ms: elapsed,
            artifacts: schemas.iter().map(|s| s.path.clone()).collect(),
            note: format!("{} schema files", schemas.len()),
        });

        // InitPython
        let init_path = settings.python_init_path();
        let (python_modules, elapsed) = timed(Stage::InitPython, async {
            python_init::generate_python_init(&package_dir, &init_path)
        })
        .await?;
        let python_symbols: usize = python_modules.iter().map(|m| m.symbols.len()).sum();
        stages.push(StageResult {
            stage: Stage::InitPython,
            duration_ms: elapsed,
            artifacts: vec![init_path],
            note: format!(
                "{} classes from {} modules",
                python_symbols,
                python_modules.len()
            ),
        });

        // Stubs
        let (_, elapsed) = timed(Stage::Stubs, async {
            let stubgen = self.locator.locate_stubgen(settings)?;
            stubs::generate_stubs(&self.runner, &stubgen, &settings.output_dir, &settings.package)
                .await
        })
        .await?;
        stages.push(StageResult {
            stage: Stage::Stubs,
            duration_ms: elapsed,
            artifacts: Vec::new(),
            note: format!("stubs for {}", settings.package),
        });

        // InitJs
        let index_path = settings.js_index_path();
        let (js_modules, elapsed) = timed(Stage::InitJs, async {
            js_index::generate_index_js(&package_dir, &index_path, &settings.js_namespace)
        })
        .await?;
        let js_symbols = {
            let mut names: Vec<&String> = js_modules.iter().flat_map(|m| m.symbols.iter()).collect();
            names.sort();
            names.dedup();
            names.len()
        };
        stages.push(StageResult {
            stage: Stage::InitJs,
            duration_ms: elapsed,
            artifacts: vec![index_path],
            note: format!("{} exports from {} modules", js_symbols, js_modules.len()),
        });

        Ok(BuildReport {
            output_dir: settings.output_dir.clone(),
            schema_count: schemas.len(),
            python_symbols,
            js_symbols,
            stale_removed,
            stages,
            total_duration_ms: millis(started.elapsed()),
        })
    }

    /// 找出工具與 schema，列出會執行的指令；不執行任何指令也不寫檔
    pub fn plan(&self) -> Result<BuildPlan> {
        let settings = &self.settings;
        let protoc = self.locator.locate_protoc(settings)?;
        let schemas = compiler::discover_schemas(&settings.output_dir, &settings.package)?;

        let mut commands = SchemaCompiler::new(&self.runner, settings, protoc.clone()).plan(&schemas);
        let stubgen = self.locator.locate_stubgen(settings)?;
        commands.push(stubs::stubgen_invocation(
            &stubgen,
            &settings.output_dir,
            &settings.package,
        ));

        Ok(BuildPlan {
            protoc,
            schemas,
            commands,
            writes: vec![settings.python_init_path(), settings.js_index_path()],
        })
    }
}

impl BuildReport {
    /// 依階段列出摘要，供 CLI 輸出
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} proto files compiled in {}ms",
            self.schema_count, self.total_duration_ms
        )];
        for stage in &self.stages {
            lines.push(format!("  {:<12} {:>6}ms  {}", stage.stage.name(), stage.duration_ms, stage.note));
        }
        lines
    }

    /// `--report-json` 的輸出
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

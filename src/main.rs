use clap::Parser;
use mlens_protoc::utils::logger::{self, LogFormat};
use mlens_protoc::utils::validation::Validate;
use mlens_protoc::{BuildPipeline, CliConfig, SystemToolLocator, TokioCommandRunner};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    let format = if config.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(config.verbose, format);

    tracing::info!("Starting mlens-protoc");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let settings = match config.resolve().and_then(|s| s.validate().map(|_| s)) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    let pipeline = BuildPipeline::new(TokioCommandRunner::new(), SystemToolLocator, settings);

    if config.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No commands will be executed");
        match pipeline.plan() {
            Ok(plan) => {
                println!("protoc: {}", plan.protoc.display());
                println!("Found {} proto files to compile.", plan.schemas.len());
                for command in &plan.commands {
                    println!("  $ {}", command);
                }
                for path in &plan.writes {
                    println!("  > {}", path.display());
                }
                return;
            }
            Err(e) => {
                eprintln!("❌ {}", e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());
                std::process::exit(e.exit_code());
            }
        }
    }

    let result = pipeline.run().await.and_then(|report| {
        tracing::info!("✅ Build completed successfully!");
        for line in report.summary_lines() {
            tracing::info!("{}", line);
        }
        if config.report_json {
            println!("{}", report.to_json()?);
        }
        Ok(())
    });

    if let Err(e) = result {
        tracing::error!("❌ Build failed: {} (Category: {:?})", e, e.category());
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }
}

use crate::domain::model::Invocation;
use crate::domain::ports::CommandRunner;
use crate::utils::error::{BuildError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// 以 tokio 執行外部程序，標準輸出/錯誤直接沿用目前的終端機
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner;

impl TokioCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, invocation: &Invocation, context: &str) -> Result<()> {
        tracing::debug!(command = %invocation, "Executing");

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        let status = command
            .status()
            .await
            .map_err(|source| BuildError::SpawnError {
                command: invocation.to_string(),
                source,
            })?;

        if !status.success() {
            tracing::error!(command = %invocation, %status, "❌ {}", context);
            return Err(BuildError::CommandFailed {
                context: context.to_string(),
                command: invocation.to_string(),
                status: status.to_string(),
            });
        }

        Ok(())
    }
}

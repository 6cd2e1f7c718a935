use crate::config::BuildSettings;
use crate::domain::model::Invocation;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// 執行外部程序，非零結束碼視為錯誤
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation, context: &str) -> Result<()>;
}

/// 找出外部工具的執行檔路徑
pub trait ToolLocator: Send + Sync {
    fn locate_protoc(&self, settings: &BuildSettings) -> Result<PathBuf>;
    fn locate_stubgen(&self, settings: &BuildSettings) -> Result<PathBuf>;
}

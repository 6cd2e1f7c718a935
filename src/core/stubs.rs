use crate::domain::model::Invocation;
use crate::domain::ports::CommandRunner;
use crate::utils::error::Result;
use std::path::Path;

/// `stubgen -o . --no-import -m <package>`，在 output 目錄下執行
pub fn stubgen_invocation(stubgen: &Path, root: &Path, package: &str) -> Invocation {
    Invocation::new(stubgen)
        .args(["-o", ".", "--no-import", "-m", package])
        .current_dir(root)
}

pub async fn generate_stubs<R: CommandRunner>(
    runner: &R,
    stubgen: &Path,
    root: &Path,
    package: &str,
) -> Result<()> {
    tracing::info!("Generating stubs:");
    let invocation = stubgen_invocation(stubgen, root, package);
    runner.run(&invocation, "Error generating stubs").await
}

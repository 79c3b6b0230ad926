use anyhow::Result;
use std::path::Path;
use tokio::fs;

pub const HISTORY_DIR: &str = "history";

const REQUIRED_DIRS: &[&str] = &[HISTORY_DIR];

pub async fn ensure_directories() -> Result<()> {
    for dir in REQUIRED_DIRS {
        if !Path::new(dir).exists() {
            fs::create_dir_all(dir).await?;
            tracing::info!("Created directory: {}", dir);
        }
    }
    Ok(())
}

async fn tool_available(name: &str) -> bool {
    match tokio::process::Command::new(name)
        .arg("-version")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

/// The pipeline shells out to both ffmpeg and ffprobe; a missing probe
/// binary would otherwise only surface mid-run, after paid API calls.
pub async fn check_ffmpeg() -> bool {
    tool_available("ffmpeg").await && tool_available("ffprobe").await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_tool_fails_check() {
        assert!(!tool_available("no-such-binary-qx7").await);
    }
}

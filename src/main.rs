use anyhow::Result;
use yt_shorts_bot::generator::run_generation;
use yt_shorts_bot::init;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    init::ensure_directories().await?;

    if !init::check_ffmpeg().await {
        eprintln!("[WARNING] ffmpeg/ffprobe not found in PATH. Please install FFmpeg.");
    }

    let code = run_generation().await?;
    std::process::exit(code);
}

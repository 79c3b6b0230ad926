use anyhow::{Context, Result};
use std::path::Path;

use tokio::process::Command;

pub const FRAME_W: i32 = 1080;
pub const FRAME_H: i32 = 1920;
pub const FPS: i32 = 30;

// Ken Burns: creep toward this zoom over the length of a shot.
const MAX_ZOOM: f64 = 1.05;

async fn run_cmd(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    let mut cmd = Command::new(&args[0]);
    if args.len() > 1 {
        cmd.args(&args[1..]);
    }

    let status = cmd.status().await.context("Command execution failed")?;
    if !status.success() {
        return Err(anyhow::anyhow!("Command failed: {:?}", args));
    }

    Ok(())
}

pub async fn ffprobe_duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .context("ffprobe duration failed")?;

    if !output.status.success() {
        return Err(anyhow::anyhow!("ffprobe failed"));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let duration = text.parse::<f64>().unwrap_or(-1.0);
    if duration <= 0.1 {
        return Err(anyhow::anyhow!("Invalid duration"));
    }
    Ok(duration)
}

fn zoompan_filter(duration_s: i32) -> String {
    let frames = duration_s * FPS;
    format!(
        "[0:v]scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h},zoompan=z='min(zoom+{step:.6},{max})':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d={frames}:s={w}x{h}:fps={fps}[v]",
        w = FRAME_W,
        h = FRAME_H,
        step = (MAX_ZOOM - 1.0) / frames as f64,
        max = MAX_ZOOM,
        frames = frames,
        fps = FPS,
    )
}

/// Turns one still image into a vertical clip of `duration_s` seconds with a
/// slight zoom-in.
pub async fn ffmpeg_image_clip(image: &Path, duration_s: i32, out_mp4: &Path) -> Result<bool> {
    if duration_s <= 0 {
        return Ok(false);
    }

    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-loop".to_string(),
        "1".to_string(),
        "-i".to_string(),
        image.display().to_string(),
        "-filter_complex".to_string(),
        zoompan_filter(duration_s),
        "-map".to_string(),
        "[v]".to_string(),
        "-t".to_string(),
        duration_s.to_string(),
        "-r".to_string(),
        FPS.to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        out_mp4.display().to_string(),
    ];

    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

pub async fn ffmpeg_concat_videos(list_txt: &Path, out_mp4: &Path) -> Result<bool> {
    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-f".to_string(),
        "concat".to_string(),
        "-safe".to_string(),
        "0".to_string(),
        "-i".to_string(),
        list_txt.display().to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-crf".to_string(),
        "22".to_string(),
        "-an".to_string(),
        out_mp4.display().to_string(),
    ];
    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

/// Muxes the voiceover under the concatenated video. `-shortest` trims the
/// audio to the video length, as the original clips carry no audio track.
pub async fn ffmpeg_mux_voiceover(
    video_in: &Path,
    voice_in: &Path,
    out_mp4: &Path,
) -> Result<bool> {
    let args = vec![
        "ffmpeg".to_string(),
        "-y".to_string(),
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-i".to_string(),
        video_in.display().to_string(),
        "-i".to_string(),
        voice_in.display().to_string(),
        "-map".to_string(),
        "0:v".to_string(),
        "-map".to_string(),
        "1:a".to_string(),
        "-c:v".to_string(),
        "copy".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-b:a".to_string(),
        "192k".to_string(),
        "-shortest".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        out_mp4.display().to_string(),
    ];
    run_cmd(&args).await?;
    Ok(out_mp4.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoompan_filter_matches_duration() {
        let filter = zoompan_filter(10);
        assert!(filter.contains(":d=300:"));
        assert!(filter.contains("1080x1920"));
        assert!(filter.contains("fps=30"));
    }
}

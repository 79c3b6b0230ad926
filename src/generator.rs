use crate::api::{elevenlabs, openai, youtube::YouTubeUploader};
use crate::config::Config;
use crate::history::{self, HistoryRecord};
use crate::init::HISTORY_DIR;
use crate::topics;
use crate::{ffmpeg, logi, logok, logw};
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

const WORK_DIR: &str = "work";

async fn dir_exists(path: &Path) -> bool {
    fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn ensure_dir(path: &Path) -> Result<()> {
    if !dir_exists(path).await {
        fs::create_dir_all(path).await?;
    }
    Ok(())
}

async fn clear_directory_contents(dir_path: &Path) -> Result<()> {
    if !dir_exists(dir_path).await {
        return Ok(());
    }

    for entry in WalkDir::new(dir_path).min_depth(1).contents_first(true) {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            fs::remove_dir(path).await.ok();
        } else {
            fs::remove_file(path).await.ok();
        }
    }

    Ok(())
}

fn slugify(title: &str) -> String {
    let mut out = String::new();
    let mut last_dash = true;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    if out.is_empty() {
        out.push_str("short");
    }
    out
}

/// Runs one full bot cycle: topic, script, assets, video, upload, history.
/// Any failed step aborts the run; no success record is written for it.
pub async fn run_generation() -> Result<i32> {
    let cfg = Config::load().await?;
    let client = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    ensure_dir(Path::new(HISTORY_DIR)).await?;
    ensure_dir(Path::new(WORK_DIR)).await?;

    logi("Clearing work/ folder...");
    clear_directory_contents(Path::new(WORK_DIR)).await?;
    ensure_dir(Path::new(WORK_DIR)).await?;

    let now = Utc::now();
    let seen = history::seen_topics(Path::new(HISTORY_DIR)).await?;
    let topic = topics::pick_new_topic(&seen);
    logi(format!("Topic: {}", topic));

    logi("Requesting script from OpenAI...");
    let plan = openai::generate_script(&client, &cfg, &topic).await?;
    logok(format!(
        "Script received: \"{}\" ({} shots, {}s planned)",
        plan.title,
        plan.shots.len(),
        plan.total_duration_secs()
    ));

    let slug = slugify(&plan.title);

    let concat_list_path = PathBuf::from(format!("{}/{}_concat_list.txt", WORK_DIR, slug));
    let mut listf = fs::File::create(&concat_list_path).await?;

    for (idx, shot) in plan.shots.iter().enumerate() {
        let shot_index = idx + 1;
        let img_path = PathBuf::from(format!("{}/{}_frame_{}.png", WORK_DIR, slug, shot_index));
        logi(format!(
            "Image {}/{} -> {}",
            shot_index,
            plan.shots.len(),
            img_path.display()
        ));
        openai::generate_image(&client, &cfg, &shot.img_prompt, &img_path)
            .await
            .with_context(|| format!("Image generation failed for shot {}", shot_index))?;

        let clip_name = format!("{}_clip_{}.mp4", slug, shot_index);
        let clip_path = PathBuf::from(format!("{}/{}", WORK_DIR, clip_name));
        logi(format!(
            "Building clip {} ({}s) -> {}",
            shot_index,
            shot.duration,
            clip_path.display()
        ));
        if !ffmpeg::ffmpeg_image_clip(&img_path, shot.duration, &clip_path).await? {
            anyhow::bail!("Failed to build clip {}", shot_index);
        }

        listf
            .write_all(format!("file '{}'\n", clip_name).as_bytes())
            .await?;
        logok(format!("Clip {} OK", shot_index));
    }
    listf.flush().await?;

    let voice_path = PathBuf::from(format!("{}/{}_voiceover.mp3", WORK_DIR, slug));
    logi(format!("TTS voiceover -> {}", voice_path.display()));
    elevenlabs::tts_to_mp3(&client, &cfg, &plan.voiceover, &voice_path)
        .await
        .context("Voiceover TTS failed")?;
    let voice_dur = ffmpeg::ffprobe_duration_seconds(&voice_path).await?;
    logok(format!("Voiceover OK ({:.2}s)", voice_dur));

    let silent_path = PathBuf::from(format!("{}/{}_silent.mp4", WORK_DIR, slug));
    logi(format!("Concatenating clips -> {}", silent_path.display()));
    if !ffmpeg::ffmpeg_concat_videos(&concat_list_path, &silent_path).await? {
        anyhow::bail!("Clip concat failed");
    }

    let final_path = PathBuf::from(format!("{}/{}.mp4", WORK_DIR, slug));
    logi(format!("Muxing voiceover -> {}", final_path.display()));
    if !ffmpeg::ffmpeg_mux_voiceover(&silent_path, &voice_path, &final_path).await? {
        anyhow::bail!("Voiceover mux failed");
    }
    let final_dur = ffmpeg::ffprobe_duration_seconds(&final_path).await?;
    logok(format!("Video assembled: {} ({:.2}s)", final_path.display(), final_dur));

    let yt = YouTubeUploader::authenticate(&client, &cfg).await?;
    logi(format!("Uploading {} ...", final_path.display()));
    let video_id = yt
        .upload_video(&final_path, &plan.title, &cfg.privacy_status)
        .await?;
    logok(format!("Uploaded https://youtube.com/watch?v={}", video_id));

    if let Some(playlist_id) = &cfg.upload_playlist {
        if let Err(err) = yt.add_to_playlist(playlist_id, &video_id).await {
            logw(format!("Playlist insert failed (upload kept): {}", err));
        } else {
            logok(format!("Added to playlist {}", playlist_id));
        }
    }

    let record = HistoryRecord::new(
        now,
        &topic,
        &plan.title,
        &video_id,
        plan.shots.len(),
        plan.total_duration_secs(),
    );
    let record_path = history::append_record(Path::new(HISTORY_DIR), &record).await?;
    logok(format!("History record: {}", record_path.display()));

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("How to fix a USB port"), "how-to-fix-a-usb-port");
        assert_eq!(slugify("Why capacitors bulge?!"), "why-capacitors-bulge");
        assert_eq!(slugify("---"), "short");
    }

    #[tokio::test]
    async fn clear_directory_contents_removes_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("x.txt"), "x").unwrap();
        std::fs::write(dir.path().join("y.txt"), "y").unwrap();

        clear_directory_contents(dir.path()).await.unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

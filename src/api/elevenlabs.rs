use crate::config::Config;
use crate::logw;
use anyhow::{Context, Result};
use reqwest::Client;
use std::path::Path;
use tokio::fs;

/// Renders the voiceover text to an MP3 via ElevenLabs TTS.
pub async fn tts_to_mp3(
    client: &Client,
    cfg: &Config,
    text: &str,
    out_mp3_path: &Path,
) -> Result<()> {
    let url = format!(
        "https://api.elevenlabs.io/v1/text-to-speech/{}?output_format=mp3_44100_128",
        cfg.eleven_voice_id
    );

    let body = serde_json::json!({
        "text": text,
        "model_id": cfg.eleven_model_id,
    });

    let resp = client
        .post(url)
        .header("Content-Type", "application/json")
        .header("xi-api-key", &cfg.elevenlabs_key)
        .json(&body)
        .timeout(std::time::Duration::from_secs(300))
        .send()
        .await
        .context("ElevenLabs request failed")?;

    let status = resp.status();
    if !status.is_success() {
        let raw = resp.text().await.unwrap_or_default();
        if !raw.is_empty() {
            let snippet = raw.chars().take(400).collect::<String>();
            logw(format!("ElevenLabs raw body: {}", snippet));
        }
        anyhow::bail!("ElevenLabs TTS failed (HTTP {})", status.as_u16());
    }

    let bytes = resp.bytes().await.context("ElevenLabs response read failed")?;
    if let Some(parent) = out_mp3_path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create dir {}", parent.display()))?;
    }
    fs::write(out_mp3_path, &bytes).await?;

    Ok(())
}

use crate::config::Config;
use crate::logw;
use crate::shot_plan::{ShotPlan, MAX_SHOTS, MAX_TOTAL_DURATION_SECS};
use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::json;
use std::path::Path;
use tokio::fs;

// DALL-E 3 has no 1080x1920 output; this is its closest vertical size.
const IMAGE_SIZE: &str = "1024x1792";
const IMAGE_STYLE_SUFFIX: &str = ", cinematic, 8k, vertical";

fn chat_extract_content(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;

    if let Some(err) = root.get("error") {
        if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
            logw(format!("OpenAI error message: {}", msg));
        }
        if let Some(typ) = err.get("type").and_then(|v| v.as_str()) {
            logw(format!("OpenAI error type: {}", typ));
        }
        if let Some(code) = err.get("code").and_then(|v| v.as_str()) {
            logw(format!("OpenAI error code: {}", code));
        }
        return None;
    }

    root.get("choices")?
        .as_array()?
        .first()?
        .get("message")?
        .get("content")?
        .as_str()
        .map(|s| s.trim().to_string())
}

/// Asks the model for a JSON shot plan for `topic`.
pub async fn generate_script(client: &Client, cfg: &Config, topic: &str) -> Result<ShotPlan> {
    let sys_prompt = format!(
        "You are a YouTube scriptwriter. Reply with raw JSON only, shaped as:\n\
         {{\"title\":..., \"voiceover\":..., \"shots\":[{{\"img_prompt\":..., \"duration\": int_sec}}, ...]}}\n\
         Total runtime under {} seconds, at most {} shots.",
        MAX_TOTAL_DURATION_SECS, MAX_SHOTS
    );

    let body = json!({
        "model": "gpt-4o-mini",
        "messages": [
            {"role": "system", "content": sys_prompt},
            {"role": "user", "content": format!("Topic: {}", topic)},
        ],
        "response_format": {"type": "json_object"},
        "temperature": 0.8,
    });

    let resp = client
        .post("https://api.openai.com/v1/chat/completions")
        .bearer_auth(&cfg.openai_key)
        .json(&body)
        .timeout(std::time::Duration::from_secs(120))
        .send()
        .await
        .context("OpenAI request failed")?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        logw(format!("OpenAI HTTP {}", status.as_u16()));
        if !raw.is_empty() {
            let snippet = raw.chars().take(800).collect::<String>();
            logw(format!("OpenAI raw body: {}", snippet));
        }
        anyhow::bail!("OpenAI script request failed (HTTP {})", status.as_u16());
    }

    let content = chat_extract_content(&raw)
        .ok_or_else(|| anyhow::anyhow!("OpenAI response had no message content"))?;

    ShotPlan::from_json(&content)
}

fn image_extract_url(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;

    if let Some(err) = root.get("error") {
        if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
            logw(format!("OpenAI image error: {}", msg));
        }
        return None;
    }

    root.get("data")?
        .as_array()?
        .first()?
        .get("url")?
        .as_str()
        .map(|s| s.to_string())
}

/// Generates one DALL-E image for a shot prompt and saves it to `out_path`.
pub async fn generate_image(
    client: &Client,
    cfg: &Config,
    prompt: &str,
    out_path: &Path,
) -> Result<()> {
    let body = json!({
        "model": "dall-e-3",
        "prompt": format!("{}{}", prompt, IMAGE_STYLE_SUFFIX),
        "n": 1,
        "size": IMAGE_SIZE,
    });

    let resp = client
        .post("https://api.openai.com/v1/images/generations")
        .bearer_auth(&cfg.openai_key)
        .json(&body)
        .timeout(std::time::Duration::from_secs(300))
        .send()
        .await
        .context("OpenAI image request failed")?;

    let status = resp.status();
    let raw = resp.text().await.unwrap_or_default();

    if !status.is_success() {
        logw(format!("OpenAI images HTTP {}", status.as_u16()));
        if !raw.is_empty() {
            let snippet = raw.chars().take(800).collect::<String>();
            logw(format!("OpenAI images raw body: {}", snippet));
        }
        anyhow::bail!("OpenAI image request failed (HTTP {})", status.as_u16());
    }

    let url = image_extract_url(&raw)
        .ok_or_else(|| anyhow::anyhow!("OpenAI image response had no URL"))?;

    let bytes = client
        .get(&url)
        .timeout(std::time::Duration::from_secs(120))
        .send()
        .await
        .context("Image download failed")?
        .error_for_status()
        .context("Image download returned an error status")?
        .bytes()
        .await
        .context("Image download read failed")?;

    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create dir {}", parent.display()))?;
    }
    fs::write(out_path, &bytes).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_chat_content() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":" {\"x\":1} "}}]}"#;
        assert_eq!(chat_extract_content(raw).unwrap(), r#"{"x":1}"#);
    }

    #[test]
    fn chat_error_yields_none() {
        let raw = r#"{"error":{"message":"bad key","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        assert!(chat_extract_content(raw).is_none());
    }

    #[test]
    fn extracts_image_url() {
        let raw = r#"{"data":[{"url":"https://oaidalle.example/img.png"}]}"#;
        assert_eq!(
            image_extract_url(raw).unwrap(),
            "https://oaidalle.example/img.png"
        );
    }

    #[test]
    fn image_error_yields_none() {
        assert!(image_extract_url(r#"{"error":{"message":"nope"}}"#).is_none());
        assert!(image_extract_url(r#"{"data":[]}"#).is_none());
    }
}

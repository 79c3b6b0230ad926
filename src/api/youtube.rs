use crate::config::Config;
use crate::{logi, logw};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";
const PLAYLIST_ITEMS_URL: &str = "https://www.googleapis.com/youtube/v3/playlistItems";

const CATEGORY_TECH: &str = "28";
const DESCRIPTION: &str = "AI-generated electronics repair tip\n#shorts";
const TAGS: &[&str] = &["electronics", "repair", "AI", "shorts"];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Playlist insert failed: {0}")]
    PlaylistInsert(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct VideoUploadResponse {
    pub id: String,
}

fn shorts_title(title: &str) -> String {
    if title.contains("#shorts") {
        title.to_string()
    } else {
        format!("{} #shorts", title)
    }
}

/// Builds the `videos.insert` resource body. Synthetic-media disclosure is
/// always set (YouTube API rev 2024-10-30).
fn build_video_resource(title: &str, privacy_status: &str) -> serde_json::Value {
    json!({
        "snippet": {
            "title": shorts_title(title),
            "description": DESCRIPTION,
            "tags": TAGS,
            "categoryId": CATEGORY_TECH,
        },
        "status": {
            "privacyStatus": privacy_status,
            "containsSyntheticMedia": true,
        }
    })
}

/// Uploads go through a short-lived client holding a fresh access token.
pub struct YouTubeUploader<'a> {
    client: &'a Client,
    access_token: String,
}

impl<'a> YouTubeUploader<'a> {
    /// Exchanges the configured refresh token for an access token. The
    /// refresh-token grant keeps runs non-interactive under cron.
    pub async fn authenticate(client: &'a Client, cfg: &Config) -> Result<Self, UploadError> {
        let body = json!({
            "client_id": cfg.client_secret.client_id,
            "client_secret": cfg.client_secret.client_secret,
            "refresh_token": cfg.refresh_token,
            "grant_type": "refresh_token",
        });

        let resp = client
            .post(TOKEN_URL)
            .json(&body)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            let snippet = raw.chars().take(400).collect::<String>();
            return Err(UploadError::TokenRefresh(format!(
                "HTTP {}: {}",
                status.as_u16(),
                snippet
            )));
        }

        let token: TokenResponse = resp.json().await?;
        logi("YouTube access token obtained.");
        Ok(YouTubeUploader {
            client,
            access_token: token.access_token,
        })
    }

    /// Uploads the video file with `videos.insert` (multipart) and returns
    /// the new video ID.
    pub async fn upload_video(
        &self,
        video_path: &Path,
        title: &str,
        privacy_status: &str,
    ) -> Result<String, UploadError> {
        let video_data = tokio::fs::read(video_path).await?;
        let file_name = video_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("video.mp4")
            .to_string();

        let metadata = build_video_resource(title, privacy_status);
        let metadata_json = serde_json::to_string(&metadata)?;

        let form = reqwest::multipart::Form::new()
            .part(
                "snippet",
                reqwest::multipart::Part::text(metadata_json).mime_str("application/json")?,
            )
            .part(
                "media",
                reqwest::multipart::Part::bytes(video_data)
                    .file_name(file_name)
                    .mime_str("video/*")?,
            );

        let resp = self
            .client
            .post(UPLOAD_URL)
            .query(&[("part", "snippet,status"), ("uploadType", "multipart")])
            .bearer_auth(&self.access_token)
            .multipart(form)
            .timeout(std::time::Duration::from_secs(1800))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            let snippet = raw.chars().take(800).collect::<String>();
            logw(format!("YouTube upload raw body: {}", snippet));
            return Err(UploadError::UploadFailed(format!(
                "HTTP {}",
                status.as_u16()
            )));
        }

        let uploaded: VideoUploadResponse = resp.json().await?;
        Ok(uploaded.id)
    }

    /// Adds an uploaded video to the channel's upload playlist.
    pub async fn add_to_playlist(
        &self,
        playlist_id: &str,
        video_id: &str,
    ) -> Result<(), UploadError> {
        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": {
                    "kind": "youtube#video",
                    "videoId": video_id,
                },
            }
        });

        let resp = self
            .client
            .post(PLAYLIST_ITEMS_URL)
            .query(&[("part", "snippet")])
            .bearer_auth(&self.access_token)
            .json(&body)
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            let snippet = raw.chars().take(400).collect::<String>();
            return Err(UploadError::PlaylistInsert(format!(
                "HTTP {}: {}",
                status.as_u16(),
                snippet
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_has_shorts_title_and_disclosure() {
        let body = build_video_resource("How to fix a USB port", "public");
        assert_eq!(
            body["snippet"]["title"],
            "How to fix a USB port #shorts"
        );
        assert_eq!(body["snippet"]["categoryId"], CATEGORY_TECH);
        assert_eq!(body["status"]["privacyStatus"], "public");
        assert_eq!(body["status"]["containsSyntheticMedia"], true);
    }

    #[test]
    fn shorts_suffix_not_doubled() {
        assert_eq!(shorts_title("Already tagged #shorts"), "Already tagged #shorts");
        assert_eq!(shorts_title("Plain title"), "Plain title #shorts");
    }

    #[test]
    fn resource_honors_privacy_status() {
        let body = build_video_resource("t", "unlisted");
        assert_eq!(body["status"]["privacyStatus"], "unlisted");
    }
}

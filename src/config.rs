use anyhow::{Context, Result};
use base64::Engine;
use serde::Deserialize;
use tokio::fs;

#[derive(Debug, Clone)]
pub struct Config {
    pub openai_key: String,
    pub elevenlabs_key: String,
    pub eleven_voice_id: String,
    pub eleven_model_id: String,
    pub client_secret: ClientSecret,
    pub refresh_token: String,
    pub privacy_status: String,
    pub upload_playlist: Option<String>,
}

/// OAuth client credentials extracted from a Google client secret JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

fn default_voice_id() -> String {
    "JBFqnCBsd6RMkjVDRZzb".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Parses the client secret JSON, accepting both `installed` and `web` layouts.
pub fn parse_client_secret_json(raw: &str) -> Result<ClientSecret> {
    let file: ClientSecretFile =
        serde_json::from_str(raw).context("Failed to parse client secret JSON")?;
    file.installed
        .or(file.web)
        .ok_or_else(|| anyhow::anyhow!("client secret JSON has neither 'installed' nor 'web' key"))
}

/// Resolves `GOOGLE_CLIENT_SECRET` into client credentials. The value is
/// either `file://path`, `base64://...` of the JSON, or a bare file path.
pub async fn resolve_client_secret(source: &str) -> Result<ClientSecret> {
    let raw = if let Some(path) = source.strip_prefix("file://") {
        fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read client secret: {}", path))?
    } else if let Some(b64) = source.strip_prefix("base64://") {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64)
            .context("GOOGLE_CLIENT_SECRET: invalid base64")?;
        String::from_utf8(bytes).context("GOOGLE_CLIENT_SECRET: decoded bytes are not UTF-8")?
    } else {
        fs::read_to_string(source)
            .await
            .with_context(|| format!("Failed to read client secret: {}", source))?
    };

    parse_client_secret_json(&raw)
}

impl Config {
    /// Loads configuration from the environment (a `.env` file is honored).
    /// Missing credentials fail here, before any network call.
    pub async fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let openai_key =
            env_nonempty("OPENAI_API_KEY").context("OPENAI_API_KEY missing")?;
        let elevenlabs_key =
            env_nonempty("ELEVENLABS_API_KEY").context("ELEVENLABS_API_KEY missing")?;
        let secret_source =
            env_nonempty("GOOGLE_CLIENT_SECRET").unwrap_or_else(|| "client_secret.json".to_string());
        let refresh_token =
            env_nonempty("GOOGLE_REFRESH_TOKEN").context("GOOGLE_REFRESH_TOKEN missing")?;

        let client_secret = resolve_client_secret(&secret_source).await?;

        let privacy_status =
            env_nonempty("SHORTS_PRIVACY_STATUS").unwrap_or_else(|| "public".to_string());
        if !["public", "private", "unlisted"].contains(&privacy_status.as_str()) {
            anyhow::bail!(
                "SHORTS_PRIVACY_STATUS must be public, private or unlisted (got {})",
                privacy_status
            );
        }

        Ok(Config {
            openai_key,
            elevenlabs_key,
            eleven_voice_id: env_nonempty("ELEVEN_VOICE_ID").unwrap_or_else(default_voice_id),
            eleven_model_id: env_nonempty("ELEVEN_MODEL_ID").unwrap_or_else(default_model_id),
            client_secret,
            refresh_token,
            privacy_status,
            upload_playlist: env_nonempty("CHANNEL_UPLOAD_PLAYLIST"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSTALLED_JSON: &str = r#"{"installed":{"client_id":"abc.apps.googleusercontent.com","client_secret":"s3cret","redirect_uris":["http://localhost"]}}"#;
    const WEB_JSON: &str = r#"{"web":{"client_id":"web-id","client_secret":"web-secret"}}"#;

    #[test]
    fn parses_installed_layout() {
        let cs = parse_client_secret_json(INSTALLED_JSON).unwrap();
        assert_eq!(cs.client_id, "abc.apps.googleusercontent.com");
        assert_eq!(cs.client_secret, "s3cret");
    }

    #[test]
    fn parses_web_layout() {
        let cs = parse_client_secret_json(WEB_JSON).unwrap();
        assert_eq!(cs.client_id, "web-id");
    }

    #[test]
    fn rejects_unknown_layout() {
        assert!(parse_client_secret_json(r#"{"other":{}}"#).is_err());
    }

    #[tokio::test]
    async fn resolves_file_and_base64_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client_secret.json");
        tokio::fs::write(&path, INSTALLED_JSON).await.unwrap();

        let from_file = resolve_client_secret(&format!("file://{}", path.display()))
            .await
            .unwrap();
        assert_eq!(from_file.client_secret, "s3cret");

        let from_bare = resolve_client_secret(path.to_str().unwrap()).await.unwrap();
        assert_eq!(from_bare.client_id, "abc.apps.googleusercontent.com");

        let b64 = base64::engine::general_purpose::STANDARD.encode(INSTALLED_JSON);
        let from_b64 = resolve_client_secret(&format!("base64://{}", b64))
            .await
            .unwrap();
        assert_eq!(from_b64.client_secret, "s3cret");
    }
}

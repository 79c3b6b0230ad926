use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Outcome of one successful bot run. Write-once: records are never mutated
/// after creation, and no credential material is ever serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub time: String,
    pub topic: String,
    pub title: String,
    pub video_id: String,
    pub shots: usize,
    pub duration_secs: i64,
}

impl HistoryRecord {
    pub fn new(
        time: DateTime<Utc>,
        topic: &str,
        title: &str,
        video_id: &str,
        shots: usize,
        duration_secs: i64,
    ) -> Self {
        HistoryRecord {
            time: time.to_rfc3339(),
            topic: topic.to_string(),
            title: title.to_string(),
            video_id: video_id.to_string(),
            shots,
            duration_secs,
        }
    }
}

/// Picks a file name for a new record without clobbering existing ones. A
/// re-run in the same second gets a numeric suffix instead.
fn unique_record_path(dir: &Path, time: DateTime<Utc>) -> PathBuf {
    let stem = time.format("%Y-%m-%d_%H%M%S").to_string();
    let mut path = dir.join(format!("{}.json", stem));
    let mut n = 1;
    while path.exists() {
        n += 1;
        path = dir.join(format!("{}_{}.json", stem, n));
    }
    path
}

/// Writes one record as its own JSON file under `dir` and returns the path.
pub async fn append_record(dir: &Path, record: &HistoryRecord) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create history dir {}", dir.display()))?;

    let time = DateTime::parse_from_rfc3339(&record.time)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());
    let path = unique_record_path(dir, time);

    let json = serde_json::to_string_pretty(record)?;
    fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write history record {}", path.display()))?;
    Ok(path)
}

/// Loads the topics of all prior records. Unreadable files are skipped; a
/// missing history directory means no runs yet.
pub async fn seen_topics(dir: &Path) -> Result<Vec<String>> {
    let mut topics = Vec::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(_) => return Ok(topics),
    };

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Ok(text) = fs::read_to_string(&path).await else {
            continue;
        };
        if let Ok(record) = serde_json::from_str::<HistoryRecord>(&text) {
            topics.push(record.topic);
        }
    }

    Ok(topics)
}

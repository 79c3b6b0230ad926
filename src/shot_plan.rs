use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const MAX_SHOTS: usize = 6;
pub const MAX_TOTAL_DURATION_SECS: i32 = 55;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shot {
    pub img_prompt: String,
    pub duration: i32,
}

/// The script the model returns for one video: a title, a voiceover text and
/// an ordered list of shots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotPlan {
    pub title: String,
    pub voiceover: String,
    pub shots: Vec<Shot>,
}

static CODE_FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").unwrap());

fn strip_code_fences(text: &str) -> &str {
    match CODE_FENCE_RE.captures(text) {
        Some(caps) => caps.get(1).map(|m| m.as_str()).unwrap_or(text),
        None => text,
    }
}

impl ShotPlan {
    /// Parses model output, tolerating a surrounding markdown code fence.
    pub fn from_json(text: &str) -> Result<Self> {
        let plan: ShotPlan = serde_json::from_str(strip_code_fences(text))
            .context("Failed to parse shot plan JSON")?;
        plan.validate()?;
        Ok(plan)
    }

    /// Sums in i64: durations are untrusted model output and must not be
    /// able to wrap a plain i32 sum.
    pub fn total_duration_secs(&self) -> i64 {
        self.shots.iter().map(|s| i64::from(s.duration)).sum()
    }

    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            anyhow::bail!("shot plan: empty title");
        }
        if self.voiceover.trim().is_empty() {
            anyhow::bail!("shot plan: empty voiceover");
        }
        if self.shots.is_empty() {
            anyhow::bail!("shot plan: no shots");
        }
        if self.shots.len() > MAX_SHOTS {
            anyhow::bail!("shot plan: {} shots (max {})", self.shots.len(), MAX_SHOTS);
        }
        for (i, shot) in self.shots.iter().enumerate() {
            if shot.duration <= 0 {
                anyhow::bail!("shot plan: shot {} has duration {}", i + 1, shot.duration);
            }
            if shot.duration > MAX_TOTAL_DURATION_SECS {
                anyhow::bail!(
                    "shot plan: shot {} duration {}s exceeds {}s",
                    i + 1,
                    shot.duration,
                    MAX_TOTAL_DURATION_SECS
                );
            }
            if shot.img_prompt.trim().is_empty() {
                anyhow::bail!("shot plan: shot {} has empty img_prompt", i + 1);
            }
        }
        let total = self.total_duration_secs();
        if total > i64::from(MAX_TOTAL_DURATION_SECS) {
            anyhow::bail!(
                "shot plan: total duration {}s exceeds {}s",
                total,
                MAX_TOTAL_DURATION_SECS
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN_JSON: &str = r#"{
        "title": "Fixing a dead USB port",
        "voiceover": "Ever wondered why your phone stopped charging?",
        "shots": [
            {"img_prompt": "macro shot of a broken usb-c port", "duration": 10},
            {"img_prompt": "soldering iron reflowing a connector", "duration": 12}
        ]
    }"#;

    #[test]
    fn parses_plain_json() {
        let plan = ShotPlan::from_json(PLAN_JSON).unwrap();
        assert_eq!(plan.shots.len(), 2);
        assert_eq!(plan.total_duration_secs(), 22);
    }

    #[test]
    fn parses_fenced_json() {
        let fenced = format!("```json\n{}\n```", PLAN_JSON);
        let plan = ShotPlan::from_json(&fenced).unwrap();
        assert_eq!(plan.title, "Fixing a dead USB port");

        let bare_fence = format!("```\n{}\n```", PLAN_JSON);
        assert!(ShotPlan::from_json(&bare_fence).is_ok());
    }

    #[test]
    fn rejects_empty_shots() {
        let text = r#"{"title":"t","voiceover":"v","shots":[]}"#;
        assert!(ShotPlan::from_json(text).is_err());
    }

    #[test]
    fn rejects_too_many_shots() {
        let shot = r#"{"img_prompt":"p","duration":5}"#;
        let shots = vec![shot; MAX_SHOTS + 1].join(",");
        let text = format!(r#"{{"title":"t","voiceover":"v","shots":[{}]}}"#, shots);
        assert!(ShotPlan::from_json(&text).is_err());
    }

    #[test]
    fn rejects_overlong_total_duration() {
        let text = r#"{"title":"t","voiceover":"v","shots":[
            {"img_prompt":"a","duration":30},
            {"img_prompt":"b","duration":30}
        ]}"#;
        assert!(ShotPlan::from_json(text).is_err());
    }

    #[test]
    fn rejects_extreme_durations_without_panicking() {
        // i32::MAX twice would wrap a plain i32 sum negative and slip past
        // the total-duration check.
        let text = r#"{"title":"t","voiceover":"v","shots":[
            {"img_prompt":"a","duration":2147483647},
            {"img_prompt":"b","duration":2147483647}
        ]}"#;
        assert!(ShotPlan::from_json(text).is_err());
    }

    #[test]
    fn rejects_single_shot_over_runtime_cap() {
        let text = r#"{"title":"t","voiceover":"v","shots":[{"img_prompt":"a","duration":56}]}"#;
        assert!(ShotPlan::from_json(text).is_err());
    }

    #[test]
    fn rejects_nonpositive_duration() {
        let text = r#"{"title":"t","voiceover":"v","shots":[{"img_prompt":"a","duration":0}]}"#;
        assert!(ShotPlan::from_json(text).is_err());
    }
}

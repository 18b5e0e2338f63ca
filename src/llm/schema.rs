//! Normalization of model output into per-platform variants
//!
//! Expected shape:
//! `{"drafts":[{"platform":"facebook","variants":["...","..."]}]}`.
//! A single `text` field is accepted in place of `variants`, and a
//! surrounding markdown code fence is ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Platform;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("output is not valid JSON: {0}")]
    NotJson(String),
    #[error("missing `drafts` array")]
    MissingDrafts,
    #[error("no usable variant for platform {0}")]
    MissingPlatform(Platform),
}

/// Variants returned for one platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDraft {
    pub platform: Platform,
    pub variants: Vec<String>,
}

static FENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*\n?(.*?)\n?\s*```\s*$").expect("valid fence regex"));

fn strip_fence(raw: &str) -> &str {
    match FENCE_RE.captures(raw).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => raw.trim(),
    }
}

fn variants_of(entry: &serde_json::Value) -> Vec<String> {
    let mut variants: Vec<String> = entry
        .get("variants")
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| match v {
                    serde_json::Value::String(s) => Some(s.clone()),
                    other => other.get("text").and_then(|t| t.as_str()).map(str::to_string),
                })
                .collect()
        })
        .unwrap_or_default();
    if variants.is_empty() {
        if let Some(text) = entry.get("text").and_then(|t| t.as_str()) {
            variants.push(text.to_string());
        }
    }
    variants
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Parse model output, keeping only the requested platforms in request order.
pub fn normalize_model_output(raw: &str, platforms: &[Platform]) -> Result<Vec<ModelDraft>, SchemaError> {
    let body: serde_json::Value =
        serde_json::from_str(strip_fence(raw)).map_err(|e| SchemaError::NotJson(e.to_string()))?;
    let entries = body
        .get("drafts")
        .and_then(|d| d.as_array())
        .ok_or(SchemaError::MissingDrafts)?;

    platforms
        .iter()
        .map(|platform| {
            let variants: Vec<String> = entries
                .iter()
                .filter(|e| {
                    e.get("platform")
                        .and_then(|p| p.as_str())
                        .and_then(Platform::parse)
                        == Some(*platform)
                })
                .flat_map(variants_of)
                .collect();
            if variants.is_empty() {
                Err(SchemaError::MissingPlatform(*platform))
            } else {
                Ok(ModelDraft {
                    platform: *platform,
                    variants,
                })
            }
        })
        .collect()
}

/// Follow-up message sent on the single schema retry
pub fn schema_reminder(platforms: &[Platform], error: &SchemaError) -> String {
    let names: Vec<&str> = platforms.iter().map(|p| p.as_str()).collect();
    format!(
        "Your previous answer was rejected ({}). Reply with JSON only, exactly in the form \
         {{\"drafts\":[{{\"platform\":\"<name>\",\"variants\":[\"<post text>\"]}}]}} \
         with one entry for each of: {}.",
        error,
        names.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_fenced_output() {
        let raw = "```json\n{\"drafts\":[{\"platform\":\"instagram\",\"variants\":[\"A\",\"  \",\"B\"]},{\"platform\":\"facebook\",\"text\":\"C\"}]}\n```";
        let drafts = normalize_model_output(raw, &[Platform::Facebook, Platform::Instagram]).unwrap();
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].platform, Platform::Facebook);
        assert_eq!(drafts[0].variants, vec!["C".to_string()]);
        assert_eq!(drafts[1].variants, vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_missing_platform_is_rejected() {
        let raw = r#"{"drafts":[{"platform":"facebook","variants":["x"]}]}"#;
        let err = normalize_model_output(raw, &[Platform::Facebook, Platform::Tiktok]).unwrap_err();
        assert_eq!(err, SchemaError::MissingPlatform(Platform::Tiktok));
    }

    #[test]
    fn test_garbage_is_not_json() {
        assert!(matches!(
            normalize_model_output("Sure! Here are your drafts", &[Platform::Facebook]),
            Err(SchemaError::NotJson(_))
        ));
        assert_eq!(
            normalize_model_output("{\"posts\": []}", &[Platform::Facebook]),
            Err(SchemaError::MissingDrafts)
        );
    }

    #[test]
    fn test_reminder_names_platforms() {
        let msg = schema_reminder(&[Platform::Youtube], &SchemaError::MissingDrafts);
        assert!(msg.contains("youtube"));
        assert!(msg.contains("\"drafts\""));
    }
}

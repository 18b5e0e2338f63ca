//! Persistence contract
//!
//! Records persisted by the engine and the narrow [`EngineStore`] trait the
//! rest of the crate talks to. Usage events, decision logs and outcome events
//! are append-only; creative memory insights are the only rows that are ever
//! read-modify-written.

pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orchestrator::roi::PremiumRoiDecision;
use crate::signals::{self, CtaType, Framework, HookType};
use crate::types::{GenerationMode, Objective, Platform};

pub use sqlite::SqliteStore;

/// Storage failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("corrupt row in {table}: {detail}")]
    Corrupt { table: &'static str, detail: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Rank of an insight, derived at read time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightRank {
    Untested,
    Top,
    Mid,
    Low,
}

/// Per-organization performance aggregate for one signal triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeMemoryInsight {
    pub org_id: String,
    pub platform: Platform,
    pub objective: Objective,
    pub memory_key: String,
    pub sample_size: u32,
    pub success_count: u32,
    pub total_engagement: f64,
    pub avg_engagement: f64,
    pub updated_at: DateTime<Utc>,
}

impl CreativeMemoryInsight {
    /// Raw success ratio, 0 for an empty aggregate
    pub fn success_rate(&self) -> f64 {
        if self.sample_size == 0 {
            0.0
        } else {
            self.success_count as f64 / self.sample_size as f64
        }
    }

    pub fn rank(&self) -> InsightRank {
        let success_rate = self.success_rate();
        if self.sample_size < 3 {
            InsightRank::Untested
        } else if success_rate >= 0.6 && self.avg_engagement >= 3.0 {
            InsightRank::Top
        } else if success_rate >= 0.35 {
            InsightRank::Mid
        } else {
            InsightRank::Low
        }
    }

    pub fn signals(&self) -> Option<(HookType, Framework, CtaType)> {
        signals::parse_memory_key(&self.memory_key)
    }

    pub fn hook_type(&self) -> Option<HookType> {
        self.signals().map(|(hook, _, _)| hook)
    }

    pub fn framework(&self) -> Option<Framework> {
        self.signals().map(|(_, framework, _)| framework)
    }
}

/// One immutable row per attempted generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub id: String,
    pub org_id: String,
    pub route_key: String,
    pub mode: GenerationMode,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub cost_usd: Decimal,
    pub latency_ms: u64,
    pub success: bool,
    pub cache_hit: bool,
    pub error_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UsageEvent {
    pub fn new(org_id: &str, route_key: &str, mode: GenerationMode) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            org_id: org_id.to_string(),
            route_key: route_key.to_string(),
            mode,
            provider: None,
            model: None,
            input_tokens: 0,
            output_tokens: 0,
            cost_usd: Decimal::ZERO,
            latency_ms: 0,
            success: true,
            cache_hit: false,
            error_code: None,
            created_at: Utc::now(),
        }
    }
}

/// Cached response for a normalized request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentCacheEntry {
    pub org_id: String,
    pub route_key: String,
    pub intent_hash: String,
    pub response: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Generation decision for one published post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionLog {
    pub id: String,
    pub org_id: String,
    pub post_id: String,
    pub platform: Platform,
    pub objective: Objective,
    pub model: String,
    pub mode: GenerationMode,
    pub variant_index: usize,
    pub memory_key: String,
    pub roi: Option<PremiumRoiDecision>,
    pub created_at: DateTime<Utc>,
}

/// When an outcome was measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeEventType {
    Publish,
    Snapshot,
}

impl OutcomeEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeEventType::Publish => "publish",
            OutcomeEventType::Snapshot => "snapshot",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "publish" => Some(OutcomeEventType::Publish),
            "snapshot" => Some(OutcomeEventType::Snapshot),
            _ => None,
        }
    }
}

/// Measured engagement of a post
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeMetrics {
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub reach: u64,
    #[serde(default)]
    pub reactions: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub shares: u64,
    #[serde(default)]
    pub saves: u64,
    #[serde(default)]
    pub clicks: u64,
    /// Percent, e.g. 5.5 means 5.5%
    #[serde(default)]
    pub engagement_rate: f64,
}

/// One measured outcome, deduplicated by `metrics_hash`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    pub id: String,
    pub org_id: String,
    pub post_id: String,
    pub source: String,
    pub event_type: OutcomeEventType,
    pub metrics: OutcomeMetrics,
    /// Free-form, e.g. `{"lead_value_usd": 120.0}`
    pub metadata: serde_json::Value,
    pub metrics_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Row store consumed by the engine
#[async_trait]
pub trait EngineStore: Send + Sync {
    /// Free-form org settings; `Value::Null` when none are stored
    async fn org_settings(&self, org_id: &str) -> Result<serde_json::Value, StoreError>;

    async fn insert_usage_event(&self, event: &UsageEvent) -> Result<(), StoreError>;

    async fn sum_usage_cost_since(&self, org_id: &str, since: DateTime<Utc>) -> Result<Decimal, StoreError>;

    async fn get_intent_cache(
        &self,
        org_id: &str,
        route_key: &str,
        intent_hash: &str,
    ) -> Result<Option<IntentCacheEntry>, StoreError>;

    /// Replaces any entry with the same (org, route, hash)
    async fn upsert_intent_cache(&self, entry: &IntentCacheEntry) -> Result<(), StoreError>;

    async fn insert_decision(&self, decision: &DecisionLog) -> Result<(), StoreError>;

    async fn decision_for_post(&self, org_id: &str, post_id: &str) -> Result<Option<DecisionLog>, StoreError>;

    /// Most recent first
    async fn recent_decisions(
        &self,
        org_id: &str,
        platform: Platform,
        objective: Objective,
        limit: usize,
    ) -> Result<Vec<DecisionLog>, StoreError>;

    /// Returns `false` when an identical (org, post, source, type, hash) row exists
    async fn insert_outcome_if_absent(&self, event: &OutcomeEvent) -> Result<bool, StoreError>;

    async fn latest_outcome_for_post(&self, org_id: &str, post_id: &str) -> Result<Option<OutcomeEvent>, StoreError>;

    async fn outcome_metadata_since(
        &self,
        org_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<serde_json::Value>, StoreError>;

    async fn creative_insight(
        &self,
        org_id: &str,
        platform: Platform,
        objective: Objective,
        memory_key: &str,
    ) -> Result<Option<CreativeMemoryInsight>, StoreError>;

    async fn creative_insights(
        &self,
        org_id: &str,
        platform: Platform,
        objective: Objective,
    ) -> Result<Vec<CreativeMemoryInsight>, StoreError>;

    async fn upsert_creative_insight(&self, insight: &CreativeMemoryInsight) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insight(sample_size: u32, success_count: u32, avg_engagement: f64) -> CreativeMemoryInsight {
        CreativeMemoryInsight {
            org_id: "org".to_string(),
            platform: Platform::Facebook,
            objective: Objective::Engagement,
            memory_key: "question|pas|comment".to_string(),
            sample_size,
            success_count,
            total_engagement: avg_engagement * sample_size as f64,
            avg_engagement,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_rank_thresholds() {
        assert_eq!(insight(2, 2, 9.0).rank(), InsightRank::Untested);
        assert_eq!(insight(5, 3, 3.0).rank(), InsightRank::Top);
        assert_eq!(insight(5, 3, 2.9).rank(), InsightRank::Mid);
        assert_eq!(insight(20, 7, 1.0).rank(), InsightRank::Mid);
        assert_eq!(insight(10, 3, 5.0).rank(), InsightRank::Low);
    }

    #[test]
    fn test_insight_signals_parse() {
        let i = insight(1, 1, 1.0);
        assert_eq!(i.hook_type(), Some(HookType::Question));
        assert_eq!(i.framework(), Some(Framework::Pas));
    }
}

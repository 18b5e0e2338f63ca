//! Decision and outcome logging
//!
//! Append-only writes of what was generated and how it performed. Every
//! function here is best-effort: failures are logged and reported as
//! `false` / empty, never as errors.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::store::{DecisionLog, EngineStore, OutcomeEvent, OutcomeEventType, OutcomeMetrics};
use crate::types::{Objective, Platform};

/// Outcome as reported by a metrics sync
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOutcome {
    pub org_id: String,
    pub post_id: String,
    pub source: String,
    pub event_type: OutcomeEventType,
    pub metrics: OutcomeMetrics,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Hash of the metric tuple; equal metrics hash equally
pub fn metrics_hash(metrics: &OutcomeMetrics) -> String {
    let canonical = format!(
        "{}|{}|{}|{}|{}|{}|{}|{:016x}",
        metrics.impressions,
        metrics.reach,
        metrics.reactions,
        metrics.comments,
        metrics.shares,
        metrics.saves,
        metrics.clicks,
        metrics.engagement_rate.to_bits()
    );
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// Record an outcome; `false` when it duplicates a previous sync or the write fails
pub async fn log_outcome_for_post(store: &dyn EngineStore, outcome: &NewOutcome) -> bool {
    let event = OutcomeEvent {
        id: uuid::Uuid::new_v4().to_string(),
        org_id: outcome.org_id.clone(),
        post_id: outcome.post_id.clone(),
        source: outcome.source.clone(),
        event_type: outcome.event_type,
        metrics: outcome.metrics.clone(),
        metadata: outcome.metadata.clone(),
        metrics_hash: metrics_hash(&outcome.metrics),
        created_at: Utc::now(),
    };
    match store.insert_outcome_if_absent(&event).await {
        Ok(true) => true,
        Ok(false) => {
            debug!("Outcome for post {} unchanged; skipped", outcome.post_id);
            false
        }
        Err(e) => {
            warn!("Failed to log outcome for post {} ({}): {}", outcome.post_id, outcome.org_id, e);
            false
        }
    }
}

/// Record a generation decision; `false` when the write fails
pub async fn log_decision(store: &dyn EngineStore, decision: &DecisionLog) -> bool {
    match store.insert_decision(decision).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to log decision for post {} ({}): {}", decision.post_id, decision.org_id, e);
            false
        }
    }
}

/// Recent decisions joined to each post's latest outcome, as (memory key, engagement rate)
pub async fn session_history(
    store: &dyn EngineStore,
    org_id: &str,
    platform: Platform,
    objective: Objective,
    limit: usize,
) -> Vec<(String, f64)> {
    let decisions = match store.recent_decisions(org_id, platform, objective, limit).await {
        Ok(decisions) => decisions,
        Err(e) => {
            warn!("Failed to read recent decisions for {}: {}", org_id, e);
            return Vec::new();
        }
    };

    let mut history = Vec::with_capacity(decisions.len());
    for decision in decisions {
        match store.latest_outcome_for_post(org_id, &decision.post_id).await {
            Ok(Some(outcome)) => history.push((decision.memory_key, outcome.metrics.engagement_rate)),
            Ok(None) => {}
            Err(e) => warn!("Failed to read outcome for post {}: {}", decision.post_id, e),
        }
    }
    history
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_hash_sensitivity() {
        let base = OutcomeMetrics {
            impressions: 1000,
            reach: 800,
            reactions: 40,
            comments: 5,
            shares: 2,
            saves: 3,
            clicks: 7,
            engagement_rate: 5.5,
        };
        assert_eq!(metrics_hash(&base), metrics_hash(&base.clone()));
        assert_eq!(metrics_hash(&base).len(), 64);

        let changed = OutcomeMetrics {
            clicks: 8,
            ..base.clone()
        };
        assert_ne!(metrics_hash(&base), metrics_hash(&changed));

        let rate = OutcomeMetrics {
            engagement_rate: 5.51,
            ..base.clone()
        };
        assert_ne!(metrics_hash(&base), metrics_hash(&rate));

        let a = OutcomeMetrics {
            engagement_rate: 2.0000001,
            ..base.clone()
        };
        let b = OutcomeMetrics {
            engagement_rate: 2.0000004,
            ..base.clone()
        };
        assert_ne!(metrics_hash(&a), metrics_hash(&b));
    }
}

//! End-to-end tests for the generation pipeline against an in-memory store

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use draftwise::config::BanditConfig;
use draftwise::learning::select_best_variant;
use draftwise::llm::{LlmError, LlmProvider, LlmRequest, LlmResponse};
use draftwise::store::{
    CreativeMemoryInsight, DecisionLog, EngineStore, IntentCacheEntry, OutcomeEvent, StoreError, UsageEvent,
};
use draftwise::types::{ContentType, GenerationMode, Language, Objective, Platform, QualityMode};
use draftwise::{Config, GenerationEngine, GenerationError, GenerationRequest, SqliteStore};
use rust_decimal::Decimal;
use serde_json::json;

/// Replays canned replies in order and records every request
#[derive(Default)]
struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, u16>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<String, u16>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn models(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|r| r.model.clone()).collect()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn call(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(LlmResponse {
                text,
                provider: "scripted".to_string(),
                model: request.model.clone(),
                input_tokens: 800,
                output_tokens: 400,
                latency_ms: 5,
            }),
            Some(Err(status)) => Err(LlmError::new(Some(status), "scripted failure")),
            None => Err(LlmError::new(Some(500), "script exhausted")),
        }
    }
}

/// Every call fails as if the database were gone
struct FailingStore;

fn down<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("database is gone".to_string()))
}

#[async_trait]
impl EngineStore for FailingStore {
    async fn org_settings(&self, _org_id: &str) -> Result<serde_json::Value, StoreError> {
        down()
    }

    async fn insert_usage_event(&self, _event: &UsageEvent) -> Result<(), StoreError> {
        down()
    }

    async fn sum_usage_cost_since(&self, _org_id: &str, _since: DateTime<Utc>) -> Result<Decimal, StoreError> {
        down()
    }

    async fn get_intent_cache(
        &self,
        _org_id: &str,
        _route_key: &str,
        _intent_hash: &str,
    ) -> Result<Option<IntentCacheEntry>, StoreError> {
        down()
    }

    async fn upsert_intent_cache(&self, _entry: &IntentCacheEntry) -> Result<(), StoreError> {
        down()
    }

    async fn insert_decision(&self, _decision: &DecisionLog) -> Result<(), StoreError> {
        down()
    }

    async fn decision_for_post(&self, _org_id: &str, _post_id: &str) -> Result<Option<DecisionLog>, StoreError> {
        down()
    }

    async fn recent_decisions(
        &self,
        _org_id: &str,
        _platform: Platform,
        _objective: Objective,
        _limit: usize,
    ) -> Result<Vec<DecisionLog>, StoreError> {
        down()
    }

    async fn insert_outcome_if_absent(&self, _event: &OutcomeEvent) -> Result<bool, StoreError> {
        down()
    }

    async fn latest_outcome_for_post(&self, _org_id: &str, _post_id: &str) -> Result<Option<OutcomeEvent>, StoreError> {
        down()
    }

    async fn outcome_metadata_since(
        &self,
        _org_id: &str,
        _since: DateTime<Utc>,
    ) -> Result<Vec<serde_json::Value>, StoreError> {
        down()
    }

    async fn creative_insight(
        &self,
        _org_id: &str,
        _platform: Platform,
        _objective: Objective,
        _memory_key: &str,
    ) -> Result<Option<CreativeMemoryInsight>, StoreError> {
        down()
    }

    async fn creative_insights(
        &self,
        _org_id: &str,
        _platform: Platform,
        _objective: Objective,
    ) -> Result<Vec<CreativeMemoryInsight>, StoreError> {
        down()
    }

    async fn upsert_creative_insight(&self, _insight: &CreativeMemoryInsight) -> Result<(), StoreError> {
        down()
    }
}

fn valid_reply() -> String {
    json!({
        "drafts": [
            {"platform": "facebook", "variants": ["Which bread do you grab first? Tell us below!", "Fresh sourdough every morning."]},
            {"platform": "tiktok", "text": "Stop scrolling: this loaf took 36 hours. Comment if you'd try it!"}
        ]
    })
    .to_string()
}

fn request(org: &str, quality: QualityMode) -> GenerationRequest {
    GenerationRequest {
        org_id: org.to_string(),
        idea: "Our 36-hour sourdough is back in stores this weekend".to_string(),
        platforms: vec![Platform::Facebook, Platform::Tiktok],
        objective: Objective::Engagement,
        language: Language::En,
        quality_mode: quality,
        content_type: ContentType::Post,
        context: vec!["Family bakery in Cluj since 1998".to_string()],
    }
}

fn engine_with(provider: Arc<ScriptedProvider>) -> (GenerationEngine, SqliteStore) {
    let store = SqliteStore::open_in_memory().unwrap();
    let engine = GenerationEngine::new(Arc::new(store.clone()), provider, Arc::new(Config::default()));
    (engine, store)
}

#[tokio::test]
async fn test_identical_request_is_served_from_cache() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![Ok(valid_reply())]);
    let (engine, store) = engine_with(provider.clone());

    let first = engine.generate(request("org-a", QualityMode::Economy)).await?;
    assert_eq!(first.mode, GenerationMode::Economy);
    assert!(!first.cache_hit);
    engine.telemetry().flush().await;

    let mut again = request("org-a", QualityMode::Economy);
    again.idea = "  Our 36-hour sourdough is back in   stores this weekend ".to_string();
    again.platforms = vec![Platform::Tiktok, Platform::Facebook];
    let second = engine.generate(again).await?;
    assert!(second.cache_hit);
    assert_eq!(second.mode, GenerationMode::Cache);
    assert_eq!(second.cost_usd, Decimal::ZERO);
    assert_eq!(second.intent_hash, first.intent_hash);
    assert_eq!(second.drafts, first.drafts);
    assert_eq!(provider.calls(), 1);

    engine.telemetry().flush().await;
    let events = store.usage_events("org-a").await?;
    assert_eq!(events.len(), 2);
    assert!(events[1].cache_hit);
    assert_eq!(events[1].cost_usd, Decimal::ZERO);
    Ok(())
}

#[tokio::test]
async fn test_cache_is_scoped_per_org() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![]);
    let (engine, _store) = engine_with(provider);

    engine.generate(request("org-a", QualityMode::Deterministic)).await?;
    engine.telemetry().flush().await;
    let other = engine.generate(request("org-b", QualityMode::Deterministic)).await?;
    assert!(!other.cache_hit);
    Ok(())
}

#[tokio::test]
async fn test_budget_exceeded_serves_deterministic_drafts() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![Ok(valid_reply())]);
    let (engine, store) = engine_with(provider.clone());
    store
        .set_org_settings("org-a", &json!({"ai_budget": {"daily_usd": 0}}))
        .await?;

    let response = engine.generate(request("org-a", QualityMode::Economy)).await?;
    assert_eq!(response.mode, GenerationMode::Deterministic);
    assert_eq!(response.drafts.len(), 2);
    assert!(response.warnings.iter().any(|w| w.contains("Daily AI budget exceeded")));
    let budget = response.budget.as_ref().unwrap();
    assert!(!budget.allowed);
    assert_eq!(provider.calls(), 0);

    engine.telemetry().flush().await;
    let events = store.usage_events("org-a").await?;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].error_code.as_deref(), Some("budget_exceeded"));
    assert_eq!(events[0].cost_usd, Decimal::ZERO);

    // short-lived cache entry answers the repeat without re-evaluating
    let repeat = engine.generate(request("org-a", QualityMode::Economy)).await?;
    assert!(repeat.cache_hit);
    assert_eq!(provider.calls(), 0);
    Ok(())
}

#[tokio::test]
async fn test_premium_denied_downgrades_to_economy() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![Ok(valid_reply())]);
    let (engine, store) = engine_with(provider.clone());
    // fits an economy call (< $0.001) but not a premium one (> $0.018)
    store
        .set_org_settings("org-a", &json!({"aiBudget": {"dailyUsd": "0.005"}}))
        .await?;

    let response = engine.generate(request("org-a", QualityMode::Premium)).await?;
    assert_eq!(response.mode, GenerationMode::Economy);
    assert!(response.warnings.iter().any(|w| w.contains("Premium model skipped")));
    assert_eq!(provider.models(), vec![Config::default().models.economy]);
    Ok(())
}

#[tokio::test]
async fn test_provider_failure_falls_back_and_is_not_cached() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![Err(503), Ok(valid_reply())]);
    let (engine, store) = engine_with(provider.clone());

    let fallback = engine.generate(request("org-a", QualityMode::Economy)).await?;
    assert_eq!(fallback.mode, GenerationMode::Deterministic);
    assert!(fallback.drafts.iter().all(|d| !d.text.is_empty()));
    engine.telemetry().flush().await;

    let retried = engine.generate(request("org-a", QualityMode::Economy)).await?;
    assert!(!retried.cache_hit);
    assert_eq!(retried.mode, GenerationMode::Economy);
    assert_eq!(provider.calls(), 2);

    engine.telemetry().flush().await;
    let events = store.usage_events("org-a").await?;
    assert_eq!(events.len(), 2);
    assert!(!events[0].success);
    assert_eq!(events[0].error_code.as_deref(), Some("provider_unavailable"));
    assert!(events[1].success);
    Ok(())
}

#[tokio::test]
async fn test_malformed_output_gets_one_retry() -> anyhow::Result<()> {
    let missing_tiktok = json!({"drafts": [{"platform": "facebook", "variants": ["Only one"]}]}).to_string();
    let provider = ScriptedProvider::new(vec![Ok(missing_tiktok), Ok(format!("```json\n{}\n```", valid_reply()))]);
    let (engine, store) = engine_with(provider.clone());

    let response = engine.generate(request("org-a", QualityMode::Economy)).await?;
    assert_eq!(response.mode, GenerationMode::Economy);
    assert_eq!(provider.calls(), 2);
    let tiktok = response.drafts.iter().find(|d| d.platform == Platform::Tiktok).unwrap();
    assert!(tiktok.text.contains("36 hours"));

    engine.telemetry().flush().await;
    let events = store.usage_events("org-a").await?;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].input_tokens, 1600);
    Ok(())
}

#[tokio::test]
async fn test_malformed_output_twice_fails_the_request() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![Ok("sorry".to_string()), Ok("{\"drafts\": []}".to_string())]);
    let (engine, store) = engine_with(provider.clone());

    let err = engine.generate(request("org-a", QualityMode::Economy)).await.unwrap_err();
    assert!(matches!(err, GenerationError::SchemaInvalid(_)));
    assert_eq!(err.code(), "schema_invalid");
    assert_eq!(provider.calls(), 2);

    // both billed attempts land in the ledger once background writes drain
    engine.telemetry().flush().await;
    let events = store.usage_events("org-a").await?;
    assert_eq!(events.len(), 1);
    assert!(!events[0].success);
    assert_eq!(events[0].error_code.as_deref(), Some("schema_invalid"));
    assert_eq!(events[0].input_tokens, 1600);
    assert!(events[0].cost_usd > Decimal::ZERO);
    Ok(())
}

#[tokio::test]
async fn test_auto_mode_follows_roi_gate() -> anyhow::Result<()> {
    let provider = ScriptedProvider::new(vec![Ok(valid_reply())]);
    let (engine, _store) = engine_with(provider.clone());

    let response = engine.generate(request("org-a", QualityMode::Auto)).await?;
    let roi = response.roi.as_ref().unwrap();
    let expected = if roi.should_escalate {
        GenerationMode::Premium
    } else {
        GenerationMode::Economy
    };
    assert_eq!(response.mode, expected);
    let projected = response.projected.unwrap();
    assert!(projected.premium >= projected.baseline);
    assert!(projected.baseline >= projected.deterministic);
    Ok(())
}

#[tokio::test]
async fn test_unavailable_store_still_serves_drafts() {
    let provider = ScriptedProvider::new(vec![]);
    let engine = GenerationEngine::new(Arc::new(FailingStore), provider.clone(), Arc::new(Config::default()));

    let response = engine.generate(request("org-a", QualityMode::Auto)).await.unwrap();
    assert_eq!(response.mode, GenerationMode::Deterministic);
    assert!(!response.cache_hit);
    assert_eq!(response.drafts.len(), 2);
    assert!(response.drafts.iter().all(|d| !d.text.is_empty()));
    assert!(response.roi.is_some());
    assert_eq!(provider.calls(), 1);

    // failed usage and cache writes are logged, not raised
    engine.telemetry().flush().await;
    assert_eq!(engine.telemetry().pending().await, 0);
}

#[tokio::test]
async fn test_unavailable_store_still_ranks_variants() {
    let variants = vec!["De ce 90% din pacienti aleg gresit?".to_string(), "ok".to_string()];

    let selection = select_best_variant(
        &FailingStore,
        &BanditConfig::default(),
        "org-a",
        Platform::Facebook,
        Objective::Engagement,
        &variants,
    )
    .await;

    assert!(selection.reason.starts_with("bandit_ucb_objective_"));
    assert_eq!(selection.ranked.len(), 2);
    assert!(selection.ranked.iter().all(|r| r.score.is_finite()));
}

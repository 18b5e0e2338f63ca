//! Creative learning loop: outcomes, creative memory and variant selection

use std::sync::Arc;

use draftwise::config::BanditConfig;
use draftwise::learning::{
    log_outcome_for_post, refresh_creative_memory_from_post, select_best_variant, NewOutcome, PostPerformance,
};
use draftwise::store::{EngineStore, InsightRank, OutcomeEventType, OutcomeMetrics};
use draftwise::types::{GenerationMode, Objective, Platform};
use draftwise::{Config, GenerationEngine, PublishRecord, SqliteStore, UnavailableProvider};
use serde_json::json;

fn outcome(post_id: &str, engagement_rate: f64) -> NewOutcome {
    NewOutcome {
        org_id: "clinic".to_string(),
        post_id: post_id.to_string(),
        source: "facebook_sync".to_string(),
        event_type: OutcomeEventType::Snapshot,
        metrics: OutcomeMetrics {
            impressions: 1200,
            reach: 950,
            reactions: 40,
            comments: 12,
            shares: 3,
            saves: 1,
            clicks: 7,
            engagement_rate,
        },
        metadata: json!({}),
    }
}

#[tokio::test]
async fn test_running_average_over_two_posts() -> anyhow::Result<()> {
    let store = SqliteStore::open_in_memory()?;
    let post = |post_id: &str, rate: f64| PostPerformance {
        org_id: "clinic".to_string(),
        post_id: post_id.to_string(),
        platform: Platform::Facebook,
        objective: Objective::Engagement,
        memory_key: "question|pas|comment".to_string(),
        engagement_rate: rate,
    };

    let first = refresh_creative_memory_from_post(&store, &post("p1", 5.5), 2.0).await?;
    assert_eq!(first.sample_size, 1);
    assert_eq!(first.avg_engagement, 5.5);

    let second = refresh_creative_memory_from_post(&store, &post("p2", 2.5), 2.0).await?;
    assert_eq!(second.sample_size, 2);
    assert_eq!(second.success_count, 2);
    assert!((second.avg_engagement - 4.0).abs() < 1e-9);
    assert_eq!(second.rank(), InsightRank::Untested);

    let stored = store
        .creative_insight("clinic", Platform::Facebook, Objective::Engagement, "question|pas|comment")
        .await?
        .unwrap();
    assert_eq!(stored.sample_size, 2);
    Ok(())
}

#[tokio::test]
async fn test_unchanged_snapshot_is_deduplicated() {
    let store = SqliteStore::open_in_memory().unwrap();

    assert!(log_outcome_for_post(&store, &outcome("p1", 3.1)).await);
    assert!(!log_outcome_for_post(&store, &outcome("p1", 3.1)).await);

    let mut changed = outcome("p1", 3.1);
    changed.metrics.comments += 1;
    assert!(log_outcome_for_post(&store, &changed).await);

    let mut published = outcome("p1", 3.1);
    published.event_type = OutcomeEventType::Publish;
    assert!(log_outcome_for_post(&store, &published).await);
}

#[tokio::test]
async fn test_question_hook_not_outranked_by_degenerate_variant() {
    let store = SqliteStore::open_in_memory().unwrap();
    let variants = vec!["De ce 90% din pacienti aleg gresit?".to_string(), "ok".to_string()];

    let selection = select_best_variant(
        &store,
        &BanditConfig::default(),
        "clinic",
        Platform::Facebook,
        Objective::Engagement,
        &variants,
    )
    .await;

    assert_eq!(selection.reason, "bandit_ucb_objective_engagement");
    assert_eq!(selection.selected_index, 0);
    let question = selection.ranked.iter().find(|r| r.index == 0).unwrap();
    let degenerate = selection.ranked.iter().find(|r| r.index == 1).unwrap();
    assert!(degenerate.score <= question.score);
    for pair in selection.ranked.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    assert!(selection.ranked.iter().all(|r| (0.0..=1.0).contains(&r.success_rate)));
}

#[tokio::test]
async fn test_publish_then_outcome_refreshes_memory() -> anyhow::Result<()> {
    let store = SqliteStore::open_in_memory()?;
    let engine = GenerationEngine::new(
        Arc::new(store.clone()),
        Arc::new(UnavailableProvider),
        Arc::new(Config::default()),
    );

    let text = "Why do 9 out of 10 patients skip this check? Tell us in the comments.";
    let decision = engine
        .record_publish(PublishRecord {
            org_id: "clinic".to_string(),
            post_id: "p1".to_string(),
            platform: Platform::Facebook,
            objective: Objective::Engagement,
            text: text.to_string(),
            model: None,
            mode: GenerationMode::Deterministic,
            variant_index: 0,
            roi: None,
        })
        .await
        .unwrap();
    assert!(decision.memory_key.starts_with("question|"));

    assert!(engine.record_outcome(outcome("p1", 5.5)).await);
    assert!(!engine.record_outcome(outcome("p1", 5.5)).await);
    engine.telemetry().flush().await;

    let insight = store
        .creative_insight("clinic", Platform::Facebook, Objective::Engagement, &decision.memory_key)
        .await?
        .unwrap();
    assert_eq!(insight.sample_size, 1);
    assert_eq!(insight.avg_engagement, 5.5);

    // an outcome for a post with no logged decision changes nothing
    assert!(engine.record_outcome(outcome("unknown-post", 9.0)).await);
    engine.telemetry().flush().await;
    let insights = store
        .creative_insights("clinic", Platform::Facebook, Objective::Engagement)
        .await?;
    assert_eq!(insights.len(), 1);
    Ok(())
}

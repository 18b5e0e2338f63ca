//! Creative memory refresh
//!
//! The only read-modify-write in the engine. Concurrent refreshes of the same
//! key may lose an increment; the aggregate is statistical and tolerates it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{CreativeMemoryInsight, EngineStore, StoreError};
use crate::types::{Objective, Platform};

/// Measured performance of one published post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPerformance {
    pub org_id: String,
    pub post_id: String,
    pub platform: Platform,
    pub objective: Objective,
    pub memory_key: String,
    /// Percent
    pub engagement_rate: f64,
}

/// Merge one post's engagement into its aggregate, creating it on first sight
pub async fn refresh_creative_memory_from_post(
    store: &dyn EngineStore,
    post: &PostPerformance,
    success_engagement_rate: f64,
) -> Result<CreativeMemoryInsight, StoreError> {
    let engagement = if post.engagement_rate.is_finite() {
        post.engagement_rate.max(0.0)
    } else {
        0.0
    };
    let success = u32::from(engagement >= success_engagement_rate);

    let existing = store
        .creative_insight(&post.org_id, post.platform, post.objective, &post.memory_key)
        .await?;

    let insight = match existing {
        None => CreativeMemoryInsight {
            org_id: post.org_id.clone(),
            platform: post.platform,
            objective: post.objective,
            memory_key: post.memory_key.clone(),
            sample_size: 1,
            success_count: success,
            total_engagement: engagement,
            avg_engagement: engagement,
            updated_at: Utc::now(),
        },
        Some(mut insight) => {
            insight.sample_size += 1;
            insight.success_count += success;
            insight.total_engagement += engagement;
            insight.avg_engagement = insight.total_engagement / insight.sample_size as f64;
            insight.updated_at = Utc::now();
            insight
        }
    };

    store.upsert_creative_insight(&insight).await?;
    debug!(
        "Creative memory {} for {} now {} samples, avg {:.2}",
        insight.memory_key, post.org_id, insight.sample_size, insight.avg_engagement
    );
    Ok(insight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn post(post_id: &str, engagement_rate: f64) -> PostPerformance {
        PostPerformance {
            org_id: "org-1".to_string(),
            post_id: post_id.to_string(),
            platform: Platform::Facebook,
            objective: Objective::Engagement,
            memory_key: "question|pas|comment".to_string(),
            engagement_rate,
        }
    }

    #[tokio::test]
    async fn test_running_average() {
        let store = SqliteStore::open_in_memory().unwrap();

        let first = refresh_creative_memory_from_post(&store, &post("p1", 5.5), 2.0).await.unwrap();
        assert_eq!(first.sample_size, 1);
        assert_eq!(first.avg_engagement, 5.5);
        assert_eq!(first.success_count, 1);

        let second = refresh_creative_memory_from_post(&store, &post("p2", 2.5), 2.0).await.unwrap();
        assert_eq!(second.sample_size, 2);
        assert_eq!(second.avg_engagement, 4.0);
        assert_eq!(second.success_count, 2);

        let third = refresh_creative_memory_from_post(&store, &post("p3", 1.0), 2.0).await.unwrap();
        assert_eq!(third.success_count, 2);
        assert_eq!(third.sample_size, 3);
    }
}

//! Intent cache
//!
//! Content-addressable reuse of earlier responses. The key is a sha256 over
//! the route, the normalized request and the schema version, so semantically
//! identical requests collide and schema bumps invalidate old entries.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::deterministic::text::collapse_whitespace;
use crate::store::{EngineStore, IntentCacheEntry, StoreError};

use super::pipeline::GenerationRequest;

/// sha256 of arbitrary referenced content
pub fn content_hash(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Request fields that determine the response, in canonical form
pub fn normalize_intent_payload(request: &GenerationRequest) -> serde_json::Value {
    let mut platforms: Vec<&str> = request.platforms.iter().map(|p| p.as_str()).collect();
    platforms.sort_unstable();
    platforms.dedup();

    let mut context_hashes: Vec<String> = request
        .context
        .iter()
        .map(|c| collapse_whitespace(c))
        .filter(|c| !c.is_empty())
        .map(|c| content_hash(&c))
        .collect();
    context_hashes.sort_unstable();
    context_hashes.dedup();

    json!({
        "text": collapse_whitespace(&request.idea),
        "platforms": platforms,
        "language": request.language.as_str(),
        "qualityMode": request.quality_mode.as_str(),
        "objective": request.objective.as_str(),
        "contentType": request.content_type.as_str(),
        "contextHashes": context_hashes,
    })
}

/// Deterministic cache key; object keys serialize sorted
pub fn build_intent_cache_key(route_key: &str, payload: &serde_json::Value, schema_version: &str) -> String {
    let envelope = json!({
        "routeKey": route_key,
        "payload": payload,
        "schemaVersion": schema_version,
    });
    content_hash(&envelope.to_string())
}

/// Store-backed cache with best-effort reads and writes
#[derive(Clone)]
pub struct IntentCache {
    store: Arc<dyn EngineStore>,
}

impl IntentCache {
    pub fn new(store: Arc<dyn EngineStore>) -> Self {
        Self { store }
    }

    /// Live entry for the key; expired entries and read failures are misses
    pub async fn get(&self, org_id: &str, route_key: &str, intent_hash: &str) -> Option<serde_json::Value> {
        self.get_at(org_id, route_key, intent_hash, Utc::now()).await
    }

    pub async fn get_at(
        &self,
        org_id: &str,
        route_key: &str,
        intent_hash: &str,
        now: DateTime<Utc>,
    ) -> Option<serde_json::Value> {
        match self.store.get_intent_cache(org_id, route_key, intent_hash).await {
            Ok(Some(entry)) if entry.expires_at > now => Some(entry.response),
            Ok(Some(_)) => {
                debug!("Cache entry {} expired", intent_hash);
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Cache read failed for {}: {}", org_id, e);
                None
            }
        }
    }

    /// Write or supersede the entry for the key
    pub async fn put(
        &self,
        org_id: &str,
        route_key: &str,
        intent_hash: &str,
        response: serde_json::Value,
        ttl_secs: i64,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let entry = IntentCacheEntry {
            org_id: org_id.to_string(),
            route_key: route_key.to_string(),
            intent_hash: intent_hash.to_string(),
            response,
            created_at: now,
            expires_at: now + Duration::seconds(ttl_secs.max(0)),
        };
        self.store.upsert_intent_cache(&entry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::types::{ContentType, Language, Objective, Platform, QualityMode};

    fn request() -> GenerationRequest {
        GenerationRequest {
            org_id: "org-1".to_string(),
            idea: "  Launch   day for our new app ".to_string(),
            platforms: vec![Platform::Instagram, Platform::Facebook],
            objective: Objective::Reach,
            language: Language::En,
            quality_mode: QualityMode::Auto,
            content_type: ContentType::Post,
            context: vec!["About us: we build apps.".to_string()],
        }
    }

    #[test]
    fn test_key_is_stable_under_normalization() {
        let a = request();
        let mut b = request();
        b.idea = "Launch day for our new app".to_string();
        b.platforms = vec![Platform::Facebook, Platform::Instagram, Platform::Facebook];
        b.context = vec!["About us:   we build apps.".to_string()];

        let key_a = build_intent_cache_key("generate", &normalize_intent_payload(&a), "v1");
        let key_b = build_intent_cache_key("generate", &normalize_intent_payload(&b), "v1");
        assert_eq!(key_a, key_b);
        assert_eq!(key_a.len(), 64);
    }

    #[test]
    fn test_key_changes_with_any_field() {
        let base = request();
        let payload = normalize_intent_payload(&base);
        let key = build_intent_cache_key("generate", &payload, "v1");

        assert_ne!(key, build_intent_cache_key("score", &payload, "v1"));
        assert_ne!(key, build_intent_cache_key("generate", &payload, "v2"));

        let mut changed = request();
        changed.objective = Objective::Leads;
        assert_ne!(key, build_intent_cache_key("generate", &normalize_intent_payload(&changed), "v1"));

        let mut changed = request();
        changed.language = Language::Ro;
        assert_ne!(key, build_intent_cache_key("generate", &normalize_intent_payload(&changed), "v1"));

        let mut changed = request();
        changed.context.push("Pricing page".to_string());
        assert_ne!(key, build_intent_cache_key("generate", &normalize_intent_payload(&changed), "v1"));
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let store: Arc<dyn EngineStore> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let cache = IntentCache::new(store);
        cache
            .put("org-1", "generate", "abc", json!({"drafts": []}), 60)
            .await
            .unwrap();

        assert!(cache.get("org-1", "generate", "abc").await.is_some());
        assert!(cache.get("org-2", "generate", "abc").await.is_none());
        let later = Utc::now() + Duration::seconds(120);
        assert!(cache.get_at("org-1", "generate", "abc", later).await.is_none());
    }
}

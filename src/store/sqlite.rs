//! SQLite-backed engine store

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::debug;

use super::{
    CreativeMemoryInsight, DecisionLog, EngineStore, IntentCacheEntry, OutcomeEvent, OutcomeEventType,
    StoreError, UsageEvent,
};
use crate::types::{GenerationMode, Objective, Platform};

/// Engine store over a single SQLite connection
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

/// Fixed-width UTC timestamps so `created_at >= ?` compares lexicographically
fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn bad_column(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(idx, value.to_string(), Type::Text)
}

fn platform_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Platform> {
    let raw: String = row.get(idx)?;
    Platform::parse(&raw).ok_or_else(|| bad_column(idx, &raw))
}

fn objective_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Objective> {
    let raw: String = row.get(idx)?;
    Objective::parse(&raw).ok_or_else(|| bad_column(idx, &raw))
}

fn json_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<serde_json::Value> {
    let raw: Option<String> = row.get(idx)?;
    Ok(raw
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or(serde_json::Value::Null))
}

impl SqliteStore {
    /// Open (or create) a database file
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::init_schema(&conn)?;
        debug!("Opened engine store at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Private in-memory database, used by tests and dry runs
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS org_settings (
                org_id TEXT PRIMARY KEY,
                settings TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS usage_events (
                id TEXT PRIMARY KEY,
                org_id TEXT NOT NULL,
                route_key TEXT NOT NULL,
                mode TEXT NOT NULL,
                provider TEXT,
                model TEXT,
                input_tokens INTEGER NOT NULL DEFAULT 0,
                output_tokens INTEGER NOT NULL DEFAULT 0,
                cost_usd TEXT NOT NULL DEFAULT '0',
                latency_ms INTEGER NOT NULL DEFAULT 0,
                success INTEGER NOT NULL,
                cache_hit INTEGER NOT NULL,
                error_code TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS intent_cache (
                org_id TEXT NOT NULL,
                route_key TEXT NOT NULL,
                intent_hash TEXT NOT NULL,
                response TEXT NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                PRIMARY KEY (org_id, route_key, intent_hash)
            );

            CREATE TABLE IF NOT EXISTS decision_logs (
                id TEXT PRIMARY KEY,
                org_id TEXT NOT NULL,
                post_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                objective TEXT NOT NULL,
                model TEXT NOT NULL,
                mode TEXT NOT NULL,
                variant_index INTEGER NOT NULL,
                memory_key TEXT NOT NULL,
                roi TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS outcome_events (
                id TEXT PRIMARY KEY,
                org_id TEXT NOT NULL,
                post_id TEXT NOT NULL,
                source TEXT NOT NULL,
                event_type TEXT NOT NULL,
                metrics TEXT NOT NULL,
                metadata TEXT NOT NULL DEFAULT 'null',
                metrics_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (org_id, post_id, source, event_type, metrics_hash)
            );

            CREATE TABLE IF NOT EXISTS creative_memory (
                org_id TEXT NOT NULL,
                platform TEXT NOT NULL,
                objective TEXT NOT NULL,
                memory_key TEXT NOT NULL,
                sample_size INTEGER NOT NULL,
                success_count INTEGER NOT NULL,
                total_engagement REAL NOT NULL,
                avg_engagement REAL NOT NULL,
                updated_at TEXT NOT NULL,
                PRIMARY KEY (org_id, platform, objective, memory_key)
            );

            CREATE INDEX IF NOT EXISTS idx_usage_org_created ON usage_events(org_id, created_at);
            CREATE INDEX IF NOT EXISTS idx_decisions_scope ON decision_logs(org_id, platform, objective, created_at DESC);
            CREATE INDEX IF NOT EXISTS idx_decisions_post ON decision_logs(org_id, post_id);
            CREATE INDEX IF NOT EXISTS idx_outcomes_post ON outcome_events(org_id, post_id, created_at DESC);
            CREATE INDEX IF NOT EXISTS idx_outcomes_org_created ON outcome_events(org_id, created_at);
        "#,
        )?;
        Ok(())
    }

    /// Replace an organization's settings document
    pub async fn set_org_settings(&self, org_id: &str, settings: &serde_json::Value) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO org_settings (org_id, settings, updated_at) VALUES (?1, ?2, ?3)",
            params![org_id, serde_json::to_string(settings)?, ts(&Utc::now())],
        )?;
        Ok(())
    }

    /// Number of usage rows for an organization
    pub async fn count_usage_events(&self, org_id: &str) -> Result<usize, StoreError> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM usage_events WHERE org_id = ?1",
            params![org_id],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    /// Usage rows for an organization, oldest first
    pub async fn usage_events(&self, org_id: &str) -> Result<Vec<UsageEvent>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, org_id, route_key, mode, provider, model, input_tokens, output_tokens,
                    cost_usd, latency_ms, success, cache_hit, error_code, created_at
             FROM usage_events WHERE org_id = ?1 ORDER BY created_at ASC",
        )?;
        let events = stmt
            .query_map(params![org_id], |row| {
                let mode_raw: String = row.get(3)?;
                let cost_raw: String = row.get(8)?;
                let input_tokens: i64 = row.get(6)?;
                let output_tokens: i64 = row.get(7)?;
                let latency_ms: i64 = row.get(9)?;
                let created_at: String = row.get(13)?;
                Ok(UsageEvent {
                    id: row.get(0)?,
                    org_id: row.get(1)?,
                    route_key: row.get(2)?,
                    mode: GenerationMode::parse(&mode_raw).ok_or_else(|| bad_column(3, &mode_raw))?,
                    provider: row.get(4)?,
                    model: row.get(5)?,
                    input_tokens: input_tokens.max(0) as u32,
                    output_tokens: output_tokens.max(0) as u32,
                    cost_usd: Decimal::from_str(&cost_raw).unwrap_or(Decimal::ZERO),
                    latency_ms: latency_ms.max(0) as u64,
                    success: row.get(10)?,
                    cache_hit: row.get(11)?,
                    error_code: row.get(12)?,
                    created_at: parse_ts(&created_at),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(events)
    }

    fn row_to_decision(row: &Row<'_>) -> rusqlite::Result<DecisionLog> {
        let mode_raw: String = row.get(6)?;
        let variant_index: i64 = row.get(7)?;
        let roi = json_at(row, 9)?;
        let created_at: String = row.get(10)?;
        Ok(DecisionLog {
            id: row.get(0)?,
            org_id: row.get(1)?,
            post_id: row.get(2)?,
            platform: platform_at(row, 3)?,
            objective: objective_at(row, 4)?,
            model: row.get(5)?,
            mode: GenerationMode::parse(&mode_raw).ok_or_else(|| bad_column(6, &mode_raw))?,
            variant_index: variant_index.max(0) as usize,
            memory_key: row.get(8)?,
            roi: serde_json::from_value(roi).ok(),
            created_at: parse_ts(&created_at),
        })
    }

    fn row_to_outcome(row: &Row<'_>) -> rusqlite::Result<OutcomeEvent> {
        let event_type_raw: String = row.get(4)?;
        let metrics = json_at(row, 5)?;
        let created_at: String = row.get(8)?;
        Ok(OutcomeEvent {
            id: row.get(0)?,
            org_id: row.get(1)?,
            post_id: row.get(2)?,
            source: row.get(3)?,
            event_type: OutcomeEventType::parse(&event_type_raw).ok_or_else(|| bad_column(4, &event_type_raw))?,
            metrics: serde_json::from_value(metrics).unwrap_or_default(),
            metadata: json_at(row, 6)?,
            metrics_hash: row.get(7)?,
            created_at: parse_ts(&created_at),
        })
    }

    fn row_to_insight(row: &Row<'_>) -> rusqlite::Result<CreativeMemoryInsight> {
        let sample_size: i64 = row.get(4)?;
        let success_count: i64 = row.get(5)?;
        let updated_at: String = row.get(8)?;
        Ok(CreativeMemoryInsight {
            org_id: row.get(0)?,
            platform: platform_at(row, 1)?,
            objective: objective_at(row, 2)?,
            memory_key: row.get(3)?,
            sample_size: sample_size.max(0) as u32,
            success_count: success_count.max(0) as u32,
            total_engagement: row.get(6)?,
            avg_engagement: row.get(7)?,
            updated_at: parse_ts(&updated_at),
        })
    }
}

#[async_trait]
impl EngineStore for SqliteStore {
    async fn org_settings(&self, org_id: &str) -> Result<serde_json::Value, StoreError> {
        let conn = self.conn.lock().await;
        let raw: Option<String> = conn
            .query_row(
                "SELECT settings FROM org_settings WHERE org_id = ?1",
                params![org_id],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(s) => Ok(serde_json::from_str(&s)?),
            None => Ok(serde_json::Value::Null),
        }
    }

    async fn insert_usage_event(&self, event: &UsageEvent) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO usage_events
               (id, org_id, route_key, mode, provider, model, input_tokens, output_tokens,
                cost_usd, latency_ms, success, cache_hit, error_code, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"#,
            params![
                event.id,
                event.org_id,
                event.route_key,
                event.mode.as_str(),
                event.provider,
                event.model,
                event.input_tokens as i64,
                event.output_tokens as i64,
                event.cost_usd.to_string(),
                event.latency_ms as i64,
                event.success,
                event.cache_hit,
                event.error_code,
                ts(&event.created_at),
            ],
        )?;
        Ok(())
    }

    async fn sum_usage_cost_since(&self, org_id: &str, since: DateTime<Utc>) -> Result<Decimal, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt =
            conn.prepare_cached("SELECT cost_usd FROM usage_events WHERE org_id = ?1 AND created_at >= ?2")?;
        let costs = stmt
            .query_map(params![org_id, ts(&since)], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(costs
            .iter()
            .filter_map(|c| Decimal::from_str(c).ok())
            .fold(Decimal::ZERO, |acc, c| acc + c))
    }

    async fn get_intent_cache(
        &self,
        org_id: &str,
        route_key: &str,
        intent_hash: &str,
    ) -> Result<Option<IntentCacheEntry>, StoreError> {
        let conn = self.conn.lock().await;
        let entry = conn
            .query_row(
                "SELECT org_id, route_key, intent_hash, response, created_at, expires_at
                 FROM intent_cache WHERE org_id = ?1 AND route_key = ?2 AND intent_hash = ?3",
                params![org_id, route_key, intent_hash],
                |row| {
                    let created_at: String = row.get(4)?;
                    let expires_at: String = row.get(5)?;
                    Ok(IntentCacheEntry {
                        org_id: row.get(0)?,
                        route_key: row.get(1)?,
                        intent_hash: row.get(2)?,
                        response: json_at(row, 3)?,
                        created_at: parse_ts(&created_at),
                        expires_at: parse_ts(&expires_at),
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    async fn upsert_intent_cache(&self, entry: &IntentCacheEntry) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT OR REPLACE INTO intent_cache
               (org_id, route_key, intent_hash, response, created_at, expires_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)"#,
            params![
                entry.org_id,
                entry.route_key,
                entry.intent_hash,
                serde_json::to_string(&entry.response)?,
                ts(&entry.created_at),
                ts(&entry.expires_at),
            ],
        )?;
        Ok(())
    }

    async fn insert_decision(&self, decision: &DecisionLog) -> Result<(), StoreError> {
        let roi = match &decision.roi {
            Some(roi) => Some(serde_json::to_string(roi)?),
            None => None,
        };
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO decision_logs
               (id, org_id, post_id, platform, objective, model, mode, variant_index, memory_key, roi, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
            params![
                decision.id,
                decision.org_id,
                decision.post_id,
                decision.platform.as_str(),
                decision.objective.as_str(),
                decision.model,
                decision.mode.as_str(),
                decision.variant_index as i64,
                decision.memory_key,
                roi,
                ts(&decision.created_at),
            ],
        )?;
        Ok(())
    }

    async fn decision_for_post(&self, org_id: &str, post_id: &str) -> Result<Option<DecisionLog>, StoreError> {
        let conn = self.conn.lock().await;
        let decision = conn
            .query_row(
                "SELECT id, org_id, post_id, platform, objective, model, mode, variant_index, memory_key, roi, created_at
                 FROM decision_logs WHERE org_id = ?1 AND post_id = ?2
                 ORDER BY created_at DESC LIMIT 1",
                params![org_id, post_id],
                Self::row_to_decision,
            )
            .optional()?;
        Ok(decision)
    }

    async fn recent_decisions(
        &self,
        org_id: &str,
        platform: Platform,
        objective: Objective,
        limit: usize,
    ) -> Result<Vec<DecisionLog>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT id, org_id, post_id, platform, objective, model, mode, variant_index, memory_key, roi, created_at
             FROM decision_logs WHERE org_id = ?1 AND platform = ?2 AND objective = ?3
             ORDER BY created_at DESC LIMIT ?4",
        )?;
        let decisions = stmt
            .query_map(
                params![org_id, platform.as_str(), objective.as_str(), limit as i64],
                Self::row_to_decision,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(decisions)
    }

    async fn insert_outcome_if_absent(&self, event: &OutcomeEvent) -> Result<bool, StoreError> {
        let metrics = serde_json::to_string(&event.metrics)?;
        let metadata = serde_json::to_string(&event.metadata)?;
        let conn = self.conn.lock().await;
        let inserted = conn.execute(
            r#"INSERT OR IGNORE INTO outcome_events
               (id, org_id, post_id, source, event_type, metrics, metadata, metrics_hash, created_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                event.id,
                event.org_id,
                event.post_id,
                event.source,
                event.event_type.as_str(),
                metrics,
                metadata,
                event.metrics_hash,
                ts(&event.created_at),
            ],
        )?;
        Ok(inserted > 0)
    }

    async fn latest_outcome_for_post(&self, org_id: &str, post_id: &str) -> Result<Option<OutcomeEvent>, StoreError> {
        let conn = self.conn.lock().await;
        let outcome = conn
            .query_row(
                "SELECT id, org_id, post_id, source, event_type, metrics, metadata, metrics_hash, created_at
                 FROM outcome_events WHERE org_id = ?1 AND post_id = ?2
                 ORDER BY created_at DESC, rowid DESC LIMIT 1",
                params![org_id, post_id],
                Self::row_to_outcome,
            )
            .optional()?;
        Ok(outcome)
    }

    async fn outcome_metadata_since(
        &self,
        org_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<serde_json::Value>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare_cached("SELECT metadata FROM outcome_events WHERE org_id = ?1 AND created_at >= ?2")?;
        let metadata = stmt
            .query_map(params![org_id, ts(&since)], |row| json_at(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(metadata)
    }

    async fn creative_insight(
        &self,
        org_id: &str,
        platform: Platform,
        objective: Objective,
        memory_key: &str,
    ) -> Result<Option<CreativeMemoryInsight>, StoreError> {
        let conn = self.conn.lock().await;
        let insight = conn
            .query_row(
                "SELECT org_id, platform, objective, memory_key, sample_size, success_count,
                        total_engagement, avg_engagement, updated_at
                 FROM creative_memory
                 WHERE org_id = ?1 AND platform = ?2 AND objective = ?3 AND memory_key = ?4",
                params![org_id, platform.as_str(), objective.as_str(), memory_key],
                Self::row_to_insight,
            )
            .optional()?;
        Ok(insight)
    }

    async fn creative_insights(
        &self,
        org_id: &str,
        platform: Platform,
        objective: Objective,
    ) -> Result<Vec<CreativeMemoryInsight>, StoreError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare_cached(
            "SELECT org_id, platform, objective, memory_key, sample_size, success_count,
                    total_engagement, avg_engagement, updated_at
             FROM creative_memory WHERE org_id = ?1 AND platform = ?2 AND objective = ?3
             ORDER BY avg_engagement DESC, memory_key ASC",
        )?;
        let insights = stmt
            .query_map(
                params![org_id, platform.as_str(), objective.as_str()],
                Self::row_to_insight,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(insights)
    }

    async fn upsert_creative_insight(&self, insight: &CreativeMemoryInsight) -> Result<(), StoreError> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT OR REPLACE INTO creative_memory
               (org_id, platform, objective, memory_key, sample_size, success_count,
                total_engagement, avg_engagement, updated_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"#,
            params![
                insight.org_id,
                insight.platform.as_str(),
                insight.objective.as_str(),
                insight.memory_key,
                insight.sample_size as i64,
                insight.success_count as i64,
                insight.total_engagement,
                insight.avg_engagement,
                ts(&insight.updated_at),
            ],
        )?;
        Ok(())
    }
}

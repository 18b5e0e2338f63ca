//! CLI interface for draftwise
//!
//! Every subcommand prints a JSON document on stdout; logs go to stderr.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

use crate::config::{self, Config};
use crate::deterministic::build_deterministic_score;
use crate::learning::NewOutcome;
use crate::llm::{LlmProvider, OpenRouterProvider, UnavailableProvider};
use crate::orchestrator::{GenerationEngine, GenerationRequest, PublishRecord};
use crate::signals::{derive_creative_signals, HookType};
use crate::store::{OutcomeEventType, OutcomeMetrics, SqliteStore};
use crate::types::{ContentType, GenerationMode, Language, Objective, Platform, QualityMode};

#[derive(Parser)]
#[command(name = "draftwise")]
#[command(about = "Budget-aware social media drafts with ROI-gated model escalation", long_about = None)]
#[command(version)]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate drafts for one or more platforms
    Generate {
        /// Organization id
        #[arg(long)]
        org: String,
        /// Raw idea to turn into posts
        #[arg(long)]
        idea: String,
        /// Target platforms (comma separated)
        #[arg(short, long, value_delimiter = ',', value_parser = parse_platform, required = true)]
        platform: Vec<Platform>,
        #[arg(long, value_parser = parse_objective, default_value = "engagement")]
        objective: Objective,
        #[arg(long, value_parser = parse_language, default_value = "en")]
        language: Language,
        /// deterministic, economy, auto or premium
        #[arg(short, long, value_parser = parse_quality, default_value = "auto")]
        quality: QualityMode,
        #[arg(long, value_parser = parse_content_type, default_value = "post")]
        content_type: ContentType,
        /// Referenced context (business profile, page text); repeatable
        #[arg(long)]
        context: Vec<String>,
    },
    /// Score a piece of copy
    Score {
        text: String,
        #[arg(short, long, value_parser = parse_platform, default_value = "facebook")]
        platform: Platform,
        #[arg(long, value_parser = parse_content_type, default_value = "post")]
        content_type: ContentType,
    },
    /// Show the hook/framework/CTA signals of a piece of copy
    Signals {
        text: String,
        /// Force the hook type
        #[arg(long)]
        hook: Option<String>,
    },
    /// Suggest creative angles from an org's creative memory
    Angles {
        #[arg(long)]
        org: String,
        #[arg(short, long, value_parser = parse_platform)]
        platform: Platform,
        #[arg(long, value_parser = parse_objective, default_value = "engagement")]
        objective: Objective,
    },
    /// Show budget caps and spend, or test an estimated cost
    Budget {
        #[arg(long)]
        org: String,
        /// Estimated additional cost in USD
        #[arg(long)]
        estimate: Option<Decimal>,
    },
    /// Evaluate the premium ROI gate
    Roi {
        #[arg(long)]
        org: String,
        #[arg(long, value_parser = parse_objective, default_value = "engagement")]
        objective: Objective,
        /// Projected economy score
        #[arg(long)]
        baseline: f64,
        /// Projected premium score
        #[arg(long)]
        premium: f64,
        #[arg(long)]
        economy_cost: f64,
        #[arg(long)]
        premium_cost: f64,
    },
    /// Record the decision behind a published post
    Publish {
        #[arg(long)]
        org: String,
        #[arg(long)]
        post: String,
        #[arg(short, long, value_parser = parse_platform)]
        platform: Platform,
        #[arg(long, value_parser = parse_objective, default_value = "engagement")]
        objective: Objective,
        /// Published text
        #[arg(long)]
        text: String,
        #[arg(long, value_parser = parse_mode, default_value = "deterministic")]
        mode: GenerationMode,
        #[arg(long)]
        model: Option<String>,
        #[arg(long, default_value = "0")]
        variant: usize,
    },
    /// Record measured engagement for a post
    Outcome {
        #[arg(long)]
        org: String,
        #[arg(long)]
        post: String,
        #[arg(long, default_value = "manual")]
        source: String,
        /// publish or snapshot
        #[arg(long, value_parser = parse_event_type, default_value = "snapshot")]
        event_type: OutcomeEventType,
        /// Engagement rate in percent
        #[arg(long)]
        engagement_rate: f64,
        #[arg(long, default_value = "0")]
        impressions: u64,
        #[arg(long, default_value = "0")]
        reach: u64,
        #[arg(long, default_value = "0")]
        reactions: u64,
        #[arg(long, default_value = "0")]
        comments: u64,
        #[arg(long, default_value = "0")]
        shares: u64,
        #[arg(long, default_value = "0")]
        saves: u64,
        #[arg(long, default_value = "0")]
        clicks: u64,
        /// Extra JSON metadata, e.g. '{"lead_value_usd": 40}'
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Show or initialize configuration
    Config {
        /// Write the resolved configuration to the config file
        #[arg(long)]
        init: bool,
        /// Print the config file path
        #[arg(long)]
        path: bool,
    },
}

fn parse_platform(s: &str) -> Result<Platform, String> {
    Platform::parse(s).ok_or_else(|| format!("unknown platform '{}'", s))
}

fn parse_objective(s: &str) -> Result<Objective, String> {
    Objective::parse(s).ok_or_else(|| format!("unknown objective '{}'", s))
}

fn parse_language(s: &str) -> Result<Language, String> {
    Language::parse(s).ok_or_else(|| format!("unsupported language '{}'", s))
}

fn parse_quality(s: &str) -> Result<QualityMode, String> {
    QualityMode::parse(s).ok_or_else(|| format!("unknown quality mode '{}'", s))
}

fn parse_content_type(s: &str) -> Result<ContentType, String> {
    ContentType::parse(s).ok_or_else(|| format!("unknown content type '{}'", s))
}

fn parse_mode(s: &str) -> Result<GenerationMode, String> {
    GenerationMode::parse(s).ok_or_else(|| format!("unknown generation mode '{}'", s))
}

fn parse_event_type(s: &str) -> Result<OutcomeEventType, String> {
    OutcomeEventType::parse(s).ok_or_else(|| format!("unknown event type '{}'", s))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to serialize output")?);
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

async fn build_engine(config: Config) -> Result<GenerationEngine> {
    let db_path = config.database_path()?;
    let store = SqliteStore::open(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let provider: Arc<dyn LlmProvider> = match &config.openrouter.api_key {
        Some(key) => Arc::new(
            OpenRouterProvider::new(
                key.clone(),
                Some(config.openrouter.base_url.clone()),
                Duration::from_secs(config.openrouter.timeout_secs),
            )
            .context("Failed to create OpenRouter client")?,
        ),
        None => {
            tracing::info!("OPENROUTER_API_KEY not set; model calls fall back to deterministic drafts");
            Arc::new(UnavailableProvider)
        }
    };

    Ok(GenerationEngine::new(Arc::new(store), provider, Arc::new(config)))
}

/// Run the CLI
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Score { text, platform, content_type } => {
            print_json(&build_deterministic_score(&text, platform, content_type))?;
        }
        Commands::Signals { text, hook } => {
            let hook = match hook {
                Some(h) => Some(HookType::parse(&h).with_context(|| format!("Unknown hook type '{}'", h))?),
                None => None,
            };
            print_json(&derive_creative_signals(&text, hook))?;
        }
        Commands::Config { init, path } => {
            let config_file = match &cli.config {
                Some(p) => p.clone(),
                None => config::config_path()?,
            };
            if path {
                println!("{}", config_file.display());
            } else if init {
                config.save(&config_file)?;
                print_json(&json!({ "written": config_file }))?;
            } else {
                print_json(&config)?;
            }
        }
        command => {
            let engine = build_engine(config).await?;
            execute(&engine, command).await?;
        }
    }

    Ok(())
}

/// Run a command against the engine, then wait for its background writes.
///
/// The flush also runs when the command fails; a failed generation still
/// carries a billed usage row.
async fn execute(engine: &GenerationEngine, command: Commands) -> Result<()> {
    let result = run_engine_command(engine, command).await;
    engine.telemetry().flush().await;
    result
}

async fn run_engine_command(engine: &GenerationEngine, command: Commands) -> Result<()> {
    match command {
        Commands::Generate { org, idea, platform, objective, language, quality, content_type, context } => {
            let request = GenerationRequest {
                org_id: org,
                idea,
                platforms: platform,
                objective,
                language,
                quality_mode: quality,
                content_type,
                context,
            };
            let response = engine.generate(request).await.map_err(|e| anyhow::anyhow!("{} ({})", e, e.code()))?;
            print_json(&response)?;
        }
        Commands::Angles { org, platform, objective } => {
            print_json(&engine.creative_angles(&org, platform, objective).await)?;
        }
        Commands::Budget { org, estimate } => match estimate {
            Some(estimate) => print_json(&engine.budget().decide(&org, estimate).await)?,
            None => print_json(&engine.budget().status(&org).await)?,
        },
        Commands::Roi { org, objective, baseline, premium, economy_cost, premium_cost } => {
            let decision = engine
                .evaluate_roi(&org, objective, baseline, premium, economy_cost, premium_cost)
                .await;
            print_json(&decision)?;
        }
        Commands::Publish { org, post, platform, objective, text, mode, model, variant } => {
            let record = PublishRecord {
                org_id: org,
                post_id: post,
                platform,
                objective,
                text,
                model,
                mode,
                variant_index: variant,
                roi: None,
            };
            let decision = engine
                .record_publish(record)
                .await
                .context("Failed to record the publish decision")?;
            print_json(&decision)?;
        }
        Commands::Outcome {
            org,
            post,
            source,
            event_type,
            engagement_rate,
            impressions,
            reach,
            reactions,
            comments,
            shares,
            saves,
            clicks,
            metadata,
        } => {
            let metadata = match metadata {
                Some(raw) => serde_json::from_str(&raw).context("Invalid --metadata JSON")?,
                None => serde_json::Value::Null,
            };
            let outcome = NewOutcome {
                org_id: org,
                post_id: post,
                source,
                event_type,
                metrics: OutcomeMetrics {
                    impressions,
                    reach,
                    reactions,
                    comments,
                    shares,
                    saves,
                    clicks,
                    engagement_rate,
                },
                metadata,
            };
            let recorded = engine.record_outcome(outcome).await;
            print_json(&json!({ "recorded": recorded }))?;
        }
        Commands::Score { .. } | Commands::Signals { .. } | Commands::Config { .. } => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_args() {
        let cli = Cli::try_parse_from([
            "draftwise", "generate", "--org", "o1", "--idea", "New menu", "-p", "fb,instagram", "-q", "economy",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate { platform, quality, objective, .. } => {
                assert_eq!(platform, vec![Platform::Facebook, Platform::Instagram]);
                assert_eq!(quality, QualityMode::Economy);
                assert_eq!(objective, Objective::Engagement);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_rejects_unknown_platform() {
        assert!(Cli::try_parse_from(["draftwise", "score", "hi", "-p", "myspace"]).is_err());
    }

    #[tokio::test]
    async fn test_failed_generate_keeps_billed_usage() {
        use crate::llm::{LlmResponse, MockLlmProvider};

        let mut provider = MockLlmProvider::new();
        provider.expect_call().times(2).returning(|req| {
            Ok(LlmResponse {
                text: "not json".to_string(),
                provider: "mock".to_string(),
                model: req.model.clone(),
                input_tokens: 700,
                output_tokens: 200,
                latency_ms: 9,
            })
        });
        let store = SqliteStore::open_in_memory().unwrap();
        let engine = GenerationEngine::new(Arc::new(store.clone()), Arc::new(provider), Arc::new(Config::default()));

        let cli = Cli::try_parse_from([
            "draftwise", "generate", "--org", "o1", "--idea", "Weekend brunch menu", "-p", "facebook", "-q", "economy",
        ])
        .unwrap();
        let err = execute(&engine, cli.command).await.unwrap_err();
        assert!(err.to_string().contains("schema_invalid"));

        let events = store.usage_events("o1").await.unwrap();
        assert_eq!(events.len(), 1);
        assert!(!events[0].success);
        assert_eq!(events[0].error_code.as_deref(), Some("schema_invalid"));
        assert_eq!(events[0].input_tokens, 1400);
        assert!(events[0].cost_usd > Decimal::ZERO);
    }
}

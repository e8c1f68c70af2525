use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use advisor_core::config::Settings;
use advisor_core::domain::assessment::Answer;
use advisor_core::domain::profile::AllocationProfileName;
use advisor_core::engine::table::AllocationTable;
use advisor_core::engine::RecommendationEngine;
use advisor_core::news::provider::HttpNewsProvider;
use advisor_core::news::{SentimentSource, StaticHeadlines};
use advisor_core::question::anthropic::AnthropicQuestionGenerator;
use advisor_core::question::{QuestionFlow, QuestionGenerator};
use advisor_core::risk::RiskScorer;
use advisor_core::storage::memory::InMemoryStore;
use advisor_core::storage::postgres::PgStore;
use advisor_core::storage::PersistenceStore;

#[derive(Debug, Parser)]
#[command(name = "advisor_cli")]
struct Args {
    /// Run without a database or live news provider.
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the next questionnaire prompt.
    Question {
        #[arg(long, default_value_t = 1)]
        index: u32,

        /// Prior answers as JSON: [{"question":"q1","label":"Agree"}, ...]
        #[arg(long)]
        answers_json: Option<String>,
    },

    /// Score answers and store the assessment.
    Assess {
        #[arg(long)]
        user_id: Uuid,

        #[arg(long)]
        answers_json: String,
    },

    /// Generate a recommendation for a profile or for a user's active
    /// assessment.
    Recommend {
        #[arg(long, conflicts_with = "user_id")]
        profile: Option<String>,

        #[arg(long)]
        user_id: Option<Uuid>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Question {
            index,
            answers_json,
        } => {
            let answers = match answers_json {
                Some(raw) => parse_answers(&raw)?,
                None => Vec::new(),
            };
            let flow = QuestionFlow::new(question_generator(&settings, args.offline));
            let question = flow.next_question(index, &answers).await;
            print_json(&question)?;
        }

        Command::Assess {
            user_id,
            answers_json,
        } => {
            let answers = parse_answers(&answers_json)?;
            let store = open_store(&settings, args.offline).await?;
            let scorer = RiskScorer::new(store)?;
            let assessment = scorer
                .assess(user_id, &answers)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            if args.offline {
                tracing::warn!("offline run: assessment not persisted beyond this process");
            }
            print_json(&assessment)?;
        }

        Command::Recommend { profile, user_id } => {
            let profile = match (profile, user_id) {
                (Some(raw), None) => {
                    AllocationProfileName::parse(&raw).map_err(|e| anyhow::anyhow!("{e}"))?
                }
                (None, Some(user_id)) => {
                    let store = open_store(&settings, args.offline).await?;
                    let scorer = RiskScorer::new(store)?;
                    let assessment = scorer
                        .get_active(user_id)
                        .await?
                        .with_context(|| format!("no active assessment for user {user_id}"))?;
                    assessment.profile.allocation_profile()
                }
                _ => anyhow::bail!("pass exactly one of --profile or --user-id"),
            };

            let engine = RecommendationEngine::new(
                AllocationTable::load_default()?,
                sentiment_source(&settings, args.offline),
            );
            let recommendation = engine.recommend(profile).await;
            print_json(&recommendation)?;
        }
    }

    Ok(())
}

fn parse_answers(raw: &str) -> anyhow::Result<Vec<Answer>> {
    serde_json::from_str(raw).context("answers must be a JSON array of {question, label} objects")
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn open_store(
    settings: &Settings,
    offline: bool,
) -> anyhow::Result<Arc<dyn PersistenceStore>> {
    if offline {
        return Ok(Arc::new(InMemoryStore::default()));
    }

    let db_url = settings.require_database_url()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;
    advisor_core::storage::migrate(&pool).await?;
    Ok(Arc::new(PgStore::new(pool)))
}

fn sentiment_source(settings: &Settings, offline: bool) -> Arc<dyn SentimentSource> {
    if offline {
        return Arc::new(StaticHeadlines);
    }
    match HttpNewsProvider::from_settings(settings) {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            tracing::warn!(error = %e, "news provider unconfigured; using static headlines");
            Arc::new(StaticHeadlines)
        }
    }
}

fn question_generator(
    settings: &Settings,
    offline: bool,
) -> Option<Arc<dyn QuestionGenerator>> {
    if offline {
        return None;
    }
    match AnthropicQuestionGenerator::from_settings(settings) {
        Ok(generator) => Some(Arc::new(generator)),
        Err(e) => {
            tracing::warn!(error = %e, "question generator unconfigured; using fallback bank only");
            None
        }
    }
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

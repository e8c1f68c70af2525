use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use advisor_core::domain::assessment::{Answer, RiskAssessment};
use advisor_core::domain::error::AssessmentError;
use advisor_core::domain::profile::AllocationProfileName;
use advisor_core::domain::recommendation::Recommendation;
use advisor_core::engine::table::AllocationTable;
use advisor_core::engine::RecommendationEngine;
use advisor_core::news::provider::HttpNewsProvider;
use advisor_core::news::{SentimentSource, StaticHeadlines};
use advisor_core::question::anthropic::AnthropicQuestionGenerator;
use advisor_core::question::{Question, QuestionFlow, QuestionGenerator};
use advisor_core::risk::RiskScorer;
use advisor_core::storage::postgres::PgStore;
use advisor_core::storage::PersistenceStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = advisor_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match advisor_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let store: Option<Arc<PgStore>> = pool.map(|pool| Arc::new(PgStore::new(pool)));
    let scorer = match &store {
        Some(store) => {
            let store: Arc<dyn PersistenceStore> = store.clone();
            Some(Arc::new(RiskScorer::new(store)?))
        }
        None => None,
    };

    let sentiment_source: Arc<dyn SentimentSource> = match HttpNewsProvider::from_settings(
        &settings,
    ) {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            tracing::warn!(error = %e, "news provider unconfigured; using static headlines");
            Arc::new(StaticHeadlines)
        }
    };
    let engine = Arc::new(RecommendationEngine::new(
        AllocationTable::load_default()?,
        sentiment_source,
    ));

    let generator: Option<Arc<dyn QuestionGenerator>> =
        match AnthropicQuestionGenerator::from_settings(&settings) {
            Ok(generator) => Some(Arc::new(generator)),
            Err(e) => {
                tracing::warn!(error = %e, "question generator unconfigured; using fallback bank only");
                None
            }
        };
    let flow = Arc::new(QuestionFlow::new(generator));

    let state = AppState {
        store,
        scorer,
        engine,
        flow,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/questions/next", post(next_question))
        .route(
            "/users/:user_id/assessment",
            post(submit_assessment).get(get_assessment),
        )
        .route("/users/:user_id/recommendation", get(recommend_for_user))
        .route(
            "/users/:user_id/recommendation/latest",
            get(latest_recommendation),
        )
        .route("/recommendations/:profile", get(recommend_for_profile))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    store: Option<Arc<PgStore>>,
    scorer: Option<Arc<RiskScorer>>,
    engine: Arc<RecommendationEngine>,
    flow: Arc<QuestionFlow>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn reject(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
        }),
    )
}

#[derive(Debug, Deserialize)]
struct NextQuestionRequest {
    index: u32,
    #[serde(default)]
    previous_answers: Vec<Answer>,
}

async fn next_question(
    State(state): State<AppState>,
    Json(req): Json<NextQuestionRequest>,
) -> Json<Question> {
    Json(state.flow.next_question(req.index, &req.previous_answers).await)
}

#[derive(Debug, Deserialize)]
struct AssessmentRequest {
    answers: Vec<Answer>,
}

async fn submit_assessment(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<AssessmentRequest>,
) -> Result<Json<RiskAssessment>, (StatusCode, Json<ErrorBody>)> {
    let Some(scorer) = &state.scorer else {
        return Err(reject(
            StatusCode::SERVICE_UNAVAILABLE,
            "assessment store unavailable",
        ));
    };

    match scorer.assess(user_id, &req.answers).await {
        Ok(assessment) => Ok(Json(assessment)),
        Err(err @ AssessmentError::InsufficientData { .. })
        | Err(err @ AssessmentError::InvalidResponse { .. }) => {
            Err(reject(StatusCode::BAD_REQUEST, err.to_string()))
        }
        Err(AssessmentError::Unavailable(e)) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(%user_id, error = %e, "assessment save failed");
            Err(reject(
                StatusCode::SERVICE_UNAVAILABLE,
                "assessment store unavailable",
            ))
        }
    }
}

async fn get_assessment(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<RiskAssessment>, StatusCode> {
    let Some(scorer) = &state.scorer else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let assessment = scorer
        .get_active(user_id)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(assessment))
}

async fn recommend_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Recommendation>, StatusCode> {
    let Some(scorer) = &state.scorer else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let assessment = scorer
        .get_active(user_id)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    let recommendation = state
        .engine
        .recommend(assessment.profile.allocation_profile())
        .await;

    // Audit record only; a failed write never fails the response.
    if let Some(store) = &state.store {
        if let Err(e) = store.save_recommendation(user_id, &recommendation).await {
            sentry_anyhow::capture_anyhow(&e);
            tracing::warn!(%user_id, error = %e, "failed to store recommendation audit record");
        }
    }

    Ok(Json(recommendation))
}

/// The most recently stored recommendation audit record, without
/// recomputing. Fresh recommendations always come from the sibling route.
async fn latest_recommendation(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Recommendation>, StatusCode> {
    let Some(store) = &state.store else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let recommendation = store
        .latest_recommendation(user_id)
        .await
        .map_err(|e| {
            sentry_anyhow::capture_anyhow(&e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(recommendation))
}

async fn recommend_for_profile(
    State(state): State<AppState>,
    Path(profile): Path<String>,
) -> Result<Json<Recommendation>, (StatusCode, Json<ErrorBody>)> {
    let profile = AllocationProfileName::parse(&profile)
        .map_err(|e| reject(StatusCode::BAD_REQUEST, e.to_string()))?;
    Ok(Json(state.engine.recommend(profile).await))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &advisor_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

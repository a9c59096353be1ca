use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use ledgerchat_core::compiler::QueryCompiler;
use ledgerchat_core::domain::envelope::{ChatRequest, ChatResponse};
use ledgerchat_core::domain::query::QuerySpec;
use ledgerchat_core::orchestrator::Orchestrator;
use ledgerchat_core::source::http::HttpTransactionSource;
use ledgerchat_core::source::DataSourceError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = ledgerchat_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let oracle = ledgerchat_core::llm::build_oracle(&settings.oracle()?)?;
    if oracle.is_none() {
        tracing::warn!("no oracle configured; every query goes through the rule path");
    }
    let compiler = QueryCompiler::new(oracle)?;
    let source = Arc::new(HttpTransactionSource::new(&settings.source()?)?);
    let state = AppState {
        orchestrator: Arc::new(Orchestrator::new(compiler, source)),
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/query", post(compile_query))
        .route("/chat", post(chat))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
            tracing::info_span!(
                "request",
                request_id = %Uuid::new_v4(),
                method = %req.method(),
                uri = %req.uri(),
            )
        }));

    let port = settings.port()?;
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
    orchestrator: Arc<Orchestrator>,
}

async fn compile_query(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Json<QuerySpec> {
    let spec = state
        .orchestrator
        .compiler()
        .compile(&req.message, req.context.as_ref())
        .await;
    Json(spec)
}

async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let today = chrono::Utc::now().date_naive();
    let res = state.orchestrator.handle(&req, today).await?;
    Ok(Json(res))
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %format!("{err:#}"), "chat request failed");

        let not_found = err
            .downcast_ref::<DataSourceError>()
            .is_some_and(DataSourceError::is_not_found);
        if not_found {
            ApiError {
                status: StatusCode::NOT_FOUND,
                message: "I couldn't find that transaction on this account.",
            }
        } else {
            ApiError {
                status: StatusCode::BAD_GATEWAY,
                message: "The transaction service is unavailable right now. Please try again shortly.",
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &ledgerchat_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

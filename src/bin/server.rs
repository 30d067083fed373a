use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use roll_optimizer::{Comparison, Job, OptimizeError, Plan, Solver, Strategy, StrategyInfo, compare, registry};
use serde::Serialize;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

const DEFAULT_STRATEGY: &str = "waste-min";

type ApiError = (StatusCode, String);

fn bad_request(e: OptimizeError) -> ApiError {
    tracing::warn!(error = %e, "rejected request");
    (StatusCode::BAD_REQUEST, e.to_string())
}

async fn strategies() -> Json<Vec<StrategyInfo>> {
    Json(registry())
}

async fn optimize(Json(job): Json<Job>) -> Result<Json<Plan>, ApiError> {
    tracing::info!(
        body = serde_json::to_string(&job).unwrap_or_default(),
        "POST /optimize"
    );
    job.validate().map_err(bad_request)?;

    let id = job.strategy.as_deref().unwrap_or(DEFAULT_STRATEGY);
    let strategy = Strategy::lookup(id, job.settings.as_ref()).map_err(bad_request)?;
    let solver = Solver::new(strategy, job.run.clone());

    let plan = tokio::task::spawn_blocking(move || solver.solve(&job.rolls, &job.requests))
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(bad_request)?;
    Ok(Json(plan))
}

#[derive(Serialize)]
struct CompareResponse {
    plans: Vec<Plan>,
    comparison: Comparison,
}

async fn compare_all(Json(job): Json<Job>) -> Result<Json<CompareResponse>, ApiError> {
    tracing::info!(
        rolls = job.rolls.len(),
        requests = job.requests.len(),
        "POST /compare"
    );
    job.validate().map_err(bad_request)?;

    let (plans, comparison) =
        tokio::task::spawn_blocking(move || compare(&job.rolls, &job.requests, &job.run))
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
            .map_err(bad_request)?;
    Ok(Json(CompareResponse { plans, comparison }))
}

#[tokio::main]
async fn main() {
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open("development.log")
        .expect("failed to open development.log");

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_target(false)
        .with_ansi(false)
        .with_max_level(Level::INFO)
        .init();

    let _sentry = std::env::var("SENTRY_DSN").ok().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");

    let app = Router::new()
        .route("/up", get(|| async { "ok" }))
        .route("/strategies", get(strategies))
        .route("/optimize", post(optimize))
        .route("/compare", post(compare_all))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind listener");
    eprintln!("Listening on {addr}");
    axum::serve(listener, app).await.expect("server error");
}

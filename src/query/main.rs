//! Query server for timezone lookups.
//!
//! Provides an HTTP API resolving a latitude/longitude pair to the IANA
//! timezone whose boundary contains it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tzmapper::{Config, LookupResult, TimezoneService};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "query")]
#[command(about = "Timezone lookup server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// Compiled boundary dataset (overrides the config file)
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Application state shared across handlers
struct AppState {
    service: TimezoneService,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("tzmapper Query Server");

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(dataset) = args.dataset {
        config.dataset.path = Some(dataset);
    }

    let service = tokio::task::spawn_blocking(move || TimezoneService::initialize(&config))
        .await?
        .context("Failed to load timezone boundaries")?;

    info!(
        "Serving {} zones ({} polygons, {} grid cells)",
        service.store().len(),
        service.store().polygon_count(),
        service.index().cell_count()
    );

    let state = Arc::new(AppState { service });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/timezone", get(timezone_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        zones: state.service.store().len(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    zones: usize,
}

/// Coordinate to timezone
async fn timezone_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TimezoneQueryParams>,
) -> Result<Json<LookupResult>, (StatusCode, String)> {
    resolve_params(&state.service, &params).map(Json)
}

fn resolve_params(
    service: &TimezoneService,
    params: &TimezoneQueryParams,
) -> Result<LookupResult, (StatusCode, String)> {
    service
        .resolve(params.lat, params.lon)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}

#[derive(Deserialize)]
struct TimezoneQueryParams {
    lat: f64,
    lon: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(lat: f64, lon: f64) -> TimezoneQueryParams {
        TimezoneQueryParams { lat, lon }
    }

    #[test]
    fn test_resolve_params() {
        let service = TimezoneService::initialize(&Config::default()).unwrap();

        let result = resolve_params(&service, &params(41.8781, -87.6298)).unwrap();
        assert_eq!(
            serde_json::to_value(result).unwrap(),
            serde_json::json!({"zone": "America/Chicago", "candidates": []})
        );

        let result = resolve_params(&service, &params(0.0, -140.0)).unwrap();
        assert_eq!(result, LookupResult::NoMatch);
    }

    #[test]
    fn test_invalid_coordinate_is_bad_request() {
        let service = TimezoneService::initialize(&Config::default()).unwrap();
        let (status, message) = resolve_params(&service, &params(95.0, 0.0)).unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("latitude"));
    }

    #[test]
    fn test_query_params_parse() {
        let params: TimezoneQueryParams =
            serde_json::from_str(r#"{"lat": 48.85, "lon": 2.35}"#).unwrap();
        assert_eq!(params.lat, 48.85);
        assert_eq!(params.lon, 2.35);
    }
}

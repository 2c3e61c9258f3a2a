use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

use leadsignal_analyst::{Analyst, ProofFetcher};
use leadsignal_common::Config;

pub mod error;
pub mod rate_limit;
pub mod rest;

pub struct AppState {
    pub config: Config,
    pub analyst: Analyst,
    pub proof_fetcher: ProofFetcher,
    pub rate_limiter: Mutex<HashMap<IpAddr, Vec<Instant>>>,
}

impl AppState {
    pub fn new(config: Config, analyst: Analyst, proof_fetcher: ProofFetcher) -> Self {
        Self {
            config,
            analyst,
            proof_fetcher,
            rate_limiter: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: Config) -> Self {
        let analyst = Analyst::from_config(&config);
        let proof_fetcher = ProofFetcher::from_config(&config);
        Self::new(config, analyst, proof_fetcher)
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    let api = Router::new()
        .route("/analyze", post(rest::analyze::api_analyze))
        .route("/analyze/batch", post(rest::analyze::api_analyze_batch))
        .route("/fetch-proof", post(rest::proof::api_fetch_proof))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ));

    Router::new()
        .route("/", get(rest::root))
        .route("/health", get(rest::health))
        .nest("/api", api)
        .with_state(state)
        .layer(cors)
        // Verdicts and scraped posts are per-request; never cache them
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        // Method + path + status + latency only (no query params, no IP)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

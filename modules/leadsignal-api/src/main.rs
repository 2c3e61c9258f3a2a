use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use leadsignal_api::{build_router, AppState};
use leadsignal_common::Config;

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("leadsignal=info".parse()?)
        .add_directive("ai_client=info".parse()?)
        .add_directive("apify_client=info".parse()?);

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    init_tracing()?;

    if !config.model_configured() {
        warn!("OPENAI_API_KEY not set; analysis requests will fail");
    }
    if !config.scraper_configured() {
        warn!("APIFY_API_TOKEN or SCRAPER_COOKIES not set; proof fetches will fail");
    }

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!(
        model = config.analysis_model.as_str(),
        freshness = config.enrich_with_freshness,
        origins = config.allowed_origins.len(),
        "Lead Signal API starting on {addr}"
    );

    let state = Arc::new(AppState::from_config(config));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Result};

/// Application configuration loaded once at startup and shared by reference.
/// Credentials are optional here; the orchestrators that need them report a
/// configuration error per request instead of refusing to boot.
#[derive(Debug, Clone)]
pub struct Config {
    // Model API
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub analysis_model: String,
    pub analysis_max_tokens: u32,
    pub analysis_temperature: f32,

    // Scraping
    pub apify_api_token: Option<String>,
    pub apify_post_scraper_actor: String,
    /// Raw JSON list of session cookies. Validated when a proof fetch runs.
    pub scraper_cookies: Option<String>,

    // Feature flags
    pub enrich_with_freshness: bool,

    // Batch
    pub batch_max_concurrency: usize,
    pub batch_delay: Duration,
    pub batch_max_leads: usize,

    // Web server
    pub api_host: String,
    pub api_port: u16,
    pub allowed_origins: Vec<String>,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            analysis_model: "gpt-4o-mini".to_string(),
            analysis_max_tokens: 1000,
            analysis_temperature: 0.1,
            apify_api_token: None,
            apify_post_scraper_actor: "supreme_coder~linkedin-post".to_string(),
            scraper_cookies: None,
            enrich_with_freshness: true,
            batch_max_concurrency: 5,
            batch_delay: Duration::from_millis(1000),
            batch_max_leads: 100,
            api_host: "0.0.0.0".to_string(),
            api_port: 3000,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
            ],
            rate_limit_max_requests: 30,
            rate_limit_window: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Load configuration from the environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Ok(Self {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_base_url: env::var("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            analysis_model: env::var("ANALYSIS_MODEL").unwrap_or(defaults.analysis_model),
            analysis_max_tokens: parse_env("ANALYSIS_MAX_TOKENS", defaults.analysis_max_tokens)?,
            analysis_temperature: defaults.analysis_temperature,
            apify_api_token: optional_env("APIFY_API_TOKEN"),
            apify_post_scraper_actor: env::var("APIFY_POST_SCRAPER_ACTOR")
                .unwrap_or(defaults.apify_post_scraper_actor),
            scraper_cookies: optional_env("SCRAPER_COOKIES"),
            enrich_with_freshness: parse_bool_env(
                "ENRICH_WITH_FRESHNESS",
                defaults.enrich_with_freshness,
            )?,
            batch_max_concurrency: parse_env("BATCH_MAX_CONCURRENCY", defaults.batch_max_concurrency)?
                .max(1),
            batch_delay: Duration::from_millis(parse_env(
                "BATCH_DELAY_MS",
                defaults.batch_delay.as_millis() as u64,
            )?),
            batch_max_leads: parse_env("BATCH_MAX_LEADS", defaults.batch_max_leads)?,
            api_host: env::var("API_HOST").unwrap_or(defaults.api_host),
            api_port: parse_env("API_PORT", defaults.api_port)?,
            allowed_origins: optional_env("ALLOWED_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or(defaults.allowed_origins),
            rate_limit_max_requests: parse_env(
                "RATE_LIMIT_MAX_REQUESTS",
                defaults.rate_limit_max_requests,
            )?,
            rate_limit_window: Duration::from_secs(parse_env(
                "RATE_LIMIT_WINDOW_SECS",
                defaults.rate_limit_window.as_secs(),
            )?),
        })
    }

    pub fn model_configured(&self) -> bool {
        self.openai_api_key.is_some()
    }

    pub fn scraper_configured(&self) -> bool {
        self.apify_api_token.is_some() && self.scraper_cookies.is_some()
    }
}

/// Unset and blank values are both treated as absent.
fn optional_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("{key} must be a number, got {raw:?}: {e}")),
        None => Ok(default),
    }
}

fn parse_bool_env(key: &str, default: bool) -> Result<bool> {
    match optional_env(key) {
        Some(raw) => parse_bool(&raw).ok_or_else(|| anyhow!("{key} must be a boolean, got {raw:?}")),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Comma-separated origin list. Trailing slashes are dropped so
/// `https://app.example.com/` matches the browser's `Origin` header.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_have_no_credentials() {
        let config = Config::default();
        assert!(!config.model_configured());
        assert!(!config.scraper_configured());
        assert!(config.enrich_with_freshness);
        assert_eq!(config.analysis_max_tokens, 1000);
    }

    #[test]
    fn scraper_needs_token_and_cookies() {
        let config = Config {
            apify_api_token: Some("apify_api_x".to_string()),
            ..Config::default()
        };
        assert!(!config.scraper_configured());

        let config = Config {
            scraper_cookies: Some("[]".to_string()),
            ..config
        };
        assert!(config.scraper_configured());
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn parse_origins_trims_and_drops_empty() {
        let origins = parse_origins(" https://a.example.com/ ,, http://localhost:5173");
        assert_eq!(origins, vec!["https://a.example.com", "http://localhost:5173"]);
    }
}

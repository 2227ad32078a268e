use std::env;
use std::path::PathBuf;
use std::time::Duration;

use wayfinder_geo::{DEFAULT_NOMINATIM_URL, DEFAULT_USER_AGENT, MAX_GEOCODE_CONCURRENCY};

use crate::generator::{DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_URL};

pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;
pub const GEOCODE_TIMEOUT_SECONDS: u64 = 10;
pub const CONNECT_TIMEOUT_SECONDS: u64 = 6;

/// Settings for the external services behind the planning pipeline.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_url: String,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocode_concurrency: usize,
    pub gazetteer_path: Option<PathBuf>,
    pub http_timeout: Duration,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_url: DEFAULT_GEMINI_URL.to_string(),
            geocoder_url: DEFAULT_NOMINATIM_URL.to_string(),
            geocoder_user_agent: DEFAULT_USER_AGENT.to_string(),
            geocode_concurrency: 1,
            gazetteer_path: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS),
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            gemini_api_key: non_empty_var("WAYFINDER_GEMINI_API_KEY"),
            gemini_model: non_empty_var("WAYFINDER_GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_url: non_empty_var("WAYFINDER_GEMINI_URL").unwrap_or(defaults.gemini_url),
            geocoder_url: non_empty_var("WAYFINDER_GEOCODER_URL")
                .unwrap_or(defaults.geocoder_url),
            geocoder_user_agent: non_empty_var("WAYFINDER_GEOCODER_USER_AGENT")
                .unwrap_or(defaults.geocoder_user_agent),
            geocode_concurrency: env::var("WAYFINDER_GEOCODE_CONCURRENCY")
                .ok()
                .and_then(|value| value.trim().parse::<usize>().ok())
                .map(|value| value.clamp(1, MAX_GEOCODE_CONCURRENCY))
                .unwrap_or(defaults.geocode_concurrency),
            gazetteer_path: non_empty_var("WAYFINDER_GAZETTEER").map(PathBuf::from),
            http_timeout: env::var("WAYFINDER_HTTP_TIMEOUT_SECONDS")
                .ok()
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|value| *value > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
        }
    }

    pub fn geocode_timeout(&self) -> Duration {
        self.http_timeout
            .min(Duration::from_secs(GEOCODE_TIMEOUT_SECONDS))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_public_services() {
        let config = PlannerConfig::default();
        assert_eq!(config.gemini_model, "gemini-pro");
        assert_eq!(config.geocoder_url, "https://nominatim.openstreetmap.org");
        assert_eq!(config.geocode_concurrency, 1);
        assert!(config.gemini_api_key.is_none());
    }

    #[test]
    fn geocode_timeout_never_exceeds_http_timeout() {
        let mut config = PlannerConfig::default();
        assert_eq!(config.geocode_timeout(), Duration::from_secs(10));

        config.http_timeout = Duration::from_secs(3);
        assert_eq!(config.geocode_timeout(), Duration::from_secs(3));
    }
}

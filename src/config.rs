//! Client configuration loaded from environment variables.
//!
//! The Supabase project URL and anon key may come from any of the prefixes
//! used by the mobile and web front-ends, so one `.env` serves all of them.

use std::env;
use std::time::Duration;

const URL_VARS: [&str; 3] = [
    "SUPABASE_URL",
    "EXPO_PUBLIC_SUPABASE_URL",
    "VITE_SUPABASE_URL",
];
const ANON_KEY_VARS: [&str; 3] = [
    "SUPABASE_ANON_KEY",
    "EXPO_PUBLIC_SUPABASE_ANON_KEY",
    "VITE_SUPABASE_ANON_KEY",
];

const DEFAULT_IMAGES_BUCKET: &str = "event-images";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Supabase project URL (e.g. `https://xyz.supabase.co`)
    pub supabase_url: String,
    /// Public anon key, sent as `apikey` on every request
    pub supabase_anon_key: String,
    /// Storage bucket for event images
    pub event_images_bucket: String,
    /// Per-request timeout
    pub http_timeout: Duration,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            supabase_url: "http://127.0.0.1:54321".to_string(),
            supabase_anon_key: "test_anon_key".to_string(),
            event_images_bucket: DEFAULT_IMAGES_BUCKET.to_string(),
            http_timeout: Duration::from_secs(5),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let supabase_url = first_var(&URL_VARS).ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        let supabase_anon_key =
            first_var(&ANON_KEY_VARS).ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;

        Ok(Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key: supabase_anon_key.trim().to_string(),
            event_images_bucket: env::var("EVENT_IMAGES_BUCKET")
                .unwrap_or_else(|_| DEFAULT_IMAGES_BUCKET.to_string()),
            http_timeout: Duration::from_secs(
                env::var("HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
            ),
        })
    }
}

/// Return the first non-empty variable among `names`.
fn first_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .find(|v| !v.trim().is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so env mutation is not racing other tests in this module.
    #[test]
    fn test_config_from_env() {
        for name in URL_VARS.iter().chain(ANON_KEY_VARS.iter()) {
            env::remove_var(name);
        }
        assert!(matches!(
            Config::from_env(),
            Err(ConfigError::Missing("SUPABASE_URL"))
        ));

        env::set_var("VITE_SUPABASE_URL", "https://vite.supabase.co");
        env::set_var("EXPO_PUBLIC_SUPABASE_URL", "https://expo.supabase.co/");
        env::set_var("EXPO_PUBLIC_SUPABASE_ANON_KEY", "anon");

        let config = Config::from_env().expect("Config should load");

        // EXPO_PUBLIC_ wins over VITE_, trailing slash trimmed
        assert_eq!(config.supabase_url, "https://expo.supabase.co");
        assert_eq!(config.supabase_anon_key, "anon");
        assert_eq!(config.event_images_bucket, "event-images");
    }
}

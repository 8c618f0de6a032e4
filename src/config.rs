//! Runtime configuration from environment variables.
//!
//! - `HALFLIFE_PORT` - HTTP port for `serve` (default `17010`)
//! - `HALFLIFE_DB` - database file (default: platform data directory)
//! - `HALFLIFE_URL` - API base URL used by client commands
//!   (default `http://localhost:<port>/api/v1`)
//! - `HALFLIFE_USER` - whose dose log client commands work on (default `default`)
//! - `HALFLIFE_API_KEY` - bearer token; required by the server when set, and
//!   sent by the client
//! - `HALFLIFE_CORS_ORIGINS` - comma-separated allowed origins (default: any)

use std::path::PathBuf;

use crate::api::SecurityConfig;

pub const DEFAULT_PORT: u16 = 17010;
pub const DEFAULT_USER: &str = "default";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub db_path: Option<PathBuf>,
    pub base_url: String,
    pub user_id: String,
    pub api_key: Option<String>,
    pub cors_origins: Option<Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("HALFLIFE_PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("Ignoring invalid HALFLIFE_PORT {:?}", raw);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let base_url = get("HALFLIFE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{}/api/v1", port));

        let cors_origins = get("HALFLIFE_CORS_ORIGINS").map(|s| {
            s.split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect()
        });

        Self {
            port,
            db_path: get("HALFLIFE_DB").map(PathBuf::from),
            base_url,
            user_id: get("HALFLIFE_USER").unwrap_or_else(|| DEFAULT_USER.to_string()),
            api_key: get("HALFLIFE_API_KEY"),
            cors_origins,
        }
    }

    pub fn security(&self) -> SecurityConfig {
        SecurityConfig {
            api_key: self.api_key.clone(),
            cors_origins: self.cors_origins.clone(),
        }
    }
}

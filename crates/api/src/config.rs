//! Service configuration.

use std::env;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5005;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime settings for the API binary.
///
/// Everything comes from the environment with a usable default, so the
/// binary boots with no configuration at all:
///
/// | Variable   | Default   | Meaning                  |
/// |------------|-----------|--------------------------|
/// | `HOST`     | `0.0.0.0` | bind address             |
/// | `PORT`     | `5005`    | listen port              |
/// | `RUST_LOG` | `info`    | tracing filter directive |
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

impl Config {
    /// Reads the environment. Missing variables fall back to defaults,
    /// and so does an unparseable `PORT`: a bad value must not keep the
    /// service from coming up.
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        Self {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port,
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    /// The `host:port` pair to bind.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use tracing::warn;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::with_security_headers;

const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ISSUE_MAX_RETRIES: usize = 3;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. The in-memory store is used when unset.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub bind_addr: SocketAddr,
    /// Retries for issuance write conflicts before giving up.
    pub issue_max_retries: usize,
    pub cors_allowed_origins: Vec<String>,
    /// Enables HSTS.
    pub production: bool,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        let production = lookup("RUST_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let default_bind = SocketAddr::from(([0, 0, 0, 0], 8000));

        Self {
            database_url,
            db_max_connections: parse_or(
                &lookup,
                "DB_MAX_CONNECTIONS",
                DEFAULT_DB_MAX_CONNECTIONS,
            ),
            bind_addr: parse_or(&lookup, "BIND_ADDR", default_bind),
            issue_max_retries: parse_or(&lookup, "ISSUE_MAX_RETRIES", DEFAULT_ISSUE_MAX_RETRIES),
            cors_allowed_origins,
            production,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Config: invalid {} '{}', using default {}", key, raw, default);
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert!(config.database_url.is_none());
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8000");
        assert_eq!(config.issue_max_retries, 3);
        assert_eq!(config.cors_allowed_origins.len(), 2);
        assert!(!config.production);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/queue"),
            ("DB_MAX_CONNECTIONS", "12"),
            ("BIND_ADDR", "127.0.0.1:9090"),
            ("ISSUE_MAX_RETRIES", "0"),
            ("CORS_ALLOWED_ORIGINS", " https://a.example , ,https://b.example"),
            ("RUST_ENV", "Production"),
        ]);

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/queue")
        );
        assert_eq!(config.db_max_connections, 12);
        assert_eq!(config.bind_addr.port(), 9090);
        assert_eq!(config.issue_max_retries, 0);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(config.production);
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("DATABASE_URL", "   "),
            ("DB_MAX_CONNECTIONS", "many"),
            ("BIND_ADDR", "nowhere"),
        ]);

        assert!(config.database_url.is_none());
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8000");
    }
}

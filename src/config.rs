use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `memory` for the in-process store, otherwise a SQLite URL.
    pub url: String,
    /// Largest id set or `in` list one store call accepts.
    pub max_in_values: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("AUTH_JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("AUTH_JWT_SECRET must be set"))?;

        Ok(Self {
            database: DatabaseConfig {
                url: lookup("DATABASE_URL")
                    .unwrap_or_else(|| "sqlite:data/social_graph.db".to_string()),
                max_in_values: lookup("STORE_MAX_IN_VALUES")
                    .and_then(|v| v.parse().ok())
                    .filter(|v: &usize| *v > 0)
                    .unwrap_or(10),
            },
            server: ServerConfig {
                host: lookup("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: lookup("SERVER_PORT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(3000),
            },
            auth: AuthConfig {
                jwt_secret,
                issuer: lookup("AUTH_JWT_ISSUER").filter(|s| !s.is_empty()),
                audience: lookup("AUTH_JWT_AUDIENCE").filter(|s| !s.is_empty()),
            },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("AUTH_JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.database.url, "sqlite:data/social_graph.db");
        assert_eq!(config.database.max_in_values, 10);
        assert_eq!(config.server_address(), "0.0.0.0:3000");
        assert_eq!(config.auth.issuer, None);
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let config = config(&[
            ("AUTH_JWT_SECRET", "s3cret"),
            ("DATABASE_URL", "memory"),
            ("SERVER_PORT", "not-a-port"),
            ("STORE_MAX_IN_VALUES", "0"),
            ("AUTH_JWT_ISSUER", "https://issuer.example"),
        ])
        .unwrap();
        assert_eq!(config.database.url, "memory");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_in_values, 10);
        assert_eq!(config.auth.issuer.as_deref(), Some("https://issuer.example"));
    }

    #[test]
    fn test_secret_required() {
        assert!(config(&[]).is_err());
        assert!(config(&[("AUTH_JWT_SECRET", "")]).is_err());
    }
}

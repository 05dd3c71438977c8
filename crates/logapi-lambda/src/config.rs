use std::env;
use std::str::FromStr;

use logapi_store::PoolSettings;

/// Runtime configuration, read once from the environment at cold start.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub stage: String,
    /// Skips Secrets Manager and uses this URL for both database modes.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub cors_origin: String,
    pub cors_credentials: bool,
    pub audit_self: bool,
    pub bootstrap_schema: bool,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> eyre::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            stage: var("STAGE").unwrap_or_else(|| "dev".to_string()),
            database_url: var("LOGAPI_DATABASE_URL"),
            max_connections: parsed(&var, "LOGAPI_DB_MAX_CONNECTIONS", 5)?,
            cors_origin: var("LOGAPI_CORS_ORIGIN").unwrap_or_else(|| "*".to_string()),
            cors_credentials: flag(&var, "LOGAPI_CORS_CREDENTIALS")?,
            audit_self: flag(&var, "LOGAPI_AUDIT_SELF")?,
            bootstrap_schema: flag(&var, "LOGAPI_BOOTSTRAP_SCHEMA")?,
        })
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            ..PoolSettings::default()
        }
    }
}

fn parsed<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> eyre::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| eyre::eyre!("invalid {key}={raw:?}: {e}")),
        None => Ok(default),
    }
}

fn flag(var: &impl Fn(&str) -> Option<String>, key: &str) -> eyre::Result<bool> {
    match var(key).map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("0" | "false" | "no") => Ok(false),
        Some("1" | "true" | "yes") => Ok(true),
        Some(other) => Err(eyre::eyre!("invalid {key}={other:?}: expected a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> eyre::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.stage, "dev");
        assert_eq!(config.database_url, None);
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.cors_origin, "*");
        assert!(!config.cors_credentials);
        assert!(!config.audit_self);
        assert!(!config.bootstrap_schema);
    }

    #[test]
    fn reads_overrides() {
        let config = config(&[
            ("STAGE", "prod"),
            ("LOGAPI_DATABASE_URL", "sqlite::memory:"),
            ("LOGAPI_DB_MAX_CONNECTIONS", "2"),
            ("LOGAPI_CORS_CREDENTIALS", "TRUE"),
            ("LOGAPI_AUDIT_SELF", "1"),
        ])
        .unwrap();
        assert_eq!(config.stage, "prod");
        assert_eq!(config.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.pool_settings().max_connections, 2);
        assert!(config.cors_credentials);
        assert!(config.audit_self);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config(&[("STAGE", "  "), ("LOGAPI_DATABASE_URL", "")]).unwrap();
        assert_eq!(config.stage, "dev");
        assert_eq!(config.database_url, None);
    }

    #[test]
    fn rejects_garbage() {
        assert!(config(&[("LOGAPI_DB_MAX_CONNECTIONS", "many")]).is_err());
        assert!(config(&[("LOGAPI_AUDIT_SELF", "sometimes")]).is_err());
    }
}

use std::env;

use thiserror::Error;

pub const DEFAULT_DATABASE: &str = "OpenSplit";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("You need to add {0} to the env")]
    Missing(&'static str),

    #[error("SPLITLEDGER_PORT must be a port number, got {0:?}")]
    InvalidPort(String),

    #[error("SPLITLEDGER_STORE must be \"mongo\" or \"memory\", got {0:?}")]
    InvalidStore(String),
}

#[derive(Clone, Debug, PartialEq)]
pub enum StoreBackend {
    Mongo { uri: String, database: String },
    Memory,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_token: String,
    pub store: StoreBackend,
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenv::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = lookup("SPLITLEDGER_API_TOKEN")
            .filter(|token| !token.is_empty())
            .ok_or(ConfigError::Missing("SPLITLEDGER_API_TOKEN"))?;

        let port = match lookup("SPLITLEDGER_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let store = match lookup("SPLITLEDGER_STORE").as_deref() {
            None | Some("mongo") => StoreBackend::Mongo {
                uri: lookup("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?,
                database: lookup("SPLITLEDGER_DATABASE")
                    .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            },
            Some("memory") => StoreBackend::Memory,
            Some(other) => return Err(ConfigError::InvalidStore(other.to_string())),
        };

        Ok(Config {
            host: lookup("SPLITLEDGER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            api_token,
            store,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_mongo_with_standard_database() {
        let config = config_from(&[
            ("SPLITLEDGER_API_TOKEN", "secret"),
            ("MONGODB_URI", "mongodb://localhost:27017"),
        ])
        .unwrap();

        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(
            config.store,
            StoreBackend::Mongo {
                uri: "mongodb://localhost:27017".to_string(),
                database: DEFAULT_DATABASE.to_string(),
            }
        );
    }

    #[test]
    fn memory_store_needs_no_uri() {
        let config = config_from(&[
            ("SPLITLEDGER_API_TOKEN", "secret"),
            ("SPLITLEDGER_STORE", "memory"),
            ("SPLITLEDGER_PORT", "9090"),
        ])
        .unwrap();
        assert_eq!(config.store, StoreBackend::Memory);
        assert_eq!(config.port, 9090);
    }

    #[test]
    fn reports_missing_and_invalid_values() {
        assert_eq!(
            config_from(&[("MONGODB_URI", "mongodb://db")]),
            Err(ConfigError::Missing("SPLITLEDGER_API_TOKEN"))
        );
        assert_eq!(
            config_from(&[("SPLITLEDGER_API_TOKEN", "secret")]),
            Err(ConfigError::Missing("MONGODB_URI"))
        );
        assert_eq!(
            config_from(&[
                ("SPLITLEDGER_API_TOKEN", "secret"),
                ("SPLITLEDGER_STORE", "memory"),
                ("SPLITLEDGER_PORT", "eighty"),
            ]),
            Err(ConfigError::InvalidPort("eighty".to_string()))
        );
        assert_eq!(
            config_from(&[
                ("SPLITLEDGER_API_TOKEN", "secret"),
                ("SPLITLEDGER_STORE", "sqlite"),
            ]),
            Err(ConfigError::InvalidStore("sqlite".to_string()))
        );
    }
}

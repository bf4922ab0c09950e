use std::env;
use std::net::SocketAddr;

use derive_more::{Display, Error};
use dotenv::dotenv;
use log::warn;

#[derive(Debug, Display, Error)]
pub enum ConfigError {
    #[display(fmt = "missing environment variable {}", name)]
    MissingVar { name: String },

    #[display(fmt = "invalid value for environment variable {}: {}", name, reason)]
    InvalidValue { name: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    /// `None` runs the service on in-memory stores.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    /// Prefix for links placed into invitation emails.
    pub public_base_url: String,
    pub enforce_voter_eligibility: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();

        let bind_address = parse_var("BIND_ADDRESS", "127.0.0.1:8080")?;
        let database_url = env::var("DATABASE_URL").ok();
        if database_url.is_none() {
            warn!("DATABASE_URL is not set, falling back to in-memory stores");
        }
        let db_max_connections = parse_var("DB_MAX_CONNECTIONS", "5")?;
        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar {
            name: "JWT_SECRET".to_string(),
        })?;
        let public_base_url = env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080".to_string())
            .trim_end_matches('/')
            .to_string();
        let enforce_voter_eligibility = parse_var("ENFORCE_VOTER_ELIGIBILITY", "false")?;

        Ok(Self {
            bind_address,
            database_url,
            db_max_connections,
            jwt_secret,
            public_base_url,
            enforce_voter_eligibility,
        })
    }

    /// Configuration used by unit tests; never reads the environment.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            bind_address: "127.0.0.1:0".parse().expect("static address"),
            database_url: None,
            db_max_connections: 1,
            jwt_secret: "test-secret".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            enforce_voter_eligibility: false,
        }
    }
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: format!("'{}': {}", raw, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_to_default() {
        let port: u32 = parse_var("ACTS_OF_SHARING_UNSET_VAR", "42").unwrap();
        assert_eq!(port, 42);
    }

    #[test]
    fn parse_var_reports_invalid_value() {
        let res: Result<bool, _> = parse_var("ACTS_OF_SHARING_UNSET_VAR", "maybe");
        match res {
            Err(ConfigError::InvalidValue { name, .. }) => {
                assert_eq!(name, "ACTS_OF_SHARING_UNSET_VAR")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

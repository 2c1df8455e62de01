//! Join planner configuration

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backends::SqlDialect;
use crate::error::ModelError;

pub const ENV_ALLOW_CARTESIAN: &str = "ELIF_JOIN_ALLOW_CARTESIAN";
pub const ENV_LOG_SQL: &str = "ELIF_JOIN_LOG_SQL";
pub const ENV_DIALECT: &str = "ELIF_JOIN_DIALECT";

/// Configuration for building join clauses from a query graph
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Accept disconnected graphs and join their components with CROSS JOIN
    pub allow_cartesian: bool,
    /// Log every generated join clause at debug level
    pub log_sql: bool,
    /// Dialect used when the graph renders its own clause
    pub dialect: SqlDialect,
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allow_cartesian(mut self, allow: bool) -> Self {
        self.allow_cartesian = allow;
        self
    }

    pub fn with_log_sql(mut self, log_sql: bool) -> Self {
        self.log_sql = log_sql;
        self
    }

    pub fn with_dialect(mut self, dialect: SqlDialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let allow_cartesian = match lookup(ENV_ALLOW_CARTESIAN) {
            Some(value) => parse_bool(ENV_ALLOW_CARTESIAN, &value)?,
            None => defaults.allow_cartesian,
        };
        let log_sql = match lookup(ENV_LOG_SQL) {
            Some(value) => parse_bool(ENV_LOG_SQL, &value)?,
            None => defaults.log_sql,
        };
        let dialect = match lookup(ENV_DIALECT) {
            Some(value) => SqlDialect::from_str(&value).map_err(|_| ConfigError::InvalidValue {
                field: ENV_DIALECT.to_string(),
                value,
                expected: "ansi, postgresql, mysql, or sqlite".to_string(),
            })?,
            None => defaults.dialect,
        };

        Ok(Self {
            allow_cartesian,
            log_sql,
            dialect,
        })
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            expected: "true or false".to_string(),
        }),
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
}

impl From<ConfigError> for ModelError {
    fn from(err: ConfigError) -> Self {
        ModelError::Configuration(err.to_string())
    }
}

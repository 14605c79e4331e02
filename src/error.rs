use thiserror::Error;

use crate::ProfileField;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("{field} out of domain: {value} (expected {min}..={max})")]
    OutOfDomain {
        field: ProfileField,
        value: i64,
        min: i64,
        max: i64,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write config: {0}")]
    Write(#[source] std::io::Error),
    #[error("invalid noise std_dev: {0}")]
    InvalidNoise(f64),
}

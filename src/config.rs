use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::scoring::{GaussianNoise, ScoreWeights, SpendingScorer};
use crate::{ConfigError, DEFAULT_NOISE_STD_DEV};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub std_dev: f64,
    pub seed: Option<u64>,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            std_dev: DEFAULT_NOISE_STD_DEV,
            seed: None,
        }
    }
}

impl NoiseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.std_dev.is_nan() || self.std_dev < 0.0 {
            return Err(ConfigError::InvalidNoise(self.std_dev));
        }
        Ok(())
    }

    /// A seed makes the noise sequence reproducible across runs.
    pub fn build_noise(&self) -> GaussianNoise {
        match self.seed {
            Some(seed) => GaussianNoise::seeded(seed, self.std_dev),
            None => GaussianNoise::from_entropy(self.std_dev),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Pause before a dashboard prediction is answered.
    pub analysis_delay_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            analysis_delay_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub weights: ScoreWeights,
    pub noise: NoiseConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => AppConfig::default(),
        };

        config.apply_env_overrides();
        config.noise.validate()?;
        tracing::info!(
            path = ?config_path,
            noise_std_dev = config.noise.std_dev,
            seeded = config.noise.seed.is_some(),
            "configuration loaded"
        );
        Ok((config, config_path))
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Read)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(ConfigError::Write)?;
            }
        }
        let payload = toml::to_string_pretty(self)?;
        std::fs::write(path, payload).map_err(ConfigError::Write)?;
        Ok(())
    }

    pub fn scorer(&self) -> SpendingScorer {
        SpendingScorer::new(self.weights.clone())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = env_override("NOISE_STD_DEV") {
            self.noise.std_dev = value;
        }
        if let Some(value) = env_override("NOISE_SEED") {
            self.noise.seed = Some(value);
        }
        if let Ok(host) = env::var("SERVER_HOST") {
            if !host.trim().is_empty() {
                self.server.host = host;
            }
        }
        if let Some(value) = env_override("SERVER_PORT") {
            self.server.port = value;
        }
        if let Some(value) = env_override("ANALYSIS_DELAY_MS") {
            self.server.analysis_delay_ms = value;
        }
    }
}

fn env_override<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    parse_override(name, &raw)
}

/// Unparsable values keep the configured setting and log a warning.
fn parse_override<T: FromStr>(name: &str, raw: &str) -> Option<T> {
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = raw, "ignoring unparsable env override");
            None
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    env::var("SPENDING_SCORE_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/spending_score.toml")))
}

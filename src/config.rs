//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every source has its own section; a source that is missing from the
//! file is treated as disabled.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::{ArbwatchError, SourceId};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub engine: EngineConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub name: String,
    pub reconcile_interval_secs: u64,
    /// Stake used for arbitrage profit figures.
    pub stake: Decimal,
    /// Snapshots older than this are treated as unavailable.
    pub max_snapshot_age_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SourcesConfig {
    pub winbet: Option<SourceConfig>,
    pub betano: Option<SourceConfig>,
    pub efbet: Option<SourceConfig>,
    pub orbitx: Option<SourceConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    pub enabled: bool,
    /// Snapshot file the scraper keeps replacing.
    pub path: PathBuf,
    pub poll_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
    /// If set, every cycle's board is also written here as JSON.
    #[serde(default)]
    pub board_file: Option<PathBuf>,
}

impl SourcesConfig {
    pub fn get(&self, source: SourceId) -> Option<&SourceConfig> {
        match source {
            SourceId::WinBet => self.winbet.as_ref(),
            SourceId::Betano => self.betano.as_ref(),
            SourceId::Efbet => self.efbet.as_ref(),
            SourceId::OrbitX => self.orbitx.as_ref(),
        }
    }

    /// Enabled sources in priority order.
    pub fn enabled(&self) -> Vec<(SourceId, &SourceConfig)> {
        SourceId::ALL
            .iter()
            .filter_map(|s| self.get(*s).filter(|c| c.enabled).map(|c| (*s, c)))
            .collect()
    }
}

impl SourceConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl EngineConfig {
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    pub fn max_snapshot_age(&self) -> Duration {
        Duration::from_secs(self.max_snapshot_age_secs)
    }
}

impl AppConfig {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Failed to load config file: {path}"))?;
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents).context("Invalid TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ArbwatchError> {
        if self.engine.stake <= Decimal::ZERO {
            return Err(ArbwatchError::Config(format!(
                "engine.stake must be positive, got {}",
                self.engine.stake
            )));
        }
        if self.engine.reconcile_interval_secs == 0 {
            return Err(ArbwatchError::Config(
                "engine.reconcile_interval_secs must be at least 1".into(),
            ));
        }
        if self.engine.max_snapshot_age_secs == 0 {
            return Err(ArbwatchError::Config(
                "engine.max_snapshot_age_secs must be at least 1".into(),
            ));
        }
        for (source, cfg) in self.sources.enabled() {
            if cfg.poll_interval_secs == 0 {
                return Err(ArbwatchError::Config(format!(
                    "sources.{}.poll_interval_secs must be at least 1",
                    source.key()
                )));
            }
        }
        Ok(())
    }
}

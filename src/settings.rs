//! Per-game session settings, read from the `game.json` file of a game folder.
//!
//! Every field is optional in the file; missing ones take the [`Default`] value.
//!
//! ```json
//! {
//!     "initial_balance": 1000,
//!     "initial_bet": 10,
//!     "seed": 12345,
//!     "latency": { "min_ms": 300, "max_ms": 800 },
//!     "bet_step": 10,
//!     "refund_on_provider_failure": true
//! }
//! ```

use std::{fs, path::Path, time::Duration};

use log::info;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};

use crate::{
    error::{EngineError, Result},
    Credits,
};

/// Name of the settings file inside a game folder.
pub const SETTINGS_FILE: &str = "game.json";

/// Bounds of the simulated provider latency.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatencySettings {
    /// Shortest delay before an outcome.
    #[serde(rename = "min_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub min: Duration,
    /// Longest delay before an outcome.
    #[serde(rename = "max_ms")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub max: Duration,
}

impl Default for LatencySettings {
    fn default() -> Self {
        Self {
            min: Duration::from_millis(300),
            max: Duration::from_millis(800),
        }
    }
}

/// Starting conditions and policies of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameSettings {
    /// Starting balance of each session.
    pub initial_balance: Credits,
    /// Starting bet of each session.
    pub initial_bet: Credits,
    /// Seed of the reel shuffle and spin draws. Entropy when absent.
    pub seed: Option<u64>,
    /// Delay range of the simulated server.
    pub latency: LatencySettings,
    /// Granularity used when a bet has to be lowered to fit the balance.
    pub bet_step: Credits,
    /// Give the bet back when the provider fails after the debit.
    pub refund_on_provider_failure: bool,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            initial_balance: 1000,
            initial_bet: 10,
            seed: None,
            latency: LatencySettings::default(),
            bet_step: 10,
            refund_on_provider_failure: true,
        }
    }
}

impl GameSettings {
    /// Parses and validates settings from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: GameSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::from_json(&fs::read_to_string(path)?)
    }

    /// Checks the values against each other.
    pub fn validate(&self) -> Result<()> {
        if self.initial_balance < 0 {
            return Err(EngineError::Config(
                "initial_balance cannot be negative".to_string(),
            ));
        }
        if self.initial_bet <= 0 {
            return Err(EngineError::Config(
                "initial_bet must be greater than 0".to_string(),
            ));
        }
        if self.initial_bet > self.initial_balance {
            return Err(EngineError::Config(format!(
                "initial_bet {} exceeds initial_balance {}",
                self.initial_bet, self.initial_balance
            )));
        }
        if self.bet_step <= 0 {
            return Err(EngineError::Config(
                "bet_step must be greater than 0".to_string(),
            ));
        }
        if self.latency.max < self.latency.min {
            return Err(EngineError::Config(format!(
                "latency max_ms {} is below min_ms {}",
                self.latency.max.as_millis(),
                self.latency.min.as_millis()
            )));
        }

        Ok(())
    }
}

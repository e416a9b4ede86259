// File: lisabot-core/src/config.rs

use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Tunables for the decision pipeline and the refresh task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Activity counter value at startup.
    #[serde(default = "default_baseline_activity")]
    pub baseline_activity: i64,

    /// Added to the counter whenever the bot is mentioned.
    #[serde(default = "default_boost")]
    pub mention_boost: i64,

    /// Added to the counter on every refresh cycle.
    #[serde(default = "default_boost")]
    pub retrain_boost: i64,

    /// Unsolicited classification fires on a 1-in-`activation_odds` draw.
    #[serde(default = "default_activation_odds")]
    pub activation_odds: u32,

    /// Labels are emitted when their probability is strictly above this.
    #[serde(default = "default_emoji_threshold")]
    pub emoji_threshold: f64,

    #[serde(default = "default_retrain_interval_secs")]
    pub retrain_interval_secs: u64,

    /// Author name whose messages are written to the training corpus.
    #[serde(default = "default_training_source")]
    pub training_source: String,
}

fn default_baseline_activity() -> i64 {
    10
}

fn default_boost() -> i64 {
    3
}

fn default_activation_odds() -> u32 {
    15
}

fn default_emoji_threshold() -> f64 {
    0.10
}

fn default_retrain_interval_secs() -> u64 {
    3 * 60 * 60
}

fn default_training_source() -> String {
    "lisa38".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            baseline_activity: default_baseline_activity(),
            mention_boost: default_boost(),
            retrain_boost: default_boost(),
            activation_odds: default_activation_odds(),
            emoji_threshold: default_emoji_threshold(),
            retrain_interval_secs: default_retrain_interval_secs(),
            training_source: default_training_source(),
        }
    }
}

impl BotConfig {
    pub fn retrain_interval(&self) -> Duration {
        Duration::from_secs(self.retrain_interval_secs)
    }

    /// Rejects values the pipeline or the refresh task cannot run with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.retrain_interval_secs == 0 {
            return Err(Error::Config("retrain interval must be at least one second".into()));
        }
        if self.activation_odds == 0 {
            return Err(Error::Config("activation odds must be at least 1".into()));
        }
        if !(0.0..1.0).contains(&self.emoji_threshold) {
            return Err(Error::Config(format!(
                "emoji threshold must be in [0, 1), got {}",
                self.emoji_threshold
            )));
        }
        Ok(())
    }
}

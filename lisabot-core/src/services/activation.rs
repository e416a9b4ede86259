// File: lisabot-core/src/services/activation.rs

use crate::random::RandomSource;
use crate::state::ActivityCounter;

/// Decides whether a message is worth running through the emoji classifier.
#[derive(Debug, Clone, Copy)]
pub struct ActivationGate {
    odds: u32,
}

impl ActivationGate {
    pub fn new(odds: u32) -> Self {
        Self { odds }
    }

    /// A mention always opens the gate. Otherwise the bot has to be awake (counter > 0)
    /// and win a 1-in-`odds` draw; no draw is made while it is asleep.
    pub fn should_classify(
        &self,
        mentioned: bool,
        activity: &ActivityCounter,
        rng: &mut dyn RandomSource,
    ) -> bool {
        mentioned || (activity.is_awake() && rng.one_in(self.odds))
    }
}

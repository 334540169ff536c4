//! Engine configuration.
//!
//! Every rule constant lives here rather than being hardcoded in the turn or
//! combat code: health and energy economy, zone capacities, effect durations,
//! and the hub's timing knobs.
//!
//! ```
//! use duel_engine::core::EngineConfig;
//!
//! let config = EngineConfig::default()
//!     .with_seed(7)
//!     .with_turn_timeout_ms(5_000);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.starting_health, 30);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::EngineError;

/// Tunable rule and hosting parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hero health at match start.
    pub starting_health: i32,

    /// Energy before the first turn credit.
    pub starting_energy: i32,

    /// Energy credited at the start of each of a side's turns.
    pub energy_per_turn: i32,

    /// Energy is capped here after each credit.
    pub max_energy: i32,

    /// Exact number of cards a deck must contain.
    pub deck_size: usize,

    /// Cards drawn when the match starts.
    pub opening_hand: usize,

    /// Cards drawn at the start of each later turn.
    pub draw_per_turn: usize,

    pub max_hand_size: usize,
    pub max_field_size: usize,

    /// Rounds a `Buff` modifier stays active.
    pub buff_duration: u32,

    /// Rounds a `Defense` modifier stays active.
    pub defense_duration: u32,

    /// Turn timer. When it fires the active side's turn is ended for them.
    pub turn_timeout_ms: u64,

    /// Artificial "thinking" delay before the hub runs the opponent.
    pub ai_think_delay_ms: u64,

    /// Extra attempts for a failed snapshot write.
    pub persist_retries: u32,

    /// Fixed RNG seed. `None` seeds each session from entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starting_health: 30,
            starting_energy: 0,
            energy_per_turn: 1,
            max_energy: 10,
            deck_size: 5,
            opening_hand: 5,
            draw_per_turn: 1,
            max_hand_size: 7,
            max_field_size: 5,
            buff_duration: 3,
            defense_duration: 2,
            turn_timeout_ms: 30_000,
            ai_think_delay_ms: 800,
            persist_retries: 3,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is internally consistent.
    pub fn validate(&self) -> Result<(), EngineError> {
        let fail = |msg: &str| Err(EngineError::InvalidConfig(msg.to_string()));

        if self.starting_health < 1 {
            return fail("starting_health must be at least 1");
        }
        if self.starting_energy < 0 || self.energy_per_turn < 0 {
            return fail("energy values must not be negative");
        }
        if self.max_energy < self.starting_energy {
            return fail("max_energy must be at least starting_energy");
        }
        if self.deck_size == 0 {
            return fail("deck_size must be at least 1");
        }
        if self.opening_hand > self.max_hand_size {
            return fail("opening_hand must fit in max_hand_size");
        }
        if self.max_field_size == 0 {
            return fail("max_field_size must be at least 1");
        }
        if self.buff_duration == 0 || self.defense_duration == 0 {
            return fail("effect durations must be at least 1 round");
        }
        if self.turn_timeout_ms == 0 {
            return fail("turn_timeout_ms must be positive");
        }
        Ok(())
    }

    #[must_use]
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_millis(self.turn_timeout_ms)
    }

    #[must_use]
    pub fn ai_think_delay(&self) -> Duration {
        Duration::from_millis(self.ai_think_delay_ms)
    }

    /// Fix the RNG seed for reproducible sessions.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_starting_health(mut self, health: i32) -> Self {
        self.starting_health = health;
        self
    }

    #[must_use]
    pub fn with_starting_energy(mut self, energy: i32) -> Self {
        self.starting_energy = energy;
        self
    }

    #[must_use]
    pub fn with_max_field_size(mut self, max: usize) -> Self {
        self.max_field_size = max;
        self
    }

    #[must_use]
    pub fn with_turn_timeout_ms(mut self, ms: u64) -> Self {
        self.turn_timeout_ms = ms;
        self
    }

    #[must_use]
    pub fn with_ai_think_delay_ms(mut self, ms: u64) -> Self {
        self.ai_think_delay_ms = ms;
        self
    }

    #[must_use]
    pub fn with_persist_retries(mut self, retries: u32) -> Self {
        self.persist_retries = retries;
        self
    }
}

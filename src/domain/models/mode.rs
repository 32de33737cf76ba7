//! Operating modes and the signals that drive transitions between them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::DomainError;

/// Exploration regime selected by the mode controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Repeat what is known to work
    #[default]
    Exploit,
    /// Try new archetypes
    Explore,
    /// Vary recent winners
    Mutation,
    /// High-variance bets to break a plateau
    Chaos,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exploit => "exploit",
            Self::Explore => "explore",
            Self::Mutation => "mutation",
            Self::Chaos => "chaos",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exploit" => Ok(Self::Exploit),
            "explore" => Ok(Self::Explore),
            "mutation" => Ok(Self::Mutation),
            "chaos" => Ok(Self::Chaos),
            other => Err(DomainError::UnknownMode(other.to_string())),
        }
    }
}

/// Rolling performance signals consumed by one mode decision.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ModeInputs {
    pub hit_rate_7d: f64,
    pub novelty_fatigue: f64,
    pub account_volatility: f64,
    pub confidence_trend: f64,
    pub monetization_drift: f64,
    pub plateau_cycles: u32,
    pub hours_since_mode_change: u32,
    pub drawdown_24h: f64,
    pub risk_budget: f64,
}

/// Output of the mode controller. The caller persists `mode` and
/// `explore_coef` and feeds them back on the next decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeDecision {
    pub mode: Mode,
    pub explore_coef: f64,
    pub rationale: Vec<String>,
}

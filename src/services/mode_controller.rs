//! Rule-based posting mode controller.
//!
//! Transitions are evaluated in priority order and the first match wins.
//! The exploration coefficient is adjusted on every call regardless of the
//! transition taken.

use crate::domain::models::{Mode, ModeDecision, ModeInputs};

const COOLDOWN_HOURS: u32 = 6;
const CHAOS_MIN_HOURS: u32 = 12;
const FATIGUE_THRESHOLD: f64 = 0.65;
const REPEATED_WIN_HIT_RATE: f64 = 0.6;
const PLATEAU_CYCLES: u32 = 3;
const CHAOS_RISK_BUDGET: f64 = 0.6;
const CHAOS_EXIT_HIT_RATE: f64 = 0.5;
const EXPLORE_COEF_MIN: f64 = 0.05;
const EXPLORE_COEF_MAX: f64 = 0.8;

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Decides the next posting mode from recent account signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeController;

impl ModeController {
    pub fn new() -> Self {
        Self
    }

    pub fn decide(&self, current_mode: Mode, explore_coef: f64, inputs: &ModeInputs) -> ModeDecision {
        let (mode, reason) = Self::transition(current_mode, inputs);

        let adjusted = explore_coef
            + (0.2 - inputs.drawdown_24h) * 0.1
            + inputs.monetization_drift * 0.05;
        let explore_coef = round4(adjusted.clamp(EXPLORE_COEF_MIN, EXPLORE_COEF_MAX));

        if mode != current_mode {
            tracing::info!(from = %current_mode, to = %mode, reason, explore_coef, "mode transition");
        }

        ModeDecision {
            mode,
            explore_coef,
            rationale: vec![reason.to_string()],
        }
    }

    fn transition(current: Mode, inputs: &ModeInputs) -> (Mode, &'static str) {
        if inputs.hours_since_mode_change < COOLDOWN_HOURS {
            return (current, "cooldown_active");
        }
        if current == Mode::Exploit && inputs.novelty_fatigue >= FATIGUE_THRESHOLD {
            return (Mode::Explore, "exploit_to_explore_due_to_fatigue");
        }
        if current == Mode::Explore
            && inputs.hit_rate_7d >= REPEATED_WIN_HIT_RATE
            && inputs.confidence_trend > 0.0
        {
            return (Mode::Mutation, "explore_to_mutation_due_to_repeated_wins");
        }
        if inputs.plateau_cycles >= PLATEAU_CYCLES
            && inputs.risk_budget >= CHAOS_RISK_BUDGET
            && inputs.hours_since_mode_change >= CHAOS_MIN_HOURS
        {
            return (Mode::Chaos, "plateau_triggered_chaos");
        }
        if current == Mode::Chaos && inputs.hit_rate_7d < CHAOS_EXIT_HIT_RATE {
            return (Mode::Exploit, "chaos_back_to_exploit");
        }
        (current, "stay")
    }
}

//! Tunable thresholds for the decoder and outbound tracking.
//!
//! [`DecisionConfig`] bundles every per-entity threshold. The world holds one
//! default instance and entities may carry an override. [`VerbTable`] holds
//! the per-verb risk and doctrine weights; both are hand-tuned starting
//! points and are meant to be replaced from configuration.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use parley_types::OrderVerb;

use crate::error::CommsError;

/// Highest redundancy level a message can carry.
pub const MAX_REDUNDANCY: u8 = 2;

/// Per-entity decision thresholds.
///
/// Probabilities and thresholds are `f32` in 0-1. Tick counts are whole
/// ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Need-to-clarify above which the receiver asks for clarification (default: 0.4).
    pub clarify_threshold: f32,

    /// Ticks to wait for an acknowledgement before retrying (default: 4).
    pub ack_timeout_ticks: u32,

    /// Resends allowed for an unacknowledged message (default: 2).
    pub max_retries: u8,

    /// Intelligence below which the receiver never infers (default: 0.4).
    pub inference_min_intelligence: f32,

    /// Posterior required for inference at wisdom 0 (default: 0.8).
    pub inference_threshold_low_wisdom: f32,

    /// Posterior required for inference at wisdom 1 (default: 0.5).
    pub inference_threshold_high_wisdom: f32,

    /// Context fit below which an inferred order degrades to `Hold` (default: 0.5).
    pub inference_context_floor: f32,

    /// Risk at or below which a not-understood order is carried out
    /// conservatively (default: 0.3).
    pub safe_risk_cutoff: f32,

    /// Capacity of the duplicate-suppression ring (default: 32).
    pub recent_history: u16,

    /// Clarify requests a receiver may send per tick (default: 2).
    pub clarify_budget_per_tick: u16,

    /// Clarify requests a receiver may send about one message (default: 2).
    pub max_clarify_attempts: u8,

    /// Ticks a per-message clarify counter survives without activity (default: 32).
    pub pending_clarify_ttl_ticks: u32,

    /// Act threshold for a zero-risk order (default: 0.5).
    pub act_threshold_base: f32,

    /// Extra act threshold per unit of risk (default: 0.3).
    pub act_threshold_risk_scale: f32,

    /// Risk at or above which a verb counts as high-risk (default: 0.6).
    pub high_risk_cutoff: f32,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            clarify_threshold: 0.4,
            ack_timeout_ticks: 4,
            max_retries: 2,
            inference_min_intelligence: 0.4,
            inference_threshold_low_wisdom: 0.8,
            inference_threshold_high_wisdom: 0.5,
            inference_context_floor: 0.5,
            safe_risk_cutoff: 0.3,
            recent_history: 32,
            clarify_budget_per_tick: 2,
            max_clarify_attempts: 2,
            pending_clarify_ttl_ticks: 32,
            act_threshold_base: 0.5,
            act_threshold_risk_scale: 0.3,
            high_risk_cutoff: 0.6,
        }
    }
}

impl DecisionConfig {
    /// Check that every probability lies in 0-1 and every capacity is usable.
    pub fn validate(&self) -> Result<(), CommsError> {
        let unit_fields = [
            ("clarify_threshold", self.clarify_threshold),
            ("inference_min_intelligence", self.inference_min_intelligence),
            ("inference_threshold_low_wisdom", self.inference_threshold_low_wisdom),
            ("inference_threshold_high_wisdom", self.inference_threshold_high_wisdom),
            ("inference_context_floor", self.inference_context_floor),
            ("safe_risk_cutoff", self.safe_risk_cutoff),
            ("act_threshold_base", self.act_threshold_base),
            ("high_risk_cutoff", self.high_risk_cutoff),
        ];
        for (name, value) in unit_fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(CommsError::InvalidConfig {
                    reason: format!("{name} must be within 0..=1, got {value}"),
                });
            }
        }
        if !self.act_threshold_risk_scale.is_finite() || self.act_threshold_risk_scale < 0.0 {
            return Err(CommsError::InvalidConfig {
                reason: format!(
                    "act_threshold_risk_scale must be a non-negative number, got {}",
                    self.act_threshold_risk_scale
                ),
            });
        }
        if self.recent_history == 0 {
            return Err(CommsError::InvalidConfig {
                reason: "recent_history must be at least 1".to_owned(),
            });
        }
        Ok(())
    }

    /// Timeout tick for a message sent at `tick`.
    pub fn timeout_after(&self, tick: u64) -> u64 {
        tick.saturating_add(u64::from(self.ack_timeout_ticks.max(1)))
    }
}

// ---------------------------------------------------------------------------
// Verb table
// ---------------------------------------------------------------------------

/// Risk and doctrine data for one order verb.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerbProfile {
    /// Cost of acting on a misunderstood order (0-1).
    pub risk: f32,
    /// How strongly standing doctrine predicts this order (0-1).
    pub doctrine_weight: f32,
    /// The safer verb an inference substitutes when the order is high-risk.
    pub fallback: OrderVerb,
}

impl VerbProfile {
    /// Profile used for verbs missing from a table.
    pub const UNKNOWN: Self = Self {
        risk: 0.5,
        doctrine_weight: 0.0,
        fallback: OrderVerb::Hold,
    };

    const fn of(risk: f32, doctrine_weight: f32, fallback: OrderVerb) -> Self {
        Self {
            risk,
            doctrine_weight,
            fallback,
        }
    }
}

/// Per-verb profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerbTable {
    profiles: BTreeMap<OrderVerb, VerbProfile>,
}

impl Default for VerbTable {
    fn default() -> Self {
        let profiles = [
            (OrderVerb::Hold, VerbProfile::of(0.05, 0.9, OrderVerb::Hold)),
            (OrderVerb::Follow, VerbProfile::of(0.5, 0.6, OrderVerb::Hold)),
            (OrderVerb::MoveTo, VerbProfile::of(0.55, 0.5, OrderVerb::Hold)),
            (OrderVerb::Patrol, VerbProfile::of(0.3, 0.6, OrderVerb::Hold)),
            (OrderVerb::Gather, VerbProfile::of(0.2, 0.7, OrderVerb::Hold)),
            (OrderVerb::Build, VerbProfile::of(0.25, 0.6, OrderVerb::Hold)),
            (OrderVerb::Trade, VerbProfile::of(0.45, 0.3, OrderVerb::Hold)),
            (OrderVerb::Defend, VerbProfile::of(0.6, 0.7, OrderVerb::Hold)),
            (OrderVerb::Retreat, VerbProfile::of(0.5, 0.8, OrderVerb::Hold)),
            (OrderVerb::Attack, VerbProfile::of(0.9, 0.4, OrderVerb::Defend)),
        ]
        .into_iter()
        .collect();
        Self { profiles }
    }
}

impl VerbTable {
    /// The default table with `overrides` replacing individual verbs.
    pub fn with_overrides(overrides: &BTreeMap<OrderVerb, VerbProfile>) -> Self {
        let mut table = Self::default();
        for (verb, profile) in overrides {
            table.profiles.insert(*verb, *profile);
        }
        table
    }

    /// Profile for `verb`.
    pub fn profile(&self, verb: OrderVerb) -> VerbProfile {
        self.profiles
            .get(&verb)
            .copied()
            .unwrap_or(VerbProfile::UNKNOWN)
    }

    /// Risk of `verb`, clamped to 0-1.
    pub fn risk(&self, verb: OrderVerb) -> f32 {
        self.profile(verb).risk.clamp(0.0, 1.0)
    }

    /// Doctrine weight of `verb`, clamped to 0-1.
    pub fn doctrine_weight(&self, verb: OrderVerb) -> f32 {
        self.profile(verb).doctrine_weight.clamp(0.0, 1.0)
    }

    /// Whether `verb` counts as high-risk under `config`.
    pub fn is_high_risk(&self, verb: OrderVerb, config: &DecisionConfig) -> bool {
        self.risk(verb) >= config.high_risk_cutoff
    }
}

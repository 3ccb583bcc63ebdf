//! Confidence, risk and inference arithmetic used by the decoder.
//!
//! Everything here is pure: the decoder feeds in a receipt's integrity and
//! order plus the receiver's factors and thresholds, and reads back numbers
//! and verdicts. All scores are clamped to 0-1.

use parley_types::{AckPolicy, ClarifyMask, DecodeFactors, OrderFields, OrderVerb};

use crate::config::{DecisionConfig, VerbTable};

/// Clamp to 0-1, mapping NaN to 0.
pub fn sat(value: f32) -> f32 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    (b - a).mul_add(t, a)
}

/// The receiver's belief that it decoded what was meant.
pub fn confidence(integrity: f32, factors: &DecodeFactors) -> f32 {
    sat(sat(integrity)
        * sat(factors.cohesion)
        * sat(factors.protocol_familiarity)
        * sat(factors.context_fit))
}

/// Risk of acting on `order`; messages without order content carry none.
pub fn order_risk(order: Option<&OrderFields>, verbs: &VerbTable) -> f32 {
    order.map_or(0.0, |o| verbs.risk(o.verb))
}

/// Confidence required to act without clarifying or inferring.
pub fn act_threshold(risk: f32, config: &DecisionConfig) -> f32 {
    sat(config.act_threshold_risk_scale.mul_add(risk, config.act_threshold_base))
}

/// How badly the receiver needs the order restated.
pub fn need_to_clarify(confidence: f32, risk: f32) -> f32 {
    sat((1.0 - sat(confidence)) * sat(risk))
}

/// Questions the receiver could ask about `order`.
pub fn clarify_mask(order: Option<&OrderFields>) -> ClarifyMask {
    match order {
        Some(o) if (o.verb.is_movement() || o.verb.requires_target()) && o.lacks_target() => {
            ClarifyMask::MISSING_TARGET
        }
        _ => ClarifyMask::NONE,
    }
}

/// Posterior required to accept by inference at the given wisdom.
pub fn inference_threshold(wisdom: f32, config: &DecisionConfig) -> f32 {
    sat(lerp(
        config.inference_threshold_low_wisdom,
        config.inference_threshold_high_wisdom,
        sat(wisdom),
    ))
}

/// Posterior belief in `verb` after blending confidence with doctrine.
pub fn posterior(confidence: f32, factors: &DecodeFactors, verb: OrderVerb, verbs: &VerbTable) -> f32 {
    let doctrine = verbs.doctrine_weight(verb);
    sat(sat(confidence).mul_add(1.0 - doctrine, sat(factors.context_fit) * doctrine))
}

/// The verb the receiver infers it was asked to perform, or `None` when
/// inference fails.
pub fn infer(
    order: &OrderFields,
    confidence: f32,
    factors: &DecodeFactors,
    verbs: &VerbTable,
    config: &DecisionConfig,
) -> Option<OrderVerb> {
    if factors.intelligence < config.inference_min_intelligence {
        return None;
    }
    if posterior(confidence, factors, order.verb, verbs) < inference_threshold(factors.wisdom, config) {
        return None;
    }
    let verb = if verbs.is_high_risk(order.verb, config) {
        verbs.profile(order.verb).fallback
    } else if factors.context_fit < config.inference_context_floor {
        OrderVerb::Hold
    } else {
        order.verb
    };
    Some(verb)
}

/// Whether accepting `order` under `policy` warrants an acknowledgement.
pub fn wants_ack(policy: AckPolicy, order: Option<&OrderFields>, verbs: &VerbTable, config: &DecisionConfig) -> bool {
    match policy {
        AckPolicy::Required => true,
        AckPolicy::OnHighRisk => order.is_some_and(|o| verbs.is_high_risk(o.verb, config)),
        AckPolicy::None => false,
    }
}

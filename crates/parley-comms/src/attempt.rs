//! Attempt builder: turns queued send requests into resolved attempts.
//!
//! For every request the builder picks an encoding method from the two
//! language ladders, resolves the perceived intent (including a seeded
//! misread roll for signs), applies the redundancy boost, chooses a
//! transport channel, and assigns the message identity. Orders that demand
//! acknowledgement are tracked on the sender's outbound table.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace};

use parley_types::{
    AckPolicy, Attempt, Channel, ChannelMask, CommMethod, EntityId, Intent, MessageType,
    OutboundEntry, SendRequest,
};

use crate::config::{DecisionConfig, MAX_REDUNDANCY, VerbTable};
use crate::gate::PipelineGate;
use crate::hashing;
use crate::journal::{Command, CommandJournal};
use crate::language;
use crate::outbound;
use crate::store::ComponentStore;
use crate::world::CommsWorld;

/// Misread probability at zero clarity.
pub const MISREAD_BASE: f32 = 0.12;

/// Clarity gained per redundancy level.
pub const REDUNDANCY_STEP: f32 = 0.15;

/// Channel preference for gestures and signals.
const SIGNS_ORDER: [Channel; 4] = [Channel::Vision, Channel::Proximity, Channel::Hearing, Channel::Em];

/// Channel preference for spoken or transmitted language.
const LANGUAGE_ORDER: [Channel; 4] = [Channel::Hearing, Channel::Em, Channel::Vision, Channel::Paranormal];

/// Counters from one build pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Attempts emitted.
    pub built: usize,
    /// Requests discarded.
    pub dropped: usize,
    /// Outbound entries inserted or refreshed.
    pub tracked: usize,
    /// Signs messages whose intent was misread.
    pub misread: usize,
}

/// Build attempts for every sender with queued requests.
///
/// Consumed requests are cleared whether or not they produced an attempt.
pub fn build_attempts(world: &mut CommsWorld, gate: PipelineGate, tick: u64) -> BuildStats {
    let mut stats = BuildStats::default();
    if !gate.allows_mutation() {
        return stats;
    }

    let mut journal = CommandJournal::new();
    let senders: Vec<EntityId> = world
        .send_queues
        .iter()
        .filter(|(_, queue)| !queue.is_empty())
        .map(|(entity, _)| entity)
        .collect();

    for sender in senders {
        let requests = world
            .send_queues
            .get_mut(sender)
            .map(std::mem::take)
            .unwrap_or_default();
        let config = world.config(sender).clone();

        for (position, request) in requests.into_iter().enumerate() {
            let index = u32::try_from(position).unwrap_or(u32::MAX);
            let Some(built) = build_one(world, sender, &request, index, tick) else {
                stats.dropped = stats.dropped.saturating_add(1);
                continue;
            };
            if built.misread {
                stats.misread = stats.misread.saturating_add(1);
            }

            let attempt = built.attempt;
            let track = wants_tracking(&request, world.verb_table(), &config);
            let message_id = attempt.message_id;
            let redundancy = attempt.redundancy;

            let Some(queue) = world.attempts.get_mut(sender) else {
                debug!(%sender, "sender has no attempt queue; request dropped");
                stats.dropped = stats.dropped.saturating_add(1);
                continue;
            };
            trace!(%sender, receiver = %attempt.receiver, id = %message_id, method = ?attempt.method, clarity = attempt.clarity, "attempt built");
            queue.push(attempt);
            stats.built = stats.built.saturating_add(1);

            if track {
                let entry = OutboundEntry {
                    receiver: request.receiver,
                    message_id,
                    retries_left: config.max_retries,
                    last_sent_tick: tick,
                    timeout_tick: config.timeout_after(tick),
                    redundancy,
                    request: SendRequest {
                        message_id: Some(message_id),
                        ..request
                    },
                };
                if let Some(entries) = world.outbound.get_mut(sender) {
                    outbound::upsert(entries, entry);
                } else {
                    journal.push(Command::AttachOutbound {
                        sender,
                        entry: Box::new(entry),
                    });
                }
                stats.tracked = stats.tracked.saturating_add(1);
            }
        }
    }

    journal.apply(world);
    if stats.built > 0 || stats.dropped > 0 {
        debug!(tick, built = stats.built, dropped = stats.dropped, tracked = stats.tracked, "attempts built");
    }
    stats
}

struct Built {
    attempt: Attempt,
    misread: bool,
}

fn build_one(world: &CommsWorld, sender: EntityId, request: &SendRequest, index: u32, tick: u64) -> Option<Built> {
    let receiver = request.receiver;
    let Some(sender_endpoint) = world.endpoints.get(sender) else {
        debug!(%sender, "sender has no endpoint; request dropped");
        return None;
    };
    if !world.is_alive(receiver) {
        debug!(%sender, %receiver, "receiver gone; request dropped");
        return None;
    }
    let Some(receiver_endpoint) = world.endpoints.get(receiver) else {
        debug!(%sender, %receiver, "receiver has no endpoint; request dropped");
        return None;
    };

    let shared = sender_endpoint.channels.intersect(receiver_endpoint.channels);
    let resolution = language::resolve(
        world.languages.get(sender),
        world.languages.get(receiver),
        sender_endpoint.base_clarity,
        shared,
    );
    if resolution.method == CommMethod::FailedCommunication || resolution.clarity <= 0.0 {
        debug!(%sender, %receiver, "no way to communicate; request dropped");
        return None;
    }

    let mut clarity = resolution.clarity;
    let mut intent = resolve_intent(request);
    let mut misread = false;
    if resolution.method == CommMethod::GeneralSigns {
        let seed = hashing::misread_seed(sender, receiver, tick, index);
        if roll_misread(seed, clarity) {
            intent = confuse(intent);
            clarity *= 0.5;
            misread = true;
            trace!(%sender, %receiver, ?intent, "signs misread");
        }
    }

    let redundancy = request.redundancy.min(MAX_REDUNDANCY);
    clarity = boost(clarity, redundancy);

    let candidates = if request.preferred_channels.is_empty() {
        shared
    } else {
        request.preferred_channels.intersect(ChannelMask::ALL)
    };
    let order: &[Channel] = if resolution.method.is_language() {
        &LANGUAGE_ORDER
    } else {
        &SIGNS_ORDER
    };
    let Some(channel) = candidates.first_in(order).or_else(|| candidates.lowest()) else {
        debug!(%sender, %receiver, "no transport channel; request dropped");
        return None;
    };

    let message_id = request
        .message_id
        .unwrap_or_else(|| hashing::message_id(sender, receiver, tick, index));

    Some(Built {
        attempt: Attempt {
            receiver,
            message_type: request.message_type,
            message_id,
            related_id: request.related_id,
            channel: ChannelMask::only(channel),
            method: resolution.method,
            intent,
            clarity,
            deception_strength: request.deception_strength.clamp(0.0, 1.0),
            tick,
            ack_policy: request.ack_policy,
            redundancy,
            payload_id: request.payload_id,
            clarify_mask: request.clarify_mask,
            order: request.order,
        },
        misread,
    })
}

/// The intent the receiver will be presented with.
pub fn resolve_intent(request: &SendRequest) -> Intent {
    let intent = if request.deception_strength > 0.0 && request.stated_intent != Intent::Incomprehensible {
        request.stated_intent
    } else {
        request.true_intent
    };
    if !request.message_type.is_actionable() && intent == Intent::Greeting {
        Intent::Neutral
    } else {
        intent
    }
}

/// The intent a misread signs message is mistaken for.
pub const fn confuse(intent: Intent) -> Intent {
    match intent {
        Intent::Greeting => Intent::Threat,
        Intent::Threat => Intent::Warning,
        Intent::Warning => Intent::Threat,
        Intent::TradeOffer => Intent::Request,
        Intent::Request => Intent::TradeOffer,
        Intent::Submission | Intent::Neutral => Intent::Greeting,
        Intent::Incomprehensible => Intent::Incomprehensible,
    }
}

/// First uniform draw of the misread stream for `seed`.
///
/// `ChaCha8` has a fixed output for a given seed, so replays agree across
/// builds and platforms.
pub fn misread_draw(seed: u64) -> f32 {
    ChaCha8Rng::seed_from_u64(seed).random::<f32>()
}

/// Seeded misread roll; probability falls as clarity rises.
pub fn roll_misread(seed: u64, clarity: f32) -> bool {
    let probability = MISREAD_BASE * (1.0 - clarity.clamp(0.0, 1.0));
    misread_draw(seed) < probability
}

/// Clarity after repeating the message `redundancy` times.
pub fn boost(clarity: f32, redundancy: u8) -> f32 {
    let levels = f32::from(redundancy.min(3));
    (clarity * REDUNDANCY_STEP.mul_add(levels, 1.0)).clamp(0.0, 1.0)
}

/// Whether a sent request must be tracked until acknowledged.
pub fn wants_tracking(request: &SendRequest, verbs: &VerbTable, config: &DecisionConfig) -> bool {
    if request.message_type != MessageType::Order {
        return false;
    }
    match request.ack_policy {
        AckPolicy::Required => true,
        AckPolicy::OnHighRisk => request
            .order
            .is_some_and(|order| verbs.is_high_risk(order.verb, config)),
        AckPolicy::None => false,
    }
}

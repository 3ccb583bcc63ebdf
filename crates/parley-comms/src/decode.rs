//! Decoder and decision-maker.
//!
//! Each receiver works through its receipts in arrival order. Protocol
//! messages (acks, nacks, clarify requests) only touch the receiver's own
//! outbound table or send queue. Actionable messages are scored and end in
//! exactly one [`Decision`]: accepted, clarify requested, default-safe, or
//! ignored. Any reply the decision calls for is queued on the receiver and
//! leaves on the next tick's attempt build.
//!
//! A clarify response is final: it is decided without asking again, since a
//! second restatement would share its dedup key and never be read.

use tracing::{debug, trace};

use parley_types::{
    AckPolicy, ClarifyMask, Decision, DecisionKind, DecodeFactors, EntityId, MessageId,
    MessageType, OrderFields, OutboundEntry, Receipt, SendRequest,
};

use crate::assess;
use crate::bookkeeping::{DedupKey, ReceiverBook};
use crate::config::{DecisionConfig, MAX_REDUNDANCY, VerbTable};
use crate::gate::PipelineGate;
use crate::store::ComponentStore;
use crate::world::CommsWorld;

/// Counters from one decode pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Receipts suppressed as duplicates.
    pub duplicates: usize,
    /// Acks and nacks that retired an outbound entry.
    pub acknowledged: usize,
    /// Clarify responses queued in answer to clarify requests.
    pub clarified: usize,
    /// Decisions of kind accepted (including inferred).
    pub accepted: usize,
    /// Accepted decisions reached by inference.
    pub inferred: usize,
    /// Decisions of kind clarify requested.
    pub clarify_requested: usize,
    /// Decisions of kind default-safe.
    pub default_safe: usize,
    /// Decisions of kind ignored.
    pub ignored: usize,
}

impl DecodeStats {
    /// Total decisions recorded.
    pub const fn decisions(&self) -> usize {
        self.accepted
            .saturating_add(self.clarify_requested)
            .saturating_add(self.default_safe)
            .saturating_add(self.ignored)
    }

    fn count(&mut self, decision: &Decision) {
        let slot = match decision.kind {
            DecisionKind::Accepted => &mut self.accepted,
            DecisionKind::ClarifyRequested => &mut self.clarify_requested,
            DecisionKind::DefaultSafe => &mut self.default_safe,
            DecisionKind::Ignored => &mut self.ignored,
        };
        *slot = slot.saturating_add(1);
        if decision.inferred {
            self.inferred = self.inferred.saturating_add(1);
        }
    }
}

/// Receiver-side inputs that stay fixed for one receiver's pass.
struct Receiver<'a> {
    entity: EntityId,
    factors: DecodeFactors,
    config: &'a DecisionConfig,
    verbs: &'a VerbTable,
}

/// What one receiver's pass produced.
#[derive(Default)]
struct Output {
    decisions: Vec<Decision>,
    replies: Vec<SendRequest>,
}

/// Decode every queued receipt.
pub fn decode_receipts(world: &mut CommsWorld, gate: PipelineGate, tick: u64) -> DecodeStats {
    let mut stats = DecodeStats::default();
    if !gate.allows_mutation() {
        return stats;
    }

    let receivers: Vec<EntityId> = world
        .receipts
        .iter()
        .filter(|(_, queue)| !queue.is_empty())
        .map(|(entity, _)| entity)
        .collect();

    for entity in receivers {
        let receipts = world
            .receipts
            .get_mut(entity)
            .map(std::mem::take)
            .unwrap_or_default();
        let mut book = world.books.get_mut(entity).map(std::mem::take).unwrap_or_default();
        let mut outbound = world.outbound.get_mut(entity).map(std::mem::take);

        let output = {
            let receiver = Receiver {
                entity,
                factors: world.decode_factors(entity),
                config: world.config(entity),
                verbs: world.verb_table(),
            };
            if book.budget.refresh(tick) {
                book.pending.prune(
                    tick,
                    receiver.config.pending_clarify_ttl_ticks,
                    usize::from(receiver.config.recent_history),
                );
            }
            let mut output = Output::default();
            for receipt in &receipts {
                decode_one(&receiver, receipt, tick, &mut book, outbound.as_mut(), &mut output, &mut stats);
            }
            output
        };

        world.books.insert(entity, book);
        if let (Some(entries), Some(slot)) = (outbound, world.outbound.get_mut(entity)) {
            *slot = entries;
        }
        if !output.decisions.is_empty() {
            if let Some(log) = world.decisions.get_mut(entity) {
                log.extend(output.decisions);
            } else {
                world.decisions.insert(entity, output.decisions);
            }
        }
        if !output.replies.is_empty() {
            if let Some(queue) = world.send_queues.get_mut(entity) {
                queue.extend(output.replies);
            } else {
                world.send_queues.insert(entity, output.replies);
            }
        }
    }

    if stats != DecodeStats::default() {
        debug!(
            tick,
            decisions = stats.decisions(),
            accepted = stats.accepted,
            clarify = stats.clarify_requested,
            default_safe = stats.default_safe,
            ignored = stats.ignored,
            duplicates = stats.duplicates,
            "receipts decoded"
        );
    }
    stats
}

/// The id a receipt's decision and replies refer to.
const fn tracked_id(receipt: &Receipt) -> MessageId {
    match (receipt.message_type, receipt.related_id) {
        (MessageType::ClarifyResponse, Some(related)) => related,
        _ => receipt.message_id,
    }
}

fn dedup_key(receipt: &Receipt) -> DedupKey {
    let clarify_response = receipt.message_type == MessageType::ClarifyResponse;
    DedupKey {
        id: if clarify_response { tracked_id(receipt) } else { receipt.message_id },
        clarify_response,
    }
}

fn decode_one(
    receiver: &Receiver<'_>,
    receipt: &Receipt,
    tick: u64,
    book: &mut ReceiverBook,
    outbound: Option<&mut Vec<OutboundEntry>>,
    output: &mut Output,
    stats: &mut DecodeStats,
) {
    let config = receiver.config;
    if !book.recent.observe(dedup_key(receipt), usize::from(config.recent_history)) {
        trace!(receiver = %receiver.entity, id = %receipt.message_id, "duplicate receipt suppressed");
        stats.duplicates = stats.duplicates.saturating_add(1);
        return;
    }

    let about = receipt.related_id.unwrap_or(receipt.message_id);
    match receipt.message_type {
        MessageType::Ack | MessageType::Nack => {
            if let Some(entries) = outbound {
                let before = entries.len();
                entries.retain(|e| e.message_id != about);
                if entries.len() < before {
                    trace!(receiver = %receiver.entity, id = %about, kind = ?receipt.message_type, "outbound retired");
                    stats.acknowledged = stats.acknowledged.saturating_add(1);
                }
            }
            return;
        }
        MessageType::ClarifyRequest => {
            if let Some(entry) = outbound.as_deref().and_then(|entries| entries.iter().find(|e| e.message_id == about)) {
                output.replies.push(SendRequest {
                    receiver: receipt.sender,
                    message_type: MessageType::ClarifyResponse,
                    message_id: None,
                    related_id: Some(about),
                    redundancy: entry.redundancy.saturating_add(1).min(MAX_REDUNDANCY),
                    ..entry.request.clone()
                });
                stats.clarified = stats.clarified.saturating_add(1);
            }
            return;
        }
        MessageType::Order | MessageType::ClarifyResponse => {}
    }

    let decision = decide(receiver, receipt, tick, book, output);
    debug!(
        receiver = %receiver.entity,
        sender = %receipt.sender,
        id = %decision.message_id,
        kind = ?decision.kind,
        confidence = decision.confidence,
        inferred = decision.inferred,
        "decision"
    );
    stats.count(&decision);
    output.decisions.push(decision);
}

fn decide(receiver: &Receiver<'_>, receipt: &Receipt, tick: u64, book: &mut ReceiverBook, output: &mut Output) -> Decision {
    let config = receiver.config;
    let verbs = receiver.verbs;
    let id = tracked_id(receipt);
    let order = receipt.order.as_ref();

    let confidence = assess::confidence(receipt.integrity, &receiver.factors);
    let risk = assess::order_risk(order, verbs);
    let act = assess::act_threshold(risk, config);
    let mask = assess::clarify_mask(order);

    let mut decision = Decision {
        kind: DecisionKind::Ignored,
        message_id: id,
        sender: receipt.sender,
        tick,
        confidence,
        order: receipt.order,
        inferred: false,
        clarify_mask: ClarifyMask::NONE,
    };

    let may_clarify = receipt.message_type != MessageType::ClarifyResponse
        && assess::need_to_clarify(confidence, risk) > config.clarify_threshold
        && !mask.is_empty()
        && book.budget.has_room(config.clarify_budget_per_tick)
        && book.pending.attempts(id) < config.max_clarify_attempts;
    if may_clarify {
        let mut request = SendRequest::protocol(receipt.sender, MessageType::ClarifyRequest, id);
        request.clarify_mask = mask;
        output.replies.push(request);
        book.budget.spend();
        book.pending.bump(id, tick);
        decision.kind = DecisionKind::ClarifyRequested;
        decision.clarify_mask = mask;
        return decision;
    }

    let ack = assess::wants_ack(receipt.ack_policy, order, verbs, config);
    if confidence >= act {
        decision.kind = DecisionKind::Accepted;
    } else if let Some(verb) = order.and_then(|o| assess::infer(o, confidence, &receiver.factors, verbs, config)) {
        decision.kind = DecisionKind::Accepted;
        decision.inferred = true;
        decision.order = receipt.order.map(|o| OrderFields { verb, ..o });
    } else if risk <= config.safe_risk_cutoff {
        decision.kind = DecisionKind::DefaultSafe;
        return decision;
    } else {
        if receipt.ack_policy == AckPolicy::Required {
            output
                .replies
                .push(SendRequest::protocol(receipt.sender, MessageType::Nack, id));
        }
        return decision;
    }

    if ack {
        output.replies.push(SendRequest::protocol(receipt.sender, MessageType::Ack, id));
    }
    decision
}

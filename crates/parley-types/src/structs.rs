//! Core data structures flowing through the message pipeline.
//!
//! Each stage owns one buffer type: callers author [`SendRequest`]s, the
//! attempt builder turns them into [`Attempt`]s, the dispatcher delivers
//! [`Receipt`]s, and the decoder records [`Decision`]s. Messages that demand
//! acknowledgement are tracked by an [`OutboundEntry`] on the sender.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::channel::{Channel, ChannelMask, ClarifyMask};
use crate::enums::{
    AckPolicy, CommMethod, DecisionKind, Intent, MessageType, OrderVerb, ProficiencyLevel,
};
use crate::ids::{EntityId, LanguageId, MessageId};

// ---------------------------------------------------------------------------
// Collaborator-supplied components
// ---------------------------------------------------------------------------

/// Per-entity communication capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Endpoint {
    /// Channels this entity can send and receive on.
    pub channels: ChannelMask,
    /// Clarity of the entity's own transmissions before any loss (0-1).
    pub base_clarity: f32,
    /// Ambient noise the entity hears over everything it receives (0-1).
    pub noise_floor: f32,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            channels: ChannelMask::from_channels(&[Channel::Vision, Channel::Hearing]),
            base_clarity: 1.0,
            noise_floor: 0.0,
        }
    }
}

/// One rung of an entity's language ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LanguageEntry {
    /// Which language.
    pub language: LanguageId,
    /// How well the entity commands it.
    pub level: ProficiencyLevel,
    /// Whether it is one of the entity's native languages.
    pub native: bool,
}

/// Ordered list of the languages an entity speaks, best first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LanguageLadder {
    /// Entries in preference order.
    pub entries: Vec<LanguageEntry>,
}

impl LanguageLadder {
    /// Build a ladder from entries.
    pub const fn new(entries: Vec<LanguageEntry>) -> Self {
        Self { entries }
    }

    /// Find the entry for `language`, if the entity knows it.
    pub fn entry(&self, language: LanguageId) -> Option<&LanguageEntry> {
        self.entries.iter().find(|e| e.language == language)
    }
}

/// Mental attributes, normalised to 0-1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Attributes {
    /// Reasoning capacity; gates inference.
    pub intelligence: f32,
    /// Judgement; lowers the bar for inference.
    pub wisdom: f32,
}

/// Scalar inputs to the receiver's confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DecodeFactors {
    /// Reasoning capacity (from [`Attributes`] when present).
    pub intelligence: f32,
    /// Judgement (from [`Attributes`] when present).
    pub wisdom: f32,
    /// How tightly knit the receiver's group is.
    pub cohesion: f32,
    /// How used the receiver is to this kind of exchange.
    pub protocol_familiarity: f32,
    /// How well the message fits what the receiver is doing.
    pub context_fit: f32,
}

impl Default for DecodeFactors {
    fn default() -> Self {
        Self {
            intelligence: 0.5,
            wisdom: 0.5,
            cohesion: 1.0,
            protocol_familiarity: 1.0,
            context_fit: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Order payload
// ---------------------------------------------------------------------------

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// East-west.
    pub x: f32,
    /// North-south.
    pub y: f32,
    /// Up-down.
    pub z: f32,
}

impl Position {
    /// Build a position.
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Whether this is the origin, which orders use to mean "unset".
    pub fn is_zero(self) -> bool {
        self.x.abs() <= f32::EPSILON && self.y.abs() <= f32::EPSILON && self.z.abs() <= f32::EPSILON
    }
}

/// Inclusive tick range in which an order should be carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TickWindow {
    /// First tick the order applies.
    pub start: u64,
    /// Last tick the order applies.
    pub end: u64,
}

/// The actionable content of an order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OrderFields {
    /// What to do.
    pub verb: OrderVerb,
    /// Who to do it to, if anyone.
    pub target: Option<EntityId>,
    /// Where to do it; the origin means unset.
    pub target_position: Position,
    /// Urgency; higher preempts lower.
    pub priority: u8,
    /// When to do it, if constrained.
    pub window: Option<TickWindow>,
}

impl OrderFields {
    /// An order with no target, position, or window.
    pub const fn new(verb: OrderVerb) -> Self {
        Self {
            verb,
            target: None,
            target_position: Position::new(0.0, 0.0, 0.0),
            priority: 0,
            window: None,
        }
    }

    /// Whether the order names neither a target entity nor a position.
    pub fn lacks_target(&self) -> bool {
        self.target.is_none() && self.target_position.is_zero()
    }
}

// ---------------------------------------------------------------------------
// Pipeline buffers
// ---------------------------------------------------------------------------

/// A caller's intent to send one message. Lives for a single tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SendRequest {
    /// Who the message is for.
    pub receiver: EntityId,
    /// Protocol role.
    pub message_type: MessageType,
    /// What the sender actually means.
    pub true_intent: Intent,
    /// What the sender claims to mean.
    pub stated_intent: Intent,
    /// Opaque reference to caller-side content (trade offer, greeting text).
    pub payload_id: u32,
    /// How hard the sender is lying (0 = honest).
    pub deception_strength: f32,
    /// Whether the sender wants an acknowledgement.
    pub ack_policy: AckPolicy,
    /// Repetition level, 0-2.
    pub redundancy: u8,
    /// Channels the sender would like to use; empty means any shared channel.
    pub preferred_channels: ChannelMask,
    /// Caller-chosen identity; derived from the send context when absent.
    pub message_id: Option<MessageId>,
    /// The earlier message this one refers to (acks, clarifications).
    pub related_id: Option<MessageId>,
    /// Questions asked by a clarify request.
    pub clarify_mask: ClarifyMask,
    /// Order content, for orders and clarify responses.
    pub order: Option<OrderFields>,
}

impl SendRequest {
    /// An honest order with default policies.
    pub const fn order(receiver: EntityId, order: OrderFields) -> Self {
        Self {
            receiver,
            message_type: MessageType::Order,
            true_intent: Intent::Neutral,
            stated_intent: Intent::Neutral,
            payload_id: 0,
            deception_strength: 0.0,
            ack_policy: AckPolicy::None,
            redundancy: 0,
            preferred_channels: ChannelMask::NONE,
            message_id: None,
            related_id: None,
            clarify_mask: ClarifyMask::NONE,
            order: Some(order),
        }
    }

    /// A protocol message (ack, nack, clarify request) about `related`.
    pub const fn protocol(receiver: EntityId, message_type: MessageType, related: MessageId) -> Self {
        Self {
            receiver,
            message_type,
            true_intent: Intent::Neutral,
            stated_intent: Intent::Neutral,
            payload_id: 0,
            deception_strength: 0.0,
            ack_policy: AckPolicy::None,
            redundancy: 0,
            preferred_channels: ChannelMask::NONE,
            message_id: None,
            related_id: Some(related),
            clarify_mask: ClarifyMask::NONE,
            order: None,
        }
    }

    /// Set the ack policy.
    #[must_use]
    pub const fn with_ack(mut self, ack_policy: AckPolicy) -> Self {
        self.ack_policy = ack_policy;
        self
    }

    /// Set both intents to `intent`.
    #[must_use]
    pub const fn with_intent(mut self, intent: Intent) -> Self {
        self.true_intent = intent;
        self.stated_intent = intent;
        self
    }
}

/// A resolved transmission queued on the sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Attempt {
    /// Who the message is for.
    pub receiver: EntityId,
    /// Protocol role.
    pub message_type: MessageType,
    /// Resolved identity.
    pub message_id: MessageId,
    /// The earlier message this one refers to.
    pub related_id: Option<MessageId>,
    /// Transport channel chosen by the builder.
    pub channel: ChannelMask,
    /// How the message is encoded.
    pub method: CommMethod,
    /// The intent as it will be perceived.
    pub intent: Intent,
    /// Estimated understanding before transmission (0-1).
    pub clarity: f32,
    /// How hard the sender is lying.
    pub deception_strength: f32,
    /// Tick the attempt was built.
    pub tick: u64,
    /// Sender's acknowledgement expectation.
    pub ack_policy: AckPolicy,
    /// Repetition level used.
    pub redundancy: u8,
    /// Opaque caller content reference.
    pub payload_id: u32,
    /// Questions asked by a clarify request.
    pub clarify_mask: ClarifyMask,
    /// Order content.
    pub order: Option<OrderFields>,
}

/// What a receiver actually perceived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Receipt {
    /// Who sent it.
    pub sender: EntityId,
    /// Protocol role.
    pub message_type: MessageType,
    /// Message identity.
    pub message_id: MessageId,
    /// The earlier message this one refers to.
    pub related_id: Option<MessageId>,
    /// The primary channel the message arrived on.
    pub channel: Channel,
    /// How the message was encoded.
    pub method: CommMethod,
    /// The perceived intent.
    pub intent: Intent,
    /// Fidelity after noise and deception (0-1).
    pub integrity: f32,
    /// Whether deception lowered integrity.
    pub was_deceptive: bool,
    /// Tick of delivery.
    pub tick: u64,
    /// Sender's acknowledgement expectation.
    pub ack_policy: AckPolicy,
    /// Repetition level used.
    pub redundancy: u8,
    /// Opaque caller content reference.
    pub payload_id: u32,
    /// Questions asked by a clarify request.
    pub clarify_mask: ClarifyMask,
    /// Order content.
    pub order: Option<OrderFields>,
}

/// The decoder's verdict on one receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Decision {
    /// What the receiver decided.
    pub kind: DecisionKind,
    /// The message the decision is about.
    pub message_id: MessageId,
    /// Who sent that message.
    pub sender: EntityId,
    /// Tick of the decision.
    pub tick: u64,
    /// Receiver's confidence in its reading (0-1).
    pub confidence: f32,
    /// Order to carry out; the verb is the inferred one when `inferred` is set.
    pub order: Option<OrderFields>,
    /// Whether the order was accepted by inference rather than decoding.
    pub inferred: bool,
    /// Questions asked, for clarify decisions.
    pub clarify_mask: ClarifyMask,
}

/// A sent message awaiting acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OutboundEntry {
    /// Who the message went to.
    pub receiver: EntityId,
    /// Identity of the tracked message.
    pub message_id: MessageId,
    /// Resends remaining; only ever decreases.
    pub retries_left: u8,
    /// Tick of the most recent send.
    pub last_sent_tick: u64,
    /// Tick at which the message counts as unacknowledged.
    pub timeout_tick: u64,
    /// Repetition level of the most recent send.
    pub redundancy: u8,
    /// The original request, re-emitted on retry or clarification.
    pub request: SendRequest,
}

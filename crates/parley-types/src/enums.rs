//! Enumeration types for the Parley message pipeline.
//!
//! The discriminants of the protocol enums ([`MessageType`], [`CommMethod`],
//! [`AckPolicy`], [`DecisionKind`]) are part of the wire contract with
//! downstream consumers and must not be reordered.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Protocol enums
// ---------------------------------------------------------------------------

/// The protocol role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[repr(u8)]
pub enum MessageType {
    /// An instruction the receiver is expected to act on.
    Order = 0,
    /// Positive acknowledgement of an earlier message.
    Ack = 1,
    /// Negative acknowledgement: received, will not act.
    Nack = 2,
    /// Receiver asks the sender to restate an earlier message.
    ClarifyRequest = 3,
    /// Sender's restatement in answer to a clarify request.
    ClarifyResponse = 4,
}

impl MessageType {
    /// Whether the message carries actionable content rather than protocol
    /// bookkeeping.
    pub const fn is_actionable(self) -> bool {
        matches!(self, Self::Order | Self::ClarifyResponse)
    }
}

/// How a message is encoded between sender and receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[repr(u8)]
pub enum CommMethod {
    /// Both parties share a native language.
    NativeLanguage = 0,
    /// Both parties know a common, non-native language.
    KnownLanguage = 1,
    /// No shared language; gestures and signals only.
    GeneralSigns = 2,
    /// Nothing can be conveyed at all.
    FailedCommunication = 3,
}

impl CommMethod {
    /// Whether the method is language-based (as opposed to signs).
    pub const fn is_language(self) -> bool {
        matches!(self, Self::NativeLanguage | Self::KnownLanguage)
    }
}

/// Whether and when the sender expects an acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[repr(u8)]
pub enum AckPolicy {
    /// Fire and forget.
    #[default]
    None = 0,
    /// Acknowledge only orders whose verb is high-risk.
    OnHighRisk = 1,
    /// Always acknowledge.
    Required = 2,
}

/// The verdict the decoder reached for a received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[repr(u8)]
pub enum DecisionKind {
    /// The receiver will act on the message (possibly an inferred reading).
    Accepted = 0,
    /// The receiver asked the sender to clarify.
    ClarifyRequested = 1,
    /// The receiver acts conservatively without full understanding.
    DefaultSafe = 2,
    /// The receiver discards the message.
    Ignored = 3,
}

// ---------------------------------------------------------------------------
// Semantic content
// ---------------------------------------------------------------------------

/// The social meaning a message is meant to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Intent {
    /// No particular social charge.
    #[default]
    Neutral,
    /// Friendly salutation.
    Greeting,
    /// Hostile posturing.
    Threat,
    /// An offer to exchange goods.
    TradeOffer,
    /// Asking for help or goods.
    Request,
    /// Alerting to danger.
    Warning,
    /// Yielding, backing down.
    Submission,
    /// Sentinel: the sender produced nothing intelligible.
    Incomprehensible,
}

/// The action an order asks the receiver to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum OrderVerb {
    /// Stay in place.
    Hold,
    /// Follow the target entity.
    Follow,
    /// Move to the target position.
    MoveTo,
    /// Walk a route around the target position.
    Patrol,
    /// Collect resources at the target position.
    Gather,
    /// Build at the target position.
    Build,
    /// Exchange goods with the target entity.
    Trade,
    /// Guard the target entity or position.
    Defend,
    /// Fall back from the current position.
    Retreat,
    /// Engage the target entity.
    Attack,
}

impl OrderVerb {
    /// Every verb, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Hold,
        Self::Follow,
        Self::MoveTo,
        Self::Patrol,
        Self::Gather,
        Self::Build,
        Self::Trade,
        Self::Defend,
        Self::Retreat,
        Self::Attack,
    ];

    /// Whether the verb moves the receiver somewhere.
    pub const fn is_movement(self) -> bool {
        matches!(self, Self::MoveTo | Self::Patrol | Self::Gather | Self::Build)
    }

    /// Whether the verb is meaningless without a target entity.
    pub const fn requires_target(self) -> bool {
        matches!(self, Self::Follow | Self::Trade | Self::Defend | Self::Attack)
    }
}

// ---------------------------------------------------------------------------
// Collaborator inputs
// ---------------------------------------------------------------------------

/// How well an entity commands a language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum ProficiencyLevel {
    /// A handful of words.
    Rudimentary,
    /// Simple phrases.
    Basic,
    /// Everyday conversation.
    Conversational,
    /// Fluent speech.
    Fluent,
    /// Complete command of the language.
    Mastery,
}

impl ProficiencyLevel {
    /// Multiplicative clarity factor contributed by this level.
    pub const fn factor(self) -> f32 {
        match self {
            Self::Rudimentary => 0.2,
            Self::Basic => 0.4,
            Self::Conversational => 0.6,
            Self::Fluent => 0.8,
            Self::Mastery => 1.0,
        }
    }
}

/// The physical medium an entity is immersed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Medium {
    /// Air or any other gas.
    #[default]
    Gas,
    /// Water or any other liquid.
    Liquid,
    /// Empty space.
    Vacuum,
}

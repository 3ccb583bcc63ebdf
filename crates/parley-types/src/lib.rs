//! Shared type definitions for the Parley message pipeline.
//!
//! This crate is the single source of truth for the data that flows between
//! pipeline stages and out to downstream consumers. Types are exported to
//! `TypeScript` via `ts-rs` for inspection tooling.
//!
//! # Modules
//!
//! - [`ids`] -- Generational entity handles and integer keys
//! - [`enums`] -- Protocol enumerations and semantic content tags
//! - [`channel`] -- Transport channels, channel masks, clarify masks
//! - [`structs`] -- Components and per-stage buffer records

pub mod channel;
pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use channel::{Channel, ChannelMask, ClarifyMask};
pub use enums::{
    AckPolicy, CommMethod, DecisionKind, Intent, Medium, MessageType, OrderVerb, ProficiencyLevel,
};
pub use ids::{EntityId, LanguageId, MessageId};
pub use structs::{
    Attempt, Attributes, Decision, DecodeFactors, Endpoint, LanguageEntry, LanguageLadder,
    OrderFields, OutboundEntry, Position, Receipt, SendRequest, TickWindow,
};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Exporting writes to the `bindings/` directory relative to the crate.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::EntityId::export_all();
        let _ = crate::ids::MessageId::export_all();
        let _ = crate::ids::LanguageId::export_all();

        // Enums
        let _ = crate::enums::MessageType::export_all();
        let _ = crate::enums::CommMethod::export_all();
        let _ = crate::enums::AckPolicy::export_all();
        let _ = crate::enums::DecisionKind::export_all();
        let _ = crate::enums::Intent::export_all();
        let _ = crate::enums::OrderVerb::export_all();
        let _ = crate::enums::ProficiencyLevel::export_all();
        let _ = crate::enums::Medium::export_all();

        // Channels
        let _ = crate::channel::Channel::export_all();
        let _ = crate::channel::ChannelMask::export_all();
        let _ = crate::channel::ClarifyMask::export_all();

        // Structs
        let _ = crate::structs::Endpoint::export_all();
        let _ = crate::structs::LanguageLadder::export_all();
        let _ = crate::structs::Attributes::export_all();
        let _ = crate::structs::DecodeFactors::export_all();
        let _ = crate::structs::OrderFields::export_all();
        let _ = crate::structs::SendRequest::export_all();
        let _ = crate::structs::Attempt::export_all();
        let _ = crate::structs::Receipt::export_all();
        let _ = crate::structs::Decision::export_all();
        let _ = crate::structs::OutboundEntry::export_all();
    }
}

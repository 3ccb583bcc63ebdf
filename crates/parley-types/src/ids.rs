//! Type-safe identifiers for entities, messages, and languages.
//!
//! Entities are addressed by a generational arena handle ([`EntityId`]): the
//! `index` selects a slot in every per-entity table, and the `generation`
//! detects handles that outlived a despawned entity. Message identifiers are
//! plain 64-bit values derived deterministically from the send context, so
//! two replays of the same tick produce the same ids.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generational handle for an entity in the simulation arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EntityId {
    /// Slot index into the per-entity component tables.
    pub index: u32,
    /// Generation of the slot at the time the handle was issued.
    pub generation: u32,
}

impl EntityId {
    /// Build a handle from its raw parts.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Pack the handle into a single `u64` (generation in the high half).
    pub fn to_bits(self) -> u64 {
        (u64::from(self.generation) << 32) | u64::from(self.index)
    }

    /// Slot index as a `usize` for table lookups.
    pub fn slot(self) -> usize {
        usize::try_from(self.index).unwrap_or(usize::MAX)
    }
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Generates a newtype wrapper around an integer key with standard derives.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub $inner);

        impl $name {
            /// Return the inner value.
            pub const fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }
    };
}

define_key! {
    /// Identity of a single message, stable across retries of that message.
    MessageId(u64)
}

define_key! {
    /// Identifier of a spoken or signed language.
    LanguageId(u16)
}

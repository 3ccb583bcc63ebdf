//! Deterministic hashing of the send context.
//!
//! Message ids and misread seeds are pure functions of
//! `(sender, receiver, tick, request index)`, mixed with `SplitMix64`, so a
//! replay of the same tick reproduces both exactly.

use parley_types::{EntityId, MessageId};

const GOLDEN: u64 = 0x9e37_79b9_7f4a_7c15;
const MIX_A: u64 = 0xbf58_476d_1ce4_e5b9;
const MIX_B: u64 = 0x94d0_49bb_1331_11eb;

/// Salt separating misread seeds from message ids.
const MISREAD_SALT: u64 = 0x6d69_7372_6561_6421;

/// `SplitMix64` finaliser.
const fn finalize(mut h: u64) -> u64 {
    h = (h ^ (h >> 30)).wrapping_mul(MIX_A);
    h = (h ^ (h >> 27)).wrapping_mul(MIX_B);
    h ^ (h >> 31)
}

/// Fold one word into the running hash.
const fn absorb(h: u64, word: u64) -> u64 {
    finalize(h.wrapping_add(GOLDEN).wrapping_add(word))
}

fn context_hash(salt: u64, sender: EntityId, receiver: EntityId, tick: u64, index: u32) -> u64 {
    let mut h = salt;
    h = absorb(h, sender.to_bits());
    h = absorb(h, receiver.to_bits());
    h = absorb(h, tick);
    absorb(h, u64::from(index))
}

/// Identity of the `index`-th request a sender issued to `receiver` on `tick`.
pub fn message_id(sender: EntityId, receiver: EntityId, tick: u64, index: u32) -> MessageId {
    MessageId(context_hash(0, sender, receiver, tick, index))
}

/// Seed for the misread roll of the same send context.
pub fn misread_seed(sender: EntityId, receiver: EntityId, tick: u64, index: u32) -> u64 {
    context_hash(MISREAD_SALT, sender, receiver, tick, index)
}

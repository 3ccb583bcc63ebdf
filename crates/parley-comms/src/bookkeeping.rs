//! Per-receiver bookkeeping for the decoder.
//!
//! Three bounded records live on every receiver: a ring of recently seen
//! message keys for duplicate suppression, a per-message clarify counter,
//! and the per-tick clarify budget.

use std::collections::VecDeque;

use parley_types::MessageId;

// ---------------------------------------------------------------------------
// Duplicate suppression
// ---------------------------------------------------------------------------

/// Key under which a receipt is deduplicated.
///
/// Clarify responses reuse the id of the order they restate, so they are
/// keyed in their own space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DedupKey {
    /// Message id (related id for clarify responses).
    pub id: MessageId,
    /// Whether the key belongs to the clarify-response space.
    pub clarify_response: bool,
}

/// Fixed-capacity ring of recently seen keys, oldest evicted first.
#[derive(Debug, Clone, Default)]
pub struct RecentMessages {
    keys: VecDeque<DedupKey>,
}

impl RecentMessages {
    /// Record `key`. Returns `false` when it was already present.
    pub fn observe(&mut self, key: DedupKey, capacity: usize) -> bool {
        if self.keys.contains(&key) {
            return false;
        }
        let capacity = capacity.max(1);
        while self.keys.len() >= capacity {
            self.keys.pop_front();
        }
        self.keys.push_back(key);
        true
    }

    /// Whether `key` is in the window.
    pub fn contains(&self, key: DedupKey) -> bool {
        self.keys.contains(&key)
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Per-message clarify counter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingEntry {
    message_id: MessageId,
    attempts: u8,
    last_tick: u64,
}

/// How many times the receiver has asked about each message.
#[derive(Debug, Clone, Default)]
pub struct PendingClarify {
    entries: Vec<PendingEntry>,
}

impl PendingClarify {
    /// Clarify requests already sent about `message_id`.
    pub fn attempts(&self, message_id: MessageId) -> u8 {
        self.entries
            .iter()
            .find(|e| e.message_id == message_id)
            .map_or(0, |e| e.attempts)
    }

    /// Count one more request about `message_id` at `tick`.
    pub fn bump(&mut self, message_id: MessageId, tick: u64) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.message_id == message_id) {
            entry.attempts = entry.attempts.saturating_add(1);
            entry.last_tick = tick;
        } else {
            self.entries.push(PendingEntry {
                message_id,
                attempts: 1,
                last_tick: tick,
            });
        }
    }

    /// Drop counters idle for more than `ttl` ticks, then the oldest beyond
    /// `capacity`.
    pub fn prune(&mut self, tick: u64, ttl: u32, capacity: usize) {
        self.entries
            .retain(|e| tick.saturating_sub(e.last_tick) <= u64::from(ttl));
        if self.entries.len() > capacity {
            self.entries.sort_by_key(|e| e.last_tick);
            let excess = self.entries.len().saturating_sub(capacity);
            self.entries.drain(..excess);
        }
    }

    /// Number of tracked messages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Per-tick budget
// ---------------------------------------------------------------------------

/// Clarify requests sent during the current tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BudgetState {
    tick: Option<u64>,
    /// Requests sent so far this tick.
    pub clarify_used: u16,
}

impl BudgetState {
    /// Reset the counter the first time the receiver is seen on `tick`.
    /// Returns `true` when a reset happened.
    pub fn refresh(&mut self, tick: u64) -> bool {
        if self.tick == Some(tick) {
            return false;
        }
        self.tick = Some(tick);
        self.clarify_used = 0;
        true
    }

    /// Whether another request fits in `budget`.
    pub const fn has_room(&self, budget: u16) -> bool {
        self.clarify_used < budget
    }

    /// Spend one request.
    pub const fn spend(&mut self) {
        self.clarify_used = self.clarify_used.saturating_add(1);
    }
}

/// All decoder bookkeeping for one receiver.
#[derive(Debug, Clone, Default)]
pub struct ReceiverBook {
    /// Duplicate-suppression window.
    pub recent: RecentMessages,
    /// Per-message clarify counters.
    pub pending: PendingClarify,
    /// Per-tick clarify budget.
    pub budget: BudgetState,
}

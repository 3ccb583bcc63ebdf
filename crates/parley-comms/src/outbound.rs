//! Outbound maintenance: retry or retire messages awaiting acknowledgement.

use tracing::{debug, trace};

use parley_types::{EntityId, OutboundEntry, SendRequest};

use crate::config::MAX_REDUNDANCY;
use crate::gate::PipelineGate;
use crate::store::ComponentStore;
use crate::world::CommsWorld;

/// Counters from one maintenance sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintainStats {
    /// Messages re-emitted.
    pub retried: usize,
    /// Entries dropped after running out of retries.
    pub expired: usize,
    /// Entries dropped because the receiver no longer exists.
    pub orphaned: usize,
}

/// Insert `entry`, or refresh the entry with the same message id.
///
/// A refresh updates the send tick, timeout and redundancy; the retry count
/// is never reset.
pub fn upsert(entries: &mut Vec<OutboundEntry>, entry: OutboundEntry) {
    if let Some(existing) = entries.iter_mut().find(|e| e.message_id == entry.message_id) {
        existing.last_sent_tick = entry.last_sent_tick;
        existing.timeout_tick = entry.timeout_tick;
        existing.redundancy = entry.redundancy;
    } else {
        entries.push(entry);
    }
}

/// Sweep every sender's outbound table.
pub fn maintain_outbound(world: &mut CommsWorld, gate: PipelineGate, tick: u64) -> MaintainStats {
    let mut stats = MaintainStats::default();
    if !gate.allows_mutation() {
        return stats;
    }

    let senders: Vec<EntityId> = world
        .outbound
        .iter()
        .filter(|(_, entries)| !entries.is_empty())
        .map(|(entity, _)| entity)
        .collect();

    for sender in senders {
        let mut entries = world
            .outbound
            .get_mut(sender)
            .map(std::mem::take)
            .unwrap_or_default();
        let config = world.config(sender).clone();
        let mut resends = Vec::new();

        for i in (0..entries.len()).rev() {
            let Some(entry) = entries.get_mut(i) else {
                continue;
            };
            if !world.is_alive(entry.receiver) {
                trace!(%sender, id = %entry.message_id, "receiver gone; outbound dropped");
                entries.remove(i);
                stats.orphaned = stats.orphaned.saturating_add(1);
                continue;
            }
            if tick < entry.timeout_tick {
                continue;
            }
            if entry.retries_left == 0 {
                debug!(%sender, id = %entry.message_id, "no retries left; outbound dropped");
                entries.remove(i);
                stats.expired = stats.expired.saturating_add(1);
                continue;
            }
            if entry.last_sent_tick == tick {
                continue;
            }

            let redundancy = entry.redundancy.saturating_add(1).min(MAX_REDUNDANCY);
            resends.push(SendRequest {
                message_id: Some(entry.message_id),
                redundancy,
                ..entry.request.clone()
            });
            entry.retries_left = entry.retries_left.saturating_sub(1);
            entry.last_sent_tick = tick;
            entry.timeout_tick = config.timeout_after(tick);
            entry.redundancy = redundancy;
            trace!(%sender, id = %entry.message_id, retries_left = entry.retries_left, "outbound retried");
            stats.retried = stats.retried.saturating_add(1);
        }

        if let Some(slot) = world.outbound.get_mut(sender) {
            *slot = entries;
        }
        if !resends.is_empty() {
            // Sweep order is newest first; resend in original order.
            resends.reverse();
            if let Some(queue) = world.send_queues.get_mut(sender) {
                queue.extend(resends);
            } else {
                world.send_queues.insert(sender, resends);
            }
        }
    }

    if stats != MaintainStats::default() {
        debug!(tick, retried = stats.retried, expired = stats.expired, orphaned = stats.orphaned, "outbound maintained");
    }
    stats
}

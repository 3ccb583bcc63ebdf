//! Dispatcher: moves attempts across the channel into receipt queues.

use tracing::{debug, trace};

use parley_types::{Attempt, ChannelMask, EntityId, Receipt};

use crate::assess::sat;
use crate::gate::PipelineGate;
use crate::journal::{Command, CommandJournal};
use crate::store::ComponentStore;
use crate::world::CommsWorld;

/// Counters from one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Receipts handed to the journal.
    pub delivered: usize,
    /// Attempts lost for lack of a usable channel or receiver.
    pub dropped: usize,
    /// Deliveries discarded at the sync point (receiver gone or deaf).
    pub discarded: usize,
}

/// Deliver every queued attempt and clear the attempt queues.
pub fn dispatch_attempts(world: &mut CommsWorld, gate: PipelineGate, tick: u64) -> DispatchStats {
    let mut stats = DispatchStats::default();
    if !gate.allows_mutation() {
        return stats;
    }

    let mut journal = CommandJournal::new();
    let senders: Vec<EntityId> = world
        .attempts
        .iter()
        .filter(|(_, queue)| !queue.is_empty())
        .map(|(entity, _)| entity)
        .collect();

    for sender in senders {
        let attempts = world
            .attempts
            .get_mut(sender)
            .map(std::mem::take)
            .unwrap_or_default();
        for attempt in attempts {
            match transmit(world, sender, &attempt, tick) {
                Some(receipt) => {
                    journal.push(Command::DeliverReceipt {
                        receiver: attempt.receiver,
                        receipt: Box::new(receipt),
                    });
                    stats.delivered = stats.delivered.saturating_add(1);
                }
                None => stats.dropped = stats.dropped.saturating_add(1),
            }
        }
    }

    let applied = journal.apply(world);
    stats.discarded = applied.discarded;
    stats.delivered = applied.applied;
    if stats != DispatchStats::default() {
        debug!(tick, delivered = stats.delivered, dropped = stats.dropped, discarded = stats.discarded, "attempts dispatched");
    }
    stats
}

/// Channels that survive both endpoints and both mediums.
pub fn usable_channels(world: &CommsWorld, sender: EntityId, receiver: EntityId, transport: ChannelMask) -> ChannelMask {
    let (Some(ours), Some(theirs)) = (world.endpoint(sender), world.endpoint(receiver)) else {
        return ChannelMask::NONE;
    };
    transport
        .intersect(ours.channels)
        .intersect(theirs.channels)
        .intersect(ChannelMask::carried_by(world.medium(sender)))
        .intersect(ChannelMask::carried_by(world.medium(receiver)))
}

fn transmit(world: &CommsWorld, sender: EntityId, attempt: &Attempt, tick: u64) -> Option<Receipt> {
    let receiver = attempt.receiver;
    if !world.is_alive(receiver) {
        debug!(%sender, %receiver, id = %attempt.message_id, "receiver gone; attempt dropped");
        return None;
    }
    let mask = usable_channels(world, sender, receiver, attempt.channel);
    let Some(channel) = mask.lowest() else {
        debug!(%sender, %receiver, id = %attempt.message_id, "no shared channel; attempt dropped");
        return None;
    };

    let noise = world.endpoint(receiver).map_or(0.0, |e| sat(e.noise_floor));
    let clarity = sat(attempt.clarity);
    let deception = sat(attempt.deception_strength);
    let honest = sat(clarity - noise);
    let integrity = sat(clarity - deception - noise);
    let was_deceptive = deception > 0.0 && integrity < honest;
    trace!(%sender, %receiver, ?channel, integrity, was_deceptive, "attempt transmitted");

    Some(Receipt {
        sender,
        message_type: attempt.message_type,
        message_id: attempt.message_id,
        related_id: attempt.related_id,
        channel,
        method: attempt.method,
        intent: attempt.intent,
        integrity,
        was_deceptive,
        tick,
        ack_policy: attempt.ack_policy,
        redundancy: attempt.redundancy,
        payload_id: attempt.payload_id,
        clarify_mask: attempt.clarify_mask,
        order: attempt.order,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parley_types::{
        AckPolicy, Channel, ClarifyMask, CommMethod, Endpoint, Intent, Medium, MessageId,
        MessageType,
    };

    use super::*;
    use crate::registry::ensure_endpoints;

    fn attempt(receiver: EntityId, channel: Channel, clarity: f32, deception: f32) -> Attempt {
        Attempt {
            receiver,
            message_type: MessageType::Order,
            message_id: MessageId(1),
            related_id: None,
            channel: ChannelMask::only(channel),
            method: CommMethod::NativeLanguage,
            intent: Intent::Neutral,
            clarity,
            deception_strength: deception,
            tick: 0,
            ack_policy: AckPolicy::None,
            redundancy: 0,
            payload_id: 0,
            clarify_mask: ClarifyMask::NONE,
            order: None,
        }
    }

    fn pair(channels: &[Channel], noise: f32) -> (CommsWorld, EntityId, EntityId) {
        let mut world = CommsWorld::new();
        let a = world.spawn().unwrap();
        let b = world.spawn().unwrap();
        let endpoint = Endpoint {
            channels: ChannelMask::from_channels(channels),
            base_clarity: 1.0,
            noise_floor: noise,
        };
        world.set_endpoint(a, endpoint).unwrap();
        world.set_endpoint(b, endpoint).unwrap();
        ensure_endpoints(&mut world);
        (world, a, b)
    }

    #[test]
    fn delivers_with_noise_and_deception() {
        let (mut world, a, b) = pair(&[Channel::Hearing], 0.1);
        world.attempts.get_mut(a).unwrap().push(attempt(b, Channel::Hearing, 0.9, 0.2));
        let stats = dispatch_attempts(&mut world, PipelineGate::open(), 2);
        assert_eq!(stats.delivered, 1);
        let receipt = world.receipts(b).first().unwrap();
        assert!((receipt.integrity - 0.6).abs() < 1e-5);
        assert!(receipt.was_deceptive);
        assert_eq!(receipt.channel, Channel::Hearing);
        assert_eq!(receipt.tick, 2);
        assert!(world.attempts(a).is_empty());
    }

    #[test]
    fn integrity_is_clamped() {
        let (mut world, a, b) = pair(&[Channel::Hearing], 0.5);
        world.attempts.get_mut(a).unwrap().push(attempt(b, Channel::Hearing, 0.3, 0.9));
        dispatch_attempts(&mut world, PipelineGate::open(), 0);
        let receipt = world.receipts(b).first().unwrap();
        assert!((receipt.integrity - 0.0).abs() < f32::EPSILON);
        assert!(!receipt.was_deceptive);
    }

    #[test]
    fn vacuum_silences_hearing() {
        let (mut world, a, b) = pair(&[Channel::Hearing, Channel::Em], 0.0);
        world.set_medium(b, Medium::Vacuum).unwrap();
        world.attempts.get_mut(a).unwrap().push(attempt(b, Channel::Hearing, 1.0, 0.0));
        let stats = dispatch_attempts(&mut world, PipelineGate::open(), 0);
        assert_eq!(stats.dropped, 1);
        assert!(world.receipts(b).is_empty());
    }

    #[test]
    fn liquid_blocks_radio() {
        let (world, a, b) = {
            let (mut world, a, b) = pair(&[Channel::Em, Channel::Vision], 0.0);
            world.set_medium(a, Medium::Liquid).unwrap();
            (world, a, b)
        };
        assert!(usable_channels(&world, a, b, ChannelMask::only(Channel::Em)).is_empty());
        assert_eq!(
            usable_channels(&world, a, b, ChannelMask::ALL),
            ChannelMask::only(Channel::Vision)
        );
    }

    #[test]
    fn receiver_without_queue_gets_nothing() {
        let mut world = CommsWorld::new();
        let a = world.spawn().unwrap();
        let b = world.spawn().unwrap();
        world.set_endpoint(a, Endpoint::default()).unwrap();
        ensure_endpoints(&mut world);
        world.set_endpoint(b, Endpoint::default()).unwrap();
        world.attempts.get_mut(a).unwrap().push(attempt(b, Channel::Vision, 1.0, 0.0));
        let stats = dispatch_attempts(&mut world, PipelineGate::open(), 0);
        assert_eq!(stats.discarded, 1);
        assert_eq!(stats.delivered, 0);
    }
}

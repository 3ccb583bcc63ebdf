//! Deferred structural changes and cross-entity writes.
//!
//! Stages walk one entity at a time and may only touch that entity's own
//! buffers. Anything that lands on another entity, or attaches a new table
//! entry, is recorded here and applied in order at the stage's sync point.

use parley_types::{EntityId, OutboundEntry, Receipt};
use tracing::trace;

use crate::bookkeeping::ReceiverBook;
use crate::outbound;
use crate::store::ComponentStore;
use crate::world::CommsWorld;

/// One deferred mutation.
#[derive(Debug, Clone)]
pub enum Command {
    /// Give `entity` empty attempt, receipt, decision and bookkeeping buffers.
    AttachBuffers(EntityId),
    /// Track `entry` on `sender`, creating its outbound table if needed.
    AttachOutbound {
        /// Owner of the tracked message.
        sender: EntityId,
        /// The entry to insert or refresh.
        entry: Box<OutboundEntry>,
    },
    /// Append `receipt` to the receipt queue of `receiver`.
    DeliverReceipt {
        /// Destination entity.
        receiver: EntityId,
        /// What the receiver perceived.
        receipt: Box<Receipt>,
    },
}

/// What applying a journal did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    /// Commands that took effect.
    pub applied: usize,
    /// Commands discarded because their target was gone.
    pub discarded: usize,
}

/// Ordered list of deferred commands.
#[derive(Debug, Clone, Default)]
pub struct CommandJournal {
    commands: Vec<Command>,
}

impl CommandJournal {
    /// An empty journal.
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Record a command.
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Apply every command in recording order and empty the journal.
    pub fn apply(&mut self, world: &mut CommsWorld) -> ApplyStats {
        let mut stats = ApplyStats::default();
        for command in self.commands.drain(..) {
            let took_effect = match command {
                Command::AttachBuffers(entity) => attach_buffers(world, entity),
                Command::AttachOutbound { sender, entry } => {
                    if world.is_alive(sender) {
                        if let Some(entries) = world.outbound.get_mut(sender) {
                            outbound::upsert(entries, *entry);
                        } else {
                            world.outbound.insert(sender, vec![*entry]);
                        }
                        true
                    } else {
                        false
                    }
                }
                Command::DeliverReceipt { receiver, receipt } => {
                    if world.is_alive(receiver) {
                        world
                            .receipts
                            .get_mut(receiver)
                            .map(|queue| queue.push(*receipt))
                            .is_some()
                    } else {
                        false
                    }
                }
            };
            if took_effect {
                stats.applied = stats.applied.saturating_add(1);
            } else {
                stats.discarded = stats.discarded.saturating_add(1);
            }
        }
        if stats.discarded > 0 {
            trace!(discarded = stats.discarded, "journal commands discarded");
        }
        stats
    }
}

fn attach_buffers(world: &mut CommsWorld, entity: EntityId) -> bool {
    if !world.is_alive(entity) {
        return false;
    }
    if !world.send_queues.has(entity) {
        world.send_queues.insert(entity, Vec::new());
    }
    if !world.attempts.has(entity) {
        world.attempts.insert(entity, Vec::new());
    }
    if !world.receipts.has(entity) {
        world.receipts.insert(entity, Vec::new());
    }
    if !world.decisions.has(entity) {
        world.decisions.insert(entity, Vec::new());
    }
    if !world.books.has(entity) {
        world.books.insert(entity, ReceiverBook::default());
    }
    true
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parley_types::{
        AckPolicy, Channel, ClarifyMask, CommMethod, Intent, MessageId, MessageType,
    };

    use super::*;

    fn receipt(sender: EntityId) -> Receipt {
        Receipt {
            sender,
            message_type: MessageType::Order,
            message_id: MessageId(1),
            related_id: None,
            channel: Channel::Hearing,
            method: CommMethod::NativeLanguage,
            intent: Intent::Neutral,
            integrity: 1.0,
            was_deceptive: false,
            tick: 0,
            ack_policy: AckPolicy::None,
            redundancy: 0,
            payload_id: 0,
            clarify_mask: ClarifyMask::NONE,
            order: None,
        }
    }

    #[test]
    fn delivery_needs_a_receipt_queue() {
        let mut world = CommsWorld::new();
        let a = world.spawn().unwrap();
        let b = world.spawn().unwrap();
        let mut journal = CommandJournal::new();
        journal.push(Command::DeliverReceipt {
            receiver: b,
            receipt: Box::new(receipt(a)),
        });
        let stats = journal.apply(&mut world);
        assert_eq!(stats.discarded, 1);
        assert!(journal.is_empty());

        journal.push(Command::AttachBuffers(b));
        journal.push(Command::DeliverReceipt {
            receiver: b,
            receipt: Box::new(receipt(a)),
        });
        let stats = journal.apply(&mut world);
        assert_eq!(stats.applied, 2);
        assert_eq!(world.receipts(b).len(), 1);
    }

    #[test]
    fn delivery_to_dead_receiver_is_discarded() {
        let mut world = CommsWorld::new();
        let a = world.spawn().unwrap();
        let b = world.spawn().unwrap();
        let mut journal = CommandJournal::new();
        journal.push(Command::AttachBuffers(b));
        journal.apply(&mut world);
        world.despawn(b).unwrap();

        journal.push(Command::DeliverReceipt {
            receiver: b,
            receipt: Box::new(receipt(a)),
        });
        assert_eq!(journal.apply(&mut world).discarded, 1);
    }

    #[test]
    fn attach_buffers_keeps_existing_contents() {
        let mut world = CommsWorld::new();
        let a = world.spawn().unwrap();
        let mut journal = CommandJournal::new();
        journal.push(Command::AttachBuffers(a));
        journal.push(Command::DeliverReceipt {
            receiver: a,
            receipt: Box::new(receipt(a)),
        });
        journal.push(Command::AttachBuffers(a));
        journal.apply(&mut world);
        assert_eq!(world.receipts(a).len(), 1);
    }
}

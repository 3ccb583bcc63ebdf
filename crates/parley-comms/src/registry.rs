//! Endpoint registry: binds message buffers to communicating entities.

use tracing::debug;

use crate::journal::{Command, CommandJournal};
use crate::store::ComponentStore;
use crate::world::CommsWorld;

/// Give every live entity with an [`Endpoint`](parley_types::Endpoint) the
/// buffers it is missing. Returns how many entities were bound.
pub fn ensure_endpoints(world: &mut CommsWorld) -> usize {
    let mut journal = CommandJournal::new();
    for (entity, _) in world.endpoints.iter() {
        if !world.is_alive(entity) {
            continue;
        }
        let complete = world.send_queues.has(entity)
            && world.attempts.has(entity)
            && world.receipts.has(entity)
            && world.decisions.has(entity)
            && world.books.has(entity);
        if !complete {
            journal.push(Command::AttachBuffers(entity));
        }
    }

    let bound = journal.apply(world).applied;
    if bound > 0 {
        debug!(bound, "endpoints bound");
    }
    bound
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parley_types::Endpoint;

    use super::*;

    #[test]
    fn binds_only_entities_with_endpoints() {
        let mut world = CommsWorld::new();
        let talker = world.spawn().unwrap();
        let rock = world.spawn().unwrap();
        world.set_endpoint(talker, Endpoint::default()).unwrap();

        assert_eq!(ensure_endpoints(&mut world), 1);
        assert!(world.has_receipt_queue(talker));
        assert!(!world.has_receipt_queue(rock));
    }

    #[test]
    fn second_pass_binds_nothing() {
        let mut world = CommsWorld::new();
        let talker = world.spawn().unwrap();
        world.set_endpoint(talker, Endpoint::default()).unwrap();
        ensure_endpoints(&mut world);
        assert_eq!(ensure_endpoints(&mut world), 0);
    }

    #[test]
    fn queued_sends_survive_binding() {
        let mut world = CommsWorld::new();
        let a = world.spawn().unwrap();
        world.set_endpoint(a, Endpoint::default()).unwrap();
        world
            .send(
                a,
                parley_types::SendRequest::order(
                    a,
                    parley_types::OrderFields::new(parley_types::OrderVerb::Hold),
                ),
            )
            .unwrap();
        ensure_endpoints(&mut world);
        assert_eq!(world.pending_sends(a).len(), 1);
    }
}

//! Scripted commanders: the drill's traffic source.
//!
//! Every `order_every_ticks` ticks each squad commander picks a verb for
//! every member and sends it. Some orders go out without the target or
//! position their verb needs, which is what drives the clarify round trip.
//! Decisions handed back after decoding are tallied by kind.

use std::collections::BTreeMap;

use parley_comms::CommsWorld;
use parley_core::config::PopulationConfig;
use parley_core::traffic::{TrafficError, TrafficSource};
use parley_types::{
    AckPolicy, Decision, DecisionKind, EntityId, OrderFields, OrderVerb, Position, SendRequest,
    TickWindow,
};
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, trace};

use crate::spawner::{Roster, Squad};

/// Chance that an order omits the target its verb calls for.
const VAGUE_ORDER_CHANCE: f64 = 0.3;

/// Salt separating the commanders' RNG stream from the spawner's.
const TRAFFIC_SALT: u64 = 0x00C0_FFEE_0DE5;

/// Ticks an order stays actionable.
const ORDER_WINDOW_TICKS: u64 = 10;

/// Decisions observed over a run, grouped by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecisionTally {
    /// Decision count per kind.
    pub by_kind: BTreeMap<DecisionKind, u64>,
    /// Accepted decisions reached by inference.
    pub inferred: u64,
    /// Accepted decisions whose verb differs from the order sent.
    pub substituted: u64,
}

impl DecisionTally {
    /// Decisions of `kind` seen so far.
    pub fn count(&self, kind: DecisionKind) -> u64 {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }

    /// Every decision seen so far.
    pub fn total(&self) -> u64 {
        self.by_kind.values().copied().fold(0, u64::saturating_add)
    }
}

/// Commanders issuing seeded random orders to their squads.
#[derive(Debug)]
pub struct ScriptedCommander {
    squads: Vec<Squad>,
    every: u64,
    ack_policy: AckPolicy,
    rng: ChaCha8Rng,
    sent: BTreeMap<(EntityId, u64), OrderVerb>,
    tally: DecisionTally,
}

impl ScriptedCommander {
    /// Commanders for every squad in `roster`.
    pub fn new(roster: &Roster, config: &PopulationConfig, seed: u64) -> Self {
        Self {
            squads: roster.squads.clone(),
            every: config.order_every_ticks.max(1),
            ack_policy: config.ack_policy,
            rng: ChaCha8Rng::seed_from_u64(seed ^ TRAFFIC_SALT),
            sent: BTreeMap::new(),
            tally: DecisionTally::default(),
        }
    }

    /// Decisions tallied so far.
    pub const fn tally(&self) -> &DecisionTally {
        &self.tally
    }

    fn order_for(&mut self, squad: &Squad, receiver: EntityId, tick: u64) -> SendRequest {
        let verb = OrderVerb::ALL
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(OrderVerb::Hold);
        let vague = self.rng.random_bool(VAGUE_ORDER_CHANCE);

        let mut order = OrderFields::new(verb);
        order.priority = self.rng.random_range(0..=3);
        order.window = Some(TickWindow {
            start: tick,
            end: tick.saturating_add(ORDER_WINDOW_TICKS),
        });
        if verb.requires_target() && !vague {
            order.target = squad
                .members
                .iter()
                .copied()
                .filter(|m| *m != receiver)
                .collect::<Vec<_>>()
                .choose(&mut self.rng)
                .copied()
                .or(Some(squad.commander));
        }
        if verb.is_movement() && !vague {
            order.target_position = Position::new(
                self.rng.random_range(-50.0..=50.0),
                self.rng.random_range(-50.0..=50.0),
                0.0,
            );
        }

        let mut request = SendRequest::order(receiver, order).with_ack(self.ack_policy);
        request.redundancy = self.rng.random_range(0..=2);
        request
    }
}

impl TrafficSource for ScriptedCommander {
    fn collect_sends(
        &mut self,
        tick: u64,
        world: &CommsWorld,
    ) -> Result<Vec<(EntityId, SendRequest)>, TrafficError> {
        if tick.checked_rem(self.every) != Some(0) {
            return Ok(Vec::new());
        }

        let squads = std::mem::take(&mut self.squads);
        let mut sends = Vec::new();
        for squad in &squads {
            if !world.is_alive(squad.commander) {
                continue;
            }
            for &member in &squad.members {
                if !world.is_alive(member) {
                    continue;
                }
                let request = self.order_for(squad, member, tick);
                if let Some(order) = request.order {
                    self.sent.insert((member, tick), order.verb);
                    trace!(tick, commander = %squad.commander, %member, verb = ?order.verb, "order issued");
                }
                sends.push((squad.commander, request));
            }
        }
        self.squads = squads;

        debug!(tick, orders = sends.len(), "Commanders issued orders");
        Ok(sends)
    }

    fn observe_decisions(&mut self, _tick: u64, decisions: &[(EntityId, Decision)]) {
        for (receiver, decision) in decisions {
            let slot = self.tally.by_kind.entry(decision.kind).or_insert(0);
            *slot = slot.saturating_add(1);
            if decision.inferred {
                self.tally.inferred = self.tally.inferred.saturating_add(1);
            }
            let Some(order) = decision.order else {
                continue;
            };
            let window_start = order.window.map_or(decision.tick, |w| w.start);
            let substituted = decision.kind == DecisionKind::Accepted
                && self
                    .sent
                    .get(&(*receiver, window_start))
                    .is_some_and(|sent| *sent != order.verb);
            if substituted {
                self.tally.substituted = self.tally.substituted.saturating_add(1);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parley_types::MessageId;

    use super::*;
    use crate::spawner::spawn_population;

    fn drill(every: u64) -> (CommsWorld, ScriptedCommander) {
        let config = PopulationConfig {
            squads: 2,
            squad_size: 3,
            order_every_ticks: every,
            ..PopulationConfig::default()
        };
        let mut world = CommsWorld::new();
        let roster = spawn_population(&config, 3, &mut world).unwrap();
        let commander = ScriptedCommander::new(&roster, &config, 3);
        (world, commander)
    }

    #[test]
    fn orders_only_on_schedule() {
        let (world, mut commander) = drill(3);
        assert!(commander.collect_sends(1, &world).unwrap().is_empty());
        assert!(commander.collect_sends(2, &world).unwrap().is_empty());
        assert_eq!(commander.collect_sends(3, &world).unwrap().len(), 4);
    }

    #[test]
    fn orders_come_from_the_squad_commander() {
        let (world, mut commander) = drill(1);
        let squads = commander.squads.clone();
        for (sender, request) in commander.collect_sends(1, &world).unwrap() {
            let squad = squads.iter().find(|s| s.members.contains(&request.receiver)).unwrap();
            assert_eq!(sender, squad.commander);
            assert!(request.redundancy <= 2);
            assert!(request.order.is_some());
        }
    }

    #[test]
    fn dead_members_get_no_orders() {
        let (mut world, mut commander) = drill(1);
        let member = *commander.squads.first().unwrap().members.first().unwrap();
        world.despawn(member).unwrap();
        let sends = commander.collect_sends(1, &world).unwrap();
        assert_eq!(sends.len(), 3);
        assert!(sends.iter().all(|(_, r)| r.receiver != member));
    }

    #[test]
    fn same_seed_same_orders() {
        let (world, mut a) = drill(1);
        let (_, mut b) = drill(1);
        let left = a.collect_sends(1, &world).unwrap();
        let right = b.collect_sends(1, &world).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn tally_counts_kinds_and_substitutions() {
        let (world, mut commander) = drill(1);
        let sends = commander.collect_sends(1, &world).unwrap();
        let (_, request) = sends.first().unwrap();
        let sent = request.order.unwrap();
        let other = if sent.verb == OrderVerb::Hold {
            OrderVerb::Defend
        } else {
            OrderVerb::Hold
        };

        let decision = |kind, verb| Decision {
            kind,
            message_id: MessageId(1),
            sender: EntityId::new(0, 0),
            tick: 1,
            confidence: 0.5,
            order: Some(OrderFields { verb, ..sent }),
            inferred: verb != sent.verb,
            clarify_mask: parley_types::ClarifyMask::NONE,
        };
        commander.observe_decisions(
            1,
            &[
                (request.receiver, decision(DecisionKind::Accepted, other)),
                (request.receiver, decision(DecisionKind::Accepted, sent.verb)),
                (request.receiver, decision(DecisionKind::Ignored, sent.verb)),
            ],
        );

        let tally = commander.tally();
        assert_eq!(tally.total(), 3);
        assert_eq!(tally.count(DecisionKind::Accepted), 2);
        assert_eq!(tally.count(DecisionKind::Ignored), 1);
        assert_eq!(tally.inferred, 1);
        assert_eq!(tally.substituted, 1);
    }
}

//! End-to-end scenarios across all four pipeline stages.

#![allow(clippy::unwrap_used)]

use parley_comms::{
    BuildStats, CommsWorld, DecisionConfig, DecodeStats, DispatchStats, MaintainStats,
    PipelineGate, TimeMode, build_attempts, decode_receipts, dispatch_attempts, ensure_endpoints,
    maintain_outbound,
};
use parley_types::{
    AckPolicy, Channel, ChannelMask, ClarifyMask, CommMethod, DecisionKind, DecodeFactors, Endpoint, EntityId,
    Intent, LanguageEntry, LanguageId, LanguageLadder, Medium, MessageType, OrderFields, OrderVerb,
    ProficiencyLevel, SendRequest,
};

#[derive(Debug, Default)]
struct TickStats {
    build: BuildStats,
    dispatch: DispatchStats,
    decode: DecodeStats,
    maintain: MaintainStats,
}

fn run_tick(world: &mut CommsWorld, tick: u64) -> TickStats {
    run_gated_tick(world, PipelineGate::open(), tick)
}

fn run_gated_tick(world: &mut CommsWorld, gate: PipelineGate, tick: u64) -> TickStats {
    if gate.allows_mutation() {
        ensure_endpoints(world);
    }
    TickStats {
        build: build_attempts(world, gate, tick),
        dispatch: dispatch_attempts(world, gate, tick),
        decode: decode_receipts(world, gate, tick),
        maintain: maintain_outbound(world, gate, tick),
    }
}

fn endpoint(channels: &[Channel], base_clarity: f32) -> Endpoint {
    Endpoint {
        channels: ChannelMask::from_channels(channels),
        base_clarity,
        noise_floor: 0.0,
    }
}

fn agent(world: &mut CommsWorld, endpoint: Endpoint, ladder: &[(u16, ProficiencyLevel, bool)]) -> EntityId {
    let e = world.spawn().unwrap();
    world.set_endpoint(e, endpoint).unwrap();
    world
        .set_languages(
            e,
            LanguageLadder::new(
                ladder
                    .iter()
                    .map(|(id, level, native)| LanguageEntry {
                        language: LanguageId(*id),
                        level: *level,
                        native: *native,
                    })
                    .collect(),
            ),
        )
        .unwrap();
    e
}

fn native(id: u16) -> [(u16, ProficiencyLevel, bool); 1] {
    [(id, ProficiencyLevel::Mastery, true)]
}

const TALK: [Channel; 2] = [Channel::Vision, Channel::Hearing];

// ---------------------------------------------------------------------------
// Method resolution
// ---------------------------------------------------------------------------

#[test]
fn no_shared_language_and_no_sign_clarity_fails() {
    let mut world = CommsWorld::new();
    let a = agent(&mut world, endpoint(&TALK, 0.0), &native(1));
    let b = agent(&mut world, endpoint(&TALK, 1.0), &native(2));
    world.send(a, SendRequest::order(b, OrderFields::new(OrderVerb::Hold))).unwrap();

    let stats = run_tick(&mut world, 0);
    assert_eq!(stats.build.built, 0);
    assert_eq!(stats.build.dropped, 1);
    assert!(world.attempts(a).is_empty());
    assert!(world.decisions(b).is_empty());
}

#[test]
fn no_gesture_channel_fails() {
    let mut world = CommsWorld::new();
    let a = agent(&mut world, endpoint(&[Channel::Paranormal], 1.0), &native(1));
    let b = agent(&mut world, endpoint(&[Channel::Paranormal], 1.0), &native(2));
    world.send(a, SendRequest::order(b, OrderFields::new(OrderVerb::Hold))).unwrap();
    assert_eq!(run_tick(&mut world, 0).build.built, 0);
}

#[test]
fn known_language_takes_weaker_proficiency() {
    let mut world = CommsWorld::new();
    let a = agent(
        &mut world,
        endpoint(&TALK, 1.0),
        &[(1, ProficiencyLevel::Mastery, true), (3, ProficiencyLevel::Fluent, false)],
    );
    let b = agent(
        &mut world,
        endpoint(&TALK, 1.0),
        &[(2, ProficiencyLevel::Mastery, true), (3, ProficiencyLevel::Conversational, false)],
    );
    ensure_endpoints(&mut world);
    world.send(a, SendRequest::order(b, OrderFields::new(OrderVerb::Hold))).unwrap();
    build_attempts(&mut world, PipelineGate::open(), 0);

    let attempt = world.attempts(a).first().unwrap();
    assert_eq!(attempt.method, CommMethod::KnownLanguage);
    assert!((attempt.clarity - 0.6).abs() < 1e-5);
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

#[test]
fn clear_order_is_accepted_and_ack_retires_outbound() {
    let mut world = CommsWorld::new();
    let a = agent(&mut world, endpoint(&TALK, 0.9), &native(1));
    let b = agent(&mut world, endpoint(&TALK, 1.0), &native(1));
    world
        .set_decision_config(
            b,
            DecisionConfig {
                act_threshold_base: 0.7,
                act_threshold_risk_scale: 0.0,
                ..DecisionConfig::default()
            },
        )
        .unwrap();
    let order = OrderFields {
        target: Some(a),
        ..OrderFields::new(OrderVerb::Follow)
    };
    world.send(a, SendRequest::order(b, order).with_ack(AckPolicy::Required)).unwrap();

    let first = run_tick(&mut world, 0);
    assert_eq!(first.decode.accepted, 1);
    assert_eq!(world.outbound(a).len(), 1);
    let decision = world.decisions(b).first().unwrap();
    assert_eq!(decision.kind, DecisionKind::Accepted);
    assert!((decision.confidence - 0.9).abs() < 1e-5);
    let ack = world.pending_sends(b).first().unwrap();
    assert_eq!(ack.message_type, MessageType::Ack);

    let second = run_tick(&mut world, 1);
    assert_eq!(second.decode.acknowledged, 1);
    assert!(world.outbound(a).is_empty());
}

#[test]
fn untargeted_attack_requests_clarification_and_gets_restatement() {
    let mut world = CommsWorld::new();
    let a = agent(&mut world, endpoint(&TALK, 0.3), &native(1));
    let b = agent(&mut world, endpoint(&TALK, 1.0), &native(1));
    world
        .send(
            a,
            SendRequest::order(b, OrderFields::new(OrderVerb::Attack)).with_ack(AckPolicy::Required),
        )
        .unwrap();

    run_tick(&mut world, 0);
    let original = world.outbound(a).first().unwrap().message_id;
    let decision = world.decisions(b).first().unwrap();
    assert_eq!(decision.kind, DecisionKind::ClarifyRequested);
    assert_eq!(decision.clarify_mask, ClarifyMask::MISSING_TARGET);
    assert_eq!(decision.message_id, original);
    assert!((decision.confidence - 0.3).abs() < 1e-5);

    // The clarify request reaches the sender, which restates the order.
    let second = run_tick(&mut world, 1);
    assert_eq!(second.decode.clarified, 1);
    let response = world.pending_sends(a).first().unwrap();
    assert_eq!(response.message_type, MessageType::ClarifyResponse);
    assert_eq!(response.related_id, Some(original));
    assert_eq!(response.redundancy, 1);

    // The restatement is decided against the original id, without asking again.
    run_tick(&mut world, 2);
    let decisions = world.take_decisions(b);
    assert_eq!(decisions.len(), 2);
    assert!(decisions.iter().all(|d| d.message_id == original));
    assert_ne!(decisions.last().unwrap().kind, DecisionKind::ClarifyRequested);
}

#[test]
fn unclear_restatement_ends_in_ignore_and_nack() {
    let mut world = CommsWorld::new();
    let a = agent(&mut world, endpoint(&TALK, 1.0), &native(1));
    let b = agent(&mut world, endpoint(&TALK, 1.0), &native(1));
    world
        .set_decode_factors(
            b,
            DecodeFactors {
                cohesion: 0.3,
                intelligence: 0.0,
                ..DecodeFactors::default()
            },
        )
        .unwrap();
    world
        .send(
            a,
            SendRequest::order(b, OrderFields::new(OrderVerb::Attack)).with_ack(AckPolicy::Required),
        )
        .unwrap();

    let mut nacked_on = None;
    let mut decisions = Vec::new();
    for tick in 0..20 {
        let stats = run_tick(&mut world, tick);
        if stats.decode.acknowledged > 0 && nacked_on.is_none() {
            nacked_on = Some(tick);
        }
        decisions.extend(world.take_decisions(b).into_iter().map(|d| (d.tick, d.kind)));
        assert_eq!(stats.maintain.retried, 0, "tick {tick}");
    }

    assert_eq!(
        decisions,
        vec![(0, DecisionKind::ClarifyRequested), (2, DecisionKind::Ignored)]
    );
    assert_eq!(nacked_on, Some(3));
    assert!(world.outbound(a).is_empty());
}

#[test]
fn untargeted_move_asks_where_to_go() {
    let mut world = CommsWorld::new();
    let a = agent(&mut world, endpoint(&TALK, 1.0), &native(1));
    let b = agent(&mut world, endpoint(&TALK, 1.0), &native(1));
    world
        .set_decode_factors(
            b,
            DecodeFactors {
                cohesion: 0.2,
                ..DecodeFactors::default()
            },
        )
        .unwrap();
    world.send(a, SendRequest::order(b, OrderFields::new(OrderVerb::MoveTo))).unwrap();

    let stats = run_tick(&mut world, 0);
    assert_eq!(stats.decode.clarify_requested, 1);
    let decision = world.decisions(b).first().unwrap();
    assert_eq!(decision.kind, DecisionKind::ClarifyRequested);
    assert_eq!(decision.clarify_mask, ClarifyMask::MISSING_TARGET);
    let request = world.pending_sends(b).first().unwrap();
    assert_eq!(request.message_type, MessageType::ClarifyRequest);
    assert_eq!(request.clarify_mask, ClarifyMask::MISSING_TARGET);
}

#[test]
fn clarify_budget_bounds_requests_per_tick() {
    let mut world = CommsWorld::new();
    let b = agent(&mut world, endpoint(&TALK, 1.0), &native(1));
    let senders: Vec<EntityId> = (0..6)
        .map(|_| agent(&mut world, endpoint(&TALK, 0.3), &native(1)))
        .collect();
    for sender in &senders {
        world
            .send(*sender, SendRequest::order(b, OrderFields::new(OrderVerb::Attack)))
            .unwrap();
    }

    let stats = run_tick(&mut world, 0);
    let budget = usize::from(DecisionConfig::default().clarify_budget_per_tick);
    assert_eq!(stats.decode.decisions(), senders.len());
    assert_eq!(stats.decode.clarify_requested, budget);
    assert_eq!(
        world
            .pending_sends(b)
            .iter()
            .filter(|r| r.message_type == MessageType::ClarifyRequest)
            .count(),
        budget
    );
}

#[test]
fn duplicate_delivery_yields_one_decision() {
    let mut world = CommsWorld::new();
    let a = agent(&mut world, endpoint(&TALK, 1.0), &native(1));
    let b = agent(&mut world, endpoint(&TALK, 1.0), &native(1));
    let mut request = SendRequest::order(b, OrderFields::new(OrderVerb::Hold));
    request.message_id = Some(parley_types::MessageId(42));
    world.send(a, request.clone()).unwrap();
    world.send(a, request).unwrap();

    let stats = run_tick(&mut world, 0);
    assert_eq!(stats.dispatch.delivered, 2);
    assert_eq!(stats.decode.duplicates, 1);
    assert_eq!(world.decisions(b).len(), 1);
}

// ---------------------------------------------------------------------------
// Retries
// ---------------------------------------------------------------------------

#[test]
fn unacknowledged_order_retries_once_then_expires() {
    let mut world = CommsWorld::new();
    let a = agent(&mut world, endpoint(&[Channel::Hearing], 1.0), &native(1));
    let b = agent(&mut world, endpoint(&[Channel::Hearing], 1.0), &native(1));
    world.set_medium(b, Medium::Vacuum).unwrap();
    world
        .set_decision_config(
            a,
            DecisionConfig {
                max_retries: 1,
                ..DecisionConfig::default()
            },
        )
        .unwrap();
    let order = OrderFields {
        target: Some(b),
        ..OrderFields::new(OrderVerb::Defend)
    };
    world.send(a, SendRequest::order(b, order).with_ack(AckPolicy::Required)).unwrap();

    let mut built = 0;
    let mut retried = 0;
    let mut expired = 0;
    for tick in 0..20 {
        let stats = run_tick(&mut world, tick);
        built += stats.build.built;
        retried += stats.maintain.retried;
        expired += stats.maintain.expired;
        assert_eq!(stats.dispatch.delivered, 0, "vacuum carries no sound");
        if tick == 4 {
            assert_eq!(stats.maintain.retried, 1);
            assert_eq!(world.outbound(a).first().unwrap().retries_left, 0);
        }
    }
    assert_eq!(built, 2);
    assert_eq!(retried, 1);
    assert_eq!(expired, 1);
    assert!(world.outbound(a).is_empty());
}

#[test]
fn retries_keep_the_original_id() {
    let mut world = CommsWorld::new();
    let a = agent(&mut world, endpoint(&[Channel::Hearing], 1.0), &native(1));
    let b = agent(&mut world, endpoint(&[Channel::Hearing], 1.0), &native(1));
    world.set_medium(b, Medium::Vacuum).unwrap();
    world
        .send(
            a,
            SendRequest::order(b, OrderFields::new(OrderVerb::Hold)).with_ack(AckPolicy::Required),
        )
        .unwrap();

    run_tick(&mut world, 0);
    let id = world.outbound(a).first().unwrap().message_id;
    for tick in 1..=4 {
        run_tick(&mut world, tick);
    }
    let resend = world.pending_sends(a).first().unwrap();
    assert_eq!(resend.message_id, Some(id));
    assert_eq!(resend.redundancy, 1);
}

// ---------------------------------------------------------------------------
// Determinism and gating
// ---------------------------------------------------------------------------

fn signs_world() -> (CommsWorld, Vec<EntityId>) {
    let mut world = CommsWorld::new();
    let agents: Vec<EntityId> = (0..8)
        .map(|i| agent(&mut world, endpoint(&TALK, 0.6), &native(i)))
        .collect();
    for (i, sender) in agents.iter().enumerate() {
        for receiver in agents.iter().skip(i + 1) {
            let request = SendRequest::order(*receiver, OrderFields::new(OrderVerb::Gather))
                .with_intent(Intent::Greeting);
            world.send(*sender, request).unwrap();
        }
    }
    (world, agents)
}

#[test]
fn identical_worlds_make_identical_decisions() {
    let (mut left, _) = signs_world();
    let (mut right, _) = signs_world();
    run_tick(&mut left, 7);
    run_tick(&mut right, 7);
    let l = left.drain_decisions();
    let r = right.drain_decisions();
    assert!(!l.is_empty());
    assert_eq!(l, r);
}

#[test]
fn scores_stay_in_unit_range() {
    let (mut world, agents) = signs_world();
    ensure_endpoints(&mut world);
    build_attempts(&mut world, PipelineGate::open(), 0);
    for agent in &agents {
        for attempt in world.attempts(*agent) {
            assert!((0.0..=1.0).contains(&attempt.clarity));
            assert_eq!(attempt.method, CommMethod::GeneralSigns);
        }
    }
    dispatch_attempts(&mut world, PipelineGate::open(), 0);
    for agent in &agents {
        for receipt in world.receipts(*agent) {
            assert!((0.0..=1.0).contains(&receipt.integrity));
        }
    }
    decode_receipts(&mut world, PipelineGate::open(), 0);
    for (_, decision) in world.drain_decisions() {
        assert!((0.0..=1.0).contains(&decision.confidence));
    }
}

#[test]
fn playback_and_pause_freeze_the_pipeline() {
    let mut world = CommsWorld::new();
    let a = agent(&mut world, endpoint(&TALK, 1.0), &native(1));
    let b = agent(&mut world, endpoint(&TALK, 1.0), &native(1));
    ensure_endpoints(&mut world);
    world.send(a, SendRequest::order(b, OrderFields::new(OrderVerb::Hold))).unwrap();

    for gate in [
        PipelineGate {
            mode: TimeMode::Replay,
            ..PipelineGate::open()
        },
        PipelineGate {
            paused: true,
            ..PipelineGate::open()
        },
        PipelineGate {
            enabled: false,
            ..PipelineGate::open()
        },
    ] {
        run_gated_tick(&mut world, gate, 0);
        assert_eq!(world.pending_sends(a).len(), 1);
        assert!(world.decisions(b).is_empty());
    }

    run_tick(&mut world, 0);
    assert_eq!(world.decisions(b).len(), 1);
}

#[test]
fn despawned_receiver_gets_nothing() {
    let mut world = CommsWorld::new();
    let a = agent(&mut world, endpoint(&TALK, 1.0), &native(1));
    let b = agent(&mut world, endpoint(&TALK, 1.0), &native(1));
    ensure_endpoints(&mut world);
    world.send(a, SendRequest::order(b, OrderFields::new(OrderVerb::Hold))).unwrap();
    build_attempts(&mut world, PipelineGate::open(), 0);
    world.despawn(b).unwrap();
    let stats = dispatch_attempts(&mut world, PipelineGate::open(), 0);
    assert_eq!(stats.dropped, 1);
    assert_eq!(stats.delivered, 0);
}

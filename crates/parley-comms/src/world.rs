//! The communication world: entity arena plus every component table the
//! pipeline reads or writes.
//!
//! Collaborators author entities through the methods here (spawn, attach
//! endpoints and ladders, queue sends) and drain decisions with
//! [`CommsWorld::take_decisions`]. Pipeline stages reach the tables
//! directly.

use parley_types::{
    Attempt, Attributes, Decision, DecodeFactors, Endpoint, EntityId, LanguageLadder, Medium,
    OutboundEntry, Receipt, SendRequest,
};

use crate::bookkeeping::ReceiverBook;
use crate::config::{DecisionConfig, VerbTable};
use crate::error::CommsError;
use crate::store::{ComponentStore, DenseStore, EntityArena};

/// Entity arena and component tables for the message pipeline.
#[derive(Debug, Clone, Default)]
pub struct CommsWorld {
    arena: EntityArena,

    // Collaborator inputs
    pub(crate) endpoints: DenseStore<Endpoint>,
    pub(crate) languages: DenseStore<LanguageLadder>,
    pub(crate) attributes: DenseStore<Attributes>,
    pub(crate) mediums: DenseStore<Medium>,
    pub(crate) decode_factors: DenseStore<DecodeFactors>,
    pub(crate) configs: DenseStore<DecisionConfig>,

    // Stage buffers
    pub(crate) send_queues: DenseStore<Vec<SendRequest>>,
    pub(crate) attempts: DenseStore<Vec<Attempt>>,
    pub(crate) receipts: DenseStore<Vec<Receipt>>,
    pub(crate) decisions: DenseStore<Vec<Decision>>,
    pub(crate) outbound: DenseStore<Vec<OutboundEntry>>,
    pub(crate) books: DenseStore<ReceiverBook>,

    default_config: DecisionConfig,
    verbs: VerbTable,
}

impl CommsWorld {
    /// An empty world with default thresholds and verb table.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty world with the given defaults.
    pub fn with_config(default_config: DecisionConfig, verbs: VerbTable) -> Result<Self, CommsError> {
        default_config.validate()?;
        Ok(Self {
            default_config,
            verbs,
            ..Self::default()
        })
    }

    // -----------------------------------------------------------------------
    // Entity lifecycle
    // -----------------------------------------------------------------------

    /// Allocate a new entity with no components.
    pub fn spawn(&mut self) -> Result<EntityId, CommsError> {
        self.arena.spawn()
    }

    /// Destroy `entity` and drop every component it owned.
    ///
    /// Messages already addressed to it are discarded when they reach a
    /// stage that checks liveness.
    pub fn despawn(&mut self, entity: EntityId) -> Result<(), CommsError> {
        self.arena.despawn(entity)?;
        self.endpoints.remove(entity);
        self.languages.remove(entity);
        self.attributes.remove(entity);
        self.mediums.remove(entity);
        self.decode_factors.remove(entity);
        self.configs.remove(entity);
        self.send_queues.remove(entity);
        self.attempts.remove(entity);
        self.receipts.remove(entity);
        self.decisions.remove(entity);
        self.outbound.remove(entity);
        self.books.remove(entity);
        Ok(())
    }

    /// Whether `entity` is a live handle.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.arena.is_alive(entity)
    }

    /// Live entities in ascending index order.
    pub fn entities(&self) -> Vec<EntityId> {
        self.arena.live()
    }

    /// Number of live entities.
    pub fn live_count(&self) -> usize {
        self.arena.live_count()
    }

    fn ensure_alive(&self, entity: EntityId) -> Result<(), CommsError> {
        if self.arena.is_alive(entity) {
            Ok(())
        } else {
            Err(CommsError::StaleEntity(entity))
        }
    }

    // -----------------------------------------------------------------------
    // Authoring
    // -----------------------------------------------------------------------

    /// Attach or replace the endpoint of `entity`.
    pub fn set_endpoint(&mut self, entity: EntityId, endpoint: Endpoint) -> Result<(), CommsError> {
        self.ensure_alive(entity)?;
        self.endpoints.insert(entity, endpoint);
        Ok(())
    }

    /// Attach or replace the language ladder of `entity`.
    pub fn set_languages(&mut self, entity: EntityId, ladder: LanguageLadder) -> Result<(), CommsError> {
        self.ensure_alive(entity)?;
        self.languages.insert(entity, ladder);
        Ok(())
    }

    /// Attach or replace the attributes of `entity`.
    pub fn set_attributes(&mut self, entity: EntityId, attributes: Attributes) -> Result<(), CommsError> {
        self.ensure_alive(entity)?;
        self.attributes.insert(entity, attributes);
        Ok(())
    }

    /// Set the medium `entity` is immersed in.
    pub fn set_medium(&mut self, entity: EntityId, medium: Medium) -> Result<(), CommsError> {
        self.ensure_alive(entity)?;
        self.mediums.insert(entity, medium);
        Ok(())
    }

    /// Attach or replace the decode factors of `entity`.
    pub fn set_decode_factors(&mut self, entity: EntityId, factors: DecodeFactors) -> Result<(), CommsError> {
        self.ensure_alive(entity)?;
        self.decode_factors.insert(entity, factors);
        Ok(())
    }

    /// Override the decision thresholds of `entity`.
    pub fn set_decision_config(&mut self, entity: EntityId, config: DecisionConfig) -> Result<(), CommsError> {
        self.ensure_alive(entity)?;
        config.validate()?;
        self.configs.insert(entity, config);
        Ok(())
    }

    /// Replace the thresholds used by entities without an override.
    pub fn set_default_config(&mut self, config: DecisionConfig) -> Result<(), CommsError> {
        config.validate()?;
        self.default_config = config;
        Ok(())
    }

    /// Replace the verb table.
    pub fn set_verb_table(&mut self, verbs: VerbTable) {
        self.verbs = verbs;
    }

    /// Queue a message from `sender` for the next attempt build.
    pub fn send(&mut self, sender: EntityId, request: SendRequest) -> Result<(), CommsError> {
        self.ensure_alive(sender)?;
        if let Some(queue) = self.send_queues.get_mut(sender) {
            queue.push(request);
        } else {
            self.send_queues.insert(sender, vec![request]);
        }
        Ok(())
    }

    /// Drain every decision `receiver` has recorded.
    pub fn take_decisions(&mut self, receiver: EntityId) -> Vec<Decision> {
        self.decisions
            .get_mut(receiver)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Drain every decision in the world, in ascending receiver order.
    pub fn drain_decisions(&mut self) -> Vec<(EntityId, Decision)> {
        let mut drained = Vec::new();
        for receiver in self.decisions.entities() {
            drained.extend(self.take_decisions(receiver).into_iter().map(|d| (receiver, d)));
        }
        drained
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Endpoint of `entity`.
    pub fn endpoint(&self, entity: EntityId) -> Option<&Endpoint> {
        self.endpoints.get(entity)
    }

    /// Language ladder of `entity`.
    pub fn languages(&self, entity: EntityId) -> Option<&LanguageLadder> {
        self.languages.get(entity)
    }

    /// Medium of `entity`, gas when unset.
    pub fn medium(&self, entity: EntityId) -> Medium {
        self.mediums.get(entity).copied().unwrap_or_default()
    }

    /// Decode factors of `entity` with intelligence and wisdom taken from
    /// its attributes when present.
    pub fn decode_factors(&self, entity: EntityId) -> DecodeFactors {
        let mut factors = self.decode_factors.get(entity).copied().unwrap_or_default();
        if let Some(attributes) = self.attributes.get(entity) {
            factors.intelligence = attributes.intelligence;
            factors.wisdom = attributes.wisdom;
        }
        factors
    }

    /// Thresholds in effect for `entity`.
    pub fn config(&self, entity: EntityId) -> &DecisionConfig {
        self.configs.get(entity).unwrap_or(&self.default_config)
    }

    /// Thresholds used by entities without an override.
    pub const fn default_config(&self) -> &DecisionConfig {
        &self.default_config
    }

    /// The verb table.
    pub const fn verb_table(&self) -> &VerbTable {
        &self.verbs
    }

    /// Requests queued on `sender` and not yet built.
    pub fn pending_sends(&self, sender: EntityId) -> &[SendRequest] {
        self.send_queues.get(sender).map_or(&[], Vec::as_slice)
    }

    /// Attempts queued on `sender` and not yet dispatched.
    pub fn attempts(&self, sender: EntityId) -> &[Attempt] {
        self.attempts.get(sender).map_or(&[], Vec::as_slice)
    }

    /// Receipts delivered to `receiver` and not yet decoded.
    pub fn receipts(&self, receiver: EntityId) -> &[Receipt] {
        self.receipts.get(receiver).map_or(&[], Vec::as_slice)
    }

    /// Decisions recorded by `receiver` and not yet drained.
    pub fn decisions(&self, receiver: EntityId) -> &[Decision] {
        self.decisions.get(receiver).map_or(&[], Vec::as_slice)
    }

    /// Messages `sender` is waiting to have acknowledged.
    pub fn outbound(&self, sender: EntityId) -> &[OutboundEntry] {
        self.outbound.get(sender).map_or(&[], Vec::as_slice)
    }

    /// Whether `entity` can receive messages.
    pub fn has_receipt_queue(&self, entity: EntityId) -> bool {
        self.receipts.has(entity)
    }

    /// Decoder bookkeeping of `receiver`.
    pub fn book(&self, receiver: EntityId) -> Option<&ReceiverBook> {
        self.books.get(receiver)
    }

    /// Number of messages awaiting acknowledgement across the world.
    pub fn outbound_total(&self) -> usize {
        self.outbound.iter().map(|(_, entries)| entries.len()).sum()
    }

    /// Number of requests queued across the world.
    pub fn pending_send_total(&self) -> usize {
        self.send_queues.iter().map(|(_, queue)| queue.len()).sum()
    }
}

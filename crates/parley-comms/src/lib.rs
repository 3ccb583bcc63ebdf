//! Semantic message pipeline for the Parley simulation.
//!
//! Messages travel through four stages, run once per tick in this order:
//!
//! 1. [`attempt::build_attempts`] resolves queued send requests into
//!    attempts (method, clarity, intent, channel, identity).
//! 2. [`dispatch::dispatch_attempts`] carries attempts over the shared,
//!    medium-filtered channels and delivers receipts.
//! 3. [`decode::decode_receipts`] deduplicates receipts and decides whether
//!    to accept, clarify, act safely, or ignore.
//! 4. [`outbound::maintain_outbound`] retries or retires messages still
//!    waiting for acknowledgement.
//!
//! [`registry::ensure_endpoints`] binds buffers to new endpoints before the
//! stages run. All state lives in a [`CommsWorld`]; cross-entity writes go
//! through a [`journal::CommandJournal`] applied at each stage's sync point.
//!
//! # Modules
//!
//! - [`world`] -- Entity arena, component tables, authoring API
//! - [`store`] -- Generational component storage
//! - [`config`] -- Decision thresholds and the verb table
//! - [`gate`] -- Feature flag, pause, and time mode
//! - [`language`] -- Method and clarity from language ladders
//! - [`assess`] -- Confidence, risk, and inference arithmetic
//! - [`hashing`] -- Deterministic message ids and misread seeds
//! - [`bookkeeping`] -- Duplicate ring, clarify counters, clarify budget
//! - [`journal`] -- Deferred cross-entity writes

pub mod assess;
pub mod attempt;
pub mod bookkeeping;
pub mod config;
pub mod decode;
pub mod dispatch;
pub mod error;
pub mod gate;
pub mod hashing;
pub mod journal;
pub mod language;
pub mod outbound;
pub mod registry;
pub mod store;
pub mod world;

pub use attempt::{BuildStats, build_attempts};
pub use config::{DecisionConfig, MAX_REDUNDANCY, VerbProfile, VerbTable};
pub use decode::{DecodeStats, decode_receipts};
pub use dispatch::{DispatchStats, dispatch_attempts};
pub use error::CommsError;
pub use gate::{PipelineGate, TimeMode};
pub use outbound::{MaintainStats, maintain_outbound};
pub use registry::ensure_endpoints;
pub use store::{ComponentStore, DenseStore, EntityArena};
pub use world::CommsWorld;

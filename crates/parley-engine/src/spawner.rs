//! Demo population for a drill run.
//!
//! The spawner creates `squads` squads of `squad_size` entities. Each squad
//! has a home language; its commander speaks it natively and most members
//! do too, while the rest are natives of another language who learned the
//! home language to some level. Endpoints, attributes, decode factors, and
//! the occasional submerged member are drawn from a seeded RNG so a given
//! seed always produces the same population.

use parley_comms::CommsWorld;
use parley_core::config::PopulationConfig;
use parley_types::{
    Attributes, Channel, ChannelMask, DecodeFactors, Endpoint, EntityId, LanguageEntry, LanguageId,
    LanguageLadder, Medium, ProficiencyLevel,
};
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::error::EngineError;

/// Chance that a member is a native of a language other than the squad's.
const FOREIGN_MEMBER_CHANCE: f64 = 0.25;

/// Chance that a member is underwater and loses radio.
const SUBMERGED_CHANCE: f64 = 0.1;

/// Levels a foreign member may hold in the squad's language.
const LEARNED_LEVELS: [ProficiencyLevel; 4] = [
    ProficiencyLevel::Rudimentary,
    ProficiencyLevel::Basic,
    ProficiencyLevel::Conversational,
    ProficiencyLevel::Fluent,
];

/// One squad: a commander and the members it gives orders to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Squad {
    /// Home language of the squad.
    pub language: LanguageId,
    /// The entity issuing orders.
    pub commander: EntityId,
    /// Everyone else in the squad.
    pub members: Vec<EntityId>,
}

/// Every squad spawned for the run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    /// Squads in spawn order.
    pub squads: Vec<Squad>,
}

impl Roster {
    /// Total entities across all squads.
    pub fn population(&self) -> usize {
        self.squads
            .iter()
            .map(|s| s.members.len().saturating_add(1))
            .sum()
    }
}

/// Spawn the demo population into `world`.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] if the parameters describe an empty
/// population, or [`EngineError::World`] if authoring fails.
pub fn spawn_population(
    config: &PopulationConfig,
    seed: u64,
    world: &mut CommsWorld,
) -> Result<Roster, EngineError> {
    if config.squad_size == 0 {
        return Err(EngineError::Spawner {
            message: String::from("squad_size must be at least 1"),
        });
    }
    if config.languages == 0 {
        return Err(EngineError::Spawner {
            message: String::from("at least one language must be configured"),
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut roster = Roster::default();

    for squad_index in 0..config.squads {
        let language = home_language(squad_index, config.languages);
        let commander = spawn_member(world, &mut rng, config, language, true)?;
        let mut members = Vec::new();
        for _ in 1..config.squad_size {
            members.push(spawn_member(world, &mut rng, config, language, false)?);
        }
        roster.squads.push(Squad {
            language,
            commander,
            members,
        });
    }

    info!(
        squads = roster.squads.len(),
        population = roster.population(),
        languages = config.languages,
        "Population spawned"
    );
    Ok(roster)
}

fn home_language(squad_index: u32, languages: u16) -> LanguageId {
    let slot = squad_index.checked_rem(u32::from(languages)).unwrap_or(0);
    LanguageId(u16::try_from(slot).unwrap_or(0))
}

fn spawn_member(
    world: &mut CommsWorld,
    rng: &mut ChaCha8Rng,
    config: &PopulationConfig,
    language: LanguageId,
    commander: bool,
) -> Result<EntityId, EngineError> {
    let entity = world.spawn()?;

    let mut channels = vec![Channel::Vision, Channel::Hearing, Channel::Proximity];
    if commander || rng.random_bool(0.5) {
        channels.push(Channel::Em);
    }
    let noise_ceiling = config.max_noise_floor.clamp(0.0, 1.0);
    world.set_endpoint(
        entity,
        Endpoint {
            channels: ChannelMask::from_channels(&channels),
            base_clarity: rng.random_range(0.7..=1.0),
            noise_floor: rng.random_range(0.0..=noise_ceiling),
        },
    )?;

    world.set_languages(entity, ladder(rng, config.languages, language, commander))?;

    let attributes = Attributes {
        intelligence: rng.random_range(0.2..=1.0),
        wisdom: rng.random_range(0.2..=1.0),
    };
    world.set_attributes(entity, attributes)?;
    world.set_decode_factors(
        entity,
        DecodeFactors {
            cohesion: rng.random_range(0.7..=1.0),
            protocol_familiarity: rng.random_range(0.7..=1.0),
            context_fit: rng.random_range(0.5..=1.0),
            ..DecodeFactors::default()
        },
    )?;

    if !commander && rng.random_bool(SUBMERGED_CHANCE) {
        world.set_medium(entity, Medium::Liquid)?;
    }
    Ok(entity)
}

fn ladder(rng: &mut ChaCha8Rng, languages: u16, home: LanguageId, commander: bool) -> LanguageLadder {
    let foreign = !commander && languages > 1 && rng.random_bool(FOREIGN_MEMBER_CHANCE);
    if !foreign {
        return LanguageLadder::new(vec![LanguageEntry {
            language: home,
            level: ProficiencyLevel::Mastery,
            native: true,
        }]);
    }

    let offset = rng.random_range(1..languages);
    let native = LanguageId(
        home.0
            .checked_add(offset)
            .and_then(|l| l.checked_rem(languages))
            .unwrap_or(0),
    );
    let learned = LEARNED_LEVELS
        .choose(rng)
        .copied()
        .unwrap_or(ProficiencyLevel::Basic);
    LanguageLadder::new(vec![
        LanguageEntry {
            language: native,
            level: ProficiencyLevel::Mastery,
            native: true,
        },
        LanguageEntry {
            language: home,
            level: learned,
            native: false,
        },
    ])
}

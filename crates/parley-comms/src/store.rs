//! Arena-indexed component storage.
//!
//! Entities are generational handles into an [`EntityArena`]. Components
//! live in [`DenseStore`]s indexed by the handle's slot, so lookups are a
//! bounds check plus a generation compare. Iteration always walks slots in
//! ascending index order.

use parley_types::EntityId;

use crate::error::CommsError;

// ---------------------------------------------------------------------------
// Component stores
// ---------------------------------------------------------------------------

/// Minimal interface every component table provides.
pub trait ComponentStore<T> {
    /// Whether `entity` has a component in this store.
    fn has(&self, entity: EntityId) -> bool;

    /// Borrow the component of `entity`.
    fn get(&self, entity: EntityId) -> Option<&T>;

    /// Mutably borrow the component of `entity`.
    fn get_mut(&mut self, entity: EntityId) -> Option<&mut T>;

    /// Attach or replace the component of `entity`, returning the old value.
    fn insert(&mut self, entity: EntityId, value: T) -> Option<T>;

    /// Detach the component of `entity`.
    fn remove(&mut self, entity: EntityId) -> Option<T>;
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: T,
}

/// Vector-backed store with one optional slot per entity index.
#[derive(Debug, Clone)]
pub struct DenseStore<T> {
    slots: Vec<Option<Slot<T>>>,
}

impl<T> Default for DenseStore<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> DenseStore<T> {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Number of attached components.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Whether no component is attached.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Entities with a component, in ascending index order.
    pub fn entities(&self) -> Vec<EntityId> {
        self.iter().map(|(entity, _)| entity).collect()
    }

    /// Iterate `(entity, component)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let slot = slot.as_ref()?;
            let index = u32::try_from(index).ok()?;
            Some((EntityId::new(index, slot.generation), &slot.value))
        })
    }

    fn slot(&self, entity: EntityId) -> Option<&Slot<T>> {
        self.slots
            .get(entity.slot())?
            .as_ref()
            .filter(|s| s.generation == entity.generation)
    }

    fn slot_mut(&mut self, entity: EntityId) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(entity.slot())?
            .as_mut()
            .filter(|s| s.generation == entity.generation)
    }
}

impl<T> ComponentStore<T> for DenseStore<T> {
    fn has(&self, entity: EntityId) -> bool {
        self.slot(entity).is_some()
    }

    fn get(&self, entity: EntityId) -> Option<&T> {
        self.slot(entity).map(|s| &s.value)
    }

    fn get_mut(&mut self, entity: EntityId) -> Option<&mut T> {
        self.slot_mut(entity).map(|s| &mut s.value)
    }

    fn insert(&mut self, entity: EntityId, value: T) -> Option<T> {
        let index = entity.slot();
        if index >= self.slots.len() {
            self.slots.resize_with(index.saturating_add(1), || None);
        }
        let cell = self.slots.get_mut(index)?;
        let previous = cell.take().filter(|s| s.generation == entity.generation);
        *cell = Some(Slot {
            generation: entity.generation,
            value,
        });
        previous.map(|s| s.value)
    }

    fn remove(&mut self, entity: EntityId) -> Option<T> {
        let cell = self.slots.get_mut(entity.slot())?;
        if cell.as_ref().is_some_and(|s| s.generation == entity.generation) {
            cell.take().map(|s| s.value)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Entity arena
// ---------------------------------------------------------------------------

/// Allocates generational entity handles and recycles freed slots.
#[derive(Debug, Clone, Default)]
pub struct EntityArena {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
}

impl EntityArena {
    /// Create an empty arena.
    pub const fn new() -> Self {
        Self {
            generations: Vec::new(),
            alive: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Allocate a handle, reusing the most recently freed slot if any.
    pub fn spawn(&mut self) -> Result<EntityId, CommsError> {
        if let Some(index) = self.free.pop() {
            let slot = usize::try_from(index).unwrap_or(usize::MAX);
            if let (Some(generation), Some(alive)) =
                (self.generations.get(slot).copied(), self.alive.get_mut(slot))
            {
                *alive = true;
                return Ok(EntityId::new(index, generation));
            }
        }

        let len = self.generations.len();
        let index = u32::try_from(len).map_err(|_overflow| CommsError::ArenaExhausted { capacity: len })?;
        self.generations.push(0);
        self.alive.push(true);
        Ok(EntityId::new(index, 0))
    }

    /// Free the slot of `entity`; the handle becomes stale.
    pub fn despawn(&mut self, entity: EntityId) -> Result<(), CommsError> {
        if !self.is_alive(entity) {
            return Err(CommsError::StaleEntity(entity));
        }
        let slot = entity.slot();
        if let (Some(generation), Some(alive)) =
            (self.generations.get_mut(slot), self.alive.get_mut(slot))
        {
            *generation = generation.wrapping_add(1);
            *alive = false;
            self.free.push(entity.index);
        }
        Ok(())
    }

    /// Whether `entity` refers to a live slot of the matching generation.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        let slot = entity.slot();
        self.alive.get(slot).copied().unwrap_or(false)
            && self.generations.get(slot).copied() == Some(entity.generation)
    }

    /// Number of live entities.
    pub fn live_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    /// Live entities in ascending index order.
    pub fn live(&self) -> Vec<EntityId> {
        self.alive
            .iter()
            .zip(&self.generations)
            .enumerate()
            .filter(|(_, (alive, _))| **alive)
            .filter_map(|(index, (_, generation))| {
                u32::try_from(index)
                    .ok()
                    .map(|index| EntityId::new(index, *generation))
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn insert_get_remove() {
        let mut store = DenseStore::new();
        let e = EntityId::new(3, 0);
        assert!(!store.has(e));
        assert!(store.insert(e, 7_u32).is_none());
        assert_eq!(store.get(e), Some(&7));
        if let Some(v) = store.get_mut(e) {
            *v = 9;
        }
        assert_eq!(store.remove(e), Some(9));
        assert!(store.is_empty());
    }

    #[test]
    fn stale_generation_is_invisible() {
        let mut store = DenseStore::new();
        store.insert(EntityId::new(0, 1), "new");
        assert!(!store.has(EntityId::new(0, 0)));
        assert!(store.remove(EntityId::new(0, 0)).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn iteration_is_in_index_order() {
        let mut store = DenseStore::new();
        store.insert(EntityId::new(5, 0), 'c');
        store.insert(EntityId::new(1, 0), 'a');
        store.insert(EntityId::new(2, 0), 'b');
        let order: Vec<char> = store.iter().map(|(_, v)| *v).collect();
        assert_eq!(order, vec!['a', 'b', 'c']);
        assert_eq!(store.entities().first(), Some(&EntityId::new(1, 0)));
    }

    #[test]
    fn arena_recycles_with_new_generation() {
        let mut arena = EntityArena::new();
        let a = arena.spawn().unwrap();
        let b = arena.spawn().unwrap();
        arena.despawn(a).unwrap();
        assert!(!arena.is_alive(a));
        let c = arena.spawn().unwrap();
        assert_eq!(c.index, a.index);
        assert_eq!(c.generation, a.generation.wrapping_add(1));
        assert!(arena.is_alive(b));
        assert!(arena.is_alive(c));
        assert_eq!(arena.live(), vec![c, b]);
    }

    #[test]
    fn double_despawn_is_stale() {
        let mut arena = EntityArena::new();
        let a = arena.spawn().unwrap();
        arena.despawn(a).unwrap();
        assert!(matches!(arena.despawn(a), Err(CommsError::StaleEntity(_))));
        assert_eq!(arena.live_count(), 0);
    }
}

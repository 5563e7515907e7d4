//! The ordered set of entities in a scene.

use tracing::{debug, warn};

use crate::command::CommandBuffer;
use crate::deferred::{DeferredList, LifecycleState, ListHooks, Removal};
use crate::entity::{Entity, EntityAllocator, EntityId};
use crate::event::EventQueue;
use crate::scene::SceneId;
use crate::time::FrameTime;
use crate::EcsError;

/// Entities of one scene, with deferred spawn and destroy.
#[derive(Debug, Default)]
pub struct EntityList {
    entities: DeferredList<Entity>,
}

impl EntityList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `entity` to join at the next update.
    pub(crate) fn add(&mut self, entity: Entity) -> Result<EntityId, EcsError> {
        self.entities.add(entity)
    }

    /// Queue removal, or cancel a spawn that has not joined yet.
    pub(crate) fn remove(&mut self, id: EntityId) -> Result<Removal<Entity>, EcsError> {
        self.entities.remove(id)
    }

    /// Flush queued spawns and removals, then update every live entity.
    pub(crate) fn update(&mut self, hooks: &mut EntityHooks<'_>) {
        self.entities.update(hooks);
    }

    /// Remove every live entity through the hooks and drop queued ones.
    pub(crate) fn clear(&mut self, hooks: &mut EntityHooks<'_>) {
        self.entities.clear(hooks);
    }

    /// Live or queued entity with `id`.
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Mutable access to a live or queued entity.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Where `id` is in its lifecycle. Unknown ids are `Detached`.
    pub fn state(&self, id: EntityId) -> LifecycleState {
        self.entities.state(id)
    }

    /// Live entities in spawn order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.entities.iter()
    }

    /// Mutable iteration over live entities in spawn order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entity> {
        self.entities.iter_mut()
    }

    /// Live entities followed by those waiting to be added.
    pub fn iter_with_pending(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter_with_pending()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when no entity is live; queued spawns do not count.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Spawns waiting for the next update.
    pub fn pending_add_count(&self) -> usize {
        self.entities.pending_add_count()
    }

    /// Destructions waiting for the next update.
    pub fn pending_remove_count(&self) -> usize {
        self.entities.pending_remove_count()
    }
}

/// Scene state threaded through the entity list's lifecycle hooks.
pub(crate) struct EntityHooks<'a> {
    pub scene: SceneId,
    pub allocator: &'a mut EntityAllocator,
    pub time: FrameTime,
    pub commands: &'a mut CommandBuffer,
    pub events: &'a mut EventQueue,
}

impl ListHooks<Entity> for EntityHooks<'_> {
    fn on_added(&mut self, entity: &mut Entity) {
        entity.set_scene(Some(self.scene));
        if let Err(err) = self.allocator.join(entity.id()) {
            warn!(entity = %entity.id(), error = %err, "entity joined without a reserved id");
        }
        debug!(entity = %entity.id(), name = %entity.name, "entity added");
    }

    fn on_removed(&mut self, entity: &mut Entity) {
        entity.remove_all_components(self.time, self.commands, self.events);
        entity.set_scene(None);
        if let Err(err) = self.allocator.release(entity.id()) {
            warn!(entity = %entity.id(), error = %err, "entity id released twice");
        }
        debug!(entity = %entity.id(), name = %entity.name, "entity removed");
    }

    fn update(&mut self, entity: &mut Entity) {
        entity.update(self.time, self.commands, self.events);
    }
}

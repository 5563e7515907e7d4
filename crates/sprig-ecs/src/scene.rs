//! Scenes: the unit the engine updates and draws.
//!
//! A [`Scene`] owns an [`EntityList`], the allocator that hands out entity
//! ids, the [`CommandBuffer`] components write to during the update pass,
//! and the [`EventQueue`] they emit into.
//!
//! One call to [`Scene::update`]:
//!
//! 1. flushes queued entity spawns/destroys (components of destroyed
//!    entities get `on_removed`), then awakens new entities' components;
//! 2. updates every live, active, unpaused entity in spawn order;
//! 3. applies the command buffer, which queues the requested changes for
//!    the next update.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::command::{ApplyReport, CommandBuffer};
use crate::component::{Component, ComponentId, ComponentKind};
use crate::deferred::{LifecycleState, Removal};
use crate::draw::RenderSink;
use crate::entity::{Entity, EntityAllocator, EntityBuilder, EntityId};
use crate::entity_list::{EntityHooks, EntityList};
use crate::event::{EventQueue, GameEvent};
use crate::time::FrameTime;
use crate::EcsError;

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(0);

/// Process-unique scene identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneId(pub u32);

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scene#{}", self.0)
    }
}

/// A collection of entities updated and drawn together.
pub struct Scene {
    id: SceneId,
    name: String,
    entities: EntityList,
    allocator: EntityAllocator,
    commands: CommandBuffer,
    events: EventQueue,
    time: FrameTime,
    last_apply_report: ApplyReport,
    /// Default for components that have no debug-draw override.
    pub debug_draw: bool,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        let id = SceneId(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            id,
            name: name.into(),
            entities: EntityList::new(),
            allocator: EntityAllocator::new(id),
            commands: CommandBuffer::new(),
            events: EventQueue::new(),
            time: FrameTime::default(),
            last_apply_report: ApplyReport::default(),
            debug_draw: false,
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Timing of the most recent update.
    pub fn time(&self) -> FrameTime {
        self.time
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Create an entity from `builder`. It is queued and joins the scene at
    /// the next update.
    pub fn spawn(&mut self, builder: EntityBuilder) -> Result<EntityId, EcsError> {
        let id = self.allocator.reserve();
        let added = builder.build(id).and_then(|entity| self.entities.add(entity));
        if added.is_err() {
            self.release_id(id);
        }
        added
    }

    /// Queue `id` for destruction at the next update.
    ///
    /// Destroying an entity that has not joined yet cancels its spawn
    /// immediately. Fails with [`EcsError::StaleEntity`] for dead ids and
    /// [`EcsError::NotFound`] if destruction is already queued.
    pub fn destroy(&mut self, id: EntityId) -> Result<(), EcsError> {
        if !self.allocator.is_alive(id) {
            return Err(EcsError::StaleEntity { entity: id });
        }
        if let Removal::Cancelled(entity) = self.entities.remove(id)? {
            debug!(entity = %id, name = %entity.name, "entity spawn cancelled");
            self.release_id(id);
        }
        Ok(())
    }

    /// Spawn a copy of `id`: same name, tags, flags and transform, plus
    /// fresh copies of every component that supports cloning.
    pub fn clone_entity(&mut self, id: EntityId) -> Result<EntityId, EcsError> {
        let builder = self.entity_or_err(id)?.to_builder();
        self.spawn(builder)
    }

    pub fn state(&self, id: EntityId) -> LifecycleState {
        self.entities.state(id)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.allocator.is_alive(id)
    }

    // -- lookup -------------------------------------------------------------

    /// Live or queued entity with `id`.
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub fn entities(&self) -> &EntityList {
        &self.entities
    }

    /// First entity (live, then queued) called `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&Entity> {
        self.entities.iter_with_pending().find(|e| e.name == name)
    }

    /// Every entity (live, then queued) carrying `tag`.
    pub fn find_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities.iter_with_pending().filter(move |e| e.has_tag(tag))
    }

    // -- components ---------------------------------------------------------

    pub fn add_component<C: Component>(
        &mut self,
        entity: EntityId,
        component: C,
    ) -> Result<ComponentId, EcsError> {
        self.entity_mut_or_err(entity)?.add_component(component)
    }

    pub fn add_boxed_component(
        &mut self,
        entity: EntityId,
        kind: ComponentKind,
        component: Box<dyn Component>,
    ) -> Result<ComponentId, EcsError> {
        self.entity_mut_or_err(entity)?
            .components_mut()
            .add_boxed(kind, component)
    }

    pub fn remove_component(&mut self, entity: EntityId, component: ComponentId) -> Result<(), EcsError> {
        self.entity_mut_or_err(entity)?.remove_component(component)
    }

    // -- frame --------------------------------------------------------------

    /// Run one frame of the scene. See the module docs for the order.
    pub fn update(&mut self, time: FrameTime) {
        self.time = time;
        let mut hooks = EntityHooks {
            scene: self.id,
            allocator: &mut self.allocator,
            time,
            commands: &mut self.commands,
            events: &mut self.events,
        };
        self.entities.update(&mut hooks);

        let mut commands = std::mem::take(&mut self.commands);
        self.last_apply_report = commands.apply(self);
    }

    /// Draw every live visible entity, lowest layer depth first. Entities on
    /// the same depth keep spawn order.
    pub fn draw(&self, sink: &mut dyn RenderSink) {
        let mut ordered: Vec<&Entity> = self.entities.iter().collect();
        ordered.sort_by(|a, b| a.layer_depth.total_cmp(&b.layer_depth));
        for entity in ordered {
            entity.draw(self.time, sink, self.debug_draw);
        }
    }

    /// Destroy every entity right away, firing `on_removed` on all live
    /// components. Used when the scene is unloaded.
    pub fn unload(&mut self) {
        let queued: Vec<EntityId> = self
            .entities
            .iter_with_pending()
            .skip(self.entities.len())
            .map(Entity::id)
            .collect();
        for id in queued {
            self.release_id(id);
        }

        let mut hooks = EntityHooks {
            scene: self.id,
            allocator: &mut self.allocator,
            time: self.time,
            commands: &mut self.commands,
            events: &mut self.events,
        };
        self.entities.clear(&mut hooks);
        self.commands.clear();
        debug!(scene = self.id.0, name = %self.name, "scene unloaded");
    }

    // -- commands and events ------------------------------------------------

    /// Buffer for changes requested from outside a component.
    pub fn commands_mut(&mut self) -> &mut CommandBuffer {
        &mut self.commands
    }

    pub fn last_apply_report(&self) -> &ApplyReport {
        &self.last_apply_report
    }

    pub fn events(&self) -> &EventQueue {
        &self.events
    }

    /// Take every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    fn release_id(&mut self, id: EntityId) {
        if let Err(err) = self.allocator.release(id) {
            warn!(entity = %id, error = %err, "entity id released twice");
        }
    }

    pub(crate) fn entity_or_err(&self, id: EntityId) -> Result<&Entity, EcsError> {
        self.entities
            .get(id)
            .ok_or(EcsError::StaleEntity { entity: id })
    }

    pub(crate) fn entity_mut_or_err(&mut self, id: EntityId) -> Result<&mut Entity, EcsError> {
        self.entities
            .get_mut(id)
            .ok_or(EcsError::StaleEntity { entity: id })
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("entities", &self.entities.len())
            .field("pending_commands", &self.commands.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

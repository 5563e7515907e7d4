//! Entity identifiers, allocation, and the entity itself.
//!
//! An [`EntityId`] names a slot in one scene's [`EntityAllocator`] together
//! with the slot's generation. The generation is bumped every time a slot
//! is recycled, so a handle to a destroyed entity is detected as stale
//! instead of silently aliasing its successor.
//!
//! An [`Entity`] is a named, tagged container for a [`Transform`] and an
//! ordered [`ComponentList`]. Entities are built with [`EntityBuilder`] and
//! handed to a [`Scene`](crate::scene::Scene), which assigns the id.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::command::CommandBuffer;
use crate::component::{Component, ComponentId, ComponentKind, ComponentList, DrawContext, Owner};
use crate::deferred::ListItem;
use crate::draw::RenderSink;
use crate::event::EventQueue;
use crate::scene::SceneId;
use crate::time::FrameTime;
use crate::transform::Transform;
use crate::EcsError;

// ---------------------------------------------------------------------------
// EntityId
// ---------------------------------------------------------------------------

/// Handle to an entity of one particular scene.
///
/// Besides the slot index it records the slot's generation and the owning
/// scene, so a handle outlives neither its entity nor its scene: once the
/// slot is recycled, or when the handle is presented to another scene, it
/// is reported as [`EcsError::StaleEntity`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId {
    scene: SceneId,
    index: u32,
    generation: u32,
}

impl EntityId {
    pub fn new(scene: SceneId, index: u32, generation: u32) -> Self {
        Self {
            scene,
            index,
            generation,
        }
    }

    /// Scene that issued this id.
    pub fn scene(self) -> SceneId {
        self.scene
    }

    pub fn index(self) -> u32 {
        self.index
    }

    /// How many times the slot had been recycled when this id was issued.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({self})")
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}v{}", self.scene, self.index, self.generation)
    }
}

// ---------------------------------------------------------------------------
// EntityAllocator
// ---------------------------------------------------------------------------

/// Where an allocator slot is in the entity lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Free,
    /// Id handed out; the spawn is still queued.
    Reserved,
    /// The entity has joined the scene.
    Joined,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    generation: u32,
    state: SlotState,
}

/// Id table of one scene.
///
/// An id is reserved when a spawn is queued, marked joined when the entity
/// list admits the entity, and released when the entity is removed or its
/// spawn is cancelled. Releasing bumps the slot's generation. Freed slots
/// are reused oldest first.
#[derive(Debug)]
pub struct EntityAllocator {
    scene: SceneId,
    slots: Vec<Slot>,
    free: VecDeque<u32>,
}

impl EntityAllocator {
    pub fn new(scene: SceneId) -> Self {
        Self {
            scene,
            slots: Vec::new(),
            free: VecDeque::new(),
        }
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    /// Hand out an id for an entity whose spawn is being queued.
    pub fn reserve(&mut self) -> EntityId {
        let index = match self.free.pop_front() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    state: SlotState::Free,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.state = SlotState::Reserved;
        EntityId::new(self.scene, index, slot.generation)
    }

    /// Record that the entity behind a reserved `id` has joined the scene.
    pub fn join(&mut self, id: EntityId) -> Result<(), EcsError> {
        let slot = self.slot_mut(id)?;
        if slot.state != SlotState::Reserved {
            return Err(EcsError::StaleEntity { entity: id });
        }
        slot.state = SlotState::Joined;
        Ok(())
    }

    /// Free `id`'s slot. Every copy of `id` is stale afterwards.
    pub fn release(&mut self, id: EntityId) -> Result<(), EcsError> {
        let slot = self.slot_mut(id)?;
        slot.state = SlotState::Free;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push_back(id.index);
        Ok(())
    }

    /// `id` was issued by this scene and its entity is queued or joined.
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.slot(id).is_some()
    }

    /// `id`'s entity has joined the scene.
    pub fn has_joined(&self, id: EntityId) -> bool {
        self.slot(id).is_some_and(|s| s.state == SlotState::Joined)
    }

    pub fn alive_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state != SlotState::Free)
            .count()
    }

    fn slot(&self, id: EntityId) -> Option<&Slot> {
        if id.scene != self.scene {
            return None;
        }
        self.slots
            .get(id.index as usize)
            .filter(|s| s.state != SlotState::Free && s.generation == id.generation)
    }

    fn slot_mut(&mut self, id: EntityId) -> Result<&mut Slot, EcsError> {
        if id.scene != self.scene {
            return Err(EcsError::StaleEntity { entity: id });
        }
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.state != SlotState::Free && s.generation == id.generation)
            .ok_or(EcsError::StaleEntity { entity: id })
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// A game object: a transform plus an ordered list of components.
pub struct Entity {
    id: EntityId,
    pub name: String,
    tags: BTreeSet<String>,
    /// Inactive entities skip their update entirely.
    pub active: bool,
    /// Invisible entities are not drawn.
    pub visible: bool,
    /// Paused entities are drawn but not updated.
    pub paused: bool,
    /// Draw ordering only; lower values are drawn first.
    pub layer_depth: f32,
    pub transform: Transform,
    components: ComponentList,
    scene: Option<SceneId>,
}

impl Entity {
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The scene this entity was admitted to, once its add has been flushed.
    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    pub(crate) fn set_scene(&mut self, scene: Option<SceneId>) {
        self.scene = scene;
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Returns `false` if the tag was already present.
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    pub fn remove_tag(&mut self, tag: &str) -> Result<(), EcsError> {
        if self.tags.remove(tag) {
            Ok(())
        } else {
            Err(EcsError::NotFound {
                what: format!("tag '{tag}' on entity '{}'", self.name),
            })
        }
    }

    pub fn components(&self) -> &ComponentList {
        &self.components
    }

    pub fn components_mut(&mut self) -> &mut ComponentList {
        &mut self.components
    }

    /// Queue `component` for attachment at this entity's next update.
    pub fn add_component<C: Component>(&mut self, component: C) -> Result<ComponentId, EcsError> {
        self.components.add(component)
    }

    pub fn remove_component(&mut self, id: ComponentId) -> Result<(), EcsError> {
        self.components.remove(id)
    }

    pub fn get_component<C: Component>(&self) -> Option<&C> {
        self.components.get::<C>()
    }

    pub fn get_component_mut<C: Component>(&mut self) -> Option<&mut C> {
        self.components.get_mut::<C>()
    }

    /// Flush and update the component list. Skipped entirely while the
    /// entity is inactive or paused.
    pub fn update(&mut self, time: FrameTime, commands: &mut CommandBuffer, events: &mut EventQueue) {
        if !self.active || self.paused {
            return;
        }
        let mut owner = Owner {
            entity: self.id,
            name: &self.name,
            tags: &self.tags,
            transform: &mut self.transform,
            time,
            commands,
            events,
        };
        self.components.update(&mut owner);
    }

    /// Submit draw requests for every active component, in attachment order.
    pub fn draw(&self, time: FrameTime, sink: &mut dyn RenderSink, debug: bool) {
        if !self.visible {
            return;
        }
        let ctx = DrawContext {
            entity: self.id,
            transform: &self.transform,
            layer_depth: self.layer_depth,
            time,
        };
        self.components.draw(&ctx, sink, debug);
    }

    /// Detach every component immediately, firing `on_removed` on live ones.
    pub(crate) fn remove_all_components(
        &mut self,
        time: FrameTime,
        commands: &mut CommandBuffer,
        events: &mut EventQueue,
    ) {
        let mut owner = Owner {
            entity: self.id,
            name: &self.name,
            tags: &self.tags,
            transform: &mut self.transform,
            time,
            commands,
            events,
        };
        self.components.remove_all(&mut owner);
    }

    /// A builder carrying this entity's name, tags, flags, transform and
    /// copies of its cloneable components.
    pub(crate) fn to_builder(&self) -> EntityBuilder {
        EntityBuilder {
            name: self.name.clone(),
            tags: self.tags.clone(),
            active: self.active,
            visible: self.visible,
            paused: self.paused,
            layer_depth: self.layer_depth,
            transform: self.transform,
            components: self.components.clone_components(),
        }
    }
}

impl ListItem for Entity {
    type Key = EntityId;
    const LABEL: &'static str = "entity";

    fn key(&self) -> EntityId {
        self.id
    }

    fn describe(&self) -> String {
        format!("entity '{}' ({:?})", self.name, self.id)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("active", &self.active)
            .field("visible", &self.visible)
            .field("paused", &self.paused)
            .field("transform", &self.transform)
            .field("components", &self.components.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EntityBuilder
// ---------------------------------------------------------------------------

/// Describes an entity before a scene gives it an id.
///
/// ```
/// use sprig_ecs::prelude::*;
///
/// let mut scene = Scene::new("level");
/// let player = scene
///     .spawn(EntityBuilder::new("player").with_tag("hero").at(Vec2::new(4.0, 2.0)))
///     .unwrap();
/// scene.update(FrameTime::default());
///
/// let entity = scene.entity(player).unwrap();
/// assert!(entity.has_tag("hero"));
/// assert_eq!(entity.transform.position, Vec2::new(4.0, 2.0));
/// ```
pub struct EntityBuilder {
    name: String,
    tags: BTreeSet<String>,
    active: bool,
    visible: bool,
    paused: bool,
    layer_depth: f32,
    transform: Transform,
    components: Vec<(ComponentKind, Box<dyn Component>)>,
}

impl EntityBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeSet::new(),
            active: true,
            visible: true,
            paused: false,
            layer_depth: 0.0,
            transform: Transform::default(),
            components: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.transform.position = position;
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_layer_depth(mut self, depth: f32) -> Self {
        self.layer_depth = depth;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Components are attached in the order given, so dependencies must come
    /// before the components that require them.
    pub fn with_component<C: Component>(mut self, component: C) -> Self {
        self.components
            .push((ComponentKind::of::<C>(), Box::new(component)));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create the entity under `id`, queueing its components.
    pub fn build(self, id: EntityId) -> Result<Entity, EcsError> {
        let mut components = ComponentList::new();
        for (kind, component) in self.components {
            components.add_boxed(kind, component)?;
        }
        Ok(Entity {
            id,
            name: self.name,
            tags: self.tags,
            active: self.active,
            visible: self.visible,
            paused: self.paused,
            layer_depth: self.layer_depth,
            transform: self.transform,
            components,
            scene: None,
        })
    }
}

impl fmt::Debug for EntityBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityBuilder")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .field("components", &self.components.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Components, their per-call context, and the per-entity component list.
//!
//! A [`Component`] is a unit of behaviour attached to exactly one entity. The
//! entity owns it through a [`ComponentList`], which is a
//! [`DeferredList`](crate::deferred::DeferredList): components added or
//! removed during a frame take effect at the next update of their entity.
//!
//! Components never hold a reference to their entity. Every hook instead
//! receives a [`ComponentContext`] with the owning entity's id, name, tags
//! and transform, the frame time, and the scene's command buffer and event
//! queue. Structural changes requested from inside a hook go through the
//! command buffer.

use std::any::{Any, TypeId};
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::command::CommandBuffer;
use crate::deferred::{DeferredList, LifecycleState, ListHooks, ListItem, Removal};
use crate::draw::RenderSink;
use crate::entity::EntityId;
use crate::event::{EventQueue, GameEvent};
use crate::time::FrameTime;
use crate::transform::Transform;
use crate::EcsError;

// ---------------------------------------------------------------------------
// ComponentId / ComponentKind
// ---------------------------------------------------------------------------

/// Identifier of a component instance, unique within its entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentId(pub(crate) u32);

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({})", self.0)
    }
}

/// The Rust type of a component, with its name for diagnostics.
#[derive(Clone, Copy)]
pub struct ComponentKind {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentKind {
    pub fn of<C: Component>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without its module path.
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
}

impl PartialEq for ComponentKind {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ComponentKind {}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({})", self.short_name())
    }
}

// ---------------------------------------------------------------------------
// Component trait
// ---------------------------------------------------------------------------

/// Upcast helper so `dyn Component` can be downcast to its concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A behaviour attached to an entity.
///
/// All hooks have empty defaults. `on_added` fires when the component enters
/// the live list, `awake` once right after the flush that admitted it,
/// `update` every frame while the component and its entity are active, and
/// `on_removed` when it leaves (including when the entity is destroyed).
pub trait Component: AsAny {
    fn on_added(&mut self, _ctx: &mut ComponentContext<'_>) {}

    fn awake(&mut self, _ctx: &mut ComponentContext<'_>) {}

    fn update(&mut self, _ctx: &mut ComponentContext<'_>) {}

    fn on_removed(&mut self, _ctx: &mut ComponentContext<'_>) {}

    /// Submit draw requests for this frame.
    fn draw(&self, _ctx: &DrawContext<'_>, _sink: &mut dyn RenderSink) {}

    /// Extra visualisation drawn when debug drawing is on for this component.
    fn debug_draw(&self, _ctx: &DrawContext<'_>, _sink: &mut dyn RenderSink) {}

    /// Whether several instances of this type may sit on one entity.
    fn allows_multiple(&self) -> bool {
        false
    }

    fn can_be_removed(&self) -> bool {
        true
    }

    /// Component kinds that must already be attached before this one.
    fn requires(&self) -> Vec<ComponentKind> {
        Vec::new()
    }

    /// A fresh copy for [`Scene::clone_entity`](crate::scene::Scene::clone_entity).
    /// Components returning `None` are not carried over to clones.
    fn clone_component(&self) -> Option<Box<dyn Component>> {
        None
    }
}

// ---------------------------------------------------------------------------
// Contexts
// ---------------------------------------------------------------------------

/// What a component sees of the world during a lifecycle hook.
pub struct ComponentContext<'a> {
    pub entity: EntityId,
    pub component: ComponentId,
    pub entity_name: &'a str,
    pub tags: &'a BTreeSet<String>,
    pub transform: &'a mut Transform,
    pub time: FrameTime,
    pub commands: &'a mut CommandBuffer,
    pub events: &'a mut EventQueue,
}

impl ComponentContext<'_> {
    /// Seconds since the previous frame.
    pub fn delta(&self) -> f32 {
        self.time.delta
    }

    /// Push a game event attributed to the owning entity.
    pub fn emit(&mut self, event_type: &str, details: Vec<String>) {
        self.events.push(GameEvent {
            event_type: event_type.to_owned(),
            entity: self.entity,
            details,
            frame: self.time.frame,
        });
    }

    /// Queue removal of the component receiving this context.
    pub fn remove_self(&mut self) {
        self.commands.remove_component(self.entity, self.component);
    }

    /// Queue destruction of the owning entity.
    pub fn destroy_entity(&mut self) {
        self.commands.destroy_entity(self.entity);
    }
}

/// What a component sees while drawing.
#[derive(Debug, Clone, Copy)]
pub struct DrawContext<'a> {
    pub entity: EntityId,
    pub transform: &'a Transform,
    pub layer_depth: f32,
    pub time: FrameTime,
}

// ---------------------------------------------------------------------------
// ComponentSlot
// ---------------------------------------------------------------------------

/// A component together with the flags its list manages for it.
pub struct ComponentSlot {
    id: ComponentId,
    kind: ComponentKind,
    active: bool,
    debug_draw: Option<bool>,
    component: Box<dyn Component>,
}

impl ComponentSlot {
    pub fn id(&self) -> ComponentId {
        self.id
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Per-component override of the scene's debug-draw switch.
    pub fn debug_draw_override(&self) -> Option<bool> {
        self.debug_draw
    }

    pub fn component(&self) -> &dyn Component {
        &*self.component
    }

    pub fn downcast_ref<C: Component>(&self) -> Option<&C> {
        (*self.component).as_any().downcast_ref::<C>()
    }

    pub fn downcast_mut<C: Component>(&mut self) -> Option<&mut C> {
        (*self.component).as_any_mut().downcast_mut::<C>()
    }
}

impl ListItem for ComponentSlot {
    type Key = ComponentId;
    const LABEL: &'static str = "component";

    fn key(&self) -> ComponentId {
        self.id
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.id == other.id || (self.kind == other.kind && !self.component.allows_multiple())
    }

    fn can_be_removed(&self) -> bool {
        self.component.can_be_removed()
    }

    fn describe(&self) -> String {
        format!("component {} ({:?})", self.kind.short_name(), self.id)
    }
}

impl fmt::Debug for ComponentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentSlot")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("active", &self.active)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Owner context (hooks for the component list)
// ---------------------------------------------------------------------------

/// Borrowed pieces of the owning entity and scene, used to build a
/// [`ComponentContext`] for each hook call.
pub(crate) struct Owner<'a> {
    pub entity: EntityId,
    pub name: &'a str,
    pub tags: &'a BTreeSet<String>,
    pub transform: &'a mut Transform,
    pub time: FrameTime,
    pub commands: &'a mut CommandBuffer,
    pub events: &'a mut EventQueue,
}

impl Owner<'_> {
    fn context(&mut self, component: ComponentId) -> ComponentContext<'_> {
        ComponentContext {
            entity: self.entity,
            component,
            entity_name: self.name,
            tags: self.tags,
            transform: &mut *self.transform,
            time: self.time,
            commands: &mut *self.commands,
            events: &mut *self.events,
        }
    }
}

impl ListHooks<ComponentSlot> for Owner<'_> {
    fn on_added(&mut self, slot: &mut ComponentSlot) {
        slot.component.on_added(&mut self.context(slot.id));
    }

    fn on_removed(&mut self, slot: &mut ComponentSlot) {
        slot.component.on_removed(&mut self.context(slot.id));
    }

    fn awake(&mut self, slot: &mut ComponentSlot) {
        slot.component.awake(&mut self.context(slot.id));
    }

    fn update(&mut self, slot: &mut ComponentSlot) {
        if slot.active {
            slot.component.update(&mut self.context(slot.id));
        }
    }
}

// ---------------------------------------------------------------------------
// ComponentList
// ---------------------------------------------------------------------------

/// The ordered components of one entity.
#[derive(Debug, Default)]
pub struct ComponentList {
    slots: DeferredList<ComponentSlot>,
    next_id: u32,
}

impl ComponentList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `component` for attachment.
    pub fn add<C: Component>(&mut self, component: C) -> Result<ComponentId, EcsError> {
        self.add_boxed(ComponentKind::of::<C>(), Box::new(component))
    }

    /// Queue an already boxed component. `kind` must describe its concrete type.
    ///
    /// Fails with [`EcsError::MissingDependency`] when a kind listed by
    /// [`Component::requires`] is neither attached nor queued ahead of it, and
    /// with [`EcsError::Duplicate`] when the kind is single-instance and
    /// already present.
    pub fn add_boxed(
        &mut self,
        kind: ComponentKind,
        component: Box<dyn Component>,
    ) -> Result<ComponentId, EcsError> {
        for required in component.requires() {
            if !self.slots.iter_effective().any(|s| s.kind == required) {
                return Err(EcsError::MissingDependency {
                    component: kind.short_name(),
                    missing: required.short_name(),
                });
            }
        }

        let id = ComponentId(self.next_id);
        self.next_id += 1;
        self.slots.add(ComponentSlot {
            id,
            kind,
            active: true,
            debug_draw: None,
            component,
        })
    }

    /// Queue the component with `id` for removal.
    pub fn remove(&mut self, id: ComponentId) -> Result<(), EcsError> {
        self.slots.remove(id).map(|_: Removal<ComponentSlot>| ())
    }

    /// First component of type `C`, live or queued.
    pub fn get<C: Component>(&self) -> Option<&C> {
        self.slots
            .iter_with_pending()
            .find_map(|s| s.downcast_ref::<C>())
    }

    pub fn get_mut<C: Component>(&mut self) -> Option<&mut C> {
        let id = self.id_of::<C>()?;
        self.slots.get_mut(id)?.downcast_mut::<C>()
    }

    /// Every component of type `C`, live then queued.
    pub fn get_all<C: Component>(&self) -> impl Iterator<Item = &C> {
        self.slots
            .iter_with_pending()
            .filter_map(|s| s.downcast_ref::<C>())
    }

    /// Id of the first component of type `C`.
    pub fn id_of<C: Component>(&self) -> Option<ComponentId> {
        let kind = ComponentKind::of::<C>();
        self.slots
            .iter_with_pending()
            .find(|s| s.kind == kind)
            .map(|s| s.id)
    }

    pub fn slot(&self, id: ComponentId) -> Option<&ComponentSlot> {
        self.slots.get(id)
    }

    pub fn slot_mut(&mut self, id: ComponentId) -> Option<&mut ComponentSlot> {
        self.slots.get_mut(id)
    }

    pub fn contains<C: Component>(&self) -> bool {
        self.id_of::<C>().is_some()
    }

    pub fn set_active(&mut self, id: ComponentId, active: bool) -> Result<(), EcsError> {
        self.slot_mut_or_err(id)?.active = active;
        Ok(())
    }

    pub fn set_debug_draw(&mut self, id: ComponentId, enabled: Option<bool>) -> Result<(), EcsError> {
        self.slot_mut_or_err(id)?.debug_draw = enabled;
        Ok(())
    }

    pub fn state(&self, id: ComponentId) -> LifecycleState {
        self.slots.state(id)
    }

    /// Live components in attachment order.
    pub fn iter(&self) -> impl Iterator<Item = &ComponentSlot> {
        self.slots.iter()
    }

    /// Number of live components.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn pending_add_count(&self) -> usize {
        self.slots.pending_add_count()
    }

    pub fn pending_remove_count(&self) -> usize {
        self.slots.pending_remove_count()
    }

    /// Copies of every component that supports cloning, live then queued.
    pub fn clone_components(&self) -> Vec<(ComponentKind, Box<dyn Component>)> {
        self.slots
            .iter_with_pending()
            .filter_map(|s| s.component.clone_component().map(|c| (s.kind, c)))
            .collect()
    }

    pub(crate) fn update(&mut self, owner: &mut Owner<'_>) {
        self.slots.update(owner);
    }

    pub(crate) fn remove_all(&mut self, owner: &mut Owner<'_>) {
        self.slots.clear(owner);
    }

    pub(crate) fn draw(&self, ctx: &DrawContext<'_>, sink: &mut dyn RenderSink, debug: bool) {
        for slot in self.slots.iter().filter(|s| s.active) {
            slot.component.draw(ctx, sink);
            if slot.debug_draw.unwrap_or(debug) {
                slot.component.debug_draw(ctx, sink);
            }
        }
    }

    fn slot_mut_or_err(&mut self, id: ComponentId) -> Result<&mut ComponentSlot, EcsError> {
        self.slots.get_mut(id).ok_or_else(|| EcsError::NotFound {
            what: format!("component {id:?}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Command buffer for structural changes requested during an update.
//!
//! While a scene is updating, neither its entity list nor any component list
//! may be touched. Components instead push [`Command`]s onto the scene's
//! [`CommandBuffer`] through their
//! [`ComponentContext`](crate::component::ComponentContext). After the update
//! pass the scene calls [`CommandBuffer::apply`], which replays the commands
//! in FIFO order through the regular [`Scene`] API. That API only queues, so
//! every change becomes visible at the next update.
//!
//! # Example
//!
//! ```
//! use sprig_ecs::prelude::*;
//!
//! let mut scene = Scene::new("demo");
//! let target = scene.spawn(EntityBuilder::new("crate")).unwrap();
//! scene.update(FrameTime::default());
//!
//! let mut cmds = CommandBuffer::new();
//! cmds.add_tag(target, "breakable");
//! cmds.spawn(EntityBuilder::new("debris"));
//!
//! let report = cmds.apply(&mut scene);
//! assert_eq!(report.success_count, 2);
//! assert_eq!(report.spawned.len(), 1);
//! assert!(scene.entity(target).unwrap().has_tag("breakable"));
//! ```

use std::fmt;

use tracing::warn;

use crate::component::{Component, ComponentId, ComponentKind};
use crate::entity::{EntityBuilder, EntityId};
use crate::scene::Scene;
use crate::EcsError;

// ---------------------------------------------------------------------------
// CommandKind
// ---------------------------------------------------------------------------

/// What mutation to perform.
pub enum CommandKind {
    /// Create a new entity.
    Spawn(EntityBuilder),
    /// Destroy the target entity.
    Destroy,
    /// Attach a component to the target entity.
    AddComponent {
        kind: ComponentKind,
        component: Box<dyn Component>,
    },
    /// Detach a component from the target entity.
    RemoveComponent { component: ComponentId },
    AddTag(String),
    RemoveTag(String),
}

impl CommandKind {
    fn label(&self) -> &'static str {
        match self {
            CommandKind::Spawn(_) => "spawn",
            CommandKind::Destroy => "destroy",
            CommandKind::AddComponent { .. } => "add_component",
            CommandKind::RemoveComponent { .. } => "remove_component",
            CommandKind::AddTag(_) => "add_tag",
            CommandKind::RemoveTag(_) => "remove_tag",
        }
    }
}

impl fmt::Debug for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKind::Spawn(builder) => f.debug_tuple("Spawn").field(builder).finish(),
            CommandKind::Destroy => f.write_str("Destroy"),
            CommandKind::AddComponent { kind, .. } => {
                f.debug_struct("AddComponent").field("kind", kind).finish()
            }
            CommandKind::RemoveComponent { component } => f
                .debug_struct("RemoveComponent")
                .field("component", component)
                .finish(),
            CommandKind::AddTag(tag) => f.debug_tuple("AddTag").field(tag).finish(),
            CommandKind::RemoveTag(tag) => f.debug_tuple("RemoveTag").field(tag).finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// A single deferred mutation.
#[derive(Debug)]
pub struct Command {
    /// Which entity this command targets. `None` for spawn commands.
    pub target: Option<EntityId>,
    pub kind: CommandKind,
    /// Sequential index within the buffer (set on insertion).
    pub command_index: u32,
}

// ---------------------------------------------------------------------------
// ApplyReport
// ---------------------------------------------------------------------------

/// Summary of one [`CommandBuffer::apply`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub success_count: usize,
    /// Commands that failed (stale target, duplicate component, ...). Each
    /// failure is logged at `warn` level.
    pub failed_count: usize,
    /// Ids of entities created by spawn commands, in command order.
    pub spawned: Vec<EntityId>,
}

// ---------------------------------------------------------------------------
// CommandBuffer
// ---------------------------------------------------------------------------

/// Collects commands during an update and applies them in insertion order.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    next_index: u32,
}

impl CommandBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue creation of a new entity.
    pub fn spawn(&mut self, builder: EntityBuilder) {
        self.push(None, CommandKind::Spawn(builder));
    }

    /// Queue destruction of `target`.
    pub fn destroy_entity(&mut self, target: EntityId) {
        self.push(Some(target), CommandKind::Destroy);
    }

    /// Queue attaching `component` to `target`. Dependency and duplicate
    /// checks run when the command is applied.
    pub fn add_component<C: Component>(&mut self, target: EntityId, component: C) {
        self.push(
            Some(target),
            CommandKind::AddComponent {
                kind: ComponentKind::of::<C>(),
                component: Box::new(component),
            },
        );
    }

    /// Queue detaching the component `component` from `target`.
    pub fn remove_component(&mut self, target: EntityId, component: ComponentId) {
        self.push(Some(target), CommandKind::RemoveComponent { component });
    }

    /// Queue adding `tag` to `target`.
    pub fn add_tag(&mut self, target: EntityId, tag: impl Into<String>) {
        self.push(Some(target), CommandKind::AddTag(tag.into()));
    }

    /// Queue removing `tag` from `target`. Fails at apply time if the tag
    /// is absent.
    pub fn remove_tag(&mut self, target: EntityId, tag: impl Into<String>) {
        self.push(Some(target), CommandKind::RemoveTag(tag.into()));
    }

    /// Queued commands in insertion order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// True when nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Drop every queued command without applying it.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.next_index = 0;
    }

    /// Replay every command against `scene` in insertion order and empty the
    /// buffer.
    ///
    /// A failing command is logged and counted; it does not stop the ones
    /// after it.
    pub fn apply(&mut self, scene: &mut Scene) -> ApplyReport {
        let commands = std::mem::take(&mut self.commands);
        self.next_index = 0;

        let mut report = ApplyReport::default();
        for cmd in commands {
            let index = cmd.command_index;
            let target = cmd.target;
            let label = cmd.kind.label();
            match Self::apply_one(scene, cmd) {
                Ok(spawned) => {
                    report.success_count += 1;
                    report.spawned.extend(spawned);
                }
                Err(e) => {
                    report.failed_count += 1;
                    warn!(
                        command_index = index,
                        command = label,
                        target = ?target,
                        scene = %scene.name(),
                        error = %e,
                        "command application failed"
                    );
                }
            }
        }
        report
    }

    fn apply_one(scene: &mut Scene, cmd: Command) -> Result<Option<EntityId>, EcsError> {
        let target = cmd.target.ok_or_else(|| EcsError::NotFound {
            what: format!("target entity for {} command", cmd.kind.label()),
        });
        match cmd.kind {
            CommandKind::Spawn(builder) => return scene.spawn(builder).map(Some),
            CommandKind::Destroy => scene.destroy(target?)?,
            CommandKind::AddComponent { kind, component } => {
                scene.add_boxed_component(target?, kind, component)?;
            }
            CommandKind::RemoveComponent { component } => {
                scene.remove_component(target?, component)?
            }
            CommandKind::AddTag(tag) => {
                scene.entity_mut_or_err(target?)?.add_tag(tag);
            }
            CommandKind::RemoveTag(tag) => scene.entity_mut_or_err(target?)?.remove_tag(&tag)?,
        }
        Ok(None)
    }

    fn push(&mut self, target: Option<EntityId>, kind: CommandKind) {
        let command_index = self.next_index;
        self.next_index += 1;
        self.commands.push(Command {
            target,
            kind,
            command_index,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deferred::LifecycleState;
    use crate::scene::SceneId;
    use crate::time::FrameTime;

    #[derive(Debug, Default)]
    struct Marker;
    impl Component for Marker {}

    fn scene_with_entity() -> (Scene, EntityId) {
        let mut scene = Scene::new("test");
        let id = scene.spawn(EntityBuilder::new("target")).unwrap();
        scene.update(FrameTime::default());
        (scene, id)
    }

    #[test]
    fn commands_are_indexed_in_order() {
        let mut cmds = CommandBuffer::new();
        let e = EntityId::new(SceneId(0), 0, 0);
        cmds.add_tag(e, "a");
        cmds.destroy_entity(e);
        let indices: Vec<u32> = cmds.commands().iter().map(|c| c.command_index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn apply_queues_on_scene_lists() {
        let (mut scene, id) = scene_with_entity();
        let mut cmds = CommandBuffer::new();
        cmds.add_component(id, Marker);
        cmds.destroy_entity(id);

        let report = cmds.apply(&mut scene);
        assert_eq!(report.success_count, 2);
        assert!(cmds.is_empty());

        let cid = scene.entity(id).unwrap().components().id_of::<Marker>().unwrap();
        assert_eq!(
            scene.entity(id).unwrap().components().state(cid),
            LifecycleState::PendingAdd
        );
        assert_eq!(scene.state(id), LifecycleState::PendingRemove);
    }

    #[test]
    fn failures_are_counted_and_do_not_stop_later_commands() {
        let (mut scene, id) = scene_with_entity();
        let stale = EntityId::new(scene.id(), 99, 3);
        let mut other = Scene::new("other");
        let foreign = other.spawn(EntityBuilder::new("elsewhere")).unwrap();
        assert_eq!((foreign.index(), foreign.generation()), (id.index(), id.generation()));

        let mut cmds = CommandBuffer::new();
        cmds.destroy_entity(stale);
        cmds.add_tag(foreign, "nope");
        cmds.remove_tag(id, "missing");
        cmds.add_tag(id, "ok");

        let report = cmds.apply(&mut scene);
        assert_eq!(report.failed_count, 3);
        assert_eq!(report.success_count, 1);
        assert!(scene.entity(id).unwrap().has_tag("ok"));
    }

    #[test]
    fn spawned_ids_are_reported() {
        let mut scene = Scene::new("test");
        let mut cmds = CommandBuffer::new();
        cmds.spawn(EntityBuilder::new("a"));
        cmds.spawn(EntityBuilder::new("b"));

        let report = cmds.apply(&mut scene);
        assert_eq!(report.spawned.len(), 2);
        assert_eq!(scene.state(report.spawned[1]), LifecycleState::PendingAdd);
    }
}

//! Sprig ECS -- entities, components and scenes with deferred mutation.
//!
//! Entities live in a [`Scene`](scene::Scene); each entity owns a
//! [`Transform`](transform::Transform) and an ordered list of boxed
//! [`Component`](component::Component)s. Both lists are
//! [`DeferredList`](deferred::DeferredList)s: adds and removes are queued and
//! take effect at the start of the next update, followed by exactly one
//! `awake` per newcomer. Iteration therefore never observes a list being
//! mutated underneath it.
//!
//! Components get their surroundings through explicit context objects
//! ([`ComponentContext`](component::ComponentContext),
//! [`DrawContext`](component::DrawContext)) and request structural changes
//! through the scene's [`CommandBuffer`](command::CommandBuffer).
//!
//! # Quick Start
//!
//! ```
//! use sprig_ecs::prelude::*;
//!
//! #[derive(Default)]
//! struct Mover { speed: f32 }
//!
//! impl Component for Mover {
//!     fn update(&mut self, ctx: &mut ComponentContext<'_>) {
//!         let step = self.speed * ctx.delta();
//!         ctx.transform.translate(Vec2::new(step, 0.0));
//!     }
//! }
//!
//! let mut scene = Scene::new("level-1");
//! let ball = scene
//!     .spawn(EntityBuilder::new("ball").with_component(Mover { speed: 10.0 }))
//!     .unwrap();
//!
//! scene.update(FrameTime::default().advance(0.5));
//! assert_eq!(scene.entity(ball).unwrap().transform.position.x, 5.0);
//! ```

#![deny(unsafe_code)]

pub mod command;
pub mod component;
pub mod deferred;
pub mod draw;
pub mod entity;
pub mod entity_list;
pub mod event;
pub mod scene;
pub mod time;
pub mod transform;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by entity, component and scene operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EcsError {
    /// An item that may not coexist with the new one is already present or
    /// queued.
    #[error("duplicate: {what} is already present")]
    Duplicate { what: String },

    /// The item is absent, or already queued for removal.
    #[error("{what} not found")]
    NotFound { what: String },

    /// The item refuses removal.
    #[error("{what} cannot be removed")]
    NotRemovable { what: String },

    /// A component was attached before a component it requires.
    #[error("component '{component}' requires '{missing}' to be attached first")]
    MissingDependency {
        component: &'static str,
        missing: &'static str,
    },

    /// The entity id is dead (destroyed, or from another scene).
    #[error("entity {entity} is not alive in this scene")]
    StaleEntity { entity: entity::EntityId },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::command::{ApplyReport, Command, CommandBuffer, CommandKind};
    pub use crate::component::{
        Component, ComponentContext, ComponentId, ComponentKind, ComponentList, DrawContext,
    };
    pub use crate::deferred::{DeferredList, LifecycleState, ListHooks, ListItem, Removal};
    pub use crate::draw::{Color, DrawQueue, DrawRequest, RenderSink, TextureHandle};
    pub use crate::entity::{Entity, EntityBuilder, EntityId};
    pub use crate::event::{EventQueue, GameEvent};
    pub use crate::scene::{Scene, SceneId};
    pub use crate::time::FrameTime;
    pub use crate::transform::Transform;
    pub use crate::EcsError;
    pub use glam::Vec2;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------

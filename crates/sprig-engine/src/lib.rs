//! Sprig Engine -- sprite animation, particles and the frame loop on top of
//! [`sprig_ecs`] scenes.
//!
//! The [`Engine`](engine::Engine) owns the active
//! [`Scene`](sprig_ecs::scene::Scene) and steps it with a clamped delta.
//! Visuals are components: [`Sprite`](sprite::Sprite) draws a texture
//! region, [`SpriteAnimator`](animator::SpriteAnimator) plays named
//! [`SpriteAnimation`](animation::SpriteAnimation)s and reports their events
//! to the scene, and [`ParticleEmitter`](particles::ParticleEmitter) runs a
//! seeded particle system. Draw output goes to a
//! [`RenderSink`](sprig_ecs::draw::RenderSink) supplied by the host.
//!
//! # Quick Start
//!
//! ```
//! use sprig_engine::prelude::*;
//!
//! let frames = (0..4).map(|i| Rect::new(i as f32 * 8.0, 0.0, 8.0, 8.0)).collect();
//! let animator = SpriteAnimator::new(TextureHandle(0))
//!     .with_animation("spin", SpriteAnimation::new(frames, 0.1, true).unwrap())
//!     .unwrap();
//!
//! let mut engine = Engine::new(EngineConfig { headless: true, ..Default::default() }).unwrap();
//! let coin = engine
//!     .scene_mut()
//!     .spawn(EntityBuilder::new("coin").with_component(animator))
//!     .unwrap();
//! engine
//!     .scene_mut()
//!     .entity_mut(coin)
//!     .unwrap()
//!     .get_component_mut::<SpriteAnimator>()
//!     .unwrap()
//!     .play("spin")
//!     .unwrap();
//!
//! engine.update(0.1);
//!
//! let mut queue = DrawQueue::new();
//! engine.draw(&mut queue);
//! assert_eq!(queue.requests[0].source, Some(Rect::new(8.0, 0.0, 8.0, 8.0)));
//! ```

#![deny(unsafe_code)]

pub mod animation;
pub mod animator;
pub mod config;
pub mod console;
pub mod content;
pub mod engine;
pub mod logging;
pub mod particles;
pub mod sprite;

pub use sprig_ecs;
pub use sprig_geom;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Any error the engine crate can produce.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Content(#[from] content::ContentError),

    #[error(transparent)]
    Console(#[from] console::ConsoleError),

    #[error(transparent)]
    Particle(#[from] particles::ParticleError),

    #[error(transparent)]
    Animation(#[from] animation::AnimationError),

    #[error(transparent)]
    Ecs(#[from] sprig_ecs::EcsError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::animation::{
        AnimationDirection, AnimationError, AnimationEvent, AnimationState, FrameTag, SheetFrame,
        SpriteAnimation, SpriteSheet,
    };
    pub use crate::animator::SpriteAnimator;
    pub use crate::config::EngineConfig;
    pub use crate::console::CommandRegistry;
    pub use crate::content::{ContentLoader, ContentRegistry};
    pub use crate::engine::{Engine, FrameDiagnostics};
    pub use crate::particles::{ParticleConfig, ParticleEmitter, Span};
    pub use crate::sprite::{Flip, Sprite};
    pub use crate::EngineError;
    pub use sprig_ecs::prelude::*;
    pub use sprig_geom::prelude::{
        circle_vs_circle, polygon_vs_polygon, rect_vs_rect, segment_vs_segment, Circle,
        LineSegment, Polygon, Rect,
    };
}

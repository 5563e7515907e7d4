//! Frame loop driving the active scene.
//!
//! Each [`Engine::update`]:
//!
//! 1. Clamps the delta to [`EngineConfig::max_frame_dt`].
//! 2. Swaps in a scene queued with [`Engine::set_scene`], unloading the old
//!    one.
//! 3. Advances the [`FrameTime`] and updates the active scene (entity flush,
//!    component updates, command buffer apply).
//! 4. Records [`FrameDiagnostics`].
//!
//! # Example
//!
//! ```
//! use sprig_engine::prelude::*;
//!
//! let config = EngineConfig { headless: true, ..Default::default() };
//! let mut engine = Engine::new(config).unwrap();
//! engine.scene_mut().spawn(EntityBuilder::new("player")).unwrap();
//!
//! engine.run_frames(10);
//!
//! assert_eq!(engine.frame_count(), 10);
//! assert_eq!(engine.diagnostics().entity_count, 1);
//! ```

use std::time::{Duration, Instant};

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;
use sprig_ecs::command::ApplyReport;
use sprig_ecs::draw::RenderSink;
use sprig_ecs::scene::Scene;
use sprig_ecs::time::FrameTime;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::console::CommandRegistry;
use crate::EngineError;

// ---------------------------------------------------------------------------
// FrameDiagnostics
// ---------------------------------------------------------------------------

/// Timing and bookkeeping for the last frame.
#[derive(Debug, Clone, Default)]
pub struct FrameDiagnostics {
    /// Delta actually used, after clamping.
    pub delta: f32,
    /// The caller's delta exceeded `max_frame_dt`.
    pub clamped: bool,
    /// A pending scene was swapped in at the start of this frame.
    pub scene_switched: bool,
    /// Wall-clock time spent in the scene update.
    pub update_time: Duration,
    /// Live entities after the update.
    pub entity_count: usize,
    /// Result of applying the scene's command buffer.
    pub commands: ApplyReport,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owns the active scene and steps it frame by frame.
pub struct Engine {
    config: EngineConfig,
    scene: Scene,
    pending_scene: Option<Scene>,
    console: CommandRegistry,
    time: FrameTime,
    rng: Pcg32,
    last_diagnostics: FrameDiagnostics,
}

impl Engine {
    /// Create an engine with an empty scene named `"main"`.
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_scene(config, Scene::new("main"))
    }

    pub fn with_scene(config: EngineConfig, scene: Scene) -> Result<Self, EngineError> {
        config.validate()?;
        info!(
            scene = %scene.name(),
            fixed_dt = config.fixed_dt,
            headless = config.headless,
            "engine created"
        );
        Ok(Self {
            rng: Pcg32::seed_from_u64(config.rng_seed),
            config,
            scene,
            pending_scene: None,
            console: CommandRegistry::new(),
            time: FrameTime::default(),
            last_diagnostics: FrameDiagnostics::default(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -- scenes -------------------------------------------------------------

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Queue `scene` to replace the active scene at the start of the next
    /// update. Queuing again before that update replaces the queued scene.
    pub fn set_scene(&mut self, scene: Scene) {
        if let Some(dropped) = self.pending_scene.replace(scene) {
            debug!(scene = %dropped.name(), "queued scene replaced before use");
        }
    }

    pub fn pending_scene(&self) -> Option<&Scene> {
        self.pending_scene.as_ref()
    }

    // -- frame loop ---------------------------------------------------------

    /// Advance one frame of `dt` seconds. Negative deltas count as zero,
    /// as do NaN and infinite ones.
    pub fn update(&mut self, dt: f32) {
        let delta = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_frame_dt)
        } else {
            0.0
        };
        let clamped = delta != dt;
        if clamped {
            debug!(requested = dt, used = delta, "frame delta clamped");
        }

        let scene_switched = self.swap_pending_scene();

        self.time = self.time.advance(delta);
        let start = Instant::now();
        self.scene.update(self.time);
        let update_time = start.elapsed();

        self.last_diagnostics = FrameDiagnostics {
            delta,
            clamped,
            scene_switched,
            update_time,
            entity_count: self.scene.entities().len(),
            commands: self.scene.last_apply_report().clone(),
        };
    }

    /// Run `n` frames at the configured fixed delta.
    pub fn run_frames(&mut self, n: u64) {
        for _ in 0..n {
            self.update(self.config.fixed_dt);
        }
    }

    /// Submit the active scene's draw requests.
    pub fn draw(&self, sink: &mut dyn RenderSink) {
        self.scene.draw(sink);
    }

    fn swap_pending_scene(&mut self) -> bool {
        let Some(next) = self.pending_scene.take() else {
            return false;
        };
        let mut previous = std::mem::replace(&mut self.scene, next);
        previous.unload();
        info!(
            from = %previous.name(),
            to = %self.scene.name(),
            frame = self.time.frame + 1,
            "scene switched"
        );
        true
    }

    // -- accessors ----------------------------------------------------------

    pub fn time(&self) -> FrameTime {
        self.time
    }

    pub fn frame_count(&self) -> u64 {
        self.time.frame
    }

    pub fn diagnostics(&self) -> &FrameDiagnostics {
        &self.last_diagnostics
    }

    pub fn console(&self) -> &CommandRegistry {
        &self.console
    }

    pub fn console_mut(&mut self) -> &mut CommandRegistry {
        &mut self.console
    }

    /// Next seed from the engine's random stream, for seeding per-entity
    /// generators such as particle emitters. Deterministic for a given
    /// [`EngineConfig::rng_seed`].
    pub fn next_seed(&mut self) -> u64 {
        self.rng.next_u64()
    }
}

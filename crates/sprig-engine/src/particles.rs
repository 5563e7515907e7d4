//! Particle emitter component.
//!
//! Particles are plain values owned by their emitter. The emitter spawns
//! them at its entity's position at a steady rate (plus explicit bursts),
//! ages and moves them every update, and draws one quad per live particle.
//! Randomness comes from a seeded PCG generator, so a given seed and frame
//! sequence always produce the same particles.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use sprig_ecs::component::{Component, ComponentContext, DrawContext};
use sprig_ecs::draw::{Color, DrawRequest, RenderSink, TextureHandle};
use sprig_geom::shapes::Rect;

/// Errors from an invalid [`ParticleConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParticleError {
    #[error("invalid particle config field '{field}': {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

/// Inclusive `[min, max]` range sampled uniformly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: f32) -> Self {
        Self::new(value, value)
    }

    fn sample(&self, rng: &mut Pcg32) -> f32 {
        if self.min == self.max {
            self.min
        } else {
            rng.gen_range(self.min..=self.max)
        }
    }

    fn check(&self, field: &'static str) -> Result<(), ParticleError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return invalid(field, format!("bounds must be finite, got {}..={}", self.min, self.max));
        }
        if self.min > self.max {
            return invalid(field, format!("range is inverted: {} > {}", self.min, self.max));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> Result<(), ParticleError> {
    Err(ParticleError::InvalidConfig { field, reason })
}

/// What an emitter spawns and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleConfig {
    pub texture: TextureHandle,
    /// Particles per second. Zero means bursts only.
    pub rate: f32,
    /// Seconds each particle lives.
    pub lifetime: Span,
    /// Initial speed in units per second.
    pub speed: Span,
    /// Launch direction in radians (0 points along +X).
    pub angle: Span,
    /// Constant acceleration applied to every particle.
    pub gravity: Vec2,
    /// Side length of each particle quad.
    pub size: f32,
    pub start_color: Color,
    pub end_color: Color,
    /// Live particle cap; spawns beyond it are dropped.
    pub max_particles: usize,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            texture: TextureHandle(0),
            rate: 10.0,
            lifetime: Span::new(0.3, 1.0),
            speed: Span::new(20.0, 60.0),
            angle: Span::new(0.0, std::f32::consts::TAU),
            gravity: Vec2::ZERO,
            size: 2.0,
            start_color: Color::WHITE,
            end_color: Color::TRANSPARENT,
            max_particles: 256,
        }
    }
}

impl ParticleConfig {
    pub fn validate(&self) -> Result<(), ParticleError> {
        if !(self.rate >= 0.0 && self.rate.is_finite()) {
            return invalid("rate", format!("must be finite and >= 0, got {}", self.rate));
        }
        self.lifetime.check("lifetime")?;
        if self.lifetime.min <= 0.0 {
            return invalid("lifetime", format!("must be positive, got {}", self.lifetime.min));
        }
        self.speed.check("speed")?;
        self.angle.check("angle")?;
        if !(self.size > 0.0 && self.size.is_finite()) {
            return invalid("size", format!("must be positive, got {}", self.size));
        }
        if self.max_particles == 0 {
            return invalid("max_particles", "must be at least 1".to_owned());
        }
        Ok(())
    }
}

/// One live particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Seconds since spawn.
    pub age: f32,
    pub lifetime: f32,
}

impl Particle {
    /// Fraction of the lifetime used up, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        (self.age / self.lifetime).clamp(0.0, 1.0)
    }
}

/// Spawns, simulates and draws particles around its entity.
#[derive(Debug, Clone)]
pub struct ParticleEmitter {
    config: ParticleConfig,
    rng: Pcg32,
    particles: Vec<Particle>,
    spawn_accumulator: f32,
    pending_burst: usize,
    /// When false the emitter stops spawning; live particles finish.
    pub emitting: bool,
}

impl ParticleEmitter {
    pub fn new(config: ParticleConfig, seed: u64) -> Result<Self, ParticleError> {
        config.validate()?;
        Ok(Self {
            config,
            rng: Pcg32::seed_from_u64(seed),
            particles: Vec::new(),
            spawn_accumulator: 0.0,
            pending_burst: 0,
            emitting: true,
        })
    }

    pub fn config(&self) -> &ParticleConfig {
        &self.config
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Spawn `count` extra particles at the next update.
    pub fn burst(&mut self, count: usize) {
        self.pending_burst += count;
    }

    pub fn clear(&mut self) {
        self.particles.clear();
        self.spawn_accumulator = 0.0;
        self.pending_burst = 0;
    }

    /// Age, move and expire particles, then spawn new ones at `origin`.
    pub fn step(&mut self, dt: f32, origin: Vec2) {
        let gravity = self.config.gravity;
        for p in &mut self.particles {
            p.age += dt;
            p.velocity += gravity * dt;
            p.position += p.velocity * dt;
        }
        self.particles.retain(|p| p.age < p.lifetime);

        let mut count = std::mem::take(&mut self.pending_burst);
        if self.emitting {
            self.spawn_accumulator += self.config.rate * dt;
            let whole = self.spawn_accumulator.floor();
            self.spawn_accumulator -= whole;
            count += whole as usize;
        }

        let room = self.config.max_particles.saturating_sub(self.particles.len());
        for _ in 0..count.min(room) {
            let particle = self.spawn(origin);
            self.particles.push(particle);
        }
    }

    fn spawn(&mut self, origin: Vec2) -> Particle {
        let lifetime = self.config.lifetime.sample(&mut self.rng);
        let speed = self.config.speed.sample(&mut self.rng);
        let angle = self.config.angle.sample(&mut self.rng);
        Particle {
            position: origin,
            velocity: Vec2::from_angle(angle) * speed,
            age: 0.0,
            lifetime,
        }
    }

    fn color(&self, particle: &Particle) -> Color {
        self.config
            .start_color
            .lerp(self.config.end_color, particle.progress())
    }
}

impl Component for ParticleEmitter {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        self.step(ctx.delta(), ctx.transform.position);
    }

    fn draw(&self, ctx: &DrawContext<'_>, sink: &mut dyn RenderSink) {
        let half = self.config.size / 2.0;
        for p in &self.particles {
            sink.draw(DrawRequest {
                texture: self.config.texture,
                destination: Rect::new(p.position.x - half, p.position.y - half, self.config.size, self.config.size),
                source: None,
                tint: self.color(p),
                rotation: 0.0,
                origin: Vec2::ZERO,
                scale: Vec2::ONE,
                layer_depth: ctx.layer_depth,
            });
        }
    }

    fn clone_component(&self) -> Option<Box<dyn Component>> {
        let mut copy = self.clone();
        copy.clear();
        Some(Box::new(copy))
    }
}

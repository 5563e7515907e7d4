//! The drawing seam between components and whatever renders them.
//!
//! Components describe what they want drawn as [`DrawRequest`]s and submit
//! them to a [`RenderSink`]. No graphics backend lives in this workspace;
//! [`DrawQueue`] is a sink that simply records requests, used in headless runs
//! and tests.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use sprig_geom::shapes::Rect;

/// Opaque reference to a texture owned by the renderer or content registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgba(255, 255, 255, 255);
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const RED: Self = Self::rgba(255, 0, 0, 255);
    pub const GREEN: Self = Self::rgba(0, 255, 0, 255);
    pub const BLUE: Self = Self::rgba(0, 0, 255, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with every channel scaled by `opacity`, clamped to `[0, 1]`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        let k = opacity.clamp(0.0, 1.0);
        let scale = |c: u8| (f32::from(c) * k).round() as u8;
        Self::rgba(scale(self.r), scale(self.g), scale(self.b), scale(self.a))
    }

    /// Linear blend from `self` (t = 0) to `other` (t = 1).
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8;
        Self::rgba(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
            mix(self.a, other.a),
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// One textured quad to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawRequest {
    pub texture: TextureHandle,
    /// Where the quad lands in world space.
    pub destination: Rect,
    /// Sub-rectangle of the texture; `None` draws the whole texture.
    pub source: Option<Rect>,
    pub tint: Color,
    pub rotation: f32,
    /// Rotation origin, relative to the destination's top-left corner.
    pub origin: Vec2,
    pub scale: Vec2,
    /// Sorting depth; lower values are drawn first.
    pub layer_depth: f32,
}

/// Receiver of draw requests.
pub trait RenderSink {
    fn draw(&mut self, request: DrawRequest);

    /// Outline of `rect`, used by debug drawing. Ignored by default.
    fn draw_outline(&mut self, _rect: Rect, _color: Color) {}
}

/// A [`RenderSink`] that records everything it is given.
#[derive(Debug, Default)]
pub struct DrawQueue {
    pub requests: Vec<DrawRequest>,
    pub outlines: Vec<(Rect, Color)>,
}

impl DrawQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.requests.clear();
        self.outlines.clear();
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl RenderSink for DrawQueue {
    fn draw(&mut self, request: DrawRequest) {
        self.requests.push(request);
    }

    fn draw_outline(&mut self, rect: Rect, color: Color) {
        self.outlines.push((rect, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opacity_is_clamped() {
        let c = Color::rgba(200, 100, 50, 255);
        assert_eq!(c.with_opacity(2.0), c);
        assert_eq!(c.with_opacity(-1.0), Color::TRANSPARENT);
        assert_eq!(c.with_opacity(0.5), Color::rgba(100, 50, 25, 128));
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        assert_eq!(Color::BLACK.lerp(Color::WHITE, 0.0), Color::BLACK);
        assert_eq!(Color::BLACK.lerp(Color::WHITE, 1.0), Color::WHITE);
        assert_eq!(Color::BLACK.lerp(Color::WHITE, 0.5), Color::rgba(128, 128, 128, 255));
    }

    #[test]
    fn queue_records_requests() {
        let mut queue = DrawQueue::new();
        queue.draw(DrawRequest {
            texture: TextureHandle(1),
            destination: Rect::new(0.0, 0.0, 8.0, 8.0),
            source: None,
            tint: Color::WHITE,
            rotation: 0.0,
            origin: Vec2::ZERO,
            scale: Vec2::ONE,
            layer_depth: 0.0,
        });
        queue.draw_outline(Rect::new(0.0, 0.0, 1.0, 1.0), Color::RED);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.outlines.len(), 1);

        queue.clear();
        assert!(queue.is_empty());
    }
}

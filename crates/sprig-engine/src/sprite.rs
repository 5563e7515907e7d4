//! Static sprite component.

use glam::Vec2;
use sprig_ecs::component::{Component, DrawContext};
use sprig_ecs::draw::{Color, DrawRequest, RenderSink, TextureHandle};
use sprig_geom::shapes::Rect;

/// Mirroring applied when a sprite is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flip {
    pub horizontal: bool,
    pub vertical: bool,
}

impl Flip {
    /// Scale multiplier that mirrors the quad.
    pub fn signs(self) -> Vec2 {
        Vec2::new(
            if self.horizontal { -1.0 } else { 1.0 },
            if self.vertical { -1.0 } else { 1.0 },
        )
    }
}

/// Appearance shared by [`Sprite`] and
/// [`SpriteAnimator`](crate::animator::SpriteAnimator).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteStyle {
    pub tint: Color,
    /// Rotation origin relative to the quad's top-left corner.
    pub origin: Vec2,
    pub flip: Flip,
    /// Outline color used when debug drawing is enabled.
    pub debug_color: Color,
}

impl Default for SpriteStyle {
    fn default() -> Self {
        Self {
            tint: Color::WHITE,
            origin: Vec2::ZERO,
            flip: Flip::default(),
            debug_color: Color::GREEN,
        }
    }
}

impl SpriteStyle {
    /// Draw request for `source` (of size `size`) placed at the entity's
    /// transform.
    pub(crate) fn request(
        &self,
        ctx: &DrawContext<'_>,
        texture: TextureHandle,
        source: Option<Rect>,
        size: Vec2,
    ) -> DrawRequest {
        let position = ctx.transform.position;
        DrawRequest {
            texture,
            destination: Rect::new(position.x, position.y, size.x, size.y),
            source,
            tint: self.tint,
            rotation: ctx.transform.rotation,
            origin: self.origin,
            scale: ctx.transform.scale * self.flip.signs(),
            layer_depth: ctx.layer_depth,
        }
    }

    /// World-space bounds of a quad of `size` at the entity's transform.
    pub(crate) fn bounds(&self, ctx: &DrawContext<'_>, size: Vec2) -> Rect {
        let scaled = size * ctx.transform.scale.abs();
        let top_left = ctx.transform.position - self.origin * ctx.transform.scale.abs();
        Rect::new(top_left.x, top_left.y, scaled.x, scaled.y)
    }
}

/// A single texture region drawn at the entity's transform.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub texture: TextureHandle,
    /// Region of the texture; `None` draws all of it.
    pub source: Option<Rect>,
    /// Unscaled on-screen size.
    pub size: Vec2,
    pub style: SpriteStyle,
}

impl Sprite {
    /// Sprite showing `source` at its own size.
    pub fn new(texture: TextureHandle, source: Rect) -> Self {
        Self {
            texture,
            source: Some(source),
            size: source.size(),
            style: SpriteStyle::default(),
        }
    }

    /// Sprite showing a whole texture of the given size.
    pub fn whole(texture: TextureHandle, size: Vec2) -> Self {
        Self {
            texture,
            source: None,
            size,
            style: SpriteStyle::default(),
        }
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.style.tint = tint;
        self
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.style.origin = origin;
        self
    }

    pub fn with_flip(mut self, flip: Flip) -> Self {
        self.style.flip = flip;
        self
    }
}

impl Component for Sprite {
    fn draw(&self, ctx: &DrawContext<'_>, sink: &mut dyn RenderSink) {
        sink.draw(self.style.request(ctx, self.texture, self.source, self.size));
    }

    fn debug_draw(&self, ctx: &DrawContext<'_>, sink: &mut dyn RenderSink) {
        sink.draw_outline(self.style.bounds(ctx, self.size), self.style.debug_color);
    }

    fn clone_component(&self) -> Option<Box<dyn Component>> {
        Some(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_ecs::prelude::*;

    #[test]
    fn draws_at_transform_with_flip() {
        let mut scene = Scene::new("sprites");
        scene
            .spawn(
                EntityBuilder::new("crate")
                    .at(Vec2::new(10.0, 20.0))
                    .with_layer_depth(0.5)
                    .with_component(
                        Sprite::new(TextureHandle(3), Rect::new(0.0, 0.0, 16.0, 8.0))
                            .with_flip(Flip {
                                horizontal: true,
                                vertical: false,
                            })
                            .with_tint(Color::RED),
                    ),
            )
            .unwrap();
        scene.update(FrameTime::default());

        let mut queue = DrawQueue::new();
        scene.draw(&mut queue);
        assert_eq!(queue.len(), 1);
        let req = &queue.requests[0];
        assert_eq!(req.texture, TextureHandle(3));
        assert_eq!(req.destination, Rect::new(10.0, 20.0, 16.0, 8.0));
        assert_eq!(req.scale, Vec2::new(-1.0, 1.0));
        assert_eq!(req.tint, Color::RED);
        assert_eq!(req.layer_depth, 0.5);
        assert!(queue.outlines.is_empty());
    }

    #[test]
    fn debug_outline_follows_scene_switch() {
        let mut scene = Scene::new("sprites");
        scene.debug_draw = true;
        scene
            .spawn(
                EntityBuilder::new("crate")
                    .with_component(Sprite::whole(TextureHandle(1), Vec2::new(4.0, 4.0))),
            )
            .unwrap();
        scene.update(FrameTime::default());

        let mut queue = DrawQueue::new();
        scene.draw(&mut queue);
        assert_eq!(queue.outlines, vec![(Rect::new(0.0, 0.0, 4.0, 4.0), Color::GREEN)]);
    }
}

//! Component that plays named sprite animations on an entity.

use std::collections::BTreeMap;

use glam::Vec2;
use sprig_ecs::component::{Component, ComponentContext, DrawContext};
use sprig_ecs::draw::{RenderSink, TextureHandle};
use tracing::debug;

use crate::animation::{AnimationError, AnimationEvent, SpriteAnimation};
use crate::sprite::SpriteStyle;

/// Game event type emitted when the current animation reaches its end.
/// Details: `[animation]`.
pub const ANIMATION_ENDED: &str = "animation_ended";
/// Game event type emitted on every frame change. Details: `[animation, index]`.
pub const ANIMATION_FRAME: &str = "animation_frame";
/// Game event type emitted for named frame events.
/// Details: `[animation, index, name...]`.
pub const ANIMATION_FRAME_EVENT: &str = "animation_frame_event";

/// Owns a set of named [`SpriteAnimation`]s over one texture, advances the
/// current one every update, and forwards its events to the scene.
#[derive(Debug, Clone)]
pub struct SpriteAnimator {
    texture: TextureHandle,
    animations: BTreeMap<String, SpriteAnimation>,
    current: Option<String>,
    pub style: SpriteStyle,
}

impl SpriteAnimator {
    pub fn new(texture: TextureHandle) -> Self {
        Self {
            texture,
            animations: BTreeMap::new(),
            current: None,
            style: SpriteStyle::default(),
        }
    }

    /// Builder-style [`add_animation`](Self::add_animation).
    pub fn with_animation(
        mut self,
        name: impl Into<String>,
        animation: SpriteAnimation,
    ) -> Result<Self, AnimationError> {
        self.add_animation(name, animation)?;
        Ok(self)
    }

    pub fn add_animation(
        &mut self,
        name: impl Into<String>,
        animation: SpriteAnimation,
    ) -> Result<(), AnimationError> {
        let name = name.into();
        if self.animations.contains_key(&name) {
            return Err(AnimationError::Duplicate {
                what: "animation",
                name,
            });
        }
        self.animations.insert(name, animation);
        Ok(())
    }

    /// Remove an animation. Removing the current one leaves nothing playing.
    pub fn remove_animation(&mut self, name: &str) -> Result<SpriteAnimation, AnimationError> {
        let animation = self
            .animations
            .remove(name)
            .ok_or_else(|| not_found(name))?;
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        Ok(animation)
    }

    /// Make `name` the current animation and start it.
    ///
    /// Switching from another animation rewinds the new one first; playing
    /// the current animation again resumes it where it is.
    pub fn play(&mut self, name: &str) -> Result<(), AnimationError> {
        let switching = self.current.as_deref() != Some(name);
        let animation = self.animations.get_mut(name).ok_or_else(|| not_found(name))?;
        if switching {
            animation.reset();
        }
        animation.play();
        self.current = Some(name.to_owned());
        Ok(())
    }

    pub fn pause(&mut self) {
        if let Some(animation) = self.current_mut() {
            animation.pause();
        }
    }

    pub fn stop(&mut self) {
        if let Some(animation) = self.current_mut() {
            animation.stop();
        }
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&SpriteAnimation> {
        self.animations.get(self.current.as_deref()?)
    }

    pub fn current_mut(&mut self) -> Option<&mut SpriteAnimation> {
        self.animations.get_mut(self.current.as_deref()?)
    }

    pub fn animation(&self, name: &str) -> Option<&SpriteAnimation> {
        self.animations.get(name)
    }

    pub fn animation_mut(&mut self, name: &str) -> Option<&mut SpriteAnimation> {
        self.animations.get_mut(name)
    }

    /// Names of all animations, sorted.
    pub fn animation_names(&self) -> impl Iterator<Item = &str> {
        self.animations.keys().map(String::as_str)
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }
}

fn not_found(name: &str) -> AnimationError {
    AnimationError::NotFound {
        what: "animation",
        name: name.to_owned(),
    }
}

impl Component for SpriteAnimator {
    fn update(&mut self, ctx: &mut ComponentContext<'_>) {
        let Some(name) = self.current.as_deref() else {
            return;
        };
        let Some(animation) = self.animations.get_mut(name) else {
            return;
        };
        animation.update(ctx.delta());

        for event in animation.drain_events() {
            match event {
                AnimationEvent::Ended => {
                    debug!(entity = %ctx.entity, animation = name, looping = animation.looping, "animation ended");
                    ctx.emit(ANIMATION_ENDED, vec![name.to_owned()]);
                }
                AnimationEvent::FrameChanged { index } => {
                    ctx.emit(ANIMATION_FRAME, vec![name.to_owned(), index.to_string()]);
                }
                AnimationEvent::FrameEvents { index, names } => {
                    let mut details = vec![name.to_owned(), index.to_string()];
                    details.extend(names);
                    ctx.emit(ANIMATION_FRAME_EVENT, details);
                }
            }
        }
    }

    fn draw(&self, ctx: &DrawContext<'_>, sink: &mut dyn RenderSink) {
        if let Some(animation) = self.current() {
            let source = animation.current_rectangle();
            sink.draw(self.style.request(ctx, self.texture, Some(source), source.size()));
        }
    }

    fn debug_draw(&self, ctx: &DrawContext<'_>, sink: &mut dyn RenderSink) {
        let size = self
            .current()
            .map(|a| a.current_rectangle().size())
            .unwrap_or(Vec2::ZERO);
        sink.draw_outline(self.style.bounds(ctx, size), self.style.debug_color);
    }

    fn clone_component(&self) -> Option<Box<dyn Component>> {
        Some(Box::new(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_ecs::prelude::*;
    use sprig_geom::shapes::Rect;

    fn strip(n: usize, looping: bool) -> SpriteAnimation {
        let frames = (0..n).map(|i| Rect::new(i as f32 * 10.0, 0.0, 10.0, 12.0)).collect();
        SpriteAnimation::new(frames, 0.1, looping).unwrap()
    }

    fn animator() -> SpriteAnimator {
        SpriteAnimator::new(TextureHandle(9))
            .with_animation("idle", strip(2, true))
            .unwrap()
            .with_animation("jump", strip(3, false))
            .unwrap()
    }

    #[test]
    fn names_must_be_unique_and_known() {
        let mut a = animator();
        assert!(matches!(
            a.add_animation("idle", strip(1, true)),
            Err(AnimationError::Duplicate { .. })
        ));
        assert!(matches!(a.play("fly"), Err(AnimationError::NotFound { .. })));
        assert_eq!(a.animation_names().collect::<Vec<_>>(), vec!["idle", "jump"]);
    }

    #[test]
    fn switching_rewinds_resuming_does_not() {
        let mut a = animator();
        a.play("jump").unwrap();
        a.current_mut().unwrap().set_current_index(2).unwrap();

        a.play("jump").unwrap();
        assert_eq!(a.current().unwrap().current_index(), 2);

        a.play("idle").unwrap();
        a.play("jump").unwrap();
        assert_eq!(a.current().unwrap().current_index(), 0);
        assert_eq!(a.current_name(), Some("jump"));
    }

    #[test]
    fn removing_current_clears_it() {
        let mut a = animator();
        a.play("idle").unwrap();
        a.remove_animation("idle").unwrap();
        assert!(a.current().is_none());
        assert!(a.remove_animation("idle").is_err());
    }

    #[test]
    fn forwards_events_to_scene_and_draws_current_frame() {
        let mut a = animator();
        a.play("jump").unwrap();
        a.current_mut().unwrap().add_frame_event("apex", 1).unwrap();

        let mut scene = Scene::new("anim");
        let id = scene
            .spawn(EntityBuilder::new("hero").at(Vec2::new(5.0, 5.0)).with_component(a))
            .unwrap();

        let mut time = FrameTime::default();
        for _ in 0..3 {
            time = time.advance(0.1);
            scene.update(time);
        }

        let events = scene.drain_events();
        let kinds: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                ANIMATION_FRAME,
                ANIMATION_FRAME_EVENT,
                ANIMATION_FRAME,
                ANIMATION_ENDED,
                ANIMATION_FRAME,
            ]
        );
        assert_eq!(events[1].details, vec!["jump", "1", "apex"]);
        assert!(events.iter().all(|e| e.entity == id));

        let mut queue = DrawQueue::new();
        scene.draw(&mut queue);
        assert_eq!(queue.requests[0].source, Some(Rect::new(20.0, 0.0, 10.0, 12.0)));
        assert_eq!(queue.requests[0].destination, Rect::new(5.0, 5.0, 10.0, 12.0));
    }
}

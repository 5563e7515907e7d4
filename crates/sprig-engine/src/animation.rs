//! Sprite animation: frame sequencing, timing and per-frame events.
//!
//! A [`SpriteAnimation`] owns a list of source rectangles (`frames`) and a
//! *frame order*, a list of indices into `frames` that says which rectangle
//! is shown at each playback position. Playback advances one position every
//! `frame_speed` seconds of accumulated `update` time.
//!
//! The animation never calls out. Everything it wants to report (end of the
//! sequence, frame changes, named frame events) is queued as an
//! [`AnimationEvent`] and taken by the owner with
//! [`drain_events`](SpriteAnimation::drain_events).
//!
//! Playback direction from a sprite-sheet description is applied once at
//! load time by [`SpriteSheet::animation`], which rewrites the rectangle
//! list; there is no runtime direction flag.
//!
//! # Example
//!
//! ```
//! use sprig_engine::animation::{AnimationEvent, SpriteAnimation};
//! use sprig_geom::shapes::Rect;
//!
//! let frames = (0..4).map(|i| Rect::new(i as f32 * 16.0, 0.0, 16.0, 16.0)).collect();
//! let mut walk = SpriteAnimation::new(frames, 0.1, false).unwrap();
//! walk.play();
//!
//! for _ in 0..4 {
//!     walk.update(0.1);
//! }
//! assert_eq!(walk.current_index(), 3);
//! assert!(walk.is_paused());
//! assert!(walk.drain_events().contains(&AnimationEvent::Ended));
//! ```

use serde::{Deserialize, Serialize};
use sprig_geom::shapes::Rect;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from building or configuring an animation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnimationError {
    /// No frames, or an empty frame order.
    #[error("animation needs at least one {what}")]
    Empty { what: &'static str },

    /// A frame-order entry points past the end of the frame list.
    #[error("frame order entry {position} refers to frame {frame}, but only {frame_count} frames exist")]
    InvalidFrameOrder {
        position: usize,
        frame: usize,
        frame_count: usize,
    },

    /// A playback index outside the frame order.
    #[error("frame index {index} is out of range (frame order has {len} entries)")]
    InvalidFrame { index: usize, len: usize },

    /// Frame duration must be positive and finite.
    #[error("invalid frame speed {seconds}s: must be positive and finite")]
    InvalidFrameSpeed { seconds: f32 },

    #[error("{what} '{name}' already exists")]
    Duplicate { what: &'static str, name: String },

    #[error("{what} '{name}' not found")]
    NotFound { what: &'static str, name: String },

    /// The sprite sheet has no tag with this name.
    #[error("sprite sheet has no tag named '{name}'")]
    TagNotFound { name: String },

    /// A tag's frame range is inverted or past the end of the sheet.
    #[error("tag '{name}' spans frames {from}..={to}, but the sheet has {frame_count} frames")]
    InvalidTagRange {
        name: String,
        from: usize,
        to: usize,
        frame_count: usize,
    },
}

/// Convert a frame duration in whole milliseconds to seconds.
pub fn frame_speed_from_ms(duration_ms: u32) -> f32 {
    duration_ms as f32 / 1000.0
}

// ---------------------------------------------------------------------------
// AnimationEvent / AnimationState
// ---------------------------------------------------------------------------

/// Something that happened during [`SpriteAnimation::update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationEvent {
    /// Playback tried to move past the last position.
    Ended,
    /// Playback settled on position `index` (also fired when a non-looping
    /// animation ends and stays where it is).
    FrameChanged { index: usize },
    /// Every named frame event registered for position `index`, in
    /// registration order.
    FrameEvents { index: usize, names: Vec<String> },
}

/// Playback state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationState {
    /// Paused at position 0. The initial state.
    Stopped,
    Playing,
    /// Paused with the current position retained.
    Paused,
}

#[derive(Debug, Clone, PartialEq)]
struct FrameEvent {
    name: String,
    index: usize,
}

// ---------------------------------------------------------------------------
// SpriteAnimation
// ---------------------------------------------------------------------------

/// A sequence of sprite-sheet rectangles played back over time.
///
/// Invariants: `frames` and `frame_order` are non-empty, every frame-order
/// entry indexes into `frames`, and `current_index < frame_order.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteAnimation {
    frames: Vec<Rect>,
    frame_order: Vec<usize>,
    frame_speed: f32,
    current_index: usize,
    /// Whether playback wraps to position 0 after the last position.
    pub looping: bool,
    state: AnimationState,
    elapsed: f32,
    frame_events: Vec<FrameEvent>,
    events: Vec<AnimationEvent>,
}

impl SpriteAnimation {
    /// Animation showing `frames` in order, `frame_speed` seconds each.
    pub fn new(frames: Vec<Rect>, frame_speed: f32, looping: bool) -> Result<Self, AnimationError> {
        let order = (0..frames.len()).collect();
        Self::with_frame_order(frames, order, frame_speed, looping)
    }

    /// Animation with an explicit frame order.
    pub fn with_frame_order(
        frames: Vec<Rect>,
        frame_order: Vec<usize>,
        frame_speed: f32,
        looping: bool,
    ) -> Result<Self, AnimationError> {
        if frames.is_empty() {
            return Err(AnimationError::Empty { what: "frame" });
        }
        if frame_order.is_empty() {
            return Err(AnimationError::Empty {
                what: "frame order entry",
            });
        }
        if let Some((position, &frame)) = frame_order
            .iter()
            .enumerate()
            .find(|&(_, &frame)| frame >= frames.len())
        {
            return Err(AnimationError::InvalidFrameOrder {
                position,
                frame,
                frame_count: frames.len(),
            });
        }
        validate_speed(frame_speed)?;

        Ok(Self {
            frames,
            frame_order,
            frame_speed,
            current_index: 0,
            looping,
            state: AnimationState::Stopped,
            elapsed: 0.0,
            frame_events: Vec::new(),
            events: Vec::new(),
        })
    }

    // -- playback control ---------------------------------------------------

    /// Start or resume playback from the current position.
    pub fn play(&mut self) {
        self.state = AnimationState::Playing;
    }

    /// Pause, keeping the current position. Has no effect when stopped.
    pub fn pause(&mut self) {
        if self.state == AnimationState::Playing {
            self.state = AnimationState::Paused;
        }
    }

    /// Pause and rewind to position 0.
    pub fn stop(&mut self) {
        self.state = AnimationState::Stopped;
        self.rewind();
    }

    /// Rewind to position 0 without changing whether playback is running.
    pub fn reset(&mut self) {
        self.rewind();
    }

    fn rewind(&mut self) {
        self.current_index = 0;
        self.elapsed = 0.0;
    }

    /// Advance playback by `dt` seconds. Does nothing while paused or
    /// stopped, or when `dt` is negative or not finite.
    pub fn update(&mut self, dt: f32) {
        if self.state != AnimationState::Playing || !(dt >= 0.0 && dt.is_finite()) {
            return;
        }
        self.elapsed += dt;
        if self.elapsed < self.frame_speed {
            return;
        }
        self.elapsed = 0.0;

        if self.current_index + 1 >= self.frame_order.len() {
            self.events.push(AnimationEvent::Ended);
            if self.looping {
                self.current_index = 0;
            } else {
                self.state = AnimationState::Paused;
            }
        } else {
            self.current_index += 1;
        }

        let index = self.current_index;
        self.events.push(AnimationEvent::FrameChanged { index });
        let names: Vec<String> = self
            .frame_events
            .iter()
            .filter(|e| e.index == index)
            .map(|e| e.name.clone())
            .collect();
        if !names.is_empty() {
            self.events.push(AnimationEvent::FrameEvents { index, names });
        }
    }

    /// Jump to playback position `index`.
    pub fn set_current_index(&mut self, index: usize) -> Result<(), AnimationError> {
        self.check_index(index)?;
        self.current_index = index;
        self.elapsed = 0.0;
        Ok(())
    }

    pub fn set_frame_speed(&mut self, seconds: f32) -> Result<(), AnimationError> {
        validate_speed(seconds)?;
        self.frame_speed = seconds;
        Ok(())
    }

    // -- frame events -------------------------------------------------------

    /// Fire a [`AnimationEvent::FrameEvents`] carrying `name` whenever
    /// playback lands on position `index`.
    pub fn add_frame_event(&mut self, name: impl Into<String>, index: usize) -> Result<(), AnimationError> {
        let name = name.into();
        if self.frame_events.iter().any(|e| e.name == name) {
            return Err(AnimationError::Duplicate {
                what: "frame event",
                name,
            });
        }
        self.check_index(index)?;
        self.frame_events.push(FrameEvent { name, index });
        Ok(())
    }

    pub fn remove_frame_event(&mut self, name: &str) -> Result<(), AnimationError> {
        let pos = self
            .frame_events
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| AnimationError::NotFound {
                what: "frame event",
                name: name.to_owned(),
            })?;
        self.frame_events.remove(pos);
        Ok(())
    }

    /// Names of the frame events registered for position `index`.
    pub fn frame_events_at(&self, index: usize) -> impl Iterator<Item = &str> {
        self.frame_events
            .iter()
            .filter(move |e| e.index == index)
            .map(|e| e.name.as_str())
    }

    /// Take every event queued since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<AnimationEvent> {
        std::mem::take(&mut self.events)
    }

    // -- accessors ----------------------------------------------------------

    /// Source rectangle for the current playback position.
    pub fn current_rectangle(&self) -> Rect {
        self.frames[self.frame_order[self.current_index]]
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == AnimationState::Playing
    }

    /// True when stopped or paused.
    pub fn is_paused(&self) -> bool {
        self.state != AnimationState::Playing
    }

    pub fn frame_speed(&self) -> f32 {
        self.frame_speed
    }

    pub fn frames(&self) -> &[Rect] {
        &self.frames
    }

    pub fn frame_order(&self) -> &[usize] {
        &self.frame_order
    }

    /// Seconds for one full pass through the frame order.
    pub fn duration(&self) -> f32 {
        self.frame_speed * self.frame_order.len() as f32
    }

    fn check_index(&self, index: usize) -> Result<(), AnimationError> {
        if index < self.frame_order.len() {
            Ok(())
        } else {
            Err(AnimationError::InvalidFrame {
                index,
                len: self.frame_order.len(),
            })
        }
    }
}

fn validate_speed(seconds: f32) -> Result<(), AnimationError> {
    if seconds > 0.0 && seconds.is_finite() {
        Ok(())
    } else {
        Err(AnimationError::InvalidFrameSpeed { seconds })
    }
}

// ---------------------------------------------------------------------------
// Sprite sheet description
// ---------------------------------------------------------------------------

/// How a tagged frame range is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationDirection {
    #[default]
    Forward,
    Reverse,
    PingPong,
}

/// One cell of a sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SheetFrame {
    pub source: Rect,
    pub duration_ms: u32,
}

/// A named, inclusive range of sheet frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameTag {
    pub name: String,
    pub from: usize,
    pub to: usize,
    #[serde(default)]
    pub direction: AnimationDirection,
}

/// Frame list and tags exported by a sprite-sheet tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub frames: Vec<SheetFrame>,
    #[serde(default)]
    pub tags: Vec<FrameTag>,
}

impl SpriteSheet {
    pub fn tag(&self, name: &str) -> Option<&FrameTag> {
        self.tags.iter().find(|t| t.name == name)
    }

    /// Build the animation for tag `name`.
    ///
    /// The tag's direction is baked into the rectangle list: `Reverse`
    /// reverses it, `PingPong` appends the interior frames in reverse so the
    /// sequence runs there and back without repeating its endpoints. The
    /// frame speed is taken from the tag's first frame.
    pub fn animation(&self, name: &str, looping: bool) -> Result<SpriteAnimation, AnimationError> {
        let tag = self.tag(name).ok_or_else(|| AnimationError::TagNotFound {
            name: name.to_owned(),
        })?;
        if tag.from > tag.to || tag.to >= self.frames.len() {
            return Err(AnimationError::InvalidTagRange {
                name: tag.name.clone(),
                from: tag.from,
                to: tag.to,
                frame_count: self.frames.len(),
            });
        }

        let cells = &self.frames[tag.from..=tag.to];
        let forward: Vec<Rect> = cells.iter().map(|f| f.source).collect();
        let rects = apply_direction(forward, tag.direction);
        SpriteAnimation::new(rects, frame_speed_from_ms(cells[0].duration_ms), looping)
    }

    /// One animation per tag, in tag order.
    pub fn animations(&self, looping: bool) -> Result<Vec<(String, SpriteAnimation)>, AnimationError> {
        self.tags
            .iter()
            .map(|t| Ok((t.name.clone(), self.animation(&t.name, looping)?)))
            .collect()
    }

    /// Animation over every frame of the sheet, in order.
    pub fn whole_sheet(&self, looping: bool) -> Result<SpriteAnimation, AnimationError> {
        let first = self.frames.first().ok_or(AnimationError::Empty { what: "frame" })?;
        SpriteAnimation::new(
            self.frames.iter().map(|f| f.source).collect(),
            frame_speed_from_ms(first.duration_ms),
            looping,
        )
    }
}

/// Rewrite a forward rectangle sequence for `direction`.
pub fn apply_direction(mut rects: Vec<Rect>, direction: AnimationDirection) -> Vec<Rect> {
    match direction {
        AnimationDirection::Forward => rects,
        AnimationDirection::Reverse => {
            rects.reverse();
            rects
        }
        AnimationDirection::PingPong => {
            if rects.len() > 2 {
                let back: Vec<Rect> = rects[1..rects.len() - 1].iter().rev().copied().collect();
                rects.extend(back);
            }
            rects
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rects(n: usize) -> Vec<Rect> {
        (0..n).map(|i| Rect::new(i as f32, 0.0, 1.0, 1.0)).collect()
    }

    fn four_frames(looping: bool) -> SpriteAnimation {
        SpriteAnimation::new(rects(4), 0.1, looping).unwrap()
    }

    #[test]
    fn bad_deltas_do_not_advance() {
        let mut anim = SpriteAnimation::new(rects(4), 10.0, true).unwrap();
        anim.play();
        for dt in [f32::NAN, f32::INFINITY, -1.0, f32::NAN] {
            anim.update(dt);
        }
        assert_eq!(anim.current_index(), 0);
        assert!(anim.drain_events().is_empty());

        anim.update(10.0);
        assert_eq!(anim.current_index(), 1);
    }

    #[test]
    fn non_looping_plays_through_then_freezes() {
        let mut anim = four_frames(false);
        anim.play();

        let mut indices = vec![anim.current_index()];
        let mut ended_on = Vec::new();
        for step in 1..=4 {
            anim.update(0.1);
            indices.push(anim.current_index());
            if anim.drain_events().contains(&AnimationEvent::Ended) {
                ended_on.push(step);
            }
        }

        assert_eq!(indices, vec![0, 1, 2, 3, 3]);
        assert_eq!(ended_on, vec![4]);
        assert!(anim.is_paused());
        assert_eq!(anim.state(), AnimationState::Paused);
        assert_eq!(anim.current_rectangle(), Rect::new(3.0, 0.0, 1.0, 1.0));

        anim.update(0.1);
        assert!(anim.drain_events().is_empty());
    }

    #[test]
    fn looping_wraps_to_zero() {
        let mut anim = four_frames(true);
        anim.play();
        for _ in 0..4 {
            anim.update(0.1);
        }
        assert_eq!(anim.current_index(), 0);
        assert!(anim.is_playing());
    }

    #[test]
    fn event_order_on_end() {
        let mut anim = four_frames(false);
        anim.add_frame_event("land", 3).unwrap();
        anim.play();
        anim.set_current_index(3).unwrap();
        anim.update(0.1);
        assert_eq!(
            anim.drain_events(),
            vec![
                AnimationEvent::Ended,
                AnimationEvent::FrameChanged { index: 3 },
                AnimationEvent::FrameEvents {
                    index: 3,
                    names: vec!["land".to_owned()]
                },
            ]
        );
    }

    #[test]
    fn frame_events_are_batched() {
        let mut anim = four_frames(false);
        anim.add_frame_event("step", 1).unwrap();
        anim.add_frame_event("dust", 1).unwrap();
        anim.add_frame_event("swing", 2).unwrap();
        anim.play();
        anim.update(0.1);

        let events = anim.drain_events();
        assert_eq!(
            events[1],
            AnimationEvent::FrameEvents {
                index: 1,
                names: vec!["step".to_owned(), "dust".to_owned()]
            }
        );
        assert_eq!(anim.frame_events_at(2).collect::<Vec<_>>(), vec!["swing"]);
    }

    #[test]
    fn frame_event_errors() {
        let mut anim = four_frames(false);
        anim.add_frame_event("a", 0).unwrap();
        assert!(matches!(
            anim.add_frame_event("a", 1),
            Err(AnimationError::Duplicate { .. })
        ));
        assert!(matches!(
            anim.add_frame_event("b", 4),
            Err(AnimationError::InvalidFrame { index: 4, len: 4 })
        ));
        assert!(matches!(
            anim.remove_frame_event("zzz"),
            Err(AnimationError::NotFound { .. })
        ));
        anim.remove_frame_event("a").unwrap();
    }

    #[test]
    fn accumulates_partial_steps() {
        let mut anim = four_frames(false);
        anim.play();
        anim.update(0.04);
        anim.update(0.04);
        assert_eq!(anim.current_index(), 0);
        anim.update(0.04);
        assert_eq!(anim.current_index(), 1);
    }

    #[test]
    fn paused_ignores_update() {
        let mut anim = four_frames(true);
        anim.update(1.0);
        assert_eq!(anim.current_index(), 0);
        assert_eq!(anim.state(), AnimationState::Stopped);

        anim.play();
        anim.update(0.1);
        anim.pause();
        anim.update(0.1);
        assert_eq!(anim.current_index(), 1);
        assert_eq!(anim.state(), AnimationState::Paused);
    }

    #[test]
    fn stop_and_reset() {
        let mut anim = four_frames(true);
        anim.play();
        anim.update(0.1);
        anim.update(0.1);

        anim.reset();
        assert_eq!(anim.current_index(), 0);
        assert!(anim.is_playing());

        anim.update(0.1);
        anim.stop();
        assert_eq!(anim.current_index(), 0);
        assert_eq!(anim.state(), AnimationState::Stopped);
    }

    #[test]
    fn construction_is_validated() {
        assert!(matches!(
            SpriteAnimation::new(vec![], 0.1, false),
            Err(AnimationError::Empty { .. })
        ));
        assert!(matches!(
            SpriteAnimation::with_frame_order(rects(2), vec![], 0.1, false),
            Err(AnimationError::Empty { .. })
        ));
        assert!(matches!(
            SpriteAnimation::with_frame_order(rects(2), vec![0, 2], 0.1, false),
            Err(AnimationError::InvalidFrameOrder {
                position: 1,
                frame: 2,
                frame_count: 2
            })
        ));
        assert!(matches!(
            SpriteAnimation::new(rects(2), 0.0, false),
            Err(AnimationError::InvalidFrameSpeed { .. })
        ));
    }

    #[test]
    fn frame_order_indirection() {
        let mut anim = SpriteAnimation::with_frame_order(rects(2), vec![1, 0, 1], 0.1, false).unwrap();
        assert_eq!(anim.current_rectangle().x, 1.0);
        anim.play();
        anim.update(0.1);
        assert_eq!(anim.current_rectangle().x, 0.0);
        assert!((anim.duration() - 0.3).abs() < 1e-6);
    }

    #[test]
    fn milliseconds_use_float_division() {
        assert_eq!(frame_speed_from_ms(100), 0.1);
        assert_eq!(frame_speed_from_ms(1500), 1.5);
        assert_eq!(frame_speed_from_ms(1), 0.001);
    }

    fn sheet() -> SpriteSheet {
        let frames = (0..6)
            .map(|i| SheetFrame {
                source: Rect::new(i as f32 * 8.0, 0.0, 8.0, 8.0),
                duration_ms: 120,
            })
            .collect();
        let tag = |name: &str, from, to, direction| FrameTag {
            name: name.to_owned(),
            from,
            to,
            direction,
        };
        SpriteSheet {
            frames,
            tags: vec![
                tag("run", 0, 3, AnimationDirection::Forward),
                tag("back", 0, 3, AnimationDirection::Reverse),
                tag("bob", 0, 3, AnimationDirection::PingPong),
                tag("broken", 4, 9, AnimationDirection::Forward),
            ],
        }
    }

    fn xs(anim: &SpriteAnimation) -> Vec<f32> {
        anim.frames().iter().map(|r| r.x / 8.0).collect()
    }

    #[test]
    fn sheet_directions_rewrite_frames() {
        let sheet = sheet();
        assert_eq!(xs(&sheet.animation("run", true).unwrap()), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(xs(&sheet.animation("back", true).unwrap()), vec![3.0, 2.0, 1.0, 0.0]);
        assert_eq!(
            xs(&sheet.animation("bob", true).unwrap()),
            vec![0.0, 1.0, 2.0, 3.0, 2.0, 1.0]
        );
        assert_eq!(sheet.animation("run", true).unwrap().frame_speed(), 0.12);
    }

    #[test]
    fn ping_pong_of_two_frames_has_no_interior() {
        let two = rects(2);
        assert_eq!(apply_direction(two.clone(), AnimationDirection::PingPong), two);
    }

    #[test]
    fn sheet_errors() {
        let sheet = sheet();
        assert!(matches!(
            sheet.animation("fly", false),
            Err(AnimationError::TagNotFound { .. })
        ));
        assert!(matches!(
            sheet.animation("broken", false),
            Err(AnimationError::InvalidTagRange { .. })
        ));
        assert!(sheet.animations(false).is_err());
        assert!(matches!(
            SpriteSheet::default().whole_sheet(false),
            Err(AnimationError::Empty { .. })
        ));
    }

    #[test]
    fn sheet_deserializes_with_lowercase_direction() {
        let json = r#"{
            "frames": [
                {"source": {"x": 0.0, "y": 0.0, "width": 4.0, "height": 4.0}, "duration_ms": 50},
                {"source": {"x": 4.0, "y": 0.0, "width": 4.0, "height": 4.0}, "duration_ms": 50}
            ],
            "tags": [{"name": "blink", "from": 0, "to": 1, "direction": "reverse"}]
        }"#;
        let sheet: SpriteSheet = serde_json::from_str(json).unwrap();
        assert_eq!(sheet.tags[0].direction, AnimationDirection::Reverse);
        assert_eq!(sheet.whole_sheet(true).unwrap().frames().len(), 2);
    }
}

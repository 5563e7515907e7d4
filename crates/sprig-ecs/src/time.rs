//! Per-frame timing handed to every update.

use serde::{Deserialize, Serialize};

/// Timing of the frame being processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameTime {
    /// Seconds elapsed since the previous frame.
    pub delta: f32,
    /// Seconds elapsed since the first frame.
    pub total: f64,
    /// Number of the frame, starting at 0.
    pub frame: u64,
}

impl FrameTime {
    /// Timing of the frame after `self`, `delta` seconds later.
    pub fn advance(self, delta: f32) -> Self {
        Self {
            delta,
            total: self.total + f64::from(delta),
            frame: self.frame + 1,
        }
    }
}

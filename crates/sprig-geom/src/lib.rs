//! Sprig Geom -- 2D shape value types and narrow-phase collision tests.
//!
//! Shapes ([`Rect`], [`Circle`], [`Polygon`], [`LineSegment`]) are plain values
//! compared structurally. The
//! [`collision`] module holds pure functions that take two shapes and return
//! a response record. Nothing here knows about entities or frames; game code
//! calls these routines ad hoc.
//!
//! # Quick Start
//!
//! ```
//! use sprig_geom::prelude::*;
//!
//! let a = Rect::new(0.0, 0.0, 10.0, 10.0);
//! let b = Rect::new(5.0, 5.0, 10.0, 10.0);
//!
//! let response = rect_vs_rect(&a, &b);
//! assert!(response.colliding);
//! assert_eq!(response.depth, 5.0);
//! ```

#![deny(unsafe_code)]

pub mod collision;
pub mod shapes;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced when building or querying shapes.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// An argument was outside the accepted domain (e.g. too few segments).
    #[error("invalid argument '{argument}': {reason}")]
    InvalidArgument {
        argument: &'static str,
        reason: String,
    },

    /// Two parallel coordinate arrays did not have the same length.
    #[error("mismatched lengths: {left} x-coordinates but {right} y-coordinates")]
    MismatchedLengths {
        left: usize,
        right: usize,
    },

    /// An operation needed at least one element and got none.
    #[error("cannot {operation} an empty collection")]
    Empty {
        operation: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::collision::{
        circle_vs_circle, polygon_vs_polygon, rect_vs_rect, segment_vs_segment,
        CircleCollisionResponse, CollisionResponse, Contact, PolygonCollisionResponse,
        RectangleCollisionResponse,
    };
    pub use crate::shapes::{average, Circle, LineSegment, Polygon, Rect};
    pub use crate::GeometryError;
    pub use glam::Vec2;
}

//! Shape value types: [`Rect`], [`Circle`], [`LineSegment`], [`Polygon`].
//!
//! All shapes are values. [`Rect`], [`Circle`] and [`LineSegment`] are `Copy`;
//! [`Polygon`] owns its vertex list and is `Clone`. A polygon's convexity is
//! computed once at construction. Its vertices cannot be mutated in place, so
//! the flag always describes the vertices it is stored with; transforms such
//! as [`Polygon::translated`] build a new polygon.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::GeometryError;

/// Cross products and squared lengths below this are treated as zero.
const EPSILON: f32 = 1e-6;

// ---------------------------------------------------------------------------
// Rect
// ---------------------------------------------------------------------------

/// An axis-aligned rectangle given by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle centred on `center` with the given half-extents.
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(
            center.x - half_extents.x,
            center.y - half_extents.y,
            half_extents.x * 2.0,
            half_extents.y * 2.0,
        )
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    /// Whether the rectangle has zero or negative area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Point containment. Left and top edges are inside, right and bottom
    /// edges are outside, so tiled rectangles never both claim a point.
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    /// Strict overlap test; rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    pub fn translated(&self, offset: Vec2) -> Rect {
        Rect::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }
}

// ---------------------------------------------------------------------------
// Circle
// ---------------------------------------------------------------------------

/// A circle with a centre and a non-negative radius.
///
/// A zero radius is allowed and behaves as a point in every test.
///
/// The radius is only reachable through [`Circle::radius`] and
/// [`Circle::set_radius`], so it is always finite and non-negative.
/// Deserialization validates it the same way.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawCircle")]
pub struct Circle {
    pub center: Vec2,
    radius: f32,
}

#[derive(Deserialize)]
struct RawCircle {
    center: Vec2,
    radius: f32,
}

impl TryFrom<RawCircle> for Circle {
    type Error = GeometryError;

    fn try_from(raw: RawCircle) -> Result<Self, Self::Error> {
        Circle::new(raw.center, raw.radius)
    }
}

impl Circle {
    /// Create a circle, rejecting negative or non-finite radii.
    pub fn new(center: Vec2, radius: f32) -> Result<Self, GeometryError> {
        if !radius.is_finite() || radius < 0.0 {
            return Err(GeometryError::InvalidArgument {
                argument: "radius",
                reason: format!("must be finite and non-negative, got {radius}"),
            });
        }
        Ok(Self { center, radius })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Change the radius, with the same checks as [`Circle::new`].
    pub fn set_radius(&mut self, radius: f32) -> Result<(), GeometryError> {
        *self = Self::new(self.center, radius)?;
        Ok(())
    }

    /// A zero-radius circle at `center`.
    pub fn point(center: Vec2) -> Self {
        Self {
            center,
            radius: 0.0,
        }
    }

    pub fn diameter(&self) -> f32 {
        self.radius * 2.0
    }

    pub fn circumference(&self) -> f32 {
        TAU * self.radius
    }

    pub fn area(&self) -> f32 {
        PI * self.radius * self.radius
    }

    /// Strict containment: points on the boundary are outside. This matches
    /// [`circle_vs_circle`](crate::collision::circle_vs_circle), where
    /// touching circles do not collide.
    pub fn contains_point(&self, point: Vec2) -> bool {
        self.center.distance_squared(point) < self.radius * self.radius
    }

    /// Smallest axis-aligned rectangle enclosing the circle.
    pub fn bounds(&self) -> Rect {
        Rect::from_center(self.center, Vec2::splat(self.radius))
    }

    /// Approximate the circle with a regular polygon of `segments` sides.
    ///
    /// Fails with [`GeometryError::InvalidArgument`] for fewer than three
    /// segments or a radius that is not strictly positive.
    pub fn to_polygon(&self, segments: usize) -> Result<Polygon, GeometryError> {
        if segments < 3 {
            return Err(GeometryError::InvalidArgument {
                argument: "segments",
                reason: format!("a circle needs at least 3 segments, got {segments}"),
            });
        }
        if self.radius <= 0.0 {
            return Err(GeometryError::InvalidArgument {
                argument: "radius",
                reason: format!("must be positive to build a polygon, got {}", self.radius),
            });
        }
        let step = TAU / segments as f32;
        let vertices = (0..segments)
            .map(|i| {
                let angle = step * i as f32;
                self.center + Vec2::new(angle.cos(), angle.sin()) * self.radius
            })
            .collect();
        Polygon::new(vertices)
    }
}

// ---------------------------------------------------------------------------
// LineSegment
// ---------------------------------------------------------------------------

/// A straight segment between two points.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Vec2,
    pub end: Vec2,
}

impl LineSegment {
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }

    /// Unnormalized vector from `start` to `end`.
    pub fn vector(&self) -> Vec2 {
        self.end - self.start
    }

    /// Unit direction, or zero for a degenerate segment.
    pub fn direction(&self) -> Vec2 {
        self.vector().normalize_or_zero()
    }

    /// Unit normal (direction rotated a quarter turn), or zero for a
    /// degenerate segment.
    pub fn normal(&self) -> Vec2 {
        let v = self.vector();
        Vec2::new(v.y, -v.x).normalize_or_zero()
    }

    /// Point on the segment closest to `point`.
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        let v = self.vector();
        let len_sq = v.length_squared();
        if len_sq <= EPSILON {
            return self.start;
        }
        let t = ((point - self.start).dot(v) / len_sq).clamp(0.0, 1.0);
        self.start + v * t
    }

    /// Crossing point of two segments, if they cross.
    ///
    /// Parallel and collinear segments report `None`.
    pub fn intersection(&self, other: &LineSegment) -> Option<Vec2> {
        let r = self.vector();
        let s = other.vector();
        let denom = r.perp_dot(s);
        if denom.abs() <= EPSILON {
            return None;
        }
        let qp = other.start - self.start;
        let t = qp.perp_dot(s) / denom;
        let u = qp.perp_dot(r) / denom;
        if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
            Some(self.start + r * t)
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Polygon
// ---------------------------------------------------------------------------

/// A closed polygon. The last vertex connects back to the first.
///
/// Single-point and two-point polygons are accepted; they have no area and
/// are always considered convex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec2>", into = "Vec<Vec2>")]
pub struct Polygon {
    vertices: Vec<Vec2>,
    convex: bool,
}

impl Polygon {
    /// Build a polygon, failing with [`GeometryError::Empty`] when no
    /// vertices are given.
    pub fn new(vertices: Vec<Vec2>) -> Result<Self, GeometryError> {
        if vertices.is_empty() {
            return Err(GeometryError::Empty {
                operation: "build a polygon from",
            });
        }
        let convex = winding_is_consistent(&vertices);
        Ok(Self { vertices, convex })
    }

    /// Build a polygon from parallel coordinate arrays.
    pub fn from_coords(xs: &[f32], ys: &[f32]) -> Result<Self, GeometryError> {
        if xs.len() != ys.len() {
            return Err(GeometryError::MismatchedLengths {
                left: xs.len(),
                right: ys.len(),
            });
        }
        Self::new(xs.iter().zip(ys).map(|(&x, &y)| Vec2::new(x, y)).collect())
    }

    /// The four corners of `rect`, clockwise in screen coordinates.
    pub fn from_rect(rect: &Rect) -> Self {
        let vertices = vec![
            Vec2::new(rect.left(), rect.top()),
            Vec2::new(rect.right(), rect.top()),
            Vec2::new(rect.right(), rect.bottom()),
            Vec2::new(rect.left(), rect.bottom()),
        ];
        Self {
            vertices,
            convex: true,
        }
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Always `false`; construction rejects empty vertex lists.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_convex(&self) -> bool {
        self.convex
    }

    /// Edges in vertex order, including the closing edge.
    pub fn edges(&self) -> impl Iterator<Item = LineSegment> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| LineSegment::new(self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Average of the vertices.
    pub fn centroid(&self) -> Vec2 {
        self.vertices.iter().copied().sum::<Vec2>() / self.vertices.len() as f32
    }

    /// Sum of edge lengths.
    pub fn perimeter(&self) -> f32 {
        self.edges().map(|e| e.length()).sum()
    }

    pub fn bounds(&self) -> Rect {
        let first = self.vertices[0];
        let (min, max) = self
            .vertices
            .iter()
            .fold((first, first), |(min, max), &v| (min.min(v), max.max(v)));
        Rect::new(min.x, min.y, max.x - min.x, max.y - min.y)
    }

    /// Crossing-number containment test; valid for concave polygons too.
    pub fn contains_point(&self, point: Vec2) -> bool {
        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let vi = self.vertices[i];
            let vj = self.vertices[j];
            if (vi.y > point.y) != (vj.y > point.y)
                && point.x < (vj.x - vi.x) * (point.y - vi.y) / (vj.y - vi.y) + vi.x
            {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    pub fn translated(&self, offset: Vec2) -> Polygon {
        Polygon {
            vertices: self.vertices.iter().map(|&v| v + offset).collect(),
            convex: self.convex,
        }
    }

    /// Rotate every vertex by `radians` around `pivot`.
    pub fn rotated(&self, radians: f32, pivot: Vec2) -> Polygon {
        let rotation = Vec2::from_angle(radians);
        Polygon {
            vertices: self
                .vertices
                .iter()
                .map(|&v| pivot + rotation.rotate(v - pivot))
                .collect(),
            convex: self.convex,
        }
    }
}

impl TryFrom<Vec<Vec2>> for Polygon {
    type Error = GeometryError;

    fn try_from(vertices: Vec<Vec2>) -> Result<Self, Self::Error> {
        Polygon::new(vertices)
    }
}

impl From<Polygon> for Vec<Vec2> {
    fn from(polygon: Polygon) -> Self {
        polygon.vertices
    }
}

/// Every turn between consecutive edges goes the same way (collinear
/// vertices are ignored).
fn winding_is_consistent(vertices: &[Vec2]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return true;
    }
    let mut sign = 0.0_f32;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let c = vertices[(i + 2) % n];
        let cross = (b - a).perp_dot(c - b);
        if cross.abs() <= EPSILON {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Mean of a set of points. Fails on an empty slice instead of dividing by zero.
pub fn average(points: &[Vec2]) -> Result<Vec2, GeometryError> {
    if points.is_empty() {
        return Err(GeometryError::Empty {
            operation: "average",
        });
    }
    Ok(points.iter().copied().sum::<Vec2>() / points.len() as f32)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Narrow-phase collision tests between pairs of shapes.
//!
//! Every function here is pure: it reads two shapes and returns a
//! [`CollisionResponse`] describing whether they overlap and, if so, how to
//! push them apart. Responses are immutable records. A non-colliding result
//! is built with [`CollisionResponse::no_collision`] and callers should use
//! [`CollisionResponse::contact`] (an `Option`) rather than inspecting the
//! zeroed fields.
//!
//! Conventions shared by all tests:
//!
//! - Touching is not colliding. Shapes whose boundaries meet but whose
//!   interiors do not overlap report no collision.
//! - `normal` is a unit vector pointing from the first shape toward the
//!   second, and `penetration` is `normal * depth`: moving the second shape
//!   by `penetration` separates the pair.
//!
//! # Example
//!
//! ```
//! use sprig_geom::prelude::*;
//!
//! let a = Circle::new(Vec2::new(0.0, 0.0), 1.0).unwrap();
//! let b = Circle::new(Vec2::new(1.5, 0.0), 1.0).unwrap();
//!
//! let hit = circle_vs_circle(&a, &b).contact().unwrap();
//! assert_eq!(hit.normal, Vec2::X);
//! assert!((hit.depth - 0.5).abs() < 1e-6);
//! ```

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::shapes::{Circle, LineSegment, Polygon, Rect};

/// Axes shorter than this (squared) are skipped by the SAT test.
const AXIS_EPSILON: f32 = 1e-12;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Resolution data for a collision that happened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// Overlap distance along `normal`.
    pub depth: f32,
    /// `normal * depth`.
    pub penetration: Vec2,
    /// A representative point of the contact.
    pub position: Vec2,
    /// Unit vector from the first shape toward the second.
    pub normal: Vec2,
}

/// Result of a narrow-phase test.
///
/// `other` is the second shape passed to the test, kept so a caller that
/// checks many pairs can tell which one a response refers to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollisionResponse<S> {
    pub colliding: bool,
    pub depth: f32,
    pub penetration: Vec2,
    pub position: Vec2,
    pub normal: Vec2,
    pub other: S,
}

pub type RectangleCollisionResponse = CollisionResponse<Rect>;
pub type CircleCollisionResponse = CollisionResponse<Circle>;
pub type PolygonCollisionResponse = CollisionResponse<Polygon>;

impl<S> CollisionResponse<S> {
    /// The canonical "no collision" response for `other`.
    pub fn no_collision(other: S) -> Self {
        Self {
            colliding: false,
            depth: 0.0,
            penetration: Vec2::ZERO,
            position: Vec2::ZERO,
            normal: Vec2::ZERO,
            other,
        }
    }

    fn hit(other: S, contact: Contact) -> Self {
        Self {
            colliding: true,
            depth: contact.depth,
            penetration: contact.penetration,
            position: contact.position,
            normal: contact.normal,
            other,
        }
    }

    /// Contact data when the shapes collide, `None` otherwise.
    pub fn contact(&self) -> Option<Contact> {
        self.colliding.then_some(Contact {
            depth: self.depth,
            penetration: self.penetration,
            position: self.position,
            normal: self.normal,
        })
    }
}

/// `-1` for negative values, `1` otherwise (zero counts as positive so the
/// resulting axis normal is always a unit vector).
fn sign(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

// ---------------------------------------------------------------------------
// AABB vs AABB
// ---------------------------------------------------------------------------

/// Axis-aligned rectangle overlap.
///
/// The overlap on each axis is the sum of half-extents minus the distance
/// between centres. If either is `<= 0` there is no collision. Otherwise the
/// pair is resolved along the axis with the smaller overlap; X is chosen only
/// when its overlap is strictly smaller, so ties resolve on Y. The contact
/// lies on `a`'s edge along the resolved axis and on `b`'s centre line on the
/// other axis.
pub fn rect_vs_rect(a: &Rect, b: &Rect) -> RectangleCollisionResponse {
    let a_center = a.center();
    let b_center = b.center();
    let a_half = a.half_extents();
    let b_half = b.half_extents();

    let dx = b_center.x - a_center.x;
    let px = (a_half.x + b_half.x) - dx.abs();
    if px <= 0.0 {
        return CollisionResponse::no_collision(*b);
    }

    let dy = b_center.y - a_center.y;
    let py = (a_half.y + b_half.y) - dy.abs();
    if py <= 0.0 {
        return CollisionResponse::no_collision(*b);
    }

    let contact = if px < py {
        let sx = sign(dx);
        Contact {
            depth: px,
            penetration: Vec2::new(px * sx, 0.0),
            position: Vec2::new(a_center.x + a_half.x * sx, b_center.y),
            normal: Vec2::new(sx, 0.0),
        }
    } else {
        let sy = sign(dy);
        Contact {
            depth: py,
            penetration: Vec2::new(0.0, py * sy),
            position: Vec2::new(b_center.x, a_center.y + a_half.y * sy),
            normal: Vec2::new(0.0, sy),
        }
    };
    CollisionResponse::hit(*b, contact)
}

// ---------------------------------------------------------------------------
// Circle vs circle
// ---------------------------------------------------------------------------

/// Circle overlap. Circles whose centres are exactly `a.radius() + b.radius()`
/// apart touch but do not collide.
///
/// Concentric circles have no meaningful direction between them; they
/// resolve along +X. The contact position is the middle of the overlapping
/// span on the line between the centres.
pub fn circle_vs_circle(a: &Circle, b: &Circle) -> CircleCollisionResponse {
    let offset = b.center - a.center;
    let distance = offset.length();
    let radii = a.radius() + b.radius();
    if distance >= radii {
        return CollisionResponse::no_collision(*b);
    }

    let normal = if distance > 0.0 {
        offset / distance
    } else {
        Vec2::X
    };
    let depth = radii - distance;
    CollisionResponse::hit(
        *b,
        Contact {
            depth,
            penetration: normal * depth,
            position: a.center + normal * (a.radius() - depth * 0.5),
            normal,
        },
    )
}

// ---------------------------------------------------------------------------
// Polygon vs polygon (SAT)
// ---------------------------------------------------------------------------

/// Separating-axis test for convex polygons.
///
/// The normal of every edge of `a`, then of every edge of `b`, is tried as a
/// separating axis. Both vertex sets are projected onto it and the first axis
/// where `min_a >= max_b || min_b >= max_a` ends the test with no collision.
/// Otherwise the axis with the smallest overlap gives the depth and normal.
///
/// Zero-length edges (repeated vertices) are skipped. If no axis can be
/// tested at all (two single points) the result is no collision. Concave
/// input is not rejected, but the answer is only exact for convex shapes
/// (see [`Polygon::is_convex`]).
pub fn polygon_vs_polygon(a: &Polygon, b: &Polygon) -> PolygonCollisionResponse {
    let mut best: Option<(f32, Vec2)> = None;

    for axis in edge_axes(a).chain(edge_axes(b)) {
        let (min_a, max_a) = project(a.vertices(), axis);
        let (min_b, max_b) = project(b.vertices(), axis);
        if min_a >= max_b || min_b >= max_a {
            return CollisionResponse::no_collision(b.clone());
        }

        // Distance needed to push b out past either end of a.
        let forward = max_a - min_b;
        let backward = max_b - min_a;
        let (overlap, direction) = if forward <= backward {
            (forward, axis)
        } else {
            (backward, -axis)
        };

        if best.map_or(true, |(depth, _)| overlap < depth) {
            best = Some((overlap, direction));
        }
    }

    let Some((depth, normal)) = best else {
        return CollisionResponse::no_collision(b.clone());
    };

    // Deepest vertex of b along the push direction.
    let position = b
        .vertices()
        .iter()
        .copied()
        .min_by(|p, q| p.dot(normal).total_cmp(&q.dot(normal)))
        .unwrap_or_else(|| b.centroid());

    CollisionResponse::hit(
        b.clone(),
        Contact {
            depth,
            penetration: normal * depth,
            position,
            normal,
        },
    )
}

fn edge_axes(polygon: &Polygon) -> impl Iterator<Item = Vec2> + '_ {
    polygon.edges().filter_map(|edge| {
        let v = edge.vector();
        let axis = Vec2::new(v.y, -v.x);
        (axis.length_squared() > AXIS_EPSILON).then(|| axis.normalize())
    })
}

fn project(vertices: &[Vec2], axis: Vec2) -> (f32, f32) {
    vertices
        .iter()
        .map(|v| v.dot(axis))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), p| {
            (min.min(p), max.max(p))
        })
}

// ---------------------------------------------------------------------------
// Segment vs segment
// ---------------------------------------------------------------------------

/// Crossing point of two segments. Parallel segments never cross.
pub fn segment_vs_segment(a: &LineSegment, b: &LineSegment) -> Option<Vec2> {
    a.intersection(b)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn circle(x: f32, y: f32, r: f32) -> Circle {
        Circle::new(Vec2::new(x, y), r).unwrap()
    }

    fn unit_square_at(x: f32, y: f32) -> Polygon {
        Polygon::from_rect(&Rect::new(x, y, 1.0, 1.0))
    }

    // -- rect vs rect -------------------------------------------------------

    #[test]
    fn rect_tie_resolves_on_y() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        let r = rect_vs_rect(&a, &b);

        assert!(r.colliding);
        assert_eq!(r.depth, 5.0);
        assert_eq!(r.normal, Vec2::new(0.0, 1.0));
        assert_eq!(r.penetration, Vec2::new(0.0, 5.0));
        assert_eq!(r.position, Vec2::new(10.0, 10.0));
        assert_eq!(r.other, b);
    }

    #[test]
    fn rect_resolves_along_smaller_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(-8.0, 1.0, 10.0, 10.0);
        let hit = rect_vs_rect(&a, &b).contact().unwrap();

        assert_eq!(hit.depth, 2.0);
        assert_eq!(hit.normal, Vec2::new(-1.0, 0.0));
        assert_eq!(hit.position, Vec2::new(0.0, 6.0));
    }

    #[test]
    fn rects_sharing_an_edge_do_not_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        let r = rect_vs_rect(&a, &b);
        assert!(!r.colliding);
        assert_eq!(r.contact(), None);
        assert_eq!(r, RectangleCollisionResponse::no_collision(b));
    }

    #[test]
    fn identical_rects_have_unit_normal() {
        let a = Rect::new(0.0, 0.0, 4.0, 4.0);
        let hit = rect_vs_rect(&a, &a).contact().unwrap();
        assert_eq!(hit.normal.length(), 1.0);
        assert_eq!(hit.depth, 4.0);
    }

    // -- circle vs circle ---------------------------------------------------

    #[test]
    fn touching_circles_do_not_collide() {
        let r = circle_vs_circle(&circle(0.0, 0.0, 2.0), &circle(5.0, 0.0, 3.0));
        assert!(!r.colliding);
    }

    #[test]
    fn overlapping_circles_report_depth_and_normal() {
        let r = circle_vs_circle(&circle(0.0, 0.0, 2.0), &circle(0.0, 4.0, 3.0));
        let hit = r.contact().unwrap();
        assert_relative_eq!(hit.depth, 1.0);
        assert_eq!(hit.normal, Vec2::new(0.0, 1.0));
        assert_relative_eq!(hit.position.y, 1.5);
    }

    #[test]
    fn concentric_circles_resolve_along_x() {
        let hit = circle_vs_circle(&circle(1.0, 1.0, 1.0), &circle(1.0, 1.0, 2.0))
            .contact()
            .unwrap();
        assert_eq!(hit.normal, Vec2::X);
        assert_relative_eq!(hit.depth, 3.0);
    }

    #[test]
    fn zero_radius_circle_is_a_point_test() {
        let big = circle(0.0, 0.0, 2.0);
        let inside = Circle::point(Vec2::new(1.0, 0.0));
        let on_edge = Circle::point(Vec2::new(2.0, 0.0));

        assert_eq!(circle_vs_circle(&big, &inside).colliding, big.contains_point(inside.center));
        assert_eq!(circle_vs_circle(&big, &on_edge).colliding, big.contains_point(on_edge.center));
        assert!(!circle_vs_circle(&Circle::point(Vec2::ZERO), &Circle::point(Vec2::ZERO)).colliding);
    }

    // -- polygon vs polygon -------------------------------------------------

    #[test]
    fn separated_squares_do_not_collide() {
        let r = polygon_vs_polygon(&unit_square_at(0.0, 0.0), &unit_square_at(2.0, 0.0));
        assert!(!r.colliding);
    }

    #[test]
    fn squares_overlapping_by_half_collide() {
        let a = unit_square_at(0.0, 0.0);
        let b = unit_square_at(0.5, 0.0);
        let hit = polygon_vs_polygon(&a, &b).contact().unwrap();
        assert_relative_eq!(hit.depth, 0.5);
        assert_relative_eq!(hit.normal.x, 1.0);
        assert_relative_eq!(hit.normal.y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn touching_squares_do_not_collide() {
        let r = polygon_vs_polygon(&unit_square_at(0.0, 0.0), &unit_square_at(1.0, 0.0));
        assert!(!r.colliding);
    }

    #[test]
    fn triangle_against_square() {
        let square = unit_square_at(0.0, 0.0);
        let tri = Polygon::from_coords(&[0.5, 1.5, 1.5], &[0.5, 0.5, -0.5]).unwrap();
        let r = polygon_vs_polygon(&square, &tri);
        assert!(r.colliding);
        assert!(r.depth > 0.0);
        assert!(r.normal.dot(tri.centroid() - square.centroid()) > 0.0);
    }

    #[test]
    fn polygon_normal_points_from_a_to_b() {
        let a = unit_square_at(0.0, 0.0);
        let b = unit_square_at(-0.75, 0.1);
        let hit = polygon_vs_polygon(&a, &b).contact().unwrap();
        assert_relative_eq!(hit.normal.x, -1.0);
        assert_relative_eq!(hit.depth, 0.25);
    }

    #[test]
    fn single_points_never_collide() {
        let p = Polygon::new(vec![Vec2::ZERO]).unwrap();
        assert!(!polygon_vs_polygon(&p, &p).colliding);
    }

    #[test]
    fn point_inside_square_collides() {
        let p = Polygon::new(vec![Vec2::new(0.5, 0.5)]).unwrap();
        assert!(polygon_vs_polygon(&unit_square_at(0.0, 0.0), &p).colliding);
        assert!(polygon_vs_polygon(&p, &unit_square_at(0.0, 0.0)).colliding);
    }

    #[test]
    fn segments_cross() {
        let a = LineSegment::new(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0));
        let b = LineSegment::new(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0));
        assert_eq!(segment_vs_segment(&a, &b), Some(Vec2::ZERO));
    }
}

//! Property tests for the narrow-phase collision routines.
//!
//! These tests use `proptest` to generate random shapes and check the
//! symmetry and boundary rules every collision routine must follow.

use proptest::prelude::*;
use sprig_geom::prelude::*;

/// Strategy that generates coordinates on a coarse grid so that exact
/// touching configurations come up regularly.
fn coord() -> impl Strategy<Value = f32> {
    (-200i32..200i32).prop_map(|v| v as f32 * 0.5)
}

fn extent() -> impl Strategy<Value = f32> {
    (1i32..80i32).prop_map(|v| v as f32 * 0.5)
}

fn rect_strategy() -> impl Strategy<Value = Rect> {
    (coord(), coord(), extent(), extent()).prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

fn circle_strategy() -> impl Strategy<Value = Circle> {
    (coord(), coord(), (0i32..40i32).prop_map(|v| v as f32 * 0.5))
        .prop_map(|(x, y, r)| Circle::new(Vec2::new(x, y), r).unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn aabb_result_is_symmetric(a in rect_strategy(), b in rect_strategy()) {
        let ab = rect_vs_rect(&a, &b);
        let ba = rect_vs_rect(&b, &a);
        prop_assert_eq!(ab.colliding, ba.colliding);
        prop_assert_eq!(ab.colliding, a.intersects(&b));
        if let (Some(x), Some(y)) = (ab.contact(), ba.contact()) {
            prop_assert_eq!(x.depth, y.depth);
        }
    }

    #[test]
    fn aabb_contact_has_unit_axis_normal(a in rect_strategy(), b in rect_strategy()) {
        if let Some(hit) = rect_vs_rect(&a, &b).contact() {
            prop_assert!(hit.depth > 0.0);
            prop_assert_eq!(hit.normal.x.abs() + hit.normal.y.abs(), 1.0);
            prop_assert_eq!(hit.penetration, hit.normal * hit.depth);
        }
    }

    #[test]
    fn circles_at_exact_radius_sum_do_not_collide(
        a in circle_strategy(),
        rb in (0i32..40i32).prop_map(|v| v as f32 * 0.5),
        horizontal in any::<bool>(),
    ) {
        let gap = a.radius() + rb;
        let offset = if horizontal { Vec2::new(gap, 0.0) } else { Vec2::new(0.0, gap) };
        let b = Circle::new(a.center + offset, rb).unwrap();
        prop_assert!(!circle_vs_circle(&a, &b).colliding);
    }

    #[test]
    fn circle_result_is_symmetric(a in circle_strategy(), b in circle_strategy()) {
        let ab = circle_vs_circle(&a, &b);
        let ba = circle_vs_circle(&b, &a);
        prop_assert_eq!(ab.colliding, ba.colliding);
        if let Some(hit) = ab.contact() {
            prop_assert!(hit.depth > 0.0);
            prop_assert!((hit.normal.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn sat_agrees_with_aabb_for_rectangles(a in rect_strategy(), b in rect_strategy()) {
        let polys = polygon_vs_polygon(&Polygon::from_rect(&a), &Polygon::from_rect(&b));
        let rects = rect_vs_rect(&a, &b);
        prop_assert_eq!(polys.colliding, rects.colliding);
        if let (Some(p), Some(r)) = (polys.contact(), rects.contact()) {
            prop_assert!((p.depth - r.depth).abs() < 1e-3);
        }
    }

    #[test]
    fn sat_separated_by_gap_never_collides(x in coord(), y in coord(), size in extent(), gap in extent()) {
        let a = Polygon::from_rect(&Rect::new(x, y, size, size));
        let b = Polygon::from_rect(&Rect::new(x + size + gap, y, size, size));
        prop_assert!(!polygon_vs_polygon(&a, &b).colliding);
        prop_assert!(!polygon_vs_polygon(&b, &a).colliding);
    }
}

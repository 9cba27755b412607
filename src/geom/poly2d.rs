//! Small 2D polygon helpers shared by the validity analyzer and the
//! classifier. Polygons are closed implicitly (last vertex connects back to
//! the first).

use nalgebra::Point2;

/// Number of times a ray from `p` toward +X crosses the polygon boundary.
pub(crate) fn ray_crossings(p: &Point2<f64>, poly: &[Point2<f64>]) -> usize {
    let n = poly.len();
    let mut crossings = 0;
    for i in 0..n {
        let a = &poly[i];
        let b = &poly[(i + 1) % n];
        if (a.y > p.y) != (b.y > p.y) {
            let x_hit = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_hit {
                crossings += 1;
            }
        }
    }
    crossings
}

pub(crate) fn point_in_polygon(p: &Point2<f64>, poly: &[Point2<f64>]) -> bool {
    ray_crossings(p, poly) % 2 == 1
}

pub(crate) fn dist_point_segment(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < f64::EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Distance from `p` to the closed polygon outline.
pub(crate) fn dist_to_boundary(p: &Point2<f64>, poly: &[Point2<f64>]) -> f64 {
    let n = poly.len();
    let mut best = f64::INFINITY;
    for i in 0..n {
        let d = dist_point_segment(p, &poly[i], &poly[(i + 1) % n]);
        if d < best {
            best = d;
        }
    }
    best
}

/// Proper crossing test: true only when the open segments cross at an
/// interior point. Shared endpoints do not count, so adjacent polygon
/// segments never report an intersection.
pub(crate) fn segments_cross(
    p1: &Point2<f64>,
    p2: &Point2<f64>,
    q1: &Point2<f64>,
    q2: &Point2<f64>,
) -> bool {
    let orient = |a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>| {
        (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
    };
    let d1 = orient(q1, q2, p1);
    let d2 = orient(q1, q2, p2);
    let d3 = orient(p1, p2, q1);
    let d4 = orient(p1, p2, q2);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

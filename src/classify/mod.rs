//! Point/face/edge containment and overlap queries.
//!
//! Classification runs in the face's own frame: the query point is pulled
//! back through the face placement, projected onto the raw surface, and the
//! projection parameters are tested against the trimmed boundary sampled
//! into UV polygons. Results carry fixed integer codes that cross the call
//! boundary unchanged.

use std::sync::Arc;

use nalgebra::{Point2, Point3, Vector3};
use tracing::warn;

use crate::brep::{Edge, Face, Wire};
use crate::geom::poly2d;
use crate::geom::Surface;

/// Where a point sits relative to a face. Discriminants are the wire-format
/// integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum PointFaceState {
    Unrelated = 0,
    Inside = 1,
    OnBoundary = 2,
}

impl From<PointFaceState> for i32 {
    fn from(state: PointFaceState) -> i32 {
        state as i32
    }
}

/// How much of a sampled shape lies on a face. Discriminants are the
/// wire-format integers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i32)]
pub enum Coverage {
    Unrelated = 0,
    All = 1,
    Partial = 2,
}

impl From<Coverage> for i32 {
    fn from(coverage: Coverage) -> i32 {
        coverage as i32
    }
}

/// Interior sample ratio along an edge; intentionally not the arithmetic
/// mean, so symmetric geometry never gets sampled at a coincidence point.
const INTERMEDIATE_RATIO: f64 = 0.43213918;

const UV_SAMPLES_PER_EDGE: usize = 16;
const OVERLAP_SAMPLES: usize = 64;

/// Classifies a point against a face's trimmed region.
///
/// The point is projected onto the underlying surface. A projection miss or
/// a projection distance beyond the tolerance is `Unrelated`; otherwise the
/// projection parameters are classified against the boundary in UV space.
/// A negative tolerance selects the face's own tolerance.
pub fn point_to_face(face: &Face, point: &Point3<f64>, tolerance: f64) -> PointFaceState {
    let tol = if tolerance < 0.0 {
        face.tolerance()
    } else {
        tolerance
    };
    let local = face.location().inverted().transform_point(point);
    let Some((u, v, dist)) = project_to_surface(face, &local) else {
        return PointFaceState::Unrelated;
    };
    if dist > tol {
        return PointFaceState::Unrelated;
    }
    classify_uv(face, &Point2::new(u, v), tol)
}

/// Classifies how face `b` lies on face `a`, sampling one point per triangle
/// of `b`'s triangulation at the triangle's UV centroid.
///
/// `b` must carry a triangulation with UV nodes; without one the result is
/// `Unrelated` and a warning is logged. A negative tolerance selects `a`'s
/// own tolerance.
pub fn face_to_face(a: &Face, b: &Face, tolerance: f64) -> Coverage {
    let tol = if tolerance < 0.0 {
        a.tolerance()
    } else {
        tolerance
    };
    let Some(mesh) = b.triangulation() else {
        warn!("face has no triangulation, cannot classify");
        return Coverage::Unrelated;
    };
    let Some(uv) = mesh.uv.as_ref() else {
        warn!("face triangulation has no UV nodes, cannot classify");
        return Coverage::Unrelated;
    };
    let mut any_on = false;
    let mut any_off = false;
    for triangle in &mesh.triangles {
        let [i, j, k] = triangle.map(|n| n as usize);
        let uc = (uv[i][0] + uv[j][0] + uv[k][0]) / 3.0;
        let vc = (uv[i][1] + uv[j][1] + uv[k][1]) / 3.0;
        let sample = b.location().transform_point(&b.surface().point_at(uc, vc));
        match point_to_face(a, &sample, tol) {
            PointFaceState::Unrelated => any_off = true,
            _ => any_on = true,
        }
    }
    coverage(any_on, any_off)
}

/// Classifies how an edge lies on a face, sampling the edge curve at its
/// first parameter, the intermediate parameter, and its last parameter.
pub fn edge_to_face(edge: &Edge, face: &Face, tolerance: f64) -> Coverage {
    let Some(ec) = edge.curve() else {
        warn!("edge has no 3D curve, cannot classify");
        return Coverage::Unrelated;
    };
    let mid = ec.first + INTERMEDIATE_RATIO * (ec.last - ec.first);
    let mut any_on = false;
    let mut any_off = false;
    for t in [ec.first, mid, ec.last] {
        let sample = edge.location().transform_point(&ec.curve.point_at(t));
        match point_to_face(face, &sample, tolerance) {
            PointFaceState::Unrelated => any_off = true,
            _ => any_on = true,
        }
    }
    coverage(any_on, any_off)
}

/// Tests whether two edges run coincident.
///
/// The first edge is sampled along its whole range and each sample is
/// measured against the second edge's curve. Full coincidence is an overlap
/// outright; otherwise the longest contiguous coincident span, measured as
/// parameter length on the first edge, must reach `domain_distance` (when
/// positive). A negative tolerance selects the first edge's own tolerance.
pub fn edges_overlap(e1: &Edge, e2: &Edge, tolerance: f64, domain_distance: f64) -> bool {
    let tol = if tolerance < 0.0 {
        e1.tolerance()
    } else {
        tolerance
    };
    let (Some(c1), Some(c2)) = (e1.curve(), e2.curve()) else {
        warn!("edge has no 3D curve, cannot test overlap");
        return false;
    };
    let other = |t: f64| e2.location().transform_point(&c2.curve.point_at(t));

    let span = c1.last - c1.first;
    let step = span / OVERLAP_SAMPLES as f64;
    let mut coincident = [false; OVERLAP_SAMPLES + 1];
    for (i, flag) in coincident.iter_mut().enumerate() {
        let t = c1.first + step * i as f64;
        let sample = e1.location().transform_point(&c1.curve.point_at(t));
        *flag = point_to_curve_distance(&other, c2.first, c2.last, &sample) <= tol;
    }
    if coincident.iter().all(|&c| c) {
        return true;
    }
    if domain_distance <= 0.0 {
        return false;
    }
    let mut longest = 0usize;
    let mut run = 0usize;
    for &c in &coincident {
        if c {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    longest > 1 && (longest - 1) as f64 * step.abs() >= domain_distance
}

fn coverage(any_on: bool, any_off: bool) -> Coverage {
    if !any_on {
        Coverage::Unrelated
    } else if any_off {
        Coverage::Partial
    } else {
        Coverage::All
    }
}

// ---------------------------------------------------------------------------
// Surface projection
// ---------------------------------------------------------------------------

/// Projects a face-local point onto the face's raw surface, returning the
/// projection parameters and the projection distance. Planes and cylinders
/// project analytically; everything else seeds a grid search over the
/// boundary's UV window and refines it with Gauss-Newton steps.
pub(crate) fn project_to_surface(face: &Face, point: &Point3<f64>) -> Option<(f64, f64, f64)> {
    let surface = face.surface().as_ref();
    match surface {
        Surface::Plane {
            origin,
            normal,
            x_dir,
        } => {
            let (n, x, y) = plane_frame(normal, x_dir)?;
            let r = point - origin;
            Some((r.dot(&x), r.dot(&y), r.dot(&n).abs()))
        }
        Surface::Cylinder {
            origin,
            axis,
            x_dir,
            radius,
        } => {
            let a = axis.try_normalize(1e-12)?;
            let x = (x_dir - a * x_dir.dot(&a)).try_normalize(1e-12)?;
            let y = a.cross(&x);
            let r = point - origin;
            let v = r.dot(&a);
            let radial = r - a * v;
            let len = radial.norm();
            if len < 1e-12 {
                return Some((0.0, v, *radius));
            }
            let mut u = radial.dot(&y).atan2(radial.dot(&x));
            if u < 0.0 {
                u += std::f64::consts::TAU;
            }
            Some((u, v, (len - radius).abs()))
        }
        _ => {
            let ([u0, u1], [v0, v1]) = uv_sample_window(face)?;
            const GRID: usize = 24;
            let mut best = (u0, v0, f64::INFINITY);
            for i in 0..=GRID {
                let u = u0 + (u1 - u0) * i as f64 / GRID as f64;
                for j in 0..=GRID {
                    let v = v0 + (v1 - v0) * j as f64 / GRID as f64;
                    let d2 = (point - surface.point_at(u, v)).norm_squared();
                    if d2 < best.2 {
                        best = (u, v, d2);
                    }
                }
            }
            let (u, v) = refine_projection(surface, point, best.0, best.1);
            let dist = (point - surface.point_at(u, v)).norm();
            Some((u, v, dist))
        }
    }
}

fn refine_projection(surface: &Surface, point: &Point3<f64>, mut u: f64, mut v: f64) -> (f64, f64) {
    for _ in 0..32 {
        let (s, du, dv) = surface.d1(u, v);
        let r = point - s;
        let a11 = du.dot(&du);
        let a12 = du.dot(&dv);
        let a22 = dv.dot(&dv);
        let b1 = r.dot(&du);
        let b2 = r.dot(&dv);
        let det = a11 * a22 - a12 * a12;
        if det.abs() < 1e-18 {
            break;
        }
        let step_u = (b1 * a22 - b2 * a12) / det;
        let step_v = (a11 * b2 - a12 * b1) / det;
        u += step_u;
        v += step_v;
        if step_u.abs() + step_v.abs() < 1e-12 * (1.0 + u.abs() + v.abs()) {
            break;
        }
    }
    (u, v)
}

/// UV window to seed numeric projection: the bounding box of the sampled
/// trimming boundary, or the surface's own bounds when no boundary is
/// usable.
fn uv_sample_window(face: &Face) -> Option<([f64; 2], [f64; 2])> {
    let polygons = boundary_polygons(face);
    let mut min = Point2::new(f64::INFINITY, f64::INFINITY);
    let mut max = Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in polygons.iter().flatten() {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    if min.x.is_finite() && max.x > min.x - f64::EPSILON {
        // widen degenerate axes so the grid search has room
        let mut window = ([min.x, max.x], [min.y, max.y]);
        if window.0[1] - window.0[0] < 1e-9 {
            window.0 = [window.0[0] - 0.5, window.0[1] + 0.5];
        }
        if window.1[1] - window.1[0] < 1e-9 {
            window.1 = [window.1[0] - 0.5, window.1[1] + 0.5];
        }
        return Some(window);
    }
    if let Surface::BSpline(s) = face.surface().as_ref() {
        return Some(s.bounds());
    }
    None
}

// ---------------------------------------------------------------------------
// Trimmed-boundary classification in UV space
// ---------------------------------------------------------------------------

/// Classifies a UV point against the face's sampled trimming boundary:
/// within tolerance of any boundary polygon is `OnBoundary`; otherwise
/// ray-crossing parity over every wire decides `Inside` vs `Unrelated`.
pub(crate) fn classify_uv(face: &Face, uv: &Point2<f64>, tolerance: f64) -> PointFaceState {
    let polygons = boundary_polygons(face);
    if polygons.is_empty() {
        warn!("face has no usable trimming boundary, cannot classify");
        return PointFaceState::Unrelated;
    }
    for polygon in &polygons {
        if poly2d::dist_to_boundary(uv, polygon) <= tolerance {
            return PointFaceState::OnBoundary;
        }
    }
    let crossings: usize = polygons.iter().map(|p| poly2d::ray_crossings(uv, p)).sum();
    if crossings % 2 == 1 {
        PointFaceState::Inside
    } else {
        PointFaceState::Unrelated
    }
}

/// One sampled UV polygon per wire, raw wires in stored order.
pub(crate) fn boundary_polygons(face: &Face) -> Vec<Vec<Point2<f64>>> {
    face.data()
        .wires
        .iter()
        .filter_map(|wire| wire_uv_polygon(face, wire))
        .collect()
}

/// Samples a wire into a closed UV polygon on the face's surface.
///
/// Edges contribute their p-curve samples in wire order, reversed edges
/// backwards so the polygon stays connected. Edges without a p-curve fall
/// back to projecting their 3D curve when the surface is planar; edges with
/// neither are skipped.
pub(crate) fn wire_uv_polygon(face: &Face, wire: &Wire) -> Option<Vec<Point2<f64>>> {
    let surface = face.surface();
    let mut points = Vec::new();
    for edge in wire.edges() {
        let mut run = Vec::with_capacity(UV_SAMPLES_PER_EDGE + 1);
        if let Some(pc) = edge.pcurve_on(surface) {
            for i in 0..=UV_SAMPLES_PER_EDGE {
                let t = pc.first + (pc.last - pc.first) * i as f64 / UV_SAMPLES_PER_EDGE as f64;
                run.push(pc.curve.point_at(t));
            }
        } else if let Some(projected) = planar_edge_uv(surface, &edge) {
            run = projected;
        } else {
            continue;
        }
        if edge.is_reversed() {
            run.reverse();
        }
        points.extend(run);
    }
    (points.len() >= 3).then_some(points)
}

/// Plane-only p-curve fallback: the edge's 3D curve projected into the
/// plane frame.
fn planar_edge_uv(surface: &Arc<Surface>, edge: &Edge) -> Option<Vec<Point2<f64>>> {
    let Surface::Plane {
        origin,
        normal,
        x_dir,
    } = surface.as_ref()
    else {
        return None;
    };
    let (_, x, y) = plane_frame(normal, x_dir)?;
    let ec = edge.curve()?;
    let mut run = Vec::with_capacity(UV_SAMPLES_PER_EDGE + 1);
    for i in 0..=UV_SAMPLES_PER_EDGE {
        let t = ec.first + (ec.last - ec.first) * i as f64 / UV_SAMPLES_PER_EDGE as f64;
        let p = edge.location().transform_point(&ec.curve.point_at(t));
        let r = p - origin;
        run.push(Point2::new(r.dot(&x), r.dot(&y)));
    }
    Some(run)
}

fn plane_frame(
    normal: &Vector3<f64>,
    x_dir: &Vector3<f64>,
) -> Option<(Vector3<f64>, Vector3<f64>, Vector3<f64>)> {
    let n = normal.try_normalize(1e-12)?;
    let x = (x_dir - n * x_dir.dot(&n)).try_normalize(1e-12)?;
    let y = n.cross(&x);
    Some((n, x, y))
}

// ---------------------------------------------------------------------------
// Point-to-curve distance
// ---------------------------------------------------------------------------

/// Minimal distance from a point to a curve over a parameter range, by
/// coarse sampling plus bracketed refinement around the best sample.
fn point_to_curve_distance<F>(eval: &F, first: f64, last: f64, point: &Point3<f64>) -> f64
where
    F: Fn(f64) -> Point3<f64>,
{
    const COARSE: usize = 64;
    let lo = first.min(last);
    let hi = first.max(last);
    if hi - lo < f64::EPSILON {
        return (point - eval(first)).norm();
    }
    let mut best_t = lo;
    let mut best_d = f64::INFINITY;
    for i in 0..=COARSE {
        let t = lo + (hi - lo) * i as f64 / COARSE as f64;
        let d = (point - eval(t)).norm();
        if d < best_d {
            best_d = d;
            best_t = t;
        }
    }
    let mut h = (hi - lo) / COARSE as f64;
    for _ in 0..4 {
        let wlo = (best_t - h).max(lo);
        let whi = (best_t + h).min(hi);
        for i in 0..=16 {
            let t = wlo + (whi - wlo) * i as f64 / 16.0;
            let d = (point - eval(t)).norm();
            if d < best_d {
                best_d = d;
                best_t = t;
            }
        }
        h /= 8.0;
    }
    best_d
}

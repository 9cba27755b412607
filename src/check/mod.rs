//! Topological and geometric validity analysis.
//!
//! [`analyze`] walks a shape and reports a diagnostic per defect found:
//! edges without 3D curves, broken parameter ranges, endpoints off their
//! curves, missing or lying p-curves, broken or self-intersecting wires,
//! misplaced holes, open shells, free and over-shared edges. Diagnostics
//! are report-only; no caller treats them as failures, and export runs
//! regardless of what the analysis finds.
//!
//! The status taxonomy is wider than what the analysis derives: statuses
//! like `UnorientableShape` or `Multiple3DCurve` are representable and
//! displayable but never produced from this data model.

use std::collections::HashSet;
use std::fmt;

use nalgebra::Point2;

use crate::brep::topology::EdgeFaceMap;
use crate::brep::{Edge, Face, Shape, Shell, Vertex, Wire};
use crate::classify;
use crate::geom::poly2d;
use crate::geom::Surface;

/// One defect category, matching the display names the host expects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckStatus {
    InvalidPointOnCurve,
    InvalidPointOnCurveOnSurface,
    InvalidPointOnSurface,
    No3dCurve,
    Multiple3dCurve,
    Invalid3dCurve,
    NoCurveOnSurface,
    InvalidCurveOnSurface,
    InvalidCurveOnClosedSurface,
    InvalidSameRangeFlag,
    InvalidSameParameterFlag,
    InvalidDegeneratedFlag,
    FreeEdge,
    InvalidMultiConnexity,
    InvalidRange,
    EmptyWire,
    RedundantEdge,
    SelfIntersectingWire,
    NoSurface,
    InvalidWire,
    RedundantWire,
    IntersectingWires,
    InvalidImbricationOfWires,
    EmptyShell,
    RedundantFace,
    UnorientableShape,
    NotClosed,
    NotConnected,
    SubshapeNotInShape,
    BadOrientation,
    BadOrientationOfSubshape,
    InvalidToleranceValue,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::InvalidPointOnCurve => "InvalidPointOnCurve",
            CheckStatus::InvalidPointOnCurveOnSurface => "InvalidPointOnCurveOnSurface",
            CheckStatus::InvalidPointOnSurface => "InvalidPointOnSurface",
            CheckStatus::No3dCurve => "No3DCurve",
            CheckStatus::Multiple3dCurve => "Multiple3DCurve",
            CheckStatus::Invalid3dCurve => "Invalid3DCurve",
            CheckStatus::NoCurveOnSurface => "NoCurveOnSurface",
            CheckStatus::InvalidCurveOnSurface => "InvalidCurveOnSurface",
            CheckStatus::InvalidCurveOnClosedSurface => "InvalidCurveOnClosedSurface",
            CheckStatus::InvalidSameRangeFlag => "InvalidSameRangeFlag",
            CheckStatus::InvalidSameParameterFlag => "InvalidSameParameterFlag",
            CheckStatus::InvalidDegeneratedFlag => "InvalidDegeneratedFlag",
            CheckStatus::FreeEdge => "FreeEdge",
            CheckStatus::InvalidMultiConnexity => "InvalidMultiConnexity",
            CheckStatus::InvalidRange => "InvalidRange",
            CheckStatus::EmptyWire => "EmptyWire",
            CheckStatus::RedundantEdge => "RedundantEdge",
            CheckStatus::SelfIntersectingWire => "SelfIntersectingWire",
            CheckStatus::NoSurface => "NoSurface",
            CheckStatus::InvalidWire => "InvalidWire",
            CheckStatus::RedundantWire => "RedundantWire",
            CheckStatus::IntersectingWires => "IntersectingWires",
            CheckStatus::InvalidImbricationOfWires => "InvalidImbricationOfWires",
            CheckStatus::EmptyShell => "EmptyShell",
            CheckStatus::RedundantFace => "RedundantFace",
            CheckStatus::UnorientableShape => "UnorientableShape",
            CheckStatus::NotClosed => "NotClosed",
            CheckStatus::NotConnected => "NotConnected",
            CheckStatus::SubshapeNotInShape => "SubshapeNotInShape",
            CheckStatus::BadOrientation => "BadOrientation",
            CheckStatus::BadOrientationOfSubshape => "BadOrientationOfSubshape",
            CheckStatus::InvalidToleranceValue => "InvalidToleranceValue",
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported defect: the offending sub-shape's type tag and stable id,
/// and the defect category.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub tag: &'static str,
    pub id: u64,
    pub status: CheckStatus,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:#x}: {}", self.tag, self.id, self.status)
    }
}

/// Walks the shape and reports every derivable defect. Shared sub-shapes
/// are checked once; context checks (p-curves against a face, edge sharing
/// across a shell) run per use.
pub fn analyze(shape: &Shape) -> Vec<Diagnostic> {
    let mut analysis = Analysis::default();
    collect(shape, &mut analysis);
    analysis.diagnostics
}

#[derive(Default)]
struct Analysis {
    diagnostics: Vec<Diagnostic>,
    checked_edges: HashSet<u64>,
    checked_pairs: HashSet<(u64, u64)>,
}

impl Analysis {
    fn report(&mut self, tag: &'static str, id: u64, status: CheckStatus) {
        self.diagnostics.push(Diagnostic { tag, id, status });
    }
}

fn collect(shape: &Shape, a: &mut Analysis) {
    match shape {
        Shape::Vertex(v) => check_vertex(v, a),
        Shape::Edge(e) => check_edge(e, a),
        Shape::Wire(w) => check_wire(w, None, a),
        Shape::Face(f) => check_face(f, a),
        Shape::Shell(s) => check_shell(s, a),
        Shape::Solid(s) => {
            for shell in s.shells() {
                check_shell(&shell, a);
            }
        }
        Shape::Compound(c) => {
            for child in c.shapes() {
                collect(&child, a);
            }
        }
    }
}

fn check_vertex(vertex: &Vertex, a: &mut Analysis) {
    if vertex.tolerance() < 0.0 {
        a.report(
            "VERTEX",
            vertex.stable_id(),
            CheckStatus::InvalidToleranceValue,
        );
    }
}

/// Edge-level checks: curve presence, degeneracy flag, parameter range,
/// and each endpoint vertex against the curve end it names.
fn check_edge(edge: &Edge, a: &mut Analysis) {
    if !a.checked_edges.insert(edge.stable_id()) {
        return;
    }
    let id = edge.stable_id();
    if edge.tolerance() < 0.0 {
        a.report("EDGE", id, CheckStatus::InvalidToleranceValue);
    }
    let Some(ec) = edge.curve() else {
        // degenerated edges carry no 3D curve by design
        if !edge.is_degenerated() {
            a.report("EDGE", id, CheckStatus::No3dCurve);
        }
        return;
    };
    if edge.is_degenerated() {
        a.report("EDGE", id, CheckStatus::InvalidDegeneratedFlag);
    }
    if ec.first >= ec.last {
        a.report("EDGE", id, CheckStatus::InvalidRange);
    }
    for (vertex, t) in [(edge.start(), ec.first), (edge.end(), ec.last)] {
        let Some(v) = vertex else { continue };
        if v.tolerance() < 0.0 {
            a.report(
                "VERTEX",
                v.stable_id(),
                CheckStatus::InvalidToleranceValue,
            );
            continue;
        }
        let on_curve = edge.location().transform_point(&ec.curve.point_at(t));
        if (v.point() - on_curve).norm() > v.tolerance() {
            a.report("VERTEX", v.stable_id(), CheckStatus::InvalidPointOnCurve);
        }
    }
}

/// Context checks of an edge used by a face: the p-curve must exist for
/// non-planar surfaces, agree with the edge range when the same-range flag
/// is set, and its image on the surface must track the 3D curve.
fn check_edge_on_face(edge: &Edge, face: &Face, a: &mut Analysis) {
    if !a
        .checked_pairs
        .insert((edge.stable_id(), face.stable_id()))
    {
        return;
    }
    let surface = face.surface();
    let Some(pc) = edge.pcurve_on(surface) else {
        // planar p-curves are derivable on the fly and not stored
        if !matches!(surface.as_ref(), Surface::Plane { .. }) {
            a.report("EDGE", edge.stable_id(), CheckStatus::NoCurveOnSurface);
        }
        return;
    };
    let Some(ec) = edge.curve() else {
        return;
    };
    if edge.same_range()
        && ((pc.first - ec.first).abs() > 1e-9 || (pc.last - ec.last).abs() > 1e-9)
    {
        a.report("EDGE", edge.stable_id(), CheckStatus::InvalidSameRangeFlag);
    }
    if edge.same_parameter() {
        const SAMPLES: usize = 8;
        let tol = edge.tolerance().max(face.tolerance());
        let mut worst = 0.0f64;
        for i in 0..=SAMPLES {
            let t = ec.first + (ec.last - ec.first) * i as f64 / SAMPLES as f64;
            let uv = pc.curve.point_at(t);
            let on_surface = surface.point_at(uv.x, uv.y);
            let on_curve = edge.location().transform_point(&ec.curve.point_at(t));
            worst = worst.max((on_surface - on_curve).norm());
        }
        if worst > tol {
            a.report(
                "EDGE",
                edge.stable_id(),
                CheckStatus::InvalidCurveOnSurface,
            );
        }
    }
    for (vertex, t) in [(edge.start(), pc.first), (edge.end(), pc.last)] {
        let Some(v) = vertex else { continue };
        let uv = pc.curve.point_at(t);
        let on_surface = surface.point_at(uv.x, uv.y);
        if (v.point() - on_surface).norm() > v.tolerance().max(edge.tolerance()) {
            a.report(
                "VERTEX",
                v.stable_id(),
                CheckStatus::InvalidPointOnCurveOnSurface,
            );
        }
    }
}

/// Wire-level checks: emptiness, node reuse with equal orientation, and
/// junction continuity between consecutive oriented edges. Under a face
/// the wire must close and its UV polygon must not self-intersect; a
/// standalone wire may legitimately stay open.
fn check_wire(wire: &Wire, face: Option<&Face>, a: &mut Analysis) {
    let id = wire.stable_id();
    let edges = wire.edges();
    if edges.is_empty() {
        a.report("WIRE", id, CheckStatus::EmptyWire);
        return;
    }
    for edge in &edges {
        check_edge(edge, a);
    }
    let mut redundant = false;
    for i in 0..edges.len() {
        for j in 0..i {
            // a seam reuses the node with opposite orientation, which is fine
            if edges[i].same_node(&edges[j]) && edges[i].is_reversed() == edges[j].is_reversed() {
                redundant = true;
            }
        }
    }
    if redundant {
        a.report("WIRE", id, CheckStatus::RedundantEdge);
    }
    let junctions = if face.is_some() {
        edges.len()
    } else {
        edges.len().saturating_sub(1)
    };
    let mut connected = true;
    for i in 0..junctions {
        let a_edge = &edges[i];
        let b_edge = &edges[(i + 1) % edges.len()];
        let (Some((_, a_end)), Some((b_start, _))) =
            (oriented_endpoints(a_edge), oriented_endpoints(b_edge))
        else {
            continue;
        };
        let tol = a_end.tolerance().max(b_start.tolerance());
        if (a_end.point() - b_start.point()).norm() > tol {
            connected = false;
        }
    }
    if !connected {
        a.report("WIRE", id, CheckStatus::NotConnected);
    }
    if let Some(face) = face {
        if let Some(polygon) = classify::wire_uv_polygon(face, wire) {
            if polygon_self_intersects(&polygon) {
                a.report("WIRE", id, CheckStatus::SelfIntersectingWire);
            }
        }
    }
}

/// Face-level checks: per-wire analysis (rolled up as `InvalidWire`),
/// p-curve context per edge, wire node reuse, crossings between distinct
/// wires, and holes that fall outside the outer loop.
fn check_face(face: &Face, a: &mut Analysis) {
    let face_id = face.stable_id();
    if face.tolerance() < 0.0 {
        a.report("FACE", face_id, CheckStatus::InvalidToleranceValue);
    }
    let wires = &face.data().wires;
    let mut polygons: Vec<Option<Vec<Point2<f64>>>> = Vec::with_capacity(wires.len());
    let mut redundant = false;
    for (idx, wire) in wires.iter().enumerate() {
        if !redundant && wires[..idx].iter().any(|w| w.same_node(wire)) {
            a.report("FACE", face_id, CheckStatus::RedundantWire);
            redundant = true;
        }
        let before = a.diagnostics.len();
        check_wire(wire, Some(face), a);
        let wire_defect = a.diagnostics[before..].iter().any(|d| d.tag == "WIRE");
        if wire_defect {
            a.report("FACE", face_id, CheckStatus::InvalidWire);
        }
        for edge in wire.edges() {
            check_edge_on_face(&edge, face, a);
        }
        polygons.push(classify::wire_uv_polygon(face, wire));
    }
    // crossings between distinct wires
    let mut crossing = false;
    'pairs: for i in 0..polygons.len() {
        let Some(pi) = &polygons[i] else { continue };
        for pj in polygons[i + 1..].iter().flatten() {
            if polygons_cross(pi, pj) {
                crossing = true;
                break 'pairs;
            }
        }
    }
    if crossing {
        a.report("FACE", face_id, CheckStatus::IntersectingWires);
    }
    // every hole must start inside the outer loop
    if let Some(Some(outer)) = polygons.first() {
        let misplaced = polygons[1..].iter().flatten().any(|inner| {
            inner
                .first()
                .is_some_and(|p| !poly2d::point_in_polygon(p, outer))
        });
        if misplaced {
            a.report("FACE", face_id, CheckStatus::InvalidImbricationOfWires);
        }
    }
}

/// Shell-level checks: emptiness, face node reuse, per-face analysis, and
/// edge sharing (an edge used once is free and leaves the shell open; more
/// than twice is over-shared).
fn check_shell(shell: &Shell, a: &mut Analysis) {
    let id = shell.stable_id();
    let faces = shell.faces();
    if faces.is_empty() {
        a.report("SHELL", id, CheckStatus::EmptyShell);
        return;
    }
    let mut redundant = false;
    for (i, face) in faces.iter().enumerate() {
        if !redundant && faces[..i].iter().any(|f| f.same_node(face)) {
            a.report("SHELL", id, CheckStatus::RedundantFace);
            redundant = true;
        }
        check_face(face, a);
    }
    let map = EdgeFaceMap::build(&Shape::from(shell.clone()));
    let mut open = false;
    for edge in map.edges_in_order() {
        if edge.is_degenerated() {
            continue;
        }
        match map.faces_of(edge).len() {
            1 => {
                a.report("EDGE", edge.stable_id(), CheckStatus::FreeEdge);
                open = true;
            }
            n if n > 2 => {
                a.report("EDGE", edge.stable_id(), CheckStatus::InvalidMultiConnexity);
            }
            _ => {}
        }
    }
    if open {
        a.report("SHELL", id, CheckStatus::NotClosed);
    }
}

/// Start/end vertices in traversal order: a reversed edge is walked from
/// its geometric end to its geometric start.
fn oriented_endpoints(edge: &Edge) -> Option<(Vertex, Vertex)> {
    let start = edge.start()?;
    let end = edge.end()?;
    Some(if edge.is_reversed() {
        (end, start)
    } else {
        (start, end)
    })
}

fn polygon_self_intersects(polygon: &[Point2<f64>]) -> bool {
    let n = polygon.len();
    for i in 0..n {
        let a1 = &polygon[i];
        let a2 = &polygon[(i + 1) % n];
        for j in i + 2..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let b1 = &polygon[j];
            let b2 = &polygon[(j + 1) % n];
            if poly2d::segments_cross(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

fn polygons_cross(pa: &[Point2<f64>], pb: &[Point2<f64>]) -> bool {
    for i in 0..pa.len() {
        let a1 = &pa[i];
        let a2 = &pa[(i + 1) % pa.len()];
        for j in 0..pb.len() {
            let b1 = &pb[j];
            let b2 = &pb[(j + 1) % pb.len()];
            if poly2d::segments_cross(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brep::{Compound, Solid};
    use crate::geom::{BSplineSurface, Curve, Curve2d};
    use nalgebra::{Point3, Vector2, Vector3};
    use std::sync::Arc;

    fn statuses(diagnostics: &[Diagnostic]) -> Vec<CheckStatus> {
        diagnostics.iter().map(|d| d.status).collect()
    }

    fn plane_surface() -> Arc<Surface> {
        Arc::new(Surface::Plane {
            origin: Point3::origin(),
            normal: Vector3::z(),
            x_dir: Vector3::x(),
        })
    }

    /// Line edge on the z=0 plane, endpoints derived from the curve.
    fn line_edge(from: [f64; 2], to: [f64; 2]) -> Edge {
        let dir = Vector3::new(to[0] - from[0], to[1] - from[1], 0.0);
        let len = dir.norm();
        Edge::builder()
            .curve(
                Curve::Line {
                    origin: Point3::new(from[0], from[1], 0.0),
                    dir: dir / len,
                },
                0.0,
                len,
            )
            .build()
    }

    fn rect_wire(x0: f64, y0: f64, x1: f64, y1: f64) -> Wire {
        Wire::new(vec![
            line_edge([x0, y0], [x1, y0]),
            line_edge([x1, y0], [x1, y1]),
            line_edge([x1, y1], [x0, y1]),
            line_edge([x0, y1], [x0, y0]),
        ])
    }

    #[test]
    fn test_clean_planar_face() {
        let face = Face::builder(plane_surface())
            .wire(rect_wire(0.0, 0.0, 2.0, 1.0))
            .build();
        let diagnostics = analyze(&Shape::from(face));
        assert!(diagnostics.is_empty(), "unexpected: {diagnostics:?}");
    }

    #[test]
    fn test_edge_without_curve() {
        let edge = Edge::builder()
            .endpoints(
                Vertex::new(Point3::origin()),
                Vertex::new(Point3::new(1.0, 0.0, 0.0)),
            )
            .build();
        let diagnostics = analyze(&Shape::from(edge));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].tag, "EDGE");
        assert_eq!(diagnostics[0].status, CheckStatus::No3dCurve);
        assert_eq!(diagnostics[0].status.to_string(), "No3DCurve");
    }

    #[test]
    fn test_degenerated_flag() {
        let with_curve = Edge::builder()
            .curve(
                Curve::Line {
                    origin: Point3::origin(),
                    dir: Vector3::x(),
                },
                0.0,
                1.0,
            )
            .degenerated(true)
            .build();
        assert!(
            statuses(&analyze(&Shape::from(with_curve)))
                .contains(&CheckStatus::InvalidDegeneratedFlag)
        );
        // a degenerated edge without a curve is the legitimate form
        let bare = Edge::builder().degenerated(true).build();
        assert!(analyze(&Shape::from(bare)).is_empty());
    }

    #[test]
    fn test_invalid_range() {
        let edge = Edge::builder()
            .curve(
                Curve::Line {
                    origin: Point3::origin(),
                    dir: Vector3::x(),
                },
                2.0,
                1.0,
            )
            .build();
        assert!(statuses(&analyze(&Shape::from(edge))).contains(&CheckStatus::InvalidRange));
    }

    #[test]
    fn test_vertex_off_curve() {
        let edge = Edge::builder()
            .curve(
                Curve::Line {
                    origin: Point3::origin(),
                    dir: Vector3::x(),
                },
                0.0,
                1.0,
            )
            .endpoints(
                Vertex::new(Point3::origin()),
                Vertex::new(Point3::new(5.0, 5.0, 5.0)),
            )
            .build();
        let diagnostics = analyze(&Shape::from(edge));
        assert!(
            diagnostics
                .iter()
                .any(|d| d.tag == "VERTEX" && d.status == CheckStatus::InvalidPointOnCurve)
        );
    }

    #[test]
    fn test_negative_tolerance() {
        let edge = Edge::builder()
            .curve(
                Curve::Line {
                    origin: Point3::origin(),
                    dir: Vector3::x(),
                },
                0.0,
                1.0,
            )
            .tolerance(-0.5)
            .build();
        assert!(
            statuses(&analyze(&Shape::from(edge))).contains(&CheckStatus::InvalidToleranceValue)
        );
    }

    #[test]
    fn test_wire_with_gap() {
        let broken = Wire::new(vec![
            line_edge([0.0, 0.0], [1.0, 0.0]),
            line_edge([3.0, 0.0], [4.0, 0.0]),
        ]);
        assert!(statuses(&analyze(&Shape::from(broken))).contains(&CheckStatus::NotConnected));
        // an open but chained standalone wire is fine
        let open = Wire::new(vec![
            line_edge([0.0, 0.0], [1.0, 0.0]),
            line_edge([1.0, 0.0], [2.0, 0.0]),
        ]);
        assert!(analyze(&Shape::from(open)).is_empty());
    }

    #[test]
    fn test_redundant_edge_vs_seam() {
        let e = line_edge([0.0, 0.0], [1.0, 0.0]);
        let doubled = Wire::new(vec![e.clone(), e.clone()]);
        assert!(statuses(&analyze(&Shape::from(doubled))).contains(&CheckStatus::RedundantEdge));
        let seam = Wire::new(vec![e.clone(), e.reversed()]);
        let diagnostics = analyze(&Shape::from(seam));
        assert!(
            !statuses(&diagnostics).contains(&CheckStatus::RedundantEdge),
            "a seam is not redundant: {diagnostics:?}"
        );
    }

    #[test]
    fn test_empty_wire_and_shell() {
        assert!(
            statuses(&analyze(&Shape::from(Wire::new(Vec::new()))))
                .contains(&CheckStatus::EmptyWire)
        );
        assert!(
            statuses(&analyze(&Shape::from(Shell::new(Vec::new()))))
                .contains(&CheckStatus::EmptyShell)
        );
    }

    #[test]
    fn test_missing_pcurve_on_curved_surface() {
        let patch = BSplineSurface::new(
            1,
            1,
            vec![0.0, 2.0],
            vec![0.0, 2.0],
            vec![2, 2],
            vec![2, 2],
            vec![
                vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 2.0, 0.0)],
                vec![Point3::new(2.0, 0.0, 0.0), Point3::new(2.0, 2.0, 0.0)],
            ],
            None,
            false,
            false,
        )
        .unwrap();
        let face = Face::builder(Arc::new(Surface::BSpline(patch)))
            .wire(rect_wire(0.0, 0.0, 2.0, 2.0))
            .build();
        let found = statuses(&analyze(&Shape::from(face)));
        let missing = found
            .iter()
            .filter(|s| **s == CheckStatus::NoCurveOnSurface)
            .count();
        assert_eq!(missing, 4);
    }

    /// Line edge with an explicit p-curve on the given surface.
    fn pcurve_edge(
        surface: &Arc<Surface>,
        from: [f64; 2],
        to: [f64; 2],
    ) -> Edge {
        let dir = Vector3::new(to[0] - from[0], to[1] - from[1], 0.0);
        let len = dir.norm();
        Edge::builder()
            .curve(
                Curve::Line {
                    origin: Point3::new(from[0], from[1], 0.0),
                    dir: dir / len,
                },
                0.0,
                len,
            )
            .pcurve(
                surface,
                Curve2d::Line2d {
                    origin: Point2::new(from[0], from[1]),
                    dir: Vector2::new(to[0] - from[0], to[1] - from[1]) / len,
                },
                0.0,
                len,
            )
            .build()
    }

    #[test]
    fn test_same_range_flag() {
        let surface = plane_surface();
        let mismatched = Edge::builder()
            .curve(
                Curve::Line {
                    origin: Point3::origin(),
                    dir: Vector3::x(),
                },
                0.0,
                2.0,
            )
            .pcurve(
                &surface,
                Curve2d::Line2d {
                    origin: Point2::origin(),
                    dir: Vector2::x(),
                },
                0.0,
                1.0,
            )
            .build();
        let wire = Wire::new(vec![
            mismatched,
            pcurve_edge(&surface, [2.0, 0.0], [2.0, 2.0]),
            pcurve_edge(&surface, [2.0, 2.0], [0.0, 2.0]),
            pcurve_edge(&surface, [0.0, 2.0], [0.0, 0.0]),
        ]);
        let face = Face::builder(surface).wire(wire).build();
        assert!(
            statuses(&analyze(&Shape::from(face))).contains(&CheckStatus::InvalidSameRangeFlag)
        );
    }

    #[test]
    fn test_pcurve_off_the_curve() {
        let surface = plane_surface();
        let lying = Edge::builder()
            .curve(
                Curve::Line {
                    origin: Point3::origin(),
                    dir: Vector3::x(),
                },
                0.0,
                2.0,
            )
            .pcurve(
                &surface,
                Curve2d::Line2d {
                    origin: Point2::new(0.0, 0.5),
                    dir: Vector2::x(),
                },
                0.0,
                2.0,
            )
            .build();
        let wire = Wire::new(vec![
            lying,
            pcurve_edge(&surface, [2.0, 0.0], [2.0, 2.0]),
            pcurve_edge(&surface, [2.0, 2.0], [0.0, 2.0]),
            pcurve_edge(&surface, [0.0, 2.0], [0.0, 0.0]),
        ]);
        let face = Face::builder(surface).wire(wire).build();
        assert!(
            statuses(&analyze(&Shape::from(face))).contains(&CheckStatus::InvalidCurveOnSurface)
        );
    }

    #[test]
    fn test_self_intersecting_wire() {
        let surface = plane_surface();
        let bow_tie = Wire::new(vec![
            pcurve_edge(&surface, [0.0, 0.0], [2.0, 2.0]),
            pcurve_edge(&surface, [2.0, 2.0], [2.0, 0.0]),
            pcurve_edge(&surface, [2.0, 0.0], [0.0, 1.7]),
            pcurve_edge(&surface, [0.0, 1.7], [0.0, 0.0]),
        ]);
        let face = Face::builder(surface).wire(bow_tie).build();
        let found = statuses(&analyze(&Shape::from(face)));
        assert!(found.contains(&CheckStatus::SelfIntersectingWire));
        assert!(found.contains(&CheckStatus::InvalidWire));
    }

    #[test]
    fn test_hole_outside_outer_loop() {
        let face = Face::builder(plane_surface())
            .wire(rect_wire(0.0, 0.0, 1.0, 1.0))
            .wire(rect_wire(5.0, 5.0, 6.0, 6.0))
            .build();
        assert!(
            statuses(&analyze(&Shape::from(face)))
                .contains(&CheckStatus::InvalidImbricationOfWires)
        );
    }

    #[test]
    fn test_intersecting_wires() {
        let face = Face::builder(plane_surface())
            .wire(rect_wire(0.0, 0.0, 4.0, 3.0))
            .wire(rect_wire(3.01, 1.0, 5.0, 2.0))
            .build();
        assert!(
            statuses(&analyze(&Shape::from(face))).contains(&CheckStatus::IntersectingWires)
        );
    }

    /// Two unit squares sharing one vertical edge node.
    fn open_shell() -> Shell {
        let shared = line_edge([1.0, 0.0], [1.0, 1.0]);
        let left = Wire::new(vec![
            line_edge([0.0, 0.0], [1.0, 0.0]),
            shared.clone(),
            line_edge([1.0, 1.0], [0.0, 1.0]),
            line_edge([0.0, 1.0], [0.0, 0.0]),
        ]);
        let right = Wire::new(vec![
            line_edge([2.0, 0.0], [2.0, 1.0]),
            line_edge([2.0, 1.0], [1.0, 1.0]),
            shared.reversed(),
            line_edge([1.0, 0.0], [2.0, 0.0]),
        ]);
        let surface = plane_surface();
        Shell::new(vec![
            Face::builder(Arc::clone(&surface)).wire(left).build(),
            Face::builder(surface).wire(right).build(),
        ])
    }

    #[test]
    fn test_open_shell_reports_free_edges() {
        let found = statuses(&analyze(&Shape::from(open_shell())));
        let free = found
            .iter()
            .filter(|s| **s == CheckStatus::FreeEdge)
            .count();
        assert_eq!(free, 6);
        assert!(found.contains(&CheckStatus::NotClosed));
        assert!(!found.contains(&CheckStatus::InvalidMultiConnexity));
    }

    #[test]
    fn test_over_shared_edge() {
        let shared = line_edge([1.0, 0.0], [1.0, 1.0]);
        let surface = plane_surface();
        let face = |wire| Face::builder(Arc::clone(&surface)).wire(wire).build();
        let wire_with = |e: Edge| {
            Wire::new(vec![
                line_edge([0.0, 0.0], [1.0, 0.0]),
                e,
                line_edge([1.0, 1.0], [0.0, 1.0]),
                line_edge([0.0, 1.0], [0.0, 0.0]),
            ])
        };
        let shell = Shell::new(vec![
            face(wire_with(shared.clone())),
            face(wire_with(shared.clone())),
            face(wire_with(shared.clone())),
        ]);
        assert!(
            statuses(&analyze(&Shape::from(shell)))
                .contains(&CheckStatus::InvalidMultiConnexity)
        );
    }

    #[test]
    fn test_solid_and_compound_dispatch() {
        let solid = Solid::new(vec![open_shell()]);
        assert!(statuses(&analyze(&Shape::from(solid))).contains(&CheckStatus::NotClosed));
        let compound = Compound::new(vec![
            Shape::from(Wire::new(Vec::new())),
            Shape::from(Shell::new(Vec::new())),
        ]);
        let found = statuses(&analyze(&Shape::from(compound)));
        assert!(found.contains(&CheckStatus::EmptyWire));
        assert!(found.contains(&CheckStatus::EmptyShell));
    }
}

//! Geometry descriptor records.
//!
//! Every curve and surface becomes a small tagged document. B-splines and
//! planes carry their full definition; the remaining kinds are reduced to a
//! type marker and viewers fall back to the tessellation for their shape.
//! Periodic B-splines are rewritten in clamped non-periodic form before
//! encoding; no record ever carries a periodicity flag.

use nalgebra::{Point3, Vector3};

use crate::doc::Document;
use crate::geom::{BSplineCurve, BSplineSurface, Curve, Surface};

pub(crate) fn pnt_write(p: &Point3<f64>) -> Document {
    let mut doc = Document::seq();
    doc.push(p.x);
    doc.push(p.y);
    doc.push(p.z);
    doc
}

pub(crate) fn dir_write(d: &Vector3<f64>) -> Document {
    let mut doc = Document::seq();
    doc.push(d.x);
    doc.push(d.y);
    doc.push(d.z);
    doc
}

fn f64_seq(values: Vec<f64>) -> Document {
    let mut doc = Document::seq();
    for v in values {
        doc.push(v);
    }
    doc
}

/// Knot list for a curve record: the multiplicity-unrolled sequence with
/// the first and last entries snapped onto their immediate neighbors.
/// Existing consumers expect exactly this shape, and only for curves;
/// surface knot lists go out untouched.
fn curve_knots(curve: &BSplineCurve) -> Vec<f64> {
    let mut knots = curve.knot_sequence();
    if knots.len() > 2 {
        knots[0] = knots[1];
        let last = knots.len() - 1;
        knots[last] = knots[last - 1];
    }
    knots
}

pub(crate) fn curve_write(curve: &Curve) -> Document {
    let mut doc = Document::map();
    match curve {
        Curve::BSpline(bs) => {
            let canonical;
            let bs = if bs.is_periodic() {
                canonical = bs.set_not_periodic();
                &canonical
            } else {
                bs
            };
            doc.set("TYPE", "B-SPLINE");
            doc.set("deg", bs.degree());
            doc.set("knots", f64_seq(curve_knots(bs)));
            doc.set("weights", f64_seq(bs.effective_weights()));
            let mut cp = Document::seq();
            for pole in bs.poles() {
                cp.push(pnt_write(pole));
            }
            doc.set("cp", cp);
        }
        Curve::Bezier { .. } => doc.set("TYPE", "BEZIER"),
        Curve::Trimmed { .. } => doc.set("TYPE", "TRIMMED"),
        Curve::Circle { .. } | Curve::Ellipse { .. } => doc.set("TYPE", "CONIC"),
        Curve::Offset { .. } => doc.set("TYPE", "OFFSET"),
        Curve::Line { .. } => doc.set("TYPE", "LINE"),
    }
    doc
}

pub(crate) fn surface_write(surface: &Surface) -> Document {
    let mut doc = Document::map();
    match surface {
        Surface::BSpline(bs) => {
            let canonical;
            let bs = if bs.is_u_periodic() || bs.is_v_periodic() {
                canonical = bs.set_not_periodic();
                &canonical
            } else {
                bs
            };
            doc.set("TYPE", "B-SPLINE");
            doc.set("degU", bs.u_degree());
            doc.set("degV", bs.v_degree());
            doc.set("knotsU", f64_seq(bs.u_knot_sequence()));
            doc.set("knotsV", f64_seq(bs.v_knot_sequence()));
            let mut weights = Document::seq();
            for row in bs.effective_weights() {
                weights.push(f64_seq(row));
            }
            doc.set("weights", weights);
            let mut cp = Document::seq();
            for row in bs.poles() {
                let mut out = Document::seq();
                for pole in row {
                    out.push(pnt_write(pole));
                }
                cp.push(out);
            }
            doc.set("cp", cp);
        }
        Surface::Plane {
            origin,
            normal,
            x_dir,
        } => {
            doc.set("TYPE", "PLANE");
            doc.set("normal", dir_write(normal));
            doc.set("origin", pnt_write(origin));
            doc.set("xDir", dir_write(x_dir));
        }
        Surface::Extrusion { .. } | Surface::Revolution { .. } => doc.set("TYPE", "SWEPT"),
        Surface::Offset { .. } => doc.set("TYPE", "OFFSET"),
        Surface::Cylinder { .. } => doc.set("TYPE", "UNKNOWN"),
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_is_type_only() {
        let doc = curve_write(&Curve::Line {
            origin: Point3::origin(),
            dir: Vector3::x(),
        });
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.get("TYPE").and_then(Document::as_str), Some("LINE"));
    }

    #[test]
    fn test_conic_and_marker_types() {
        let circle = Curve::Circle {
            center: Point3::origin(),
            x_dir: Vector3::x(),
            y_dir: Vector3::y(),
            radius: 2.0,
        };
        let ellipse = Curve::Ellipse {
            center: Point3::origin(),
            x_dir: Vector3::x(),
            y_dir: Vector3::y(),
            major: 3.0,
            minor: 1.0,
        };
        let bezier = Curve::Bezier {
            poles: vec![Point3::origin(), Point3::new(1.0, 1.0, 0.0)],
            weights: None,
        };
        let trimmed = Curve::Trimmed {
            basis: Box::new(circle.clone()),
            first: 0.0,
            last: 1.0,
        };
        let offset = Curve::Offset {
            basis: Box::new(circle.clone()),
            distance: 0.5,
            plane_normal: Vector3::z(),
        };
        for (curve, expected) in [
            (circle, "CONIC"),
            (ellipse, "CONIC"),
            (bezier, "BEZIER"),
            (trimmed, "TRIMMED"),
            (offset, "OFFSET"),
        ] {
            let doc = curve_write(&curve);
            assert_eq!(doc.get("TYPE").and_then(Document::as_str), Some(expected));
        }
    }

    #[test]
    fn test_bspline_curve_record() {
        let bs = BSplineCurve::new(
            1,
            vec![0.0, 1.0, 2.0, 3.0],
            vec![1, 2, 2, 1],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
            ],
            None,
            false,
        )
        .unwrap();
        let doc = curve_write(&Curve::BSpline(bs));
        assert_eq!(doc.get("TYPE").and_then(Document::as_str), Some("B-SPLINE"));
        assert_eq!(doc.get("deg").and_then(Document::as_i64), Some(1));
        // unrolled [0,1,1,2,2,3] with both ends snapped inward
        let knots: Vec<f64> = collect_f64(doc.get("knots").unwrap());
        assert_eq!(knots, vec![1.0, 1.0, 1.0, 2.0, 2.0, 2.0]);
        let weights: Vec<f64> = collect_f64(doc.get("weights").unwrap());
        assert_eq!(weights, vec![1.0; 4]);
        assert_eq!(doc.get("cp").map(Document::len), Some(4));
    }

    #[test]
    fn test_clamped_curve_knots_survive_snap() {
        let bs = BSplineCurve::new(
            1,
            vec![0.0, 1.0],
            vec![2, 2],
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)],
            None,
            false,
        )
        .unwrap();
        let doc = curve_write(&Curve::BSpline(bs));
        let knots: Vec<f64> = collect_f64(doc.get("knots").unwrap());
        assert_eq!(knots, vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_periodic_curve_canonicalized() {
        let bs = BSplineCurve::new(
            1,
            vec![0.0, 1.0, 2.0, 3.0],
            vec![1, 1, 1, 1],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            None,
            true,
        )
        .unwrap();
        let doc = curve_write(&Curve::BSpline(bs));
        assert!(!doc.contains_key("periodic"));
        let knots = doc.get("knots").map(Document::len).unwrap();
        let cp = doc.get("cp").map(Document::len).unwrap();
        let deg = doc.get("deg").and_then(Document::as_i64).unwrap() as usize;
        assert_eq!(cp, knots - deg - 1);
    }

    #[test]
    fn test_rational_curve_weights() {
        let bs = BSplineCurve::new(
            2,
            vec![0.0, 1.0],
            vec![3, 3],
            vec![
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            Some(vec![1.0, std::f64::consts::FRAC_1_SQRT_2, 1.0]),
            false,
        )
        .unwrap();
        let doc = curve_write(&Curve::BSpline(bs));
        let weights: Vec<f64> = collect_f64(doc.get("weights").unwrap());
        assert_eq!(weights[0], 1.0);
        assert!((weights[1] - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn test_plane_record_layout() {
        let doc = surface_write(&Surface::Plane {
            origin: Point3::new(1.0, 2.0, 3.0),
            normal: Vector3::z(),
            x_dir: Vector3::x(),
        });
        assert_eq!(
            doc.to_json().unwrap(),
            r#"{"TYPE":"PLANE","normal":[0.0,0.0,1.0],"origin":[1.0,2.0,3.0],"xDir":[1.0,0.0,0.0]}"#
        );
    }

    #[test]
    fn test_surface_markers() {
        let line = Curve::Line {
            origin: Point3::origin(),
            dir: Vector3::x(),
        };
        let extrusion = Surface::Extrusion {
            basis: line.clone(),
            dir: Vector3::z(),
        };
        let revolution = Surface::Revolution {
            basis: line,
            axis_origin: Point3::origin(),
            axis_dir: Vector3::z(),
        };
        let cylinder = Surface::Cylinder {
            origin: Point3::origin(),
            axis: Vector3::z(),
            x_dir: Vector3::x(),
            radius: 1.0,
        };
        let offset = Surface::Offset {
            basis: Box::new(cylinder.clone()),
            distance: 0.25,
        };
        for (surface, expected) in [
            (extrusion, "SWEPT"),
            (revolution, "SWEPT"),
            (offset, "OFFSET"),
            (cylinder, "UNKNOWN"),
        ] {
            let doc = surface_write(&surface);
            assert_eq!(doc.len(), 1);
            assert_eq!(doc.get("TYPE").and_then(Document::as_str), Some(expected));
        }
    }

    #[test]
    fn test_bspline_surface_record() {
        let bs = BSplineSurface::new(
            1,
            1,
            vec![0.0, 1.0, 2.0],
            vec![0.0, 1.0],
            vec![1, 2, 1],
            vec![2, 2],
            vec![
                vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
                vec![Point3::new(1.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)],
            ],
            None,
            false,
            false,
        )
        .unwrap();
        let doc = surface_write(&Surface::BSpline(bs));
        assert_eq!(doc.get("TYPE").and_then(Document::as_str), Some("B-SPLINE"));
        assert_eq!(doc.get("degU").and_then(Document::as_i64), Some(1));
        assert_eq!(doc.get("degV").and_then(Document::as_i64), Some(1));
        // surface knots carry no end snap
        let knots_u: Vec<f64> = collect_f64(doc.get("knotsU").unwrap());
        assert_eq!(knots_u, vec![0.0, 1.0, 1.0, 2.0]);
        let knots_v: Vec<f64> = collect_f64(doc.get("knotsV").unwrap());
        assert_eq!(knots_v, vec![0.0, 0.0, 1.0, 1.0]);
        // grids laid out as u rows of v columns
        let weights = doc.get("weights").unwrap();
        assert_eq!(weights.len(), 2);
        assert_eq!(collect_f64(weights.at(0).unwrap()), vec![1.0, 1.0]);
        let cp = doc.get("cp").unwrap();
        let corner = cp.at(1).unwrap().at(1).unwrap();
        assert_eq!(collect_f64(corner), vec![1.0, 1.0, 1.0]);
    }

    fn collect_f64(doc: &Document) -> Vec<f64> {
        (0..doc.len())
            .map(|i| doc.at(i).and_then(Document::as_f64).unwrap())
            .collect()
    }
}

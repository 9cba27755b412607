//! Curve descriptors.

use nalgebra::{Point2, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

use crate::geom::bspline::de_boor;
use crate::geom::{BSplineCurve, BSplineCurve2d, Trsf};
use crate::{Result, ShapeIoError};

/// A 3D curve. Edges carry exactly one of these forms; consumers match
/// exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Curve {
    /// Unbounded line through `origin` along unit `dir`.
    Line {
        origin: Point3<f64>,
        dir: Vector3<f64>,
    },
    /// Full circle: `center + radius * (cos(t) x_dir + sin(t) y_dir)`.
    Circle {
        center: Point3<f64>,
        x_dir: Vector3<f64>,
        y_dir: Vector3<f64>,
        radius: f64,
    },
    Ellipse {
        center: Point3<f64>,
        x_dir: Vector3<f64>,
        y_dir: Vector3<f64>,
        major: f64,
        minor: f64,
    },
    /// `basis` shifted by `distance` along `tangent x plane_normal`,
    /// normalized.
    Offset {
        basis: Box<Curve>,
        distance: f64,
        plane_normal: Vector3<f64>,
    },
    Bezier {
        poles: Vec<Point3<f64>>,
        weights: Option<Vec<f64>>,
    },
    Trimmed {
        basis: Box<Curve>,
        first: f64,
        last: f64,
    },
    BSpline(BSplineCurve),
}

impl Curve {
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        match self {
            Curve::Line { origin, dir } => origin + dir * t,
            Curve::Circle {
                center,
                x_dir,
                y_dir,
                radius,
            } => center + (x_dir * t.cos() + y_dir * t.sin()) * *radius,
            Curve::Ellipse {
                center,
                x_dir,
                y_dir,
                major,
                minor,
            } => center + x_dir * (major * t.cos()) + y_dir * (minor * t.sin()),
            Curve::Offset {
                basis,
                distance,
                plane_normal,
            } => {
                let base = basis.point_at(t);
                let side = basis.tangent_at(t).cross(plane_normal);
                let len = side.norm();
                if len < 1e-12 {
                    base
                } else {
                    base + side * (*distance / len)
                }
            }
            Curve::Bezier { poles, weights } => {
                let degree = poles.len().saturating_sub(1);
                if degree == 0 {
                    return poles.first().copied().unwrap_or_else(Point3::origin);
                }
                let mut flat = vec![0.0; degree + 1];
                flat.extend(std::iter::repeat_n(1.0, degree + 1));
                let hpoles: Vec<[f64; 4]> = poles
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        let w = weights.as_ref().map_or(1.0, |ws| ws[i]);
                        [p.x * w, p.y * w, p.z * w, w]
                    })
                    .collect();
                let h = de_boor(&flat, &hpoles, degree, t.clamp(0.0, 1.0));
                Point3::new(h[0] / h[3], h[1] / h[3], h[2] / h[3])
            }
            Curve::Trimmed { basis, first, last } => basis.point_at(t.clamp(*first, *last)),
            Curve::BSpline(c) => c.point_at(t),
        }
    }

    /// Start of the parameter range, `None` for an unbounded line.
    pub fn first_parameter(&self) -> Option<f64> {
        match self {
            Curve::Line { .. } => None,
            Curve::Circle { .. } | Curve::Ellipse { .. } | Curve::Bezier { .. } => Some(0.0),
            Curve::Offset { basis, .. } => basis.first_parameter(),
            Curve::Trimmed { first, .. } => Some(*first),
            Curve::BSpline(c) => Some(c.first_parameter()),
        }
    }

    pub fn last_parameter(&self) -> Option<f64> {
        match self {
            Curve::Line { .. } => None,
            Curve::Circle { .. } | Curve::Ellipse { .. } => Some(std::f64::consts::TAU),
            Curve::Bezier { .. } => Some(1.0),
            Curve::Offset { basis, .. } => basis.last_parameter(),
            Curve::Trimmed { last, .. } => Some(*last),
            Curve::BSpline(c) => Some(c.last_parameter()),
        }
    }

    /// Converts to a non-periodic B-spline. Only the Bezier and B-spline
    /// forms convert; trimmed and analytic kinds report `Unsupported` so
    /// callers fall back to the raw representation over the stored range.
    pub fn to_bspline(&self) -> Result<BSplineCurve> {
        match self {
            Curve::BSpline(c) => Ok(c.set_not_periodic()),
            Curve::Bezier { poles, weights } => {
                let degree = poles.len().saturating_sub(1);
                BSplineCurve::new(
                    degree,
                    vec![0.0, 1.0],
                    vec![degree + 1, degree + 1],
                    poles.clone(),
                    weights.clone(),
                    false,
                )
            }
            other => Err(ShapeIoError::Unsupported(format!(
                "{} curve has no bounded NURBS form",
                other.kind_name()
            ))),
        }
    }

    pub fn transformed(&self, trsf: &Trsf) -> Curve {
        match self {
            Curve::Line { origin, dir } => Curve::Line {
                origin: trsf.transform_point(origin),
                dir: trsf.transform_vector(dir),
            },
            Curve::Circle {
                center,
                x_dir,
                y_dir,
                radius,
            } => Curve::Circle {
                center: trsf.transform_point(center),
                x_dir: trsf.transform_vector(x_dir),
                y_dir: trsf.transform_vector(y_dir),
                radius: *radius,
            },
            Curve::Ellipse {
                center,
                x_dir,
                y_dir,
                major,
                minor,
            } => Curve::Ellipse {
                center: trsf.transform_point(center),
                x_dir: trsf.transform_vector(x_dir),
                y_dir: trsf.transform_vector(y_dir),
                major: *major,
                minor: *minor,
            },
            Curve::Offset {
                basis,
                distance,
                plane_normal,
            } => Curve::Offset {
                basis: Box::new(basis.transformed(trsf)),
                distance: *distance,
                plane_normal: trsf.transform_vector(plane_normal),
            },
            Curve::Bezier { poles, weights } => Curve::Bezier {
                poles: poles.iter().map(|p| trsf.transform_point(p)).collect(),
                weights: weights.clone(),
            },
            Curve::Trimmed { basis, first, last } => Curve::Trimmed {
                basis: Box::new(basis.transformed(trsf)),
                first: *first,
                last: *last,
            },
            Curve::BSpline(c) => Curve::BSpline(c.transformed(trsf)),
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Curve::Line { .. } => "line",
            Curve::Circle { .. } => "circle",
            Curve::Ellipse { .. } => "ellipse",
            Curve::Offset { .. } => "offset",
            Curve::Bezier { .. } => "bezier",
            Curve::Trimmed { .. } => "trimmed",
            Curve::BSpline(_) => "b-spline",
        }
    }

    /// Unnormalized tangent by central difference. Adequate for offset-curve
    /// evaluation; the analytic kinds are smooth everywhere.
    fn tangent_at(&self, t: f64) -> Vector3<f64> {
        let h = 1e-6 * (1.0 + t.abs());
        (self.point_at(t + h) - self.point_at(t - h)) / (2.0 * h)
    }
}

/// A curve in the parameter space of a surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Curve2d {
    Line2d {
        origin: Point2<f64>,
        dir: Vector2<f64>,
    },
    BSpline2d(BSplineCurve2d),
}

impl Curve2d {
    pub fn point_at(&self, t: f64) -> Point2<f64> {
        match self {
            Curve2d::Line2d { origin, dir } => origin + dir * t,
            Curve2d::BSpline2d(c) => c.point_at(t),
        }
    }

    pub fn first_parameter(&self) -> Option<f64> {
        match self {
            Curve2d::Line2d { .. } => None,
            Curve2d::BSpline2d(c) => Some(c.first_parameter()),
        }
    }

    pub fn last_parameter(&self) -> Option<f64> {
        match self {
            Curve2d::Line2d { .. } => None,
            Curve2d::BSpline2d(c) => Some(c.last_parameter()),
        }
    }
}

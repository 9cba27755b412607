//! Surface descriptors.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::geom::{BSplineSurface, Curve, Trsf};

/// A surface. Faces carry exactly one of these forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Surface {
    /// Plane through `origin`; `u` runs along `x_dir`, `v` along
    /// `normal x x_dir`.
    Plane {
        origin: Point3<f64>,
        normal: Vector3<f64>,
        x_dir: Vector3<f64>,
    },
    /// Right circular cylinder; `u` is the angle around `axis`, `v` the
    /// height along it.
    Cylinder {
        origin: Point3<f64>,
        axis: Vector3<f64>,
        x_dir: Vector3<f64>,
        radius: f64,
    },
    /// `basis(u)` swept along `dir * v`.
    Extrusion { basis: Curve, dir: Vector3<f64> },
    /// `basis(v)` rotated by angle `u` around the axis.
    Revolution {
        basis: Curve,
        axis_origin: Point3<f64>,
        axis_dir: Vector3<f64>,
    },
    /// `basis` shifted by `distance` along its own normal.
    Offset {
        basis: Box<Surface>,
        distance: f64,
    },
    BSpline(BSplineSurface),
}

impl Surface {
    pub fn point_at(&self, u: f64, v: f64) -> Point3<f64> {
        match self {
            Surface::Plane {
                origin,
                normal,
                x_dir,
            } => origin + x_dir * u + normal.cross(x_dir) * v,
            Surface::Cylinder {
                origin,
                axis,
                x_dir,
                radius,
            } => {
                let y_dir = axis.cross(x_dir);
                origin + (x_dir * u.cos() + y_dir * u.sin()) * *radius + axis * v
            }
            Surface::Extrusion { basis, dir } => basis.point_at(u) + dir * v,
            Surface::Revolution {
                basis,
                axis_origin,
                axis_dir,
            } => {
                let rot = Trsf::rotation(*axis_origin, *axis_dir, u);
                rot.transform_point(&basis.point_at(v))
            }
            Surface::Offset { basis, distance } => {
                let base = basis.point_at(u, v);
                match basis.normal_at(u, v) {
                    Some(n) => base + n * *distance,
                    None => base,
                }
            }
            Surface::BSpline(s) => s.point_at(u, v),
        }
    }

    /// Value and first partial derivatives. Swept and offset kinds use
    /// central differences; the rest are exact.
    pub fn d1(&self, u: f64, v: f64) -> (Point3<f64>, Vector3<f64>, Vector3<f64>) {
        match self {
            Surface::Plane {
                origin,
                normal,
                x_dir,
            } => {
                let y_dir = normal.cross(x_dir);
                (origin + x_dir * u + y_dir * v, *x_dir, y_dir)
            }
            Surface::Cylinder {
                origin,
                axis,
                x_dir,
                radius,
            } => {
                let y_dir = axis.cross(x_dir);
                let p = origin + (x_dir * u.cos() + y_dir * u.sin()) * *radius + axis * v;
                let du = (y_dir * u.cos() - x_dir * u.sin()) * *radius;
                (p, du, *axis)
            }
            Surface::BSpline(s) => s.d1(u, v),
            _ => {
                let hu = 1e-6 * (1.0 + u.abs());
                let hv = 1e-6 * (1.0 + v.abs());
                let du = (self.point_at(u + hu, v) - self.point_at(u - hu, v)) / (2.0 * hu);
                let dv = (self.point_at(u, v + hv) - self.point_at(u, v - hv)) / (2.0 * hv);
                (self.point_at(u, v), du, dv)
            }
        }
    }

    /// Normalized du x dv, or `None` where the parameterization degenerates.
    pub fn normal_at(&self, u: f64, v: f64) -> Option<Vector3<f64>> {
        if let Surface::Plane { normal, .. } = self {
            let len = normal.norm();
            return if len < 1e-12 {
                None
            } else {
                Some(normal / len)
            };
        }
        let (_, du, dv) = self.d1(u, v);
        let n = du.cross(&dv);
        let len = n.norm();
        if len < 1e-12 { None } else { Some(n / len) }
    }

    pub fn transformed(&self, trsf: &Trsf) -> Surface {
        match self {
            Surface::Plane {
                origin,
                normal,
                x_dir,
            } => Surface::Plane {
                origin: trsf.transform_point(origin),
                normal: trsf.transform_vector(normal),
                x_dir: trsf.transform_vector(x_dir),
            },
            Surface::Cylinder {
                origin,
                axis,
                x_dir,
                radius,
            } => Surface::Cylinder {
                origin: trsf.transform_point(origin),
                axis: trsf.transform_vector(axis),
                x_dir: trsf.transform_vector(x_dir),
                radius: *radius,
            },
            Surface::Extrusion { basis, dir } => Surface::Extrusion {
                basis: basis.transformed(trsf),
                dir: trsf.transform_vector(dir),
            },
            Surface::Revolution {
                basis,
                axis_origin,
                axis_dir,
            } => Surface::Revolution {
                basis: basis.transformed(trsf),
                axis_origin: trsf.transform_point(axis_origin),
                axis_dir: trsf.transform_vector(axis_dir),
            },
            Surface::Offset { basis, distance } => Surface::Offset {
                basis: Box::new(basis.transformed(trsf)),
                distance: *distance,
            },
            Surface::BSpline(s) => Surface::BSpline(s.transformed(trsf)),
        }
    }
}

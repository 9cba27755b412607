//! Rigid placement transform.
//!
//! Rotation plus translation, scale fixed at 1. Shape occurrences carry one
//! of these as their location; explorers compose them while descending, so
//! exported coordinates come out in the global frame.

use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{Result, ShapeIoError};

const RIGID_EPS: f64 = 1e-9;

/// A rigid transformation in 3D space (rotation + translation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trsf {
    rot: Matrix3<f64>,
    trans: Vector3<f64>,
}

impl Default for Trsf {
    fn default() -> Self {
        Self::identity()
    }
}

impl Trsf {
    /// Identity transformation.
    pub fn identity() -> Self {
        Self {
            rot: Matrix3::identity(),
            trans: Vector3::zeros(),
        }
    }

    /// Pure translation.
    pub fn translation(v: Vector3<f64>) -> Self {
        Self {
            rot: Matrix3::identity(),
            trans: v,
        }
    }

    /// Rotation by `angle` (radians) about the axis through `origin` along
    /// the unit direction `dir` (Rodrigues form).
    pub fn rotation(origin: Point3<f64>, dir: Vector3<f64>, angle: f64) -> Self {
        let d = dir.normalize();
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (d.x, d.y, d.z);
        let rot = Matrix3::new(
            t * x * x + c,
            t * x * y - s * z,
            t * x * z + s * y,
            t * x * y + s * z,
            t * y * y + c,
            t * y * z - s * x,
            t * x * z - s * y,
            t * y * z + s * x,
            t * z * z + c,
        );
        // translation part: p - R*p so the axis point stays fixed
        let p = origin.coords;
        let trans = p - rot * p;
        Self { rot, trans }
    }

    /// Builds a transform from 12 row-major coefficients of a 3x4 affine
    /// matrix. The rotation block must be orthonormal with determinant +1;
    /// anything else (scaling, mirroring, shear) is rejected.
    pub fn from_values(v: [f64; 12]) -> Result<Self> {
        let rot = Matrix3::new(v[0], v[1], v[2], v[4], v[5], v[6], v[8], v[9], v[10]);
        let trans = Vector3::new(v[3], v[7], v[11]);

        let gram = rot.transpose() * rot;
        if (gram - Matrix3::identity()).norm() > RIGID_EPS * 10.0 {
            return Err(ShapeIoError::InvalidGeometry(
                "placement matrix is not orthonormal".to_string(),
            ));
        }
        if rot.determinant() < 0.0 {
            return Err(ShapeIoError::InvalidGeometry(
                "placement matrix is mirroring".to_string(),
            ));
        }
        Ok(Self { rot, trans })
    }

    /// Returns the 12 row-major coefficients of the 3x4 affine matrix.
    pub fn values(&self) -> [f64; 12] {
        let r = &self.rot;
        let t = &self.trans;
        [
            r[(0, 0)],
            r[(0, 1)],
            r[(0, 2)],
            t.x,
            r[(1, 0)],
            r[(1, 1)],
            r[(1, 2)],
            t.y,
            r[(2, 0)],
            r[(2, 1)],
            r[(2, 2)],
            t.z,
        ]
    }

    pub fn is_identity(&self) -> bool {
        self.rot == Matrix3::identity() && self.trans == Vector3::zeros()
    }

    /// Composition: the result applies `other` first, then `self`.
    pub fn multiplied(&self, other: &Trsf) -> Trsf {
        if self.is_identity() {
            return *other;
        }
        if other.is_identity() {
            return *self;
        }
        Trsf {
            rot: self.rot * other.rot,
            trans: self.rot * other.trans + self.trans,
        }
    }

    /// Rigid inverse.
    pub fn inverted(&self) -> Trsf {
        let rt = self.rot.transpose();
        Trsf {
            rot: rt,
            trans: -(rt * self.trans),
        }
    }

    pub fn transform_point(&self, p: &Point3<f64>) -> Point3<f64> {
        if self.is_identity() {
            return *p;
        }
        Point3::from(self.rot * p.coords + self.trans)
    }

    /// Transforms a vector (rotation only, no translation).
    pub fn transform_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        if self.is_identity() {
            return *v;
        }
        self.rot * v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_identity() {
        let t = Trsf::identity();
        assert!(t.is_identity());
        let p = Point3::new(1.0, 2.0, 3.0);
        assert_eq!(t.transform_point(&p), p);
    }

    #[test]
    fn test_translation() {
        let t = Trsf::translation(Vector3::new(1.0, -2.0, 0.5));
        let p = t.transform_point(&Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, -2.0);
        assert_relative_eq!(p.z, 0.5);
        // vectors ignore translation
        let v = t.transform_vector(&Vector3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(v.x, 1.0);
        assert_relative_eq!(v.y, 0.0);
    }

    #[test]
    fn test_rotation_about_z() {
        let t = Trsf::rotation(Point3::origin(), Vector3::z(), FRAC_PI_2);
        let p = t.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_keeps_axis_point_fixed() {
        let origin = Point3::new(2.0, 1.0, 0.0);
        let t = Trsf::rotation(origin, Vector3::z(), 1.3);
        let moved = t.transform_point(&origin);
        assert_relative_eq!(moved.x, origin.x, epsilon = 1e-12);
        assert_relative_eq!(moved.y, origin.y, epsilon = 1e-12);
    }

    #[test]
    fn test_from_values_roundtrip() {
        let t = Trsf::rotation(Point3::new(1.0, 0.0, 0.0), Vector3::y(), 0.7)
            .multiplied(&Trsf::translation(Vector3::new(3.0, 0.0, -1.0)));
        let back = Trsf::from_values(t.values()).unwrap();
        let p = Point3::new(0.2, 0.4, 0.6);
        let a = t.transform_point(&p);
        let b = back.transform_point(&p);
        assert_relative_eq!(a.x, b.x, epsilon = 1e-12);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-12);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-12);
    }

    #[test]
    fn test_from_values_rejects_scaling() {
        let v = [2.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 2.0, 0.0];
        assert!(Trsf::from_values(v).is_err());
    }

    #[test]
    fn test_from_values_rejects_mirror() {
        let v = [-1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        assert!(Trsf::from_values(v).is_err());
    }

    #[test]
    fn test_compose_and_invert() {
        let a = Trsf::rotation(Point3::origin(), Vector3::z(), 0.4);
        let b = Trsf::translation(Vector3::new(0.0, 5.0, 0.0));
        let ab = a.multiplied(&b);
        let p = Point3::new(1.0, 1.0, 1.0);
        // ab applies b first
        let expect = a.transform_point(&b.transform_point(&p));
        let got = ab.transform_point(&p);
        assert_relative_eq!(got.x, expect.x, epsilon = 1e-12);
        assert_relative_eq!(got.y, expect.y, epsilon = 1e-12);

        let inv = ab.inverted();
        let round = inv.transform_point(&got);
        assert_relative_eq!(round.x, p.x, epsilon = 1e-12);
        assert_relative_eq!(round.y, p.y, epsilon = 1e-12);
        assert_relative_eq!(round.z, p.z, epsilon = 1e-12);
    }
}

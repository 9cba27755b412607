//! Tessellation data and the mesher seam.
//!
//! Faces cache a [`Triangulation`]; edges cache either a standalone
//! [`EdgePolyline`] or a [`PolygonOnTriangulation`] tied to one face mesh by
//! storage identity. Meshing itself lives behind the [`Tessellator`] trait so
//! hosts can plug in their own mesher or pre-attach meshes and pass
//! [`NullTessellator`].

use std::sync::Arc;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::brep::Shape;
use crate::{Result, ShapeIoError};

/// A face mesh: nodes in the face frame, optional UV coordinates per node,
/// triangles as node index triples.
///
/// # Example
/// ```ignore
/// use shapeio::mesh::Triangulation;
///
/// // one triangle over three nodes
/// let tri = Triangulation::new(
///     vec![
///         nalgebra::Point3::new(0.0, 0.0, 0.0),
///         nalgebra::Point3::new(1.0, 0.0, 0.0),
///         nalgebra::Point3::new(0.0, 1.0, 0.0),
///     ],
///     None,
///     vec![[0, 1, 2]],
///     0.1,
/// )?;
/// assert_eq!(tri.triangles.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Triangulation {
    pub nodes: Vec<Point3<f64>>,
    /// UV of each node in the surface parameter space, when the mesher
    /// provides it. Required by the face-to-face classifier.
    pub uv: Option<Vec<[f64; 2]>>,
    pub triangles: Vec<[u32; 3]>,
    /// Deflection the mesh was built at.
    pub deflection: f64,
}

impl Triangulation {
    pub fn new(
        nodes: Vec<Point3<f64>>,
        uv: Option<Vec<[f64; 2]>>,
        triangles: Vec<[u32; 3]>,
        deflection: f64,
    ) -> Result<Self> {
        let n = nodes.len();
        if let Some(uv) = &uv {
            if uv.len() != n {
                return Err(ShapeIoError::InvalidGeometry(format!(
                    "{} UV coordinates for {n} mesh nodes",
                    uv.len()
                )));
            }
        }
        for t in &triangles {
            if t.iter().any(|&i| i as usize >= n) {
                return Err(ShapeIoError::InvalidGeometry(format!(
                    "triangle {t:?} indexes past {n} mesh nodes"
                )));
            }
        }
        Ok(Self {
            nodes,
            uv,
            triangles,
            deflection,
        })
    }

    pub fn node(&self, i: u32) -> Point3<f64> {
        self.nodes[i as usize]
    }

    pub fn uv_node(&self, i: u32) -> Option<[f64; 2]> {
        self.uv.as_ref().map(|uv| uv[i as usize])
    }
}

/// Standalone 3D polyline approximating an edge, the fallback when no
/// polygon-on-triangulation matches the face mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgePolyline {
    pub points: Vec<Point3<f64>>,
}

/// An edge's polyline expressed as node indices into one face's mesh.
/// Matched against a face's current mesh by `Arc` identity, so a re-mesh
/// silently invalidates old polygons.
#[derive(Debug, Clone)]
pub struct PolygonOnTriangulation {
    pub triangulation: Arc<Triangulation>,
    pub nodes: Vec<u32>,
}

impl PolygonOnTriangulation {
    pub fn new(triangulation: Arc<Triangulation>, nodes: Vec<u32>) -> Result<Self> {
        let n = triangulation.nodes.len();
        if nodes.iter().any(|&i| i as usize >= n) {
            return Err(ShapeIoError::InvalidGeometry(format!(
                "edge polygon indexes past {n} mesh nodes"
            )));
        }
        Ok(Self {
            triangulation,
            nodes,
        })
    }
}

/// Ensure-meshed semantics: fill in a triangulation for every face below
/// `shape` that lacks one at the requested deflection. Implementations must
/// leave already-meshed faces alone.
pub trait Tessellator {
    fn tessellate(&self, shape: &Shape, deflection: f64) -> Result<()>;
}

/// No-op mesher for hosts that attach triangulations themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullTessellator;

impl Tessellator for NullTessellator {
    fn tessellate(&self, _shape: &Shape, _deflection: f64) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_triangulation_construction() {
        let tri = Triangulation::new(nodes(), None, vec![[0, 1, 2]], 0.1).unwrap();
        assert_eq!(tri.node(2), Point3::new(0.0, 1.0, 0.0));
        assert!(tri.uv_node(0).is_none());
    }

    #[test]
    fn test_triangle_index_out_of_range_rejected() {
        let bad = Triangulation::new(nodes(), None, vec![[0, 1, 3]], 0.1);
        assert!(bad.is_err());
    }

    #[test]
    fn test_uv_length_mismatch_rejected() {
        let bad = Triangulation::new(nodes(), Some(vec![[0.0, 0.0]]), vec![[0, 1, 2]], 0.1);
        assert!(bad.is_err());
    }

    #[test]
    fn test_polygon_indices_validated() {
        let tri = Arc::new(Triangulation::new(nodes(), None, vec![[0, 1, 2]], 0.1).unwrap());
        assert!(PolygonOnTriangulation::new(Arc::clone(&tri), vec![0, 2]).is_ok());
        assert!(PolygonOnTriangulation::new(tri, vec![0, 5]).is_err());
    }
}

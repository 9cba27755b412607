//! Hand-built fixtures standing in for a modeling kernel: planar shapes
//! with p-curved boundaries, plus a deterministic mesher for them.

use std::sync::Arc;

use nalgebra::{Point2, Point3, Vector2, Vector3};
use shapeio::brep::topology;
use shapeio::geom::{Curve, Curve2d, Surface};
use shapeio::mesh::{PolygonOnTriangulation, Tessellator, Triangulation};
use shapeio::{Edge, Face, Shape, Wire};

pub fn plane_surface() -> Arc<Surface> {
    Arc::new(Surface::Plane {
        origin: Point3::origin(),
        normal: Vector3::z(),
        x_dir: Vector3::x(),
    })
}

/// Line edge in the z=0 plane carrying a matching p-curve on `surface`.
pub fn line_edge(surface: &Arc<Surface>, from: [f64; 2], to: [f64; 2]) -> Edge {
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

pub fn rect_wire(surface: &Arc<Surface>, x0: f64, y0: f64, x1: f64, y1: f64) -> Wire {
    Wire::new(vec![
        line_edge(surface, [x0, y0], [x1, y0]),
        line_edge(surface, [x1, y0], [x1, y1]),
        line_edge(surface, [x1, y1], [x0, y1]),
        line_edge(surface, [x0, y1], [x0, y0]),
    ])
}

/// Rectangular face over [x0,x1] x [y0,y1] on the z=0 plane, unmeshed.
pub fn rect_face(x0: f64, y0: f64, x1: f64, y1: f64) -> Face {
    let surface = plane_surface();
    let wire = rect_wire(&surface, x0, y0, x1, y1);
    Face::builder(surface).wire(wire).build()
}

/// Meshes planar faces with two triangles over the boundary's bounding
/// rectangle and attaches a boundary polygon to every edge whose endpoints
/// land on rectangle corners. Already-meshed faces are left alone; faces on
/// other surface kinds are skipped.
pub struct PlanarTessellator;

impl Tessellator for PlanarTessellator {
    fn tessellate(&self, shape: &Shape, deflection: f64) -> shapeio::Result<()> {
        for face in topology::faces(shape) {
            if face.triangulation().is_none() {
                mesh_planar_face(&face, deflection)?;
            }
        }
        Ok(())
    }
}

fn mesh_planar_face(face: &Face, deflection: f64) -> shapeio::Result<()> {
    let Surface::Plane {
        origin,
        normal,
        x_dir,
    } = face.surface().as_ref()
    else {
        return Ok(());
    };
    let o = *origin;
    let n = normal.normalize();
    let x = (x_dir - n * x_dir.dot(&n)).normalize();
    let y = n.cross(&x);
    let uv_of = |p: &Point3<f64>| {
        let r = p - o;
        [r.dot(&x), r.dot(&y)]
    };

    // face-local edge endpoints, then their bounding rectangle in the plane
    let mut spans: Vec<(Edge, Point3<f64>, Point3<f64>)> = Vec::new();
    for wire in &face.data().wires {
        for edge in wire.edges() {
            let Some(ec) = edge.curve() else {
                continue;
            };
            let a = edge.location().transform_point(&ec.curve.point_at(ec.first));
            let b = edge.location().transform_point(&ec.curve.point_at(ec.last));
            spans.push((edge.clone(), a, b));
        }
    }
    let mut lo = [f64::INFINITY; 2];
    let mut hi = [f64::NEG_INFINITY; 2];
    for (_, a, b) in &spans {
        for p in [a, b] {
            let [u, v] = uv_of(p);
            lo[0] = lo[0].min(u);
            lo[1] = lo[1].min(v);
            hi[0] = hi[0].max(u);
            hi[1] = hi[1].max(v);
        }
    }
    if !(lo[0].is_finite() && hi[0] - lo[0] > 1e-9 && hi[1] - lo[1] > 1e-9) {
        return Ok(());
    }

    let corner_uv = [
        [lo[0], lo[1]],
        [hi[0], lo[1]],
        [lo[0], hi[1]],
        [hi[0], hi[1]],
    ];
    let nodes: Vec<Point3<f64>> = corner_uv.iter().map(|&[u, v]| o + x * u + y * v).collect();
    let tri = Arc::new(Triangulation::new(
        nodes.clone(),
        Some(corner_uv.to_vec()),
        vec![[0, 1, 2], [1, 3, 2]],
        deflection,
    )?);
    face.set_triangulation(Some(Arc::clone(&tri)));

    let hit = |p: &Point3<f64>| nodes.iter().position(|c| (c - p).norm() < 1e-9);
    for (edge, a, b) in &spans {
        if let (Some(i), Some(j)) = (hit(a), hit(b)) {
            edge.add_polygon(PolygonOnTriangulation::new(
                Arc::clone(&tri),
                vec![i as u32, j as u32],
            )?);
        }
    }
    Ok(())
}

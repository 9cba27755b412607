//! Shape, preview, and history document writers.
//!
//! [`shape_write`] walks every meshed face of a shape and emits an ordered
//! document per face: surface record, edge loops, orientation,
//! tessellation, and identity fields. Faces without a triangulation and
//! edges without a 3D curve are skipped with a diagnostic; a validity
//! sweep runs first and its findings are logged, never fatal.
//!
//! [`preview_write`] is the cheap variant: a flat sequence of triangle
//! entries across all faces with no topology or identity attached.

mod geometry;
mod history;

pub use history::history_write;

use std::sync::Arc;

use nalgebra::{Point3, Vector3};
use tracing::{debug, warn};

use crate::brep::topology::{self, EdgeFaceMap};
use crate::brep::{Edge, Face, Shape};
use crate::check;
use crate::doc::Document;
use crate::geom::{Curve, Surface};
use crate::mesh::{Tessellator, Triangulation};
use crate::store::HandleArena;
use crate::Result;

use geometry::{curve_write, dir_write, pnt_write, surface_write};

/// Deflection used when the caller does not pick one.
pub const DEFAULT_DEFLECTION: f64 = 2.0;

/// Substitute for non-positive deflection requests.
const FALLBACK_DEFLECTION: f64 = 3.0;

/// Options for [`shape_write`].
#[derive(Clone, Copy, Debug)]
pub struct ExportOptions {
    /// Linear deflection for meshing. Non-positive values fall back to an
    /// internal default.
    pub deflection: f64,
    /// Omit bulk tessellation arrays; topology, geometry, and identity
    /// fields are still emitted.
    pub structure_only: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            deflection: DEFAULT_DEFLECTION,
            structure_only: false,
        }
    }
}

/// Full interrogation of a shape: `{"faces": [...]}` with one entry per
/// meshed face. Runs the validity analysis (logged), ensures the shape is
/// tessellated, then walks faces in traversal order.
pub fn shape_write(
    shape: &Shape,
    tessellator: &dyn Tessellator,
    handles: &mut HandleArena,
    options: &ExportOptions,
) -> Result<Document> {
    for diagnostic in check::analyze(shape) {
        warn!("{diagnostic}");
    }
    tessellator.tessellate(shape, effective_deflection(options.deflection))?;

    let edge_faces = EdgeFaceMap::build(shape);
    let mut faces = Document::seq();
    for face in topology::faces(shape) {
        if let Some(doc) = face_write(&face, &edge_faces, handles, options) {
            faces.push(doc);
        }
    }
    let mut out = Document::map();
    out.set("faces", faces);
    Ok(out)
}

/// Flat tessellation of every meshed face: one triangle entry per
/// triangle, across all faces, with no identity or topology fields.
pub fn preview_write(
    shape: &Shape,
    tessellator: &dyn Tessellator,
    deflection: f64,
) -> Result<Document> {
    tessellator.tessellate(shape, effective_deflection(deflection))?;
    let mut out = Document::seq();
    for face in topology::faces(shape) {
        let Some(triangulation) = face.triangulation() else {
            continue;
        };
        let nodes = placed_nodes(&triangulation, &face);
        let surface = face.surface().transformed(face.location());
        tessellation_write(&triangulation, &nodes, &surface, &mut out);
    }
    Ok(out)
}

fn effective_deflection(requested: f64) -> f64 {
    if requested > 0.0 {
        requested
    } else {
        FALLBACK_DEFLECTION
    }
}

/// Mesh nodes moved out of the face frame into model coordinates, computed
/// once per face and shared by triangle corners and edge polylines.
fn placed_nodes(triangulation: &Triangulation, face: &Face) -> Vec<Point3<f64>> {
    let location = face.location();
    triangulation
        .nodes
        .iter()
        .map(|n| location.transform_point(n))
        .collect()
}

fn face_write(
    face: &Face,
    edge_faces: &EdgeFaceMap,
    handles: &mut HandleArena,
    options: &ExportOptions,
) -> Option<Document> {
    let Some(triangulation) = face.triangulation() else {
        debug!("face {:#x} has no triangulation, skipping", face.stable_id());
        return None;
    };
    let nodes = placed_nodes(&triangulation, face);
    let surface = face.surface().transformed(face.location());

    let mut out = Document::map();
    out.set("surface", surface_write(&surface));

    let mut loops = Document::seq();
    for wire in face.wires() {
        let mut edges = Document::seq();
        for edge in wire.edges() {
            let Some(mut edge_out) = edge_write(&edge) else {
                warn!("edge {:#x} has no 3D curve, skipping", edge.stable_id());
                continue;
            };
            if !options.structure_only {
                edge_out.set("tess", edge_tessellation(&edge, &triangulation, &nodes));
            }
            edge_out.set("ptr", handles.insert(Shape::from(edge.clone())));
            edge_out.set("edgeRef", edge_faces.find_index(&edge) as u64);
            edge_out.set("ref", edge.stable_id());
            edges.push(edge_out);
        }
        loops.push(edges);
    }
    out.set("loops", loops);
    out.set("inverted", face.is_reversed());
    if !options.structure_only {
        let mut tess = Document::seq();
        tessellation_write(&triangulation, &nodes, &surface, &mut tess);
        out.set("tess", tess);
    }
    out.set("ref", face.stable_id());
    out.set("ptr", handles.insert(Shape::from(face.clone())));
    Some(out)
}

/// Geometry half of an edge record: endpoints, orientation, parameter
/// bounds, and the curve itself, in model coordinates. The curve goes
/// through NURBS conversion first; analytic kinds that have no bounded
/// NURBS form are written as-is over the edge's stored range.
fn edge_write(edge: &Edge) -> Option<Document> {
    let ec = edge.curve()?;
    let located = ec.curve.transformed(edge.location());
    let (curve, first, last) = match located.to_bspline() {
        Ok(bspline) => {
            let first = bspline.first_parameter();
            let last = bspline.last_parameter();
            (Curve::BSpline(bspline), first, last)
        }
        Err(_) => {
            debug!(
                "edge {:#x}: no NURBS form for {} curve, writing base form",
                edge.stable_id(),
                located.kind_name()
            );
            (located, ec.first, ec.last)
        }
    };

    let mut out = Document::map();
    out.set("a", pnt_write(&curve.point_at(first)));
    out.set("b", pnt_write(&curve.point_at(last)));
    out.set("inverted", edge.is_reversed());
    let mut bounds = Document::seq();
    bounds.push(first);
    bounds.push(last);
    out.set("curveBounds", bounds);
    out.set("curve", curve_write(&curve));
    Some(out)
}

/// Edge polyline in model coordinates: the polygon-on-triangulation for
/// this face's mesh when one exists, else the standalone polyline, else
/// empty.
fn edge_tessellation(
    edge: &Edge,
    triangulation: &Arc<Triangulation>,
    nodes: &[Point3<f64>],
) -> Document {
    let mut tess = Document::seq();
    if let Some(polygon) = edge.polygon_on(triangulation) {
        for &i in &polygon.nodes {
            tess.push(pnt_write(&nodes[i as usize]));
        }
    } else if let Some(polyline) = edge.polyline() {
        let location = edge.location();
        for p in &polyline.points {
            tess.push(pnt_write(&location.transform_point(p)));
        }
    }
    tess
}

/// One entry per triangle: the three corner positions, plus the three
/// corner normals unless the surface is a plane. Normals come from the
/// surface at each corner's UV node; a missing UV table degrades to null
/// components rather than failing the export.
fn tessellation_write(
    triangulation: &Triangulation,
    nodes: &[Point3<f64>],
    surface: &Surface,
    out: &mut Document,
) {
    let is_plane = matches!(surface, Surface::Plane { .. });
    for triangle in &triangulation.triangles {
        let mut entry = Document::seq();
        let mut corners = Document::seq();
        for &i in triangle {
            corners.push(pnt_write(&nodes[i as usize]));
        }
        entry.push(corners);
        if !is_plane {
            let mut normals = Document::seq();
            for &i in triangle {
                let n = triangulation
                    .uv_node(i)
                    .and_then(|[u, v]| surface.normal_at(u, v))
                    .unwrap_or_else(|| Vector3::new(f64::NAN, f64::NAN, f64::NAN));
                normals.push(dir_write(&n));
            }
            entry.push(normals);
        }
        out.push(entry);
    }
}

//! Boundary-representation topology.
//!
//! A shape is an occurrence: an `Arc` to the shared underlying node plus a
//! placement and an orientation flag. Copying a shape shares the node, so a
//! node observed through different placements keeps a single identity —
//! that identity is what [`stable_id`](Shape::stable_id) exposes.
//!
//! Nodes are immutable except for the mesh caches (face triangulations,
//! edge polylines), which sit behind locks so cached meshes can be attached
//! and dropped on shared nodes.

pub mod topology;

use std::sync::{Arc, Weak};

use nalgebra::Point3;
use parking_lot::RwLock;

use crate::TOLERANCE;
use crate::geom::{Curve, Curve2d, Surface, Trsf};
use crate::mesh::{EdgePolyline, PolygonOnTriangulation, Triangulation};

/// Generates the occurrence struct for one shape kind: shared node +
/// placement + orientation, with the handling every kind shares.
macro_rules! occurrence {
    ($(#[$meta:meta])* $name:ident($data:ident)) => {
        $(#[$meta])*
        #[derive(Debug, Clone)]
        pub struct $name {
            data: Arc<$data>,
            location: Trsf,
            reversed: bool,
        }

        impl $name {
            pub fn from_data(data: $data) -> Self {
                Self {
                    data: Arc::new(data),
                    location: Trsf::identity(),
                    reversed: false,
                }
            }

            pub fn data(&self) -> &$data {
                &self.data
            }

            /// Placement of this occurrence relative to the model frame.
            pub fn location(&self) -> &Trsf {
                &self.location
            }

            pub fn is_reversed(&self) -> bool {
                self.reversed
            }

            /// Same node observed under an additional placement applied on
            /// the outside.
            pub fn located(&self, trsf: &Trsf) -> Self {
                Self {
                    data: Arc::clone(&self.data),
                    location: trsf.multiplied(&self.location),
                    reversed: self.reversed,
                }
            }

            /// Same node with the placement replaced outright.
            pub fn with_location(&self, trsf: Trsf) -> Self {
                Self {
                    data: Arc::clone(&self.data),
                    location: trsf,
                    reversed: self.reversed,
                }
            }

            /// Same node with opposite orientation.
            pub fn reversed(&self) -> Self {
                Self {
                    data: Arc::clone(&self.data),
                    location: self.location,
                    reversed: !self.reversed,
                }
            }

            /// Identity of the shared node. Equal for occurrences of one
            /// node, distinct for distinct nodes, valid while the node is
            /// alive. Never persist it.
            pub fn stable_id(&self) -> u64 {
                Arc::as_ptr(&self.data) as usize as u64
            }

            pub fn same_node(&self, other: &Self) -> bool {
                Arc::ptr_eq(&self.data, &other.data)
            }

            /// This occurrence as seen from inside a parent occurrence:
            /// placements compose, orientations combine.
            pub(crate) fn under(&self, parent: &Trsf, parent_reversed: bool) -> Self {
                Self {
                    data: Arc::clone(&self.data),
                    location: parent.multiplied(&self.location),
                    reversed: self.reversed ^ parent_reversed,
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Underlying nodes
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct VertexData {
    pub point: Point3<f64>,
    pub tolerance: f64,
}

/// The 3D curve of an edge together with the edge's parameter range on it.
#[derive(Debug, Clone)]
pub struct EdgeCurve {
    pub curve: Curve,
    pub first: f64,
    pub last: f64,
}

/// An edge's image in the parameter space of one surface, keyed by the
/// surface's storage identity.
#[derive(Debug, Clone)]
pub struct CurveOnSurface {
    pub surface: Weak<Surface>,
    pub curve: Curve2d,
    pub first: f64,
    pub last: f64,
}

#[derive(Debug)]
pub struct EdgeData {
    pub curve: Option<EdgeCurve>,
    pub start: Option<Vertex>,
    pub end: Option<Vertex>,
    pub pcurves: Vec<CurveOnSurface>,
    pub tolerance: f64,
    pub degenerated: bool,
    pub same_range: bool,
    pub same_parameter: bool,
    polyline: RwLock<Option<EdgePolyline>>,
    polygons: RwLock<Vec<PolygonOnTriangulation>>,
}

/// Edges in connected traversal order.
#[derive(Debug)]
pub struct WireData {
    pub edges: Vec<Edge>,
}

/// Wires in stored order; the first is the outer loop.
#[derive(Debug)]
pub struct FaceData {
    pub surface: Arc<Surface>,
    pub wires: Vec<Wire>,
    pub tolerance: f64,
    triangulation: RwLock<Option<Arc<Triangulation>>>,
}

#[derive(Debug)]
pub struct ShellData {
    pub faces: Vec<Face>,
}

#[derive(Debug)]
pub struct SolidData {
    pub shells: Vec<Shell>,
}

#[derive(Debug)]
pub struct CompoundData {
    pub shapes: Vec<Shape>,
}

// ---------------------------------------------------------------------------
// Occurrences
// ---------------------------------------------------------------------------

occurrence!(Vertex(VertexData));
occurrence!(Edge(EdgeData));
occurrence!(Wire(WireData));
occurrence!(Face(FaceData));
occurrence!(Shell(ShellData));
occurrence!(Solid(SolidData));
occurrence!(Compound(CompoundData));

impl Vertex {
    pub fn new(point: Point3<f64>) -> Self {
        Self::with_tolerance(point, TOLERANCE)
    }

    pub fn with_tolerance(point: Point3<f64>, tolerance: f64) -> Self {
        Self::from_data(VertexData { point, tolerance })
    }

    /// Position in the model frame.
    pub fn point(&self) -> Point3<f64> {
        self.location.transform_point(&self.data.point)
    }

    pub fn tolerance(&self) -> f64 {
        self.data.tolerance
    }
}

impl Edge {
    pub fn builder() -> EdgeBuilder {
        EdgeBuilder::new()
    }

    /// The 3D curve and range, in the node frame. Apply
    /// [`location`](Self::location) to take it into the model frame.
    pub fn curve(&self) -> Option<&EdgeCurve> {
        self.data.curve.as_ref()
    }

    pub fn range(&self) -> Option<(f64, f64)> {
        self.data.curve.as_ref().map(|c| (c.first, c.last))
    }

    pub fn start(&self) -> Option<Vertex> {
        self.data
            .start
            .as_ref()
            .map(|v| v.under(&self.location, self.reversed))
    }

    pub fn end(&self) -> Option<Vertex> {
        self.data
            .end
            .as_ref()
            .map(|v| v.under(&self.location, self.reversed))
    }

    pub fn tolerance(&self) -> f64 {
        self.data.tolerance
    }

    pub fn is_degenerated(&self) -> bool {
        self.data.degenerated
    }

    pub fn same_range(&self) -> bool {
        self.data.same_range
    }

    pub fn same_parameter(&self) -> bool {
        self.data.same_parameter
    }

    /// The p-curve of this edge on the given surface node, if one was
    /// recorded. Lookup is by surface storage identity, not geometry.
    pub fn pcurve_on(&self, surface: &Arc<Surface>) -> Option<CurveOnSurface> {
        self.data
            .pcurves
            .iter()
            .find(|pc| {
                pc.surface
                    .upgrade()
                    .is_some_and(|s| Arc::ptr_eq(&s, surface))
            })
            .cloned()
    }

    pub fn pcurves(&self) -> &[CurveOnSurface] {
        &self.data.pcurves
    }

    pub fn polyline(&self) -> Option<EdgePolyline> {
        self.data.polyline.read().clone()
    }

    pub fn set_polyline(&self, polyline: Option<EdgePolyline>) {
        *self.data.polyline.write() = polyline;
    }

    /// The polygon bound to the given face mesh, matched by `Arc` identity.
    pub fn polygon_on(&self, triangulation: &Arc<Triangulation>) -> Option<PolygonOnTriangulation> {
        self.data
            .polygons
            .read()
            .iter()
            .find(|p| Arc::ptr_eq(&p.triangulation, triangulation))
            .cloned()
    }

    /// Attaches a polygon, replacing any previous one on the same mesh.
    pub fn add_polygon(&self, polygon: PolygonOnTriangulation) {
        let mut polygons = self.data.polygons.write();
        polygons.retain(|p| !Arc::ptr_eq(&p.triangulation, &polygon.triangulation));
        polygons.push(polygon);
    }

    /// Drops the cached polyline and all polygons.
    pub fn clean_mesh(&self) {
        *self.data.polyline.write() = None;
        self.data.polygons.write().clear();
    }
}

impl Wire {
    pub fn new(edges: Vec<Edge>) -> Self {
        Self::from_data(WireData { edges })
    }

    /// Edges in stored connected order, observed under this occurrence.
    pub fn edges(&self) -> Vec<Edge> {
        self.data
            .edges
            .iter()
            .map(|e| e.under(&self.location, self.reversed))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.data.edges.len()
    }
}

impl Face {
    pub fn builder(surface: Arc<Surface>) -> FaceBuilder {
        FaceBuilder::new(surface)
    }

    /// The surface node, in the face frame.
    pub fn surface(&self) -> &Arc<Surface> {
        &self.data.surface
    }

    /// Wires in stored order, observed under this occurrence. The first is
    /// the outer loop.
    pub fn wires(&self) -> Vec<Wire> {
        self.data
            .wires
            .iter()
            .map(|w| w.under(&self.location, self.reversed))
            .collect()
    }

    pub fn outer_wire(&self) -> Option<Wire> {
        self.data
            .wires
            .first()
            .map(|w| w.under(&self.location, self.reversed))
    }

    pub fn tolerance(&self) -> f64 {
        self.data.tolerance
    }

    pub fn triangulation(&self) -> Option<Arc<Triangulation>> {
        self.data.triangulation.read().clone()
    }

    pub fn set_triangulation(&self, triangulation: Option<Arc<Triangulation>>) {
        *self.data.triangulation.write() = triangulation;
    }
}

impl Shell {
    pub fn new(faces: Vec<Face>) -> Self {
        Self::from_data(ShellData { faces })
    }

    pub fn faces(&self) -> Vec<Face> {
        self.data
            .faces
            .iter()
            .map(|f| f.under(&self.location, self.reversed))
            .collect()
    }
}

impl Solid {
    pub fn new(shells: Vec<Shell>) -> Self {
        Self::from_data(SolidData { shells })
    }

    pub fn shells(&self) -> Vec<Shell> {
        self.data
            .shells
            .iter()
            .map(|s| s.under(&self.location, self.reversed))
            .collect()
    }
}

impl Compound {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self::from_data(CompoundData { shapes })
    }

    pub fn shapes(&self) -> Vec<Shape> {
        self.data
            .shapes
            .iter()
            .map(|s| s.under(&self.location, self.reversed))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Builds an edge node. Endpoints are derived from the curve range when not
/// given explicitly.
pub struct EdgeBuilder {
    curve: Option<EdgeCurve>,
    start: Option<Vertex>,
    end: Option<Vertex>,
    pcurves: Vec<CurveOnSurface>,
    tolerance: f64,
    degenerated: bool,
    same_range: bool,
    same_parameter: bool,
}

impl EdgeBuilder {
    pub fn new() -> Self {
        Self {
            curve: None,
            start: None,
            end: None,
            pcurves: Vec::new(),
            tolerance: TOLERANCE,
            degenerated: false,
            same_range: true,
            same_parameter: true,
        }
    }

    pub fn curve(mut self, curve: Curve, first: f64, last: f64) -> Self {
        self.curve = Some(EdgeCurve { curve, first, last });
        self
    }

    pub fn endpoints(mut self, start: Vertex, end: Vertex) -> Self {
        self.start = Some(start);
        self.end = Some(end);
        self
    }

    /// Records the edge's image on a surface node. The reference is weak;
    /// the face owning the surface keeps it alive.
    pub fn pcurve(mut self, surface: &Arc<Surface>, curve: Curve2d, first: f64, last: f64) -> Self {
        self.pcurves.push(CurveOnSurface {
            surface: Arc::downgrade(surface),
            curve,
            first,
            last,
        });
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn degenerated(mut self, flag: bool) -> Self {
        self.degenerated = flag;
        self
    }

    pub fn same_range(mut self, flag: bool) -> Self {
        self.same_range = flag;
        self
    }

    pub fn same_parameter(mut self, flag: bool) -> Self {
        self.same_parameter = flag;
        self
    }

    pub fn build(self) -> Edge {
        let (start, end) = match (&self.start, &self.end, &self.curve) {
            (None, None, Some(ec)) => {
                let s = Vertex::new(ec.curve.point_at(ec.first));
                let e = Vertex::new(ec.curve.point_at(ec.last));
                (Some(s), Some(e))
            }
            _ => (self.start, self.end),
        };
        Edge::from_data(EdgeData {
            curve: self.curve,
            start,
            end,
            pcurves: self.pcurves,
            tolerance: self.tolerance,
            degenerated: self.degenerated,
            same_range: self.same_range,
            same_parameter: self.same_parameter,
            polyline: RwLock::new(None),
            polygons: RwLock::new(Vec::new()),
        })
    }
}

impl Default for EdgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FaceBuilder {
    surface: Arc<Surface>,
    wires: Vec<Wire>,
    tolerance: f64,
}

impl FaceBuilder {
    pub fn new(surface: Arc<Surface>) -> Self {
        Self {
            surface,
            wires: Vec::new(),
            tolerance: TOLERANCE,
        }
    }

    /// Adds a bounding wire; the first one added is the outer loop.
    pub fn wire(mut self, wire: Wire) -> Self {
        self.wires.push(wire);
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn build(self) -> Face {
        Face::from_data(FaceData {
            surface: self.surface,
            wires: self.wires,
            tolerance: self.tolerance,
            triangulation: RwLock::new(None),
        })
    }
}

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

/// Any shape kind.
#[derive(Debug, Clone)]
pub enum Shape {
    Vertex(Vertex),
    Edge(Edge),
    Wire(Wire),
    Face(Face),
    Shell(Shell),
    Solid(Solid),
    Compound(Compound),
}

macro_rules! for_each_kind {
    ($self:expr, $s:ident => $body:expr) => {
        match $self {
            Shape::Vertex($s) => $body,
            Shape::Edge($s) => $body,
            Shape::Wire($s) => $body,
            Shape::Face($s) => $body,
            Shape::Shell($s) => $body,
            Shape::Solid($s) => $body,
            Shape::Compound($s) => $body,
        }
    };
}

impl Shape {
    pub fn stable_id(&self) -> u64 {
        for_each_kind!(self, s => s.stable_id())
    }

    pub fn location(&self) -> &Trsf {
        for_each_kind!(self, s => s.location())
    }

    pub fn is_reversed(&self) -> bool {
        for_each_kind!(self, s => s.is_reversed())
    }

    pub fn located(&self, trsf: &Trsf) -> Shape {
        match self {
            Shape::Vertex(s) => Shape::Vertex(s.located(trsf)),
            Shape::Edge(s) => Shape::Edge(s.located(trsf)),
            Shape::Wire(s) => Shape::Wire(s.located(trsf)),
            Shape::Face(s) => Shape::Face(s.located(trsf)),
            Shape::Shell(s) => Shape::Shell(s.located(trsf)),
            Shape::Solid(s) => Shape::Solid(s.located(trsf)),
            Shape::Compound(s) => Shape::Compound(s.located(trsf)),
        }
    }

    pub fn with_location(&self, trsf: Trsf) -> Shape {
        match self {
            Shape::Vertex(s) => Shape::Vertex(s.with_location(trsf)),
            Shape::Edge(s) => Shape::Edge(s.with_location(trsf)),
            Shape::Wire(s) => Shape::Wire(s.with_location(trsf)),
            Shape::Face(s) => Shape::Face(s.with_location(trsf)),
            Shape::Shell(s) => Shape::Shell(s.with_location(trsf)),
            Shape::Solid(s) => Shape::Solid(s.with_location(trsf)),
            Shape::Compound(s) => Shape::Compound(s.with_location(trsf)),
        }
    }

    pub(crate) fn under(&self, parent: &Trsf, parent_reversed: bool) -> Shape {
        match self {
            Shape::Vertex(s) => Shape::Vertex(s.under(parent, parent_reversed)),
            Shape::Edge(s) => Shape::Edge(s.under(parent, parent_reversed)),
            Shape::Wire(s) => Shape::Wire(s.under(parent, parent_reversed)),
            Shape::Face(s) => Shape::Face(s.under(parent, parent_reversed)),
            Shape::Shell(s) => Shape::Shell(s.under(parent, parent_reversed)),
            Shape::Solid(s) => Shape::Solid(s.under(parent, parent_reversed)),
            Shape::Compound(s) => Shape::Compound(s.under(parent, parent_reversed)),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Vertex(_) => "vertex",
            Shape::Edge(_) => "edge",
            Shape::Wire(_) => "wire",
            Shape::Face(_) => "face",
            Shape::Shell(_) => "shell",
            Shape::Solid(_) => "solid",
            Shape::Compound(_) => "compound",
        }
    }

    pub fn as_face(&self) -> Option<&Face> {
        match self {
            Shape::Face(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Shape::Edge(e) => Some(e),
            _ => None,
        }
    }

    /// Drops every cached triangulation and edge polygon below this shape.
    pub fn clean(&self) {
        for face in topology::faces(self) {
            face.set_triangulation(None);
        }
        for edge in topology::edges(self) {
            edge.clean_mesh();
        }
    }
}

impl From<Vertex> for Shape {
    fn from(v: Vertex) -> Self {
        Shape::Vertex(v)
    }
}

impl From<Edge> for Shape {
    fn from(e: Edge) -> Self {
        Shape::Edge(e)
    }
}

impl From<Wire> for Shape {
    fn from(w: Wire) -> Self {
        Shape::Wire(w)
    }
}

impl From<Face> for Shape {
    fn from(f: Face) -> Self {
        Shape::Face(f)
    }
}

impl From<Shell> for Shape {
    fn from(s: Shell) -> Self {
        Shape::Shell(s)
    }
}

impl From<Solid> for Shape {
    fn from(s: Solid) -> Self {
        Shape::Solid(s)
    }
}

impl From<Compound> for Shape {
    fn from(c: Compound) -> Self {
        Shape::Compound(c)
    }
}

//! shapeio: structured interrogation and export for B-Rep models
//!
//! Walks a boundary-representation shape graph, extracts tessellation and
//! geometry data into ordered JSON-serializable documents, answers geometric
//! classification queries, and exports model production history.
//!
//! The modeling kernel proper (meshing, booleans, file readers) lives behind
//! explicit seams: [`mesh::Tessellator`] and [`session::ModelImporter`]. This
//! crate owns the data model those collaborators populate and everything the
//! host sees:
//!
//! - `doc`: insertion-ordered document values with JSON encoding
//! - `geom`: closed curve/surface descriptor enums with evaluation
//! - `brep`: shared-node topology (vertices through compounds)
//! - `mesh`: triangulation data and the mesher seam
//! - `check`: validity analysis (report-only diagnostics)
//! - `export`: shape/geometry/history document writers
//! - `classify`: point/face/edge containment and overlap queries
//! - `store`: named-shape store, history record, handle arena
//! - `session`: the operation facade hosts call

pub mod brep;
pub mod check;
pub mod classify;
pub mod doc;
pub mod export;
pub mod geom;
pub mod mesh;
pub mod session;
pub mod store;

// Re-exports for convenience
pub use brep::{Compound, Edge, Face, Shape, Shell, Solid, Vertex, Wire};
pub use check::{analyze, CheckStatus, Diagnostic};
pub use classify::{Coverage, PointFaceState};
pub use doc::Document;
pub use export::ExportOptions;
pub use geom::{BSplineCurve, BSplineSurface, Curve, Curve2d, Surface, Trsf};
pub use mesh::{NullTessellator, Tessellator, Triangulation};
pub use session::{ModelImporter, NullImporter, Session};
pub use store::{HandleArena, HandleKey, History, ModelStore};

/// Tolerance for geometric comparisons
pub const TOLERANCE: f64 = 1e-6;

/// Result type for shapeio operations
pub type Result<T> = std::result::Result<T, ShapeIoError>;

#[derive(Debug, thiserror::Error)]
pub enum ShapeIoError {
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Topology error: {0}")]
    TopologyError(String),

    #[error("Unknown shape: {0}")]
    UnknownShape(String),

    #[error("Stale or disposed handle {0:#x}")]
    StaleHandle(u64),

    #[error("Handle {0:#x} does not refer to a {1}")]
    WrongShapeKind(u64, &'static str),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    EncodeError(#[from] serde_json::Error),
}

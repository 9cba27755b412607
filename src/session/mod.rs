//! The operation facade hosts call.
//!
//! A [`Session`] owns everything an embedding needs to interrogate models:
//! the named-shape store, the production history, the handle arena, and the
//! two kernel seams ([`Tessellator`] for meshing, [`ModelImporter`] for file
//! loading). Every operation returns `Result` so a host binding can report
//! kernel failures instead of aborting; handle-taking operations resolve
//! through the arena and reject stale or wrong-kind handles with typed
//! errors.

use nalgebra::Point3;
use tracing::debug;

use crate::brep::{Compound, Edge, Face, Shape};
use crate::classify::{self, Coverage, PointFaceState};
use crate::doc::Document;
use crate::export::{self, ExportOptions};
use crate::geom::Trsf;
use crate::mesh::{NullTessellator, Tessellator};
use crate::store::{HandleArena, History, ModelStore};
use crate::{Result, ShapeIoError};

/// Reads an external CAD file into shapes. Implementations live next to the
/// kernel's file readers, outside this crate.
pub trait ModelImporter {
    /// Returns the file's top-level shapes, in file order.
    fn import(&self, path: &str) -> Result<Vec<Shape>>;
}

/// Importer seam for sessions without file loading support.
pub struct NullImporter;

impl ModelImporter for NullImporter {
    fn import(&self, path: &str) -> Result<Vec<Shape>> {
        Err(ShapeIoError::Unsupported(format!(
            "no importer configured, cannot read {path}"
        )))
    }
}

pub struct Session {
    store: ModelStore,
    history: History,
    arena: HandleArena,
    tessellator: Box<dyn Tessellator>,
    importer: Box<dyn ModelImporter>,
}

impl Session {
    pub fn new(tessellator: Box<dyn Tessellator>, importer: Box<dyn ModelImporter>) -> Self {
        Session {
            store: ModelStore::new(),
            history: History::new(),
            arena: HandleArena::new(),
            tessellator,
            importer,
        }
    }

    /// Stores a shape under a name, replacing any previous holder.
    pub fn set_shape(&mut self, name: impl Into<String>, shape: Shape) {
        self.store.set(name, shape);
    }

    /// Looks up a named shape.
    pub fn shape(&self, name: &str) -> Result<&Shape> {
        named(&self.store, name)
    }

    /// Names currently in the store, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.store.names()
    }

    /// The production-history record, for the modeling layer to fill.
    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    // -----------------------------------------------------------------------
    // Export
    // -----------------------------------------------------------------------

    /// Full interrogation of the named shape: `{"faces": [...], "ptr": n}`.
    ///
    /// The top-level `"ptr"` is a fresh handle to the shape itself, minted
    /// alongside the per-face and per-edge handles inside the document.
    pub fn export_shape(&mut self, name: &str, options: &ExportOptions) -> Result<Document> {
        let shape = named(&self.store, name)?;
        let mut out =
            export::shape_write(shape, self.tessellator.as_ref(), &mut self.arena, options)?;
        out.set("ptr", self.arena.insert(shape.clone()));
        Ok(out)
    }

    /// Flat triangle soup for the named shape, without identity fields.
    pub fn export_preview(&self, name: &str, deflection: f64) -> Result<Document> {
        let shape = named(&self.store, name)?;
        export::preview_write(shape, self.tessellator.as_ref(), deflection)
    }

    /// The current production-history record as a document.
    pub fn export_history(&self) -> Result<Document> {
        Ok(export::history_write(&self.history))
    }

    /// Root node id of the named shape, stable across placement and
    /// orientation changes.
    pub fn stable_reference(&self, name: &str) -> Result<u64> {
        Ok(named(&self.store, name)?.stable_id())
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    pub fn classify_point_to_face(
        &self,
        face: u64,
        point: &Point3<f64>,
        tolerance: f64,
    ) -> Result<PointFaceState> {
        let face = face_at(&self.arena, face)?;
        Ok(classify::point_to_face(face, point, tolerance))
    }

    pub fn classify_face_to_face(&self, a: u64, b: u64, tolerance: f64) -> Result<Coverage> {
        let a = face_at(&self.arena, a)?;
        let b = face_at(&self.arena, b)?;
        Ok(classify::face_to_face(a, b, tolerance))
    }

    pub fn classify_edge_to_face(&self, edge: u64, face: u64, tolerance: f64) -> Result<Coverage> {
        let edge = edge_at(&self.arena, edge)?;
        let face = face_at(&self.arena, face)?;
        Ok(classify::edge_to_face(edge, face, tolerance))
    }

    pub fn edges_overlap(
        &self,
        a: u64,
        b: u64,
        tolerance: f64,
        domain_distance: f64,
    ) -> Result<bool> {
        let a = edge_at(&self.arena, a)?;
        let b = edge_at(&self.arena, b)?;
        Ok(classify::edges_overlap(a, b, tolerance, domain_distance))
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Drops every cached mesh below the handle's shape and re-meshes at
    /// the given deflection.
    pub fn refresh_tessellation(&self, handle: u64, deflection: f64) -> Result<()> {
        let shape = self.arena.get(handle)?;
        shape.clean();
        self.tessellator.tessellate(shape, deflection)
    }

    /// Replaces the named shape's placement with a rigid transform given as
    /// row-major 3x4 affine coefficients. Non-rigid matrices are rejected.
    pub fn set_location(&mut self, name: &str, coefficients: [f64; 12]) -> Result<()> {
        let trsf = Trsf::from_values(coefficients)?;
        let placed = named(&self.store, name)?.with_location(trsf);
        self.store.set(name, placed);
        Ok(())
    }

    /// Loads an external model file through the importer seam.
    ///
    /// With `one_shape_only` the file's content is stored as one combined
    /// shape under `name` and the count comes back as -1. Otherwise each
    /// top-level shape is stored as `name_1 .. name_N`, the combined shape
    /// under `name`, and the count comes back as N.
    pub fn import_model(&mut self, name: &str, path: &str, one_shape_only: bool) -> Result<i32> {
        debug!("importing model from {path}");
        let roots = self.importer.import(path)?;
        let count = roots.len();
        let combined = match roots.as_slice() {
            [only] => only.clone(),
            _ => Shape::from(Compound::new(roots.clone())),
        };
        if one_shape_only {
            self.store.set(name, combined);
            return Ok(-1);
        }
        for (i, root) in roots.into_iter().enumerate() {
            self.store.set(format!("{name}_{}", i + 1), root);
        }
        self.store.set(name, combined);
        Ok(count as i32)
    }

    /// Frees the backing object of a handle minted by an earlier export.
    pub fn dispose(&mut self, handle: u64) -> Result<()> {
        self.arena.dispose(handle)?;
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new(Box::new(NullTessellator), Box::new(NullImporter))
    }
}

fn named<'a>(store: &'a ModelStore, name: &str) -> Result<&'a Shape> {
    store
        .get(name)
        .ok_or_else(|| ShapeIoError::UnknownShape(name.to_string()))
}

fn face_at(arena: &HandleArena, handle: u64) -> Result<&Face> {
    arena
        .get(handle)?
        .as_face()
        .ok_or(ShapeIoError::WrongShapeKind(handle, "face"))
}

fn edge_at(arena: &HandleArena, handle: u64) -> Result<&Edge> {
    arena
        .get(handle)?
        .as_edge()
        .ok_or(ShapeIoError::WrongShapeKind(handle, "edge"))
}

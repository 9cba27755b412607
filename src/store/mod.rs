//! Named shape store, production history tables, and the handle arena.

mod handles;

pub use handles::{HandleArena, HandleKey};

use crate::brep::Shape;

/// Insertion-ordered name-to-shape map. Lookups are linear; a store holds
/// tens of models, not thousands.
#[derive(Default)]
pub struct ModelStore {
    shapes: Vec<(String, Shape)>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces. Replacing keeps the name's original position.
    pub fn set(&mut self, name: impl Into<String>, shape: Shape) {
        let name = name.into();
        if let Some(slot) = self.shapes.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = shape;
        } else {
            self.shapes.push((name, shape));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Shape> {
        self.shapes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, shape)| shape)
    }

    pub fn remove(&mut self, name: &str) -> Option<Shape> {
        let at = self.shapes.iter().position(|(n, _)| n == name)?;
        Some(self.shapes.remove(at).1)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.shapes.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

/// Modification and generation relations recorded by modeling operations,
/// read back verbatim by the history exporter.
#[derive(Default)]
pub struct History {
    modified: Vec<(Shape, Vec<Shape>)>,
    generated: Vec<(Shape, Vec<Shape>)>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_modified(&mut self, source: Shape, targets: Vec<Shape>) {
        self.modified.push((source, targets));
    }

    pub fn record_generated(&mut self, source: Shape, targets: Vec<Shape>) {
        self.generated.push((source, targets));
    }

    pub fn modified(&self) -> &[(Shape, Vec<Shape>)] {
        &self.modified
    }

    pub fn generated(&self) -> &[(Shape, Vec<Shape>)] {
        &self.generated
    }

    pub fn clear(&mut self) {
        self.modified.clear();
        self.generated.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_empty() && self.generated.is_empty()
    }
}

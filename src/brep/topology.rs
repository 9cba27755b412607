//! Sub-shape exploration.
//!
//! Explorers descend parent shapes and hand back child occurrences observed
//! in the model frame: placements compose and orientations combine on the
//! way down. Order is the stored traversal order, which the exporter and
//! the ancestry map both rely on.

use std::collections::HashMap;

use super::{Edge, Face, Shape, Vertex};

/// All faces below `shape` in traversal order.
pub fn faces(shape: &Shape) -> Vec<Face> {
    let mut out = Vec::new();
    collect_faces(shape, &mut out);
    out
}

fn collect_faces(shape: &Shape, out: &mut Vec<Face>) {
    match shape {
        Shape::Face(f) => out.push(f.clone()),
        Shape::Shell(s) => out.extend(s.faces()),
        Shape::Solid(s) => {
            for shell in s.shells() {
                out.extend(shell.faces());
            }
        }
        Shape::Compound(c) => {
            for child in c.shapes() {
                collect_faces(&child, out);
            }
        }
        _ => {}
    }
}

/// All edge occurrences below `shape` in traversal order. An edge node
/// shared between faces shows up once per use; dedupe by
/// [`stable_id`](Edge::stable_id) where identity matters.
pub fn edges(shape: &Shape) -> Vec<Edge> {
    let mut out = Vec::new();
    collect_edges(shape, &mut out);
    out
}

fn collect_edges(shape: &Shape, out: &mut Vec<Edge>) {
    match shape {
        Shape::Edge(e) => out.push(e.clone()),
        Shape::Wire(w) => out.extend(w.edges()),
        Shape::Face(f) => {
            for wire in f.wires() {
                out.extend(wire.edges());
            }
        }
        Shape::Shell(_) | Shape::Solid(_) => {
            for face in faces(shape) {
                for wire in face.wires() {
                    out.extend(wire.edges());
                }
            }
        }
        Shape::Compound(c) => {
            for child in c.shapes() {
                collect_edges(&child, out);
            }
        }
        Shape::Vertex(_) => {}
    }
}

/// All vertex occurrences below `shape`.
pub fn vertices(shape: &Shape) -> Vec<Vertex> {
    match shape {
        Shape::Vertex(v) => vec![v.clone()],
        _ => {
            let mut out = Vec::new();
            for edge in edges(shape) {
                if let Some(v) = edge.start() {
                    out.push(v);
                }
                if let Some(v) = edge.end() {
                    out.push(v);
                }
            }
            out
        }
    }
}

/// Edge→faces ancestry over a shape, indexed in first-seen traversal order.
///
/// Indices are 1-based; `0` means the edge is not in the map. A seam edge
/// used twice by one face counts that face twice, which is what the
/// free-edge analysis wants.
pub struct EdgeFaceMap {
    order: Vec<Edge>,
    index_by_id: HashMap<u64, usize>,
    faces_by_id: HashMap<u64, Vec<Face>>,
}

impl EdgeFaceMap {
    pub fn build(shape: &Shape) -> Self {
        let mut map = Self {
            order: Vec::new(),
            index_by_id: HashMap::new(),
            faces_by_id: HashMap::new(),
        };
        for face in faces(shape) {
            for wire in face.wires() {
                for edge in wire.edges() {
                    let id = edge.stable_id();
                    if !map.index_by_id.contains_key(&id) {
                        map.order.push(edge.clone());
                        map.index_by_id.insert(id, map.order.len());
                    }
                    map.faces_by_id.entry(id).or_default().push(face.clone());
                }
            }
        }
        map
    }

    /// 1-based position of the edge's node in traversal order, `0` when the
    /// edge is not part of the mapped shape.
    pub fn find_index(&self, edge: &Edge) -> usize {
        self.index_by_id
            .get(&edge.stable_id())
            .copied()
            .unwrap_or(0)
    }

    /// Faces using the edge's node, one entry per use.
    pub fn faces_of(&self, edge: &Edge) -> &[Face] {
        self.faces_by_id
            .get(&edge.stable_id())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// One representative occurrence per edge node, in map order.
    pub fn edges_in_order(&self) -> &[Edge] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

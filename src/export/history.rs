//! Production history projection.
//!
//! A read-only rendering of the modification/generation tables: every
//! recorded (source, targets) pair becomes a node of stable-reference
//! pairs. Nothing here mutates the tables.

use crate::brep::Shape;
use crate::doc::Document;
use crate::store::History;

/// `{"modified": [...], "generated": [...]}`, each a sequence of
/// `{"source": [tag, id], "targets": [[tag, id], ...]}` nodes in recorded
/// order.
pub fn history_write(history: &History) -> Document {
    let mut doc = Document::map();
    doc.set("modified", relation_write(history.modified()));
    doc.set("generated", relation_write(history.generated()));
    doc
}

fn relation_write(relation: &[(Shape, Vec<Shape>)]) -> Document {
    let mut out = Document::seq();
    for (source, targets) in relation {
        let mut node = Document::map();
        node.set("source", shape_ref_write(source));
        let mut refs = Document::seq();
        for target in targets {
            refs.push(shape_ref_write(target));
        }
        node.set("targets", refs);
        out.push(node);
    }
    out
}

/// `[type tag, stable id]` pair naming one side of a history edge.
fn shape_ref_write(shape: &Shape) -> Document {
    let mut doc = Document::seq();
    doc.push(history_tag(shape));
    doc.push(shape.stable_id());
    doc
}

/// Anything above a shell is reported as a solid.
fn history_tag(shape: &Shape) -> &'static str {
    match shape {
        Shape::Shell(_) => "SHELL",
        Shape::Face(_) => "FACE",
        Shape::Wire(_) => "WIRE",
        Shape::Edge(_) => "EDGE",
        Shape::Vertex(_) => "VERTEX",
        _ => "SOLID",
    }
}

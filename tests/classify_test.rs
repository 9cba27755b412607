//! Classification and overlap queries answered through export handles.

mod common;

use common::{rect_face, PlanarTessellator};
use nalgebra::Point3;
use shapeio::{
    Coverage, Document, ExportOptions, NullImporter, PointFaceState, Session, Shape,
};

fn fixture_session() -> Session {
    Session::new(Box::new(PlanarTessellator), Box::new(NullImporter))
}

/// Exports the named shape and returns its first face handle plus the
/// handles of that face's boundary edges.
fn exported_face_handles(session: &mut Session, name: &str) -> (u64, Vec<u64>) {
    let doc = session
        .export_shape(name, &ExportOptions::default())
        .unwrap();
    let face = doc.get("faces").unwrap().at(0).unwrap();
    let face_ptr = face.get("ptr").and_then(Document::as_i64).unwrap() as u64;
    let edges = face.get("loops").unwrap().at(0).unwrap();
    let edge_ptrs = (0..edges.len())
        .map(|i| {
            let edge = edges.at(i).unwrap();
            edge.get("ptr").and_then(Document::as_i64).unwrap() as u64
        })
        .collect();
    (face_ptr, edge_ptrs)
}

#[test]
fn test_point_classification_states() {
    let mut session = fixture_session();
    session.set_shape("plate", Shape::from(rect_face(0.0, 0.0, 4.0, 3.0)));
    let (face, _) = exported_face_handles(&mut session, "plate");

    let inside = session
        .classify_point_to_face(face, &Point3::new(2.0, 1.5, 0.0), 1e-6)
        .unwrap();
    assert_eq!(inside, PointFaceState::Inside);

    let boundary = session
        .classify_point_to_face(face, &Point3::new(4.0, 1.0, 0.0), 1e-6)
        .unwrap();
    assert_eq!(boundary, PointFaceState::OnBoundary);

    let beside = session
        .classify_point_to_face(face, &Point3::new(9.0, 1.0, 0.0), 1e-6)
        .unwrap();
    assert_eq!(beside, PointFaceState::Unrelated);

    let lifted = session
        .classify_point_to_face(face, &Point3::new(2.0, 1.5, 0.4), 1e-6)
        .unwrap();
    assert_eq!(lifted, PointFaceState::Unrelated);
}

#[test]
fn test_face_coverage_aggregation() {
    let mut session = fixture_session();
    session.set_shape("big", Shape::from(rect_face(0.0, 0.0, 4.0, 4.0)));
    session.set_shape("inner", Shape::from(rect_face(1.0, 1.0, 2.0, 2.0)));
    session.set_shape("straddling", Shape::from(rect_face(3.0, 1.0, 5.0, 2.0)));
    session.set_shape("outside", Shape::from(rect_face(9.0, 9.0, 10.0, 10.0)));
    let (big, _) = exported_face_handles(&mut session, "big");
    let (inner, _) = exported_face_handles(&mut session, "inner");
    let (straddling, _) = exported_face_handles(&mut session, "straddling");
    let (outside, _) = exported_face_handles(&mut session, "outside");

    assert_eq!(
        session.classify_face_to_face(big, inner, 1e-6).unwrap(),
        Coverage::All
    );
    assert_eq!(
        session.classify_face_to_face(big, straddling, 1e-6).unwrap(),
        Coverage::Partial
    );
    assert_eq!(
        session.classify_face_to_face(big, outside, 1e-6).unwrap(),
        Coverage::Unrelated
    );
}

#[test]
fn test_edge_queries_through_handles() {
    let mut session = fixture_session();
    session.set_shape("plate", Shape::from(rect_face(0.0, 0.0, 4.0, 3.0)));
    let (face, edges) = exported_face_handles(&mut session, "plate");

    // every boundary edge lies on its own face
    for &edge in &edges {
        assert_eq!(
            session.classify_edge_to_face(edge, face, 1e-6).unwrap(),
            Coverage::All
        );
    }
    // adjacent boundary edges share only a corner
    assert!(!session.edges_overlap(edges[0], edges[1], 1e-6, 0.5).unwrap());
    assert!(session.edges_overlap(edges[0], edges[0], 1e-6, 0.0).unwrap());
}

#[test]
fn test_handles_survive_until_disposed() {
    let mut session = fixture_session();
    session.set_shape("plate", Shape::from(rect_face(0.0, 0.0, 2.0, 2.0)));
    let (face, edges) = exported_face_handles(&mut session, "plate");

    session.dispose(face).unwrap();
    assert!(session
        .classify_point_to_face(face, &Point3::new(1.0, 1.0, 0.0), 1e-6)
        .is_err());
    // edge handles from the same export stay valid
    assert!(session.edges_overlap(edges[0], edges[0], 1e-6, 0.0).unwrap());
}

#[test]
fn test_classification_in_model_space() {
    let mut session = fixture_session();
    session.set_shape("plate", Shape::from(rect_face(0.0, 0.0, 2.0, 2.0)));
    let mut c = [0.0; 12];
    c[0] = 1.0;
    c[5] = 1.0;
    c[10] = 1.0;
    c[11] = 7.0;
    session.set_location("plate", c).unwrap();
    let (face, _) = exported_face_handles(&mut session, "plate");

    assert_eq!(
        session
            .classify_point_to_face(face, &Point3::new(1.0, 1.0, 7.0), 1e-6)
            .unwrap(),
        PointFaceState::Inside
    );
    assert_eq!(
        session
            .classify_point_to_face(face, &Point3::new(1.0, 1.0, 0.0), 1e-6)
            .unwrap(),
        PointFaceState::Unrelated
    );
}

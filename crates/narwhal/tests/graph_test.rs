use narwhal::geom::{point, size};
use narwhal::{Edge, Error, Graph, Node};

#[test]
fn validate_accepts_edges_between_existing_nodes() {
    let graph = Graph::new(
        vec![
            Node::new("a", point(0.0, 0.0), size(1.0, 1.0)),
            Node::new("b", point(3.0, 0.0), size(1.0, 1.0)),
        ],
        vec![Edge::new("ab", "a", "b")],
    );
    assert!(graph.validate().is_ok());
}

#[test]
fn validate_reports_the_first_edge_with_a_missing_endpoint() {
    let graph = Graph::new(
        vec![Node::new("a", point(0.0, 0.0), size(1.0, 1.0))],
        vec![Edge::new("e1", "a", "x"), Edge::new("e2", "y", "a")],
    );
    let err = graph.validate().expect_err("missing endpoint");
    assert!(matches!(err, Error::MissingEndpoint { ref edge_id } if edge_id == "e1"), "{err}");
}

#[test]
fn validate_rejects_duplicate_ids_and_bad_geometry() {
    let duplicate = Graph::new(
        vec![
            Node::new("a", point(0.0, 0.0), size(1.0, 1.0)),
            Node::new("a", point(1.0, 0.0), size(1.0, 1.0)),
        ],
        Vec::new(),
    );
    assert!(matches!(duplicate.validate(), Err(Error::InvalidArgument(_))));

    let negative = Graph::new(
        vec![Node::new("a", point(0.0, 0.0), size(-1.0, 1.0))],
        Vec::new(),
    );
    assert!(matches!(negative.validate(), Err(Error::InvalidArgument(_))));

    let non_finite = Graph::new(
        vec![Node::new("a", point(f64::INFINITY, 0.0), size(1.0, 1.0))],
        Vec::new(),
    );
    assert!(matches!(non_finite.validate(), Err(Error::InvalidArgument(_))));
}

#[test]
fn bounding_box_covers_every_node_box() {
    let graph = Graph::new(
        vec![
            Node::new("a", point(0.0, 0.0), size(2.0, 2.0)),
            Node::new("b", point(5.0, 3.0), size(4.0, 2.0)),
        ],
        Vec::new(),
    );
    let bbox = graph.bounding_box().expect("non-empty");
    assert_eq!((bbox.min_x(), bbox.min_y()), (-1.0, -1.0));
    assert_eq!((bbox.max_x(), bbox.max_y()), (7.0, 4.0));
    assert!(Graph::default().bounding_box().is_none());
}

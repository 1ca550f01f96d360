use medusa_graphlib::{EdgeData, Graph, GraphData, GraphError};

fn payload(text: &str) -> GraphData {
    serde_json::from_str(text).unwrap()
}

#[test]
fn merge_synthesizes_directed_edge_ids_from_type_and_endpoints() {
    let mut g = Graph::new();
    g.merge(&payload(
        r#"{
            "nodes": [{"id": "a"}, {"id": "b"}],
            "edges": [{"from": 0, "to": 1, "type": "calls", "directed": true}]
        }"#,
    ))
    .unwrap();

    assert_eq!(g.edge_count(), 1);
    let edge = g.edge_by_id("calls-a-b").unwrap();
    assert_eq!(edge.source, "a");
    assert_eq!(edge.target, "b");
    assert_eq!(edge.data.kind.as_deref(), Some("calls"));
}

#[test]
fn merging_an_undirected_pair_in_either_order_yields_one_edge() {
    let mut g = Graph::new();
    g.merge(&payload(
        r#"{
            "nodes": [{"id": "a"}, {"id": "b"}],
            "edges": [
                {"from": 0, "to": 1, "type": "x", "directed": false},
                {"from": 1, "to": 0, "type": "x", "directed": false}
            ]
        }"#,
    ))
    .unwrap();

    // Both declarations normalize to type-min(id)-max(id).
    assert_eq!(g.edge_count(), 1);
    assert!(g.has_edge("x-a-b"));
}

#[test]
fn undirected_id_normalization_orders_endpoints_by_id() {
    let mut g = Graph::new();
    g.merge(&payload(
        r#"{
            "nodes": [{"id": "zz"}, {"id": "aa"}],
            "edges": [{"from": 0, "to": 1, "type": "x", "directed": false}]
        }"#,
    ))
    .unwrap();

    let edge = g.edge_by_id("x-aa-zz").unwrap();
    // The edge record still runs in declaration direction; only the id is normalized.
    assert_eq!(edge.source, "zz");
    assert_eq!(edge.target, "aa");
}

#[test]
fn merge_reads_node_and_edge_attributes() {
    let mut g = Graph::new();
    g.merge(&payload(
        r#"{
            "nodes": [{"id": "a", "data": {"mass": 2.5, "label": "Alpha"}}, {"id": "b"}],
            "edges": [{"from": 0, "to": 1, "type": "x", "directed": true, "data": {"length": 3.0}}]
        }"#,
    ))
    .unwrap();

    assert_eq!(g.node("a").unwrap().data.mass, 2.5);
    assert_eq!(g.node("b").unwrap().data.mass, 1.0);
    assert_eq!(g.edge_by_id("x-a-b").unwrap().data.length, 3.0);
}

#[test]
fn merge_rejects_out_of_range_node_indices() {
    let mut g = Graph::new();
    let err = g
        .merge(&payload(
            r#"{
                "nodes": [{"id": "a"}],
                "edges": [{"from": 0, "to": 7, "type": "x", "directed": true}]
            }"#,
        ))
        .unwrap_err();

    assert!(matches!(
        err,
        GraphError::NodeIndexOutOfRange { index: 7, len: 1 }
    ));
}

#[test]
fn from_json_builds_nodes_and_edge_triples() {
    let g = Graph::from_json(
        r#"{
            "nodes": ["a", "b", "c"],
            "edges": [["a", "b"], ["b", "c", {"length": 2.0, "type": "x"}]]
        }"#,
    )
    .unwrap();

    assert_eq!(g.node_count(), 3);
    assert_eq!(g.node("a").unwrap().data.label.as_deref(), Some("a"));
    assert_eq!(g.edge_count(), 2);

    let heavy = g.get_edges("b", "c");
    assert_eq!(heavy.len(), 1);
    assert_eq!(heavy[0].data.length, 2.0);
    assert_eq!(heavy[0].data.kind.as_deref(), Some("x"));

    let default = g.get_edges("a", "b");
    assert_eq!(default[0].data.length, 1.0);
}

#[test]
fn from_json_reports_unknown_edge_endpoints() {
    let err = Graph::from_json(r#"{"nodes": ["a"], "edges": [["a", "ghost"]]}"#).unwrap_err();
    assert!(matches!(err, GraphError::UnknownNode { id } if id == "ghost"));
}

#[test]
fn from_json_rejects_malformed_documents() {
    assert!(matches!(
        Graph::from_json("not json"),
        Err(GraphError::InvalidJson { .. })
    ));
    assert!(matches!(
        Graph::from_json(r#"{"nodes": [1]}"#),
        Err(GraphError::InvalidJson { .. })
    ));
    assert!(matches!(
        Graph::from_json(r#"{"nodes": ["a"], "edges": [["a"]]}"#),
        Err(GraphError::InvalidJson { .. })
    ));
}

#[test]
fn add_edges_uses_supplied_attributes() {
    let mut g = Graph::new();
    g.add_nodes(&["a", "b"]);
    g.add_edges(&[(
        "a",
        "b",
        EdgeData {
            length: 4.0,
            kind: Some("wire".to_string()),
        },
    )])
    .unwrap();

    let edges = g.get_edges("a", "b");
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].data.length, 4.0);
    assert_eq!(edges[0].data.kind.as_deref(), Some("wire"));
}

//! Graph container APIs used by `medusa`.
//!
//! A mutable multigraph: nodes and directed edges with stable string ids, an adjacency
//! index for O(1) lookup of the edges between an ordered node pair, and a synchronous
//! change-notification protocol. The layout engine in the `medusa` crate reads this
//! container every simulation tick; mutation is expected to happen between ticks.

use rustc_hash::FxBuildHasher;
use serde::Deserialize;
use std::fmt;
use std::rc::Rc;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("unknown node id: {id}")]
    UnknownNode { id: String },

    #[error("node index {index} out of range for merge payload with {len} nodes")]
    NodeIndexOutOfRange { index: usize, len: usize },

    #[error("invalid graph JSON: {message}")]
    InvalidJson { message: String },
}

/// Node attributes. `mass` feeds the physical simulation; `label` is display-only.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NodeData {
    pub mass: f64,
    pub label: Option<String>,
}

impl Default for NodeData {
    fn default() -> Self {
        Self {
            mass: 1.0,
            label: None,
        }
    }
}

/// Edge attributes. `length` is the spring rest length; `kind` groups edges for
/// id synthesis in [`Graph::merge`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EdgeData {
    pub length: f64,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl Default for EdgeData {
    fn default() -> Self {
        Self {
            length: 1.0,
            kind: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub data: NodeData,
}

impl Node {
    pub fn new(id: impl Into<String>, data: NodeData) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data.label.as_deref() {
            Some(label) if label != self.id => write!(f, "{{{}: {}}}", self.id, label),
            _ => write!(f, "{{{}}}", self.id),
        }
    }
}

/// A directed edge. Endpoints are stored by node id, not by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub data: EdgeData,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        data: EdgeData,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            data,
        }
    }
}

/// Observer notified after every applied structural mutation.
///
/// Notification is a synchronous broadcast in registration order. Implementations
/// needing interior state should use `Cell`/`RefCell`; the container is single-threaded.
pub trait GraphListener {
    fn graph_changed(&self);
}

/// Bulk import payload: `{nodes: [{id, data}], edges: [{from, to, type, directed, data}]}`.
///
/// Edge endpoints are indices into the `nodes` array of the same payload, not node ids.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(default)]
    pub data: NodeData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeSpec {
    pub from: usize,
    pub to: usize,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub directed: bool,
    #[serde(default)]
    pub data: EdgeData,
}

#[derive(Default)]
pub struct Graph {
    nodes: Vec<Node>,
    node_index: HashMap<String, usize>,

    edges: Vec<Edge>,
    edge_index: HashMap<String, usize>,

    // sourceId -> targetId -> edge ids, bucket order = insertion order. Empty buckets
    // are pruned immediately on removal so absence checks stay meaningful.
    adjacency: HashMap<String, HashMap<String, Vec<String>>>,

    // Monotonic; never reused, even after removals.
    next_node_id: u64,
    next_edge_id: u64,

    listeners: Vec<Rc<dyn GraphListener>>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.nodes)
            .field("node_index", &self.node_index)
            .field("edges", &self.edges)
            .field("edge_index", &self.edge_index)
            .field("adjacency", &self.adjacency)
            .field("next_node_id", &self.next_node_id)
            .field("next_edge_id", &self.next_edge_id)
            .field("listeners", &format_args!("<{} listeners>", self.listeners.len()))
            .finish()
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn node_data_mut(&mut self, id: &str) -> Option<&mut NodeData> {
        self.node_index
            .get(id)
            .copied()
            .map(move |idx| &mut self.nodes[idx].data)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn has_edge(&self, id: &str) -> bool {
        self.edge_index.contains_key(id)
    }

    pub fn edge_by_id(&self, id: &str) -> Option<&Edge> {
        self.edge_index.get(id).map(|&idx| &self.edges[idx])
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// Inserts a node, or replaces the stored record when the id is already present.
    /// The node sequence is never duplicated; either way listeners are notified.
    pub fn add_node(&mut self, node: Node) -> &Node {
        let idx = match self.node_index.get(&node.id) {
            Some(&idx) => {
                self.nodes[idx] = node;
                idx
            }
            None => {
                let idx = self.nodes.len();
                self.node_index.insert(node.id.clone(), idx);
                self.nodes.push(node);
                idx
            }
        };
        self.notify();
        &self.nodes[idx]
    }

    /// Allocates the next integer id and inserts a node carrying `data`.
    pub fn new_node(&mut self, data: NodeData) -> &Node {
        let id = self.next_node_id.to_string();
        self.next_node_id += 1;
        self.add_node(Node::new(id, data))
    }

    /// Bulk helper: one node per id, labelled with that id.
    pub fn add_nodes(&mut self, ids: &[&str]) -> &mut Self {
        for &id in ids {
            self.add_node(Node::new(
                id,
                NodeData {
                    label: Some(id.to_string()),
                    ..Default::default()
                },
            ));
        }
        self
    }

    /// Appends an edge unless its id is already present (duplicate adds are intentional
    /// no-ops, not errors), then (re)registers the stored record in the adjacency index,
    /// deduplicated by id within its bucket.
    pub fn add_edge(&mut self, edge: Edge) -> &Edge {
        let idx = match self.edge_index.get(&edge.id) {
            Some(&idx) => idx,
            None => {
                let idx = self.edges.len();
                self.edge_index.insert(edge.id.clone(), idx);
                self.edges.push(edge);
                idx
            }
        };

        let (id, source, target) = {
            let e = &self.edges[idx];
            (e.id.clone(), e.source.clone(), e.target.clone())
        };
        let bucket = self
            .adjacency
            .entry(source)
            .or_default()
            .entry(target)
            .or_default();
        if !bucket.iter().any(|eid| *eid == id) {
            bucket.push(id);
        }

        self.notify();
        &self.edges[idx]
    }

    /// Allocates the next integer id and connects two existing nodes.
    pub fn new_edge(&mut self, source: &str, target: &str, data: EdgeData) -> Result<&Edge> {
        for id in [source, target] {
            if !self.node_index.contains_key(id) {
                return Err(GraphError::UnknownNode { id: id.to_string() });
            }
        }
        let id = self.next_edge_id.to_string();
        self.next_edge_id += 1;
        Ok(self.add_edge(Edge::new(id, source, target, data)))
    }

    /// Bulk edge creation from `(sourceId, targetId, data)` triples.
    ///
    /// Triples are processed independently; a failure on one triple does not undo
    /// edges created by earlier triples in the same call.
    pub fn add_edges(&mut self, triples: &[(&str, &str, EdgeData)]) -> Result<()> {
        for (source, target, data) in triples {
            self.new_edge(source, target, data.clone())?;
        }
        Ok(())
    }

    /// All edges with `source == a` and `target == b`, in insertion order. Directional:
    /// `get_edges(a, b)` does not report edges running b -> a.
    pub fn get_edges(&self, a: &str, b: &str) -> Vec<&Edge> {
        let Some(bucket) = self.adjacency.get(a).and_then(|inner| inner.get(b)) else {
            return Vec::new();
        };
        bucket
            .iter()
            .filter_map(|id| self.edge_by_id(id))
            .collect()
    }

    /// Removes a node and cascades to every edge touching it as source or target.
    /// Removing an absent node is a safe no-op (listeners still observe the detach pass).
    pub fn remove_node(&mut self, id: &str) -> bool {
        let existed = match self.node_index.remove(id) {
            Some(idx) => {
                self.nodes.remove(idx);
                for i in idx..self.nodes.len() {
                    let node_id = self.nodes[i].id.as_str();
                    if let Some(slot) = self.node_index.get_mut(node_id) {
                        *slot = i;
                    }
                }
                true
            }
            None => false,
        };
        self.detach_node(id);
        existed
    }

    /// Removes every edge incident to `id` in either direction. The incident set is
    /// snapshotted before removal since removal mutates the edge sequence.
    pub fn detach_node(&mut self, id: &str) {
        let incident: Vec<String> = self
            .edges
            .iter()
            .filter(|e| e.source == id || e.target == id)
            .map(|e| e.id.clone())
            .collect();
        for eid in &incident {
            self.remove_edge(eid);
        }
        self.notify();
    }

    /// Removes an edge by id, scrubbing every adjacency bucket that mentions it and
    /// pruning inner/outer maps that become empty. Removing an absent edge is a no-op.
    pub fn remove_edge(&mut self, id: &str) -> bool {
        let Some(idx) = self.edge_index.remove(id) else {
            return false;
        };
        self.edges.remove(idx);
        for i in idx..self.edges.len() {
            let edge_id = self.edges[i].id.as_str();
            if let Some(slot) = self.edge_index.get_mut(edge_id) {
                *slot = i;
            }
        }

        self.adjacency.retain(|_, inner| {
            inner.retain(|_, bucket| {
                bucket.retain(|eid| eid != id);
                !bucket.is_empty()
            });
            !inner.is_empty()
        });

        self.notify();
        true
    }

    /// Removes every node for which the predicate is false. The predicate is evaluated
    /// against a snapshot taken before any removal, not against the shrinking live set.
    pub fn filter_nodes(&mut self, f: impl Fn(&Node) -> bool) {
        let snapshot = self.nodes.clone();
        for n in &snapshot {
            if !f(n) {
                self.remove_node(&n.id);
            }
        }
    }

    /// Edge counterpart of [`Graph::filter_nodes`].
    pub fn filter_edges(&mut self, f: impl Fn(&Edge) -> bool) {
        let snapshot = self.edges.clone();
        for e in &snapshot {
            if !f(e) {
                self.remove_edge(&e.id);
            }
        }
    }

    /// Bulk import. Edge endpoints resolve against the `nodes` array of this payload.
    ///
    /// Edge ids are synthesized as `type-sourceId-targetId`; undirected edges are
    /// normalized to `type-min(id)-max(id)` so the same pair synthesizes the same id
    /// regardless of declaration order. Feeding both declarations of an undirected
    /// edge therefore lands on one edge record, which the layout engine relies on to
    /// coalesce reciprocal pairs into a single physical spring.
    pub fn merge(&mut self, data: &GraphData) -> Result<()> {
        let mut added: Vec<String> = Vec::with_capacity(data.nodes.len());
        for n in &data.nodes {
            let node = self.add_node(Node::new(n.id.clone(), n.data.clone()));
            added.push(node.id.clone());
        }

        for e in &data.edges {
            let from = added
                .get(e.from)
                .ok_or(GraphError::NodeIndexOutOfRange {
                    index: e.from,
                    len: added.len(),
                })?
                .clone();
            let to = added
                .get(e.to)
                .ok_or(GraphError::NodeIndexOutOfRange {
                    index: e.to,
                    len: added.len(),
                })?
                .clone();

            let id = if e.directed || from < to {
                format!("{}-{}-{}", e.kind, from, to)
            } else {
                format!("{}-{}-{}", e.kind, to, from)
            };

            let mut edge_data = e.data.clone();
            edge_data.kind = Some(e.kind.clone());
            self.add_edge(Edge::new(id, from, to, edge_data));
        }
        tracing::debug!(
            nodes = data.nodes.len(),
            edges = data.edges.len(),
            "merged graph payload"
        );
        Ok(())
    }

    /// Parses the simple JSON document format:
    /// `{"nodes": ["a", "b"], "edges": [["a", "b", {"length": 2}], ...]}`.
    ///
    /// Node entries become nodes labelled with their id; edge entries are
    /// `(source, target)` pairs with an optional trailing attribute object.
    pub fn from_json(text: &str) -> Result<Graph> {
        let json: serde_json::Value =
            serde_json::from_str(text).map_err(|e| GraphError::InvalidJson {
                message: e.to_string(),
            })?;

        let mut graph = Graph::new();
        if let Some(nodes) = json.get("nodes").and_then(|v| v.as_array()) {
            for n in nodes {
                let Some(id) = n.as_str() else {
                    return Err(GraphError::InvalidJson {
                        message: format!("node ids must be strings, got {n}"),
                    });
                };
                graph.add_nodes(&[id]);
            }
        }
        if let Some(edges) = json.get("edges").and_then(|v| v.as_array()) {
            for entry in edges {
                let pair = entry.as_array().filter(|a| a.len() >= 2);
                let (Some(items), Some(source), Some(target)) = (
                    pair,
                    entry.get(0).and_then(|v| v.as_str()),
                    entry.get(1).and_then(|v| v.as_str()),
                ) else {
                    return Err(GraphError::InvalidJson {
                        message: format!("edge entries must be [source, target, data?], got {entry}"),
                    });
                };
                let data = match items.get(2) {
                    Some(v) => serde_json::from_value(v.clone()).map_err(|e| {
                        GraphError::InvalidJson {
                            message: e.to_string(),
                        }
                    })?,
                    None => EdgeData::default(),
                };
                graph.new_edge(source, target, data)?;
            }
        }
        Ok(graph)
    }

    /// Registers an observer. Every applied mutation triggers a synchronous
    /// `graph_changed` broadcast in registration order.
    pub fn add_graph_listener(&mut self, listener: Rc<dyn GraphListener>) {
        self.listeners.push(listener);
    }

    fn notify(&self) {
        for l in &self.listeners {
            l.graph_changed();
        }
    }
}

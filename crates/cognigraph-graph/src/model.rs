//! In-memory knowledge graph built on petgraph.

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

/// Entity category assigned by the extraction prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Person,
    Organization,
    Concept,
    Other,
}

impl NodeType {
    /// Map a free-form type label from the provider to a category.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "person" | "people" | "per" => Self::Person,
            "organization" | "organisation" | "org" | "company" => Self::Organization,
            "concept" | "topic" | "idea" => Self::Concept,
            _ => Self::Other,
        }
    }

    /// Numeric group used by the graph view for coloring.
    pub fn group(self) -> u8 {
        match self {
            Self::Person => 1,
            Self::Organization => 2,
            Self::Concept => 3,
            Self::Other => 4,
        }
    }
}

/// A node in the knowledge graph. `id` is the normalized entity name;
/// `label` keeps the first raw spelling seen for display.
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub node_type: NodeType,
    /// Ids of the chunks this entity was extracted from.
    pub mentions: BTreeSet<String>,
}

/// A directed, labeled edge. Duplicate (source, target, label) triples
/// are merged, unioning `mentions`.
#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    pub label: String,
    pub mentions: BTreeSet<String>,
}

/// Normalize an entity name: trim, case-fold, collapse internal whitespace.
pub fn normalize_name(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// The merged, per-session knowledge graph.
pub struct KnowledgeGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
    node_index: HashMap<String, NodeIndex>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_index: HashMap::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn clear(&mut self) {
        self.graph.clear();
        self.node_index.clear();
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.graph.edge_weights()
    }

    pub fn get_node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index.get(id).map(|&idx| &self.graph[idx])
    }

    /// Insert or update a node. Returns the node id, or None when the
    /// name normalizes to nothing.
    pub fn upsert_node(
        &mut self,
        raw_name: &str,
        node_type: NodeType,
        chunk_id: &str,
    ) -> Option<String> {
        let id = normalize_name(raw_name);
        if id.is_empty() {
            return None;
        }

        match self.node_index.get(&id) {
            Some(&idx) => {
                let node = &mut self.graph[idx];
                node.mentions.insert(chunk_id.to_string());
                // A typed mention wins over an earlier Other.
                if node.node_type == NodeType::Other && node_type != NodeType::Other {
                    node.node_type = node_type;
                }
            }
            None => {
                let idx = self.graph.add_node(GraphNode {
                    id: id.clone(),
                    label: raw_name.trim().to_string(),
                    node_type,
                    mentions: BTreeSet::from([chunk_id.to_string()]),
                });
                self.node_index.insert(id.clone(), idx);
            }
        }

        Some(id)
    }

    /// Insert or merge an edge. Endpoints that are not yet nodes are
    /// materialized as `Other` so every edge always connects real nodes.
    pub fn upsert_edge(&mut self, source_raw: &str, target_raw: &str, label: &str, chunk_id: &str) {
        let source_id = match self.upsert_node(source_raw, NodeType::Other, chunk_id) {
            Some(id) => id,
            None => return,
        };
        let target_id = match self.upsert_node(target_raw, NodeType::Other, chunk_id) {
            Some(id) => id,
            None => return,
        };

        let label = label.trim();
        let label = if label.is_empty() { "related to" } else { label };
        let label_key = label.to_lowercase();

        let source_idx = self.node_index[&source_id];
        let target_idx = self.node_index[&target_id];

        let existing = self
            .graph
            .edges_connecting(source_idx, target_idx)
            .find(|e| e.weight().label.to_lowercase() == label_key)
            .map(|e| e.id());

        match existing {
            Some(edge_idx) => {
                self.graph[edge_idx].mentions.insert(chunk_id.to_string());
            }
            None => {
                self.graph.add_edge(
                    source_idx,
                    target_idx,
                    GraphEdge {
                        source: source_id,
                        target: target_id,
                        label: label.to_string(),
                        mentions: BTreeSet::from([chunk_id.to_string()]),
                    },
                );
            }
        }
    }

    /// Snapshot in the wire shape the client renders. Ordering is fixed
    /// (nodes by id, links by source/target/label) so responses are
    /// stable across calls.
    pub fn to_graph_data(&self) -> GraphData {
        let mut nodes: Vec<NodeData> = self
            .nodes()
            .map(|n| NodeData {
                id: n.id.clone(),
                label: n.label.clone(),
                node_type: n.node_type,
                group: n.node_type.group(),
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut links: Vec<LinkData> = self
            .edges()
            .map(|e| LinkData {
                source: e.source.clone(),
                target: e.target.clone(),
                label: e.label.clone(),
            })
            .collect();
        links.sort_by(|a, b| {
            (&a.source, &a.target, &a.label).cmp(&(&b.source, &b.target, &b.label))
        });

        GraphData { nodes, links }
    }

    /// Graph serialized as `- source [label] target` lines, used as chat
    /// grounding context.
    pub fn triples_as_text(&self) -> String {
        if self.edge_count() == 0 {
            return String::new();
        }

        let data = self.to_graph_data();
        let mut text = String::from("Extracted knowledge graph relationships:\n");
        for link in &data.links {
            text.push_str(&format!(
                "- {} [{}] {}\n",
                link.source, link.label, link.target
            ));
        }
        text
    }
}

impl Default for KnowledgeGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Wire shape for the graph view.
#[derive(Debug, Clone, Serialize)]
pub struct GraphData {
    pub nodes: Vec<NodeData>,
    pub links: Vec<LinkData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeData {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub group: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkData {
    pub source: String,
    pub target: String,
    pub label: String,
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ids::{EdgeId, NodeId};

/// The flavor of a visualization graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GraphType {
    #[default]
    Mindmap,
    Conceptmap,
    Knowledgegraph,
}

impl GraphType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mindmap => "mindmap",
            Self::Conceptmap => "conceptmap",
            Self::Knowledgegraph => "knowledgegraph",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Concept,
    Question,
    Confusion,
    Example,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    #[default]
    Hierarchical,
    Related,
    Causal,
    Example,
}

/// Opaque editor coordinates. Nothing in this crate computes layout.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VisualHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationNode {
    id: NodeId,
    label: String,
    #[serde(default)]
    kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hints: Option<VisualHints>,
}

impl VisualizationNode {
    pub fn new(id: NodeId, label: impl Into<String>) -> Self {
        Self { id, label: label.into(), kind: NodeKind::Concept, position: None, hints: None }
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: NodeKind) {
        self.kind = kind;
    }

    pub fn is_confusion(&self) -> bool {
        self.kind == NodeKind::Confusion
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn set_position(&mut self, position: Option<Position>) {
        self.position = position;
    }

    pub fn hints(&self) -> Option<&VisualHints> {
        self.hints.as_ref()
    }

    pub fn set_hints(&mut self, hints: Option<VisualHints>) {
        self.hints = hints;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizationEdge {
    id: EdgeId,
    source: NodeId,
    target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(default)]
    kind: EdgeKind,
}

impl VisualizationEdge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self { id, source, target, label: None, kind: EdgeKind::Hierarchical }
    }

    pub fn with_label<T: Into<String>>(mut self, label: Option<T>) -> Self {
        self.label = label.map(Into::into);
        self
    }

    pub fn with_kind(mut self, kind: EdgeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn id(&self) -> &EdgeId {
        &self.id
    }

    pub fn source(&self) -> &NodeId {
        &self.source
    }

    pub fn set_source(&mut self, source: NodeId) {
        self.source = source;
    }

    pub fn target(&self) -> &NodeId {
        &self.target
    }

    pub fn set_target(&mut self, target: NodeId) {
        self.target = target;
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label<T: Into<String>>(&mut self, label: Option<T>) {
        self.label = label.map(Into::into);
    }

    pub fn kind(&self) -> EdgeKind {
        self.kind
    }

    pub fn set_kind(&mut self, kind: EdgeKind) {
        self.kind = kind;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    central_concept: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    confusion_points: Vec<String>,
}

impl GraphMetadata {
    pub fn central_concept(&self) -> Option<&str> {
        self.central_concept.as_deref()
    }

    pub fn confusion_points(&self) -> &[String] {
        &self.confusion_points
    }

    pub fn is_empty(&self) -> bool {
        self.central_concept.is_none() && self.confusion_points.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("node already exists (id={0})")]
    DuplicateNode(NodeId),
    #[error("edge already exists (id={0})")]
    DuplicateEdge(EdgeId),
    #[error("node not found (id={0})")]
    MissingNode(NodeId),
    #[error("edge not found (id={0})")]
    MissingEdge(EdgeId),
    #[error("edge {edge_id} references missing node {node_id}")]
    DanglingEdge { edge_id: EdgeId, node_id: NodeId },
}

/// The canonical graph shared by every editing surface.
///
/// Nodes and edges are kept in insertion order; id uniqueness and edge endpoint validity are
/// enforced by the mutating methods. `metadata.confusionPoints` is derived and refreshed on every
/// mutation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualizationGraph {
    #[serde(rename = "type", default)]
    graph_type: GraphType,
    #[serde(default)]
    nodes: Vec<VisualizationNode>,
    #[serde(default)]
    edges: Vec<VisualizationEdge>,
    #[serde(default)]
    metadata: GraphMetadata,
}

impl VisualizationGraph {
    pub fn new(graph_type: GraphType) -> Self {
        Self { graph_type, ..Self::default() }
    }

    /// Builds a graph from parts, validating the id and endpoint invariants.
    pub fn from_parts(
        graph_type: GraphType,
        nodes: Vec<VisualizationNode>,
        edges: Vec<VisualizationEdge>,
        central_concept: Option<String>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new(graph_type);
        for node in nodes {
            graph.insert_node(node)?;
        }
        for edge in edges {
            graph.insert_edge(edge)?;
        }
        graph.metadata.central_concept = central_concept;
        graph.refresh_metadata();
        Ok(graph)
    }

    /// Re-checks the invariants of a graph that came from outside (e.g. deserialized JSON).
    pub fn validated(self) -> Result<Self, GraphError> {
        let Self { graph_type, nodes, edges, metadata } = self;
        Self::from_parts(graph_type, nodes, edges, metadata.central_concept)
    }

    pub fn graph_type(&self) -> GraphType {
        self.graph_type
    }

    /// Relabels the graph type. Nodes and edges are kept verbatim.
    pub fn set_graph_type(&mut self, graph_type: GraphType) {
        self.graph_type = graph_type;
    }

    pub fn nodes(&self) -> &[VisualizationNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[VisualizationEdge] {
        &self.edges
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, node_id: &NodeId) -> Option<&VisualizationNode> {
        self.nodes.iter().find(|node| node.id() == node_id)
    }

    pub fn node_mut(&mut self, node_id: &NodeId) -> Option<&mut VisualizationNode> {
        self.nodes.iter_mut().find(|node| node.id() == node_id)
    }

    pub fn edge(&self, edge_id: &EdgeId) -> Option<&VisualizationEdge> {
        self.edges.iter().find(|edge| edge.id() == edge_id)
    }

    pub fn edge_mut(&mut self, edge_id: &EdgeId) -> Option<&mut VisualizationEdge> {
        self.edges.iter_mut().find(|edge| edge.id() == edge_id)
    }

    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.node(node_id).is_some()
    }

    pub fn node_by_label(&self, label: &str) -> Option<&VisualizationNode> {
        self.nodes.iter().find(|node| node.label() == label)
    }

    pub fn confusion_count(&self) -> usize {
        self.nodes.iter().filter(|node| node.is_confusion()).count()
    }

    pub fn insert_node(&mut self, node: VisualizationNode) -> Result<(), GraphError> {
        if self.contains_node(node.id()) {
            return Err(GraphError::DuplicateNode(node.id().clone()));
        }
        self.nodes.push(node);
        self.refresh_metadata();
        Ok(())
    }

    pub fn insert_edge(&mut self, edge: VisualizationEdge) -> Result<(), GraphError> {
        if self.edge(edge.id()).is_some() {
            return Err(GraphError::DuplicateEdge(edge.id().clone()));
        }
        for endpoint in [edge.source(), edge.target()] {
            if !self.contains_node(endpoint) {
                return Err(GraphError::DanglingEdge {
                    edge_id: edge.id().clone(),
                    node_id: endpoint.clone(),
                });
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Removes a node and every edge incident to it. Returns the removed edge ids.
    pub fn remove_node(&mut self, node_id: &NodeId) -> Result<Vec<EdgeId>, GraphError> {
        let Some(index) = self.nodes.iter().position(|node| node.id() == node_id) else {
            return Err(GraphError::MissingNode(node_id.clone()));
        };
        let removed = self.nodes.remove(index);

        let mut removed_edges = Vec::new();
        self.edges.retain(|edge| {
            let incident = edge.source() == node_id || edge.target() == node_id;
            if incident {
                removed_edges.push(edge.id().clone());
            }
            !incident
        });

        if self.metadata.central_concept.as_deref() == Some(removed.label()) {
            self.metadata.central_concept = None;
        }
        self.refresh_metadata();
        Ok(removed_edges)
    }

    pub fn remove_edge(&mut self, edge_id: &EdgeId) -> Result<VisualizationEdge, GraphError> {
        let Some(index) = self.edges.iter().position(|edge| edge.id() == edge_id) else {
            return Err(GraphError::MissingEdge(edge_id.clone()));
        };
        Ok(self.edges.remove(index))
    }

    pub fn set_central_concept<T: Into<String>>(&mut self, label: Option<T>) {
        self.metadata.central_concept = label.map(Into::into);
    }

    /// Recomputes derived metadata (`confusionPoints`).
    pub fn refresh_metadata(&mut self) {
        self.metadata.confusion_points = self
            .nodes
            .iter()
            .filter(|node| node.is_confusion())
            .map(|node| node.label().to_owned())
            .collect();
    }

    /// Resolves the hierarchy root: the node named by `centralConcept`, else the first node
    /// without incoming edges, else the first node.
    pub fn root_node(&self) -> Option<&VisualizationNode> {
        if let Some(central) = self.metadata.central_concept() {
            if let Some(node) = self.node_by_label(central) {
                return Some(node);
            }
        }
        self.first_sourceless_node().or_else(|| self.nodes.first())
    }

    pub fn first_sourceless_node(&self) -> Option<&VisualizationNode> {
        let targets = self.edges.iter().map(|edge| edge.target()).collect::<HashSet<_>>();
        self.nodes.iter().find(|node| !targets.contains(node.id()))
    }

    pub fn outgoing<'a>(
        &'a self,
        node_id: &'a NodeId,
    ) -> impl Iterator<Item = &'a VisualizationEdge> + 'a {
        self.edges.iter().filter(move |edge| edge.source() == node_id)
    }

    pub fn has_incoming(&self, node_id: &NodeId) -> bool {
        self.edges.iter().any(|edge| edge.target() == node_id)
    }

    /// First `n:NNNN` id not used by any node.
    pub fn next_node_id(&self) -> NodeId {
        (self.nodes.len() + 1..)
            .map(|index| NodeId::synthetic("n", index))
            .find(|candidate| !self.contains_node(candidate))
            .unwrap_or_else(|| NodeId::synthetic("n", usize::MAX))
    }

    /// First `e:NNNN` id not used by any edge.
    pub fn next_edge_id(&self) -> EdgeId {
        (self.edges.len() + 1..)
            .map(|index| EdgeId::synthetic("e", index))
            .find(|candidate| self.edge(candidate).is_none())
            .unwrap_or_else(|| EdgeId::synthetic("e", usize::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        EdgeKind, GraphError, GraphType, NodeKind, VisualizationEdge, VisualizationGraph,
        VisualizationNode,
    };
    use crate::model::{EdgeId, NodeId};

    fn node(id: &str, label: &str) -> VisualizationNode {
        VisualizationNode::new(NodeId::new(id).expect("node id"), label)
    }

    fn edge(id: &str, from: &str, to: &str) -> VisualizationEdge {
        VisualizationEdge::new(
            EdgeId::new(id).expect("edge id"),
            NodeId::new(from).expect("from id"),
            NodeId::new(to).expect("to id"),
        )
    }

    #[test]
    fn empty_graph_serializes_with_empty_metadata() {
        let graph = VisualizationGraph::default();
        let json = serde_json::to_value(&graph).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"type": "mindmap", "nodes": [], "edges": [], "metadata": {}})
        );
    }

    #[test]
    fn rejects_duplicate_node_ids_and_dangling_edges() {
        let mut graph = VisualizationGraph::new(GraphType::Conceptmap);
        graph.insert_node(node("a", "A")).expect("insert a");
        assert_eq!(
            graph.insert_node(node("a", "Again")),
            Err(GraphError::DuplicateNode(NodeId::new("a").expect("id")))
        );
        let err = graph.insert_edge(edge("e1", "a", "missing")).unwrap_err();
        assert!(matches!(err, GraphError::DanglingEdge { .. }));
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn removing_a_node_cascades_to_incident_edges() {
        let mut graph = VisualizationGraph::from_parts(
            GraphType::Mindmap,
            vec![node("a", "A"), node("b", "B"), node("c", "C")],
            vec![edge("e1", "a", "b"), edge("e2", "b", "c"), edge("e3", "a", "c")],
            Some("A".to_owned()),
        )
        .expect("graph");

        let removed = graph.remove_node(&NodeId::new("b").expect("id")).expect("remove");
        assert_eq!(removed.len(), 2);
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.edges()[0].id().as_str(), "e3");
    }

    #[test]
    fn confusion_points_track_node_kinds() {
        let mut graph = VisualizationGraph::default();
        graph.insert_node(node("a", "Inertia").with_kind(NodeKind::Confusion)).expect("insert");
        graph.insert_node(node("b", "Mass")).expect("insert");
        assert_eq!(graph.metadata().confusion_points(), ["Inertia".to_owned()]);

        graph.node_mut(&NodeId::new("a").expect("id")).expect("node").set_kind(NodeKind::Concept);
        graph.refresh_metadata();
        assert!(graph.metadata().confusion_points().is_empty());
    }

    #[test]
    fn root_prefers_central_concept_then_first_sourceless_node() {
        let mut graph = VisualizationGraph::from_parts(
            GraphType::Mindmap,
            vec![node("b", "B"), node("a", "A")],
            vec![edge("e1", "a", "b").with_kind(EdgeKind::Related)],
            None,
        )
        .expect("graph");
        assert_eq!(graph.root_node().map(|n| n.label()), Some("A"));

        graph.set_central_concept(Some("B"));
        assert_eq!(graph.root_node().map(|n| n.label()), Some("B"));
    }

    #[test]
    fn set_graph_type_keeps_nodes_and_edges() {
        let mut graph = VisualizationGraph::from_parts(
            GraphType::Mindmap,
            vec![node("a", "A"), node("b", "B")],
            vec![edge("e1", "a", "b")],
            None,
        )
        .expect("graph");
        let before = (graph.nodes().to_vec(), graph.edges().to_vec());
        graph.set_graph_type(GraphType::Knowledgegraph);
        assert_eq!(graph.graph_type(), GraphType::Knowledgegraph);
        assert_eq!((graph.nodes().to_vec(), graph.edges().to_vec()), before);
    }

    #[test]
    fn next_ids_skip_taken_values() {
        let mut graph = VisualizationGraph::default();
        graph.insert_node(VisualizationNode::new(NodeId::synthetic("n", 2), "x")).expect("insert");
        assert_eq!(graph.next_node_id().as_str(), "n:0003");
        graph.insert_node(VisualizationNode::new(NodeId::synthetic("n", 3), "y")).expect("insert");
        assert_eq!(graph.next_node_id().as_str(), "n:0004");
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Edit operations on the canonical visualization graph.
//!
//! Operations are applied with optimistic concurrency (revision checks) to a working copy and
//! produce a coarse delta plus a progress snapshot for observers.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::format::{self, Diagnostic};
use crate::model::{
    EdgeId, EdgeKind, GraphError, GraphType, NodeId, NodeKind, Position, VisualizationEdge,
    VisualizationGraph, VisualizationNode,
};

#[derive(Debug, Clone, PartialEq)]
pub enum GraphOp {
    AddNode {
        node_id: NodeId,
        label: String,
        kind: NodeKind,
        position: Option<Position>,
    },
    UpdateNode {
        node_id: NodeId,
        patch: NodePatch,
    },
    RemoveNode {
        node_id: NodeId,
    },
    AddEdge {
        edge_id: EdgeId,
        source: NodeId,
        target: NodeId,
        label: Option<String>,
        kind: EdgeKind,
    },
    UpdateEdge {
        edge_id: EdgeId,
        patch: EdgePatch,
    },
    RemoveEdge {
        edge_id: EdgeId,
    },
    SetGraphType {
        graph_type: GraphType,
    },
    SetCentralConcept {
        label: Option<String>,
    },
    ReplaceGraph {
        graph: Box<VisualizationGraph>,
    },
}

impl GraphOp {
    pub fn add_node(node_id: NodeId, label: impl Into<String>) -> Self {
        Self::AddNode { node_id, label: label.into(), kind: NodeKind::Concept, position: None }
    }

    pub fn add_edge(edge_id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self::AddEdge { edge_id, source, target, label: None, kind: EdgeKind::Hierarchical }
    }

    pub fn mark_confusion(node_id: NodeId) -> Self {
        Self::UpdateNode {
            node_id,
            patch: NodePatch { kind: Some(NodeKind::Confusion), ..NodePatch::default() },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePatch {
    pub label: Option<String>,
    pub kind: Option<NodeKind>,
    pub position: Option<Position>,
}

/// An empty `label` clears the edge label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgePatch {
    pub source: Option<NodeId>,
    pub target: Option<NodeId>,
    pub label: Option<String>,
    pub kind: Option<EdgeKind>,
}

/// A reference to one changed part of the graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GraphRef {
    Node(NodeId),
    Edge(EdgeId),
    Metadata,
}

impl fmt::Display for GraphRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(node_id) => write!(f, "node {node_id}"),
            Self::Edge(edge_id) => write!(f, "edge {edge_id}"),
            Self::Metadata => f.write_str("metadata"),
        }
    }
}

/// Minimal delta describing which graph parts changed as the result of applying ops.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Delta {
    pub added: Vec<GraphRef>,
    pub removed: Vec<GraphRef>,
    pub updated: Vec<GraphRef>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }
}

#[derive(Debug, Default)]
struct DeltaBuilder {
    added: HashSet<GraphRef>,
    removed: HashSet<GraphRef>,
    updated: HashSet<GraphRef>,
}

impl DeltaBuilder {
    fn record_added(&mut self, graph_ref: GraphRef) {
        // Remove-then-add of the same id within one batch is a replacement.
        if self.removed.remove(&graph_ref) {
            self.updated.insert(graph_ref);
            return;
        }
        self.updated.remove(&graph_ref);
        self.added.insert(graph_ref);
    }

    fn record_removed(&mut self, graph_ref: GraphRef) {
        self.updated.remove(&graph_ref);
        if self.added.remove(&graph_ref) {
            return;
        }
        self.removed.insert(graph_ref);
    }

    fn record_updated(&mut self, graph_ref: GraphRef) {
        if self.added.contains(&graph_ref) || self.removed.contains(&graph_ref) {
            return;
        }
        self.updated.insert(graph_ref);
    }

    fn finish(self) -> Delta {
        let mut added = self.added.into_iter().collect::<Vec<_>>();
        let mut removed = self.removed.into_iter().collect::<Vec<_>>();
        let mut updated = self.updated.into_iter().collect::<Vec<_>>();
        added.sort();
        removed.sort();
        updated.sort();
        Delta { added, removed, updated }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    #[error("stale base_rev (base_rev={base_rev}, current_rev={current_rev})")]
    Conflict { base_rev: u64, current_rev: u64 },
    #[error("node label must not be empty (id={node_id})")]
    EmptyLabel { node_id: NodeId },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Completion score in `[0, 100]`: half for reaching three nodes, half for reaching two edges.
pub fn completion_rate(node_count: usize, edge_count: usize) -> u8 {
    let nodes = (node_count as f64 / 3.0).min(1.0);
    let edges = (edge_count as f64 / 2.0).min(1.0);
    (nodes * 50.0 + edges * 50.0).round().clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub confusion_point_count: usize,
    pub completion_rate: u8,
}

impl ProgressSnapshot {
    pub fn of(graph: &VisualizationGraph) -> Self {
        Self {
            total_nodes: graph.nodes().len(),
            total_edges: graph.edges().len(),
            confusion_point_count: graph.confusion_count(),
            completion_rate: completion_rate(graph.nodes().len(), graph.edges().len()),
        }
    }
}

/// Which surface produced a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditSource {
    Direct,
    TextDsl,
    Markup,
    Reset,
}

/// Notification emitted after every successful mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphChange {
    pub rev: u64,
    pub source: EditSource,
    pub graph: VisualizationGraph,
    pub previous: ProgressSnapshot,
    pub progress: ProgressSnapshot,
    pub delta: Delta,
}

pub trait GraphObserver: Send {
    fn on_graph_change(&mut self, change: &GraphChange);
}

/// Result of feeding markup into the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkupApply {
    Applied(GraphChange),
    /// The markup could not be read; the previous graph was kept.
    Kept { diagnostics: Vec<Diagnostic> },
}

/// Owner of the canonical graph for one task.
pub struct GraphEditor {
    graph: VisualizationGraph,
    rev: u64,
    last_diagnostic: Option<String>,
    observers: Vec<Box<dyn GraphObserver>>,
}

impl fmt::Debug for GraphEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphEditor")
            .field("graph", &self.graph)
            .field("rev", &self.rev)
            .field("last_diagnostic", &self.last_diagnostic)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for GraphEditor {
    fn default() -> Self {
        Self::new(VisualizationGraph::default())
    }
}

impl GraphEditor {
    pub fn new(graph: VisualizationGraph) -> Self {
        Self { graph, rev: 0, last_diagnostic: None, observers: Vec::new() }
    }

    pub fn graph(&self) -> &VisualizationGraph {
        &self.graph
    }

    pub fn rev(&self) -> u64 {
        self.rev
    }

    pub fn progress(&self) -> ProgressSnapshot {
        ProgressSnapshot::of(&self.graph)
    }

    /// The diagnostic from the most recent text or markup edit, if any.
    pub fn last_diagnostic(&self) -> Option<&str> {
        self.last_diagnostic.as_deref()
    }

    pub fn subscribe(&mut self, observer: Box<dyn GraphObserver>) {
        self.observers.push(observer);
    }

    pub fn next_node_id(&self) -> NodeId {
        self.graph.next_node_id()
    }

    pub fn next_edge_id(&self) -> EdgeId {
        self.graph.next_edge_id()
    }

    /// Applies `ops` atomically against `base_rev`.
    pub fn apply_ops(&mut self, base_rev: u64, ops: &[GraphOp]) -> Result<GraphChange, ApplyError> {
        self.apply_from(EditSource::Direct, base_rev, ops)
    }

    /// Applies `ops` against the current revision.
    pub fn edit(&mut self, ops: &[GraphOp]) -> Result<GraphChange, ApplyError> {
        self.apply_from(EditSource::Direct, self.rev, ops)
    }

    /// Replaces the graph with the parse of `text`. The current graph type is kept.
    pub fn apply_text_dsl(&mut self, text: &str) -> GraphChange {
        let outcome = format::parse_text_dsl(text, self.graph.graph_type());
        self.last_diagnostic = outcome.diagnostic_text();
        if let Some(diagnostic) = &self.last_diagnostic {
            tracing::debug!(%diagnostic, "text dsl diagnostics");
        }
        self.replace(EditSource::TextDsl, outcome.graph)
    }

    /// Replaces the graph with the parse of `markup`.
    ///
    /// When non-empty markup yields nothing but diagnostics, the previous graph is kept.
    pub fn apply_markup(&mut self, markup: &str) -> MarkupApply {
        let outcome = format::graph_from_markup(markup);
        self.last_diagnostic = outcome.diagnostic_text();

        if outcome.graph.is_empty() && !outcome.is_clean() && !markup.trim().is_empty() {
            tracing::warn!(
                diagnostic = self.last_diagnostic.as_deref().unwrap_or_default(),
                "markup unreadable; keeping previous graph"
            );
            return MarkupApply::Kept { diagnostics: outcome.diagnostics };
        }
        if let Some(diagnostic) = &self.last_diagnostic {
            tracing::debug!(%diagnostic, "markup diagnostics");
        }
        MarkupApply::Applied(self.replace(EditSource::Markup, outcome.graph))
    }

    /// Swaps in a new graph, e.g. a task template, and notifies observers.
    pub fn reset(&mut self, graph: VisualizationGraph) -> GraphChange {
        self.last_diagnostic = None;
        self.replace(EditSource::Reset, graph)
    }

    fn replace(&mut self, source: EditSource, graph: VisualizationGraph) -> GraphChange {
        let ops = [GraphOp::ReplaceGraph { graph: Box::new(graph) }];
        match self.apply_from(source, self.rev, &ops) {
            Ok(change) => change,
            // Parsers only emit validated graphs and the revision is current.
            Err(err) => {
                tracing::error!(error = %err, "graph replacement rejected");
                self.snapshot_change(source, Delta::default(), self.progress())
            }
        }
    }

    fn snapshot_change(
        &self,
        source: EditSource,
        delta: Delta,
        previous: ProgressSnapshot,
    ) -> GraphChange {
        GraphChange {
            rev: self.rev,
            source,
            graph: self.graph.clone(),
            previous,
            progress: self.progress(),
            delta,
        }
    }

    fn apply_from(
        &mut self,
        source: EditSource,
        base_rev: u64,
        ops: &[GraphOp],
    ) -> Result<GraphChange, ApplyError> {
        let current_rev = self.rev;
        if base_rev != current_rev {
            return Err(ApplyError::Conflict { base_rev, current_rev });
        }

        let previous = self.progress();
        if ops.is_empty() {
            return Ok(self.snapshot_change(source, Delta::default(), previous));
        }

        let mut working = self.graph.clone();
        let mut delta = DeltaBuilder::default();
        for op in ops {
            apply_graph_op(&mut working, op, &mut delta)?;
        }
        working.refresh_metadata();

        self.graph = working;
        self.rev += 1;

        let change = self.snapshot_change(source, delta.finish(), previous);
        tracing::debug!(
            rev = change.rev,
            nodes = change.progress.total_nodes,
            edges = change.progress.total_edges,
            completion = change.progress.completion_rate,
            "graph changed"
        );
        for observer in &mut self.observers {
            observer.on_graph_change(&change);
        }
        Ok(change)
    }
}

// Per-op mutation helpers used by `GraphEditor::apply_from`.
include!("ops_impl.rs");

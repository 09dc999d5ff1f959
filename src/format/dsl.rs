// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Line-oriented relationship DSL.
//!
//! ```text
//! Force
//! Force -> Acceleration
//! Inertia [confusion] -> describes -> Rest or uniform motion
//! ```
//!
//! Labels are the identity key of this surface only. Each new label is mapped to a fresh `n:NNNN`
//! id at parse time; nothing downstream compares labels to find nodes.

use std::collections::HashMap;

use super::{Diagnostic, ParseOutcome};
use crate::model::{
    EdgeId, EdgeKind, GraphType, NodeId, NodeKind, VisualizationEdge, VisualizationGraph,
    VisualizationNode,
};

pub const ARROW: &str = "->";
pub const CONFUSION_MARKER: &str = "[confusion]";

#[derive(Debug, Default)]
struct LabelTable {
    ids: HashMap<String, NodeId>,
    nodes: Vec<VisualizationNode>,
}

impl LabelTable {
    /// Returns the id for `raw`, creating the node on first sight.
    fn resolve(&mut self, raw: &str) -> Option<NodeId> {
        let (label, confused) = strip_confusion_marker(raw);
        if label.is_empty() {
            return None;
        }

        if let Some(node_id) = self.ids.get(label) {
            if confused {
                if let Some(node) = self.nodes.iter_mut().find(|node| node.id() == node_id) {
                    node.set_kind(NodeKind::Confusion);
                }
            }
            return Some(node_id.clone());
        }

        let node_id = NodeId::synthetic("n", self.nodes.len() + 1);
        let kind = if confused { NodeKind::Confusion } else { NodeKind::Concept };
        self.nodes.push(VisualizationNode::new(node_id.clone(), label).with_kind(kind));
        self.ids.insert(label.to_owned(), node_id.clone());
        Some(node_id)
    }
}

fn strip_confusion_marker(raw: &str) -> (&str, bool) {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_suffix(CONFUSION_MARKER) {
        return (rest.trim_end(), true);
    }
    if let Some(rest) = trimmed.strip_prefix(CONFUSION_MARKER) {
        return (rest.trim_start(), true);
    }
    (trimmed, false)
}

enum LineShape<'a> {
    Bare(&'a str),
    Edge { source: &'a str, label: Option<&'a str>, target: &'a str },
}

fn classify_line(line: &str) -> Option<LineShape<'_>> {
    let parts = line.split(ARROW).map(str::trim).collect::<Vec<_>>();
    match *parts.as_slice() {
        [single] => Some(LineShape::Bare(single)),
        [source, target] if !source.is_empty() && !target.is_empty() => {
            Some(LineShape::Edge { source, label: None, target })
        }
        [source, label, target] if !source.is_empty() && !target.is_empty() => Some(LineShape::Edge {
            source,
            label: (!label.is_empty()).then_some(label),
            target,
        }),
        _ => None,
    }
}

/// Parses DSL text into a fresh graph of `graph_type`.
///
/// Never fails. Lines whose arrows do not form `A -> B` or `A -> rel -> B` become bare node labels
/// and produce a diagnostic.
pub fn parse_text_dsl(input: &str, graph_type: GraphType) -> ParseOutcome {
    let mut table = LabelTable::default();
    let mut edges = Vec::<VisualizationEdge>::new();
    let mut diagnostics = Vec::new();

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        match classify_line(line) {
            Some(LineShape::Bare(label)) => {
                table.resolve(label);
            }
            Some(LineShape::Edge { source, label, target }) => {
                let (Some(source_id), Some(target_id)) =
                    (table.resolve(source), table.resolve(target))
                else {
                    diagnostics.push(Diagnostic::new(line_no, "edge endpoint has an empty label"));
                    continue;
                };
                let edge_id = EdgeId::synthetic("e", edges.len() + 1);
                let kind = if label.is_some() { EdgeKind::Related } else { EdgeKind::Hierarchical };
                edges.push(
                    VisualizationEdge::new(edge_id, source_id, target_id)
                        .with_label(label)
                        .with_kind(kind),
                );
            }
            None => {
                diagnostics.push(Diagnostic::new(
                    line_no,
                    format!("could not read '{line}' as a relationship; kept as a node label"),
                ));
                table.resolve(line);
            }
        }
    }

    let central = central_concept(&table.nodes, &edges);
    // Ids are allocated sequentially and every edge endpoint came from the table.
    let graph = VisualizationGraph::from_parts(graph_type, table.nodes, edges, central)
        .unwrap_or_else(|_| VisualizationGraph::new(graph_type));

    ParseOutcome { graph, diagnostics }
}

fn central_concept(nodes: &[VisualizationNode], edges: &[VisualizationEdge]) -> Option<String> {
    nodes
        .iter()
        .find(|node| !edges.iter().any(|edge| edge.target() == node.id()))
        .or_else(|| nodes.first())
        .map(|node| node.label().to_owned())
}

fn dsl_label(node: &VisualizationNode) -> String {
    if node.is_confusion() {
        format!("{} {CONFUSION_MARKER}", node.label())
    } else {
        node.label().to_owned()
    }
}

/// Flattens a graph back into DSL lines: one line per edge, then one line per isolated node.
pub fn to_text_dsl(graph: &VisualizationGraph) -> String {
    let mut out = String::new();

    for edge in graph.edges() {
        let (Some(source), Some(target)) = (graph.node(edge.source()), graph.node(edge.target()))
        else {
            continue;
        };
        out.push_str(&dsl_label(source));
        out.push_str(" -> ");
        if let Some(label) = edge.label() {
            out.push_str(label);
            out.push_str(" -> ");
        }
        out.push_str(&dsl_label(target));
        out.push('\n');
    }

    for node in graph.nodes() {
        let connected = graph
            .edges()
            .iter()
            .any(|edge| edge.source() == node.id() || edge.target() == node.id());
        if !connected {
            out.push_str(&dsl_label(node));
            out.push('\n');
        }
    }

    out
}

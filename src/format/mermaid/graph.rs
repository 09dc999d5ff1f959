// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Generic `graph`/`flowchart` dialect.

use super::ident::{is_markup_ident, validate_markup_ident, MarkupIdentError};
use super::{
    decode_label, encode_label, read_node_label, split_class_suffix, unquote, CONFUSION_CLASS,
    CONFUSION_PREFIX,
};
use crate::format::{Diagnostic, ParseOutcome};
use crate::model::{
    EdgeId, EdgeKind, GraphType, IdError, NodeId, NodeKind, VisualizationEdge, VisualizationGraph,
    VisualizationNode,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
enum LineError {
    #[error("invalid direction '{0}' (expected TD/TB/LR/RL/BT)")]
    InvalidDirection(String),
    #[error("invalid node id '{name}' ({reason})")]
    InvalidNodeId { name: String, reason: MarkupIdentError },
    #[error("invalid node label syntax: {0}")]
    InvalidNodeLabelSyntax(String),
    #[error("empty node label: {0}")]
    EmptyNodeLabel(String),
    #[error("unterminated edge label: {0}")]
    UnterminatedEdgeLabel(String),
    #[error("node id '{name}' cannot be used ({reason})")]
    UnusableNodeId { name: String, reason: IdError },
}

fn node_id_from_markup_id(name: &str) -> Result<NodeId, LineError> {
    NodeId::new(format!("n:{name}"))
        .map_err(|reason| LineError::UnusableNodeId { name: name.to_owned(), reason })
}

fn read_edge_label(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        decode_label(unquote(trimmed))
    } else {
        trimmed.to_owned()
    }
}

fn is_edge_op_start_char(ch: char) -> bool {
    matches!(ch, '<' | '-' | '=' | '.')
}

fn is_edge_op_char(ch: char) -> bool {
    matches!(ch, '<' | '>' | '-' | '=' | '.')
}

fn is_probable_edge_operator(op: &str) -> bool {
    op.chars().filter(|ch| matches!(ch, '-' | '=' | '.')).count() >= 2
}

/// Splits `line` at the first edge operator outside of a bracketed or quoted label.
fn split_once_edge_operator(line: &str) -> Option<(&str, &str, &str)> {
    let mut closing: Option<char> = None;
    let mut in_quote = false;
    let mut op_start: Option<usize> = None;

    for (idx, ch) in line.char_indices() {
        // Quotes win over brackets so `["a] --> b"]` stays one label.
        if ch == '"' && closing != Some('|') {
            in_quote = !in_quote;
            continue;
        }
        if in_quote {
            continue;
        }
        if let Some(close) = closing {
            if ch == close {
                closing = None;
            }
            continue;
        }

        closing = match ch {
            '[' => Some(']'),
            '(' => Some(')'),
            '{' => Some('}'),
            '|' => Some('|'),
            _ => None,
        };
        if closing.is_some() {
            continue;
        }

        if is_edge_op_start_char(ch) {
            op_start = Some(idx);
            break;
        }
    }

    let start = op_start?;
    let end = line[start..]
        .char_indices()
        .find(|(_, ch)| !is_edge_op_char(*ch))
        .map(|(idx, _)| start + idx)
        .unwrap_or(line.len());

    let lhs = &line[..start];
    let op = &line[start..end];
    let rhs = &line[end..];
    if lhs.trim().is_empty() || !is_probable_edge_operator(op) {
        return None;
    }
    Some((lhs, op, rhs))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeDirection {
    Forward,
    Reverse,
}

fn edge_direction(op: &str) -> EdgeDirection {
    if op.contains('<') && !op.contains('>') {
        EdgeDirection::Reverse
    } else {
        EdgeDirection::Forward
    }
}

fn edge_kind_for_operator(op: &str) -> EdgeKind {
    if op.contains('=') {
        EdgeKind::Causal
    } else if op.contains('.') {
        EdgeKind::Example
    } else if op.contains('>') || op.contains('<') {
        EdgeKind::Hierarchical
    } else {
        EdgeKind::Related
    }
}

fn operator_for_edge_kind(kind: EdgeKind) -> &'static str {
    match kind {
        EdgeKind::Hierarchical => "-->",
        EdgeKind::Related => "---",
        EdgeKind::Causal => "==>",
        EdgeKind::Example => "-.->",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeSpec {
    node_id: NodeId,
    markup_id: String,
    label: Option<String>,
    confused: bool,
}

fn parse_node_spec(token: &str) -> Result<NodeSpec, LineError> {
    let (trimmed, class) = split_class_suffix(token);
    let confused = class == Some(CONFUSION_CLASS);

    let Some(open_idx) = trimmed.find(['[', '(', '{']) else {
        validate_markup_ident(trimmed).map_err(|reason| LineError::InvalidNodeId {
            name: trimmed.to_owned(),
            reason,
        })?;
        return Ok(NodeSpec {
            node_id: node_id_from_markup_id(trimmed)?,
            markup_id: trimmed.to_owned(),
            label: None,
            confused,
        });
    };

    let id_raw = trimmed[..open_idx].trim();
    validate_markup_ident(id_raw)
        .map_err(|reason| LineError::InvalidNodeId { name: id_raw.to_owned(), reason })?;

    let shape = &trimmed[open_idx..];
    let inner = ["((", "(", "[", "{"]
        .iter()
        .zip(["))", ")", "]", "}"])
        .find_map(|(open, close)| shape.strip_prefix(open).and_then(|s| s.strip_suffix(close)))
        .ok_or_else(|| LineError::InvalidNodeLabelSyntax(trimmed.to_owned()))?;

    let (label, prefixed) = read_node_label(inner);
    if label.is_empty() {
        return Err(LineError::EmptyNodeLabel(trimmed.to_owned()));
    }

    Ok(NodeSpec {
        node_id: node_id_from_markup_id(id_raw)?,
        markup_id: id_raw.to_owned(),
        label: Some(label),
        confused: confused || prefixed,
    })
}

#[derive(Debug, Default)]
struct Builder {
    nodes: Vec<VisualizationNode>,
    edges: Vec<VisualizationEdge>,
}

impl Builder {
    fn ensure_node(&mut self, spec: NodeSpec) -> NodeId {
        let NodeSpec { node_id, markup_id, label, confused } = spec;

        if let Some(existing) = self.nodes.iter_mut().find(|node| node.id() == &node_id) {
            if let Some(label) = label {
                // Implicit nodes carry their markup id as label until declared.
                if existing.label() == markup_id {
                    existing.set_label(label);
                }
            }
            if confused {
                existing.set_kind(NodeKind::Confusion);
            }
            return node_id;
        }

        let kind = if confused { NodeKind::Confusion } else { NodeKind::Concept };
        let label = label.unwrap_or_else(|| markup_id.clone());
        self.nodes.push(VisualizationNode::new(node_id.clone(), label).with_kind(kind));
        node_id
    }

    fn push_edge(
        &mut self,
        lhs: NodeSpec,
        op: &str,
        rhs: NodeSpec,
        label: Option<String>,
    ) {
        let kind = edge_kind_for_operator(op);
        let (from, to) = match edge_direction(op) {
            EdgeDirection::Forward => (lhs, rhs),
            EdgeDirection::Reverse => (rhs, lhs),
        };
        let from_id = self.ensure_node(from);
        let to_id = self.ensure_node(to);
        let edge_id = EdgeId::synthetic("e", self.edges.len() + 1);
        self.edges.push(
            VisualizationEdge::new(edge_id, from_id, to_id).with_label(label).with_kind(kind),
        );
    }
}

fn parse_header(trimmed: &str) -> Result<(), LineError> {
    let mut parts = trimmed.split_whitespace().skip(1);
    if let Some(direction) = parts.next() {
        if !matches!(direction, "TD" | "TB" | "LR" | "RL" | "BT") {
            return Err(LineError::InvalidDirection(direction.to_owned()));
        }
    }
    Ok(())
}

fn parse_statement(builder: &mut Builder, trimmed: &str) -> Result<(), LineError> {
    // Inline label syntax: `<lhs> -- <label> --> <rhs>`
    if let Some((lhs_raw, op1, rest1)) = split_once_edge_operator(trimmed) {
        if op1 == "--" || op1 == "==" {
            if let Some((label_raw, op2, rhs_raw)) = split_once_edge_operator(rest1.trim_start()) {
                let label = read_edge_label(label_raw);
                if !label.is_empty() {
                    let lhs = parse_node_spec(lhs_raw)?;
                    let rhs = parse_node_spec(rhs_raw)?;
                    let op = format!("{op1}{op2}");
                    builder.push_edge(lhs, &op, rhs, Some(label));
                    return Ok(());
                }
            }
        }
    }

    let Some((first_raw, first_op, tail)) = split_once_edge_operator(trimmed) else {
        let spec = parse_node_spec(trimmed)?;
        builder.ensure_node(spec);
        return Ok(());
    };

    // Validate the whole chain before touching the builder so a bad line adds nothing.
    let mut current = parse_node_spec(first_raw)?;
    let mut op = first_op.to_owned();
    let mut rest = tail;
    let mut steps = Vec::<(NodeSpec, String, NodeSpec, Option<String>)>::new();

    loop {
        let mut edge_label: Option<String> = None;
        let mut rhs_and_more = rest.trim_start();
        if let Some(after) = rhs_and_more.strip_prefix('|') {
            let end_idx =
                after.find('|').ok_or_else(|| LineError::UnterminatedEdgeLabel(trimmed.to_owned()))?;
            let label = read_edge_label(&after[..end_idx]);
            if !label.is_empty() {
                edge_label = Some(label);
            }
            rhs_and_more = after[end_idx + 1..].trim_start();
        }

        let (rhs_raw, next) = match split_once_edge_operator(rhs_and_more) {
            Some((rhs_raw, next_op, next_rest)) => (rhs_raw, Some((next_op, next_rest))),
            None => (rhs_and_more, None),
        };
        let rhs = parse_node_spec(rhs_raw)?;
        steps.push((current, op, rhs.clone(), edge_label));

        let Some((next_op, next_rest)) = next else {
            break;
        };
        current = rhs;
        op = next_op.to_owned();
        rest = next_rest;
    }

    for (lhs, op, rhs, label) in steps {
        builder.push_edge(lhs, &op, rhs, label);
    }
    Ok(())
}

/// Parses the generic dialect into a `conceptmap` graph.
///
/// Supported:
/// - `graph`/`flowchart` header with optional direction (ignored)
/// - `%%` comments; `style`, `class`, `classDef`, `click`, `subgraph`, `end` lines are skipped
/// - nodes: `<id>`, `<id>[<label>]`, `<id>(<label>)`, `<id>((<label>))`, `<id>{<label>}`, with an
///   optional `:::confusion` class
/// - edges: `-->`, `---`, `==>`, `-.->`, reversed `<--`, labels as `-->|<label>|` or
///   `-- "<label>" -->`, and chains `a --> b --> c`
///
/// Undeclared endpoints are created with their id as label. The first node encountered is the
/// central concept. Lines that cannot be read are skipped with a diagnostic.
pub fn parse_graph_dialect(input: &str) -> ParseOutcome {
    let mut builder = Builder::default();
    let mut diagnostics = Vec::new();
    let mut saw_header = false;

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw_line.trim().trim_end_matches(';');
        if trimmed.is_empty() || trimmed.starts_with("%%") {
            continue;
        }

        if !saw_header {
            saw_header = true;
            if let Err(err) = parse_header(trimmed) {
                diagnostics.push(Diagnostic::new(line_no, err.to_string()));
            }
            continue;
        }

        if is_ignorable_line(trimmed) {
            continue;
        }

        if let Err(err) = parse_statement(&mut builder, trimmed) {
            diagnostics.push(Diagnostic::new(line_no, format!("{err}; line skipped")));
        }
    }

    let central = builder.nodes.first().map(|node| node.label().to_owned());
    let graph = VisualizationGraph::from_parts(
        GraphType::Conceptmap,
        builder.nodes,
        builder.edges,
        central,
    )
    .unwrap_or_else(|err| {
        diagnostics.push(Diagnostic::new(0, err.to_string()));
        VisualizationGraph::new(GraphType::Conceptmap)
    });

    ParseOutcome { graph, diagnostics }
}

fn is_ignorable_line(trimmed: &str) -> bool {
    trimmed.starts_with("subgraph ")
        || trimmed == "end"
        || trimmed.starts_with("style ")
        || trimmed.starts_with("class ")
        || trimmed.starts_with("classDef ")
        || trimmed.starts_with("click ")
        || trimmed.starts_with("linkStyle ")
}

fn export_ident(node: &VisualizationNode, index: usize) -> String {
    node.id()
        .as_str()
        .strip_prefix("n:")
        .filter(|ident| is_markup_ident(ident))
        .map(str::to_owned)
        .unwrap_or_else(|| format!("n{index}"))
}

fn export_label(label: &str, confused: bool) -> String {
    let single_line = label.replace(['\n', '\r'], " ");
    let prefix = if confused { CONFUSION_PREFIX } else { "" };
    format!("[\"{prefix}{}\"]", encode_label(&single_line))
}

fn export_edge_label(label: &str) -> String {
    let single_line = label.replace(['\n', '\r'], " ");
    format!("|\"{}\"|", encode_label(&single_line).replace('|', "#124;"))
}

/// Exports any graph in the generic dialect.
///
/// The central concept is emitted first so re-parsing keeps it. Edge kinds map to operators:
/// hierarchical `-->`, related `---`, causal `==>`, example `-.->`.
pub fn export_graph_dialect(graph: &VisualizationGraph) -> String {
    let mut out = String::from("graph TD\n");

    let root_id = graph.root_node().map(|node| node.id().clone());
    let mut ordered = graph.nodes().iter().enumerate().collect::<Vec<_>>();
    ordered.sort_by_key(|(_, node)| Some(node.id()) != root_id.as_ref());

    let mut idents = std::collections::HashMap::<&NodeId, String>::new();
    let mut used = std::collections::HashSet::<String>::new();
    for (index, node) in &ordered {
        let mut ident = export_ident(node, index + 1);
        while used.contains(&ident) {
            ident.push('_');
        }
        used.insert(ident.clone());

        out.push_str("    ");
        out.push_str(&ident);
        out.push_str(&export_label(node.label(), node.is_confusion()));
        if node.is_confusion() {
            out.push_str(":::");
            out.push_str(CONFUSION_CLASS);
        }
        out.push('\n');
        idents.insert(node.id(), ident);
    }

    for edge in graph.edges() {
        let (Some(from), Some(to)) = (idents.get(edge.source()), idents.get(edge.target())) else {
            continue;
        };
        out.push_str("    ");
        out.push_str(from);
        out.push(' ');
        out.push_str(operator_for_edge_kind(edge.kind()));
        if let Some(label) = edge.label() {
            out.push_str(&export_edge_label(label));
        }
        out.push(' ');
        out.push_str(to);
        out.push('\n');
    }

    out
}

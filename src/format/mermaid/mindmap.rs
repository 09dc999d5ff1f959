// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Tree-shaped `mindmap` dialect.
//!
//! ```text
//! mindmap
//!     root((Energy))
//!         Kinetic
//!             Speed
//!         ❓ Potential
//! ```

use std::collections::HashSet;

use super::ident::is_markup_ident;
use super::{encode_label, read_node_label, split_class_suffix, CONFUSION_CLASS, CONFUSION_PREFIX};
use crate::format::{Diagnostic, ParseOutcome};
use crate::model::{
    EdgeId, GraphType, NodeId, NodeKind, VisualizationEdge, VisualizationGraph, VisualizationNode,
};

const INDENT: &str = "    ";
const TAB_WIDTH: usize = 4;

const SHAPES: [(&str, &str); 7] = [
    ("((", "))"),
    ("{{", "}}"),
    ("))", "(("),
    ("(", ")"),
    ("[", "]"),
    ("{", "}"),
    (")", "("),
];

fn indent_width(line: &str) -> usize {
    line.chars()
        .take_while(|ch| ch.is_whitespace())
        .map(|ch| if ch == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// Returns the inner text of `id((text))`-style shapes, or `None` for plain text.
fn shaped_label(text: &str) -> Option<&str> {
    let open_idx = text.find(['(', '[', '{', ')'])?;
    let ident = &text[..open_idx];
    if !ident.is_empty() && !is_markup_ident(ident) {
        return None;
    }
    let shape = &text[open_idx..];
    SHAPES
        .iter()
        .find_map(|(open, close)| shape.strip_prefix(open).and_then(|s| s.strip_suffix(close)))
}

fn parse_node_text(raw: &str) -> (String, bool) {
    let (text, class) = split_class_suffix(raw);
    let inner = shaped_label(text).unwrap_or(text);
    let (label, prefixed) = read_node_label(inner);
    (label, prefixed || class == Some(CONFUSION_CLASS))
}

/// Parses the tree dialect into a `mindmap` graph.
///
/// The first node line is the root. Each following line's parent is the nearest preceding line
/// with a smaller indentation (tabs count as four spaces). Lines not indented under the root are
/// attached to the root with a diagnostic.
pub fn parse_mindmap(input: &str) -> ParseOutcome {
    let mut nodes = Vec::<VisualizationNode>::new();
    let mut edges = Vec::<VisualizationEdge>::new();
    let mut diagnostics = Vec::new();
    let mut saw_header = false;
    // (indent, node) pairs from the root down to the most recent line.
    let mut stack = Vec::<(usize, NodeId)>::new();

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with("%%") {
            continue;
        }
        if !saw_header {
            saw_header = true;
            continue;
        }
        if trimmed.starts_with("::icon(") {
            continue;
        }

        let (label, confused) = parse_node_text(trimmed);
        if label.is_empty() {
            diagnostics.push(Diagnostic::new(line_no, "empty node label; line skipped"));
            continue;
        }

        let node_id = NodeId::synthetic("n", nodes.len() + 1);
        let kind = if confused { NodeKind::Confusion } else { NodeKind::Concept };
        nodes.push(VisualizationNode::new(node_id.clone(), label).with_kind(kind));

        let indent = indent_width(raw_line);
        let Some(&(root_indent, _)) = stack.first() else {
            stack.push((indent, node_id));
            continue;
        };

        let indent = if indent <= root_indent {
            diagnostics.push(Diagnostic::new(
                line_no,
                "node is not indented under the root; attached to the root",
            ));
            stack.truncate(1);
            root_indent + 1
        } else {
            while stack.last().is_some_and(|(depth, _)| *depth >= indent) {
                stack.pop();
            }
            indent
        };

        if let Some((_, parent)) = stack.last() {
            let edge_id = EdgeId::synthetic("e", edges.len() + 1);
            edges.push(VisualizationEdge::new(edge_id, parent.clone(), node_id.clone()));
        }
        stack.push((indent, node_id));
    }

    let central = nodes.first().map(|node| node.label().to_owned());
    let graph = VisualizationGraph::from_parts(GraphType::Mindmap, nodes, edges, central)
        .unwrap_or_else(|err| {
            diagnostics.push(Diagnostic::new(0, err.to_string()));
            VisualizationGraph::new(GraphType::Mindmap)
        });

    ParseOutcome { graph, diagnostics }
}

/// Node text as written, and whether it is quoted (and so must sit inside a shape).
fn display_text(node: &VisualizationNode) -> (String, bool) {
    let label = node.label().replace(['\n', '\r'], " ");
    let prefix = if node.is_confusion() { CONFUSION_PREFIX } else { "" };
    if needs_quoting(&label) {
        (format!("\"{prefix}{}\"", encode_label(&label)), true)
    } else {
        (format!("{prefix}{label}"), false)
    }
}

fn needs_quoting(label: &str) -> bool {
    label.contains(['(', ')', '[', ']', '{', '}', '"'])
        || label.contains(":::")
        || label.starts_with("%%")
        || label.starts_with("::")
        || label.starts_with('❓')
}

struct TreeWriter<'a> {
    graph: &'a VisualizationGraph,
    visited: HashSet<&'a NodeId>,
    quoted: usize,
    out: String,
}

impl<'a> TreeWriter<'a> {
    fn write_root(&mut self, node: &'a VisualizationNode) {
        self.visited.insert(node.id());
        let (text, _) = display_text(node);
        self.out.push_str(INDENT);
        self.out.push_str(&format!("root(({text}))\n"));
    }

    fn write_line(&mut self, node: &VisualizationNode, depth: usize) {
        let (text, quoted) = display_text(node);
        for _ in 0..=depth {
            self.out.push_str(INDENT);
        }
        if quoted {
            self.quoted += 1;
            self.out.push_str(&format!("n{}[{text}]\n", self.quoted));
        } else {
            self.out.push_str(&text);
            self.out.push('\n');
        }
    }

    fn write_children(&mut self, parent: &'a NodeId, depth: usize) {
        let graph = self.graph;
        for edge in graph.outgoing(parent) {
            let Some(child) = graph.node(edge.target()) else {
                continue;
            };
            if !self.visited.insert(child.id()) {
                continue;
            }
            self.write_line(child, depth);
            self.write_children(child.id(), depth + 1);
        }
    }

    fn write_subtree(&mut self, node: &'a VisualizationNode) {
        if !self.visited.insert(node.id()) {
            return;
        }
        self.write_line(node, 1);
        self.write_children(node.id(), 2);
    }
}

/// Exports a graph in the tree dialect, walking outgoing edges from the root.
///
/// Nodes not reachable from the root are emitted as extra first-level subtrees, source-less nodes
/// first; with no edges at all every non-root node becomes a flat child. Edge labels and kinds are
/// not representable and are dropped. Callers are expected to check the graph type first (see
/// [`super::markup_from_graph`]).
pub fn export_mindmap(graph: &VisualizationGraph) -> String {
    let mut writer =
        TreeWriter { graph, visited: HashSet::new(), quoted: 0, out: String::from("mindmap\n") };

    let Some(root) = graph.root_node() else {
        return writer.out;
    };
    writer.write_root(root);
    writer.write_children(root.id(), 1);

    let (sourceless, rest): (Vec<_>, Vec<_>) =
        graph.nodes().iter().partition(|node| !graph.has_incoming(node.id()));
    for node in sourceless.into_iter().chain(rest) {
        writer.write_subtree(node);
    }

    writer.out
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use proptest::prelude::*;

    use super::{export_mindmap, parse_mindmap};
    use crate::format::dsl::parse_text_dsl;
    use crate::model::{
        EdgeId, GraphType, NodeId, NodeKind, VisualizationEdge, VisualizationGraph,
        VisualizationNode,
    };

    fn labels(graph: &VisualizationGraph) -> BTreeSet<(String, bool)> {
        graph.nodes().iter().map(|n| (n.label().to_owned(), n.is_confusion())).collect()
    }

    fn parent_child(graph: &VisualizationGraph) -> BTreeSet<(String, String)> {
        graph
            .edges()
            .iter()
            .map(|edge| {
                let from = graph.node(edge.source()).expect("source").label().to_owned();
                let to = graph.node(edge.target()).expect("target").label().to_owned();
                (from, to)
            })
            .collect()
    }

    #[test]
    fn parses_indented_tree() {
        let outcome = parse_mindmap(
            "mindmap\n    root((Energy))\n        Kinetic\n            Speed\n        ❓ Potential\n",
        );
        assert!(outcome.is_clean(), "{:?}", outcome.diagnostics);
        let graph = outcome.graph;
        assert_eq!(graph.graph_type(), GraphType::Mindmap);
        assert_eq!(graph.metadata().central_concept(), Some("Energy"));
        assert_eq!(
            parent_child(&graph),
            BTreeSet::from([
                ("Energy".to_owned(), "Kinetic".to_owned()),
                ("Kinetic".to_owned(), "Speed".to_owned()),
                ("Energy".to_owned(), "Potential".to_owned()),
            ])
        );
        assert_eq!(
            graph.node_by_label("Potential").map(|n| n.kind()),
            Some(NodeKind::Confusion)
        );
    }

    #[test]
    fn tabs_count_as_four_spaces() {
        let graph = parse_mindmap("mindmap\n\troot((A))\n\t\tB\n        C\n").graph;
        let pairs = parent_child(&graph);
        assert!(pairs.contains(&("A".to_owned(), "B".to_owned())));
        assert!(pairs.contains(&("A".to_owned(), "C".to_owned())));
    }

    #[test]
    fn shaped_nodes_and_classes_are_read() {
        let graph =
            parse_mindmap("mindmap\n  root((Core))\n    a[Square]\n    b(Round):::confusion\n").graph;
        assert!(graph.node_by_label("Square").is_some());
        assert_eq!(graph.node_by_label("Round").map(|n| n.kind()), Some(NodeKind::Confusion));
    }

    #[test]
    fn lines_outside_the_root_attach_to_root_with_diagnostic() {
        let outcome = parse_mindmap("mindmap\n    root((Core))\nStray\n");
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].line_no, 3);
        assert_eq!(
            parent_child(&outcome.graph),
            BTreeSet::from([("Core".to_owned(), "Stray".to_owned())])
        );
    }

    #[test]
    fn exports_canonical_indentation() {
        let graph = parse_text_dsl("Energy -> Kinetic\nKinetic -> Speed", GraphType::Mindmap).graph;
        assert_eq!(
            export_mindmap(&graph),
            "mindmap\n    root((Energy))\n        Kinetic\n            Speed\n"
        );
    }

    #[test]
    fn edgeless_graph_exports_flat_children() {
        let graph = parse_text_dsl("A\nB\nC", GraphType::Mindmap).graph;
        assert_eq!(export_mindmap(&graph), "mindmap\n    root((A))\n        B\n        C\n");
    }

    #[test]
    fn cycles_do_not_loop() {
        let graph = parse_text_dsl("A -> B\nB -> C\nC -> A", GraphType::Mindmap).graph;
        let markup = export_mindmap(&graph);
        assert_eq!(markup.lines().count(), 4);
    }

    #[test]
    fn round_trip_preserves_labels_confusion_and_topology() {
        let source = parse_text_dsl(
            "牛顿第一定律 -> 惯性 [confusion]\n惯性 -> 描述 -> 静止或匀速\n牛顿第一定律 -> f(x) = [a]\n惯性 -> \"quoted\" ::: text\n牛顿第一定律 -> say \"hi\"",
            GraphType::Mindmap,
        )
        .graph;

        let markup = export_mindmap(&source);
        let outcome = parse_mindmap(&markup);
        assert!(outcome.is_clean(), "{markup}\n{:?}", outcome.diagnostics);

        let reparsed = outcome.graph;
        assert_eq!(labels(&source).len(), 6);
        assert_eq!(labels(&reparsed), labels(&source));
        assert_eq!(parent_child(&reparsed), parent_child(&source));
        assert!(reparsed.node_by_label("say \"hi\"").is_some());
        assert_eq!(reparsed.metadata().central_concept(), Some("牛顿第一定律"));
    }

    #[test]
    fn leading_mark_on_plain_node_is_escaped() {
        let source = tree(&[("Root", false), ("❓ Why", false), ("❓ twice", true)], &[0, 0]);
        let markup = export_mindmap(&source);
        assert!(markup.contains("#10067; Why"), "{markup}");

        let reparsed = parse_mindmap(&markup).graph;
        assert_eq!(labels(&reparsed), labels(&source));
        assert_eq!(parent_child(&reparsed), parent_child(&source));
    }

    /// Builds a tree where node `i + 1` hangs under `parents[i]`.
    fn tree(nodes: &[(&str, bool)], parents: &[usize]) -> VisualizationGraph {
        let ids = (0..nodes.len()).map(|idx| NodeId::synthetic("n", idx + 1)).collect::<Vec<_>>();
        let nodes = nodes
            .iter()
            .zip(&ids)
            .map(|((label, confused), id)| {
                let kind = if *confused { NodeKind::Confusion } else { NodeKind::Concept };
                VisualizationNode::new(id.clone(), *label).with_kind(kind)
            })
            .collect::<Vec<_>>();
        let edges = parents
            .iter()
            .enumerate()
            .map(|(idx, parent)| {
                VisualizationEdge::new(
                    EdgeId::synthetic("e", idx + 1),
                    ids[*parent].clone(),
                    ids[idx + 1].clone(),
                )
            })
            .collect();
        let central = nodes.first().map(|node| node.label().to_owned());
        VisualizationGraph::from_parts(GraphType::Mindmap, nodes, edges, central).expect("tree")
    }

    fn label_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-zA-Z0-9惯性静止 ]{1,10}",
            "[a-z()\\[\\]{}\"#:;%❓ ]{1,12}",
            Just("❓ Why".to_owned()),
            Just("a:::confusion".to_owned()),
            Just("%% note".to_owned()),
            Just("::icon(fa fa-book)".to_owned()),
            Just("say #quot;hi#quot;".to_owned()),
        ]
        .prop_map(|label| label.trim().to_owned())
        .prop_filter("labels are non-empty", |label| !label.is_empty())
    }

    fn tree_strategy() -> impl Strategy<Value = (Vec<(String, bool)>, Vec<usize>)> {
        prop::collection::vec((label_strategy(), any::<bool>()), 1..8)
            .prop_map(|nodes| {
                let mut seen = BTreeSet::new();
                nodes.into_iter().filter(|(label, _)| seen.insert(label.clone())).collect::<Vec<_>>()
            })
            .prop_flat_map(|nodes| {
                let parents = (1..nodes.len()).map(|idx| 0..idx).collect::<Vec<_>>();
                (Just(nodes), parents)
            })
    }

    proptest! {
        #[test]
        fn any_labelled_tree_round_trips((nodes, parents) in tree_strategy()) {
            let nodes = nodes.iter().map(|(label, confused)| (label.as_str(), *confused)).collect::<Vec<_>>();
            let source = tree(&nodes, &parents);

            let markup = export_mindmap(&source);
            let outcome = parse_mindmap(&markup);
            prop_assert!(outcome.is_clean(), "{}\n{:?}", markup, outcome.diagnostics);
            prop_assert_eq!(labels(&outcome.graph), labels(&source));
            prop_assert_eq!(parent_child(&outcome.graph), parent_child(&source));
            prop_assert_eq!(
                outcome.graph.metadata().central_concept(),
                source.metadata().central_concept()
            );
        }
    }
}

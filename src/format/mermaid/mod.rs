// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mermaid-ish markup for visualization graphs.
//!
//! Two dialects are read, selected by the first token: the tree-shaped `mindmap` dialect and the
//! generic `graph`/`flowchart` dialect. Export is offered for mindmaps (tree dialect) and for any
//! graph (generic dialect).

pub mod graph;
mod ident;
pub mod mindmap;

use crate::format::{Diagnostic, ParseOutcome};
use crate::model::{GraphType, VisualizationGraph};

pub use graph::{export_graph_dialect, parse_graph_dialect};
pub use mindmap::{export_mindmap, parse_mindmap};

/// Visual prefix placed in front of confusion node labels.
pub const CONFUSION_PREFIX: &str = "❓ ";
/// Class name marking confusion nodes in the generic dialect.
pub const CONFUSION_CLASS: &str = "confusion";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MarkupExportError {
    #[error("tree markup export is only defined for mindmap graphs (got {})", .0.as_str())]
    UnsupportedGraphType(GraphType),
}

/// Strips a leading [`CONFUSION_PREFIX`] (or a bare `❓`) from `label`.
pub(crate) fn strip_confusion_prefix(label: &str) -> (&str, bool) {
    let trimmed = label.trim();
    match trimmed.strip_prefix(CONFUSION_PREFIX.trim_end()) {
        Some(rest) => (rest.trim_start(), true),
        None => (trimmed, false),
    }
}

pub(crate) fn unquote(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .map(str::trim)
        .unwrap_or(trimmed)
}

/// Escapes a label for use inside a quoted node label.
///
/// `"` and `#` become Mermaid entities, and a leading `❓` is written as `#10067;` so it is not
/// read back as the confusion prefix.
pub(crate) fn encode_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for (idx, ch) in label.char_indices() {
        match ch {
            '"' => out.push_str("#quot;"),
            '#' => out.push_str("#35;"),
            '❓' if idx == 0 => out.push_str("#10067;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Reverses [`encode_label`]. Unknown `#...;` sequences are kept verbatim.
pub(crate) fn decode_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('#') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let entity = tail.find(';').and_then(|end| {
            let name = &tail[..end];
            let ch = match name {
                "quot" => Some('"'),
                "amp" => Some('&'),
                _ if !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit()) => {
                    name.parse::<u32>().ok().and_then(char::from_u32)
                }
                _ => None,
            }?;
            Some((ch, end + 1))
        });
        match entity {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('#');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Reads the text inside a node shape: strips the confusion prefix and, for quoted text,
/// decodes entities afterwards so an escaped leading `❓` stays part of the label.
pub(crate) fn read_node_label(inner: &str) -> (String, bool) {
    let trimmed = inner.trim();
    let quoted = trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"');
    let (label, prefixed) = strip_confusion_prefix(unquote(trimmed));
    if quoted {
        (decode_label(label), prefixed)
    } else {
        (label.to_owned(), prefixed)
    }
}

/// Splits a trailing `:::class` off a node token. Only word-like class names count, so quoted
/// labels containing `:::` are left alone.
pub(crate) fn split_class_suffix(token: &str) -> (&str, Option<&str>) {
    let trimmed = token.trim();
    match trimmed.rsplit_once(":::") {
        Some((head, class)) if ident::is_markup_ident(class.trim()) => {
            (head.trim_end(), Some(class.trim()))
        }
        _ => (trimmed, None),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    Mindmap,
    Graph,
}

fn detect_dialect(input: &str) -> Option<Option<Dialect>> {
    let first = input
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("%%"))?;
    let token = first.split_whitespace().next().unwrap_or_default();
    Some(match token {
        "mindmap" => Some(Dialect::Mindmap),
        "graph" | "flowchart" => Some(Dialect::Graph),
        _ => None,
    })
}

/// Parses markup in either dialect.
///
/// Empty input yields an empty mindmap without diagnostics. An unrecognized first token yields an
/// empty graph and a diagnostic.
pub fn graph_from_markup(input: &str) -> ParseOutcome {
    match detect_dialect(input) {
        None => ParseOutcome::default(),
        Some(Some(Dialect::Mindmap)) => parse_mindmap(input),
        Some(Some(Dialect::Graph)) => parse_graph_dialect(input),
        Some(None) => ParseOutcome {
            graph: VisualizationGraph::default(),
            diagnostics: vec![Diagnostic::new(
                0,
                "unrecognized markup: expected `mindmap`, `graph`, or `flowchart` on the first line",
            )],
        },
    }
}

/// Exports a mindmap graph in the tree dialect.
pub fn markup_from_graph(graph: &VisualizationGraph) -> Result<String, MarkupExportError> {
    if graph.graph_type() != GraphType::Mindmap {
        return Err(MarkupExportError::UnsupportedGraphType(graph.graph_type()));
    }
    Ok(export_mindmap(graph))
}

/// Exports any graph in the generic dialect.
pub fn export_graph_markup(graph: &VisualizationGraph) -> String {
    export_graph_dialect(graph)
}

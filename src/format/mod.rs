// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Text surfaces of the visualization graph.
//!
//! The line-oriented relationship DSL and a Mermaid-ish markup subset (`mindmap` tree dialect and
//! `graph`/`flowchart` generic dialect). Parsers never fail: they return a best-effort graph and
//! diagnostics for the caller to display.

use std::fmt;

use crate::model::VisualizationGraph;

pub mod dsl;
pub mod mermaid;

/// A human-readable note about input that was skipped or reinterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line_no: usize,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line_no: usize, message: impl Into<String>) -> Self {
        Self { line_no, message: message.into() }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line_no == 0 {
            f.write_str(&self.message)
        } else {
            write!(f, "line {}: {}", self.line_no, self.message)
        }
    }
}

/// A parsed graph plus the diagnostics collected while parsing it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParseOutcome {
    pub graph: VisualizationGraph,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutcome {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// All diagnostics joined into one displayable string.
    pub fn diagnostic_text(&self) -> Option<String> {
        if self.diagnostics.is_empty() {
            return None;
        }
        Some(self.diagnostics.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n"))
    }
}

pub use dsl::{parse_text_dsl, to_text_dsl, CONFUSION_MARKER};
pub use mermaid::{export_graph_markup, graph_from_markup, markup_from_graph, MarkupExportError};

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use mindtrail::model::VisualizationGraph;

#[derive(Debug, Clone, Copy)]
pub enum Case {
    Small,
    MediumDense,
    LargeLongLabels,
}

impl Case {
    pub fn id(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::MediumDense => "medium_dense",
            Self::LargeLongLabels => "large_long_labels",
        }
    }

    fn shape(self) -> (usize, usize, usize) {
        // (nodes, fan-out, label length)
        match self {
            Self::Small => (12, 3, 12),
            Self::MediumDense => (200, 6, 16),
            Self::LargeLongLabels => (1_000, 4, 64),
        }
    }
}

fn ascii_repeat_to_len(prefix: &str, fill: char, target_len: usize) -> String {
    if prefix.len() >= target_len {
        return prefix[..target_len].to_owned();
    }

    let mut out = String::with_capacity(target_len);
    out.push_str(prefix);
    while out.len() < target_len {
        out.push(fill);
    }
    out
}

fn label(index: usize, len: usize) -> String {
    ascii_repeat_to_len(&format!("concept {index} "), 'x', len)
}

/// A tree of `nodes` concepts in DSL form; every third edge carries a relation label.
pub fn dsl(case: Case) -> String {
    let (nodes, fan_out, len) = case.shape();
    let mut out = String::new();
    for child in 1..nodes {
        let parent = (child - 1) / fan_out;
        out.push_str(&label(parent, len));
        if child % 3 == 0 {
            out.push_str(" -> relates to -> ");
        } else {
            out.push_str(" -> ");
        }
        out.push_str(&label(child, len));
        out.push('\n');
    }
    out
}

pub fn checksum_graph(graph: &VisualizationGraph) -> u64 {
    let mut acc = 0u64;
    for node in graph.nodes() {
        acc = acc.wrapping_mul(131).wrapping_add(node.id().as_str().len() as u64);
        acc = acc.wrapping_mul(131).wrapping_add(node.label().len() as u64);
    }
    for edge in graph.edges() {
        acc = acc.wrapping_mul(131).wrapping_add(edge.source().as_str().len() as u64);
        acc = acc.wrapping_mul(131).wrapping_add(edge.target().as_str().len() as u64);
        acc = acc.wrapping_mul(131).wrapping_add(edge.label().map_or(0, str::len) as u64);
    }
    acc
}

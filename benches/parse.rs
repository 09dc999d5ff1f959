// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mindtrail::format::mermaid::{export_graph_dialect, export_mindmap, parse_graph_dialect, parse_mindmap};
use mindtrail::format::parse_text_dsl;
use mindtrail::model::GraphType;

mod fixtures;

use fixtures::Case;

const CASES: [Case; 3] = [Case::Small, Case::MediumDense, Case::LargeLongLabels];

// Benchmark identity (keep stable):
// - Group names: `format.parse_dsl`, `format.parse_mindmap`, `format.parse_graph`
// - Case IDs come from `fixtures::Case::id` and must not be renamed.
fn benches_parse(c: &mut Criterion) {
    {
        let mut group = c.benchmark_group("format.parse_dsl");
        for case in CASES {
            let text = fixtures::dsl(case);
            group.throughput(Throughput::Elements(text.lines().count() as u64));
            group.bench_function(case.id(), move |b| {
                b.iter(|| {
                    let outcome = parse_text_dsl(black_box(&text), GraphType::Mindmap);
                    black_box(fixtures::checksum_graph(black_box(&outcome.graph)))
                })
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("format.parse_mindmap");
        for case in CASES {
            let graph = parse_text_dsl(&fixtures::dsl(case), GraphType::Mindmap).graph;
            let markup = export_mindmap(&graph);
            group.throughput(Throughput::Elements(graph.nodes().len() as u64));
            group.bench_function(case.id(), move |b| {
                b.iter(|| {
                    let outcome = parse_mindmap(black_box(&markup));
                    black_box(fixtures::checksum_graph(black_box(&outcome.graph)))
                })
            });
        }
        group.finish();
    }

    {
        let mut group = c.benchmark_group("format.parse_graph");
        for case in CASES {
            let graph = parse_text_dsl(&fixtures::dsl(case), GraphType::Conceptmap).graph;
            let markup = export_graph_dialect(&graph);
            group.throughput(Throughput::Elements(graph.edges().len() as u64));
            group.bench_function(case.id(), move |b| {
                b.iter(|| {
                    let outcome = parse_graph_dialect(black_box(&markup));
                    black_box(fixtures::checksum_graph(black_box(&outcome.graph)))
                })
            });
        }
        group.finish();
    }
}

criterion_group!(benches, benches_parse);
criterion_main!(benches);

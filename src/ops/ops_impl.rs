// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Applies a single op to the working graph and records what it touched.
fn apply_graph_op(
    graph: &mut VisualizationGraph,
    op: &GraphOp,
    delta: &mut DeltaBuilder,
) -> Result<(), ApplyError> {
    match op {
        GraphOp::AddNode { node_id, label, kind, position } => {
            let label = label.trim();
            if label.is_empty() {
                return Err(ApplyError::EmptyLabel { node_id: node_id.clone() });
            }
            let mut node = VisualizationNode::new(node_id.clone(), label).with_kind(*kind);
            node.set_position(*position);
            graph.insert_node(node)?;
            delta.record_added(GraphRef::Node(node_id.clone()));
            Ok(())
        }
        GraphOp::UpdateNode { node_id, patch } => {
            let Some(existing) = graph.node_mut(node_id) else {
                return Err(GraphError::MissingNode(node_id.clone()).into());
            };
            let old_label = existing.label().to_owned();

            if let Some(label) = &patch.label {
                let label = label.trim();
                if label.is_empty() {
                    return Err(ApplyError::EmptyLabel { node_id: node_id.clone() });
                }
                existing.set_label(label);
            }
            if let Some(kind) = patch.kind {
                existing.set_kind(kind);
            }
            if let Some(position) = patch.position {
                existing.set_position(Some(position));
            }

            // Keep the central concept pointing at the renamed node.
            if let Some(label) = &patch.label {
                if graph.metadata().central_concept() == Some(old_label.as_str()) {
                    graph.set_central_concept(Some(label.trim()));
                }
            }
            delta.record_updated(GraphRef::Node(node_id.clone()));
            Ok(())
        }
        GraphOp::RemoveNode { node_id } => {
            let removed_edges = graph.remove_node(node_id)?;
            for edge_id in removed_edges {
                delta.record_removed(GraphRef::Edge(edge_id));
            }
            delta.record_removed(GraphRef::Node(node_id.clone()));
            Ok(())
        }
        GraphOp::AddEdge { edge_id, source, target, label, kind } => {
            let label = label.as_deref().map(str::trim).filter(|label| !label.is_empty());
            let edge = VisualizationEdge::new(edge_id.clone(), source.clone(), target.clone())
                .with_label(label)
                .with_kind(*kind);
            graph.insert_edge(edge)?;
            delta.record_added(GraphRef::Edge(edge_id.clone()));
            Ok(())
        }
        GraphOp::UpdateEdge { edge_id, patch } => {
            for endpoint in [&patch.source, &patch.target].into_iter().flatten() {
                if !graph.contains_node(endpoint) {
                    return Err(GraphError::DanglingEdge {
                        edge_id: edge_id.clone(),
                        node_id: endpoint.clone(),
                    }
                    .into());
                }
            }
            let Some(existing) = graph.edge_mut(edge_id) else {
                return Err(GraphError::MissingEdge(edge_id.clone()).into());
            };

            if let Some(source) = &patch.source {
                existing.set_source(source.clone());
            }
            if let Some(target) = &patch.target {
                existing.set_target(target.clone());
            }
            if let Some(label) = &patch.label {
                let label = label.trim();
                existing.set_label((!label.is_empty()).then_some(label));
            }
            if let Some(kind) = patch.kind {
                existing.set_kind(kind);
            }
            delta.record_updated(GraphRef::Edge(edge_id.clone()));
            Ok(())
        }
        GraphOp::RemoveEdge { edge_id } => {
            graph.remove_edge(edge_id)?;
            delta.record_removed(GraphRef::Edge(edge_id.clone()));
            Ok(())
        }
        GraphOp::SetGraphType { graph_type } => {
            if graph.graph_type() != *graph_type {
                graph.set_graph_type(*graph_type);
                delta.record_updated(GraphRef::Metadata);
            }
            Ok(())
        }
        GraphOp::SetCentralConcept { label } => {
            graph.set_central_concept(label.clone());
            delta.record_updated(GraphRef::Metadata);
            Ok(())
        }
        GraphOp::ReplaceGraph { graph: next } => {
            let next = next.as_ref().clone().validated()?;
            record_replacement(graph, &next, delta);
            *graph = next;
            Ok(())
        }
    }
}

/// Diffs two graphs by id. Parsers allocate ids afresh, so a re-parse of the same text produces
/// "updated" entries for nodes whose content moved.
fn record_replacement(
    old: &VisualizationGraph,
    new: &VisualizationGraph,
    delta: &mut DeltaBuilder,
) {
    for node in old.nodes() {
        match new.node(node.id()) {
            None => delta.record_removed(GraphRef::Node(node.id().clone())),
            Some(next) if next != node => delta.record_updated(GraphRef::Node(node.id().clone())),
            Some(_) => {}
        }
    }
    for node in new.nodes() {
        if !old.contains_node(node.id()) {
            delta.record_added(GraphRef::Node(node.id().clone()));
        }
    }

    for edge in old.edges() {
        match new.edge(edge.id()) {
            None => delta.record_removed(GraphRef::Edge(edge.id().clone())),
            Some(next) if next != edge => delta.record_updated(GraphRef::Edge(edge.id().clone())),
            Some(_) => {}
        }
    }
    for edge in new.edges() {
        if old.edge(edge.id()).is_none() {
            delta.record_added(GraphRef::Edge(edge.id().clone()));
        }
    }

    if old.graph_type() != new.graph_type() || old.metadata() != new.metadata() {
        delta.record_updated(GraphRef::Metadata);
    }
}

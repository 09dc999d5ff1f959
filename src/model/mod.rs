// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A session owns a task plan, the canonical visualization graph of the active task, the guided
//! payload parsed from task content, and the interaction log.

pub mod graph;
pub mod ids;
pub mod log;
pub mod payload;
pub mod plan;

pub use graph::{
    EdgeKind, GraphError, GraphMetadata, GraphType, NodeKind, Position, VisualHints,
    VisualizationEdge, VisualizationGraph, VisualizationNode,
};
pub use ids::{EdgeId, Id, IdError, NodeId, TaskId};
pub use log::{actions, ChatMessage, InteractionLog, Role};
pub use payload::{
    ExitTicket, GuidedPayload, KeyIdea, PayloadCache, PracticeQuestion, WhyItMatters,
    BLANK_PLACEHOLDER,
};
pub use plan::{PlanError, Task, TaskPlan, TutorConfig, ViewType};

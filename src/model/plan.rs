// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

use super::graph::{GraphType, VisualizationGraph};
use super::ids::TaskId;

/// Which editor surface a task activates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewType {
    #[default]
    Mindmap,
    Conceptmap,
    Table,
    Prose,
    Math,
}

impl ViewType {
    /// The graph flavor backing this surface, if it is a graph surface.
    pub fn graph_type(self) -> Option<GraphType> {
        match self {
            Self::Mindmap => Some(GraphType::Mindmap),
            Self::Conceptmap => Some(GraphType::Conceptmap),
            Self::Table | Self::Prose | Self::Math => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mindmap => "mindmap",
            Self::Conceptmap => "conceptmap",
            Self::Table => "table",
            Self::Prose => "prose",
            Self::Math => "math",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorConfig {
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub system_instruction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub view_type: ViewType,
    #[serde(default)]
    pub output_goal: String,
    #[serde(default)]
    pub tutor_config: TutorConfig,
    #[serde(default)]
    pub evaluation_criteria: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_graph: Option<VisualizationGraph>,
}

impl Task {
    pub fn new(id: TaskId, title: impl Into<String>, view_type: ViewType) -> Self {
        Self {
            id,
            title: title.into(),
            content: String::new(),
            view_type,
            output_goal: String::new(),
            tutor_config: TutorConfig::default(),
            evaluation_criteria: String::new(),
            template_graph: None,
        }
    }

    /// The graph a task starts from: its template when present, otherwise an empty graph of the
    /// surface's flavor.
    pub fn initial_graph(&self) -> VisualizationGraph {
        let graph_type = self.view_type.graph_type().unwrap_or_default();
        match &self.template_graph {
            Some(template) => {
                let mut graph = template.clone();
                graph.set_graph_type(graph_type);
                graph
            }
            None => VisualizationGraph::new(graph_type),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("task plan must contain at least one task")]
    Empty,
    #[error("duplicate task id in plan: {0}")]
    DuplicateTaskId(TaskId),
    #[error("template graph of task {task_id} is invalid: {reason}")]
    InvalidTemplate { task_id: TaskId, reason: String },
    #[error("task plan is not valid JSON: {0}")]
    Json(String),
}

/// The ordered tasks of one session. Immutable once the session starts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskPlan {
    tasks: Vec<Task>,
}

impl TaskPlan {
    pub fn new(tasks: Vec<Task>) -> Result<Self, PlanError> {
        if tasks.is_empty() {
            return Err(PlanError::Empty);
        }
        let mut tasks = tasks;
        for index in 0..tasks.len() {
            let task_id = tasks[index].id.clone();
            if tasks[..index].iter().any(|task| task.id == task_id) {
                return Err(PlanError::DuplicateTaskId(task_id));
            }
            if let Some(template) = tasks[index].template_graph.take() {
                let template = template.validated().map_err(|err| PlanError::InvalidTemplate {
                    task_id: task_id.clone(),
                    reason: err.to_string(),
                })?;
                tasks[index].template_graph = Some(template);
            }
        }
        Ok(Self { tasks })
    }

    pub fn from_json(input: &str) -> Result<Self, PlanError> {
        #[derive(Deserialize)]
        struct Raw {
            tasks: Vec<Task>,
        }
        let raw: Raw = serde_json::from_str(input).map_err(|err| PlanError::Json(err.to_string()))?;
        Self::new(raw.tasks)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.tasks.len().saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::{PlanError, TaskPlan, ViewType};
    use crate::model::GraphType;

    #[test]
    fn loads_plan_from_json() {
        let plan = TaskPlan::from_json(
            r#"{"tasks": [
                {"id": "t1", "title": "Map forces", "viewType": "mindmap",
                 "tutorConfig": {"tone": "warm", "systemInstruction": "Be Socratic"}},
                {"id": "t2", "title": "Write summary", "viewType": "prose"}
            ]}"#,
        )
        .expect("plan");
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.get(0).map(|t| t.view_type), Some(ViewType::Mindmap));
        assert_eq!(plan.get(0).map(|t| t.tutor_config.tone.as_str()), Some("warm"));
        assert_eq!(plan.get(1).and_then(|t| t.view_type.graph_type()), None);
    }

    #[test]
    fn rejects_empty_and_duplicate_plans() {
        assert_eq!(TaskPlan::from_json(r#"{"tasks": []}"#), Err(PlanError::Empty));
        let err = TaskPlan::from_json(
            r#"{"tasks": [{"id": "t1", "title": "a"}, {"id": "t1", "title": "b"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::DuplicateTaskId(_)));
    }

    #[test]
    fn rejects_templates_with_dangling_edges() {
        let err = TaskPlan::from_json(
            r#"{"tasks": [{"id": "t1", "title": "a", "templateGraph": {
                "type": "mindmap",
                "nodes": [{"id": "n1", "label": "Root"}],
                "edges": [{"id": "e1", "source": "n1", "target": "n2"}]
            }}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::InvalidTemplate { .. }));
    }

    #[test]
    fn initial_graph_uses_template_with_surface_type() {
        let plan = TaskPlan::from_json(
            r#"{"tasks": [{"id": "t1", "title": "a", "viewType": "conceptmap", "templateGraph": {
                "type": "mindmap",
                "nodes": [{"id": "n1", "label": "Root"}],
                "edges": []
            }}]}"#,
        )
        .expect("plan");
        let graph = plan.get(0).expect("task").initial_graph();
        assert_eq!(graph.graph_type(), GraphType::Conceptmap);
        assert_eq!(graph.nodes().len(), 1);
    }
}

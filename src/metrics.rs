// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Engagement profile derived from a finished session's log.
//!
//! Extraction is a pure function of the log and the task count. Lines that cannot be read are
//! skipped; every numeric field is finite and defaults to zero.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{log::parse_action_line, InteractionLog, Role};
use crate::timing::elapsed_between;
use crate::tutor::is_question;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetricsThresholds {
    /// Messages shorter than this many characters are short.
    pub short_message_chars: usize,
    /// Messages longer than this many characters are long.
    pub long_message_chars: usize,
    #[serde(with = "secs")]
    pub long_gap: Duration,
    #[serde(with = "secs")]
    pub short_gap: Duration,
    /// Gaps at or above this are treated as separate sittings and ignored.
    #[serde(with = "secs")]
    pub max_gap: Duration,
}

impl Default for MetricsThresholds {
    fn default() -> Self {
        Self {
            short_message_chars: 10,
            long_message_chars: 200,
            long_gap: Duration::from_secs(5 * 60),
            short_gap: Duration::from_secs(30),
            max_gap: Duration::from_secs(24 * 60 * 60),
        }
    }
}

pub(crate) mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementLevel {
    #[default]
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SurfaceEdits {
    pub graph: usize,
    pub table: usize,
    pub prose: usize,
    pub math: usize,
}

impl SurfaceEdits {
    pub fn total(&self) -> usize {
        self.graph + self.table + self.prose + self.math
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    pub task_count: usize,
    pub learner_message_count: usize,
    pub mean_message_length: f64,
    pub short_message_count: usize,
    pub long_message_count: usize,
    pub question_count: usize,
    pub action_count: usize,
    pub valid_gap_count: usize,
    pub mean_gap_seconds: f64,
    pub long_gap_count: usize,
    pub short_gap_count: usize,
    pub edits: SurfaceEdits,
    pub stuck_count: usize,
    pub done_count: usize,
    pub evaluation_request_count: usize,
    pub tasks_entered: usize,
    pub tasks_completed: usize,
    pub engagement_level: EngagementLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionKind {
    Edit(Surface),
    Stuck,
    Done,
    RequestEvaluation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surface {
    Graph,
    Table,
    Prose,
    Math,
}

/// Keyword rows checked against lower-cased action text, first match wins.
const ACTION_KEYWORDS: &[(&str, ActionKind)] = &[
    ("i'm stuck", ActionKind::Stuck),
    ("i'm done", ActionKind::Done),
    ("request evaluation", ActionKind::RequestEvaluation),
    ("edited graph", ActionKind::Edit(Surface::Graph)),
    ("edited mindmap", ActionKind::Edit(Surface::Graph)),
    ("edited concept map", ActionKind::Edit(Surface::Graph)),
    ("edited table", ActionKind::Edit(Surface::Table)),
    ("edited prose", ActionKind::Edit(Surface::Prose)),
    ("edited document", ActionKind::Edit(Surface::Prose)),
    ("edited math", ActionKind::Edit(Surface::Math)),
    ("edited formula", ActionKind::Edit(Surface::Math)),
];

fn classify_action(text: &str) -> Option<ActionKind> {
    let lowered = text.to_lowercase();
    ACTION_KEYWORDS
        .iter()
        .find(|(keyword, _)| lowered.contains(keyword))
        .map(|(_, kind)| *kind)
}

fn task_number(text: &str, prefix: &str) -> Option<usize> {
    text.trim().strip_prefix(prefix)?.trim().parse().ok()
}

fn mean(total: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let value = total / count as f64;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

pub fn extract_metrics(log: &InteractionLog, task_count: usize) -> EngagementMetrics {
    extract_metrics_with(log, task_count, &MetricsThresholds::default())
}

pub fn extract_metrics_with(
    log: &InteractionLog,
    task_count: usize,
    thresholds: &MetricsThresholds,
) -> EngagementMetrics {
    let mut metrics = EngagementMetrics { task_count, ..EngagementMetrics::default() };

    let mut total_length = 0usize;
    for message in log.messages().iter().filter(|m| m.role == Role::Learner && !m.hidden) {
        let length = message.text.trim().chars().count();
        metrics.learner_message_count += 1;
        total_length += length;
        if length < thresholds.short_message_chars {
            metrics.short_message_count += 1;
        }
        if length > thresholds.long_message_chars {
            metrics.long_message_count += 1;
        }
        if is_question(&message.text) {
            metrics.question_count += 1;
        }
    }
    metrics.mean_message_length = mean(total_length as f64, metrics.learner_message_count);

    let mut previous: Option<DateTime<Utc>> = None;
    let mut total_gap = 0f64;
    let mut entered = BTreeSet::new();
    let mut completed = BTreeSet::new();

    for line in log.actions() {
        let Some((at, text)) = parse_action_line(line) else {
            tracing::debug!(%line, "skipping unreadable action line");
            continue;
        };
        metrics.action_count += 1;

        if let Some(prev) = previous {
            let gap = elapsed_between(prev, at);
            if !gap.is_zero() && gap < thresholds.max_gap {
                metrics.valid_gap_count += 1;
                total_gap += gap.as_secs_f64();
                if gap > thresholds.long_gap {
                    metrics.long_gap_count += 1;
                }
                if gap < thresholds.short_gap {
                    metrics.short_gap_count += 1;
                }
            }
        }
        previous = Some(at);

        if let Some(number) = task_number(text, "entered task") {
            entered.insert(number);
        }
        if let Some(number) = task_number(text, "completed task") {
            completed.insert(number);
        }

        match classify_action(text) {
            Some(ActionKind::Edit(Surface::Graph)) => metrics.edits.graph += 1,
            Some(ActionKind::Edit(Surface::Table)) => metrics.edits.table += 1,
            Some(ActionKind::Edit(Surface::Prose)) => metrics.edits.prose += 1,
            Some(ActionKind::Edit(Surface::Math)) => metrics.edits.math += 1,
            Some(ActionKind::Stuck) => metrics.stuck_count += 1,
            Some(ActionKind::Done) => metrics.done_count += 1,
            Some(ActionKind::RequestEvaluation) => metrics.evaluation_request_count += 1,
            None => {}
        }
    }

    metrics.mean_gap_seconds = mean(total_gap, metrics.valid_gap_count);
    metrics.tasks_entered = entered.len();
    metrics.tasks_completed = completed.len();
    metrics.engagement_level = engagement_level(&metrics);
    metrics
}

fn engagement_level(metrics: &EngagementMetrics) -> EngagementLevel {
    let tasks = metrics.task_count.max(1) as f64;
    let activity = (metrics.learner_message_count + metrics.edits.total()) as f64 / tasks;
    let completion = metrics.tasks_completed as f64 / tasks;

    if completion >= 0.8 && activity >= 5.0 {
        EngagementLevel::High
    } else if completion < 0.5 && activity < 2.0 {
        EngagementLevel::Low
    } else {
        EngagementLevel::Medium
    }
}

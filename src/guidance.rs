// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! When to ask the tutor for unprompted feedback on the learner's graph.
//!
//! Structural milestones (first node, third node with no edges, first edge, any confusion mark)
//! trigger immediately. Inactivity triggers once the idle threshold passes, after which the idle
//! window restarts.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::ops::{EditSource, GraphChange, ProgressSnapshot};
use crate::timing::elapsed_between;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerReason {
    FirstNode,
    ThirdNodeWithoutEdges,
    FirstEdge,
    ConfusionMarked,
    Idle,
}

impl TriggerReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstNode => "first_node",
            Self::ThirdNodeWithoutEdges => "third_node_without_edges",
            Self::FirstEdge => "first_edge",
            Self::ConfusionMarked => "confusion_marked",
            Self::Idle => "idle",
        }
    }
}

impl fmt::Display for TriggerReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps a progress transition to the milestone it crossed, if any.
pub fn structural_trigger(
    previous: &ProgressSnapshot,
    next: &ProgressSnapshot,
) -> Option<TriggerReason> {
    if next.confusion_point_count > previous.confusion_point_count {
        return Some(TriggerReason::ConfusionMarked);
    }
    if previous.total_nodes == 0 && next.total_nodes >= 1 && next.total_edges == 0 {
        return Some(TriggerReason::FirstNode);
    }
    if previous.total_edges == 0 && next.total_edges >= 1 {
        return Some(TriggerReason::FirstEdge);
    }
    if previous.total_nodes < 3 && next.total_nodes >= 3 && next.total_edges == 0 {
        return Some(TriggerReason::ThirdNodeWithoutEdges);
    }
    None
}

/// Idle detection for one task.
///
/// Every task change bumps the generation; polls carrying an older generation are ignored so a
/// timer scheduled for a previous task cannot fire against the new one.
#[derive(Debug, Clone)]
pub struct IdleTimer {
    threshold: Duration,
    last_action: DateTime<Utc>,
    generation: u64,
}

impl IdleTimer {
    pub fn new(threshold: Duration, now: DateTime<Utc>) -> Self {
        Self { threshold, last_action: now, generation: 0 }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    /// Records a structural action.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_action = now;
    }

    /// Starts a new idle window under a new generation.
    pub fn restart(&mut self, now: DateTime<Utc>) -> u64 {
        self.generation += 1;
        self.last_action = now;
        self.generation
    }

    /// Returns `true` when the idle threshold has passed. Firing restarts the window.
    pub fn poll(&mut self, now: DateTime<Utc>, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        if elapsed_between(self.last_action, now) < self.threshold {
            return false;
        }
        self.last_action = now;
        true
    }
}

/// A hidden note for the tutor asking it to nudge the learner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuidanceRequest {
    pub reason: TriggerReason,
    pub prompt: String,
}

fn socratic_nudge(progress: &ProgressSnapshot) -> &'static str {
    if progress.total_nodes == 0 {
        "The map is still empty. Ask the learner what the core idea of this task is."
    } else if progress.total_edges == 0 {
        "There are concepts but no connections yet. Ask the learner how these concepts relate to each other."
    } else {
        "The map is taking shape. Ask the learner what might still be missing or unclear."
    }
}

fn reason_context(reason: TriggerReason) -> &'static str {
    match reason {
        TriggerReason::FirstNode => "The learner just placed their first concept.",
        TriggerReason::ThirdNodeWithoutEdges => {
            "The learner has added several concepts without connecting any of them."
        }
        TriggerReason::FirstEdge => "The learner just drew their first connection.",
        TriggerReason::ConfusionMarked => "The learner marked a concept as confusing.",
        TriggerReason::Idle => "The learner has not changed the map for a while.",
    }
}

/// Composes the guidance note sent to the tutor.
pub fn compose_guidance_prompt(
    reason: TriggerReason,
    progress: &ProgressSnapshot,
    confusion_points: &[String],
) -> String {
    let mut prompt = format!(
        "[System note: {} Current map: {} concepts, {} connections, {} confusion points.",
        reason_context(reason),
        progress.total_nodes,
        progress.total_edges,
        progress.confusion_point_count,
    );
    if !confusion_points.is_empty() {
        prompt.push_str(&format!(" Marked as confusing: {}.", confusion_points.join(", ")));
    }
    prompt.push(' ');
    prompt.push_str(socratic_nudge(progress));
    prompt.push_str(" Reply with one short Socratic question; do not give the answer away.]");
    prompt
}

/// Combines milestone and idle triggers for the active task.
#[derive(Debug, Clone)]
pub struct GuidanceEngine {
    idle: IdleTimer,
}

impl GuidanceEngine {
    pub fn new(idle_threshold: Duration, now: DateTime<Utc>) -> Self {
        Self { idle: IdleTimer::new(idle_threshold, now) }
    }

    pub fn generation(&self) -> u64 {
        self.idle.generation()
    }

    /// Clears idle state for a new task and returns the new generation.
    pub fn restart(&mut self, now: DateTime<Utc>) -> u64 {
        self.idle.restart(now)
    }

    /// Evaluates a graph change. Any learner edit counts as activity; resets never trigger.
    pub fn on_graph_change(
        &mut self,
        change: &GraphChange,
        now: DateTime<Utc>,
    ) -> Option<GuidanceRequest> {
        if change.source == EditSource::Reset {
            return None;
        }
        self.idle.touch(now);

        let reason = structural_trigger(&change.previous, &change.progress)?;
        tracing::debug!(%reason, rev = change.rev, "guidance triggered by edit");
        Some(GuidanceRequest {
            reason,
            prompt: compose_guidance_prompt(
                reason,
                &change.progress,
                change.graph.metadata().confusion_points(),
            ),
        })
    }

    /// Evaluates the idle timer for `generation`.
    pub fn poll_idle(
        &mut self,
        now: DateTime<Utc>,
        generation: u64,
        progress: &ProgressSnapshot,
        confusion_points: &[String],
    ) -> Option<GuidanceRequest> {
        if !self.idle.poll(now, generation) {
            return None;
        }
        tracing::debug!(generation, "guidance triggered by idle timer");
        Some(GuidanceRequest {
            reason: TriggerReason::Idle,
            prompt: compose_guidance_prompt(TriggerReason::Idle, progress, confusion_points),
        })
    }
}

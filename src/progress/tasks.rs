// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Serialize};

use super::{GateGuard, InFlightGate, ProgressError};
use crate::model::{Task, TaskPlan};
use crate::tutor::states_completion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Active,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressReport {
    pub percent_complete: u8,
    pub is_finished: bool,
    pub last_task_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAdvance {
    Entered { from: usize, to: usize },
    /// Moved past the last task; the session is now finished.
    Finished { from: usize },
}

/// Position in the task plan.
#[derive(Debug, Clone)]
pub struct TaskProgress {
    plan: TaskPlan,
    index: usize,
    phase: SessionPhase,
    completion_stated: bool,
    gates: Vec<InFlightGate>,
}

impl TaskProgress {
    /// Starts at `resume_index`, clamped to the plan.
    pub fn new(plan: TaskPlan, resume_index: Option<usize>) -> Self {
        let index = resume_index.unwrap_or(0).min(plan.last_index());
        let gates = (0..plan.len()).map(|_| InFlightGate::new()).collect();
        Self { plan, index, phase: SessionPhase::Active, completion_stated: false, gates }
    }

    pub fn plan(&self) -> &TaskPlan {
        &self.plan
    }

    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn current_task(&self) -> &Task {
        // `TaskPlan` is never empty and `index` is kept in range.
        &self.plan.tasks()[self.index]
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == SessionPhase::Finished
    }

    pub fn is_last_task(&self) -> bool {
        self.index == self.plan.last_index()
    }

    /// Whether the tutor has stated that the current task is complete.
    pub fn completion_stated(&self) -> bool {
        self.completion_stated
    }

    pub fn is_in_flight(&self) -> bool {
        self.gates.get(self.index).is_some_and(InFlightGate::is_busy)
    }

    /// Claims the "done" gate of the current task.
    pub fn begin_done(&self) -> Result<(usize, GateGuard), ProgressError> {
        if self.is_finished() {
            return Err(ProgressError::Finished);
        }
        self.gates
            .get(self.index)
            .and_then(InFlightGate::try_acquire)
            .map(|guard| (self.index, guard))
            .ok_or(ProgressError::InFlight("task"))
    }

    /// Reads a completion-check reply for task `index`. Returns whether it states completion.
    pub fn record_completion_reply(&mut self, index: usize, reply: &str) -> bool {
        if index != self.index || self.is_finished() {
            return false;
        }
        let complete = states_completion(reply);
        if complete {
            self.completion_stated = true;
            tracing::info!(task_index = index, "tutor stated task completion");
        }
        complete
    }

    /// Selects the next task, or finishes the session after the last one.
    pub fn advance(&mut self) -> Result<TaskAdvance, ProgressError> {
        if self.is_finished() {
            return Err(ProgressError::Finished);
        }
        let from = self.index;
        self.completion_stated = false;
        if self.is_last_task() {
            self.phase = SessionPhase::Finished;
            tracing::info!(task_index = from, "session finished");
            return Ok(TaskAdvance::Finished { from });
        }
        self.index += 1;
        tracing::info!(from, to = self.index, "advanced to next task");
        Ok(TaskAdvance::Entered { from, to: self.index })
    }

    /// Back to the first task with a fresh phase.
    pub fn restart(&mut self) {
        self.index = 0;
        self.phase = SessionPhase::Active;
        self.completion_stated = false;
    }

    pub fn report(&self) -> ProgressReport {
        let total = self.plan.len().max(1);
        let percent_complete = if self.is_finished() {
            100
        } else {
            (self.index * 100 / total).min(100) as u8
        };
        ProgressReport {
            percent_complete,
            is_finished: self.is_finished(),
            last_task_index: self.index,
        }
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Step and task progression.
//!
//! Both state machines only move on explicit calls. Tutor verdicts arrive as plain text and are
//! interpreted by the marker and phrase helpers in [`crate::tutor`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub mod steps;
pub mod tasks;

pub use steps::{GuidedStage, GuidedSteps, StepAdvance, StepArtifacts};
pub use tasks::{ProgressReport, SessionPhase, TaskAdvance, TaskProgress};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    #[error("session is finished; no further task changes are accepted")]
    Finished,
    #[error("a request for this {0} is already in flight")]
    InFlight(&'static str),
    #[error("guided step {0} has not been reached yet")]
    StepNotReached(usize),
    #[error("guided step {0} has not been approved yet")]
    StepNotPassed(usize),
    #[error("the current task has no guided steps")]
    NotGuided,
}

/// Re-entrancy guard for one gating decision.
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct InFlightGate {
    busy: Arc<AtomicBool>,
}

impl InFlightGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the gate; `None` while another holder is active.
    pub fn try_acquire(&self) -> Option<GateGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GateGuard { busy: Arc::clone(&self.busy) })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases its gate when dropped, whatever path the request took.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the guard is dropped"]
pub struct GateGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

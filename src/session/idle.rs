// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use tokio::time::{Instant, Interval, MissedTickBehavior};

use super::{LearningSession, TutorTurn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdlePoll {
    /// The learner was active recently enough.
    Quiet,
    /// The idle threshold passed and a nudge was delivered.
    Nudge(TutorTurn),
    /// The task changed or the session finished; the watch is done.
    Stopped,
}

/// Recurring idle check bound to one task.
///
/// Ticks every `idle_poll` and carries the idle generation current at creation, so a watch
/// outliving its task stops instead of nudging the next one. `tick` does not borrow the session,
/// which lets callers `select!` it against learner input.
#[derive(Debug)]
pub struct IdleWatch {
    interval: Interval,
    generation: u64,
}

impl IdleWatch {
    pub(super) fn new(session: &LearningSession) -> Self {
        let period = session.config().idle_poll;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval, generation: session.idle_generation() }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, session: &LearningSession) -> bool {
        !session.is_finished() && session.idle_generation() == self.generation
    }

    /// Waits for the next poll instant.
    pub async fn tick(&mut self) {
        self.interval.tick().await;
    }

    /// Runs one idle check under this watch's generation.
    pub async fn poll(&self, session: &mut LearningSession) -> IdlePoll {
        if !self.is_current(session) {
            return IdlePoll::Stopped;
        }
        match session.poll_idle(self.generation).await {
            Some(turn) => IdlePoll::Nudge(turn),
            None => IdlePoll::Quiet,
        }
    }

    /// Waits for the next tick and polls; returns `Stopped` without waiting once stale.
    pub async fn next(&mut self, session: &mut LearningSession) -> IdlePoll {
        if !self.is_current(session) {
            return IdlePoll::Stopped;
        }
        self.tick().await;
        self.poll(session).await
    }
}

impl LearningSession {
    /// Starts the recurring idle check for the current task.
    pub fn watch_idle(&self) -> IdleWatch {
        IdleWatch::new(self)
    }
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Callbacks into the host application.

use crate::metrics::EngagementMetrics;
use crate::progress::ProgressReport;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("progress sink failed: {0}")]
pub struct HookError(pub String);

pub trait SessionHooks: Send {
    /// Fire-and-forget progress report. Errors are logged by the caller, never surfaced.
    fn report_progress(&mut self, report: ProgressReport) -> Result<(), HookError>;

    /// The tutor service reported that the configured key or model does not exist.
    fn on_api_key_error(&mut self) {}

    /// Hands the final engagement profile to the report generator.
    fn on_session_finished(&mut self, metrics: &EngagementMetrics) {
        let _ = metrics;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl SessionHooks for NoopHooks {
    fn report_progress(&mut self, _report: ProgressReport) -> Result<(), HookError> {
        Ok(())
    }
}

/// Hooks that only write to the log; used by the command-line demo.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHooks;

impl SessionHooks for LoggingHooks {
    fn report_progress(&mut self, report: ProgressReport) -> Result<(), HookError> {
        tracing::info!(
            percent = report.percent_complete,
            finished = report.is_finished,
            task_index = report.last_task_index,
            "progress"
        );
        Ok(())
    }

    fn on_api_key_error(&mut self) {
        tracing::error!("tutor service rejected the api key or model");
    }

    fn on_session_finished(&mut self, metrics: &EngagementMetrics) {
        tracing::info!(
            messages = metrics.learner_message_count,
            tasks_completed = metrics.tasks_completed,
            level = ?metrics.engagement_level,
            "session finished"
        );
    }
}

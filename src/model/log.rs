// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Learner,
    Tutor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
    /// System notes sent on the learner's behalf; never rendered as the learner's words.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

impl ChatMessage {
    pub fn learner(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self { role: Role::Learner, text: text.into(), at, hidden: false }
    }

    pub fn tutor(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self { role: Role::Tutor, text: text.into(), at, hidden: false }
    }

    pub fn system_note(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self { role: Role::Learner, text: text.into(), at, hidden: true }
    }
}

/// Canonical action texts written by the session. The metrics extractor matches on these.
pub mod actions {
    pub const EDITED_GRAPH: &str = "edited graph";
    pub const EDITED_TABLE: &str = "edited table";
    pub const EDITED_PROSE: &str = "edited prose document";
    pub const EDITED_MATH: &str = "edited math formula";
    pub const STUCK: &str = "clicked I'm stuck";
    pub const DONE: &str = "clicked I'm done";
    pub const REQUEST_EVALUATION: &str = "request evaluation";
    pub const SESSION_FINISHED: &str = "session finished";

    pub fn entered_task(number: usize) -> String {
        format!("entered task {number}")
    }

    pub fn completed_task(number: usize) -> String {
        format!("completed task {number}")
    }

    pub fn entered_step(number: usize) -> String {
        format!("entered guided step {number}")
    }
}

/// Append-only transcript plus action lines of one session.
///
/// Action lines have the form `[<RFC 3339 timestamp>] <text>`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InteractionLog {
    #[serde(default)]
    messages: Vec<ChatMessage>,
    #[serde(default)]
    actions: Vec<String>,
}

impl InteractionLog {
    pub fn from_parts(messages: Vec<ChatMessage>, actions: Vec<String>) -> Self {
        Self { messages, actions }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn push_message(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn record_action(&mut self, at: DateTime<Utc>, text: impl AsRef<str>) {
        self.actions.push(format_action_line(at, text.as_ref()));
    }

    /// Visible transcript in order, excluding hidden system notes.
    pub fn visible_messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|message| !message.hidden)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.actions.is_empty()
    }
}

pub fn format_action_line(at: DateTime<Utc>, text: &str) -> String {
    format!("[{}] {text}", at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Splits an action line into its timestamp and text. Returns `None` for malformed lines.
pub fn parse_action_line(line: &str) -> Option<(DateTime<Utc>, &str)> {
    let rest = line.trim_start().strip_prefix('[')?;
    let close = rest.find(']')?;
    let stamp = rest[..close].trim();
    let text = rest[close + 1..].trim();
    let at = DateTime::parse_from_rfc3339(stamp)
        .map(|at| at.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H:%M:%S")
                .map(|naive| naive.and_utc())
        })
        .ok()?;
    Some((at, text))
}

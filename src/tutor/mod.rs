// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The remote tutoring service, seen as one async request/response call.
//!
//! Replies are plain text. Gating decisions look only for the literal pass marker ([`markers`]) or
//! for completion phrases ([`patterns`]).

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::model::ChatMessage;

pub mod markers;
pub mod patterns;
pub mod prompts;

pub use markers::{read_reply, strip_marker, TutorReply, PASS_MARKER};
pub use patterns::{is_question, states_completion, PredicateTable};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorRequest {
    pub transcript: Vec<ChatMessage>,
    pub utterance: String,
    pub system_instruction: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TutorError {
    #[error("tutor request failed: {0}")]
    Network(String),
    #[error("tutor request timed out")]
    Timeout,
    #[error("tutor rejected credentials: {0}")]
    Auth(String),
    /// The configured model or key does not exist on the service.
    #[error("tutor entity not found: {0}")]
    EntityNotFound(String),
    #[error("tutor error: {0}")]
    Other(String),
}

impl TutorError {
    pub fn is_api_key_error(&self) -> bool {
        matches!(self, Self::EntityNotFound(_))
    }
}

#[async_trait]
pub trait TutorChannel: Send + Sync {
    async fn send_message(&self, request: TutorRequest) -> Result<String, TutorError>;
}

/// A tutor that answers from a queue of canned replies and records every request.
///
/// Once the queue is empty it answers with the fallback reply.
#[derive(Debug, Default)]
pub struct ScriptedTutor {
    replies: Mutex<VecDeque<Result<String, TutorError>>>,
    requests: Mutex<Vec<TutorRequest>>,
    fallback: String,
}

impl ScriptedTutor {
    pub fn new(fallback: impl Into<String>) -> Self {
        Self { fallback: fallback.into(), ..Self::default() }
    }

    pub fn with_replies<I, S>(self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for reply in replies {
            self.push_reply(Ok(reply.into()));
        }
        self
    }

    pub fn push_reply(&self, reply: Result<String, TutorError>) {
        self.replies.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push_back(reply);
    }

    pub fn requests(&self) -> Vec<TutorRequest> {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }
}

#[async_trait]
impl TutorChannel for ScriptedTutor {
    async fn send_message(&self, request: TutorRequest) -> Result<String, TutorError> {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(request);
        let next = self.replies.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).pop_front();
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

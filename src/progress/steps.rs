// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Five-stage guided flow for tasks that carry a learning objective.

use std::fmt;
use std::fmt::Write as _;

use super::{GateGuard, InFlightGate, ProgressError};
use crate::model::GuidedPayload;
use crate::tutor::{read_reply, TutorReply};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GuidedStage {
    ClarifyObjective,
    ConsumeMaterial,
    SummarizeKeyIdeas,
    Practice,
    Reflect,
}

impl GuidedStage {
    pub const ALL: [Self; 5] = [
        Self::ClarifyObjective,
        Self::ConsumeMaterial,
        Self::SummarizeKeyIdeas,
        Self::Practice,
        Self::Reflect,
    ];

    /// 1-based position.
    pub fn number(self) -> usize {
        self.index() + 1
    }

    fn index(self) -> usize {
        match self {
            Self::ClarifyObjective => 0,
            Self::ConsumeMaterial => 1,
            Self::SummarizeKeyIdeas => 2,
            Self::Practice => 3,
            Self::Reflect => 4,
        }
    }

    pub fn from_number(number: usize) -> Option<Self> {
        number.checked_sub(1).and_then(|index| Self::ALL.get(index).copied())
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::ClarifyObjective => "Clarify Objective",
            Self::ConsumeMaterial => "Consume Material",
            Self::SummarizeKeyIdeas => "Summarize Key Ideas",
            Self::Practice => "Practice",
            Self::Reflect => "Reflect",
        }
    }

    /// Read/view-only stages that the tutor approves unconditionally.
    pub fn is_lightweight(self) -> bool {
        matches!(self, Self::ClarifyObjective | Self::ConsumeMaterial)
    }

    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }
}

impl fmt::Display for GuidedStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.title())
    }
}

/// What the learner produced in the guided stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepArtifacts {
    /// Blank answers per key idea, in payload order.
    pub blanks: Vec<Vec<String>>,
    /// One answer per practice question, in payload order.
    pub practice_answers: Vec<String>,
    pub reflection: String,
}

impl StepArtifacts {
    pub fn set_blank(&mut self, idea: usize, blank: usize, answer: impl Into<String>) {
        if self.blanks.len() <= idea {
            self.blanks.resize_with(idea + 1, Vec::new);
        }
        let answers = &mut self.blanks[idea];
        if answers.len() <= blank {
            answers.resize_with(blank + 1, String::new);
        }
        answers[blank] = answer.into();
    }

    pub fn set_practice_answer(&mut self, question: usize, answer: impl Into<String>) {
        if self.practice_answers.len() <= question {
            self.practice_answers.resize_with(question + 1, String::new);
        }
        self.practice_answers[question] = answer.into();
    }

    /// Renders the work relevant to `stage` for a verification request.
    pub fn describe(&self, stage: GuidedStage, payload: &GuidedPayload) -> String {
        let mut out = String::new();
        match stage {
            GuidedStage::ClarifyObjective => {
                if let Some(objective) = &payload.learning_objective {
                    let _ = writeln!(out, "Learning objective shown: {objective}");
                }
            }
            GuidedStage::ConsumeMaterial => {
                let why = &payload.why_it_matters;
                if let Some(anchor) = &why.meaning_anchor {
                    let _ = writeln!(out, "Meaning anchor shown: {anchor}");
                }
                if let Some(organizer) = &why.advance_organizer {
                    let _ = writeln!(out, "Advance organizer shown: {organizer}");
                }
            }
            GuidedStage::SummarizeKeyIdeas => {
                for (index, idea) in payload.key_ideas.iter().enumerate() {
                    let answers = self.blanks.get(index).map(Vec::as_slice).unwrap_or_default();
                    let _ = writeln!(out, "Key idea {}: {}", index + 1, idea.fill(answers));
                    if !idea.blanks.is_empty() {
                        let _ = writeln!(out, "  accepted answers: {}", idea.blanks.join(", "));
                    }
                }
            }
            GuidedStage::Practice => {
                for (index, question) in payload.practice_questions.iter().enumerate() {
                    let answer = self
                        .practice_answers
                        .get(index)
                        .map(|answer| answer.trim())
                        .filter(|answer| !answer.is_empty())
                        .unwrap_or("(no answer)");
                    let _ = writeln!(out, "Question {}: {}", index + 1, question.question);
                    let _ = writeln!(out, "  learner answer: {answer}");
                    if let Some(correct) = &question.correct_answer {
                        let _ = writeln!(out, "  reference answer: {correct}");
                    }
                }
            }
            GuidedStage::Reflect => {
                if let Some(ticket) = &payload.exit_ticket {
                    let _ = writeln!(out, "Exit ticket: {}", ticket.question);
                }
                let reflection = self.reflection.trim();
                let _ = writeln!(
                    out,
                    "  learner reflection: {}",
                    if reflection.is_empty() { "(empty)" } else { reflection }
                );
            }
        }
        out
    }
}

/// Result of moving past an approved stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAdvance {
    Entered(GuidedStage),
    /// The last stage was approved; the task flow takes over.
    Completed,
}

/// Guided-stage state for the current task.
#[derive(Debug, Clone)]
pub struct GuidedSteps {
    current: GuidedStage,
    reached: GuidedStage,
    passed: [bool; 5],
    artifacts: StepArtifacts,
    gates: [InFlightGate; 5],
}

impl Default for GuidedSteps {
    fn default() -> Self {
        Self::new()
    }
}

impl GuidedSteps {
    pub fn new() -> Self {
        Self {
            current: GuidedStage::ClarifyObjective,
            reached: GuidedStage::ClarifyObjective,
            passed: [false; 5],
            artifacts: StepArtifacts::default(),
            gates: Default::default(),
        }
    }

    pub fn current(&self) -> GuidedStage {
        self.current
    }

    /// The furthest stage entered so far.
    pub fn reached(&self) -> GuidedStage {
        self.reached
    }

    pub fn is_passed(&self, stage: GuidedStage) -> bool {
        self.passed[stage.index()]
    }

    /// Whether the "advance" affordance is offered for the current stage.
    pub fn can_advance(&self) -> bool {
        self.is_passed(self.current)
    }

    pub fn artifacts(&self) -> &StepArtifacts {
        &self.artifacts
    }

    pub fn artifacts_mut(&mut self) -> &mut StepArtifacts {
        &mut self.artifacts
    }

    pub fn is_in_flight(&self, stage: GuidedStage) -> bool {
        self.gates[stage.index()].is_busy()
    }

    /// Re-enters any stage up to the furthest reached one. Approvals and artifacts are kept.
    pub fn enter(&mut self, stage: GuidedStage) -> Result<(), ProgressError> {
        if stage > self.reached {
            return Err(ProgressError::StepNotReached(stage.number()));
        }
        self.current = stage;
        Ok(())
    }

    /// Claims the "done" gate of the current stage.
    pub fn begin_done(&self) -> Result<(GuidedStage, GateGuard), ProgressError> {
        let stage = self.current;
        self.gates[stage.index()]
            .try_acquire()
            .map(|guard| (stage, guard))
            .ok_or(ProgressError::InFlight("guided step"))
    }

    /// Reads a verification reply for `stage`. The marker decides approval and never reaches the
    /// returned display text.
    pub fn record_reply(&mut self, stage: GuidedStage, reply: &str, marker: &str) -> TutorReply {
        let reply = read_reply(reply, marker);
        if reply.passed {
            self.passed[stage.index()] = true;
            tracing::info!(step = stage.number(), "guided step approved");
        } else {
            tracing::debug!(step = stage.number(), "guided step not approved yet");
        }
        reply
    }

    /// Moves past the current, approved stage.
    pub fn advance(&mut self) -> Result<StepAdvance, ProgressError> {
        if !self.can_advance() {
            return Err(ProgressError::StepNotPassed(self.current.number()));
        }
        let Some(next) = self.current.next() else {
            return Ok(StepAdvance::Completed);
        };
        self.current = next;
        self.reached = self.reached.max(next);
        Ok(StepAdvance::Entered(next))
    }
}

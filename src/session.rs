// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! One learner's session: the single owner of all mutable progression state.
//!
//! Every user action enters through a `LearningSession` method. The only suspension point is the
//! tutor call; replies are appended to the transcript before any gating state changes.

mod idle;

use std::sync::Arc;

use crate::config::{ConfigError, SessionConfig};
use crate::format::{self, to_text_dsl};
use crate::guidance::{GuidanceEngine, GuidanceRequest};
use crate::metrics::{extract_metrics_with, EngagementMetrics};
use crate::model::{actions, ChatMessage, GuidedPayload, InteractionLog, PayloadCache, Task, TaskPlan, ViewType};
use crate::ops::{ApplyError, GraphChange, GraphEditor, GraphOp, MarkupApply, ProgressSnapshot};
use crate::progress::{
    GuidedStage, GuidedSteps, ProgressError, ProgressReport, StepAdvance, StepArtifacts, TaskAdvance,
    TaskProgress,
};
use crate::store::{ResumeSlot, SessionHooks};
use crate::timing::{Clock, Debouncer};
use crate::tutor::{prompts, strip_marker, TutorChannel, TutorError, TutorRequest};

pub use idle::{IdlePoll, IdleWatch};

/// Shown in place of a tutor reply when the tutor call fails.
pub const TUTOR_APOLOGY: &str =
    "Sorry, I could not reach the tutor just now. Please try again in a moment.";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Progress(#[from] ProgressError),
    #[error(transparent)]
    Apply(#[from] ApplyError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("the current task uses the {0} editor, not a graph")]
    NotGraphSurface(&'static str),
    #[error("the current task uses the graph editor; edit the graph instead")]
    GraphSurface,
    #[error("the current task uses guided steps; finish them instead")]
    GuidedTask,
    #[error("message is empty")]
    EmptyMessage,
}

/// What the learner sees after one tutor call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorTurn {
    pub text: String,
    /// `false` when the call failed and `text` is the apology.
    pub delivered: bool,
}

/// Result of a graph edit from any surface.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphEdit {
    /// `None` when unreadable markup left the graph untouched.
    pub change: Option<GraphChange>,
    pub diagnostic: Option<String>,
    /// The tutor's answer to a guidance note triggered by this edit.
    pub guidance: Option<TutorTurn>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepVerdict {
    pub stage: GuidedStage,
    pub reply: TutorTurn,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskVerdict {
    pub task_index: usize,
    pub reply: TutorTurn,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskTransition {
    pub advance: TaskAdvance,
    pub reply: TutorTurn,
    /// Present once the session has finished.
    pub metrics: Option<EngagementMetrics>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    Entered(GuidedStage),
    /// The last stage was approved and the task advanced.
    TaskAdvanced(TaskTransition),
}

/// A debounced re-render of the diagram view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFrame {
    pub markup: String,
    pub coalesced: usize,
}

pub struct LearningSession {
    config: SessionConfig,
    tutor: Arc<dyn TutorChannel>,
    slot: Box<dyn ResumeSlot>,
    hooks: Box<dyn SessionHooks>,
    clock: Arc<dyn Clock>,
    tasks: TaskProgress,
    editor: GraphEditor,
    guidance: GuidanceEngine,
    steps: GuidedSteps,
    payloads: PayloadCache,
    render: Debouncer,
    surface_text: String,
    log: InteractionLog,
    final_metrics: Option<EngagementMetrics>,
}

impl std::fmt::Debug for LearningSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningSession")
            .field("task_index", &self.tasks.current_index())
            .field("phase", &self.tasks.phase())
            .field("step", &self.steps.current())
            .field("rev", &self.editor.rev())
            .field("messages", &self.log.messages().len())
            .finish_non_exhaustive()
    }
}

impl LearningSession {
    /// Opens a session at the stored resume index, clamped to the plan.
    pub fn new(
        plan: TaskPlan,
        config: SessionConfig,
        tutor: Arc<dyn TutorChannel>,
        slot: Box<dyn ResumeSlot>,
        hooks: Box<dyn SessionHooks>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let resume = match slot.read() {
            Ok(resume) => resume,
            Err(err) => {
                tracing::warn!(error = %err, "resume slot unreadable; starting at the first task");
                None
            }
        };
        let now = clock.now();
        let tasks = TaskProgress::new(plan, resume);
        let editor = GraphEditor::new(tasks.current_task().initial_graph());
        let guidance = GuidanceEngine::new(config.idle_threshold, now);
        let render = Debouncer::new(config.render_debounce);

        let mut session = Self {
            config,
            tutor,
            slot,
            hooks,
            clock,
            tasks,
            editor,
            guidance,
            steps: GuidedSteps::new(),
            payloads: PayloadCache::default(),
            render,
            surface_text: String::new(),
            log: InteractionLog::default(),
            final_metrics: None,
        };
        let index = session.tasks.current_index();
        session.log.record_action(now, actions::entered_task(index + 1));
        tracing::info!(task_index = index, tasks = session.tasks.plan().len(), "session opened");
        Ok(session)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn log(&self) -> &InteractionLog {
        &self.log
    }

    pub fn plan(&self) -> &TaskPlan {
        self.tasks.plan()
    }

    pub fn current_task(&self) -> &Task {
        self.tasks.current_task()
    }

    pub fn current_task_index(&self) -> usize {
        self.tasks.current_index()
    }

    pub fn is_finished(&self) -> bool {
        self.tasks.is_finished()
    }

    pub fn editor(&self) -> &GraphEditor {
        &self.editor
    }

    pub fn graph_progress(&self) -> ProgressSnapshot {
        self.editor.progress()
    }

    pub fn steps(&self) -> &GuidedSteps {
        &self.steps
    }

    /// Whether the tutor has stated the current non-guided task complete.
    pub fn completion_stated(&self) -> bool {
        self.tasks.completion_stated()
    }

    pub fn progress_report(&self) -> ProgressReport {
        self.tasks.report()
    }

    /// Metrics handed to the report generator when the session finished.
    pub fn final_metrics(&self) -> Option<&EngagementMetrics> {
        self.final_metrics.as_ref()
    }

    pub fn engagement_metrics(&self) -> EngagementMetrics {
        extract_metrics_with(&self.log, self.tasks.plan().len(), &self.config.metrics)
    }

    /// The guided payload of the current task, when it has a learning objective.
    pub fn guided_payload(&mut self) -> Option<GuidedPayload> {
        let content = &self.tasks.current_task().content;
        self.payloads.get_or_parse(content).filter(|payload| payload.is_guided()).cloned()
    }

    pub fn is_guided(&mut self) -> bool {
        self.guided_payload().is_some()
    }

    pub fn step_artifacts_mut(&mut self) -> &mut StepArtifacts {
        self.steps.artifacts_mut()
    }

    pub fn idle_generation(&self) -> u64 {
        self.guidance.generation()
    }

    // --- Graph surface ---

    /// Applies direct editor ops against `base_rev`.
    pub async fn apply_graph_ops(
        &mut self,
        base_rev: u64,
        ops: &[GraphOp],
    ) -> Result<GraphEdit, SessionError> {
        self.ensure_graph_surface()?;
        let change = self.editor.apply_ops(base_rev, ops)?;
        Ok(self.after_graph_change(change, None).await)
    }

    /// Replaces the graph from the text DSL editor.
    pub async fn edit_dsl(&mut self, text: &str) -> Result<GraphEdit, SessionError> {
        self.ensure_graph_surface()?;
        let change = self.editor.apply_text_dsl(text);
        let diagnostic = self.editor.last_diagnostic().map(str::to_owned);
        Ok(self.after_graph_change(change, diagnostic).await)
    }

    /// Replaces the graph from the diagram-code editor. Unreadable markup keeps the graph.
    pub async fn edit_markup(&mut self, markup: &str) -> Result<GraphEdit, SessionError> {
        self.ensure_graph_surface()?;
        let applied = self.editor.apply_markup(markup);
        let diagnostic = self.editor.last_diagnostic().map(str::to_owned);
        match applied {
            MarkupApply::Applied(change) => Ok(self.after_graph_change(change, diagnostic).await),
            MarkupApply::Kept { .. } => Ok(GraphEdit { change: None, diagnostic, guidance: None }),
        }
    }

    /// Text shown in the DSL editor for the current graph.
    pub fn dsl_text(&self) -> String {
        to_text_dsl(self.editor.graph())
    }

    /// Records an edit on a table, prose, or math surface.
    pub fn edit_surface(&mut self, content: impl Into<String>) -> Result<(), SessionError> {
        self.ensure_active()?;
        let action = match self.tasks.current_task().view_type {
            ViewType::Table => actions::EDITED_TABLE,
            ViewType::Prose => actions::EDITED_PROSE,
            ViewType::Math => actions::EDITED_MATH,
            ViewType::Mindmap | ViewType::Conceptmap => {
                return Err(SessionError::GraphSurface);
            }
        };
        self.surface_text = content.into();
        let now = self.clock.now();
        self.log.record_action(now, action);
        Ok(())
    }

    /// Flushes a pending diagram re-render once the debounce window has passed.
    pub fn poll_render(&mut self) -> Option<RenderFrame> {
        let coalesced = self.render.poll(self.clock.now())?;
        Some(RenderFrame { markup: format::export_graph_markup(self.editor.graph()), coalesced })
    }

    /// Runs the idle check scheduled under `generation`.
    pub async fn poll_idle(&mut self, generation: u64) -> Option<TutorTurn> {
        if self.tasks.is_finished() || !self.is_graph_surface() {
            return None;
        }
        let now = self.clock.now();
        let progress = self.editor.progress();
        let confusion = self.editor.graph().metadata().confusion_points().to_vec();
        let request = self.guidance.poll_idle(now, generation, &progress, &confusion)?;
        Some(self.send_guidance(request).await)
    }

    // --- Conversation ---

    pub async fn send_learner_message(&mut self, text: &str) -> Result<TutorTurn, SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let instruction = prompts::chat(self.tasks.current_task(), &self.config.language);
        let message = ChatMessage::learner(text, self.clock.now());
        Ok(self.converse(message, instruction).await)
    }

    pub async fn mark_stuck(&mut self) -> Result<TutorTurn, SessionError> {
        self.ensure_active()?;
        let now = self.clock.now();
        self.log.record_action(now, actions::STUCK);
        let instruction =
            prompts::stuck(self.tasks.current_task(), &self.current_work(), &self.config.language);
        Ok(self.converse(ChatMessage::learner("I'm stuck.", now), instruction).await)
    }

    pub async fn request_evaluation(&mut self) -> Result<TutorTurn, SessionError> {
        self.ensure_active()?;
        let now = self.clock.now();
        self.log.record_action(now, actions::REQUEST_EVALUATION);
        let instruction = prompts::evaluation(
            self.tasks.current_task(),
            &self.current_work(),
            &self.config.language,
        );
        let message = ChatMessage::learner("Please evaluate my work.", now);
        Ok(self.converse(message, instruction).await)
    }

    // --- Guided steps ---

    /// Asks the tutor to verify the current guided step.
    pub async fn step_done(&mut self) -> Result<StepVerdict, SessionError> {
        self.ensure_active()?;
        let payload = self.guided_payload().ok_or(ProgressError::NotGuided)?;
        let (stage, _guard) = self.steps.begin_done()?;

        let now = self.clock.now();
        self.log.record_action(now, actions::DONE);
        let artifacts = self.steps.artifacts().describe(stage, &payload);
        let instruction = prompts::step_verification(
            self.tasks.current_task(),
            stage.number(),
            stage.title(),
            stage.is_lightweight(),
            &artifacts,
            &self.config.pass_marker,
            &self.config.language,
        );
        let utterance = format!("I finished step {}: {}.", stage.number(), stage.title());
        let message = ChatMessage::learner(utterance, now);

        let (reply, raw) = self.converse_raw(message, instruction).await;
        let passed = match raw {
            Some(raw) => self.steps.record_reply(stage, &raw, &self.config.pass_marker).passed,
            None => false,
        };
        Ok(StepVerdict { stage, reply, passed })
    }

    /// Moves past the approved current step. Past the last step the task advances.
    pub async fn advance_step(&mut self) -> Result<StepOutcome, SessionError> {
        self.ensure_active()?;
        match self.steps.advance()? {
            StepAdvance::Entered(stage) => {
                let now = self.clock.now();
                self.log.record_action(now, actions::entered_step(stage.number()));
                tracing::info!(step = stage.number(), "entered guided step");
                Ok(StepOutcome::Entered(stage))
            }
            StepAdvance::Completed => {
                tracing::info!(task_index = self.tasks.current_index(), "guided steps completed");
                Ok(StepOutcome::TaskAdvanced(self.advance_task().await?))
            }
        }
    }

    /// Re-enters a step that was already reached.
    pub fn enter_step(&mut self, stage: GuidedStage) -> Result<(), SessionError> {
        self.ensure_active()?;
        self.steps.enter(stage)?;
        Ok(())
    }

    // --- Tasks ---

    /// Asks the tutor whether the current non-guided task is complete.
    pub async fn task_done(&mut self) -> Result<TaskVerdict, SessionError> {
        self.ensure_active()?;
        if self.is_guided() {
            return Err(SessionError::GuidedTask);
        }
        let (task_index, _guard) = self.tasks.begin_done()?;

        let now = self.clock.now();
        self.log.record_action(now, actions::DONE);
        let instruction = prompts::completion_check(
            self.tasks.current_task(),
            &self.current_work(),
            &self.config.language,
        );
        let message = ChatMessage::learner("I'm done with this task.", now);

        let (reply, raw) = self.converse_raw(message, instruction).await;
        let complete =
            raw.is_some_and(|raw| self.tasks.record_completion_reply(task_index, &raw));
        Ok(TaskVerdict { task_index, reply, complete })
    }

    /// Moves to the next task, or finishes the session after the last one.
    pub async fn advance_task(&mut self) -> Result<TaskTransition, SessionError> {
        let previous = self.tasks.current_task().clone();
        let previous_work = self.current_work();
        let advance = self.tasks.advance()?;
        let now = self.clock.now();

        match advance {
            TaskAdvance::Entered { from, to } => {
                self.log.record_action(now, actions::completed_task(from + 1));
                self.reset_task_state();
                self.log.record_action(now, actions::entered_task(to + 1));
                if let Err(err) = self.slot.write(to) {
                    tracing::warn!(error = %err, task_index = to, "failed to persist resume index");
                }
                self.report_progress();

                let instruction = prompts::transition(
                    &previous,
                    &previous_work,
                    self.tasks.current_task(),
                    &self.config.language,
                );
                let note = ChatMessage::system_note(
                    format!("[System note: the learner moved on to \"{}\".]", self.tasks.current_task().title),
                    now,
                );
                let reply = self.converse(note, instruction).await;
                Ok(TaskTransition { advance, reply, metrics: None })
            }
            TaskAdvance::Finished { from } => {
                self.log.record_action(now, actions::completed_task(from + 1));
                self.log.record_action(now, actions::SESSION_FINISHED);
                self.render.cancel();
                self.guidance.restart(now);
                if let Err(err) = self.slot.clear() {
                    tracing::warn!(error = %err, "failed to clear resume slot");
                }
                self.report_progress();

                let instruction = prompts::closing(&previous, &previous_work, &self.config.language);
                let note = ChatMessage::system_note("[System note: the learner finished the session.]", now);
                let reply = self.converse(note, instruction).await;

                let metrics = self.engagement_metrics();
                self.hooks.on_session_finished(&metrics);
                self.final_metrics = Some(metrics.clone());
                Ok(TaskTransition { advance, reply, metrics: Some(metrics) })
            }
        }
    }

    /// Back to the first task with an empty log and a cleared resume slot.
    pub fn restart(&mut self) {
        if let Err(err) = self.slot.clear() {
            tracing::warn!(error = %err, "failed to clear resume slot");
        }
        self.tasks.restart();
        self.log = InteractionLog::default();
        self.final_metrics = None;
        self.reset_task_state();
        let now = self.clock.now();
        self.log.record_action(now, actions::entered_task(1));
        self.report_progress();
        tracing::info!("session restarted");
    }

    // --- Internals ---

    fn is_graph_surface(&self) -> bool {
        self.tasks.current_task().view_type.graph_type().is_some()
    }

    fn ensure_active(&self) -> Result<(), SessionError> {
        if self.tasks.is_finished() {
            return Err(ProgressError::Finished.into());
        }
        Ok(())
    }

    fn ensure_graph_surface(&self) -> Result<(), SessionError> {
        self.ensure_active()?;
        if !self.is_graph_surface() {
            return Err(SessionError::NotGraphSurface(self.tasks.current_task().view_type.as_str()));
        }
        Ok(())
    }

    /// The learner's work on the current surface, as text for the tutor.
    fn current_work(&self) -> String {
        if self.is_graph_surface() {
            to_text_dsl(self.editor.graph())
        } else {
            self.surface_text.clone()
        }
    }

    fn reset_task_state(&mut self) {
        let now = self.clock.now();
        let graph = self.tasks.current_task().initial_graph();
        self.editor.reset(graph);
        self.steps = GuidedSteps::new();
        self.payloads.clear();
        self.render.cancel();
        self.surface_text.clear();
        let generation = self.guidance.restart(now);
        tracing::debug!(task_index = self.tasks.current_index(), generation, "per-task state reset");
    }

    fn report_progress(&mut self) {
        let report = self.tasks.report();
        if let Err(err) = self.hooks.report_progress(report) {
            tracing::warn!(error = %err, percent = report.percent_complete, "progress report failed");
        }
    }

    async fn after_graph_change(
        &mut self,
        change: GraphChange,
        diagnostic: Option<String>,
    ) -> GraphEdit {
        let now = self.clock.now();
        self.log.record_action(now, actions::EDITED_GRAPH);
        self.render.request(now);

        let request = self.guidance.on_graph_change(&change, now);
        let guidance = match request {
            Some(request) => Some(self.send_guidance(request).await),
            None => None,
        };
        GraphEdit { change: Some(change), diagnostic, guidance }
    }

    async fn send_guidance(&mut self, request: GuidanceRequest) -> TutorTurn {
        tracing::info!(reason = %request.reason, "sending guidance note");
        let instruction = prompts::chat(self.tasks.current_task(), &self.config.language);
        let note = ChatMessage::system_note(request.prompt, self.clock.now());
        self.converse(note, instruction).await
    }

    async fn converse(&mut self, message: ChatMessage, instruction: String) -> TutorTurn {
        self.converse_raw(message, instruction).await.0
    }

    /// Sends `message` and appends the reply. Returns the displayed turn and, when the call
    /// succeeded, the raw reply.
    async fn converse_raw(
        &mut self,
        message: ChatMessage,
        instruction: String,
    ) -> (TutorTurn, Option<String>) {
        let request = TutorRequest {
            transcript: self.log.messages().to_vec(),
            utterance: message.text.clone(),
            system_instruction: instruction,
            language: self.config.language.clone(),
        };
        self.log.push_message(message);

        let result = self.tutor.send_message(request).await;
        let now = self.clock.now();
        match result {
            Ok(raw) => {
                let text = strip_marker(&raw, &self.config.pass_marker);
                self.log.push_message(ChatMessage::tutor(text.clone(), now));
                (TutorTurn { text, delivered: true }, Some(raw))
            }
            Err(err) => {
                self.on_tutor_error(&err);
                self.log.push_message(ChatMessage::tutor(TUTOR_APOLOGY, now));
                (TutorTurn { text: TUTOR_APOLOGY.to_owned(), delivered: false }, None)
            }
        }
    }

    fn on_tutor_error(&mut self, err: &TutorError) {
        tracing::warn!(error = %err, task_index = self.tasks.current_index(), "tutor call failed");
        if err.is_api_key_error() {
            self.hooks.on_api_key_error();
        }
    }
}

#[cfg(test)]
mod tests;

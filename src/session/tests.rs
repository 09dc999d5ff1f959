// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{TimeZone, Utc};

use super::{IdlePoll, LearningSession, SessionError, StepOutcome, TUTOR_APOLOGY};
use crate::config::SessionConfig;
use crate::metrics::EngagementMetrics;
use crate::model::{actions, NodeId, Role, Task, TaskId, TaskPlan, ViewType};
use crate::ops::GraphOp;
use crate::progress::{GuidedStage, ProgressError, ProgressReport, TaskAdvance};
use crate::store::{HookError, MemorySlot, ResumeSlot, SessionHooks, StoreError};
use crate::timing::ManualClock;
use crate::tutor::{ScriptedTutor, TutorError};

#[derive(Debug, Default)]
struct HookLog {
    reports: Vec<ProgressReport>,
    api_key_errors: usize,
    finished: Option<EngagementMetrics>,
}

#[derive(Debug, Clone, Default)]
struct RecordingHooks {
    log: Arc<Mutex<HookLog>>,
}

impl SessionHooks for RecordingHooks {
    fn report_progress(&mut self, report: ProgressReport) -> Result<(), HookError> {
        self.log.lock().expect("hook log").reports.push(report);
        Err(HookError("sink offline".to_owned()))
    }

    fn on_api_key_error(&mut self) {
        self.log.lock().expect("hook log").api_key_errors += 1;
    }

    fn on_session_finished(&mut self, metrics: &EngagementMetrics) {
        self.log.lock().expect("hook log").finished = Some(metrics.clone());
    }
}

/// Resume slot whose contents stay observable after the session takes ownership.
#[derive(Debug, Clone, Default)]
struct SharedSlot {
    value: Arc<Mutex<Option<usize>>>,
}

impl ResumeSlot for SharedSlot {
    fn read(&self) -> Result<Option<usize>, StoreError> {
        Ok(*self.value.lock().expect("slot"))
    }

    fn write(&mut self, index: usize) -> Result<(), StoreError> {
        *self.value.lock().expect("slot") = Some(index);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        *self.value.lock().expect("slot") = None;
        Ok(())
    }
}

const GUIDED_CONTENT: &str = r#"{
    "learningObjective": "Explain Newton's first law",
    "whyItMatters": {"meaning_anchor": "Why a bus passenger lurches forward"},
    "keyIdeas": [{"text": "An object keeps moving unless a ___ acts on it", "blanks": ["force"]}],
    "practiceQuestions": [{"question": "What keeps a puck sliding?", "correctAnswer": "inertia"}],
    "exitTicket": {"question": "In one sentence, what is inertia?"}
}"#;

fn task(id: &str, view_type: ViewType) -> Task {
    Task::new(TaskId::new(id).expect("task id"), format!("Task {id}"), view_type)
}

fn plan() -> TaskPlan {
    let mut guided = task("t2", ViewType::Prose);
    guided.content = GUIDED_CONTENT.to_owned();
    TaskPlan::new(vec![task("t1", ViewType::Mindmap), guided, task("t3", ViewType::Table)])
        .expect("plan")
}

struct Harness {
    session: LearningSession,
    tutor: Arc<ScriptedTutor>,
    clock: ManualClock,
    hooks: RecordingHooks,
    slot: SharedSlot,
}

fn harness_with(tutor: ScriptedTutor, resume: Option<usize>) -> Harness {
    let tutor = Arc::new(tutor);
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("start"));
    let hooks = RecordingHooks::default();
    let slot = SharedSlot::default();
    *slot.value.lock().expect("slot") = resume;
    let session = LearningSession::new(
        plan(),
        SessionConfig::default(),
        tutor.clone(),
        Box::new(slot.clone()),
        Box::new(hooks.clone()),
        Arc::new(clock.clone()),
    )
    .expect("session");
    Harness { session, tutor, clock, hooks, slot }
}

fn harness() -> Harness {
    harness_with(ScriptedTutor::new("Tell me more."), None)
}

fn node(id: &str) -> NodeId {
    NodeId::new(id).expect("node id")
}

#[tokio::test]
async fn first_node_sends_hidden_guidance_note() {
    let mut h = harness();
    let rev = h.session.editor().rev();
    let edit = h
        .session
        .apply_graph_ops(rev, &[GraphOp::add_node(node("n1"), "Inertia")])
        .await
        .expect("edit");

    assert_eq!(edit.change.as_ref().map(|change| change.progress.total_nodes), Some(1));
    assert!(edit.guidance.is_some_and(|turn| turn.delivered));

    let requests = h.tutor.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].utterance.starts_with("[System note:"));
    assert!(requests[0].utterance.contains("1 concepts, 0 connections"));

    let hidden: Vec<_> = h.session.log().messages().iter().filter(|m| m.hidden).collect();
    assert_eq!(hidden.len(), 1);
    assert_eq!(hidden[0].role, Role::Learner);
    assert!(h.session.log().actions().iter().any(|line| line.ends_with(actions::EDITED_GRAPH)));
}

#[tokio::test]
async fn second_node_does_not_trigger_guidance() {
    let mut h = harness();
    h.session.edit_dsl("Inertia").await.expect("first");
    let edit = h.session.edit_dsl("Inertia\nMass").await.expect("second");
    assert_eq!(edit.guidance, None);
    assert_eq!(h.tutor.request_count(), 1);
}

#[tokio::test]
async fn unreadable_markup_keeps_graph() {
    let mut h = harness();
    h.session.edit_dsl("Force -> Motion").await.expect("dsl");
    let rev = h.session.editor().rev();

    let edit = h.session.edit_markup("sequenceDiagram\nA->>B: hi").await.expect("markup");
    assert_eq!(edit.change, None);
    assert!(edit.diagnostic.is_some());
    assert_eq!(h.session.editor().rev(), rev);
    assert_eq!(h.session.graph_progress().total_edges, 1);
}

#[tokio::test]
async fn render_requests_are_debounced() {
    let mut h = harness();
    h.session.edit_dsl("A").await.expect("a");
    h.clock.advance(Duration::from_millis(200));
    h.session.edit_dsl("A\nB").await.expect("b");
    assert_eq!(h.session.poll_render(), None);

    h.clock.advance(Duration::from_millis(600));
    let frame = h.session.poll_render().expect("frame");
    assert_eq!(frame.coalesced, 2);
    assert!(frame.markup.starts_with("mindmap"));
    assert_eq!(h.session.poll_render(), None);
}

#[tokio::test]
async fn idle_poll_fires_once_per_window_and_ignores_stale_generations() {
    let mut h = harness();
    let generation = h.session.idle_generation();

    h.clock.advance(Duration::from_secs(90));
    assert_eq!(h.session.poll_idle(generation).await, None);
    h.clock.advance(Duration::from_secs(30));
    assert!(h.session.poll_idle(generation).await.is_some());
    h.clock.advance(Duration::from_secs(30));
    assert_eq!(h.session.poll_idle(generation).await, None);

    h.session.advance_task().await.expect("advance");
    h.clock.advance(Duration::from_secs(600));
    assert_eq!(h.session.poll_idle(generation).await, None);
}

#[tokio::test(start_paused = true)]
async fn idle_watch_polls_on_its_interval_and_stops_on_task_change() {
    let mut h = harness();
    let mut watch = h.session.watch_idle();
    assert_eq!(watch.generation(), h.session.idle_generation());

    let started = tokio::time::Instant::now();
    h.clock.advance(Duration::from_secs(60));
    assert_eq!(watch.next(&mut h.session).await, IdlePoll::Quiet);
    assert!(started.elapsed() >= Duration::from_secs(30));

    h.clock.advance(Duration::from_secs(60));
    match watch.next(&mut h.session).await {
        IdlePoll::Nudge(turn) => assert!(turn.delivered),
        other => panic!("expected a nudge, got {other:?}"),
    }
    assert_eq!(h.tutor.request_count(), 1);

    h.session.advance_task().await.expect("advance");
    assert!(!watch.is_current(&h.session));
    assert_eq!(watch.next(&mut h.session).await, IdlePoll::Stopped);
    assert_eq!(h.session.watch_idle().generation(), h.session.idle_generation());
}

#[tokio::test]
async fn pass_marker_is_stripped_from_every_reply() {
    let tutor = ScriptedTutor::new("ok")
        .with_replies(["Good question. [STEP_PASS]", "[STEP_PASS] Add one more link."]);
    let mut h = harness_with(tutor, None);

    let turn = h.session.send_learner_message("What is inertia?").await.expect("turn");
    assert_eq!(turn.text, "Good question.");
    let turn = h.session.mark_stuck().await.expect("turn");
    assert_eq!(turn.text, "Add one more link.");
    assert!(h.session.log().messages().iter().all(|m| !m.text.contains("[STEP_PASS]")));
}

#[tokio::test]
async fn tutor_failure_becomes_apology_and_reports_key_errors() {
    let tutor = ScriptedTutor::new("unused");
    tutor.push_reply(Err(TutorError::EntityNotFound("model".to_owned())));
    tutor.push_reply(Err(TutorError::Timeout));
    let mut h = harness_with(tutor, None);

    let turn = h.session.send_learner_message("What is inertia?").await.expect("turn");
    assert!(!turn.delivered);
    assert_eq!(turn.text, TUTOR_APOLOGY);
    let turn = h.session.send_learner_message("Hello?").await.expect("turn");
    assert!(!turn.delivered);

    assert_eq!(h.hooks.log.lock().expect("hooks").api_key_errors, 1);
    let last = h.session.log().messages().last().expect("message");
    assert_eq!(last.role, Role::Tutor);
    assert_eq!(last.text, TUTOR_APOLOGY);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let mut h = harness();
    assert!(matches!(
        h.session.send_learner_message("   ").await,
        Err(SessionError::EmptyMessage)
    ));
    assert_eq!(h.tutor.request_count(), 0);
}

#[tokio::test]
async fn guided_steps_gate_on_marker() {
    let tutor = ScriptedTutor::new("Keep going.").with_replies([
        "Objective noted. [STEP_PASS]",
        "Material covered. [STEP_PASS]",
        "Check the blank again.",
        "很好，继续吧 [STEP_PASS]",
    ]);
    let mut h = harness_with(tutor, Some(1));
    assert!(h.session.is_guided());
    assert!(matches!(h.session.task_done().await, Err(SessionError::GuidedTask)));

    for expected in [GuidedStage::ConsumeMaterial, GuidedStage::SummarizeKeyIdeas] {
        let verdict = h.session.step_done().await.expect("verdict");
        assert!(verdict.passed);
        assert!(!verdict.reply.text.contains("[STEP_PASS]"));
        assert_eq!(h.session.advance_step().await.expect("advance"), StepOutcome::Entered(expected));
    }

    h.session.step_artifacts_mut().set_blank(0, 0, "force");
    let verdict = h.session.step_done().await.expect("verdict");
    assert!(!verdict.passed);
    assert!(matches!(
        h.session.advance_step().await,
        Err(SessionError::Progress(ProgressError::StepNotPassed(3)))
    ));

    let verdict = h.session.step_done().await.expect("verdict");
    assert!(verdict.passed);
    assert_eq!(verdict.reply.text, "很好，继续吧");
    assert!(h.session.steps().can_advance());
    assert_eq!(
        h.session.advance_step().await.expect("advance"),
        StepOutcome::Entered(GuidedStage::Practice)
    );

    let requests = h.tutor.requests();
    let verification = &requests[3];
    assert!(verification.system_instruction.contains("An object keeps moving unless a force acts on it"));
    assert!(h.session.log().messages().iter().all(|m| !m.text.contains("[STEP_PASS]")));

    h.session.enter_step(GuidedStage::ClarifyObjective).expect("re-enter");
    assert!(h.session.steps().is_passed(GuidedStage::SummarizeKeyIdeas));
    assert!(matches!(
        h.session.enter_step(GuidedStage::Reflect),
        Err(SessionError::Progress(ProgressError::StepNotReached(5)))
    ));
}

#[tokio::test]
async fn task_done_detects_stated_completion() {
    let tutor = ScriptedTutor::new("ok")
        .with_replies(["Nice start.", "Add one more link.", "Great work, the task is complete."]);
    let mut h = harness_with(tutor, None);
    h.session.edit_dsl("Force -> Motion").await.expect("dsl");

    let verdict = h.session.task_done().await.expect("verdict");
    assert!(!verdict.complete);
    assert!(!h.session.completion_stated());

    let verdict = h.session.task_done().await.expect("verdict");
    assert!(verdict.complete);
    assert!(h.session.completion_stated());
    assert!(h.tutor.requests()[2].system_instruction.contains("Force -> Motion"));
}

#[tokio::test]
async fn advancing_persists_index_and_resets_task_state() {
    let mut h = harness();
    h.session.edit_dsl("Force -> Motion").await.expect("dsl");

    let transition = h.session.advance_task().await.expect("advance");
    assert_eq!(transition.advance, TaskAdvance::Entered { from: 0, to: 1 });
    assert_eq!(*h.slot.value.lock().expect("slot"), Some(1));
    assert_eq!(h.session.graph_progress().total_nodes, 0);
    assert_eq!(h.session.progress_report().percent_complete, 33);

    let transition_request = h.tutor.requests().last().cloned().expect("request");
    assert!(transition_request.system_instruction.contains("Force -> Motion"));
    assert!(transition_request.system_instruction.contains("exactly two sentences"));

    assert!(matches!(
        h.session.edit_dsl("A").await,
        Err(SessionError::NotGraphSurface("prose"))
    ));
}

#[tokio::test]
async fn finishing_hands_off_metrics_and_rejects_further_changes() {
    let mut h = harness_with(ScriptedTutor::new("Well done."), Some(2));
    h.session.edit_surface("| a | b |").expect("table edit");
    h.session.send_learner_message("How should I label the columns?").await.expect("chat");

    let transition = h.session.advance_task().await.expect("finish");
    assert_eq!(transition.advance, TaskAdvance::Finished { from: 2 });
    let metrics = transition.metrics.expect("metrics");
    assert_eq!(metrics.edits.table, 1);
    assert_eq!(metrics.question_count, 1);
    assert_eq!(metrics.tasks_completed, 1);

    assert!(h.session.is_finished());
    assert_eq!(h.session.final_metrics(), Some(&metrics));
    assert_eq!(h.hooks.log.lock().expect("hooks").finished.as_ref(), Some(&metrics));
    assert_eq!(*h.slot.value.lock().expect("slot"), None);
    let last_report = h.hooks.log.lock().expect("hooks").reports.last().copied();
    assert_eq!(
        last_report,
        Some(ProgressReport { percent_complete: 100, is_finished: true, last_task_index: 2 })
    );

    assert!(matches!(
        h.session.advance_task().await,
        Err(SessionError::Progress(ProgressError::Finished))
    ));
    assert!(matches!(h.session.mark_stuck().await, Err(SessionError::Progress(ProgressError::Finished))));
    assert!(matches!(h.session.edit_surface("x"), Err(SessionError::Progress(ProgressError::Finished))));
}

#[tokio::test]
async fn restart_returns_to_first_task_with_fresh_log() {
    let mut h = harness_with(ScriptedTutor::new("ok"), Some(2));
    h.session.advance_task().await.expect("finish");

    h.session.restart();
    assert_eq!(h.session.current_task_index(), 0);
    assert!(!h.session.is_finished());
    assert_eq!(h.session.final_metrics(), None);
    assert_eq!(h.session.log().messages().len(), 0);
    assert_eq!(h.session.log().actions().len(), 1);
    assert_eq!(*h.slot.value.lock().expect("slot"), None);
}

#[test]
fn resume_index_comes_from_slot() {
    let session = LearningSession::new(
        plan(),
        SessionConfig::default(),
        Arc::new(ScriptedTutor::new("ok")),
        Box::new(MemorySlot::new(Some(7))),
        Box::new(RecordingHooks::default()),
        Arc::new(ManualClock::new(Utc::now())),
    )
    .expect("session");
    assert_eq!(session.current_task_index(), 2);
    assert!(session.log().actions()[0].ends_with("entered task 3"));
}

#[test]
fn invalid_config_is_rejected() {
    let config = SessionConfig { pass_marker: String::new(), ..SessionConfig::default() };
    let err = LearningSession::new(
        plan(),
        config,
        Arc::new(ScriptedTutor::new("ok")),
        Box::new(MemorySlot::default()),
        Box::new(RecordingHooks::default()),
        Arc::new(ManualClock::new(Utc::now())),
    )
    .unwrap_err();
    assert!(matches!(err, SessionError::Config(_)));
}

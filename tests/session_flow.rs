// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use mindtrail::config::SessionConfig;
use mindtrail::format::{graph_from_markup, markup_from_graph};
use mindtrail::model::{NodeId, TaskPlan};
use mindtrail::ops::GraphOp;
use mindtrail::progress::{GuidedStage, TaskAdvance};
use mindtrail::session::{LearningSession, StepOutcome};
use mindtrail::store::{MemorySlot, NoopHooks};
use mindtrail::timing::ManualClock;
use mindtrail::tutor::ScriptedTutor;

const PLAN: &str = r#"{"tasks": [
    {"id": "map", "title": "Map Newton's first law", "viewType": "mindmap"},
    {"id": "guided", "title": "Explain inertia", "viewType": "prose",
     "content": "```json\n{\"learningObjective\": \"Explain inertia\", \"keyIdeas\": [{\"text\": \"Inertia keeps things ___\"}]}\n```"}
]}"#;

fn open(tutor: Arc<ScriptedTutor>, clock: &ManualClock) -> LearningSession {
    LearningSession::new(
        TaskPlan::from_json(PLAN).expect("plan"),
        SessionConfig::default(),
        tutor,
        Box::new(MemorySlot::default()),
        Box::new(NoopHooks),
        Arc::new(clock.clone()),
    )
    .expect("session")
}

#[tokio::test]
async fn dsl_edits_flow_into_markup_and_back() {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("start"));
    let tutor = Arc::new(ScriptedTutor::new("What else belongs here?"));
    let mut session = open(tutor.clone(), &clock);

    session
        .edit_dsl("牛顿第一定律 -> 惯性\n惯性 -> 描述 -> 静止或匀速")
        .await
        .expect("dsl edit");
    let graph = session.editor().graph().clone();
    assert_eq!(graph.nodes().len(), 3);
    assert_eq!(graph.edges().len(), 2);
    assert_eq!(graph.edges()[1].label(), Some("描述"));
    assert_eq!(graph.metadata().central_concept(), Some("牛顿第一定律"));
    assert_eq!(session.graph_progress().completion_rate, 100);

    clock.advance(Duration::from_millis(600));
    let frame = session.poll_render().expect("render frame");
    let reparsed = graph_from_markup(&frame.markup).graph;
    let mut labels: Vec<_> = reparsed.nodes().iter().map(|node| node.label().to_owned()).collect();
    labels.sort();
    assert_eq!(labels, ["惯性", "牛顿第一定律", "静止或匀速"]);
    assert_eq!(reparsed.edges().len(), 2);

    let inertia = graph
        .nodes()
        .iter()
        .find(|node| node.label() == "惯性")
        .map(|node| node.id().clone())
        .expect("inertia node");
    let rev = session.editor().rev();
    let edit = session
        .apply_graph_ops(rev, &[GraphOp::mark_confusion(inertia)])
        .await
        .expect("confusion");
    assert!(edit.guidance.is_some());
    let note = tutor.requests().pop().expect("guidance request");
    assert!(note.utterance.contains("惯性"));

    let markup = markup_from_graph(session.editor().graph()).expect("mindmap export");
    assert!(markup.contains("❓ 惯性"));
    assert_eq!(graph_from_markup(&markup).graph.confusion_count(), 1);
}

#[tokio::test]
async fn stale_ops_are_rejected() {
    let clock = ManualClock::new(Utc::now());
    let mut session = open(Arc::new(ScriptedTutor::new("ok")), &clock);
    let node = NodeId::new("n1").expect("id");
    session.apply_graph_ops(0, &[GraphOp::add_node(node.clone(), "Force")]).await.expect("first");
    assert!(session.apply_graph_ops(0, &[GraphOp::add_node(node, "Again")]).await.is_err());
    assert_eq!(session.graph_progress().total_nodes, 1);
    assert_eq!(session.editor().rev(), 1);
}

#[tokio::test]
async fn whole_session_reaches_finished_with_metrics() {
    let clock = ManualClock::new(Utc::now());
    let tutor = Arc::new(ScriptedTutor::new("Approved. [STEP_PASS]"));
    let mut session = open(tutor.clone(), &clock);

    session.send_learner_message("Where do I start?").await.expect("chat");
    let transition = session.advance_task().await.expect("to guided task");
    assert_eq!(transition.advance, TaskAdvance::Entered { from: 0, to: 1 });
    assert!(session.is_guided());

    let mut entered = Vec::new();
    let finished = loop {
        clock.advance(Duration::from_secs(5));
        let verdict = session.step_done().await.expect("verdict");
        assert!(verdict.passed);
        assert_eq!(verdict.reply.text, "Approved.");
        match session.advance_step().await.expect("advance") {
            StepOutcome::Entered(stage) => entered.push(stage),
            StepOutcome::TaskAdvanced(transition) => break transition,
        }
    };
    assert_eq!(
        entered,
        [
            GuidedStage::ConsumeMaterial,
            GuidedStage::SummarizeKeyIdeas,
            GuidedStage::Practice,
            GuidedStage::Reflect
        ]
    );
    assert_eq!(finished.advance, TaskAdvance::Finished { from: 1 });

    let metrics = finished.metrics.expect("metrics");
    assert_eq!(metrics.task_count, 2);
    assert_eq!(metrics.done_count, 5);
    assert_eq!(metrics.tasks_entered, 2);
    assert_eq!(metrics.tasks_completed, 2);
    assert!(metrics.mean_gap_seconds.is_finite());
    assert!(session.is_finished());
    assert_eq!(session.progress_report().percent_complete, 100);
}

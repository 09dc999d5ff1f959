// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mindtrail CLI entrypoint.
//!
//! Converts between the graph representations, extracts engagement metrics from a saved log, and
//! runs a scripted demo session. Diagnostics go to stderr through `tracing`; results go to stdout.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use mindtrail::config::SessionConfig;
use mindtrail::format::{self, mermaid};
use mindtrail::metrics::extract_metrics_with;
use mindtrail::model::{GraphType, GuidedPayload, InteractionLog, TaskPlan, VisualizationGraph};
use mindtrail::session::{IdlePoll, LearningSession, StepOutcome};
use mindtrail::store::{LoggingHooks, MemorySlot};
use mindtrail::timing::SystemClock;
use mindtrail::tutor::ScriptedTutor;

#[derive(Parser)]
#[command(name = "mindtrail")]
#[command(about = "Guided visualization and progression engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Session config (JSON); defaults apply when omitted
    #[arg(short, long, global = true, env = "MINDTRAIL_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse text DSL into graph JSON
    Dsl {
        file: PathBuf,
        /// Treat the result as a concept map instead of a mind map
        #[arg(long)]
        conceptmap: bool,
    },

    /// Parse diagram markup into graph JSON
    Markup { file: PathBuf },

    /// Export graph JSON as diagram markup
    Export {
        file: PathBuf,
        /// Always use the generic graph dialect
        #[arg(long)]
        generic: bool,
    },

    /// Extract engagement metrics from a saved interaction log
    Metrics {
        file: PathBuf,
        /// Number of tasks in the session plan
        #[arg(long)]
        tasks: usize,
    },

    /// Print the JSON schema of the guided payload
    Schema,

    /// Run a scripted session against a canned tutor
    Demo,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindtrail=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SessionConfig> {
    match path {
        Some(path) => Ok(SessionConfig::load(path)?),
        None => Ok(SessionConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Dsl { file, conceptmap } => {
            let graph_type = if conceptmap { GraphType::Conceptmap } else { GraphType::Mindmap };
            let outcome = format::parse_text_dsl(&read_input(&file)?, graph_type);
            for diagnostic in &outcome.diagnostics {
                tracing::warn!(line = diagnostic.line_no, "{}", diagnostic.message);
            }
            print_json(&outcome.graph)
        }
        Commands::Markup { file } => {
            let outcome = format::graph_from_markup(&read_input(&file)?);
            for diagnostic in &outcome.diagnostics {
                tracing::warn!(line = diagnostic.line_no, "{}", diagnostic.message);
            }
            print_json(&outcome.graph)
        }
        Commands::Export { file, generic } => {
            let graph: VisualizationGraph = serde_json::from_str(&read_input(&file)?)
                .with_context(|| format!("{} is not a graph document", file.display()))?;
            let graph = graph.validated()?;
            let markup = if generic {
                mermaid::export_graph_dialect(&graph)
            } else {
                format::export_graph_markup(&graph)
            };
            print!("{markup}");
            Ok(())
        }
        Commands::Metrics { file, tasks } => {
            let log: InteractionLog = serde_json::from_str(&read_input(&file)?)
                .with_context(|| format!("{} is not an interaction log", file.display()))?;
            print_json(&extract_metrics_with(&log, tasks, &config.metrics))
        }
        Commands::Schema => print_json(&GuidedPayload::json_schema()),
        Commands::Demo => {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
            runtime.block_on(run_demo(config))
        }
    }
}

const DEMO_PLAN: &str = r#"{"tasks": [
    {"id": "map", "title": "Map Newton's first law", "viewType": "mindmap",
     "outputGoal": "a map linking the law to inertia and its two states",
     "evaluationCriteria": "At least three concepts and two labelled links"},
    {"id": "guided", "title": "Explain inertia", "viewType": "prose",
     "content": "{\"learningObjective\": \"Explain inertia in your own words\", \"keyIdeas\": [{\"text\": \"Inertia is the tendency to keep ___\", \"blanks\": [\"moving\"]}], \"exitTicket\": {\"question\": \"Why do passengers lurch forward when a bus brakes?\"}}"}
]}"#;

const DEMO_MAP: &str = "牛顿第一定律 -> 惯性\n惯性 -> 描述 -> 静止或匀速";

async fn run_demo(config: SessionConfig) -> Result<()> {
    let plan = TaskPlan::from_json(DEMO_PLAN)?;
    let tutor = Arc::new(ScriptedTutor::new("Good. What would you add next?").with_replies([
        "Nice, you connected the law to inertia. What does inertia describe?",
        "Your map links all three ideas, the task is complete.",
        "Well done on the map. Next, put inertia into your own words.",
        "Objective noted. [STEP_PASS]",
        "Material covered. [STEP_PASS]",
        "Exactly, inertia keeps things moving. [STEP_PASS]",
        "Good practice. [STEP_PASS]",
        "A thoughtful reflection. [STEP_PASS]",
        "Great session. You explained inertia clearly.",
    ]));
    let mut session = LearningSession::new(
        plan,
        config,
        tutor,
        Box::new(MemorySlot::default()),
        Box::new(LoggingHooks),
        Arc::new(SystemClock),
    )?;

    let edit = session.edit_dsl(DEMO_MAP).await?;
    if let Some(turn) = edit.guidance {
        println!("tutor: {}", turn.text);
    }

    let mut idle = session.watch_idle();
    let mut ticks = tokio::time::interval(Duration::from_millis(100));
    let frame = loop {
        tokio::select! {
            _ = ticks.tick() => {
                if let Some(frame) = session.poll_render() {
                    break frame;
                }
            }
            _ = idle.tick() => {
                if let IdlePoll::Nudge(turn) = idle.poll(&mut session).await {
                    println!("tutor: {}", turn.text);
                }
            }
        }
    };
    println!("{}", frame.markup);

    let verdict = session.task_done().await?;
    println!("tutor: {}", verdict.reply.text);
    let transition = session.advance_task().await?;
    println!("tutor: {}", transition.reply.text);

    session.step_artifacts_mut().set_blank(0, 0, "moving");
    session.step_artifacts_mut().reflection =
        "The passengers keep moving forward while the bus slows down.".to_owned();
    loop {
        let verdict = session.step_done().await?;
        println!("tutor (step {}): {}", verdict.stage.number(), verdict.reply.text);
        if !verdict.passed {
            break;
        }
        if let StepOutcome::TaskAdvanced(transition) = session.advance_step().await? {
            println!("tutor: {}", transition.reply.text);
            if let Some(metrics) = transition.metrics {
                print_json(&metrics)?;
            }
            break;
        }
    }
    Ok(())
}

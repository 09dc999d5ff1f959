// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! System instruction texts for each kind of tutor call.

use crate::model::Task;

/// Task framing shared by every instruction.
pub fn task_context(task: &Task, language: &str) -> String {
    let mut out = String::from("You are a patient tutor guiding one learner through a task.\n");
    if !task.tutor_config.tone.trim().is_empty() {
        out.push_str(&format!("Tone: {}.\n", task.tutor_config.tone.trim()));
    }
    if !task.tutor_config.system_instruction.trim().is_empty() {
        out.push_str(task.tutor_config.system_instruction.trim());
        out.push('\n');
    }
    out.push_str(&format!("Current task: {} (editor: {}).\n", task.title, task.view_type.as_str()));
    if !task.output_goal.trim().is_empty() {
        out.push_str(&format!("Expected output: {}.\n", task.output_goal.trim()));
    }
    out.push_str(&format!("Always answer in {language}.\n"));
    out
}

/// Instruction for ordinary learner messages.
pub fn chat(task: &Task, language: &str) -> String {
    let mut out = task_context(task, language);
    out.push_str("Answer briefly and prefer guiding questions over giving solutions away.\n");
    out
}

/// Instruction for checking one guided step.
///
/// Lightweight steps are approved unconditionally; the others only when the artifacts show the
/// step is satisfied.
pub fn step_verification(
    task: &Task,
    step_number: usize,
    step_title: &str,
    lightweight: bool,
    artifacts: &str,
    marker: &str,
    language: &str,
) -> String {
    let mut out = task_context(task, language);
    out.push_str(&format!("The learner says they finished guided step {step_number} ({step_title}).\n"));
    if artifacts.trim().is_empty() {
        out.push_str("They submitted no written work for this step.\n");
    } else {
        out.push_str("Their work for this step:\n");
        out.push_str(artifacts.trim_end());
        out.push('\n');
    }
    if lightweight {
        out.push_str(&format!(
            "This step only asks the learner to read or view material. Acknowledge it in one \
             sentence and always end your reply with the exact token {marker}.\n"
        ));
    } else {
        out.push_str(&format!(
            "Check the work. If and only if the step is satisfactorily complete, end your reply \
             with the exact token {marker}. Otherwise explain what is missing and do not include \
             the token.\n"
        ));
    }
    out
}

/// Instruction for a non-guided task's completion check.
pub fn completion_check(task: &Task, current_work: &str, language: &str) -> String {
    let mut out = task_context(task, language);
    out.push_str("The learner says the task is done. Evaluate their current work.\n");
    if !task.evaluation_criteria.trim().is_empty() {
        out.push_str(&format!("Evaluation criteria: {}\n", task.evaluation_criteria.trim()));
    }
    if !current_work.trim().is_empty() {
        out.push_str("Current work:\n");
        out.push_str(current_work.trim_end());
        out.push('\n');
    }
    out.push_str(
        "If the work meets the criteria, state explicitly that the task is complete. Otherwise \
         name the single most important thing still missing.\n",
    );
    out
}

/// One combined instruction for moving from `previous` to `next`, so each advance yields one
/// tutor turn.
pub fn transition(previous: &Task, previous_work: &str, next: &Task, language: &str) -> String {
    let mut out = task_context(next, language);
    out.push_str(&format!("The learner just finished the task \"{}\".\n", previous.title));
    if !previous_work.trim().is_empty() {
        out.push_str("Their final work on it:\n");
        out.push_str(previous_work.trim_end());
        out.push('\n');
    }
    out.push_str(
        "Reply with exactly two sentences: first, one sentence of feedback on the finished task; \
         second, one sentence orienting the learner to the new task.\n",
    );
    out
}

/// Instruction for the closing turn after the last task.
pub fn closing(previous: &Task, previous_work: &str, language: &str) -> String {
    let mut out = task_context(previous, language);
    out.push_str("The learner just finished the last task of the session.\n");
    if !previous_work.trim().is_empty() {
        out.push_str("Their final work:\n");
        out.push_str(previous_work.trim_end());
        out.push('\n');
    }
    out.push_str(
        "Reply with one sentence of feedback on the task and one sentence closing the session.\n",
    );
    out
}

/// Instruction when the learner asks for help.
pub fn stuck(task: &Task, current_work: &str, language: &str) -> String {
    let mut out = task_context(task, language);
    out.push_str("The learner pressed \"I'm stuck\".\n");
    if !current_work.trim().is_empty() {
        out.push_str("Current work:\n");
        out.push_str(current_work.trim_end());
        out.push('\n');
    }
    out.push_str("Give one concrete hint for the next small step without solving the task.\n");
    out
}

/// Instruction when the learner asks for a graded evaluation.
pub fn evaluation(task: &Task, current_work: &str, language: &str) -> String {
    let mut out = task_context(task, language);
    out.push_str("The learner requests an evaluation of their current work.\n");
    if !task.evaluation_criteria.trim().is_empty() {
        out.push_str(&format!("Evaluation criteria: {}\n", task.evaluation_criteria.trim()));
    }
    if !current_work.trim().is_empty() {
        out.push_str("Current work:\n");
        out.push_str(current_work.trim_end());
        out.push('\n');
    }
    out.push_str("List strengths and gaps against each criterion in short bullet points.\n");
    out
}

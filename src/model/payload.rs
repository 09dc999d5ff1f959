// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Guided content embedded in a task's content blob.

use std::sync::OnceLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Canonical spelling of the blank placeholder. Any run of three or more underscores counts.
pub const BLANK_PLACEHOLDER: &str = "___";

fn blank_regex() -> &'static Regex {
    static BLANK: OnceLock<Regex> = OnceLock::new();
    BLANK.get_or_init(|| Regex::new(r"_{3,}").expect("valid blank regex"))
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuidedPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_objective: Option<String>,
    #[serde(default)]
    pub why_it_matters: WhyItMatters,
    #[serde(default)]
    pub key_ideas: Vec<KeyIdea>,
    #[serde(default)]
    pub practice_questions: Vec<PracticeQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_ticket: Option<ExitTicket>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct WhyItMatters {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "meaningAnchor")]
    pub meaning_anchor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "advanceOrganizer")]
    pub advance_organizer: Option<String>,
}

/// A fill-in-the-blank template.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct KeyIdea {
    pub text: String,
    #[serde(default)]
    pub blanks: Vec<String>,
}

impl KeyIdea {
    /// Number of answer inputs a surface should render.
    pub fn blank_count(&self) -> usize {
        blank_regex().find_iter(&self.text).count()
    }

    /// Substitutes `answers` into the placeholders in order. Missing answers keep the placeholder.
    pub fn fill(&self, answers: &[String]) -> String {
        let mut index = 0usize;
        blank_regex()
            .replace_all(&self.text, |_: &regex::Captures<'_>| {
                let replacement = answers
                    .get(index)
                    .map(|answer| answer.trim())
                    .filter(|answer| !answer.is_empty())
                    .map(str::to_owned)
                    .unwrap_or_else(|| BLANK_PLACEHOLDER.to_owned());
                index += 1;
                replacement
            })
            .into_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PracticeQuestion {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl PracticeQuestion {
    pub fn is_multiple_choice(&self) -> bool {
        self.options.as_ref().is_some_and(|options| !options.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExitTicket {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
}

impl GuidedPayload {
    /// Extracts a payload from task content.
    ///
    /// The content may be the JSON object itself, a fenced ```json block, or prose with one JSON
    /// object inside. Returns `None` when nothing parses.
    pub fn from_task_content(content: &str) -> Option<Self> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(payload) = serde_json::from_str::<Self>(trimmed) {
            return Some(payload);
        }
        if let Some(fenced) = fenced_json(trimmed) {
            if let Ok(payload) = serde_json::from_str::<Self>(fenced) {
                return Some(payload);
            }
        }
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        if end <= start {
            return None;
        }
        serde_json::from_str::<Self>(&trimmed[start..=end]).ok()
    }

    /// Guided steps only apply when an objective is present.
    pub fn is_guided(&self) -> bool {
        self.learning_objective.as_deref().is_some_and(|objective| !objective.trim().is_empty())
    }

    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(GuidedPayload)
    }
}

fn fenced_json(content: &str) -> Option<&str> {
    let open = content.find("```")?;
    let after_open = &content[open + 3..];
    let body_start = after_open.find('\n')? + 1;
    let body = &after_open[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// Caches the parsed payload for one task content string and re-parses when it changes.
#[derive(Debug, Default)]
pub struct PayloadCache {
    source: Option<String>,
    payload: Option<GuidedPayload>,
}

impl PayloadCache {
    pub fn get_or_parse(&mut self, content: &str) -> Option<&GuidedPayload> {
        if self.source.as_deref() != Some(content) {
            self.payload = GuidedPayload::from_task_content(content);
            self.source = Some(content.to_owned());
        }
        self.payload.as_ref()
    }

    pub fn clear(&mut self) {
        self.source = None;
        self.payload = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{GuidedPayload, KeyIdea, PayloadCache};

    const PAYLOAD: &str = r#"{
        "learningObjective": "Explain Newton's first law",
        "whyItMatters": {"meaning_anchor": "Seatbelts", "advance_organizer": "Forces change motion"},
        "keyIdeas": [{"text": "An object keeps ___ unless a ___ acts on it", "blanks": ["moving", "force"]}],
        "practiceQuestions": [{"question": "Which is inertia?", "options": ["A", "B"], "correctAnswer": "A"}],
        "exitTicket": {"question": "Where did you see inertia today?"}
    }"#;

    #[test]
    fn parses_plain_json_payload() {
        let payload = GuidedPayload::from_task_content(PAYLOAD).expect("payload");
        assert!(payload.is_guided());
        assert_eq!(payload.why_it_matters.meaning_anchor.as_deref(), Some("Seatbelts"));
        assert_eq!(payload.key_ideas[0].blank_count(), 2);
        assert!(payload.practice_questions[0].is_multiple_choice());
        assert_eq!(
            payload.exit_ticket.as_ref().map(|t| t.question.as_str()),
            Some("Where did you see inertia today?")
        );
    }

    #[test]
    fn parses_fenced_and_embedded_payloads() {
        let fenced = format!("Read this first.\n```json\n{PAYLOAD}\n```\nThanks");
        assert!(GuidedPayload::from_task_content(&fenced).is_some());

        let embedded = format!("Intro text {PAYLOAD} trailing words");
        assert!(GuidedPayload::from_task_content(&embedded).is_some());
    }

    #[test]
    fn plain_prose_is_not_a_payload() {
        assert_eq!(GuidedPayload::from_task_content("Draw a mind map of forces."), None);
        assert_eq!(GuidedPayload::from_task_content(""), None);
    }

    #[test]
    fn payload_without_objective_is_not_guided() {
        let payload =
            GuidedPayload::from_task_content(r#"{"keyIdeas": []}"#).expect("payload parses");
        assert!(!payload.is_guided());
    }

    #[test]
    fn fill_substitutes_answers_in_order() {
        let idea = KeyIdea { text: "___ causes ______".to_owned(), blanks: Vec::new() };
        assert_eq!(idea.blank_count(), 2);
        assert_eq!(idea.fill(&["Force".to_owned()]), "Force causes ___");
        assert_eq!(
            idea.fill(&["Force".to_owned(), "acceleration".to_owned()]),
            "Force causes acceleration"
        );
    }

    #[test]
    fn cache_reparses_only_when_content_changes() {
        let mut cache = PayloadCache::default();
        assert!(cache.get_or_parse(PAYLOAD).is_some());
        assert!(cache.get_or_parse(PAYLOAD).is_some());
        assert!(cache.get_or_parse("no payload here").is_none());
    }

    #[test]
    fn schema_names_the_objective_field() {
        let schema = serde_json::to_string(&GuidedPayload::json_schema()).expect("schema json");
        assert!(schema.contains("learningObjective"));
    }
}

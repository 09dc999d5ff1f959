// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Free-text heuristics as named pattern tables.
//!
//! Each table is a list of `(name, regex)` rows; a text matches the table when any row matches.
//! Rows can be unit-tested and extended without touching call sites.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone)]
pub struct PredicateTable {
    rows: Vec<(&'static str, Regex)>,
}

impl PredicateTable {
    pub fn new(rows: &[(&'static str, &str)]) -> Result<Self, regex::Error> {
        let rows = rows
            .iter()
            .map(|(name, pattern)| Ok((*name, Regex::new(pattern)?)))
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { rows })
    }

    pub fn matches(&self, text: &str) -> bool {
        self.rows.iter().any(|(_, regex)| regex.is_match(text))
    }

    /// Names of every row matching `text`, in table order.
    pub fn matching(&self, text: &str) -> Vec<&'static str> {
        self.rows.iter().filter(|(_, regex)| regex.is_match(text)).map(|(name, _)| *name).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

const QUESTION_ROWS: &[(&str, &str)] = &[
    ("question_mark", r"[?？]"),
    (
        "en_interrogative",
        r"(?i)^\s*(what|why|how|when|where|who|which|whose|can|could|would|should|is|are|does|do|did)\b",
    ),
    ("zh_interrogative", r"(什么|为什么|怎么|怎样|如何|哪|是否|能不能|可不可以)"),
    ("zh_particle", r"[吗呢]\s*[。.!！]?\s*$"),
];

const COMPLETION_ROWS: &[(&str, &str)] = &[
    ("en_task_complete", r"(?i)\b(task|assignment|exercise)\s+(is\s+)?(now\s+)?(complete|completed|done|finished)\b"),
    ("en_you_completed", r"(?i)\byou(\s+have|'ve)?\s+(successfully\s+)?(completed|finished|accomplished)\b"),
    ("en_next_task", r"(?i)\b(ready|move on|proceed|continue)\s+(to|for|with)\s+the\s+next\s+task\b"),
    ("en_requirements_met", r"(?i)\b(meets|met|satisfies|fulfills)\s+(all\s+)?(the\s+)?(requirements|criteria)\b"),
    ("zh_task_complete", r"任务(已经?)?完成"),
    ("zh_completed_task", r"(已经?|成功)?完成了?(这个|本|该)?任务"),
    ("zh_next_task", r"(进入|开始)下一(个)?任务"),
    ("zh_requirements_met", r"(达到|符合|满足)了?(所有)?(要求|标准)"),
];

/// Rows that void a completion match within the same clause: negations and conditions.
const COMPLETION_GUARD_ROWS: &[(&str, &str)] = &[
    ("en_negation", r"(?i)(\b(not|never|yet|almost|incomplete)\b|n't\b)"),
    ("en_conditional", r"(?i)\b(when|whenever|once|if|until|unless|before|after)\b"),
    ("zh_negation", r"(没|未|不是|不能|不算|还差|尚)"),
    ("zh_conditional", r"(之前|以前|之后|以后|如果|假如|要是|一旦|等到|才能|的时候)"),
];

const CLAUSE_BREAKS: &[char] = &['.', '!', '?', ';', ',', '\n', '。', '！', '？', '；', '，'];

fn question_table() -> &'static PredicateTable {
    static TABLE: OnceLock<PredicateTable> = OnceLock::new();
    TABLE.get_or_init(|| PredicateTable::new(QUESTION_ROWS).expect("valid question patterns"))
}

fn completion_table() -> &'static PredicateTable {
    static TABLE: OnceLock<PredicateTable> = OnceLock::new();
    TABLE.get_or_init(|| PredicateTable::new(COMPLETION_ROWS).expect("valid completion patterns"))
}

fn completion_guard_table() -> &'static PredicateTable {
    static TABLE: OnceLock<PredicateTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        PredicateTable::new(COMPLETION_GUARD_ROWS).expect("valid completion guard patterns")
    })
}

/// Whether a learner message reads as a question.
pub fn is_question(text: &str) -> bool {
    question_table().matches(text)
}

/// Whether a tutor reply explicitly states that the task is complete.
///
/// The reply is checked clause by clause; a clause that also carries a negation or a condition
/// ("还没有完成这个任务", "when the task is complete") does not count.
pub fn states_completion(text: &str) -> bool {
    text.split(CLAUSE_BREAKS).any(|clause| {
        completion_table().matches(clause) && !completion_guard_table().matches(clause)
    })
}

pub fn completion_matches(text: &str) -> Vec<&'static str> {
    completion_table().matching(text)
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Literal token the tutor appends to approve a guided step.
pub const PASS_MARKER: &str = "[STEP_PASS]";

/// A tutor reply split into what the learner sees and whether it carried the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TutorReply {
    pub display: String,
    pub passed: bool,
}

/// Removes every occurrence of `marker` and tidies the whitespace it leaves behind.
pub fn strip_marker(reply: &str, marker: &str) -> String {
    if marker.is_empty() || !reply.contains(marker) {
        return reply.trim().to_owned();
    }
    reply
        .split(marker)
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

pub fn read_reply(reply: &str, marker: &str) -> TutorReply {
    let passed = !marker.is_empty() && reply.contains(marker);
    TutorReply { display: strip_marker(reply, marker), passed }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{read_reply, strip_marker, PASS_MARKER};

    #[test]
    fn marker_sets_passed_and_is_stripped() {
        let reply = read_reply("很好，继续吧 [STEP_PASS]", PASS_MARKER);
        assert!(reply.passed);
        assert_eq!(reply.display, "很好，继续吧");
        assert!(!reply.display.contains(PASS_MARKER));
    }

    #[test]
    fn same_reply_without_marker_does_not_pass() {
        let stripped = strip_marker("很好，继续吧 [STEP_PASS]", PASS_MARKER);
        let reply = read_reply(&stripped, PASS_MARKER);
        assert!(!reply.passed);
        assert_eq!(reply.display, stripped);
    }

    #[rstest]
    #[case("[STEP_PASS] Great work.", "Great work.")]
    #[case("Great\n[STEP_PASS]\n", "Great")]
    #[case("A [STEP_PASS] B [STEP_PASS]", "A B")]
    #[case("step_pass in prose", "step_pass in prose")]
    fn strips_all_occurrences(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip_marker(input, PASS_MARKER), expected);
    }

    #[test]
    fn empty_marker_never_passes() {
        assert!(!read_reply("anything", "").passed);
    }
}

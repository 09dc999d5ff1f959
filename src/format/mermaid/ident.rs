// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MarkupIdentError {
    #[error("must not be empty")]
    Empty,
    #[error("must not contain whitespace")]
    ContainsWhitespace,
    #[error("contains invalid character: '{ch}'")]
    InvalidChar { ch: char },
}

/// Markup ids are words: letters (any script), digits, and `_`.
pub(super) fn validate_markup_ident(ident: &str) -> Result<(), MarkupIdentError> {
    if ident.is_empty() {
        return Err(MarkupIdentError::Empty);
    }
    if ident.chars().any(char::is_whitespace) {
        return Err(MarkupIdentError::ContainsWhitespace);
    }
    if let Some(ch) = ident.chars().find(|c| !c.is_alphanumeric() && *c != '_') {
        return Err(MarkupIdentError::InvalidChar { ch });
    }
    Ok(())
}

pub(super) fn is_markup_ident(ident: &str) -> bool {
    validate_markup_ident(ident).is_ok()
}

// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Mindtrail: guided visualization and progression engine.
//!
//! The canonical concept graph and its text/markup representations live in [`model`], [`ops`] and
//! [`format`]. [`session::LearningSession`] drives guidance, guided steps and task progression
//! against an async [`tutor::TutorChannel`], and [`metrics`] summarizes the finished session.

pub mod config;
pub mod format;
pub mod guidance;
pub mod metrics;
pub mod model;
pub mod ops;
pub mod progress;
pub mod session;
pub mod store;
pub mod timing;
pub mod tutor;

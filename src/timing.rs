// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Time sources and render coalescing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *now += chrono::Duration::from_std(by).unwrap_or_else(|_| chrono::Duration::zero());
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Time from `since` to `now`; zero when `now` is earlier.
pub fn elapsed_between(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or_default()
}

/// Trailing-edge coalescing of render requests.
///
/// Every `request` restarts the window; `poll` reports a flush once the window has passed since the
/// last request, along with how many requests were folded into it.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_request: Option<DateTime<Utc>>,
    coalesced: usize,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last_request: None, coalesced: 0 }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn request(&mut self, now: DateTime<Utc>) {
        self.last_request = Some(now);
        self.coalesced += 1;
    }

    pub fn is_pending(&self) -> bool {
        self.last_request.is_some()
    }

    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<usize> {
        let last = self.last_request?;
        if elapsed_between(last, now) < self.window {
            return None;
        }
        self.last_request = None;
        Some(std::mem::take(&mut self.coalesced))
    }

    pub fn cancel(&mut self) {
        self.last_request = None;
        self.coalesced = 0;
    }
}

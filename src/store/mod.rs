// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Mindtrail and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Externally owned state: the resume slot and the session hooks.

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

mod file_slot;
pub mod hooks;

pub use file_slot::FileSlot;
pub use hooks::{HookError, LoggingHooks, NoopHooks, SessionHooks};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("json error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A single key holding the task index to resume at.
pub trait ResumeSlot: Send {
    fn read(&self) -> Result<Option<usize>, StoreError>;
    fn write(&mut self, index: usize) -> Result<(), StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemorySlot {
    value: Mutex<Option<usize>>,
}

impl MemorySlot {
    pub fn new(initial: Option<usize>) -> Self {
        Self { value: Mutex::new(initial) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<usize>> {
        self.value.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResumeSlot for MemorySlot {
    fn read(&self) -> Result<Option<usize>, StoreError> {
        Ok(*self.lock())
    }

    fn write(&mut self, index: usize) -> Result<(), StoreError> {
        *self.lock() = Some(index);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        *self.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemorySlot, ResumeSlot};

    #[test]
    fn memory_slot_reads_back_writes() {
        let mut slot = MemorySlot::new(Some(2));
        assert_eq!(slot.read().expect("read"), Some(2));
        slot.write(4).expect("write");
        assert_eq!(slot.read().expect("read"), Some(4));
        slot.clear().expect("clear");
        assert_eq!(slot.read().expect("read"), None);
    }
}

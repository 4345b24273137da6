// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{EngineError, EngineResult};
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide switch that halts money movement during maintenance.
///
/// Shared as `Arc<ServiceGate>` between the engines of all workers. Only the
/// operator path flips it; engines only read.
#[derive(Debug, Default)]
pub struct ServiceGate {
    locked: AtomicBool,
}

impl ServiceGate {
    pub fn new(locked: bool) -> Self {
        Self {
            locked: AtomicBool::new(locked),
        }
    }

    pub fn lock(&self) {
        self.locked.store(true, Ordering::SeqCst);
    }

    pub fn unlock(&self) {
        self.locked.store(false, Ordering::SeqCst);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> EngineResult<()> {
        if self.is_locked() {
            return Err(EngineError::ServiceLocked);
        }
        Ok(())
    }
}

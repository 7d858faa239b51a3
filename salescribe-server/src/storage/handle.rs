//! Active-backend state shared by every storage operation
//!
//! The only automatic transition is `Durable -> Volatile`. It is a single
//! compare-and-set, so among racing callers exactly one observes it.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

const DURABLE: u8 = 0;
const VOLATILE: u8 = 1;

/// Which backend serves storage operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Durable,
    Volatile,
}

impl BackendKind {
    fn as_u8(self) -> u8 {
        match self {
            BackendKind::Durable => DURABLE,
            BackendKind::Volatile => VOLATILE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Durable => "durable",
            BackendKind::Volatile => "volatile",
        }
    }
}

#[derive(Debug)]
pub struct StorageHandle {
    active: AtomicU8,
    failovers: AtomicU64,
}

impl StorageHandle {
    pub fn new(initial: BackendKind) -> Self {
        Self {
            active: AtomicU8::new(initial.as_u8()),
            failovers: AtomicU64::new(0),
        }
    }

    pub fn active(&self) -> BackendKind {
        if self.active.load(Ordering::Acquire) == DURABLE {
            BackendKind::Durable
        } else {
            BackendKind::Volatile
        }
    }

    /// Switch `Durable -> Volatile`. Returns true only for the caller that
    /// performed the transition.
    pub fn degrade(&self) -> bool {
        let switched = self
            .active
            .compare_exchange(DURABLE, VOLATILE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if switched {
            self.failovers.fetch_add(1, Ordering::Relaxed);
        }
        switched
    }

    /// Switch `Volatile -> Durable` after an explicit health re-check
    pub fn restore(&self) -> bool {
        self.active
            .compare_exchange(VOLATILE, DURABLE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Number of `Durable -> Volatile` transitions since startup
    pub fn failover_count(&self) -> u64 {
        self.failovers.load(Ordering::Relaxed)
    }
}

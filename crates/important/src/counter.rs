//! Process-wide unseen error counter.
//!
//! One `AtomicI64`, const-initialized to zero before `main` and never reset.
//! Every [`ImportantError`](crate::ImportantError) adds one when it is
//! created and removes one the first time its cause is revealed, so the
//! value is always:
//!
//! ```text
//! created wrappers − wrappers observed at least once
//! ```
//!
//! A wrapper that is dropped without being observed keeps its +1 forever.
//! That residue is the signal; nothing here tries to clean it up.

use core::sync::atomic::{AtomicI64, Ordering};

static UNSEEN: AtomicI64 = AtomicI64::new(0);

/// Count a new wrapper. Returns the updated value.
#[inline]
pub(crate) fn increment() -> i64 {
    UNSEEN.fetch_add(1, Ordering::Relaxed) + 1
}

/// Count a first observation. Returns the updated value.
///
/// Only the winner of a wrapper's seen-flag CAS may call this.
#[inline]
pub(crate) fn decrement() -> i64 {
    UNSEEN.fetch_sub(1, Ordering::Relaxed) - 1
}

/// Unseen error count since the start of the program.
///
/// Negative values mean the bookkeeping is broken.
#[inline]
pub fn unseen() -> i64 {
    UNSEEN.load(Ordering::Relaxed)
}

// ── Baseline ──────────────────────────────────────────────────────

/// Snapshot of [`unseen()`] for measuring deltas.
///
/// Other threads may create or observe important errors concurrently, so
/// absolute values are rarely meaningful. Take a baseline, run the code
/// under test, then compare.
///
/// ```
/// let baseline = important::Baseline::new();
/// let err = important::error("lost write");
/// assert_eq!(baseline.delta(), 1);
///
/// important::unwrap(&err);
/// assert!(baseline.is_clean());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baseline {
    start: i64,
}

impl Baseline {
    pub fn new() -> Self {
        Self { start: unseen() }
    }

    /// Value of the counter when this baseline was taken.
    #[inline]
    pub fn start(&self) -> i64 {
        self.start
    }

    /// Errors created but not observed since the baseline.
    #[inline]
    pub fn delta(&self) -> i64 {
        unseen() - self.start
    }

    #[inline]
    pub fn is_clean(&self) -> bool {
        self.delta() == 0
    }
}

impl Default for Baseline {
    fn default() -> Self {
        Self::new()
    }
}

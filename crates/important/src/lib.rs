//! # important — errors that have to be looked at
//!
//! Flag returned error values as *important*. Important errors need to be
//! observed, and observation means revealing the wrapped cause, through
//! [`ImportantError::reveal`] or through [`std::error::Error::source`],
//! which every generic chain walker uses. Unobserved errors have no side
//! effects by default; they are counted, and tests or monitoring decide
//! what to make of the count.
//!
//! ## Design
//!
//! ```text
//!   error(cause) ──► UNSEEN += 1          ImportantError { cause, seen }
//!                                                    │
//!   err.source() / reveal() / chain::* / unwrap()    │ first time only
//!                                                    ▼  (CAS false → true)
//!                                          UNSEEN -= 1
//! ```
//!
//! - One process-wide counter, [`unseen()`], read with a relaxed load.
//! - One flag per error, flipped by a single compare-and-swap. Concurrent
//!   readers get the same cause and exactly one decrement.
//! - Formatting with `{}` / `{:?}` does not observe. Walking the chain does.
//! - Dropping an unobserved error leaves the counter raised for good.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::error::Error;
//!
//! let baseline = important::unseen();
//!
//! let (err, seen) = important::error_seen("forget me not");
//! assert_eq!(important::unseen(), baseline + 1);
//!
//! println!("{err}");                      // not observed
//! assert!(!seen.get());
//!
//! let cause = err.source().map(|e| e.to_string());
//! assert_eq!(cause.as_deref(), Some("forget me not"));
//! assert!(seen.get());
//! assert_eq!(important::unseen(), baseline);
//! ```
//!
//! ## Feature Flags
//!
//! | Flag        | Effect |
//! |-------------|--------|
//! | `tracing`   | `trace!` events on creation and first observation |
//! | `backtrace` | Captures `std::backtrace::Backtrace` when an error is wrapped |

mod counter;
mod error;
mod convert;
pub mod chain;

// ── Public API ────────────────────────────────────────────────────

pub use counter::{unseen, Baseline};
pub use error::{error, error_seen, ImportantError, Seen};
pub use convert::ResultExt;
pub use chain::unwrap;

/// Boxed error accepted as a cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

use std::error::Error;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[cfg(feature = "backtrace")]
use std::backtrace::Backtrace;

use crate::counter;
use crate::BoxError;

/// An error flagged as important: somebody has to look at its cause.
///
/// Creating one bumps the process-wide [`unseen()`](crate::unseen) count.
/// The count comes back down the first time the wrapped cause is revealed,
/// either explicitly through [`reveal()`](Self::reveal) or implicitly
/// through [`Error::source()`], which is what every chain walker calls.
///
/// Formatting with `{}` or `{:?}` is *not* an observation. Printing a
/// message says nothing about whether the caller examined what went wrong.
///
/// Dropping an unobserved `ImportantError` leaves the count elevated for
/// the rest of the process.
pub struct ImportantError {
    cause: Option<BoxError>,
    seen: Arc<AtomicBool>,

    #[cfg(feature = "backtrace")]
    backtrace: Backtrace,
}

/// Read-only view of one [`ImportantError`]'s seen flag.
///
/// Outlives the error it was created with. Cheap to clone, safe to poll
/// from any thread at any time.
#[derive(Clone)]
pub struct Seen {
    flag: Arc<AtomicBool>,
}

// ── Constructors ──────────────────────────────────────────────────

impl ImportantError {
    /// Wrap `cause`, which may be absent, and return the error together
    /// with its [`Seen`] handle.
    ///
    /// An absent cause is kept as-is: [`reveal()`](Self::reveal) returns
    /// `None` but still counts as an observation.
    pub fn new(cause: Option<BoxError>) -> (Self, Seen) {
        let _unseen = counter::increment();

        #[cfg(feature = "tracing")]
        tracing::trace!(unseen = _unseen, "important error created");

        let flag = Arc::new(AtomicBool::new(false));
        let err = Self {
            cause,
            seen: Arc::clone(&flag),
            #[cfg(feature = "backtrace")]
            backtrace: Backtrace::capture(),
        };
        (err, Seen { flag })
    }
}

/// Wrap the error, flagging it as important.
///
/// ```
/// let err = important::error(std::io::Error::other("disk full"));
/// assert_eq!(err.to_string(), "disk full");
/// ```
pub fn error<E>(cause: E) -> ImportantError
where
    E: Into<BoxError>,
{
    let (err, _) = ImportantError::new(Some(cause.into()));
    err
}

/// Wrap the error, flagging it as important. The returned [`Seen`] tells
/// whether the error has been observed; it may be checked any number of
/// times, at any time.
pub fn error_seen<E>(cause: E) -> (ImportantError, Seen)
where
    E: Into<BoxError>,
{
    ImportantError::new(Some(cause.into()))
}

// ── Observation ───────────────────────────────────────────────────

impl ImportantError {
    /// Return the wrapped cause, marking this error as observed.
    ///
    /// Only the first call on a given error lowers the unseen count, no
    /// matter how many threads race for it. Every call returns the same
    /// reference.
    pub fn reveal(&self) -> Option<&(dyn Error + Send + Sync + 'static)> {
        self.observe();
        self.cause.as_deref()
    }

    /// Consume the error and return its cause, marking it as observed.
    pub fn into_cause(self) -> Option<BoxError> {
        self.observe();
        self.cause
    }

    /// Whether the cause has been revealed. Does not observe.
    #[inline]
    pub fn is_seen(&self) -> bool {
        self.seen.load(Ordering::Acquire)
    }

    /// Where this error was created.
    ///
    /// Capture follows `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`, see
    /// [`Backtrace::capture`].
    #[cfg(feature = "backtrace")]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    fn observe(&self) {
        if self.seen.load(Ordering::Acquire) {
            return;
        }
        if self
            .seen
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let _unseen = counter::decrement();

            #[cfg(feature = "tracing")]
            tracing::trace!(unseen = _unseen, "important error observed");
        }
    }
}

// ── std::error::Error ─────────────────────────────────────────────

impl Error for ImportantError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.reveal().map(|cause| cause as &(dyn Error + 'static))
    }
}

// ── Display / Debug ───────────────────────────────────────────────

impl fmt::Display for ImportantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => fmt::Display::fmt(cause, f),
            None => f.write_str("<none>"),
        }
    }
}

impl fmt::Debug for ImportantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImportantError")
            .field("cause", &self.cause)
            .field("seen", &self.is_seen())
            .finish()
    }
}

// ── Seen ──────────────────────────────────────────────────────────

impl Seen {
    /// Whether the error has been observed.
    #[inline]
    pub fn get(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// The same check as a plain closure, for APIs that want `Fn() -> bool`.
    pub fn as_fn(&self) -> impl Fn() -> bool + Send + Sync + 'static {
        let flag = Arc::clone(&self.flag);
        move || flag.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Seen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Seen").field("seen", &self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::serial;
    use crate::unseen;
    use std::sync::Barrier;
    use std::thread;

    #[derive(Debug, PartialEq)]
    struct Eof;

    impl fmt::Display for Eof {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("EOF")
        }
    }

    impl Error for Eof {}

    #[test]
    fn wrap_counts_once() {
        let _guard = serial();
        let before = unseen();

        let err = error(Eof);
        assert_eq!(unseen(), before + 1);
        assert!(!err.is_seen());
    }

    #[test]
    fn dropped_error_stays_unseen() {
        let _guard = serial();
        let before = unseen();

        let (err, seen) = error_seen(Eof);
        drop(err);
        assert_eq!(unseen(), before + 1);
        assert!(!seen.get());
    }

    #[test]
    fn display_is_not_observation() {
        let _guard = serial();
        let (err, seen) = error_seen(Eof);

        assert_eq!(err.to_string(), "EOF");
        assert!(!seen.get());
        assert!(!seen.get());
    }

    #[test]
    fn debug_is_not_observation() {
        let _guard = serial();
        let (err, seen) = error_seen(Eof);

        let s = format!("{:?}", err);
        assert!(s.contains("Eof"), "expected cause in: {}", s);
        assert!(s.contains("seen: false"), "expected flag in: {}", s);
        assert!(!seen.get());
    }

    #[test]
    fn source_observes() {
        let _guard = serial();
        let before = unseen();
        let (err, seen) = error_seen(Eof);

        let cause = err.source().and_then(|e| e.downcast_ref::<Eof>());
        assert_eq!(cause, Some(&Eof));
        assert!(seen.get());
        assert!(err.is_seen());
        assert_eq!(unseen(), before);
    }

    #[test]
    fn repeated_reveal_decrements_once() {
        let _guard = serial();
        let before = unseen();

        let w1 = error("a");
        let w2 = error("b");
        assert_eq!(unseen(), before + 2);

        w1.reveal();
        assert_eq!(unseen(), before + 1);

        w2.reveal();
        w2.reveal();
        assert_eq!(unseen(), before);

        w1.source();
        w2.source();
        assert_eq!(unseen(), before);
    }

    #[test]
    fn seen_before_and_after() {
        let _guard = serial();
        let (err, seen) = error_seen("x");
        let poll = seen.as_fn();

        for _ in 0..3 {
            assert!(!seen.get());
            assert!(!poll());
        }

        let _ = err.to_string();
        assert!(!seen.get());

        assert_eq!(err.reveal().map(|e| e.to_string()), Some("x".to_string()));
        drop(err);

        for _ in 0..3 {
            assert!(seen.get());
            assert!(poll());
        }
        assert!(format!("{:?}", seen).contains("true"));
    }

    #[test]
    fn absent_cause() {
        let _guard = serial();
        let before = unseen();

        let (err, seen) = ImportantError::new(None);
        assert_eq!(unseen(), before + 1);
        assert_eq!(err.to_string(), "<none>");

        assert!(err.reveal().is_none());
        assert!(seen.get());
        assert_eq!(unseen(), before);

        assert!(err.source().is_none());
        assert_eq!(unseen(), before);
    }

    #[test]
    fn into_cause_observes() {
        let _guard = serial();
        let before = unseen();
        let (err, seen) = error_seen(Eof);

        let cause = err.into_cause();
        assert!(cause.is_some_and(|c| c.downcast_ref::<Eof>().is_some()));
        assert!(seen.get());
        assert_eq!(unseen(), before);
    }

    #[test]
    fn nested_important_errors() {
        let _guard = serial();
        let before = unseen();

        let (inner, inner_seen) = error_seen(Eof);
        let (outer, outer_seen) = error_seen(inner);
        assert_eq!(unseen(), before + 2);

        let next = outer.source();
        assert!(outer_seen.get());
        assert!(!inner_seen.get());
        assert_eq!(unseen(), before + 1);

        let root = next.and_then(|e| e.source());
        assert_eq!(root.and_then(|e| e.downcast_ref::<Eof>()), Some(&Eof));
        assert!(inner_seen.get());
        assert_eq!(unseen(), before);
    }

    #[test]
    fn concurrent_reveal_decrements_once() {
        let _guard = serial();
        let before = unseen();

        for _ in 0..300 {
            let (err, seen) = error_seen(Eof);
            let err = Arc::new(err);
            let start = Arc::new(Barrier::new(8));
            let mut handles = vec![];

            for _ in 0..8 {
                let err = Arc::clone(&err);
                let start = Arc::clone(&start);
                handles.push(thread::spawn(move || {
                    start.wait();
                    err.reveal()
                        .map(|c| c as *const (dyn Error + Send + Sync) as *const () as usize)
                }));
            }

            let addrs: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

            assert!(addrs[0].is_some());
            assert!(addrs.iter().all(|a| *a == addrs[0]));
            assert!(seen.get());
            assert_eq!(unseen(), before);
        }
    }

    #[test]
    fn seen_polled_from_other_threads() {
        let _guard = serial();
        let (err, seen) = error_seen(Eof);

        let watcher = {
            let seen = seen.clone();
            thread::spawn(move || seen.get())
        };
        assert!(!watcher.join().unwrap());

        err.reveal();

        let watcher = thread::spawn(move || seen.get());
        assert!(watcher.join().unwrap());
    }

    #[cfg(feature = "backtrace")]
    #[test]
    fn backtrace_is_kept() {
        use std::backtrace::BacktraceStatus;

        let _guard = serial();
        let err = error(Eof);
        let status = err.backtrace().status();
        assert!(matches!(status, BacktraceStatus::Captured | BacktraceStatus::Disabled));
        err.reveal();
    }

    #[test]
    fn send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ImportantError>();
        assert_send_sync::<Seen>();
    }
}

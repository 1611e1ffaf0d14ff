//! Walking the `source()` chain.
//!
//! Every walker here advances with [`Error::source()`] and nothing else, so
//! passing through an [`ImportantError`] marks it observed, the same as any
//! third-party walker would (`anyhow`'s `chain()`, `{:#}` formatting, ...).
//!
//! ```text
//! Context("loading config")
//!       │ source()
//!       ▼
//! ImportantError          ← observed when the walk moves past it
//!       │ source()
//!       ▼
//! io::Error(NotFound)
//! ```
//!
//! Sources are fetched lazily: a layer's `source()` is only called when the
//! walk actually moves beyond it. A search that stops *at* an
//! `ImportantError` does not observe it.

use std::error::Error;
use std::iter::FusedIterator;

use crate::ImportantError;

/// Iterator over an error and its sources, outermost first.
#[derive(Clone)]
pub struct Chain<'a> {
    current: Option<&'a (dyn Error + 'static)>,
    started: bool,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a (dyn Error + 'static);

    fn next(&mut self) -> Option<Self::Item> {
        if self.started {
            self.current = self.current?.source();
        } else {
            self.started = true;
        }
        self.current
    }
}

impl FusedIterator for Chain<'_> {}

/// Iterate over `err` and every error below it.
pub fn iter<'a>(err: &'a (dyn Error + 'static)) -> Chain<'a> {
    Chain { current: Some(err), started: false }
}

/// Unwrap exactly one level.
#[inline]
pub fn unwrap_one<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a (dyn Error + 'static)> {
    err.source()
}

/// First error in the chain whose concrete type is `T`.
pub fn find<'a, T>(err: &'a (dyn Error + 'static)) -> Option<&'a T>
where
    T: Error + 'static,
{
    iter(err).find_map(|e| e.downcast_ref::<T>())
}

/// Whether any error in the chain is a `T` equal to `target`.
pub fn is<T>(err: &(dyn Error + 'static), target: &T) -> bool
where
    T: Error + PartialEq + 'static,
{
    iter(err).any(|e| e.downcast_ref::<T>().is_some_and(|e| e == target))
}

/// The innermost error. Walks (and observes) the whole chain.
pub fn root_cause<'a>(err: &'a (dyn Error + 'static)) -> &'a (dyn Error + 'static) {
    iter(err).last().unwrap_or(err)
}

/// Unwrap until the outermost [`ImportantError`] and return the error it
/// wraps, marking it observed.
///
/// Layers above the important error are walked through without side
/// effects, so this can flag an error as observed after it has been wrapped
/// with extra context. Returns `None` when the chain holds no important
/// error (or when the one found has no cause).
///
/// ```
/// use std::error::Error;
///
/// #[derive(Debug)]
/// struct Context(important::ImportantError);
///
/// impl std::fmt::Display for Context {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str("loading config")
///     }
/// }
///
/// impl Error for Context {
///     fn source(&self) -> Option<&(dyn Error + 'static)> {
///         Some(&self.0)
///     }
/// }
///
/// let (err, seen) = important::error_seen("permission denied");
/// let err = Context(err);
///
/// let cause = important::unwrap(&err).map(|e| e.to_string());
/// assert_eq!(cause.as_deref(), Some("permission denied"));
/// assert!(seen.get());
/// ```
pub fn unwrap<'a>(err: &'a (dyn Error + 'static)) -> Option<&'a (dyn Error + 'static)> {
    let tracked = find::<ImportantError>(err)?;
    tracked.reveal().map(|cause| cause as &(dyn Error + 'static))
}

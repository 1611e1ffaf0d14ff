use crate::{BoxError, ImportantError, Seen};

// ── ResultExt — flag errors during propagation ────────────────────

/// Extension trait for flagging the error side of any `Result` as
/// important, right at the call site that propagates it.
///
/// ```
/// use important::ResultExt;
///
/// fn flush() -> Result<(), std::io::Error> {
///     Err(std::io::Error::other("short write"))
/// }
///
/// let err = flush().important().unwrap_err();
/// assert_eq!(err.to_string(), "short write");
/// ```
pub trait ResultExt<T> {
    /// Flag the error, if any, as important.
    fn important(self) -> Result<T, ImportantError>;

    /// Flag the error, if any, as important and hand back its [`Seen`]
    /// handle alongside.
    fn important_seen(self) -> Result<T, (ImportantError, Seen)>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<BoxError>,
{
    fn important(self) -> Result<T, ImportantError> {
        self.map_err(crate::error)
    }

    fn important_seen(self) -> Result<T, (ImportantError, Seen)> {
        self.map_err(crate::error_seen)
    }
}

//! Capture of panics raised while a fragment is processed.
//!
//! Injected collaborators (file regions, content type classifiers) run inside
//! the aggregator. A panic there resolves the aggregation with
//! [`AggregationError::Panicked`](crate::AggregationError::Panicked) carrying
//! the text captured here, instead of unwinding into the transport.

use std::{
    any::Any,
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
};

/// Text of a captured panic payload.
///
/// String payloads are kept verbatim; any other payload is rendered with
/// `Debug`.
///
/// ```
/// use lambda_aggregator::panic::PanicMessage;
/// assert_eq!(PanicMessage::from_payload(Box::new("boom")).as_str(), "boom");
/// assert_eq!(
///     PanicMessage::from_payload(Box::new(String::from("boom"))).as_str(),
///     "boom"
/// );
/// assert!(PanicMessage::from_payload(Box::new(5_u32)).as_str().contains("Any"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanicMessage(String);

impl PanicMessage {
    /// Render `payload` as text.
    #[must_use]
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let text = match payload.downcast::<String>() {
            Ok(text) => *text,
            Err(payload) => match payload.downcast_ref::<&'static str>() {
                Some(text) => (*text).to_owned(),
                None => format!("{payload:?}"),
            },
        };
        Self(text)
    }

    /// Captured text.
    #[must_use]
    pub fn as_str(&self) -> &str { &self.0 }

    /// Consume the message, returning its text.
    #[must_use]
    pub fn into_string(self) -> String { self.0 }
}

impl fmt::Display for PanicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Run `f`, turning a panic into a [`PanicMessage`].
///
/// `f` is treated as unwind safe: callers discard or fail any state `f` may
/// have left half-updated.
///
/// # Errors
///
/// Returns the captured message when `f` panics.
pub fn catch_panic<T>(f: impl FnOnce() -> T) -> Result<T, PanicMessage> {
    catch_unwind(AssertUnwindSafe(f)).map_err(PanicMessage::from_payload)
}

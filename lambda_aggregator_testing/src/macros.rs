//! Assertion macros shared by test helpers and integration tests.

/// Await an aggregation result and panic with contextual diagnostics on
/// failure.
#[macro_export]
macro_rules! response_expect {
    ($fut:expr) => {{
        $fut.await
            .expect(concat!("aggregation failed at ", file!(), ":", line!()))
    }};
    ($fut:expr, $msg:expr) => {{
        let m = ::std::format!("{msg} at {}:{}", file!(), line!(), msg = $msg);
        $fut.await.expect(&m)
    }};
}

/// Await an aggregation result and panic if it produced a response.
#[macro_export]
macro_rules! failure_expect {
    ($fut:expr) => {{
        $fut.await
            .expect_err(concat!("aggregation succeeded at ", file!(), ":", line!()))
    }};
}

pub use crate::{failure_expect, response_expect};

//! Single-resolution completion shared between producer and consumer.
//!
//! The producer side holds a [`Resolver`] wrapping a one-shot sender behind a
//! mutex: the first call to [`Resolver::resolve`] takes the sender and every
//! later call observes `None`, so resolution happens exactly once even when a
//! close signal races fragment delivery. The consumer side awaits a
//! [`ResponseFuture`], a cloneable handle to one shared future.

use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    task::{Context, Poll},
};

use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use tokio::sync::oneshot;

use crate::{error::AggregationError, response::AggregatedResponse};

/// Outcome observed by the consumer of an aggregation.
pub type AggregationOutcome = Result<AggregatedResponse, AggregationError>;

type Sender = oneshot::Sender<AggregationOutcome>;

/// Producer half: resolves the paired [`ResponseFuture`] at most once.
#[derive(Clone, Debug)]
pub(crate) struct Resolver {
    sender: Arc<Mutex<Option<Sender>>>,
}

impl Resolver {
    fn lock(&self) -> MutexGuard<'_, Option<Sender>> {
        self.sender.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Resolve with `outcome`. Returns `false` if already resolved.
    pub(crate) fn resolve(&self, outcome: AggregationOutcome) -> bool {
        let Some(sender) = self.lock().take() else {
            return false;
        };
        // the consumer may have stopped listening; resolution still counts
        let _ = sender.send(outcome);
        true
    }

    /// Whether a resolution has already happened.
    pub(crate) fn is_resolved(&self) -> bool { self.lock().is_none() }
}

/// Awaitable result of one aggregation.
///
/// Clones share the same underlying future and observe the same outcome. If
/// every producer handle is dropped before resolving, the future resolves with
/// [`AggregationError::ConnectionClosed`].
#[derive(Clone)]
#[must_use = "futures do nothing unless awaited"]
pub struct ResponseFuture {
    inner: Shared<BoxFuture<'static, AggregationOutcome>>,
}

impl ResponseFuture {
    /// Outcome if the future has already completed.
    #[must_use]
    pub fn peek(&self) -> Option<&AggregationOutcome> { self.inner.peek() }

    /// Whether `self` and `other` are handles to the same aggregation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool { Shared::ptr_eq(&self.inner, &other.inner) }
}

impl Future for ResponseFuture {
    type Output = AggregationOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl std::fmt::Debug for ResponseFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseFuture")
            .field("completed", &self.peek().is_some())
            .finish()
    }
}

/// Create a connected resolver and future.
pub(crate) fn channel() -> (Resolver, ResponseFuture) {
    let (tx, rx) = oneshot::channel();
    let inner = async move { rx.await.unwrap_or(Err(AggregationError::ConnectionClosed)) }
        .boxed()
        .shared();
    (
        Resolver {
            sender: Arc::new(Mutex::new(Some(tx))),
        },
        ResponseFuture { inner },
    )
}

/// Handle that lets a transport task other than the fragment producer signal
/// an abnormal close.
#[derive(Clone, Debug)]
pub struct CloseHandle {
    resolver: Resolver,
}

impl CloseHandle {
    pub(crate) fn new(resolver: Resolver) -> Self { Self { resolver } }

    /// Resolve with [`AggregationError::ConnectionClosed`] unless already
    /// resolved. Returns whether this call resolved the aggregation.
    pub fn close_abnormally(&self) -> bool {
        let closed = self.resolver.resolve(Err(AggregationError::ConnectionClosed));
        if closed {
            tracing::debug!("response aggregation closed by transport handle");
        }
        closed
    }

    /// Whether the aggregation has already resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool { self.resolver.is_resolved() }
}

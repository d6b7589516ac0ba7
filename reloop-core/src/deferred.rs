use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::Failure;

/// Outcome of a run function, available now or later.
///
/// The runner is written once against this type; whether the work finished
/// synchronously only matters for `force_sync` commands.
pub enum Deferred<T> {
    Ready(Result<T, Failure>),
    Pending(BoxFuture<'static, Result<T, Failure>>),
}

impl<T: Send + 'static> Deferred<T> {
    pub fn ok(value: T) -> Self {
        Deferred::Ready(Ok(value))
    }

    pub fn fail(reason: impl Into<Failure>) -> Self {
        Deferred::Ready(Err(reason.into()))
    }

    /// Wrap a future; the runner awaits it.
    pub fn later<F, E>(fut: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        E: Into<Failure>,
    {
        Deferred::Pending(fut.map(|res| res.map_err(Into::into)).boxed())
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Deferred::Pending(_))
    }

    /// Apply `f` to the successful value once it is available.
    pub fn map<U: Send + 'static>(self, f: impl FnOnce(T) -> U + Send + 'static) -> Deferred<U> {
        match self {
            Deferred::Ready(res) => Deferred::Ready(res.map(f)),
            Deferred::Pending(fut) => Deferred::Pending(fut.map(|res| res.map(f)).boxed()),
        }
    }
}

/// Anything a run function may return.
pub trait IntoDeferred<T> {
    fn into_deferred(self) -> Deferred<T>;
}

impl<T> IntoDeferred<T> for Deferred<T> {
    fn into_deferred(self) -> Deferred<T> {
        self
    }
}

impl<T, E: Into<Failure>> IntoDeferred<T> for Result<T, E> {
    fn into_deferred(self) -> Deferred<T> {
        Deferred::Ready(self.map_err(Into::into))
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Deferred::Ready(Ok(_)) => f.write_str("Deferred::Ready(Ok(..))"),
            Deferred::Ready(Err(e)) => write!(f, "Deferred::Ready(Err({e}))"),
            Deferred::Pending(_) => f.write_str("Deferred::Pending"),
        }
    }
}

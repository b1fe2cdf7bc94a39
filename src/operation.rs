use crate::error::AttemptError;
use crate::types::Endpoint;
use std::future::Future;
use std::pin::Pin;

pub type AttemptFuture<T> = Pin<Box<dyn Future<Output = std::result::Result<T, AttemptError>> + Send>>;

/// "Do X against endpoint E."
///
/// Invoked concurrently against several endpoints and possibly many times
/// per call, so implementations must be stateless with respect to a single
/// attempt and must not retry on their own.
pub trait Operation: Send + Sync + 'static {
    type Output: Send + 'static;

    fn attempt(&self, endpoint: Endpoint) -> AttemptFuture<Self::Output>;

    /// Label used in log lines.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Operation backed by a closure, see [`operation_fn`].
pub struct FnOperation<F> {
    name: &'static str,
    f: F,
}

/// Wrap `Fn(Endpoint) -> impl Future` as an [`Operation`].
pub fn operation_fn<F, Fut, T>(name: &'static str, f: F) -> FnOperation<F>
where
    F: Fn(Endpoint) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<T, AttemptError>> + Send + 'static,
    T: Send + 'static,
{
    FnOperation { name, f }
}

impl<F, Fut, T> Operation for FnOperation<F>
where
    F: Fn(Endpoint) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<T, AttemptError>> + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn attempt(&self, endpoint: Endpoint) -> AttemptFuture<T> {
        Box::pin((self.f)(endpoint))
    }

    fn name(&self) -> &str {
        self.name
    }
}

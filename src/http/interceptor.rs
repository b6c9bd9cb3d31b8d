//! Ordered interceptor registries.
//!
//! An [`InterceptorManager`] is an append-only list of handler pairs for one
//! direction (request or response). The registry only stores handlers and
//! exposes them in registration order; the executor decides the traversal
//! direction for each phase.
//!
//! Registration takes `&self` and never waits on in-flight calls. Each call
//! works on a snapshot taken when it starts, so a handler registered while a
//! call is running may or may not be seen by that call.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};

use futures::future::BoxFuture;

use super::error::HttpError;
use super::request::RequestDescriptor;
use super::response::ResponseEnvelope;

pub type FulfilledFn<T> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<T, HttpError>> + Send + Sync>;
pub type RejectedFn<T> = Arc<dyn Fn(HttpError) -> BoxFuture<'static, Result<T, HttpError>> + Send + Sync>;
pub type RunWhenFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// A fulfilment/rejection handler pair with an optional gate.
///
/// Both handlers are optional. A missing `on_fulfilled` passes the value
/// through unchanged; a missing `on_rejected` hands the error back
/// unchanged.
pub struct Interceptor<T> {
    on_fulfilled: Option<FulfilledFn<T>>,
    on_rejected: Option<RejectedFn<T>>,
    run_when: Option<RunWhenFn<T>>,
}

impl<T: Send + 'static> Interceptor<T> {
    pub fn new() -> Self {
        Self {
            on_fulfilled: None,
            on_rejected: None,
            run_when: None,
        }
    }

    pub fn on_fulfilled<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, HttpError>> + Send + 'static,
    {
        self.on_fulfilled = Some(Arc::new(move |value| -> BoxFuture<'static, Result<T, HttpError>> {
            Box::pin(handler(value))
        }));
        self
    }

    pub fn on_rejected<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(HttpError) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, HttpError>> + Send + 'static,
    {
        self.on_rejected = Some(Arc::new(move |error| -> BoxFuture<'static, Result<T, HttpError>> {
            Box::pin(handler(error))
        }));
        self
    }

    /// Only run this interceptor for values the predicate accepts.
    ///
    /// The predicate is evaluated for every call, at the moment the
    /// interceptor's turn comes.
    pub fn run_when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.run_when = Some(Arc::new(predicate));
        self
    }

    pub fn should_run(&self, value: &T) -> bool {
        self.run_when.as_ref().is_none_or(|predicate| predicate(value))
    }

    pub async fn fulfill(&self, value: T) -> Result<T, HttpError> {
        match &self.on_fulfilled {
            Some(handler) => handler(value).await,
            None => Ok(value),
        }
    }

    pub async fn reject(&self, error: HttpError) -> Result<T, HttpError> {
        match &self.on_rejected {
            Some(handler) => handler(error).await,
            None => Err(error),
        }
    }
}

impl<T: Send + 'static> Default for Interceptor<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Interceptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("on_fulfilled", &self.on_fulfilled.is_some())
            .field("on_rejected", &self.on_rejected.is_some())
            .field("run_when", &self.run_when.is_some())
            .finish()
    }
}

/// Positional handle returned by [`InterceptorManager::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterceptorHandle(usize);

impl InterceptorHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

pub struct InterceptorManager<T> {
    handlers: RwLock<Vec<Option<Arc<Interceptor<T>>>>>,
}

impl<T: Send + 'static> InterceptorManager<T> {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Appends `interceptor` and returns its position.
    pub fn register(&self, interceptor: Interceptor<T>) -> InterceptorHandle {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers.push(Some(Arc::new(interceptor)));
        InterceptorHandle(handlers.len() - 1)
    }

    /// Removes the interceptor at `handle`. Other handles stay valid.
    ///
    /// Returns `false` if the slot was already empty or never existed.
    pub fn eject(&self, handle: InterceptorHandle) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        handlers
            .get_mut(handle.0)
            .is_some_and(|slot| slot.take().is_some())
    }

    /// Ejects every interceptor. Handles issued earlier are not reused.
    pub fn clear(&self) {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        for slot in handlers.iter_mut() {
            *slot = None;
        }
    }

    /// Number of registered, non-ejected interceptors.
    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flatten()
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visits the live interceptors in registration order.
    pub fn for_each(&self, mut visit: impl FnMut(&Arc<Interceptor<T>>)) {
        for interceptor in self.snapshot() {
            visit(&interceptor);
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<Arc<Interceptor<T>>> {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flatten()
            .cloned()
            .collect()
    }
}

impl<T: Send + 'static> Default for InterceptorManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for InterceptorManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.handlers.read().map(|h| h.len()).unwrap_or_default();
        f.debug_struct("InterceptorManager").field("slots", &slots).finish()
    }
}

/// The two registries owned by a client.
#[derive(Debug, Default)]
pub struct Interceptors {
    pub request: InterceptorManager<RequestDescriptor>,
    pub response: InterceptorManager<ResponseEnvelope>,
}

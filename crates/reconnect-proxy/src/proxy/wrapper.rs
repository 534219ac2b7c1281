//! Reconnecting proxy around a client handle
//!
//! The proxy holds the wrapped handle and the shared, immutable retry
//! context. Member access goes through [`ReconnectProxy::attr`], which
//! decides per member name whether a call is retried.

use std::fmt;
use std::sync::Arc;

use reconnect_core::{Connection, Document, Handle, Member, Result, SurfaceDescriptor};

use crate::classifier::OperationSet;
use crate::config::{ConfigError, ProxyConfig};
use crate::retry::RetryPolicy;

/// Retry context shared by a proxy and every proxy derived from it
#[derive(Debug)]
struct Shared {
    operations: Arc<OperationSet>,
    policy: RetryPolicy,
}

/// A handle wrapper that retries operations failing with `AutoReconnect`
///
/// The proxy implements the same handle traits as the value it wraps, so it
/// can stand in for it anywhere:
///
/// - operations (public methods in the operation set) run through the
///   retry policy;
/// - other methods and attributes are forwarded unchanged;
/// - subscript accessors return new proxies around the nested handle;
/// - `Display`, `Debug` and `Handle::members` describe the wrapped handle.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use reconnect_core::{Connection, MemoryConnection};
/// use reconnect_proxy::wrap;
///
/// let conn = wrap(Arc::new(MemoryConnection::new("localhost", 27017)));
/// let users = conn.database("app").unwrap().collection("users").unwrap();
/// assert_eq!(users.count().unwrap(), 0);
/// ```
pub struct ReconnectProxy<T: ?Sized> {
    inner: Arc<T>,
    shared: Arc<Shared>,
}

impl<T: ?Sized> Clone for ReconnectProxy<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<T: Handle + ?Sized> ReconnectProxy<T> {
    /// Wrap `inner` using the process-wide operation set and the default policy
    pub fn new(inner: Arc<T>) -> Self {
        ProxyBuilder::new().build(inner)
    }

    /// The wrapped handle
    pub fn inner(&self) -> &Arc<T> {
        &self.inner
    }

    pub fn operations(&self) -> &Arc<OperationSet> {
        &self.shared.operations
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.shared.policy
    }

    /// Whether calls to member `name` are retried
    pub fn is_retried(&self, name: &str) -> bool {
        self.inner.surface().is_invocable(name) && self.shared.operations.contains(name)
    }

    /// Resolve member `name` for invocation
    pub fn attr<'a>(&'a self, name: &'a str) -> BoundOperation<'a, T> {
        let policy = self.is_retried(name).then_some(&self.shared.policy);
        if policy.is_none() {
            tracing::trace!(member = name, "passing member through");
        }
        BoundOperation {
            target: &*self.inner,
            name,
            policy,
        }
    }

    /// Subscript access: resolve a nested handle and wrap it in a new proxy
    ///
    /// The lookup itself is not retried.
    pub fn index<U, F>(&self, access: F) -> Result<ReconnectProxy<U>>
    where
        U: Handle + ?Sized,
        F: FnOnce(&T) -> Result<Arc<U>>,
    {
        let nested = access(&*self.inner)?;
        tracing::debug!(parent = %self.inner, nested = %nested, "wrapping nested handle");
        Ok(self.wrap_nested(nested))
    }

    /// Wrap another handle with this proxy's operation set and policy
    pub fn wrap_nested<U: Handle + ?Sized>(&self, inner: Arc<U>) -> ReconnectProxy<U> {
        ReconnectProxy {
            inner,
            shared: self.shared.clone(),
        }
    }
}

impl<T: Handle + ?Sized> Handle for ReconnectProxy<T> {
    fn surface(&self) -> &'static SurfaceDescriptor {
        self.inner.surface()
    }

    fn members(&self) -> &'static [Member] {
        self.inner.members()
    }

    /// Direct invocation is forwarded without retry
    fn invoke(&self, args: &[Document]) -> Result<Document> {
        self.inner.invoke(args)
    }

    /// A proxy is always truthy, whatever the wrapped handle says
    fn truthy(&self) -> bool {
        true
    }
}

impl<T: Handle + ?Sized> fmt::Display for ReconnectProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}

impl<T: Handle + ?Sized> fmt::Debug for ReconnectProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

/// A member resolved through a proxy, ready to be called
///
/// Created per access and never cached; each call starts a fresh retry
/// loop when the member is an operation.
pub struct BoundOperation<'a, T: ?Sized> {
    target: &'a T,
    name: &'a str,
    policy: Option<&'a RetryPolicy>,
}

impl<T: ?Sized> BoundOperation<'_, T> {
    pub fn name(&self) -> &str {
        self.name
    }

    /// Whether calls go through the retry policy
    pub fn is_retried(&self) -> bool {
        self.policy.is_some()
    }

    /// Invoke the member through `f`
    pub fn call<R, F>(&self, mut f: F) -> Result<R>
    where
        F: FnMut(&T) -> Result<R>,
    {
        match self.policy {
            Some(policy) => policy.run(self.name, || f(self.target)),
            None => f(self.target),
        }
    }
}

impl<T: Handle + ?Sized> fmt::Display for BoundOperation<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<bound method {}.{} of {}>",
            self.target.surface().name(),
            self.name,
            self.target
        )
    }
}

impl<T: Handle + ?Sized> fmt::Debug for BoundOperation<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Builder for proxies with a custom operation set or retry policy
#[derive(Debug, Clone, Default)]
pub struct ProxyBuilder {
    operations: Option<Arc<OperationSet>>,
    policy: Option<RetryPolicy>,
}

impl ProxyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take operations and retry settings from a configuration
    pub fn from_config(config: &ProxyConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            operations: Some(config.operation_set()),
            policy: Some(config.retry_policy()),
        })
    }

    pub fn operations(mut self, operations: Arc<OperationSet>) -> Self {
        self.operations = Some(operations);
        self
    }

    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn build<T: Handle + ?Sized>(self, inner: Arc<T>) -> ReconnectProxy<T> {
        ReconnectProxy {
            inner,
            shared: Arc::new(Shared {
                operations: self.operations.unwrap_or_else(OperationSet::global),
                policy: self.policy.unwrap_or_default(),
            }),
        }
    }
}

/// Wrap a connection with the default operation set and retry policy
pub fn wrap<T: Connection + ?Sized>(connection: Arc<T>) -> ReconnectProxy<T> {
    ReconnectProxy::new(connection)
}

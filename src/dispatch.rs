//! Dispatch
//!
//! An [`Operation`] carries one deferred call per transport able to serve
//! it. The [`Dispatcher`] tries transports strictly in order, returns the
//! first success and records every failure until none are left.

use crate::cache::ResponseCache;
use crate::error::{AggregatedFailure, Error, Result, TransportError};
use crate::transport::TransportId;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

type TransportCall<'a, T> = Box<dyn FnOnce() -> BoxFuture<'a, Result<T, TransportError>> + Send + 'a>;

/// Per-call options
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Transport order for this call; the client's default when `None`
    pub transports: Option<Vec<TransportId>>,
    /// Skip both the cache lookup and the cache store
    pub disable_cache: bool,
    /// Budget for each transport attempt
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn transports(mut self, transports: impl IntoIterator<Item = TransportId>) -> Self {
        self.transports = Some(transports.into_iter().collect());
        self
    }

    pub fn disable_cache(mut self) -> Self {
        self.disable_cache = true;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn disable_cache_if(mut self, disable: bool) -> Self {
        self.disable_cache |= disable;
        self
    }
}

/// A named operation with one deferred call per eligible transport
pub struct Operation<'a, T> {
    name: String,
    calls: HashMap<TransportId, TransportCall<'a, T>>,
    cache_key: Option<String>,
    options: RequestOptions,
}

impl<'a, T> Operation<'a, T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calls: HashMap::new(),
            cache_key: None,
            options: RequestOptions::default(),
        }
    }

    /// Register the call used when `transport` is attempted
    pub fn call<F, Fut>(mut self, transport: TransportId, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, TransportError>> + Send + 'a,
    {
        self.calls.insert(transport, Box::new(move || f().boxed()));
        self
    }

    pub fn api<F, Fut>(self, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, TransportError>> + Send + 'a,
    {
        self.call(TransportId::Api, f)
    }

    pub fn cli<F, Fut>(self, f: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = Result<T, TransportError>> + Send + 'a,
    {
        self.call(TransportId::Cli, f)
    }

    /// Cache successful results under `key`
    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supports(&self, transport: TransportId) -> bool {
        self.calls.contains_key(&transport)
    }
}

impl<T> fmt::Debug for Operation<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("transports", &self.calls.keys().collect::<Vec<_>>())
            .field("cache_key", &self.cache_key)
            .field("options", &self.options)
            .finish()
    }
}

/// Reported once per successful call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub operation: String,
    pub transport: TransportId,
    /// Wall-clock time of the winning attempt
    pub duration: Duration,
}

pub type AnalyticsCallback = Arc<dyn Fn(&TransportEvent) + Send + Sync>;

pub struct Dispatcher {
    transports: Vec<TransportId>,
    cache: ResponseCache,
    analytics: Option<AnalyticsCallback>,
}

impl Dispatcher {
    pub fn new(
        transports: Vec<TransportId>,
        cache: ResponseCache,
        analytics: Option<AnalyticsCallback>,
    ) -> Self {
        Self {
            transports,
            cache,
            analytics,
        }
    }

    pub fn transports(&self) -> &[TransportId] {
        &self.transports
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Run `operation` against each transport in order until one succeeds
    pub async fn dispatch<T>(&self, operation: Operation<'_, T>) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        let Operation {
            name,
            mut calls,
            cache_key,
            options,
        } = operation;

        let order = options
            .transports
            .clone()
            .unwrap_or_else(|| self.transports.clone());
        if order.is_empty() {
            return Err(Error::NoTransportsConfigured);
        }

        let cache_key = cache_key.filter(|_| !options.disable_cache);
        if let Some(key) = &cache_key {
            if let Some(value) = self.cache.get::<T>(key) {
                tracing::debug!("{}: cache hit for {}", name, key);
                return Ok(value);
            }
        }

        let mut failure = AggregatedFailure::new();

        for transport in order {
            if failure.get(transport).is_some() {
                continue;
            }

            let Some(call) = calls.remove(&transport) else {
                tracing::debug!("{}: no {} implementation", name, transport);
                failure.record(transport, TransportError::not_implemented(transport));
                continue;
            };

            tracing::debug!("{}: trying {}", name, transport);
            let started = Instant::now();
            let outcome = match options.timeout {
                Some(budget) => match tokio::time::timeout(budget, call()).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(TransportError::unavailable(format!(
                        "timed out after {:?}",
                        budget
                    ))),
                },
                None => call().await,
            };

            match outcome {
                Ok(value) => {
                    let duration = started.elapsed();
                    if let Some(key) = cache_key {
                        self.cache.insert(key, value.clone());
                    }
                    if let Some(analytics) = &self.analytics {
                        analytics(&TransportEvent {
                            operation: name.clone(),
                            transport,
                            duration,
                        });
                    }
                    tracing::debug!("{}: {} succeeded in {:?}", name, transport, duration);
                    return Ok(value);
                },
                Err(error) => {
                    tracing::warn!("{}: {} failed: {}", name, transport, error);
                    failure.record(transport, error);
                },
            }
        }

        Err(Error::Aggregated(failure))
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("transports", &self.transports)
            .field("cache", &self.cache)
            .field("analytics", &self.analytics.is_some())
            .finish()
    }
}

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use tracing::{debug, error, info, trace, warn};

use super::latency::{Latency, LatencyControl};
use super::response::{MockResponse, ResponseOutput};
use crate::client::{Driver, DriverResult, HttpFailure, HttpMethod, HttpRequest, HttpResponse};
use crate::config::HttpConfig;
use crate::error::PatternError;
use crate::lock::{read_lock, write_lock};
use crate::pattern::{match_compiled, CacheStats, CompiledPattern, MatchFlags, PatternCache};

/// Future returned by a [`Handler`].
pub type HandlerFuture = BoxFuture<'static, anyhow::Result<()>>;

/// A mock route handler.
///
/// Implemented for every `Fn(HttpRequest, MockResponse) -> impl Future<Output = anyhow::Result<()>>`.
pub trait Handler: Send + Sync {
    fn handle(&self, request: HttpRequest, response: MockResponse) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(HttpRequest, MockResponse) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn handle(&self, request: HttpRequest, response: MockResponse) -> HandlerFuture {
        self(request, response).boxed()
    }
}

/// A registered route.
pub struct Route {
    /// The template as registered, without the configured prefix.
    pub path: String,
    pub method: HttpMethod,
    /// Prefixed template the route matches against.
    template: String,
    compiled: Arc<CompiledPattern>,
    handler: Arc<dyn Handler>,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("template", &self.template)
            .finish()
    }
}

/// Routes match the whole path, reject a trailing slash and compare case.
const ROUTE_FLAGS: MatchFlags = MatchFlags {
    end: true,
    strict: true,
    sensitive: true,
};

struct MockState {
    base_url: String,
    method: HttpMethod,
    route_prefix: String,
    log_payloads: bool,
    routes: RwLock<Vec<Route>>,
    fallback: RwLock<Option<Arc<dyn Driver>>>,
    cache: PatternCache,
    latency: Latency,
}

/// In-process route table that answers requests like a server would.
///
/// Cloning yields another handle to the same table. Routes are matched in
/// registration order with `exact`, `strict` and `sensitive` all on. Each
/// route keeps the pattern compiled at registration, so dispatch never goes
/// back to the cache.
///
/// # Outcomes
///
/// | Situation                                  | Result                       |
/// |--------------------------------------------|------------------------------|
/// | handler wrote status < 400                 | `Ok(HttpResponse)`           |
/// | handler wrote status >= 400                | `Err`, [`crate::client::FailureKind::Business`] |
/// | handler returned `Err` or panicked         | `Err`, 500 `Handler`         |
/// | JSON content type with an unparsable body  | `Err`, 500 `InvalidBody`     |
/// | path matched only under other methods      | `Err`, 405                   |
/// | nothing matched, fallback configured       | fallback's result            |
/// | nothing matched                            | `Err`, 404                   |
#[derive(Clone)]
pub struct MockDriver {
    state: Arc<MockState>,
}

impl std::fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockDriver")
            .field("routes", &*read_lock(&self.state.routes))
            .field("cache", &self.state.cache)
            .finish()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new(&HttpConfig::default())
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

fn is_json_media_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
}

/// Turn handler output into a response or a failure.
fn normalize(output: ResponseOutput) -> DriverResult {
    let ResponseOutput {
        status,
        headers,
        body,
    } = output;

    let payload = if headers.get("content-type").is_some_and(is_json_media_type) {
        if body.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            match serde_json::from_str(&body) {
                Ok(value) => value,
                Err(e) => {
                    error!(error = %e, status, "Handler declared JSON but body does not parse");
                    return Err(HttpFailure::invalid_body(headers, body));
                }
            }
        }
    } else {
        Value::String(body)
    };

    let response = HttpResponse::new(status, headers, payload);
    if response.is_success() {
        Ok(response)
    } else {
        Err(HttpFailure::business(response))
    }
}

impl MockDriver {
    /// Build a driver using the request defaults and mock settings of `config`.
    #[must_use]
    pub fn new(config: &HttpConfig) -> Self {
        Self {
            state: Arc::new(MockState {
                base_url: config.base_url.clone(),
                method: config.method,
                route_prefix: config.mock.route_prefix.clone(),
                log_payloads: config.log_payloads,
                routes: RwLock::new(Vec::new()),
                fallback: RwLock::new(None),
                cache: PatternCache::new(config.mock.cache_capacity),
                latency: Latency::new(Duration::from_millis(config.mock.internet_delay_ms)),
            }),
        }
    }

    /// Register a handler for `method` requests whose path matches `path`.
    ///
    /// The template is compiled immediately so a malformed capture is reported
    /// here rather than on the first request.
    pub fn route<F, Fut>(&self, path: &str, method: HttpMethod, handler: F) -> Result<(), PatternError>
    where
        F: Fn(HttpRequest, MockResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.add_route(path, method, Arc::new(handler))
    }

    /// Register an already boxed handler.
    pub fn add_route(
        &self,
        path: &str,
        method: HttpMethod,
        handler: Arc<dyn Handler>,
    ) -> Result<(), PatternError> {
        let template = format!("{}{}", self.state.route_prefix, path);
        let compiled = self.state.cache.compile(&template, ROUTE_FLAGS)?;

        let mut routes = write_lock(&self.state.routes);
        info!(
            method = %method,
            path = %template,
            priority = routes.len(),
            "Registered mock route"
        );
        routes.push(Route {
            path: path.to_string(),
            method,
            template,
            compiled,
            handler,
        });
        Ok(())
    }

    pub fn get<F, Fut>(&self, path: &str, handler: F) -> Result<(), PatternError>
    where
        F: Fn(HttpRequest, MockResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.route(path, HttpMethod::Get, handler)
    }

    pub fn post<F, Fut>(&self, path: &str, handler: F) -> Result<(), PatternError>
    where
        F: Fn(HttpRequest, MockResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.route(path, HttpMethod::Post, handler)
    }

    pub fn put<F, Fut>(&self, path: &str, handler: F) -> Result<(), PatternError>
    where
        F: Fn(HttpRequest, MockResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.route(path, HttpMethod::Put, handler)
    }

    pub fn delete<F, Fut>(&self, path: &str, handler: F) -> Result<(), PatternError>
    where
        F: Fn(HttpRequest, MockResponse) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.route(path, HttpMethod::Delete, handler)
    }

    /// Driver that receives requests no route matched (never 405s).
    pub fn set_fallback(&self, fallback: Option<Arc<dyn Driver>>) {
        *write_lock(&self.state.fallback) = fallback;
    }

    /// Handle for cancelling simulated latency.
    #[must_use]
    pub fn latency(&self) -> LatencyControl {
        self.state.latency.control()
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.state.cache.stats()
    }

    /// `(method, path)` of every route in priority order.
    #[must_use]
    pub fn routes(&self) -> Vec<(HttpMethod, String)> {
        read_lock(&self.state.routes)
            .iter()
            .map(|r| (r.method, r.path.clone()))
            .collect()
    }

    /// Answer `request` from the route table.
    pub async fn dispatch(&self, mut request: HttpRequest) -> DriverResult {
        let state = &self.state;
        let original_url = request.url.clone();
        let original_method = request.method;

        let base_url = match request.base_url.as_deref() {
            Some(base) if !base.is_empty() => base,
            _ => state.base_url.as_str(),
        };
        let method = request.method.unwrap_or(state.method);
        request.url = format!("{base_url}{}", request.url);
        request.method = Some(method);

        let mut method_seen = false;
        let mut selected = None;
        {
            let routes = read_lock(&state.routes);
            for route in routes.iter() {
                let matched =
                    match_compiled(&request.url, &route.template, &route.compiled, true);
                let found = match matched {
                    Ok(found) => found,
                    Err(e) => {
                        error!(
                            request_id = %request.request_id,
                            path = %route.path,
                            error = %e,
                            "Route pattern failed to execute"
                        );
                        return Err(HttpFailure::handler(e.to_string()));
                    }
                };
                let Some(found) = found else {
                    continue;
                };
                if route.method != method {
                    trace!(
                        request_id = %request.request_id,
                        route_method = %route.method,
                        path = %route.path,
                        "Path matched under another method, continuing"
                    );
                    method_seen = true;
                    continue;
                }
                selected = Some((Arc::clone(&route.handler), found));
                break;
            }
        }

        let Some((handler, found)) = selected else {
            if method_seen {
                warn!(
                    request_id = %request.request_id,
                    method = %method,
                    url = %request.url,
                    "405 method not allowed"
                );
                return Err(HttpFailure::method_not_allowed());
            }
            let fallback = read_lock(&state.fallback).clone();
            if let Some(fallback) = fallback {
                debug!(
                    request_id = %request.request_id,
                    url = %original_url,
                    "No mock route matched, delegating to fallback driver"
                );
                request.url = original_url;
                request.method = original_method;
                return fallback.call(request).await;
            }
            warn!(
                request_id = %request.request_id,
                method = %method,
                url = %request.url,
                "404 not found"
            );
            return Err(HttpFailure::not_found());
        };

        let request_id = request.request_id;
        debug!(
            request_id = %request_id,
            method = %method,
            url = %request.url,
            route = %found.path,
            params = ?found.params_map(),
            "Dispatching to mock route"
        );
        if state.log_payloads {
            debug!(request_id = %request_id, payload = ?request.payload, "Mock request payload");
        }
        request.context.route_match = Some(found);

        let waited = state.latency.wait().await;
        if !waited.is_zero() {
            trace!(request_id = %request_id, waited_ms = waited.as_millis() as u64, "Simulated latency");
        }

        let response = MockResponse::new();
        let writer = response.clone();
        let outcome = AssertUnwindSafe(async move { handler.handle(request, writer).await })
            .catch_unwind()
            .await;

        let result = match outcome {
            Ok(Ok(())) => normalize(response.take()),
            Ok(Err(e)) => {
                error!(request_id = %request_id, error = %e, "Mock handler failed");
                Err(HttpFailure::handler(e.to_string()))
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(request_id = %request_id, panic = %message, "Mock handler panicked");
                Err(HttpFailure::handler(message))
            }
        };

        match &result {
            Ok(res) => debug!(request_id = %request_id, status = res.status, "Mock response"),
            Err(failure) => debug!(
                request_id = %request_id,
                status = failure.response.status,
                kind = %failure.kind,
                "Mock failure"
            ),
        }
        result
    }
}

impl Driver for MockDriver {
    fn call(&self, request: HttpRequest) -> BoxFuture<'static, DriverResult> {
        let driver = self.clone();
        async move { driver.dispatch(request).await }.boxed()
    }
}

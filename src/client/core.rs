use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::{debug, error, warn};

use super::request::{HttpMethod, HttpRequest};
use super::response::{HttpFailure, HttpResponse};
use crate::config::HttpConfig;
use crate::error::HttpError;
use crate::lock::{read_lock, write_lock};
use crate::middleware::{Middleware, MiddlewareChain, Transform};

/// What a driver produces: a response, or a response-shaped failure.
pub type DriverResult = Result<HttpResponse, HttpFailure>;

/// The seam between the pipeline and whatever answers requests.
///
/// A network transport would implement this; [`crate::mock::MockDriver`]
/// answers from an in-process route table.
pub trait Driver: Send + Sync {
    fn call(&self, request: HttpRequest) -> BoxFuture<'static, DriverResult>;
}

/// Adapts an async closure into a [`Driver`].
///
/// ```
/// use std::sync::Arc;
/// use pathmock::client::{Driver, FnDriver, Headers, HttpFailure, HttpRequest, HttpResponse};
///
/// let echo: Arc<dyn Driver> = Arc::new(FnDriver::new(|req: HttpRequest| async move {
///     Ok::<_, HttpFailure>(HttpResponse::new(200, Headers::new(), req.url.into()))
/// }));
/// # let _ = echo;
/// ```
pub struct FnDriver<F>(F);

impl<F> FnDriver<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F, Fut> Driver for FnDriver<F>
where
    F: Fn(HttpRequest) -> Fut + Send + Sync,
    Fut: Future<Output = DriverResult> + Send + 'static,
{
    fn call(&self, request: HttpRequest) -> BoxFuture<'static, DriverResult> {
        (self.0)(request).boxed()
    }
}

/// The networking layer object: configuration defaults, a default driver and
/// the two middleware chains.
///
/// Setup (driver, middleware) goes through `&self` behind read-mostly locks so
/// a client can be shared as `Arc<HttpClient>`. Registration is expected to
/// finish before requests start.
pub struct HttpClient {
    config: HttpConfig,
    driver: RwLock<Option<Arc<dyn Driver>>>,
    request_chain: RwLock<MiddlewareChain<HttpRequest>>,
    response_chain: RwLock<MiddlewareChain<HttpResponse>>,
    observers: RwLock<Vec<Arc<dyn Middleware>>>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_driver", &read_lock(&self.driver).is_some())
            .field("request_chain", &*read_lock(&self.request_chain))
            .field("response_chain", &*read_lock(&self.response_chain))
            .finish()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(HttpConfig::default())
    }
}

impl HttpClient {
    #[must_use]
    pub fn new(config: HttpConfig) -> Self {
        Self {
            config,
            driver: RwLock::new(None),
            request_chain: RwLock::new(MiddlewareChain::new()),
            response_chain: RwLock::new(MiddlewareChain::new()),
            observers: RwLock::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Default driver used by [`HttpClient::request`].
    pub fn set_driver(&self, driver: Arc<dyn Driver>) {
        *write_lock(&self.driver) = Some(driver);
    }

    /// Upsert (or with `None`, remove) a request transform.
    pub fn request_middleware(&self, name: &str, transform: Option<Transform<HttpRequest>>) {
        write_lock(&self.request_chain).upsert(name, transform);
    }

    /// Upsert (or with `None`, remove) a response transform. It runs on
    /// successful responses and on the response carried by every failure.
    pub fn response_middleware(&self, name: &str, transform: Option<Transform<HttpResponse>>) {
        write_lock(&self.response_chain).upsert(name, transform);
    }

    #[must_use]
    pub fn request_middleware_names(&self) -> Vec<String> {
        read_lock(&self.request_chain)
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[must_use]
    pub fn response_middleware_names(&self) -> Vec<String> {
        read_lock(&self.response_chain)
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Register an observer that runs around every driver call.
    pub fn use_middleware(&self, middleware: Arc<dyn Middleware>) {
        write_lock(&self.observers).push(middleware);
    }

    /// Send through the default driver.
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        let driver = read_lock(&self.driver).clone();
        self.execute(request, driver).await
    }

    /// Send through `driver` instead of the default one.
    pub async fn request_with(
        &self,
        request: HttpRequest,
        driver: Arc<dyn Driver>,
    ) -> Result<HttpResponse, HttpError> {
        self.execute(request, Some(driver)).await
    }

    pub async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.request(HttpRequest::new(url).method(HttpMethod::Get))
            .await
    }

    pub async fn post(&self, url: &str, payload: Value) -> Result<HttpResponse, HttpError> {
        self.request(HttpRequest::new(url).method(HttpMethod::Post).payload(payload))
            .await
    }

    pub async fn put(&self, url: &str, payload: Value) -> Result<HttpResponse, HttpError> {
        self.request(HttpRequest::new(url).method(HttpMethod::Put).payload(payload))
            .await
    }

    pub async fn delete(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.request(HttpRequest::new(url).method(HttpMethod::Delete))
            .await
    }

    async fn execute(
        &self,
        mut request: HttpRequest,
        driver: Option<Arc<dyn Driver>>,
    ) -> Result<HttpResponse, HttpError> {
        let Some(driver) = driver else {
            error!(
                request_id = %request.request_id,
                url = %request.url,
                "No HTTP driver configured"
            );
            return Err(HttpError::MissingDriver);
        };

        request.timeout.get_or_insert(self.config.timeout());
        request
            .with_credentials
            .get_or_insert(self.config.with_credentials);

        // Snapshot the chains so transforms may register middleware themselves
        let request_chain = read_lock(&self.request_chain).clone();
        let response_chain = read_lock(&self.response_chain).clone();
        let observers = read_lock(&self.observers).clone();

        let request = request_chain.apply(request);
        for observer in &observers {
            observer.before(&request);
        }
        let snapshot = (!observers.is_empty()).then(|| request.clone());
        let request_id = request.request_id;

        if self.config.log_payloads {
            debug!(
                request_id = %request_id,
                method = request.method.map(|m| m.as_str()),
                url = %request.url,
                payload = ?request.payload,
                "Sending request"
            );
        } else {
            debug!(
                request_id = %request_id,
                method = request.method.map(|m| m.as_str()),
                url = %request.url,
                "Sending request"
            );
        }

        let start = Instant::now();
        let outcome = match driver.call(request).await {
            Ok(response) => Ok(response_chain.apply(response)),
            Err(mut failure) => {
                failure.response = response_chain.apply(failure.response);
                Err(failure)
            }
        };
        let latency = start.elapsed();

        if let Some(request) = &snapshot {
            for observer in &observers {
                observer.after(request, &outcome, latency);
            }
        }

        match &outcome {
            Ok(response) if self.config.log_payloads => debug!(
                request_id = %request_id,
                status = response.status,
                payload = %response.payload,
                "Received response"
            ),
            Ok(response) => debug!(
                request_id = %request_id,
                status = response.status,
                "Received response"
            ),
            Err(failure) => warn!(
                request_id = %request_id,
                status = failure.response.status,
                kind = %failure.kind,
                "Request failed"
            ),
        }

        outcome.map_err(HttpError::from)
    }
}

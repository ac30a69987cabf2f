//! Generic HTTP client with interceptors, timeout and retry.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Method, Url};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::errors::HttpError;

use super::request::{HttpResponse, MultipartForm, OutgoingRequest, RequestBody, RequestConfig};
use super::retry::{AttemptOutcome, RetryPolicy};
use super::transport::{ReqwestTransport, Transport};

/// Mutates every outgoing request before dispatch.
pub type RequestInterceptor = Arc<dyn Fn(&mut RequestConfig) + Send + Sync>;

/// Observes every received response before its status is checked.
pub type ResponseInterceptor = Arc<dyn Fn(&HttpResponse) + Send + Sync>;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client settings.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL relative paths are resolved against.
    pub base_url: String,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Retry behaviour for transient failures.
    pub retry: RetryPolicy,
    /// Headers added to every request that does not set them.
    pub default_headers: HeaderMap,
}

impl HttpClientConfig {
    /// Creates a config with default timeout, retry policy and headers.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            default_headers,
        }
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Request pipeline: URL resolution, interceptors, timeout, retry.
pub struct HttpClient {
    config: HttpClientConfig,
    transport: Arc<dyn Transport>,
    request_interceptors: Vec<RequestInterceptor>,
    response_interceptors: Vec<ResponseInterceptor>,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("request_interceptors", &self.request_interceptors.len())
            .field("response_interceptors", &self.response_interceptors.len())
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Creates a client backed by `reqwest`.
    ///
    /// # Errors
    /// Returns error if the transport cannot be created.
    pub fn new(config: HttpClientConfig) -> Result<Self, HttpError> {
        Ok(Self::with_transport(config, Arc::new(ReqwestTransport::new()?)))
    }

    /// Creates a client over any transport.
    #[must_use]
    pub fn with_transport(config: HttpClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            request_interceptors: Vec::new(),
            response_interceptors: Vec::new(),
        }
    }

    /// Returns the client settings.
    #[must_use]
    pub const fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Registers a request interceptor; interceptors run in registration order.
    pub fn add_request_interceptor<F>(&mut self, interceptor: F)
    where
        F: Fn(&mut RequestConfig) + Send + Sync + 'static,
    {
        self.request_interceptors.push(Arc::new(interceptor));
    }

    /// Registers a response interceptor; interceptors run in registration order.
    pub fn add_response_interceptor<F>(&mut self, interceptor: F)
    where
        F: Fn(&HttpResponse) + Send + Sync + 'static,
    {
        self.response_interceptors.push(Arc::new(interceptor));
    }

    /// Resolves `url` against the base URL unless it is already absolute.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidUrl` if the result is not a valid URL.
    pub fn resolve_url(&self, url: &str) -> Result<Url, HttpError> {
        if let Ok(absolute) = Url::parse(url) {
            return Ok(absolute);
        }

        let joined = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| HttpError::InvalidUrl {
            url: joined.clone(),
            message: e.to_string(),
        })
    }

    /// Sends a request through the interceptor chain with retry.
    ///
    /// # Errors
    /// Returns the last error once retries are exhausted, or the first
    /// terminal error (4xx, cancellation, decode failure).
    pub async fn request(&self, url: &str, config: RequestConfig) -> Result<HttpResponse, HttpError> {
        let mut config = self.apply_defaults(config);
        for interceptor in &self.request_interceptors {
            interceptor(&mut config);
        }
        if config.body.is_multipart() {
            config.headers.remove(CONTENT_TYPE);
        }

        let mut url = self.resolve_url(url)?;
        if !config.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&config.query);
        }

        let mut retry = 0;
        loop {
            debug!(method = %config.method, url = %url, attempt = retry + 1, "Sending request");

            match self.attempt(&url, &config).await {
                AttemptOutcome::Success(response) => return Ok(response),
                AttemptOutcome::Terminal(error) => {
                    debug!(error = %error, "Request failed terminally");
                    return Err(error);
                }
                AttemptOutcome::Retryable(error) => {
                    if retry >= self.config.retry.max_retries {
                        warn!(error = %error, attempts = retry + 1, "Retry budget exhausted");
                        return Err(error);
                    }

                    let delay = self.config.retry.delay_for(retry);
                    warn!(
                        error = %error,
                        retry = retry + 1,
                        delay_ms = delay.as_millis(),
                        "Transient failure, retrying"
                    );
                    Self::backoff(delay, config.signal.as_ref()).await?;
                    retry += 1;
                }
            }
        }
    }

    /// `GET` with query parameters.
    ///
    /// # Errors
    /// See [`HttpClient::request`].
    pub async fn get<K, V>(
        &self,
        url: &str,
        query: impl IntoIterator<Item = (K, V)>,
    ) -> Result<HttpResponse, HttpError>
    where
        K: Into<String>,
        V: ToString,
    {
        self.request(url, RequestConfig::new(Method::GET).with_query(query))
            .await
    }

    /// `POST` with a JSON body.
    ///
    /// # Errors
    /// See [`HttpClient::request`].
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<HttpResponse, HttpError> {
        self.request(url, Self::json_config(Method::POST, body)?)
            .await
    }

    /// `PUT` with a JSON body.
    ///
    /// # Errors
    /// See [`HttpClient::request`].
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<HttpResponse, HttpError> {
        self.request(url, Self::json_config(Method::PUT, body)?)
            .await
    }

    /// `DELETE`.
    ///
    /// # Errors
    /// See [`HttpClient::request`].
    pub async fn delete(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.request(url, RequestConfig::new(Method::DELETE)).await
    }

    /// `POST` with a multipart body.
    ///
    /// # Errors
    /// See [`HttpClient::request`].
    pub async fn upload(&self, url: &str, form: MultipartForm) -> Result<HttpResponse, HttpError> {
        let config = RequestConfig::new(Method::POST).with_body(RequestBody::Multipart(form));
        self.request(url, config).await
    }

    fn json_config<B: Serialize + ?Sized>(
        method: Method,
        body: &B,
    ) -> Result<RequestConfig, HttpError> {
        let value = serde_json::to_value(body)
            .map_err(|e| HttpError::decode(format!("failed to encode body: {e}")))?;
        Ok(RequestConfig::new(method).with_body(RequestBody::Json(value)))
    }

    fn apply_defaults(&self, mut config: RequestConfig) -> RequestConfig {
        for (name, value) in &self.config.default_headers {
            if !config.headers.contains_key(name) {
                config.headers.insert(name.clone(), value.clone());
            }
        }
        if matches!(config.body, RequestBody::Json(_)) && !config.headers.contains_key(CONTENT_TYPE)
        {
            config
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        config
    }

    async fn attempt(&self, url: &Url, config: &RequestConfig) -> AttemptOutcome {
        let signal = config
            .signal
            .as_ref()
            .map_or_else(CancellationToken::new, CancellationToken::child_token);
        let timeout = config.timeout.unwrap_or(self.config.timeout);

        let request = OutgoingRequest {
            method: config.method.clone(),
            url: url.clone(),
            headers: config.headers.clone(),
            body: config.body.clone(),
        };

        let result = tokio::select! {
            result = self.transport.send(request) => result,
            () = tokio::time::sleep(timeout) => {
                signal.cancel();
                #[allow(clippy::cast_possible_truncation)]
                let after_ms = timeout.as_millis() as u64;
                Err(HttpError::Timeout { after_ms })
            }
            () = signal.cancelled() => Err(HttpError::Cancelled),
        };

        match result {
            Ok(response) => {
                for interceptor in &self.response_interceptors {
                    interceptor(&response);
                }
                AttemptOutcome::from_response(response)
            }
            Err(error) => AttemptOutcome::from_error(error),
        }
    }

    async fn backoff(delay: Duration, signal: Option<&CancellationToken>) -> Result<(), HttpError> {
        match signal {
            Some(signal) => tokio::select! {
                () = tokio::time::sleep(delay) => Ok(()),
                () = signal.cancelled() => Err(HttpError::Cancelled),
            },
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for exercising the client without a network.

    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use reqwest::StatusCode;

    use super::{HttpError, HttpResponse, OutgoingRequest, Transport};

    /// Scripted step of a [`ScriptedTransport`].
    pub enum Step {
        Respond(StatusCode, String),
        Fail(HttpError),
        Hang,
    }

    /// Plays back a fixed sequence of outcomes and records every request.
    #[derive(Default)]
    pub struct ScriptedTransport {
        steps: Mutex<VecDeque<Step>>,
        pub requests: Mutex<Vec<OutgoingRequest>>,
    }

    impl ScriptedTransport {
        pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
            Self {
                steps: Mutex::new(steps.into_iter().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, request: OutgoingRequest) -> Result<HttpResponse, HttpError> {
            self.requests.lock().push(request);
            let step = self.steps.lock().pop_front();
            match step {
                Some(Step::Respond(status, body)) => Ok(HttpResponse::new(status, body)),
                Some(Step::Fail(error)) => Err(error),
                Some(Step::Hang) => std::future::pending().await,
                None => Err(HttpError::network("script exhausted")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use reqwest::StatusCode;
    use reqwest::header::AUTHORIZATION;
    use tokio::time::Instant;

    use super::testing::{ScriptedTransport, Step};
    use super::*;
    use crate::infrastructure::http::request::FilePart;

    const BASE_DELAY: Duration = Duration::from_millis(100);

    fn client(transport: &Arc<ScriptedTransport>, retries: u32) -> HttpClient {
        let config = HttpClientConfig::new("http://gallery.test")
            .with_retry(RetryPolicy::new(retries, BASE_DELAY))
            .with_timeout(Duration::from_secs(1));
        HttpClient::with_transport(config, transport.clone())
    }

    #[test]
    fn test_resolve_relative_and_absolute_urls() {
        let transport = Arc::new(ScriptedTransport::default());
        let client = client(&transport, 0);

        assert_eq!(
            client.resolve_url("/api/images").unwrap().as_str(),
            "http://gallery.test/api/images"
        );
        assert_eq!(
            client.resolve_url("api/images").unwrap().as_str(),
            "http://gallery.test/api/images"
        );
        assert_eq!(
            client.resolve_url("https://cdn.test/x.png").unwrap().as_str(),
            "https://cdn.test/x.png"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_503_with_exponential_backoff() {
        let transport = Arc::new(ScriptedTransport::new([
            Step::Respond(StatusCode::SERVICE_UNAVAILABLE, String::new()),
            Step::Respond(StatusCode::SERVICE_UNAVAILABLE, String::new()),
            Step::Respond(StatusCode::OK, r#"{"ok":true}"#.to_string()),
        ]));
        let client = client(&transport, 2);

        let started = Instant::now();
        let response = client
            .get("/api/images", Vec::<(String, String)>::new())
            .await
            .unwrap();

        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(transport.request_count(), 3);
        assert!(started.elapsed() >= BASE_DELAY + BASE_DELAY * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_404_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new([
            Step::Respond(StatusCode::NOT_FOUND, String::new()),
            Step::Respond(StatusCode::OK, String::new()),
        ]));
        let client = client(&transport, 3);

        let started = Instant::now();
        let err = client.delete("/api/images/1").await.unwrap_err();

        assert_eq!(
            err,
            HttpError::Status {
                status: 404,
                status_text: "Not Found".to_string()
            }
        );
        assert_eq!(transport.request_count(), 1);
        assert!(started.elapsed() < BASE_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_budget_exhausted_surfaces_last_error() {
        let transport = Arc::new(ScriptedTransport::new([
            Step::Fail(HttpError::network("refused")),
            Step::Fail(HttpError::network("refused")),
        ]));
        let client = client(&transport, 1);

        let err = client
            .get("/api/images", [("page", 1)])
            .await
            .unwrap_err();

        assert!(matches!(err, HttpError::Network { .. }));
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_retried() {
        let transport = Arc::new(ScriptedTransport::new([
            Step::Hang,
            Step::Respond(StatusCode::OK, "{}".to_string()),
        ]));
        let client = client(&transport, 1);

        let response = client.get("/health", Vec::<(String, String)>::new()).await;

        assert!(response.is_ok());
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_is_terminal() {
        let transport = Arc::new(ScriptedTransport::new([Step::Hang, Step::Hang]));
        let client = client(&transport, 3);
        let signal = CancellationToken::new();
        signal.cancel();

        let config = RequestConfig::new(Method::GET).with_signal(signal);
        let err = client.request("/api/images", config).await.unwrap_err();

        assert_eq!(err, HttpError::Cancelled);
        assert!(transport.request_count() <= 1);
    }

    #[tokio::test]
    async fn test_interceptors_run_in_order() {
        let transport = Arc::new(ScriptedTransport::new([Step::Respond(
            StatusCode::OK,
            String::new(),
        )]));
        let mut client = client(&transport, 0);
        client.add_request_interceptor(|config| config.set_header("authorization", "first"));
        client.add_request_interceptor(|config| {
            let previous = config
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            config.set_header("Authorization", &format!("{previous}+second"));
        });

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        client.add_response_interceptor(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        client
            .get("/api/user", Vec::<(String, String)>::new())
            .await
            .unwrap();

        let requests = transport.requests.lock();
        assert_eq!(
            requests[0].headers.get(AUTHORIZATION).unwrap(),
            "first+second"
        );
        assert_eq!(requests[0].headers.get(ACCEPT).unwrap(), "application/json");
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_response_interceptor_sees_error_status() {
        let transport = Arc::new(ScriptedTransport::new([Step::Respond(
            StatusCode::UNAUTHORIZED,
            String::new(),
        )]));
        let mut client = client(&transport, 0);
        let unauthorized = Arc::new(AtomicUsize::new(0));
        let counter = unauthorized.clone();
        client.add_response_interceptor(move |response| {
            if response.status == StatusCode::UNAUTHORIZED {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let err = client.get("/api/user", Vec::<(String, String)>::new()).await;

        assert!(err.unwrap_err().is_unauthorized());
        assert_eq!(unauthorized.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_json_body_sets_content_type_and_multipart_does_not() {
        let transport = Arc::new(ScriptedTransport::new([
            Step::Respond(StatusCode::OK, String::new()),
            Step::Respond(StatusCode::OK, String::new()),
        ]));
        let mut client = client(&transport, 0);
        client.add_request_interceptor(|config| {
            config.set_header("Content-Type", "application/json");
        });

        client
            .post("/api/auth/login", &serde_json::json!({"email": "a"}))
            .await
            .unwrap();
        let form = MultipartForm::new().text("title", "T").file(FilePart {
            field_name: "image".to_string(),
            filename: "a.png".to_string(),
            mime: "image/png".to_string(),
            bytes: bytes::Bytes::from_static(b"png"),
            progress: None,
        });
        client.upload("/api/upload", form).await.unwrap();

        let requests = transport.requests.lock();
        assert_eq!(
            requests[0].headers.get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(requests[1].headers.get(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn test_query_parameters_are_appended() {
        let transport = Arc::new(ScriptedTransport::new([Step::Respond(
            StatusCode::OK,
            String::new(),
        )]));
        let client = client(&transport, 0);

        client
            .get("/api/images", [("page", "2"), ("limit", "20")])
            .await
            .unwrap();

        let requests = transport.requests.lock();
        assert_eq!(
            requests[0].url.as_str(),
            "http://gallery.test/api/images?page=2&limit=20"
        );
    }
}

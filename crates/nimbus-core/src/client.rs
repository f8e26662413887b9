//! HTTP dispatcher shared by every service client.
//!
//! [`ServiceClient::execute`] runs one logical request as a bounded retry
//! loop: attempt, classify the outcome, sleep (cancelable), retry. Only
//! GET/HEAD requests answered with 429/502/503/504 are retried; everything
//! else is returned to the caller after the first attempt.

use crate::backoff::BackoffStrategy;
use crate::config::ClientConfig;
use crate::context::{DoneReason, RequestContext};
use crate::error::ApiError;
use crate::logger::{Logger, NoopLogger};
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
use crate::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

const USER_AGENT: &str = concat!("nimbus-core/", env!("CARGO_PKG_VERSION"));
const JSON: &str = "application/json";

/// One logical API call, built by a service client.
#[derive(Debug, Clone)]
pub struct ApiRequest<B = ()> {
    /// HTTP method
    pub method: Method,
    /// Path relative to the client's base URL
    pub path: String,
    /// Query parameters
    pub query: Vec<(&'static str, String)>,
    /// Extra headers; they override defaults of the same name
    pub headers: Vec<(String, String)>,
    /// Body serialized as JSON
    pub body: Option<B>,
}

impl ApiRequest<()> {
    /// Create a request without a body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// HEAD request.
    #[must_use]
    pub fn head(path: impl Into<String>) -> Self {
        Self::new(Method::HEAD, path)
    }

    /// POST request.
    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT request.
    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// PATCH request.
    #[must_use]
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// DELETE request.
    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body<B>(self, body: B) -> ApiRequest<B> {
        ApiRequest {
            method: self.method,
            path: self.path,
            query: self.query,
            headers: self.headers,
            body: Some(body),
        }
    }
}

impl<B> ApiRequest<B> {
    /// Append query parameters.
    #[must_use]
    pub fn with_query(mut self, pairs: Vec<(&'static str, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Builder for [`ServiceClient`].
pub struct ServiceClientBuilder {
    config: ClientConfig,
    base_url: Url,
    backoff: BackoffStrategy,
    timeout: Option<Duration>,
    token: Option<SecretString>,
    logger: Arc<dyn Logger>,
    transport: Option<Arc<dyn Transport>>,
    user_agent: String,
}

impl ServiceClientBuilder {
    /// Create a builder for the specified base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::from_config(ClientConfig::new(base_url.as_ref())?)
    }

    /// Create a builder from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is out of range or the
    /// base URL is invalid.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        config.ensure_valid()?;
        Ok(Self {
            base_url: config.parse_base_url()?,
            backoff: config.backoff(),
            timeout: None,
            token: None,
            logger: Arc::new(NoopLogger),
            transport: None,
            user_agent: USER_AGENT.to_string(),
            config,
        })
    }

    /// Attach a static bearer token to every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Override the retry backoff.
    #[must_use]
    pub const fn with_backoff(mut self, backoff: BackoffStrategy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Override the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Route retry diagnostics to a logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Use a custom transport instead of the default reqwest one.
    #[must_use]
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Override the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the default transport cannot be constructed.
    pub fn build(self) -> Result<ServiceClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let timeout = self.timeout.unwrap_or_else(|| self.config.timeout());
                Arc::new(ReqwestTransport::with_timeout(
                    &self.config,
                    timeout,
                    &self.user_agent,
                )?)
            }
        };

        Ok(ServiceClient {
            base_url: self.base_url,
            backoff: self.backoff,
            token: self.token.map(Arc::new),
            logger: self.logger,
            transport,
        })
    }
}

/// Retrying HTTP dispatcher.
///
/// Cheap to clone; clones share the transport and logger.
#[derive(Clone)]
pub struct ServiceClient {
    base_url: Url,
    backoff: BackoffStrategy,
    token: Option<Arc<SecretString>>,
    logger: Arc<dyn Logger>,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceClient")
            .field("base_url", &self.base_url.as_str())
            .field("backoff", &self.backoff)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ServiceClient {
    /// Start a builder for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn builder(base_url: impl AsRef<str>) -> Result<ServiceClientBuilder> {
        ServiceClientBuilder::new(base_url)
    }

    /// Return the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Return the retry backoff.
    #[must_use]
    pub const fn backoff(&self) -> &BackoffStrategy {
        &self.backoff
    }

    /// Execute a request and decode the JSON response into `R`.
    ///
    /// An empty success body decodes as JSON `null`, so `()` and `Option<T>`
    /// targets accept it. Use [`Self::execute_optional`] when the API may
    /// answer with no content and [`Self::execute_no_content`] when the body
    /// is irrelevant.
    ///
    /// # Errors
    ///
    /// Returns the final error after retries, or [`Error::Decode`] if the
    /// success body does not match `R`.
    pub async fn execute<B, R>(&self, ctx: &RequestContext, request: &ApiRequest<B>) -> Result<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let response = self.execute_raw(ctx, request).await?;
        decode_body(&request.path, &response.body)
    }

    /// Execute a request, returning `None` for an empty success body.
    ///
    /// # Errors
    ///
    /// Returns the final error after retries, or [`Error::Decode`] if a
    /// non-empty success body does not match `R`.
    pub async fn execute_optional<B, R>(
        &self,
        ctx: &RequestContext,
        request: &ApiRequest<B>,
    ) -> Result<Option<R>>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let response = self.execute_raw(ctx, request).await?;
        if is_empty_body(&response.body) {
            return Ok(None);
        }
        decode_body(&request.path, &response.body).map(Some)
    }

    /// Execute a request that has no result; any success body is ignored.
    ///
    /// # Errors
    ///
    /// Returns the final error after retries.
    pub async fn execute_no_content<B>(
        &self,
        ctx: &RequestContext,
        request: &ApiRequest<B>,
    ) -> Result<()>
    where
        B: Serialize,
    {
        self.execute_raw(ctx, request).await.map(drop)
    }

    /// Execute a request and return the raw response.
    ///
    /// # Errors
    ///
    /// Returns the final error after retries.
    pub async fn execute_raw<B>(
        &self,
        ctx: &RequestContext,
        request: &ApiRequest<B>,
    ) -> Result<HttpResponse>
    where
        B: Serialize,
    {
        let ctx = ctx.with_default_timeout(self.transport.timeout());
        let prepared = self.prepare(request)?;
        let mut attempt: u32 = 0;

        loop {
            if let Some(reason) = ctx.check() {
                return Err(reason.into_error("request").into());
            }

            self.logger.info(
                "sending request",
                &[
                    ("method", &request.method),
                    ("path", &request.path),
                    ("attempt", &attempt),
                ],
            );

            let error = match self.round_trip(&ctx, prepared.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            if !(error.is_retryable() && self.backoff.is_retryable_method(&request.method)) {
                self.logger.debug(
                    "request failed",
                    &[("path", &request.path), ("error", &error)],
                );
                return Err(error.into());
            }

            if !self.backoff.should_retry(attempt) {
                self.logger.error(
                    "max retries reached",
                    &[
                        ("path", &request.path),
                        ("attempts", &(attempt + 1)),
                        ("status", &error.status_code),
                    ],
                );
                return Err(error.into());
            }

            let delay = self.backoff.duration(attempt);
            self.logger.debug(
                "retrying request",
                &[
                    ("path", &request.path),
                    ("attempt", &attempt),
                    ("status", &error.status_code),
                    ("delay_ms", &delay.as_millis()),
                ],
            );

            tokio::select! {
                biased;
                reason = ctx.done() => return Err(reason.into_error("request").into()),
                () = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }

    /// Serialize the body and assemble URL and headers.
    fn prepare<B>(&self, request: &ApiRequest<B>) -> std::result::Result<HttpRequest, ApiError>
    where
        B: Serialize,
    {
        let relative = request.path.trim_start_matches('/');
        let mut url = self.base_url.join(relative).map_err(|err| {
            ApiError::local(format!("invalid path `{}`: {err}", request.path)).with_source(err)
        })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }

        let body = match &request.body {
            Some(body) => Some(serde_json::to_vec(body).map_err(|err| {
                ApiError::local(format!("failed to serialize request body: {err}")).with_source(err)
            })?),
            None => None,
        };

        Ok(HttpRequest {
            method: request.method.clone(),
            url,
            headers: self.headers(&request.headers)?,
            body,
        })
    }

    fn headers(&self, extra: &[(String, String)]) -> std::result::Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(JSON));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));

        if let Some(token) = &self.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|err| {
                    ApiError::local("bearer token is not a valid header value").with_source(err)
                })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut caller = HeaderMap::new();
        for (name, value) in extra {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
                ApiError::local(format!("invalid header name `{name}`")).with_source(err)
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|err| {
                ApiError::local(format!("invalid value for header `{name}`")).with_source(err)
            })?;
            caller.append(header_name, header_value);
        }

        for name in caller.keys() {
            headers.remove(name);
        }
        for (name, value) in &caller {
            headers.append(name.clone(), value.clone());
        }

        Ok(headers)
    }

    /// One transport call raced against the context, then classified.
    async fn round_trip(
        &self,
        ctx: &RequestContext,
        request: HttpRequest,
    ) -> std::result::Result<HttpResponse, ApiError> {
        let outcome = tokio::select! {
            biased;
            reason = ctx.done() => return Err(reason.into_error("request")),
            outcome = self.transport.send(request) => outcome,
        };

        match outcome {
            Ok(response) if response.status.as_u16() >= 400 => Err(ApiError::from_response(
                response.status.as_u16(),
                &response.body,
            )),
            Ok(response) => Ok(response),
            Err(err) => Err(classify_transport_error(ctx, err)),
        }
    }
}

fn classify_transport_error(ctx: &RequestContext, err: TransportError) -> ApiError {
    let message = err.to_string();
    let error = match (ctx.check(), &err) {
        (Some(DoneReason::Canceled), _) => ApiError::canceled(message),
        (Some(DoneReason::DeadlineExceeded), _) | (None, TransportError::Timeout(_)) => {
            ApiError::timeout(message)
        }
        (None, _) => ApiError::network(message),
    };
    error.with_source(err)
}

fn is_empty_body(body: &[u8]) -> bool {
    body.iter().all(u8::is_ascii_whitespace)
}

fn decode_body<R>(path: &str, body: &[u8]) -> Result<R>
where
    R: DeserializeOwned,
{
    let body = if is_empty_body(body) {
        b"null".as_slice()
    } else {
        body
    };

    serde_json::from_slice(body)
        .map_err(|err| Error::Decode(format!("Failed to parse response for `{path}`: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use crate::transport::MockTransport;
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn mock_client(transport: MockTransport) -> ServiceClient {
        ServiceClientBuilder::new("http://api.test")
            .unwrap()
            .with_token("secret-token")
            .with_backoff(BackoffStrategy::new().with_jitter(false))
            .with_transport(Arc::new(transport))
            .build()
            .unwrap()
    }

    fn transport_with_timeout() -> MockTransport {
        let mut transport = MockTransport::new();
        transport
            .expect_timeout()
            .return_const(Duration::from_secs(30));
        transport
    }

    #[test]
    fn test_api_request_builders() {
        let request = ApiRequest::post("/iam/v1/users")
            .with_query(vec![("dryRun", "true".to_string())])
            .with_header("X-Request-Id", "abc")
            .with_body(json!({"name": "ada"}));

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/iam/v1/users");
        assert_eq!(request.query, vec![("dryRun", "true".to_string())]);
        assert_eq!(request.headers, vec![("X-Request-Id".into(), "abc".into())]);
        assert_eq!(request.body, Some(json!({"name": "ada"})));

        assert_eq!(ApiRequest::head("x").method, Method::HEAD);
        assert_eq!(ApiRequest::put("x").method, Method::PUT);
        assert_eq!(ApiRequest::patch("x").method, Method::PATCH);
        assert_eq!(ApiRequest::delete("x").method, Method::DELETE);
    }

    #[tokio::test]
    async fn test_prepare_builds_url_headers_and_body() {
        let mut transport = transport_with_timeout();
        transport.expect_send().times(1).returning(|request| {
            assert_eq!(
                request.url.as_str(),
                "http://api.test/vps/v1/routers?limit=5"
            );
            assert_eq!(request.headers.get(ACCEPT).unwrap(), JSON);
            assert_eq!(request.headers.get(CONTENT_TYPE).unwrap(), JSON);
            assert_eq!(
                request.headers.get(AUTHORIZATION).unwrap(),
                "Bearer secret-token"
            );
            assert_eq!(request.headers.get("x-request-id").unwrap(), "req-7");
            let body: Value = serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
            assert_eq!(body, json!({"name": "edge"}));
            Ok(HttpResponse::new(StatusCode::OK, br#"{"ok": true}"#.to_vec()))
        });

        let client = mock_client(transport);
        let request = ApiRequest::post("/vps/v1/routers")
            .with_query(vec![("limit", "5".to_string())])
            .with_header("X-Request-Id", "req-7")
            .with_body(json!({"name": "edge"}));
        let value: Value = client
            .execute(&RequestContext::new(), &request)
            .await
            .unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_caller_headers_override_and_keep_duplicates() {
        let mut transport = transport_with_timeout();
        transport.expect_send().times(1).returning(|request| {
            let accept: Vec<_> = request.headers.get_all(ACCEPT).iter().collect();
            assert_eq!(accept, ["application/vnd.nimbus+json"]);
            let tags: Vec<_> = request.headers.get_all("x-tag").iter().collect();
            assert_eq!(tags, ["a", "b"]);
            Ok(HttpResponse::new(StatusCode::NO_CONTENT, Vec::new()))
        });

        let client = mock_client(transport);
        let request = ApiRequest::get("things")
            .with_header("Accept", "application/vnd.nimbus+json")
            .with_header("X-Tag", "a")
            .with_header("X-Tag", "b");
        client
            .execute::<(), ()>(&RequestContext::new(), &request)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_invalid_header_is_local_error_without_io() {
        let mut transport = transport_with_timeout();
        transport.expect_send().never();

        let client = mock_client(transport);
        let request = ApiRequest::get("things").with_header("bad header", "x");
        let err = client
            .execute::<(), Value>(&RequestContext::new(), &request)
            .await
            .unwrap_err();

        let api = err.api().unwrap();
        assert_eq!(api.status_code, 0);
        assert!(api.category().is_none());
        assert_eq!(err.error_code(), "LOCAL");
    }

    #[tokio::test]
    async fn test_serialization_failure_is_local_error() {
        struct Unserializable;

        impl Serialize for Unserializable {
            fn serialize<S: serde::Serializer>(
                &self,
                _: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("refusing to serialize"))
            }
        }

        let mut transport = transport_with_timeout();
        transport.expect_send().never();

        let client = mock_client(transport);
        let request = ApiRequest::post("things").with_body(Unserializable);
        let err = client
            .execute::<_, Value>(&RequestContext::new(), &request)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 0);
        assert!(err.to_string().contains("refusing to serialize"));
    }

    #[tokio::test]
    async fn test_network_error_not_retried() {
        let mut transport = transport_with_timeout();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Err(TransportError::Connect("connection refused".into())));

        let client = mock_client(transport);
        let err = client
            .execute::<(), Value>(&RequestContext::new(), &ApiRequest::get("things"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::Network));
    }

    #[tokio::test]
    async fn test_transport_timeout_is_timeout_category() {
        let mut transport = transport_with_timeout();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Err(TransportError::Timeout("operation timed out".into())));

        let client = mock_client(transport);
        let err = client
            .execute::<(), Value>(&RequestContext::new(), &ApiRequest::get("things"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let mut transport = transport_with_timeout();
        transport.expect_send().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(HttpResponse::new(
                StatusCode::SERVICE_UNAVAILABLE,
                br#"{"errorCode": 5031, "message": "busy"}"#.to_vec(),
            ))
        });

        let client = mock_client(transport);
        let err = client
            .execute::<(), Value>(&RequestContext::new(), &ApiRequest::get("things"))
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        let api = err.api().unwrap();
        assert_eq!(api.status_code, 503);
        assert_eq!(api.error_code, 5031);
    }

    #[tokio::test(start_paused = true)]
    async fn test_head_is_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let mut transport = transport_with_timeout();
        transport.expect_send().returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(HttpResponse::new(StatusCode::TOO_MANY_REQUESTS, Vec::new()))
            } else {
                Ok(HttpResponse::new(StatusCode::OK, Vec::new()))
            }
        });

        let client = mock_client(transport);
        client
            .execute::<(), ()>(&RequestContext::new(), &ApiRequest::head("things"))
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_retryable_status_single_attempt() {
        let mut transport = transport_with_timeout();
        transport.expect_send().times(1).returning(|_| {
            Ok(HttpResponse::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                b"boom".to_vec(),
            ))
        });

        let client = mock_client(transport);
        let err = client
            .execute::<(), Value>(&RequestContext::new(), &ApiRequest::get("things"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.api().unwrap().raw_body(), Some("boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_returns_canceled() {
        let mut transport = transport_with_timeout();
        transport.expect_send().times(1).returning(|_| {
            Ok(HttpResponse::new(StatusCode::SERVICE_UNAVAILABLE, Vec::new()))
        });

        let client = ServiceClientBuilder::new("http://api.test")
            .unwrap()
            .with_backoff(
                BackoffStrategy::new()
                    .with_initial_interval(Duration::from_secs(10))
                    .with_jitter(false),
            )
            .with_transport(Arc::new(transport))
            .build()
            .unwrap();

        let ctx = RequestContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let started = tokio::time::Instant::now();
        let err = client
            .execute::<(), Value>(&ctx, &ApiRequest::get("things"))
            .await
            .unwrap_err();

        assert_eq!(err.category(), Some(ErrorCategory::Canceled));
        assert_eq!(err.status_code(), 0);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_already_canceled_context_skips_transport() {
        let mut transport = transport_with_timeout();
        transport.expect_send().never();

        let client = mock_client(transport);
        let ctx = RequestContext::new();
        ctx.cancel();
        let err = client
            .execute::<(), Value>(&ctx, &ApiRequest::get("things"))
            .await
            .unwrap_err();
        assert_eq!(err.category(), Some(ErrorCategory::Canceled));
    }

    #[tokio::test]
    async fn test_decode_failure() {
        let mut transport = transport_with_timeout();
        transport
            .expect_send()
            .returning(|_| Ok(HttpResponse::new(StatusCode::OK, b"not json".to_vec())));

        let client = mock_client(transport);
        let err = client
            .execute::<(), Vec<String>>(&RequestContext::new(), &ApiRequest::get("things"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn test_decode_empty_body_as_null() {
        decode_body::<()>("p", b"").unwrap();
        decode_body::<()>("p", b" \n").unwrap();
        assert_eq!(decode_body::<Option<u32>>("p", b"").unwrap(), None);
        assert_eq!(decode_body::<Option<u32>>("p", b"7").unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_execute_optional_empty_body_is_none() {
        let mut transport = transport_with_timeout();
        transport
            .expect_send()
            .times(2)
            .returning(|request| match request.url.path() {
                "/empty" => Ok(HttpResponse::new(StatusCode::OK, Vec::new())),
                _ => Ok(HttpResponse::new(StatusCode::OK, br#"{"a": 1}"#.to_vec())),
            });

        let client = mock_client(transport);
        let ctx = RequestContext::new();
        let empty: Option<serde_json::Map<String, Value>> = client
            .execute_optional(&ctx, &ApiRequest::get("empty"))
            .await
            .unwrap();
        assert!(empty.is_none());

        let full: Option<serde_json::Map<String, Value>> = client
            .execute_optional(&ctx, &ApiRequest::get("full"))
            .await
            .unwrap();
        assert_eq!(full.unwrap().get("a"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_execute_no_content_ignores_body() {
        let mut transport = transport_with_timeout();
        transport.expect_send().times(1).returning(|_| {
            Ok(HttpResponse::new(
                StatusCode::OK,
                br#"{"id": "r1", "deleted": true}"#.to_vec(),
            ))
        });

        let client = mock_client(transport);
        client
            .execute_no_content(&RequestContext::new(), &ApiRequest::delete("routers/r1"))
            .await
            .unwrap();
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let config = ClientConfig::new("http://api.test")
            .unwrap()
            .with_timeout(0)
            .with_max_retries(500);
        let err = ServiceClientBuilder::from_config(config).err();
        assert!(matches!(err, Some(Error::Config(_))));
    }

    #[test]
    fn test_debug_hides_token() {
        let mut transport = MockTransport::new();
        transport.expect_timeout().return_const(Duration::from_secs(1));
        let client = mock_client(transport);
        let debug = format!("{client:?}");
        assert!(debug.contains("authenticated: true"));
        assert!(!debug.contains("secret-token"));
    }
}

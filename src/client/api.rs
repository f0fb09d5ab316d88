//! Authorized requests against the catalog service

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::catalog::Catalog;
use super::error::ApiError;
use super::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

pub const DEFAULT_API_BASE_URL: &str = "https://api.spotify.com/v1";

/// Callback run before a 403 is surfaced, e.g. to show a notice
pub type ForbiddenHook = dyn Fn() + Send + Sync;

/// Method, extra headers and JSON body of a request
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
        }
    }
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn put() -> Self {
        Self::with_method(Method::PUT)
    }

    pub fn delete() -> Self {
        Self::with_method(Method::DELETE)
    }

    pub fn with_method(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Bearer-authenticated JSON client for the catalog service.
///
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_transport(base_url, Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    /// Typed endpoint wrappers bound to `token`
    pub fn catalog(&self, token: impl Into<String>) -> Catalog {
        Catalog::new(self.clone(), token.into())
    }

    /// Send an authorized request and classify the outcome.
    ///
    /// Returns `Ok(None)` for 204 and for any successful PUT/DELETE, whatever
    /// the body. 401 is `AuthExpired`; 403 runs `on_forbidden` first and then
    /// yields `PermissionDenied`. No retries.
    pub async fn request<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: &str,
        options: RequestOptions,
        on_forbidden: Option<&ForbiddenHook>,
    ) -> Result<Option<T>, ApiError> {
        let method = options.method.clone();
        let request = self.build_request(endpoint, token, options)?;
        let url = request.url.clone();

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        debug!("{} {} -> {}", method, url, response.status.as_u16());

        classify(&method, response, on_forbidden)
    }

    /// Same as [`ApiClient::request`], but resolves to `Cancelled` as soon as
    /// `cancel` fires. A response that arrives after cancellation is dropped.
    pub async fn request_cancellable<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        token: &str,
        options: RequestOptions,
        on_forbidden: Option<&ForbiddenHook>,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, ApiError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            result = self.request(endpoint, token, options, on_forbidden) => result,
        }
    }

    fn build_request(
        &self,
        endpoint: &str,
        token: &str,
        options: RequestOptions,
    ) -> Result<HttpRequest, ApiError> {
        let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        };

        let body = options
            .body
            .map(|value| serde_json::to_string(&value))
            .transpose()
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;

        let mut request = HttpRequest::new(options.method, url);
        request.headers = merge_headers(options.headers, token);
        request.body = body;

        Ok(request)
    }
}

/// Caller headers first; our `Authorization` and `Content-Type` win
fn merge_headers(caller: Vec<(String, String)>, token: &str) -> Vec<(String, String)> {
    let mut headers: Vec<(String, String)> = caller
        .into_iter()
        .filter(|(name, _)| {
            !name.eq_ignore_ascii_case("authorization") && !name.eq_ignore_ascii_case("content-type")
        })
        .collect();

    headers.push(("Authorization".to_string(), format!("Bearer {}", token)));
    headers.push(("Content-Type".to_string(), "application/json".to_string()));
    headers
}

fn classify<T: DeserializeOwned>(
    method: &Method,
    response: HttpResponse,
    on_forbidden: Option<&ForbiddenHook>,
) -> Result<Option<T>, ApiError> {
    let status = response.status;

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::AuthExpired);
    }

    if status == StatusCode::FORBIDDEN {
        if let Some(hook) = on_forbidden {
            hook();
        }
        let message = error_message(&response.body).unwrap_or_else(|| response.status_text());
        return Err(ApiError::PermissionDenied { message });
    }

    if !status.is_success() {
        let message = error_message(&response.body).unwrap_or_else(|| response.status_text());
        warn!("Catalog request failed ({}): {}", status.as_u16(), message);
        return Err(ApiError::Api {
            status: status.as_u16(),
            message,
        });
    }

    if status == StatusCode::NO_CONTENT || *method == Method::PUT || *method == Method::DELETE {
        return Ok(None);
    }

    serde_json::from_str(&response.body)
        .map(Some)
        .map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Server-supplied message from an error body.
///
/// The catalog uses `{"error": {"status": 404, "message": ".."}}`; the
/// accounts service uses `{"error": "..", "error_description": ".."}`.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;

    let message = match value.get("error") {
        Some(Value::Object(obj)) => obj.get("message").and_then(Value::as_str),
        Some(Value::String(code)) => value
            .get("error_description")
            .and_then(Value::as_str)
            .or(Some(code.as_str())),
        _ => value.get("message").and_then(Value::as_str),
    };

    message
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::mock::MockTransport;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn client(transport: MockTransport) -> (ApiClient, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        let api = ApiClient::with_transport("https://api.test/v1/", transport.clone());
        (api, transport)
    }

    #[tokio::test]
    async fn test_injects_auth_headers() {
        let (api, transport) = client(MockTransport::new().respond(200, r#"{"ok":true}"#));

        let options = RequestOptions::get()
            .header("authorization", "Bearer stale")
            .header("content-type", "text/plain")
            .header("X-Trace", "1");
        let body: Option<Value> = api.request("/me", "tok", options, None).await.unwrap();
        assert_eq!(body, Some(json!({"ok": true})));

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.url, "https://api.test/v1/me");
        assert_eq!(req.header("Authorization"), Some("Bearer tok"));
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.header("x-trace"), Some("1"));
        assert_eq!(
            req.headers
                .iter()
                .filter(|(k, _)| k.eq_ignore_ascii_case("authorization"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_no_content_is_none() {
        let (api, _) = client(
            MockTransport::new()
                .respond(204, "")
                .respond(204, r#"{"items":[{"id":"al1"}],"total":1}"#),
        );
        for _ in 0..2 {
            let body: Option<Value> = api
                .request("/me/albums", "tok", RequestOptions::get(), None)
                .await
                .unwrap();
            assert!(body.is_none());
        }
    }

    #[tokio::test]
    async fn test_put_and_delete_ignore_body() {
        let (api, _) = client(
            MockTransport::new()
                .respond(200, r#"{"snapshot":"abc"}"#)
                .respond(200, "not json at all"),
        );

        let put: Option<Value> = api
            .request("/me/albums?ids=1", "tok", RequestOptions::put(), None)
            .await
            .unwrap();
        assert!(put.is_none());

        let delete: Option<Value> = api
            .request("/me/albums?ids=1", "tok", RequestOptions::delete(), None)
            .await
            .unwrap();
        assert!(delete.is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_expired() {
        let (api, _) = client(
            MockTransport::new().respond(401, r#"{"error":{"status":401,"message":"expired"}}"#),
        );
        let err = api
            .request::<Value>("/me", "tok", RequestOptions::get(), None)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::AuthExpired);
        assert!(err.is_auth_expired());
    }

    #[tokio::test]
    async fn test_forbidden_runs_hook_first() {
        let (api, _) = client(
            MockTransport::new().respond(403, r#"{"error":{"status":403,"message":"Insufficient client scope"}}"#),
        );

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let hook = move || {
            counter.fetch_add(1, Ordering::SeqCst);
        };

        let err = api
            .request::<Value>("/me/albums", "tok", RequestOptions::get(), Some(&hook))
            .await
            .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            err,
            ApiError::PermissionDenied {
                message: "Insufficient client scope".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_forbidden_without_hook() {
        let (api, _) = client(MockTransport::new().respond(403, ""));
        let err = api
            .request::<Value>("/me", "tok", RequestOptions::get(), None)
            .await
            .unwrap_err();
        assert!(err.is_permission_denied());
    }

    #[tokio::test]
    async fn test_error_body_message() {
        let (api, _) = client(
            MockTransport::new()
                .respond(404, r#"{"error":{"status":404,"message":"Non existing id"}}"#)
                .respond(502, "<html>bad gateway</html>")
                .respond(500, r#"{"error":{"status":500}}"#),
        );

        let err = api
            .request::<Value>("/albums/x", "tok", RequestOptions::get(), None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Api {
                status: 404,
                message: "Non existing id".to_string()
            }
        );

        let err = api
            .request::<Value>("/albums/x", "tok", RequestOptions::get(), None)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Api {
                status: 502,
                message: "Bad Gateway".to_string()
            }
        );

        let err = api
            .request::<Value>("/albums/x", "tok", RequestOptions::get(), None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "catalog service error (500): Internal Server Error");
    }

    #[tokio::test]
    async fn test_network_failure() {
        let (api, _) = client(MockTransport::new().fail("connection refused"));
        let err = api
            .request::<Value>("/me", "tok", RequestOptions::get(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Network(msg) if msg.contains("connection refused")));
    }

    #[tokio::test]
    async fn test_undecodable_success_body() {
        #[derive(Debug, serde::Deserialize)]
        struct Named {
            #[allow(dead_code)]
            name: String,
        }

        let (api, _) = client(MockTransport::new().respond(200, r#"{"id":1}"#));
        let err = api
            .request::<Named>("/x", "tok", RequestOptions::get(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_json_body_is_sent() {
        let (api, transport) = client(MockTransport::new().respond(200, "{}"));
        let _: Option<Value> = api
            .request(
                "me/albums",
                "tok",
                RequestOptions::with_method(Method::POST).json(json!({"ids": ["a"]})),
                None,
            )
            .await
            .unwrap();

        let req = &transport.requests()[0];
        assert_eq!(req.url, "https://api.test/v1/me/albums");
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.body.as_deref(), Some(r#"{"ids":["a"]}"#));
    }

    #[tokio::test]
    async fn test_cancelled_request() {
        let (api, _) = client(MockTransport::new().respond(200, "{}"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = api
            .request_cancellable::<Value>("/me", "tok", RequestOptions::get(), None, &cancel)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Cancelled);
    }

    #[test]
    fn test_error_message_shapes() {
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid authorization code"}"#)
                .as_deref(),
            Some("Invalid authorization code")
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_client"}"#).as_deref(),
            Some("invalid_client")
        );
        assert_eq!(error_message(r#"{"message":"plain"}"#).as_deref(), Some("plain"));
        assert!(error_message(r#"{"error":{"message":""}}"#).is_none());
        assert!(error_message("nope").is_none());
    }
}

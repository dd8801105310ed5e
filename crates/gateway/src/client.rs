//! HTTP client for the case-tracking backend.
//!
//! Mutations go out through here; their effects come back through the
//! document store, never through optimistic local writes. Response
//! decoding is a pure function of status and body, so the wire contract
//! is testable without a server.

use std::sync::PoisonError;
use std::time::Duration;

use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use vigia_common::{ApiConfig, AppError, AppResult, IdGenerator};
use vigia_core::SessionStore;

/// Backend error payload, FastAPI-style.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: String,
}

/// REST client for state-changing requests.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: std::sync::RwLock<Option<String>>,
    ids: IdGenerator,
    session_store: Option<SessionStore>,
}

impl ApiClient {
    /// Build a client from configuration.
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::Config(format!("invalid api.base_url: {e}")))?;
        // Relative endpoint joins need the trailing slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("vigia/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            token: std::sync::RwLock::new(None),
            ids: IdGenerator::new(),
            session_store: None,
        })
    }

    /// Attach a session store, cleared whenever the backend revokes
    /// authentication.
    #[must_use]
    pub fn with_session_store(mut self, store: SessionStore) -> Self {
        self.session_store = Some(store);
        self
    }

    /// Install or clear the bearer token.
    pub fn set_token(&self, token: Option<String>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Whether a bearer token is currently installed.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn bearer(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) const fn session_store(&self) -> Option<&SessionStore> {
        self.session_store.as_ref()
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::Internal(format!("bad endpoint path {path}: {e}")))
    }

    /// Start a request against a backend path relative to the base URL.
    pub(crate) fn request(
        &self,
        method: reqwest::Method,
        path: &str,
    ) -> AppResult<RequestBuilder> {
        Ok(self.http.request(method, self.endpoint(path)?))
    }

    async fn send(&self, request: RequestBuilder) -> AppResult<(u16, String)> {
        let request_id = self.ids.request_id();
        let mut request = request.header("X-Request-Id", &request_id);
        if let Some(token) = self.bearer() {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Connection(format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Connection(format!("failed to read response body: {e}")))?;
        debug!(status, request_id = %request_id, "backend response");
        Ok((status, body))
    }

    /// Send and decode a JSON response body.
    pub(crate) async fn request_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> AppResult<T> {
        let (status, body) = self.send(request).await?;
        match decode_response(status, &body) {
            Ok(value) => Ok(value),
            Err(err) => Err(self.auth_checked(err).await),
        }
    }

    /// Send a request whose response body carries nothing.
    pub(crate) async fn request_empty(&self, request: RequestBuilder) -> AppResult<()> {
        let (status, body) = self.send(request).await?;
        match decode_empty(status, &body) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.auth_checked(err).await),
        }
    }

    /// On 401/403, drop the local token and the persisted session: the
    /// next start must not resume with credentials the backend rejects.
    async fn auth_checked(&self, err: AppError) -> AppError {
        if err.invalidates_session() {
            warn!(code = err.error_code(), "authentication revoked by backend");
            self.set_token(None);
            if let Some(store) = &self.session_store {
                if let Err(clear_err) = store.clear().await {
                    warn!(error = %clear_err, "failed to clear persisted session");
                }
            }
        }
        err
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_token", &self.has_token())
            .finish_non_exhaustive()
    }
}

const fn is_success(status: u16) -> bool {
    status >= 200 && status < 300
}

fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> AppResult<T> {
    if !is_success(status) {
        return Err(decode_error(status, body));
    }
    // A 2xx with an unreadable body is a transport failure, not a
    // backend verdict.
    serde_json::from_str(body).map_err(|e| {
        AppError::Connection(format!("undecodable response body (HTTP {status}): {e}"))
    })
}

fn decode_empty(status: u16, body: &str) -> AppResult<()> {
    if is_success(status) {
        Ok(())
    } else {
        Err(decode_error(status, body))
    }
}

/// Map a non-2xx response to an error, surfacing the backend's `detail`
/// message when the body carries one.
fn decode_error(status: u16, body: &str) -> AppError {
    let detail = serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| {
            if body.trim().is_empty() {
                format!("HTTP {status}")
            } else {
                body.trim().to_string()
            }
        },
        |parsed| parsed.detail,
    );

    match status {
        401 => AppError::Unauthorized,
        403 => AppError::Forbidden(detail),
        404 => AppError::NotFound(detail),
        400 | 422 => AppError::Validation(detail),
        _ => AppError::Api {
            status,
            message: detail,
        },
    }
}

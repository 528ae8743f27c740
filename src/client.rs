use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::ApiConfig;
use crate::session::SessionStore;

const USER_AGENT: &str = concat!("padel-admin/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("not logged in: run `padel-admin login` first")]
    NotLoggedIn,

    #[error("session expired or rejected by the server; log in again")]
    Unauthorized,

    #[error("{method} {path} failed with status {status}: {detail}")]
    Status {
        method: Method,
        path: String,
        status: StatusCode,
        detail: String,
    },

    #[error("{path} returned an HTML page instead of JSON")]
    HtmlResponse { path: String },

    #[error("failed to decode response of {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// REST client for the club backend. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, session: Arc<SessionStore>) -> ApiResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        // Tunnels in front of dev backends otherwise answer with an HTML warning page.
        headers.insert(
            "ngrok-skip-browser-warning",
            HeaderValue::from_static("true"),
        );
        if let Some(token) = self.session.token() {
            if let Ok(val) = HeaderValue::from_str(&format!("Bearer {}", token)) {
                headers.insert(AUTHORIZATION, val);
            }
        }
        headers
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url).headers(self.default_headers())
    }

    /// Send a request and return the raw body of a successful response.
    pub(crate) async fn execute(
        &self,
        method: Method,
        path: &str,
        req: RequestBuilder,
    ) -> ApiResult<String> {
        debug!("{} {}", method, path);
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        debug!("{} {} -> {}: {}", method, path, status, text);

        if status == StatusCode::UNAUTHORIZED {
            warn!("{} {} rejected with 401, clearing session", method, path);
            if let Err(e) = self.session.clear() {
                error!("Failed to clear session: {:#}", e);
            }
            return Err(ApiError::Unauthorized);
        }

        if looks_like_html(&text) {
            return Err(ApiError::HtmlResponse {
                path: path.to_string(),
            });
        }

        if !status.is_success() {
            return Err(ApiError::Status {
                method,
                path: path.to_string(),
                status,
                detail: error_detail(&text),
            });
        }

        Ok(text)
    }

    pub(crate) async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        req: RequestBuilder,
    ) -> ApiResult<T> {
        let text = self.execute(method, path, req).await?;
        decode(path, &text)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.fetch(Method::GET, path, self.request(Method::GET, path))
            .await
    }

    /// GET an endpoint that should return a JSON array; any other shape
    /// counts as an empty list.
    pub(crate) async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        req: RequestBuilder,
    ) -> ApiResult<Vec<T>> {
        let value: serde_json::Value = self.fetch(Method::GET, path, req).await?;
        if !value.is_array() {
            debug!("{} returned a non-array body, treating as empty", path);
            return Ok(Vec::new());
        }
        serde_json::from_value(value).map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

fn decode<T: DeserializeOwned>(path: &str, text: &str) -> ApiResult<T> {
    // Void endpoints may answer with an empty body.
    let body = if text.trim().is_empty() { "null" } else { text };
    serde_json::from_str(body).map_err(|source| ApiError::Decode {
        path: path.to_string(),
        source,
    })
}

fn looks_like_html(text: &str) -> bool {
    let head = text.trim_start();
    head.starts_with("<!DOCTYPE html")
        || head.starts_with("<!doctype html")
        || head.starts_with("<html")
}

/// Error message from a backend error body: `detail` as a string, the first
/// validation message of a `detail` list, or the raw text.
fn error_detail(text: &str) -> String {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(_) => return text.trim().to_string(),
    };
    match value.get("detail") {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(items)) => items
            .first()
            .and_then(|i| i.get("msg"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| text.trim().to_string()),
        _ => text.trim().to_string(),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::models::SessionUser;
    use crate::session::Session;

    pub(crate) fn client_for(server: &mockito::Server) -> ApiClient {
        let config = ApiConfig {
            base_url: server.url(),
            timeout_secs: 5,
        };
        ApiClient::new(&config, Arc::new(SessionStore::in_memory())).unwrap()
    }

    pub(crate) fn logged_in_client_for(server: &mockito::Server, token: &str) -> ApiClient {
        let client = client_for(server);
        client
            .session()
            .set(Session {
                token: token.to_string(),
                user: SessionUser {
                    id: serde_json::json!(1),
                    name: "Admin".into(),
                    email: "admin@club.test".into(),
                    is_admin: true,
                    club_id: Some(1),
                    must_change_password: None,
                },
            })
            .unwrap();
        client
    }
}

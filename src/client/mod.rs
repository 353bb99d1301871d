// src/client/mod.rs
// =============================================================================
// This module talks to the remote service.
//
// Submodules:
// - http: the reqwest-backed client used by the real CLI
//
// Everything that needs to issue a request goes through the QueryClient
// trait defined here. Probers only ever see the trait, so tests can drive
// them with a scripted client instead of a live server.
//
// Rust concepts:
// - Traits: a shared interface that several types can implement
// - async-trait: lets trait methods be async
// - thiserror: derives std::error::Error for our error enum
// =============================================================================

mod http;

pub use http::HttpClient;

use async_trait::async_trait;
use serde_json::{Map, Value};
use url::Url;

// The marker header every request carries so the service can tell a scripted
// request apart from a browser navigating to the page.
pub const SCRIPTED_HEADER: (&str, &str) = ("X-Requested-With", "XMLHttpRequest");

/// HTTP method of a request. It is derived from whether a form body is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One request to the service: where it goes and an optional form body.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    pub endpoint: Url,
    pub form: Option<Vec<(String, String)>>,
}

impl ServiceRequest {
    pub fn get(endpoint: Url) -> Self {
        Self { endpoint, form: None }
    }

    pub fn post(endpoint: Url, form: Vec<(String, String)>) -> Self {
        Self {
            endpoint,
            form: Some(form),
        }
    }

    // GET when no body; POST with a URL-encoded body otherwise
    pub fn method(&self) -> Method {
        match self.form {
            Some(_) => Method::Post,
            None => Method::Get,
        }
    }
}

/// The request could not produce usable JSON.
///
/// Service-side errors are NOT transport errors: the service reports them
/// in-band as a JSON `error` object, which the caller inspects itself.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("response was not valid JSON: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        TransportError::Network(error.to_string())
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(error: serde_json::Error) -> Self {
        TransportError::Malformed(error.to_string())
    }
}

/// Pulls the in-band `error` object out of a service response, if there is one.
///
/// A non-object error (some services answer with a bare string) is wrapped as
/// `{"message": ...}` so callers always get a map to render.
pub fn service_error(response: &Value) -> Option<Map<String, Value>> {
    match response.get("error")? {
        Value::Null => None,
        Value::Object(map) => Some(map.clone()),
        other => {
            let mut map = Map::new();
            map.insert("message".to_string(), other.clone());
            Some(map)
        }
    }
}

/// Issues a single request and resolves with parsed JSON or a transport error.
///
/// Exactly one attempt per call: no retry, no timeout.
#[async_trait]
pub trait QueryClient: Send + Sync {
    async fn request(&self, request: ServiceRequest) -> Result<Value, TransportError>;
}

// src/client/http.rs
// =============================================================================
// The real request client, built on reqwest.
//
// Key functionality:
// - Attaches the X-Requested-With marker header to every request
// - Sends GET without a body, POST with a URL-encoded form body
// - Reads the whole body and parses it as JSON
// - Never inspects the HTTP status: REST services answer errors with a
//   JSON `error` object, often with status 200
//
// No timeout and no retry: a stalled request stalls only its own queue.
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{Method, QueryClient, ServiceRequest, TransportError, SCRIPTED_HEADER};

/// reqwest-backed QueryClient.
///
/// Client is cheap to clone (it's just a reference counter internally), so
/// HttpClient is too.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!("service-probe/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl QueryClient for HttpClient {
    async fn request(&self, request: ServiceRequest) -> Result<Value, TransportError> {
        let method = request.method();
        debug!(?method, endpoint = %request.endpoint, "sending request");

        let builder = match (method, request.form) {
            (Method::Post, Some(form)) => self.client.post(request.endpoint).form(&form),
            _ => self.client.get(request.endpoint),
        };

        let response = builder
            .header(SCRIPTED_HEADER.0, SCRIPTED_HEADER.1)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        Ok(serde_json::from_str(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use url::Url;

    fn endpoint(server: &Server, path: &str) -> Url {
        Url::parse(&format!("{}{}", server.url(), path)).unwrap()
    }

    #[tokio::test]
    async fn test_get_sends_marker_header() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/MapServer/0/query")
            .match_header("x-requested-with", "XMLHttpRequest")
            .match_query(Matcher::UrlEncoded("f".into(), "json".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"count": 12}"#)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let mut url = endpoint(&server, "/MapServer/0/query");
        url.query_pairs_mut().append_pair("f", "json");

        let value = client.request(ServiceRequest::get(url)).await.unwrap();
        assert_eq!(value["count"], 12);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_post_sends_form_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/MapServer/0/query")
            .match_header("x-requested-with", "XMLHttpRequest")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(Matcher::UrlEncoded("where".into(), "1=1".into()))
            .with_status(200)
            .with_body(r#"{"count": 3}"#)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let request = ServiceRequest::post(
            endpoint(&server, "/MapServer/0/query"),
            vec![("where".to_string(), "1=1".to_string())],
        );

        let value = client.request(request).await.unwrap();
        assert_eq!(value["count"], 3);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_still_returns_json() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/MapServer/0")
            .with_status(500)
            .with_body(r#"{"error": {"code": 500, "message": "Internal"}}"#)
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let value = client
            .request(ServiceRequest::get(endpoint(&server, "/MapServer/0")))
            .await
            .unwrap();
        assert_eq!(value["error"]["code"], 500);
    }

    #[tokio::test]
    async fn test_html_body_is_malformed() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/MapServer/0")
            .with_status(200)
            .with_body("<html><body>Login</body></html>")
            .create_async()
            .await;

        let client = HttpClient::new().unwrap();
        let result = client
            .request(ServiceRequest::get(endpoint(&server, "/MapServer/0")))
            .await;
        assert!(matches!(result, Err(TransportError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is not listening in test environments
        let client = HttpClient::new().unwrap();
        let url = Url::parse("http://127.0.0.1:9/MapServer/0").unwrap();
        let result = client.request(ServiceRequest::get(url)).await;
        assert!(matches!(result, Err(TransportError::Network(_))));
    }
}

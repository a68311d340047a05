//! Integration tests for Tidewater.
//!
//! The storefront router is driven in-process with `tower::ServiceExt::oneshot`
//! against the in-memory account store, so no database or running server is
//! needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tidewater-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;

use tidewater_storefront::config::{StorefrontConfig, TokenConfig};
use tidewater_storefront::db::MemoryAccountStore;
use tidewater_storefront::routes;
use tidewater_storefront::services::TokenCodec;
use tidewater_storefront::state::AppState;

/// Signing secret used by every test server.
pub const TEST_SECRET: &str = "k7Qp2#vX9!rT4@mZ8$wL1^bN6&cY3*hJ";

/// A response with its JSON body (or the raw text wrapped in a JSON string).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// An in-process storefront with direct access to its store.
pub struct TestApp {
    router: Router,
    /// Backing store, for arranging state the API cannot produce.
    pub store: Arc<MemoryAccountStore>,
    /// Codec sharing the server's secret.
    pub tokens: TokenCodec,
    client_ip: IpAddr,
}

impl TestApp {
    /// Build a storefront over an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        let token = TokenConfig::with_secret(SecretString::from(TEST_SECRET.to_string()));
        let config = StorefrontConfig {
            database_url: None,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            token: token.clone(),
            cors_origins: Vec::new(),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let store = Arc::new(MemoryAccountStore::new());
        let state = AppState::new(config, store.clone());

        Self {
            router: routes::app(state),
            store,
            tokens: TokenCodec::new(&token),
            client_ip: IpAddr::V4(Ipv4Addr::new(203, 0, 113, 10)),
        }
    }

    /// Use a different client IP for subsequent requests.
    #[must_use]
    pub const fn with_client_ip(mut self, ip: IpAddr) -> Self {
        self.client_ip = ip;
        self
    }

    /// Send a request with an optional `Authorization` header and JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<&Value>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-forwarded-for", self.client_ip.to_string());
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// `Authorization` value for a token.
    #[must_use]
    pub fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    /// Register an account and return its token.
    ///
    /// # Panics
    ///
    /// Panics if registration does not succeed.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> String {
        let response = self
            .send(
                Method::POST,
                "/api/users/register",
                None,
                Some(&serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": password,
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["token"]
            .as_str()
            .expect("token in register response")
            .to_string()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A complete billing address payload.
#[must_use]
pub fn address(street: &str) -> Value {
    serde_json::json!({
        "street": street,
        "city": "Portland",
        "state": "OR",
        "zipCode": "97201",
        "country": "US",
    })
}

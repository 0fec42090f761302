//! ShopEasy REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP via `reqwest`; every response body is read as
//!   text first so failures can be diagnosed from logs.
//! - The server is the source of truth for the authenticated cart - NO
//!   local sync, direct API calls followed by re-fetch.
//! - Bearer auth: the token obtained from login/register is attached to
//!   every request when present. [`ApiClient::with_bearer_token`] returns a
//!   client bound to a token, so a client value is immutable once built.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopeasy_client::api::{ApiClient, types::ProductQuery};
//!
//! let client = ApiClient::new(&config)?;
//! let page = client.products(&ProductQuery::default()).await?;
//!
//! let auth = client.login(&email, "hunter2!").await?;
//! let client = client.with_bearer_token(auth.token.into());
//! client.cart_add(&product_id, 1).await?;
//! ```

pub mod types;

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use shopeasy_core::{CartLineId, Email, Product, ProductId, User};

use crate::config::ClientConfig;
use types::{
    AddToCartRequest, AddToCartResponse, AuthResponse, CategoriesResponse, ErrorBody,
    MessageResponse, ProductQuery, ProductResponse, ProductsPage, ProfileResponse,
    RemoteCartView, UpdateCartRequest, VerifyResponse,
};

/// Errors that can occur when calling the ShopEasy API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint URL could not be built.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Referenced resource does not exist (HTTP 404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request was rejected by input validation (HTTP 400).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Missing, invalid, or expired credentials (HTTP 401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Rate limited by the server (HTTP 429).
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success response.
    #[error("server error (HTTP {status}): {message}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, if any.
        message: String,
    },
}

/// Client for the ShopEasy REST API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: Url,
    token: Option<SecretString>,
}

impl ApiClient {
    /// Create a new client without credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_url.clone(),
                token: None,
            }),
        })
    }

    /// A client bound to a bearer token. The connection pool is shared
    /// with `self`.
    #[must_use]
    pub fn with_bearer_token(&self, token: SecretString) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                http: self.inner.http.clone(),
                base_url: self.inner.base_url.clone(),
                token: Some(token),
            }),
        }
    }

    /// Whether this client carries credentials.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.inner.token.is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Execute a request and decode the JSON response.
    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let mut request = self.inner.http.request(method, url);

        if let Some(token) = &self.inner.token {
            request = request.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            let error_body: ErrorBody = serde_json::from_str(&response_text).unwrap_or_default();
            let message =
                error_body.into_message(status.canonical_reason().unwrap_or("request failed"));

            return Err(match status {
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                StatusCode::BAD_REQUEST => ApiError::Validation(message),
                StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
                _ => {
                    tracing::error!(
                        status = %status,
                        body = %response_text.chars().take(500).collect::<String>(),
                        "API returned non-success status"
                    );
                    ApiError::Server {
                        status: status.as_u16(),
                        message,
                    }
                }
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Register a new account. The response includes a ready-to-use token.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the email is taken or the password is too
    /// weak, or any transport error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn register(
        &self,
        email: &Email,
        display_name: &str,
        password: &str,
    ) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint("/api/auth/register")?;
        let body = serde_json::json!({
            "email": email,
            "displayName": display_name,
            "password": password,
        });
        self.execute(Method::POST, url, Some(body)).await
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` on bad credentials, or any transport error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint("/api/auth/login")?;
        let body = serde_json::json!({
            "email": email,
            "password": password,
        });
        self.execute(Method::POST, url, Some(body)).await
    }

    /// Fetch the profile of the logged-in user.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` if the token is missing or stale.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<User, ApiError> {
        let url = self.endpoint("/api/auth/profile")?;
        let response: ProfileResponse = self.execute(Method::GET, url, None).await?;
        Ok(response.user)
    }

    /// Check whether the current token is still accepted.
    ///
    /// # Errors
    ///
    /// Returns an error only on transport failure; a rejected token yields
    /// `Ok(false)`.
    #[instrument(skip(self))]
    pub async fn verify(&self) -> Result<bool, ApiError> {
        let url = self.endpoint("/api/auth/verify")?;
        match self.execute::<VerifyResponse>(Method::GET, url, None).await {
            Ok(response) => Ok(response.valid),
            Err(ApiError::Unauthorized(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// List products with filters, pagination, and sorting.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for malformed filters, or any transport error.
    #[instrument(skip(self, query))]
    pub async fn products(&self, query: &ProductQuery) -> Result<ProductsPage, ApiError> {
        let mut url = self.endpoint("/api/products")?;
        url.query_pairs_mut().extend_pairs(query.to_pairs());
        self.execute(Method::GET, url, None).await
    }

    /// Fetch a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such product exists.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let url = self.endpoint(&format!("/api/products/{id}"))?;
        let response: ProductResponse = self.execute(Method::GET, url, None).await?;
        Ok(response.product)
    }

    /// List all known product categories.
    ///
    /// # Errors
    ///
    /// Returns any transport error.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint("/api/products/categories/list")?;
        let response: CategoriesResponse = self.execute(Method::GET, url, None).await?;
        Ok(response.categories)
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Fetch the account cart with its server-computed summary.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` without a valid token.
    #[instrument(skip(self))]
    pub async fn cart(&self) -> Result<RemoteCartView, ApiError> {
        let url = self.endpoint("/api/cart")?;
        self.execute(Method::GET, url, None).await
    }

    /// Add units of a product to the account cart.
    ///
    /// The server merges by product: adding a product that is already in
    /// the cart increments its quantity rather than duplicating the row.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn cart_add(&self, product_id: &ProductId, quantity: u32) -> Result<u32, ApiError> {
        let url = self.endpoint("/api/cart/add")?;
        let body = serde_json::to_value(AddToCartRequest {
            product_id: product_id.as_str(),
            quantity,
        })?;
        let response: AddToCartResponse = self.execute(Method::POST, url, Some(body)).await?;
        Ok(response.quantity)
    }

    /// Overwrite the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line does not exist (or belongs to
    /// another user).
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn cart_update(&self, line_id: &CartLineId, quantity: u32) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/api/cart/{line_id}"))?;
        let body = serde_json::to_value(UpdateCartRequest { quantity })?;
        let _: MessageResponse = self.execute(Method::PUT, url, Some(body)).await?;
        Ok(())
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the line does not exist.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn cart_remove(&self, line_id: &CartLineId) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/api/cart/{line_id}"))?;
        let _: MessageResponse = self.execute(Method::DELETE, url, None).await?;
        Ok(())
    }

    /// Remove every line from the account cart.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` without a valid token.
    #[instrument(skip(self))]
    pub async fn cart_clear(&self) -> Result<(), ApiError> {
        let url = self.endpoint("/api/cart")?;
        let _: MessageResponse = self.execute(Method::DELETE, url, None).await?;
        Ok(())
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("token", &self.inner.token.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_config() -> ClientConfig {
        ClientConfig {
            api_url: "http://localhost:3001".parse().unwrap(),
            data_dir: std::env::temp_dir(),
            http_timeout: std::time::Duration::from_secs(5),
            sentry_dsn: None,
        }
    }

    #[test]
    fn test_endpoint_join() {
        let client = ApiClient::new(&test_config()).unwrap();
        let url = client.endpoint("/api/cart").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/api/cart");
    }

    #[test]
    fn test_with_bearer_token() {
        let client = ApiClient::new(&test_config()).unwrap();
        assert!(!client.has_token());

        let authed = client.with_bearer_token(SecretString::from("jwt-abc"));
        assert!(authed.has_token());
        // The original client is untouched
        assert!(!client.has_token());
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = ApiClient::new(&test_config())
            .unwrap()
            .with_bearer_token(SecretString::from("super-secret-jwt"));

        let debug_output = format!("{client:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super-secret-jwt"));
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("Product not found".to_owned());
        assert_eq!(err.to_string(), "not found: Product not found");

        let err = ApiError::Server {
            status: 502,
            message: "bad gateway".to_owned(),
        };
        assert_eq!(err.to_string(), "server error (HTTP 502): bad gateway");

        let err = ApiError::RateLimited(60);
        assert_eq!(err.to_string(), "rate limited, retry after 60 seconds");
    }
}

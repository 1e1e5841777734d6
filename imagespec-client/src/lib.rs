//! Imagespec HTTP Client
//!
//! A small, type-safe client for keeping machine image specifications in
//! the `images` data bag of a Chef server.
//!
//! The crate has three layers:
//! - [`ChefServerClient`]: raw data bag endpoints of the Chef server API
//! - [`RecordStore`]: create-or-update and delete of one data bag item,
//!   injected wherever records are persisted
//! - [`ChefImageSpec`]: one image record and the operations on it
//!
//! # Example
//!
//! ```no_run
//! use imagespec_client::{ChefImageSpec, DataBagStore};
//! use imagespec_core::domain::server::ServerLocator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = ServerLocator::new("http://localhost:8889");
//!     let store = DataBagStore::new();
//!
//!     let spec = match ChefImageSpec::get("web1", &server).await? {
//!         Some(spec) => spec,
//!         None => ChefImageSpec::empty("web1", server.clone()),
//!     };
//!
//!     spec.save(&store).await?;
//!     println!("Saved {}", spec.id());
//!     Ok(())
//! }
//! ```

mod data_bags;
pub mod error;
pub mod image_spec;
pub mod store;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use image_spec::ChefImageSpec;
pub use store::{DataBagStore, RecordStore};

use imagespec_core::domain::server::ServerLocator;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Chef client version advertised in `X-Chef-Version`
pub const CHEF_VERSION: &str = "17.0.0";

/// Server API version requested in `X-Ops-Server-API-Version`
pub const SERVER_API_VERSION: &str = "1";

/// HTTP client for the Chef server API
///
/// Requests are unsigned; the client identifies itself with `X-Ops-UserId`
/// when the locator carries a client name.
#[derive(Debug, Clone)]
pub struct ChefServerClient {
    /// Base URL of the server (e.g., "http://localhost:8889")
    base_url: String,
    /// Name sent as `X-Ops-UserId`
    client_name: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl ChefServerClient {
    /// Create a new client for the given base URL
    ///
    /// # Example
    /// ```
    /// use imagespec_client::ChefServerClient;
    ///
    /// let client = ChefServerClient::new("http://localhost:8889");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use imagespec_client::ChefServerClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(30))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = ChefServerClient::with_client("http://localhost:8889", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_name: None,
            client,
        }
    }

    /// Resolve a server locator to a client
    pub fn for_server(server: &ServerLocator) -> Result<Self> {
        Self::for_server_with_client(server, Client::new())
    }

    /// Resolve a server locator to a client sharing an existing HTTP client
    pub fn for_server_with_client(server: &ServerLocator, client: Client) -> Result<Self> {
        server.validate()?;

        let mut chef = Self::with_client(server.chef_server_url.as_str(), client);
        chef.client_name = server.client_name.clone();
        Ok(chef)
    }

    /// Get the base URL of the server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the URL of an endpoint below the base URL
    ///
    /// Each segment is percent-encoded, so names containing `/`, `?` or `#`
    /// stay a single path segment. Empty, `.` and `..` segments are rejected.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|segment| matches!(**segment, "" | "." | ".."))
        {
            return Err(ClientError::InvalidRequest(format!(
                "invalid path segment {:?}",
                bad
            )));
        }

        let mut url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::InvalidRequest(format!("invalid base URL {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                ClientError::InvalidRequest(format!("base URL cannot have a path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);

        Ok(url)
    }

    /// Build a request for an endpoint with the Chef headers set
    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "chef api request");

        let builder = self
            .client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header("X-Chef-Version", CHEF_VERSION)
            .header("X-Ops-Server-API-Version", SERVER_API_VERSION);

        Ok(match &self.client_name {
            Some(name) => builder.header("X-Ops-UserId", name),
            None => builder,
        })
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response whose body is not needed
    ///
    /// This method checks the status code and returns an error if the request failed.
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

//! Chef server locator
//!
//! Identifies the Chef server an image record belongs to. The locator is
//! used both to derive record identifiers and to build an API client.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable holding the default Chef server URL
pub const SERVER_URL_VAR: &str = "CHEF_SERVER_URL";

/// Environment variable holding the API client name
pub const CLIENT_NAME_VAR: &str = "CHEF_CLIENT_NAME";

/// Environment variable holding the path to the client signing key
pub const CLIENT_KEY_VAR: &str = "CHEF_CLIENT_KEY";

/// Errors raised while building or checking a locator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("{0} environment variable not set")]
    MissingEnv(&'static str),

    #[error("chef_server_url cannot be empty")]
    EmptyUrl,

    #[error("chef_server_url must start with http:// or https://: {0}")]
    InvalidScheme(String),
}

/// Address and credentials of a Chef server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerLocator {
    /// Base URL of the server (e.g., "https://chef.example.com/organizations/acme")
    pub chef_server_url: String,

    /// API client name, sent as `X-Ops-UserId`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    /// Path to the client's private key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_key_filename: Option<PathBuf>,
}

impl ServerLocator {
    /// Creates a locator with no credentials
    pub fn new(chef_server_url: impl Into<String>) -> Self {
        Self {
            chef_server_url: chef_server_url.into(),
            client_name: None,
            signing_key_filename: None,
        }
    }

    /// Sets the API client name
    pub fn with_client_name(mut self, client_name: impl Into<String>) -> Self {
        self.client_name = Some(client_name.into());
        self
    }

    /// Sets the signing key path
    pub fn with_signing_key(mut self, path: impl Into<PathBuf>) -> Self {
        self.signing_key_filename = Some(path.into());
        self
    }

    /// Creates the default locator from environment variables
    ///
    /// Expected environment variables:
    /// - CHEF_SERVER_URL (required)
    /// - CHEF_CLIENT_NAME (optional)
    /// - CHEF_CLIENT_KEY (optional, path to the client key)
    pub fn from_env() -> Result<Self, LocatorError> {
        let chef_server_url =
            std::env::var(SERVER_URL_VAR).map_err(|_| LocatorError::MissingEnv(SERVER_URL_VAR))?;

        let locator = Self {
            chef_server_url,
            client_name: std::env::var(CLIENT_NAME_VAR).ok().filter(|s| !s.is_empty()),
            signing_key_filename: std::env::var(CLIENT_KEY_VAR)
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        };
        locator.validate()?;

        Ok(locator)
    }

    /// Validates the locator
    pub fn validate(&self) -> Result<(), LocatorError> {
        if self.chef_server_url.is_empty() {
            return Err(LocatorError::EmptyUrl);
        }

        if !self.chef_server_url.starts_with("http://")
            && !self.chef_server_url.starts_with("https://")
        {
            return Err(LocatorError::InvalidScheme(self.chef_server_url.clone()));
        }

        Ok(())
    }
}

impl std::fmt::Display for ServerLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.client_name {
            Some(name) => write!(f, "{} (as {})", self.chef_server_url, name),
            None => write!(f, "{}", self.chef_server_url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let locator = ServerLocator::new("https://chef.example.com")
            .with_client_name("provisioner")
            .with_signing_key("/etc/chef/client.pem");

        assert_eq!(locator.client_name.as_deref(), Some("provisioner"));
        assert_eq!(
            locator.signing_key_filename,
            Some(PathBuf::from("/etc/chef/client.pem"))
        );
        assert_eq!(
            locator.to_string(),
            "https://chef.example.com (as provisioner)"
        );
    }

    #[test]
    fn test_validation() {
        assert!(ServerLocator::new("http://localhost:8889").validate().is_ok());
        assert_eq!(
            ServerLocator::new("").validate(),
            Err(LocatorError::EmptyUrl)
        );
        assert!(matches!(
            ServerLocator::new("chef.example.com").validate(),
            Err(LocatorError::InvalidScheme(_))
        ));
    }

    #[test]
    fn test_from_env_reads_all_variables() {
        temp_env::with_vars(
            [
                (SERVER_URL_VAR, Some("https://chef.example.com/organizations/acme")),
                (CLIENT_NAME_VAR, Some("provisioner")),
                (CLIENT_KEY_VAR, Some("/etc/chef/provisioner.pem")),
            ],
            || {
                let locator = ServerLocator::from_env().unwrap();

                assert_eq!(
                    locator,
                    ServerLocator::new("https://chef.example.com/organizations/acme")
                        .with_client_name("provisioner")
                        .with_signing_key("/etc/chef/provisioner.pem")
                );
            },
        );
    }

    #[test]
    fn test_from_env_optional_variables() {
        temp_env::with_vars(
            [
                (SERVER_URL_VAR, Some("http://localhost:8889")),
                (CLIENT_NAME_VAR, Some("")),
                (CLIENT_KEY_VAR, None),
            ],
            || {
                let locator = ServerLocator::from_env().unwrap();

                assert_eq!(locator, ServerLocator::new("http://localhost:8889"));
            },
        );
    }

    #[test]
    fn test_from_env_requires_server_url() {
        temp_env::with_vars(
            [(SERVER_URL_VAR, None::<&str>), (CLIENT_NAME_VAR, Some("provisioner"))],
            || {
                assert_eq!(
                    ServerLocator::from_env(),
                    Err(LocatorError::MissingEnv(SERVER_URL_VAR))
                );
            },
        );
    }

    #[test]
    fn test_from_env_validates_url() {
        temp_env::with_var(SERVER_URL_VAR, Some("chef.example.com"), || {
            assert!(matches!(
                ServerLocator::from_env(),
                Err(LocatorError::InvalidScheme(_))
            ));
        });
    }

    #[test]
    fn test_credentials_omitted_when_unset() {
        let json = serde_json::to_value(ServerLocator::new("http://localhost:8889")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "chef_server_url": "http://localhost:8889" })
        );
    }
}

//! Configuration module
//!
//! Handles CLI configuration: which Chef server to talk to and as whom.

use imagespec_core::domain::server::ServerLocator;
use std::path::PathBuf;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Chef server holding the `images` data bag
    pub server: ServerLocator,
}

impl Config {
    /// Builds the configuration from command line values
    pub fn new(
        server_url: String,
        client_name: Option<String>,
        client_key: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let mut server = ServerLocator::new(server_url);
        if let Some(name) = client_name {
            server = server.with_client_name(name);
        }
        if let Some(key) = client_key {
            server = server.with_signing_key(key);
        }
        server.validate()?;

        Ok(Self { server })
    }
}

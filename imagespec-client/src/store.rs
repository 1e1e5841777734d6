//! Record store
//!
//! Persists named records into a collection on a Chef server. The store is
//! passed explicitly to whatever saves or deletes records, so tests can
//! substitute their own implementation.

use async_trait::async_trait;
use imagespec_core::domain::server::ServerLocator;
use imagespec_core::dto::data_bag::DataBagItemAction;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::ChefServerClient;
use crate::error::{ClientError, Result};

/// Store trait for writing and removing records on a Chef server
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Creates the record, or replaces it if its content differs
    ///
    /// # Arguments
    /// * `collection` - Data bag holding the record (e.g., "images")
    /// * `item_name` - Record name, used as the item id
    /// * `server` - Server the record lives on
    /// * `data` - Full record body
    async fn upsert_record(
        &self,
        collection: &str,
        item_name: &str,
        server: &ServerLocator,
        data: &Value,
    ) -> Result<()>;

    /// Removes the record if it exists
    ///
    /// # Arguments
    /// * `collection` - Data bag holding the record
    /// * `item_name` - Record name
    /// * `server` - Server the record lives on
    async fn delete_record(
        &self,
        collection: &str,
        item_name: &str,
        server: &ServerLocator,
    ) -> Result<()>;
}

/// Data bag implementation of RecordStore
///
/// One HTTP connection pool is shared across every server the store is
/// asked to talk to.
#[derive(Debug, Clone, Default)]
pub struct DataBagStore {
    client: Client,
}

impl DataBagStore {
    /// Creates a store with a default HTTP client
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store using a configured HTTP client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn chef(&self, server: &ServerLocator) -> Result<ChefServerClient> {
        ChefServerClient::for_server_with_client(server, self.client.clone())
    }

    /// Creates an item, creating its data bag first if the server lacks it
    async fn create_item(&self, chef: &ChefServerClient, collection: &str, body: &Value) -> Result<()> {
        match chef.create_data_bag_item(collection, body).await {
            Err(e) if e.is_not_found() => {
                info!(collection, "Creating data bag");
                match chef.create_data_bag(collection).await {
                    Err(e) if !e.is_conflict() => return Err(e),
                    _ => {}
                }
                chef.create_data_bag_item(collection, body).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl RecordStore for DataBagStore {
    async fn upsert_record(
        &self,
        collection: &str,
        item_name: &str,
        server: &ServerLocator,
        data: &Value,
    ) -> Result<()> {
        let action = DataBagItemAction::Upsert;
        let chef = self.chef(server)?;

        let mut body = data.clone();
        match body.as_object_mut() {
            Some(fields) => {
                fields.insert("id".to_string(), Value::String(item_name.to_string()));
            }
            None => {
                return Err(ClientError::InvalidRequest(format!(
                    "data bag item {}/{} must be a JSON object",
                    collection, item_name
                )));
            }
        }

        match chef.get_data_bag_item(collection, item_name).await {
            Ok(current) if current == body => {
                debug!(%action, collection, item_name, "Data bag item up to date");
                Ok(())
            }
            Ok(_) => {
                chef.update_data_bag_item(collection, item_name, &body).await?;
                info!(%action, collection, item_name, server = %server, "Updated data bag item");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                self.create_item(&chef, collection, &body).await?;
                info!(%action, collection, item_name, server = %server, "Created data bag item");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn delete_record(
        &self,
        collection: &str,
        item_name: &str,
        server: &ServerLocator,
    ) -> Result<()> {
        let action = DataBagItemAction::Destroy;
        let chef = self.chef(server)?;

        match chef.delete_data_bag_item(collection, item_name).await {
            Ok(()) => {
                info!(%action, collection, item_name, server = %server, "Deleted data bag item");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(%action, collection, item_name, "Data bag item already absent");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

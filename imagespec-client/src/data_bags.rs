//! Data bag API endpoints

use crate::ChefServerClient;
use crate::error::Result;
use imagespec_core::dto::data_bag::CreateDataBag;
use reqwest::Method;
use serde_json::Value;

impl ChefServerClient {
    // =============================================================================
    // Data Bags
    // =============================================================================

    /// Create a data bag
    ///
    /// The server answers 409 if the bag already exists.
    ///
    /// # Arguments
    /// * `bag` - Name of the data bag
    pub async fn create_data_bag(&self, bag: &str) -> Result<()> {
        let response = self
            .request(Method::POST, &["data"])?
            .json(&CreateDataBag {
                name: bag.to_string(),
            })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Data Bag Items
    // =============================================================================

    /// Get a data bag item
    ///
    /// # Arguments
    /// * `bag` - Name of the data bag
    /// * `item` - Item id
    ///
    /// # Returns
    /// The raw item body
    ///
    /// # Example
    /// ```no_run
    /// # use imagespec_client::ChefServerClient;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = ChefServerClient::new("http://localhost:8889");
    /// let item = client.get_data_bag_item("images", "web1").await?;
    /// println!("{}", item["id"]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn get_data_bag_item(&self, bag: &str, item: &str) -> Result<Value> {
        let response = self
            .request(Method::GET, &["data", bag, item])?
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Create a data bag item
    ///
    /// The item id is taken from the `id` field of `body`. The server answers
    /// 404 if the bag does not exist and 409 if the item already exists.
    pub async fn create_data_bag_item(&self, bag: &str, body: &Value) -> Result<()> {
        let response = self
            .request(Method::POST, &["data", bag])?
            .json(body)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Replace an existing data bag item
    pub async fn update_data_bag_item(&self, bag: &str, item: &str, body: &Value) -> Result<()> {
        let response = self
            .request(Method::PUT, &["data", bag, item])?
            .json(body)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Delete a data bag item
    pub async fn delete_data_bag_item(&self, bag: &str, item: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &["data", bag, item])?
            .send()
            .await?;

        self.handle_empty_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientError;
    use imagespec_core::domain::server::ServerLocator;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_get_item_sends_chef_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/data/images/web1")
            .match_header("accept", "application/json")
            .match_header("x-chef-version", crate::CHEF_VERSION)
            .match_header("x-ops-userid", "provisioner")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "web1"}"#)
            .create_async()
            .await;

        let locator = ServerLocator::new(server.url()).with_client_name("provisioner");
        let client = ChefServerClient::for_server(&locator).unwrap();
        let item = client.get_data_bag_item("images", "web1").await.unwrap();

        assert_eq!(item, json!({ "id": "web1" }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_item_error_status() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/data/images/web1")
            .with_status(403)
            .with_body(r#"{"error": ["forbidden"]}"#)
            .create_async()
            .await;

        let client = ChefServerClient::new(server.url());
        let err = client.get_data_bag_item("images", "web1").await.unwrap_err();

        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().contains("forbidden"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_item_names_are_encoded() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/data/images/web%2F1")
            .with_status(200)
            .create_async()
            .await;

        let client = ChefServerClient::new(server.url());
        client.delete_data_bag_item("images", "web/1").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_dot_item_name_is_rejected() {
        let client = ChefServerClient::new("http://localhost:8889");
        let err = client.get_data_bag_item("images", "..").await.unwrap_err();

        assert!(matches!(err, ClientError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_create_bag_and_item() {
        let mut server = Server::new_async().await;
        let bag = server
            .mock("POST", "/data")
            .match_body(Matcher::Json(json!({ "name": "images" })))
            .with_status(201)
            .create_async()
            .await;
        let item = server
            .mock("POST", "/data/images")
            .match_body(Matcher::Json(json!({ "id": "web1" })))
            .with_status(201)
            .create_async()
            .await;

        let client = ChefServerClient::new(server.url());
        client.create_data_bag("images").await.unwrap();
        client
            .create_data_bag_item("images", &json!({ "id": "web1" }))
            .await
            .unwrap();

        bag.assert_async().await;
        item.assert_async().await;
    }

    #[tokio::test]
    async fn test_update_and_delete_item() {
        let mut server = Server::new_async().await;
        let put = server
            .mock("PUT", "/data/images/web1")
            .match_body(Matcher::Json(json!({ "id": "web1", "owner": "ops" })))
            .with_status(200)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/data/images/web1")
            .with_status(200)
            .create_async()
            .await;

        let client = ChefServerClient::new(server.url());
        client
            .update_data_bag_item("images", "web1", &json!({ "id": "web1", "owner": "ops" }))
            .await
            .unwrap();
        client.delete_data_bag_item("images", "web1").await.unwrap();

        put.assert_async().await;
        delete.assert_async().await;
    }
}

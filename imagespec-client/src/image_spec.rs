//! Image specification accessor
//!
//! Sufficient information to find an image and provision machines from it
//! after it has been created. Records live in the `images` data bag of the
//! owning Chef server.

use imagespec_core::domain::image::{IMAGES_DATA_BAG, ImageData, ImageLocation, image_id};
use imagespec_core::domain::machine_options::MachineOptions;
use imagespec_core::domain::server::ServerLocator;
use tracing::debug;

use crate::ChefServerClient;
use crate::error::{ClientError, Result};
use crate::store::RecordStore;

/// An image record bound to the Chef server it belongs to
///
/// Changes stay in memory until [`ChefImageSpec::save`] is called; nothing
/// is written back automatically.
#[derive(Debug, Clone, PartialEq)]
pub struct ChefImageSpec {
    data: ImageData,
    server: ServerLocator,
}

impl ChefImageSpec {
    /// Wraps existing record data
    pub fn new(data: ImageData, server: ServerLocator) -> Self {
        Self { data, server }
    }

    /// Fetches an image record from the server
    ///
    /// Returns `Ok(None)` if the server reports the record as not found.
    /// Every other failure is returned unchanged.
    pub async fn get(name: &str, server: &ServerLocator) -> Result<Option<Self>> {
        let chef = ChefServerClient::for_server(server)?;
        Self::get_with(&chef, name, server).await
    }

    /// Fetches an image record through an existing client
    pub async fn get_with(
        chef: &ChefServerClient,
        name: &str,
        server: &ServerLocator,
    ) -> Result<Option<Self>> {
        let raw = match chef.get_data_bag_item(IMAGES_DATA_BAG, name).await {
            Ok(raw) => raw,
            Err(e) if e.is_not_found() => {
                debug!(name, server = %server, "Image record not found");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let mut data: ImageData = serde_json::from_value(raw).map_err(|e| {
            ClientError::ParseError(format!("Invalid image record {}: {}", name, e))
        })?;
        if data.id.is_empty() {
            data.id = name.to_string();
        }

        Ok(Some(Self::new(data, server.clone())))
    }

    /// Creates a record with only its id set
    ///
    /// No remote call is made; the caller fills in the rest before saving.
    pub fn empty(id: impl Into<String>, server: ServerLocator) -> Self {
        Self::new(ImageData::empty(id), server)
    }

    /// Globally unique identifier for this image
    ///
    /// Does not depend on the image's location or existence.
    pub fn id(&self) -> String {
        Self::id_from(&self.server, self.name())
    }

    /// Identifier of the image `name` on `server`
    pub fn id_from(server: &ServerLocator, name: &str) -> String {
        image_id(server, name)
    }

    /// Record name
    pub fn name(&self) -> &str {
        &self.data.id
    }

    /// All stored fields
    pub fn image_data(&self) -> &ImageData {
        &self.data
    }

    pub fn image_data_mut(&mut self) -> &mut ImageData {
        &mut self.data
    }

    /// Server the record belongs to
    pub fn server(&self) -> &ServerLocator {
        &self.server
    }

    pub fn location(&self) -> Option<&ImageLocation> {
        self.data.location.as_ref()
    }

    pub fn set_location(&mut self, location: ImageLocation) {
        self.data.set_location(location);
    }

    pub fn machine_options(&self) -> Option<&MachineOptions> {
        self.data.machine_options.as_ref()
    }

    pub fn set_machine_options(&mut self, machine_options: MachineOptions) {
        self.data.set_machine_options(machine_options);
    }

    /// URL of the driver that owns the image
    pub fn driver_url(&self) -> Option<&str> {
        self.data.driver_url()
    }

    /// Writes the record to the server
    ///
    /// If the record holds information that would be hard to recover,
    /// save it as soon as possible.
    pub async fn save(&self, store: &dyn RecordStore) -> Result<()> {
        let payload = serde_json::to_value(&self.data).map_err(|e| {
            ClientError::InvalidRequest(format!("Cannot encode image record {}: {}", self.name(), e))
        })?;

        store
            .upsert_record(IMAGES_DATA_BAG, self.name(), &self.server, &payload)
            .await
    }

    /// Removes the record from the server
    pub async fn delete(&self, store: &dyn RecordStore) -> Result<()> {
        store
            .delete_record(IMAGES_DATA_BAG, self.name(), &self.server)
            .await
    }
}

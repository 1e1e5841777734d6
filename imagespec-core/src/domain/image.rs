//! Image record
//!
//! The body of one item in the `images` data bag, and the identifier
//! derived for it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::machine_options::{MachineOptions, OptionMap, take_typed};
use crate::domain::server::ServerLocator;

/// Data bag holding image records
pub const IMAGES_DATA_BAG: &str = "images";

/// Globally unique identifier of an image record
///
/// Depends only on the server URL and the record name, never on a live
/// connection: `<server-url>/data/images/<name>`.
pub fn image_id(server: &ServerLocator, name: &str) -> String {
    format!(
        "{}/data/{}/{}",
        server.chef_server_url, IMAGES_DATA_BAG, name
    )
}

/// Where the provisioning driver placed an image
///
/// Known fields whose stored value has another type stay in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImageLocation {
    /// URL of the driver that owns the image (e.g., "aws:default:us-east-1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_version: Option<String>,

    /// Driver-side image identifier (e.g., an AMI id)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocated_at: Option<String>,

    /// Driver-specific fields
    #[serde(flatten)]
    pub extra: OptionMap,
}

/// Stored fields of an image record
///
/// A missing `id` reads as an empty string. `location` or
/// `machine_options` values that are not maps are kept in `attributes`
/// exactly as stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageData {
    /// Record name, also the data bag item id
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ImageLocation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine_options: Option<MachineOptions>,

    /// Every other top-level field, kept as stored
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl<'de> Deserialize<'de> for ImageLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = OptionMap::deserialize(deserializer)?;

        Ok(Self {
            driver_url: take_typed(&mut fields, "driver_url"),
            driver_version: take_typed(&mut fields, "driver_version"),
            image_id: take_typed(&mut fields, "image_id"),
            allocated_at: take_typed(&mut fields, "allocated_at"),
            extra: fields,
        })
    }
}

impl<'de> Deserialize<'de> for ImageData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = OptionMap::deserialize(deserializer)?;

        let id = match fields.remove("id") {
            Some(Value::String(id)) => id,
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };

        Ok(Self {
            id,
            location: take_typed(&mut fields, "location"),
            machine_options: take_typed(&mut fields, "machine_options"),
            attributes: fields,
        })
    }
}

impl ImageData {
    /// Creates a record carrying only its id
    pub fn empty(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            location: None,
            machine_options: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Sets the location, replacing any unreadable stored value
    pub fn set_location(&mut self, location: ImageLocation) {
        self.attributes.remove("location");
        self.location = Some(location);
    }

    /// Sets the machine options, replacing any unreadable stored value
    pub fn set_machine_options(&mut self, machine_options: MachineOptions) {
        self.attributes.remove("machine_options");
        self.machine_options = Some(machine_options);
    }

    /// URL of the driver that owns the image, if the image has been allocated
    pub fn driver_url(&self) -> Option<&str> {
        self.location
            .as_ref()
            .and_then(|location| location.driver_url.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_image_id_is_concatenation() {
        let server = ServerLocator::new("https://chef.example.com/organizations/acme");
        assert_eq!(
            image_id(&server, "web1"),
            "https://chef.example.com/organizations/acme/data/images/web1"
        );
        assert_eq!(image_id(&server, "web1"), image_id(&server, "web1"));
    }

    #[test]
    fn test_image_id_ignores_credentials() {
        let plain = ServerLocator::new("http://localhost:8889");
        let with_creds = plain.clone().with_client_name("admin");
        assert_eq!(image_id(&plain, "base"), image_id(&with_creds, "base"));
    }

    #[test]
    fn test_empty_serializes_to_id_only() {
        let data = ImageData::empty("web1");
        assert_eq!(serde_json::to_value(&data).unwrap(), json!({ "id": "web1" }));
        assert_eq!(data.driver_url(), None);
    }

    #[test]
    fn test_missing_id_reads_as_empty() {
        let data: ImageData = serde_json::from_value(json!({
            "machine_options": { "bootstrap_options": { "instance_type": "m1.small" } }
        }))
        .unwrap();

        assert_eq!(data.id, "");
        assert_eq!(
            data.machine_options.unwrap().bootstrap_option("instance_type"),
            Some(&json!("m1.small"))
        );
    }

    #[test]
    fn test_non_string_id_is_stringified() {
        let data: ImageData = serde_json::from_value(json!({ "id": 42 })).unwrap();
        assert_eq!(data.id, "42");
        assert!(data.attributes.is_empty());
    }

    #[test]
    fn test_unreadable_sections_are_kept_as_stored() {
        let stored = json!({
            "id": "web1",
            "location": "us-east-1",
            "machine_options": ["legacy"]
        });

        let data: ImageData = serde_json::from_value(stored.clone()).unwrap();

        assert_eq!(data.location, None);
        assert_eq!(data.machine_options, None);
        assert_eq!(data.attributes["location"], json!("us-east-1"));
        assert_eq!(serde_json::to_value(&data).unwrap(), stored);
    }

    #[test]
    fn test_mistyped_location_field_is_kept() {
        let stored = json!({
            "id": "web1",
            "location": { "driver_url": "aws:default:us-east-1", "image_id": 1234 }
        });

        let data: ImageData = serde_json::from_value(stored.clone()).unwrap();
        let location = data.location.as_ref().unwrap();

        assert_eq!(location.image_id, None);
        assert_eq!(location.extra["image_id"], json!(1234));
        assert_eq!(data.driver_url(), Some("aws:default:us-east-1"));
        assert_eq!(serde_json::to_value(&data).unwrap(), stored);
    }

    #[test]
    fn test_set_location_replaces_unreadable_value() {
        let mut data: ImageData =
            serde_json::from_value(json!({ "id": "web1", "location": "us-east-1" })).unwrap();

        data.set_location(ImageLocation {
            image_id: Some("ami-1".to_string()),
            ..Default::default()
        });

        assert_eq!(
            serde_json::to_value(&data).unwrap(),
            json!({ "id": "web1", "location": { "image_id": "ami-1" } })
        );
    }

    #[test]
    fn test_stored_record_round_trip() {
        let stored = json!({
            "id": "web1",
            "location": {
                "driver_url": "aws:default:us-east-1",
                "image_id": "ami-1234",
                "region": "us-east-1"
            },
            "machine_options": {
                "bootstrap_options": { "instance_type": "m1.small" }
            },
            "owner": "platform"
        });

        let data: ImageData = serde_json::from_value(stored.clone()).unwrap();

        assert_eq!(data.driver_url(), Some("aws:default:us-east-1"));
        assert_eq!(data.location.as_ref().unwrap().extra["region"], json!("us-east-1"));
        assert_eq!(data.attributes["owner"], json!("platform"));
        assert_eq!(serde_json::to_value(&data).unwrap(), stored);
    }
}

//! Machine options
//!
//! Provisioning options recorded alongside an image. Stored records are
//! read straight into this schema: known sections get their own fields and
//! every other key lands in `extra`, so keys are plain strings at every
//! nesting level. A known key whose stored value has an unexpected type is
//! kept in `extra` untouched, so older records stay readable and are written
//! back as they were.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered string-keyed option map
pub type OptionMap = BTreeMap<String, Value>;

/// Removes `key` from `fields` if its value parses as `T`
///
/// Values that are null or fail to parse stay in `fields`.
pub(crate) fn take_typed<T: DeserializeOwned>(fields: &mut OptionMap, key: &str) -> Option<T> {
    let value = fields.get(key)?;
    if value.is_null() {
        return None;
    }

    let parsed = serde_json::from_value(value.clone()).ok()?;
    fields.remove(key);
    Some(parsed)
}

/// Options used to provision machines from an image
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MachineOptions {
    /// Driver-specific options for creating the machine (instance type, key pair, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_options: Option<OptionMap>,

    /// Options for converging the machine once it is up
    #[serde(skip_serializing_if = "Option::is_none")]
    pub convergence_options: Option<OptionMap>,

    /// Options for capturing the image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_options: Option<OptionMap>,

    /// Transport options for SSH connections
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_options: Option<OptionMap>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_username: Option<String>,

    /// Which address to connect to (e.g., "public_ip", "private_ip")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport_address_location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_windows: Option<bool>,

    /// Any option without a dedicated field, or whose stored value does not fit it
    #[serde(flatten)]
    pub extra: OptionMap,
}

impl<'de> Deserialize<'de> for MachineOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = OptionMap::deserialize(deserializer)?;

        Ok(Self {
            bootstrap_options: take_typed(&mut fields, "bootstrap_options"),
            convergence_options: take_typed(&mut fields, "convergence_options"),
            image_options: take_typed(&mut fields, "image_options"),
            ssh_options: take_typed(&mut fields, "ssh_options"),
            ssh_username: take_typed(&mut fields, "ssh_username"),
            transport_address_location: take_typed(&mut fields, "transport_address_location"),
            is_windows: take_typed(&mut fields, "is_windows"),
            extra: fields,
        })
    }
}

impl MachineOptions {
    /// Looks up a single bootstrap option
    pub fn bootstrap_option(&self, key: &str) -> Option<&Value> {
        self.bootstrap_options.as_ref().and_then(|opts| opts.get(key))
    }

    /// Sets a single bootstrap option, creating the section if needed
    ///
    /// A stored `bootstrap_options` value that was not a map is replaced.
    pub fn set_bootstrap_option(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        if self.bootstrap_options.is_none() {
            self.extra.remove("bootstrap_options");
        }
        self.bootstrap_options
            .get_or_insert_with(OptionMap::new)
            .insert(key.into(), value.into());
    }

    /// Returns true if no option is set
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

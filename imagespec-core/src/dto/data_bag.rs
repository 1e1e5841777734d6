//! Data bag DTOs

use serde::{Deserialize, Serialize};

/// Request to create a data bag (`POST /data`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDataBag {
    pub name: String,
}

/// Action applied to a data bag item by a record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataBagItemAction {
    /// Create the item, or update it if its content differs
    Upsert,

    /// Remove the item if it exists
    Destroy,
}

impl std::fmt::Display for DataBagItemAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataBagItemAction::Upsert => write!(f, "upsert"),
            DataBagItemAction::Destroy => write!(f, "destroy"),
        }
    }
}

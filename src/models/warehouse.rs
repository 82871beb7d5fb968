//! Warehouse records

use super::lenient_i64;
use crate::types::JsonObject;
use serde::{Deserialize, Serialize};

/// A warehouse (location) as returned by `getWarehouses`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Warehouse {
    #[serde(rename = "warehouseID", deserialize_with = "lenient_i64")]
    pub id: i64,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub code: String,

    #[serde(rename = "addressID", default, deserialize_with = "lenient_i64")]
    pub address_id: i64,

    #[serde(rename = "isOfflineInventory", default, deserialize_with = "lenient_i64")]
    pub offline_inventory: i64,

    #[serde(flatten)]
    pub extra: JsonObject,
}

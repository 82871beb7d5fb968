//! Response envelope types

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// Status block attached to every API response
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatus {
    /// `ok` or `error`
    #[serde(default)]
    pub response_status: String,
    /// Remote error code, 0 on success
    #[serde(default)]
    pub error_code: i64,
    /// Name of the offending input field, when the remote side reports one
    #[serde(default)]
    pub error_field: Option<String>,
    /// Total number of records matching the request across all pages
    #[serde(default)]
    pub records_total: Option<u64>,
    /// Number of records in this response
    #[serde(default)]
    pub records_in_response: Option<u64>,
}

impl ApiStatus {
    /// Check whether the call succeeded
    pub fn is_ok(&self) -> bool {
        self.response_status.eq_ignore_ascii_case("ok") && self.error_code == 0
    }

    /// Turn a failed status into an error
    pub fn ensure_ok(&self) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(Error::api(self.error_code, self.error_field.clone()))
        }
    }
}

/// Decoded response of one API call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    /// Status block
    pub status: ApiStatus,
    /// Returned records (empty when the remote side sends `null`)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub records: Vec<T>,
}

impl<T> ApiResponse<T> {
    /// Total record count reported by the remote side
    pub fn records_total(&self) -> Option<u64> {
        self.status.records_total
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

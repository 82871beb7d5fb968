//! Product catalogue records

use super::{lenient_f64, lenient_i64};
use crate::types::JsonObject;
use serde::{Deserialize, Serialize};

/// A product as returned by `getProducts`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "productID", deserialize_with = "lenient_i64")]
    pub product_id: i64,

    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "groupID", default, deserialize_with = "lenient_i64")]
    pub group_id: i64,

    #[serde(rename = "categoryID", default, deserialize_with = "lenient_i64")]
    pub category_id: i64,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: f64,

    #[serde(default)]
    pub status: String,

    /// Last change as a unix timestamp
    #[serde(rename = "lastModified", default, deserialize_with = "lenient_i64")]
    pub last_modified: i64,

    #[serde(flatten)]
    pub extra: JsonObject,
}

/// A product group as returned by `getProductGroups`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductGroup {
    #[serde(rename = "productGroupID", deserialize_with = "lenient_i64")]
    pub id: i64,

    #[serde(default)]
    pub name: String,

    #[serde(rename = "parentGroupID", default, deserialize_with = "lenient_i64")]
    pub parent_group_id: i64,

    #[serde(rename = "positionNo", default, deserialize_with = "lenient_i64")]
    pub position: i64,

    #[serde(rename = "subGroups", default)]
    pub sub_groups: Vec<ProductGroup>,

    #[serde(flatten)]
    pub extra: JsonObject,
}

/// A priority group as returned by `getProductPriorityGroups`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductPriorityGroup {
    #[serde(rename = "priorityGroupID", deserialize_with = "lenient_i64")]
    pub id: i64,

    #[serde(rename = "priorityGroupName", default)]
    pub name: String,

    #[serde(flatten)]
    pub extra: JsonObject,
}

/// A product category as returned by `getProductCategories`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductCategory {
    #[serde(rename = "productCategoryID", deserialize_with = "lenient_i64")]
    pub id: i64,

    #[serde(rename = "parentCategoryID", default, deserialize_with = "lenient_i64")]
    pub parent_category_id: i64,

    #[serde(rename = "productCategoryName", default)]
    pub name: String,

    #[serde(flatten)]
    pub extra: JsonObject,
}

use serde::Deserialize;
use serde_json::Value;

use crate::domain::settings::{FilterMatch, FilterSlot};

#[derive(Debug, Deserialize)]
pub struct RewriteFiltersRequest {
    pub slot: FilterSlot,
    pub old: Value,
    pub new: Value,
    #[serde(default)]
    pub condition: Option<FilterMatch>,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub doctype: String,
    pub name: String,
}

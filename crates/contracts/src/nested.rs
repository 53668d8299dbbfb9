//! NestedEvent - Mapper output
//!
//! The renamed, regrouped record posted to the destination.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `{ "value": .., "type": .. }` entry of an attribute or trait mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedValue {
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TypedValue {
    pub fn new(value: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: kind.into(),
        }
    }
}

/// Key -> typed value mapping
pub type TypedMap = BTreeMap<String, TypedValue>;

/// Nested event record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedEvent {
    pub event: String,
    pub event_type: String,
    pub app_id: String,
    pub user_id: String,
    pub message_id: String,
    pub page_title: String,
    pub page_url: String,
    pub browser_language: String,
    pub screen_size: String,
    pub attributes: TypedMap,
    pub traits: TypedMap,
}

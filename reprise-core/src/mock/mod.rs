//! Mock records and the mock store they are exchanged through
//!
//! A [`Mocker`] is the persisted shape of one intercepted call: the method
//! key as the request body, the serialized result as the response body and
//! the result's type descriptor as the response type. The record format is
//! the only bit-exact contract between recording and replay.

mod memory;

pub use memory::InMemoryMockStore;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::value::Value;

/// Kind of call a record captures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockCategory {
    /// Configured dynamic-class method call
    DynamicClass,
}

/// How a replay query picks among matching records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MockStrategy {
    /// The most recently recorded match
    #[default]
    FindLast,
    /// Exactly one match, or nothing
    Strict,
}

/// Request half of a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRequest {
    /// Method key
    pub body: Option<String>,
}

/// Response half of a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResponse {
    /// Serialized result
    pub body: Option<String>,

    /// Result type descriptor
    #[serde(rename = "type")]
    pub type_name: Option<String>,

    /// Payload attributes such as `Format=protobuf`
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, String>,
}

impl TargetResponse {
    /// Set an attribute
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Read an attribute
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// One recorded call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mocker {
    /// Record kind
    pub category: MockCategory,

    /// Owning type name
    pub operation_name: String,

    /// Method name
    pub method_name: String,

    /// Case the record belongs to, when recorded inside a context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,

    /// Request half
    pub target_request: TargetRequest,

    /// Response half
    pub target_response: TargetResponse,
}

impl Mocker {
    /// Create a dynamic-class record for `type_name.method_name`
    pub fn dynamic_class(type_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            category: MockCategory::DynamicClass,
            operation_name: type_name.into(),
            method_name: method_name.into(),
            record_id: None,
            target_request: TargetRequest::default(),
            target_response: TargetResponse::default(),
        }
    }

    /// Whether `other` is a query for the same call as this record
    pub fn matches(&self, query: &Mocker) -> bool {
        self.category == query.category
            && self.operation_name == query.operation_name
            && self.method_name == query.method_name
            && self.target_request.body == query.target_request.body
    }
}

/// Store that persists recorded calls and answers replay queries
pub trait MockStore: Send + Sync {
    /// Persist a record
    fn record_mocker(&self, mocker: Mocker);

    /// Find a record matching a query
    fn replay_mocker(&self, query: &Mocker, strategy: MockStrategy) -> Option<Mocker>;

    /// Whether a replayed record carries a usable response
    fn check_response_mocker(&self, mocker: &Mocker) -> bool {
        mocker
            .target_response
            .type_name
            .as_deref()
            .is_some_and(|type_name| !type_name.is_empty())
    }
}

/// Outcome of a replay lookup
#[derive(Debug, Clone, PartialEq)]
pub struct MockResult {
    /// Whether the caller should ignore the replayed value
    pub ignore_mock_result: bool,

    /// Replayed value
    pub result: Value,
}

impl MockResult {
    /// A replayed value, with the ignore flag from the ignore policy
    pub fn success(ignore_mock_result: bool, result: Value) -> Self {
        Self {
            ignore_mock_result,
            result,
        }
    }

    /// "Do not use this mock"
    pub fn ignore() -> Self {
        Self {
            ignore_mock_result: true,
            result: Value::Null,
        }
    }
}

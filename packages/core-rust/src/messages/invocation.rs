//! Invocation requests, results and completion records.

use serde::{Deserialize, Serialize};

use crate::metadata::ObjectDescriptor;
use crate::types::Value;

/// Transport-level routing fields carried from request to response.
///
/// Opaque to the registry and the queue; only the transport layer reads them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRouting {
    pub browser_id: i32,
    pub frame_id: i64,
    /// Correlation token for the response. `None` for fire-and-forget calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_id: Option<i64>,
}

/// Which member operation a request performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InvocationKind {
    CallMethod { method: String, args: Vec<Value> },
    GetProperty { property: String },
    SetProperty { property: String, value: Value },
}

impl InvocationKind {
    /// Script name of the targeted member.
    #[must_use]
    pub fn member_name(&self) -> &str {
        match self {
            InvocationKind::CallMethod { method, .. } => method,
            InvocationKind::GetProperty { property } | InvocationKind::SetProperty { property, .. } => {
                property
            }
        }
    }
}

/// A call arriving from the remote side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationRequest {
    pub object_id: i64,
    pub kind: InvocationKind,
    #[serde(default)]
    pub routing: RequestRouting,
}

impl InvocationRequest {
    #[must_use]
    pub fn call(object_id: i64, method: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            object_id,
            kind: InvocationKind::CallMethod {
                method: method.into(),
                args,
            },
            routing: RequestRouting::default(),
        }
    }

    #[must_use]
    pub fn get(object_id: i64, property: impl Into<String>) -> Self {
        Self {
            object_id,
            kind: InvocationKind::GetProperty {
                property: property.into(),
            },
            routing: RequestRouting::default(),
        }
    }

    #[must_use]
    pub fn set(object_id: i64, property: impl Into<String>, value: Value) -> Self {
        Self {
            object_id,
            kind: InvocationKind::SetProperty {
                property: property.into(),
                value,
            },
            routing: RequestRouting::default(),
        }
    }

    #[must_use]
    pub fn with_routing(mut self, routing: RequestRouting) -> Self {
        self.routing = routing;
        self
    }
}

/// A returned value: plain data, or a freshly minted object snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResultValue {
    Value(Value),
    Object(ObjectDescriptor),
}

impl ResultValue {
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ResultValue::Value(v) => Some(v),
            ResultValue::Object(_) => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectDescriptor> {
        match self {
            ResultValue::Object(o) => Some(o),
            ResultValue::Value(_) => None,
        }
    }
}

/// Outcome of executing one request.
///
/// Build with [`InvocationResult::success`] or [`InvocationResult::failure`]:
/// a successful result never carries a message, a failed one never carries a
/// value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ResultValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl InvocationResult {
    #[must_use]
    pub fn success(value: Option<ResultValue>) -> Self {
        Self {
            success: true,
            value,
            message: None,
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            value: None,
            message: Some(message.into()),
        }
    }

    /// The plain value, if the call succeeded with one.
    #[must_use]
    pub fn plain_value(&self) -> Option<&Value> {
        self.value.as_ref().and_then(ResultValue::as_value)
    }
}

/// Payload of the invocation-complete notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationComplete {
    pub routing: RequestRouting,
    pub object_id: i64,
    pub member: String,
    pub result: InvocationResult,
}

/// One entry of an "objects bound" report from the remote side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundObjectNotice {
    pub name: String,
    /// The object was already bound in the remote context before this report.
    pub already_bound: bool,
    /// The remote side served the metadata from its own cache.
    pub cached: bool,
}

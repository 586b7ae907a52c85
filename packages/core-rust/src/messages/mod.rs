//! Messages exchanged with the transport layer.
//!
//! [`BridgeMessage`] is the envelope the transport frames; it is internally
//! tagged by `type` and encodes to `MsgPack` with named fields via
//! `rmp_serde::to_vec_named()`. Framing, retries and timeouts belong to the
//! transport.

pub mod invocation;

use serde::{Deserialize, Serialize};

pub use invocation::{
    BoundObjectNotice, InvocationComplete, InvocationKind, InvocationRequest, InvocationResult,
    RequestRouting, ResultValue,
};

use crate::metadata::ObjectDescriptor;

/// Envelope for everything that crosses the process boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BridgeMessage {
    /// Remote side asks the host to run a call, get or set.
    #[serde(rename = "INVOKE")]
    Invoke(InvocationRequest),
    /// Host reports the outcome of an `INVOKE`.
    #[serde(rename = "INVOCATION_COMPLETE")]
    InvocationComplete(InvocationComplete),
    /// Remote side asks for object metadata; empty `names` means all objects.
    #[serde(rename = "LIST_OBJECTS")]
    ListObjects {
        #[serde(default)]
        names: Vec<String>,
    },
    /// Host answers `LIST_OBJECTS`.
    #[serde(rename = "OBJECT_LIST")]
    ObjectList { objects: Vec<ObjectDescriptor> },
    /// Remote side reports that objects finished binding in a script context.
    #[serde(rename = "OBJECTS_BOUND")]
    ObjectsBound { objects: Vec<BoundObjectNotice> },
}

/// Errors from encoding or decoding a [`BridgeMessage`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to encode message: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("failed to decode message: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}

/// Encodes a message as `MsgPack` with named fields.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
pub fn encode(message: &BridgeMessage) -> Result<Vec<u8>, CodecError> {
    Ok(rmp_serde::to_vec_named(message)?)
}

/// Decodes a message produced by [`encode`].
///
/// # Errors
///
/// Returns [`CodecError::Decode`] if the bytes are not a valid message.
pub fn decode(bytes: &[u8]) -> Result<BridgeMessage, CodecError> {
    Ok(rmp_serde::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MethodDescriptor, PropertyDescriptor};
    use crate::types::Value;

    #[test]
    fn invoke_message_survives_msgpack() {
        let request = InvocationRequest::call(
            42,
            "add",
            vec![Value::Int(1), Value::String("two".into()), Value::Null],
        )
        .with_routing(RequestRouting {
            browser_id: 3,
            frame_id: 9,
            callback_id: Some(11),
        });
        let message = BridgeMessage::Invoke(request);

        let bytes = encode(&message).unwrap();
        assert_eq!(decode(&bytes).unwrap(), message);
    }

    #[test]
    fn object_list_carries_nested_descriptors() {
        let child = ObjectDescriptor {
            id: 2,
            name: "settings".into(),
            script_name: "settings".into(),
            is_async: false,
            camel_case_names: true,
            root: false,
            methods: vec![],
            properties: vec![PropertyDescriptor {
                script_name: "theme".into(),
                name: "theme".into(),
                read_only: true,
                complex: false,
                value: Some(Value::String("dark".into())),
                object: None,
            }],
        };
        let root = ObjectDescriptor {
            id: 1,
            name: "app".into(),
            script_name: "app".into(),
            is_async: false,
            camel_case_names: true,
            root: true,
            methods: vec![MethodDescriptor {
                script_name: "reload".into(),
                name: "reload".into(),
                parameter_count: 0,
            }],
            properties: vec![PropertyDescriptor {
                script_name: "settings".into(),
                name: "settings".into(),
                read_only: true,
                complex: true,
                value: None,
                object: Some(Box::new(child)),
            }],
        };
        let message = BridgeMessage::ObjectList {
            objects: vec![root],
        };

        let decoded = decode(&encode(&message).unwrap()).unwrap();
        let BridgeMessage::ObjectList { objects } = decoded else {
            panic!("expected OBJECT_LIST");
        };
        let nested = objects[0].property("settings").unwrap().object.as_ref().unwrap();
        assert_eq!(
            nested.property("theme").unwrap().value,
            Some(Value::String("dark".into()))
        );
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(matches!(decode(&[0xc1, 0x00]), Err(CodecError::Decode(_))));
    }
}

//! JSON wire codec shared by every node: telemetry readings out of the
//! sensor node, command payloads into the hub, status and capture
//! reports back to the backend. All bus payloads go through here so the
//! wire format lives in one place.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug)]
pub enum CodecError {
    Encode(String),
    Decode(String),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::Encode(reason) => write!(f, "message encode failed: {reason}"),
            CodecError::Decode(reason) => write!(f, "message decode failed: {reason}"),
        }
    }
}

pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(message).map_err(|e| CodecError::Encode(format!("{e}")))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(format!("{e}")))
}

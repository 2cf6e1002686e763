//! Two-stage decoding of upstream frames.
//!
//! The outer envelope is plain JSON. For chat messages its `data` field is a
//! JSON *string* whose contents are the actual event JSON, so the payload is
//! unwrapped as a string literal first and parsed second.

use serde_json::value::RawValue;
use thiserror::Error;

use crate::models::{ChatMessageEvent, RawEnvelope};

/// Per-frame decode failure. Never fatal to the stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("envelope carries no data")]
    MissingPayload,

    #[error("payload is not a JSON string: {0}")]
    PayloadEncoding(#[source] serde_json::Error),

    #[error("malformed chat message: {0}")]
    Payload(#[source] serde_json::Error),
}

pub fn decode(frame: &str) -> Result<RawEnvelope, DecodeError> {
    serde_json::from_str(frame).map_err(DecodeError::Envelope)
}

pub fn decode_payload(data: &RawValue) -> Result<ChatMessageEvent, DecodeError> {
    let inner: String = serde_json::from_str(data.get()).map_err(DecodeError::PayloadEncoding)?;
    serde_json::from_str(&inner).map_err(DecodeError::Payload)
}

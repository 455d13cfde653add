//! Handling of the backend's `{ success, data, message }` response envelope.
//!
//! The backend is not consistent about where it nests a payload, so the
//! helpers here look in every place it has been seen to put things and treat
//! anything else as a failure rather than as an empty result.

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("response reported failure: {0}")]
    Unsuccessful(String),

    #[error("response has no recognizable payload: {0}")]
    MissingPayload(String),
}

/// Return the `data` payload of a successful envelope.
///
/// `success` must be literally `true`; a missing flag is a failure.
pub fn unwrap_envelope(body: &Value) -> Result<&Value, EnvelopeError> {
    match body.get("success").and_then(Value::as_bool) {
        Some(true) => {}
        Some(false) => return Err(EnvelopeError::Unsuccessful(message_of(body))),
        None => {
            return Err(EnvelopeError::Unsuccessful(
                "missing success indicator".to_string(),
            ))
        }
    }

    match body.get("data") {
        Some(Value::Null) | None => Err(EnvelopeError::MissingPayload(
            "missing data field".to_string(),
        )),
        Some(data) => Ok(data),
    }
}

/// Locate the single booking document inside a successful envelope.
pub fn extract_booking(body: &Value) -> Result<&Value, EnvelopeError> {
    let data = unwrap_envelope(body)?;

    let candidate = match data.get("booking") {
        Some(booking) if booking.is_object() => booking,
        _ => data,
    };

    if candidate.is_object() {
        Ok(candidate)
    } else {
        Err(EnvelopeError::MissingPayload(
            "booking payload is not an object".to_string(),
        ))
    }
}

/// Locate the professional list inside a successful envelope.
///
/// Returns `Ok` with an empty slice when the list is present but empty; an
/// envelope whose payload holds no list at any known location is an error.
pub fn extract_professional_list(body: &Value) -> Result<&[Value], EnvelopeError> {
    let data = unwrap_envelope(body)?;
    let nested = data.get("data");

    let located = nested
        .and_then(|inner| inner.get("professionals"))
        .or_else(|| data.get("professionals"))
        .or_else(|| nested.and_then(|inner| inner.get("items")))
        .or_else(|| data.get("items"))
        .or_else(|| nested.filter(|inner| inner.is_array()))
        .or_else(|| Some(data).filter(|d| d.is_array()));

    located
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(|| EnvelopeError::MissingPayload("no professional list in payload".to_string()))
}

fn message_of(body: &Value) -> String {
    body.get("message")
        .or_else(|| body.get("error"))
        .and_then(Value::as_str)
        .unwrap_or("no message")
        .to_string()
}

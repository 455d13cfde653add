// libs/booking-cell/src/services/normalize.rs
//! Turn raw professional documents into `ProfessionalCandidate`s.
//!
//! Both lookups feed through here so nothing downstream knows which endpoint
//! a candidate came from.

use serde_json::Value;
use tracing::debug;

use shared_models::envelope::{self, EnvelopeError};
use shared_models::{CandidateSource, ProfessionalCandidate};

pub const UNKNOWN_NAME: &str = "Unknown";

/// Extract and normalise every professional in a response body.
///
/// Items without an id are dropped. An empty list is `Ok(vec![])`.
pub fn normalize_response(
    body: &Value,
    source: CandidateSource,
) -> Result<Vec<ProfessionalCandidate>, EnvelopeError> {
    let items = envelope::extract_professional_list(body)?;

    let candidates: Vec<ProfessionalCandidate> = items
        .iter()
        .filter_map(|item| normalize_candidate(item, source))
        .collect();

    if candidates.len() < items.len() {
        debug!(
            "Dropped {} professional entries without an id",
            items.len() - candidates.len()
        );
    }

    Ok(candidates)
}

pub fn normalize_candidate(item: &Value, source: CandidateSource) -> Option<ProfessionalCandidate> {
    let id = non_blank_str(item.get("_id"))
        .or_else(|| non_blank_str(item.get("id")))?
        .to_string();

    let name = non_blank_str(item.get("name"))
        .or_else(|| non_blank_str(item.get("user").and_then(|user| user.get("name"))))
        .or_else(|| non_blank_str(item.get("phone")))
        .unwrap_or(UNKNOWN_NAME)
        .to_string();

    Some(ProfessionalCandidate {
        id,
        name,
        rating: rating_of(item),
        experience: experience_of(item),
        availability: availability_of(item, source),
        source,
    })
}

fn non_blank_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn rating_of(item: &Value) -> f64 {
    match item.get("rating") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn experience_of(item: &Value) -> String {
    let specializations: Vec<&str> = item
        .get("specializations")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default();

    if !specializations.is_empty() {
        return specializations.join(", ");
    }

    match item.get("experience") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => format!("{} years", n),
        _ => String::new(),
    }
}

fn availability_of(item: &Value, source: CandidateSource) -> bool {
    if source == CandidateSource::Primary {
        return true;
    }

    let explicitly_unavailable = ["isAvailable", "available", "availability"]
        .iter()
        .any(|key| item.get(*key).and_then(Value::as_bool) == Some(false));

    !explicitly_unavailable
}

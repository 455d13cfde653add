use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

// ==============================================================================
// BOOKING RECORD
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub status: BookingStatus,
    #[serde(default, deserialize_with = "lenient")]
    pub scheduled_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub scheduled_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub services: Vec<ServiceLineItem>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_amount: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub payment_status: PaymentStatus,
    #[serde(default, deserialize_with = "lenient")]
    pub address: Option<Address>,
    #[serde(default, alias = "user", deserialize_with = "lenient")]
    pub customer: Option<EntityRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub professional: Option<EntityRef>,
    #[serde(default, deserialize_with = "lenient")]
    pub cancellation_reason: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Id of the attached professional, if any.
    pub fn professional_id(&self) -> Option<&str> {
        self.professional.as_ref().map(EntityRef::id)
    }

    pub fn is_assigned(&self) -> bool {
        self.professional_id().is_some_and(|id| !id.is_empty())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check the record-level invariants of a booking.
    ///
    /// A pending booking may carry a professional once an assignment has been
    /// confirmed but the service has not started yet.
    pub fn check_invariants(&self) -> Result<(), BookingInvariantViolation> {
        let has_reason = self
            .cancellation_reason
            .as_deref()
            .is_some_and(|reason| !reason.trim().is_empty());

        match (self.status, has_reason) {
            (BookingStatus::Cancelled, false) => {
                return Err(BookingInvariantViolation::MissingCancellationReason)
            }
            (status, true) if status != BookingStatus::Cancelled => {
                return Err(BookingInvariantViolation::UnexpectedCancellationReason(status))
            }
            _ => {}
        }

        if matches!(self.status, BookingStatus::Ongoing | BookingStatus::Completed)
            && !self.is_assigned()
        {
            return Err(BookingInvariantViolation::MissingProfessional(self.status));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingInvariantViolation {
    #[error("cancelled booking has no cancellation reason")]
    MissingCancellationReason,

    #[error("{0} booking carries a cancellation reason")]
    UnexpectedCancellationReason(BookingStatus),

    #[error("{0} booking has no professional attached")]
    MissingProfessional(BookingStatus),
}

// ==============================================================================
// STATUS ENUMS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Ongoing,
    Completed,
    #[serde(alias = "canceled")]
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Ongoing,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Ongoing => "ongoing",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BookingStatus::Pending),
            "ongoing" => Ok(BookingStatus::Ongoing),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" | "canceled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

// ==============================================================================
// NESTED RECORDS
// ==============================================================================

/// One service on a booking.
///
/// Line items arrive either with a name or as a reference to the service
/// catalogue (`service` holding an id or a populated document).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLineItem {
    #[serde(default, alias = "title", deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub service: Option<EntityRef>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub price: f64,
    #[serde(default = "default_quantity", deserialize_with = "lenient_quantity")]
    pub quantity: u32,
}

impl ServiceLineItem {
    /// Name to show for the line item, falling back to the service reference.
    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            return &self.name;
        }
        match &self.service {
            Some(service) => service.name().unwrap_or_else(|| service.id()),
            None => "",
        }
    }
}

fn default_quantity() -> u32 {
    1
}

// ==============================================================================
// LENIENT FIELD DECODING
// ==============================================================================

// Only `_id` and `status` are relied upon. Everything else on a booking echo
// falls back to its default when the backend sends a shape we don't expect.

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value.clone()).unwrap_or_else(|e| {
        debug!("Ignoring unexpected booking field value {}: {}", value, e);
        T::default()
    }))
}

fn lenient_items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let items = match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };

    Ok(items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect())
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_of(&Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number_of(&Value::deserialize(deserializer)?)
        .filter(|n| *n >= 1.0)
        .map_or(default_quantity(), |n| n as u32))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    #[serde(alias = "street")]
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    #[serde(alias = "zip", alias = "pincode")]
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A reference to a customer or professional.
///
/// The backend sends either a bare id or a populated document depending on
/// the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum EntityRef {
    Id(String),
    Summary(EntitySummary),
}

impl EntityRef {
    pub fn id(&self) -> &str {
        match self {
            EntityRef::Id(id) => id,
            EntityRef::Summary(summary) => &summary.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            EntityRef::Id(_) => None,
            EntityRef::Summary(summary) => summary.name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntitySummary {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

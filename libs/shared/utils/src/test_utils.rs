use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::{Booking, BookingStatus};

pub struct TestConfig {
    pub booking_api_url: String,
    pub booking_api_token: Option<String>,
    pub fallback_page_size: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            booking_api_url: "http://localhost:4000".to_string(),
            booking_api_token: Some("test-admin-token".to_string()),
            fallback_page_size: 50,
        }
    }
}

impl TestConfig {
    pub fn with_backend(url: impl Into<String>) -> Self {
        Self {
            booking_api_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        let mut config = AppConfig::for_backend(self.booking_api_url.clone());
        config.booking_api_token = self.booking_api_token.clone();
        config.fallback_page_size = self.fallback_page_size;
        config.request_timeout_secs = 5;
        config
    }
}

/// Canned payloads in the shapes the booking backend actually sends.
pub struct MockBackendResponses;

impl MockBackendResponses {
    pub fn booking_document(booking_id: &str, status: BookingStatus) -> Value {
        json!({
            "_id": booking_id,
            "status": status,
            "scheduledDate": "2026-11-02T09:30:00Z",
            "scheduledTime": "09:30",
            "services": [
                { "name": "Exterior foam wash", "price": 30.0 },
                { "name": "Interior vacuum", "price": 15.0, "quantity": 1 }
            ],
            "totalAmount": 45.0,
            "paymentStatus": "pending",
            "address": { "street": "12 Harbour Rd", "city": "Pune", "pincode": "411001" },
            "user": { "_id": "cust-1", "name": "Test Customer", "phone": "+15550000" },
            "professional": null,
            "cancellationReason": null,
            "createdAt": "2026-10-30T08:00:00Z",
            "updatedAt": "2026-10-30T08:00:00Z"
        })
    }

    pub fn assigned_booking_document(
        booking_id: &str,
        status: BookingStatus,
        professional_id: &str,
    ) -> Value {
        let mut document = Self::booking_document(booking_id, status);
        document["professional"] = json!({ "_id": professional_id, "name": "Assigned Pro" });
        document
    }

    pub fn cancelled_booking_document(booking_id: &str, reason: &str) -> Value {
        let mut document = Self::booking_document(booking_id, BookingStatus::Cancelled);
        document["cancellationReason"] = json!(reason);
        document
    }

    pub fn booking(booking_id: &str, status: BookingStatus) -> Booking {
        serde_json::from_value(Self::booking_document(booking_id, status))
            .expect("fixture booking must deserialize")
    }

    pub fn assigned_booking(booking_id: &str, status: BookingStatus, professional_id: &str) -> Booking {
        serde_json::from_value(Self::assigned_booking_document(booking_id, status, professional_id))
            .expect("fixture booking must deserialize")
    }

    pub fn cancelled_booking(booking_id: &str, reason: &str) -> Booking {
        serde_json::from_value(Self::cancelled_booking_document(booking_id, reason))
            .expect("fixture booking must deserialize")
    }

    pub fn success(data: Value) -> Value {
        json!({ "success": true, "data": data })
    }

    pub fn failure(message: &str) -> Value {
        json!({ "success": false, "message": message })
    }

    pub fn booking_envelope(document: Value) -> Value {
        Self::success(json!({ "booking": document }))
    }

    pub fn professional(id: &str, name: &str) -> Value {
        json!({
            "_id": id,
            "name": name,
            "rating": 4.6,
            "specializations": ["Foam wash", "Ceramic coating"],
            "isAvailable": true
        })
    }

    /// Booking-scoped lookup as `{ data: { data: { professionals } } }`.
    pub fn available_professionals(professionals: Vec<Value>) -> Value {
        Self::success(json!({ "data": { "professionals": professionals } }))
    }

    /// Paginated listing as `{ data: { items, total, page } }`.
    pub fn professional_page(items: Vec<Value>) -> Value {
        let total = items.len();
        Self::success(json!({ "items": items, "total": total, "page": 1 }))
    }
}

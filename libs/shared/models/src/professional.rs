use serde::{Deserialize, Serialize};

/// Which lookup produced a candidate list.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Booking-scoped "available professionals" endpoint.
    Primary,
    /// General active-professionals listing.
    Fallback,
}

/// A professional as offered during one assignment interaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfessionalCandidate {
    pub id: String,
    pub name: String,
    pub rating: f64,
    pub experience: String,
    pub availability: bool,
    pub source: CandidateSource,
}

/// Query for the paginated professional listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfessionalQuery {
    pub page: u32,
    pub limit: u32,
    pub status: String,
}

impl ProfessionalQuery {
    pub fn active(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            status: "active".to_string(),
        }
    }
}

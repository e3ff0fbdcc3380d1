//! Booking request domain types
//!
//! An organizer's inquiry to a vendor, prior to pricing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking request status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingRequestStatus {
    Draft,
    #[default]
    Pending,
    Quoted,
    Accepted,
}

impl From<String> for BookingRequestStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "draft" => Self::Draft,
            "quoted" => Self::Quoted,
            "accepted" => Self::Accepted,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for BookingRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Pending => write!(f, "pending"),
            Self::Quoted => write!(f, "quoted"),
            Self::Accepted => write!(f, "accepted"),
        }
    }
}

impl BookingRequestStatus {
    /// Mutable fields may only change while the request is draft or pending
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Pending)
    }

    /// A vendor may quote against a pending request, or re-quote a quoted one
    pub fn accepts_quotes(&self) -> bool {
        matches!(self, Self::Pending | Self::Quoted)
    }
}

/// Request DTO for creating a booking request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookingRequestInput {
    pub vendor_id: Uuid,
    pub title: String,
    pub description: String,
    pub event_date: DateTime<Utc>,
    #[serde(default)]
    pub event_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub venue_address: Option<String>,
    #[serde(default)]
    pub guest_count: Option<i32>,
    #[serde(default)]
    pub service_category: Option<String>,
    #[serde(default)]
    pub special_requirements: Option<String>,
    #[serde(default)]
    pub budget_min: Option<Decimal>,
    #[serde(default)]
    pub budget_max: Option<Decimal>,
    #[serde(default)]
    pub response_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub preferred_contact_method: Option<String>,
    #[serde(default)]
    pub contact_notes: Option<String>,
}

/// Request DTO for updating a booking request (draft/pending only)
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookingRequestInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub event_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub venue_address: Option<String>,
    #[serde(default)]
    pub guest_count: Option<i32>,
    #[serde(default)]
    pub service_category: Option<String>,
    #[serde(default)]
    pub special_requirements: Option<String>,
    #[serde(default)]
    pub budget_min: Option<Decimal>,
    #[serde(default)]
    pub budget_max: Option<Decimal>,
    #[serde(default)]
    pub response_deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub preferred_contact_method: Option<String>,
    #[serde(default)]
    pub contact_notes: Option<String>,
}

/// Query params for listing a vendor's booking requests
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BookingRequestFilters {
    #[serde(default)]
    pub status: Option<BookingRequestStatus>,
    #[serde(default)]
    pub from_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub viewed_only: Option<bool>,
    #[serde(default)]
    pub unviewed_only: Option<bool>,
}

/// Response DTO for a booking request
#[derive(Debug, Clone, Serialize)]
pub struct BookingRequestResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    pub vendor_id: Uuid,
    pub organizer_id: Uuid,
    pub status: BookingRequestStatus,
    pub title: String,
    pub description: String,
    pub event_date: DateTime<Utc>,
    pub event_end_date: Option<DateTime<Utc>>,
    pub venue_name: Option<String>,
    pub venue_address: Option<String>,
    pub guest_count: Option<i32>,
    pub service_category: Option<String>,
    pub special_requirements: Option<String>,
    pub budget_min: Option<Decimal>,
    pub budget_max: Option<Decimal>,
    pub currency: String,
    pub response_deadline: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub preferred_contact_method: Option<String>,
    pub contact_notes: Option<String>,
    pub viewed_by_vendor: bool,
    pub viewed_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_draft_and_pending_are_editable() {
        assert!(BookingRequestStatus::Draft.is_editable());
        assert!(BookingRequestStatus::Pending.is_editable());
        assert!(!BookingRequestStatus::Quoted.is_editable());
        assert!(!BookingRequestStatus::Accepted.is_editable());
    }

    #[test]
    fn quoted_requests_can_be_requoted() {
        assert!(BookingRequestStatus::Pending.accepts_quotes());
        assert!(BookingRequestStatus::Quoted.accepts_quotes());
        assert!(!BookingRequestStatus::Draft.accepts_quotes());
        assert!(!BookingRequestStatus::Accepted.accepts_quotes());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            BookingRequestStatus::Draft,
            BookingRequestStatus::Pending,
            BookingRequestStatus::Quoted,
            BookingRequestStatus::Accepted,
        ] {
            assert_eq!(BookingRequestStatus::from(status.to_string()), status);
        }
    }
}

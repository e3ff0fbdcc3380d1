//! Booking domain types
//!
//! The binding commitment materialized from an accepted quote. Financial
//! fields only move through the payment ledger and the cancellation engine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Confirmed,
    Completed,
    Cancelled,
}

impl From<String> for BookingStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Confirmed,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Confirmed => write!(f, "confirmed"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl BookingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// Payment status of a booking, or of an individual payment record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    DepositPaid,
    Partial,
    Paid,
}

impl From<String> for PaymentStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "deposit_paid" => Self::DepositPaid,
            "partial" => Self::Partial,
            "paid" => Self::Paid,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::DepositPaid => write!(f, "deposit_paid"),
            Self::Partial => write!(f, "partial"),
            Self::Paid => write!(f, "paid"),
        }
    }
}

/// Derive a booking's payment status after a payment lands.
///
/// The deposit flag takes precedence over the amount comparison: a deposit
/// payment yields `DepositPaid` even when it covers the full total.
pub fn derive_payment_status(
    is_deposit: bool,
    amount_paid: Decimal,
    total_amount: Decimal,
) -> PaymentStatus {
    if is_deposit {
        PaymentStatus::DepositPaid
    } else if amount_paid >= total_amount {
        PaymentStatus::Paid
    } else {
        PaymentStatus::Partial
    }
}

/// Request DTO for updating non-financial booking metadata
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateBookingInput {
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub venue_address: Option<String>,
    #[serde(default)]
    pub guest_count: Option<i32>,
    #[serde(default)]
    pub special_requirements: Option<String>,
    #[serde(default)]
    pub service_description: Option<String>,
}

/// Request DTO for completing a booking
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CompleteBookingInput {
    #[serde(default)]
    pub completion_notes: Option<String>,
}

/// Query params for listing a vendor's bookings
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BookingFilters {
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    #[serde(default)]
    pub from_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub to_date: Option<DateTime<Utc>>,
}

/// Response DTO for a booking
#[derive(Debug, Clone, Serialize)]
pub struct BookingResponse {
    pub id: Uuid,
    pub booking_request_id: Uuid,
    pub quote_id: Uuid,
    pub event_id: Uuid,
    pub vendor_id: Uuid,
    pub organizer_id: Uuid,
    pub booking_number: String,
    pub status: BookingStatus,
    pub event_date: DateTime<Utc>,
    pub event_end_date: Option<DateTime<Utc>>,
    pub venue_name: Option<String>,
    pub venue_address: Option<String>,
    pub guest_count: Option<i32>,
    pub total_amount: Decimal,
    pub deposit_amount: Decimal,
    pub amount_paid: Decimal,
    pub amount_due: Decimal,
    pub currency: String,
    pub payment_status: PaymentStatus,
    pub commission_rate: Decimal,
    pub commission_amount: Decimal,
    pub service_description: Option<String>,
    pub special_requirements: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completion_notes: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn deposit_flag_takes_precedence_over_amount() {
        // even a deposit equal to the full total reports deposit_paid
        assert_eq!(
            derive_payment_status(true, dec("198.00"), dec("198.00")),
            PaymentStatus::DepositPaid
        );
        assert_eq!(
            derive_payment_status(true, dec("39.60"), dec("198.00")),
            PaymentStatus::DepositPaid
        );
    }

    #[test]
    fn non_deposit_payments_compare_against_total() {
        assert_eq!(
            derive_payment_status(false, dec("100.00"), dec("198.00")),
            PaymentStatus::Partial
        );
        assert_eq!(
            derive_payment_status(false, dec("198.00"), dec("198.00")),
            PaymentStatus::Paid
        );
        assert_eq!(
            derive_payment_status(false, dec("250.00"), dec("198.00")),
            PaymentStatus::Paid
        );
    }

    #[test]
    fn completed_and_cancelled_are_terminal() {
        assert!(!BookingStatus::Confirmed.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            BookingStatus::Confirmed,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::from(status.to_string()), status);
        }
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::DepositPaid,
            PaymentStatus::Partial,
            PaymentStatus::Paid,
        ] {
            assert_eq!(PaymentStatus::from(status.to_string()), status);
        }
    }
}

//! Quote domain types
//!
//! A vendor's priced, versioned offer against a booking request. The status
//! machine is the contract: draft -> sent -> viewed -> accepted/rejected,
//! and a quote may only be accepted while it is still valid.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quote status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    #[default]
    Draft,
    Sent,
    Viewed,
    Accepted,
    Rejected,
}

impl From<String> for QuoteStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "sent" => Self::Sent,
            "viewed" => Self::Viewed,
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            _ => Self::Draft,
        }
    }
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Sent => write!(f, "sent"),
            Self::Viewed => write!(f, "viewed"),
            Self::Accepted => write!(f, "accepted"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

impl QuoteStatus {
    /// Only a draft can be sent
    pub fn can_send(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Organizer resolution (accept or reject) is legal from sent or viewed
    pub fn can_resolve(&self) -> bool {
        matches!(self, Self::Sent | Self::Viewed)
    }
}

/// Whether a quote in `status` with the given validity window may be
/// accepted at `now`. Expiry is only checked once the state allows it.
pub fn acceptance_check(
    status: QuoteStatus,
    valid_until: DateTime<Utc>,
    now: DateTime<Utc>,
) -> AcceptanceCheck {
    if !status.can_resolve() {
        AcceptanceCheck::WrongState
    } else if now > valid_until {
        AcceptanceCheck::Expired
    } else {
        AcceptanceCheck::Ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptanceCheck {
    Ok,
    WrongState,
    Expired,
}

/// Line item input when creating a quote
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteItemInput {
    pub item_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub quantity: i32,
    #[serde(default)]
    pub unit: Option<String>,
    pub unit_price: Decimal,
    #[serde(default)]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default = "default_true")]
    pub is_customizable: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_deposit_percentage() -> Decimal {
    Decimal::from(30)
}

/// Request DTO for creating a quote
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuoteInput {
    pub booking_request_id: Uuid,
    pub items: Vec<QuoteItemInput>,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default)]
    pub discount_amount: Decimal,
    #[serde(default)]
    pub discount_reason: Option<String>,
    #[serde(default = "default_deposit_percentage")]
    pub deposit_percentage: Decimal,
    #[serde(default)]
    pub valid_days: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub cancellation_policy: Option<String>,
    #[serde(default)]
    pub terms_and_conditions: Option<String>,
    #[serde(default)]
    pub additional_notes: Option<String>,
}

/// Request DTO for rejecting a quote
#[derive(Debug, Clone, Deserialize)]
pub struct RejectQuoteInput {
    pub rejection_reason: String,
}

/// Response DTO for a quote line item
#[derive(Debug, Clone, Serialize)]
pub struct QuoteItemResponse {
    pub id: Uuid,
    pub item_name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub quantity: i32,
    pub unit: Option<String>,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub discount_percentage: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub is_optional: bool,
    pub is_customizable: bool,
    pub notes: Option<String>,
    pub order_index: i32,
}

/// Response DTO for a quote
#[derive(Debug, Clone, Serialize)]
pub struct QuoteResponse {
    pub id: Uuid,
    pub booking_request_id: Uuid,
    pub vendor_id: Uuid,
    pub quote_number: String,
    pub version: i32,
    pub status: QuoteStatus,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub discount_reason: Option<String>,
    pub total_amount: Decimal,
    pub currency: String,
    pub deposit_percentage: Decimal,
    pub deposit_amount: Decimal,
    pub description: Option<String>,
    pub payment_terms: Option<String>,
    pub cancellation_policy: Option<String>,
    pub terms_and_conditions: Option<String>,
    pub additional_notes: Option<String>,
    pub valid_until: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
    pub viewed_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<QuoteItemResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn only_draft_quotes_can_be_sent() {
        assert!(QuoteStatus::Draft.can_send());
        for status in [
            QuoteStatus::Sent,
            QuoteStatus::Viewed,
            QuoteStatus::Accepted,
            QuoteStatus::Rejected,
        ] {
            assert!(!status.can_send());
        }
    }

    #[test]
    fn acceptance_requires_sent_or_viewed() {
        let now = Utc::now();
        let valid = now + Duration::days(3);

        assert_eq!(
            acceptance_check(QuoteStatus::Sent, valid, now),
            AcceptanceCheck::Ok
        );
        assert_eq!(
            acceptance_check(QuoteStatus::Viewed, valid, now),
            AcceptanceCheck::Ok
        );
        for status in [
            QuoteStatus::Draft,
            QuoteStatus::Accepted,
            QuoteStatus::Rejected,
        ] {
            assert_eq!(
                acceptance_check(status, valid, now),
                AcceptanceCheck::WrongState
            );
        }
    }

    #[test]
    fn acceptance_fails_after_validity_window() {
        let now = Utc::now();
        let expired = now - Duration::seconds(1);

        assert_eq!(
            acceptance_check(QuoteStatus::Sent, expired, now),
            AcceptanceCheck::Expired
        );
        // an already-resolved quote reports the state problem, not expiry
        assert_eq!(
            acceptance_check(QuoteStatus::Accepted, expired, now),
            AcceptanceCheck::WrongState
        );
    }

    #[test]
    fn rejection_is_legal_from_sent_and_viewed_only() {
        assert!(QuoteStatus::Sent.can_resolve());
        assert!(QuoteStatus::Viewed.can_resolve());
        assert!(!QuoteStatus::Draft.can_resolve());
        assert!(!QuoteStatus::Accepted.can_resolve());
        assert!(!QuoteStatus::Rejected.can_resolve());
    }
}

//! Cancellation and refund domain types
//!
//! Refund entitlement is a step function of how many whole days remain
//! before the event when the booking is cancelled.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::round_money;

/// Who initiated the cancellation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CancellationInitiator {
    Organizer,
    Vendor,
    Admin,
}

impl From<String> for CancellationInitiator {
    fn from(s: String) -> Self {
        match s.as_str() {
            "vendor" => Self::Vendor,
            "admin" => Self::Admin,
            _ => Self::Organizer,
        }
    }
}

impl std::fmt::Display for CancellationInitiator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Organizer => write!(f, "organizer"),
            Self::Vendor => write!(f, "vendor"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Whole days between now and the event date, floored. Negative when the
/// event has already passed: 30 hours past due counts as -2 days, not -1.
pub fn days_before_event(event_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let delta = event_date - now;
    let days = delta.num_days();
    // num_days truncates toward zero; a negative partial day still floors
    if delta < chrono::Duration::days(days) {
        days - 1
    } else {
        days
    }
}

/// Refund percentage tier for a cancellation `days_before` the event
pub fn refund_percentage(days_before: i64) -> Decimal {
    if days_before >= 60 {
        Decimal::from(100)
    } else if days_before >= 30 {
        Decimal::from(75)
    } else if days_before >= 14 {
        Decimal::from(50)
    } else if days_before >= 7 {
        Decimal::from(25)
    } else {
        Decimal::ZERO
    }
}

/// Refund/penalty split for a cancellation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefundSplit {
    pub refund_percentage: Decimal,
    pub refund_amount: Decimal,
    pub penalty_amount: Decimal,
}

/// Split the amount already paid into refund and retained penalty
pub fn compute_refund(amount_paid: Decimal, days_before: i64) -> RefundSplit {
    let percentage = refund_percentage(days_before);
    let refund_amount = round_money(amount_paid * percentage / Decimal::from(100));
    let penalty_amount = amount_paid - refund_amount;

    RefundSplit {
        refund_percentage: percentage,
        refund_amount,
        penalty_amount,
    }
}

/// Request DTO for cancelling a booking
#[derive(Debug, Clone, Deserialize)]
pub struct CancelBookingInput {
    pub reason: String,
    #[serde(default)]
    pub reason_category: Option<String>,
    #[serde(default)]
    pub organizer_notes: Option<String>,
    #[serde(default)]
    pub vendor_notes: Option<String>,
}

/// Response DTO for a cancellation record
#[derive(Debug, Clone, Serialize)]
pub struct CancellationResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub cancelled_by_user_id: Uuid,
    pub initiator: CancellationInitiator,
    pub reason: String,
    pub reason_category: Option<String>,
    pub days_before_event: i64,
    pub cancellation_date: DateTime<Utc>,
    pub refund_percentage: Decimal,
    pub refund_amount: Decimal,
    pub penalty_amount: Decimal,
    pub organizer_notes: Option<String>,
    pub vendor_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn refund_tiers_match_policy() {
        assert_eq!(refund_percentage(365), dec("100"));
        assert_eq!(refund_percentage(60), dec("100"));
        assert_eq!(refund_percentage(59), dec("75"));
        assert_eq!(refund_percentage(30), dec("75"));
        assert_eq!(refund_percentage(29), dec("50"));
        assert_eq!(refund_percentage(14), dec("50"));
        assert_eq!(refund_percentage(13), dec("25"));
        assert_eq!(refund_percentage(7), dec("25"));
        assert_eq!(refund_percentage(6), dec("0"));
        assert_eq!(refund_percentage(0), dec("0"));
        assert_eq!(refund_percentage(-10), dec("0"));
    }

    #[test]
    fn refund_split_for_1000_paid() {
        let split = compute_refund(dec("1000.00"), 65);
        assert_eq!(split.refund_amount, dec("1000.00"));
        assert_eq!(split.penalty_amount, dec("0.00"));

        let split = compute_refund(dec("1000.00"), 20);
        assert_eq!(split.refund_amount, dec("500.00"));
        assert_eq!(split.penalty_amount, dec("500.00"));

        let split = compute_refund(dec("1000.00"), 3);
        assert_eq!(split.refund_amount, dec("0.00"));
        assert_eq!(split.penalty_amount, dec("1000.00"));
    }

    #[test]
    fn refund_and_penalty_always_sum_to_amount_paid() {
        for days in [-5, 0, 7, 14, 30, 60, 90] {
            let paid = dec("123.45");
            let split = compute_refund(paid, days);
            assert_eq!(split.refund_amount + split.penalty_amount, paid);
        }
    }

    #[test]
    fn days_before_event_floors_to_whole_days() {
        let now = Utc::now();
        assert_eq!(days_before_event(now + Duration::hours(47), now), 1);
        assert_eq!(days_before_event(now + Duration::hours(48), now), 2);
        assert_eq!(days_before_event(now + Duration::hours(12), now), 0);
        assert_eq!(days_before_event(now - Duration::hours(30), now), -2);
        assert_eq!(days_before_event(now - Duration::hours(24), now), -1);
    }
}

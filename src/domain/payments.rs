//! Payment domain types
//!
//! Individual payment records applied against a booking's balance.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::bookings::PaymentStatus;

/// Request DTO for recording a payment
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentInput {
    pub amount: Decimal,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub is_deposit: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request DTO for processing a pending payment through a gateway
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessPaymentInput {
    pub gateway: String,
    pub gateway_transaction_id: String,
}

/// Response DTO for a payment
#[derive(Debug, Clone, Serialize)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub payer_id: Uuid,
    pub payment_number: String,
    pub amount: Decimal,
    pub currency: String,
    pub payment_method: Option<String>,
    pub status: PaymentStatus,
    pub is_deposit: bool,
    pub payment_gateway: Option<String>,
    pub gateway_transaction_id: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

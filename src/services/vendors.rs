//! Vendor directory reads
//!
//! The vendor profile itself is owned by another subsystem; the booking
//! engine only needs ownership, bookability, and the commission rate it
//! snapshots onto new bookings.

use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

/// The slice of a vendor the booking engine cares about
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VendorSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub commission_rate: Decimal,
}

impl VendorSummary {
    /// Only active vendors accept new booking requests
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

/// Fetch a vendor's directory summary.
///
/// Accepts any executor so the commission-rate snapshot at booking creation
/// can be read on the accepting transaction.
pub async fn get_vendor<'e, E>(
    executor: E,
    vendor_id: Uuid,
) -> Result<Option<VendorSummary>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, VendorSummary>(
        "SELECT id, user_id, status, commission_rate FROM vendors WHERE id = $1",
    )
    .bind(vendor_id)
    .fetch_optional(executor)
    .await
}

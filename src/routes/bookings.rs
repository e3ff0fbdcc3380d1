//! Booking routes
//!
//! Reads and non-financial updates for confirmed bookings, completion after
//! the event date, and cancellation with the tiered refund policy.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::bookings::{
    BookingFilters, BookingResponse, BookingStatus, CompleteBookingInput, UpdateBookingInput,
};
use crate::domain::cancellations::{
    compute_refund, days_before_event, CancelBookingInput, CancellationInitiator,
    CancellationResponse,
};
use crate::error::ApiError;
use crate::services::{events, outbox, vendors};

/// Database row for a booking
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookingRow {
    pub id: Uuid,
    pub booking_request_id: Uuid,
    pub quote_id: Uuid,
    pub event_id: Uuid,
    pub vendor_id: Uuid,
    pub organizer_id: Uuid,
    pub booking_number: String,
    pub status: String,
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
    pub payment_status: String,
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

impl From<BookingRow> for BookingResponse {
    fn from(row: BookingRow) -> Self {
        Self {
            id: row.id,
            booking_request_id: row.booking_request_id,
            quote_id: row.quote_id,
            event_id: row.event_id,
            vendor_id: row.vendor_id,
            organizer_id: row.organizer_id,
            booking_number: row.booking_number,
            status: row.status.into(),
            event_date: row.event_date,
            event_end_date: row.event_end_date,
            venue_name: row.venue_name,
            venue_address: row.venue_address,
            guest_count: row.guest_count,
            total_amount: row.total_amount,
            deposit_amount: row.deposit_amount,
            amount_paid: row.amount_paid,
            amount_due: row.amount_due,
            currency: row.currency,
            payment_status: row.payment_status.into(),
            commission_rate: row.commission_rate,
            commission_amount: row.commission_amount,
            service_description: row.service_description,
            special_requirements: row.special_requirements,
            completed_at: row.completed_at,
            completion_notes: row.completion_notes,
            cancelled_at: row.cancelled_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(crate) const BOOKING_COLUMNS: &str =
    "id, booking_request_id, quote_id, event_id, vendor_id, organizer_id, booking_number, \
     status, event_date, event_end_date, venue_name, venue_address, guest_count, total_amount, \
     deposit_amount, amount_paid, amount_due, currency, payment_status, commission_rate, \
     commission_amount, service_description, special_requirements, completed_at, \
     completion_notes, cancelled_at, created_at, updated_at";

/// Database row for a cancellation record
#[derive(Debug, sqlx::FromRow)]
struct CancellationRow {
    id: Uuid,
    booking_id: Uuid,
    cancelled_by_user_id: Uuid,
    initiator: String,
    reason: String,
    reason_category: Option<String>,
    days_before_event: i64,
    cancellation_date: DateTime<Utc>,
    refund_percentage: Decimal,
    refund_amount: Decimal,
    penalty_amount: Decimal,
    organizer_notes: Option<String>,
    vendor_notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CancellationRow> for CancellationResponse {
    fn from(row: CancellationRow) -> Self {
        Self {
            id: row.id,
            booking_id: row.booking_id,
            cancelled_by_user_id: row.cancelled_by_user_id,
            initiator: row.initiator.into(),
            reason: row.reason,
            reason_category: row.reason_category,
            days_before_event: row.days_before_event,
            cancellation_date: row.cancellation_date,
            refund_percentage: row.refund_percentage,
            refund_amount: row.refund_amount,
            penalty_amount: row.penalty_amount,
            organizer_notes: row.organizer_notes,
            vendor_notes: row.vendor_notes,
            created_at: row.created_at,
        }
    }
}

const CANCELLATION_COLUMNS: &str =
    "id, booking_id, cancelled_by_user_id, initiator, reason, reason_category, \
     days_before_event, cancellation_date, refund_percentage, refund_amount, penalty_amount, \
     organizer_notes, vendor_notes, created_at";

/// Fetch a booking row
pub(crate) async fn fetch_booking(
    db: &sqlx::PgPool,
    booking_id: Uuid,
) -> Result<BookingRow, ApiError> {
    sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"
    ))
    .bind(booking_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| ApiError::not_found("Booking not found"))
}

/// Check that the caller may read this booking: the organizer, the owning
/// vendor, or an admin.
pub(crate) async fn check_booking_access(
    state: &AppState,
    row: &BookingRow,
    auth: &RequireAuth,
) -> Result<(), ApiError> {
    if row.organizer_id == auth.user_id || auth.is_admin() {
        return Ok(());
    }

    let vendor = vendors::get_vendor(&state.db, row.vendor_id).await?;
    if vendor.is_some_and(|v| v.is_owned_by(auth.user_id)) {
        return Ok(());
    }

    Err(ApiError::forbidden("No permission to access this booking"))
}

/// GET /bookings/:booking_id
pub async fn get_booking(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = fetch_booking(&state.db, booking_id).await?;
    check_booking_access(&state, &row, &auth).await?;

    let response: BookingResponse = row.into();
    Ok(Json(DataResponse::new(response)))
}

/// PATCH /bookings/:booking_id
///
/// Update non-financial booking metadata. Financial columns only change
/// through payment processing and cancellation.
pub async fn update_booking(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    Json(input): Json<UpdateBookingInput>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        booking_id = %booking_id,
        "Updating booking"
    );

    let row = fetch_booking(&state.db, booking_id).await?;
    if row.organizer_id != auth.user_id && !auth.is_admin() {
        return Err(ApiError::forbidden("Only the organizer can update the booking"));
    }

    let updated = sqlx::query_as::<_, BookingRow>(&format!(
        r#"
        UPDATE bookings SET
            venue_name = COALESCE($2, venue_name),
            venue_address = COALESCE($3, venue_address),
            guest_count = COALESCE($4, guest_count),
            special_requirements = COALESCE($5, special_requirements),
            service_description = COALESCE($6, service_description),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {BOOKING_COLUMNS}
        "#
    ))
    .bind(booking_id)
    .bind(&input.venue_name)
    .bind(&input.venue_address)
    .bind(input.guest_count)
    .bind(&input.special_requirements)
    .bind(&input.service_description)
    .fetch_one(&state.db)
    .await?;

    let response: BookingResponse = updated.into();
    Ok(Json(DataResponse::new(response)))
}

/// POST /bookings/:booking_id/complete
///
/// Mark a confirmed booking as completed once the event date has passed.
/// The vendor completion-rate recalculation happens downstream of the
/// emitted event.
pub async fn complete_booking(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    Json(input): Json<CompleteBookingInput>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        booking_id = %booking_id,
        "Completing booking"
    );

    let mut tx = state.db.begin().await?;

    let row = sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
    ))
    .bind(booking_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    let vendor = vendors::get_vendor(&mut *tx, row.vendor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Vendor not found"))?;
    if !vendor.is_owned_by(auth.user_id) && !auth.is_admin() {
        return Err(ApiError::forbidden(
            "Only the vendor or an admin can complete the booking",
        ));
    }

    let status = BookingStatus::from(row.status.clone());
    if status != BookingStatus::Confirmed {
        return Err(ApiError::invalid_state(
            "Can only complete confirmed bookings",
        ));
    }
    if row.event_date > Utc::now() {
        return Err(ApiError::invalid_state(
            "Cannot complete booking before event date",
        ));
    }

    let updated = sqlx::query_as::<_, BookingRow>(&format!(
        r#"
        UPDATE bookings SET
            status = 'completed',
            completed_at = NOW(),
            completion_notes = $2,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {BOOKING_COLUMNS}
        "#
    ))
    .bind(booking_id)
    .bind(&input.completion_notes)
    .fetch_one(&mut *tx)
    .await?;

    outbox::emit(
        &mut *tx,
        "booking.completed",
        "booking",
        booking_id,
        auth.user_id,
        serde_json::json!({
            "vendor_id": updated.vendor_id,
            "event_id": updated.event_id,
        }),
    )
    .await?;

    tx.commit().await?;

    let response: BookingResponse = updated.into();
    Ok(Json(DataResponse::new(response)))
}

/// POST /bookings/:booking_id/cancel
///
/// Cancel a booking and record the refund entitlement. The refund split is
/// a step function of whole days remaining before the event; no gateway
/// refund is executed here.
pub async fn cancel_booking(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    Json(input): Json<CancelBookingInput>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        booking_id = %booking_id,
        "Cancelling booking"
    );

    let mut tx = state.db.begin().await?;

    let row = sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
    ))
    .bind(booking_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    // Determine who is cancelling
    let initiator = if row.organizer_id == auth.user_id {
        CancellationInitiator::Organizer
    } else if auth.is_admin() {
        CancellationInitiator::Admin
    } else {
        let vendor = vendors::get_vendor(&mut *tx, row.vendor_id).await?;
        if vendor.is_some_and(|v| v.is_owned_by(auth.user_id)) {
            CancellationInitiator::Vendor
        } else {
            return Err(ApiError::forbidden("No permission to cancel this booking"));
        }
    };

    match BookingStatus::from(row.status.clone()) {
        BookingStatus::Cancelled => {
            return Err(ApiError::invalid_state("Booking is already cancelled"));
        }
        BookingStatus::Completed => {
            return Err(ApiError::invalid_state("Cannot cancel completed booking"));
        }
        BookingStatus::Confirmed => {}
    }

    let now = Utc::now();
    let days_before = days_before_event(row.event_date, now);
    let split = compute_refund(row.amount_paid, days_before);

    let cancellation = sqlx::query_as::<_, CancellationRow>(&format!(
        r#"
        INSERT INTO booking_cancellations (
            booking_id, cancelled_by_user_id, initiator, reason, reason_category,
            days_before_event, cancellation_date, refund_percentage, refund_amount,
            penalty_amount, organizer_notes, vendor_notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING {CANCELLATION_COLUMNS}
        "#
    ))
    .bind(booking_id)
    .bind(auth.user_id)
    .bind(initiator.to_string())
    .bind(&input.reason)
    .bind(&input.reason_category)
    .bind(days_before)
    .bind(now)
    .bind(split.refund_percentage)
    .bind(split.refund_amount)
    .bind(split.penalty_amount)
    .bind(&input.organizer_notes)
    .bind(&input.vendor_notes)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE bookings SET status = 'cancelled', cancelled_at = $2, updated_at = NOW() WHERE id = $1")
        .bind(booking_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    outbox::emit(
        &mut *tx,
        "booking.cancelled",
        "booking",
        booking_id,
        auth.user_id,
        serde_json::json!({
            "initiator": initiator,
            "days_before_event": days_before,
            "refund_amount": split.refund_amount,
            "penalty_amount": split.penalty_amount,
        }),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        booking_id = %booking_id,
        refund_amount = %split.refund_amount,
        penalty_amount = %split.penalty_amount,
        "Booking cancelled"
    );

    let response: CancellationResponse = cancellation.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /bookings/:booking_id/cancellation
pub async fn get_cancellation(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = fetch_booking(&state.db, booking_id).await?;
    check_booking_access(&state, &row, &auth).await?;

    let cancellation = sqlx::query_as::<_, CancellationRow>(&format!(
        "SELECT {CANCELLATION_COLUMNS} FROM booking_cancellations WHERE booking_id = $1"
    ))
    .bind(booking_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| ApiError::not_found("Booking has not been cancelled"))?;

    let response: CancellationResponse = cancellation.into();
    Ok(Json(DataResponse::new(response)))
}

/// GET /events/:event_id/bookings
pub async fn list_bookings_for_event(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if events::get_event_date(&state.db, event_id).await?.is_none() {
        return Err(ApiError::not_found("Event not found"));
    }
    if !events::user_has_permission(&state.db, event_id, auth.user_id, "view").await? {
        return Err(ApiError::forbidden("No permission to access this event"));
    }

    let rows = sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE event_id = $1 ORDER BY created_at DESC"
    ))
    .bind(event_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<BookingResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// GET /vendors/:vendor_id/bookings
pub async fn list_bookings_for_vendor(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<BookingFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let vendor = vendors::get_vendor(&state.db, vendor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Vendor not found"))?;
    if !vendor.is_owned_by(auth.user_id) && !auth.is_admin() {
        return Err(ApiError::forbidden("No permission to access this vendor"));
    }

    let status = filters.status.map(|s| s.to_string());
    let payment_status = filters.payment_status.map(|s| s.to_string());

    let where_clause = "vendor_id = $1 \
         AND ($2::text IS NULL OR status = $2) \
         AND ($3::text IS NULL OR payment_status = $3) \
         AND ($4::timestamptz IS NULL OR event_date >= $4) \
         AND ($5::timestamptz IS NULL OR event_date <= $5)";

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM bookings WHERE {where_clause}"
    ))
    .bind(vendor_id)
    .bind(&status)
    .bind(&payment_status)
    .bind(filters.from_date)
    .bind(filters.to_date)
    .fetch_one(&state.db)
    .await?;

    let rows = sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE {where_clause} \
         ORDER BY event_date ASC LIMIT $6 OFFSET $7"
    ))
    .bind(vendor_id)
    .bind(&status)
    .bind(&payment_status)
    .bind(filters.from_date)
    .bind(filters.to_date)
    .bind(pagination.limit() as i64)
    .bind(pagination.offset() as i64)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<BookingResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(Paginated::new(data, &pagination, total as u64)))
}

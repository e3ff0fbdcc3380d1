//! Booking request routes
//!
//! Organizer inquiries to vendors: creation, updates while still open,
//! vendor inbox listing, and view tracking.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::pagination::{Paginated, PaginationParams};
use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::requests::{
    BookingRequestFilters, BookingRequestResponse, BookingRequestStatus,
    CreateBookingRequestInput, UpdateBookingRequestInput,
};
use crate::error::ApiError;
use crate::services::{events, outbox, vendors};

/// Database row for a booking request
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct BookingRequestRow {
    pub id: Uuid,
    pub event_id: Uuid,
    pub vendor_id: Uuid,
    pub organizer_id: Uuid,
    pub status: String,
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

impl From<BookingRequestRow> for BookingRequestResponse {
    fn from(row: BookingRequestRow) -> Self {
        Self {
            id: row.id,
            event_id: row.event_id,
            vendor_id: row.vendor_id,
            organizer_id: row.organizer_id,
            status: BookingRequestStatus::from(row.status),
            title: row.title,
            description: row.description,
            event_date: row.event_date,
            event_end_date: row.event_end_date,
            venue_name: row.venue_name,
            venue_address: row.venue_address,
            guest_count: row.guest_count,
            service_category: row.service_category,
            special_requirements: row.special_requirements,
            budget_min: row.budget_min,
            budget_max: row.budget_max,
            currency: row.currency,
            response_deadline: row.response_deadline,
            expires_at: row.expires_at,
            preferred_contact_method: row.preferred_contact_method,
            contact_notes: row.contact_notes,
            viewed_by_vendor: row.viewed_by_vendor,
            viewed_at: row.viewed_at,
            responded_at: row.responded_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(crate) const REQUEST_COLUMNS: &str = "id, event_id, vendor_id, organizer_id, status, title, description, \
     event_date, event_end_date, venue_name, venue_address, guest_count, service_category, \
     special_requirements, budget_min, budget_max, currency, response_deadline, expires_at, \
     preferred_contact_method, contact_notes, viewed_by_vendor, viewed_at, responded_at, \
     created_at, updated_at";

/// Fetch a live (non-deleted) booking request row
pub(crate) async fn fetch_request(
    db: &sqlx::PgPool,
    request_id: Uuid,
) -> Result<BookingRequestRow, ApiError> {
    sqlx::query_as::<_, BookingRequestRow>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM booking_requests WHERE id = $1 AND deleted_at IS NULL"
    ))
    .bind(request_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| ApiError::not_found("Booking request not found"))
}

/// Check that the caller may read this request: the organizer, the owning
/// vendor, or an admin.
pub(crate) async fn check_request_access(
    state: &AppState,
    row: &BookingRequestRow,
    auth: &RequireAuth,
) -> Result<(), ApiError> {
    if row.organizer_id == auth.user_id || auth.is_admin() {
        return Ok(());
    }

    let vendor = vendors::get_vendor(&state.db, row.vendor_id).await?;
    if vendor.is_some_and(|v| v.is_owned_by(auth.user_id)) {
        return Ok(());
    }

    Err(ApiError::forbidden(
        "No permission to access this booking request",
    ))
}

/// POST /events/:event_id/booking-requests
///
/// Create a booking request from an organizer to a vendor.
pub async fn create_booking_request(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
    Json(input): Json<CreateBookingRequestInput>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        event_id = %event_id,
        vendor_id = %input.vendor_id,
        "Creating booking request"
    );

    // Verify event exists and the caller can act on it
    if events::get_event_date(&state.db, event_id).await?.is_none() {
        return Err(ApiError::not_found("Event not found"));
    }
    if !events::user_has_permission(&state.db, event_id, auth.user_id, "view").await? {
        return Err(ApiError::forbidden("No permission to access this event"));
    }

    // Verify vendor exists and is accepting bookings
    let vendor = vendors::get_vendor(&state.db, input.vendor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Vendor not found"))?;
    if !vendor.is_active() {
        return Err(ApiError::validation(
            "Vendor is not currently accepting bookings",
        ));
    }

    let expires_at = Utc::now() + Duration::days(state.settings.booking_request_expiry_days);

    let mut tx = state.db.begin().await?;

    let row = sqlx::query_as::<_, BookingRequestRow>(&format!(
        r#"
        INSERT INTO booking_requests (
            event_id, vendor_id, organizer_id, status, title, description,
            event_date, event_end_date, venue_name, venue_address, guest_count,
            service_category, special_requirements, budget_min, budget_max,
            response_deadline, expires_at, preferred_contact_method, contact_notes
        )
        VALUES ($1, $2, $3, 'pending', $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(event_id)
    .bind(input.vendor_id)
    .bind(auth.user_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.event_date)
    .bind(input.event_end_date)
    .bind(&input.venue_name)
    .bind(&input.venue_address)
    .bind(input.guest_count)
    .bind(&input.service_category)
    .bind(&input.special_requirements)
    .bind(input.budget_min)
    .bind(input.budget_max)
    .bind(input.response_deadline)
    .bind(expires_at)
    .bind(&input.preferred_contact_method)
    .bind(&input.contact_notes)
    .fetch_one(&mut *tx)
    .await?;

    outbox::emit(
        &mut *tx,
        "booking_request.created",
        "booking_request",
        row.id,
        auth.user_id,
        serde_json::json!({
            "event_id": event_id,
            "vendor_id": input.vendor_id,
        }),
    )
    .await?;

    tx.commit().await?;

    let response: BookingRequestResponse = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /booking-requests/:request_id
pub async fn get_booking_request(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = fetch_request(&state.db, request_id).await?;
    check_request_access(&state, &row, &auth).await?;

    let response: BookingRequestResponse = row.into();
    Ok(Json(DataResponse::new(response)))
}

/// PATCH /booking-requests/:request_id
///
/// Update a booking request. Only the organizer may update, and only while
/// the request is still draft or pending.
pub async fn update_booking_request(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    Json(input): Json<UpdateBookingRequestInput>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        request_id = %request_id,
        "Updating booking request"
    );

    let row = fetch_request(&state.db, request_id).await?;

    if row.organizer_id != auth.user_id {
        return Err(ApiError::forbidden(
            "Only the organizer can update the booking request",
        ));
    }

    let status = BookingRequestStatus::from(row.status);
    if !status.is_editable() {
        return Err(ApiError::invalid_state(
            "Cannot update booking request in current status",
        ));
    }

    let updated = sqlx::query_as::<_, BookingRequestRow>(&format!(
        r#"
        UPDATE booking_requests SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            event_date = COALESCE($4, event_date),
            event_end_date = COALESCE($5, event_end_date),
            venue_name = COALESCE($6, venue_name),
            venue_address = COALESCE($7, venue_address),
            guest_count = COALESCE($8, guest_count),
            service_category = COALESCE($9, service_category),
            special_requirements = COALESCE($10, special_requirements),
            budget_min = COALESCE($11, budget_min),
            budget_max = COALESCE($12, budget_max),
            response_deadline = COALESCE($13, response_deadline),
            preferred_contact_method = COALESCE($14, preferred_contact_method),
            contact_notes = COALESCE($15, contact_notes),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(request_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.event_date)
    .bind(input.event_end_date)
    .bind(&input.venue_name)
    .bind(&input.venue_address)
    .bind(input.guest_count)
    .bind(&input.service_category)
    .bind(&input.special_requirements)
    .bind(input.budget_min)
    .bind(input.budget_max)
    .bind(input.response_deadline)
    .bind(&input.preferred_contact_method)
    .bind(&input.contact_notes)
    .fetch_one(&state.db)
    .await?;

    let response: BookingRequestResponse = updated.into();
    Ok(Json(DataResponse::new(response)))
}

/// GET /events/:event_id/booking-requests
pub async fn list_booking_requests_for_event(
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

    let rows = sqlx::query_as::<_, BookingRequestRow>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM booking_requests \
         WHERE event_id = $1 AND deleted_at IS NULL ORDER BY created_at DESC"
    ))
    .bind(event_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<BookingRequestResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// GET /vendors/:vendor_id/booking-requests
///
/// Vendor inbox: booking requests addressed to the vendor, filterable by
/// status, event date window, and viewed state.
pub async fn list_booking_requests_for_vendor(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(vendor_id): Path<Uuid>,
    Query(pagination): Query<PaginationParams>,
    Query(filters): Query<BookingRequestFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let vendor = vendors::get_vendor(&state.db, vendor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Vendor not found"))?;
    if !vendor.is_owned_by(auth.user_id) && !auth.is_admin() {
        return Err(ApiError::forbidden("No permission to access this vendor"));
    }

    let status = filters.status.map(|s| s.to_string());
    let viewed = match (filters.viewed_only, filters.unviewed_only) {
        (Some(true), _) => Some(true),
        (_, Some(true)) => Some(false),
        _ => None,
    };

    let where_clause = "vendor_id = $1 AND deleted_at IS NULL \
         AND ($2::text IS NULL OR status = $2) \
         AND ($3::timestamptz IS NULL OR event_date >= $3) \
         AND ($4::timestamptz IS NULL OR event_date <= $4) \
         AND ($5::boolean IS NULL OR viewed_by_vendor = $5)";

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM booking_requests WHERE {where_clause}"
    ))
    .bind(vendor_id)
    .bind(&status)
    .bind(filters.from_date)
    .bind(filters.to_date)
    .bind(viewed)
    .fetch_one(&state.db)
    .await?;

    let rows = sqlx::query_as::<_, BookingRequestRow>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM booking_requests WHERE {where_clause} \
         ORDER BY created_at DESC LIMIT $6 OFFSET $7"
    ))
    .bind(vendor_id)
    .bind(&status)
    .bind(filters.from_date)
    .bind(filters.to_date)
    .bind(viewed)
    .bind(pagination.limit() as i64)
    .bind(pagination.offset() as i64)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<BookingRequestResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(Paginated::new(data, &pagination, total as u64)))
}

/// POST /booking-requests/:request_id/view
///
/// Mark a request as viewed by the vendor. Idempotent: the flag and the
/// timestamp are set on the first call only.
pub async fn mark_request_viewed(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = fetch_request(&state.db, request_id).await?;

    let vendor = vendors::get_vendor(&state.db, row.vendor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Vendor not found"))?;
    if !vendor.is_owned_by(auth.user_id) && !auth.is_admin() {
        return Err(ApiError::forbidden("No permission to access this vendor"));
    }

    let updated = sqlx::query_as::<_, BookingRequestRow>(&format!(
        r#"
        UPDATE booking_requests SET
            viewed_by_vendor = TRUE,
            viewed_at = COALESCE(viewed_at, NOW()),
            updated_at = NOW()
        WHERE id = $1 AND deleted_at IS NULL
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(request_id)
    .fetch_one(&state.db)
    .await?;

    let response: BookingRequestResponse = updated.into();
    Ok(Json(DataResponse::new(response)))
}

//! Quote routes
//!
//! Vendor quotes against booking requests: creation with computed pricing,
//! the send/view/accept/reject state machine, and the atomic materialization
//! of a booking when a quote is accepted.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::bookings::BookingResponse;
use crate::domain::money::{self, LineItemPricing, QuotePricing};
use crate::domain::quotes::{
    acceptance_check, AcceptanceCheck, CreateQuoteInput, QuoteItemResponse, QuoteResponse,
    QuoteStatus, RejectQuoteInput,
};
use crate::error::ApiError;
use crate::routes::bookings::{BookingRow, BOOKING_COLUMNS};
use crate::routes::requests::{check_request_access, fetch_request, REQUEST_COLUMNS};
use crate::services::numbering::{self, SequenceKind};
use crate::services::{outbox, vendors};

/// Database row for a quote
#[derive(Debug, sqlx::FromRow)]
struct QuoteRow {
    id: Uuid,
    booking_request_id: Uuid,
    vendor_id: Uuid,
    quote_number: String,
    version: i32,
    status: String,
    subtotal: Decimal,
    tax_rate: Decimal,
    tax_amount: Decimal,
    discount_amount: Decimal,
    discount_reason: Option<String>,
    total_amount: Decimal,
    currency: String,
    deposit_percentage: Decimal,
    deposit_amount: Decimal,
    description: Option<String>,
    payment_terms: Option<String>,
    cancellation_policy: Option<String>,
    terms_and_conditions: Option<String>,
    additional_notes: Option<String>,
    valid_until: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
    viewed_at: Option<DateTime<Utc>>,
    accepted_at: Option<DateTime<Utc>>,
    rejected_at: Option<DateTime<Utc>>,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl QuoteRow {
    fn into_response(self, items: Vec<QuoteItemResponse>) -> QuoteResponse {
        QuoteResponse {
            id: self.id,
            booking_request_id: self.booking_request_id,
            vendor_id: self.vendor_id,
            quote_number: self.quote_number,
            version: self.version,
            status: QuoteStatus::from(self.status),
            subtotal: self.subtotal,
            tax_rate: self.tax_rate,
            tax_amount: self.tax_amount,
            discount_amount: self.discount_amount,
            discount_reason: self.discount_reason,
            total_amount: self.total_amount,
            currency: self.currency,
            deposit_percentage: self.deposit_percentage,
            deposit_amount: self.deposit_amount,
            description: self.description,
            payment_terms: self.payment_terms,
            cancellation_policy: self.cancellation_policy,
            terms_and_conditions: self.terms_and_conditions,
            additional_notes: self.additional_notes,
            valid_until: self.valid_until,
            sent_at: self.sent_at,
            viewed_at: self.viewed_at,
            accepted_at: self.accepted_at,
            rejected_at: self.rejected_at,
            rejection_reason: self.rejection_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        }
    }
}

/// Database row for a quote line item
#[derive(Debug, sqlx::FromRow)]
struct QuoteItemRow {
    id: Uuid,
    item_name: String,
    description: Option<String>,
    category: Option<String>,
    quantity: i32,
    unit: Option<String>,
    unit_price: Decimal,
    subtotal: Decimal,
    discount_percentage: Decimal,
    discount_amount: Decimal,
    total: Decimal,
    is_optional: bool,
    is_customizable: bool,
    notes: Option<String>,
    order_index: i32,
}

impl From<QuoteItemRow> for QuoteItemResponse {
    fn from(row: QuoteItemRow) -> Self {
        Self {
            id: row.id,
            item_name: row.item_name,
            description: row.description,
            category: row.category,
            quantity: row.quantity,
            unit: row.unit,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
            discount_percentage: row.discount_percentage,
            discount_amount: row.discount_amount,
            total: row.total,
            is_optional: row.is_optional,
            is_customizable: row.is_customizable,
            notes: row.notes,
            order_index: row.order_index,
        }
    }
}

const QUOTE_COLUMNS: &str =
    "id, booking_request_id, vendor_id, quote_number, version, status, subtotal, tax_rate, \
     tax_amount, discount_amount, discount_reason, total_amount, currency, deposit_percentage, \
     deposit_amount, description, payment_terms, cancellation_policy, terms_and_conditions, \
     additional_notes, valid_until, sent_at, viewed_at, accepted_at, rejected_at, \
     rejection_reason, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, item_name, description, category, quantity, unit, unit_price, subtotal, \
     discount_percentage, discount_amount, total, is_optional, is_customizable, notes, order_index";

async fn fetch_quote(db: &sqlx::PgPool, quote_id: Uuid) -> Result<QuoteRow, ApiError> {
    sqlx::query_as::<_, QuoteRow>(&format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = $1"))
        .bind(quote_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Quote not found"))
}

async fn fetch_items(db: &sqlx::PgPool, quote_id: Uuid) -> Result<Vec<QuoteItemResponse>, ApiError> {
    let rows = sqlx::query_as::<_, QuoteItemRow>(&format!(
        "SELECT {ITEM_COLUMNS} FROM quote_items WHERE quote_id = $1 ORDER BY order_index ASC"
    ))
    .bind(quote_id)
    .fetch_all(db)
    .await?;

    Ok(rows.into_iter().map(Into::into).collect())
}

/// POST /quotes
///
/// Create a draft quote against a booking request. Pricing is computed
/// server-side from the submitted line items; persisted item amounts always
/// reconcile against the quote totals.
pub async fn create_quote(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(input): Json<CreateQuoteInput>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        booking_request_id = %input.booking_request_id,
        item_count = input.items.len(),
        "Creating quote"
    );

    let request = fetch_request(&state.db, input.booking_request_id).await?;

    // Must own the vendor the request is addressed to
    let vendor = vendors::get_vendor(&state.db, request.vendor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Vendor not found"))?;
    if !vendor.is_owned_by(auth.user_id) && !auth.is_admin() {
        return Err(ApiError::forbidden("Only the vendor can create a quote"));
    }

    let request_status = crate::domain::requests::BookingRequestStatus::from(request.status.clone());
    if !request_status.accepts_quotes() {
        return Err(ApiError::invalid_state(
            "Cannot create quote for this booking request",
        ));
    }

    if input.items.is_empty() {
        return Err(ApiError::validation("Quote must contain at least one item"));
    }

    let valid_days = input
        .valid_days
        .unwrap_or(state.settings.quote_valid_days_default);
    if valid_days <= 0 || valid_days > state.settings.quote_valid_days_max {
        return Err(ApiError::validation(format!(
            "valid_days must be between 1 and {}",
            state.settings.quote_valid_days_max
        )));
    }

    // Run the calculator before touching the database
    let line_pricing: Vec<LineItemPricing> = input
        .items
        .iter()
        .map(|item| LineItemPricing {
            quantity: item.quantity,
            unit_price: item.unit_price,
            discount_percentage: item.discount_percentage,
        })
        .collect();
    let pricing = QuotePricing {
        tax_rate: input.tax_rate,
        discount_amount: input.discount_amount,
        deposit_percentage: input.deposit_percentage,
    };
    let totals = money::price_quote(&line_pricing, &pricing)
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let valid_until = Utc::now() + Duration::days(valid_days);

    let mut tx = state.db.begin().await?;

    // Lock the parent request so concurrent quote creation serializes on
    // version assignment
    sqlx::query("SELECT id FROM booking_requests WHERE id = $1 FOR UPDATE")
        .bind(request.id)
        .execute(&mut *tx)
        .await?;

    let version: i32 = sqlx::query_scalar(
        "SELECT COALESCE(MAX(version), 0) + 1 FROM quotes WHERE booking_request_id = $1",
    )
    .bind(request.id)
    .fetch_one(&mut *tx)
    .await?;

    let quote_number = numbering::next_number(&mut *tx, SequenceKind::Quote).await?;

    let quote = sqlx::query_as::<_, QuoteRow>(&format!(
        r#"
        INSERT INTO quotes (
            booking_request_id, vendor_id, quote_number, version, status, subtotal,
            tax_rate, tax_amount, discount_amount, discount_reason, total_amount,
            deposit_percentage, deposit_amount, description, payment_terms,
            cancellation_policy, terms_and_conditions, additional_notes, valid_until
        )
        VALUES ($1, $2, $3, $4, 'draft', $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        RETURNING {QUOTE_COLUMNS}
        "#
    ))
    .bind(request.id)
    .bind(vendor.id)
    .bind(&quote_number)
    .bind(version)
    .bind(totals.subtotal)
    .bind(input.tax_rate)
    .bind(totals.tax_amount)
    .bind(totals.discount_amount)
    .bind(&input.discount_reason)
    .bind(totals.total_amount)
    .bind(input.deposit_percentage)
    .bind(totals.deposit_amount)
    .bind(&input.description)
    .bind(&input.payment_terms)
    .bind(&input.cancellation_policy)
    .bind(&input.terms_and_conditions)
    .bind(&input.additional_notes)
    .bind(valid_until)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(input.items.len());
    for (idx, item) in input.items.iter().enumerate() {
        let line = money::price_line(&LineItemPricing {
            quantity: item.quantity,
            unit_price: item.unit_price,
            discount_percentage: item.discount_percentage,
        })
        .map_err(|e| ApiError::validation(e.to_string()))?;

        let row = sqlx::query_as::<_, QuoteItemRow>(&format!(
            r#"
            INSERT INTO quote_items (
                quote_id, item_name, description, category, quantity, unit, unit_price,
                subtotal, discount_percentage, discount_amount, total, is_optional,
                is_customizable, notes, order_index
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(quote.id)
        .bind(&item.item_name)
        .bind(&item.description)
        .bind(&item.category)
        .bind(item.quantity)
        .bind(&item.unit)
        .bind(item.unit_price)
        .bind(line.subtotal)
        .bind(item.discount_percentage)
        .bind(line.discount_amount)
        .bind(line.total)
        .bind(item.is_optional)
        .bind(item.is_customizable)
        .bind(&item.notes)
        .bind(idx as i32)
        .fetch_one(&mut *tx)
        .await?;

        items.push(QuoteItemResponse::from(row));
    }

    tx.commit().await?;

    tracing::info!(
        quote_id = %quote.id,
        quote_number = %quote.quote_number,
        total_amount = %quote.total_amount,
        "Quote created"
    );

    let response = quote.into_response(items);
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /quotes/:quote_id
pub async fn get_quote(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = fetch_quote(&state.db, quote_id).await?;

    let request = fetch_request(&state.db, quote.booking_request_id).await?;
    check_request_access(&state, &request, &auth).await?;

    let items = fetch_items(&state.db, quote_id).await?;
    Ok(Json(DataResponse::new(quote.into_response(items))))
}

/// GET /booking-requests/:request_id/quotes
pub async fn list_quotes_for_request(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let request = fetch_request(&state.db, request_id).await?;
    check_request_access(&state, &request, &auth).await?;

    let rows = sqlx::query_as::<_, QuoteRow>(&format!(
        "SELECT {QUOTE_COLUMNS} FROM quotes WHERE booking_request_id = $1 \
         ORDER BY version DESC, created_at DESC"
    ))
    .bind(request_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<QuoteResponse> = rows
        .into_iter()
        .map(|row| row.into_response(Vec::new()))
        .collect();
    Ok(Json(DataResponse::new(data)))
}

/// POST /quotes/:quote_id/send
///
/// Send a draft quote to the organizer. Marks the parent request as quoted.
pub async fn send_quote(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(user_id = %auth.user_id, quote_id = %quote_id, "Sending quote");

    let mut tx = state.db.begin().await?;

    let quote = sqlx::query_as::<_, QuoteRow>(&format!(
        "SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = $1 FOR UPDATE"
    ))
    .bind(quote_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Quote not found"))?;

    let vendor = vendors::get_vendor(&mut *tx, quote.vendor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Vendor not found"))?;
    if !vendor.is_owned_by(auth.user_id) && !auth.is_admin() {
        return Err(ApiError::forbidden("Only the vendor can send the quote"));
    }

    if !QuoteStatus::from(quote.status.clone()).can_send() {
        return Err(ApiError::invalid_state("Quote has already been sent"));
    }

    let updated = sqlx::query_as::<_, QuoteRow>(&format!(
        "UPDATE quotes SET status = 'sent', sent_at = NOW(), updated_at = NOW() \
         WHERE id = $1 RETURNING {QUOTE_COLUMNS}"
    ))
    .bind(quote_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE booking_requests SET status = 'quoted', responded_at = NOW(), updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(quote.booking_request_id)
    .execute(&mut *tx)
    .await?;

    outbox::emit(
        &mut *tx,
        "quote.sent",
        "quote",
        quote_id,
        auth.user_id,
        serde_json::json!({
            "booking_request_id": quote.booking_request_id,
            "quote_number": updated.quote_number,
            "total_amount": updated.total_amount,
        }),
    )
    .await?;

    tx.commit().await?;

    Ok(Json(DataResponse::new(updated.into_response(Vec::new()))))
}

/// POST /quotes/:quote_id/view
///
/// Record that the organizer viewed the quote. Idempotent: the first call
/// moves sent -> viewed and stamps viewed_at; later calls change nothing.
pub async fn view_quote(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let quote = fetch_quote(&state.db, quote_id).await?;

    let request = fetch_request(&state.db, quote.booking_request_id).await?;
    if request.organizer_id != auth.user_id && !auth.is_admin() {
        return Err(ApiError::forbidden("Only the organizer can view the quote"));
    }

    let updated = sqlx::query_as::<_, QuoteRow>(&format!(
        r#"
        UPDATE quotes SET
            status = CASE WHEN status = 'sent' THEN 'viewed' ELSE status END,
            viewed_at = COALESCE(viewed_at, NOW()),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {QUOTE_COLUMNS}
        "#
    ))
    .bind(quote_id)
    .fetch_one(&state.db)
    .await?;

    Ok(Json(DataResponse::new(updated.into_response(Vec::new()))))
}

/// POST /quotes/:quote_id/accept
///
/// Accept a quote and materialize the binding booking. The quote update,
/// request update, commission snapshot, and booking insert commit as one
/// transaction; if any step fails the quote stays unaccepted.
pub async fn accept_quote(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(quote_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(user_id = %auth.user_id, quote_id = %quote_id, "Accepting quote");

    let mut tx = state.db.begin().await?;

    // Lock the quote first; the status re-check below runs under the lock so
    // two concurrent accepts cannot both pass
    let quote = sqlx::query_as::<_, QuoteRow>(&format!(
        "SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = $1 FOR UPDATE"
    ))
    .bind(quote_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Quote not found"))?;

    let request = sqlx::query_as::<_, crate::routes::requests::BookingRequestRow>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM booking_requests \
         WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
    ))
    .bind(quote.booking_request_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Booking request not found"))?;

    if request.organizer_id != auth.user_id && !auth.is_admin() {
        return Err(ApiError::forbidden("Only the organizer can accept the quote"));
    }

    let now = Utc::now();
    match acceptance_check(QuoteStatus::from(quote.status.clone()), quote.valid_until, now) {
        AcceptanceCheck::WrongState => {
            return Err(ApiError::invalid_state(
                "Quote is not available for acceptance",
            ));
        }
        AcceptanceCheck::Expired => {
            return Err(ApiError::expired("Quote has expired"));
        }
        AcceptanceCheck::Ok => {}
    }

    sqlx::query("UPDATE quotes SET status = 'accepted', accepted_at = $2, updated_at = NOW() WHERE id = $1")
        .bind(quote_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE booking_requests SET status = 'accepted', updated_at = NOW() WHERE id = $1")
        .bind(request.id)
        .execute(&mut *tx)
        .await?;

    // Snapshot the vendor's commission rate as of acceptance time
    let vendor = vendors::get_vendor(&mut *tx, quote.vendor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Vendor not found"))?;
    let commission_amount = money::round_money(quote.total_amount * vendor.commission_rate);

    let booking_number = numbering::next_number(&mut *tx, SequenceKind::Booking).await?;

    let booking = sqlx::query_as::<_, BookingRow>(&format!(
        r#"
        INSERT INTO bookings (
            booking_request_id, quote_id, event_id, vendor_id, organizer_id,
            booking_number, status, event_date, event_end_date, venue_name,
            venue_address, guest_count, total_amount, deposit_amount, amount_paid,
            amount_due, payment_status, commission_rate, commission_amount,
            service_description, special_requirements
        )
        VALUES ($1, $2, $3, $4, $5, $6, 'confirmed', $7, $8, $9, $10, $11, $12, $13, 0,
                $12, 'pending', $14, $15, $16, $17)
        RETURNING {BOOKING_COLUMNS}
        "#
    ))
    .bind(request.id)
    .bind(quote_id)
    .bind(request.event_id)
    .bind(request.vendor_id)
    .bind(request.organizer_id)
    .bind(&booking_number)
    .bind(request.event_date)
    .bind(request.event_end_date)
    .bind(&request.venue_name)
    .bind(&request.venue_address)
    .bind(request.guest_count)
    .bind(quote.total_amount)
    .bind(quote.deposit_amount)
    .bind(vendor.commission_rate)
    .bind(commission_amount)
    .bind(&quote.description)
    .bind(&request.special_requirements)
    .fetch_one(&mut *tx)
    .await?;

    outbox::emit(
        &mut *tx,
        "quote.accepted",
        "quote",
        quote_id,
        auth.user_id,
        serde_json::json!({
            "booking_request_id": request.id,
            "booking_id": booking.id,
        }),
    )
    .await?;

    outbox::emit(
        &mut *tx,
        "booking.created",
        "booking",
        booking.id,
        auth.user_id,
        serde_json::json!({
            "booking_number": booking_number,
            "vendor_id": request.vendor_id,
            "total_amount": booking.total_amount,
        }),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        quote_id = %quote_id,
        booking_id = %booking.id,
        booking_number = %booking.booking_number,
        "Quote accepted, booking created"
    );

    let response: BookingResponse = booking.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// POST /quotes/:quote_id/reject
///
/// Reject a sent or viewed quote. The request can still receive further
/// quotes from the vendor.
pub async fn reject_quote(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(quote_id): Path<Uuid>,
    Json(input): Json<RejectQuoteInput>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(user_id = %auth.user_id, quote_id = %quote_id, "Rejecting quote");

    let mut tx = state.db.begin().await?;

    let quote = sqlx::query_as::<_, QuoteRow>(&format!(
        "SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = $1 FOR UPDATE"
    ))
    .bind(quote_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Quote not found"))?;

    let request = fetch_request(&state.db, quote.booking_request_id).await?;
    if request.organizer_id != auth.user_id && !auth.is_admin() {
        return Err(ApiError::forbidden("Only the organizer can reject the quote"));
    }

    if !QuoteStatus::from(quote.status.clone()).can_resolve() {
        return Err(ApiError::invalid_state(
            "Quote is not available for rejection",
        ));
    }

    let updated = sqlx::query_as::<_, QuoteRow>(&format!(
        "UPDATE quotes SET status = 'rejected', rejected_at = NOW(), rejection_reason = $2, \
         updated_at = NOW() WHERE id = $1 RETURNING {QUOTE_COLUMNS}"
    ))
    .bind(quote_id)
    .bind(&input.rejection_reason)
    .fetch_one(&mut *tx)
    .await?;

    outbox::emit(
        &mut *tx,
        "quote.rejected",
        "quote",
        quote_id,
        auth.user_id,
        serde_json::json!({
            "booking_request_id": quote.booking_request_id,
            "rejection_reason": input.rejection_reason,
        }),
    )
    .await?;

    tx.commit().await?;

    Ok(Json(DataResponse::new(updated.into_response(Vec::new()))))
}

//! Payment routes
//!
//! The payment ledger: recording pending payments against a booking's
//! balance and processing them exactly once, with the booking row locked so
//! concurrent payments never lose an increment.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::response::DataResponse;
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::bookings::{derive_payment_status, BookingStatus, PaymentStatus};
use crate::domain::payments::{CreatePaymentInput, PaymentResponse, ProcessPaymentInput};
use crate::error::ApiError;
use crate::routes::bookings::{check_booking_access, fetch_booking, BookingRow, BOOKING_COLUMNS};
use crate::services::numbering::{self, SequenceKind};
use crate::services::outbox;

/// Database row for a payment
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    payer_id: Uuid,
    payment_number: String,
    amount: Decimal,
    currency: String,
    payment_method: Option<String>,
    status: String,
    is_deposit: bool,
    payment_gateway: Option<String>,
    gateway_transaction_id: Option<String>,
    payment_date: Option<DateTime<Utc>>,
    processed_at: Option<DateTime<Utc>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PaymentRow> for PaymentResponse {
    fn from(row: PaymentRow) -> Self {
        Self {
            id: row.id,
            booking_id: row.booking_id,
            payer_id: row.payer_id,
            payment_number: row.payment_number,
            amount: row.amount,
            currency: row.currency,
            payment_method: row.payment_method,
            status: row.status.into(),
            is_deposit: row.is_deposit,
            payment_gateway: row.payment_gateway,
            gateway_transaction_id: row.gateway_transaction_id,
            payment_date: row.payment_date,
            processed_at: row.processed_at,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const PAYMENT_COLUMNS: &str =
    "id, booking_id, payer_id, payment_number, amount, currency, payment_method, status, \
     is_deposit, payment_gateway, gateway_transaction_id, payment_date, processed_at, notes, \
     created_at, updated_at";

/// POST /bookings/:booking_id/payments
///
/// Record a pending payment. Overpayment is rejected up front: the amount
/// must not exceed what is still due on the booking.
pub async fn create_payment(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
    Json(input): Json<CreatePaymentInput>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        booking_id = %booking_id,
        amount = %input.amount,
        is_deposit = input.is_deposit,
        "Recording payment"
    );

    let booking = fetch_booking(&state.db, booking_id).await?;

    if booking.organizer_id != auth.user_id && !auth.is_admin() {
        return Err(ApiError::forbidden("Only the organizer can make payments"));
    }

    if BookingStatus::from(booking.status.clone()) == BookingStatus::Cancelled {
        return Err(ApiError::invalid_state(
            "Cannot make payment for cancelled booking",
        ));
    }

    if input.amount <= Decimal::ZERO {
        return Err(ApiError::validation("Payment amount must be positive"));
    }
    if input.amount > booking.amount_due {
        return Err(ApiError::validation("Payment amount exceeds amount due"));
    }

    let mut tx = state.db.begin().await?;

    let payment_number = numbering::next_number(&mut *tx, SequenceKind::Payment).await?;

    let row = sqlx::query_as::<_, PaymentRow>(&format!(
        r#"
        INSERT INTO booking_payments (
            booking_id, payer_id, payment_number, amount, payment_method, status,
            is_deposit, notes
        )
        VALUES ($1, $2, $3, $4, $5, 'pending', $6, $7)
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(booking_id)
    .bind(auth.user_id)
    .bind(&payment_number)
    .bind(input.amount)
    .bind(&input.payment_method)
    .bind(input.is_deposit)
    .bind(&input.notes)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    let response: PaymentResponse = row.into();
    Ok((StatusCode::CREATED, Json(DataResponse::new(response))))
}

/// GET /bookings/:booking_id/payments
pub async fn list_payments_for_booking(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = fetch_booking(&state.db, booking_id).await?;
    check_booking_access(&state, &booking, &auth).await?;

    let rows = sqlx::query_as::<_, PaymentRow>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM booking_payments WHERE booking_id = $1 \
         ORDER BY created_at ASC"
    ))
    .bind(booking_id)
    .fetch_all(&state.db)
    .await?;

    let data: Vec<PaymentResponse> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse::new(data)))
}

/// POST /payments/:payment_id/process
///
/// Process a pending payment exactly once. The owning booking row is locked
/// for the whole read-modify-write, so two payments processed concurrently
/// serialize and neither increment is lost.
pub async fn process_payment(
    auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(payment_id): Path<Uuid>,
    Json(input): Json<ProcessPaymentInput>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        user_id = %auth.user_id,
        payment_id = %payment_id,
        gateway = %input.gateway,
        "Processing payment"
    );

    let mut tx = state.db.begin().await?;

    let payment = sqlx::query_as::<_, PaymentRow>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM booking_payments WHERE id = $1 FOR UPDATE"
    ))
    .bind(payment_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Payment not found"))?;

    if payment.payer_id != auth.user_id && !auth.is_admin() {
        return Err(ApiError::forbidden("No permission to process this payment"));
    }

    if PaymentStatus::from(payment.status.clone()) == PaymentStatus::Paid {
        return Err(ApiError::invalid_state("Payment has already been processed"));
    }

    // Lock the booking for the balance update
    let booking = sqlx::query_as::<_, BookingRow>(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
    ))
    .bind(payment.booking_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::not_found("Booking not found"))?;

    let amount_paid = booking.amount_paid + payment.amount;
    let amount_due = booking.total_amount - amount_paid;
    let payment_status =
        derive_payment_status(payment.is_deposit, amount_paid, booking.total_amount);

    let now = Utc::now();

    let processed = sqlx::query_as::<_, PaymentRow>(&format!(
        r#"
        UPDATE booking_payments SET
            status = 'paid',
            payment_date = $2,
            processed_at = $2,
            payment_gateway = $3,
            gateway_transaction_id = $4,
            updated_at = NOW()
        WHERE id = $1
        RETURNING {PAYMENT_COLUMNS}
        "#
    ))
    .bind(payment_id)
    .bind(now)
    .bind(&input.gateway)
    .bind(&input.gateway_transaction_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE bookings SET amount_paid = $2, amount_due = $3, payment_status = $4, \
         updated_at = NOW() WHERE id = $1",
    )
    .bind(booking.id)
    .bind(amount_paid)
    .bind(amount_due)
    .bind(payment_status.to_string())
    .execute(&mut *tx)
    .await?;

    outbox::emit(
        &mut *tx,
        "payment.processed",
        "booking_payment",
        payment_id,
        auth.user_id,
        serde_json::json!({
            "booking_id": booking.id,
            "amount": payment.amount,
            "is_deposit": payment.is_deposit,
            "payment_status": payment_status,
        }),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        payment_id = %payment_id,
        booking_id = %booking.id,
        amount_paid = %amount_paid,
        payment_status = %payment_status,
        "Payment processed"
    );

    let response: PaymentResponse = processed.into();
    Ok(Json(DataResponse::new(response)))
}

pub mod bookings;
pub mod health;
pub mod payments;
pub mod quotes;
pub mod requests;

use axum::{routing::get, routing::patch, routing::post, Router};
use std::sync::Arc;

use crate::app::AppState;

/// Build the API router with all routes
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        // Public routes
        .route("/health", get(health::health_check))
        // Booking requests (nested under events)
        .route(
            "/events/:event_id/booking-requests",
            post(requests::create_booking_request),
        )
        .route(
            "/events/:event_id/booking-requests",
            get(requests::list_booking_requests_for_event),
        )
        .route(
            "/booking-requests/:request_id",
            get(requests::get_booking_request),
        )
        .route(
            "/booking-requests/:request_id",
            patch(requests::update_booking_request),
        )
        .route(
            "/booking-requests/:request_id/view",
            post(requests::mark_request_viewed),
        )
        .route(
            "/vendors/:vendor_id/booking-requests",
            get(requests::list_booking_requests_for_vendor),
        )
        // Quotes
        .route("/quotes", post(quotes::create_quote))
        .route("/quotes/:quote_id", get(quotes::get_quote))
        .route("/quotes/:quote_id/send", post(quotes::send_quote))
        .route("/quotes/:quote_id/view", post(quotes::view_quote))
        .route("/quotes/:quote_id/accept", post(quotes::accept_quote))
        .route("/quotes/:quote_id/reject", post(quotes::reject_quote))
        .route(
            "/booking-requests/:request_id/quotes",
            get(quotes::list_quotes_for_request),
        )
        // Bookings
        .route("/bookings/:booking_id", get(bookings::get_booking))
        .route("/bookings/:booking_id", patch(bookings::update_booking))
        .route(
            "/bookings/:booking_id/complete",
            post(bookings::complete_booking),
        )
        .route(
            "/bookings/:booking_id/cancel",
            post(bookings::cancel_booking),
        )
        .route(
            "/bookings/:booking_id/cancellation",
            get(bookings::get_cancellation),
        )
        .route(
            "/events/:event_id/bookings",
            get(bookings::list_bookings_for_event),
        )
        .route(
            "/vendors/:vendor_id/bookings",
            get(bookings::list_bookings_for_vendor),
        )
        // Payments
        .route(
            "/bookings/:booking_id/payments",
            post(payments::create_payment),
        )
        .route(
            "/bookings/:booking_id/payments",
            get(payments::list_payments_for_booking),
        )
        .route(
            "/payments/:payment_id/process",
            post(payments::process_payment),
        )
}

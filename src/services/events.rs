//! Event directory reads
//!
//! Events are owned by the event-management subsystem; the booking engine
//! only resolves dates and collaborator permissions.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Fetch an event's start date, if the event exists
pub async fn get_event_date(
    db: &PgPool,
    event_id: Uuid,
) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
    sqlx::query_scalar("SELECT start_date FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_optional(db)
        .await
}

/// Check whether `user_id` may perform `action` on the event.
///
/// The event creator can do anything; collaborators need a role that covers
/// the action (`view` is granted to every collaborator, `edit` to editors
/// and organizers).
pub async fn user_has_permission(
    db: &PgPool,
    event_id: Uuid,
    user_id: Uuid,
    action: &str,
) -> Result<bool, sqlx::Error> {
    let is_creator: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1 AND creator_id = $2)")
            .bind(event_id)
            .bind(user_id)
            .fetch_one(db)
            .await?;

    if is_creator {
        return Ok(true);
    }

    let role_filter = match action {
        "view" => vec!["viewer", "editor", "organizer"],
        _ => vec!["editor", "organizer"],
    };

    sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM event_collaborators
            WHERE event_id = $1 AND user_id = $2 AND role = ANY($3)
        )
        "#,
    )
    .bind(event_id)
    .bind(user_id)
    .bind(&role_filter)
    .fetch_one(db)
    .await
}

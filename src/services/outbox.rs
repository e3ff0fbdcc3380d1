//! Domain-event outbox
//!
//! State transitions publish events by inserting a row on the same
//! transaction as the transition itself; notification delivery, vendor
//! statistics, and audit trails consume the table asynchronously. Keeping
//! the insert transactional means consumers never observe an event for a
//! transition that rolled back.

use sqlx::PgExecutor;
use uuid::Uuid;

/// Append a domain event to the outbox
pub async fn emit<'e, E>(
    executor: E,
    event_type: &str,
    aggregate_type: &str,
    aggregate_id: Uuid,
    actor_id: Uuid,
    payload: serde_json::Value,
) -> Result<Uuid, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO domain_events (id, event_type, aggregate_type, aggregate_id, actor_id, payload)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(id)
    .bind(event_type)
    .bind(aggregate_type)
    .bind(aggregate_id)
    .bind(actor_id)
    .bind(&payload)
    .execute(executor)
    .await?;

    tracing::info!(
        event_type = %event_type,
        aggregate_type = %aggregate_type,
        aggregate_id = %aggregate_id,
        actor_id = %actor_id,
        "Domain event emitted"
    );

    Ok(id)
}

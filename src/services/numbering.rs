//! Human-readable number sequences
//!
//! Quote, booking, and payment numbers of the form `{PREFIX}-{YEAR}-{NNNNN}`,
//! scoped per entity kind and calendar year. The counter bump is a single
//! atomic upsert executed on the caller's transaction, so two concurrent
//! creators can never mint the same number and a rolled-back creation never
//! leaves a half-assigned one.

use chrono::{Datelike, Utc};
use sqlx::PgExecutor;

/// Entity kinds with their own yearly sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Quote,
    Booking,
    Payment,
}

impl SequenceKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Quote => "Q",
            Self::Booking => "B",
            Self::Payment => "P",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            Self::Quote => "quote",
            Self::Booking => "booking",
            Self::Payment => "payment",
        }
    }
}

/// Format a sequence value as a display number, e.g. `Q-2025-00042`
pub fn format_number(kind: SequenceKind, year: i32, value: i64) -> String {
    format!("{}-{}-{:05}", kind.prefix(), year, value)
}

/// Atomically fetch the next number for `kind` in the current year.
///
/// Run this on the transaction that inserts the numbered record; the
/// increment then commits or rolls back together with it.
pub async fn next_number<'e, E>(executor: E, kind: SequenceKind) -> Result<String, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let year = Utc::now().year();

    let value: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO number_sequences (kind, year, value)
        VALUES ($1, $2, 1)
        ON CONFLICT (kind, year)
        DO UPDATE SET value = number_sequences.value + 1
        RETURNING value
        "#,
    )
    .bind(kind.key())
    .bind(year)
    .fetch_one(executor)
    .await?;

    Ok(format_number(kind, year, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_are_zero_padded_to_five_digits() {
        assert_eq!(format_number(SequenceKind::Quote, 2025, 1), "Q-2025-00001");
        assert_eq!(
            format_number(SequenceKind::Booking, 2025, 42),
            "B-2025-00042"
        );
        assert_eq!(
            format_number(SequenceKind::Payment, 2024, 12345),
            "P-2024-12345"
        );
    }

    #[test]
    fn six_digit_sequences_do_not_truncate() {
        assert_eq!(
            format_number(SequenceKind::Quote, 2025, 123456),
            "Q-2025-123456"
        );
    }
}

//! Statistics handler.

use crate::db::{self, StatsFilter};
use crate::error::{AppError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use dream_engine::{DreamStats, DreamType, StatsQuery, StatsResponse, Timestamp};
use sqlx::PgPool;

/// Aggregate the user's dreams inside the query window.
pub async fn handle_stats(pool: &PgPool, user_id: i64, query: StatsQuery) -> Result<StatsResponse> {
    let filter = stats_filter(&query)?;
    let rows = db::stats_entries(pool, user_id, &filter).await?;

    let mut entries = Vec::with_capacity(rows.len());
    for (dream_type, tags) in &rows {
        match dream_type.parse::<DreamType>() {
            Ok(dream_type) => entries.push((dream_type, tags.as_slice())),
            Err(e) => tracing::warn!("Skipping dream in stats: {}", e),
        }
    }

    Ok(StatsResponse {
        stats: DreamStats::from_entries(entries),
    })
}

/// Validate the query. `endDate` covers the whole UTC day it falls on.
pub fn stats_filter(query: &StatsQuery) -> Result<StatsFilter> {
    let start = query
        .start_date
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_instant(s, "startDate"))
        .transpose()?
        .map(|instant| instant.timestamp_millis());

    let end = query
        .end_date
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_instant(s, "endDate"))
        .transpose()?
        .map(end_of_day);

    Ok(StatsFilter {
        start,
        end,
        dream_type: query.type_filter()?,
    })
}

/// RFC 3339, or a bare `YYYY-MM-DD` taken as UTC midnight.
fn parse_instant(value: &str, name: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| AppError::BadRequest(format!("Invalid {}: {}", name, value)))
}

fn end_of_day(instant: DateTime<Utc>) -> Timestamp {
    instant
        .date_naive()
        .and_hms_milli_opt(23, 59, 59, 999)
        .map(|end| end.and_utc().timestamp_millis())
        .unwrap_or_else(|| instant.timestamp_millis())
}

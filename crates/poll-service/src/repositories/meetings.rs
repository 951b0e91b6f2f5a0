//! Meetings repository for database operations.
//!
//! Meetings are created by the normal scheduling flow elsewhere; this
//! service only looks them up by code and lazily inserts workspace-channel
//! meetings.
//!
//! # Concurrency
//!
//! `insert_if_code_absent` relies on the unique constraint on
//! `meeting_code` with `ON CONFLICT DO NOTHING`, so concurrent inserts of the
//! same code produce exactly one row and the losers observe `None`.

use crate::errors::PollError;
use crate::models::{MeetingRow, NewMeeting};
use crate::observability::metrics;
use common::types::MeetingId;
use sqlx::PgPool;
use std::time::Instant;
use tracing::instrument;

/// Meetings repository for database operations.
pub struct MeetingsRepository;

impl MeetingsRepository {
    /// Find the identifier of the meeting with an exact `code` match.
    #[instrument(skip_all, name = "poll.repo.find_meeting_id_by_code")]
    pub async fn find_id_by_code(
        pool: &PgPool,
        code: &str,
    ) -> Result<Option<MeetingId>, PollError> {
        let start = Instant::now();

        let id: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT meeting_id
            FROM meetings
            WHERE meeting_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            metrics::record_db_query("find_meeting_by_code", "error", start.elapsed());
            PollError::Database(e.to_string())
        })?;

        metrics::record_db_query("find_meeting_by_code", "success", start.elapsed());

        Ok(id.map(MeetingId))
    }

    /// Fetch the full meeting row with an exact `code` match.
    #[instrument(skip_all, name = "poll.repo.find_meeting_by_code")]
    pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<MeetingRow>, PollError> {
        let row = sqlx::query_as::<_, MeetingRow>(
            r#"
            SELECT
                meeting_id, workspace_id, host_id, title, meeting_code,
                meeting_type, status, created_at
            FROM meetings
            WHERE meeting_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// Insert a meeting unless one with the same code already exists.
    ///
    /// Returns `Some(id)` if this call inserted the row, `None` if the code
    /// was taken (including by a concurrent insert that committed first).
    #[instrument(skip_all, name = "poll.repo.insert_meeting", fields(code = %meeting.code))]
    pub async fn insert_if_code_absent(
        pool: &PgPool,
        meeting: &NewMeeting,
    ) -> Result<Option<MeetingId>, PollError> {
        let start = Instant::now();

        let id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO meetings (
                workspace_id, host_id, title, meeting_code, meeting_type, status
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (meeting_code) DO NOTHING
            RETURNING meeting_id
            "#,
        )
        .bind(meeting.workspace_id) // $1
        .bind(meeting.host_id.get()) // $2
        .bind(&meeting.title) // $3
        .bind(&meeting.code) // $4
        .bind(meeting.meeting_type.as_str()) // $5
        .bind(meeting.status.as_str()) // $6
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            metrics::record_db_query("insert_meeting", "error", start.elapsed());
            PollError::Database(e.to_string())
        })?;

        metrics::record_db_query("insert_meeting", "success", start.elapsed());

        Ok(id.map(MeetingId))
    }
}

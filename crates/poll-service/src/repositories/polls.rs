//! Polls repository: poll and option persistence.
//!
//! A poll and its options are always written in one transaction. Option
//! order is kept in the `position` column and every read returns options in
//! that order.

use crate::errors::PollError;
use crate::models::{Poll, PollOptionRow, PollRow};
use crate::observability::metrics;
use crate::repositories::is_foreign_key_violation;
use common::types::{MeetingId, OptionId, PollId};
use sqlx::{PgExecutor, PgPool};
use std::collections::HashMap;
use std::time::Instant;
use tracing::instrument;

/// Repository for polls and their options.
pub struct PollsRepository;

impl PollsRepository {
    /// Create a poll and its options as one atomic unit.
    ///
    /// An empty `option_texts` creates a poll with no options. Fails with
    /// `NotFound` if `meeting_id` does not reference an existing meeting.
    #[instrument(skip_all, name = "poll.repo.create_poll", fields(meeting_id = %meeting_id, options = option_texts.len()))]
    pub async fn create_poll(
        pool: &PgPool,
        meeting_id: MeetingId,
        question: &str,
        option_texts: &[String],
    ) -> Result<Poll, PollError> {
        let start = Instant::now();

        let result = Self::create_poll_tx(pool, meeting_id, question, option_texts).await;

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::record_db_query("create_poll", status, start.elapsed());

        result
    }

    async fn create_poll_tx(
        pool: &PgPool,
        meeting_id: MeetingId,
        question: &str,
        option_texts: &[String],
    ) -> Result<Poll, PollError> {
        let mut tx = pool.begin().await?;

        let poll_row = sqlx::query_as::<_, PollRow>(
            r#"
            INSERT INTO polls (meeting_id, question, is_active)
            VALUES ($1, $2, true)
            RETURNING poll_id, meeting_id, question, is_active, created_at
            "#,
        )
        .bind(meeting_id.get())
        .bind(question)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                PollError::NotFound("Meeting not found".to_string())
            } else {
                PollError::Database(e.to_string())
            }
        })?;

        if !option_texts.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO poll_options (poll_id, position, option_text)
                SELECT $1, t.ord::INTEGER, t.option_text
                FROM UNNEST($2::TEXT[]) WITH ORDINALITY AS t(option_text, ord)
                "#,
            )
            .bind(poll_row.poll_id)
            .bind(option_texts)
            .execute(&mut *tx)
            .await?;
        }

        let options = Self::fetch_options(&mut *tx, &[poll_row.poll_id]).await?;

        tx.commit().await?;

        Ok(Poll::from_rows(poll_row, options))
    }

    /// All active polls of a meeting with their options, newest first.
    #[instrument(skip_all, name = "poll.repo.get_active_polls", fields(meeting_id = %meeting_id))]
    pub async fn get_active_polls(
        pool: &PgPool,
        meeting_id: MeetingId,
    ) -> Result<Vec<Poll>, PollError> {
        let start = Instant::now();

        let rows = sqlx::query_as::<_, PollRow>(
            r#"
            SELECT poll_id, meeting_id, question, is_active, created_at
            FROM polls
            WHERE meeting_id = $1 AND is_active = true
            ORDER BY created_at DESC, poll_id DESC
            "#,
        )
        .bind(meeting_id.get())
        .fetch_all(pool)
        .await
        .map_err(|e| {
            metrics::record_db_query("get_active_polls", "error", start.elapsed());
            PollError::Database(e.to_string())
        })?;

        let poll_ids: Vec<i64> = rows.iter().map(|r| r.poll_id).collect();
        let options = if poll_ids.is_empty() {
            Vec::new()
        } else {
            Self::fetch_options(pool, &poll_ids).await?
        };

        metrics::record_db_query("get_active_polls", "success", start.elapsed());

        let mut by_poll: HashMap<i64, Vec<PollOptionRow>> = HashMap::new();
        for option in options {
            by_poll.entry(option.poll_id).or_default().push(option);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let options = by_poll.remove(&row.poll_id).unwrap_or_default();
                Poll::from_rows(row, options)
            })
            .collect())
    }

    /// Fetch one poll with its options, regardless of its active flag.
    #[instrument(skip_all, name = "poll.repo.get_poll", fields(poll_id = %poll_id))]
    pub async fn get_poll(pool: &PgPool, poll_id: PollId) -> Result<Option<Poll>, PollError> {
        let row = sqlx::query_as::<_, PollRow>(
            r#"
            SELECT poll_id, meeting_id, question, is_active, created_at
            FROM polls
            WHERE poll_id = $1
            "#,
        )
        .bind(poll_id.get())
        .fetch_optional(pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let options = Self::fetch_options(pool, &[row.poll_id]).await?;

        Ok(Some(Poll::from_rows(row, options)))
    }

    /// Read a poll's active flag and hold a share lock on the row until the
    /// enclosing transaction ends.
    ///
    /// A concurrent `deactivate` blocks until the transaction finishes, so a
    /// vote can never be recorded against a poll closed after this read.
    /// Returns `None` if the poll does not exist.
    pub async fn lock_active_flag<'e, E>(
        executor: E,
        poll_id: PollId,
    ) -> Result<Option<bool>, PollError>
    where
        E: PgExecutor<'e>,
    {
        let is_active: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT is_active
            FROM polls
            WHERE poll_id = $1
            FOR SHARE
            "#,
        )
        .bind(poll_id.get())
        .fetch_optional(executor)
        .await?;

        Ok(is_active)
    }

    /// Add exactly one vote to an option's counter.
    ///
    /// Expressed as `vote_count = vote_count + 1` so concurrent increments
    /// serialize on the row lock without lost updates. The option must belong
    /// to `poll_id`; returns the number of rows updated (0 or 1).
    pub async fn increment_vote_count<'e, E>(
        executor: E,
        poll_id: PollId,
        option_id: OptionId,
    ) -> Result<u64, PollError>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            r#"
            UPDATE poll_options
            SET vote_count = vote_count + 1
            WHERE option_id = $1 AND poll_id = $2
            "#,
        )
        .bind(option_id.get())
        .bind(poll_id.get())
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    /// Set the active flag false. Returns the number of polls matched, so an
    /// already-closed poll still counts as 1.
    #[instrument(skip_all, name = "poll.repo.deactivate", fields(poll_id = %poll_id))]
    pub async fn deactivate(pool: &PgPool, poll_id: PollId) -> Result<u64, PollError> {
        let start = Instant::now();

        let result = sqlx::query(
            r#"
            UPDATE polls
            SET is_active = false
            WHERE poll_id = $1
            "#,
        )
        .bind(poll_id.get())
        .execute(pool)
        .await
        .map_err(|e| {
            metrics::record_db_query("deactivate_poll", "error", start.elapsed());
            PollError::Database(e.to_string())
        })?;

        metrics::record_db_query("deactivate_poll", "success", start.elapsed());

        Ok(result.rows_affected())
    }

    async fn fetch_options<'e, E>(
        executor: E,
        poll_ids: &[i64],
    ) -> Result<Vec<PollOptionRow>, PollError>
    where
        E: PgExecutor<'e>,
    {
        let rows = sqlx::query_as::<_, PollOptionRow>(
            r#"
            SELECT option_id, poll_id, option_text, vote_count
            FROM poll_options
            WHERE poll_id = ANY($1)
            ORDER BY poll_id, position
            "#,
        )
        .bind(poll_ids)
        .fetch_all(executor)
        .await?;

        Ok(rows)
    }
}

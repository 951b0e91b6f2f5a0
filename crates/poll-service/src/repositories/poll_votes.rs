//! Poll votes repository.
//!
//! The `poll_votes_poll_voter_unique` constraint on `(poll_id, voter_id)` is
//! the authoritative single-vote guard. `find_vote` is only a fast path.

use crate::errors::PollError;
use crate::repositories::{is_foreign_key_violation, is_unique_violation, POLL_VOTER_UNIQUE};
use common::types::{OptionId, ParticipantId, PollId};
use sqlx::{PgExecutor, PgPool};
use tracing::instrument;

/// Repository for individual vote records.
pub struct PollVotesRepository;

impl PollVotesRepository {
    /// Find the vote a participant cast on a poll, if any.
    #[instrument(skip_all, name = "poll.repo.find_vote", fields(poll_id = %poll_id, voter_id = %voter_id))]
    pub async fn find_vote(
        pool: &PgPool,
        poll_id: PollId,
        voter_id: ParticipantId,
    ) -> Result<Option<i64>, PollError> {
        let vote_id: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT vote_id
            FROM poll_votes
            WHERE poll_id = $1 AND voter_id = $2
            "#,
        )
        .bind(poll_id.get())
        .bind(voter_id.get())
        .fetch_optional(pool)
        .await?;

        Ok(vote_id)
    }

    /// Insert a vote record.
    ///
    /// Fails with `AlreadyVoted` when the (poll, voter) pair already has a
    /// row, including one committed by a concurrent transaction after our
    /// pre-check. Fails with `NotFound` when the option does not exist.
    pub async fn insert_vote<'e, E>(
        executor: E,
        poll_id: PollId,
        option_id: OptionId,
        voter_id: ParticipantId,
    ) -> Result<i64, PollError>
    where
        E: PgExecutor<'e>,
    {
        let vote_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO poll_votes (poll_id, option_id, voter_id)
            VALUES ($1, $2, $3)
            RETURNING vote_id
            "#,
        )
        .bind(poll_id.get())
        .bind(option_id.get())
        .bind(voter_id.get())
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if is_unique_violation(&e, POLL_VOTER_UNIQUE) {
                PollError::AlreadyVoted
            } else if is_foreign_key_violation(&e) {
                PollError::NotFound("Poll option not found".to_string())
            } else {
                PollError::Database(e.to_string())
            }
        })?;

        Ok(vote_id)
    }
}

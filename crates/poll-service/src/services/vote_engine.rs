//! Vote engine.
//!
//! Records at most one vote per participant per poll and keeps every
//! option's `vote_count` equal to the number of vote rows pointing at it.
//!
//! # Protocol
//!
//! 1. Fast-path lookup of an existing vote (no transaction).
//! 2. Begin a transaction.
//! 3. Read the poll's active flag under a share lock. Missing poll is
//!    `NotFound`, inactive is `PollClosed`.
//! 4. Insert the vote row. The `(poll_id, voter_id)` unique constraint turns
//!    a concurrent duplicate into `AlreadyVoted`.
//! 5. Increment the option counter in place. Zero rows updated means the
//!    option is missing or belongs to another poll: `NotFound`.
//! 6. Commit.
//!
//! Any failure in steps 3-5 drops the transaction, which rolls it back, so a
//! vote row never exists without its increment.

use crate::errors::PollError;
use crate::observability::metrics;
use crate::repositories::{PollVotesRepository, PollsRepository};
use common::types::{OptionId, ParticipantId, PollId};
use sqlx::PgPool;
use std::time::Instant;
use tracing::instrument;

/// Service for casting votes.
pub struct VoteEngine;

impl VoteEngine {
    /// Cast `voter`'s vote for `option_id` on `poll_id`.
    ///
    /// # Errors
    ///
    /// - `PollError::AlreadyVoted` - Voter already has a vote on this poll
    /// - `PollError::NotFound` - Poll missing, or option not in this poll
    /// - `PollError::PollClosed` - Poll is no longer active
    /// - `PollError::Database` - Storage failure; nothing was recorded
    #[instrument(skip_all, name = "poll.services.cast_vote", fields(poll_id = %poll_id, option_id = %option_id, voter_id = %voter))]
    pub async fn cast_vote(
        pool: &PgPool,
        poll_id: PollId,
        option_id: OptionId,
        voter: ParticipantId,
    ) -> Result<(), PollError> {
        let start = Instant::now();

        let result = Self::record_vote(pool, poll_id, option_id, voter).await;

        let outcome = match &result {
            Ok(()) => "recorded",
            Err(PollError::AlreadyVoted) => "already_voted",
            Err(PollError::PollClosed) => "poll_closed",
            Err(PollError::NotFound(_)) => "not_found",
            Err(_) => "error",
        };
        metrics::record_vote(outcome, start.elapsed());

        match &result {
            Ok(()) => {
                tracing::info!(target: "poll.services.vote_engine", "Vote recorded");
            }
            Err(PollError::Database(_)) | Err(PollError::Internal) => {
                tracing::warn!(target: "poll.services.vote_engine", outcome, "Vote failed");
            }
            Err(_) => {
                tracing::debug!(target: "poll.services.vote_engine", outcome, "Vote rejected");
            }
        }

        result
    }

    async fn record_vote(
        pool: &PgPool,
        poll_id: PollId,
        option_id: OptionId,
        voter: ParticipantId,
    ) -> Result<(), PollError> {
        if PollVotesRepository::find_vote(pool, poll_id, voter)
            .await?
            .is_some()
        {
            return Err(PollError::AlreadyVoted);
        }

        let mut tx = pool.begin().await?;

        match PollsRepository::lock_active_flag(&mut *tx, poll_id).await? {
            None => return Err(PollError::NotFound("Poll not found".to_string())),
            Some(false) => return Err(PollError::PollClosed),
            Some(true) => {}
        }

        PollVotesRepository::insert_vote(&mut *tx, poll_id, option_id, voter).await?;

        let updated = PollsRepository::increment_vote_count(&mut *tx, poll_id, option_id).await?;
        if updated == 0 {
            return Err(PollError::NotFound("Poll option not found".to_string()));
        }

        tx.commit().await?;

        Ok(())
    }
}

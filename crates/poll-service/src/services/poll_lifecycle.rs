//! Poll lifecycle: active polls can be closed, closed polls stay closed.

use crate::errors::PollError;
use crate::observability::metrics;
use crate::repositories::PollsRepository;
use common::types::PollId;
use sqlx::PgPool;
use tracing::instrument;

/// Service for poll state transitions.
pub struct PollLifecycle;

impl PollLifecycle {
    /// Close a poll so it stops accepting votes.
    ///
    /// Closing an already-closed poll succeeds. Votes recorded before the
    /// close keep counting; a vote in flight either commits before the close
    /// takes effect or fails with `PollClosed`.
    #[instrument(skip_all, name = "poll.services.close_poll", fields(poll_id = %poll_id))]
    pub async fn close_poll(pool: &PgPool, poll_id: PollId) -> Result<(), PollError> {
        let matched = PollsRepository::deactivate(pool, poll_id).await?;

        if matched == 0 {
            return Err(PollError::NotFound("Poll not found".to_string()));
        }

        metrics::record_poll_lifecycle("closed");

        tracing::info!(target: "poll.services.lifecycle", poll_id = %poll_id, "Poll closed");

        Ok(())
    }
}

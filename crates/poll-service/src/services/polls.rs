//! Poll creation and listing.

use crate::errors::PollError;
use crate::models::Poll;
use crate::observability::metrics;
use crate::repositories::PollsRepository;
use crate::services::MeetingResolver;
use common::types::ParticipantId;
use sqlx::PgPool;
use tracing::instrument;

/// Service for poll creation and reads.
pub struct PollService;

impl PollService {
    /// Create an active poll in the meeting `room_name` resolves to.
    ///
    /// The question is stored trimmed. Option texts are stored as given, in
    /// order; an empty list creates a poll with no options.
    ///
    /// # Errors
    ///
    /// - `PollError::InvalidFormat` - Malformed room name
    /// - `PollError::NotFound` - Room does not resolve to an existing meeting
    /// - `PollError::Database` - Storage failure
    #[instrument(skip_all, name = "poll.services.create_poll", fields(room_name = %room_name, creator = %creator))]
    pub async fn create_poll(
        pool: &PgPool,
        room_name: &str,
        question: &str,
        options: &[String],
        creator: ParticipantId,
    ) -> Result<Poll, PollError> {
        let meeting_id = MeetingResolver::resolve(pool, room_name, creator).await?;

        let poll =
            PollsRepository::create_poll(pool, meeting_id, question.trim(), options).await?;

        metrics::record_poll_lifecycle("created");

        tracing::info!(
            target: "poll.services.polls",
            poll_id = %poll.id,
            meeting_id = %meeting_id,
            options = poll.options.len(),
            "Poll created"
        );

        Ok(poll)
    }

    /// Active polls of the meeting `room_name` resolves to, newest first.
    ///
    /// A room that cannot be resolved (malformed name, unknown code, no
    /// identity to create a channel meeting) yields an empty list. Storage
    /// failures still propagate.
    #[instrument(skip_all, name = "poll.services.list_active_polls", fields(room_name = %room_name))]
    pub async fn list_active_polls(
        pool: &PgPool,
        room_name: &str,
        viewer: ParticipantId,
    ) -> Result<Vec<Poll>, PollError> {
        let meeting_id = match MeetingResolver::resolve(pool, room_name, viewer).await {
            Ok(id) => id,
            Err(e @ (PollError::InvalidFormat(_) | PollError::NotFound(_))) => {
                tracing::debug!(
                    target: "poll.services.polls",
                    error = %e,
                    "Room did not resolve, returning no polls"
                );
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        PollsRepository::get_active_polls(pool, meeting_id).await
    }
}

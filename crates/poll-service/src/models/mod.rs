//! Poll service models.
//!
//! Contains the database row types, domain types and request/response
//! payloads used across the service.

use chrono::{DateTime, Utc};
use common::types::{MeetingId, OptionId, ParticipantId, PollId};
use serde::{Deserialize, Serialize};

/// Maximum question length accepted by the request layer.
pub const MAX_QUESTION_LENGTH: usize = 500;

/// Maximum number of options per poll accepted by the request layer.
pub const MAX_POLL_OPTIONS: usize = 20;

/// Maximum length of a single option text.
pub const MAX_OPTION_TEXT_LENGTH: usize = 200;

// ============================================================================
// Meetings
// ============================================================================

/// Meeting type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingType {
    /// Scheduled through the normal meeting flow.
    Standard,

    /// Standing, always-open call attached to a workspace group.
    WorkspaceChannel,
}

impl MeetingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingType::Standard => "standard",
            MeetingType::WorkspaceChannel => "workspace_channel",
        }
    }
}

/// Meeting status tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingStatus {
    Scheduled,
    Active,
    Ended,

    /// Workspace channels never end.
    AlwaysOpen,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Scheduled => "scheduled",
            MeetingStatus::Active => "active",
            MeetingStatus::Ended => "ended",
            MeetingStatus::AlwaysOpen => "always_open",
        }
    }
}

/// Meeting database row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MeetingRow {
    pub meeting_id: i64,
    pub workspace_id: Option<i64>,
    pub host_id: i64,
    pub title: String,
    pub meeting_code: Option<String>,
    pub meeting_type: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A meeting to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMeeting {
    pub workspace_id: Option<i64>,
    pub host_id: ParticipantId,
    pub title: String,
    pub code: String,
    pub meeting_type: MeetingType,
    pub status: MeetingStatus,
}

// ============================================================================
// Polls
// ============================================================================

/// Poll database row (without options).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PollRow {
    pub poll_id: i64,
    pub meeting_id: i64,
    pub question: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Poll option database row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PollOptionRow {
    pub option_id: i64,
    pub poll_id: i64,
    pub option_text: String,
    pub vote_count: i32,
}

/// A poll with its options in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub id: PollId,
    pub meeting_id: MeetingId,
    pub question: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub options: Vec<PollOption>,
}

/// One answer choice and its aggregate vote count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollOption {
    pub id: OptionId,
    pub poll_id: PollId,
    pub text: String,
    pub vote_count: i32,
}

impl From<PollOptionRow> for PollOption {
    fn from(row: PollOptionRow) -> Self {
        Self {
            id: OptionId(row.option_id),
            poll_id: PollId(row.poll_id),
            text: row.option_text,
            vote_count: row.vote_count,
        }
    }
}

impl Poll {
    /// Assemble a poll from its row and its already-ordered option rows.
    pub fn from_rows(row: PollRow, options: Vec<PollOptionRow>) -> Self {
        Self {
            id: PollId(row.poll_id),
            meeting_id: MeetingId(row.meeting_id),
            question: row.question,
            created_at: row.created_at,
            is_active: row.is_active,
            options: options.into_iter().map(PollOption::from).collect(),
        }
    }
}

// ============================================================================
// Request / Response payloads
// ============================================================================

/// Request body for `POST /api/v1/polls`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePollRequest {
    /// Room name in any of the supported formats.
    pub room_name: String,

    pub question: String,

    /// Option texts in display order. Missing means no options.
    #[serde(default)]
    pub options: Vec<String>,
}

impl CreatePollRequest {
    /// Validate the request.
    ///
    /// Returns `Ok(())` if valid, or an error message describing the problem.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.room_name.trim().is_empty() {
            return Err("Room name is required");
        }

        let question = self.question.trim();
        if question.is_empty() {
            return Err("Question is required");
        }

        if question.chars().count() > MAX_QUESTION_LENGTH {
            return Err("Question must be at most 500 characters");
        }

        if self.options.len() > MAX_POLL_OPTIONS {
            return Err("A poll can have at most 20 options");
        }

        if self
            .options
            .iter()
            .any(|o| o.chars().count() > MAX_OPTION_TEXT_LENGTH)
        {
            return Err("Option text must be at most 200 characters");
        }

        Ok(())
    }
}

/// Query string for `GET /api/v1/polls`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListPollsQuery {
    pub room_name: Option<String>,
}

/// Response for `GET /api/v1/polls`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollListResponse {
    pub polls: Vec<Poll>,
}

/// Request body for `POST /api/v1/polls/{poll_id}/votes`.
#[derive(Debug, Clone, Deserialize)]
pub struct CastVoteRequest {
    pub option_id: OptionId,
}

/// Acknowledgement for operations without a payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Health check response.
///
/// Returned by the `/health` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service health status ("healthy" or "unhealthy").
    pub status: String,

    /// Identifier of the answering instance.
    pub instance_id: String,

    /// Database connectivity status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

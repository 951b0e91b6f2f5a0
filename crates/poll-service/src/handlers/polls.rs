//! Poll handlers.
//!
//! - `POST /api/v1/polls` - Create a poll in a room
//! - `GET /api/v1/polls?room_name=...` - List a room's active polls
//! - `POST /api/v1/polls/{poll_id}/votes` - Cast a vote
//! - `POST /api/v1/polls/{poll_id}/close` - Close a poll
//!
//! Request bodies are deserialized by hand so malformed JSON is a 400 with
//! the service's error body, not the framework's 422.

use crate::errors::PollError;
use crate::middleware::Participant;
use crate::models::{
    CastVoteRequest, CreatePollRequest, ListPollsQuery, Poll, PollListResponse, SuccessResponse,
};
use crate::routes::AppState;
use crate::services::{PollLifecycle, PollService, VoteEngine};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use common::types::PollId;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::instrument;

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, PollError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(target: "poll.handlers.polls", error = %e, "Invalid request body");
        PollError::BadRequest("Invalid request body".to_string())
    })
}

fn parse_poll_id(raw: &str) -> Result<PollId, PollError> {
    raw.parse::<PollId>()
        .map_err(|_| PollError::InvalidFormat(format!("Invalid poll id '{}'", raw)))
}

/// Handler for POST /api/v1/polls
///
/// # Response
///
/// - 201 Created: The poll with its options
/// - 400 Bad Request: Invalid body or room name format
/// - 401 Unauthorized: No participant identity
/// - 404 Not Found: Room does not resolve to a meeting
#[instrument(skip_all, name = "poll.handlers.create_poll", fields(participant = %participant))]
pub async fn create_poll(
    State(state): State<Arc<AppState>>,
    Extension(Participant(participant)): Extension<Participant>,
    body: Bytes,
) -> Result<(StatusCode, Json<Poll>), PollError> {
    let request: CreatePollRequest = parse_body(&body)?;

    request
        .validate()
        .map_err(|e| PollError::BadRequest(e.to_string()))?;

    let poll = PollService::create_poll(
        &state.pool,
        request.room_name.trim(),
        &request.question,
        &request.options,
        participant,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(poll)))
}

/// Handler for GET /api/v1/polls
///
/// Returns `{"polls": [...]}`, newest first. Rooms that do not resolve
/// produce an empty list rather than an error.
#[instrument(skip_all, name = "poll.handlers.list_polls")]
pub async fn list_polls(
    State(state): State<Arc<AppState>>,
    Extension(Participant(viewer)): Extension<Participant>,
    Query(query): Query<ListPollsQuery>,
) -> Result<Json<PollListResponse>, PollError> {
    let room_name = query
        .room_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| PollError::BadRequest("room_name is required".to_string()))?;

    let polls = PollService::list_active_polls(&state.pool, room_name, viewer).await?;

    Ok(Json(PollListResponse { polls }))
}

/// Handler for POST /api/v1/polls/{poll_id}/votes
///
/// # Response
///
/// - 200 OK: `{"success": true}`
/// - 404 Not Found: Unknown poll, or option not in this poll
/// - 409 Conflict: Participant already voted on this poll
/// - 410 Gone: Poll is closed
#[instrument(skip_all, name = "poll.handlers.cast_vote", fields(poll_id = %raw_poll_id, voter = %voter))]
pub async fn cast_vote(
    State(state): State<Arc<AppState>>,
    Extension(Participant(voter)): Extension<Participant>,
    Path(raw_poll_id): Path<String>,
    body: Bytes,
) -> Result<Json<SuccessResponse>, PollError> {
    let poll_id = parse_poll_id(&raw_poll_id)?;
    let request: CastVoteRequest = parse_body(&body)?;

    VoteEngine::cast_vote(&state.pool, poll_id, request.option_id, voter).await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Handler for POST /api/v1/polls/{poll_id}/close
///
/// Idempotent: closing a closed poll returns success.
#[instrument(skip_all, name = "poll.handlers.close_poll", fields(poll_id = %raw_poll_id, participant = %participant))]
pub async fn close_poll(
    State(state): State<Arc<AppState>>,
    Extension(Participant(participant)): Extension<Participant>,
    Path(raw_poll_id): Path<String>,
) -> Result<Json<SuccessResponse>, PollError> {
    let poll_id = parse_poll_id(&raw_poll_id)?;

    PollLifecycle::close_poll(&state.pool, poll_id).await?;

    Ok(Json(SuccessResponse::ok()))
}

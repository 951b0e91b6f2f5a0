//! Participant identity middleware.
//!
//! The caller's participant ID is established upstream and forwarded in the
//! `x-participant-id` header. These layers parse it and store a
//! [`Participant`] in the request extensions for handlers.

use crate::errors::PollError;
use axum::{extract::Request, middleware::Next, response::Response};
use common::types::ParticipantId;

/// Header carrying the caller's participant ID.
pub const PARTICIPANT_HEADER: &str = "x-participant-id";

/// The calling participant, as seen by handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Participant(pub ParticipantId);

/// Parse the participant header. `Ok(None)` when the header is absent.
fn parse_participant(req: &Request) -> Result<Option<ParticipantId>, PollError> {
    let Some(value) = req.headers().get(PARTICIPANT_HEADER) else {
        return Ok(None);
    };

    let id = value
        .to_str()
        .ok()
        .and_then(|s| s.trim().parse::<ParticipantId>().ok())
        .ok_or_else(|| {
            tracing::debug!(target: "poll.middleware.participant", "Malformed participant header");
            PollError::Unauthenticated("Invalid participant identity".to_string())
        })?;

    Ok(Some(id))
}

/// Require a participant identity.
///
/// Missing, malformed or zero identities are rejected with 401.
pub async fn require_participant(mut req: Request, next: Next) -> Result<Response, PollError> {
    let participant = parse_participant(&req)?
        .filter(|id| !id.is_unset())
        .ok_or_else(|| {
            tracing::debug!(target: "poll.middleware.participant", "Missing participant identity");
            PollError::Unauthenticated("Participant identity required".to_string())
        })?;

    req.extensions_mut().insert(Participant(participant));

    Ok(next.run(req).await)
}

/// Accept an optional participant identity.
///
/// An absent header yields the unset participant. A header that is present
/// but malformed is still rejected.
pub async fn optional_participant(mut req: Request, next: Next) -> Result<Response, PollError> {
    let participant = parse_participant(&req)?.unwrap_or(ParticipantId::UNSET);

    req.extensions_mut().insert(Participant(participant));

    Ok(next.run(req).await)
}

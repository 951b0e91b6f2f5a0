//! Meeting identity resolution.
//!
//! Maps an opaque room name to a durable meeting ID. Room names arrive in
//! several formats; each format has a pure matcher and the matchers run in a
//! fixed order, first match wins:
//!
//! 1. `meeting-{id}`: prefixed numeric. A non-numeric remainder is
//!    `InvalidFormat`, never a fallthrough.
//! 2. `{id}`: bare numeric. Used as-is without touching the store.
//! 3. `workspace-{wid}-call-{name...}`: workspace channel. Looked up by code
//!    and lazily created on first access.
//! 4. Anything else: exact meeting code lookup.
//!
//! Numeric forms are matched first so a numeric-looking name can never be
//! taken for a channel or a code.

use crate::errors::PollError;
use crate::models::{MeetingStatus, MeetingType, NewMeeting};
use crate::observability::metrics;
use crate::repositories::{get_or_create_by_key, KeyedRecord, MeetingsRepository};
use common::types::{MeetingId, ParticipantId};
use sqlx::PgPool;
use tracing::instrument;

/// Prefix of the prefixed-numeric room name form.
pub const MEETING_PREFIX: &str = "meeting-";

const WORKSPACE_SEGMENT: &str = "workspace";
const CALL_SEGMENT: &str = "call";
const MIN_WORKSPACE_CHANNEL_SEGMENTS: usize = 4;

/// Which room-name format matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPattern {
    PrefixedNumeric,
    BareNumeric,
    WorkspaceChannel,
    Code,
}

impl RoomPattern {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomPattern::PrefixedNumeric => "prefixed_numeric",
            RoomPattern::BareNumeric => "bare_numeric",
            RoomPattern::WorkspaceChannel => "workspace_channel",
            RoomPattern::Code => "code",
        }
    }
}

/// A room name after classification, before any store access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomRef<'a> {
    /// The meeting ID is encoded in the name.
    Meeting(MeetingId),

    /// A workspace channel room.
    WorkspaceChannel(WorkspaceChannel<'a>),

    /// An opaque meeting code.
    Code(&'a str),
}

/// Parsed `workspace-{wid}-call-{name...}` room name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceChannel<'a> {
    /// The full room name, used verbatim as the meeting code.
    pub code: &'a str,

    /// Second segment. Parsed only if the meeting has to be created.
    pub workspace_segment: &'a str,

    /// Trailing segments joined with spaces.
    pub title: String,
}

impl WorkspaceChannel<'_> {
    /// Parse the workspace ID segment.
    pub fn workspace_id(&self) -> Result<i64, PollError> {
        self.workspace_segment.parse::<i64>().map_err(|e| {
            PollError::InvalidFormat(format!(
                "workspace id '{}' in room '{}': {}",
                self.workspace_segment, self.code, e
            ))
        })
    }

    /// The meeting record to insert for this channel, hosted by `host`.
    pub fn new_meeting(&self, workspace_id: i64, host: ParticipantId) -> NewMeeting {
        NewMeeting {
            workspace_id: Some(workspace_id),
            host_id: host,
            title: self.title.clone(),
            code: self.code.to_string(),
            meeting_type: MeetingType::WorkspaceChannel,
            status: MeetingStatus::AlwaysOpen,
        }
    }
}

/// A matcher returns `None` when its format does not apply.
type Matcher = for<'a> fn(&'a str) -> Option<Result<RoomRef<'a>, PollError>>;

/// Matchers in resolution order.
const MATCHERS: &[(RoomPattern, Matcher)] = &[
    (RoomPattern::PrefixedNumeric, match_prefixed_numeric),
    (RoomPattern::BareNumeric, match_bare_numeric),
    (RoomPattern::WorkspaceChannel, match_workspace_channel),
    (RoomPattern::Code, match_code),
];

fn match_prefixed_numeric(room_name: &str) -> Option<Result<RoomRef<'_>, PollError>> {
    let rest = room_name.strip_prefix(MEETING_PREFIX)?;

    Some(
        rest.parse::<i64>()
            .map(|id| RoomRef::Meeting(MeetingId(id)))
            .map_err(|e| {
                PollError::InvalidFormat(format!("meeting id '{}' in room name: {}", rest, e))
            }),
    )
}

fn match_bare_numeric(room_name: &str) -> Option<Result<RoomRef<'_>, PollError>> {
    room_name
        .parse::<i64>()
        .ok()
        .map(|id| Ok(RoomRef::Meeting(MeetingId(id))))
}

fn match_workspace_channel(room_name: &str) -> Option<Result<RoomRef<'_>, PollError>> {
    let segments: Vec<&str> = room_name.split('-').collect();

    if segments.len() < MIN_WORKSPACE_CHANNEL_SEGMENTS {
        return None;
    }

    match segments.as_slice() {
        [first, workspace, call, title @ ..]
            if *first == WORKSPACE_SEGMENT && *call == CALL_SEGMENT =>
        {
            Some(Ok(RoomRef::WorkspaceChannel(WorkspaceChannel {
                code: room_name,
                workspace_segment: *workspace,
                title: title.join(" "),
            })))
        }
        _ => None,
    }
}

fn match_code(room_name: &str) -> Option<Result<RoomRef<'_>, PollError>> {
    Some(Ok(RoomRef::Code(room_name)))
}

/// Classify a room name without touching the store.
pub fn classify(room_name: &str) -> (RoomPattern, Result<RoomRef<'_>, PollError>) {
    for (pattern, matcher) in MATCHERS {
        if let Some(result) = matcher(room_name) {
            return (*pattern, result);
        }
    }

    // match_code accepts everything, so this is only reached if the table changes
    (RoomPattern::Code, Ok(RoomRef::Code(room_name)))
}

/// Resolves room names to meeting IDs.
pub struct MeetingResolver;

impl MeetingResolver {
    /// Resolve `room_name` to a meeting ID on behalf of `participant`.
    ///
    /// `participant` is only used as the host when a workspace-channel
    /// meeting has to be created; an unset participant makes that creation
    /// fail with `NotFound`.
    #[instrument(skip_all, name = "poll.services.resolve_meeting", fields(room_name = %room_name))]
    pub async fn resolve(
        pool: &PgPool,
        room_name: &str,
        participant: ParticipantId,
    ) -> Result<MeetingId, PollError> {
        let (pattern, room) = classify(room_name);

        let result = match room {
            Err(e) => Err(e),
            Ok(RoomRef::Meeting(id)) => Ok(id),
            Ok(RoomRef::WorkspaceChannel(channel)) => {
                Self::resolve_workspace_channel(pool, &channel, participant).await
            }
            Ok(RoomRef::Code(code)) => MeetingsRepository::find_id_by_code(pool, code)
                .await?
                .ok_or_else(|| PollError::NotFound("Meeting not found".to_string())),
        };

        let outcome = match &result {
            Ok(_) => "resolved",
            Err(PollError::InvalidFormat(_)) => "invalid_format",
            Err(PollError::NotFound(_)) => "not_found",
            Err(_) => "error",
        };
        metrics::record_meeting_resolution(pattern.as_str(), outcome);

        tracing::debug!(
            target: "poll.services.resolver",
            pattern = pattern.as_str(),
            outcome = outcome,
            "Resolved room name"
        );

        result
    }

    async fn resolve_workspace_channel(
        pool: &PgPool,
        channel: &WorkspaceChannel<'_>,
        participant: ParticipantId,
    ) -> Result<MeetingId, PollError> {
        let record = get_or_create_by_key(
            channel.code,
            move || MeetingsRepository::find_id_by_code(pool, channel.code),
            move || async move {
                let workspace_id = channel.workspace_id()?;

                if participant.is_unset() {
                    return Err(PollError::NotFound(
                        "Meeting not found and no host to create it".to_string(),
                    ));
                }

                let meeting = channel.new_meeting(workspace_id, participant);
                MeetingsRepository::insert_if_code_absent(pool, &meeting).await
            },
        )
        .await?;

        match &record {
            KeyedRecord::Existing(_) => {}
            KeyedRecord::Created(id) => {
                metrics::record_lazy_meeting("created");
                tracing::info!(
                    target: "poll.services.resolver",
                    meeting_id = %id,
                    host_id = %participant,
                    code = %channel.code,
                    "Created workspace channel meeting"
                );
            }
            KeyedRecord::RaceRecovered(id) => {
                metrics::record_lazy_meeting("raced");
                tracing::info!(
                    target: "poll.services.resolver",
                    meeting_id = %id,
                    code = %channel.code,
                    "Workspace channel meeting created concurrently, using existing record"
                );
            }
        }

        Ok(record.into_inner())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn classify_ok(room_name: &str) -> (RoomPattern, RoomRef<'_>) {
        let (pattern, result) = classify(room_name);
        (pattern, result.unwrap())
    }

    #[test]
    fn test_prefixed_numeric() {
        assert_eq!(
            classify_ok("meeting-42"),
            (RoomPattern::PrefixedNumeric, RoomRef::Meeting(MeetingId(42)))
        );
    }

    #[test]
    fn test_prefixed_non_numeric_is_invalid_format() {
        let (pattern, result) = classify("meeting-abc");
        assert_eq!(pattern, RoomPattern::PrefixedNumeric);
        match result {
            Err(PollError::InvalidFormat(msg)) => assert!(msg.contains("abc")),
            other => panic!("expected InvalidFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_prefix_alone_is_invalid_format() {
        let (pattern, result) = classify("meeting-");
        assert_eq!(pattern, RoomPattern::PrefixedNumeric);
        assert!(matches!(result, Err(PollError::InvalidFormat(_))));
    }

    #[test]
    fn test_bare_numeric() {
        assert_eq!(
            classify_ok("1"),
            (RoomPattern::BareNumeric, RoomRef::Meeting(MeetingId(1)))
        );
        assert_eq!(
            classify_ok("9007199254740993"),
            (
                RoomPattern::BareNumeric,
                RoomRef::Meeting(MeetingId(9_007_199_254_740_993))
            )
        );
    }

    #[test]
    fn test_numeric_overflow_falls_through_to_code() {
        let huge = "99999999999999999999999";
        assert_eq!(classify_ok(huge), (RoomPattern::Code, RoomRef::Code(huge)));
    }

    #[test]
    fn test_workspace_channel() {
        let (pattern, room) = classify_ok("workspace-9-call-standup");
        assert_eq!(pattern, RoomPattern::WorkspaceChannel);
        assert_eq!(
            room,
            RoomRef::WorkspaceChannel(WorkspaceChannel {
                code: "workspace-9-call-standup",
                workspace_segment: "9",
                title: "standup".to_string(),
            })
        );
    }

    #[test]
    fn test_workspace_channel_multi_word_title() {
        let (_, room) = classify_ok("workspace-12-call-weekly-design-review");
        match room {
            RoomRef::WorkspaceChannel(channel) => {
                assert_eq!(channel.title, "weekly design review");
                assert_eq!(channel.workspace_id().unwrap(), 12);
            }
            other => panic!("expected workspace channel, got {:?}", other),
        }
    }

    #[test]
    fn test_workspace_channel_defers_workspace_id_parsing() {
        // Classification succeeds; the bad segment only matters on creation
        let (pattern, room) = classify_ok("workspace-abc-call-standup");
        assert_eq!(pattern, RoomPattern::WorkspaceChannel);
        match room {
            RoomRef::WorkspaceChannel(channel) => {
                assert!(matches!(
                    channel.workspace_id(),
                    Err(PollError::InvalidFormat(_))
                ));
            }
            other => panic!("expected workspace channel, got {:?}", other),
        }
    }

    #[test]
    fn test_workspace_without_call_segment_is_code() {
        assert_eq!(
            classify_ok("workspace-9-chat-general"),
            (RoomPattern::Code, RoomRef::Code("workspace-9-chat-general"))
        );
    }

    #[test]
    fn test_workspace_too_few_segments_is_code() {
        assert_eq!(
            classify_ok("workspace-9-call"),
            (RoomPattern::Code, RoomRef::Code("workspace-9-call"))
        );
    }

    #[test]
    fn test_other_names_are_codes() {
        assert_eq!(
            classify_ok("abc-defg-hij"),
            (RoomPattern::Code, RoomRef::Code("abc-defg-hij"))
        );
        assert_eq!(classify_ok(""), (RoomPattern::Code, RoomRef::Code("")));
    }

    #[test]
    fn test_matcher_order_is_fixed() {
        let order: Vec<RoomPattern> = MATCHERS.iter().map(|(p, _)| *p).collect();
        assert_eq!(
            order,
            vec![
                RoomPattern::PrefixedNumeric,
                RoomPattern::BareNumeric,
                RoomPattern::WorkspaceChannel,
                RoomPattern::Code,
            ]
        );
    }

    #[test]
    fn test_new_meeting_for_channel() {
        let channel = WorkspaceChannel {
            code: "workspace-9-call-standup",
            workspace_segment: "9",
            title: "standup".to_string(),
        };

        let meeting = channel.new_meeting(9, ParticipantId(3));

        assert_eq!(meeting.workspace_id, Some(9));
        assert_eq!(meeting.host_id, ParticipantId(3));
        assert_eq!(meeting.title, "standup");
        assert_eq!(meeting.code, "workspace-9-call-standup");
        assert_eq!(meeting.meeting_type, MeetingType::WorkspaceChannel);
        assert_eq!(meeting.status, MeetingStatus::AlwaysOpen);
    }

    #[test]
    fn test_pattern_labels() {
        assert_eq!(RoomPattern::PrefixedNumeric.as_str(), "prefixed_numeric");
        assert_eq!(RoomPattern::BareNumeric.as_str(), "bare_numeric");
        assert_eq!(RoomPattern::WorkspaceChannel.as_str(), "workspace_channel");
        assert_eq!(RoomPattern::Code.as_str(), "code");
    }
}

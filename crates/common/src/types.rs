//! Identifier types for Live Polls components.
//!
//! All identifiers are database-assigned 64-bit integers. The newtypes keep
//! a poll ID from being passed where an option ID is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

macro_rules! int_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw integer value.
            #[must_use]
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse::<i64>().map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

int_id!(
    /// Durable identifier of a meeting record
    MeetingId
);

int_id!(
    /// Identifier of a poll
    PollId
);

int_id!(
    /// Identifier of a poll option
    OptionId
);

int_id!(
    /// Verified identity of a participant, supplied by the upstream
    /// authentication layer
    ParticipantId
);

impl ParticipantId {
    /// Identity used when no participant has been authenticated.
    pub const UNSET: ParticipantId = ParticipantId(0);

    /// Whether this is the zero/unset identity.
    #[must_use]
    pub fn is_unset(self) -> bool {
        self.0 == 0
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::UNSET
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: MeetingId = "42".parse().unwrap();
        assert_eq!(id, MeetingId(42));
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!("abc".parse::<PollId>().is_err());
        assert!("".parse::<OptionId>().is_err());
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&OptionId(7)).unwrap();
        assert_eq!(json, "7");

        let parsed: PollId = serde_json::from_str("13").unwrap();
        assert_eq!(parsed, PollId(13));
    }

    #[test]
    fn test_unset_participant() {
        assert!(ParticipantId::UNSET.is_unset());
        assert!(ParticipantId::default().is_unset());
        assert!(!ParticipantId(3).is_unset());
    }
}

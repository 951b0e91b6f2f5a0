//! Repository layer for the poll service.
//!
//! Provides database access following the Handler -> Service -> Repository
//! architecture. All queries use parameterized statements.

pub mod get_or_create;
pub mod meetings;
pub mod poll_votes;
pub mod polls;

pub use get_or_create::{get_or_create_by_key, KeyedRecord};
pub use meetings::MeetingsRepository;
pub use poll_votes::PollVotesRepository;
pub use polls::PollsRepository;

/// Unique constraint on `poll_votes (poll_id, voter_id)`.
pub const POLL_VOTER_UNIQUE: &str = "poll_votes_poll_voter_unique";

/// Returns true if `err` is a unique violation of the named constraint.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    err.as_database_error().is_some_and(|db_err| {
        db_err.is_unique_violation() && db_err.constraint() == Some(constraint)
    })
}

/// Returns true if `err` is a foreign key violation.
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_foreign_key_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_violations() {
        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err, POLL_VOTER_UNIQUE));
        assert!(!is_foreign_key_violation(&err));
    }
}

//! Database fixtures.
//!
//! Meetings normally come from the scheduling flow, which this service does
//! not own, so tests seed them directly.

use common::types::{MeetingId, OptionId, PollId};
use sqlx::PgPool;

/// Host used for seeded meetings.
pub const SEED_HOST_ID: i64 = 1;

/// Insert a standard meeting with `code` and return its ID.
pub async fn seed_meeting(pool: &PgPool, code: &str) -> Result<MeetingId, anyhow::Error> {
    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO meetings (host_id, title, meeting_code, meeting_type, status)
        VALUES ($1, $2, $3, 'standard', 'scheduled')
        RETURNING meeting_id
        "#,
    )
    .bind(SEED_HOST_ID)
    .bind(format!("Seeded meeting {}", code))
    .bind(code)
    .fetch_one(pool)
    .await?;

    Ok(MeetingId(id))
}

/// Insert a standard meeting with a fixed ID and no code.
pub async fn seed_meeting_with_id(pool: &PgPool, id: i64) -> Result<MeetingId, anyhow::Error> {
    sqlx::query(
        r#"
        INSERT INTO meetings (meeting_id, host_id, title, meeting_type, status)
        VALUES ($1, $2, $3, 'standard', 'scheduled')
        "#,
    )
    .bind(id)
    .bind(SEED_HOST_ID)
    .bind(format!("Seeded meeting {}", id))
    .execute(pool)
    .await?;

    Ok(MeetingId(id))
}

/// Total number of meeting rows.
pub async fn count_meetings(pool: &PgPool) -> Result<i64, anyhow::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meetings")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Number of meeting rows carrying `code`.
pub async fn count_meetings_with_code(pool: &PgPool, code: &str) -> Result<i64, anyhow::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM meetings WHERE meeting_code = $1")
        .bind(code)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Number of vote rows on a poll.
pub async fn count_votes(pool: &PgPool, poll_id: PollId) -> Result<i64, anyhow::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM poll_votes WHERE poll_id = $1")
        .bind(poll_id.get())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Number of vote rows pointing at an option.
pub async fn count_option_votes(pool: &PgPool, option_id: OptionId) -> Result<i64, anyhow::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM poll_votes WHERE option_id = $1")
        .bind(option_id.get())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Stored `vote_count` of an option.
pub async fn option_vote_count(pool: &PgPool, option_id: OptionId) -> Result<i32, anyhow::Error> {
    let count: i32 = sqlx::query_scalar("SELECT vote_count FROM poll_options WHERE option_id = $1")
        .bind(option_id.get())
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Assert every option's `vote_count` equals the vote rows pointing at it.
pub async fn assert_counts_consistent(pool: &PgPool) -> Result<(), anyhow::Error> {
    let mismatches: Vec<(i64, i32, i64)> = sqlx::query_as(
        r#"
        SELECT o.option_id, o.vote_count, COUNT(v.vote_id)
        FROM poll_options o
        LEFT JOIN poll_votes v ON v.option_id = o.option_id
        GROUP BY o.option_id, o.vote_count
        HAVING o.vote_count <> COUNT(v.vote_id)
        "#,
    )
    .fetch_all(pool)
    .await?;

    assert!(
        mismatches.is_empty(),
        "vote_count out of sync with vote rows (option_id, vote_count, rows): {:?}",
        mismatches
    );

    Ok(())
}

//! # Poll Test Utilities
//!
//! Shared test utilities for the poll service.
//!
//! This crate provides:
//! - Server test harness (`TestPollServer` for E2E tests)
//! - Database fixtures for seeding meetings and inspecting votes
//!
//! ## Usage
//!
//! ```rust,ignore
//! use poll_test_utils::*;
//!
//! #[sqlx::test(migrations = "../../migrations")]
//! async fn test_example(pool: PgPool) -> Result<()> {
//!     let meeting = seed_meeting(&pool, "abc-defg-hij").await?;
//!     let server = TestPollServer::spawn(pool).await?;
//!
//!     let response = server
//!         .post_as(7, "/api/v1/polls")
//!         .json(&serde_json::json!({
//!             "room_name": "abc-defg-hij",
//!             "question": "Lunch?",
//!             "options": ["Pizza", "Sushi"],
//!         }))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 201);
//!     Ok(())
//! }
//! ```

pub mod fixtures;
pub mod server_harness;

pub use fixtures::*;
pub use server_harness::*;

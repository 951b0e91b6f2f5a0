//! Service layer for the poll service.
//!
//! # Components
//!
//! - `meeting_resolver` - Room name to meeting ID resolution with lazy
//!   creation of workspace-channel meetings
//! - `polls` - Poll creation and listing
//! - `vote_engine` - Single-vote enforcement and atomic counting
//! - `poll_lifecycle` - Closing polls

pub mod meeting_resolver;
pub mod poll_lifecycle;
pub mod polls;
pub mod vote_engine;

pub use meeting_resolver::MeetingResolver;
pub use poll_lifecycle::PollLifecycle;
pub use polls::PollService;
pub use vote_engine::VoteEngine;

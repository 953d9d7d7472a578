// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `taskpoll` Core
//!
//! Core types and pure logic for talking to a submit-then-poll task API.
//! Nothing in this crate performs IO.
//!
//! - Domain models (messages, tasks, cadences, retry policy, completions)
//! - The wire-schema adapter that normalizes every observed response shape
//! - The status classifier and its rule tables
//! - The completion assembler
//!
//! ## Key Types
//!
//! ### Requests
//! - [`ChatMessage`] / [`Role`] - Conversation input
//! - [`ModelKind`] - Model name to remote `type` code
//!
//! ### Tasks
//! - [`Task`], [`TaskId`], [`TaskKind`] - A submitted remote task
//! - [`PollCadence`] - Initial delay, interval, and attempt budget per kind
//! - [`RetryPolicy`] - Outer backoff policy for rate-limited cycles
//!
//! ### Results
//! - [`PollSnapshot`] - Schema-independent poll response
//! - [`PollOutcome`] / [`PollStatus`] - Classification of one poll
//! - [`Completion`] - Final result handed to callers

pub mod assemble;
pub mod classify;
pub mod error;
pub mod models;
pub mod schema;

pub use error::CoreError;

pub use models::{
    // Requests
    flatten_messages,
    ChatMessage,
    ModelKind,
    Role,
    // Tasks
    PollCadence,
    RetryPolicy,
    Task,
    TaskId,
    TaskKind,
    // Results
    is_valid_answer,
    Completion,
    FailureKind,
    PollOutcome,
    PollStatus,
};

pub use assemble::assemble;
pub use classify::{classify, is_rate_limit_text};
pub use schema::{PollSnapshot, SubmitAck, WireSchema};

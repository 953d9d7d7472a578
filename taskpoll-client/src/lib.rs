// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `taskpoll` Client
//!
//! Turns a submit-then-poll remote task API into a single async call.
//!
//! ## Pipeline
//!
//! - [`submitter::TaskSubmitter`] - Validates the request and submits it once
//! - [`poller::ResultPoller`] - Polls at the cadence for the task kind
//! - [`retry::RetryCoordinator`] - Restarts rate-limited poll cycles with backoff
//! - [`client::TaskClient`] - Ties the above together
//!
//! ## Transport
//!
//! - [`api::TaskApi`] - The two remote operations
//! - [`http::HttpTaskApi`] - reqwest implementation
//! - [`testing::ScriptedTaskApi`] - Canned responses for tests
//!
//! ## Example
//!
//! ```ignore
//! use taskpoll_client::{ClientConfig, TaskClient};
//!
//! let client = TaskClient::new(ClientConfig::from_env()?)?;
//! let answer = client.generate("", "Summarize the Rust ownership model").await?;
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod poller;
pub mod retry;
pub mod submitter;
pub mod testing;

// Errors
pub use error::{TaskError, TransportError};

// Configuration
pub use config::{ClientConfig, ConfigFile};

// Transport
pub use api::{SubmitPayload, TaskApi};
pub use http::HttpTaskApi;

// Pipeline
pub use client::{BatchEntry, CompletionHandle, TaskClient, TaskRecord};
pub use poller::ResultPoller;
pub use retry::RetryCoordinator;
pub use submitter::{CompletionRequest, TaskSubmitter};

pub use tokio_util::sync::CancellationToken;

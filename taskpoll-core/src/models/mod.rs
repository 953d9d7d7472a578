//! Domain models for `taskpoll`.
//!
//! ## Submodules
//!
//! - [`message`] - Chat messages and prompt flattening
//! - [`task`] - Task identity, task kind, model selection
//! - [`policy`] - Poll cadence and outer retry policy
//! - [`outcome`] - Classified poll results
//! - [`completion`] - The caller-facing completion

mod completion;
mod message;
mod outcome;
mod policy;
mod task;

pub use completion::{Completion, FINISH_REASON_STOP};
pub use message::{flatten_messages, ChatMessage, Role};
pub use outcome::{is_valid_answer, FailureKind, PollOutcome, PollStatus, MIN_ANSWER_CHARS};
pub use policy::{PollCadence, RetryPolicy};
pub use task::{ModelKind, Task, TaskId, TaskKind};

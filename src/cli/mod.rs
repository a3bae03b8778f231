//! CLI commands
//!
//! Command implementations for the `truetrace` binary.

mod context;
mod history;
mod progress;
mod queue;
pub mod style;
mod submit;
mod sync;
mod watch;

pub use context::{Context, GlobalOptions};
pub use history::run_history;
pub use queue::run_queue;
pub use submit::{SubmitOptions, run_submit};
pub use sync::run_sync;
pub use watch::run_watch;

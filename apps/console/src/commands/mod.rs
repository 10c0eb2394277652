//! Subcommand handlers.
//!
//! Each module owns the clap arguments for its commands and a handler that
//! drives the `libris_client` view models, then renders the result.

pub mod auth;
pub mod books;
pub mod config;
pub mod loans;
pub mod members;
pub mod reports;

/// How a command finished once its output is printed.
///
/// A failed workflow has already shown its error notice, so the caller only
/// sets the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Failed,
}

impl Outcome {
    pub fn from_notice(notice: &libris_client::views::Notice) -> Self {
        if notice.is_success() {
            Outcome::Done
        } else {
            Outcome::Failed
        }
    }
}

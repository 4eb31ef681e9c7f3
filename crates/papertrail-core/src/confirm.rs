//! Confirmation gate for questionable writes.
//!
//! The interactive stdin prompt lives in the CLI; these policies cover
//! non-interactive contexts and tests.

/// Decides whether a questionable record should still be written.
///
/// Implementations may block (the interactive prompt does); the traversal
/// waits for the answer.
pub trait ConfirmPolicy: Send + Sync {
    fn confirm(&self, question: &str) -> bool;
}

/// Accepts every question. For non-interactive runs that prefer
/// placeholder entries over silent drops.
pub struct AlwaysAccept;

impl ConfirmPolicy for AlwaysAccept {
    fn confirm(&self, _question: &str) -> bool {
        true
    }
}

/// Declines every question.
pub struct AlwaysSkip;

impl ConfirmPolicy for AlwaysSkip {
    fn confirm(&self, _question: &str) -> bool {
        false
    }
}

//! Result types for expiration sweeps

use crate::application::expiration::record_expirer::ExpirationOutcome;
use crate::domain::value_objects::FileId;

/// Tally of one completed sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepResult {
    /// Records selected for expiration
    pub candidates: usize,
    /// Records whose blob and row were both removed
    pub deleted: usize,
    /// Records some other actor had already removed
    pub already_gone: usize,
    /// Records left untouched because their storage key does not parse
    pub skipped_malformed: usize,
    /// Records left in `deleting` for a later sweep to retry
    pub left_deleting: usize,
    /// Failures, one entry per record or scan
    pub errors: Vec<String>,
}

impl SweepResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the sweep completed without any errors.
    ///
    /// Skipped malformed keys are warnings, not errors.
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_deletions(&self) -> bool {
        self.deleted > 0
    }

    /// Fold the outcome of one record into the tally
    pub fn record(&mut self, id: FileId, outcome: ExpirationOutcome) {
        match outcome {
            ExpirationOutcome::Deleted => self.deleted += 1,
            ExpirationOutcome::AlreadyGone => self.already_gone += 1,
            ExpirationOutcome::SkippedMalformedKey(_) => self.skipped_malformed += 1,
            ExpirationOutcome::BlobDeleteFailed(e) => {
                self.left_deleting += 1;
                self.errors
                    .push(format!("file {}: blob delete failed: {}", id, e));
            }
            ExpirationOutcome::MetadataFailed(e) => {
                self.errors
                    .push(format!("file {}: metadata update failed: {}", id, e));
            }
        }
    }
}

/// What a sweep trigger did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepRun {
    Completed(SweepResult),
    /// Another sweep was still running; this trigger did nothing
    SkippedInFlight,
}

impl SweepRun {
    pub fn result(&self) -> Option<&SweepResult> {
        match self {
            SweepRun::Completed(result) => Some(result),
            SweepRun::SkippedInFlight => None,
        }
    }
}

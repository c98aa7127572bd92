use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::application::cache::CacheInvalidator;
use crate::application::expiration::batch_processor::{BatchConfig, BatchProcessor};
use crate::application::expiration::config::SweeperConfig;
use crate::application::expiration::record_expirer::{ExpirationOutcome, RecordExpirer};
use crate::application::expiration::results::{SweepResult, SweepRun};
use crate::application::expiration::scheduler::{PeriodicTaskRunner, SingleFlight};
use crate::application::ports::{
    BlobStore, Clock, FileRepository, RepositoryError, ScanCursor, ScanPage,
};
use crate::application::timeouts::{bounded, StoreTimeouts};
use crate::domain::entities::FileRecord;
use crate::domain::value_objects::FileState;

/// Where the sweeper is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweeperPhase {
    Idle,
    Scanning,
    Deleting,
}

/// Periodically expires records older than the retention threshold.
///
/// Each sweep picks up records stuck in `deleting` from earlier runs first,
/// then fills the rest of the batch with expired active records, oldest
/// first. Records whose storage key does not parse are reported and left
/// alone without using up the batch. Only one sweep runs at a time; a trigger that arrives while a sweep
/// is in flight returns [`SweepRun::SkippedInFlight`].
///
/// ```rust,ignore
/// let sweeper = Arc::new(ExpirationSweeper::new(
///     file_repo,
///     blob_store,
///     invalidator,
///     clock,
///     SweeperConfig::default(),
///     StoreTimeouts::default(),
/// ));
///
/// // One sweep, e.g. from a CLI
/// let run = sweeper.sweep_once().await;
///
/// // Or forever
/// tokio::spawn(Arc::clone(&sweeper).run());
/// ```
pub struct ExpirationSweeper {
    file_repo: Arc<dyn FileRepository>,
    expirer: RecordExpirer,
    clock: Arc<dyn Clock>,
    config: SweeperConfig,
    timeouts: StoreTimeouts,
    single_flight: SingleFlight,
    phase: Mutex<SweeperPhase>,
}

impl ExpirationSweeper {
    pub fn new(
        file_repo: Arc<dyn FileRepository>,
        blob_store: Arc<dyn BlobStore>,
        invalidator: CacheInvalidator,
        clock: Arc<dyn Clock>,
        config: SweeperConfig,
        timeouts: StoreTimeouts,
    ) -> Self {
        let expirer = RecordExpirer::new(Arc::clone(&file_repo), blob_store, invalidator, timeouts);

        Self {
            file_repo,
            expirer,
            clock,
            config,
            timeouts,
            single_flight: SingleFlight::new(),
            phase: Mutex::new(SweeperPhase::Idle),
        }
    }

    pub fn config(&self) -> &SweeperConfig {
        &self.config
    }

    pub fn phase(&self) -> SweeperPhase {
        *self.phase.lock()
    }

    /// Sweep on every interval tick until the task is dropped
    pub async fn run(self: Arc<Self>) {
        let runner = PeriodicTaskRunner::new(self.config.interval, "expiration_sweeper");

        runner
            .run(move || {
                let sweeper = Arc::clone(&self);
                async move {
                    sweeper.sweep_once().await;
                }
            })
            .await;
    }

    /// Run one sweep now, unless one is already running
    pub async fn sweep_once(&self) -> SweepRun {
        let Some(_guard) = self.single_flight.try_acquire() else {
            debug!("Sweep already in flight, skipping trigger");
            return SweepRun::SkippedInFlight;
        };

        let started = Instant::now();
        self.set_phase(SweeperPhase::Scanning);

        let threshold = self.config.retention_threshold(self.clock.now());
        let mut result = SweepResult::new();
        let candidates = self.find_candidates(threshold, &mut result).await;
        result.candidates = candidates.len();

        if !candidates.is_empty() {
            self.set_phase(SweeperPhase::Deleting);

            let expirer = self.expirer.clone();
            let processor = move |record: FileRecord| {
                let expirer = expirer.clone();
                async move { expirer.expire(&record).await }
            };
            let batch_config = BatchConfig {
                concurrency: self.config.concurrency,
            };

            let outcomes =
                BatchProcessor::process_concurrent(candidates, &batch_config, processor).await;

            let finished = outcomes.len();
            for outcome in outcomes {
                result.record(outcome.item.id(), outcome.result);
            }
            if finished < result.candidates {
                result.errors.push(format!(
                    "{} expiration tasks aborted",
                    result.candidates - finished
                ));
            }
        }

        self.set_phase(SweeperPhase::Idle);
        log_result(&result, started);

        SweepRun::Completed(result)
    }

    /// Expire one record outside of a sweep
    pub async fn expire_record(&self, record: &FileRecord) -> ExpirationOutcome {
        self.expirer.expire(record).await
    }

    /// Expired `deleting` records first, then expired `active` ones, up to
    /// the batch size. Records with malformed keys are counted and stepped
    /// over so they never take up the batch.
    async fn find_candidates(
        &self,
        threshold: chrono::DateTime<chrono::Utc>,
        result: &mut SweepResult,
    ) -> Vec<FileRecord> {
        let limit = usize::try_from(self.config.batch_size).unwrap_or(0);
        let mut candidates = Vec::new();

        for state in [FileState::Deleting, FileState::Active] {
            if candidates.len() >= limit {
                break;
            }
            self.scan_state(state, threshold, limit, &mut candidates, result)
                .await;
        }

        candidates
    }

    async fn scan_state(
        &self,
        state: FileState,
        threshold: chrono::DateTime<chrono::Utc>,
        limit: usize,
        candidates: &mut Vec<FileRecord>,
        result: &mut SweepResult,
    ) {
        let mut after = None;

        while candidates.len() < limit {
            let page = match self
                .find_older_than(state, threshold, after, self.config.batch_size)
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    result
                        .errors
                        .push(format!("scan of {} records failed: {}", state, e));
                    return;
                }
            };

            for record in page.records {
                if let Err(e) = record.parsed_storage_key() {
                    warn!(
                        file_id = %record.id(),
                        storage_key = %record.storage_key(),
                        error = %e,
                        "Skipping expired record with malformed storage key"
                    );
                    result.skipped_malformed += 1;
                } else if candidates.len() < limit {
                    candidates.push(record);
                }
            }

            match page.next {
                Some(cursor) => after = Some(cursor),
                None => return,
            }
        }
    }

    async fn find_older_than(
        &self,
        state: FileState,
        threshold: chrono::DateTime<chrono::Utc>,
        after: Option<ScanCursor>,
        limit: i64,
    ) -> Result<ScanPage, RepositoryError> {
        bounded(
            self.timeouts.metadata,
            self.file_repo.find_older_than(state, threshold, after, limit),
            RepositoryError::Timeout,
        )
        .await
    }

    fn set_phase(&self, phase: SweeperPhase) {
        *self.phase.lock() = phase;
    }
}

fn log_result(result: &SweepResult, started: Instant) {
    let duration_ms = started.elapsed().as_millis() as u64;

    if result.candidates > 0 || result.skipped_malformed > 0 {
        info!(
            candidates = result.candidates,
            deleted = result.deleted,
            already_gone = result.already_gone,
            skipped_malformed = result.skipped_malformed,
            left_deleting = result.left_deleting,
            duration_ms,
            "Expiration sweep completed"
        );
    } else {
        debug!(duration_ms, "Expiration sweep found nothing to expire");
    }

    for e in &result.errors {
        error!(error = %e, "Expiration sweep error");
    }
}

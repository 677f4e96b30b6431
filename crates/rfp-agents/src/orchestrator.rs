//! Sequential batch runner over the item store.
//!
//! ## Lifecycle
//!
//! ```text
//! BatchOrchestrator::start()
//!   → Idle → Running (atomic guard; a second start gets AlreadyRunning)
//!   → snapshot vendor context + language, fresh hardware lock, fresh token
//!   → for each Pending/Error item, in list order:
//!       cancelled?  → stop
//!       pace (skipped before the first item)
//!       item → Analyzing
//!       analyze with the current hardware lock
//!       first suggested model → hardware lock
//!       cancelled?  → item back to Pending, stop
//!       item → Completed | Error
//!   → Running → Idle, RunReport
//! ```
//!
//! The store mutex is only held for synchronous bookkeeping, never across an
//! `.await`. `cancel()` is cooperative: an in-flight backend call is allowed
//! to finish and its result is discarded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use requirements::{
    ItemId, ItemStatus, ItemStore, Language, RequirementItem, Verdict, VendorContext,
};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::analyzer::RequirementAnalyzer;
use crate::backend::InferenceBackend;
use crate::config::PacingConfig;
use crate::errors::RunError;

// ── Events / Report ──────────────────────────────────────────────────────────

/// Progress notifications published while a run executes.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    RunStarted { total: usize },
    /// `index` is zero-based within the run.
    ItemStarted { id: ItemId, index: usize, total: usize },
    ItemCompleted { id: ItemId, verdict: Verdict },
    ItemFailed { id: ItemId, message: String },
    /// In-flight item returned to `Pending` because the run was cancelled.
    ItemReverted { id: ItemId },
    HardwareLocked { model: String },
    RunFinished(RunReport),
}

/// Summary of one finished (or cancelled) run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Items eligible when the run started.
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    /// Eligible items left untouched or reverted.
    pub skipped: usize,
    pub cancelled: bool,
    pub hardware_lock: Option<String>,
    pub elapsed: Duration,
}

impl RunReport {
    fn empty() -> Self {
        Self {
            total: 0,
            completed: 0,
            failed: 0,
            skipped: 0,
            cancelled: false,
            hardware_lock: None,
            elapsed: Duration::ZERO,
        }
    }
}

// ── Session ──────────────────────────────────────────────────────────────────

/// Per-run state. Dropped when the run ends.
struct RunSession {
    context: VendorContext,
    language: Language,
    ids: Vec<ItemId>,
    hardware_lock: Option<String>,
    cancel: CancellationToken,
}

/// Restores idle state however the run exits, including when the `start()`
/// future is dropped mid-item: the in-flight item goes back to `Pending`.
struct RunGuard<'a> {
    running: &'a AtomicBool,
    cancel: &'a Mutex<Option<CancellationToken>>,
    store: &'a Mutex<ItemStore>,
    in_flight: Option<ItemId>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if let Some(id) = self.in_flight.take() {
            match lock(self.store).update(id, RequirementItem::revert_to_pending) {
                Ok(_) => warn!(item = %id, "Run dropped mid-item, item reverted to pending"),
                Err(e) => error!(item = %id, error = %e, "Failed to revert in-flight item"),
            }
        }
        *lock(self.cancel) = None;
        self.running.store(false, Ordering::Release);
    }
}

/// A poisoned lock still holds consistent data here: every critical section
/// is a single synchronous store update.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── BatchOrchestrator ────────────────────────────────────────────────────────

pub struct BatchOrchestrator<B: ?Sized> {
    analyzer: RequirementAnalyzer<B>,
    pacing: PacingConfig,
    store: Mutex<ItemStore>,
    context: Mutex<VendorContext>,
    language: Mutex<Language>,
    running: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
    hardware_lock: Mutex<Option<String>>,
    events: Option<mpsc::UnboundedSender<RunEvent>>,
}

impl<B> BatchOrchestrator<B>
where
    B: InferenceBackend + ?Sized,
{
    pub fn new(analyzer: RequirementAnalyzer<B>, pacing: PacingConfig) -> Self {
        Self {
            analyzer,
            pacing,
            store: Mutex::new(ItemStore::new()),
            context: Mutex::new(VendorContext::default()),
            language: Mutex::new(Language::default()),
            running: AtomicBool::new(false),
            cancel: Mutex::new(None),
            hardware_lock: Mutex::new(None),
            events: None,
        }
    }

    /// Publish [`RunEvent`]s on `tx`. A dropped receiver is ignored.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<RunEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn with_context(self, context: VendorContext) -> Self {
        self.set_context(context);
        self
    }

    pub fn with_language(self, language: Language) -> Self {
        self.set_language(language);
        self
    }

    fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    // ── Item management ──────────────────────────────────────────────────

    /// Append one `Pending` item per line.
    pub fn add_requirements<I, S>(&self, lines: I) -> Vec<ItemId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = lock(&self.store).add_requirements(lines);
        debug!(added = ids.len(), "Requirements added");
        ids
    }

    /// Remove every item and reset the hardware lock.
    pub fn clear_all(&self) -> Result<(), RunError> {
        if self.is_running() {
            return Err(RunError::AlreadyRunning);
        }
        lock(&self.store).clear();
        *lock(&self.hardware_lock) = None;
        info!("All requirements cleared");
        Ok(())
    }

    /// Takes effect on the next run.
    pub fn set_context(&self, context: VendorContext) {
        *lock(&self.context) = context;
    }

    /// Takes effect on the next run.
    pub fn set_language(&self, language: Language) {
        *lock(&self.language) = language;
    }

    pub fn context(&self) -> VendorContext {
        lock(&self.context).clone()
    }

    pub fn language(&self) -> Language {
        *lock(&self.language)
    }

    /// Snapshot of all items in list order.
    pub fn items(&self) -> Vec<RequirementItem> {
        lock(&self.store).items().to_vec()
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.store).count_status(ItemStatus::Pending)
    }

    pub fn completed_count(&self) -> usize {
        lock(&self.store).count_status(ItemStatus::Completed)
    }

    pub fn error_count(&self) -> usize {
        lock(&self.store).count_status(ItemStatus::Error)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Hardware model locked by the most recent run, if any.
    pub fn hardware_lock(&self) -> Option<String> {
        lock(&self.hardware_lock).clone()
    }

    // ── Run control ──────────────────────────────────────────────────────

    /// Request cancellation of the active run. Returns `false` when idle.
    pub fn cancel(&self) -> bool {
        match lock(&self.cancel).as_ref() {
            Some(token) => {
                info!("Cancellation requested");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Analyze every `Pending`/`Error` item in list order.
    pub async fn start(&self) -> Result<RunReport, RunError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejected start: a run is already in progress");
            return Err(RunError::AlreadyRunning);
        }
        let token = CancellationToken::new();
        *lock(&self.cancel) = Some(token.clone());
        let mut guard = RunGuard {
            running: &self.running,
            cancel: &self.cancel,
            store: &self.store,
            in_flight: None,
        };

        let mut session = RunSession {
            context: self.context(),
            language: self.language(),
            ids: lock(&self.store).eligible_ids(),
            hardware_lock: None,
            cancel: token,
        };
        *lock(&self.hardware_lock) = None;

        if session.ids.is_empty() {
            info!("No pending requirements, nothing to analyze");
            let report = RunReport::empty();
            self.emit(RunEvent::RunFinished(report.clone()));
            return Ok(report);
        }

        self.run_session(&mut session, &mut guard).await
    }

    async fn run_session(
        &self,
        session: &mut RunSession,
        guard: &mut RunGuard<'_>,
    ) -> Result<RunReport, RunError> {
        let started = Instant::now();
        let total = session.ids.len();
        let mut completed = 0;
        let mut failed = 0;
        let mut cancelled = false;

        info!(
            total,
            vendor = session.context.vendor(),
            domain = %session.context.domain(),
            language = %session.language,
            model = self.analyzer.model(),
            "Batch run starting"
        );
        self.emit(RunEvent::RunStarted { total });

        for (index, &id) in session.ids.iter().enumerate() {
            if session.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            if index > 0 && !self.pace(&session.cancel).await {
                cancelled = true;
                break;
            }

            let text = {
                let mut store = lock(&self.store);
                if !store.update(id, RequirementItem::start_analysis)? {
                    continue;
                }
                guard.in_flight = Some(id);
                store.get(id).map(|i| i.text().to_string()).unwrap_or_default()
            };
            debug!(item = %id, index, total, "Analyzing requirement");
            self.emit(RunEvent::ItemStarted { id, index, total });

            let outcome = self
                .analyzer
                .analyze(
                    &text,
                    &session.context,
                    session.language,
                    session.hardware_lock.as_deref(),
                )
                .await;

            if session.hardware_lock.is_none() {
                if let Some(model) = outcome.as_ref().ok().and_then(|r| r.suggested_model.clone()) {
                    info!(item = %id, model = %model, "Hardware model locked for remaining items");
                    session.hardware_lock = Some(model.clone());
                    *lock(&self.hardware_lock) = Some(model.clone());
                    self.emit(RunEvent::HardwareLocked { model });
                }
            }

            if session.cancel.is_cancelled() {
                lock(&self.store).update(id, RequirementItem::revert_to_pending)?;
                guard.in_flight = None;
                warn!(item = %id, "Run cancelled mid-item, result discarded");
                self.emit(RunEvent::ItemReverted { id });
                cancelled = true;
                break;
            }

            match outcome {
                Ok(result) => {
                    let verdict = result.verdict;
                    lock(&self.store).update(id, |item| item.complete(result))?;
                    completed += 1;
                    self.emit(RunEvent::ItemCompleted { id, verdict });
                }
                Err(e) => {
                    error!(item = %id, error = %e, "Requirement analysis failed");
                    let message = e.to_string();
                    lock(&self.store).update(id, |item| item.fail(message.clone()))?;
                    failed += 1;
                    self.emit(RunEvent::ItemFailed { id, message });
                }
            }
            guard.in_flight = None;
        }

        let report = RunReport {
            total,
            completed,
            failed,
            skipped: total - completed - failed,
            cancelled,
            hardware_lock: session.hardware_lock.clone(),
            elapsed: started.elapsed(),
        };
        info!(
            completed = report.completed,
            failed = report.failed,
            skipped = report.skipped,
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Batch run finished"
        );
        self.emit(RunEvent::RunFinished(report.clone()));
        Ok(report)
    }

    /// Sleep the inter-item delay. Returns `false` if cancelled meanwhile.
    async fn pace(&self, cancel: &CancellationToken) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(self.pacing.inter_item_delay()) => true,
            _ = cancel.cancelled() => false,
        }
    }
}

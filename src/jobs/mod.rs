//! Background job control
//!
//! At most one reconciliation or search runs at a time per [`JobControl`].
//! A job receives a [`CancellationToken`] it polls cooperatively, and talks
//! to its consumer only through an event channel and its final result.
//!
//! ```text
//! Idle ──try_begin──▶ Running ──cancel──▶ CancelRequested
//!                        │                      │
//!                        ▼                      ▼
//!                    Completed              Cancelled
//! ```
//!
//! `Completed` and `Cancelled` are resting states: a new job may start from
//! them just as from `Idle`.

pub mod error;

pub use error::JobError;

use crate::index::LibraryIndex;
use crate::library::Library;
use crate::reconcile::{ReconcileError, ReconcileEvent, ReconcileReport, Reconciler};
use crate::search::{SearchEngine, SearchEvent, SearchQuery, SearchSummary};
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// Lifecycle state of a job slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum JobState {
    Idle = 0,
    Running = 1,
    CancelRequested = 2,
    Completed = 3,
    Cancelled = 4,
}

impl JobState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::CancelRequested,
            3 => Self::Completed,
            4 => Self::Cancelled,
            _ => Self::Idle,
        }
    }

    /// Whether a job currently occupies the slot
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::CancelRequested)
    }
}

/// How a job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobOutcome {
    Completed,
    Cancelled,
}

impl JobOutcome {
    #[must_use]
    pub fn from_token(token: &CancellationToken) -> Self {
        if token.is_cancelled() {
            Self::Cancelled
        } else {
            Self::Completed
        }
    }
}

/// Cooperative cancellation flag shared between a job and its controller
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Fail with `JobError::Cancelled` once cancellation was requested
    ///
    /// # Errors
    ///
    /// Returns `JobError::Cancelled` if the token has been cancelled.
    pub fn check(&self) -> Result<(), JobError> {
        if self.is_cancelled() {
            Err(JobError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Default)]
struct ControlInner {
    state: AtomicU8,
    token: Mutex<CancellationToken>,
}

/// Single busy slot enforcing one running job at a time
#[derive(Debug, Clone, Default)]
pub struct JobControl {
    inner: Arc<ControlInner>,
}

impl JobControl {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> JobState {
        JobState::from_u8(self.inner.state.load(Ordering::Acquire))
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.state().is_active()
    }

    /// Claim the slot for a new job with a fresh cancellation token
    ///
    /// # Errors
    ///
    /// Returns `JobError::Busy` if a job is already running.
    pub fn try_begin(&self) -> Result<JobGuard, JobError> {
        // held until the new token is installed so `cancel` never sees Running with the old one
        let mut slot = self.inner.token.lock().unwrap_or_else(PoisonError::into_inner);
        let mut current = self.inner.state.load(Ordering::Acquire);
        loop {
            if JobState::from_u8(current).is_active() {
                return Err(JobError::Busy);
            }
            match self.inner.state.compare_exchange(
                current,
                JobState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        let token = CancellationToken::new();
        *slot = token.clone();
        drop(slot);
        Ok(JobGuard {
            control: self.clone(),
            token,
            finished: false,
        })
    }

    /// Request cancellation of the running job
    ///
    /// Returns `false` when no job is running.
    pub fn cancel(&self) -> bool {
        let slot = self.inner.token.lock().unwrap_or_else(PoisonError::into_inner);
        if self
            .inner
            .state
            .compare_exchange(
                JobState::Running as u8,
                JobState::CancelRequested as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return false;
        }
        slot.cancel();
        true
    }

    fn settle(&self, outcome: JobOutcome) {
        let state = match outcome {
            JobOutcome::Completed => JobState::Completed,
            JobOutcome::Cancelled => JobState::Cancelled,
        };
        self.inner.state.store(state as u8, Ordering::Release);
    }
}

/// Occupancy of a [`JobControl`] slot; releases it when dropped
#[derive(Debug)]
pub struct JobGuard {
    control: JobControl,
    token: CancellationToken,
    finished: bool,
}

impl JobGuard {
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Release the slot with an explicit outcome
    pub fn finish(mut self, outcome: JobOutcome) {
        self.finished = true;
        self.control.settle(outcome);
    }
}

impl Drop for JobGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.control.settle(JobOutcome::from_token(&self.token));
        }
    }
}

/// A job running on its own thread, streaming events of type `E` and
/// producing a result of type `T`
#[derive(Debug)]
pub struct BackgroundJob<T, E> {
    control: JobControl,
    token: CancellationToken,
    events: Receiver<E>,
    handle: JoinHandle<T>,
}

impl<T, E> BackgroundJob<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Start `work` on a named thread
    ///
    /// # Errors
    ///
    /// Returns `JobError::Busy` if the slot is occupied and `JobError::Spawn`
    /// if the thread cannot be created.
    pub fn spawn<F>(control: &JobControl, name: &str, work: F) -> Result<Self, JobError>
    where
        F: FnOnce(&CancellationToken, Sender<E>) -> T + Send + 'static,
    {
        let guard = control.try_begin()?;
        let token = guard.token().clone();
        let (sender, events) = crossbeam_channel::unbounded();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let result = work(guard.token(), sender);
                let outcome = JobOutcome::from_token(guard.token());
                tracing::debug!(?outcome, "job finished");
                guard.finish(outcome);
                result
            })
            .map_err(JobError::Spawn)?;

        Ok(Self {
            control: control.clone(),
            token,
            events,
            handle,
        })
    }

    /// Event stream; ends once the job has finished
    #[must_use]
    pub const fn events(&self) -> &Receiver<E> {
        &self.events
    }

    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Request cancellation of this job
    pub fn cancel(&self) {
        if !self.control.cancel() {
            self.token.cancel();
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the job and take its result
    ///
    /// # Errors
    ///
    /// Returns `JobError::Panicked` if the worker thread panicked.
    pub fn join(self) -> Result<T, JobError> {
        self.handle
            .join()
            .map_err(|payload| JobError::Panicked(panic_message(payload.as_ref())))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Run a search over `index` in the background
///
/// # Errors
///
/// Returns `JobError` if the job cannot be started.
pub fn spawn_search(
    control: &JobControl,
    index: Arc<LibraryIndex>,
    query: SearchQuery,
) -> Result<BackgroundJob<SearchSummary, SearchEvent>, JobError> {
    BackgroundJob::spawn(control, "albumr-search", move |token, mut events| {
        SearchEngine::new(&index).run(&query, token, &mut events)
    })
}

/// Reconcile `library` in the background
///
/// # Errors
///
/// Returns `JobError` if the job cannot be started.
pub fn spawn_reconcile(
    control: &JobControl,
    library: Library,
) -> Result<BackgroundJob<Result<ReconcileReport, ReconcileError>, ReconcileEvent>, JobError> {
    BackgroundJob::spawn(control, "albumr-reconcile", move |token, mut events| {
        Reconciler::new(&library).run(token, &mut events)
    })
}

//! Write coalescing.
//!
//! Every `persist` call either opens a coalescing window or joins the one
//! already open. Joining pushes the window's deadline out by a full window,
//! so a burst of requests spaced closer than the window produces a single
//! flush once the requests stop. Every caller that joined the window
//! receives that flush's outcome.
//!
//! The flush reads the document when it runs, not when `persist` was
//! called, so the last mutation before the window closes wins. Flushes run
//! one at a time, in the order their windows opened.

use crate::error::{ProxyError, ProxyResult};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

type FlushOutcome = Option<ProxyResult<()>>;

#[derive(Debug)]
struct OpenWindow {
    outcome: watch::Receiver<FlushOutcome>,
    closes_at: Instant,
}

#[derive(Debug, Default)]
struct SchedulerState {
    /// The window still accepting requests.
    pending: Option<OpenWindow>,
    /// Outcome of the most recently issued flush, settled or not.
    latest: Option<watch::Receiver<FlushOutcome>>,
    /// Number of flushes started.
    flushes: u64,
}

/// Coalesces bursts of write requests into single flushes.
#[derive(Debug)]
pub struct WriteScheduler {
    window: Duration,
    state: Arc<Mutex<SchedulerState>>,
}

/// A handle on the outcome of one scheduled flush.
#[derive(Debug, Clone)]
#[must_use = "a ticket does nothing unless waited on"]
pub struct FlushTicket {
    outcome: watch::Receiver<FlushOutcome>,
}

impl FlushTicket {
    /// Waits for the flush to finish and returns its outcome.
    ///
    /// # Errors
    ///
    /// Returns the flush's error, or [`ProxyError::FlushAborted`] if the
    /// flush task went away without reporting.
    pub async fn wait(mut self) -> ProxyResult<()> {
        let outcome = match self.outcome.wait_for(Option::is_some).await {
            Ok(settled) => (*settled).clone(),
            Err(_) => None,
        };
        outcome.unwrap_or(Err(ProxyError::FlushAborted))
    }

    /// Returns `true` once the flush has reported an outcome.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.outcome.borrow().is_some()
    }
}

impl WriteScheduler {
    /// Creates a scheduler with the given coalescing window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: Arc::new(Mutex::new(SchedulerState::default())),
        }
    }

    /// Returns the coalescing window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Returns `true` while a coalescing window is open.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    /// Returns the number of flushes started so far.
    #[must_use]
    pub fn flush_count(&self) -> u64 {
        self.state.lock().flushes
    }

    /// Joins the open window, or opens a new one that runs `flush` when it
    /// elapses.
    ///
    /// Joining restarts the window. `flush` is dropped unused when a window
    /// is already open. A new window's flush waits for the previous flush
    /// to settle before it starts.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn schedule<F, Fut>(&self, flush: F) -> FlushTicket
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ProxyResult<()>> + Send + 'static,
    {
        let mut state = self.state.lock();
        let closes_at = Instant::now() + self.window;
        if let Some(open) = &mut state.pending {
            tracing::trace!("joining open flush window");
            open.closes_at = closes_at;
            return FlushTicket {
                outcome: open.outcome.clone(),
            };
        }

        let (tx, rx) = watch::channel(None);
        state.pending = Some(OpenWindow {
            outcome: rx.clone(),
            closes_at,
        });
        let previous = state.latest.replace(rx.clone());
        drop(state);

        let shared = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut deadline = closes_at;
            loop {
                tokio::time::sleep_until(deadline).await;
                let extended = {
                    let mut state = shared.lock();
                    match state.pending.as_ref().map(|open| open.closes_at) {
                        Some(later) if later > deadline => Some(later),
                        _ => {
                            state.pending = None;
                            state.flushes += 1;
                            None
                        }
                    }
                };
                match extended {
                    Some(later) => deadline = later,
                    None => break,
                }
            }
            if let Some(outcome) = previous {
                // Its outcome belongs to its own waiters.
                let _ = FlushTicket { outcome }.wait().await;
            }
            let outcome = flush().await;
            // Nobody listening is fine: the outcome is only informative.
            let _ = tx.send(Some(outcome));
        });

        FlushTicket { outcome: rx }
    }

    /// Waits until the most recently issued flush has settled.
    ///
    /// Returns its outcome, or `Ok(())` if nothing was ever scheduled.
    ///
    /// # Errors
    ///
    /// Returns the outcome of the latest flush if it failed.
    pub async fn settled(&self) -> ProxyResult<()> {
        let latest = self.state.lock().latest.clone();
        match latest {
            Some(outcome) => FlushTicket { outcome }.wait().await,
            None => Ok(()),
        }
    }
}

//! Chat sync engine: forward polling and backward pagination over one view.
//!
//! DESIGN
//! ======
//! One [`ChatSyncEngine`] per chat view. It owns the [`SyncState`], drives a
//! repeating poll task for new items, and pages older history on demand.
//! Both flows merge through [`Renderer`] while holding the render sink's
//! lock, so identity checks and inserts never interleave between flows.
//!
//! LIFECYCLE
//! =========
//! `initialize` activates a new epoch and spawns the poll task; `stop`
//! bumps the epoch and aborts the task. The task holds only a weak
//! reference, so dropping the last engine handle also ends polling.
//! Responses whose epoch is no longer current are discarded.
//!
//! ERROR HANDLING
//! ==============
//! Forward-poll failures are logged and retried on the next tick. A failed
//! older-page fetch raises one error notice; the user retries by scrolling
//! to the top again. No request is ever retried automatically.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::net::api::MessagesApi;
use crate::net::types::{MessageId, NewerQuery, OlderQuery};
use crate::notify::{NoticeLevel, Notifier};
use crate::render::{RenderSink, Renderer};
use crate::state::sync::{SkipReason, SyncState};
use crate::util::throttle::Throttle;

/// Render sink shared between the engine and its host.
pub type SharedSink = Arc<tokio::sync::Mutex<dyn RenderSink>>;

const OLDER_FAILED_NOTICE: &str = "Failed to load older messages";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineOptions {
    pub poll_interval: Duration,
    pub scroll_throttle: Duration,
    /// Session username; matching authors render as own messages.
    pub identity: Option<String>,
}

impl From<&SyncConfig> for EngineOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            scroll_throttle: config.scroll_throttle,
            identity: config.username.clone(),
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

/// Result of one forward poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    Skipped(SkipReason),
    /// No new items; state unchanged.
    Empty,
    Merged { rendered: usize, cursor: MessageId },
    /// Transport or parse failure; logged only.
    Failed,
    /// The response arrived after teardown or re-initialization.
    Stale,
}

/// Result of one backward-pagination attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OlderOutcome {
    Skipped(SkipReason),
    Merged { rendered: usize, has_more: bool },
    /// Empty page; no further older fetches this session.
    Exhausted,
    /// Transport or parse failure; the user was notified.
    Failed,
    Stale,
}

#[derive(Clone)]
pub struct ChatSyncEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    api: Arc<dyn MessagesApi>,
    sink: SharedSink,
    notifier: Arc<dyn Notifier>,
    renderer: Renderer,
    poll_interval: Duration,
    state: Mutex<SyncState>,
    scroll_gate: Mutex<Throttle>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl ChatSyncEngine {
    #[must_use]
    pub fn new(
        api: Arc<dyn MessagesApi>,
        sink: SharedSink,
        notifier: Arc<dyn Notifier>,
        options: EngineOptions,
    ) -> Self {
        let inner = EngineInner {
            api,
            sink,
            notifier,
            renderer: Renderer::new(options.identity),
            poll_interval: options.poll_interval,
            state: Mutex::new(SyncState::new()),
            scroll_gate: Mutex::new(Throttle::new(options.scroll_throttle)),
            poll_task: Mutex::new(None),
        };
        Self { inner: Arc::new(inner) }
    }

    /// Start syncing from `initial_cursor` (0 for an empty chat) and spawn the poll task.
    ///
    /// Calling again restarts the session; responses to the previous session are dropped.
    /// If the render sink is detached, logs and does nothing.
    pub async fn initialize(&self, initial_cursor: MessageId) {
        if !self.inner.sink.lock().await.is_attached() {
            warn!("chat view is not attached; sync not started");
            return;
        }

        let epoch = self.inner.lock_state().activate(initial_cursor);
        let handle = spawn_poll_loop(Arc::downgrade(&self.inner), self.inner.poll_interval, epoch);
        if let Some(previous) = self.inner.lock_poll_task().replace(handle) {
            previous.abort();
        }

        info!(
            initial_cursor,
            epoch,
            interval_ms = u64::try_from(self.inner.poll_interval.as_millis()).unwrap_or(u64::MAX),
            "chat sync started"
        );
    }

    /// Cancel the poll task and invalidate in-flight responses.
    pub fn stop(&self) {
        self.inner.lock_state().deactivate();
        if let Some(handle) = self.inner.lock_poll_task().take() {
            handle.abort();
            info!("chat sync stopped");
        }
    }

    /// Fetch items newer than the cursor and append them.
    pub async fn poll_forward(&self) -> PollOutcome {
        self.inner.poll_forward().await
    }

    /// Fetch the next page of older items and insert it above the current view.
    pub async fn load_older(&self) -> OlderOutcome {
        self.inner.load_older().await
    }

    /// Scroll hook: loads older items when the view sits at the very top.
    ///
    /// Throttled; returns `None` when nothing was attempted.
    pub async fn handle_scroll(&self) -> Option<OlderOutcome> {
        let at_top = {
            let sink = self.inner.sink.lock().await;
            sink.is_attached() && sink.scroll_metrics().offset == 0
        };
        if !at_top {
            return None;
        }
        {
            let state = self.inner.lock_state();
            if !state.is_active() || state.is_loading_older() || !state.has_more_older() {
                return None;
            }
        }
        if !self.inner.lock_scroll_gate().try_fire() {
            debug!("scroll event throttled");
            return None;
        }
        Some(self.load_older().await)
    }

    /// Cursor implied by the view's content: the bottom-most message id, or 0.
    pub async fn initial_cursor(&self) -> MessageId {
        self.inner.sink.lock().await.last_message_id().unwrap_or(0)
    }

    /// Copy of the current sync state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        self.inner.lock_state().clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner
            .lock_poll_task()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl EngineInner {
    fn lock_state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_scroll_gate(&self) -> MutexGuard<'_, Throttle> {
        self.scroll_gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_poll_task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.poll_task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn poll_forward(&self) -> PollOutcome {
        let ticket = match self.lock_state().begin_forward() {
            Ok(ticket) => ticket,
            Err(reason) => {
                debug!(?reason, "forward poll skipped");
                return PollOutcome::Skipped(reason);
            }
        };

        let result = self.api.fetch_newer(NewerQuery { after: ticket.after }).await;

        let mut sink = self.sink.lock().await;
        let mut state = self.lock_state();
        state.finish_forward(ticket);
        if !state.is_current(ticket.epoch) || !sink.is_attached() {
            debug!(epoch = ticket.epoch, "discarding stale forward page");
            return PollOutcome::Stale;
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), after = ticket.after, "forward poll failed");
                return PollOutcome::Failed;
            }
        };
        if page.items.is_empty() {
            return PollOutcome::Empty;
        }

        let rendered = self.renderer.append_page(&mut *sink, &page.items);

        if page.cursor.is_none() {
            warn!(after = ticket.after, "forward page missing cursor; deriving it from the batch");
        }
        if let Some(cursor) = page.effective_cursor() {
            state.advance_cursor(cursor);
        }
        if rendered > 0 {
            sink.scroll_to_bottom();
        }

        PollOutcome::Merged { rendered, cursor: state.last_message_id() }
    }

    async fn load_older(&self) -> OlderOutcome {
        let (ticket, before) = {
            let sink = self.sink.lock().await;
            if !sink.is_attached() {
                return OlderOutcome::Skipped(SkipReason::Inactive);
            }
            let ticket = match self.lock_state().begin_older() {
                Ok(ticket) => ticket,
                Err(reason) => {
                    debug!(?reason, "older page skipped");
                    return OlderOutcome::Skipped(reason);
                }
            };
            (ticket, sink.first_message_id())
        };

        let result = self.api.fetch_older(OlderQuery { page: ticket.page, before }).await;

        let mut sink = self.sink.lock().await;
        let mut state = self.lock_state();
        state.finish_older(ticket);
        if !state.is_current(ticket.epoch) || !sink.is_attached() {
            debug!(epoch = ticket.epoch, "discarding stale older page");
            return OlderOutcome::Stale;
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!(error = %e, code = e.error_code(), page = ticket.page, "older page failed");
                self.notifier.notify(NoticeLevel::Error, OLDER_FAILED_NOTICE);
                return OlderOutcome::Failed;
            }
        };
        if page.items.is_empty() {
            state.exhaust_older();
            info!(page = ticket.page, "chat history exhausted");
            return OlderOutcome::Exhausted;
        }

        let before_metrics = sink.scroll_metrics();
        let rendered = self.renderer.prepend_page(&mut *sink, &page.items);
        let grown = sink
            .scroll_metrics()
            .content_height
            .saturating_sub(before_metrics.content_height);
        sink.set_scroll_offset(before_metrics.offset.saturating_add(grown));

        state.record_older_page(page.has_more);
        OlderOutcome::Merged { rendered, has_more: state.has_more_older() }
    }
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        let task = self.poll_task.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }
}

fn spawn_poll_loop(inner: Weak<EngineInner>, period: Duration, epoch: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let Some(engine) = inner.upgrade() else {
                break;
            };
            if !engine.lock_state().is_current(epoch) {
                break;
            }
            let outcome = engine.poll_forward().await;
            debug!(?outcome, "forward poll tick");
        }
    })
}

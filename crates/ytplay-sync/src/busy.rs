//! Busy indicator driver.
//!
//! [`BusyIndicator::begin`] hands out a [`BusyGuard`]; the period ends when
//! the last guard is dropped. While a period is open two tasks run: the
//! placeholder rotation and the progress poll. Both stop when the period's
//! cancellation token fires.

use std::sync::Arc;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use ytplay_core::busy::BusyTransition;

use crate::config::ClientConfig;
use crate::events::ClientEvent;
use crate::progress::ProgressConsumer;
use crate::state::Shared;
use crate::transport::HttpBackend;

pub struct BusyIndicator<B> {
    shared: Shared,
    progress: ProgressConsumer<B>,
    config: Arc<ClientConfig>,
}

impl<B> Clone for BusyIndicator<B> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            progress: self.progress.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B: HttpBackend> BusyIndicator<B> {
    pub fn new(shared: Shared, progress: ProgressConsumer<B>, config: Arc<ClientConfig>) -> Self {
        Self {
            shared,
            progress,
            config,
        }
    }

    /// Open a long operation. Must be called from within a tokio runtime.
    pub fn begin(&self, message: Option<&str>) -> BusyGuard {
        let mut state = self.shared.lock();
        if let BusyTransition::Activated { epoch } = state.busy.begin(message) {
            let period = CancellationToken::new();
            state.busy_period = Some(period.clone());
            debug!(epoch, "busy period started");
            self.shared.emit(ClientEvent::Busy { active: true });
            self.spawn_rotation(epoch, period.clone());
            self.spawn_progress(epoch, period);
        }
        self.shared.emit(state.busy_message());
        BusyGuard {
            shared: self.shared.clone(),
            armed: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.shared.lock().busy.is_active()
    }

    pub fn count(&self) -> usize {
        self.shared.lock().busy.count()
    }

    fn spawn_rotation(&self, epoch: u64, period: CancellationToken) {
        let shared = self.shared.clone();
        let every = self.config.placeholder_interval;
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = period.cancelled() => break,
                    _ = ticker.tick() => {
                        let mut state = shared.lock();
                        if !state.busy.is_live(epoch) {
                            break;
                        }
                        match state.busy.next_placeholder() {
                            Some(msg) => {
                                trace!(epoch, msg, "placeholder");
                                shared.emit(state.busy_message());
                            }
                            // Suspended by real progress for the rest of the period.
                            None => break,
                        }
                    }
                }
            }
        });
    }

    fn spawn_progress(&self, epoch: u64, period: CancellationToken) {
        let progress = self.progress.clone();
        let every = self.config.progress_poll_interval;
        tokio::spawn(async move {
            if let Err(e) = progress.poll_period(epoch, true, &period).await {
                debug!(epoch, error = %e, "progress resync failed");
            }
            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = period.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = progress.poll_period(epoch, false, &period).await {
                            debug!(epoch, error = %e, "progress poll failed");
                        }
                    }
                }
            }
            debug!(epoch, "progress poll stopped");
        });
    }
}

/// Keeps the busy indicator visible until dropped or [`end`](Self::end)ed.
#[must_use = "the busy period ends when the guard is dropped"]
pub struct BusyGuard {
    shared: Shared,
    armed: bool,
}

impl BusyGuard {
    pub fn end(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !std::mem::replace(&mut self.armed, false) {
            return;
        }
        let mut state = self.shared.lock();
        if state.busy.end() == BusyTransition::Deactivated {
            if let Some(period) = state.busy_period.take() {
                period.cancel();
            }
            debug!(epoch = state.busy.epoch(), "busy period ended");
            self.shared.emit(ClientEvent::Busy { active: false });
            self.shared.emit(state.busy_message());
        }
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.release();
    }
}

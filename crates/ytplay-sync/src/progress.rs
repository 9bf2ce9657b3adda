//! Progress stream consumer: polls the daemon's incremental log while the
//! busy indicator is active and feeds new lines into its history.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use ytplay_core::busy::ProgressApply;
use ytplay_core::progress::ProgressBatch;

use crate::config::ClientConfig;
use crate::error::RequestError;
use crate::state::Shared;
use crate::transport::{Endpoint, HttpBackend, QueryParams, Transport};

pub struct ProgressConsumer<B> {
    shared: Shared,
    transport: Transport<B>,
    config: Arc<ClientConfig>,
}

impl<B> Clone for ProgressConsumer<B> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            transport: self.transport.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B: HttpBackend> ProgressConsumer<B> {
    pub fn new(shared: Shared, transport: Transport<B>, config: Arc<ClientConfig>) -> Self {
        Self {
            shared,
            transport,
            config,
        }
    }

    /// Poll once for the current busy period.
    ///
    /// With `reset`, the server's latest id is adopted and nothing is shown.
    /// Outside a busy period this returns [`ProgressApply::Stale`] without a
    /// request.
    pub async fn poll(&self, reset: bool) -> Result<ProgressApply, RequestError> {
        let period = {
            let state = self.shared.lock();
            match (&state.busy_period, state.busy.is_active()) {
                (Some(token), true) => Some((state.busy.epoch(), token.clone())),
                _ => None,
            }
        };
        match period {
            Some((epoch, token)) => self.poll_period(epoch, reset, &token).await,
            None => Ok(ProgressApply::Stale),
        }
    }

    /// Poll on behalf of busy period `epoch`. The request is dropped when
    /// `period` is cancelled; a response for an ended period is ignored.
    pub(crate) async fn poll_period(
        &self,
        epoch: u64,
        reset: bool,
        period: &CancellationToken,
    ) -> Result<ProgressApply, RequestError> {
        let batch: ProgressBatch = self
            .transport
            .fetch(
                &Endpoint::Progress,
                &QueryParams::new(),
                self.config.progress_timeout,
                Some(period),
            )
            .await?;

        let mut state = self.shared.lock();
        if reset {
            let live = state.busy.resync_progress(epoch, &batch);
            debug!(epoch, live, cursor = ?state.busy.cursor().last_id(), "progress cursor resynced");
            return Ok(if live {
                ProgressApply::Nothing
            } else {
                ProgressApply::Stale
            });
        }

        let applied = state.busy.apply_progress(epoch, &batch);
        if let ProgressApply::Rendered {
            count,
            suspended_placeholders,
        } = applied
        {
            if suspended_placeholders {
                debug!(epoch, "first progress line, placeholder rotation suspended");
            }
            debug!(epoch, count, "progress lines rendered");
            self.shared.emit(state.busy_message());
        }
        Ok(applied)
    }
}

//! Paginated table loader over the shared [`PageCache`](ytplay_core::pagination::PageCache).

use std::sync::Arc;

use tracing::debug;

use ytplay_core::pagination::{PageKey, PageView, ResourceList, RetryRequest, TablePage};

use crate::config::ClientConfig;
use crate::error::RequestError;
use crate::events::ClientEvent;
use crate::state::Shared;
use crate::transport::{Endpoint, HttpBackend, QueryParams, Transport};

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Served from the cache without a request.
    Cached(PageView),
    Fetched(PageView),
    /// A newer load for the same resource was issued; this result was dropped.
    Stale,
    Failed {
        error: RequestError,
        retry: RetryRequest,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TablesOutcome {
    Loaded(Vec<String>),
    /// Already loaded or a load is in flight.
    Skipped,
    Failed(RequestError),
}

pub struct PageLoader<B> {
    shared: Shared,
    transport: Transport<B>,
    config: Arc<ClientConfig>,
}

impl<B> Clone for PageLoader<B> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            transport: self.transport.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<B: HttpBackend> PageLoader<B> {
    pub fn new(shared: Shared, transport: Transport<B>, config: Arc<ClientConfig>) -> Self {
        Self {
            shared,
            transport,
            config,
        }
    }

    /// Load one page of `resource` with the configured page size. Without
    /// `refresh`, a cached page is served directly.
    pub async fn load(&self, resource: &str, offset: u64, refresh: bool) -> PageOutcome {
        let limit = self.config.page_size;
        self.load_with_limit(resource, offset, limit, refresh).await
    }

    /// Load `limit` rows of `resource` starting at `offset`.
    ///
    /// Pages are cached per `(resource, offset, limit)`; a limit of zero is
    /// raised to one.
    pub async fn load_with_limit(
        &self,
        resource: &str,
        offset: u64,
        limit: u64,
        refresh: bool,
    ) -> PageOutcome {
        let key = PageKey::new(resource, offset, limit);
        let seq = {
            let mut state = self.shared.lock();
            if !refresh {
                if let Some(view) = state.pages.serve_cached(&key) {
                    self.shared.emit(ClientEvent::Page(view.clone()));
                    return PageOutcome::Cached(view);
                }
            }
            let seq = state.pages.begin_fetch(resource);
            self.shared.emit(ClientEvent::PageLoading {
                resource: resource.to_string(),
                controls: state.pages.loading_controls(&key),
            });
            seq
        };

        let params = QueryParams::new()
            .with("limit", key.limit)
            .with("offset", key.offset);
        let result: Result<TablePage, RequestError> = self
            .transport
            .fetch(
                &Endpoint::TableRows(resource.to_string()),
                &params,
                self.config.control_timeout,
                None,
            )
            .await;

        let mut state = self.shared.lock();
        match result {
            Ok(page) => match state.pages.complete(&key, seq, page) {
                Some(view) => {
                    self.shared.emit(ClientEvent::Page(view.clone()));
                    PageOutcome::Fetched(view)
                }
                None => {
                    debug!(resource, seq, "stale page dropped");
                    PageOutcome::Stale
                }
            },
            Err(_) if !state.pages.is_current(resource, seq) => {
                debug!(resource, seq, "stale page failure dropped");
                PageOutcome::Stale
            }
            Err(error) => {
                let retry = RetryRequest {
                    resource: resource.to_string(),
                    offset: key.offset,
                    limit: key.limit,
                    refresh: true,
                };
                self.shared.emit(ClientEvent::PageFailed {
                    resource: resource.to_string(),
                    message: error.to_string(),
                    controls: state.pages.failed_controls(&key),
                    retry: retry.clone(),
                });
                PageOutcome::Failed { error, retry }
            }
        }
    }

    /// Reload the current page of `resource`, bypassing the cache.
    pub async fn refresh(&self, resource: &str) -> PageOutcome {
        let view = self.shared.lock().pages.view(resource);
        self.load_with_limit(resource, view.offset, view.limit, true)
            .await
    }

    /// Previous page (towards offset 0).
    pub async fn newer(&self, resource: &str) -> PageOutcome {
        let (offset, limit) = {
            let state = self.shared.lock();
            (state.pages.newer_offset(resource), state.pages.view(resource).limit)
        };
        self.load_with_limit(resource, offset, limit, false).await
    }

    /// Next page, or `None` when the known total says there is none.
    pub async fn older(&self, resource: &str) -> Option<PageOutcome> {
        let (offset, limit) = {
            let state = self.shared.lock();
            (state.pages.older_offset(resource)?, state.pages.view(resource).limit)
        };
        Some(self.load_with_limit(resource, offset, limit, false).await)
    }

    pub async fn retry(&self, request: &RetryRequest) -> PageOutcome {
        self.load_with_limit(
            &request.resource,
            request.offset,
            request.limit,
            request.refresh,
        )
        .await
    }

    /// Store a column width for `resource`; returns the clamped width.
    pub fn resize_column(&self, resource: &str, column: &str, width: u32) -> u32 {
        self.shared
            .lock()
            .pages
            .set_column_width(resource, column, width)
    }

    /// Load the table list once. `force` reloads after a failure or to refresh.
    pub async fn load_tables(&self, force: bool) -> TablesOutcome {
        {
            let mut state = self.shared.lock();
            if state.tables.loading || (state.tables.loaded && !force) {
                return TablesOutcome::Skipped;
            }
            state.tables.loading = true;
            self.shared.emit(ClientEvent::TablesLoading);
        }
        let loading = TablesLoading {
            shared: self.shared.clone(),
        };

        let result: Result<ResourceList, RequestError> = self
            .transport
            .fetch(
                &Endpoint::Tables,
                &QueryParams::new(),
                self.config.control_timeout,
                None,
            )
            .await;
        drop(loading);

        let mut state = self.shared.lock();
        match result {
            Ok(list) => {
                state.tables.loaded = true;
                state.tables.names = list.names.clone();
                self.shared.emit(ClientEvent::Tables(list.names.clone()));
                TablesOutcome::Loaded(list.names)
            }
            Err(error) => {
                self.shared.emit(ClientEvent::TablesFailed {
                    message: error.to_string(),
                });
                TablesOutcome::Failed(error)
            }
        }
    }
}

/// Clears the table-list loading flag however the load ends.
struct TablesLoading {
    shared: Shared,
}

impl Drop for TablesLoading {
    fn drop(&mut self) {
        self.shared.lock().tables.loading = false;
    }
}

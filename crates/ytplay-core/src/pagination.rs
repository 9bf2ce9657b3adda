//! Paginated cache for the table inspection view.
//!
//! Pages are keyed by `(resource, offset, limit)`. Each resource carries its
//! own sequence counter so that a slow, superseded fetch can never overwrite
//! the entry written by a newer one.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Deserializer, Serialize};

use crate::format::{FormattedCell, format_cell};
use crate::generation::KeyedGenerations;

/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Narrowest width a column can be resized to, in pixels.
pub const MIN_COLUMN_WIDTH: u32 = 80;

// ─── Keys & payloads ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageKey {
    pub resource: String,
    pub offset: u64,
    pub limit: u64,
}

impl PageKey {
    pub fn new(resource: impl Into<String>, offset: u64, limit: u64) -> Self {
        Self {
            resource: resource.into(),
            offset,
            limit: limit.max(1),
        }
    }
}

/// One page of rows as returned by the daemon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TablePage {
    #[serde(default)]
    pub rows: Vec<serde_json::Value>,
    #[serde(default)]
    pub columns: Vec<String>,
    /// Total row count; anything non-numeric is treated as unknown.
    #[serde(default, deserialize_with = "lenient_total")]
    pub total: Option<u64>,
}

fn lenient_total<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|v| v.as_u64()))
}

/// Table names returned by the resource list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceList {
    #[serde(default, alias = "tables")]
    pub names: Vec<String>,
}

/// Last pagination window shown for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableView {
    pub offset: u64,
    pub limit: u64,
    pub total: Option<u64>,
}

/// Inline retry affordance for a failed load, scoped to one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryRequest {
    pub resource: String,
    pub offset: u64,
    pub limit: u64,
    pub refresh: bool,
}

// ─── Controls ─────────────────────────────────────────────────────

/// Pagination controls derived on every render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageControls {
    pub page: u64,
    pub pages: Option<u64>,
    pub loading: bool,
    pub refresh_enabled: bool,
    pub prev_enabled: bool,
    pub next_enabled: bool,
    pub status: String,
}

impl PageControls {
    /// Derive controls for a window.
    ///
    /// With an unknown total the "next" control stays enabled and may page
    /// past the end.
    pub fn derive(shown: usize, total: Option<u64>, offset: u64, limit: u64, loading: bool) -> Self {
        let limit = limit.max(1);
        let page = offset / limit + 1;
        let pages = total.map(|t| t.div_ceil(limit).max(1));

        let mut status = if loading {
            "loading...".to_string()
        } else {
            format!("showing {shown} rows | page {page}")
        };
        if let Some(pages) = pages {
            status.push_str(&format!(" of {pages}"));
        }

        let at_end = total.is_some_and(|t| offset + limit >= t);
        Self {
            page,
            pages,
            loading,
            refresh_enabled: !loading,
            prev_enabled: !loading && offset > 0,
            next_enabled: !loading && !at_end,
            status,
        }
    }
}

// ─── Rendered page ────────────────────────────────────────────────

/// Everything the presentation layer needs to draw one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub key: PageKey,
    pub page: TablePage,
    pub controls: PageControls,
    /// Column widths stored for this resource, reapplied on every render.
    pub column_widths: BTreeMap<String, u32>,
    pub from_cache: bool,
}

impl PageView {
    pub fn is_empty(&self) -> bool {
        self.page.rows.is_empty()
    }

    /// Formatted cells, one row per page row, in column order.
    pub fn cells(&self) -> Vec<Vec<FormattedCell>> {
        self.page
            .rows
            .iter()
            .map(|row| {
                self.page
                    .columns
                    .iter()
                    .map(|col| format_cell(row.get(col).unwrap_or(&serde_json::Value::Null)))
                    .collect()
            })
            .collect()
    }
}

// ─── Cache ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PageCache {
    page_size: u64,
    entries: HashMap<PageKey, TablePage>,
    seqs: KeyedGenerations,
    views: HashMap<String, TableView>,
    widths: HashMap<String, HashMap<String, u32>>,
}

impl PageCache {
    pub fn new(page_size: u64) -> Self {
        Self {
            page_size: page_size.max(1),
            entries: HashMap::new(),
            seqs: KeyedGenerations::new(),
            views: HashMap::new(),
            widths: HashMap::new(),
        }
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn key(&self, resource: &str, offset: u64) -> PageKey {
        PageKey::new(resource, offset, self.page_size)
    }

    pub fn get(&self, key: &PageKey) -> Option<&TablePage> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last window shown for `resource` (offset 0 if never shown).
    pub fn view(&self, resource: &str) -> TableView {
        self.views.get(resource).copied().unwrap_or(TableView {
            offset: 0,
            limit: self.page_size,
            total: None,
        })
    }

    /// Serve a cached page, recording it as the resource's current window.
    pub fn serve_cached(&mut self, key: &PageKey) -> Option<PageView> {
        let page = self.entries.get(key)?.clone();
        self.set_view(key, page.total);
        Some(self.render(key, page, true))
    }

    /// Allocate a fresh sequence number before issuing a fetch.
    pub fn begin_fetch(&mut self, resource: &str) -> u64 {
        self.seqs.issue(resource)
    }

    pub fn is_current(&self, resource: &str, seq: u64) -> bool {
        self.seqs.is_current(resource, seq)
    }

    /// Controls shown while a fetch for `key` is in flight.
    pub fn loading_controls(&self, key: &PageKey) -> PageControls {
        let total = self.view(&key.resource).total;
        PageControls::derive(0, total, key.offset, key.limit, true)
    }

    /// Controls shown after a failed fetch.
    pub fn failed_controls(&self, key: &PageKey) -> PageControls {
        let total = self.view(&key.resource).total;
        PageControls::derive(0, total, key.offset, key.limit, false)
    }

    /// Store the result of fetch `seq`. Returns `None` if a newer fetch for
    /// the same resource was issued meanwhile; the cache is left untouched.
    pub fn complete(&mut self, key: &PageKey, seq: u64, page: TablePage) -> Option<PageView> {
        if !self.is_current(&key.resource, seq) {
            return None;
        }
        self.entries.insert(key.clone(), page.clone());
        self.set_view(key, page.total);
        Some(self.render(key, page, false))
    }

    /// Offset of the previous ("newer") page, floored at zero.
    pub fn newer_offset(&self, resource: &str) -> u64 {
        let view = self.view(resource);
        view.offset.saturating_sub(view.limit)
    }

    /// Offset of the next ("older") page, or `None` when the known total says
    /// there is nothing more.
    pub fn older_offset(&self, resource: &str) -> Option<u64> {
        let view = self.view(resource);
        let next = view.offset + view.limit;
        match view.total {
            Some(total) if next >= total => None,
            _ => Some(next),
        }
    }

    /// Record a column resize; returns the stored (clamped) width.
    pub fn set_column_width(&mut self, resource: &str, column: &str, width: u32) -> u32 {
        let width = width.max(MIN_COLUMN_WIDTH);
        self.widths
            .entry(resource.to_string())
            .or_default()
            .insert(column.to_string(), width);
        width
    }

    pub fn column_width(&self, resource: &str, column: &str) -> Option<u32> {
        self.widths.get(resource)?.get(column).copied()
    }

    fn column_widths(&self, resource: &str) -> BTreeMap<String, u32> {
        self.widths
            .get(resource)
            .map(|m| m.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default()
    }

    fn set_view(&mut self, key: &PageKey, total: Option<u64>) {
        self.views.insert(
            key.resource.clone(),
            TableView {
                offset: key.offset,
                limit: key.limit,
                total,
            },
        );
    }

    fn render(&self, key: &PageKey, page: TablePage, from_cache: bool) -> PageView {
        let controls = PageControls::derive(page.rows.len(), page.total, key.offset, key.limit, false);
        PageView {
            key: key.clone(),
            column_widths: self.column_widths(&key.resource),
            page,
            controls,
            from_cache,
        }
    }
}

impl Default for PageCache {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

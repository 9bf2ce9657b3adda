//! `ytplay tables` and `ytplay rows`: database inspection.

use ytplay_sync::pages::{PageOutcome, TablesOutcome};
use ytplay_sync::{Client, ClientConfig};

use crate::cli::RowsOpts;
use crate::render::page_lines;

pub async fn cmd_tables(config: ClientConfig) -> anyhow::Result<i32> {
    let client = Client::connect(config)?;
    match client.pages().load_tables(false).await {
        TablesOutcome::Loaded(names) if names.is_empty() => println!("(empty)"),
        TablesOutcome::Loaded(names) => {
            for name in names {
                println!("{name}");
            }
        }
        TablesOutcome::Skipped => {}
        TablesOutcome::Failed(err) => {
            eprintln!("tables: error: {err}");
            return Ok(1);
        }
    }
    Ok(0)
}

/// Zero-based row offset of a one-based page number.
pub fn page_offset(page: u64, page_size: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(page_size)
}

pub async fn cmd_rows(config: ClientConfig, opts: &RowsOpts) -> anyhow::Result<i32> {
    let limit = opts.limit.unwrap_or(config.page_size).max(1);
    let offset = page_offset(opts.page, limit);
    let client = Client::connect(config)?;
    let outcome = client
        .pages()
        .load_with_limit(&opts.table, offset, limit, opts.refresh)
        .await;
    let view = match outcome {
        PageOutcome::Cached(view) | PageOutcome::Fetched(view) => view,
        PageOutcome::Stale => return Ok(0),
        PageOutcome::Failed { error, retry } => {
            eprintln!(
                "{}: error: {error} (retry: ytplay rows {} --page {} --limit {} --refresh)",
                retry.resource,
                retry.resource,
                retry.offset / retry.limit.max(1) + 1,
                retry.limit
            );
            return Ok(1);
        }
    };
    for line in page_lines(&view) {
        println!("{line}");
    }
    Ok(0)
}

//! Plain-text rendering of view-state snapshots.

use dashboard_core::{
    LockViewState, ModalState, Notification, NotificationLevel, PageLink, TableViewState,
};
use serde_json::Value;
use shared::domain::{DownloadRecord, UploadRecord};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Downloads,
    Uploads,
}

pub fn lock_line(state: &LockViewState) -> String {
    if let Some(error) = &state.error {
        if state.current_message.is_empty() {
            return format!("[lock] {error}");
        }
        return format!("[lock] {} ({error})", state.current_message);
    }
    if state.loading && state.current_message.is_empty() {
        return "[lock] loading...".to_string();
    }
    format!("[lock] {}", state.current_message)
}

pub fn table(state: &TableViewState, kind: TableKind) -> String {
    if state.loading && state.rows.is_empty() {
        return "loading...".to_string();
    }
    if state.error {
        return "error loading data".to_string();
    }

    let mut lines = Vec::with_capacity(state.rows.len() + 2);
    if !state.search.is_empty() {
        lines.push(format!("search: {}", state.search));
    }
    if state.rows.is_empty() {
        lines.push("no results".to_string());
    }
    lines.extend(state.rows.iter().map(|row| table_row(row, kind)));
    lines.push(footer(state));
    lines.join("\n")
}

fn table_row(row: &Value, kind: TableKind) -> String {
    match kind {
        TableKind::Downloads => match serde_json::from_value::<DownloadRecord>(row.clone()) {
            Ok(record) => format!(
                "{:>6}  {:<48}  {:>10}  {}",
                record.id.0,
                record.path,
                record.local_size.as_deref().unwrap_or("-"),
                record
                    .finished
                    .map(|at| at.format(DATE_FORMAT).to_string())
                    .unwrap_or_else(|| "in progress".to_string()),
            ),
            Err(_) => row.to_string(),
        },
        TableKind::Uploads => match serde_json::from_value::<UploadRecord>(row.clone()) {
            Ok(record) => format!(
                "{:>6}  {:<48}  {}",
                record.id.0,
                record.name,
                record
                    .sent
                    .map(|at| at.format(DATE_FORMAT).to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Err(_) => row.to_string(),
        },
    }
}

pub fn footer(state: &TableViewState) -> String {
    let total_pages = state.total_pages();
    if total_pages == 0 {
        return format!("{} results", state.total_count);
    }
    format!(
        "page {}/{}  {}  ({} results)",
        state.page_index,
        total_pages,
        page_strip(state),
        state.total_count
    )
}

pub fn page_strip(state: &TableViewState) -> String {
    state
        .visible_page_window()
        .into_iter()
        .map(|link| match link {
            PageLink::Page(page) if page == state.page_index => format!("[{page}]"),
            PageLink::Page(page) => page.to_string(),
            PageLink::Ellipsis => "...".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn modal(state: &ModalState) -> String {
    let mut out = format!("== {} ==\n{}", state.title, state.body);
    if let Some(url) = &state.target_url {
        out.push_str(&format!("\n-> {} {url}", state.method));
    }
    out
}

pub fn notification(notification: &Notification) -> String {
    let level = match notification.level {
        NotificationLevel::Info => "info",
        NotificationLevel::Success => "success",
        NotificationLevel::Danger => "error",
    };
    match &notification.title {
        Some(title) => format!("[{level}] {title}: {}", notification.message),
        None => format!("[{level}] {}", notification.message),
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;

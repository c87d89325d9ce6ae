use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde_json::Value;
use shared::protocol::{ListEnvelope, PageQuery};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{
    error::FetchError,
    event_bus::EventBus,
    lifecycle::{Lifecycle, MountedTasks},
    pagination::{self, PageLink},
    resource_client::{decode_envelope, ResourceClient, ResourceRequest},
};

pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct TableViewState {
    pub rows: Vec<Value>,
    pub loading: bool,
    pub error: bool,
    pub page_index: u32,
    pub page_size: u32,
    pub offset: u64,
    pub total_count: u64,
    pub search: String,
}

impl TableViewState {
    fn new(page_size: u32) -> Self {
        Self {
            rows: Vec::new(),
            loading: false,
            error: false,
            page_index: 1,
            page_size,
            offset: 0,
            total_count: 0,
            search: String::new(),
        }
    }

    pub fn total_pages(&self) -> u32 {
        pagination::total_pages(self.total_count, self.page_size)
    }

    pub fn visible_page_window(&self) -> Vec<PageLink> {
        pagination::visible_page_window(self.page_index, self.total_pages())
    }

    pub fn page_query(&self) -> PageQuery {
        PageQuery::new(self.page_size, self.offset, &self.search)
    }

    fn move_to(&mut self, page_index: u32) {
        self.page_index = page_index;
        self.offset = pagination::offset_for(page_index, self.page_size);
    }

    /// Pulls a page index left past the last page (after the total shrank or
    /// a load failed) back to the last valid page. Returns whether it moved.
    fn clamp_page_index(&mut self) -> bool {
        let last = self.total_pages().max(1);
        if self.page_index <= last {
            return false;
        }
        self.move_to(last);
        true
    }
}

/// Searchable, paginated view over a list endpoint.
pub struct PaginatedTable {
    url: String,
    client: Arc<dyn ResourceClient>,
    bus: Arc<EventBus>,
    state: watch::Sender<TableViewState>,
    latest_request: AtomicU64,
    lifecycle: Lifecycle,
}

impl PaginatedTable {
    /// A zero `page_size` falls back to [`DEFAULT_PAGE_SIZE`].
    pub fn new(
        url: impl Into<String>,
        page_size: u32,
        client: Arc<dyn ResourceClient>,
        bus: Arc<EventBus>,
    ) -> Arc<Self> {
        let page_size = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };
        let (state, _) = watch::channel(TableViewState::new(page_size));
        Arc::new(Self {
            url: url.into(),
            client,
            bus,
            state,
            latest_request: AtomicU64::new(0),
            lifecycle: Lifecycle::default(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn subscribe(&self) -> watch::Receiver<TableViewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> TableViewState {
        self.state.borrow().clone()
    }

    /// Loads the first page and keeps reloading on every broadcast refresh
    /// until [`PaginatedTable::unmount`].
    pub async fn mount(self: &Arc<Self>) {
        let mut tasks = MountedTasks::default();
        tasks.reload_on_refresh(&self.bus, Arc::downgrade(self), |table: Arc<Self>| async move {
            debug!(url = %table.url, "refresh requested; reloading table");
            table.load().await;
        });
        self.lifecycle.replace(tasks);
        self.load().await;
    }

    pub fn unmount(&self) {
        if self.lifecycle.teardown() {
            debug!(url = %self.url, "table unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.lifecycle.is_mounted()
    }

    /// Fetches the page described by the current search/offset. Responses to
    /// requests superseded by a newer `load` are dropped.
    pub async fn load(&self) {
        let request_id = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = false;
        });
        let query = self.state.borrow().page_query();
        let limit = query.limit as usize;

        let request = ResourceRequest::get(&self.url).with_query(query.to_pairs());
        let result = self.fetch_page(&request).await;

        if self.latest_request.load(Ordering::SeqCst) != request_id {
            debug!(url = %self.url, request_id, "discarding superseded page response");
            return;
        }

        self.state.send_modify(|state| {
            match result {
                Ok(mut envelope) => {
                    if envelope.data.len() > limit {
                        warn!(
                            url = %self.url,
                            limit,
                            received = envelope.data.len(),
                            "backend returned more rows than requested; truncating"
                        );
                        envelope.data.truncate(limit);
                    }
                    state.rows = envelope.data;
                    state.total_count = envelope.data_total;
                    state.error = false;
                }
                Err(err) => {
                    warn!(url = %self.url, error = %err, "failed to load table page");
                    state.error = true;
                    state.rows.clear();
                    state.total_count = 0;
                }
            }
            state.loading = false;
        });
    }

    async fn fetch_page(&self, request: &ResourceRequest) -> Result<ListEnvelope<Value>, FetchError> {
        let body = self.client.fetch_json(request).await?;
        decode_envelope(body)
    }

    pub async fn go_to_next_page(&self) {
        let moved = self.state.send_if_modified(|state| {
            if state.clamp_page_index() {
                return true;
            }
            if state.page_index >= state.total_pages() {
                return false;
            }
            let next = state.page_index + 1;
            state.move_to(next);
            true
        });
        if moved {
            self.load().await;
        }
    }

    pub async fn go_to_previous_page(&self) {
        let moved = self.state.send_if_modified(|state| {
            if state.clamp_page_index() {
                return true;
            }
            if state.page_index <= 1 {
                return false;
            }
            let previous = state.page_index - 1;
            state.move_to(previous);
            true
        });
        if moved {
            self.load().await;
        }
    }

    /// Jumps to `page`. An out-of-range `page` only pulls a stale current
    /// index back into range.
    pub async fn go_to_page(&self, page: u32) {
        let moved = self.state.send_if_modified(|state| {
            if page < 1 || page > state.total_pages() {
                return state.clamp_page_index();
            }
            state.move_to(page);
            true
        });
        if moved {
            self.load().await;
        }
    }

    /// A new search always restarts from the first page.
    pub async fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.state.send_modify(|state| {
            state.search = term;
            state.move_to(1);
        });
        self.load().await;
    }

    pub async fn set_page_size(&self, page_size: u32) {
        if page_size == 0 {
            return;
        }
        self.state.send_modify(|state| {
            state.page_size = page_size;
            state.move_to(1);
        });
        self.load().await;
    }
}

#[cfg(test)]
#[path = "tests/paginated_table_tests.rs"]
mod tests;

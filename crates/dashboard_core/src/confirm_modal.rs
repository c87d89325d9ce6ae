use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    error::FetchError,
    event_bus::EventBus,
    notifier::{Notification, Notifier},
    resource_client::{Method, ResourceClient, ResourceRequest},
};

/// Parameters of [`ConfirmActionModal::open`]. An empty `url` makes the
/// dialog purely informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalRequest {
    pub title: String,
    pub body: String,
    pub url: String,
    pub method: Method,
    pub success_message: String,
}

impl ModalRequest {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            url: String::new(),
            method: Method::POST,
            success_message: String::new(),
        }
    }

    pub fn with_action(mut self, method: Method, url: impl Into<String>) -> Self {
        self.method = method;
        self.url = url.into();
        self
    }

    pub fn with_success_message(mut self, message: impl Into<String>) -> Self {
        self.success_message = message.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalState {
    pub is_open: bool,
    pub title: String,
    pub body: String,
    pub target_url: Option<String>,
    pub method: Method,
    pub success_message: String,
    pub loading: bool,
    pub error: bool,
}

impl Default for ModalState {
    fn default() -> Self {
        Self {
            is_open: false,
            title: String::new(),
            body: String::new(),
            target_url: None,
            method: Method::POST,
            success_message: String::new(),
            loading: false,
            error: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Modal was closed, or a call was already in flight.
    Ignored,
    /// Informational dialog acknowledged; nothing was sent.
    Dismissed,
    /// The dialog was cancelled or replaced before the call returned. The
    /// result was not applied and no refresh was broadcast.
    Superseded,
    Succeeded { status: u16 },
    Failed(FetchError),
}

/// Confirmation dialog guarding a single state-changing call.
pub struct ConfirmActionModal {
    client: Arc<dyn ResourceClient>,
    bus: Arc<EventBus>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<ModalState>,
    /// Bumped by `open` and `cancel`; a call only settles the dialog that
    /// issued it.
    generation: AtomicU64,
}

impl ConfirmActionModal {
    pub fn new(
        client: Arc<dyn ResourceClient>,
        bus: Arc<EventBus>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(ModalState::default());
        Arc::new(Self {
            client,
            bus,
            notifier,
            state,
            generation: AtomicU64::new(0),
        })
    }

    pub fn subscribe(&self) -> watch::Receiver<ModalState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ModalState {
        self.state.borrow().clone()
    }

    pub fn open(&self, request: ModalRequest) {
        debug!(title = %request.title, url = %request.url, "opening confirmation modal");
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.state.send_modify(|state| {
            *state = ModalState {
                is_open: true,
                title: request.title,
                body: request.body,
                target_url: (!request.url.is_empty()).then_some(request.url),
                method: request.method,
                success_message: request.success_message,
                loading: false,
                error: false,
            };
        });
    }

    pub async fn confirm(&self) -> ConfirmOutcome {
        let (generation, target_url, method, success_message) = {
            let state = self.state.borrow();
            if !state.is_open || state.loading {
                return ConfirmOutcome::Ignored;
            }
            (
                self.generation.load(Ordering::SeqCst),
                state.target_url.clone(),
                state.method.clone(),
                state.success_message.clone(),
            )
        };

        let Some(url) = target_url else {
            self.close();
            return ConfirmOutcome::Dismissed;
        };

        self.state.send_modify(|state| {
            state.loading = true;
            state.error = false;
        });

        let request = ResourceRequest::new(method, url);
        let result = self.client.execute(&request).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(
                method = %request.method,
                url = %request.path,
                ok = result.is_ok(),
                "dialog dismissed while the call was in flight; result not applied"
            );
            return ConfirmOutcome::Superseded;
        }

        match result {
            Ok(status) => {
                info!(method = %request.method, url = %request.path, status, "confirmed action succeeded");
                if !success_message.is_empty() {
                    self.notifier.notify(Notification::success(success_message));
                }
                self.bus.publish_refresh();
                self.close();
                ConfirmOutcome::Succeeded { status }
            }
            Err(err) => {
                warn!(method = %request.method, url = %request.path, error = %err, "confirmed action failed");
                self.notifier.notify(Notification::danger(err.to_string()));
                self.state.send_modify(|state| {
                    state.error = true;
                    state.loading = false;
                });
                ConfirmOutcome::Failed(err)
            }
        }
    }

    pub fn close(&self) {
        self.state.send_modify(|state| {
            state.is_open = false;
            state.loading = false;
            state.error = false;
        });
    }

    /// Closes the dialog and detaches any call still in flight from it.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.close();
    }
}

#[cfg(test)]
#[path = "tests/confirm_modal_tests.rs"]
mod tests;

use std::{fmt::Write as _, sync::Arc, time::Duration};

use chrono::format::{Item, StrftimeItems};
use shared::protocol::{ItemEnvelope, LockStatus, Timestamp};
use thiserror::Error;
use tokio::{
    sync::watch,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    error::FetchError,
    event_bus::EventBus,
    lifecycle::{Lifecycle, MountedTasks},
    notifier::{Notification, Notifier},
    resource_client::{decode_envelope, ResourceClient, ResourceRequest},
};

pub const NEVER_LAUNCHED_MESSAGE: &str = "Never launched";
pub const LOAD_ERROR_MESSAGE: &str = "Error loading lock status";
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_NOTIFICATION_TITLE: &str = "Lock status";
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const UNKNOWN_TIMESTAMP: &str = "unknown";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid timestamp format '{0}'")]
pub struct InvalidTimestampFormat(pub String);

/// strftime pattern used to render lock timestamps. Validated on
/// construction so rendering never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampFormat(String);

impl TimestampFormat {
    pub fn new(pattern: impl Into<String>) -> Result<Self, InvalidTimestampFormat> {
        let pattern = pattern.into();
        if StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error)) {
            return Err(InvalidTimestampFormat(pattern));
        }
        Ok(Self(pattern))
    }

    pub fn render(&self, timestamp: Option<&Timestamp>) -> String {
        let Some(timestamp) = timestamp else {
            return UNKNOWN_TIMESTAMP.to_string();
        };
        let mut out = String::new();
        if write!(out, "{}", timestamp.format(&self.0)).is_err() {
            return UNKNOWN_TIMESTAMP.to_string();
        }
        out
    }
}

impl Default for TimestampFormat {
    fn default() -> Self {
        Self(DEFAULT_TIMESTAMP_FORMAT.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub url: String,
    /// Zero disables periodic polling; the initial load still happens.
    pub refresh_interval: Duration,
    pub title: String,
    pub refresh_on_broadcast: bool,
    pub timestamp_format: TimestampFormat,
}

impl PollerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            title: DEFAULT_NOTIFICATION_TITLE.to_string(),
            refresh_on_broadcast: false,
            timestamp_format: TimestampFormat::default(),
        }
    }

    /// Non-positive values disable periodic polling.
    pub fn with_refresh_millis(mut self, refresh_ms: i64) -> Self {
        self.refresh_interval = u64::try_from(refresh_ms)
            .map(Duration::from_millis)
            .unwrap_or(Duration::ZERO);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_refresh_on_broadcast(mut self, enabled: bool) -> Self {
        self.refresh_on_broadcast = enabled;
        self
    }

    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockViewState {
    pub loading: bool,
    pub error: Option<String>,
    pub current_message: String,
    pub previous_message: String,
    pub status: Option<LockStatus>,
}

impl LockViewState {
    /// Installs `message` and returns it when the change must be announced:
    /// only when a non-empty message was already displayed and differs.
    pub fn apply_message(&mut self, message: String) -> Option<String> {
        let announce = !self.current_message.is_empty() && self.current_message != message;
        self.previous_message = std::mem::replace(&mut self.current_message, message);
        announce.then(|| self.current_message.clone())
    }
}

pub fn describe_lock(status: &LockStatus, format: &TimestampFormat) -> String {
    if status.locked {
        format!("In progress since {}", format.render(status.locked_at.as_ref()))
    } else {
        format!("Completed since {}", format.render(status.unlocked_at.as_ref()))
    }
}

/// Polls a lock resource and announces status transitions.
pub struct LockStatusPoller {
    config: PollerConfig,
    client: Arc<dyn ResourceClient>,
    bus: Arc<EventBus>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<LockViewState>,
    lifecycle: Lifecycle,
}

impl LockStatusPoller {
    pub fn new(
        config: PollerConfig,
        client: Arc<dyn ResourceClient>,
        bus: Arc<EventBus>,
        notifier: Arc<dyn Notifier>,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(LockViewState::default());
        Arc::new(Self {
            config,
            client,
            bus,
            notifier,
            state,
            lifecycle: Lifecycle::default(),
        })
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn subscribe(&self) -> watch::Receiver<LockViewState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> LockViewState {
        self.state.borrow().clone()
    }

    /// Loads once, then polls every `refresh_interval` until
    /// [`LockStatusPoller::unmount`].
    pub async fn mount(self: &Arc<Self>) {
        let mut tasks = MountedTasks::default();
        if self.config.refresh_on_broadcast {
            tasks.reload_on_refresh(&self.bus, Arc::downgrade(self), |poller: Arc<Self>| async move {
                poller.refresh_status().await;
            });
        }

        self.refresh_status().await;

        let period = self.config.refresh_interval;
        if !period.is_zero() {
            let poller = Arc::downgrade(self);
            tasks.push(tokio::spawn(async move {
                let mut ticker = time::interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    let Some(poller) = poller.upgrade() else {
                        break;
                    };
                    poller.refresh_status().await;
                }
            }));
            debug!(url = %self.config.url, ?period, "lock polling scheduled");
        }

        self.lifecycle.replace(tasks);
    }

    pub fn unmount(&self) {
        if self.lifecycle.teardown() {
            debug!(url = %self.config.url, "lock poller unmounted");
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.lifecycle.is_mounted()
    }

    pub async fn refresh_status(&self) {
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });

        let result = self.fetch_status().await;

        let mut announcement = None;
        self.state.send_modify(|state| {
            match result {
                Ok(status) => {
                    let message = match &status {
                        Some(status) => describe_lock(status, &self.config.timestamp_format),
                        None => NEVER_LAUNCHED_MESSAGE.to_string(),
                    };
                    announcement = state.apply_message(message);
                    state.status = status;
                }
                Err(err) => {
                    warn!(url = %self.config.url, error = %err, "failed to load lock status");
                    state.error = Some(LOAD_ERROR_MESSAGE.to_string());
                }
            }
            state.loading = false;
        });

        if let Some(message) = announcement {
            info!(url = %self.config.url, %message, "lock status changed");
            self.notifier
                .notify(Notification::info(message).with_title(self.config.title.clone()));
        }
    }

    async fn fetch_status(&self) -> Result<Option<LockStatus>, FetchError> {
        let request = ResourceRequest::get(&self.config.url);
        match self.client.fetch_json(&request).await {
            Ok(body) => decode_envelope::<ItemEnvelope<LockStatus>>(body).map(|envelope| Some(envelope.data)),
            Err(err) if err.is_absent() => {
                debug!(url = %self.config.url, "lock resource absent");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
#[path = "tests/lock_status_tests.rs"]
mod tests;

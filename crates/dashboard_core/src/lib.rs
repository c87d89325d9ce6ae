//! View-state layer of the seedbox dashboard: paginated tables, the lock
//! status poller and the confirmation modal, wired together by an in-process
//! refresh bus.
//!
//! Each component owns its state inside a `tokio::sync::watch` channel;
//! renderers call `subscribe()` and re-read after every change.

pub mod confirm_modal;
pub mod error;
pub mod event_bus;
mod lifecycle;
pub mod lock_status;
pub mod notifier;
pub mod paginated_table;
pub mod pagination;
pub mod registry;
pub mod resource_client;

pub use confirm_modal::{ConfirmActionModal, ConfirmOutcome, ModalRequest, ModalState};
pub use error::FetchError;
pub use event_bus::{EventBus, RefreshRequested, Subscription};
pub use lock_status::{LockStatusPoller, LockViewState, PollerConfig, TimestampFormat};
pub use notifier::{Notification, NotificationLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use paginated_table::{PaginatedTable, TableViewState};
pub use pagination::PageLink;
pub use registry::{ComponentContext, ComponentHandle, ComponentRegistry, RegistryBuilder, RegistryError};
pub use resource_client::{HttpResourceClient, Method, RawResponse, ResourceClient, ResourceRequest};

#[cfg(test)]
mod test_support;

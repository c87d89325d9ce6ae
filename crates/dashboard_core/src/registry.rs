//! Name → factory registry used by the application bootstrap.
//!
//! The registry is assembled once through [`RegistryBuilder`] and is
//! immutable afterwards. Factories receive the shared [`ComponentContext`]
//! and JSON props, so a dashboard description can be loaded from config.

use std::{collections::BTreeMap, sync::Arc};

use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    confirm_modal::ConfirmActionModal,
    event_bus::EventBus,
    lock_status::{LockStatusPoller, PollerConfig, TimestampFormat, DEFAULT_NOTIFICATION_TITLE},
    notifier::Notifier,
    paginated_table::{PaginatedTable, DEFAULT_PAGE_SIZE},
    resource_client::ResourceClient,
};

pub const PAGINATED_TABLE: &str = "paginated_table";
pub const LOCK_STATUS: &str = "lock_status";
pub const CONFIRM_MODAL: &str = "confirm_modal";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown component '{0}'")]
    UnknownComponent(String),
    #[error("component '{0}' registered twice")]
    Duplicate(String),
    #[error("invalid props for component '{component}': {reason}")]
    InvalidProps { component: String, reason: String },
}

/// Collaborators shared by every component built from the registry.
#[derive(Clone)]
pub struct ComponentContext {
    pub client: Arc<dyn ResourceClient>,
    pub bus: Arc<EventBus>,
    pub notifier: Arc<dyn Notifier>,
    pub timestamp_format: TimestampFormat,
}

/// A built component. Mounting starts its loads/timers, unmounting releases
/// them.
#[derive(Clone)]
pub enum ComponentHandle {
    Table(Arc<PaginatedTable>),
    Lock(Arc<LockStatusPoller>),
    Modal(Arc<ConfirmActionModal>),
}

impl ComponentHandle {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Table(_) => PAGINATED_TABLE,
            Self::Lock(_) => LOCK_STATUS,
            Self::Modal(_) => CONFIRM_MODAL,
        }
    }

    pub async fn mount(&self) {
        match self {
            Self::Table(table) => table.mount().await,
            Self::Lock(poller) => poller.mount().await,
            Self::Modal(_) => {}
        }
    }

    pub fn unmount(&self) {
        match self {
            Self::Table(table) => table.unmount(),
            Self::Lock(poller) => poller.unmount(),
            Self::Modal(modal) => modal.close(),
        }
    }
}

pub type ComponentFactory =
    Box<dyn Fn(&ComponentContext, Value) -> Result<ComponentHandle, RegistryError> + Send + Sync>;

#[derive(Debug, Deserialize)]
pub struct TableProps {
    pub url: String,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_per_page() -> u32 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Deserialize)]
pub struct LockProps {
    pub url: String,
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub refresh_on_broadcast: bool,
}

fn default_refresh_ms() -> i64 {
    30_000
}

fn parse_props<T: DeserializeOwned>(component: &str, props: Value) -> Result<T, RegistryError> {
    serde_json::from_value(props).map_err(|err| RegistryError::InvalidProps {
        component: component.to_string(),
        reason: err.to_string(),
    })
}

#[derive(Default)]
pub struct RegistryBuilder {
    factories: BTreeMap<String, ComponentFactory>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded with the table, lock poller and modal factories.
    pub fn with_builtin_components() -> Self {
        let mut builder = Self::new();
        builder.insert(PAGINATED_TABLE, Box::new(build_table));
        builder.insert(LOCK_STATUS, Box::new(build_lock_poller));
        builder.insert(CONFIRM_MODAL, Box::new(build_modal));
        builder
    }

    pub fn register(
        mut self,
        name: impl Into<String>,
        factory: ComponentFactory,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(RegistryError::Duplicate(name));
        }
        self.insert(name, factory);
        Ok(self)
    }

    fn insert(&mut self, name: impl Into<String>, factory: ComponentFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn build(self, context: ComponentContext) -> ComponentRegistry {
        ComponentRegistry {
            context,
            factories: self.factories,
        }
    }
}

pub struct ComponentRegistry {
    context: ComponentContext,
    factories: BTreeMap<String, ComponentFactory>,
}

impl ComponentRegistry {
    pub fn context(&self) -> &ComponentContext {
        &self.context
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(&self, name: &str, props: Value) -> Result<ComponentHandle, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::UnknownComponent(name.to_string()))?;
        factory(&self.context, props)
    }
}

fn build_table(context: &ComponentContext, props: Value) -> Result<ComponentHandle, RegistryError> {
    let props: TableProps = parse_props(PAGINATED_TABLE, props)?;
    if props.per_page == 0 {
        return Err(RegistryError::InvalidProps {
            component: PAGINATED_TABLE.to_string(),
            reason: "per_page must be positive".to_string(),
        });
    }
    Ok(ComponentHandle::Table(PaginatedTable::new(
        props.url,
        props.per_page,
        Arc::clone(&context.client),
        Arc::clone(&context.bus),
    )))
}

fn build_lock_poller(
    context: &ComponentContext,
    props: Value,
) -> Result<ComponentHandle, RegistryError> {
    let props: LockProps = parse_props(LOCK_STATUS, props)?;
    let config = PollerConfig::new(props.url)
        .with_refresh_millis(props.refresh_ms)
        .with_title(props.title.unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.to_string()))
        .with_refresh_on_broadcast(props.refresh_on_broadcast)
        .with_timestamp_format(context.timestamp_format.clone());
    Ok(ComponentHandle::Lock(LockStatusPoller::new(
        config,
        Arc::clone(&context.client),
        Arc::clone(&context.bus),
        Arc::clone(&context.notifier),
    )))
}

fn build_modal(context: &ComponentContext, _props: Value) -> Result<ComponentHandle, RegistryError> {
    Ok(ComponentHandle::Modal(ConfirmActionModal::new(
        Arc::clone(&context.client),
        Arc::clone(&context.bus),
        Arc::clone(&context.notifier),
    )))
}

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod tests;

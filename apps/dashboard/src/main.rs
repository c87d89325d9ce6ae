mod config;
mod render;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use dashboard_core::{
    registry::{CONFIRM_MODAL, LOCK_STATUS, PAGINATED_TABLE},
    ComponentContext, ComponentHandle, ComponentRegistry, ConfirmActionModal, ConfirmOutcome,
    EventBus, HttpResourceClient, LockStatusPoller, Method, ModalRequest, Notification, Notifier,
    PaginatedTable, RegistryBuilder, TimestampFormat, TracingNotifier,
};
use serde_json::json;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{load_settings, Settings},
    render::TableKind,
};

#[derive(Parser, Debug)]
#[command(about = "Terminal front-end for the seedbox dashboard")]
struct Cli {
    /// TOML settings file. Defaults to ./dashboard.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Live view of the lock status and one table. Reads commands from stdin.
    Watch {
        #[arg(long)]
        uploads: bool,
        #[arg(long)]
        search: Option<String>,
    },
    /// Print a single page of downloads or uploads.
    Table {
        #[arg(long)]
        uploads: bool,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        per_page: Option<u32>,
    },
    /// Print the current lock status.
    Lock,
    /// Ask for confirmation, then send one state-changing request.
    Confirm {
        url: String,
        #[arg(long, default_value = "POST")]
        method: String,
        #[arg(long, default_value = "Confirm action")]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        #[arg(long, default_value = "")]
        success_message: String,
        #[arg(long)]
        yes: bool,
    },
}

struct App {
    settings: Settings,
    registry: ComponentRegistry,
    notifications: mpsc::UnboundedReceiver<Notification>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }
    let sink = match cli.command {
        Command::Watch { .. } | Command::Confirm { .. } => NotificationSink::Terminal,
        Command::Table { .. } | Command::Lock => NotificationSink::Log,
    };
    let mut app = bootstrap(settings, sink)?;

    match cli.command {
        Command::Watch { uploads, search } => watch(&mut app, uploads, search).await?,
        Command::Table {
            uploads,
            search,
            page,
            per_page,
        } => {
            let table = app.table(uploads, per_page)?;
            match search {
                Some(term) => table.set_search_term(term).await,
                None => table.load().await,
            }
            if page > 1 {
                table.go_to_page(page).await;
            }
            let state = table.snapshot();
            println!("{}", render::table(&state, table_kind(uploads)));
            if state.error {
                bail!("failed to load {}", table.url());
            }
        }
        Command::Lock => {
            let poller = app.lock_poller()?;
            poller.refresh_status().await;
            let state = poller.snapshot();
            println!("{}", render::lock_line(&state));
            if state.error.is_some() {
                bail!("failed to load {}", poller.config().url);
            }
        }
        Command::Confirm {
            url,
            method,
            title,
            body,
            success_message,
            yes,
        } => {
            let method =
                parse_method(&method).ok_or_else(|| anyhow!("invalid HTTP method '{method}'"))?;
            let modal = app.modal()?;
            modal.open(
                ModalRequest::new(title, body)
                    .with_action(method, url)
                    .with_success_message(success_message),
            );
            println!("{}", render::modal(&modal.snapshot()));

            if !yes && !prompt_yes_no().await? {
                modal.cancel();
                println!("cancelled");
                return Ok(());
            }

            let outcome = modal.confirm().await;
            app.flush_notifications();
            match outcome {
                ConfirmOutcome::Succeeded { status } => println!("done (HTTP {status})"),
                ConfirmOutcome::Failed(err) => return Err(err.into()),
                ConfirmOutcome::Dismissed | ConfirmOutcome::Ignored | ConfirmOutcome::Superseded => {}
            }
        }
    }

    Ok(())
}

/// Where component notifications end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NotificationSink {
    /// Printed by the command itself, interleaved with its output.
    Terminal,
    /// Written to the tracing log; used by the one-shot commands.
    Log,
}

fn bootstrap(settings: Settings, sink: NotificationSink) -> Result<App> {
    let client = HttpResourceClient::new(
        &settings.server_url,
        Duration::from_secs(settings.request_timeout_secs),
    )
    .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    let timestamp_format = TimestampFormat::new(settings.timestamp_format.clone())?;
    let (sender, notifications) = mpsc::unbounded_channel::<Notification>();
    let notifier: Arc<dyn Notifier> = match sink {
        NotificationSink::Terminal => Arc::new(sender),
        NotificationSink::Log => Arc::new(TracingNotifier),
    };
    info!(base_url = %client.base_url(), "dashboard initialized");

    let context = ComponentContext {
        client: Arc::new(client),
        bus: Arc::new(EventBus::new()),
        notifier,
        timestamp_format,
    };
    let registry = RegistryBuilder::with_builtin_components().build(context);

    Ok(App {
        settings,
        registry,
        notifications,
    })
}

impl App {
    fn table(&self, uploads: bool, per_page: Option<u32>) -> Result<Arc<PaginatedTable>> {
        let url = if uploads {
            &self.settings.uploads_path
        } else {
            &self.settings.downloads_path
        };
        let props = json!({
            "url": url,
            "per_page": per_page.unwrap_or(self.settings.per_page),
        });
        match self.registry.create(PAGINATED_TABLE, props)? {
            ComponentHandle::Table(table) => Ok(table),
            other => bail!("registry returned '{}' for a table", other.kind()),
        }
    }

    fn lock_poller(&self) -> Result<Arc<LockStatusPoller>> {
        let props = json!({
            "url": self.settings.lock_path,
            "refresh_ms": self.settings.lock_refresh_ms,
            "title": self.settings.lock_title,
            "refresh_on_broadcast": true,
        });
        match self.registry.create(LOCK_STATUS, props)? {
            ComponentHandle::Lock(poller) => Ok(poller),
            other => bail!("registry returned '{}' for a lock poller", other.kind()),
        }
    }

    fn modal(&self) -> Result<Arc<ConfirmActionModal>> {
        match self.registry.create(CONFIRM_MODAL, serde_json::Value::Null)? {
            ComponentHandle::Modal(modal) => Ok(modal),
            other => bail!("registry returned '{}' for a modal", other.kind()),
        }
    }

    fn flush_notifications(&mut self) {
        while let Ok(notification) = self.notifications.try_recv() {
            println!("{}", render::notification(&notification));
        }
    }
}

fn table_kind(uploads: bool) -> TableKind {
    if uploads {
        TableKind::Uploads
    } else {
        TableKind::Downloads
    }
}

async fn prompt_yes_no() -> Result<bool> {
    println!("proceed? [y/N]");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read confirmation")?;
    Ok(is_yes(&line))
}

fn parse_method(method: &str) -> Option<Method> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes()).ok()
}

/// Commands accepted on stdin while watching.
#[derive(Debug, PartialEq, Eq)]
enum WatchCommand {
    Next,
    Previous,
    Page(u32),
    Search(String),
    /// Re-fetch the table and lock status shown in this view.
    Reload,
    /// Run a state-changing call behind the confirmation dialog.
    Action { method: Method, url: String },
    Quit,
}

fn parse_watch_command(line: &str) -> Option<WatchCommand> {
    let line = line.trim();
    if let Some(term) = line.strip_prefix('/') {
        return Some(WatchCommand::Search(term.trim().to_string()));
    }
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["n"] => Some(WatchCommand::Next),
        ["p"] => Some(WatchCommand::Previous),
        ["g", page] => page.parse().ok().map(WatchCommand::Page),
        ["r"] => Some(WatchCommand::Reload),
        ["x", url] => Some(WatchCommand::Action {
            method: Method::POST,
            url: url.to_string(),
        }),
        ["x", method, url] => parse_method(method).map(|method| WatchCommand::Action {
            method,
            url: url.to_string(),
        }),
        ["q"] => Some(WatchCommand::Quit),
        _ => None,
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim(), "y" | "Y" | "yes")
}

async fn watch(app: &mut App, uploads: bool, search: Option<String>) -> Result<()> {
    let kind = table_kind(uploads);
    let poller = app.lock_poller()?;
    let table = app.table(uploads, None)?;
    let modal = app.modal()?;
    let lock = ComponentHandle::Lock(Arc::clone(&poller));
    let table_handle = ComponentHandle::Table(Arc::clone(&table));
    let modal_handle = ComponentHandle::Modal(Arc::clone(&modal));

    let mut lock_rx = poller.subscribe();
    let mut table_rx = table.subscribe();

    lock.mount().await;
    table_handle.mount().await;
    modal_handle.mount().await;
    if let Some(term) = search {
        table.set_search_term(term).await;
    }
    println!("{}", render::lock_line(&lock_rx.borrow_and_update()));
    println!("{}", render::table(&table_rx.borrow_and_update(), kind));
    println!("commands: n, p, g <page>, /<search>, r (reload), x [METHOD] <url>, q");

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("interrupted");
                break;
            }
            changed = lock_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = lock_rx.borrow_and_update().clone();
                if !state.loading {
                    println!("{}", render::lock_line(&state));
                }
            }
            changed = table_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = table_rx.borrow_and_update().clone();
                if !state.loading {
                    println!("{}", render::table(&state, kind));
                }
            }
            Some(notification) = app.notifications.recv() => {
                println!("{}", render::notification(&notification));
            }
            line = stdin.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    debug!("stdin closed");
                    break;
                };

                if modal.snapshot().is_open {
                    if !is_yes(&line) {
                        modal.cancel();
                        println!("cancelled");
                        continue;
                    }
                    match modal.confirm().await {
                        ConfirmOutcome::Succeeded { status } => println!("done (HTTP {status})"),
                        ConfirmOutcome::Failed(_) => println!("proceed again? [y/N]"),
                        ConfirmOutcome::Dismissed
                        | ConfirmOutcome::Ignored
                        | ConfirmOutcome::Superseded => {}
                    }
                    continue;
                }

                match parse_watch_command(&line) {
                    Some(WatchCommand::Next) => table.go_to_next_page().await,
                    Some(WatchCommand::Previous) => table.go_to_previous_page().await,
                    Some(WatchCommand::Page(page)) => table.go_to_page(page).await,
                    Some(WatchCommand::Search(term)) => table.set_search_term(term).await,
                    Some(WatchCommand::Reload) => {
                        table.load().await;
                        poller.refresh_status().await;
                    }
                    Some(WatchCommand::Action { method, url }) => {
                        modal.open(
                            ModalRequest::new("Confirm action", format!("Send {method} {url}?"))
                                .with_action(method, url)
                                .with_success_message("Action completed"),
                        );
                        println!("{}", render::modal(&modal.snapshot()));
                        println!("proceed? [y/N]");
                    }
                    Some(WatchCommand::Quit) => break,
                    None if line.trim().is_empty() => {}
                    None => warn!(%line, "unrecognized command"),
                }
            }
        }
    }

    modal_handle.unmount();
    table_handle.unmount();
    lock.unmount();
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

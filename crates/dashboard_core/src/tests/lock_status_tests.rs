use super::*;
use crate::{
    notifier::{NotificationLevel, RecordingNotifier},
    resource_client::RawResponse,
    test_support::{lock_body, ScriptedClient},
};

const URL: &str = "/api/v1/locks/sync_seedbox";
const LOCKED_AT: &str = "2025-10-13T15:38:29.652233";
const UNLOCKED_AT: &str = "2025-10-13T15:37:46.752033";

struct Harness {
    client: Arc<ScriptedClient>,
    notifier: Arc<RecordingNotifier>,
    bus: Arc<EventBus>,
    poller: Arc<LockStatusPoller>,
}

fn harness(config: PollerConfig) -> Harness {
    let client = Arc::new(ScriptedClient::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let bus = Arc::new(EventBus::new());
    let poller = LockStatusPoller::new(
        config,
        client.clone(),
        Arc::clone(&bus),
        notifier.clone(),
    );
    Harness {
        client,
        notifier,
        bus,
        poller,
    }
}

fn locked() -> RawResponse {
    RawResponse::json(200, &lock_body(true, LOCKED_AT, ""))
}

fn unlocked() -> RawResponse {
    RawResponse::json(200, &lock_body(false, LOCKED_AT, UNLOCKED_AT))
}

fn not_found() -> RawResponse {
    RawResponse::json(404, &serde_json::json!({ "title": "Lock sync_seedbox doesn't exist" }))
}

#[test]
fn apply_message_only_announces_real_transitions() {
    let mut state = LockViewState::default();
    assert_eq!(state.apply_message("A".into()), None);
    assert_eq!(state.apply_message("A".into()), None);
    assert_eq!(state.apply_message("B".into()), Some("B".into()));
    assert_eq!(state.previous_message, "A");
    assert_eq!(state.current_message, "B");
    assert_eq!(state.apply_message("B".into()), None);
    assert_eq!(state.apply_message("A".into()), Some("A".into()));
}

#[test]
fn describes_lock_with_configured_format() {
    let format = TimestampFormat::new("%d/%m/%Y %H:%M").expect("format");
    let status: LockStatus =
        serde_json::from_value(lock_body(true, LOCKED_AT, "")["data"].clone()).expect("status");
    assert_eq!(describe_lock(&status, &format), "In progress since 13/10/2025 15:38");

    let status: LockStatus =
        serde_json::from_value(lock_body(false, LOCKED_AT, UNLOCKED_AT)["data"].clone())
            .expect("status");
    assert_eq!(
        describe_lock(&status, &TimestampFormat::default()),
        "Completed since 2025-10-13 15:37:46"
    );

    let status = LockStatus {
        locked: false,
        locked_at: None,
        unlocked_at: None,
    };
    assert_eq!(describe_lock(&status, &format), "Completed since unknown");
}

#[test]
fn rejects_invalid_timestamp_format() {
    assert!(TimestampFormat::new("%Y-%Q").is_err());
    assert!(TimestampFormat::new("%Y-%m-%d").is_ok());
}

#[test]
fn non_positive_refresh_disables_polling() {
    assert!(PollerConfig::new(URL).with_refresh_millis(0).refresh_interval.is_zero());
    assert!(PollerConfig::new(URL).with_refresh_millis(-5).refresh_interval.is_zero());
    assert_eq!(
        PollerConfig::new(URL).with_refresh_millis(1500).refresh_interval,
        Duration::from_millis(1500)
    );
}

#[tokio::test]
async fn first_load_never_notifies() {
    let h = harness(PollerConfig::new(URL));
    h.client.push(Ok(locked()));

    h.poller.refresh_status().await;

    let state = h.poller.snapshot();
    assert_eq!(state.current_message, "In progress since 2025-10-13 15:38:29");
    assert_eq!(state.previous_message, "");
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert!(h.notifier.notifications().is_empty());
}

#[tokio::test]
async fn notifies_exactly_on_transitions() {
    let h = harness(PollerConfig::new(URL).with_title("Seedbox sync"));
    for reply in [unlocked(), unlocked(), locked(), locked(), unlocked()] {
        h.client.push(Ok(reply));
    }

    for _ in 0..5 {
        h.poller.refresh_status().await;
    }

    let notifications = h.notifier.notifications();
    assert_eq!(notifications.len(), 2);
    assert_eq!(notifications[0].message, "In progress since 2025-10-13 15:38:29");
    assert_eq!(notifications[1].message, "Completed since 2025-10-13 15:37:46");
    assert!(notifications
        .iter()
        .all(|n| n.title.as_deref() == Some("Seedbox sync") && n.level == NotificationLevel::Info));
}

#[tokio::test]
async fn absent_lock_reports_never_launched_without_error() {
    let h = harness(PollerConfig::new(URL));
    h.client.push(Err(FetchError::Transport("connection reset".into())));
    h.client.push(Ok(not_found()));

    h.poller.refresh_status().await;
    assert_eq!(h.poller.snapshot().error.as_deref(), Some(LOAD_ERROR_MESSAGE));

    h.poller.refresh_status().await;
    let state = h.poller.snapshot();
    assert_eq!(state.current_message, NEVER_LAUNCHED_MESSAGE);
    assert_eq!(state.error, None);
    assert_eq!(state.status, None);
    assert!(h.notifier.notifications().is_empty());
}

#[tokio::test]
async fn absence_after_a_known_status_is_a_transition() {
    let h = harness(PollerConfig::new(URL));
    h.client.push(Ok(unlocked()));
    h.client.push(Ok(not_found()));

    h.poller.refresh_status().await;
    h.poller.refresh_status().await;

    let notifications = h.notifier.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].message, NEVER_LAUNCHED_MESSAGE);
}

#[tokio::test]
async fn failure_keeps_last_good_message() {
    let h = harness(PollerConfig::new(URL));
    h.client.push(Ok(locked()));
    h.client.push(Ok(RawResponse::json(500, &serde_json::json!({}))));

    h.poller.refresh_status().await;
    h.poller.refresh_status().await;

    let state = h.poller.snapshot();
    assert_eq!(state.current_message, "In progress since 2025-10-13 15:38:29");
    assert_eq!(state.error.as_deref(), Some(LOAD_ERROR_MESSAGE));
    assert!(!state.loading);
    assert!(h.notifier.notifications().is_empty());
}

#[tokio::test]
async fn success_after_failure_clears_error() {
    let h = harness(PollerConfig::new(URL));
    h.client.push(Ok(RawResponse {
        status: 200,
        body: b"not json".to_vec(),
    }));
    h.client.push(Ok(unlocked()));

    h.poller.refresh_status().await;
    assert!(h.poller.snapshot().error.is_some());

    h.poller.refresh_status().await;
    let state = h.poller.snapshot();
    assert_eq!(state.error, None);
    assert_eq!(state.current_message, "Completed since 2025-10-13 15:37:46");
}

#[tokio::test(start_paused = true)]
async fn zero_interval_loads_exactly_once() {
    let h = harness(PollerConfig::new(URL).with_refresh_millis(0));
    h.client.set_fallback(Ok(unlocked()));

    h.poller.mount().await;
    tokio::time::sleep(Duration::from_secs(600)).await;

    assert_eq!(h.client.request_count(), 1);
    assert!(h.poller.is_mounted());
}

#[tokio::test(start_paused = true)]
async fn polls_on_fixed_interval_until_unmounted() {
    let h = harness(PollerConfig::new(URL).with_refresh_millis(30_000));
    h.client.set_fallback(Ok(unlocked()));

    h.poller.mount().await;
    assert_eq!(h.client.request_count(), 1);

    tokio::time::sleep(Duration::from_secs(95)).await;
    assert_eq!(h.client.request_count(), 4);

    h.poller.unmount();
    tokio::time::sleep(Duration::from_secs(300)).await;
    assert_eq!(h.client.request_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn dropping_poller_stops_timer() {
    let h = harness(PollerConfig::new(URL).with_refresh_millis(1_000));
    h.client.set_fallback(Ok(unlocked()));
    h.poller.mount().await;

    let Harness { client, poller, .. } = h;
    drop(poller);
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(client.request_count(), 1);
}

#[tokio::test]
async fn reloads_on_broadcast_when_configured() {
    let h = harness(
        PollerConfig::new(URL)
            .with_refresh_millis(0)
            .with_refresh_on_broadcast(true),
    );
    h.client.push(Ok(unlocked()));
    h.client.push(Ok(locked()));

    h.poller.mount().await;
    assert_eq!(h.bus.publish_refresh(), 1);
    while h.client.request_count() < 2 {
        tokio::task::yield_now().await;
    }
    while h.poller.snapshot().loading {
        tokio::task::yield_now().await;
    }

    assert_eq!(h.poller.snapshot().current_message, "In progress since 2025-10-13 15:38:29");
    assert_eq!(h.notifier.notifications().len(), 1);
}

#[tokio::test]
async fn ignores_broadcast_by_default() {
    let h = harness(PollerConfig::new(URL).with_refresh_millis(0));
    h.client.set_fallback(Ok(unlocked()));

    h.poller.mount().await;

    assert_eq!(h.bus.publish_refresh(), 0);
    assert_eq!(h.client.request_count(), 1);
}

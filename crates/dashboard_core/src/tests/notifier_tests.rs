use std::sync::Arc;

use super::*;

#[test]
fn recording_notifier_keeps_order_until_taken() {
    let notifier = RecordingNotifier::new();
    notifier.notify(Notification::info("Never launched"));
    notifier.notify(Notification::success("Sync started").with_title("Seedbox sync"));

    let seen = notifier.notifications();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].title.as_deref(), Some("Seedbox sync"));

    assert_eq!(notifier.take().len(), 2);
    assert!(notifier.notifications().is_empty());
}

#[test]
fn channel_notifier_forwards_and_ignores_closed_receiver() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let notifier: Arc<dyn Notifier> = Arc::new(tx);
    notifier.notify(Notification::danger("HTTP error 500"));

    let received = rx.try_recv().expect("forwarded");
    assert_eq!(received.level, NotificationLevel::Danger);
    assert_eq!(received.message, "HTTP error 500");

    drop(rx);
    notifier.notify(Notification::info("dropped silently"));
}

#[test]
fn tracing_notifier_accepts_every_level() {
    let notifier = TracingNotifier;
    notifier.notify(Notification::info("In progress since 2025-10-13 15:38:29").with_title("Lock status"));
    notifier.notify(Notification::success("done"));
    notifier.notify(Notification::danger("HTTP error 404"));
}

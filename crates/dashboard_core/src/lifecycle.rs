use std::{
    future::Future,
    sync::{Arc, Mutex, PoisonError, Weak},
};

use tokio::{sync::mpsc, task::JoinHandle};

use crate::event_bus::{EventBus, Subscription};

/// Background work owned by a mounted component. Dropping it aborts the tasks
/// and unregisters from the bus.
#[derive(Default)]
pub(crate) struct MountedTasks {
    subscription: Option<Subscription>,
    tasks: Vec<JoinHandle<()>>,
}

impl MountedTasks {
    pub(crate) fn push(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    /// Re-runs `reload` on the owner after every broadcast refresh. Refreshes
    /// are processed one at a time; the task stops once the owner is gone.
    pub(crate) fn reload_on_refresh<T, F, Fut>(&mut self, bus: &EventBus, owner: Weak<T>, reload: F)
    where
        T: Send + Sync + 'static,
        F: Fn(Arc<T>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.subscription = Some(bus.subscribe(move |_| {
            let _ = tx.send(());
        }));
        self.tasks.push(tokio::spawn(async move {
            while rx.recv().await.is_some() {
                let Some(owner) = owner.upgrade() else {
                    break;
                };
                reload(owner).await;
            }
        }));
    }
}

impl Drop for MountedTasks {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Slot holding the current mount, if any.
#[derive(Default)]
pub(crate) struct Lifecycle {
    mounted: Mutex<Option<MountedTasks>>,
}

impl Lifecycle {
    pub(crate) fn replace(&self, tasks: MountedTasks) {
        let previous = self
            .mounted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(tasks);
        drop(previous);
    }

    /// Returns whether something was mounted.
    pub(crate) fn teardown(&self) -> bool {
        let mounted = self
            .mounted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        mounted.is_some()
    }

    pub(crate) fn is_mounted(&self) -> bool {
        self.mounted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

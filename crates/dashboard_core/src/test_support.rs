//! Scripted transport shared by the component test suites.

use std::{
    collections::VecDeque,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::{
    error::FetchError,
    resource_client::{RawResponse, ResourceClient, ResourceRequest},
};

pub(crate) type Reply = Result<RawResponse, FetchError>;

enum Scripted {
    Ready(Reply),
    Gated(oneshot::Receiver<Reply>),
}

/// Answers requests from a queue; once the queue is empty the fallback reply
/// (if any) is repeated.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    queue: Mutex<VecDeque<Scripted>>,
    fallback: Mutex<Option<Reply>>,
    requests: Mutex<Vec<ResourceRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_json(&self, status: u16, body: Value) {
        self.push(Ok(RawResponse::json(status, &body)));
    }

    pub(crate) fn push(&self, reply: Reply) {
        lock(&self.queue).push_back(Scripted::Ready(reply));
    }

    /// The matching request stays pending until the returned sender fires.
    pub(crate) fn push_gated(&self) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        lock(&self.queue).push_back(Scripted::Gated(rx));
        tx
    }

    pub(crate) fn set_fallback(&self, reply: Reply) {
        *lock(&self.fallback) = Some(reply);
    }

    pub(crate) fn requests(&self) -> Vec<ResourceRequest> {
        lock(&self.requests).clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl ResourceClient for ScriptedClient {
    async fn send(&self, request: &ResourceRequest) -> Result<RawResponse, FetchError> {
        lock(&self.requests).push(request.clone());
        let next = lock(&self.queue).pop_front();
        match next {
            Some(Scripted::Ready(reply)) => reply,
            Some(Scripted::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(FetchError::Transport("gate dropped".into()))),
            None => {
                let fallback = lock(&self.fallback).clone();
                fallback.unwrap_or_else(|| Err(FetchError::Transport("no scripted reply".into())))
            }
        }
    }
}

pub(crate) fn page_body(ids: &[i64], total: u64) -> Value {
    let rows: Vec<Value> = ids.iter().map(|id| serde_json::json!({ "id": id })).collect();
    serde_json::json!({ "data": rows, "data_total": total })
}

pub(crate) fn lock_body(locked: bool, locked_at: &str, unlocked_at: &str) -> Value {
    serde_json::json!({
        "data": {
            "locked": locked,
            "locked_at": locked_at,
            "unlocked_at": unlocked_at,
        }
    })
}

pub(crate) fn row_ids(rows: &[Value]) -> Vec<i64> {
    rows.iter()
        .filter_map(|row| row.get("id").and_then(Value::as_i64))
        .collect()
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

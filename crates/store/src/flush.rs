//! Background persistence flusher.
//!
//! Mutations apply to the in-memory cart synchronously and enqueue an
//! encoded snapshot here; a single spawned task drains the queue and writes
//! to the storage backend. Queued snapshots are coalesced to the newest
//! before writing, so the backend converges to the last committed state
//! without replaying intermediate ones.
//!
//! A failed write is retried a configured number of times; once retries are
//! exhausted the failure is logged and published on a watch channel instead
//! of crashing the host or poisoning the in-memory cart.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};

use crate::storage::StorageBackend;

/// A persistence write that exhausted its retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistFailure {
    /// Number of attempts made before giving up.
    pub attempts: u32,
    /// Rendered error from the last attempt.
    pub message: String,
}

pub(crate) enum FlushMsg {
    /// An encoded cart snapshot to write.
    Write(String),
    /// Barrier: acked once all previously queued writes have been attempted.
    Sync(oneshot::Sender<()>),
}

/// Handle to the flusher task owned by the cart store.
pub(crate) struct FlushHandle {
    tx: mpsc::UnboundedSender<FlushMsg>,
    errors: watch::Receiver<Option<PersistFailure>>,
}

impl FlushHandle {
    pub(crate) fn enqueue(&self, payload: String) {
        if self.tx.send(FlushMsg::Write(payload)).is_err() {
            tracing::error!("cart flusher task is gone; dropping persistence write");
        }
    }

    pub(crate) async fn sync(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(FlushMsg::Sync(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    pub(crate) fn errors(&self) -> watch::Receiver<Option<PersistFailure>> {
        self.errors.clone()
    }
}

/// Spawn the flusher task. Must be called from within a Tokio runtime.
pub(crate) fn spawn(
    backend: Arc<dyn StorageBackend>,
    key: &'static str,
    retries: u32,
    retry_delay: Duration,
) -> FlushHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let (error_tx, error_rx) = watch::channel(None);
    tokio::spawn(run(rx, backend, key, retries, retry_delay, error_tx));
    FlushHandle {
        tx,
        errors: error_rx,
    }
}

async fn run(
    mut rx: mpsc::UnboundedReceiver<FlushMsg>,
    backend: Arc<dyn StorageBackend>,
    key: &'static str,
    retries: u32,
    retry_delay: Duration,
    error_tx: watch::Sender<Option<PersistFailure>>,
) {
    while let Some(msg) = rx.recv().await {
        let mut pending = None;
        let mut acks = Vec::new();
        stash(msg, &mut pending, &mut acks);

        // Coalesce everything already queued: only the newest snapshot
        // needs to reach the backend (last write wins).
        while let Ok(next) = rx.try_recv() {
            stash(next, &mut pending, &mut acks);
        }

        if let Some(payload) = pending {
            write_with_retry(
                backend.as_ref(),
                key,
                &payload,
                retries,
                retry_delay,
                &error_tx,
            )
            .await;
        }

        for ack in acks {
            let _ = ack.send(());
        }
    }
}

fn stash(msg: FlushMsg, pending: &mut Option<String>, acks: &mut Vec<oneshot::Sender<()>>) {
    match msg {
        FlushMsg::Write(payload) => *pending = Some(payload),
        FlushMsg::Sync(ack) => acks.push(ack),
    }
}

async fn write_with_retry(
    backend: &dyn StorageBackend,
    key: &str,
    payload: &str,
    retries: u32,
    retry_delay: Duration,
    error_tx: &watch::Sender<Option<PersistFailure>>,
) {
    let attempts = retries.max(1);
    for attempt in 1..=attempts {
        match backend.set(key, payload.to_string()).await {
            Ok(()) => {
                // Clear a previously surfaced failure once a write lands.
                if error_tx.borrow().is_some() {
                    error_tx.send_replace(None);
                }
                return;
            }
            Err(err) if attempt < attempts => {
                tracing::warn!(attempt, error = %err, "cart persistence write failed; retrying");
                tokio::time::sleep(retry_delay).await;
            }
            Err(err) => {
                tracing::error!(
                    attempts = attempt,
                    error = %err,
                    "cart persistence write failed; giving up"
                );
                error_tx.send_replace(Some(PersistFailure {
                    attempts: attempt,
                    message: err.to_string(),
                }));
            }
        }
    }
}

//! # OutboxSet: non-blocking fan-out over attached subscribers.
//!
//! Each attached subscriber owns a bounded queue drained by a dedicated
//! worker task that calls [`Outbound::send`] one payload at a time.
//!
//! ## What it guarantees
//! - `forward()` returns immediately; dispatch never awaits delivery.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside `Outbound::send` are caught and reported (isolation).
//!
//! ## What it does **not** guarantee
//! - No ordering across different subscribers.
//! - No retries on queue overflow or send failure (the event is dropped for
//!   that subscriber).
//!
//! ## Diagram
//! ```text
//!    forward(id, payload)
//!        │ try_send
//!        ├──► [queue S1] ─► worker S1 ─► Outbound::send()
//!        ├──► [queue S2] ─► worker S2 ─► Outbound::send()
//!        └──► [queue SN] ─► worker SN ─► Outbound::send()
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::FutureExt;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::observe::{Bus, RelayEvent, RelayEventKind};

use super::subscriber::{Outbound, SubscriberId};

/// Per-subscriber queue with delivery metadata.
struct Outbox {
    name: String,
    sender: mpsc::Sender<Bytes>,
    cancel: CancellationToken,
    worker: JoinHandle<()>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
pub(crate) struct OutboxSet {
    outboxes: RwLock<HashMap<SubscriberId, Outbox>>,
    capacity: usize,
    bus: Bus,
}

impl OutboxSet {
    /// Creates an empty set. `capacity` is the per-subscriber queue bound
    /// (minimum 1, clamped).
    pub(crate) fn new(capacity: usize, bus: Bus) -> Self {
        Self {
            outboxes: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            bus,
        }
    }

    /// Registers an endpoint and spawns its delivery worker.
    pub(crate) async fn attach(&self, id: SubscriberId, outbound: Arc<dyn Outbound>) {
        let (tx, rx) = mpsc::channel::<Bytes>(self.capacity);
        let cancel = CancellationToken::new();
        let worker = tokio::spawn(deliver_loop(
            id,
            Arc::clone(&outbound),
            rx,
            cancel.clone(),
            self.bus.clone(),
        ));

        let outbox = Outbox {
            name: outbound.name().to_string(),
            sender: tx,
            cancel,
            worker,
        };

        let mut map = self.outboxes.write().await;
        if let Some(stale) = map.insert(id, outbox) {
            // Ids are never reused; a stale entry here is a bug upstream.
            stale.cancel.cancel();
            stale.worker.abort();
        }
    }

    /// Enqueues one payload for one subscriber (non-blocking).
    ///
    /// Returns `true` if the payload was queued. A full or closed queue drops
    /// the payload for this subscriber only and reports it on the bus.
    pub(crate) async fn forward(&self, id: SubscriberId, channel: &Arc<str>, payload: Bytes) -> bool {
        let map = self.outboxes.read().await;
        let Some(outbox) = map.get(&id) else {
            self.bus
                .publish(RelayEvent::forward_failed(id, "no_outbox"));
            return false;
        };

        match outbox.sender.try_send(payload) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.bus.publish(
                    RelayEvent::new(RelayEventKind::OutboxOverflow)
                        .with_subscriber(id)
                        .with_channel(Arc::clone(channel)),
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.bus
                    .publish(RelayEvent::forward_failed(id, "outbox_closed"));
                false
            }
        }
    }

    /// Removes an outbox, cancelling its worker. Queued payloads are dropped.
    ///
    /// Returns `false` if the subscriber was not attached.
    pub(crate) async fn detach(&self, id: SubscriberId) -> bool {
        let removed = self.outboxes.write().await.remove(&id);
        match removed {
            Some(outbox) => {
                outbox.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// True if the subscriber currently has an outbox.
    pub(crate) async fn contains(&self, id: SubscriberId) -> bool {
        self.outboxes.read().await.contains_key(&id)
    }

    /// Number of attached subscribers.
    pub(crate) async fn len(&self) -> usize {
        self.outboxes.read().await.len()
    }

    /// Graceful shutdown: close all queues, let workers drain, and wait up to
    /// `grace`. Workers still running after the deadline are force-terminated;
    /// their names are returned.
    pub(crate) async fn shutdown(&self, grace: Duration) -> Vec<String> {
        let drained: Vec<Outbox> = {
            let mut map = self.outboxes.write().await;
            map.drain().map(|(_, outbox)| outbox).collect()
        };

        let mut entries: Vec<(String, CancellationToken, JoinHandle<()>)> = Vec::new();
        for outbox in drained {
            let Outbox {
                name,
                sender,
                cancel,
                worker,
            } = outbox;
            // Dropping the sender lets the worker finish the queue, then exit.
            drop(sender);
            entries.push((name, cancel, worker));
        }

        let all_joined = async {
            for (_, _, worker) in entries.iter_mut() {
                let _ = worker.await;
            }
        };
        if time::timeout(grace, all_joined).await.is_ok() {
            return Vec::new();
        }

        let mut stuck = Vec::new();
        for (name, cancel, worker) in entries {
            if !worker.is_finished() {
                cancel.cancel();
                worker.abort();
                stuck.push(name);
            }
        }
        stuck
    }
}

/// Delivery loop for one subscriber: queue order in, `send` calls out.
async fn deliver_loop(
    id: SubscriberId,
    outbound: Arc<dyn Outbound>,
    mut rx: mpsc::Receiver<Bytes>,
    cancel: CancellationToken,
    bus: Bus,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            maybe = rx.recv() => match maybe {
                Some(payload) => {
                    let fut = outbound.send(payload);
                    match std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => {
                            bus.publish(RelayEvent::forward_failed(id, err.as_label()));
                            if err.is_disconnect() {
                                break;
                            }
                        }
                        Err(panic_err) => {
                            bus.publish(RelayEvent::outbox_panicked(id, format!("{panic_err:?}")));
                        }
                    }
                }
                None => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use async_trait::async_trait;

    struct Recorder {
        tx: mpsc::UnboundedSender<Bytes>,
    }

    #[async_trait]
    impl Outbound for Recorder {
        async fn send(&self, payload: Bytes) -> Result<(), TransportError> {
            self.tx.send(payload).map_err(|_| TransportError::Closed)
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    fn recorder() -> (Arc<Recorder>, mpsc::UnboundedReceiver<Bytes>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Recorder { tx }), rx)
    }

    #[tokio::test]
    async fn test_forward_preserves_queue_order() {
        let set = OutboxSet::new(16, Bus::new(8));
        let id = SubscriberId::from_raw(1);
        let (sink, mut rx) = recorder();
        set.attach(id, sink).await;

        let channel: Arc<str> = Arc::from("c");
        for payload in ["one", "two", "three"] {
            assert!(set.forward(id, &channel, Bytes::from(payload)).await);
        }

        for expected in ["one", "two", "three"] {
            let got = time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("delivery within 1s")
                .expect("payload");
            assert_eq!(got, Bytes::from(expected));
        }
    }

    #[tokio::test]
    async fn test_forward_to_unknown_subscriber_is_dropped() {
        let set = OutboxSet::new(16, Bus::new(8));
        let channel: Arc<str> = Arc::from("c");
        assert!(
            !set.forward(SubscriberId::from_raw(99), &channel, Bytes::from("x"))
                .await
        );
    }

    #[tokio::test]
    async fn test_detach_stops_forwarding() {
        let set = OutboxSet::new(16, Bus::new(8));
        let id = SubscriberId::from_raw(2);
        let (sink, _rx) = recorder();
        set.attach(id, sink).await;

        assert!(set.detach(id).await);
        assert!(!set.detach(id).await);

        let channel: Arc<str> = Arc::from("c");
        assert!(!set.forward(id, &channel, Bytes::from("late")).await);
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_payloads() {
        let set = OutboxSet::new(16, Bus::new(8));
        let id = SubscriberId::from_raw(3);
        let (sink, mut rx) = recorder();
        set.attach(id, sink).await;

        let channel: Arc<str> = Arc::from("c");
        assert!(set.forward(id, &channel, Bytes::from("last")).await);

        let stuck = set.shutdown(Duration::from_secs(1)).await;
        assert!(stuck.is_empty());
        assert_eq!(rx.recv().await, Some(Bytes::from("last")));
    }

    #[tokio::test]
    async fn test_shutdown_reports_stuck_outbox() {
        struct Stuck;

        #[async_trait]
        impl Outbound for Stuck {
            async fn send(&self, _payload: Bytes) -> Result<(), TransportError> {
                std::future::pending::<()>().await;
                Ok(())
            }

            fn name(&self) -> &str {
                "stuck"
            }
        }

        let set = OutboxSet::new(16, Bus::new(8));
        let id = SubscriberId::from_raw(4);
        set.attach(id, Arc::new(Stuck)).await;

        let channel: Arc<str> = Arc::from("c");
        assert!(set.forward(id, &channel, Bytes::from("x")).await);
        // Let the worker pick the payload up and park inside send().
        tokio::task::yield_now().await;

        let stuck = set.shutdown(Duration::from_millis(50)).await;
        assert_eq!(stuck, vec!["stuck".to_string()]);
    }
}

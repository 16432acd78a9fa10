//! In-process message bus standing in for the host's broadcast channel.
//!
//! The console side sends [`HostRequest`]s and registers listeners for inbound
//! [`HostReply`]s; the host side drains requests and posts replies. There is no
//! request id anywhere: listeners select messages with a predicate only.
//!
//! Delivery of one inbound message:
//! - every persistent subscriber whose predicate matches gets a copy;
//! - the oldest pending one-shot listener whose predicate matches claims it
//!   and is deregistered in the same critical section;
//! - a message nobody matches is dropped.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};

use crate::error::ConsoleError;
use crate::protocol::{HostReply, HostRequest};

type Predicate = Box<dyn Fn(&HostReply) -> bool + Send + Sync>;

enum Sink {
    Persistent(mpsc::UnboundedSender<HostReply>),
    Once(oneshot::Sender<HostReply>),
}

struct Listener {
    predicate: Predicate,
    sink: Sink,
}

struct BusInner {
    /// Insertion order is registration order; one-shot claims rely on it.
    listeners: Mutex<IndexMap<u64, Listener>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl BusInner {
    fn register(&self, predicate: Predicate, sink: Sink) -> Option<u64> {
        let mut listeners = self.listeners.lock();
        // Checked under the lock so a concurrent `close` cannot miss this listener.
        if self.closed.load(Ordering::Acquire) {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        listeners.insert(id, Listener { predicate, sink });
        tracing::trace!(listener = id, total = listeners.len(), "listener registered");
        Some(id)
    }

    fn deregister(&self, id: u64) {
        if self.listeners.lock().shift_remove(&id).is_some() {
            tracing::trace!(listener = id, "listener deregistered");
        }
    }

    fn deliver(&self, reply: &HostReply) -> usize {
        let mut listeners = self.listeners.lock();
        let mut delivered = 0;
        let mut claimant = None;

        for (id, listener) in listeners.iter() {
            if !(listener.predicate)(reply) {
                continue;
            }
            match &listener.sink {
                Sink::Persistent(tx) => {
                    if tx.send(reply.clone()).is_ok() {
                        delivered += 1;
                    }
                }
                Sink::Once(_) => {
                    if claimant.is_none() {
                        claimant = Some(*id);
                    }
                }
            }
        }

        if let Some(id) = claimant {
            if let Some(Listener {
                sink: Sink::Once(tx),
                ..
            }) = listeners.shift_remove(&id)
            {
                if tx.send(reply.clone()).is_ok() {
                    delivered += 1;
                }
                tracing::trace!(listener = id, "one-shot listener resolved");
            }
        }

        if delivered == 0 {
            tracing::debug!(reply = ?reply.kind(), "inbound message matched no listener, dropped");
        }
        delivered
    }

    fn close(&self) {
        let mut listeners = self.listeners.lock();
        self.closed.store(true, Ordering::Release);
        let pending = listeners.len();
        // Dropping the sinks wakes every waiter with a closed-channel error.
        listeners.clear();
        tracing::debug!(pending, "message bus closed");
    }
}

/// Constructor for a connected pair of endpoints.
pub struct MessageBus;

impl MessageBus {
    pub fn channel() -> (ConsoleEndpoint, HostEndpoint) {
        let (tx, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(BusInner {
            listeners: Mutex::new(IndexMap::new()),
            next_id: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        });
        (
            ConsoleEndpoint {
                inner: Arc::clone(&inner),
                requests: tx,
            },
            HostEndpoint {
                inner,
                requests: rx,
            },
        )
    }
}

// ── Console side ────────────────────────────────────────────────

/// The console's handle on the bus. Cheap to clone.
#[derive(Clone)]
pub struct ConsoleEndpoint {
    inner: Arc<BusInner>,
    requests: mpsc::UnboundedSender<HostRequest>,
}

impl ConsoleEndpoint {
    /// Broadcast a request to the host.
    pub fn send(&self, request: HostRequest) -> Result<(), ConsoleError> {
        if self.inner.closed.load(Ordering::Acquire) {
            return Err(ConsoleError::BridgeClosed);
        }
        tracing::debug!(request = request.type_name(), "sending to host");
        self.requests
            .send(request)
            .map_err(|_| ConsoleError::BridgeClosed)
    }

    /// Observe every inbound message matching `predicate` until the handle drops.
    pub fn subscribe<F>(&self, predicate: F) -> Subscription
    where
        F: Fn(&HostReply) -> bool + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self
            .inner
            .register(Box::new(predicate), Sink::Persistent(tx));
        Subscription {
            inner: Arc::clone(&self.inner),
            id,
            rx,
        }
    }

    /// Wait for the first inbound message matching `predicate` that no older
    /// one-shot listener claims.
    pub fn subscribe_once<F>(&self, predicate: F) -> OneShot
    where
        F: Fn(&HostReply) -> bool + Send + Sync + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let id = self.inner.register(Box::new(predicate), Sink::Once(tx));
        OneShot {
            inner: Arc::clone(&self.inner),
            id,
            rx,
        }
    }

    /// Number of listeners currently registered.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

/// Persistent subscription. Deregisters on drop.
pub struct Subscription {
    inner: Arc<BusInner>,
    id: Option<u64>,
    rx: mpsc::UnboundedReceiver<HostReply>,
}

impl Subscription {
    /// Next matching message, or `None` once the bus is closed.
    pub async fn recv(&mut self) -> Option<HostReply> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.inner.deregister(id);
        }
    }
}

/// Single-shot listener. Deregisters on resolution or on drop, whichever
/// happens first.
pub struct OneShot {
    inner: Arc<BusInner>,
    id: Option<u64>,
    rx: oneshot::Receiver<HostReply>,
}

impl OneShot {
    pub async fn wait(mut self) -> Result<HostReply, ConsoleError> {
        (&mut self.rx).await.map_err(|_| ConsoleError::BridgeClosed)
    }
}

impl Drop for OneShot {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.inner.deregister(id);
        }
    }
}

// ── Host side ───────────────────────────────────────────────────

/// The host's handle on the bus: a request stream plus a [`Replier`].
pub struct HostEndpoint {
    inner: Arc<BusInner>,
    requests: mpsc::UnboundedReceiver<HostRequest>,
}

impl HostEndpoint {
    /// Next request sent by the console, or `None` when every console handle is gone.
    pub async fn next_request(&mut self) -> Option<HostRequest> {
        self.requests.recv().await
    }

    pub fn replier(&self) -> Replier {
        Replier {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Posts replies onto the bus. Cheap to clone.
#[derive(Clone)]
pub struct Replier {
    inner: Arc<BusInner>,
}

impl Replier {
    /// Broadcast a reply. Returns how many listeners received it.
    pub fn reply(&self, reply: &HostReply) -> usize {
        self.inner.deliver(reply)
    }

    /// Tear the bus down: pending listeners resolve with `BridgeClosed` and
    /// further sends fail.
    pub fn close(&self) {
        self.inner.close();
    }
}

//! Connectivity observation
//!
//! Reports the current online/offline state and emits edge-triggered
//! transitions to subscribers. A subscription unsubscribes when dropped.

mod probe;

pub use probe::HttpProbe;

use tokio::sync::watch;
use tracing::debug;

/// An online/offline transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    /// The device went from offline to online
    WentOnline,
    /// The device went from online to offline
    WentOffline,
}

/// Source of connectivity state
pub trait ConnectivityObserver: Send + Sync {
    /// Current state
    fn is_online(&self) -> bool;

    /// Start receiving transitions; dropping the subscription unsubscribes
    fn subscribe(&self) -> ConnectivitySubscription;
}

/// Stream of connectivity transitions for one subscriber
///
/// Rapid flapping between polls collapses into the net change: a
/// subscriber only sees an event when the state differs from the last
/// state it observed.
#[derive(Debug)]
pub struct ConnectivitySubscription {
    rx: watch::Receiver<bool>,
    last_seen: bool,
}

impl ConnectivitySubscription {
    /// Wrap a watch receiver, treating the current value as already seen
    pub fn new(mut rx: watch::Receiver<bool>) -> Self {
        let last_seen = *rx.borrow_and_update();
        Self { rx, last_seen }
    }

    /// Current state
    pub fn is_online(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for the next transition
    ///
    /// Returns `None` once the observer has gone away.
    pub async fn next_event(&mut self) -> Option<ConnectivityEvent> {
        loop {
            if let Some(event) = self.poll_event() {
                return Some(event);
            }
            self.rx.changed().await.ok()?;
        }
    }

    /// Consume any pending change without waiting
    ///
    /// Used after a long-running operation to pick up a transition that
    /// happened while the subscriber was busy.
    pub fn poll_event(&mut self) -> Option<ConnectivityEvent> {
        let online = *self.rx.borrow_and_update();
        if online == self.last_seen {
            return None;
        }
        self.last_seen = online;
        Some(if online {
            ConnectivityEvent::WentOnline
        } else {
            ConnectivityEvent::WentOffline
        })
    }

    /// Record the current state as seen, discarding any pending edge
    pub fn mark_seen(&mut self) {
        self.last_seen = *self.rx.borrow_and_update();
    }

    /// Override the last observed state
    ///
    /// If the live state differs, the next poll reports the edge.
    pub fn record_seen(&mut self, online: bool) {
        self.last_seen = online;
    }

    /// Resolve once the device is offline
    ///
    /// Resolves immediately if already offline. Never resolves if the
    /// observer goes away while online.
    pub async fn offline(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|online| !*online).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Connectivity state driven by explicit updates
///
/// Used directly when connectivity is known by other means (the `--offline`
/// flag, tests) and as the sink for [`HttpProbe`].
#[derive(Debug)]
pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    /// Create a monitor with an initial state
    pub fn new(online: bool) -> Self {
        let (tx, _rx) = watch::channel(online);
        Self { tx }
    }

    /// Update the state; subscribers are only woken on a real change
    pub fn set_online(&self, online: bool) {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            debug!(online, "connectivity changed");
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl ConnectivityObserver for ConnectivityMonitor {
    fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> ConnectivitySubscription {
        ConnectivitySubscription::new(self.tx.subscribe())
    }
}

use tokio::sync::broadcast;

/// Capacity of the change channel. Signals carry no data, so a lagging
/// subscriber only ever misses redundant refresh hints.
const BUS_CAPACITY: usize = 16;

/// Marker broadcast whenever some part of the app creates or mutates an
/// alert as a side effect. Carries no payload; receivers refetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertsChanged;

/// Broadcast channel distributing [`AlertsChanged`] signals process-wide.
#[derive(Debug, Clone)]
pub struct AlertsBus {
    tx: broadcast::Sender<AlertsChanged>,
}

impl AlertsBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Fire a change signal. Succeeds even with no live subscriber.
    pub fn publish(&self) {
        let _ = self.tx.send(AlertsChanged);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AlertsChanged> {
        self.tx.subscribe()
    }
}

impl Default for AlertsBus {
    fn default() -> Self {
        Self::new()
    }
}

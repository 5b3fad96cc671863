//! Scan lifecycle notifications for external collaborators.

use std::sync::mpsc;
use std::time::Duration;

use buddhabrot4d_core::BuddhabrotConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEventKind {
    ScanStart,
    ScanEnd,
}

impl ScanEventKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::ScanStart => "scan-start",
            Self::ScanEnd => "scan-end",
        }
    }
}

/// Emitted when a scan starts and when it ends. `success` is always `true`
/// on start; on end it is `false` iff the scan was canceled.
#[derive(Debug, Clone)]
pub struct ScanEvent {
    pub kind: ScanEventKind,
    /// Configuration the scan ran with.
    pub config: BuddhabrotConfig,
    pub success: bool,
    /// Time since the engine was created.
    pub timestamp: Duration,
}

/// Fan-out of events to any number of channel subscribers. Dropping a
/// receiver unsubscribes it.
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Vec<mpsc::Sender<ScanEvent>>,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self) -> mpsc::Receiver<ScanEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn emit(&mut self, event: ScanEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}

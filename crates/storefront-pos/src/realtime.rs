//! # Realtime Channel
//!
//! Events pushed to the counter from outside the cashier's own input: a
//! customer picked on the companion display, a barcode from a paired
//! scanner.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Companion display ──┐                                                  │
//! │  Paired scanner ─────┼──► RealtimeChannel::publish(event)               │
//! │  Back office ────────┘           │  tokio::sync::broadcast              │
//! │                                  ▼                                      │
//! │                  RealtimeSubscription::next() ──► PosTerminal           │
//! │                                                   apply_realtime()      │
//! │                                                   (last write wins)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A subscriber that falls more than `channel_capacity` events behind skips
//! the oldest ones and keeps going.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use storefront_core::Customer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeEvent {
    CustomerSelected { customer: Customer },
    CustomerCleared,
    BarcodeScanned { code: String },
}

#[derive(Debug, Clone)]
pub struct RealtimeChannel {
    sender: broadcast::Sender<RealtimeEvent>,
}

impl RealtimeChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        RealtimeChannel { sender }
    }

    /// Returns how many subscribers will see the event.
    pub fn publish(&self, event: RealtimeEvent) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => receivers,
            Err(broadcast::error::SendError(event)) => {
                debug!(?event, "Realtime event dropped, no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> RealtimeSubscription {
        RealtimeSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

pub struct RealtimeSubscription {
    receiver: broadcast::Receiver<RealtimeEvent>,
}

impl RealtimeSubscription {
    /// Next event, or `None` once every sender is gone.
    pub async fn next(&mut self) -> Option<RealtimeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Realtime subscriber lagged, skipping old events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

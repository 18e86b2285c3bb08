//! # Connectivity Banner
//!
//! Tracks whether the terminal can reach the back office and offers the
//! notice the UI shows while it cannot. Nothing is queued while offline;
//! writes fail through their gateways as usual.
//!
//! ```text
//! platform online/offline event ──► ConnectivityMonitor::set(state)
//!                                        │  tokio::sync::watch
//!                                        ▼
//!                           banner() / subscribe().changed()
//! ```

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    #[default]
    Online,
    Offline,
}

impl std::fmt::Display for Connectivity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Connectivity::Online => write!(f, "online"),
            Connectivity::Offline => write!(f, "offline"),
        }
    }
}

pub const OFFLINE_BANNER: &str =
    "You are offline. Changes cannot be saved until the connection is back.";

#[derive(Debug)]
pub struct ConnectivityMonitor {
    sender: watch::Sender<Connectivity>,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(Connectivity::Online)
    }
}

impl ConnectivityMonitor {
    pub fn new(initial: Connectivity) -> Self {
        let (sender, _) = watch::channel(initial);
        ConnectivityMonitor { sender }
    }

    /// Returns true when the state actually changed.
    pub fn set(&self, state: Connectivity) -> bool {
        let changed = self.sender.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if changed {
            info!(%state, "Connectivity changed");
        }
        changed
    }

    pub fn current(&self) -> Connectivity {
        *self.sender.borrow()
    }

    pub fn is_online(&self) -> bool {
        self.current() == Connectivity::Online
    }

    /// The notice to show, if any.
    pub fn banner(&self) -> Option<&'static str> {
        match self.current() {
            Connectivity::Online => None,
            Connectivity::Offline => Some(OFFLINE_BANNER),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.sender.subscribe()
    }
}

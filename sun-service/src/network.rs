use common::models::NetworkState;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Connectivity flag, flipped by online/offline events.
pub struct NetworkStatus {
    online: AtomicBool,
}

impl NetworkStatus {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> NetworkState {
        if self.is_online() {
            NetworkState::Online
        } else {
            NetworkState::Offline
        }
    }

    /// Returns true when the state actually changed
    pub fn set_online(&self, online: bool) -> bool {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            info!(online, "Connectivity changed");
        }
        previous != online
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_changes_only() {
        let status = NetworkStatus::new(true);
        assert!(!status.set_online(true));
        assert!(status.set_online(false));
        assert_eq!(status.state(), NetworkState::Offline);
    }
}

//! Network reachability signal.

use std::sync::atomic::{AtomicBool, Ordering};

/// Reports whether the network is currently reachable.
///
/// Engines sample this once at the start of every operation; a flip while
/// an operation is in flight does not change that operation's path.
pub trait Reachability: Send + Sync {
    /// Returns true when the network is unreachable.
    fn is_offline(&self) -> bool;
}

/// An atomic reachability flag, flipped by the host's connectivity events.
#[derive(Debug)]
pub struct NetworkStatus {
    offline: AtomicBool,
}

impl NetworkStatus {
    /// Creates a status flag, initially online.
    pub fn online() -> Self {
        Self {
            offline: AtomicBool::new(false),
        }
    }

    /// Creates a status flag, initially offline.
    pub fn offline() -> Self {
        Self {
            offline: AtomicBool::new(true),
        }
    }

    /// Updates the flag.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self::online()
    }
}

impl Reachability for NetworkStatus {
    fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }
}

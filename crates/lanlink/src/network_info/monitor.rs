//! Network change monitoring.
//!
//! An operator hosting a link server cares about one thing between sessions:
//! is the machine still reachable, and at which addresses. [`NetworkMonitor`]
//! watches interface changes with platform-native APIs and reports them
//! through a host callback, so a UI can refresh its displayed addresses
//! without polling.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{NetworkError, Result};

/// Event describing a change in local connectivity.
#[derive(Debug, Clone)]
pub struct ConnectivityChange {
    /// Whether any non-loopback interface with an address is up after the
    /// change.
    pub is_online: bool,
    /// Interfaces that were added.
    pub added: Vec<InterfaceChange>,
    /// Interfaces that were removed.
    pub removed: Vec<InterfaceChange>,
}

/// Information about an interface that appeared or disappeared.
#[derive(Debug, Clone)]
pub struct InterfaceChange {
    /// Index of the interface.
    pub index: u32,
    /// Name of the interface, when the current snapshot still knows it.
    /// Removed interfaces are no longer in the snapshot, so their names are
    /// not available.
    pub name: Option<String>,
}

/// Watches network interfaces and reports changes to a host callback.
///
/// # Example
///
/// ```ignore
/// use lanlink::network_info::NetworkMonitor;
///
/// let monitor = NetworkMonitor::new();
/// monitor.start(|change| {
///     if change.is_online {
///         println!("addresses changed:\n{}", lanlink::network_info::host_ip_report());
///     } else {
///         println!("network is offline");
///     }
/// })?;
/// ```
pub struct NetworkMonitor {
    inner: Arc<Mutex<MonitorInner>>,
}

struct MonitorInner {
    /// Whether monitoring is active.
    is_running: bool,
    /// Current online state.
    is_online: bool,
    /// Handle to stop the watcher (drop to stop).
    _watcher_handle: Option<netwatcher::WatchHandle>,
}

impl NetworkMonitor {
    /// Create a new network monitor.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MonitorInner {
                is_running: false,
                is_online: check_online_state(),
                _watcher_handle: None,
            })),
        }
    }

    /// Check if the host currently looks online.
    ///
    /// `true` when at least one non-loopback interface is up with an IP
    /// address assigned. This says nothing about internet reachability.
    pub fn is_online(&self) -> bool {
        self.inner.lock().is_online
    }

    /// Check if the monitor is currently running.
    pub fn is_running(&self) -> bool {
        self.inner.lock().is_running
    }

    /// Start watching for interface changes.
    ///
    /// The callback fires on the watcher's own thread whenever interfaces
    /// appear, disappear, or the online state flips. Starting an already
    /// running monitor is a no-op.
    pub fn start<F>(&self, on_change: F) -> Result<()>
    where
        F: Fn(&ConnectivityChange) + Send + Sync + 'static,
    {
        let mut inner = self.inner.lock();
        if inner.is_running {
            return Ok(());
        }

        let inner_clone = Arc::clone(&self.inner);

        let handle = netwatcher::watch_interfaces(move |update| {
            // The diff carries interface indices; names come from the
            // current snapshot when the interface is still present.
            let added: Vec<InterfaceChange> = update
                .diff
                .added
                .iter()
                .map(|&ifindex| InterfaceChange {
                    index: ifindex,
                    name: update.interfaces.get(&ifindex).map(|i| i.name.clone()),
                })
                .collect();

            let removed: Vec<InterfaceChange> = update
                .diff
                .removed
                .iter()
                .map(|&ifindex| InterfaceChange {
                    index: ifindex,
                    name: None,
                })
                .collect();

            let is_online = check_online_state();
            let online_flipped = {
                let mut guard = inner_clone.lock();
                let flipped = guard.is_online != is_online;
                guard.is_online = is_online;
                flipped
            };

            // Callback runs outside the lock.
            if online_flipped || !added.is_empty() || !removed.is_empty() {
                on_change(&ConnectivityChange {
                    is_online,
                    added,
                    removed,
                });
            }
        })
        .map_err(|e| NetworkError::Io(e.to_string()))?;

        inner._watcher_handle = Some(handle);
        inner.is_running = true;
        tracing::debug!(target: "lanlink::network_info", "interface watcher started");

        Ok(())
    }

    /// Stop watching for interface changes.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        if inner.is_running {
            tracing::debug!(target: "lanlink::network_info", "interface watcher stopped");
        }
        inner._watcher_handle = None;
        inner.is_running = false;
    }
}

impl Default for NetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NetworkMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

/// `true` if at least one non-loopback interface is up with an address.
fn check_online_state() -> bool {
    netdev::get_interfaces().iter().any(|iface| {
        iface.is_up() && !iface.is_loopback() && (!iface.ipv4.is_empty() || !iface.ipv6.is_empty())
    })
}

//! In-memory registry of live device and dashboard channels.
//!
//! Owns the only shared mutable state in the service: a per-device map with
//! at most one live handle per device identity, and an unordered set of
//! anonymous dashboard channels. All mutation goes through the operations
//! here; delivery failures are logged and swallowed, never surfaced to HTTP
//! callers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::services::messages::OutboundMessage;
use crate::services::metrics;

pub type DeviceId = i64;

static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// Frame queued on a channel handle. The socket task drains these into the
/// websocket sink; `Close` tells it to shut the connection down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Message(String),
    Close,
}

/// Live handle to one open channel. The registry is the only writer once a
/// handle is registered; the socket task owns the receiving end.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    id: u64,
    tx: mpsc::UnboundedSender<OutboundFrame>,
}

impl ChannelHandle {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<OutboundFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = ChannelHandle {
            id: NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed),
            tx,
        };
        (handle, rx)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    fn send_text(&self, text: String) -> Result<(), ()> {
        self.tx.send(OutboundFrame::Message(text)).map_err(|_| ())
    }

    /// Ask the owning socket task to close the connection.
    pub fn close(&self) {
        let _ = self.tx.send(OutboundFrame::Close);
    }
}

#[derive(Default)]
struct RegistryState {
    devices: HashMap<DeviceId, ChannelHandle>,
    clients: Vec<ChannelHandle>,
}

/// Connection registry. Stored once in `AppState`, shared by reference.
#[derive(Default)]
pub struct ConnectionRegistry {
    state: Mutex<RegistryState>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // No await ever happens while this guard is held; sends below are
    // synchronous channel pushes, so each operation is a critical section.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a channel. A device identity holds at most one live handle:
    /// a reconnect supersedes the previous handle, which is explicitly
    /// closed so its socket task shuts down instead of leaking.
    pub fn connect(&self, handle: ChannelHandle, device_id: Option<DeviceId>) {
        match device_id {
            Some(id) => {
                let handle_id = handle.id;
                let superseded = {
                    let mut state = self.lock();
                    state
                        .devices
                        .insert(id, handle)
                        .filter(|prev| prev.id != handle_id)
                };
                if let Some(old) = superseded {
                    tracing::debug!(
                        device_id = id,
                        old_handle = old.id,
                        new_handle = handle_id,
                        "Device reconnected, closing superseded channel"
                    );
                    old.close();
                }
                tracing::info!(
                    device_id = id,
                    devices = self.device_count(),
                    "Device channel connected"
                );
            }
            None => {
                self.lock().clients.push(handle);
                tracing::info!(clients = self.client_count(), "Dashboard channel connected");
            }
        }
        self.update_gauges();
    }

    /// Deregister a channel. Removal only happens when the stored handle is
    /// the caller's own, so a stale disconnect racing a reconnect never
    /// evicts the newer handle. No-op when already absent.
    pub fn disconnect(&self, handle: &ChannelHandle, device_id: Option<DeviceId>) {
        match device_id {
            Some(id) => {
                let removed = {
                    let mut state = self.lock();
                    match state.devices.get(&id) {
                        Some(current) if current.id == handle.id => {
                            state.devices.remove(&id);
                            true
                        }
                        _ => false,
                    }
                };
                if removed {
                    tracing::info!(
                        device_id = id,
                        devices = self.device_count(),
                        "Device channel disconnected"
                    );
                }
            }
            None => {
                let mut state = self.lock();
                let before = state.clients.len();
                state.clients.retain(|c| c.id != handle.id);
                let removed = state.clients.len() < before;
                drop(state);
                if removed {
                    tracing::info!(
                        clients = self.client_count(),
                        "Dashboard channel disconnected"
                    );
                }
            }
        }
        self.update_gauges();
    }

    /// Deliver a message to one device. Returns false when the device has no
    /// live handle (expected, not an error) or the send fails, in which case
    /// the stale mapping is evicted.
    pub fn send_to_device(&self, device_id: DeviceId, message: &OutboundMessage) -> bool {
        let Some(text) = self.encode(message) else {
            return false;
        };

        let handle = self.lock().devices.get(&device_id).cloned();
        let Some(handle) = handle else {
            tracing::debug!(device_id, "No active channel for device, message dropped");
            return false;
        };

        if handle.send_text(text).is_ok() {
            tracing::debug!(device_id, "Message delivered to device channel");
            return true;
        }

        // Evict only if the failed handle is still the registered one.
        let mut state = self.lock();
        if state.devices.get(&device_id).map(|h| h.id) == Some(handle.id) {
            state.devices.remove(&device_id);
        }
        drop(state);
        self.update_gauges();
        tracing::warn!(device_id, "Send to device failed, stale channel evicted");
        false
    }

    /// Best-effort fan-out to every dashboard channel; failed handles are
    /// removed after the sweep.
    pub fn broadcast(&self, message: &OutboundMessage) {
        let Some(text) = self.encode(message) else {
            return;
        };

        let targets = self.lock().clients.clone();
        let mut failed: Vec<u64> = Vec::new();
        for client in &targets {
            if client.send_text(text.clone()).is_err() {
                tracing::warn!(handle = client.id, "Broadcast send failed");
                failed.push(client.id);
            }
        }

        if !failed.is_empty() {
            self.lock().clients.retain(|c| !failed.contains(&c.id));
            self.update_gauges();
        }
    }

    /// Direct unicast to one handle, e.g. protocol replies on a device's own
    /// channel. Failure is logged and does not touch registry state; the
    /// socket task owns this handle's lifecycle.
    pub fn send_to_handle(&self, handle: &ChannelHandle, message: &OutboundMessage) {
        let Some(text) = self.encode(message) else {
            return;
        };
        if handle.send_text(text).is_err() {
            tracing::warn!(handle = handle.id, "Send to channel handle failed");
        }
    }

    pub fn device_count(&self) -> usize {
        self.lock().devices.len()
    }

    pub fn client_count(&self) -> usize {
        self.lock().clients.len()
    }

    fn encode(&self, message: &OutboundMessage) -> Option<String> {
        match serde_json::to_string(message) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode outbound message");
                None
            }
        }
    }

    fn update_gauges(&self) {
        let (devices, clients) = {
            let state = self.lock();
            (state.devices.len() as i64, state.clients.len() as i64)
        };
        metrics::set_connection_gauges(devices, clients);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn ping() -> OutboundMessage {
        OutboundMessage::PinAccess {
            valid: true,
            user_name: "Ana".to_string(),
            message: "Welcome Ana".to_string(),
        }
    }

    fn recv_message(rx: &mut UnboundedReceiver<OutboundFrame>) -> String {
        match rx.try_recv().expect("expected a frame") {
            OutboundFrame::Message(text) => text,
            OutboundFrame::Close => panic!("unexpected close frame"),
        }
    }

    #[tokio::test]
    async fn send_to_registered_device_delivers() {
        let registry = ConnectionRegistry::new();
        let (handle, mut rx) = ChannelHandle::new();
        registry.connect(handle, Some(1));

        assert!(registry.send_to_device(1, &ping()));
        let text = recv_message(&mut rx);
        assert!(text.contains("\"pin_access\""));
    }

    #[tokio::test]
    async fn send_to_unknown_device_is_not_delivered_and_has_no_side_effect() {
        let registry = ConnectionRegistry::new();
        assert!(!registry.send_to_device(42, &ping()));
        assert_eq!(registry.device_count(), 0);
    }

    #[tokio::test]
    async fn reconnect_supersedes_and_closes_old_handle() {
        let registry = ConnectionRegistry::new();
        let (h1, mut rx1) = ChannelHandle::new();
        let (h2, mut rx2) = ChannelHandle::new();
        registry.connect(h1, Some(1));
        registry.connect(h2, Some(1));

        assert_eq!(registry.device_count(), 1);

        // Old handle received an explicit close; new handle gets the traffic.
        assert_eq!(rx1.try_recv().unwrap(), OutboundFrame::Close);
        assert!(registry.send_to_device(1, &ping()));
        assert!(rx1.try_recv().is_err());
        recv_message(&mut rx2);
    }

    #[tokio::test]
    async fn stale_disconnect_is_a_noop() {
        let registry = ConnectionRegistry::new();
        let (h1, _rx1) = ChannelHandle::new();
        let (h2, mut rx2) = ChannelHandle::new();
        registry.connect(h1.clone(), Some(1));
        registry.connect(h2, Some(1));

        // h1 was superseded; its late disconnect must not evict h2.
        registry.disconnect(&h1, Some(1));
        assert_eq!(registry.device_count(), 1);
        assert!(registry.send_to_device(1, &ping()));
        recv_message(&mut rx2);
    }

    #[tokio::test]
    async fn disconnect_removes_own_handle() {
        let registry = ConnectionRegistry::new();
        let (h1, _rx) = ChannelHandle::new();
        registry.connect(h1.clone(), Some(1));
        registry.disconnect(&h1, Some(1));
        assert_eq!(registry.device_count(), 0);
        assert!(!registry.send_to_device(1, &ping()));
    }

    #[tokio::test]
    async fn failed_send_evicts_device_handle() {
        let registry = ConnectionRegistry::new();
        let (h1, rx) = ChannelHandle::new();
        registry.connect(h1, Some(1));
        drop(rx); // socket task gone

        assert!(!registry.send_to_device(1, &ping()));
        assert_eq!(registry.device_count(), 0);
    }

    #[tokio::test]
    async fn broadcast_reaches_all_clients_and_evicts_failures() {
        let registry = ConnectionRegistry::new();
        let (c1, mut rx1) = ChannelHandle::new();
        let (c2, rx2) = ChannelHandle::new();
        let (c3, mut rx3) = ChannelHandle::new();
        registry.connect(c1, None);
        registry.connect(c2, None);
        registry.connect(c3, None);
        drop(rx2);

        registry.broadcast(&ping());

        recv_message(&mut rx1);
        recv_message(&mut rx3);
        assert_eq!(registry.client_count(), 2);
    }

    #[tokio::test]
    async fn send_to_handle_does_not_mutate_registry() {
        let registry = ConnectionRegistry::new();
        let (h1, mut rx) = ChannelHandle::new();
        registry.connect(h1.clone(), Some(1));

        registry.send_to_handle(&h1, &ping());
        recv_message(&mut rx);

        // A failed unicast leaves the registration untouched.
        let (h2, rx2) = ChannelHandle::new();
        drop(rx2);
        registry.send_to_handle(&h2, &ping());
        assert_eq!(registry.device_count(), 1);
    }

    #[tokio::test]
    async fn client_disconnect_removes_only_that_handle() {
        let registry = ConnectionRegistry::new();
        let (c1, _rx1) = ChannelHandle::new();
        let (c2, _rx2) = ChannelHandle::new();
        registry.connect(c1.clone(), None);
        registry.connect(c2, None);

        registry.disconnect(&c1, None);
        assert_eq!(registry.client_count(), 1);

        // Disconnecting again is a no-op.
        registry.disconnect(&c1, None);
        assert_eq!(registry.client_count(), 1);
    }
}

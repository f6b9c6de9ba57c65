//! Session abstraction the pipeline consumes.
//!
//! Lobby establishment, membership, and the transport that actually
//! moves bytes all live outside this crate. The pipeline only needs the
//! contract below: who is the designated sender, how many peers are in
//! the room, and a send/receive primitive keyed by an event tag.
//!
//! Role and membership are exposed as a `watch` channel rather than a
//! one-shot query, so a pipeline can react when the sender leaves and a
//! new participant is promoted instead of staying dark until restart.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, broadcast, watch};

use crate::error::StreamError;

// ── Roles & status ───────────────────────────────────────────────

/// What this endpoint is allowed to do in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// The designated sender of the stream.
    Sender,
    /// A receiving participant.
    Viewer,
}

/// A snapshot of this endpoint's standing in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    /// Whether the session link is up.
    pub connected: bool,
    /// This endpoint's current role.
    pub role: SessionRole,
    /// Number of participants currently in the session.
    pub participants: usize,
}

impl SessionStatus {
    /// Whether this endpoint is currently permitted to stream.
    pub fn eligible(&self) -> bool {
        self.connected && self.role == SessionRole::Sender
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            connected: false,
            role: SessionRole::Viewer,
            participants: 0,
        }
    }
}

// ── StreamSession ────────────────────────────────────────────────

/// Contract the streaming pipeline needs from a session.
#[async_trait]
pub trait StreamSession: Send + Sync {
    /// Watch channel carrying this endpoint's current status. The
    /// pipeline re-evaluates eligibility whenever it changes.
    fn status(&self) -> watch::Receiver<SessionStatus>;

    /// Number of participants currently in the session.
    fn participant_count(&self) -> usize;

    /// Deliver `payload` tagged with `tag` to every *other* participant.
    async fn send_event(&self, tag: u8, payload: Vec<u8>) -> Result<(), StreamError>;

    /// Next inbound `(tag, payload)` event addressed to this endpoint.
    async fn recv_event(&self) -> Result<(u8, Vec<u8>), StreamError>;
}

// ── LoopbackSession ──────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Envelope {
    from: usize,
    tag: u8,
    payload: Vec<u8>,
}

/// In-process message bus standing in for a real session service.
///
/// Every [`LoopbackSession`] joined through one hub sees events sent by
/// every other participant, with at-least-reliable in-process delivery.
/// Used by the demo binary and the integration suite.
pub struct LoopbackHub {
    bus: broadcast::Sender<Envelope>,
    participants: Arc<AtomicUsize>,
}

impl LoopbackHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        let (bus, _) = broadcast::channel(256);
        Self {
            bus,
            participants: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Join the hub with an initial role.
    pub fn join(&self, role: SessionRole) -> LoopbackSession {
        let peer_id = self.participants.fetch_add(1, Ordering::SeqCst);
        let status = SessionStatus {
            connected: true,
            role,
            participants: peer_id + 1,
        };
        let (status_tx, _) = watch::channel(status);

        LoopbackSession {
            peer_id,
            participants: Arc::clone(&self.participants),
            bus_tx: self.bus.clone(),
            bus_rx: Mutex::new(self.bus.subscribe()),
            status_tx,
        }
    }
}

impl Default for LoopbackHub {
    fn default() -> Self {
        Self::new()
    }
}

/// One participant's handle onto a [`LoopbackHub`].
pub struct LoopbackSession {
    peer_id: usize,
    participants: Arc<AtomicUsize>,
    bus_tx: broadcast::Sender<Envelope>,
    bus_rx: Mutex<broadcast::Receiver<Envelope>>,
    status_tx: watch::Sender<SessionStatus>,
}

impl LoopbackSession {
    /// This participant's hub-assigned id.
    pub fn peer_id(&self) -> usize {
        self.peer_id
    }

    /// Push a status change to everything watching this session.
    pub fn set_status(&self, status: SessionStatus) {
        let _ = self.status_tx.send(status);
    }

    /// Change just the role, keeping the rest of the status.
    pub fn set_role(&self, role: SessionRole) {
        let mut status = *self.status_tx.borrow();
        status.role = role;
        let _ = self.status_tx.send(status);
    }

    /// Mark this participant as disconnected.
    pub fn disconnect(&self) {
        let mut status = *self.status_tx.borrow();
        status.connected = false;
        let _ = self.status_tx.send(status);
    }
}

#[async_trait]
impl StreamSession for LoopbackSession {
    fn status(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    fn participant_count(&self) -> usize {
        self.participants.load(Ordering::SeqCst)
    }

    async fn send_event(&self, tag: u8, payload: Vec<u8>) -> Result<(), StreamError> {
        self.bus_tx
            .send(Envelope {
                from: self.peer_id,
                tag,
                payload,
            })
            .map(|_| ())
            .map_err(|_| StreamError::Session("no participants listening".into()))
    }

    async fn recv_event(&self) -> Result<(u8, Vec<u8>), StreamError> {
        let mut rx = self.bus_rx.lock().await;
        loop {
            match rx.recv().await {
                // Delivery is to Others: skip our own events.
                Ok(env) if env.from == self.peer_id => continue,
                Ok(env) => return Ok((env.tag, env.payload)),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return Err(StreamError::ChannelClosed),
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn events_reach_other_participants_only() {
        let hub = LoopbackHub::new();
        let a = hub.join(SessionRole::Sender);
        let b = hub.join(SessionRole::Viewer);

        assert_ok!(a.send_event(1, b"frame".to_vec()).await);
        assert_ok!(a.send_event(2, b"other".to_vec()).await);

        let (tag, payload) = b.recv_event().await.unwrap();
        assert_eq!(tag, 1);
        assert_eq!(payload, b"frame");

        let (tag, _) = b.recv_event().await.unwrap();
        assert_eq!(tag, 2);
    }

    #[tokio::test]
    async fn own_events_are_skipped() {
        let hub = LoopbackHub::new();
        let a = hub.join(SessionRole::Sender);
        let b = hub.join(SessionRole::Viewer);

        a.send_event(1, b"from a".to_vec()).await.unwrap();
        b.send_event(1, b"from b".to_vec()).await.unwrap();

        // `a` must see only b's event.
        let (_, payload) = a.recv_event().await.unwrap();
        assert_eq!(payload, b"from b");
    }

    #[tokio::test]
    async fn role_change_observed_through_watch() {
        let hub = LoopbackHub::new();
        let session = hub.join(SessionRole::Viewer);
        let mut status_rx = session.status();

        assert!(!status_rx.borrow().eligible());

        session.set_role(SessionRole::Sender);
        status_rx.changed().await.unwrap();
        assert!(status_rx.borrow().eligible());
    }

    #[tokio::test]
    async fn participant_count_tracks_joins() {
        let hub = LoopbackHub::new();
        let a = hub.join(SessionRole::Sender);
        assert_eq!(a.participant_count(), 1);
        let _b = hub.join(SessionRole::Viewer);
        assert_eq!(a.participant_count(), 2);
    }
}

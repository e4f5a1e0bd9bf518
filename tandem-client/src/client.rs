use crate::error::SessionError;
use crate::media::{MediaConstraints, MediaSource, MediaStream, TrackKind};
use crate::session::{NegotiationSession, Phase};
use crate::transport::{TransportEvent, TransportFactory};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tandem_core::{ClientSignal, ParticipantId, ServerSignal, SessionBlob};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Outbound half of the relay channel: queues one client signal for the
/// server. The WebSocket writer implements this in production; tests use
/// an in-process loopback.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn emit(&self, signal: ClientSignal);
}

/// Notifications to the presentation layer. The orchestrator never renders
/// anything itself; it reports state changes and streams.
#[derive(Debug, Clone)]
pub enum CallEvent {
    Welcome { id: ParticipantId },
    RoomJoined { room: String },
    RoomFull { room: String },
    PeerJoined { email: String, id: ParticipantId },
    LocalStream(MediaStream),
    RemoteStream { from: ParticipantId, stream: MediaStream },
    PeerBusy { id: ParticipantId },
    PeerLeft { id: ParticipantId },
    CallClosed { id: ParticipantId },
    CallFailed { reason: String },
}

#[derive(Debug, Clone)]
struct RemotePeer {
    id: ParticipantId,
    email: Option<String>,
}

/// Client-side signaling orchestrator.
///
/// Every inbound relay signal goes through [`CallClient::handle_signal`]
/// and every transport callback through
/// [`CallClient::handle_transport_event`]; the embedding application drives
/// both from a single task, so sessions are never mutated concurrently.
/// Sessions live in a registry keyed by remote identity and are removed on
/// hang-up, peer departure, or watchdog expiry; signals for a dead session
/// are dropped with a log line and no other effect.
pub struct CallClient {
    signaling: Arc<dyn SignalSink>,
    transport: Arc<dyn TransportFactory>,
    media: Arc<dyn MediaSource>,
    constraints: MediaConstraints,
    events: mpsc::Sender<CallEvent>,
    transport_tx: mpsc::Sender<(ParticipantId, TransportEvent)>,
    transport_rx: mpsc::Receiver<(ParticipantId, TransportEvent)>,
    local_id: Option<ParticipantId>,
    room: Option<String>,
    remote: Option<RemotePeer>,
    sessions: HashMap<ParticipantId, NegotiationSession>,
}

impl CallClient {
    pub fn new(
        signaling: Arc<dyn SignalSink>,
        transport: Arc<dyn TransportFactory>,
        media: Arc<dyn MediaSource>,
        events: mpsc::Sender<CallEvent>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::channel(64);
        Self {
            signaling,
            transport,
            media,
            constraints: MediaConstraints::default(),
            events,
            transport_tx,
            transport_rx,
            local_id: None,
            room: None,
            remote: None,
            sessions: HashMap::new(),
        }
    }

    pub fn with_constraints(mut self, constraints: MediaConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn local_id(&self) -> Option<&ParticipantId> {
        self.local_id.as_ref()
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub fn remote_id(&self) -> Option<&ParticipantId> {
        self.remote.as_ref().map(|r| &r.id)
    }

    /// Email of the remote peer, known only when it announced itself via
    /// `user:joined` (a bare incoming call carries no email).
    pub fn remote_email(&self) -> Option<&str> {
        self.remote.as_ref().and_then(|r| r.email.as_deref())
    }

    pub fn phase_of(&self, remote: &ParticipantId) -> Option<Phase> {
        self.sessions.get(remote).map(|s| s.phase())
    }

    pub fn local_stream_of(&self, remote: &ParticipantId) -> Option<&MediaStream> {
        self.sessions.get(remote).and_then(|s| s.local_stream())
    }

    pub fn remote_stream_of(&self, remote: &ParticipantId) -> Option<&MediaStream> {
        self.sessions.get(remote).and_then(|s| s.remote_stream())
    }

    pub fn bound_track_count_of(&self, remote: &ParticipantId) -> Option<usize> {
        self.sessions.get(remote).map(|s| s.bound_track_count())
    }

    /// Next transport callback, tagged with the remote peer it belongs to.
    /// The embedding loop feeds these back into
    /// [`CallClient::handle_transport_event`].
    pub async fn next_transport_event(&mut self) -> Option<(ParticipantId, TransportEvent)> {
        self.transport_rx.recv().await
    }

    pub async fn join_room(&self, email: impl Into<String>, room: impl Into<String>) {
        self.signaling
            .emit(ClientSignal::Join { email: email.into(), room: room.into() })
            .await;
    }

    pub async fn leave_room(&mut self) {
        self.close_all_sessions().await;
        self.room = None;
        self.remote = None;
        self.signaling.emit(ClientSignal::Leave {}).await;
    }

    /// Initiates a call to the known remote peer: capture media, generate
    /// the offer, relay it. Fails fast when no peer has joined yet or media
    /// capture is refused; neither failure leaves a session behind.
    pub async fn call(&mut self) -> Result<(), SessionError> {
        let remote = self.remote.as_ref().ok_or(SessionError::NoRemotePeer)?.id.clone();

        if let Some(session) = self.sessions.get(&remote) {
            if matches!(session.phase(), Phase::LocalOfferPending | Phase::Renegotiating) {
                return Err(SessionError::OfferOutstanding);
            }
        }

        let stream = self.media.acquire(self.constraints).await?;
        let _ = self.events.send(CallEvent::LocalStream(stream.clone())).await;

        self.ensure_session(&remote).await?;
        let session = self
            .sessions
            .get_mut(&remote)
            .ok_or(SessionError::NoRemotePeer)?;

        let offer = session.start_call(stream).await?;
        self.signaling
            .emit(ClientSignal::Call { to: remote, offer })
            .await;
        Ok(())
    }

    /// Explicitly re-binds local tracks (idempotent per track) and lets the
    /// transport's negotiation-needed trigger take it from there.
    pub async fn share_streams(&mut self) -> Result<(), SessionError> {
        let Some(session) = self.active_session_mut() else {
            return Err(SessionError::NoRemotePeer);
        };
        session.share_streams().await
    }

    /// Flips local audio tracks; purely local, no signaling. Returns the
    /// new enabled state, or `None` without an active stream.
    pub fn toggle_audio(&mut self) -> Option<bool> {
        self.toggle_tracks(TrackKind::Audio)
    }

    pub fn toggle_video(&mut self) -> Option<bool> {
        self.toggle_tracks(TrackKind::Video)
    }

    /// Ends the active call: closes the endpoint and discards all session
    /// state including the remote identity. Safe in any phase and
    /// idempotent; a new call needs a fresh `user:joined`.
    pub async fn hang_up(&mut self) {
        let Some(remote) = self.remote.take().map(|r| r.id) else {
            return;
        };
        if let Some(mut session) = self.sessions.remove(&remote) {
            session.hang_up().await;
            let _ = self.events.send(CallEvent::CallClosed { id: remote }).await;
        }
    }

    /// Watchdog sweep: closes sessions whose offer has been unanswered for
    /// longer than `timeout`. Driven by a timer in the embedding app.
    pub async fn expire_stalled(&mut self, timeout: Duration) {
        let mut expired = Vec::new();
        for (id, session) in self.sessions.iter_mut() {
            if session.expire_if_stalled(timeout).await {
                expired.push(id.clone());
            }
        }
        for id in expired {
            self.sessions.remove(&id);
            let _ = self
                .events
                .send(CallEvent::CallFailed {
                    reason: format!("negotiation with {id} timed out"),
                })
                .await;
        }
    }

    /// Single dispatch entry point for every inbound relay signal.
    /// Degradable failures (stale signals, refused media) are logged and
    /// reported as events; nothing here panics or tears the client down.
    pub async fn handle_signal(&mut self, signal: ServerSignal) {
        match signal {
            ServerSignal::Welcome { id } => {
                info!("Relay assigned identity {}", id);
                self.local_id = Some(id.clone());
                let _ = self.events.send(CallEvent::Welcome { id }).await;
            }
            ServerSignal::Joined { room } => {
                self.room = Some(room.clone());
                let _ = self.events.send(CallEvent::RoomJoined { room }).await;
            }
            ServerSignal::RoomFull { room } => {
                warn!("Room '{}' is full", room);
                let _ = self.events.send(CallEvent::RoomFull { room }).await;
            }
            ServerSignal::UserJoined { email, id } => {
                info!("{} joined the room as {}", email, id);
                self.remote = Some(RemotePeer { id: id.clone(), email: Some(email.clone()) });
                let _ = self.events.send(CallEvent::PeerJoined { email, id }).await;
            }
            ServerSignal::IncomingCall { from, offer } => {
                self.handle_incoming_call(from, offer).await;
            }
            ServerSignal::CallAccepted { from, ans } => {
                let Some(session) = self.sessions.get_mut(&from) else {
                    debug!("Dropping call:accepted from {} with no session", from);
                    return;
                };
                if let Err(e) = session.complete_call(&ans).await {
                    warn!("Failed to apply answer from {}: {}", from, e);
                }
            }
            ServerSignal::CallBusy { from } => {
                info!("{} is busy", from);
                if let Some(mut session) = self.sessions.remove(&from) {
                    session.hang_up().await;
                }
                let _ = self.events.send(CallEvent::PeerBusy { id: from }).await;
            }
            ServerSignal::NegoOffer { from, offer } => {
                let Some(session) = self.sessions.get_mut(&from) else {
                    debug!("Dropping renegotiation offer from {} with no session", from);
                    return;
                };
                match session.apply_renegotiation_offer(&offer).await {
                    Ok(ans) => {
                        self.signaling
                            .emit(ClientSignal::NegoAnswer { to: from, ans })
                            .await;
                    }
                    Err(e) => warn!("Failed to answer renegotiation from {}: {}", from, e),
                }
            }
            ServerSignal::NegoAnswer { from, ans } => {
                let Some(session) = self.sessions.get_mut(&from) else {
                    debug!("Dropping renegotiation answer from {} with no session", from);
                    return;
                };
                if let Err(e) = session.complete_renegotiation(&ans).await {
                    warn!("Failed to complete renegotiation with {}: {}", from, e);
                }
            }
            ServerSignal::IceCandidate { from, candidate } => {
                let Some(session) = self.sessions.get(&from) else {
                    debug!("Dropping ICE candidate from {} with no session", from);
                    return;
                };
                if let Err(e) = session.endpoint().add_ice_candidate(&candidate).await {
                    warn!("Failed to add ICE candidate from {}: {}", from, e);
                }
            }
            ServerSignal::PeerLeft { id } => {
                info!("Peer {} left the room", id);
                if let Some(mut session) = self.sessions.remove(&id) {
                    session.hang_up().await;
                }
                if self.remote.as_ref().is_some_and(|r| r.id == id) {
                    self.remote = None;
                }
                let _ = self.events.send(CallEvent::PeerLeft { id }).await;
            }
        }
    }

    /// Transport callbacks, tagged by remote peer. Events for a session
    /// that no longer exists (closed mid-flight) are dropped.
    pub async fn handle_transport_event(&mut self, remote: ParticipantId, event: TransportEvent) {
        let Some(session) = self.sessions.get_mut(&remote) else {
            debug!("Dropping transport event for closed session {}", remote);
            return;
        };

        match event {
            TransportEvent::NegotiationNeeded => match session.handle_negotiation_needed().await {
                Ok(Some(offer)) => {
                    self.signaling
                        .emit(ClientSignal::NegoOffer { to: remote, offer })
                        .await;
                }
                Ok(None) => {}
                Err(e) => warn!("Renegotiation offer failed for {}: {}", remote, e),
            },
            TransportEvent::Track(stream) => {
                if let Some(stream) = session.handle_track(stream) {
                    let stream = stream.clone();
                    let _ = self
                        .events
                        .send(CallEvent::RemoteStream { from: remote, stream })
                        .await;
                }
            }
            TransportEvent::CandidateGenerated(candidate) => {
                self.signaling
                    .emit(ClientSignal::IceCandidate { to: remote, candidate })
                    .await;
            }
            TransportEvent::Disconnected => {
                info!("Transport for {} disconnected", remote);
                if let Some(mut session) = self.sessions.remove(&remote) {
                    session.hang_up().await;
                }
                let _ = self.events.send(CallEvent::CallClosed { id: remote }).await;
            }
        }
    }

    async fn handle_incoming_call(&mut self, from: ParticipantId, offer: SessionBlob) {
        // First offer wins: while our own offer is unanswered, a competing
        // incoming call is rejected with a busy signal.
        if self
            .sessions
            .get(&from)
            .is_some_and(|s| matches!(s.phase(), Phase::LocalOfferPending | Phase::Renegotiating))
        {
            info!("Rejecting incoming call from {}, offer already outstanding", from);
            self.signaling.emit(ClientSignal::Busy { to: from }).await;
            return;
        }

        if self.remote.is_none() {
            self.remote = Some(RemotePeer { id: from.clone(), email: None });
        }

        let stream = match self.media.acquire(self.constraints).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Media acquisition failed, aborting incoming call: {}", e);
                let _ = self
                    .events
                    .send(CallEvent::CallFailed { reason: e.to_string() })
                    .await;
                return;
            }
        };
        let _ = self.events.send(CallEvent::LocalStream(stream.clone())).await;

        if let Err(e) = self.ensure_session(&from).await {
            warn!("Failed to create transport endpoint: {}", e);
            let _ = self
                .events
                .send(CallEvent::CallFailed { reason: e.to_string() })
                .await;
            return;
        }

        let session = match self.sessions.get_mut(&from) {
            Some(session) => session,
            None => return,
        };
        match session.accept_incoming(stream, &offer).await {
            Ok(ans) => {
                self.signaling
                    .emit(ClientSignal::Accept { to: from, ans })
                    .await;
            }
            Err(e) => {
                warn!("Failed to accept call from {}: {}", from, e);
                // No half-open session lingers after a failed accept; a
                // retried offer from the peer starts from scratch.
                if let Some(mut session) = self.sessions.remove(&from) {
                    session.hang_up().await;
                }
                let _ = self
                    .events
                    .send(CallEvent::CallFailed { reason: e.to_string() })
                    .await;
            }
        }
    }

    /// Creates the session and its endpoint on first use. Endpoint events
    /// are tagged with the remote identity and funneled into the client's
    /// transport-event queue.
    async fn ensure_session(&mut self, remote: &ParticipantId) -> Result<(), SessionError> {
        if self.sessions.contains_key(remote) {
            return Ok(());
        }

        let (tx, mut rx) = mpsc::channel(32);
        let endpoint = self.transport.create_endpoint(tx).await?;

        let tagged = self.transport_tx.clone();
        let peer = remote.clone();
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if tagged.send((peer.clone(), event)).await.is_err() {
                    break;
                }
            }
        });

        self.sessions
            .insert(remote.clone(), NegotiationSession::new(remote.clone(), endpoint));
        Ok(())
    }

    fn active_session_mut(&mut self) -> Option<&mut NegotiationSession> {
        let remote = self.remote.as_ref()?.id.clone();
        self.sessions.get_mut(&remote)
    }

    fn toggle_tracks(&mut self, kind: TrackKind) -> Option<bool> {
        let session = self.active_session_mut()?;
        let stream = session.local_stream()?;
        let current = stream.tracks_of_kind(kind).next()?.is_enabled();
        session.set_tracks_enabled(kind, !current);
        Some(!current)
    }

    async fn close_all_sessions(&mut self) {
        for (_, mut session) in self.sessions.drain() {
            session.hang_up().await;
        }
    }
}

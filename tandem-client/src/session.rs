use crate::error::SessionError;
use crate::media::{MediaStream, TrackKind};
use crate::transport::TransportEndpoint;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tandem_core::{ParticipantId, SessionBlob};
use tracing::{debug, warn};

/// Negotiation phase of one session.
///
/// Caller path: `Idle → LocalOfferPending → Connected`, callee path:
/// `Idle → RemoteOfferPending → Connected`. Renegotiation moves a
/// connected session to `Renegotiating` and back without touching the
/// established media. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    LocalOfferPending,
    RemoteOfferPending,
    Connected,
    Renegotiating,
    Closed,
}

/// Per-remote-peer negotiation state machine. Owns the transport endpoint
/// exclusively; all mutation happens on the orchestrator's dispatch task,
/// one event at a time.
pub struct NegotiationSession {
    remote: ParticipantId,
    endpoint: Arc<dyn TransportEndpoint>,
    phase: Phase,
    local_stream: Option<MediaStream>,
    remote_stream: Option<MediaStream>,
    bound_tracks: HashSet<String>,
    /// Set while an offer of ours is unanswered; drives the watchdog.
    pending_since: Option<Instant>,
}

impl NegotiationSession {
    pub fn new(remote: ParticipantId, endpoint: Arc<dyn TransportEndpoint>) -> Self {
        Self {
            remote,
            endpoint,
            phase: Phase::Idle,
            local_stream: None,
            remote_stream: None,
            bound_tracks: HashSet::new(),
            pending_since: None,
        }
    }

    pub fn remote(&self) -> &ParticipantId {
        &self.remote
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn local_stream(&self) -> Option<&MediaStream> {
        self.local_stream.as_ref()
    }

    pub fn remote_stream(&self) -> Option<&MediaStream> {
        self.remote_stream.as_ref()
    }

    /// Number of distinct local tracks bound to the endpoint.
    pub fn bound_track_count(&self) -> usize {
        self.bound_tracks.len()
    }

    pub fn endpoint(&self) -> &Arc<dyn TransportEndpoint> {
        &self.endpoint
    }

    /// Caller side: binds the captured stream and produces the initial
    /// offer. At most one offer may be outstanding at a time.
    pub async fn start_call(&mut self, stream: MediaStream) -> Result<SessionBlob, SessionError> {
        match self.phase {
            Phase::Idle => {}
            Phase::LocalOfferPending | Phase::Renegotiating => {
                return Err(SessionError::OfferOutstanding);
            }
            phase => return Err(SessionError::InvalidPhase { phase }),
        }

        self.local_stream = Some(stream);
        self.bind_local_tracks().await?;

        let offer = self.endpoint.create_offer().await?;
        self.phase = Phase::LocalOfferPending;
        self.pending_since = Some(Instant::now());
        Ok(offer)
    }

    /// Callee side: applies the remote offer and produces the answer.
    /// A transport failure rolls the session back to `Idle`, so a retried
    /// offer from the same peer starts clean.
    pub async fn accept_incoming(
        &mut self,
        stream: MediaStream,
        offer: &SessionBlob,
    ) -> Result<SessionBlob, SessionError> {
        if self.phase != Phase::Idle {
            return Err(SessionError::InvalidPhase { phase: self.phase });
        }
        self.phase = Phase::RemoteOfferPending;
        self.local_stream = Some(stream);

        match self.answer_offer(offer).await {
            Ok(answer) => {
                self.phase = Phase::Connected;
                Ok(answer)
            }
            Err(e) => {
                self.phase = Phase::Idle;
                self.local_stream = None;
                Err(e)
            }
        }
    }

    async fn answer_offer(&mut self, offer: &SessionBlob) -> Result<SessionBlob, SessionError> {
        let answer = self.endpoint.create_answer(offer).await?;
        self.bind_local_tracks().await?;
        Ok(answer)
    }

    /// Caller side: the callee answered. Applying the answer always lands
    /// the session in `Connected`, then local tracks are (re-)bound so
    /// media starts flowing.
    pub async fn complete_call(&mut self, answer: &SessionBlob) -> Result<(), SessionError> {
        if self.phase != Phase::LocalOfferPending {
            return Err(SessionError::InvalidPhase { phase: self.phase });
        }

        self.endpoint.set_remote_description(answer).await?;
        self.phase = Phase::Connected;
        self.pending_since = None;

        self.bind_local_tracks().await?;
        Ok(())
    }

    /// The transport asked for renegotiation. Returns the fresh offer to
    /// relay, or `None` when the trigger is moot: after close it is a
    /// no-op, and while an offer is already in flight it is coalesced.
    pub async fn handle_negotiation_needed(
        &mut self,
    ) -> Result<Option<SessionBlob>, SessionError> {
        match self.phase {
            Phase::Connected => {}
            Phase::Closed => return Ok(None),
            Phase::LocalOfferPending | Phase::Renegotiating => {
                debug!("Coalescing negotiation-needed, offer already in flight");
                return Ok(None);
            }
            phase => {
                debug!("Ignoring negotiation-needed in phase {:?}", phase);
                return Ok(None);
            }
        }

        let offer = self.endpoint.create_offer().await?;
        self.phase = Phase::Renegotiating;
        self.pending_since = Some(Instant::now());
        Ok(Some(offer))
    }

    /// Peer side of renegotiation: answer the fresh offer. The externally
    /// visible phase stays `Connected`.
    pub async fn apply_renegotiation_offer(
        &mut self,
        offer: &SessionBlob,
    ) -> Result<SessionBlob, SessionError> {
        if self.phase != Phase::Connected {
            return Err(SessionError::InvalidPhase { phase: self.phase });
        }
        let answer = self.endpoint.create_answer(offer).await?;
        Ok(answer)
    }

    /// Offering side of renegotiation: the peer answered.
    pub async fn complete_renegotiation(
        &mut self,
        answer: &SessionBlob,
    ) -> Result<(), SessionError> {
        if self.phase != Phase::Renegotiating {
            return Err(SessionError::InvalidPhase { phase: self.phase });
        }
        self.endpoint.set_remote_description(answer).await?;
        self.phase = Phase::Connected;
        self.pending_since = None;
        Ok(())
    }

    /// Explicitly (re-)binds the local tracks. Idempotent per track id:
    /// repeating it never changes the observable bound-track count.
    pub async fn share_streams(&mut self) -> Result<(), SessionError> {
        if self.phase == Phase::Closed {
            return Err(SessionError::InvalidPhase { phase: self.phase });
        }
        self.bind_local_tracks().await?;
        Ok(())
    }

    /// An inbound stream arrived. Replaces any previously exposed remote
    /// stream; arrivals after close are dropped.
    pub fn handle_track(&mut self, stream: MediaStream) -> Option<&MediaStream> {
        if self.phase == Phase::Closed {
            debug!("Dropping track arrival on closed session");
            return None;
        }
        self.remote_stream = Some(stream);
        self.remote_stream.as_ref()
    }

    pub fn set_tracks_enabled(&self, kind: TrackKind, enabled: bool) {
        if let Some(stream) = &self.local_stream {
            for track in stream.tracks_of_kind(kind) {
                track.set_enabled(enabled);
            }
        }
    }

    /// Closes the endpoint and discards all session state. Safe from any
    /// phase and idempotent; transport callbacks arriving afterwards are
    /// no-ops.
    pub async fn hang_up(&mut self) {
        if self.phase == Phase::Closed {
            return;
        }
        self.endpoint.close().await;
        self.local_stream = None;
        self.remote_stream = None;
        self.bound_tracks.clear();
        self.pending_since = None;
        self.phase = Phase::Closed;
    }

    /// Watchdog: closes the session if an offer has been unanswered longer
    /// than `timeout`. Returns true when the session was torn down.
    pub async fn expire_if_stalled(&mut self, timeout: Duration) -> bool {
        let stalled = matches!(self.phase, Phase::LocalOfferPending | Phase::Renegotiating)
            && self
                .pending_since
                .is_some_and(|since| since.elapsed() >= timeout);
        if stalled {
            warn!("Negotiation with {} stalled in {:?}, closing", self.remote, self.phase);
            self.hang_up().await;
        }
        stalled
    }

    async fn bind_local_tracks(&mut self) -> Result<(), SessionError> {
        let Some(stream) = self.local_stream.clone() else {
            return Ok(());
        };
        for track in stream.tracks() {
            if self.bound_tracks.contains(track.id()) {
                continue;
            }
            self.endpoint.add_track(track, stream.id()).await?;
            self.bound_tracks.insert(track.id().to_string());
        }
        Ok(())
    }
}

use crate::model::participant::ParticipantId;
use crate::model::session_blob::SessionBlob;
use serde::{Deserialize, Serialize};

/// Signals sent by a client to the relay.
///
/// Wire format is `{"ev": "<event name>", "d": {...}}`. Event names are kept
/// verbatim from the original protocol so existing browser clients keep
/// working, including the historical `incomming:call` spelling on the
/// server-to-client side.
///
/// Addressed variants carry a `to` field; the relay routes on it and stamps
/// the sender's identity into the outgoing `from` field itself, so a client
/// can never speak on behalf of another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ev", content = "d")]
pub enum ClientSignal {
    #[serde(rename = "room:join")]
    Join { email: String, room: String },

    #[serde(rename = "room:leave")]
    Leave {},

    #[serde(rename = "user:call")]
    Call { to: ParticipantId, offer: SessionBlob },

    #[serde(rename = "call:accepted")]
    Accept { to: ParticipantId, ans: SessionBlob },

    #[serde(rename = "call:busy")]
    Busy { to: ParticipantId },

    #[serde(rename = "peer:nego:needed")]
    NegoOffer { to: ParticipantId, offer: SessionBlob },

    #[serde(rename = "peer:nego:done")]
    NegoAnswer { to: ParticipantId, ans: SessionBlob },

    #[serde(rename = "peer:ice:candidate")]
    IceCandidate { to: ParticipantId, candidate: String },
}

/// Signals sent by the relay to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ev", content = "d")]
pub enum ServerSignal {
    /// Identity assignment, first signal on every connection.
    #[serde(rename = "welcome")]
    Welcome { id: ParticipantId },

    /// Join acknowledgement back to the joiner.
    #[serde(rename = "room:join")]
    Joined { room: String },

    /// Join rejected: both seats taken.
    #[serde(rename = "room:full")]
    RoomFull { room: String },

    /// A second participant took the other seat.
    #[serde(rename = "user:joined")]
    UserJoined { email: String, id: ParticipantId },

    #[serde(rename = "incomming:call")]
    IncomingCall { from: ParticipantId, offer: SessionBlob },

    #[serde(rename = "call:accepted")]
    CallAccepted { from: ParticipantId, ans: SessionBlob },

    #[serde(rename = "call:busy")]
    CallBusy { from: ParticipantId },

    #[serde(rename = "peer:nego:needed")]
    NegoOffer { from: ParticipantId, offer: SessionBlob },

    #[serde(rename = "peer:nego:final")]
    NegoAnswer { from: ParticipantId, ans: SessionBlob },

    #[serde(rename = "peer:ice:candidate")]
    IceCandidate { from: ParticipantId, candidate: String },

    /// The other seat was vacated (explicit leave or disconnect).
    #[serde(rename = "peer:left")]
    PeerLeft { id: ParticipantId },
}

use serde::{Deserialize, Serialize};

/// Opaque session-description payload (offer or answer).
///
/// Owned by the client's media-transport layer; the relay copies it through
/// verbatim and never looks inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionBlob(pub serde_json::Value);

impl SessionBlob {
    pub fn from_sdp(kind: &str, sdp: &str) -> Self {
        Self(serde_json::json!({ "type": kind, "sdp": sdp }))
    }
}

impl From<serde_json::Value> for SessionBlob {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

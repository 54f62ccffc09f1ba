use parley_core::SignalKind;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    /// Local media could not be acquired. Fatal to call start.
    #[error("local media unavailable: {0}")]
    Device(String),

    #[error("room name must not be empty")]
    EmptyRoom,

    /// A message arrived in a signaling state that cannot accept it.
    #[error("{kind} rejected: {reason}")]
    ProtocolViolation { kind: SignalKind, reason: String },

    #[error("malformed {kind} message: {reason}")]
    MalformedMessage { kind: SignalKind, reason: String },

    #[error("failed to apply ice candidate: {0}")]
    CandidateApplication(String),

    /// An offer/answer or description step failed.
    #[error("{step} failed: {reason}")]
    Negotiation { step: &'static str, reason: String },

    #[error("handshake did not complete within {0:?}")]
    NegotiationTimeout(Duration),

    #[error("signaling unavailable: {0}")]
    Signaling(String),
}

impl CallError {
    pub(crate) fn malformed(kind: SignalKind, reason: impl Into<String>) -> Self {
        CallError::MalformedMessage {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn violation(kind: SignalKind, reason: impl Into<String>) -> Self {
        CallError::ProtocolViolation {
            kind,
            reason: reason.into(),
        }
    }

    pub(crate) fn negotiation(step: &'static str, err: anyhow::Error) -> Self {
        CallError::Negotiation {
            step,
            reason: format!("{err:#}"),
        }
    }

    /// Whether this error ends the call rather than just dropping a message.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CallError::Device(_)
                | CallError::EmptyRoom
                | CallError::Negotiation { .. }
                | CallError::NegotiationTimeout(_)
                | CallError::Signaling(_)
        )
    }
}

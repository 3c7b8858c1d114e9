use serde::{Deserialize, Serialize};

use super::scoring::Metrics;
use super::tracker::LockedDecision;

/// Which reflection capture a text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReflectionPhase {
    Pre,
    Post,
}

impl ReflectionPhase {
    pub const fn label(self) -> &'static str {
        match self {
            ReflectionPhase::Pre => "pre",
            ReflectionPhase::Post => "post",
        }
    }
}

/// Domain events emitted by the run service for outbound adapters to persist.
/// Publishing is best-effort: a failing sink is logged and never blocks the
/// user-visible flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    DecisionLocked {
        scenario_id: String,
        session_hint: Option<String>,
        decision: LockedDecision,
    },
    ReflectionSubmitted {
        scenario_id: String,
        session_hint: Option<String>,
        phase: ReflectionPhase,
        text: String,
    },
    DebriefComputed {
        scenario_id: String,
        session_hint: Option<String>,
        metrics: Metrics,
    },
}

impl RunEvent {
    pub const fn kind(&self) -> &'static str {
        match self {
            RunEvent::DecisionLocked { .. } => "decision_locked",
            RunEvent::ReflectionSubmitted { .. } => "reflection_submitted",
            RunEvent::DebriefComputed { .. } => "debrief_computed",
        }
    }
}

/// Outbound persistence hook (database, queue, or log adapter).
pub trait RunEventSink: Send + Sync {
    fn publish(&self, event: RunEvent) -> Result<(), EventSinkError>;
}

/// Event dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum EventSinkError {
    #[error("event transport unavailable: {0}")]
    Transport(String),
}

/// Certificate rendering lives outside the engine; this is the contract the
/// HTTP layer drives. Issuance is not gated on the mission score.
pub trait CertificateIssuer: Send + Sync {
    fn issue(
        &self,
        session_hint: Option<&str>,
        module_id: &str,
    ) -> Result<CertificateArtifact, CertificateError>;
}

/// Rendered certificate bytes plus their media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateArtifact {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Certificate rendering error.
#[derive(Debug, thiserror::Error)]
pub enum CertificateError {
    #[error("certificate renderer unavailable: {0}")]
    Unavailable(String),
}

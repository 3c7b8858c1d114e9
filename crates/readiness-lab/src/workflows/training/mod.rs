//! Scenario decision engine: branching three-stage scenarios, the per-run
//! decision tracker, and the debrief scoring model, plus the service and
//! HTTP facade that drive them.

pub mod branch;
pub mod content;
pub mod debrief;
pub mod document;
pub mod events;
pub mod router;
pub mod scoring;
pub mod service;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use content::{CatalogDocumentSource, DocumentSource, DocumentSourceError, FsDocumentSource};
pub use debrief::{assemble_debrief, Debrief, ShortFeedback};
pub use document::{
    BranchOptions, DecisionPointSpec, DocumentError, OptionSpec, ScenarioDocument,
};
pub use events::{
    CertificateArtifact, CertificateError, CertificateIssuer, EventSinkError, ReflectionPhase,
    RunEvent, RunEventSink,
};
pub use router::scenario_router;
pub use scoring::{compute_debrief, word_count, Metrics, ScoringConfig};
pub use service::{
    DebriefRequest, DecisionPointView, LockView, OptionView, RunId, RunStartView, RunView,
    ScenarioService, ScenarioServiceError, SelectionInput,
};
pub use tracker::{
    ActionOutcome, DecisionPointStatus, LockedDecision, RunStatus, ScenarioRun, SelectionTrace,
    ValidationError,
};

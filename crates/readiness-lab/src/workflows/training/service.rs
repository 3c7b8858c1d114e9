use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::branch;
use super::content::{DocumentSource, DocumentSourceError};
use super::debrief::{assemble_debrief, Debrief};
use super::document::ScenarioDocument;
use super::events::{ReflectionPhase, RunEvent, RunEventSink};
use super::scoring::{compute_debrief, word_count, ScoringConfig};
use super::tracker::{
    ActionOutcome, DecisionPointStatus, RunStatus, ScenarioRun, ValidationError,
};

/// Identifier wrapper for scenario runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

static RUN_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_run_id() -> RunId {
    let id = RUN_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    RunId(format!("run-{id:06}"))
}

struct RunEntry {
    run: ScenarioRun,
    document: Arc<ScenarioDocument>,
}

/// Service composing the document source, event sink, and scoring engine
/// around the per-run state machine. One logical writer per run; the registry
/// mutex serializes concurrent HTTP access.
pub struct ScenarioService<D, E> {
    documents: Arc<D>,
    events: Arc<E>,
    config: ScoringConfig,
    runs: Mutex<HashMap<RunId, RunEntry>>,
}

impl<D, E> ScenarioService<D, E>
where
    D: DocumentSource + 'static,
    E: RunEventSink + 'static,
{
    pub fn new(documents: Arc<D>, events: Arc<E>, config: ScoringConfig) -> Self {
        Self {
            documents,
            events,
            config,
            runs: Mutex::new(HashMap::new()),
        }
    }

    /// Start a new run of `scenario_id` with decision point 1 active.
    pub fn start_run(
        &self,
        scenario_id: &str,
        session_hint: Option<String>,
    ) -> Result<RunStartView, ScenarioServiceError> {
        let document = self
            .documents
            .load(scenario_id)?
            .ok_or_else(|| ScenarioServiceError::ScenarioNotFound(scenario_id.to_string()))?;

        let run_id = next_run_id();
        let run = ScenarioRun::start(scenario_id, session_hint, Utc::now());
        let first = decision_point_view(&document, &run, 1)
            .ok_or_else(|| ScenarioServiceError::ScenarioNotFound(scenario_id.to_string()))?;

        let view = RunStartView {
            run_id: run_id.clone(),
            scenario_id: document.id.clone(),
            title: document.title.clone(),
            narrative: document.narrative.clone(),
            reflection_prompt: document.reflection_prompt.clone(),
            decision_point: first,
        };

        let mut runs = self.runs.lock().expect("run registry mutex poisoned");
        runs.insert(run_id, RunEntry { run, document });

        Ok(view)
    }

    /// Status snapshot for API responses.
    pub fn run_view(&self, run_id: &RunId) -> Result<RunView, ScenarioServiceError> {
        let runs = self.runs.lock().expect("run registry mutex poisoned");
        let entry = fetch(&runs, run_id)?;
        Ok(run_view(run_id, entry, &self.config))
    }

    /// The options visible at a decision point, given what is locked so far.
    pub fn options(
        &self,
        run_id: &RunId,
        index: u8,
    ) -> Result<DecisionPointView, ScenarioServiceError> {
        let runs = self.runs.lock().expect("run registry mutex poisoned");
        let entry = fetch(&runs, run_id)?;
        decision_point_view(&entry.document, &entry.run, index)
            .ok_or_else(|| ValidationError::DecisionPointNotActive(index).into())
    }

    /// Record a selection. The option must be visible at the decision point;
    /// selections aimed at locked stages are absorbed without error.
    pub fn select_option(
        &self,
        run_id: &RunId,
        index: u8,
        option_id: &str,
    ) -> Result<RunView, ScenarioServiceError> {
        let mut runs = self.runs.lock().expect("run registry mutex poisoned");
        let entry = fetch_mut(&mut runs, run_id)?;

        let stage = entry
            .run
            .decision_point(index)
            .ok_or(ValidationError::DecisionPointNotActive(index))?;

        if stage.status == DecisionPointStatus::Active {
            let visible = entry
                .document
                .decision_point(index)
                .map(|spec| branch::resolve_options(spec, entry.run.prior_option_id(index)))
                .unwrap_or_default();
            if !visible.iter().any(|option| option.id == option_id) {
                return Err(ValidationError::UnknownOption(option_id.to_string()).into());
            }
        }

        if entry.run.select_option(index, option_id, Utc::now()) == ActionOutcome::Ignored {
            debug!(run = %run_id.0, decision_point = index, "selection ignored");
        }

        Ok(run_view(run_id, entry, &self.config))
    }

    /// Record a confidence rating (1-5) at a decision point.
    pub fn set_confidence(
        &self,
        run_id: &RunId,
        index: u8,
        value: u8,
    ) -> Result<RunView, ScenarioServiceError> {
        let mut runs = self.runs.lock().expect("run registry mutex poisoned");
        let entry = fetch_mut(&mut runs, run_id)?;

        if entry.run.set_confidence(index, value)? == ActionOutcome::Ignored {
            debug!(run = %run_id.0, decision_point = index, "confidence ignored");
        }

        Ok(run_view(run_id, entry, &self.config))
    }

    /// Lock a decision point and activate the next one. Emits `DecisionLocked`
    /// best-effort on the first successful lock.
    pub fn lock_decision(
        &self,
        run_id: &RunId,
        index: u8,
    ) -> Result<LockView, ScenarioServiceError> {
        let mut runs = self.runs.lock().expect("run registry mutex poisoned");
        let entry = fetch_mut(&mut runs, run_id)?;

        let already_locked = entry
            .run
            .decision_point(index)
            .is_some_and(|stage| stage.status == DecisionPointStatus::Locked);

        let locked = entry.run.lock_and_advance(index, Utc::now())?;

        if !already_locked {
            self.publish_best_effort(RunEvent::DecisionLocked {
                scenario_id: entry.run.scenario_id().to_string(),
                session_hint: entry.run.session_hint().map(str::to_string),
                decision: locked,
            });
        }

        let next_decision_point = entry
            .run
            .current_decision_point()
            .and_then(|next| decision_point_view(&entry.document, &entry.run, next));

        Ok(LockView {
            run: run_view(run_id, entry, &self.config),
            next_decision_point,
        })
    }

    /// Store (post phase) or merely record (pre phase) a reflection. Emits
    /// `ReflectionSubmitted` best-effort for both phases.
    pub fn submit_reflection(
        &self,
        run_id: &RunId,
        phase: ReflectionPhase,
        text: &str,
    ) -> Result<RunView, ScenarioServiceError> {
        let mut runs = self.runs.lock().expect("run registry mutex poisoned");
        let entry = fetch_mut(&mut runs, run_id)?;

        if phase == ReflectionPhase::Post
            && entry.run.set_reflection(text) == ActionOutcome::Ignored
        {
            debug!(run = %run_id.0, "reflection ignored after scoring");
        }

        self.publish_best_effort(RunEvent::ReflectionSubmitted {
            scenario_id: entry.run.scenario_id().to_string(),
            session_hint: entry.run.session_hint().map(str::to_string),
            phase,
            text: text.to_string(),
        });

        Ok(run_view(run_id, entry, &self.config))
    }

    /// Compute the debrief for a ready run. The first successful call marks
    /// the run scored and emits `DebriefComputed`; repeat calls return the
    /// identical debrief without re-emitting.
    pub fn compute_debrief(&self, run_id: &RunId) -> Result<Debrief, ScenarioServiceError> {
        let mut runs = self.runs.lock().expect("run registry mutex poisoned");
        let entry = fetch_mut(&mut runs, run_id)?;

        match entry.run.status(self.config.minimum_reflection_words) {
            RunStatus::Scored => {
                let metrics = compute_debrief(&entry.run, &entry.document);
                Ok(assemble_debrief(metrics))
            }
            RunStatus::ReadyToScore => {
                let metrics = compute_debrief(&entry.run, &entry.document);
                entry.run.mark_scored();
                self.publish_best_effort(RunEvent::DebriefComputed {
                    scenario_id: entry.run.scenario_id().to_string(),
                    session_hint: entry.run.session_hint().map(str::to_string),
                    metrics,
                });
                Ok(assemble_debrief(metrics))
            }
            RunStatus::InProgress => {
                if entry.run.locked_count() < ScenarioDocument::DECISION_POINT_COUNT {
                    Err(ValidationError::ScenarioIncomplete.into())
                } else {
                    Err(ValidationError::ReflectionTooShort {
                        minimum: self.config.minimum_reflection_words,
                        found: word_count(entry.run.reflection_text()),
                    }
                    .into())
                }
            }
        }
    }

    /// Stateless scoring entry point: replay a complete submission through a
    /// fresh tracker and score it. Unknown option ids degrade to neutral
    /// defaults; invalid confidences are rejected like any other action.
    pub fn score_submission(
        &self,
        scenario_id: &str,
        request: &DebriefRequest,
    ) -> Result<Debrief, ScenarioServiceError> {
        let document = self
            .documents
            .load(scenario_id)?
            .ok_or_else(|| ScenarioServiceError::ScenarioNotFound(scenario_id.to_string()))?;

        let now = Utc::now();
        let mut run = ScenarioRun::start(scenario_id, None, now);
        for index in 1..=3u8 {
            let selection = request
                .selections
                .get(&index)
                .ok_or(ValidationError::SelectionRequired)?;
            run.select_option(index, &selection.option_id, now);
            run.set_confidence(index, selection.confidence)?;
            run.lock_and_advance(index, now)?;
        }
        run.set_reflection(request.reflection_text.clone());

        let metrics = compute_debrief(&run, &document);
        self.publish_best_effort(RunEvent::DebriefComputed {
            scenario_id: scenario_id.to_string(),
            session_hint: None,
            metrics,
        });

        Ok(assemble_debrief(metrics))
    }

    fn publish_best_effort(&self, event: RunEvent) {
        let kind = event.kind();
        if let Err(err) = self.events.publish(event) {
            warn!(%err, event = kind, "failed to publish run event");
        }
    }
}

fn fetch<'a>(
    runs: &'a HashMap<RunId, RunEntry>,
    run_id: &RunId,
) -> Result<&'a RunEntry, ScenarioServiceError> {
    runs.get(run_id)
        .ok_or_else(|| ScenarioServiceError::RunNotFound(run_id.0.clone()))
}

fn fetch_mut<'a>(
    runs: &'a mut HashMap<RunId, RunEntry>,
    run_id: &RunId,
) -> Result<&'a mut RunEntry, ScenarioServiceError> {
    runs.get_mut(run_id)
        .ok_or_else(|| ScenarioServiceError::RunNotFound(run_id.0.clone()))
}

fn run_view(run_id: &RunId, entry: &RunEntry, config: &ScoringConfig) -> RunView {
    RunView {
        run_id: run_id.clone(),
        scenario_id: entry.run.scenario_id().to_string(),
        session_hint: entry.run.session_hint().map(str::to_string),
        status: entry.run.status(config.minimum_reflection_words).label(),
        current_decision_point: entry.run.current_decision_point(),
        locked_decision_points: entry
            .run
            .locked_decisions()
            .map(|decision| decision.decision_point_index)
            .collect(),
        reflection_word_count: word_count(entry.run.reflection_text()),
    }
}

fn decision_point_view(
    document: &ScenarioDocument,
    run: &ScenarioRun,
    index: u8,
) -> Option<DecisionPointView> {
    let spec = document.decision_point(index)?;
    let options = branch::resolve_options(spec, run.prior_option_id(index));
    Some(DecisionPointView {
        index: spec.index,
        narrative: spec.narrative.clone(),
        stem: spec.stem.clone(),
        options: options
            .into_iter()
            .map(|option| OptionView {
                id: option.id,
                text: option.text,
            })
            .collect(),
    })
}

/// Error raised by the scenario service.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("scenario '{0}' not found")]
    ScenarioNotFound(String),
    #[error("run '{0}' not found")]
    RunNotFound(String),
    #[error(transparent)]
    Document(#[from] DocumentSourceError),
}

/// Stateless scoring request: one selection per decision point plus the
/// reflection text.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebriefRequest {
    pub selections: BTreeMap<u8, SelectionInput>,
    #[serde(default)]
    pub reflection_text: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionInput {
    pub option_id: String,
    pub confidence: u8,
}

/// Snapshot of a run for API responses.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunView {
    pub run_id: RunId,
    pub scenario_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_hint: Option<String>,
    pub status: &'static str,
    pub current_decision_point: Option<u8>,
    pub locked_decision_points: Vec<u8>,
    pub reflection_word_count: usize,
}

/// Payload returned when a run starts: scenario framing plus the first
/// decision point.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStartView {
    pub run_id: RunId,
    pub scenario_id: String,
    pub title: String,
    pub narrative: String,
    pub reflection_prompt: String,
    pub decision_point: DecisionPointView,
}

/// A decision point as shown to a client; scoring metadata stays server-side.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionPointView {
    pub index: u8,
    pub narrative: String,
    pub stem: String,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    pub id: String,
    pub text: String,
}

/// Result of locking a decision point.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockView {
    pub run: RunView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_decision_point: Option<DecisionPointView>,
}

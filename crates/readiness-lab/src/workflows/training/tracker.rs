use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::ScenarioDocument;
use super::scoring::word_count;

/// Lifecycle of a single decision point within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionPointStatus {
    Pending,
    Active,
    Locked,
}

impl DecisionPointStatus {
    pub const fn label(self) -> &'static str {
        match self {
            DecisionPointStatus::Pending => "pending",
            DecisionPointStatus::Active => "active",
            DecisionPointStatus::Locked => "locked",
        }
    }
}

/// Overall run lifecycle; `Scored` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    InProgress,
    ReadyToScore,
    Scored,
}

impl RunStatus {
    pub const fn label(self) -> &'static str {
        match self {
            RunStatus::InProgress => "in_progress",
            RunStatus::ReadyToScore => "ready_to_score",
            RunStatus::Scored => "scored",
        }
    }
}

/// User-recoverable rejections, surfaced verbatim to the client. The
/// confidence wording is load-bearing: clients display it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("selection required")]
    SelectionRequired,
    #[error("Please rate your confidence before continuing.")]
    ConfidenceRequired,
    #[error("confidence out of range")]
    ConfidenceOutOfRange,
    #[error("decision point {0} is not active")]
    DecisionPointNotActive(u8),
    #[error("option '{0}' is not available at this decision point")]
    UnknownOption(String),
    #[error("all decision points must be locked before scoring")]
    ScenarioIncomplete,
    #[error("reflection needs at least {minimum} words (found {found})")]
    ReflectionTooShort { minimum: usize, found: usize },
}

/// Whether a tracker action mutated the run or was absorbed. Actions aimed at
/// a stage that is not active are absorbed rather than rejected, which keeps
/// the state machine tolerant of duplicate network retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    Ignored,
}

/// Interaction history accumulated at one decision point before it locks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionTrace {
    /// Option ids chosen over time, consecutive duplicates collapsed.
    pub sequence: Vec<String>,
    pub change_count: u32,
    pub confidence_change_count: u32,
    pub first_selection_at: Option<DateTime<Utc>>,
    pub final_selection_at: Option<DateTime<Utc>>,
}

/// The frozen, authoritative record of one decision point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockedDecision {
    pub decision_point_index: u8,
    pub final_option_id: String,
    pub confidence: u8,
    pub time_on_page_ms: u64,
    #[serde(flatten)]
    pub trace: SelectionTrace,
}

/// Mutable per-stage slot inside a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionPointProgress {
    pub index: u8,
    pub status: DecisionPointStatus,
    pub trace: SelectionTrace,
    pub pending_option: Option<String>,
    pub confidence: Option<u8>,
    pub activated_at: Option<DateTime<Utc>>,
    pub locked: Option<LockedDecision>,
}

impl DecisionPointProgress {
    fn new(index: u8) -> Self {
        Self {
            index,
            status: DecisionPointStatus::Pending,
            trace: SelectionTrace::default(),
            pending_option: None,
            confidence: None,
            activated_at: None,
            locked: None,
        }
    }
}

pub const CONFIDENCE_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// One attempt at a scenario. Decision points lock strictly in order 1→2→3;
/// a locked stage never mutates again, and the run is terminal once scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioRun {
    scenario_id: String,
    session_hint: Option<String>,
    stages: Vec<DecisionPointProgress>,
    reflection_text: String,
    scored: bool,
}

impl ScenarioRun {
    /// Create a run with decision point 1 active and its timer started.
    pub fn start(
        scenario_id: impl Into<String>,
        session_hint: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut stages: Vec<DecisionPointProgress> =
            (1..=3).map(DecisionPointProgress::new).collect();
        stages[0].status = DecisionPointStatus::Active;
        stages[0].activated_at = Some(now);

        Self {
            scenario_id: scenario_id.into(),
            session_hint,
            stages,
            reflection_text: String::new(),
            scored: false,
        }
    }

    pub fn scenario_id(&self) -> &str {
        &self.scenario_id
    }

    pub fn session_hint(&self) -> Option<&str> {
        self.session_hint.as_deref()
    }

    pub fn reflection_text(&self) -> &str {
        &self.reflection_text
    }

    pub fn decision_points(&self) -> &[DecisionPointProgress] {
        &self.stages
    }

    pub fn decision_point(&self, index: u8) -> Option<&DecisionPointProgress> {
        self.stages.iter().find(|stage| stage.index == index)
    }

    fn decision_point_mut(&mut self, index: u8) -> Option<&mut DecisionPointProgress> {
        self.stages.iter_mut().find(|stage| stage.index == index)
    }

    /// The index currently accepting selections, if any.
    pub fn current_decision_point(&self) -> Option<u8> {
        self.stages
            .iter()
            .find(|stage| stage.status == DecisionPointStatus::Active)
            .map(|stage| stage.index)
    }

    pub fn locked_decision(&self, index: u8) -> Option<&LockedDecision> {
        self.decision_point(index).and_then(|s| s.locked.as_ref())
    }

    /// Locked records in decision point order.
    pub fn locked_decisions(&self) -> impl Iterator<Item = &LockedDecision> {
        self.stages.iter().filter_map(|stage| stage.locked.as_ref())
    }

    pub fn locked_count(&self) -> usize {
        self.locked_decisions().count()
    }

    /// The option locked at the decision point preceding `index`, which is
    /// what branch resolution keys on.
    pub fn prior_option_id(&self, index: u8) -> Option<&str> {
        if index <= 1 {
            return None;
        }
        self.locked_decision(index - 1)
            .map(|decision| decision.final_option_id.as_str())
    }

    /// Record a selection at an active decision point. Consecutive repeats of
    /// the same option collapse into one sequence entry.
    pub fn select_option(&mut self, index: u8, option_id: &str, now: DateTime<Utc>) -> ActionOutcome {
        let Some(stage) = self.decision_point_mut(index) else {
            return ActionOutcome::Ignored;
        };
        if stage.status != DecisionPointStatus::Active {
            return ActionOutcome::Ignored;
        }

        if stage.trace.sequence.last().map(String::as_str) != Some(option_id) {
            if stage.trace.sequence.is_empty() {
                stage.trace.first_selection_at = Some(now);
            }
            stage.trace.sequence.push(option_id.to_owned());
            stage.trace.change_count = (stage.trace.sequence.len() - 1) as u32;
        }
        stage.pending_option = Some(option_id.to_owned());

        ActionOutcome::Applied
    }

    /// Record a confidence rating at an active decision point. Every accepted
    /// write bumps the change counter, same-value rewrites included.
    pub fn set_confidence(
        &mut self,
        index: u8,
        value: u8,
    ) -> Result<ActionOutcome, ValidationError> {
        let Some(stage) = self.decision_point_mut(index) else {
            return Ok(ActionOutcome::Ignored);
        };
        if stage.status != DecisionPointStatus::Active {
            return Ok(ActionOutcome::Ignored);
        }
        if !CONFIDENCE_RANGE.contains(&value) {
            return Err(ValidationError::ConfidenceOutOfRange);
        }

        stage.confidence = Some(value);
        stage.trace.confidence_change_count += 1;

        Ok(ActionOutcome::Applied)
    }

    /// Freeze the decision point and activate the next one. Requires a pending
    /// selection and a confidence rating; re-locking an already locked stage
    /// returns the existing record unchanged.
    pub fn lock_and_advance(
        &mut self,
        index: u8,
        now: DateTime<Utc>,
    ) -> Result<LockedDecision, ValidationError> {
        let Some(stage) = self.decision_point(index) else {
            return Err(ValidationError::DecisionPointNotActive(index));
        };

        match stage.status {
            DecisionPointStatus::Pending => {
                return Err(ValidationError::DecisionPointNotActive(index))
            }
            DecisionPointStatus::Locked => {
                return stage
                    .locked
                    .clone()
                    .ok_or(ValidationError::DecisionPointNotActive(index));
            }
            DecisionPointStatus::Active => {}
        }

        let final_option_id = stage
            .pending_option
            .clone()
            .ok_or(ValidationError::SelectionRequired)?;
        let confidence = stage.confidence.ok_or(ValidationError::ConfidenceRequired)?;
        if !CONFIDENCE_RANGE.contains(&confidence) {
            return Err(ValidationError::ConfidenceOutOfRange);
        }

        // Reacquire mutably now that validation cannot fail.
        let Some(stage) = self.decision_point_mut(index) else {
            return Err(ValidationError::DecisionPointNotActive(index));
        };

        let time_on_page_ms = stage
            .activated_at
            .map(|activated| (now - activated).num_milliseconds().max(0) as u64)
            .unwrap_or(0);

        stage.trace.final_selection_at = Some(now);

        let locked = LockedDecision {
            decision_point_index: index,
            final_option_id,
            confidence,
            time_on_page_ms,
            trace: stage.trace.clone(),
        };

        stage.status = DecisionPointStatus::Locked;
        stage.locked = Some(locked.clone());
        stage.pending_option = None;

        if let Some(next) = self.decision_point_mut(index + 1) {
            next.status = DecisionPointStatus::Active;
            next.activated_at = Some(now);
        }

        Ok(locked)
    }

    /// Replace the reflection text; ignored once the run has been scored.
    pub fn set_reflection(&mut self, text: impl Into<String>) -> ActionOutcome {
        if self.scored {
            return ActionOutcome::Ignored;
        }
        self.reflection_text = text.into();
        ActionOutcome::Applied
    }

    pub fn status(&self, minimum_reflection_words: usize) -> RunStatus {
        if self.scored {
            return RunStatus::Scored;
        }
        if self.locked_count() == ScenarioDocument::DECISION_POINT_COUNT
            && word_count(&self.reflection_text) >= minimum_reflection_words
        {
            return RunStatus::ReadyToScore;
        }
        RunStatus::InProgress
    }

    pub fn is_scored(&self) -> bool {
        self.scored
    }

    /// Terminal transition; the run accepts no further mutation.
    pub fn mark_scored(&mut self) {
        self.scored = true;
    }
}

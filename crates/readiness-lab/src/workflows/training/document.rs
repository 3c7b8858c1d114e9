use indexmap::IndexMap;
use serde::Serialize;

/// Immutable scenario content, fully normalized at load time: every option
/// carries resolved numeric fields and every decision point carries a decided
/// branch shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioDocument {
    pub id: String,
    pub title: String,
    pub narrative: String,
    pub decision_points: Vec<DecisionPointSpec>,
    pub reflection_prompt: String,
}

impl ScenarioDocument {
    pub const DECISION_POINT_COUNT: usize = 3;

    pub fn decision_point(&self, index: u8) -> Option<&DecisionPointSpec> {
        self.decision_points
            .iter()
            .find(|point| point.index == index)
    }
}

/// One of the three sequential forced-choice stages in a scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionPointSpec {
    pub index: u8,
    pub narrative: String,
    pub stem: String,
    pub options: BranchOptions,
}

/// Branch shape decided once when the document is loaded, so downstream code
/// never re-sniffs the raw structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BranchOptions {
    /// A single ordered option sequence, independent of prior choices.
    Flat(Vec<OptionSpec>),
    /// Option sequences keyed by the option locked at the preceding decision
    /// point, in authoring order, with an optional fallback branch.
    Keyed {
        branches: IndexMap<String, Vec<OptionSpec>>,
        default: Option<Vec<OptionSpec>>,
    },
}

/// An option with all numeric fields resolved; `score` and `ideal_confidence`
/// are always in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionSpec {
    pub id: String,
    pub text: String,
    pub score: f64,
    pub ideal_confidence: f64,
}

impl OptionSpec {
    pub const DEFAULT_SCORE: f64 = 50.0;
    pub const DEFAULT_IDEAL_CONFIDENCE: f64 = 60.0;
}

/// Structural defects that make a document unusable (as opposed to branch
/// authoring gaps, which degrade at resolution time).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentError {
    #[error("scenario must define exactly {expected} decision points (found {found})")]
    WrongDecisionPointCount { expected: usize, found: usize },
    #[error("decision point at position {position} has index {found}, expected {expected}")]
    NonSequentialIndex {
        position: usize,
        expected: u8,
        found: u8,
    },
    #[error("decision point {index} repeats option id '{option_id}' within one branch")]
    DuplicateOptionId { index: u8, option_id: String },
}

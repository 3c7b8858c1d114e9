use indexmap::IndexMap;
use serde::Deserialize;

/// Raw authoring shapes as they appear in scenario JSON. Mapping into the
/// typed document, including numeric defaulting, happens in `normalizer`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawScenarioDocument {
    pub(crate) id: String,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) narrative: String,
    #[serde(default)]
    pub(crate) decision_points: Vec<RawDecisionPoint>,
    #[serde(default)]
    pub(crate) reflection_prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDecisionPoint {
    pub(crate) index: u8,
    #[serde(default)]
    pub(crate) narrative: String,
    #[serde(default)]
    pub(crate) stem: String,
    pub(crate) options: RawBranchOptions,
}

/// Decision point 1 ships a flat array; points 2 and 3 usually key their
/// options by the prior selection, with an optional `default` key as the
/// fallback branch.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawBranchOptions {
    Flat(Vec<RawOption>),
    Keyed(IndexMap<String, Vec<RawOption>>),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawOption {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) score: Option<f64>,
    #[serde(default)]
    pub(crate) ideal_confidence: Option<f64>,
}

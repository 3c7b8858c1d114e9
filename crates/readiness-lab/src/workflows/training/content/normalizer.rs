use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::warn;

use super::parser::{RawBranchOptions, RawDecisionPoint, RawOption, RawScenarioDocument};
use crate::workflows::training::document::{
    BranchOptions, DecisionPointSpec, DocumentError, OptionSpec, ScenarioDocument,
};

/// Turn raw authoring data into a normalized document: branch shape decided
/// once, score and ideal-confidence defaults resolved once, values clamped to
/// [0, 100]. Structural defects fail; empty branches only warn (the resolver
/// degrades at runtime).
pub(crate) fn normalize_document(
    raw: RawScenarioDocument,
) -> Result<ScenarioDocument, DocumentError> {
    if raw.decision_points.len() != ScenarioDocument::DECISION_POINT_COUNT {
        return Err(DocumentError::WrongDecisionPointCount {
            expected: ScenarioDocument::DECISION_POINT_COUNT,
            found: raw.decision_points.len(),
        });
    }

    let mut decision_points = Vec::with_capacity(raw.decision_points.len());
    for (position, raw_point) in raw.decision_points.into_iter().enumerate() {
        let expected = position as u8 + 1;
        if raw_point.index != expected {
            return Err(DocumentError::NonSequentialIndex {
                position,
                expected,
                found: raw_point.index,
            });
        }
        decision_points.push(normalize_decision_point(&raw.id, raw_point)?);
    }

    Ok(ScenarioDocument {
        id: raw.id,
        title: raw.title,
        narrative: raw.narrative,
        decision_points,
        reflection_prompt: raw.reflection_prompt,
    })
}

fn normalize_decision_point(
    scenario_id: &str,
    raw: RawDecisionPoint,
) -> Result<DecisionPointSpec, DocumentError> {
    let index = raw.index;
    let options = match raw.options {
        RawBranchOptions::Flat(options) => {
            let options = normalize_sequence(index, options)?;
            if options.is_empty() {
                warn!(
                    scenario = scenario_id,
                    decision_point = index,
                    "decision point has no options"
                );
            }
            BranchOptions::Flat(options)
        }
        RawBranchOptions::Keyed(map) => {
            let mut branches = IndexMap::new();
            let mut default = None;
            for (key, sequence) in map {
                let sequence = normalize_sequence(index, sequence)?;
                if sequence.is_empty() {
                    warn!(
                        scenario = scenario_id,
                        decision_point = index,
                        branch = %key,
                        "branch has no options"
                    );
                }
                if key == "default" {
                    default = Some(sequence);
                } else {
                    branches.insert(key, sequence);
                }
            }
            if branches.is_empty() && default.is_none() {
                warn!(
                    scenario = scenario_id,
                    decision_point = index,
                    "decision point has no branches"
                );
            }
            BranchOptions::Keyed { branches, default }
        }
    };

    Ok(DecisionPointSpec {
        index,
        narrative: raw.narrative,
        stem: raw.stem,
        options,
    })
}

fn normalize_sequence(index: u8, raw: Vec<RawOption>) -> Result<Vec<OptionSpec>, DocumentError> {
    let mut seen = HashSet::new();
    raw.into_iter()
        .map(|option| {
            if !seen.insert(option.id.clone()) {
                return Err(DocumentError::DuplicateOptionId {
                    index,
                    option_id: option.id,
                });
            }
            Ok(OptionSpec {
                id: option.id,
                text: option.text,
                score: option
                    .score
                    .unwrap_or(OptionSpec::DEFAULT_SCORE)
                    .clamp(0.0, 100.0),
                ideal_confidence: option
                    .ideal_confidence
                    .unwrap_or(OptionSpec::DEFAULT_IDEAL_CONFIDENCE)
                    .clamp(0.0, 100.0),
            })
        })
        .collect()
}

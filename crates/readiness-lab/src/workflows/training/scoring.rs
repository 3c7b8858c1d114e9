use serde::{Deserialize, Serialize};

use super::branch;
use super::document::{OptionSpec, ScenarioDocument};
use super::tracker::ScenarioRun;

use crate::config::TrainingConfig;

/// Whitespace-delimited token count; the only analysis reflections receive.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Dials for scoring and submission gating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub minimum_reflection_words: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            minimum_reflection_words: TrainingConfig::DEFAULT_MIN_REFLECTION_WORDS,
        }
    }
}

/// Bounded performance metrics. Every field is an integer in [0, 100];
/// intermediates keep full precision and are rounded exactly once, here.
/// Field names follow the published client contract, including the literal
/// `CRI` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub decision_quality: u8,
    pub confidence_alignment: u8,
    #[serde(rename = "CRI")]
    pub cri: u8,
    pub bias_awareness: u8,
    pub trust_calibration: u8,
    pub information_advantage: u8,
    pub cognitive_adaptability: u8,
    pub escalation_tendency: u8,
    pub reflection_quality: u8,
    pub mission_score: u8,
}

/// Convert a completed (or partially completed) run plus its document into
/// the debrief metrics. Pure and deterministic: no clock, no I/O, identical
/// output for identical input. Option ids that no longer resolve against the
/// document degrade to neutral defaults rather than failing.
pub fn compute_debrief(run: &ScenarioRun, document: &ScenarioDocument) -> Metrics {
    let mut option_scores = Vec::new();
    let mut alignments = Vec::new();

    for decision in run.locked_decisions() {
        let index = decision.decision_point_index;
        let prior = run.prior_option_id(index);
        let resolved = branch::find_option(document, index, prior, &decision.final_option_id);

        let (score, ideal_confidence) = match resolved {
            Some(option) => (option.score, option.ideal_confidence),
            None => (
                OptionSpec::DEFAULT_SCORE,
                OptionSpec::DEFAULT_IDEAL_CONFIDENCE,
            ),
        };

        option_scores.push(score);

        // Confidence is rated 1-5; project it onto the 0-100 ideal scale
        // before comparing.
        let projected = f64::from(decision.confidence) * 20.0;
        alignments.push((100.0 - (projected - ideal_confidence).abs()).max(0.0));
    }

    let decision_quality = mean(&option_scores);
    let confidence_alignment = mean(&alignments);
    let reflection_quality = reflection_quality(word_count(run.reflection_text()));

    let cri = (20.0 + 0.2 * decision_quality + 0.3 * reflection_quality + 30.0).clamp(0.0, 100.0);
    let bias_awareness = (0.5 * reflection_quality + 0.2 * confidence_alignment).clamp(0.0, 100.0);
    let trust_calibration =
        (0.35 * decision_quality + 0.35 * confidence_alignment).clamp(0.0, 100.0);
    let information_advantage =
        (0.4 * decision_quality + 0.1 * reflection_quality).clamp(0.0, 100.0);
    let cognitive_adaptability = (0.5 * cri + 0.2 * reflection_quality).clamp(0.0, 100.0);
    let escalation_tendency = (100.0 - decision_quality).clamp(0.0, 100.0);

    let mission_score = 0.40 * decision_quality
        + 0.20 * confidence_alignment
        + 0.15 * reflection_quality
        + 0.15 * cri
        + 0.10 * bias_awareness;

    Metrics {
        decision_quality: to_score(decision_quality),
        confidence_alignment: to_score(confidence_alignment),
        cri: to_score(cri),
        bias_awareness: to_score(bias_awareness),
        trust_calibration: to_score(trust_calibration),
        information_advantage: to_score(information_advantage),
        cognitive_adaptability: to_score(cognitive_adaptability),
        escalation_tendency: to_score(escalation_tendency),
        reflection_quality: to_score(reflection_quality),
        mission_score: to_score(mission_score),
    }
}

/// Reflection quality from word count: linear up to 50 words (0..50), then
/// linear from 50 to 200 words (50..100), flat at 100 beyond.
fn reflection_quality(words: usize) -> f64 {
    let words = words as f64;
    if words < 50.0 {
        (words / 50.0 * 50.0).clamp(0.0, 50.0)
    } else {
        50.0 + (words - 50.0).clamp(0.0, 150.0) / 150.0 * 50.0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn to_score(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}

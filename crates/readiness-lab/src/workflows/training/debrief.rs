use serde::{Deserialize, Serialize};

use super::scoring::Metrics;

/// Two deterministic summary lines shown alongside the metrics; safe to
/// cache or persist verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortFeedback {
    pub line1: String,
    pub line2: String,
}

/// The complete debrief payload returned to clients: metrics flattened at the
/// top level plus the short feedback block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Debrief {
    #[serde(flatten)]
    pub metrics: Metrics,
    pub short_feedback: ShortFeedback,
}

pub fn assemble_debrief(metrics: Metrics) -> Debrief {
    let line1 = format!(
        "Mission Score: {} — {}",
        metrics.mission_score,
        tier_label(metrics.mission_score)
    );
    let line2 = format!(
        "Decision Quality {} · CRI {} · Reflection {}",
        metrics.decision_quality, metrics.cri, metrics.reflection_quality
    );

    Debrief {
        metrics,
        short_feedback: ShortFeedback { line1, line2 },
    }
}

fn tier_label(mission_score: u8) -> &'static str {
    if mission_score >= 75 {
        "Strong decision alignment"
    } else if mission_score >= 50 {
        "Competent with growth areas"
    } else {
        "Significant gaps to address"
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use super::{DocumentSource, DocumentSourceError};
use crate::workflows::training::document::{
    BranchOptions, DecisionPointSpec, OptionSpec, ScenarioDocument,
};

/// In-memory catalog used when no content directory is configured, seeded
/// with the built-in demo scenario so the service works out of the box.
#[derive(Debug, Clone, Default)]
pub struct CatalogDocumentSource {
    documents: HashMap<String, Arc<ScenarioDocument>>,
}

impl CatalogDocumentSource {
    pub fn builtin() -> Self {
        Self::with_documents([supplier_disruption_scenario()])
    }

    pub fn with_documents(documents: impl IntoIterator<Item = ScenarioDocument>) -> Self {
        let documents = documents
            .into_iter()
            .map(|document| (document.id.clone(), Arc::new(document)))
            .collect();
        Self { documents }
    }

    pub fn scenario_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.documents.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl DocumentSource for CatalogDocumentSource {
    fn load(&self, scenario_id: &str) -> Result<Option<Arc<ScenarioDocument>>, DocumentSourceError> {
        Ok(self.documents.get(scenario_id).cloned())
    }
}

fn option(id: &str, text: &str, score: f64, ideal_confidence: f64) -> OptionSpec {
    OptionSpec {
        id: id.to_string(),
        text: text.to_string(),
        score,
        ideal_confidence,
    }
}

fn keyed(
    branches: Vec<(&str, Vec<OptionSpec>)>,
    default: Option<Vec<OptionSpec>>,
) -> BranchOptions {
    BranchOptions::Keyed {
        branches: branches
            .into_iter()
            .map(|(key, options)| (key.to_string(), options))
            .collect::<IndexMap<_, _>>(),
        default,
    }
}

/// The built-in demo scenario: a critical supplier disruption walked through
/// containment, sourcing strategy, and stabilization.
pub fn supplier_disruption_scenario() -> ScenarioDocument {
    ScenarioDocument {
        id: "supplier-disruption".to_string(),
        title: "Critical Supplier Disruption".to_string(),
        narrative: "Your sole supplier of a safety-critical component has halted \
                    shipments after a plant fire. Production has four days of \
                    inventory left, and three major customers have contractual \
                    delivery penalties. You are the duty operations lead."
            .to_string(),
        reflection_prompt: "Walk through how you weighed speed against certainty at each \
                            step. Where were you most and least confident, and what \
                            information would have changed your choices?"
            .to_string(),
        decision_points: vec![
            DecisionPointSpec {
                index: 1,
                narrative: "It is 06:40. The supplier's account manager has confirmed \
                            the fire but cannot estimate a restart date. Your plant \
                            managers are waiting on direction before the morning shift."
                    .to_string(),
                stem: "What is your first move?".to_string(),
                options: BranchOptions::Flat(vec![
                    option(
                        "activate_backup",
                        "Activate the dormant secondary supplier agreement and start \
                         their qualification run immediately.",
                        85.0,
                        75.0,
                    ),
                    option(
                        "hold_shipments",
                        "Freeze outbound commitments and ration remaining inventory \
                         while you gather more information.",
                        55.0,
                        50.0,
                    ),
                    option(
                        "demand_answers",
                        "Press the supplier for a binding restart estimate before \
                         changing anything on your side.",
                        35.0,
                        40.0,
                    ),
                ]),
            },
            DecisionPointSpec {
                index: 2,
                narrative: "It is mid-morning. Legal has reviewed the customer \
                            penalty clauses and finance has sized the exposure. Your \
                            earlier call shapes which levers are still available."
                    .to_string(),
                stem: "How do you commit your sourcing position for the week?".to_string(),
                options: keyed(
                    vec![
                        (
                            "activate_backup",
                            vec![
                                option(
                                    "dual_source",
                                    "Split volume between the recovering supplier and \
                                     the secondary while both are qualified.",
                                    90.0,
                                    80.0,
                                ),
                                option(
                                    "partial_qualification",
                                    "Fast-track the secondary for the two highest-risk \
                                     part numbers only.",
                                    80.0,
                                    70.0,
                                ),
                                option(
                                    "full_switch",
                                    "Move the entire order book to the secondary \
                                     supplier for the quarter.",
                                    60.0,
                                    55.0,
                                ),
                            ],
                        ),
                        (
                            "hold_shipments",
                            vec![
                                option(
                                    "customer_notice",
                                    "Issue proactive delay notices to the three penalty \
                                     customers with a recovery plan attached.",
                                    75.0,
                                    65.0,
                                ),
                                option(
                                    "expedite_air",
                                    "Buy remaining open-market stock and air-freight it \
                                     to protect the largest account.",
                                    55.0,
                                    50.0,
                                ),
                                option(
                                    "quiet_wait",
                                    "Hold all communication until the supplier's next \
                                     update to avoid alarming customers.",
                                    25.0,
                                    35.0,
                                ),
                            ],
                        ),
                    ],
                    Some(vec![
                        option(
                            "gather_data",
                            "Commission an immediate on-site assessment of the damaged \
                             plant before committing volume anywhere.",
                            65.0,
                            60.0,
                        ),
                        option(
                            "escalate_exec",
                            "Hand the sourcing decision to the executive committee's \
                             afternoon session.",
                            50.0,
                            60.0,
                        ),
                    ]),
                ),
            },
            DecisionPointSpec {
                index: 3,
                narrative: "Seventy-two hours in, the supplier publishes a six-week \
                            restart plan and your interim position is holding. The \
                            board wants to know how you stabilize from here."
                    .to_string(),
                stem: "What do you lock in for the recovery period?".to_string(),
                options: keyed(
                    vec![
                        (
                            "dual_source",
                            vec![
                                option(
                                    "lock_contracts",
                                    "Convert the dual-source split into contracted \
                                     allocations with volume floors on both sides.",
                                    90.0,
                                    80.0,
                                ),
                                option(
                                    "spot_market",
                                    "Keep the split informal and chase spot-market \
                                     pricing week to week.",
                                    50.0,
                                    45.0,
                                ),
                            ],
                        ),
                        (
                            "partial_qualification",
                            vec![
                                option(
                                    "staged_ramp",
                                    "Extend qualification to the full part family on a \
                                     staged ramp tied to audit gates.",
                                    85.0,
                                    70.0,
                                ),
                                option(
                                    "all_in",
                                    "Skip the remaining audits and move all volume to \
                                     the secondary now.",
                                    55.0,
                                    50.0,
                                ),
                            ],
                        ),
                    ],
                    Some(vec![
                        option(
                            "postmortem_review",
                            "Stand up a structured review of single-source exposure \
                             across the whole commodity map.",
                            70.0,
                            60.0,
                        ),
                        option(
                            "return_to_normal",
                            "Declare the incident closed and return to the pre-fire \
                             sourcing arrangement unchanged.",
                            45.0,
                            50.0,
                        ),
                    ]),
                ),
            },
        ],
    }
}

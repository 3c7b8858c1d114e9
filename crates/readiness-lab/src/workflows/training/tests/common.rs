use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use indexmap::IndexMap;

use crate::workflows::training::content::CatalogDocumentSource;
use crate::workflows::training::document::{
    BranchOptions, DecisionPointSpec, OptionSpec, ScenarioDocument,
};
use crate::workflows::training::events::{EventSinkError, RunEvent, RunEventSink};
use crate::workflows::training::scoring::ScoringConfig;
use crate::workflows::training::service::ScenarioService;
use crate::workflows::training::tracker::ScenarioRun;

pub(super) fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn seconds(n: i64) -> Duration {
    Duration::seconds(n)
}

/// `n` distinct whitespace-separated words.
pub(super) fn words(n: usize) -> String {
    (0..n)
        .map(|i| format!("w{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(super) fn option(id: &str, score: f64, ideal_confidence: f64) -> OptionSpec {
    OptionSpec {
        id: id.to_string(),
        text: format!("Option {id}"),
        score,
        ideal_confidence,
    }
}

pub(super) fn keyed(
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

pub(super) fn decision_point(index: u8, options: BranchOptions) -> DecisionPointSpec {
    DecisionPointSpec {
        index,
        narrative: format!("Narrative {index}"),
        stem: format!("Stem {index}"),
        options,
    }
}

/// The regression fixture document: locking alpha → beta → gamma with
/// confidences 4, 3, 2 exercises option scores 80/60/40 against ideal
/// confidences 80/60/40.
pub(super) fn fixture_document() -> ScenarioDocument {
    ScenarioDocument {
        id: "fixture".to_string(),
        title: "Fixture Scenario".to_string(),
        narrative: "Fixture narrative".to_string(),
        reflection_prompt: "Reflect.".to_string(),
        decision_points: vec![
            decision_point(
                1,
                BranchOptions::Flat(vec![
                    option("alpha", 80.0, 80.0),
                    option("bravo", 55.0, 50.0),
                    option("charlie", 30.0, 45.0),
                ]),
            ),
            decision_point(
                2,
                keyed(
                    vec![
                        ("alpha", vec![option("beta", 60.0, 60.0), option("omega", 70.0, 65.0)]),
                        ("bravo", vec![option("delta", 45.0, 55.0)]),
                    ],
                    Some(vec![option("fallback2", 50.0, 60.0)]),
                ),
            ),
            decision_point(
                3,
                keyed(
                    vec![
                        ("beta", vec![option("gamma", 40.0, 40.0), option("kappa", 65.0, 60.0)]),
                        ("delta", vec![option("epsilon", 75.0, 70.0)]),
                    ],
                    Some(vec![option("fallback3", 50.0, 60.0)]),
                ),
            ),
        ],
    }
}

/// A run with alpha/beta/gamma locked at confidences 4/3/2 and `reflection`.
pub(super) fn fixture_run(reflection: &str) -> ScenarioRun {
    let now = t0();
    let mut run = ScenarioRun::start("fixture", None, now);
    for (index, option_id, confidence) in
        [(1u8, "alpha", 4u8), (2, "beta", 3), (3, "gamma", 2)]
    {
        run.select_option(index, option_id, now);
        run.set_confidence(index, confidence).expect("confidence in range");
        run.lock_and_advance(index, now).expect("lock succeeds");
    }
    run.set_reflection(reflection);
    run
}

#[derive(Default, Clone)]
pub(super) struct MemorySink {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl MemorySink {
    pub(super) fn events(&self) -> Vec<RunEvent> {
        self.events.lock().expect("event mutex poisoned").clone()
    }

    pub(super) fn kinds(&self) -> Vec<&'static str> {
        self.events().iter().map(RunEvent::kind).collect()
    }
}

impl RunEventSink for MemorySink {
    fn publish(&self, event: RunEvent) -> Result<(), EventSinkError> {
        self.events.lock().expect("event mutex poisoned").push(event);
        Ok(())
    }
}

pub(super) struct FailingSink;

impl RunEventSink for FailingSink {
    fn publish(&self, _event: RunEvent) -> Result<(), EventSinkError> {
        Err(EventSinkError::Transport("sink offline".to_string()))
    }
}

pub(super) fn scoring_config() -> ScoringConfig {
    ScoringConfig {
        minimum_reflection_words: 10,
    }
}

pub(super) fn build_service() -> (
    Arc<ScenarioService<CatalogDocumentSource, MemorySink>>,
    Arc<MemorySink>,
) {
    let documents = Arc::new(CatalogDocumentSource::with_documents([fixture_document()]));
    let sink = Arc::new(MemorySink::default());
    let service = Arc::new(ScenarioService::new(
        documents,
        sink.clone(),
        scoring_config(),
    ));
    (service, sink)
}

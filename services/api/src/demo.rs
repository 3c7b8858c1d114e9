use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use readiness_lab::error::AppError;
use readiness_lab::workflows::training::content::parse_document;
use readiness_lab::workflows::training::{
    BranchOptions, CatalogDocumentSource, FsDocumentSource, ReflectionPhase, RunEvent,
    ScenarioService, ScoringConfig,
};

use crate::infra::{ContentSource, InMemoryEventSink};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Scenario id to run (defaults to the built-in demo scenario)
    #[arg(long, default_value = "supplier-disruption")]
    pub(crate) scenario: String,
    /// Load scenarios from this directory instead of the built-in catalog
    #[arg(long)]
    pub(crate) content_dir: Option<PathBuf>,
    /// Option id to pick at each decision point, in order (defaults to the
    /// first offered option)
    #[arg(long = "pick")]
    pub(crate) picks: Vec<String>,
    /// Confidence rating (1-5) applied at every decision point
    #[arg(long, default_value_t = 4)]
    pub(crate) confidence: u8,
    /// Reflection text submitted after the final decision point
    #[arg(long)]
    pub(crate) reflection: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ContentCheckArgs {
    /// Path to a scenario JSON file
    #[arg(long)]
    pub(crate) path: PathBuf,
}

const DEMO_REFLECTION: &str = "I committed to the backup supplier early because the \
    downside of waiting was unbounded while the qualification cost was known and \
    capped. My confidence was highest on the first call and lowest when splitting \
    volume, where I was effectively guessing at the recovering plant's yield. With \
    better visibility into the fire damage I would have sized the split differently, \
    but the structure of the decision would not have changed.";

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        scenario,
        content_dir,
        picks,
        confidence,
        reflection,
    } = args;

    let documents = match content_dir {
        Some(dir) => ContentSource::Fs(FsDocumentSource::new(dir)),
        None => ContentSource::Catalog(CatalogDocumentSource::builtin()),
    };
    let sink = Arc::new(InMemoryEventSink::default());
    let service = ScenarioService::new(
        Arc::new(documents),
        sink.clone(),
        ScoringConfig::default(),
    );

    println!("Scenario decision demo");

    let start = match service.start_run(&scenario, Some("demo-session".to_string())) {
        Ok(start) => start,
        Err(err) => {
            println!("  Could not start '{scenario}': {err}");
            return Ok(());
        }
    };
    println!("Scenario: {} ({})", start.title, start.scenario_id);
    println!("{}", start.narrative);

    let mut decision_point = Some(start.decision_point);
    let mut stage = 0usize;
    while let Some(point) = decision_point.take() {
        println!("\nDecision point {}: {}", point.index, point.stem);
        for option in &point.options {
            println!("  [{}] {}", option.id, option.text);
        }

        let pick = picks
            .get(stage)
            .cloned()
            .or_else(|| point.options.first().map(|option| option.id.clone()));
        let Some(pick) = pick else {
            println!("  No options offered; stopping demo");
            return Ok(());
        };
        stage += 1;

        if let Err(err) = service.select_option(&start.run_id, point.index, &pick) {
            println!("  Selection rejected: {err}");
            return Ok(());
        }
        if let Err(err) = service.set_confidence(&start.run_id, point.index, confidence) {
            println!("  Confidence rejected: {err}");
            return Ok(());
        }
        match service.lock_decision(&start.run_id, point.index) {
            Ok(lock) => {
                println!("  Chose [{pick}] at confidence {confidence} -> locked");
                decision_point = lock.next_decision_point;
            }
            Err(err) => {
                println!("  Lock rejected: {err}");
                return Ok(());
            }
        }
    }

    let reflection = reflection.unwrap_or_else(|| DEMO_REFLECTION.to_string());
    if let Err(err) = service.submit_reflection(&start.run_id, ReflectionPhase::Post, &reflection) {
        println!("  Reflection rejected: {err}");
        return Ok(());
    }

    let debrief = match service.compute_debrief(&start.run_id) {
        Ok(debrief) => debrief,
        Err(err) => {
            println!("  Debrief unavailable: {err}");
            return Ok(());
        }
    };

    println!("\n{}", debrief.short_feedback.line1);
    println!("{}", debrief.short_feedback.line2);
    println!("\nMetric breakdown");
    let metrics = &debrief.metrics;
    println!("- Decision quality: {}", metrics.decision_quality);
    println!("- Confidence alignment: {}", metrics.confidence_alignment);
    println!("- Reflection quality: {}", metrics.reflection_quality);
    println!("- Cognitive readiness index: {}", metrics.cri);
    println!("- Bias awareness: {}", metrics.bias_awareness);
    println!("- Trust calibration: {}", metrics.trust_calibration);
    println!("- Information advantage: {}", metrics.information_advantage);
    println!("- Cognitive adaptability: {}", metrics.cognitive_adaptability);
    println!("- Escalation tendency: {}", metrics.escalation_tendency);

    match serde_json::to_string_pretty(&debrief) {
        Ok(json) => println!("\nPublic debrief payload:\n{json}"),
        Err(err) => println!("\nPublic debrief payload unavailable: {err}"),
    }

    let events = sink.events();
    println!("\nDispatched events");
    for event in &events {
        match event {
            RunEvent::DecisionLocked { decision, .. } => println!(
                "- decision_locked: dp {} -> {} (confidence {}, {} selection changes, {} ms)",
                decision.decision_point_index,
                decision.final_option_id,
                decision.confidence,
                decision.trace.change_count,
                decision.time_on_page_ms
            ),
            RunEvent::ReflectionSubmitted { phase, text, .. } => println!(
                "- reflection_submitted: {} phase, {} chars",
                phase.label(),
                text.len()
            ),
            RunEvent::DebriefComputed { metrics, .. } => println!(
                "- debrief_computed: mission score {}",
                metrics.mission_score
            ),
        }
    }

    Ok(())
}

pub(crate) fn run_content_check(args: ContentCheckArgs) -> Result<(), AppError> {
    let bytes = std::fs::read(&args.path)?;
    let document = parse_document(&bytes)?;

    println!("Scenario '{}' is valid", document.id);
    println!("Title: {}", document.title);
    for point in &document.decision_points {
        match &point.options {
            BranchOptions::Flat(options) => {
                println!("- Decision point {}: flat, {} options", point.index, options.len());
            }
            BranchOptions::Keyed { branches, default } => {
                let default_note = match default {
                    Some(options) => format!("default branch with {} options", options.len()),
                    None => "no default branch".to_string(),
                };
                println!(
                    "- Decision point {}: {} keyed branches, {}",
                    point.index,
                    branches.len(),
                    default_note
                );
                for (key, options) in branches {
                    println!("    '{}' -> {} options", key, options.len());
                }
            }
        }
    }

    Ok(())
}

use super::common::{fixture_run, seconds, t0, words};
use crate::workflows::training::tracker::{
    ActionOutcome, DecisionPointStatus, RunStatus, ScenarioRun, ValidationError,
};

#[test]
fn selection_sequence_collapses_consecutive_repeats() {
    let now = t0();
    let mut run = ScenarioRun::start("fixture", None, now);

    run.select_option(1, "a", now);
    run.select_option(1, "b", now + seconds(1));
    run.select_option(1, "a", now + seconds(2));

    let stage = run.decision_point(1).expect("stage exists");
    assert_eq!(stage.trace.sequence, vec!["a", "b", "a"]);
    assert_eq!(stage.trace.change_count, 2);

    let mut run = ScenarioRun::start("fixture", None, now);
    run.select_option(1, "a", now);
    run.select_option(1, "a", now + seconds(1));

    let stage = run.decision_point(1).expect("stage exists");
    assert_eq!(stage.trace.sequence, vec!["a"]);
    assert_eq!(stage.trace.change_count, 0);
}

#[test]
fn first_selection_timestamp_is_set_once() {
    let now = t0();
    let mut run = ScenarioRun::start("fixture", None, now);

    run.select_option(1, "a", now + seconds(3));
    run.select_option(1, "b", now + seconds(9));

    let stage = run.decision_point(1).expect("stage exists");
    assert_eq!(stage.trace.first_selection_at, Some(now + seconds(3)));
}

#[test]
fn confidence_counter_counts_same_value_rewrites() {
    let now = t0();
    let mut run = ScenarioRun::start("fixture", None, now);

    run.set_confidence(1, 3).expect("in range");
    run.set_confidence(1, 3).expect("in range");
    run.set_confidence(1, 4).expect("in range");

    let stage = run.decision_point(1).expect("stage exists");
    assert_eq!(stage.trace.confidence_change_count, 3);
    assert_eq!(stage.confidence, Some(4));
}

#[test]
fn confidence_outside_one_to_five_is_rejected() {
    let now = t0();
    let mut run = ScenarioRun::start("fixture", None, now);

    for value in [0u8, 6, 100] {
        let result = run.set_confidence(1, value);
        assert_eq!(result, Err(ValidationError::ConfidenceOutOfRange));
    }

    let stage = run.decision_point(1).expect("stage exists");
    assert_eq!(stage.trace.confidence_change_count, 0);
}

#[test]
fn lock_without_selection_is_rejected() {
    let now = t0();
    let mut run = ScenarioRun::start("fixture", None, now);
    run.set_confidence(1, 3).expect("in range");

    let result = run.lock_and_advance(1, now);
    assert_eq!(result, Err(ValidationError::SelectionRequired));
    assert_eq!(
        result.expect_err("rejected").to_string(),
        "selection required"
    );
}

#[test]
fn lock_without_confidence_uses_the_exact_message_on_every_stage() {
    let now = t0();
    let mut run = ScenarioRun::start("fixture", None, now);

    for index in 1u8..=3 {
        run.select_option(index, "alpha", now);
        let error = run
            .lock_and_advance(index, now)
            .expect_err("confidence missing");
        assert_eq!(error, ValidationError::ConfidenceRequired);
        assert_eq!(
            error.to_string(),
            "Please rate your confidence before continuing."
        );

        run.set_confidence(index, 3).expect("in range");
        run.lock_and_advance(index, now).expect("lock succeeds");
    }
}

#[test]
fn locked_stage_absorbs_selection_and_confidence_edits() {
    let now = t0();
    let mut run = ScenarioRun::start("fixture", None, now);
    run.select_option(1, "alpha", now);
    run.set_confidence(1, 4).expect("in range");
    run.lock_and_advance(1, now).expect("lock succeeds");

    let before = run.clone();
    assert_eq!(run.select_option(1, "bravo", now + seconds(5)), ActionOutcome::Ignored);
    assert_eq!(
        run.set_confidence(1, 1).expect("absorbed, not an error"),
        ActionOutcome::Ignored
    );
    assert_eq!(run, before);
}

#[test]
fn relocking_returns_the_existing_record_unchanged() {
    let now = t0();
    let mut run = ScenarioRun::start("fixture", None, now);
    run.select_option(1, "alpha", now);
    run.set_confidence(1, 4).expect("in range");
    let first = run.lock_and_advance(1, now + seconds(2)).expect("lock");

    let before = run.clone();
    let second = run
        .lock_and_advance(1, now + seconds(30))
        .expect("idempotent relock");
    assert_eq!(first, second);
    assert_eq!(run, before);
}

#[test]
fn stage_two_never_activates_before_stage_one_locks() {
    let now = t0();
    let mut run = ScenarioRun::start("fixture", None, now);

    // Any call order aimed at stage 2 is absorbed or rejected while 1 is open.
    assert_eq!(run.select_option(2, "beta", now), ActionOutcome::Ignored);
    assert_eq!(
        run.set_confidence(2, 3).expect("absorbed"),
        ActionOutcome::Ignored
    );
    assert_eq!(
        run.lock_and_advance(2, now),
        Err(ValidationError::DecisionPointNotActive(2))
    );
    let stage = run.decision_point(2).expect("stage exists");
    assert_eq!(stage.status, DecisionPointStatus::Pending);

    run.select_option(1, "alpha", now);
    run.set_confidence(1, 4).expect("in range");
    run.lock_and_advance(1, now).expect("lock succeeds");

    let stage = run.decision_point(2).expect("stage exists");
    assert_eq!(stage.status, DecisionPointStatus::Active);
    assert_eq!(run.current_decision_point(), Some(2));
}

#[test]
fn time_on_page_is_measured_from_stage_activation() {
    let now = t0();
    let mut run = ScenarioRun::start("fixture", None, now);

    run.select_option(1, "alpha", now + seconds(1));
    run.set_confidence(1, 4).expect("in range");
    let first = run
        .lock_and_advance(1, now + seconds(2))
        .expect("lock succeeds");
    assert_eq!(first.time_on_page_ms, 2_000);

    // Stage 2's timer starts at the stage 1 lock, not at scenario start.
    run.select_option(2, "beta", now + seconds(4));
    run.set_confidence(2, 3).expect("in range");
    let second = run
        .lock_and_advance(2, now + seconds(5))
        .expect("lock succeeds");
    assert_eq!(second.time_on_page_ms, 3_000);
}

#[test]
fn time_on_page_never_goes_negative() {
    let now = t0();
    let mut run = ScenarioRun::start("fixture", None, now);
    run.select_option(1, "alpha", now);
    run.set_confidence(1, 4).expect("in range");

    let locked = run
        .lock_and_advance(1, now - seconds(30))
        .expect("lock succeeds");
    assert_eq!(locked.time_on_page_ms, 0);
}

#[test]
fn third_lock_activates_nothing_further() {
    let run = fixture_run("");
    assert_eq!(run.current_decision_point(), None);
    assert_eq!(run.locked_count(), 3);
}

#[test]
fn run_status_gates_on_locks_and_reflection_length() {
    let mut run = fixture_run("");
    assert_eq!(run.status(10), RunStatus::InProgress);

    run.set_reflection(words(9));
    assert_eq!(run.status(10), RunStatus::InProgress);

    run.set_reflection(words(10));
    assert_eq!(run.status(10), RunStatus::ReadyToScore);

    run.mark_scored();
    assert_eq!(run.status(10), RunStatus::Scored);
}

#[test]
fn reflection_edits_are_ignored_after_scoring() {
    let mut run = fixture_run(&words(20));
    run.mark_scored();

    assert_eq!(run.set_reflection("rewrite"), ActionOutcome::Ignored);
    assert_eq!(run.reflection_text(), words(20));
}

//! End-to-end scenarios for the status pipeline
//!
//! Each test feeds host-shaped transactions through the committer and the
//! lifecycle date manager with the clock pinned to 2024-01-01.

use chrono::NaiveDate;
use statusflow::control::StatusControl;
use statusflow::domain::{CycleStep, DateSettings, MetadataFormat, StatusCycle, StatusModel};
use statusflow::editor::{Annotation, ChangeSpec, Text, Transaction};
use statusflow::pipeline::{FixedClock, StatusPipeline};

fn pipeline_with(model: StatusModel, dates: DateSettings) -> StatusPipeline {
    let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    StatusPipeline::with_clock(model, dates, clock).unwrap()
}

fn pipeline() -> StatusPipeline {
    pipeline_with(StatusModel::default(), DateSettings::default())
}

/// Simulates a checkbox click on a 1-based line and resolves it
fn click(pipeline: &StatusPipeline, doc: &str, line: usize) -> String {
    let text = Text::from(doc);
    let tr = StatusControl::new(pipeline.model())
        .click(&text, line)
        .unwrap();
    pipeline.resolve(tr).new_doc().as_str().to_string()
}

fn apply(pipeline: &StatusPipeline, doc: &str, specs: Vec<ChangeSpec>) -> Transaction {
    pipeline.resolve(Transaction::new(Text::from(doc), specs).unwrap())
}

// =============================================================================
// Click cycle
// =============================================================================

#[test]
fn click_cycle_stamps_start_then_completion() {
    let pipeline = pipeline();

    let started = click(&pipeline, "- [ ] Buy milk", 1);
    assert_eq!(started, "- [/] Buy milk 🛫 2024-01-01");

    let done = click(&pipeline, &started, 1);
    assert_eq!(done, "- [x] Buy milk ✅ 2024-01-01");

    let reset = click(&pipeline, &done, 1);
    assert_eq!(reset, "- [ ] Buy milk");
}

#[test]
fn completion_stays_before_block_reference() {
    let pipeline = pipeline();
    let tr = StatusControl::new(pipeline.model())
        .select(&Text::from("- [ ] Task ^blk1"), 1, "Completed")
        .unwrap();

    let resolved = pipeline.resolve(tr);
    assert_eq!(resolved.new_doc().as_str(), "- [x] Task ✅ 2024-01-01 ^blk1");
}

#[test]
fn block_reference_survives_full_cycle() {
    let pipeline = pipeline();
    let mut doc = "- [ ] Task #home ^blk1".to_string();

    for _ in 0..6 {
        doc = click(&pipeline, &doc, 1);
        assert!(doc.ends_with(" ^blk1"), "block reference moved: {doc}");
    }
}

#[test]
fn bracketed_dates() {
    let dates = DateSettings {
        format: MetadataFormat::Bracketed,
        ..Default::default()
    };
    let pipeline = pipeline_with(StatusModel::default(), dates);

    let started = click(&pipeline, "- [ ] Buy milk", 1);
    assert_eq!(started, "- [/] Buy milk [start:: 2024-01-01]");

    let done = click(&pipeline, &started, 1);
    assert_eq!(done, "- [x] Buy milk [completion:: 2024-01-01]");
}

#[test]
fn click_on_one_line_of_many() {
    let pipeline = pipeline();
    let doc = "# Groceries\n\n- [ ] Buy milk\n- [x] Buy eggs ✅ 2023-12-30\n";

    let out = click(&pipeline, doc, 3);
    assert_eq!(
        out,
        "# Groceries\n\n- [/] Buy milk 🛫 2024-01-01\n- [x] Buy eggs ✅ 2023-12-30\n"
    );
}

// =============================================================================
// Type transitions
// =============================================================================

#[test]
fn same_type_switch_never_touches_dates() {
    let pipeline = pipeline();
    let doc = "- [x] Done ✅ 2023-06-01";
    let tr = Transaction::new(Text::from(doc), vec![ChangeSpec::replace(3, 4, "X")])
        .unwrap()
        .with_annotation(Annotation::StatusCommit);

    let resolved = pipeline.resolve(tr);
    assert_eq!(resolved.new_doc().as_str(), "- [X] Done ✅ 2023-06-01");
    assert!(!resolved.has_annotation(&Annotation::LifecycleDates));
}

#[test]
fn abandoning_stamps_cancellation() {
    let pipeline = pipeline();
    let doc = Text::from("- [/] Write report 🛫 2023-12-01");
    let tr = StatusControl::new(pipeline.model())
        .select(&doc, 1, "Abandoned")
        .unwrap();

    let resolved = pipeline.resolve(tr);
    assert_eq!(
        resolved.new_doc().as_str(),
        "- [-] Write report ❌ 2024-01-01"
    );
}

#[test]
fn unmanaged_start_date_is_left_alone() {
    let mut dates = DateSettings::default();
    dates.start.manage = false;
    let pipeline = pipeline_with(StatusModel::default(), dates);

    assert_eq!(click(&pipeline, "- [ ] a", 1), "- [/] a");
    assert_eq!(
        click(&pipeline, "- [/] a 🛫 2023-01-01", 1),
        "- [x] a 🛫 2023-01-01 ✅ 2024-01-01"
    );
}

// =============================================================================
// Multiple cycles
// =============================================================================

#[test]
fn highest_priority_cycle_wins() {
    let mut model = StatusModel::default();
    model.cycles = vec![
        StatusCycle::new(
            "triage",
            5,
            vec![
                CycleStep::new("Planned", '?'),
                CycleStep::new("Not Started", ' '),
            ],
        ),
        StatusCycle::new(
            "work",
            1,
            vec![
                CycleStep::new("Not Started", ' '),
                CycleStep::new("In Progress", '/'),
                CycleStep::new("Completed", 'x'),
            ],
        ),
    ];
    let pipeline = pipeline_with(model, DateSettings::default());

    // ' ' is in both cycles; "work" has the lower priority value
    assert_eq!(click(&pipeline, "- [ ] a", 1), "- [/] a 🛫 2024-01-01");
    // '?' only appears in "triage"
    assert_eq!(click(&pipeline, "- [?] a", 1), "- [ ] a");
}

// =============================================================================
// Rejected edits
// =============================================================================

#[test]
fn moving_task_lines_has_no_side_effects() {
    let pipeline = pipeline();
    let doc = "- [ ] one\n- [x] two\n";
    let tr = apply(
        &pipeline,
        doc,
        vec![
            ChangeSpec::insert(0, "- [x] two\n"),
            ChangeSpec::delete(10, 20),
        ],
    );

    assert_eq!(tr.new_doc().as_str(), "- [x] two\n- [ ] one\n");
    assert!(tr.annotations().is_empty());
}

#[test]
fn multi_line_paste_has_no_side_effects() {
    let pipeline = pipeline();
    let pasted = "- [x] a\n- [/] b\n";
    let tr = Transaction::new(Text::from("intro\n"), vec![ChangeSpec::insert(6, pasted)])
        .unwrap()
        .with_user_event("input.paste");

    let resolved = pipeline.resolve(tr);
    assert_eq!(resolved.new_doc().as_str(), "intro\n- [x] a\n- [/] b\n");
    assert!(!resolved.has_annotation(&Annotation::StatusCommit));
    assert!(!resolved.has_annotation(&Annotation::LifecycleDates));
}

#[test]
fn deleting_a_line_leaves_the_next_task_alone() {
    let pipeline = pipeline();

    let tr = apply(
        &pipeline,
        "- [ ] a\n- [x] b",
        vec![ChangeSpec::delete(0, 8)],
    );
    assert_eq!(tr.new_doc().as_str(), "- [x] b");
    assert!(tr.annotations().is_empty());

    let tr = apply(
        &pipeline,
        "- [/] a\n- [x] b ✅ 2020-05-05",
        vec![ChangeSpec::delete(0, 8)],
    );
    assert_eq!(tr.new_doc().as_str(), "- [x] b ✅ 2020-05-05");
    assert!(tr.annotations().is_empty());
}

#[test]
fn backspace_chain_into_a_checkbox_is_not_dated() {
    let pipeline = pipeline();
    let tr = apply(
        &pipeline,
        "- [x] a\nsome text",
        vec![ChangeSpec::replace(3, 4, " "), ChangeSpec::delete(8, 13)],
    );

    assert_eq!(tr.new_doc().as_str(), "- [ ] a\ntext");
    assert!(tr.annotations().is_empty());
}

#[test]
fn indenting_a_task_is_ignored() {
    let pipeline = pipeline();
    let tr = apply(&pipeline, "- [ ] a", vec![ChangeSpec::insert(0, "\t")]);
    assert_eq!(tr.new_doc().as_str(), "\t- [ ] a");
    assert!(tr.annotations().is_empty());
}

#[test]
fn typing_ordinary_letter_is_ignored() {
    let pipeline = pipeline();
    let tr = apply(&pipeline, "- [ ] a", vec![ChangeSpec::replace(3, 4, "q")]);
    assert_eq!(tr.new_doc().as_str(), "- [q] a");
    assert!(tr.annotations().is_empty());
}

#[test]
fn typing_a_new_empty_task_is_left_alone() {
    let pipeline = pipeline();
    let tr = apply(&pipeline, "notes\n", vec![ChangeSpec::insert(6, "- [ ] ")]);
    assert_eq!(tr.new_doc().as_str(), "notes\n- [ ] ");
    assert!(tr.annotations().is_empty());
}

#[test]
fn status_commit_from_control_is_not_cycled_again() {
    let pipeline = pipeline();
    let tr = StatusControl::new(pipeline.model())
        .select(&Text::from("- [ ] a"), 1, "Planned")
        .unwrap();

    let resolved = pipeline.resolve(tr);
    assert_eq!(resolved.new_doc().as_str(), "- [?] a");
}

//! Lifecycle date manager
//!
//! Second filter in the pipeline. Re-derives status type transitions from
//! the line contents before and after the edit, plans date stamps for each
//! transition and folds them into the transaction's own changes so that the
//! resulting spec is still expressed against the starting document.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, trace};

use super::clock::Clock;
use super::guards::LIFECYCLE_GUARDS;
use crate::domain::{
    detect_status_transition, plan_date_operations, plan_line_edits, DateError, DateMatcher,
    DateSettings, LineClassifier, StatusModel,
};
use crate::editor::{
    Annotation, Bias, Change, ChangeSpec, FilterOutcome, Transaction, TransactionFilter,
    TransactionSpec,
};

pub struct LifecycleDateManager {
    model: Arc<StatusModel>,
    settings: Arc<DateSettings>,
    matcher: DateMatcher,
    classifier: LineClassifier,
    clock: Arc<dyn Clock>,
}

impl LifecycleDateManager {
    pub fn new(
        model: Arc<StatusModel>,
        settings: Arc<DateSettings>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DateError> {
        settings.validate()?;
        let matcher = DateMatcher::new(&settings)?;
        let classifier = LineClassifier::new().with_date_markers(settings.markers());

        Ok(Self {
            model,
            settings,
            matcher,
            classifier,
            clock,
        })
    }

    /// Date edits for every changed line, in post-edit document coordinates
    fn date_edits(&self, tr: &Transaction) -> Vec<ChangeSpec> {
        let old_doc = tr.start_doc();
        let new_doc = tr.new_doc();
        let now = self.clock.now();

        let mut seen = BTreeSet::new();
        let mut edits = Vec::new();

        for change in tr.changes().iter() {
            // A deletion across a line break pairs two different tasks
            if old_doc.slice(change.from_a, change.to_a).contains('\n') {
                trace!(from = change.from_a, to = change.to_a, "Change spans more than one line");
                continue;
            }
            let new_line = new_doc.line_at(change.from_b);
            if !seen.insert(new_line.from) {
                continue;
            }
            let old_line = old_doc.line_at(change.from_a);

            let transition = detect_status_transition(old_line.text, new_line.text, &self.model);
            let Some(transition) = transition else {
                continue;
            };
            if !transition.changes_type() {
                trace!(line = new_line.number, "Marker changed within the same status type");
                continue;
            }
            let Some(task) = self.classifier.classify(new_line.text) else {
                continue;
            };

            let ops = plan_date_operations(
                transition.old_type,
                transition.new_type,
                new_line.text,
                &self.settings,
                &self.matcher,
            );
            debug!(
                line = new_line.number,
                from = %transition.old_type,
                to = %transition.new_type,
                operations = ops.len(),
                "Status type transition"
            );

            let line_edits = plan_line_edits(
                new_line.text,
                &task,
                &ops,
                &self.settings,
                &self.matcher,
                now,
            );
            edits.extend(
                line_edits
                    .into_iter()
                    .map(|edit| edit.shifted(new_line.from)),
            );
        }

        edits
    }
}

/// The edit lies inside text inserted by the change
fn within_insert(change: &Change, edit: &ChangeSpec) -> bool {
    change.inserts() && change.from_b <= edit.from && edit.to <= change.to_b
}

/// Folds post-edit date edits into the transaction's changes.
///
/// Edits inside text inserted by the transaction are spliced into that
/// insertion. Everything else is mapped back to the starting document;
/// edits that straddle a change or overlap one are dropped.
fn compose(tr: &Transaction, date_edits: Vec<ChangeSpec>) -> Vec<ChangeSpec> {
    let changes: Vec<_> = tr.changes().iter().collect();
    let mut base = tr.changes().specs();
    let map = tr.position_map();
    let len = tr.start_doc().len();

    let mut spliced: Vec<(usize, ChangeSpec)> = Vec::new();
    let mut mapped = Vec::new();

    for edit in date_edits {
        if let Some(index) = changes.iter().position(|c| within_insert(c, &edit)) {
            let from_b = changes[index].from_b;
            let local = ChangeSpec::replace(edit.from - from_b, edit.to - from_b, edit.insert);
            spliced.push((index, local));
            continue;
        }

        let from = map.map_back(edit.from, Bias::Before).min(len);
        let to = map.map_back(edit.to, Bias::Before).min(len);
        if from > to || to - from != edit.to - edit.from {
            debug!(from = edit.from, to = edit.to, "Dropping date edit that straddles a change");
            continue;
        }
        if base.iter().any(|b| from < b.to && b.from < to) {
            debug!(from, to, "Dropping date edit that overlaps a change");
            continue;
        }
        mapped.push(ChangeSpec::replace(from, to, edit.insert));
    }

    // Later offsets first so earlier splices stay valid
    spliced.sort_by(|a, b| (b.0, b.1.from).cmp(&(a.0, a.1.from)));
    for (index, edit) in spliced {
        let insert = &mut base[index].insert;
        let fits = edit.to <= insert.len()
            && insert.is_char_boundary(edit.from)
            && insert.is_char_boundary(edit.to);
        if fits {
            insert.replace_range(edit.from..edit.to, &edit.insert);
        }
    }

    base.extend(mapped);
    base
}

impl TransactionFilter for LifecycleDateManager {
    fn name(&self) -> &'static str {
        "lifecycle_dates"
    }

    fn filter(&self, tr: &Transaction) -> FilterOutcome {
        if !tr.doc_changed() {
            return FilterOutcome::PassThrough;
        }
        if let Some(reason) = LIFECYCLE_GUARDS.check(tr) {
            debug!(%reason, "Transaction rejected by lifecycle date manager");
            return FilterOutcome::PassThrough;
        }

        let edits = self.date_edits(tr);
        if edits.is_empty() {
            return FilterOutcome::PassThrough;
        }

        let mut annotations = tr.annotations().to_vec();
        annotations.push(Annotation::LifecycleDates);

        FilterOutcome::Rewrite(TransactionSpec {
            changes: compose(tr, edits),
            selection: tr.selection(),
            annotations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{FilterChain, Text};
    use crate::pipeline::clock::FixedClock;
    use chrono::NaiveDate;

    fn manager() -> LifecycleDateManager {
        let clock = FixedClock::on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        LifecycleDateManager::new(
            Arc::new(StatusModel::default()),
            Arc::new(DateSettings::default()),
            Arc::new(clock),
        )
        .unwrap()
    }

    fn run(doc: &str, specs: Vec<ChangeSpec>) -> Transaction {
        let chain = FilterChain::new().with(manager());
        chain.resolve(Transaction::new(Text::from(doc), specs).unwrap())
    }

    #[test]
    fn typed_completion_is_stamped() {
        let tr = run("- [ ] Buy milk", vec![ChangeSpec::replace(3, 4, "x")]);
        assert_eq!(tr.new_doc().as_str(), "- [x] Buy milk ✅ 2024-01-01");
        assert!(tr.has_annotation(&Annotation::LifecycleDates));
    }

    #[test]
    fn date_on_another_line_maps_back() {
        let doc = "- [ ] a\n- [ ] b";
        let tr = run(
            doc,
            vec![
                ChangeSpec::insert(0, "xy "),
                ChangeSpec::replace(11, 12, "/"),
            ],
        );
        assert_eq!(tr.new_doc().as_str(), "xy - [ ] a\n- [/] b 🛫 2024-01-01");
    }

    #[test]
    fn date_inside_inserted_text_is_spliced() {
        let tr = run("- [ ] a", vec![ChangeSpec::replace(3, 7, "x] done")]);
        assert_eq!(tr.new_doc().as_str(), "- [x] done ✅ 2024-01-01");
    }

    #[test]
    fn same_type_switch_passes_through() {
        let tr = run("- [x] a", vec![ChangeSpec::replace(3, 4, "X")]);
        assert_eq!(tr.new_doc().as_str(), "- [X] a");
        assert!(!tr.has_annotation(&Annotation::LifecycleDates));
    }

    #[test]
    fn reopening_removes_completion_date() {
        let tr = run(
            "- [x] a ✅ 2023-05-05 ^ref",
            vec![ChangeSpec::replace(3, 4, " ")],
        );
        assert_eq!(tr.new_doc().as_str(), "- [ ] a ^ref");
    }

    #[test]
    fn edit_overlapping_a_changed_token_is_dropped() {
        let doc = "- [x] a ✅ 2023-05-05\n- [ ] b";
        let tr = run(
            doc,
            vec![
                ChangeSpec::replace(3, 4, " "),
                ChangeSpec::replace(21, 22, "6"),
                ChangeSpec::replace(26, 27, "/"),
            ],
        );

        // The completion token was edited by hand, so its removal is skipped
        assert_eq!(
            tr.new_doc().as_str(),
            "- [ ] a ✅ 2023-05-06\n- [/] b 🛫 2024-01-01"
        );
        assert!(tr.has_annotation(&Annotation::LifecycleDates));
    }

    #[test]
    fn edit_straddling_an_insertion_is_dropped() {
        let doc = "- [x] a ✅ 2023-05-05\n- [ ] b";
        let tr = run(
            doc,
            vec![
                ChangeSpec::replace(3, 4, " "),
                ChangeSpec::insert(11, " "),
                ChangeSpec::replace(26, 27, "/"),
            ],
        );

        assert_eq!(
            tr.new_doc().as_str(),
            "- [ ] a ✅  2023-05-05\n- [/] b 🛫 2024-01-01"
        );
    }

    #[test]
    fn line_deletion_does_not_pair_neighbouring_tasks() {
        let tr = run(
            "- [/] a\n- [x] b ✅ 2020-05-05",
            vec![ChangeSpec::delete(0, 8)],
        );
        assert_eq!(tr.new_doc().as_str(), "- [x] b ✅ 2020-05-05");
        assert!(!tr.has_annotation(&Annotation::LifecycleDates));
    }

    #[test]
    fn marker_edit_beside_a_deletion_is_not_dated() {
        let tr = run(
            "- [ ] a\nsome text",
            vec![ChangeSpec::replace(3, 4, "x"), ChangeSpec::delete(8, 13)],
        );
        assert_eq!(tr.new_doc().as_str(), "- [x] a\ntext");
        assert!(!tr.has_annotation(&Annotation::LifecycleDates));
    }

    #[test]
    fn already_stamped_transaction_is_ignored() {
        let tr = Transaction::new(Text::from("- [ ] a"), vec![ChangeSpec::replace(3, 4, "x")])
            .unwrap()
            .with_annotation(Annotation::LifecycleDates);
        let chain = FilterChain::new().with(manager());
        assert_eq!(chain.resolve(tr).new_doc().as_str(), "- [x] a");
    }

    #[test]
    fn invalid_format_is_rejected_at_construction() {
        let mut settings = DateSettings::default();
        settings.completed.format = "%Q%".to_string();
        let clock = Arc::new(FixedClock::on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));
        let model = Arc::new(StatusModel::default());
        let manager = LifecycleDateManager::new(model, Arc::new(settings), clock);
        assert!(manager.is_err());
    }
}

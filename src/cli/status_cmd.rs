//! Status model commands

use anyhow::{bail, Result};
use serde::Serialize;

use super::app::Session;
use super::output::Output;
use crate::control::StatusControl;
use crate::domain::{active_cycle, next_status};

/// Parses a marker argument; `space` stands for ` `
pub fn parse_mark(raw: &str) -> Result<char> {
    if raw.eq_ignore_ascii_case("space") {
        return Ok(' ');
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(mark), None) => Ok(mark),
        _ => bail!("Marker must be a single character, got '{}'", raw),
    }
}

fn show_mark(mark: char) -> String {
    format!("[{}]", mark)
}

pub fn next(output: &Output, session: &Session, raw: &str) -> Result<()> {
    let mark = parse_mark(raw)?;
    let model = &session.settings.statuses;

    let Some(next) = next_status(mark, model) else {
        bail!("Every status is excluded from cycling");
    };

    if output.is_json() {
        output.data(&serde_json::json!({
            "mark": mark,
            "cycle": active_cycle(mark, model).map(|c| c.name.as_str()),
            "next": next,
        }));
    } else {
        output.line(&format!(
            "{} -> {} {}",
            show_mark(mark),
            show_mark(next.mark),
            next.status_name
        ));
    }
    Ok(())
}

#[derive(Serialize)]
struct StatusRow<'a> {
    status: &'a str,
    mark: Option<char>,
    status_type: &'static str,
    in_cycle: bool,
}

pub fn list(output: &Output, session: &Session) -> Result<()> {
    let model = &session.settings.statuses;
    let remaining: Vec<_> = model
        .remaining_cycle()
        .into_iter()
        .map(|s| s.status)
        .collect();

    let rows: Vec<StatusRow> = model
        .statuses
        .iter()
        .map(|status| {
            let mark = model.mark_of(status);
            StatusRow {
                status,
                mark,
                status_type: mark.map(|m| model.type_of(m).label()).unwrap_or("unknown"),
                in_cycle: remaining.contains(status),
            }
        })
        .collect();

    if output.is_json() {
        output.data(&serde_json::json!({
            "statuses": rows,
            "cycles": model.cycles,
        }));
        return Ok(());
    }

    for row in &rows {
        let mark = row.mark.map(show_mark).unwrap_or_else(|| "[?]".to_string());
        let cycle = if row.in_cycle { "cycle" } else { "excluded" };
        output.row(&[&mark, row.status, row.status_type, cycle]);
    }
    for cycle in model.cycles_by_priority() {
        let steps: Vec<String> = cycle.steps.iter().map(|s| show_mark(s.mark)).collect();
        output.line(&format!(
            "cycle {} (priority {}): {}",
            cycle.name,
            cycle.priority,
            steps.join(" -> ")
        ));
    }
    Ok(())
}

pub fn menu(output: &Output, session: &Session, raw: &str) -> Result<()> {
    let mark = parse_mark(raw)?;
    let entries = StatusControl::new(&session.settings.statuses).menu(mark);

    if output.is_json() {
        output.data(&entries);
        return Ok(());
    }

    for entry in &entries {
        let flag = match (entry.current, entry.next) {
            (true, _) => "*",
            (false, true) => ">",
            _ => " ",
        };
        output.row(&[flag, &show_mark(entry.mark), &entry.status]);
    }
    Ok(())
}

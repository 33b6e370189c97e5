//! Output Formatting

use std::fmt::Write;

use presence_sync::{CycleReport, GroupView};

use crate::commands::OutputFormat;
use crate::error::CliResult;

/// Render a cycle report
pub fn render_report(report: &CycleReport, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Plain => {
            let mut out = String::new();
            let _ = writeln!(out, "Refresh completed at {}", report.completed_at.to_rfc3339());
            let _ = writeln!(out, "  Roster:          {}", report.roster_size);
            let _ = writeln!(out, "  Placed:          {}", report.placed);
            let _ = writeln!(out, "  Without placement: {}", report.unplaced);
            let _ = writeln!(out, "  Detail failures: {}", report.failed);
            let _ = writeln!(
                out,
                "  Events:          {} rows, {} dropped, {} persons",
                report.event_rows, report.dropped_events, report.persons_with_events
            );
            let _ = writeln!(
                out,
                "  Merge:           +{} ~{} -{}",
                report.merge.inserted, report.merge.updated, report.merge.removed
            );
            let _ = writeln!(
                out,
                "  Status:          {} present, {} absent, {} unknown ({}%)",
                report.counts.present,
                report.counts.absent,
                report.counts.unknown,
                report.counts.unknown_percent()
            );
            Ok(out)
        }
    }
}

/// Render one group as floors and rooms
pub fn render_group(view: &GroupView, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&view.to_payload())?),
        OutputFormat::Plain => Ok(render_group_plain(view)),
    }
}

fn render_group_plain(view: &GroupView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", view.group_label, view.group_key);
    match view.last_update {
        Some(at) => {
            let _ = writeln!(out, "Last update: {}", at.to_rfc3339());
        }
        None => {
            let _ = writeln!(out, "Last update: never");
        }
    }

    let plan = view.floor_plan();
    if plan.is_empty() {
        let _ = writeln!(out, "No records");
        return out;
    }

    for (floor, rooms) in plan.iter() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Floor {}", floor);
        for (room, records) in rooms {
            let _ = writeln!(out, "  Room {}", room);
            for record in records {
                let _ = writeln!(
                    out,
                    "    [{}] {} (#{})",
                    record.current_status, record.name, record.id
                );
            }
        }
    }
    out
}

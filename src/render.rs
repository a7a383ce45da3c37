//! Plain-text rendering of a timeline frame for the terminal.

use std::collections::HashSet;
use std::fmt::Write;

use crate::icons::IconCatalog;
use crate::model::{Event, EventId};
use crate::ticker::Frame;

/// One line per card in display order, with hour labels and the now line
/// interleaved at their vertical positions.
pub fn render_day(events: &[Event], frame: &Frame, icons: &IconCatalog) -> String {
    let conflicts: HashSet<&EventId> = frame.conflicts.iter().collect();
    let mut rows: Vec<(f64, u8, String)> = Vec::new();

    rows.push((frame.markers.day_start, 0, format!("{:>7.1}  ☀ day start", frame.markers.day_start)));
    for hour in &frame.markers.hours {
        rows.push((hour.y, 1, format!("{:>7.1}  {:02}", hour.y, hour.hour)));
    }
    rows.push((
        frame.markers.now,
        2,
        format!("{:>7.1}  ── now {} ──", frame.markers.now, frame.now),
    ));
    for card in &frame.cards {
        let Some(event) = events.iter().find(|e| e.id == card.id) else {
            continue;
        };
        let mut line = format!(
            "{:>7.1}  {} {}–{}  {} ({} min)",
            card.top,
            icons.glyph(&event.icon_key),
            event.start_time,
            event.end_time,
            event.title,
            event.duration_minutes,
        );
        if event.is_completed {
            line.push_str("  [done]");
        }
        if conflicts.contains(&event.id) {
            line.push_str("  [conflict]");
        }
        let _ = write!(line, "  #{}", event.id);
        rows.push((card.top, 3, line));
    }
    rows.push((frame.markers.day_end, 4, format!("{:>7.1}  ☾ day end", frame.markers.day_end)));

    // Stable: equal positions keep marker-before-card order.
    rows.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let mut out = String::new();
    for (_, _, line) in rows {
        out.push_str(&line);
        out.push('\n');
    }
    let _ = writeln!(out, "End of day: {}", frame.countdown);
    out
}

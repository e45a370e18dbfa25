use chrono::Duration;

use crate::table::{Column, MoodTable};

/// Length of the recent-activity window shown by the timeline charts.
pub const WINDOW_DAYS: i64 = 14;

/// Keep rows whose mood timestamp is within `days` of the latest one (inclusive).
///
/// An empty table comes back empty; a table without `mood_recorded_at` comes
/// back unchanged.
pub fn recent_window(table: &MoodTable, days: i64) -> MoodTable {
    if !table.has_column(Column::MoodRecordedAt) {
        return table.clone();
    }
    let Some(latest) = table.rows().iter().map(|r| r.mood_recorded_at).max() else {
        return table.clone();
    };

    let cutoff = latest - Duration::days(days);
    let windowed = table.filter_rows(|r| r.mood_recorded_at >= cutoff);
    log::debug!(
        "Window {} .. {}: kept {} of {} rows",
        cutoff,
        latest,
        windowed.len(),
        table.len()
    );
    windowed
}

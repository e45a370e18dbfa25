use std::path::Path;
use std::time::Instant;

use crate::aggregate::annotate_group_stats;
use crate::charts::{self, ChartImage, ChartKind, ChartTheme};
use crate::db::Database;
use crate::page::{self, DashboardImages, CHART_ERROR_MESSAGE, NO_DATA_MESSAGE};
use crate::table::MoodTable;
use crate::window::{recent_window, WINDOW_DAYS};

#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    pub theme: ChartTheme,
    /// Render the four charts concurrently.
    pub parallel: bool,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub enum Dashboard {
    Page(String),
    NoData,
    ChartFailed(ChartKind),
}

impl Dashboard {
    pub fn into_html(self) -> String {
        match self {
            Dashboard::Page(html) => html,
            Dashboard::NoData => NO_DATA_MESSAGE.to_string(),
            Dashboard::ChartFailed(_) => CHART_ERROR_MESSAGE.to_string(),
        }
    }
}

/// The joined table for one user. Any connection or query failure is
/// logged and yields an empty table.
pub fn fetch_table(db_path: &Path, user_id: i64) -> MoodTable {
    let rows = Database::open_read_only(db_path).and_then(|db| db.fetch_joined_rows(user_id));
    match rows {
        Ok(rows) => {
            log::debug!("Fetched {} rows for user {user_id}", rows.len());
            MoodTable::from_rows(rows)
        }
        Err(e) => {
            log::warn!("Failed to fetch data from {}: {e}", db_path.display());
            MoodTable::default()
        }
    }
}

pub fn build_dashboard(table: MoodTable, options: &DashboardOptions) -> Dashboard {
    if table.is_empty() {
        return Dashboard::NoData;
    }

    let full = annotate_group_stats(table);
    let recent = recent_window(&full, WINDOW_DAYS);
    let theme = &options.theme;

    let start = Instant::now();
    let [mood_arousal, audio_features, bubble, boxplots] = if options.parallel {
        let ((a, b), (c, d)) = rayon::join(
            || {
                rayon::join(
                    || charts::mood_arousal_timeline(&recent, theme),
                    || charts::audio_feature_timeline(&recent, theme),
                )
            },
            || {
                rayon::join(
                    || charts::bubble_plot(&full, theme),
                    || charts::feature_boxplots(&full, theme),
                )
            },
        );
        [a, b, c, d]
    } else {
        [
            charts::mood_arousal_timeline(&recent, theme),
            charts::audio_feature_timeline(&recent, theme),
            charts::bubble_plot(&full, theme),
            charts::feature_boxplots(&full, theme),
        ]
    };
    log::debug!(
        "Rendered charts in {:.1}ms (parallel: {})",
        start.elapsed().as_secs_f64() * 1000.0,
        options.parallel
    );

    match collect_images([mood_arousal, audio_features, bubble, boxplots]) {
        Ok(images) => Dashboard::Page(page::compose_page(&images)),
        Err(kind) => Dashboard::ChartFailed(kind),
    }
}

/// All four images, or the first missing chart in page order.
fn collect_images(images: [Option<ChartImage>; 4]) -> Result<DashboardImages, ChartKind> {
    let [a, b, c, d] = images;
    let take = |image: Option<ChartImage>, kind: ChartKind| image.ok_or(kind);
    Ok(DashboardImages {
        mood_arousal: take(a, ChartKind::MoodArousalTimeline)?,
        audio_features: take(b, ChartKind::AudioFeatureTimeline)?,
        bubble: take(c, ChartKind::BubblePlot)?,
        boxplots: take(d, ChartKind::FeatureBoxplots)?,
    })
}

pub fn render_for_user(db_path: &Path, user_id: i64, options: &DashboardOptions) -> Dashboard {
    let start = Instant::now();
    let dashboard = build_dashboard(fetch_table(db_path, user_id), options);
    match &dashboard {
        Dashboard::Page(html) => log::info!(
            "Dashboard for user {user_id}: {} bytes in {:.1}ms",
            html.len(),
            start.elapsed().as_secs_f64() * 1000.0
        ),
        Dashboard::NoData => log::info!("Dashboard for user {user_id}: no data"),
        Dashboard::ChartFailed(kind) => log::warn!("Dashboard for user {user_id}: {kind} unavailable"),
    }
    dashboard
}

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use plotters::prelude::*;

use super::raster::{dashes, padded_range, render_png, Area, TextMode};
use super::theme::ChartTheme;
use super::{settle, ChartError, ChartImage, ChartKind};
use crate::table::{AudioFeature, Column, MoodTable};

const SECONDS_PER_DAY: f64 = 86_400.0;
const DASHES_PER_MARKER: usize = 40;

/// One plotted line.
#[derive(Debug, Clone, Copy)]
struct Series {
    label: &'static str,
    column: Column,
    color: RGBColor,
}

struct TimelineLayout {
    title: &'static str,
    y_desc: &'static str,
    fallback_y: (f64, f64),
    series: Vec<Series>,
}

/// Mood and arousal scores over time.
pub fn mood_arousal_timeline(table: &MoodTable, theme: &ChartTheme) -> Option<ChartImage> {
    let layout = TimelineLayout {
        title: "Mood Score and Arousal Over time",
        y_desc: "Score (0-10)",
        fallback_y: (0.0, 10.0),
        series: vec![
            Series {
                label: "Mood Score",
                column: Column::MoodScore,
                color: theme.mood_color,
            },
            Series {
                label: "Arousal",
                column: Column::ArousalScore,
                color: theme.arousal_color,
            },
        ],
    };
    timeline(ChartKind::MoodArousalTimeline, table, theme, &layout)
}

/// Per-mood median energy, danceability and valence over time.
pub fn audio_feature_timeline(table: &MoodTable, theme: &ChartTheme) -> Option<ChartImage> {
    let layout = TimelineLayout {
        title: "Audio Features Over Time",
        y_desc: "Score (0-1)",
        fallback_y: (0.0, 1.0),
        series: vec![
            Series {
                label: "Energy",
                column: Column::Median(AudioFeature::Energy),
                color: theme.energy_color,
            },
            Series {
                label: "Danceability",
                column: Column::Median(AudioFeature::Danceability),
                color: theme.danceability_color,
            },
            Series {
                label: "Valence",
                column: Column::Median(AudioFeature::Valence),
                color: theme.valence_color,
            },
        ],
    };
    timeline(ChartKind::AudioFeatureTimeline, table, theme, &layout)
}

fn timeline(
    kind: ChartKind,
    table: &MoodTable,
    theme: &ChartTheme,
    layout: &TimelineLayout,
) -> Option<ChartImage> {
    if table.is_empty() {
        return None;
    }
    let mut required = vec![Column::MoodRecordedAt];
    required.extend(layout.series.iter().map(|s| s.column));
    if let Some(missing) = table.first_missing(&required) {
        log::debug!("Skipping {kind}: no {missing} column");
        return None;
    }

    let lines: Vec<(Series, Vec<(f64, f64)>)> = layout
        .series
        .iter()
        .map(|s| (*s, collapse_points(table, s.column)))
        .collect();
    let markers: Vec<f64> = day_markers(table)
        .into_iter()
        .filter_map(|d| d.and_hms_opt(0, 0, 0))
        .map(day_value)
        .collect();

    let x_range = padded_range(
        table
            .rows()
            .iter()
            .map(|r| day_value(r.mood_recorded_at))
            .chain(markers.iter().copied()),
        0.03,
        0.5,
        (0.0, 1.0),
    );
    let y_range = padded_range(
        lines.iter().flat_map(|(_, pts)| pts.iter().map(|p| p.1)),
        0.05,
        0.05 * (layout.fallback_y.1 - layout.fallback_y.0),
        layout.fallback_y,
    );

    let result = render_png(theme.timeline_size, theme, |area, mode| {
        draw(area, mode, theme, layout, &lines, &markers, x_range, y_range)
    });
    settle(kind, result)
}

#[allow(clippy::too_many_arguments)]
fn draw(
    area: &Area<'_>,
    mode: TextMode,
    theme: &ChartTheme,
    layout: &TimelineLayout,
    lines: &[(Series, Vec<(f64, f64)>)],
    markers: &[f64],
    (x0, x1): (f64, f64),
    (y0, y1): (f64, f64),
) -> Result<(), ChartError> {
    let mut builder = ChartBuilder::on(area);
    builder.margin(20);
    if mode.labeled() {
        builder
            .caption(layout.title, theme.title_font(22.0))
            .x_label_area_size(theme.label_area(50))
            .y_label_area_size(theme.label_area(60));
    } else {
        builder.x_label_area_size(10).y_label_area_size(10);
    }
    let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1)?;

    let day_label = |v: &f64| format_day(*v);
    let mut mesh = chart.configure_mesh();
    mesh.light_line_style(theme.grid.mix(0.5))
        .bold_line_style(theme.grid)
        .axis_style(theme.axis);
    if mode.labeled() {
        mesh.x_desc("Date")
            .y_desc(layout.y_desc)
            .x_labels(8)
            .x_label_formatter(&day_label)
            .label_style(theme.font(13.0))
            .axis_desc_style(theme.font(15.0));
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw()?;

    for &x in markers {
        chart.draw_series(
            dashes(x, (y0, y1), DASHES_PER_MARKER)
                .into_iter()
                .map(|seg| PathElement::new(seg.to_vec(), theme.day_marker.stroke_width(1))),
        )?;
    }

    for (series, points) in lines {
        let color = series.color;
        chart
            .draw_series(LineSeries::new(
                points.iter().copied(),
                color.stroke_width(theme.line_width),
            ))?
            .label(series.label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(3)));
        chart.draw_series(
            points
                .iter()
                .map(|&p| Circle::new(p, theme.marker_radius, color.filled())),
        )?;
    }

    if mode.labeled() {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.85))
            .border_style(theme.axis)
            .label_font(theme.font(13.0))
            .draw()?;
    }
    Ok(())
}

/// Points of one column, one per distinct timestamp (mean of non-null values), ascending.
fn collapse_points(table: &MoodTable, column: Column) -> Vec<(f64, f64)> {
    let mut buckets: BTreeMap<NaiveDateTime, (f64, usize)> = BTreeMap::new();
    for row in table.rows() {
        let Some(value) = row.numeric(column).filter(|v| v.is_finite()) else {
            continue;
        };
        let slot = buckets.entry(row.mood_recorded_at).or_insert((0.0, 0));
        slot.0 += value;
        slot.1 += 1;
    }
    buckets
        .into_iter()
        .map(|(t, (sum, n))| (day_value(t), sum / n as f64))
        .collect()
}

/// Distinct calendar days with a mood entry, ascending.
fn day_markers(table: &MoodTable) -> Vec<NaiveDate> {
    table
        .rows()
        .iter()
        .map(|r| r.mood_recorded_at.date())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn day_value(t: NaiveDateTime) -> f64 {
    t.and_utc().timestamp() as f64 / SECONDS_PER_DAY
}

fn format_day(v: f64) -> String {
    DateTime::from_timestamp((v * SECONDS_PER_DAY).round() as i64, 0)
        .map(|d| d.format("%m-%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::annotate_group_stats;
    use crate::charts::test_support::assert_png;
    use crate::table::test_rows::*;

    fn sample() -> MoodTable {
        annotate_group_stats(MoodTable::from_rows(vec![
            with_track(1, 6.0, ts(1, 9), "a", Some(0.2), Some(0.4), Some(0.6), Some(100.0)),
            with_track(1, 6.0, ts(1, 9), "b", Some(0.4), Some(0.6), Some(0.8), Some(120.0)),
            mood_only(2, 3.0, 7.0, ts(1, 18)),
            with_track(3, 8.0, ts(3, 8), "c", Some(0.9), None, Some(0.5), Some(90.0)),
        ]))
    }

    #[test]
    fn test_collapse_points_dedupes_by_timestamp() {
        let table = sample();
        let mood = collapse_points(&table, Column::MoodScore);
        assert_eq!(mood.len(), 3);
        assert_eq!(mood[0].1, 6.0);
        assert_eq!(mood[1].1, 3.0);
        assert!(mood[0].0 < mood[1].0 && mood[1].0 < mood[2].0);

        let valence = collapse_points(&table, Column::Median(AudioFeature::Valence));
        // Mood 2 has no tracks, so no valence point.
        assert_eq!(valence.len(), 2);
        assert!((valence[0].1 - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_day_markers_distinct_days() {
        let days = day_markers(&sample());
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 3).unwrap()
            ]
        );
    }

    #[test]
    fn test_format_day() {
        assert_eq!(format_day(day_value(ts(3, 0))), "03-03");
    }

    #[test]
    fn test_timelines_render() {
        let theme = ChartTheme::default();
        let table = sample();
        assert_png(&mood_arousal_timeline(&table, &theme).unwrap());
        assert_png(&audio_feature_timeline(&table, &theme).unwrap());
    }

    #[test]
    fn test_audio_timeline_without_values_still_renders() {
        let table = annotate_group_stats(MoodTable::from_rows(vec![mood_only(1, 5.0, 5.0, ts(2, 9))]));
        assert!(audio_feature_timeline(&table, &ChartTheme::default()).is_some());
    }

    #[test]
    fn test_missing_columns_or_empty() {
        let theme = ChartTheme::default();
        assert!(mood_arousal_timeline(&MoodTable::default(), &theme).is_none());
        assert!(audio_feature_timeline(&MoodTable::default(), &theme).is_none());
        // Not aggregated: median columns absent.
        let raw = MoodTable::from_rows(vec![mood_only(1, 5.0, 5.0, ts(2, 9))]);
        assert!(audio_feature_timeline(&raw, &theme).is_none());
        assert!(mood_arousal_timeline(&raw, &theme).is_some());
    }
}

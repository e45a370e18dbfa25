use std::cmp::Ordering;

use plotters::prelude::*;

use super::palette::{MUTED_BLUE, MUTED_GREEN, MUTED_RED};
use super::raster::{padded_range, render_png, Area, TextMode};
use super::theme::ChartTheme;
use super::{settle, ChartError, ChartImage, ChartKind};
use crate::table::{AudioFeature, Column, MoodTable};

/// Cell order, row-major.
const GRID: [AudioFeature; 4] = [
    AudioFeature::Valence,
    AudioFeature::Energy,
    AudioFeature::Danceability,
    AudioFeature::Tempo,
];
const BOX_COLORS: [RGBColor; 3] = [MUTED_BLUE, MUTED_GREEN, MUTED_RED];
const BOX_HALF_WIDTH: f64 = 0.3;
const WHISKER_RANGE: f64 = 1.5;

/// Five-number summary plus outliers for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_low: f64,
    pub whisker_high: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// `None` when there are no finite values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let reach = WHISKER_RANGE * (q3 - q1);
        let (lo_fence, hi_fence) = (q1 - reach, q3 + reach);

        let whisker_low = sorted.iter().copied().find(|v| *v >= lo_fence).unwrap_or(q1);
        let whisker_high = sorted.iter().rev().copied().find(|v| *v <= hi_fence).unwrap_or(q3);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < lo_fence || *v > hi_fence)
            .collect();

        Some(Self {
            q1,
            median,
            q3,
            whisker_low,
            whisker_high,
            outliers,
        })
    }
}

/// Linear-interpolation quantile of sorted, non-empty data.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// Non-null values of `feature` grouped by distinct mood score, ascending.
/// Moods with no values for the feature are left out.
pub fn mood_groups(table: &MoodTable, feature: AudioFeature) -> Vec<(f64, Vec<f64>)> {
    let mut pairs: Vec<(f64, f64)> = table
        .rows()
        .iter()
        .filter_map(|r| r.feature(feature).filter(|v| v.is_finite()).map(|v| (r.mood_score, v)))
        .collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut groups: Vec<(f64, Vec<f64>)> = Vec::new();
    for (mood, value) in pairs {
        match groups.last_mut() {
            Some((last, values)) if last.total_cmp(&mood) == Ordering::Equal => values.push(value),
            _ => groups.push((mood, vec![value])),
        }
    }
    groups
}

struct Cell {
    feature: AudioFeature,
    groups: Vec<(f64, BoxStats)>,
}

pub fn feature_boxplots(table: &MoodTable, theme: &ChartTheme) -> Option<ChartImage> {
    if table.is_empty() {
        return None;
    }

    let cells: Vec<Option<Cell>> = GRID
        .iter()
        .map(|&feature| {
            if !table.has_columns(&[Column::MoodScore, feature.column()]) {
                return None;
            }
            let groups: Vec<(f64, BoxStats)> = mood_groups(table, feature)
                .into_iter()
                .filter_map(|(mood, values)| BoxStats::from_values(&values).map(|s| (mood, s)))
                .collect();
            if groups.is_empty() {
                log::debug!("Boxplot cell for {} left blank", feature.name());
                None
            } else {
                Some(Cell { feature, groups })
            }
        })
        .collect();

    let result = render_png(theme.boxplot_size, theme, |area, mode| {
        for (cell_area, cell) in area.split_evenly((2, 2)).iter().zip(&cells) {
            if let Some(cell) = cell {
                draw_cell(cell_area, mode, theme, cell)?;
            }
        }
        Ok(())
    });
    settle(ChartKind::FeatureBoxplots, result)
}

fn draw_cell(area: &Area<'_>, mode: TextMode, theme: &ChartTheme, cell: &Cell) -> Result<(), ChartError> {
    let n = cell.groups.len();
    let y_range = padded_range(
        cell.groups.iter().flat_map(|(_, s)| {
            [s.whisker_low, s.whisker_high]
                .into_iter()
                .chain(s.outliers.iter().copied())
        }),
        0.08,
        0.05,
        (0.0, 1.0),
    );

    let mut builder = ChartBuilder::on(area);
    builder.margin(15);
    if mode.labeled() {
        builder
            .caption(
                format!("Boxplot: Mood Score vs {}", cell.feature.label()),
                theme.title_font(18.0),
            )
            .x_label_area_size(theme.label_area(45))
            .y_label_area_size(theme.label_area(55));
    } else {
        builder.x_label_area_size(10).y_label_area_size(10);
    }
    let mut chart = builder.build_cartesian_2d(-0.5..(n as f64 - 0.5), y_range.0..y_range.1)?;

    let moods: Vec<f64> = cell.groups.iter().map(|(m, _)| *m).collect();
    let tick_label = |v: &f64| category_label(&moods, *v);
    let mut mesh = chart.configure_mesh();
    mesh.disable_x_mesh()
        .light_line_style(theme.grid.mix(0.5))
        .bold_line_style(theme.grid)
        .axis_style(theme.axis);
    if mode.labeled() {
        mesh.x_desc("Mood Score")
            .y_desc(cell.feature.label())
            .x_labels(n.max(1))
            .x_label_formatter(&tick_label)
            .label_style(theme.font(12.0))
            .axis_desc_style(theme.font(14.0));
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw()?;

    for (i, (_, stats)) in cell.groups.iter().enumerate() {
        let x = i as f64;
        let color = BOX_COLORS[i % BOX_COLORS.len()];
        let (left, right) = (x - BOX_HALF_WIDTH, x + BOX_HALF_WIDTH);
        let cap = BOX_HALF_WIDTH / 2.0;
        let edge = theme.axis.stroke_width(1);

        chart.draw_series([
            Rectangle::new([(left, stats.q1), (right, stats.q3)], color.mix(0.8).filled()),
            Rectangle::new([(left, stats.q1), (right, stats.q3)], edge),
        ])?;
        chart.draw_series([
            PathElement::new(vec![(left, stats.median), (right, stats.median)], theme.axis.stroke_width(2)),
            PathElement::new(vec![(x, stats.q3), (x, stats.whisker_high)], edge),
            PathElement::new(vec![(x, stats.q1), (x, stats.whisker_low)], edge),
            PathElement::new(vec![(x - cap, stats.whisker_high), (x + cap, stats.whisker_high)], edge),
            PathElement::new(vec![(x - cap, stats.whisker_low), (x + cap, stats.whisker_low)], edge),
        ])?;
        chart.draw_series(
            stats
                .outliers
                .iter()
                .map(|&y| Circle::new((x, y), 3, theme.axis.stroke_width(1))),
        )?;
    }
    Ok(())
}

/// Tick label for category index `v`; blank between categories.
fn category_label(moods: &[f64], v: f64) -> String {
    let idx = v.round();
    if (v - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    moods
        .get(idx as usize)
        .map(|m| format!("{m}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::test_support::assert_png;
    use crate::table::test_rows::*;

    #[test]
    fn test_box_stats_linear_quartiles() {
        let stats = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(stats.q1, 1.75);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.q3, 3.25);
        assert_eq!(stats.whisker_low, 1.0);
        assert_eq!(stats.whisker_high, 4.0);
        assert!(stats.outliers.is_empty());
    }

    #[test]
    fn test_box_stats_outliers() {
        let stats = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        // q1 = 2.25, q3 = 4.75, fence at 8.5
        assert_eq!(stats.whisker_high, 5.0);
        assert_eq!(stats.outliers, vec![100.0]);
    }

    #[test]
    fn test_box_stats_single_and_empty() {
        let stats = BoxStats::from_values(&[0.4]).unwrap();
        assert_eq!((stats.q1, stats.median, stats.q3), (0.4, 0.4, 0.4));
        assert!(BoxStats::from_values(&[]).is_none());
        assert!(BoxStats::from_values(&[f64::NAN]).is_none());
    }

    #[test]
    fn test_mood_groups() {
        let table = MoodTable::from_rows(vec![
            with_track(1, 7.0, ts(1, 9), "a", Some(0.5), None, None, None),
            with_track(2, 3.0, ts(2, 9), "b", Some(0.1), None, None, None),
            with_track(3, 7.0, ts(3, 9), "c", Some(0.9), None, None, None),
            mood_only(4, 5.0, 5.0, ts(4, 9)),
        ]);
        let groups = mood_groups(&table, AudioFeature::Valence);
        assert_eq!(groups, vec![(3.0, vec![0.1]), (7.0, vec![0.5, 0.9])]);
        assert!(mood_groups(&table, AudioFeature::Tempo).is_empty());
    }

    #[test]
    fn test_category_label() {
        let moods = [3.0, 6.5];
        assert_eq!(category_label(&moods, 0.0), "3");
        assert_eq!(category_label(&moods, 1.0), "6.5");
        assert_eq!(category_label(&moods, 0.5), "");
        assert_eq!(category_label(&moods, 2.0), "");
    }

    #[test]
    fn test_all_blank_cells_still_render() {
        let table = MoodTable::from_rows(vec![mood_only(1, 5.0, 5.0, ts(1, 9))]);
        assert_png(&feature_boxplots(&table, &ChartTheme::default()).unwrap());
        assert!(feature_boxplots(&MoodTable::default(), &ChartTheme::default()).is_none());
    }

    #[test]
    fn test_renders_with_missing_column() {
        let table = MoodTable::with_columns(
            [Column::MoodScore, Column::Valence],
            vec![
                with_track(1, 7.0, ts(1, 9), "a", Some(0.5), Some(0.3), None, None),
                with_track(2, 4.0, ts(2, 9), "b", Some(0.2), Some(0.6), None, None),
            ],
        );
        assert_png(&feature_boxplots(&table, &ChartTheme::default()).unwrap());
    }
}

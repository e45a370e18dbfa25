use plotters::prelude::*;

use super::palette::{normalize, viridis};
use super::raster::{padded_range, render_png, Area, TextMode};
use super::theme::ChartTheme;
use super::{settle, ChartError, ChartImage, ChartKind};
use crate::table::{AudioFeature, Column, MoodTable};

/// Marker area per unit of valence, in points squared.
pub const BUBBLE_SCALE: f64 = 1000.0;
const BUBBLE_ALPHA: f64 = 0.6;
const COLORBAR_WIDTH: u32 = 130;
const COLORBAR_STEPS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bubble {
    mood: f64,
    arousal: f64,
    valence: f64,
    energy: f64,
}

/// Pixel radius of a marker whose area is `size` points squared. Zero or
/// negative sizes give 0, which draws nothing.
pub fn bubble_radius(size: f64, dpi: f64) -> u32 {
    let points = size.max(0.0).sqrt() / 2.0;
    (points * dpi / 72.0).round() as u32
}

pub fn bubble_plot(table: &MoodTable, theme: &ChartTheme) -> Option<ChartImage> {
    let required = [
        Column::MoodScore,
        Column::ArousalScore,
        Column::Median(AudioFeature::Valence),
        Column::Median(AudioFeature::Energy),
    ];
    if table.is_empty() {
        return None;
    }
    if let Some(missing) = table.first_missing(&required) {
        log::debug!("Skipping bubble plot: no {missing} column");
        return None;
    }

    let bubbles = collect_bubbles(table, theme.dpi);
    log::debug!("Bubble plot: {} of {} rows plottable", bubbles.len(), table.len());

    let x_range = padded_range(bubbles.iter().map(|b| b.mood), 0.08, 0.5, (0.0, 10.0));
    let y_range = padded_range(bubbles.iter().map(|b| b.arousal), 0.08, 0.5, (0.0, 10.0));
    let energy_range = bubbles
        .iter()
        .map(|b| b.energy)
        .fold(None, |acc: Option<(f64, f64)>, e| match acc {
            None => Some((e, e)),
            Some((lo, hi)) => Some((lo.min(e), hi.max(e))),
        })
        .unwrap_or((0.0, 1.0));

    let result = render_png(theme.bubble_size, theme, |area, mode| {
        draw(area, mode, theme, &bubbles, x_range, y_range, energy_range)
    });
    settle(ChartKind::BubblePlot, result)
}

/// Rows with a null median valence or energy are skipped, as are rows whose
/// marker would have zero radius (median valence of 0).
fn collect_bubbles(table: &MoodTable, dpi: f64) -> Vec<Bubble> {
    table
        .rows()
        .iter()
        .filter_map(|row| {
            let valence = row.numeric(Column::Median(AudioFeature::Valence))?;
            let energy = row.numeric(Column::Median(AudioFeature::Energy))?;
            Some(Bubble {
                mood: row.mood_score,
                arousal: row.arousal_score,
                valence,
                energy,
            })
        })
        .filter(|b| bubble_radius(b.valence * BUBBLE_SCALE, dpi) > 0)
        .collect()
}

fn draw(
    area: &Area<'_>,
    mode: TextMode,
    theme: &ChartTheme,
    bubbles: &[Bubble],
    (x0, x1): (f64, f64),
    (y0, y1): (f64, f64),
    (e_min, e_max): (f64, f64),
) -> Result<(), ChartError> {
    let (width, _) = area.dim_in_pixel();
    let (plot_area, bar_area) = area.split_horizontally(width.saturating_sub(COLORBAR_WIDTH));

    let mut builder = ChartBuilder::on(&plot_area);
    builder.margin(20);
    if mode.labeled() {
        builder
            .caption("Bubble Plot: Mood vs Arousal", theme.title_font(22.0))
            .x_label_area_size(theme.label_area(50))
            .y_label_area_size(theme.label_area(60));
    } else {
        builder.x_label_area_size(10).y_label_area_size(10);
    }
    let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1)?;

    let mut mesh = chart.configure_mesh();
    mesh.light_line_style(theme.grid.mix(0.5))
        .bold_line_style(theme.grid)
        .axis_style(theme.axis);
    if mode.labeled() {
        mesh.x_desc("Mood (Sad to Happy)")
            .y_desc("Arousal (Calm to Excited)")
            .label_style(theme.font(13.0))
            .axis_desc_style(theme.font(15.0));
    } else {
        mesh.x_labels(0).y_labels(0);
    }
    mesh.draw()?;

    for b in bubbles {
        let radius = bubble_radius(b.valence * BUBBLE_SCALE, theme.dpi);
        let color = viridis(normalize(b.energy, e_min, e_max));
        let center = (b.mood, b.arousal);
        chart.draw_series(std::iter::once(Circle::new(
            center,
            radius,
            color.mix(BUBBLE_ALPHA).filled(),
        )))?;
        chart.draw_series(std::iter::once(Circle::new(
            center,
            radius,
            WHITE.stroke_width(1),
        )))?;
    }

    draw_colorbar(&bar_area, mode, theme, (e_min, e_max))
}

fn draw_colorbar(
    area: &Area<'_>,
    mode: TextMode,
    theme: &ChartTheme,
    (lo, hi): (f64, f64),
) -> Result<(), ChartError> {
    let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };

    let mut builder = ChartBuilder::on(area);
    builder
        .margin_top(if mode.labeled() { theme.label_area(50) } else { 20 })
        .margin_bottom(theme.label_area(50))
        .margin_left(10)
        .margin_right(10);
    if mode.labeled() {
        builder.y_label_area_size(theme.label_area(60));
    }
    let mut chart = builder.build_cartesian_2d(0.0..1.0, lo..hi)?;

    let tick_label = |v: &f64| format!("{v:.2}");
    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh().x_labels(0).axis_style(theme.axis);
    if mode.labeled() {
        mesh.y_desc("Energy")
            .y_labels(6)
            .y_label_formatter(&tick_label)
            .label_style(theme.font(12.0))
            .axis_desc_style(theme.font(14.0));
    } else {
        mesh.y_labels(0);
    }
    mesh.draw()?;

    let step = (hi - lo) / COLORBAR_STEPS as f64;
    chart.draw_series((0..COLORBAR_STEPS).map(|i| {
        let start = lo + step * i as f64;
        let t = (i as f64 + 0.5) / COLORBAR_STEPS as f64;
        Rectangle::new([(0.0, start), (1.0, start + step)], viridis(t).filled())
    }))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::annotate_group_stats;
    use crate::charts::test_support::assert_png;
    use crate::table::test_rows::*;

    #[test]
    fn test_bubble_radius() {
        // 1000 pt^2 at 72 dpi: sqrt(1000) / 2 ~= 15.8
        assert_eq!(bubble_radius(1000.0, 72.0), 16);
        assert_eq!(bubble_radius(0.0, 100.0), 0);
        assert_eq!(bubble_radius(-5.0, 100.0), 0);
        assert!(bubble_radius(500.0, 100.0) < bubble_radius(1000.0, 100.0));
    }

    #[test]
    fn test_rows_without_aggregates_skipped() {
        let table = annotate_group_stats(MoodTable::from_rows(vec![
            with_track(1, 7.0, ts(1, 9), "a", Some(0.8), Some(0.5), None, None),
            mood_only(2, 2.0, 3.0, ts(2, 9)),
            with_track(3, 4.0, ts(3, 9), "b", Some(0.3), None, None, None),
        ]));
        let bubbles = collect_bubbles(&table, 100.0);
        assert_eq!(bubbles.len(), 1);
        assert_eq!(bubbles[0].mood, 7.0);
        assert_eq!(bubbles[0].valence, 0.8);
    }

    #[test]
    fn test_zero_valence_draws_no_bubble() {
        let table = annotate_group_stats(MoodTable::from_rows(vec![
            with_track(1, 7.0, ts(1, 9), "a", Some(0.0), Some(0.5), None, None),
            with_track(2, 3.0, ts(2, 9), "b", Some(0.4), Some(0.9), None, None),
        ]));
        let bubbles = collect_bubbles(&table, 100.0);
        assert_eq!(bubbles.len(), 1);
        assert_eq!(bubbles[0].mood, 3.0);
        assert_png(&bubble_plot(&table, &ChartTheme::default()).unwrap());
    }

    #[test]
    fn test_renders_even_with_no_plottable_rows() {
        let table = annotate_group_stats(MoodTable::from_rows(vec![mood_only(1, 5.0, 5.0, ts(1, 9))]));
        assert_png(&bubble_plot(&table, &ChartTheme::default()).unwrap());
    }

    #[test]
    fn test_requires_aggregate_columns() {
        let theme = ChartTheme::default();
        let raw = MoodTable::from_rows(vec![mood_only(1, 5.0, 5.0, ts(1, 9))]);
        assert!(bubble_plot(&raw, &theme).is_none());
        assert!(bubble_plot(&MoodTable::default(), &theme).is_none());
    }

    #[test]
    fn test_renders_bubbles() {
        let table = annotate_group_stats(MoodTable::from_rows(vec![
            with_track(1, 7.0, ts(1, 9), "a", Some(0.8), Some(0.5), None, None),
            with_track(2, 3.0, ts(2, 9), "b", Some(0.2), Some(0.9), None, None),
        ]));
        assert_png(&bubble_plot(&table, &ChartTheme::default()).unwrap());
    }
}

use plotters::style::{FontDesc, FontFamily, FontStyle, RGBColor, WHITE};

use super::palette;

/// Everything a chart builder needs to know about appearance.
///
/// Passed explicitly into every builder; there is no process-wide plotting
/// state.
#[derive(Debug, Clone)]
pub struct ChartTheme {
    pub timeline_size: (u32, u32),
    pub bubble_size: (u32, u32),
    pub boxplot_size: (u32, u32),
    /// Pixels per inch, used to turn point-based marker areas into pixels.
    pub dpi: f64,
    pub font_scale: f64,
    pub background: RGBColor,
    pub grid: RGBColor,
    pub axis: RGBColor,
    pub day_marker: RGBColor,
    pub line_width: u32,
    pub marker_radius: u32,
    pub mood_color: RGBColor,
    pub arousal_color: RGBColor,
    pub energy_color: RGBColor,
    pub danceability_color: RGBColor,
    pub valence_color: RGBColor,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            timeline_size: (1200, 700),
            bubble_size: (800, 600),
            boxplot_size: (1400, 1000),
            dpi: 100.0,
            font_scale: 1.2,
            background: WHITE,
            grid: palette::GRID_GRAY,
            axis: palette::AXIS_GRAY,
            day_marker: palette::MARKER_GRAY,
            line_width: 3,
            marker_radius: 4,
            mood_color: palette::MUTED_BLUE,
            arousal_color: palette::MUTED_GREEN,
            energy_color: palette::MUTED_GREEN,
            danceability_color: palette::MUTED_RED,
            valence_color: palette::MUTED_BLUE,
        }
    }
}

impl ChartTheme {
    pub fn with_font_scale(mut self, font_scale: f64) -> Self {
        if font_scale.is_finite() && font_scale > 0.0 {
            self.font_scale = font_scale;
        }
        self
    }

    /// Body font at `base` points before scaling.
    pub fn font(&self, base: f64) -> FontDesc<'static> {
        FontDesc::new(FontFamily::SansSerif, base * self.font_scale, FontStyle::Normal)
    }

    pub fn title_font(&self, base: f64) -> FontDesc<'static> {
        FontDesc::new(FontFamily::SansSerif, base * self.font_scale, FontStyle::Bold)
    }

    /// Label area size that leaves room for ticks at the current font scale.
    pub fn label_area(&self, base: u32) -> u32 {
        (base as f64 * self.font_scale).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_scale_applies() {
        let theme = ChartTheme::default().with_font_scale(2.0);
        assert_eq!(theme.font(10.0).get_size(), 20.0);
        assert_eq!(theme.label_area(40), 80);
    }

    #[test]
    fn test_invalid_font_scale_ignored() {
        let theme = ChartTheme::default().with_font_scale(-1.0);
        assert_eq!(theme.font_scale, 1.2);
        let theme = theme.with_font_scale(f64::NAN);
        assert_eq!(theme.font_scale, 1.2);
    }
}

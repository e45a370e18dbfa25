use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;

use super::theme::ChartTheme;
use super::{fonts, ChartError, ChartImage};

pub type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Whether a draw pass may render text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMode {
    Labeled,
    Bare,
}

impl TextMode {
    pub fn labeled(self) -> bool {
        self == TextMode::Labeled
    }
}

/// Draw into an in-memory RGB canvas and encode it as PNG.
///
/// A labeled pass that fails (usually a missing font) is retried once
/// without text.
pub fn render_png<F>(size: (u32, u32), theme: &ChartTheme, draw: F) -> Result<ChartImage, ChartError>
where
    F: Fn(&Area<'_>, TextMode) -> Result<(), ChartError>,
{
    let first = if fonts::available() {
        TextMode::Labeled
    } else {
        TextMode::Bare
    };

    let pixels = match rasterize(size, theme, first, &draw) {
        Ok(pixels) => pixels,
        Err(err) if first.labeled() => {
            log::warn!("Chart text failed ({err}); drawing without labels");
            rasterize(size, theme, TextMode::Bare, &draw)?
        }
        Err(err) => return Err(err),
    };
    encode_png(size, pixels)
}

fn rasterize<F>(
    (width, height): (u32, u32),
    theme: &ChartTheme,
    mode: TextMode,
    draw: &F,
) -> Result<Vec<u8>, ChartError>
where
    F: Fn(&Area<'_>, TextMode) -> Result<(), ChartError>,
{
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let area = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        area.fill(&theme.background)?;
        draw(&area, mode)?;
        area.present()?;
    }
    Ok(buffer)
}

/// Encode a packed RGB buffer as PNG.
pub fn encode_png((width, height): (u32, u32), pixels: Vec<u8>) -> Result<ChartImage, ChartError> {
    let image = RgbImage::from_raw(width, height, pixels).ok_or(ChartError::BufferSize)?;
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image).write_to(&mut cursor, ImageFormat::Png)?;
    Ok(ChartImage::from_png(cursor.into_inner()))
}

/// Axis range covering `values`, padded by `frac` of the span.
/// Degenerate spans are widened by `min_pad` on each side; no values gives `fallback`.
pub fn padded_range(
    values: impl IntoIterator<Item = f64>,
    frac: f64,
    min_pad: f64,
    fallback: (f64, f64),
) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return fallback;
    }
    let pad = ((hi - lo) * frac).max(min_pad);
    (lo - pad, hi + pad)
}

/// Dash segments along a vertical line at `x`.
pub fn dashes(x: f64, (y0, y1): (f64, f64), count: usize) -> Vec<[(f64, f64); 2]> {
    if count == 0 || y1 <= y0 {
        return Vec::new();
    }
    let step = (y1 - y0) / (count as f64 * 2.0);
    (0..count)
        .map(|i| {
            let start = y0 + step * 2.0 * i as f64;
            [(x, start), (x, start + step)]
        })
        .collect()
}

//! The four dashboard charts.
//!
//! Every builder has the same shape: `(&MoodTable, &ChartTheme) -> Option<ChartImage>`.
//! `None` means "no image": the table was empty, a required column was
//! missing, or drawing failed (logged). Builders never panic on bad data.

pub mod boxplot;
pub mod bubble;
pub mod fonts;
pub mod palette;
pub mod raster;
pub mod theme;
pub mod timeline;

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

pub use boxplot::feature_boxplots;
pub use bubble::bubble_plot;
pub use theme::ChartTheme;
pub use timeline::{audio_feature_timeline, mood_arousal_timeline};

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Drawing error: {0}")]
    Drawing(String),
    #[error("PNG encoding error: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Pixel buffer does not match canvas size")]
    BufferSize,
}

impl<E> From<DrawingAreaErrorKind<E>> for ChartError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Drawing(err.to_string())
    }
}

/// The dashboard's charts, in page order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    MoodArousalTimeline,
    AudioFeatureTimeline,
    BubblePlot,
    FeatureBoxplots,
}

impl ChartKind {
    pub const ALL: [ChartKind; 4] = [
        ChartKind::MoodArousalTimeline,
        ChartKind::AudioFeatureTimeline,
        ChartKind::BubblePlot,
        ChartKind::FeatureBoxplots,
    ];

    /// Section heading on the dashboard page.
    pub fn heading(self) -> &'static str {
        match self {
            Self::MoodArousalTimeline => "Mood Score Over Time",
            Self::AudioFeatureTimeline => "Audio Features Over Time",
            Self::BubblePlot => "Valence Bubble Plot",
            Self::FeatureBoxplots => "Audio Feature Box Plot",
        }
    }

    pub fn alt_text(self) -> &'static str {
        match self {
            Self::MoodArousalTimeline => "Mood Score Over Time Plot",
            Self::AudioFeatureTimeline => "Audio Features Over Time Plot",
            Self::BubblePlot => "Valence Bubble Plot",
            Self::FeatureBoxplots => "Audio Feature Box Plot",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MoodArousalTimeline => "mood/arousal timeline",
            Self::AudioFeatureTimeline => "audio feature timeline",
            Self::BubblePlot => "bubble plot",
            Self::FeatureBoxplots => "feature boxplots",
        })
    }
}

/// An encoded PNG chart.
#[derive(Clone, PartialEq, Eq)]
pub struct ChartImage {
    png: Vec<u8>,
}

impl ChartImage {
    pub fn from_png(png: Vec<u8>) -> Self {
        Self { png }
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.png)
    }

    /// `data:` URI suitable for an `<img src>`.
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.to_base64())
    }
}

impl fmt::Debug for ChartImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChartImage({} bytes png)", self.png.len())
    }
}

/// Turn a builder result into the "image or nothing" signal, logging failures.
pub(crate) fn settle(kind: ChartKind, result: Result<ChartImage, ChartError>) -> Option<ChartImage> {
    match result {
        Ok(image) => {
            log::debug!("Rendered {kind}: {} bytes", image.png_bytes().len());
            Some(image)
        }
        Err(err) => {
            log::warn!("Failed to render {kind}: {err}");
            None
        }
    }
}

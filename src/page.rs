use crate::charts::{ChartImage, ChartKind};

pub const NO_DATA_MESSAGE: &str = "<h1>No data available for the specified user.</h1>";
pub const CHART_ERROR_MESSAGE: &str = "<h1>Error generating the plot.</h1>";

/// One image per chart. All four must exist before a page can be composed.
#[derive(Debug, Clone)]
pub struct DashboardImages {
    pub mood_arousal: ChartImage,
    pub audio_features: ChartImage,
    pub bubble: ChartImage,
    pub boxplots: ChartImage,
}

impl DashboardImages {
    pub fn get(&self, kind: ChartKind) -> &ChartImage {
        match kind {
            ChartKind::MoodArousalTimeline => &self.mood_arousal,
            ChartKind::AudioFeatureTimeline => &self.audio_features,
            ChartKind::BubblePlot => &self.bubble,
            ChartKind::FeatureBoxplots => &self.boxplots,
        }
    }
}

/// Render the dashboard document.
pub fn compose_page(images: &DashboardImages) -> String {
    let sections: String = ChartKind::ALL
        .iter()
        .map(|&kind| render_section(kind, images.get(kind)))
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Mood Analysis</title>
    <style>{css}</style>
</head>
<body>
    <h1>Mood Analysis</h1>
    <div class="plot-container">
{sections}    </div>
</body>
</html>"#,
        css = inline_css(),
        sections = sections,
    )
}

fn render_section(kind: ChartKind, image: &ChartImage) -> String {
    format!(
        r#"        <div class="plot-box">
            <h2>{title}</h2>
            <img src="{src}" alt="{alt}">
        </div>
"#,
        title = kind.heading(),
        src = image.data_uri(),
        alt = kind.alt_text(),
    )
}

fn inline_css() -> &'static str {
    r#"
body {
    background-color: #121212;
    font-family: 'Arial Rounded MT Bold', Arial, sans-serif;
    color: #FFFFFF;
    margin: 0;
    padding: 0;
}
h1 {
    font-size: 3em;
    margin-top: 20px;
    margin-left: 5%;
    font-weight: bold;
    color: #1DB954;
}
h2 {
    font-size: 2.2em;
    margin-left: 5%;
    margin-bottom: 10px;
    color: #FFFFFF;
    text-align: left;
}
.plot-container {
    display: flex;
    flex-direction: column;
    align-items: flex-start;
    justify-content: center;
    width: 70%;
    margin: 0 auto;
}
.plot-box {
    background-color: #282828;
    border-radius: 10px;
    box-shadow: 0px 8px 16px rgba(0, 0, 0, 0.5);
    margin: 20px 0;
    padding: 20px;
    width: 100%;
}
img {
    width: 100%;
    border-radius: 8px;
    background-color: transparent;
}
"#
}

//! Runtime font registration for chart text.
//!
//! Plotters' `ab_glyph` backend only knows fonts that were registered by
//! name. We look for a TrueType file once (configured paths first, then a
//! few common system locations), leak its bytes so they live for the rest of
//! the process, and register it as the sans-serif family. When nothing is
//! found, charts are drawn without text.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use plotters::style::{register_font, FontStyle};

static FONT_LOADED: OnceLock<bool> = OnceLock::new();

const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Register the first usable font. Only the first call does any work;
/// later calls return the original outcome.
pub fn init(extra_paths: &[PathBuf]) -> bool {
    *FONT_LOADED.get_or_init(|| load_first(extra_paths))
}

/// Whether chart text can be drawn. Probes system locations on first use
/// if [`init`] was never called.
pub fn available() -> bool {
    init(&[])
}

fn load_first(extra_paths: &[PathBuf]) -> bool {
    let candidates = extra_paths
        .iter()
        .map(PathBuf::as_path)
        .chain(SYSTEM_FONT_CANDIDATES.iter().map(Path::new));

    for path in candidates {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(_) => continue,
        };
        let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());

        let registered = register_font("sans-serif", FontStyle::Normal, bytes).is_ok()
            && register_font("sans-serif", FontStyle::Bold, bytes).is_ok();
        if registered {
            log::info!("Chart font: {}", path.display());
            return true;
        }
        log::warn!("Not a usable font: {}", path.display());
    }

    log::warn!("No chart font found; charts will be drawn without text");
    false
}

use plotters::style::RGBColor;

/// Muted palette used for the timeline series.
pub const MUTED_BLUE: RGBColor = RGBColor(0x4C, 0x72, 0xB0);
pub const MUTED_GREEN: RGBColor = RGBColor(0x55, 0xA8, 0x68);
pub const MUTED_RED: RGBColor = RGBColor(0xC4, 0x4E, 0x52);

pub const GRID_GRAY: RGBColor = RGBColor(0xDD, 0xDD, 0xE3);
pub const AXIS_GRAY: RGBColor = RGBColor(0x55, 0x55, 0x5F);
pub const MARKER_GRAY: RGBColor = RGBColor(0x80, 0x80, 0x80);

/// Viridis sampled at nine evenly spaced stops.
const VIRIDIS: [(u8, u8, u8); 9] = [
    (68, 1, 84),
    (71, 44, 122),
    (59, 81, 139),
    (44, 113, 142),
    (33, 144, 141),
    (39, 173, 129),
    (92, 200, 99),
    (170, 220, 50),
    (253, 231, 37),
];

/// Viridis color at `t` in [0, 1]; out-of-range and NaN inputs clamp.
pub fn viridis(t: f64) -> RGBColor {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (VIRIDIS.len() - 1) as f64;
    let lo = scaled.floor() as usize;
    let hi = (lo + 1).min(VIRIDIS.len() - 1);
    let frac = scaled - lo as f64;

    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (r0, g0, b0) = VIRIDIS[lo];
    let (r1, g1, b1) = VIRIDIS[hi];
    RGBColor(lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Position of `value` inside `[min, max]`, 0.5 when the range is degenerate.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span.abs() < f64::EPSILON {
        0.5
    } else {
        (value - min) / span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viridis_endpoints() {
        assert_eq!(viridis(0.0), RGBColor(68, 1, 84));
        assert_eq!(viridis(1.0), RGBColor(253, 231, 37));
        assert_eq!(viridis(0.5), RGBColor(33, 144, 141));
    }

    #[test]
    fn test_viridis_clamps() {
        assert_eq!(viridis(-3.0), viridis(0.0));
        assert_eq!(viridis(7.0), viridis(1.0));
        assert_eq!(viridis(f64::NAN), viridis(0.0));
    }

    #[test]
    fn test_normalize() {
        assert!((normalize(0.25, 0.0, 1.0) - 0.25).abs() < 1e-12);
        assert_eq!(normalize(3.0, 3.0, 3.0), 0.5);
    }
}

use once_cell::sync::Lazy;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::register_font;
use std::path::Path;

pub(crate) type DrawResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Family every chart's text is drawn in.
pub(crate) const FONT: &str = "sans-serif";
const FONT_BYTES: &[u8] = include_bytes!("../../../assets/fonts/DejaVuSans.ttf");

static FONT_REGISTRATION: Lazy<Result<(), String>> = Lazy::new(|| {
    register_font(FONT, FontStyle::Normal, FONT_BYTES)
        .map_err(|_| "bundled chart font could not be parsed".to_string())?;
    tracing::debug!("Registered bundled chart font as {}", FONT);
    Ok(())
});

/// Makes the bundled font available to plotters. Safe to call repeatedly.
pub fn register_fonts() -> Result<(), String> {
    FONT_REGISTRATION.clone()
}

pub(crate) const HISTOGRAM_FILL: RGBColor = RGBColor(46, 139, 87);
pub(crate) const BOX_FILL: RGBColor = RGBColor(135, 176, 222);
pub(crate) const MISSING_CELL: RGBColor = RGBColor(160, 160, 160);

const MARGIN: u32 = 20;

pub(crate) fn canvas(path: &Path, size: (u32, u32)) -> DrawResult<DrawingArea<BitMapBackend<'_>, Shift>> {
    register_fonts()?;
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    Ok(root)
}

/// Builder with margins, a caption and room for axis labels.
pub(crate) fn chart_builder<'a, 'b, DB: DrawingBackend>(
    root: &'a DrawingArea<DB, Shift>,
    title: &str,
) -> ChartBuilder<'a, 'b, DB> {
    let mut builder = ChartBuilder::on(root);
    builder
        .margin(MARGIN)
        .caption(title, (FONT, 24).into_font())
        .x_label_area_size(60)
        .y_label_area_size(60);
    builder
}

pub(crate) fn label_style(size: u32) -> TextStyle<'static> {
    (FONT, size).into_font().color(&BLACK)
}

/// Blue-white-red diverging scale for values in [-1, 1].
pub(crate) fn diverging(value: f64) -> RGBColor {
    const COLD: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const NEUTRAL: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let t = value.clamp(-1.0, 1.0);
    let (from, to, f) = if t < 0.0 {
        (NEUTRAL, COLD, -t)
    } else {
        (NEUTRAL, WARM, t)
    };
    RGBColor(
        lerp(from.0, to.0, f),
        lerp(from.1, to.1, f),
        lerp(from.2, to.2, f),
    )
}

/// Viridis stops sampled across `count` bars.
pub(crate) fn sequential(index: usize, count: usize) -> RGBColor {
    const STOPS: [(f64, f64, f64); 5] = [
        (68.0, 1.0, 84.0),
        (59.0, 82.0, 139.0),
        (33.0, 145.0, 140.0),
        (94.0, 201.0, 98.0),
        (253.0, 231.0, 37.0),
    ];

    let t = if count <= 1 {
        0.0
    } else {
        index as f64 / (count - 1) as f64
    };
    let scaled = t * (STOPS.len() - 1) as f64;
    let lo = (scaled.floor() as usize).min(STOPS.len() - 2);
    let f = scaled - lo as f64;
    let (a, b) = (STOPS[lo], STOPS[lo + 1]);
    RGBColor(lerp(a.0, b.0, f), lerp(a.1, b.1, f), lerp(a.2, b.2, f))
}

fn lerp(from: f64, to: f64, f: f64) -> u8 {
    (from + (to - from) * f).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diverging_scale_hits_its_endpoints() {
        assert_eq!(diverging(-1.0), RGBColor(59, 76, 192));
        assert_eq!(diverging(0.0), RGBColor(221, 221, 221));
        assert_eq!(diverging(1.0), RGBColor(180, 4, 38));
    }

    #[test]
    fn sequential_scale_spans_viridis() {
        assert_eq!(sequential(0, 3), RGBColor(68, 1, 84));
        assert_eq!(sequential(2, 3), RGBColor(253, 231, 37));
        assert_eq!(sequential(0, 1), RGBColor(68, 1, 84));
    }

    #[test]
    fn bundled_font_registers_and_lays_out_text() {
        register_fonts().unwrap();
        register_fonts().unwrap();
        let (width, height) = (FONT, 16).into_font().box_size("0.42").unwrap();
        assert!(width > 0 && height > 0);
    }
}

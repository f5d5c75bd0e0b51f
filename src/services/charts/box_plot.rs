use plotters::prelude::*;
use std::path::Path;

use super::style::{self, DrawResult};
use crate::services::stats::box_summary;

const BOX_LOW: f64 = 0.3;
const BOX_HIGH: f64 = 0.7;
const MIDDLE: f64 = 0.5;
const CAP_LOW: f64 = 0.4;
const CAP_HIGH: f64 = 0.6;

fn outline() -> ShapeStyle {
    BLACK.stroke_width(2)
}

/// Horizontal box plot of the present values.
pub(super) fn draw(path: &Path, size: (u32, u32), column: &str, values: &[f64]) -> DrawResult<()> {
    let summary = box_summary(values).ok_or("box plot needs at least one value")?;

    let span = summary.max - summary.min;
    let pad = if span > 0.0 { span * 0.05 } else { 0.5 };
    let x_range = (summary.min - pad)..(summary.max + pad);

    let root = style::canvas(path, size)?;
    let mut builder = style::chart_builder(&root, &format!("Box plot of {}", column));
    let mut chart = builder.build_cartesian_2d(x_range, 0f64..1f64)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(0)
        .x_desc(column)
        .label_style(style::label_style(12))
        .draw()?;

    chart.draw_series(std::iter::once(Rectangle::new(
        [(summary.q1, BOX_LOW), (summary.q3, BOX_HIGH)],
        style::BOX_FILL.filled(),
    )))?;
    chart.draw_series(std::iter::once(Rectangle::new(
        [(summary.q1, BOX_LOW), (summary.q3, BOX_HIGH)],
        outline(),
    )))?;

    let segments = [
        vec![(summary.median, BOX_LOW), (summary.median, BOX_HIGH)],
        vec![(summary.lower_whisker, MIDDLE), (summary.q1, MIDDLE)],
        vec![(summary.q3, MIDDLE), (summary.upper_whisker, MIDDLE)],
        vec![(summary.lower_whisker, CAP_LOW), (summary.lower_whisker, CAP_HIGH)],
        vec![(summary.upper_whisker, CAP_LOW), (summary.upper_whisker, CAP_HIGH)],
    ];
    chart.draw_series(segments.into_iter().map(|points| PathElement::new(points, outline())))?;

    chart.draw_series(
        summary
            .outliers
            .iter()
            .map(|&v| Circle::new((v, MIDDLE), 4, BLACK.stroke_width(1))),
    )?;

    root.present()?;
    Ok(())
}

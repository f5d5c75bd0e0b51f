use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

use super::style::{self, DrawResult};
use crate::error::AppError;
use crate::models::{numeric_values, Table};
use crate::services::stats::pearson;

/// Pairwise Pearson correlation of the numeric columns; `None` cells are undefined.
/// Returns `None` when the table has no numeric column.
pub fn correlation_matrix(
    table: &Table,
) -> Result<Option<(Vec<String>, Vec<Vec<Option<f64>>>)>, AppError> {
    let mut names = Vec::new();
    let mut columns = Vec::new();
    for series in table.numeric_columns() {
        names.push(series.name().to_string());
        columns.push(numeric_values(series)?);
    }
    if names.is_empty() {
        return Ok(None);
    }

    let matrix = columns
        .iter()
        .map(|xs| columns.iter().map(|ys| pearson(xs, ys)).collect())
        .collect();
    Ok(Some((names, matrix)))
}

/// Cell text: the coefficient to two decimals, `NaN` where undefined.
fn annotation(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "NaN".to_string())
}

/// Heat-map with the first column in the top row.
pub(super) fn draw(
    path: &Path,
    size: (u32, u32),
    columns: &[String],
    matrix: &[Vec<Option<f64>>],
) -> DrawResult<()> {
    let n = columns.len();
    if n == 0 {
        return Err("correlation heat-map needs at least one column".into());
    }
    let extent = n as f64 - 0.5;

    let root = style::canvas(path, size)?;
    let mut builder = style::chart_builder(&root, "Correlation matrix");
    let mut chart = builder.build_cartesian_2d(-0.5..extent, -0.5..extent)?;

    let label = |v: &f64| -> String {
        let idx = v.round();
        if (v - idx).abs() > 1e-6 || idx < 0.0 || idx as usize >= n {
            return String::new();
        }
        columns[idx as usize].clone()
    };
    let row_label = |v: &f64| label(&(n as f64 - 1.0 - v));
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&label)
        .y_label_formatter(&row_label)
        .label_style(style::label_style(12))
        .draw()?;

    let cells = matrix.iter().enumerate().flat_map(|(i, row)| {
        row.iter().enumerate().map(move |(j, value)| {
            let y = (n - 1 - i) as f64;
            let x = j as f64;
            let color = value.map(style::diverging).unwrap_or(style::MISSING_CELL);
            Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], color.filled())
        })
    });
    chart.draw_series(cells)?;

    let borders = (0..n).flat_map(|i| {
        (0..n).map(move |j| {
            let (x, y) = (j as f64, i as f64);
            Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], BLACK.stroke_width(1))
        })
    });
    chart.draw_series(borders)?;

    let anchor = Pos::new(HPos::Center, VPos::Center);
    let annotations = matrix.iter().enumerate().flat_map(|(i, row)| {
        row.iter().enumerate().map(move |(j, value)| {
            Text::new(
                annotation(*value),
                (j as f64, (n - 1 - i) as f64),
                style::label_style(14).pos(anchor),
            )
        })
    });
    chart.draw_series(annotations)?;

    root.present()?;
    Ok(())
}

use plotters::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use super::style::{self, DrawResult};

/// Count per category in order of first appearance. Above `max_categories`
/// only the most frequent categories are kept, still in appearance order.
pub fn category_counts(values: &[Option<String>], max_categories: usize) -> Vec<(String, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for value in values.iter().flatten() {
        let entry = counts.entry(value.as_str()).or_insert_with(|| {
            order.push(value.as_str());
            0
        });
        *entry += 1;
    }

    let mut ranked: Vec<(usize, &str, usize)> = order
        .iter()
        .enumerate()
        .map(|(position, name)| (position, *name, counts[name]))
        .collect();

    if ranked.len() > max_categories {
        tracing::debug!(
            "Keeping the {} most frequent of {} categories",
            max_categories,
            ranked.len()
        );
        ranked.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
        ranked.truncate(max_categories);
        ranked.sort_by_key(|entry| entry.0);
    }

    ranked
        .into_iter()
        .map(|(_, name, count)| (name.to_string(), count))
        .collect()
}

pub(super) fn draw(
    path: &Path,
    size: (u32, u32),
    column: &str,
    counts: &[(String, usize)],
) -> DrawResult<()> {
    let n = counts.len();
    if n == 0 {
        return Err("bar chart needs at least one category".into());
    }
    let y_max = counts.iter().map(|(_, c)| *c).max().unwrap_or(1) as f64 * 1.05;

    let root = style::canvas(path, size)?;
    let mut builder = style::chart_builder(&root, &format!("Category frequency in {}", column));
    let mut chart = builder.build_cartesian_2d(-0.5..(n as f64 - 0.5), 0f64..y_max)?;

    let label = |v: &f64| -> String {
        let idx = v.round();
        if (v - idx).abs() > 1e-6 || idx < 0.0 || idx as usize >= n {
            return String::new();
        }
        counts[idx as usize].0.clone()
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label)
        .x_label_style(style::label_style(12).transform(FontTransform::Rotate90))
        .y_label_style(style::label_style(12))
        .x_desc(column)
        .y_desc("Frequency")
        .draw()?;

    chart.draw_series(counts.iter().enumerate().map(|(idx, (_, count))| {
        let x = idx as f64;
        Rectangle::new(
            [(x - 0.4, 0.0), (x + 0.4, *count as f64)],
            style::sequential(idx, n).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

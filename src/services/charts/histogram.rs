use plotters::prelude::*;
use std::path::Path;

use super::style::{self, DrawResult};

/// Equal-width bins over `[lower, lower + width * counts.len()]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bins {
    pub lower: f64,
    pub width: f64,
    pub counts: Vec<usize>,
}

impl Bins {
    pub fn upper(&self) -> f64 {
        self.lower + self.width * self.counts.len() as f64
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// (lower edge, upper edge, count) per bin.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, usize)> + '_ {
        self.counts.iter().enumerate().map(move |(idx, &count)| {
            let lo = self.lower + self.width * idx as f64;
            (lo, lo + self.width, count)
        })
    }
}

/// Bins finite values; a constant column is centred in `[v - 0.5, v + 0.5]`.
pub fn bin_values(values: &[f64], bin_count: usize) -> Option<Bins> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bin_count == 0 {
        return None;
    }

    let min = finite.iter().fold(f64::INFINITY, |acc, v| acc.min(*v));
    let max = finite.iter().fold(f64::NEG_INFINITY, |acc, v| acc.max(*v));
    let (lower, upper) = if (max - min).abs() < f64::EPSILON {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (upper - lower) / bin_count as f64;

    let mut counts = vec![0usize; bin_count];
    for value in finite {
        let idx = (((value - lower) / width).floor() as usize).min(bin_count - 1);
        counts[idx] += 1;
    }

    Some(Bins { lower, width, counts })
}

pub(super) fn draw(path: &Path, size: (u32, u32), column: &str, bins: &Bins) -> DrawResult<()> {
    let root = style::canvas(path, size)?;
    let y_max = (bins.max_count().max(1) as f64) * 1.05;

    let mut builder = style::chart_builder(&root, &format!("Histogram of {}", column));
    let mut chart = builder.build_cartesian_2d(bins.lower..bins.upper(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(column)
        .y_desc("Frequency")
        .label_style(style::label_style(12))
        .draw()?;

    chart.draw_series(bins.iter().map(|(lo, hi, count)| {
        Rectangle::new([(lo, 0.0), (hi, count as f64)], style::HISTOGRAM_FILL.filled())
    }))?;
    chart.draw_series(bins.iter().filter(|(_, _, count)| *count > 0).map(|(lo, hi, count)| {
        Rectangle::new([(lo, 0.0), (hi, count as f64)], BLACK.stroke_width(1))
    }))?;

    root.present()?;
    Ok(())
}

//! Pearson correlation and box-plot geometry for the chart renderers.

/// Quantile with linear interpolation between closest ranks. `sorted` must be ascending.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let fraction = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Pearson correlation over the pairs where both sides are present and finite.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => Some((*x, *y)),
            _ => None,
        })
        .collect();

    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (cov, var_x, var_y) = pairs.iter().fold((0.0, 0.0, 0.0), |(cov, vx, vy), (x, y)| {
        let dx = x - mean_x;
        let dy = y - mean_y;
        (cov + dx * dy, vx + dx * dx, vy + dy * dy)
    });

    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

/// Box-plot summary with whiskers at the furthest points inside 1.5 IQR.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
    pub min: f64,
    pub max: f64,
}

/// Non-finite values are ignored; `None` when nothing finite is left.
pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    let q1 = quantile(&sorted, 0.25)?;
    let median = quantile(&sorted, 0.5)?;
    let q3 = quantile(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;

    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= low_fence && *v <= high_fence)
        .collect();
    let lower_whisker = inside.first().copied().unwrap_or(q1);
    let upper_whisker = inside.last().copied().unwrap_or(q3);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| *v < low_fence || *v > high_fence)
        .collect();

    Some(BoxSummary {
        q1,
        median,
        q3,
        lower_whisker,
        upper_whisker,
        outliers,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!(close(quantile(&values, 0.25).unwrap(), 1.75));
        assert!(close(quantile(&values, 0.5).unwrap(), 2.5));
        assert!(close(quantile(&values, 0.75).unwrap(), 3.25));
        assert!(quantile(&[], 0.5).is_none());
    }

    #[test]
    fn pearson_handles_gaps_and_constants() {
        let xs = [Some(1.0), Some(2.0), None, Some(3.0)];
        let ys = [Some(2.0), Some(4.0), Some(100.0), Some(6.0)];
        assert!(close(pearson(&xs, &ys).unwrap(), 1.0));

        let inverse = [Some(3.0), Some(2.0), Some(0.0), Some(1.0)];
        assert!(close(pearson(&xs, &inverse).unwrap(), -1.0));

        let flat = [Some(5.0), Some(5.0), Some(5.0), Some(5.0)];
        assert!(pearson(&xs, &flat).is_none());
    }

    #[test]
    fn box_summary_flags_outliers() {
        let summary = box_summary(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert!(close(summary.median, 3.0));
        assert_eq!(summary.outliers, vec![100.0]);
        assert!(close(summary.upper_whisker, 4.0));
        assert!(close(summary.lower_whisker, 1.0));
        assert!(close(summary.max, 100.0));
    }

    #[test]
    fn non_finite_values_are_left_out() {
        let summary = box_summary(&[1.0, 2.0, f64::INFINITY, 3.0, f64::NEG_INFINITY, f64::NAN]).unwrap();
        assert!(close(summary.min, 1.0));
        assert!(close(summary.max, 3.0));
        assert!(close(summary.median, 2.0));
        assert!(summary.outliers.is_empty());
        assert!(box_summary(&[f64::INFINITY]).is_none());

        let xs = [Some(1.0), Some(2.0), Some(f64::INFINITY), Some(3.0)];
        let ys = [Some(2.0), Some(4.0), Some(5.0), Some(6.0)];
        assert!(close(pearson(&xs, &ys).unwrap(), 1.0));
    }
}

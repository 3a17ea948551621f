// Descriptive statistics

use crate::error::{Error, Result};
use crate::stats::DescriptiveStats;
use std::cmp::Ordering;

/// Internal implementation of the univariate summary
///
/// A single value has `std` 0 (not NaN), which makes its coefficient of
/// variation 0 as well.
pub(crate) fn describe_impl(data: &[f64]) -> Result<DescriptiveStats> {
    if data.is_empty() {
        return Err(Error::EmptyData(
            "descriptive statistics need at least one value".into(),
        ));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidValue(
            "descriptive statistics need finite values".into(),
        ));
    }

    let count = data.len();
    let n = count as f64;
    let mean = data.iter().sum::<f64>() / n;

    // Sample variance (n - 1); one value has no spread
    let sum_squared_diff = data.iter().map(|&x| (x - mean).powi(2)).sum::<f64>();
    let std = if count > 1 {
        (sum_squared_diff / (count - 1) as f64).sqrt()
    } else {
        0.0
    };

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let min = sorted[0];
    let max = sorted[count - 1];
    let median = percentile(&sorted, 0.5);
    let q25 = percentile(&sorted, 0.25);
    let q75 = percentile(&sorted, 0.75);

    // Central moments with n in the denominator
    let m2 = sum_squared_diff / n;
    let m3 = data.iter().map(|&x| (x - mean).powi(3)).sum::<f64>() / n;
    let m4 = data.iter().map(|&x| (x - mean).powi(4)).sum::<f64>() / n;
    let (skewness, kurtosis) = if m2 > 0.0 {
        (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
    } else {
        log::debug!("constant column of {} values: skewness and kurtosis undefined", count);
        (f64::NAN, f64::NAN)
    };

    let coefficient_of_variation = if mean != 0.0 {
        std / mean * 100.0
    } else {
        0.0
    };

    Ok(DescriptiveStats {
        count,
        mean,
        median,
        std,
        min,
        max,
        q25,
        q75,
        iqr: q75 - q25,
        skewness,
        kurtosis,
        coefficient_of_variation,
    })
}

/// Linear-interpolated percentile of already-sorted data
pub(crate) fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    if sorted_data.is_empty() {
        return f64::NAN;
    }

    let n = sorted_data.len();
    let idx = p * (n - 1) as f64;
    let idx_floor = idx.floor() as usize;
    let idx_ceil = idx.ceil() as usize;

    if idx_floor == idx_ceil {
        return sorted_data[idx_floor];
    }

    // lo + (hi - lo) * w is exact when lo == hi, so tied values interpolate to themselves
    let (lo, hi) = (sorted_data[idx_floor], sorted_data[idx_ceil]);
    let weight = idx - idx_floor as f64;
    (lo + (hi - lo) * weight).max(lo).min(hi)
}

/// Pearson coefficient of equal-length slices; None when either side is constant
pub(crate) fn pearson_impl(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len().min(y.len());
    if n < 2 {
        return None;
    }

    let mean_x = x.iter().sum::<f64>() / n as f64;
    let mean_y = y.iter().sum::<f64>() / n as f64;

    // Σ(xi - x̄)(yi - ȳ)
    let numerator = x
        .iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| (xi - mean_x) * (yi - mean_y))
        .sum::<f64>();

    let sum_squared_diff_x = x.iter().map(|&xi| (xi - mean_x).powi(2)).sum::<f64>();
    let sum_squared_diff_y = y.iter().map(|&yi| (yi - mean_y).powi(2)).sum::<f64>();

    let denominator = (sum_squared_diff_x * sum_squared_diff_y).sqrt();
    if denominator.abs() < f64::EPSILON {
        return None;
    }

    Some((numerator / denominator).clamp(-1.0, 1.0))
}

/// 1-based ranks with ties sharing their average rank
pub(crate) fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions start..end share ranks start+1..=end
        let rank = (start + end + 1) as f64 / 2.0;
        for &idx in &order[start..end] {
            ranks[idx] = rank;
        }
        start = end;
    }
    ranks
}

/// Spearman coefficient: Pearson on average ranks
pub(crate) fn spearman_impl(x: &[f64], y: &[f64]) -> Option<f64> {
    pearson_impl(&average_ranks(x), &average_ranks(y))
}

pub(crate) fn gini_impl(values: &[f64]) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| *v >= 0.0).collect();
    let total: f64 = sorted.iter().sum();
    if sorted.is_empty() || total == 0.0 {
        return 0.0;
    }

    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let n = sorted.len() as f64;
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, v)| (i + 1) as f64 * v)
        .sum();

    2.0 * weighted / (n * total) - (n + 1.0) / n
}

pub(crate) fn concentration_ratio_impl(values: &[f64], top_n: usize) -> f64 {
    let total: f64 = values.iter().sum();
    if total == 0.0 {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(Ordering::Equal));
    sorted.iter().take(top_n).sum::<f64>() / total
}

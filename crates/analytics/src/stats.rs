//! Small shared numeric helpers. Everything here returns `Option` for
//! undefined results rather than erroring or coercing to zero.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().sum();
    Some(sum / Decimal::from(values.len()))
}

/// Sample standard deviation (n-1 denominator). Undefined for fewer than
/// two points.
pub fn sample_stdev(values: &[Decimal]) -> Option<Decimal> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = mean(values)?;
    let sum_sq_dev: Decimal = values.iter().map(|v| (*v - mean) * (*v - mean)).sum();
    let variance = sum_sq_dev / Decimal::from(n - 1);
    variance.sqrt()
}

/// Quantile of a pre-sorted slice using linear interpolation between ranks,
/// matching the convention of most statistics packages. `q` must lie in
/// [0, 1]. Undefined for an empty slice.
pub fn quantile(sorted: &[Decimal], q: Decimal) -> Option<Decimal> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let position = q * Decimal::from(n - 1);
    let lower = position.floor();
    let fraction = position - lower;
    let lower_idx = lower.to_usize()?;
    let upper_idx = (lower_idx + 1).min(n - 1);

    Some(sorted[lower_idx] + fraction * (sorted[upper_idx] - sorted[lower_idx]))
}

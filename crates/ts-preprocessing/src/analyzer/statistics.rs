//! Descriptive statistics over plain value slices.

/// Arithmetic mean, `None` for an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (ddof = 1), `None` below two values.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    let variance = squares / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Quantile of sorted values with linear interpolation between order statistics.
pub(crate) fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64))
}

/// Mean of `v[i] - v[i-1]` over adjacent pairs where both are present.
pub(crate) fn mean_first_difference(values: &[Option<f64>]) -> Option<f64> {
    let diffs: Vec<f64> = values
        .windows(2)
        .filter_map(|pair| match pair {
            [Some(prev), Some(next)] => Some(next - prev),
            _ => None,
        })
        .collect();
    mean(&diffs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_std() {
        // Mean = 3, variance = 10 / 4
        let std = sample_std(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((std - 2.5f64.sqrt()).abs() < 1e-12);
        assert_eq!(sample_std(&[5.0]), None);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.25), Some(1.75));
        assert_eq!(quantile(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile(&sorted, 1.0), Some(4.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_mean_first_difference_skips_broken_pairs() {
        let values = [Some(1.0), Some(3.0), None, Some(10.0), Some(11.0)];
        // pairs (1,3) and (10,11)
        assert_eq!(mean_first_difference(&values), Some(1.5));
        assert_eq!(mean_first_difference(&[Some(1.0)]), None);
        assert_eq!(mean_first_difference(&[Some(1.0), None, Some(2.0)]), None);
    }
}

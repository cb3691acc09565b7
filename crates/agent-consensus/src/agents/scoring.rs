//! Helpers shared by the scoring curves

/// Position of `value` within `[low, high]` as a fraction
///
/// `None` for a zero-width or inverted range, or any non-finite input.
pub(crate) fn range_position(value: f64, low: f64, high: f64) -> Option<f64> {
    let width = high - low;
    if !value.is_finite() || !width.is_finite() || width <= f64::EPSILON {
        return None;
    }
    Some((value - low) / width)
}

/// Upper median: the element at index `len / 2` after sorting
pub(crate) fn upper_median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(sorted[sorted.len() / 2])
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Number of finite values present
pub(crate) fn count_present(values: &[Option<f64>]) -> usize {
    values
        .iter()
        .filter(|value| value.is_some_and(f64::is_finite))
        .count()
}

/// Treat NaN and infinities as missing
pub(crate) fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Share of the group that `target` beats, where `rank 1` scores 1.0
///
/// `others` excludes the target. Ties count in the target's favour.
pub(crate) fn percentile_rank(target: f64, others: &[f64], higher_is_better: bool) -> f64 {
    let n = others.len() + 1;
    let better = others
        .iter()
        .filter(|&&other| {
            if higher_is_better {
                other > target
            } else {
                other < target
            }
        })
        .count();
    (n - better) as f64 / n as f64
}

/// `12.3` or `N/A`
pub(crate) fn fmt_num(value: Option<f64>, precision: usize) -> String {
    match finite(value) {
        Some(v) => format!("{v:.precision$}"),
        None => "N/A".to_string(),
    }
}

/// Fraction rendered as a percentage: `0.183` -> `18.3%`
pub(crate) fn fmt_pct(value: Option<f64>) -> String {
    match finite(value) {
        Some(v) => format!("{:.1}%", v * 100.0),
        None => "N/A".to_string(),
    }
}

/// Format market cap in human-readable form
pub(crate) fn format_market_cap(cap: f64) -> String {
    if cap >= 1_000_000_000_000.0 {
        format!("{:.2}T", cap / 1_000_000_000_000.0)
    } else if cap >= 1_000_000_000.0 {
        format!("{:.2}B", cap / 1_000_000_000.0)
    } else if cap >= 1_000_000.0 {
        format!("{:.2}M", cap / 1_000_000.0)
    } else {
        format!("{cap:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_position() {
        assert_eq!(range_position(15.0, 10.0, 20.0), Some(0.5));
        assert_eq!(range_position(10.0, 10.0, 10.0), None);
        assert_eq!(range_position(10.0, 20.0, 10.0), None);
        assert_eq!(range_position(f64::NAN, 0.0, 1.0), None);
    }

    #[test]
    fn test_upper_median() {
        assert_eq!(upper_median(&[]), None);
        assert_eq!(upper_median(&[3.0]), Some(3.0));
        assert_eq!(upper_median(&[4.0, 1.0, 3.0, 2.0]), Some(3.0));
        assert_eq!(upper_median(&[5.0, 1.0, 3.0]), Some(3.0));
    }

    #[test]
    fn test_percentile_rank() {
        // Lowest P/E of four ranks first.
        assert_eq!(percentile_rank(10.0, &[20.0, 30.0, 15.0], false), 1.0);
        // Lowest ROE of four ranks last.
        assert_eq!(percentile_rank(0.05, &[0.1, 0.2, 0.3], true), 0.25);
        assert_eq!(percentile_rank(1.0, &[], true), 1.0);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(fmt_num(Some(12.345), 1), "12.3");
        assert_eq!(fmt_num(None, 2), "N/A");
        assert_eq!(fmt_pct(Some(0.183)), "18.3%");
        assert_eq!(fmt_pct(Some(f64::INFINITY)), "N/A");
        assert_eq!(format_market_cap(2_500_000_000_000.0), "2.50T");
        assert_eq!(format_market_cap(750_000_000.0), "750.00M");
    }

    #[test]
    fn test_count_present_ignores_non_finite() {
        assert_eq!(count_present(&[Some(1.0), None, Some(f64::NAN), Some(0.0)]), 2);
        assert_eq!(mean(&[1.0, 2.0]), Some(1.5));
    }
}

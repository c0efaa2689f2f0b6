use crate::math::stats::StatsHelper;

/// Centered rolling median with a minimum of one period.
///
/// The window for index `i` spans `i - width / 2 ..= i + (width - 1) / 2`,
/// clipped to the series; edges shrink instead of producing gaps. NaN entries
/// are skipped, so a window holding only NaN yields NaN.
pub fn centered_rolling_median(values: &[f64], width: usize) -> Vec<f64> {
    let width = width.max(1);
    let before = width / 2;
    let after = (width - 1) / 2;
    let last = values.len().saturating_sub(1);

    (0..values.len())
        .map(|i| {
            let lo = i.saturating_sub(before);
            let hi = (i + after).min(last);
            StatsHelper::nan_median(&values[lo..=hi]).unwrap_or(f64::NAN)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_three_uses_neighbours_and_shrinks_at_edges() {
        let smoothed = centered_rolling_median(&[1.0, 9.0, 2.0, 3.0], 3);
        // edges: median(1, 9) and median(2, 3)
        assert_eq!(smoothed, vec![5.0, 2.0, 3.0, 2.5]);
    }

    #[test]
    fn width_one_is_identity() {
        let values = [0.4, 0.1, 0.7];
        assert_eq!(centered_rolling_median(&values, 1), values.to_vec());
    }

    #[test]
    fn even_width_leans_backwards() {
        // width 4 covers i-2..=i+1
        let smoothed = centered_rolling_median(&[1.0, 2.0, 3.0, 4.0, 5.0], 4);
        assert_eq!(smoothed, vec![1.5, 2.0, 2.5, 3.5, 4.0]);
    }

    #[test]
    fn single_spike_is_removed() {
        let smoothed = centered_rolling_median(&[0.2, 0.2, 0.9, 0.2, 0.2], 3);
        assert_eq!(smoothed, vec![0.2; 5]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(centered_rolling_median(&[], 3).is_empty());
    }
}

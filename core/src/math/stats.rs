pub struct StatsHelper;

impl StatsHelper {
    /// Median of `values`, reordering the slice in place.
    ///
    /// Even-length input averages the two middle values. Any NaN makes the
    /// result NaN; an empty slice has no median.
    pub fn median_in_place(values: &mut [f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        if values.iter().any(|v| v.is_nan()) {
            return Some(f64::NAN);
        }

        values.sort_unstable_by(f64::total_cmp);
        let mid = values.len() / 2;
        if values.len() % 2 == 1 {
            Some(values[mid])
        } else {
            Some((values[mid - 1] + values[mid]) / 2.0)
        }
    }

    /// Median ignoring NaN entries; `None` when nothing finite-or-infinite remains.
    pub fn nan_median(values: &[f64]) -> Option<f64> {
        let mut present: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        Self::median_in_place(&mut present)
    }

    /// Maps NaN and infinities to zero.
    pub fn finite_or_zero(value: f64) -> f64 {
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_empty_is_none() {
        assert_eq!(StatsHelper::median_in_place(&mut []), None);
        assert_eq!(StatsHelper::nan_median(&[f64::NAN]), None);
    }

    #[test]
    fn median_handles_odd_and_even_lengths() {
        assert_eq!(StatsHelper::median_in_place(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(
            StatsHelper::median_in_place(&mut [4.0, 1.0, 3.0, 2.0]),
            Some(2.5)
        );
    }

    #[test]
    fn nan_poisons_plain_median_but_not_nan_median() {
        let values = [1.0, f64::NAN, 3.0];
        assert!(StatsHelper::median_in_place(&mut values.clone())
            .unwrap()
            .is_nan());
        assert_eq!(StatsHelper::nan_median(&values), Some(2.0));
    }

    #[test]
    fn finite_or_zero_replaces_invalid_numbers() {
        assert_eq!(StatsHelper::finite_or_zero(f64::INFINITY), 0.0);
        assert_eq!(StatsHelper::finite_or_zero(f64::NEG_INFINITY), 0.0);
        assert_eq!(StatsHelper::finite_or_zero(f64::NAN), 0.0);
        assert_eq!(StatsHelper::finite_or_zero(-0.25), -0.25);
    }
}

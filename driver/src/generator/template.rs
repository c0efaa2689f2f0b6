/// Logistic step centred on `midpoint` with time constant `scale` days.
pub fn logistic(t: f64, midpoint: f64, scale: f64) -> f64 {
    1.0 / (1.0 + (-(t - midpoint) / scale.max(f64::EPSILON)).exp())
}

/// Green-up followed by senescence: rises around `up`, falls around `down`.
pub fn double_logistic(t: f64, up: f64, down: f64, scale: f64) -> f64 {
    logistic(t, up, scale) - logistic(t, down, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logistic_is_half_at_midpoint() {
        assert!((logistic(10.0, 10.0, 4.0) - 0.5).abs() < 1e-12);
        assert!(logistic(-50.0, 10.0, 4.0) < 1e-6);
    }

    #[test]
    fn double_logistic_peaks_between_transitions() {
        let peak = double_logistic(60.0, 30.0, 90.0, 5.0);
        assert!(peak > 0.99);
        assert!(double_logistic(0.0, 30.0, 90.0, 5.0) < 0.01);
        assert!(double_logistic(120.0, 30.0, 90.0, 5.0) < 0.01);
    }
}

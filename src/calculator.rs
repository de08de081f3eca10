//! Target-current calculation
//!
//! Turns a phase's sample history and the rated circuit current into the
//! headroom left for the charger on that phase. The history holds net
//! "other load" samples (measured phase current minus the charger's own
//! draw), so headroom is simply `rated - other_load`, clamped to
//! `[0, rated]`.
//!
//! Only [`Calculator::calculate_target_with_filter`] is authoritative. The
//! unfiltered [`Calculator::calculate_target_current`] exists to compare
//! against in diagnostics and must not be dispatched.

use crate::phase::Phase;

/// Default filter window: 6 samples x 5 s => 30 s running mean
pub const DEFAULT_FILTER_WINDOW: usize = 6;

#[derive(Debug, Clone, Copy)]
pub struct Calculator {
    rated_current: f64,
    filter_window: usize,
}

impl Calculator {
    /// Negative or non-finite rated currents are treated as 0 A; a zero
    /// window is raised to 1.
    pub fn new(rated_current: f64, filter_window: usize) -> Self {
        let rated_current = if rated_current.is_finite() {
            rated_current.max(0.0)
        } else {
            0.0
        };
        Self {
            rated_current,
            filter_window: filter_window.max(1),
        }
    }

    pub fn rated_current(&self) -> f64 {
        self.rated_current
    }

    pub fn filter_window(&self) -> usize {
        self.filter_window
    }

    /// Filtered target for `phase`, using the mean of the newest
    /// `filter_window` samples as the other-load estimate.
    ///
    /// With an empty history the phase's previous target is kept (clamped to
    /// the rated current); a phase that never had a target gets the full
    /// rated current.
    pub fn calculate_target_with_filter(&self, phase: &Phase) -> f64 {
        match phase.samples().tail_mean(self.filter_window) {
            Some(other_load) => self.headroom(other_load),
            None => phase
                .target_current()
                .map(|t| self.clamp(t))
                .unwrap_or(self.rated_current),
        }
    }

    /// Unfiltered single-sample target, diagnostics only.
    pub fn calculate_target_current(&self, latest_sample: f64) -> f64 {
        self.headroom(latest_sample)
    }

    fn headroom(&self, other_load: f64) -> f64 {
        if !other_load.is_finite() {
            return 0.0;
        }
        self.clamp(self.rated_current - other_load)
    }

    fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        value.clamp(0.0, self.rated_current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::PhaseId;
    use crate::sensor::SensorRef;

    fn phase_with(samples: &[f64]) -> Phase {
        let mut p = Phase::new(PhaseId::P1, SensorRef::new("sensor.l1"), 60);
        for s in samples {
            p.add_sample(*s);
        }
        p
    }

    #[test]
    fn target_is_rated_minus_mean_load() {
        let calc = Calculator::new(32.0, 6);
        let phase = phase_with(&[10.0; 6]);
        assert!((calc.calculate_target_with_filter(&phase) - 22.0).abs() < 1e-9);
    }

    #[test]
    fn filter_suppresses_single_spike() {
        let calc = Calculator::new(25.0, 6);
        let phase = phase_with(&[5.0, 5.0, 5.0, 5.0, 5.0, 35.0]);
        let filtered = calc.calculate_target_with_filter(&phase);
        let raw = calc.calculate_target_current(35.0);
        assert!((filtered - 15.0).abs() < 1e-9);
        assert_eq!(raw, 0.0);
    }

    #[test]
    fn only_newest_window_counts() {
        let calc = Calculator::new(20.0, 2);
        let phase = phase_with(&[18.0, 18.0, 18.0, 4.0, 6.0]);
        assert!((calc.calculate_target_with_filter(&phase) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn empty_history_falls_back_to_rated_then_last_target() {
        let calc = Calculator::new(16.0, 6);
        let mut phase = phase_with(&[]);
        assert_eq!(calc.calculate_target_with_filter(&phase), 16.0);

        phase.update_target(9.5);
        assert_eq!(calc.calculate_target_with_filter(&phase), 9.5);

        phase.update_target(40.0);
        assert_eq!(calc.calculate_target_with_filter(&phase), 16.0);
    }

    #[test]
    fn single_sample_is_a_full_window() {
        let calc = Calculator::new(32.0, 6);
        let phase = phase_with(&[12.0]);
        assert!((calc.calculate_target_with_filter(&phase) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn negative_other_load_never_exceeds_rated() {
        // Export (e.g. solar) shows up as negative other load
        let calc = Calculator::new(16.0, 6);
        let phase = phase_with(&[-8.0; 6]);
        assert_eq!(calc.calculate_target_with_filter(&phase), 16.0);
    }

    #[test]
    fn output_stays_within_bounds() {
        for rated in [0.0, 6.0, 16.0, 25.0, 32.0, 63.0] {
            let calc = Calculator::new(rated, 6);
            for load in [-100.0, -1.0, 0.0, 3.3, 16.0, 31.9, 64.0, 1e6] {
                let t = calc.calculate_target_with_filter(&phase_with(&[load; 3]));
                assert!((0.0..=rated).contains(&t), "rated={rated} load={load} t={t}");
                let raw = calc.calculate_target_current(load);
                assert!((0.0..=rated).contains(&raw));
            }
        }
    }

    #[test]
    fn degenerate_inputs_are_sanitized() {
        let calc = Calculator::new(-5.0, 0);
        assert_eq!(calc.rated_current(), 0.0);
        assert_eq!(calc.filter_window(), 1);
        assert_eq!(calc.calculate_target_current(2.0), 0.0);

        let calc = Calculator::new(f64::NAN, 6);
        assert_eq!(calc.rated_current(), 0.0);

        let calc = Calculator::new(32.0, 6);
        assert_eq!(calc.calculate_target_current(f64::NAN), 0.0);
    }
}

use log::warn;
use serde::{Deserialize, Serialize};

use super::LearningRateLambda;

/// BurnInDecayLambda combines a warm-up ("burn-in") ramp with a piecewise decay schedule.
///
/// All timing values are in optimizer steps. For a step `s`:
/// - `s <= burn_in_start`: the multiplier holds at `burn_in_factor`.
/// - `burn_in_start < s < burn_in_start + burn_in_duration`: it rises exponentially,
///   `burn_in_factor ^ (1 - (s - burn_in_start) / burn_in_duration)`, towards 1.0.
/// - for every entry `d` of `decay_schedule`, the multiplier is scaled by
///   `decay_factor ^ ((s - d) / decay_duration)` while `d < s < d + decay_duration`,
///   and by the full `decay_factor` from `d + decay_duration` on.
///
/// Decay entries compound, so duplicates in the schedule decay twice.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BurnInDecayLambda {
    burn_in_duration: f64,
    burn_in_start: f64,
    burn_in_factor: f64,
    decay_schedule: Vec<f64>,
    decay_factor: f64,
    decay_duration: f64,
}

impl BurnInDecayLambda {
    pub fn new(
        burn_in_duration: f64, decay_schedule: Vec<f64>, decay_factor: f64, decay_duration: f64, burn_in_start: f64,
        burn_in_factor: f64,
    ) -> Self {
        Self {
            burn_in_duration,
            burn_in_start,
            burn_in_factor,
            decay_schedule,
            decay_factor,
            decay_duration,
        }
    }

    pub fn burn_in_duration(&self) -> f64 {
        self.burn_in_duration
    }

    pub fn burn_in_start(&self) -> f64 {
        self.burn_in_start
    }

    pub fn burn_in_factor(&self) -> f64 {
        self.burn_in_factor
    }

    pub fn decay_schedule(&self) -> &[f64] {
        &self.decay_schedule
    }

    pub fn decay_factor(&self) -> f64 {
        self.decay_factor
    }

    pub fn decay_duration(&self) -> f64 {
        self.decay_duration
    }

    fn decay(&self, step: f64, d: f64) -> f64 {
        // a zero-length transition is a plain step down right after `d`
        if self.decay_duration == 0.0 {
            return if step > d { self.decay_factor } else { 1.0 };
        }
        if step >= d + self.decay_duration {
            self.decay_factor
        } else if step > d {
            self.decay_factor.powf((step - d) / self.decay_duration)
        } else {
            1.0
        }
    }
}

#[typetag::serde]
impl LearningRateLambda for BurnInDecayLambda {
    fn evaluate(&self, step: i64) -> f64 {
        let step = step as f64;
        let mut lambda = 1.0;

        if step <= self.burn_in_start {
            lambda *= self.burn_in_factor;
        }

        // strict bounds: the ramp range is empty for a non-positive duration
        if self.burn_in_start < step && step < self.burn_in_start + self.burn_in_duration {
            lambda *= self
                .burn_in_factor
                .powf(1.0 - (step - self.burn_in_start) / self.burn_in_duration);
        }

        for &d in &self.decay_schedule {
            lambda *= self.decay(step, d);
        }

        lambda
    }
}

/// BurnIn is a builder for the burn-in + piecewise decay learning rate multiplier.
///
/// The learning rate starts suppressed by `burn_in_factor`, ramps up to the base
/// rate over `burn_in_duration` steps after `burn_in_start`, and is then reduced by
/// `decay_factor` at every step listed in the decay schedule, each reduction
/// spread over `decay_duration` steps.
///
/// All values are in optimizer steps; convert epochs by multiplying with the
/// number of training batches per epoch before handing them over.
pub struct BurnIn {
    burn_in_duration: f64,
    burn_in_start: f64,
    burn_in_factor: f64,
    decay_schedule: Vec<f64>,
    decay_factor: f64,
    decay_duration: f64,
}

impl BurnIn {
    /// Creates a new builder.
    /// Default values:
    /// - burn_in_duration: 0 (no ramp)
    /// - burn_in_start: 0
    /// - burn_in_factor: 0.01
    /// - decay_schedule: empty
    /// - decay_factor: 0.1
    /// - decay_duration: 1.0
    pub fn new() -> Self {
        Self {
            burn_in_duration: 0.0,
            burn_in_start: 0.0,
            burn_in_factor: 0.01,
            decay_schedule: Vec::new(),
            decay_factor: 0.1,
            decay_duration: 1.0,
        }
    }

    /// Set the number of steps over which the multiplier ramps up from `burn_in_factor` to 1.0.
    pub fn burn_in_duration(mut self, burn_in_duration: f64) -> Self {
        self.burn_in_duration = burn_in_duration;
        self
    }

    /// Set the step at which the ramp begins. Steps up to and including it use the flat factor.
    pub fn burn_in_start(mut self, burn_in_start: f64) -> Self {
        self.burn_in_start = burn_in_start;
        self
    }

    /// Set the multiplier applied at the start of burn-in, typically in (0, 1].
    pub fn burn_in_factor(mut self, burn_in_factor: f64) -> Self {
        self.burn_in_factor = burn_in_factor;
        self
    }

    /// Set the steps at which decay transitions start.
    pub fn decay_schedule(mut self, decay_schedule: Vec<f64>) -> Self {
        self.decay_schedule = decay_schedule;
        self
    }

    /// Set the multiplier applied once a decay transition completes, typically in (0, 1].
    pub fn decay_factor(mut self, decay_factor: f64) -> Self {
        self.decay_factor = decay_factor;
        self
    }

    /// Set the number of steps each decay transition takes. Zero makes it instantaneous.
    pub fn decay_duration(mut self, decay_duration: f64) -> Self {
        self.decay_duration = decay_duration;
        self
    }

    // Values outside the intended domain are accepted; only flag them.
    fn inspect(&self) {
        if self.burn_in_factor <= 0.0 || self.burn_in_factor > 1.0 {
            warn!("Burn-in factor outside (0, 1]: {}", self.burn_in_factor);
        }
        if self.decay_factor <= 0.0 || self.decay_factor > 1.0 {
            warn!("Decay factor outside (0, 1]: {}", self.decay_factor);
        }
        if self.burn_in_duration < 0.0 {
            warn!("Negative burn-in duration: {}", self.burn_in_duration);
        }
        if self.decay_duration < 0.0 {
            warn!("Negative decay duration: {}", self.decay_duration);
        }
    }

    pub fn build(self) -> BurnInDecayLambda {
        self.inspect();
        BurnInDecayLambda {
            burn_in_duration: self.burn_in_duration,
            burn_in_start: self.burn_in_start,
            burn_in_factor: self.burn_in_factor,
            decay_schedule: self.decay_schedule,
            decay_factor: self.decay_factor,
            decay_duration: self.decay_duration,
        }
    }
}

impl Default for BurnIn {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> BurnInDecayLambda {
        BurnIn::new()
            .burn_in_duration(200.0)
            .decay_schedule(vec![1000.0])
            .decay_factor(0.1)
            .decay_duration(100.0)
            .burn_in_start(0.0)
            .burn_in_factor(0.001)
            .build()
    }

    #[test]
    fn test_reference_schedule() {
        let lambda = reference();
        assert_eq!(lambda.evaluate(0), 0.001);
        assert!((lambda.evaluate(100) - 0.001f64.sqrt()).abs() < 1e-12);
        assert!((lambda.evaluate(100) - 0.0316).abs() < 1e-4);
        assert_eq!(lambda.evaluate(200), 1.0);
        assert_eq!(lambda.evaluate(999), 1.0);
        assert!((lambda.evaluate(1050) - 0.1f64.sqrt()).abs() < 1e-12);
        assert!((lambda.evaluate(1050) - 0.316).abs() < 1e-3);
        assert!((lambda.evaluate(1100) - 0.1).abs() < 1e-12);
        assert_eq!(lambda.evaluate(5000), 0.1);
    }

    #[test]
    fn test_flat_burn_in_before_start() {
        let lambda = BurnIn::new()
            .burn_in_duration(50.0)
            .burn_in_start(30.0)
            .burn_in_factor(0.25)
            .build();
        for step in [-1_000_000, -1, 0, 1, 29, 30] {
            assert_eq!(lambda.evaluate(step), 0.25, "step {}", step);
        }
        // first ramp step is just above the flat factor
        let first = lambda.evaluate(31);
        assert!(first > 0.25 && first < 1.0);
    }

    #[test]
    fn test_burn_in_ramp_is_continuous_at_end() {
        let lambda = BurnIn::new().burn_in_duration(10_000.0).burn_in_factor(0.001).build();
        let before = lambda.evaluate(9_999);
        assert!(before < 1.0);
        assert!((before - 1.0).abs() < 1e-3);
        assert_eq!(lambda.evaluate(10_000), 1.0);

        let mut previous = lambda.evaluate(0);
        for step in 1..=10_000 {
            let current = lambda.evaluate(step);
            assert!(current >= previous, "ramp decreased at step {}", step);
            previous = current;
        }
    }

    #[test]
    fn test_zero_burn_in_duration() {
        let lambda = BurnIn::new().burn_in_duration(0.0).burn_in_factor(0.5).build();
        assert_eq!(lambda.evaluate(0), 0.5);
        assert_eq!(lambda.evaluate(1), 1.0);
        assert!(lambda.evaluate(1).is_finite());
    }

    #[test]
    fn test_decay_is_monotonic_during_transition() {
        let lambda = BurnIn::new()
            .burn_in_factor(1.0)
            .decay_schedule(vec![300.0])
            .decay_factor(0.2)
            .decay_duration(40.0)
            .build();
        assert_eq!(lambda.evaluate(300), 1.0);
        let mut previous = lambda.evaluate(300);
        for step in 301..=340 {
            let current = lambda.evaluate(step);
            assert!(current <= previous, "decay increased at step {}", step);
            previous = current;
        }
        assert!((lambda.evaluate(340) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_fully_applied_decays_count() {
        let lambda = BurnIn::new()
            .burn_in_factor(1.0)
            .decay_schedule(vec![100.0, 250.0, 400.0])
            .decay_factor(0.5)
            .decay_duration(10.0)
            .build();
        assert_eq!(lambda.evaluate(50), 1.0);
        assert!((lambda.evaluate(110) - 0.5).abs() < 1e-12);
        assert!((lambda.evaluate(260) - 0.25).abs() < 1e-12);
        assert!((lambda.evaluate(410) - 0.125).abs() < 1e-12);
        assert!((lambda.evaluate(1_000_000) - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_decay_entries_compound() {
        let lambda = BurnIn::new()
            .burn_in_factor(1.0)
            .decay_schedule(vec![500.0, 500.0])
            .decay_factor(0.1)
            .decay_duration(20.0)
            .build();
        assert!((lambda.evaluate(520) - 0.01).abs() < 1e-12);
        assert!((lambda.evaluate(9_000) - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_unsorted_schedule() {
        let sorted = BurnIn::new()
            .burn_in_factor(1.0)
            .decay_schedule(vec![100.0, 200.0])
            .build();
        let unsorted = BurnIn::new()
            .burn_in_factor(1.0)
            .decay_schedule(vec![200.0, 100.0])
            .build();
        for step in [0, 100, 101, 150, 200, 201, 1000] {
            assert!((sorted.evaluate(step) - unsorted.evaluate(step)).abs() < 1e-15);
        }
    }

    #[test]
    fn test_zero_decay_duration_steps_after_entry() {
        let lambda = BurnIn::new()
            .burn_in_factor(1.0)
            .decay_schedule(vec![500.0])
            .decay_factor(0.1)
            .decay_duration(0.0)
            .build();
        assert_eq!(lambda.evaluate(499), 1.0);
        assert_eq!(lambda.evaluate(500), 1.0);
        assert_eq!(lambda.evaluate(501), 0.1);
        assert!(lambda.evaluate(501).is_finite());
    }

    #[test]
    fn test_burn_in_and_decay_overlap() {
        // decay starting during burn-in multiplies into the ramp
        let lambda = BurnIn::new()
            .burn_in_duration(100.0)
            .burn_in_factor(0.01)
            .decay_schedule(vec![0.0])
            .decay_factor(0.5)
            .decay_duration(100.0)
            .build();
        let expected = 0.01f64.powf(0.5) * 0.5f64.powf(0.5);
        assert!((lambda.evaluate(50) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_identical_configuration_identical_output() {
        let a = reference();
        let b = BurnInDecayLambda::new(200.0, vec![1000.0], 0.1, 100.0, 0.0, 0.001);
        assert_eq!(a, b);
        for step in (-10..6000).step_by(7) {
            assert_eq!(a.evaluate(step).to_bits(), b.evaluate(step).to_bits());
        }
    }

    #[test]
    fn test_builder_defaults() {
        let lambda = BurnIn::default().build();
        assert_eq!(lambda.burn_in_duration(), 0.0);
        assert_eq!(lambda.burn_in_start(), 0.0);
        assert_eq!(lambda.burn_in_factor(), 0.01);
        assert!(lambda.decay_schedule().is_empty());
        assert_eq!(lambda.decay_factor(), 0.1);
        assert_eq!(lambda.decay_duration(), 1.0);
    }

    #[test]
    fn test_out_of_domain_values_are_accepted() {
        let lambda = BurnIn::new()
            .burn_in_factor(2.0)
            .decay_factor(3.0)
            .decay_schedule(vec![10.0])
            .decay_duration(-5.0)
            .build();
        assert_eq!(lambda.evaluate(0), 2.0);
        assert_eq!(lambda.evaluate(20), 3.0);
    }

    #[test]
    fn test_boxed_lambda_serialization() {
        let boxed: Box<dyn LearningRateLambda> = Box::new(reference());
        let json = serde_json::to_string(&boxed).unwrap();
        let restored: Box<dyn LearningRateLambda> = serde_json::from_str(&json).unwrap();
        for step in [0, 100, 1050, 5000] {
            assert_eq!(boxed.evaluate(step), restored.evaluate(step));
        }
        let cloned = restored.clone();
        assert_eq!(cloned.evaluate(100), boxed.evaluate(100));
    }

    #[test]
    fn test_concurrent_evaluation() {
        let lambda = std::sync::Arc::new(reference());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let lambda = lambda.clone();
                std::thread::spawn(move || (0..2000).map(|s| lambda.evaluate(s + t)).sum::<f64>())
            })
            .collect();
        let sums: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(sums.len(), 4);
        for (t, sum) in sums.iter().enumerate() {
            let expected: f64 = (0..2000).map(|s| lambda.evaluate(s + t as i64)).sum();
            assert_eq!(*sum, expected);
        }
    }
}

use crate::{common::matrix::DenseMatrix, error::TrainError, util::check_shapes};
use serde::{Deserialize, Serialize};

use super::{Optimizer, OptimizerConfig};

// Adam(Adaptive Moment Estimation) adapts the step of every parameter to the
// magnitude of its gradient history.
// moment1 tracks the running mean of gradients (the momentum part),
// moment2 tracks the running mean of squared gradients (the RMS part).
// With AMSGrad the running maximum of moment2 is used in the denominator instead,
// so the effective step size never grows back.
// gradient = gradient + weight_decay * weight
// moment1 = beta1 * moment1 + (1 - beta1) * gradient
// moment2 = beta2 * moment2 + (1 - beta2) * gradient ** 2
// denom = sqrt(moment2) / sqrt(1 - beta2 ** t) + epsilon
// weight = weight - learning_rate / (1 - beta1 ** t) * moment1 / denom
#[derive(Serialize, Deserialize, Clone)]
struct AdamOptimizer {
    config: AdamConfig,
    moment1: Vec<DenseMatrix>,
    moment2: Vec<DenseMatrix>,
    max_moment2: Vec<DenseMatrix>,
    t: usize,
}

impl AdamOptimizer {
    fn new(config: AdamConfig) -> Self {
        Self {
            config,
            moment1: Vec::new(),
            moment2: Vec::new(),
            max_moment2: Vec::new(),
            t: 0,
        }
    }

    fn update_moments(&mut self, index: usize, param: &DenseMatrix, grad: &DenseMatrix) {
        let beta1 = self.config.beta1;
        let beta2 = self.config.beta2;
        let weight_decay = self.config.weight_decay;
        let gradient = |i: usize, j: usize| grad.at(i, j) + weight_decay * param.at(i, j);

        self.moment1[index].apply_with_indices(|i, j, m| {
            *m = beta1 * *m + (1.0 - beta1) * gradient(i, j);
        });

        self.moment2[index].apply_with_indices(|i, j, v| {
            let g = gradient(i, j);
            *v = beta2 * *v + (1.0 - beta2) * g * g;
        });

        if self.config.amsgrad {
            let moment2 = &self.moment2[index];
            self.max_moment2[index].apply_with_indices(|i, j, v| {
                *v = v.max(moment2.at(i, j));
            });
        }
    }

    fn update_parameters(&self, index: usize, param: &mut DenseMatrix) {
        let bias_correction1 = 1.0 - self.config.beta1.powf(self.t as f32);
        let bias_correction2_sqrt = (1.0 - self.config.beta2.powf(self.t as f32)).sqrt();
        let step_size = self.config.learning_rate / bias_correction1;
        let second = if self.config.amsgrad {
            &self.max_moment2[index]
        } else {
            &self.moment2[index]
        };
        let first = &self.moment1[index];

        param.apply_with_indices(|i, j, w| {
            let denom = second.at(i, j).sqrt() / bias_correction2_sqrt + self.config.epsilon;
            *w -= step_size * first.at(i, j) / denom;
        });
    }
}

#[typetag::serde]
impl Optimizer for AdamOptimizer {
    fn initialize(&mut self, params: &[DenseMatrix]) {
        self.moment1 = params.iter().map(DenseMatrix::zeros_like).collect();
        self.moment2 = params.iter().map(DenseMatrix::zeros_like).collect();
        self.max_moment2 = if self.config.amsgrad {
            params.iter().map(DenseMatrix::zeros_like).collect()
        } else {
            Vec::new()
        };
        self.t = 0;
    }

    fn update(&mut self, params: &mut [DenseMatrix], grads: &[DenseMatrix]) {
        check_shapes(params, grads);
        if self.moment1.len() != params.len() {
            self.initialize(params);
        }
        self.t += 1;
        for (index, (param, grad)) in params.iter_mut().zip(grads.iter()).enumerate() {
            self.update_moments(index, param, grad);
            self.update_parameters(index, param);
        }
    }

    fn update_learning_rate(&mut self, learning_rate: f32) {
        self.config.learning_rate = learning_rate;
    }

    fn learning_rate(&self) -> f32 {
        self.config.learning_rate
    }
}

#[derive(Serialize, Deserialize, Clone)]
struct AdamConfig {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    weight_decay: f32,
    amsgrad: bool,
}

#[typetag::serde]
impl OptimizerConfig for AdamConfig {
    fn create_optimizer(&self) -> Box<dyn Optimizer> {
        Box::new(AdamOptimizer::new(self.clone()))
    }
    fn update_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }
    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}

/// Adam is a builder for Adam(Adaptive Moment Estimation) which is an optimization algorithm that
/// adapts learning rates for each parameter based on the magnitude of the gradient.
///
/// moment1 acts as the momentum, capturing the direction of the gradients over time.
/// moment2 represents the RMS component, tracking the magnitude of the gradients.
///
/// Setting `amsgrad` switches to the AMSGrad variant, which divides by the running maximum
/// of moment2 rather than its current value.
///
/// moment1 = beta1 * moment1 + (1 - beta1) * gradient
/// moment2 = beta2 * moment2 + (1 - beta2) * gradient ** 2
/// weight = weight - learning_rate * m_hat / (sqrt(v_hat) + epsilon)
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    weight_decay: f32,
    amsgrad: bool,
}

impl Adam {
    /// Creates a new builder for Adam(Adaptive Moment Estimation) optimizer.
    /// Default values:
    /// - learning_rate: 0.001
    /// - beta1: 0.9
    /// - beta2: 0.999
    /// - epsilon: 1e-8
    /// - weight_decay: 0.0
    /// - amsgrad: false
    pub fn new() -> Adam {
        Adam {
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            weight_decay: 0.0,
            amsgrad: false,
        }
    }

    /// Set the learning rate.
    ///
    /// The learning rate controls the step size at each iteration while moving toward a minimum of the loss function.
    /// # Parameters
    /// - `learning_rate`: Learning rate, typically a small positive value (e.g., 0.001).
    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the first moment decay rate (beta1).
    ///
    /// Controls the exponential decay rate for the moving average of gradients. Typically close to 1.0 (e.g., 0.9).
    /// # Parameters
    /// - `beta1`: First moment decay rate, in [0.0, 1.0).
    pub fn beta1(mut self, beta1: f32) -> Self {
        self.beta1 = beta1;
        self
    }

    /// Set the second moment decay rate (beta2).
    ///
    /// Controls the exponential decay rate for the moving average of squared gradients. Typically very close to 1.0 (e.g., 0.999).
    /// # Parameters
    /// - `beta2`: Second moment decay rate, in [0.0, 1.0).
    pub fn beta2(mut self, beta2: f32) -> Self {
        self.beta2 = beta2;
        self
    }

    /// Set the epsilon value for numerical stability.
    ///
    /// Prevents division by zero in the update rule. Typically a very small value (e.g., 1e-8).
    pub fn epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Set the weight decay (L2 penalty) coefficient.
    pub fn weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    /// Use the AMSGrad variant.
    pub fn amsgrad(mut self, amsgrad: bool) -> Self {
        self.amsgrad = amsgrad;
        self
    }

    fn validate(&self) -> Result<(), TrainError> {
        if self.learning_rate <= 0.0 {
            return Err(TrainError::ConfigError(format!(
                "Learning rate for Adam must be greater than 0.0, but was {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.beta1) {
            return Err(TrainError::ConfigError(format!(
                "Beta1 for Adam must be in the range [0, 1), but was {}",
                self.beta1
            )));
        }
        if !(0.0..1.0).contains(&self.beta2) {
            return Err(TrainError::ConfigError(format!(
                "Beta2 for Adam must be in the range [0, 1), but was {}",
                self.beta2
            )));
        }
        if self.epsilon < 0.0 {
            return Err(TrainError::ConfigError(format!(
                "Epsilon for Adam must be greater than or equal to 0.0, but was {}",
                self.epsilon
            )));
        }
        if self.weight_decay < 0.0 {
            return Err(TrainError::ConfigError(format!(
                "Weight decay for Adam must be greater than or equal to 0.0, but was {}",
                self.weight_decay
            )));
        }
        Ok(())
    }

    pub fn build(self) -> Result<Box<dyn OptimizerConfig>, TrainError> {
        self.validate()?;
        Ok(Box::new(AdamConfig {
            learning_rate: self.learning_rate,
            beta1: self.beta1,
            beta2: self.beta2,
            epsilon: self.epsilon,
            weight_decay: self.weight_decay,
            amsgrad: self.amsgrad,
        }))
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::equal_approx;

    fn config(learning_rate: f32, weight_decay: f32, amsgrad: bool) -> AdamConfig {
        AdamConfig {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            weight_decay,
            amsgrad,
        }
    }

    #[test]
    fn test_initialize() {
        let mut optimizer = AdamOptimizer::new(config(0.001, 0.0, true));
        let params = vec![DenseMatrix::new(2, 2, &[0.1, 0.2, 0.3, 0.4]), DenseMatrix::new(2, 1, &[0.1, 0.2])];
        optimizer.initialize(&params);
        assert_eq!(optimizer.moment1.len(), 2);
        assert_eq!(optimizer.moment2[1].shape(), (2, 1));
        assert_eq!(optimizer.max_moment2[0].shape(), (2, 2));
        assert_eq!(optimizer.t, 0);
    }

    #[test]
    fn test_first_step_moves_by_learning_rate() {
        // bias correction makes the first step lr * sign(gradient)
        let mut optimizer = AdamOptimizer::new(config(0.001, 0.0, false));
        let mut params = vec![DenseMatrix::new(2, 2, &[1.0, 2.0, 3.0, 4.0])];
        let grads = vec![DenseMatrix::new(2, 2, &[10.0, -11.0, 12.0, 0.5])];
        optimizer.initialize(&params);

        optimizer.update(&mut params, &grads);

        let expected = DenseMatrix::new(2, 2, &[0.999, 2.001, 2.999, 3.999]);
        assert!(equal_approx(&params[0], &expected, 1e-5));
    }

    #[test]
    fn test_adam_second_step() {
        let mut optimizer = AdamOptimizer::new(config(0.1, 0.0, false));
        let mut params = vec![DenseMatrix::new(1, 1, &[1.0])];
        optimizer.initialize(&params);

        optimizer.update(&mut params, &[DenseMatrix::new(1, 1, &[1.0])]);
        optimizer.update(&mut params, &[DenseMatrix::new(1, 1, &[0.0])]);

        // m = 0.09, v = 0.000999, bias corrections 0.19 and 0.001999
        let m: f32 = 0.09;
        let v: f32 = 0.000999;
        let second = 0.1 / 0.19 * m / (v.sqrt() / 0.001999f32.sqrt() + 1e-8);
        assert!((params[0].at(0, 0) - (0.9 - second)).abs() < 1e-4);
    }

    #[test]
    fn test_bias_correction_past_i32_steps() {
        let mut optimizer = AdamOptimizer::new(config(0.001, 0.0, false));
        let mut params = vec![DenseMatrix::new(1, 1, &[1.0])];
        optimizer.initialize(&params);
        optimizer.t = i32::MAX as usize;

        optimizer.update(&mut params, &[DenseMatrix::new(1, 1, &[1.0])]);

        // both corrections have converged to 1
        let expected = 1.0 - 0.001 * 0.1 / (0.001f32.sqrt() + 1e-8);
        assert!(params[0].at(0, 0).is_finite());
        assert!((params[0].at(0, 0) - expected).abs() < 1e-5);
    }

    #[test]
    fn test_amsgrad_keeps_maximum() {
        let mut adam = AdamOptimizer::new(config(0.1, 0.0, false));
        let mut amsgrad = AdamOptimizer::new(config(0.1, 0.0, true));
        let mut adam_params = vec![DenseMatrix::new(1, 1, &[1.0])];
        let mut amsgrad_params = adam_params.clone();
        adam.initialize(&adam_params);
        amsgrad.initialize(&amsgrad_params);

        for g in [1.0, 0.0] {
            let grads = vec![DenseMatrix::new(1, 1, &[g])];
            adam.update(&mut adam_params, &grads);
            amsgrad.update(&mut amsgrad_params, &grads);
        }

        assert!(amsgrad.max_moment2[0].at(0, 0) >= amsgrad.moment2[0].at(0, 0));
        assert!((amsgrad.max_moment2[0].at(0, 0) - 0.001).abs() < 1e-7);
        // the larger remembered second moment yields a smaller step
        assert!(amsgrad_params[0].at(0, 0) > adam_params[0].at(0, 0));
    }

    #[test]
    fn test_weight_decay() {
        let mut optimizer = AdamOptimizer::new(config(0.001, 0.1, false));
        let mut params = vec![DenseMatrix::new(1, 2, &[1.0, -1.0])];
        let grads = vec![DenseMatrix::zeros(1, 2)];
        optimizer.initialize(&params);

        optimizer.update(&mut params, &grads);
        assert!(equal_approx(&params[0], &DenseMatrix::new(1, 2, &[0.999, -0.999]), 1e-5));
    }

    #[test]
    fn test_update_learning_rate() {
        let mut optimizer = AdamOptimizer::new(config(0.001, 0.0, false));
        optimizer.update_learning_rate(0.01);
        assert_eq!(optimizer.learning_rate(), 0.01);
    }

    #[test]
    fn test_clone_adam_optimizer_config() {
        let adam_config = Adam::new()
            .learning_rate(0.001)
            .beta1(0.9)
            .beta2(0.999)
            .epsilon(1e-8)
            .amsgrad(true)
            .build()
            .unwrap();
        let cloned_config = adam_config.clone();
        assert_eq!(adam_config.learning_rate(), cloned_config.learning_rate());
    }

    #[test]
    fn test_adam_builder_invalid_beta2() {
        let result = Adam::new().beta2(1.0).build();
        assert!(result.is_err());
        if let Err(e) = result {
            assert_eq!(e.to_string(), "Configuration error: Beta2 for Adam must be in the range [0, 1), but was 1");
        }
    }

    #[test]
    fn test_adam_builder_invalid_learning_rate() {
        let result = Adam::new().learning_rate(0.0).build();
        assert!(result.is_err());
        if let Err(e) = result {
            assert_eq!(
                e.to_string(),
                "Configuration error: Learning rate for Adam must be greater than 0.0, but was 0"
            );
        }
    }

    #[test]
    fn test_adam_builder_invalid_epsilon() {
        assert!(Adam::new().epsilon(-1e-6).build().is_err());
        assert!(Adam::new().weight_decay(-0.5).build().is_err());
    }
}

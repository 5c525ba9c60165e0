use crate::{common::matrix::DenseMatrix, error::TrainError, util::check_shapes};

use serde::{Deserialize, Serialize};

use super::{Optimizer, OptimizerConfig};

/// Stochastic Gradient Descent (SGD) with optional momentum, Nesterov momentum and weight decay.
/// gradient = gradient + weight_decay * weight
/// velocity = gradient                         (first step)
/// velocity = momentum * velocity + gradient   (later steps)
/// direction = gradient + momentum * velocity  (Nesterov) or velocity
/// weight = weight - learning_rate * direction
/// With momentum 0 this is plain SGD.
#[derive(Serialize, Deserialize, Clone)]
struct SGDOptimizer {
    config: SGDConfig,
    velocities: Vec<DenseMatrix>,
    t: usize,
}

impl SGDOptimizer {
    fn new(config: SGDConfig) -> Self {
        Self {
            config,
            velocities: Vec::new(),
            t: 0,
        }
    }

    fn update_block(&mut self, index: usize, param: &mut DenseMatrix, grad: &DenseMatrix) {
        let learning_rate = self.config.learning_rate;
        let momentum = self.config.momentum;
        let weight_decay = self.config.weight_decay;
        let nesterov = self.config.nesterov;
        let first = self.t == 1;
        let velocity = &mut self.velocities[index];

        param.apply_with_indices(|i, j, w| {
            let mut g = grad.at(i, j) + weight_decay * *w;
            if momentum != 0.0 {
                let v = if first { g } else { momentum * velocity.at(i, j) + g };
                velocity.set(i, j, v);
                g = if nesterov { g + momentum * v } else { v };
            }
            *w -= learning_rate * g;
        });
    }
}

#[typetag::serde]
impl Optimizer for SGDOptimizer {
    fn initialize(&mut self, params: &[DenseMatrix]) {
        self.velocities = params.iter().map(DenseMatrix::zeros_like).collect();
        self.t = 0;
    }

    fn update(&mut self, params: &mut [DenseMatrix], grads: &[DenseMatrix]) {
        check_shapes(params, grads);
        if self.velocities.len() != params.len() {
            self.initialize(params);
        }
        self.t += 1;
        for (index, (param, grad)) in params.iter_mut().zip(grads.iter()).enumerate() {
            self.update_block(index, param, grad);
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
struct SGDConfig {
    learning_rate: f32,
    momentum: f32,
    nesterov: bool,
    weight_decay: f32,
}

#[typetag::serde]
impl OptimizerConfig for SGDConfig {
    fn create_optimizer(&self) -> Box<dyn Optimizer> {
        Box::new(SGDOptimizer::new(self.clone()))
    }
    fn update_learning_rate(&mut self, learning_rate: f32) {
        self.learning_rate = learning_rate;
    }
    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}

/// Builder for SGD optimizer
/// Stochastic Gradient Descent (SGD) updates model parameters in the direction of the
/// negative gradient. Momentum accumulates past gradients into a velocity; Nesterov
/// momentum evaluates the step at the look-ahead position. Weight decay adds an L2
/// penalty to the gradient.
/// weight = weight - learning_rate * (momentum-corrected gradient)
pub struct SGD {
    learning_rate: f32,
    momentum: f32,
    nesterov: bool,
    weight_decay: f32,
}

impl SGD {
    /// Creates a new builder for SGD optimizer.
    /// Default values:
    /// - learning_rate: 0.01
    /// - momentum: 0.0
    /// - nesterov: false
    /// - weight_decay: 0.0
    pub fn new() -> Self {
        Self {
            learning_rate: 0.01,
            momentum: 0.0,
            nesterov: false,
            weight_decay: 0.0,
        }
    }

    /// Set the learning rate.
    ///
    /// Controls the step size for parameter updates. Smaller values lead to slower but more stable convergence.
    /// # Parameters
    /// - `learning_rate`: The learning rate value (e.g., 0.01).
    pub fn learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the momentum factor.
    ///
    /// Determines how much past gradients influence the current update.
    /// # Parameters
    /// - `momentum`: Momentum factor in [0.0, 1.0) (e.g., 0.9). 0.0 disables momentum.
    pub fn momentum(mut self, momentum: f32) -> Self {
        self.momentum = momentum;
        self
    }

    /// Enable or disable Nesterov momentum. Requires a momentum greater than 0.0.
    pub fn nesterov(mut self, nesterov: bool) -> Self {
        self.nesterov = nesterov;
        self
    }

    /// Set the weight decay (L2 penalty) coefficient.
    pub fn weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    fn validate(&self) -> Result<(), TrainError> {
        if self.learning_rate <= 0.0 {
            return Err(TrainError::ConfigError(format!(
                "Learning rate for SGD must be greater than 0.0, but was {}",
                self.learning_rate
            )));
        }
        if !(0.0..1.0).contains(&self.momentum) {
            return Err(TrainError::ConfigError(format!(
                "Momentum for SGD must be in [0.0, 1.0), but was {}",
                self.momentum
            )));
        }
        if self.weight_decay < 0.0 {
            return Err(TrainError::ConfigError(format!(
                "Weight decay for SGD must be greater than or equal to 0.0, but was {}",
                self.weight_decay
            )));
        }
        if self.nesterov && self.momentum == 0.0 {
            return Err(TrainError::ConfigError(
                "Nesterov momentum for SGD requires a momentum greater than 0.0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn build(self) -> Result<Box<dyn OptimizerConfig>, TrainError> {
        self.validate()?;
        Ok(Box::new(SGDConfig {
            learning_rate: self.learning_rate,
            momentum: self.momentum,
            nesterov: self.nesterov,
            weight_decay: self.weight_decay,
        }))
    }
}

impl Default for SGD {
    fn default() -> Self {
        Self::new()
    }
}

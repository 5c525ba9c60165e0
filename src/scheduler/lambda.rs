use serde::{Deserialize, Serialize};

use super::LearningRateLambda;

/// LambdaScheduler scales a fixed base learning rate by a step-dependent multiplier.
///
/// learning_rate(step) = base_learning_rate * lambda(step)
///
/// The step counter starts at 0 and is advanced by exactly one per call to `step`,
/// which a training loop does once after every optimizer update.
#[derive(Serialize, Deserialize, Clone)]
pub struct LambdaScheduler {
    base_learning_rate: f32,
    lambda: Box<dyn LearningRateLambda>,
    step: i64,
}

impl LambdaScheduler {
    pub fn new(base_learning_rate: f32, lambda: Box<dyn LearningRateLambda>) -> Self {
        Self {
            base_learning_rate,
            lambda,
            step: 0,
        }
    }

    /// The multiplier for the current step.
    pub fn multiplier(&self) -> f64 {
        self.lambda.evaluate(self.step)
    }

    /// The learning rate for the current step.
    pub fn learning_rate(&self) -> f32 {
        self.base_learning_rate * self.multiplier() as f32
    }

    /// Advances to the next step and returns its learning rate.
    pub fn step(&mut self) -> f32 {
        self.step += 1;
        self.learning_rate()
    }

    pub fn current_step(&self) -> i64 {
        self.step
    }

    /// Moves the counter to `step`, e.g. when resuming from a known position.
    pub fn set_step(&mut self, step: i64) {
        self.step = step;
    }

    pub fn base_learning_rate(&self) -> f32 {
        self.base_learning_rate
    }

    pub fn lambda(&self) -> &dyn LearningRateLambda {
        self.lambda.as_ref()
    }
}

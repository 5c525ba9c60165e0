use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::common::matrix::DenseMatrix;
use crate::lambda::LambdaScheduler;
use crate::Optimizer;

/// ScheduledOptimizer drives an optimizer with a step-based learning rate schedule.
///
/// Every call to `step` applies one update at the learning rate of the current step
/// and then advances the schedule, so the very first update uses the multiplier of step 0.
#[derive(Serialize, Deserialize, Clone)]
pub struct ScheduledOptimizer {
    optimizer: Box<dyn Optimizer>,
    scheduler: LambdaScheduler,
}

impl ScheduledOptimizer {
    pub fn new(mut optimizer: Box<dyn Optimizer>, scheduler: LambdaScheduler) -> Self {
        optimizer.update_learning_rate(scheduler.learning_rate());
        info!(
            "Scheduled optimizer ready: base_lr:{}, step:{}, lr:{}",
            scheduler.base_learning_rate(),
            scheduler.current_step(),
            scheduler.learning_rate()
        );
        Self { optimizer, scheduler }
    }

    /// Allocates optimizer state for the given parameter blocks.
    pub fn initialize(&mut self, params: &[DenseMatrix]) {
        self.optimizer.initialize(params);
    }

    /// Applies one update and advances the schedule. Returns the learning rate that was used.
    pub fn step(&mut self, params: &mut [DenseMatrix], grads: &[DenseMatrix]) -> f32 {
        let learning_rate = self.scheduler.learning_rate();
        self.optimizer.update_learning_rate(learning_rate);
        self.optimizer.update(params, grads);
        debug!("step:{}, lr:{:e}", self.scheduler.current_step(), learning_rate);
        self.scheduler.step();
        learning_rate
    }

    /// Learning rate the next update will use.
    pub fn learning_rate(&self) -> f32 {
        self.scheduler.learning_rate()
    }

    /// Number of updates applied so far.
    pub fn current_step(&self) -> i64 {
        self.scheduler.current_step()
    }

    pub fn scheduler(&self) -> &LambdaScheduler {
        &self.scheduler
    }

    pub fn optimizer(&self) -> &dyn Optimizer {
        self.optimizer.as_ref()
    }
}

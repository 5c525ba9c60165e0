use log::info;

use crate::adam::Adam;
use crate::error::TrainError;
use crate::lambda::LambdaScheduler;
use crate::options::{OptimizerOptions, ScheduleOptions, TrainingOptions};
use crate::sgd::SGD;
use crate::training::ScheduledOptimizer;
use crate::OptimizerConfig;

/// Builds the optimizer selected by `options`: Adam (or AMSGrad, which implies Adam)
/// when requested, SGD otherwise.
pub fn factory_optimizer(options: &OptimizerOptions) -> Result<Box<dyn OptimizerConfig>, TrainError> {
    if options.adam || options.amsgrad {
        info!("Adam optimizer: amsgrad:{}", options.amsgrad);
        Adam::new()
            .learning_rate(options.lr)
            .beta1(options.momentum)
            .beta2(options.beta2)
            .epsilon(options.adam_eps)
            .weight_decay(options.weight_decay)
            .amsgrad(options.amsgrad)
            .build()
    } else {
        info!("SGD optimizer: nesterov:{}", options.nesterov);
        SGD::new()
            .learning_rate(options.lr)
            .momentum(options.momentum)
            .weight_decay(options.weight_decay)
            .nesterov(options.nesterov)
            .build()
    }
}

/// Builds the burn-in/decay schedule around the optimizer's learning rate.
/// Epoch based options are converted to steps with `training_batches_per_epoch`.
pub fn factory_lr_scheduler(
    optimizer_config: &dyn OptimizerConfig, options: &ScheduleOptions, training_batches_per_epoch: usize,
) -> LambdaScheduler {
    LambdaScheduler::new(optimizer_config.learning_rate(), Box::new(options.to_lambda(training_batches_per_epoch)))
}

/// Builds a ready-to-step optimizer with its learning rate schedule.
pub fn factory_training(
    options: &TrainingOptions, training_batches_per_epoch: usize,
) -> Result<ScheduledOptimizer, TrainError> {
    let optimizer_config = factory_optimizer(&options.optimizer)?;
    let scheduler = factory_lr_scheduler(optimizer_config.as_ref(), &options.schedule, training_batches_per_epoch);
    Ok(ScheduledOptimizer::new(optimizer_config.create_optimizer(), scheduler))
}

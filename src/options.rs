use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::burn_in::{BurnIn, BurnInDecayLambda};
use crate::error::TrainError;

/// Optimizer selection and hyper-parameters.
///
/// `momentum` is the SGD momentum and doubles as beta1 for Adam/AMSGrad.
/// `amsgrad` implies `adam`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct OptimizerOptions {
    pub momentum: f32,
    pub beta2: f32,
    pub adam_eps: f32,
    pub nesterov: bool,
    pub weight_decay: f32,
    pub adam: bool,
    pub amsgrad: bool,
    pub lr: f32,
}

impl Default for OptimizerOptions {
    fn default() -> Self {
        Self {
            momentum: 0.9,
            beta2: 0.999,
            adam_eps: 1e-6,
            nesterov: true,
            weight_decay: 0.0,
            adam: false,
            amsgrad: false,
            lr: 1e-3,
        }
    }
}

/// Learning rate schedule in epoch units.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ScheduleOptions {
    /// Epochs at which a decay transition starts.
    pub lr_decay: Vec<f64>,
    pub lr_decay_factor: f64,
    /// Length of each decay transition in epochs.
    pub lr_decay_duration: f64,
    pub lr_burn_in_start_epoch: f64,
    /// Number of epochs at the beginning with a lowered learning rate.
    pub lr_burn_in_epochs: f64,
    /// Learning rate pre-factor during burn-in.
    pub lr_burn_in_factor: f64,
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            lr_decay: Vec::new(),
            lr_decay_factor: 0.1,
            lr_decay_duration: 1.0,
            lr_burn_in_start_epoch: 0.0,
            lr_burn_in_epochs: 2.0,
            lr_burn_in_factor: 0.001,
        }
    }
}

impl ScheduleOptions {
    /// Converts the epoch based options into a step based multiplier.
    pub fn to_lambda(&self, training_batches_per_epoch: usize) -> BurnInDecayLambda {
        let batches = training_batches_per_epoch as f64;
        BurnIn::new()
            .burn_in_duration(self.lr_burn_in_epochs * batches)
            .decay_schedule(self.lr_decay.iter().map(|epoch| epoch * batches).collect())
            .decay_factor(self.lr_decay_factor)
            .decay_duration(self.lr_decay_duration * batches)
            .burn_in_start(self.lr_burn_in_start_epoch * batches)
            .burn_in_factor(self.lr_burn_in_factor)
            .build()
    }
}

/// Everything needed to set up the optimizer and its learning rate schedule.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingOptions {
    pub optimizer: OptimizerOptions,
    pub schedule: ScheduleOptions,
}

impl TrainingOptions {
    /// Parses options from JSON. Missing keys keep their defaults, unknown keys are rejected.
    pub fn from_json_str(json: &str) -> Result<Self, TrainError> {
        serde_json::from_str(json).map_err(|e| TrainError::ConfigError(format!("Invalid training options: {}", e)))
    }

    /// Reads options from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, TrainError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| TrainError::IoError(format!("Failed to read options file '{}': {}", path.display(), e)))?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String, TrainError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| TrainError::IoError(format!("Failed to serialize training options: {}", e)))
    }
}

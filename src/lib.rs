//! Burn-in warm-up and piecewise decay learning-rate schedules for step-driven training.
//!
//! The heart of the crate is [`burn_in::BurnInDecayLambda`], a pure multiplier of the
//! step index. [`lambda::LambdaScheduler`] scales a base learning rate with it, and
//! [`training::ScheduledOptimizer`] binds the schedule to an SGD or Adam optimizer built
//! from [`options::TrainingOptions`] by the functions in [`factory`].
pub mod common;
pub mod factory;
pub mod optimizer;
pub mod options;
pub mod scheduler;
pub mod state_io;
pub mod training;

pub use common::*;
pub use optimizer::*;
pub use scheduler::*;

pub use common::matrix::DenseMatrix;

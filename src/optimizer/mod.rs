pub mod adam;
pub mod sgd;

use crate::common::matrix::DenseMatrix;

/// A gradient-update algorithm holding per-parameter state.
///
/// `params` and `grads` are parallel slices: block `i` of `grads` is the gradient of
/// block `i` of `params` and has the same shape.
#[typetag::serde]
pub trait Optimizer: OptimizerClone + Send + Sync {
    fn initialize(&mut self, params: &[DenseMatrix]);
    fn update(&mut self, params: &mut [DenseMatrix], grads: &[DenseMatrix]);
    fn update_learning_rate(&mut self, learning_rate: f32);
    fn learning_rate(&self) -> f32;
}

pub trait OptimizerClone {
    fn clone_box(&self) -> Box<dyn Optimizer>;
}

impl<T> OptimizerClone for T
where
    T: 'static + Optimizer + Clone,
{
    fn clone_box(&self) -> Box<dyn Optimizer> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn Optimizer> {
    fn clone(&self) -> Box<dyn Optimizer> {
        self.clone_box()
    }
}

/// Immutable optimizer settings that can spawn fresh optimizer state.
#[typetag::serde]
pub trait OptimizerConfig: OptimizerConfigClone + Send + Sync {
    fn create_optimizer(&self) -> Box<dyn Optimizer>;
    fn update_learning_rate(&mut self, learning_rate: f32);
    fn learning_rate(&self) -> f32;
}

pub trait OptimizerConfigClone {
    fn clone_box(&self) -> Box<dyn OptimizerConfig>;
}

impl<T> OptimizerConfigClone for T
where
    T: 'static + OptimizerConfig + Clone,
{
    fn clone_box(&self) -> Box<dyn OptimizerConfig> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn OptimizerConfig> {
    fn clone(&self) -> Box<dyn OptimizerConfig> {
        self.clone_box()
    }
}

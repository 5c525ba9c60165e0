pub mod burn_in;
pub mod lambda;

/// A step-dependent learning-rate multiplier.
///
/// Implementations are pure functions of their configuration and the step index:
/// the scheduler driving them multiplies the result into a fixed base learning rate
/// once per optimizer step.
#[typetag::serde]
pub trait LearningRateLambda: LearningRateLambdaClone + Send + Sync {
    fn evaluate(&self, step: i64) -> f64;
}

pub trait LearningRateLambdaClone {
    fn clone_box(&self) -> Box<dyn LearningRateLambda>;
}

impl<T> LearningRateLambdaClone for T
where
    T: 'static + LearningRateLambda + Clone,
{
    fn clone_box(&self) -> Box<dyn LearningRateLambda> {
        Box::new(self.clone())
    }
}

impl Clone for Box<dyn LearningRateLambda> {
    fn clone(&self) -> Box<dyn LearningRateLambda> {
        self.clone_box()
    }
}

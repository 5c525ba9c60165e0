use burnin::{
    factory::factory_training,
    matrix::DenseMatrix,
    options::TrainingOptions,
    state_io::{StateIO, JSON},
};
use env_logger::{Builder, Target};
use log::info;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::env;
use std::error::Error;

const EXP_NAME: &str = "warmup_decay";
const SAMPLES: usize = 256;
const BATCH_SIZE: usize = 16;
const EPOCHS: usize = 12;

// This example fits y = 3x - 2 with a scheduled optimizer.
// The learning rate warms up over the first epochs and is decayed twice later on.
// Pass a JSON options file as the first argument to override the defaults used here,
// and set LOG=debug to see the learning rate of every step.
fn main() -> Result<(), Box<dyn Error>> {
    initialize_logger();

    let options = match env::args().nth(1) {
        Some(path) => TrainingOptions::from_json_file(path)?,
        None => demo_options(),
    };
    info!("Training options:\n{}", options.to_json_string()?);

    let (inputs, targets) = samples(42)?;
    let batches_per_epoch = SAMPLES / BATCH_SIZE;

    let mut scheduled = factory_training(&options, batches_per_epoch)?;
    let mut params = vec![DenseMatrix::zeros(1, 1), DenseMatrix::zeros(1, 1)];
    scheduled.initialize(&params);

    for epoch in 1..=EPOCHS {
        let mut epoch_loss = 0.0;
        let mut epoch_lr = 0.0;
        for batch in 0..batches_per_epoch {
            let range = batch * BATCH_SIZE..(batch + 1) * BATCH_SIZE;
            let (loss, grads) = mse_gradients(&params, &inputs[range.clone()], &targets[range]);
            epoch_loss += loss;
            epoch_lr = scheduled.step(&mut params, &grads);
        }
        info!(
            "Epoch [{}/{}], Loss:{:.5}, lr:{:.2e}, w:{:.4}, b:{:.4}",
            epoch,
            EPOCHS,
            epoch_loss / batches_per_epoch as f32,
            epoch_lr,
            params[0].at(0, 0),
            params[1].at(0, 0)
        );
    }

    JSON::default()
        .directory(EXP_NAME)
        .file_name(EXP_NAME)
        .build()?
        .save(&scheduled)?;
    info!("Training state saved after {} steps", scheduled.current_step());
    Ok(())
}

fn demo_options() -> TrainingOptions {
    let mut options = TrainingOptions::default();
    options.optimizer.lr = 0.1;
    options.schedule.lr_burn_in_epochs = 2.0;
    options.schedule.lr_burn_in_factor = 0.01;
    options.schedule.lr_decay = vec![6.0, 9.0];
    options
}

fn samples(seed: u64) -> Result<(Vec<f32>, Vec<f32>), Box<dyn Error>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0f32, 0.1)?;
    let inputs: Vec<f32> = (0..SAMPLES).map(|_| rng.random_range(-1.0..1.0)).collect();
    let targets = inputs.iter().map(|x| 3.0 * x - 2.0 + noise.sample(&mut rng)).collect();
    Ok((inputs, targets))
}

// Mean squared error of y = w * x + b and its gradients with respect to w and b.
fn mse_gradients(params: &[DenseMatrix], inputs: &[f32], targets: &[f32]) -> (f32, Vec<DenseMatrix>) {
    let (w, b) = (params[0].at(0, 0), params[1].at(0, 0));
    let n = inputs.len() as f32;
    let (mut loss, mut d_w, mut d_b) = (0.0, 0.0, 0.0);
    for (x, y) in inputs.iter().zip(targets.iter()) {
        let error = w * x + b - y;
        loss += error * error / n;
        d_w += 2.0 * error * x / n;
        d_b += 2.0 * error / n;
    }
    (loss, vec![DenseMatrix::new(1, 1, &[d_w]), DenseMatrix::new(1, 1, &[d_b])])
}

fn initialize_logger() {
    let log_level = env::var("LOG").unwrap_or_else(|_| "info".to_string());
    Builder::new()
        .target(Target::Stderr)
        .parse_filters(&log_level)
        .init();
}

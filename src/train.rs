use rand::Rng;
use log::info;

use crate::{
  ops::Hops,
  optimize::{ Optimizer, Adam },
  instrument::Instrumentation,
  model::MiniMlp,
  Tensor,
};


/// Literal constants of a training run.

#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
  pub epochs: usize,
  pub learning_rate: f32,
  pub batch_size: usize,
}

impl Default for TrainConfig {
  fn default() -> Self {
    Self {
      epochs: 5,
      learning_rate: 0.01,
      batch_size: 16,
    }
  }
}

impl TrainConfig {
  pub fn epochs(epochs: usize) -> Self {
    Self { epochs, ..Self::default() }
  }
}


/// Fit the model to freshly sampled noise for a fixed number of epochs,
/// using Adam and mean squared error.
///
/// The gradient flowing into the model output gets recorded as `"output"`.
/// Returns the loss of every epoch.

pub fn train<R: Rng>(
  model: &MiniMlp,
  config: &TrainConfig,
  instrumentation: &Instrumentation,
  rng: &mut R,
) -> Vec<f32> {
  info!("training for {} epochs with batch size {}", config.epochs, config.batch_size);
  let params = model.parameters();
  let mut optimizer = Optimizer::new(config.learning_rate, Adam::default());
  let mut losses = Vec::with_capacity(config.epochs);

  for epoch in 0..config.epochs {
    let inputs = Tensor::randn_with(&[config.batch_size, MiniMlp::INPUTS], rng).tracked();
    let targets = Tensor::randn_with(&[config.batch_size, MiniMlp::OUTPUTS], rng).tracked();

    let output = model.run(&inputs);
    output.register_hook(instrumentation.gradient_probe("output"));

    let loss = output.mse(&targets);
    let value = loss.item();
    instrumentation.console().line(format!("\nEpoch {}, Loss = {:.4}", epoch + 1, value));

    optimizer.minimize(&loss, &params);
    losses.push(value);
  }

  info!("training finished after {} optimizer steps", optimizer.step() - 1);
  losses
}

use rand::Rng;

use crate::{ ops::RealOps, Linear, Variable };


/// Two-layer perceptron with a ReLU in between.
///
/// Maps `[batch, 20]` inputs to `[batch, 1]` outputs.

#[derive(Debug)]
pub struct MiniMlp {
  pub fc1: Linear<f32>,
  pub fc2: Linear<f32>,
}

impl MiniMlp {
  pub const INPUTS: usize = 20;
  pub const HIDDEN: usize = 64;
  pub const OUTPUTS: usize = 1;

  pub fn new() -> Self {
    Self::with_rng(&mut rand::thread_rng())
  }

  pub fn with_rng<R: Rng>(rng: &mut R) -> Self {
    Self {
      fc1: Linear::with_rng(Self::INPUTS, Self::HIDDEN, rng),
      fc2: Linear::with_rng(Self::HIDDEN, Self::OUTPUTS, rng),
    }
  }

  pub fn run(&self, input: &Variable<f32>) -> Variable<f32> {
    let hidden = self.fc1.run(input).relu();
    self.fc2.run(&hidden)
  }

  pub fn parameters(&self) -> Vec<Variable<f32>> {
    [self.fc1.parameters(), self.fc2.parameters()].concat()
  }
}

impl Default for MiniMlp {
  fn default() -> Self {
    Self::new()
  }
}

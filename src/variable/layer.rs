use rand::Rng;

use crate::{
  ops::{ BaseOps, NumericOps },
  scalar::Real,
  variable::{ Variable, ForwardHook },
  Tensor,
};


/// Fully connected layer computing `input · weights + bias`.
///
/// Weights have shape `[input_size, size]`, so inputs are expected
/// as rows of a `[batch, input_size]` matrix.

pub struct Linear<T: Real> {
  pub weights: Variable<T>,
  pub bias: Variable<T>,
  hooks: Vec<Box<dyn ForwardHook<T>>>,
}

impl<T: Real> Linear<T> {
  pub fn new(input_size: usize, size: usize) -> Self {
    Self::with_rng(input_size, size, &mut rand::thread_rng())
  }

  /// Initialize weights and bias uniformly within `±1/sqrt(input_size)`.

  pub fn with_rng<R: Rng>(input_size: usize, size: usize, rng: &mut R) -> Self {
    let bound = T::one() / T::from(input_size).unwrap().sqrt();
    Self {
      weights: Tensor::uniform_with(&[input_size, size], -bound, bound, rng).trained(),
      bias: Tensor::uniform_with(&[size], -bound, bound, rng).trained(),
      hooks: vec![],
    }
  }

  pub fn input_size(&self) -> usize {
    self.weights.shape()[0]
  }

  pub fn size(&self) -> usize {
    self.weights.shape()[1]
  }

  /// Observe this layer's output on every subsequent run.
  /// Hooks get called in the order they were registered.

  pub fn register_forward_hook(&mut self, hook: impl ForwardHook<T> + 'static) {
    self.hooks.push(Box::new(hook));
  }

  pub fn num_hooks(&self) -> usize {
    self.hooks.len()
  }

  pub fn run(&self, input: &Variable<T>) -> Variable<T> {
    let output = input.mm(&self.weights) + &self.bias;
    for hook in &self.hooks {
      hook.on_forward(input.tensor(), output.tensor());
    }
    output
  }

  pub fn parameters(&self) -> Vec<Variable<T>> {
    vec![self.weights.clone(), self.bias.clone()]
  }
}

impl<T: Real> std::fmt::Debug for Linear<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.debug_struct("Linear")
      .field("input_size", &self.input_size())
      .field("size", &self.size())
      .field("hooks", &self.hooks.len())
      .finish()
  }
}

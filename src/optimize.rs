use std::collections::HashMap;

use log::debug;

use crate::{
  scalar::Real,
  tensor::Tensor,
  variable::Variable,
  ops::{ BaseOps, Hops },
};


/// An optimization strategy to be used with [Optimizer].

pub trait Strategy<R: Real> {
  fn update(&mut self, param: &Variable<R>, grad: &Tensor<R>, rate: R, step: usize) -> Tensor<R>;
}


/// Generic optimizer that allows for several optimization [strategies](Strategy) to be used.

#[derive(Debug)]
pub struct Optimizer<R: Real, S: Strategy<R>> {
  strategy: S,
  pub learning_rate: R,
  step: usize,
}

impl<R: Real, S: Strategy<R>> Optimizer<R, S> {
  pub fn new(learning_rate: R, strategy: S) -> Self {
    Self { strategy, learning_rate, step: 1 }
  }

  pub fn step(&self) -> usize {
    self.step
  }

  /// Back-propagate the loss, update all given parameters
  /// and reset gradients across the loss's graph.

  pub fn minimize(&mut self, loss: &Variable<R>, params: &[Variable<R>]) {
    // Compute gradients
    loss.backward();

    // Optimize individual parameters
    for param in params {
      let Some(grad) = param.grad() else {
        panic!("Non-trainable parameters cannot be optimized")
      };

      // Execute strategy
      let change = self.strategy.update(param, grad, self.learning_rate, self.step);

      // Apply change
      let weights = param.tensor();
      weights.assign(&(weights + &change));
    }
    debug!("optimizer step {} updated {} parameters", self.step, params.len());

    // Reset gradients
    loss.reset();

    self.step += 1;
  }
}


/// Stochastic Gradient Descent strategy

#[derive(Debug, Clone, Default)]
pub struct SGD;

impl<R: Real> Strategy<R> for SGD {
  fn update(&mut self, _param: &Variable<R>, grad: &Tensor<R>, rate: R, _step: usize) -> Tensor<R> {
    grad * -rate
  }
}


/// Adaptive Movement Estimation strategy (ADAM)

#[derive(Debug, Clone)]
pub struct Adam<R: Real> {
  pub beta1: R,
  pub beta2: R,
  pub epsilon: R,
  m: HashMap<usize, Tensor<R>>,
  v: HashMap<usize, Tensor<R>>,
}

impl<R: Real> Adam<R> {
  pub fn new(beta1: R, beta2: R) -> Self {
    Self {
      beta1,
      beta2,
      epsilon: R::from(1e-8).unwrap(),
      m: HashMap::new(),
      v: HashMap::new(),
    }
  }
}

impl<R: Real> Default for Adam<R> {
  fn default() -> Self {
    Self::new(R::from(0.9).unwrap(), R::from(0.999).unwrap())
  }
}

impl<R: Real> Strategy<R> for Adam<R> {
  fn update(&mut self, param: &Variable<R>, grad: &Tensor<R>, rate: R, step: usize) -> Tensor<R> {
    let id = param.id();
    let dims = &param.tensor().shape().dims;
    let m = self.m.entry(id).or_insert_with(|| Tensor::zeros(dims) );
    m.assign(&(&*m * self.beta1 + grad * (R::one() - self.beta1)));
    let v = self.v.entry(id).or_insert_with(|| Tensor::zeros(dims) );
    v.assign(&(&*v * self.beta2 + grad.sqr() * (R::one() - self.beta2)));
    let step = R::from(step).unwrap();
    let mt = &self.m[&id] / (R::one() - self.beta1.powf(step));
    let vt = &self.v[&id] / (R::one() - self.beta2.powf(step));
    mt * -rate / (vt.sqrt() + self.epsilon)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::ops::NumericOps;

  #[test]
  fn sgd_step() {
    let w = Tensor::<f64>::vec(&[1.0, -1.0]).trained();
    let mut optimizer = Optimizer::new(0.5, SGD);
    let loss = w.sqr().sum();
    optimizer.minimize(&loss, &loss.parameters());
    // d/dw w^2 = 2w
    assert_eq!(w.tensor(), &Tensor::vec(&[0.0, 0.0]));
    assert_eq!(w.grad(), Some(&Tensor::vec(&[0.0, 0.0])));
    assert_eq!(optimizer.step(), 2);
  }

  #[test]
  fn adam_first_step_moves_by_rate() {
    let w = Tensor::<f64>::vec(&[3.0, -2.0]).trained();
    let mut optimizer = Optimizer::new(0.01, Adam::default());
    let loss = w.sqr().sum();
    optimizer.minimize(&loss, &[w.clone()]);
    // Bias correction makes the first update exactly -rate * sign(grad)
    let moved = w.tensor().to_vec();
    assert!((moved[0] - 2.99).abs() < 1e-6);
    assert!((moved[1] + 1.99).abs() < 1e-6);
  }

  #[test]
  fn adam_minimizes_quadratic() {
    let w = Tensor::<f64>::vec(&[3.0, -2.0]).trained();
    let mut optimizer = Optimizer::new(0.1, Adam::default());
    for _ in 0..300 {
      let loss = (&w - 1.0).sqr().sum();
      optimizer.minimize(&loss, &[w.clone()]);
    }
    for value in w.tensor().to_vec() {
      assert!((value - 1.0).abs() < 0.05, "value was {value}");
    }
  }

  #[test]
  #[should_panic(expected = "Non-trainable")]
  fn refuses_constants() {
    let w = Tensor::<f64>::vec(&[1.0]).trained();
    let c = Tensor::<f64>::vec(&[1.0]).tracked();
    let loss = (&w * &c).sum();
    Optimizer::new(0.1, SGD).minimize(&loss, &[c]);
  }
}

use crate::{
  scalar::Real,
  tensor::Tensor,
};


/// Observer that gets handed the gradient of a [Variable](crate::Variable)
/// during back-propagation, once it has been fully accumulated.
///
/// Hooks only ever see a shared reference, so they cannot alter
/// the gradient that continues to flow through the graph.

pub trait GradHook<T: Real> {
  fn on_gradient(&self, grad: &Tensor<T>);
}

impl<T: Real, F: Fn(&Tensor<T>)> GradHook<T> for F {
  fn on_gradient(&self, grad: &Tensor<T>) {
    self(grad)
  }
}


/// Observer that gets called right after a [Linear](crate::Linear) layer
/// has computed its output.

pub trait ForwardHook<T: Real> {
  fn on_forward(&self, input: &Tensor<T>, output: &Tensor<T>);
}

impl<T: Real, F: Fn(&Tensor<T>, &Tensor<T>)> ForwardHook<T> for F {
  fn on_forward(&self, input: &Tensor<T>, output: &Tensor<T>) {
    self(input, output)
  }
}

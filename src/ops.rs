use crate::Shape;
use crate::scalar::{ Inner, Numeric, Real };


/// Low-level compute operations.
///
/// Implemented for each concrete float type, so the fastest
/// available kernel can be chosen per type.

pub trait Cops: Sized {
  /// Multiply a row-major `[m, k]` matrix with a row-major `[k, n]` matrix.
  fn matmul(lhs: &[Self], rhs: &[Self], m: usize, k: usize, n: usize) -> Vec<Self>;
}


/// Differentiable mid-level operations that are also implemented
/// for non-differentiable [Inner] types.

pub trait BaseOps<I: Inner>: Clone {
  fn scalar(item: I) -> Self;
  fn shape(&self) -> &Shape;
  fn reshape(&self, dims: &[usize]) -> Self;
  fn transpose(&self) -> Self;
}


/// Differentiable mid-level operations that are also implemented
/// for non-differentiable [Numeric] inner types.

pub trait NumericOps<I: Numeric>: Sized {
  /// Sum of all elements, as a scalar.
  fn sum(&self) -> Self;
  fn mm(&self, rhs: &Self) -> Self;
}


/// Differentiable mid-level operations.

pub trait RealOps<I: Real> {
  fn powf(&self, exp: I) -> Self;
  fn relu(&self) -> Self;
}


/// High-level operations, implemented exclusively on top of
/// Mops and other Hops. As a result, these are all
/// differentiable when called on a [Variable](crate::Variable).

pub trait Hops<I>: BaseOps<I> + NumericOps<I> + RealOps<I>
where
  I: Real,
  for<'a> &'a Self: std::ops::Sub<&'a Self, Output = Self> + std::ops::Mul<I, Output = Self>,
{
  fn sqr(&self) -> Self {
    self.powf(I::from(2.0).unwrap())
  }

  fn sqrt(&self) -> Self {
    self.powf(I::from(0.5).unwrap())
  }

  fn flatten(&self) -> Self {
    self.reshape(&[self.shape().size()])
  }

  fn mean(&self) -> Self {
    let n = I::from(self.shape().size()).unwrap();
    &self.sum() * (I::one() / n)
  }

  /// Mean squared error between predictions and targets.

  fn mse(&self, target: &Self) -> Self {
    (self - target).sqr().mean()
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::Tensor;

  #[test]
  fn mean() {
    let a = Tensor::<f64>::new(&[3,2], vec![1., 2., 3., 4., 5., 6.]).trained();
    assert!((a.mean().item() - 3.5).abs() < 1e-9);
  }

  #[test]
  fn mse() {
    let pred = Tensor::<f64>::vec(&[1.0, 2.0, 3.0]);
    let target = Tensor::<f64>::vec(&[1.0, 0.0, 0.0]);
    assert!((pred.mse(&target).item() - 13.0 / 3.0).abs() < 1e-9);
  }

  #[test]
  fn flatten() {
    let a = Tensor::<f32>::zeros(&[16, 64]).flatten();
    assert_eq!(a.shape().dims, vec![1024]);
  }
}

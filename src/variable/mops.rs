use crate::{
  shape::Shape,
  tensor::Tensor,
  variable::{ Variable, BinaryOp, UnaryOp },
  scalar::Real,
  ops::{ BaseOps, NumericOps, RealOps },
};


impl<T: Real> BaseOps<T> for Variable<T> {
  fn scalar(item: T) -> Self {
    Self::from_tensor(Tensor::scalar(item), false)
  }

  fn shape(&self) -> &Shape {
    self.node.data.shape()
  }

  fn reshape(&self, dims: &[usize]) -> Self {
    self.unary_op(Reshape { dims: dims.to_vec() })
  }

  fn transpose(&self) -> Self {
    self.unary_op(Transpose)
  }
}

impl<T: Real> NumericOps<T> for Variable<T> {
  fn sum(&self) -> Variable<T> {
    self.unary_op(Sum)
  }

  fn mm(&self, rhs: &Self) -> Self {
    self.binary_op(MatMul, rhs)
  }
}

impl<T: Real> RealOps<T> for Variable<T> {
  fn powf(&self, exp: T) -> Variable<T> {
    self.unary_op(Powf { exp })
  }

  fn relu(&self) -> Variable<T> {
    self.unary_op(ReLU)
  }
}

impl<T: Real> std::ops::Neg for &Variable<T> {
  type Output = Variable<T>;

  fn neg(self) -> Self::Output {
    self * -T::one()
  }
}

impl<T: Real> std::ops::Neg for Variable<T> {
  type Output = Variable<T>;

  fn neg(self) -> Self::Output {
    -&self
  }
}


macro_rules! add_operator {
  ($op:ident, $meth:ident, $symbol:tt) => {
    impl<T: Real> std::ops::$op for &Variable<T> { // &tensor * &other
      type Output = Variable<T>;

      fn $meth(self, rhs: Self) -> Variable<T> {
        self.binary_op($op, rhs)
      }
    }

    impl<T: Real> std::ops::$op for Variable<T> { // tensor * other
      type Output = Variable<T>;

      fn $meth(self, rhs: Self) -> Variable<T> {
        &self $symbol &rhs
      }
    }

    impl<T: Real> std::ops::$op<Variable<T>> for &Variable<T> { // &tensor * other
      type Output = Variable<T>;

      fn $meth(self, rhs: Variable<T>) -> Variable<T> {
        self $symbol &rhs
      }
    }

    impl<T: Real> std::ops::$op<&Variable<T>> for Variable<T> { // tensor * &other
      type Output = Variable<T>;

      fn $meth(self, rhs: &Variable<T>) -> Variable<T> {
        &self $symbol rhs
      }
    }

    impl<T: Real> std::ops::$op<T> for &Variable<T> { // &tensor * T
      type Output = Variable<T>;

      fn $meth(self, rhs: T) -> Variable<T> {
        self $symbol &Variable::scalar(rhs)
      }
    }

    impl<T: Real> std::ops::$op<T> for Variable<T> { // tensor * T
      type Output = Variable<T>;

      fn $meth(self, rhs: T) -> Variable<T> {
        &self $symbol &Variable::scalar(rhs)
      }
    }
  };
}

add_operator!(Add, add, +);
add_operator!(Sub, sub, -);
add_operator!(Mul, mul, *);
add_operator!(Div, div, /);


#[derive(Debug, Clone)]
pub struct Add;

impl<T: Real> BinaryOp<T> for Add {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs + rhs
  }

  fn derive(&self, lhs: &Tensor<T>, rhs: &Tensor<T>, grad: &Tensor<T>) -> (Tensor<T>, Tensor<T>)
  {(
    grad.sum_to(lhs.shape()),
    grad.sum_to(rhs.shape()),
  )}
}


#[derive(Debug, Clone)]
pub struct Sub;

impl<T: Real> BinaryOp<T> for Sub {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs - rhs
  }

  fn derive(&self, lhs: &Tensor<T>, rhs: &Tensor<T>, grad: &Tensor<T>) -> (Tensor<T>, Tensor<T>)
  {(
    grad.sum_to(lhs.shape()),
    (-grad).sum_to(rhs.shape()),
  )}
}


#[derive(Debug, Clone)]
pub struct Mul;

impl<T: Real> BinaryOp<T> for Mul {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs * rhs
  }

  fn derive(&self, lhs: &Tensor<T>, rhs: &Tensor<T>, grad: &Tensor<T>) -> (Tensor<T>, Tensor<T>)
  {(
    (grad * rhs).sum_to(lhs.shape()),
    (grad * lhs).sum_to(rhs.shape()),
  )}
}


#[derive(Debug, Clone)]
pub struct Div;

impl<T: Real> BinaryOp<T> for Div {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs / rhs
  }

  fn derive(&self, lhs: &Tensor<T>, rhs: &Tensor<T>, grad: &Tensor<T>) -> (Tensor<T>, Tensor<T>)
  {(
    (grad / rhs).sum_to(lhs.shape()),
    (-grad * lhs / rhs / rhs).sum_to(rhs.shape()),
  )}
}


#[derive(Debug, Clone)]
pub struct MatMul;

impl<T: Real> BinaryOp<T> for MatMul {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T> {
    lhs.mm(rhs)
  }

  fn derive(&self, lhs: &Tensor<T>, rhs: &Tensor<T>, grad: &Tensor<T>) -> (Tensor<T>, Tensor<T>)
  {(
    grad.mm(&rhs.transpose()),
    lhs.transpose().mm(grad),
  )}
}


#[derive(Debug, Clone)]
pub struct Transpose;

impl<T: Real> UnaryOp<T> for Transpose {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.transpose()
  }

  fn derive(&self, _lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    grad.transpose()
  }
}


#[derive(Debug, Clone)]
pub struct Reshape {
  dims: Vec<usize>,
}

impl<T: Real> UnaryOp<T> for Reshape {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.detach().reshape(&self.dims)
  }

  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    grad.detach().reshape(&lhs.shape().dims)
  }
}


#[derive(Debug, Clone)]
pub struct Sum;

impl<T: Real> UnaryOp<T> for Sum {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.sum()
  }

  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    Tensor::fill(&lhs.shape().dims, grad.item())
  }
}


#[derive(Debug, Clone)]
pub struct Powf<T: Real> {
  exp: T,
}

impl<T: Real> UnaryOp<T> for Powf<T> {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.powf(self.exp)
  }

  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    grad * &(lhs.powf(self.exp - T::one()) * self.exp)
  }
}


#[derive(Debug, Clone)]
pub struct ReLU;

impl<T: Real> UnaryOp<T> for ReLU {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T> {
    lhs.relu()
  }

  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T> {
    grad * &lhs.gt(&Tensor::scalar(T::zero())).numeric()
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::ops::Hops;

  #[test]
  fn powf_gradients() {
    let error = Variable::check_gradients(&Tensor::<f64>::vec(&[0.5, 1.5, 3.0]), |x| x.powf(3.0) );
    assert!(error < 1e-5, "error was {error}");
    let x = Tensor::<f32>::vec(&[2.0]).trained();
    x.sqr().sum().backward();
    assert_eq!(x.grad(), Some(&Tensor::<f32>::vec(&[4.0])));
  }

  #[test]
  fn relu_blocks_negative_gradients() {
    let x = Tensor::<f64>::vec(&[-1.0, 0.5, 2.0]).trained();
    x.relu().sum().backward();
    assert_eq!(x.grad(), Some(&Tensor::<f64>::vec(&[0.0, 1.0, 1.0])));
  }

  #[test]
  fn bias_gradient_sums_over_batch() {
    let x = Tensor::<f64>::new(&[3, 2], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).tracked();
    let b = Tensor::<f64>::vec(&[0.0, 0.0]).trained();
    (&x + &b).sum().backward();
    assert_eq!(b.grad(), Some(&Tensor::<f64>::vec(&[3.0, 3.0])));
  }

  #[test]
  fn matmul_gradient_shapes() {
    let x = Tensor::<f64>::ones(&[16, 20]).tracked();
    let w = Tensor::<f64>::ones(&[20, 64]).trained();
    let out = x.mm(&w);
    assert_eq!(out.shape().dims, vec![16, 64]);
    out.sum().backward();
    assert_eq!(w.grad().unwrap().shape().dims, vec![20, 64]);
    assert_eq!(w.grad().unwrap().raw()[0], 16.0);
  }

  #[test]
  fn division() {
    let error = Variable::check_gradients(&Tensor::<f64>::vec(&[1.0, 2.0, 4.0]), |x| {
      x / &(x + 1.0)
    });
    assert!(error < 1e-6, "error was {error}");
  }

  #[test]
  fn reshape_and_transpose() {
    let error = Variable::check_gradients(&Tensor::<f64>::arrange(&[2, 3], 0.5, 0.5), |x| {
      x.transpose().reshape(&[6]).sqr()
    });
    assert!(error < 1e-6, "error was {error}");
  }
}

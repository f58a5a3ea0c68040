use crate::{
  shape::Shape,
  tensor::Tensor,
  scalar::{ Inner, Numeric, Real },
  ops::{ BaseOps, NumericOps, RealOps },
};


impl<T: Inner> BaseOps<T> for Tensor<T> {
  fn scalar(item: T) -> Self {
    Self::new(&[], vec![item])
  }

  fn shape(&self) -> &Shape {
    &self.shape
  }

  fn reshape(&self, dims: &[usize]) -> Self {
    self.view(dims)
  }

  fn transpose(&self) -> Self {
    let shape = self.shape.transpose();
    let (rows, cols) = (shape[1], shape[0]);
    let data = self.raw();
    let data = &data[..];
    let transposed = (0..cols)
      .flat_map(|j| (0..rows).map(move |i| data[i * cols + j] ))
      .collect();
    Self::from_shape(shape, transposed)
  }
}

impl<T: Real> NumericOps<T> for Tensor<T> {
  fn sum(&self) -> Self {
    Self::scalar(self.raw().iter().copied().sum())
  }

  fn mm(&self, rhs: &Self) -> Self {
    assert!(self.rank() == 2 && rhs.rank() == 2,
      "Cannot multiply {} by {} tensor. Both need to be matrices", self.shape, rhs.shape);
    let (m, k) = (self.shape[0], self.shape[1]);
    let n = rhs.shape[1];
    assert_eq!(k, rhs.shape[0],
      "Cannot multiply {} by {} matrix", self.shape, rhs.shape);
    let data = T::matmul(&self.raw(), &rhs.raw(), m, k, n);
    Self::new(&[m, n], data)
  }
}

impl<T: Real> RealOps<T> for Tensor<T> {
  fn powf(&self, exp: T) -> Self {
    self.vectorize(|a| a.powf(exp) )
  }

  fn relu(&self) -> Self {
    self.vectorize(|a| if a > T::zero() { a } else { T::zero() })
  }
}


macro_rules! add_operator {
  ($op:ident, $meth:ident, $symbol:tt) => {
    impl<T: Numeric> std::ops::$op for &Tensor<T> { // &tensor * &other
      type Output = Tensor<T>;

      fn $meth(self, rhs: Self) -> Tensor<T> {
        self.zip(rhs, |a, b| a $symbol b )
      }
    }

    impl<T: Numeric> std::ops::$op for Tensor<T> { // tensor * other
      type Output = Tensor<T>;

      fn $meth(self, rhs: Self) -> Tensor<T> {
        &self $symbol &rhs
      }
    }

    impl<T: Numeric> std::ops::$op<Tensor<T>> for &Tensor<T> { // &tensor * other
      type Output = Tensor<T>;

      fn $meth(self, rhs: Tensor<T>) -> Tensor<T> {
        self $symbol &rhs
      }
    }

    impl<T: Numeric> std::ops::$op<&Tensor<T>> for Tensor<T> { // tensor * &other
      type Output = Tensor<T>;

      fn $meth(self, rhs: &Tensor<T>) -> Tensor<T> {
        &self $symbol rhs
      }
    }

    impl<T: Numeric> std::ops::$op<T> for &Tensor<T> { // &tensor * T
      type Output = Tensor<T>;

      fn $meth(self, rhs: T) -> Tensor<T> {
        self.vectorize(|a| a $symbol rhs )
      }
    }

    impl<T: Numeric> std::ops::$op<T> for Tensor<T> { // tensor * T
      type Output = Tensor<T>;

      fn $meth(self, rhs: T) -> Tensor<T> {
        &self $symbol rhs
      }
    }
  };
}

add_operator!(Add, add, +);
add_operator!(Sub, sub, -);
add_operator!(Mul, mul, *);
add_operator!(Div, div, /);

impl<T: Real> std::ops::Neg for &Tensor<T> {
  type Output = Tensor<T>;

  fn neg(self) -> Tensor<T> {
    self.vectorize(|a| -a )
  }
}

impl<T: Real> std::ops::Neg for Tensor<T> {
  type Output = Tensor<T>;

  fn neg(self) -> Tensor<T> {
    -&self
  }
}

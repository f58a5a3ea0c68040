use crate::{
  scalar::Numeric,
  ops::Cops,
};

#[cfg(feature = "rayon")]
use rayon::prelude::*;


// Fallback kernel, used when the accelerated one is disabled

#[allow(dead_code)]
fn matmul_generic<T: Numeric + Send + Sync>(lhs: &[T], rhs: &[T], m: usize, k: usize, n: usize) -> Vec<T> {
  let mut data = vec![T::zero(); m * n];
  let row = |(i, out): (usize, &mut [T])| {
    for j in 0..n {
      for l in 0..k {
        out[j] += lhs[i * k + l] * rhs[l * n + j];
      }
    }
  };
  if n == 0 { return data }
  #[cfg(feature = "rayon")]
  data.par_chunks_mut(n).enumerate().for_each(row);
  #[cfg(not(feature = "rayon"))]
  data.chunks_mut(n).enumerate().for_each(row);
  data
}

macro_rules! impl_cops {
  ($type:ty, $gemm:ident) => {
    impl Cops for $type {
      #[cfg(feature = "unsafe")]
      fn matmul(lhs: &[Self], rhs: &[Self], m: usize, k: usize, n: usize) -> Vec<Self> {
        debug_assert_eq!(lhs.len(), m * k);
        debug_assert_eq!(rhs.len(), k * n);
        let mut data = vec![0.0; m * n];
        unsafe {
          matrixmultiply::$gemm(
            m,
            k,
            n,
            1.0,
            lhs.as_ptr(),
            k as isize,
            1,
            rhs.as_ptr(),
            n as isize,
            1,
            0.0,
            data.as_mut_ptr(),
            n as isize,
            1,
          );
        }
        data
      }

      #[cfg(not(feature = "unsafe"))]
      fn matmul(lhs: &[Self], rhs: &[Self], m: usize, k: usize, n: usize) -> Vec<Self> {
        matmul_generic(lhs, rhs, m, k, n)
      }
    }
  };
}

impl_cops!(f32, sgemm);
impl_cops!(f64, dgemm);


#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ Tensor, ops::NumericOps };

  #[test]
  fn matmul() {
    let x = Tensor::new(&[2,3], vec![1., 2., 3., 4., 5., 6.]);
    let y = Tensor::new(&[3,2], vec![1., 2., 3., 4., 5., 6.]);
    assert_eq!(x.mm(&y), Tensor::new(&[2,2], vec![22., 28., 49., 64.]));
  }

  #[test]
  fn matmul_vector() {
    let x = Tensor::new(&[2,3], vec![1., 2., 3., 4., 5., 6.]);
    let y = Tensor::new(&[3,1], vec![1., 2., 3.]);
    assert_eq!(x.mm(&y), Tensor::new(&[2,1], vec![14., 32.]));
  }

  #[test]
  fn generic_kernel_agrees() {
    let lhs = [1, 2, 3, 4, 5, 6];
    let rhs = [1, 2, 3, 4, 5, 6];
    assert_eq!(matmul_generic(&lhs, &rhs, 2, 3, 2), vec![22, 28, 49, 64]);
    assert_eq!(f32::matmul(&[1., 2.], &[3., 4.], 1, 2, 1), vec![11.]);
  }

  #[test]
  #[should_panic(expected = "Cannot multiply")]
  fn shape_mismatch() {
    let x = Tensor::<f32>::zeros(&[16, 21]);
    let w = Tensor::<f32>::zeros(&[20, 64]);
    x.mm(&w);
  }
}

use itertools::Itertools;

use crate::internal::*;


/// The shape of a [Tensor](crate::Tensor).
///
/// Tensors are always stored contiguously in row-major order,
/// so a list of dimensions is all there is to it.

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
  pub dims: Vec<usize>,
}

impl Shape {
  pub fn new(dims: &[usize]) -> Self {
    Self { dims: dims.to_vec() }
  }

  pub fn size(&self) -> usize {
    self.dims.iter().product()
  }

  pub fn rank(&self) -> usize {
    self.dims.len()
  }

  pub(crate) fn strides(&self) -> Vec<usize> {
    let mut strides = vec![1; self.rank()];
    for i in (1..self.rank()).rev() {
      strides[i - 1] = self.dims[i] * strides[i];
    }
    strides
  }

  /// Resulting shape when combining two tensors elementwise.
  ///
  /// Dimensions get aligned from the right. Missing dimensions
  /// and dimensions of size one stretch to match the other side.

  pub fn broadcast(&self, rhs: &Self) -> Self {
    let rank = self.rank().max(rhs.rank());
    let dims = (0..rank).map(|i| {
      let a = self.from_right(i);
      let b = rhs.from_right(i);
      assert!(a == b || a == 1 || b == 1,
        "Cannot broadcast {} and {} tensors", self, rhs);
      a.max(b)
    }).collect::<Vec<_>>();
    Self { dims: dims.into_iter().rev().collect() }
  }

  fn from_right(&self, i: usize) -> usize {
    if i < self.rank() { self.dims[self.rank() - 1 - i] } else { 1 }
  }

  /// Storage index into a tensor of this shape for every
  /// element of a larger shape it has been broadcast to.

  pub(crate) fn broadcast_indices(&self, target: &Self) -> Vec<usize> {
    assert!(target.rank() >= self.rank(),
      "Cannot broadcast {} tensor down to {}", self, target);
    let offset = target.rank() - self.rank();
    let strides = self.strides();
    let target_strides = target.strides();
    (0..target.size()).map(|i| {
      (0..self.rank())
        .filter(|&d| self.dims[d] != 1 )
        .map(|d| {
          let t = d + offset;
          let coord = (i / target_strides[t]) % target.dims[t];
          debug_assert!(coord < self.dims[d]);
          coord * strides[d]
        })
        .sum()
    }).collect()
  }

  pub fn transpose(&self) -> Self {
    assert_eq!(self.rank(), 2, "Only matrices can be transposed, got {}", self);
    Self::new(&[self.dims[1], self.dims[0]])
  }

  pub fn view(&self, dims: &[usize]) -> Self {
    let shape = Self::new(dims);
    assert_eq!(shape.size(), self.size(),
      "Cannot view {} tensor as {}", self, shape);
    shape
  }
}

impl std::ops::Index<isize> for Shape {
  type Output = usize;

  fn index(&self, idx: isize) -> &Self::Output {
    &self.dims[negative_index(idx, self.rank())]
  }
}

impl std::fmt::Display for Shape {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "[{}]", self.dims.iter().join(", "))
  }
}

use std::rc::Rc;
use std::cell::{ Ref, RefMut, RefCell };
use std::fmt::Debug;

use rand::Rng;

mod cops;
mod lops;

use crate::{
  internal::*,
  shape::Shape,
  variable::Variable,
  scalar::{ Inner, Numeric, Real },
  ops::Hops,
};


/// Multidimensional array.
///
/// Cloning a tensor is cheap and shares the underlying storage.
/// Use [detach](Tensor::detach) to obtain an independent copy.
///
/// [Real] tensor types can be wrapped in a [Variable] by
/// calling [tracked](Tensor::tracked) or [trained](Tensor::trained).

#[derive(Debug, Clone)]
pub struct Tensor<T: Inner> {
  shape: Shape,
  data: Rc<RefCell<Vec<T>>>,
}

impl<T: Real> Hops<T> for Tensor<T> {}

impl<T: Inner> PartialEq for Tensor<T> {
  fn eq(&self, rhs: &Self) -> bool {
    self.shape == rhs.shape && *self.raw() == *rhs.raw()
  }
}

impl<T: Inner> Tensor<T> {
  pub fn from_shape(shape: Shape, data: Vec<T>) -> Self {
    assert_eq!(shape.size(), data.len(),
      "{} doesn't match data length {}", shape, data.len());
    Self { shape, data: Rc::new(RefCell::new(data)) }
  }

  pub fn new(shape: &[usize], data: Vec<T>) -> Self {
    Self::from_shape(Shape::new(shape), data)
  }

  pub fn vec(vec: &[T]) -> Self {
    Self::new(&[vec.len()], vec.to_vec())
  }

  pub fn fill(shape: &[usize], filler: T) -> Self {
    Self::new(shape, vec![filler; shape.iter().product()])
  }

  pub fn raw(&self) -> Ref<Vec<T>> {
    self.data.borrow()
  }

  pub(crate) fn raw_mut(&self) -> RefMut<Vec<T>> {
    self.data.borrow_mut()
  }

  pub fn to_vec(&self) -> Vec<T> {
    self.raw().clone()
  }

  pub fn size(&self) -> usize {
    self.shape.size()
  }

  pub fn rank(&self) -> usize {
    self.shape.rank()
  }

  pub fn shared_with(&self, other: &Self) -> bool {
    Rc::ptr_eq(&self.data, &other.data)
  }

  /// Overwrite this tensor's contents in place, affecting
  /// every tensor that shares its storage.

  pub fn assign(&self, other: &Self) {
    assert_eq!(self.shape, other.shape,
      "Could not assign {} tensor to {} tensor", other.shape, self.shape);
    if self.shared_with(other) { return }
    self.raw_mut().copy_from_slice(&other.raw());
  }

  pub fn refill(&self, filler: T) {
    for item in self.raw_mut().iter_mut() {
      *item = filler;
    }
  }

  /// Copy this tensor into fresh storage.

  pub fn detach(&self) -> Self {
    Self::new(&self.shape.dims, self.to_vec())
  }

  pub fn view(&self, dims: &[usize]) -> Self {
    let shape = self.shape.view(dims);
    let data = self.data.clone();
    Self { shape, data }
  }

  pub fn item(&self) -> T {
    assert!(self.size() == 1,
      "Can't extract item from non-scalar {}", self.shape);
    self.raw()[0]
  }

  pub fn zip<O, F>(&self, rhs: &Self, cb: F) -> Tensor<O>
  where
    O: Inner,
    F: Fn(T, T) -> O,
  {
    let shape = self.shape.broadcast(&rhs.shape);
    let data_l = self.raw();
    let data_r = rhs.raw();
    let data = self.shape.broadcast_indices(&shape).into_iter()
      .zip(rhs.shape.broadcast_indices(&shape))
      .map(|(i, j)| cb(data_l[i], data_r[j]) )
      .collect();
    Tensor::from_shape(shape, data)
  }

  pub fn vectorize<O, F>(&self, cb: F) -> Tensor<O>
  where
    O: Inner,
    F: FnMut(T) -> O,
  {
    let data = self.raw().iter().copied().map(cb).collect();
    Tensor::new(&self.shape.dims, data)
  }

  pub fn op_assign(&self, other: &Self, cb: impl Fn(&mut T, T)) {
    assert_eq!(self.shape, other.shape,
      "Could not combine {} tensor with {} tensor", self.shape, other.shape);
    let other = if self.shared_with(other) { other.detach() } else { other.clone() };
    let other_data = other.raw();
    for (a, &b) in self.raw_mut().iter_mut().zip(other_data.iter()) {
      cb(a, b);
    }
  }
}

impl<T: Numeric> Tensor<T> {
  pub fn ones(shape: &[usize]) -> Self {
    Self::fill(shape, T::one())
  }

  pub fn zeros(shape: &[usize]) -> Self {
    Self::fill(shape, T::zero())
  }

  pub fn arrange(shape: &[usize], start: T, step: T) -> Self {
    Self::new(shape, (0..shape.iter().product())
      .map(|i| T::from(i).unwrap() * step + start )
      .collect())
  }

  pub fn hot_encode(idx: usize, size: usize) -> Self {
    let mut a = vec![T::zero(); size];
    a[idx] = T::one();
    Self::new(&[size], a)
  }

  /// Sum over all dimensions this tensor was broadcast along, so that
  /// the result has the given shape again. Used to route gradients back
  /// to operands that got broadcast in the forward pass.

  pub fn sum_to(&self, shape: &Shape) -> Self {
    if self.shape == *shape { return self.clone() }
    let mut data = vec![T::zero(); shape.size()];
    let raw = self.raw();
    for (i, j) in shape.broadcast_indices(&self.shape).into_iter().enumerate() {
      data[j] += raw[i];
    }
    Self::from_shape(shape.clone(), data)
  }

  pub fn gt(&self, rhs: &Self) -> Tensor<bool> {
    self.zip(rhs, |a, b| a > b )
  }

  pub fn min_max(&self) -> Option<(T, T)> {
    self.raw().iter().fold(None, |acc, &a| match acc {
      None => Some((a, a)),
      Some((min, max)) => Some((
        if a < min { a } else { min },
        if a > max { a } else { max },
      )),
    })
  }
}

impl<T: Real> Tensor<T> {
  pub fn randn(shape: &[usize]) -> Self {
    Self::randn_with(shape, &mut rand::thread_rng())
  }

  /// Sample from a standard normal distribution using the given generator.

  pub fn randn_with<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
    let len = shape.iter().product();
    let mut data = vec![T::zero(); len];
    for pair in data.chunks_mut(2) {
      let (r1, r2): (T, T) = randn(rng);
      pair[0] = r1;
      if let Some(last) = pair.get_mut(1) { *last = r2 }
    }
    Self::new(shape, data)
  }

  pub fn uniform_with<R: Rng>(shape: &[usize], low: T, high: T, rng: &mut R) -> Self {
    let len = shape.iter().product();
    let data = (0..len).map(|_| rng.gen_range(low, high) ).collect();
    Self::new(shape, data)
  }

  pub fn trained(&self) -> Variable<T> {
    Variable::from_tensor(self.clone(), true)
  }

  pub fn tracked(&self) -> Variable<T> {
    Variable::from_tensor(self.clone(), false)
  }
}

impl Tensor<bool> {
  pub fn numeric<O: Numeric>(&self) -> Tensor<O> {
    self.vectorize(|a| if a { O::one() } else { O::zero() })
  }
}

impl<T: Inner> std::fmt::Display for Tensor<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "Tensor{} ", self.shape)?;
    print_chunks(0, &self.shape, &self.raw(), f)
  }
}

fn print_chunks<T: Debug>(idx: usize, shape: &Shape, vec: &[T], f: &mut std::fmt::Formatter) -> std::fmt::Result {
  let indent = " ".repeat(idx * 2);
  if shape.rank() == 0 {
    write!(f, "{indent}{:?}", vec[0])?;
  } else if idx == shape.rank() - 1 {
    writeln!(f, "{indent}{:?}", vec)?;
  } else {
    let chunks = vec.chunks((vec.len() / shape.dims[idx]).max(1));
    writeln!(f, "{indent}[")?;
    for chunk in chunks {
      print_chunks(idx + 1, shape, chunk, f)?;
    }
    writeln!(f, "{indent}]")?;
  }
  Ok(())
}

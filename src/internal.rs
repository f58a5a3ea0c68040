use rand::Rng;

use crate::scalar::Real;


#[inline]
pub fn negative_index(i: isize, n: usize) -> usize {
  if i < 0 {
    (n as isize + i) as usize
  } else {
    i as usize
  }
}


// Polar Box-Muller transformation

pub fn randn<T: Real, R: Rng>(rng: &mut R) -> (T, T) {
  loop {
    let u = rng.gen_range(-T::one(), T::one());
    let v = rng.gen_range(-T::one(), T::one());
    let r = u * u + v * v;
    // Try again if outside interval
    if r == T::zero() || r >= T::one() { continue }
    let c = (T::from(-2.0).unwrap() * r.ln() / r).sqrt();
    return (u * c, v * c)
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use rand::{ SeedableRng, rngs::StdRng };

  #[test]
  fn wraps_negative_indices() {
    assert_eq!(negative_index(-1, 3), 2);
    assert_eq!(negative_index(-3, 3), 0);
    assert_eq!(negative_index(1, 3), 1);
  }

  #[test]
  fn normal_samples_are_centered() {
    let mut rng = StdRng::seed_from_u64(7);
    let n = 5000;
    let sum: f64 = (0..n).map(|_| {
      let (a, b): (f64, f64) = randn(&mut rng);
      a + b
    }).sum();
    let mean = sum / (2 * n) as f64;
    assert!(mean.abs() < 0.05, "mean was {mean}");
  }
}

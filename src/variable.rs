use std::rc::Rc;
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::atomic::{ AtomicUsize, Ordering };
use std::fmt::Debug;

mod mops;
mod hook;
mod layer;

pub use hook::{ GradHook, ForwardHook };
pub use layer::Linear;

use crate::{
  tensor::Tensor,
  scalar::Real,
  ops::{ BaseOps, NumericOps, Hops },
};


pub fn make_id() -> usize {
  static LAST_ID: AtomicUsize = AtomicUsize::new(0);
  LAST_ID.fetch_add(1, Ordering::Relaxed)
}


/// Unary computational operation that can also compute its derivative.

pub trait UnaryOp<T: Real>: Debug {
  fn run(&self, lhs: &Tensor<T>) -> Tensor<T>;
  fn derive(&self, lhs: &Tensor<T>, grad: &Tensor<T>) -> Tensor<T>;
}


/// Binary computational operation that can also compute its derivative.

pub trait BinaryOp<T: Real>: Debug {
  fn run(&self, lhs: &Tensor<T>, rhs: &Tensor<T>) -> Tensor<T>;
  fn derive(&self, lhs: &Tensor<T>, rhs: &Tensor<T>, grad: &Tensor<T>) -> (Tensor<T>, Tensor<T>);
}


#[derive(Debug)]
enum Op<T: Real> {
  Unary(Box<dyn UnaryOp<T>>),
  Binary(Box<dyn BinaryOp<T>>),
}


/// Node in a computation graph, containing a [Variable]'s data and gradient,
/// the operation used to create it and any hooks observing its gradient.

struct Node<T: Real> {
  id: usize,
  data: Tensor<T>,
  grad: Option<Tensor<T>>,
  op: Option<Op<T>>,
  previous: Vec<Rc<Self>>,
  trainable: bool,
  hooks: RefCell<Vec<Rc<dyn GradHook<T>>>>,
}

impl<T: Real> Node<T> {
  fn reset_gradient(&self, filler: T) {
    if let Some(grad) = &self.grad {
      grad.refill(filler);
    }
  }

  fn notify(&self) {
    if let Some(grad) = &self.grad {
      // Clone the list so hooks may register further hooks
      let hooks = self.hooks.borrow().clone();
      for hook in hooks {
        hook.on_gradient(grad);
      }
    }
  }

  fn backward(&self) {
    if let (Some(op), Some(grad)) = (&self.op, &self.grad) {
      let lhs = &self.previous[0];
      let changes = match op {
        Op::Unary(op) => vec![op.derive(&lhs.data, grad)],
        Op::Binary(op) => {
          let rhs = &self.previous[1];
          let changes = op.derive(&lhs.data, &rhs.data, grad);
          vec![changes.0, changes.1]
        },
      };
      for (change, prev) in changes.iter().zip(self.previous.iter()) {
        if let Some(grad) = &prev.grad {
          grad.op_assign(change, |a, b| *a += b );
        }
      }
    }
  }
}


/// Variables track the computational operations used to create them and allow
/// for computing their gradient with respect to all input variables involved.
///
/// They get created by calling [tracked](Tensor::tracked) or
/// [trained](Tensor::trained) on any differentiable [Tensor] type.
///
/// Variables dereference to their underlying [Tensor] automatically for
/// non-differentiable operations. Differentiable operations, on the other hand,
/// will always return another Variable.

#[derive(Clone)]
pub struct Variable<T: Real> {
  node: Rc<Node<T>>,
}

impl<T: Real> Hops<T> for Variable<T> {}

impl<T: Real> std::ops::Deref for Variable<T> {
  type Target = Tensor<T>;

  fn deref(&self) -> &Self::Target {
    &self.node.data
  }
}

impl<T: Real> PartialEq for Variable<T> {
  fn eq(&self, rhs: &Self) -> bool {
    self.node.data == rhs.node.data
  }
}

impl<T: Real> Variable<T> {
  pub(crate) fn from_tensor(tensor: Tensor<T>, trainable: bool) -> Self {
    Self {
      node: Rc::new(Node {
        id: make_id(),
        grad: trainable.then(|| Tensor::zeros(&tensor.shape().dims) ),
        data: tensor,
        op: None,
        previous: vec![],
        trainable,
        hooks: RefCell::new(vec![]),
      }),
    }
  }

  fn operation(op: Op<T>, data: Tensor<T>, grad: bool, previous: Vec<Rc<Node<T>>>) -> Self {
    Self {
      node: Rc::new(Node {
        id: make_id(),
        grad: grad.then(|| Tensor::zeros(&data.shape().dims) ),
        data,
        op: Some(op),
        previous,
        trainable: false,
        hooks: RefCell::new(vec![]),
      }),
    }
  }

  pub fn id(&self) -> usize {
    self.node.id
  }

  pub fn tensor(&self) -> &Tensor<T> {
    &self.node.data
  }

  pub fn grad(&self) -> Option<&Tensor<T>> {
    self.node.grad.as_ref()
  }

  pub fn is_trainable(&self) -> bool {
    self.node.trainable
  }

  pub fn unary_op(&self, op: impl UnaryOp<T> + 'static) -> Self {
    let data = op.run(&self.node.data);
    Self::operation(
      Op::Unary(Box::new(op)),
      data,
      self.grad().is_some(),
      vec![self.node.clone()],
    )
  }

  pub fn binary_op(&self, op: impl BinaryOp<T> + 'static, rhs: &Self) -> Self {
    let data = op.run(&self.node.data, &rhs.node.data);
    Self::operation(
      Op::Binary(Box::new(op)),
      data,
      self.grad().is_some() || rhs.grad().is_some(),
      vec![self.node.clone(), rhs.node.clone()],
    )
  }

  /// Observe the gradient flowing into this Variable during
  /// every subsequent call to [backward](Variable::backward).
  ///
  /// Hooks on constants never fire, as no gradient reaches them.

  pub fn register_hook(&self, hook: impl GradHook<T> + 'static) {
    self.node.hooks.borrow_mut().push(Rc::new(hook));
  }

  pub fn num_hooks(&self) -> usize {
    self.node.hooks.borrow().len()
  }

  /// Compute gradients across this Variable's entire graph.
  ///
  /// Nodes get visited in reverse topological order, so every gradient
  /// is complete by the time its hooks get notified.

  pub fn backward(&self) {
    assert!(self.grad().is_some(), "Cannot compute gradients for constant {self}");
    self.node.reset_gradient(T::one());
    for node in self.history().iter().rev() {
      node.notify();
      node.backward();
    }
  }

  /// List all trainable parameters in this Variable's graph.

  pub fn parameters(&self) -> Vec<Self> {
    self.history()
      .into_iter()
      .filter(|node| node.trainable )
      .map(|node| Self { node } )
      .collect()
  }

  /// Set gradients to zero for this Variable's entire graph.

  pub fn reset(&self) {
    for node in self.history() {
      node.reset_gradient(T::zero());
    }
  }

  fn history(&self) -> Vec<Rc<Node<T>>> {
    let mut history = vec![];
    Self::history_recurse(&self.node, &mut history, &mut HashSet::new());
    history
  }

  fn history_recurse(node: &Rc<Node<T>>, history: &mut Vec<Rc<Node<T>>>, visited: &mut HashSet<usize>) {
    if !visited.insert(node.id) { return }
    for prev in &node.previous {
      Self::history_recurse(prev, history, visited);
    }
    history.push(node.clone());
  }

  /// Compute a function's gradient with respect to a generated
  /// input numerically and compare it to the automatically derived
  /// solution.
  ///
  /// Supply any function to check that it gets differentiated correctly.

  pub fn check_gradients<F>(input: &Tensor<T>, generator: F) -> T
  where
    F: Fn(&Self) -> Self
  {
    let eps = T::from(0.001).unwrap();
    let two = T::from(2.0).unwrap();
    // Compute gradient using auto diff
    let var = input.detach().trained();
    let output = generator(&var).sum();
    output.backward();
    let grad = var.grad().map(Tensor::detach).unwrap_or_else(|| Tensor::zeros(&input.shape().dims) );
    // Compute gradient numerically for every param in input
    let len = input.size();
    let num_grad = (0..len).map(|i| {
      let epst = Tensor::hot_encode(i, len).view(&input.shape().dims) * eps;
      let prev = generator(&(input - &epst).tracked()).sum();
      let next = generator(&(input + &epst).tracked()).sum();
      (next.item() - prev.item()) / (two * eps)
    }).collect();
    let num_grad = Tensor::new(&grad.shape().dims, num_grad);
    // Return largest difference between both gradients
    let diff = (grad - num_grad).vectorize(|a| if a < T::zero() { -a } else { a });
    diff.min_max().map(|(_, max)| max ).unwrap_or_else(T::zero)
  }
}

impl<T: Real> std::fmt::Debug for Variable<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    f.debug_struct("Variable")
      .field("id", &self.node.id)
      .field("shape", &self.node.data.shape().dims)
      .field("trainable", &self.node.trainable)
      .field("op", &self.node.op)
      .field("hooks", &self.num_hooks())
      .finish()
  }
}

impl<T: Real> std::fmt::Display for Variable<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    let title = if self.node.trainable { "Trainable" } else if self.node.grad.is_some() {
      "Computed"
    } else {
      "Tracked"
    };
    write!(f, "{title} {}", self.tensor())
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use std::cell::Cell;
  use crate::ops::RealOps;

  #[test]
  fn x_squared() {
    let x = Tensor::<f64>::vec(&[3.0, 5.0]).trained();
    let z = &x * &x + 2.0;
    z.backward();
    assert_eq!(z, Tensor::<f64>::vec(&[11.0, 27.0]).tracked());
    assert_eq!(x.grad(), Some(&Tensor::<f64>::vec(&[6.0, 10.0])));
  }

  #[test]
  fn linear_gradients() {
    let input = Tensor::<f64>::arrange(&[4, 3], -1.0, 0.25);
    let weights = Tensor::<f64>::arrange(&[3, 2], 0.5, -0.1).tracked();
    let bias = Tensor::<f64>::vec(&[0.15, -0.2]).tracked();
    let error = Variable::check_gradients(&input, |x| (x.mm(&weights) + &bias).relu().sqr() );
    assert!(error < 1e-6, "error was {error}");
  }

  #[test]
  fn mse_gradients() {
    let input = Tensor::<f64>::arrange(&[4, 1], -1.0, 0.7);
    let target = Tensor::<f64>::arrange(&[4, 1], 0.3, 0.1).tracked();
    let error = Variable::check_gradients(&input, |x| x.mse(&target) );
    assert!(error < 1e-6, "error was {error}");
  }

  #[test]
  fn hook_sees_accumulated_gradient() {
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::new(RefCell::new(None));
    let x = Tensor::<f64>::vec(&[1.0, 2.0]).trained();
    let y = &x * 3.0;
    {
      let calls = calls.clone();
      let seen = seen.clone();
      y.register_hook(move |grad: &Tensor<f64>| {
        calls.set(calls.get() + 1);
        *seen.borrow_mut() = Some(grad.detach());
      });
    }
    // y feeds the loss twice, so its gradient accumulates two contributions
    let loss = (&y + &y).sum();
    loss.backward();
    assert_eq!(calls.get(), 1);
    assert_eq!(seen.borrow().clone(), Some(Tensor::<f64>::vec(&[2.0, 2.0])));
    assert_eq!(x.grad(), Some(&Tensor::<f64>::vec(&[6.0, 6.0])));
  }

  #[test]
  fn hooks_on_constants_never_fire() {
    let fired = Rc::new(Cell::new(false));
    let c = Tensor::<f64>::vec(&[1.0, 2.0]).tracked();
    let flag = fired.clone();
    c.register_hook(move |_: &Tensor<f64>| flag.set(true) );
    let w = Tensor::<f64>::vec(&[0.5, 0.5]).trained();
    (&c * &w).sum().backward();
    assert!(!fired.get());
  }

  #[test]
  fn parameters_and_reset() {
    let w = Tensor::<f64>::vec(&[1.0, 2.0]).trained();
    let b = Tensor::<f64>::scalar(1.0).trained();
    let x = Tensor::<f64>::vec(&[3.0, 4.0]).tracked();
    let loss = (&(&x * &w) + &b).sum();
    assert_eq!(loss.parameters().len(), 2);
    loss.backward();
    assert_eq!(b.grad(), Some(&Tensor::<f64>::scalar(2.0)));
    loss.reset();
    assert_eq!(w.grad(), Some(&Tensor::<f64>::vec(&[0.0, 0.0])));
  }

  #[test]
  #[should_panic(expected = "Cannot compute gradients for constant")]
  fn constant_backward() {
    Tensor::<f64>::vec(&[1.0]).tracked().sum().backward();
  }
}

use std::rc::Rc;
use std::cell::RefCell;

use log::{ debug, trace };

use crate::{
  scalar::Inner,
  ops::BaseOps,
  variable::{ GradHook, ForwardHook },
  Tensor,
};


/// Named tensors in first-insertion order.
///
/// Inserting under an existing name replaces the tensor
/// but keeps the name's position.

#[derive(Debug, Clone)]
pub struct Registry<T: Inner> {
  entries: Vec<(String, Tensor<T>)>,
}

impl<T: Inner> Default for Registry<T> {
  fn default() -> Self {
    Self { entries: vec![] }
  }
}

impl<T: Inner> Registry<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, name: &str, tensor: Tensor<T>) {
    if let Some(entry) = self.entries.iter_mut().find(|(key, _)| key == name ) {
      debug!("overwriting record {name}");
      entry.1 = tensor;
    } else {
      self.entries.push((name.to_string(), tensor));
    }
  }

  pub fn get(&self, name: &str) -> Option<&Tensor<T>> {
    self.entries.iter()
      .find(|(key, _)| key == name )
      .map(|(_, tensor)| tensor )
  }

  pub fn keys(&self) -> Vec<&str> {
    self.entries.iter().map(|(key, _)| key.as_str() ).collect()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor<T>)> {
    self.entries.iter().map(|(key, tensor)| (key.as_str(), tensor) )
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Copy of this registry that shares no storage with it.

  pub fn detach(&self) -> Self {
    Self {
      entries: self.entries.iter()
        .map(|(key, tensor)| (key.clone(), tensor.detach()) )
        .collect(),
    }
  }
}


/// Destination for the lines a run reports to its user.

#[derive(Debug, Clone, Default)]
pub enum Console {
  #[default]
  Stdout,
  Buffer(Rc<RefCell<Vec<String>>>),
}

impl Console {
  /// Console that keeps its lines in memory instead of printing them.

  pub fn buffered() -> Self {
    Self::Buffer(Rc::new(RefCell::new(vec![])))
  }

  pub fn line(&self, text: impl Into<String>) {
    match self {
      Self::Stdout => println!("{}", text.into()),
      Self::Buffer(lines) => lines.borrow_mut().push(text.into()),
    }
  }

  /// Lines written so far. Always empty for [Console::Stdout].

  pub fn lines(&self) -> Vec<String> {
    match self {
      Self::Stdout => vec![],
      Self::Buffer(lines) => lines.borrow().clone(),
    }
  }
}


#[derive(Debug, Default)]
struct Records {
  activations: Registry<f32>,
  gradients: Registry<f32>,
}


/// Snapshot of everything an [Instrumentation] captured.

#[derive(Debug, Clone, Default)]
pub struct Captures {
  pub activations: Registry<f32>,
  pub gradients: Registry<f32>,
}


/// Handle to one set of activation and gradient records.
///
/// Clones share the same records. Separately constructed
/// instrumentations never do.

#[derive(Debug, Clone, Default)]
pub struct Instrumentation {
  records: Rc<RefCell<Records>>,
  console: Console,
}

impl Instrumentation {
  pub fn new(console: Console) -> Self {
    Self { records: Rc::default(), console }
  }

  pub fn console(&self) -> &Console {
    &self.console
  }

  /// Forward hook that records a layer's output under `name`.

  pub fn activation_probe(&self, name: &str) -> ActivationProbe {
    ActivationProbe { name: name.to_string(), sink: self.clone() }
  }

  /// Gradient hook that records an incoming gradient under `name`.

  pub fn gradient_probe(&self, name: &str) -> GradientProbe {
    GradientProbe { name: name.to_string(), sink: self.clone() }
  }

  pub fn record_activation(&self, name: &str, tensor: Tensor<f32>) {
    self.records.borrow_mut().activations.insert(name, tensor);
  }

  pub fn record_gradient(&self, name: &str, tensor: Tensor<f32>) {
    self.records.borrow_mut().gradients.insert(name, tensor);
  }

  pub fn captures(&self) -> Captures {
    let records = self.records.borrow();
    Captures {
      activations: records.activations.detach(),
      gradients: records.gradients.detach(),
    }
  }
}


/// Records a detached copy of a layer's output.

#[derive(Debug, Clone)]
pub struct ActivationProbe {
  pub name: String,
  sink: Instrumentation,
}

impl ForwardHook<f32> for ActivationProbe {
  fn on_forward(&self, _input: &Tensor<f32>, output: &Tensor<f32>) {
    trace!("forward probe {} fired", self.name);
    self.sink.console.line(format!("[Forward] {} → shape: {}", self.name, output.shape()));
    self.sink.record_activation(&self.name, output.detach());
  }
}


/// Records a detached copy of a gradient, leaving the original untouched.

#[derive(Debug, Clone)]
pub struct GradientProbe {
  pub name: String,
  sink: Instrumentation,
}

impl GradHook<f32> for GradientProbe {
  fn on_gradient(&self, grad: &Tensor<f32>) {
    trace!("backward probe {} fired", self.name);
    self.sink.console.line(format!("[Backward] {} → grad shape: {}", self.name, grad.shape()));
    self.sink.record_gradient(&self.name, grad.detach());
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::ops::NumericOps;

  #[test]
  fn registry_overwrites_in_place() {
    let mut registry = Registry::new();
    registry.insert("fc1", Tensor::<f32>::zeros(&[2]));
    registry.insert("fc2", Tensor::zeros(&[3]));
    registry.insert("fc1", Tensor::ones(&[4]));
    assert_eq!(registry.keys(), vec!["fc1", "fc2"]);
    assert_eq!(registry.get("fc1"), Some(&Tensor::ones(&[4])));
    assert_eq!(registry.len(), 2);
    assert!(registry.get("output").is_none());
  }

  #[test]
  fn activation_probe_copies_output() {
    let inst = Instrumentation::new(Console::buffered());
    let output = Tensor::<f32>::vec(&[1.0, 2.0]);
    inst.activation_probe("fc1").on_forward(&Tensor::zeros(&[1]), &output);
    output.refill(0.0);
    let captures = inst.captures();
    assert_eq!(captures.activations.get("fc1"), Some(&Tensor::vec(&[1.0, 2.0])));
    assert!(captures.gradients.is_empty());
    assert_eq!(inst.console().lines(), vec!["[Forward] fc1 → shape: [2]"]);
  }

  #[test]
  fn gradient_probe_leaves_gradient_unchanged() {
    let inst = Instrumentation::new(Console::buffered());
    let w = Tensor::<f32>::vec(&[1.0, 2.0]).trained();
    let y = &w * 3.0;
    y.register_hook(inst.gradient_probe("output"));
    y.sum().backward();
    assert_eq!(w.grad(), Some(&Tensor::vec(&[3.0, 3.0])));
    assert_eq!(inst.captures().gradients.get("output"), Some(&Tensor::vec(&[1.0, 1.0])));
    assert_eq!(inst.console().lines(), vec!["[Backward] output → grad shape: [2]"]);
  }

  #[test]
  fn captures_are_detached() {
    let inst = Instrumentation::new(Console::buffered());
    inst.record_gradient("output", Tensor::vec(&[1.0]));
    let captures = inst.captures();
    inst.record_gradient("output", Tensor::vec(&[5.0]));
    assert_eq!(captures.gradients.get("output"), Some(&Tensor::vec(&[1.0])));
  }

  #[test]
  fn instrumentations_do_not_share_records() {
    let a = Instrumentation::default();
    let b = Instrumentation::default();
    a.record_activation("fc1", Tensor::zeros(&[1]));
    assert_eq!(a.captures().activations.len(), 1);
    assert!(b.captures().activations.is_empty());
    assert!(a.clone().captures().activations.get("fc1").is_some());
  }
}

//! Observe a tiny perceptron while it trains.
//! Small autograd engine. Few dependencies. CPU only.
//!
//! # Features
//!
//! - **Gradient hooks** - Register observers on any [Variable] to see the gradient
//! that reaches it during back-propagation, once it has been fully accumulated.
//!
//! - **Forward hooks** - [Linear] layers call their hooks right after computing
//! an output, in registration order.
//!
//! - **Broadcasting** - Tensors with differing but compatible shapes get
//! broadcasted to matching dimensions automatically for elementwise operations.
//!
//! - **Explicit instrumentation** - Captured tensors live in an [Instrumentation]
//! handle that gets passed into training, never in global state.
//!
//! - **Optimization** - Includes SGD and ADAM.
//!
//! # Examples
//!
//! Training an instrumented model and inspecting what it captured:
//! ```
//! use tensorprobe::{ Instrumentation, MiniMlp, TrainConfig, train };
//!
//! let inst = Instrumentation::default();
//!
//! let mut model = MiniMlp::new();
//! model.fc1.register_forward_hook(inst.activation_probe("fc1"));
//! model.fc2.register_forward_hook(inst.activation_probe("fc2"));
//!
//! let losses = train(&model, &TrainConfig::epochs(2), &inst, &mut rand::thread_rng());
//! assert_eq!(losses.len(), 2);
//!
//! let captures = inst.captures();
//! assert_eq!(captures.activations.keys(), vec!["fc1", "fc2"]);
//! assert_eq!(captures.gradients.keys(), vec!["output"]);
//! ```
//!
//! Observing a gradient directly:
//! ```
//! use tensorprobe::{ ops::*, Tensor };
//!
//! let w = Tensor::<f32>::vec(&[1.0, 2.0]).trained();
//! let y = &w * 3.0;
//! y.register_hook(|grad: &Tensor<f32>| println!("{grad}"));
//! y.sum().backward();
//! ```
//!
//! # Optional features
//!
//! Some features can be toggled in your `Cargo.toml`.
//!
//! - `unsafe` *(default)* - Accelerated matrix math using [matrixmultiply] crate.
//! - `rayon` - Multi-threaded fallback matrix math over rows.

mod internal;
mod shape;
mod tensor;
mod variable;

pub mod ops;
pub mod scalar;
pub mod optimize;
pub mod model;
pub mod instrument;
pub mod train;
pub mod plot;

pub use shape::Shape;
pub use tensor::Tensor;
pub use variable::{ Variable, Linear, UnaryOp, BinaryOp, GradHook, ForwardHook };
pub use model::MiniMlp;
pub use instrument::{ Instrumentation, Captures, Console };
pub use train::{ TrainConfig, train };

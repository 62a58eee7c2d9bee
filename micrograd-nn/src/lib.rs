//!
//! # micrograd-nn
//!
//! Neurons, layers and multilayer perceptrons composed from engine nodes.
//!
//! Every weight and bias is a leaf on the caller's [`Tape`]; a forward pass
//! records new nodes on that same tape, so calling `backward` on any output
//! fills in the parameter gradients.
//!

use std::fmt;

use log::debug;

use rand::Rng;

use lib_micrograd_engine::{Tape, Var};

mod error;

pub use error::{Error, Result};

/// Anything exposing trainable parameters
pub trait Module<'t> {
  /// Every weight and bias, in a stable order
  fn parameters(&self) -> Vec<Var<'t>>;

  /// Reset the gradient of every parameter to zero
  fn zero_grad(&self) {
    lib_micrograd_engine::zero_grad(self.parameters());
  }
}

/// A single unit computing `b + w·x`, optionally followed by `relu`
pub struct Neuron<'t> {
  weights: Vec<Var<'t>>,
  bias: Var<'t>,
  nonlin: bool,
}

impl<'t> Neuron<'t> {
  /// Weights are drawn uniformly from `[-1, 1)`, the bias starts at zero
  pub fn new<R>(tape: &'t Tape, nin: usize, nonlin: bool, rng: &mut R) -> Self
  where
    R: Rng + ?Sized,
  {
    let weights = (0..nin).map(|_| tape.var(rng.gen_range(-1.0..1.0))).collect();
    Self {
      weights,
      bias: tape.var(0.0),
      nonlin,
    }
  }

  pub fn forward(&self, x: &[Var<'t>]) -> Result<Var<'t>> {
    if x.len() != self.weights.len() {
      return Err(Error::InputSize {
        expected: self.weights.len(),
        actual: x.len(),
      });
    }
    let act = self
      .weights
      .iter()
      .zip(x)
      .fold(self.bias, |act, (w, x)| act + w * x);
    Ok(if self.nonlin { act.relu() } else { act })
  }

  pub fn weights(&self) -> &[Var<'t>] {
    &self.weights
  }

  pub fn bias(&self) -> Var<'t> {
    self.bias
  }

  pub fn nin(&self) -> usize {
    self.weights.len()
  }

  pub fn is_nonlinear(&self) -> bool {
    self.nonlin
  }
}

impl<'t> Module<'t> for Neuron<'t> {
  fn parameters(&self) -> Vec<Var<'t>> {
    let mut params = self.weights.clone();
    params.push(self.bias);
    params
  }
}

impl fmt::Display for Neuron<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let kind = if self.nonlin { "ReLU" } else { "Linear" };
    write!(f, "{}Neuron({})", kind, self.weights.len())
  }
}

/// Neurons evaluated side by side over the same input
pub struct Layer<'t> {
  neurons: Vec<Neuron<'t>>,
}

impl<'t> Layer<'t> {
  pub fn new<R>(tape: &'t Tape, nin: usize, nout: usize, nonlin: bool, rng: &mut R) -> Self
  where
    R: Rng + ?Sized,
  {
    let neurons = (0..nout).map(|_| Neuron::new(tape, nin, nonlin, &mut *rng)).collect();
    Self { neurons }
  }

  pub fn forward(&self, x: &[Var<'t>]) -> Result<Vec<Var<'t>>> {
    self.neurons.iter().map(|n| n.forward(x)).collect()
  }

  pub fn neurons(&self) -> &[Neuron<'t>] {
    &self.neurons
  }
}

impl<'t> Module<'t> for Layer<'t> {
  fn parameters(&self) -> Vec<Var<'t>> {
    self.neurons.iter().flat_map(|n| n.parameters()).collect()
  }
}

impl fmt::Display for Layer<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Layer of [")?;
    write_joined(f, &self.neurons)?;
    write!(f, "]")
  }
}

/// Multilayer perceptron: layers applied in sequence, `relu` on all but the
/// last
pub struct Mlp<'t> {
  tape: &'t Tape,
  layers: Vec<Layer<'t>>,
}

impl<'t> Mlp<'t> {
  /// Build layers `nin -> nouts[0] -> ... -> nouts[last]`.
  ///
  /// A single `rng` is threaded through every neuron, so a seeded generator
  /// gives a reproducible network with distinct weights per neuron.
  pub fn new<R>(tape: &'t Tape, nin: usize, nouts: &[usize], rng: &mut R) -> Self
  where
    R: Rng + ?Sized,
  {
    let sizes: Vec<usize> = std::iter::once(nin).chain(nouts.iter().copied()).collect();
    let layers: Vec<Layer<'t>> = sizes
      .windows(2)
      .enumerate()
      .map(|(i, pair)| Layer::new(tape, pair[0], pair[1], i + 1 != nouts.len(), &mut *rng))
      .collect();

    let mlp = Self { tape, layers };
    debug!("built {} with {} parameters", mlp, mlp.parameters().len());
    mlp
  }

  pub fn forward(&self, x: &[Var<'t>]) -> Result<Vec<Var<'t>>> {
    let mut output = x.to_vec();
    for layer in &self.layers {
      output = layer.forward(&output)?;
    }
    Ok(output)
  }

  /// Forward pass over raw numbers, each wrapped as a leaf on the network's
  /// tape
  pub fn forward_values(&self, x: &[f64]) -> Result<Vec<Var<'t>>> {
    let inputs: Vec<Var<'t>> = x.iter().map(|&v| self.tape.var(v)).collect();
    self.forward(&inputs)
  }

  pub fn layers(&self) -> &[Layer<'t>] {
    &self.layers
  }
}

impl<'t> Module<'t> for Mlp<'t> {
  fn parameters(&self) -> Vec<Var<'t>> {
    self.layers.iter().flat_map(|l| l.parameters()).collect()
  }
}

impl fmt::Display for Mlp<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "MLP of [")?;
    write_joined(f, &self.layers)?;
    write!(f, "]")
  }
}

fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
  for (i, item) in items.iter().enumerate() {
    if i > 0 {
      write!(f, ", ")?;
    }
    write!(f, "{}", item)?;
  }
  Ok(())
}

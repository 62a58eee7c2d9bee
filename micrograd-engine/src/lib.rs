//!
//! # micrograd-engine
//!
//! Reverse-mode automatic differentiation over `f64` scalars.
//!
//! Every node lives on a [`Tape`], an arena addressed by stable indices. A node
//! records its forward value, its accumulated gradient and the operation that
//! produced it. Operands always sit at lower indices than their results, so
//! the graph can never contain a cycle.
//!
//! ```
//! use lib_micrograd_engine::Tape;
//!
//! let tape = Tape::new();
//! let x = tape.var(3.0);
//! let y = x * x + 2.0 * x;
//! y.backward();
//! assert_eq!(y.value(), 15.0);
//! assert_eq!(x.grad(), 8.0);
//! ```
//!

use std::borrow::Borrow;
use std::cell::RefCell;
use std::fmt;
use std::ptr;

use log::{debug, trace};

use rustc_hash::FxHashSet;

use smallvec::{smallvec, SmallVec};

mod error;
mod ops;

pub use error::{Error, Result};

type NodeIndex = usize;

/// The operation that produced a node, along with the indices of its operands
#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
  Leaf,
  Add(NodeIndex, NodeIndex),
  Mul(NodeIndex, NodeIndex),
  Pow { base: NodeIndex, exponent: f64 },
  Relu(NodeIndex),
}

impl Op {
  /// Operands in construction order, with a repeated operand listed once
  fn operands(&self) -> SmallVec<[NodeIndex; 2]> {
    match *self {
      Op::Leaf => SmallVec::new(),
      Op::Add(a, b) | Op::Mul(a, b) if a == b => smallvec![a],
      Op::Add(a, b) | Op::Mul(a, b) => smallvec![a, b],
      Op::Pow { base, .. } => smallvec![base],
      Op::Relu(a) => smallvec![a],
    }
  }

  fn label(&self) -> &'static str {
    match self {
      Op::Leaf => "",
      Op::Add(..) => "+",
      Op::Mul(..) => "*",
      Op::Pow { .. } => "**",
      Op::Relu(_) => "ReLU",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Node {
  value: f64,
  grad: f64,
  op: Op,
}

/// Arena holding every node of a computation graph.
///
/// Nodes are only ever appended; the whole graph is released at once by
/// [`Tape::clear`] or by dropping the tape.
#[derive(Debug, Default)]
pub struct Tape {
  nodes: RefCell<Vec<Node>>,
}

impl Tape {
  pub fn new() -> Self {
    Self {
      nodes: RefCell::new(Vec::new()),
    }
  }

  /// Wrap a raw number as a leaf node with zero gradient.
  ///
  /// Every literal operand in mixed `Var`/`f64` arithmetic goes through here.
  #[inline]
  pub fn var(&self, value: f64) -> Var<'_> {
    Var {
      index: self.push(value, Op::Leaf),
      tape: self,
    }
  }

  /// Number of nodes currently on the tape
  pub fn len(&self) -> usize {
    self.nodes.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.borrow().is_empty()
  }

  /// Drop every node.
  ///
  /// Requires exclusive access, so no `Var` borrowed from this tape can
  /// outlive the call.
  pub fn clear(&mut self) {
    let nodes = self.nodes.get_mut();
    debug!("clearing tape of {} nodes", nodes.len());
    nodes.clear();
  }

  #[inline]
  fn push(&self, value: f64, op: Op) -> NodeIndex {
    let mut nodes = self.nodes.borrow_mut();
    let index = nodes.len();
    nodes.push(Node {
      value,
      grad: 0.0,
      op,
    });
    index
  }

  #[inline]
  fn node(&self, index: NodeIndex) -> Node {
    self.nodes.borrow()[index]
  }

  /// Post-order of every node reachable from `root`: each node appears after
  /// all of its operands, and exactly once.
  fn topological_order(&self, root: NodeIndex) -> Vec<NodeIndex> {
    let nodes = self.nodes.borrow();

    let mut stack = Vec::with_capacity(64);
    let mut result = Vec::with_capacity(64);
    let mut visited = FxHashSet::default();

    stack.push((root, false));

    while let Some((index, operands_done)) = stack.pop() {
      if operands_done {
        result.push(index);
      } else if visited.insert(index) {
        stack.push((index, true));
        // push in reverse so the first operand is explored first
        for operand in nodes[index].op.operands().into_iter().rev() {
          if !visited.contains(&operand) {
            stack.push((operand, false));
          }
        }
      }
    }

    result
  }

  fn backward(&self, root: NodeIndex) {
    let order = self.topological_order(root);
    debug!("backward from node {} over {} nodes", root, order.len());

    let mut nodes = self.nodes.borrow_mut();
    nodes[root].grad = 1.0;

    for &index in order.iter().rev() {
      let Node {
        value,
        grad: upstream,
        op,
      } = nodes[index];
      trace!("node {} ({}): upstream {}", index, op.label(), upstream);

      match op {
        Op::Leaf => {}
        Op::Add(a, b) => {
          nodes[a].grad += upstream;
          nodes[b].grad += upstream;
        }
        Op::Mul(a, b) => {
          let (va, vb) = (nodes[a].value, nodes[b].value);
          nodes[a].grad += vb * upstream;
          nodes[b].grad += va * upstream;
        }
        Op::Pow { base, exponent } => {
          let v = nodes[base].value;
          nodes[base].grad += exponent * v.powf(exponent - 1.0) * upstream;
        }
        Op::Relu(a) => {
          if value > 0.0 {
            nodes[a].grad += upstream;
          }
        }
      }
    }
  }
}

/// Handle to a node on a [`Tape`].
///
/// A `Var` is two words wide and `Copy`; cloning it never clones the node.
#[derive(Clone, Copy)]
pub struct Var<'t> {
  index: NodeIndex,
  tape: &'t Tape,
}

impl<'t> Var<'t> {
  /// The forward-computed value
  #[inline]
  pub fn value(&self) -> f64 {
    self.tape.node(self.index).value
  }

  /// The gradient accumulated by every `backward` pass since the last reset
  #[inline]
  pub fn grad(&self) -> f64 {
    self.tape.node(self.index).grad
  }

  /// Position of this node on its tape; operands always have smaller ids
  #[inline]
  pub fn id(&self) -> usize {
    self.index
  }

  #[inline]
  pub fn tape(&self) -> &'t Tape {
    self.tape
  }

  pub fn is_leaf(&self) -> bool {
    matches!(self.tape.node(self.index).op, Op::Leaf)
  }

  /// Name of the operation that produced this node, empty for leaves
  pub fn op_label(&self) -> &'static str {
    self.tape.node(self.index).op.label()
  }

  /// The direct inputs of this node, each listed once
  pub fn operands(&self) -> SmallVec<[Var<'t>; 2]> {
    self
      .tape
      .node(self.index)
      .op
      .operands()
      .into_iter()
      .map(|index| self.with_index(index))
      .collect()
  }

  /// `max(0, self)`
  pub fn relu(&self) -> Self {
    let value = self.value().max(0.0);
    self.with_index(self.tape.push(value, Op::Relu(self.index)))
  }

  /// `self^exponent` for a fixed real exponent.
  ///
  /// # Panics
  ///
  /// Panics if `exponent` is NaN or infinite; see [`Var::try_pow`].
  pub fn pow(&self, exponent: f64) -> Self {
    match self.try_pow(exponent) {
      Ok(var) => var,
      Err(err) => panic!("{err}"),
    }
  }

  /// `self^exponent`, rejecting a non-finite exponent before any node is
  /// created
  pub fn try_pow(&self, exponent: f64) -> Result<Self> {
    if !exponent.is_finite() {
      return Err(Error::InvalidExponent { exponent });
    }
    Ok(self.powf_unchecked(exponent))
  }

  /// Back-propagate from this node.
  ///
  /// Seeds this node's gradient with 1 and runs every reachable node's
  /// gradient rule in reverse topological order. Gradients of the other
  /// nodes are added to, never overwritten; reset them with [`zero_grad`]
  /// between passes when fresh gradients are wanted.
  pub fn backward(&self) {
    self.tape.backward(self.index);
  }

  /// Every node reachable from this one, each after all of its operands.
  ///
  /// [`Var::backward`] visits nodes in exactly the reverse of this order.
  pub fn topological_order(&self) -> Vec<Var<'t>> {
    self
      .tape
      .topological_order(self.index)
      .into_iter()
      .map(|index| self.with_index(index))
      .collect()
  }

  /// Reset this node's gradient to zero
  pub fn zero_grad(&self) {
    self.tape.nodes.borrow_mut()[self.index].grad = 0.0;
  }

  #[inline]
  fn with_index(&self, index: NodeIndex) -> Self {
    Self {
      index,
      tape: self.tape,
    }
  }

  #[inline]
  fn assert_same_tape(&self, other: &Self) {
    assert!(
      ptr::eq(self.tape, other.tape),
      "operands {} and {} belong to different tapes",
      self.index,
      other.index
    );
  }

  #[inline]
  pub(crate) fn add_op(&self, other: &Self) -> Self {
    self.assert_same_tape(other);
    let value = self.value() + other.value();
    self.with_index(self.tape.push(value, Op::Add(self.index, other.index)))
  }

  #[inline]
  pub(crate) fn mul_op(&self, other: &Self) -> Self {
    self.assert_same_tape(other);
    let value = self.value() * other.value();
    self.with_index(self.tape.push(value, Op::Mul(self.index, other.index)))
  }

  #[inline]
  pub(crate) fn neg_op(&self) -> Self {
    self.mul_op(&self.tape.var(-1.0))
  }

  #[inline]
  pub(crate) fn sub_op(&self, other: &Self) -> Self {
    self.add_op(&other.neg_op())
  }

  #[inline]
  pub(crate) fn div_op(&self, other: &Self) -> Self {
    self.mul_op(&other.powf_unchecked(-1.0))
  }

  #[inline]
  fn powf_unchecked(&self, exponent: f64) -> Self {
    let value = self.value().powf(exponent);
    let op = Op::Pow {
      base: self.index,
      exponent,
    };
    self.with_index(self.tape.push(value, op))
  }
}

impl fmt::Debug for Var<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let node = self.tape.node(self.index);
    f.debug_struct("Var")
      .field("index", &self.index)
      .field("value", &node.value)
      .field("grad", &node.grad)
      .field("op", &node.op.label())
      .finish()
  }
}

impl fmt::Display for Var<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let node = self.tape.node(self.index);
    write!(f, "Value(data={}, grad={})", node.value, node.grad)
  }
}

/// Reset the gradient of every given node to zero.
///
/// Only the listed nodes are touched; anything else on the tape keeps its
/// gradient.
pub fn zero_grad<'t, I>(nodes: I)
where
  I: IntoIterator,
  I::Item: Borrow<Var<'t>>,
{
  let mut count = 0usize;
  for var in nodes {
    var.borrow().zero_grad();
    count += 1;
  }
  trace!("zeroed {} gradients", count);
}

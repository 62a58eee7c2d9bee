//!
//! # micrograd
//!
//! Reverse-mode automatic differentiation over scalar values, with a small
//! feed-forward network layer on top.
//!
//! Everything is recorded on a [`Tape`]: create leaves with [`Tape::var`],
//! combine them with ordinary arithmetic, then call [`Var::backward`] on the
//! result to fill in the gradient of every node it depends on.
//!
//! The network layer lives in [`nn`] behind the default `nn` feature.
//!

pub use lib_micrograd_engine::*;

#[cfg(feature = "nn")]
pub use lib_micrograd_nn as nn;

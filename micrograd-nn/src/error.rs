use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
  #[error("input has {actual} features but the neuron expects {expected}")]
  InputSize { expected: usize, actual: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

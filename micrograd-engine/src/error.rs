use thiserror::Error;

/// Errors raised by graph construction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
  #[error("invalid exponent {exponent}: power requires a finite real exponent")]
  InvalidExponent { exponent: f64 },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

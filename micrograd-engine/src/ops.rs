//! `std::ops` arithmetic for [`Var`].
//!
//! Each operator accepts `Var`, `&Var` or a raw `f64` on either side. Literals
//! are wrapped as fresh leaves through [`Tape::var`](crate::Tape::var) before
//! the operation is recorded.

use std::ops::{Add, BitXor, Div, Mul, Neg, Sub};

use crate::Var;

macro_rules! binary_op {
  ($trait:ident, $method:ident, $inner:ident) => {
    impl<'t> $trait<Var<'t>> for Var<'t> {
      type Output = Var<'t>;

      #[inline(always)]
      fn $method(self, other: Var<'t>) -> Self::Output {
        self.$inner(&other)
      }
    }

    impl<'t> $trait<&Var<'t>> for Var<'t> {
      type Output = Var<'t>;

      #[inline(always)]
      fn $method(self, other: &Var<'t>) -> Self::Output {
        self.$inner(other)
      }
    }

    impl<'t> $trait<Var<'t>> for &Var<'t> {
      type Output = Var<'t>;

      #[inline(always)]
      fn $method(self, other: Var<'t>) -> Self::Output {
        self.$inner(&other)
      }
    }

    impl<'t> $trait<&Var<'t>> for &Var<'t> {
      type Output = Var<'t>;

      #[inline(always)]
      fn $method(self, other: &Var<'t>) -> Self::Output {
        self.$inner(other)
      }
    }

    impl<'t> $trait<f64> for Var<'t> {
      type Output = Var<'t>;

      #[inline(always)]
      fn $method(self, other: f64) -> Self::Output {
        self.$inner(&self.tape().var(other))
      }
    }

    impl<'t> $trait<f64> for &Var<'t> {
      type Output = Var<'t>;

      #[inline(always)]
      fn $method(self, other: f64) -> Self::Output {
        self.$inner(&self.tape().var(other))
      }
    }

    impl<'t> $trait<Var<'t>> for f64 {
      type Output = Var<'t>;

      #[inline(always)]
      fn $method(self, other: Var<'t>) -> Self::Output {
        other.tape().var(self).$inner(&other)
      }
    }

    impl<'t> $trait<&Var<'t>> for f64 {
      type Output = Var<'t>;

      #[inline(always)]
      fn $method(self, other: &Var<'t>) -> Self::Output {
        other.tape().var(self).$inner(other)
      }
    }
  };
}

binary_op!(Add, add, add_op);
binary_op!(Sub, sub, sub_op);
binary_op!(Mul, mul, mul_op);
binary_op!(Div, div, div_op);

impl<'t> Neg for Var<'t> {
  type Output = Var<'t>;

  #[inline(always)]
  fn neg(self) -> Self::Output {
    self.neg_op()
  }
}

impl<'t> Neg for &Var<'t> {
  type Output = Var<'t>;

  #[inline(always)]
  fn neg(self) -> Self::Output {
    self.neg_op()
  }
}

/// `^` is sugar for [`Var::pow`], since the exponent is a plain number.
///
/// Mind the precedence: `a ^ 2.0 + 1.0` parses as `a ^ (2.0 + 1.0)`.
impl<'t> BitXor<f64> for Var<'t> {
  type Output = Var<'t>;

  #[inline(always)]
  fn bitxor(self, exponent: f64) -> Self::Output {
    self.pow(exponent)
  }
}

impl<'t> BitXor<f64> for &Var<'t> {
  type Output = Var<'t>;

  #[inline(always)]
  fn bitxor(self, exponent: f64) -> Self::Output {
    self.pow(exponent)
  }
}

use thiserror::Error;

use crate::share::Idx;

/// Errors raised by polynomial construction, combination, and recovery.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolyError {
    /// `t < 2` or `t > n` when constructing a polynomial or requesting shares.
    #[error("invalid threshold {0}: {1}")]
    InvalidThreshold(usize, &'static str),

    /// `Add`/combining two polynomials (or commitments) of different length.
    #[error("threshold mismatch: {0} vs {1}")]
    ThresholdMismatch(usize, usize),

    /// Two [`crate::PubPoly`]s were combined but commit to different base points.
    #[error("cannot combine public polynomials committed to different base points")]
    BaseMismatch,

    /// Recovery was attempted with fewer than `t` distinct shares.
    #[error("not enough shares for recovery: got {0}, need {1}")]
    NotEnoughShares(usize, usize),

    /// The same share index appeared more than once in a recovery input.
    #[error("duplicate share index {0}")]
    DuplicateIndex(Idx),

    /// A Lagrange denominator was zero, which cannot happen for honestly
    /// distinct indices but is surfaced rather than silently producing a
    /// bogus zero coefficient.
    #[error("could not invert a Lagrange denominator")]
    NoInverse,
}

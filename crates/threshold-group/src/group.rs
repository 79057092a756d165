//! Traits for operating on scalars and points of a prime-order group.

use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};

/// An element of an additive group, equipped with a multiplication against
/// some right-hand-side type. Scalars form a ring so `RHS = Self`; points can
/// only be multiplied by the curve's scalar.
pub trait Element:
    Clone + Display + Debug + Eq + Serialize + for<'a> Deserialize<'a> + PartialEq + Send + Sync
{
    /// The right-hand-side argument for multiplication.
    type RHS;

    /// Returns the neutral (zero) element.
    fn new() -> Self;

    /// Returns the multiplicative identity (one) element.
    fn one() -> Self;

    /// Adds `s2` to `self` in place.
    fn add(&mut self, s2: &Self);

    /// Multiplies `self` by `mul` in place.
    fn mul(&mut self, mul: &Self::RHS);

    /// Samples a uniformly random element using the provided RNG.
    fn rand<R: RngCore>(rng: &mut R) -> Self;

    /// Returns the neutral (zero) element. Defaults to [`Element::new`].
    fn zero() -> Self {
        Self::new()
    }
}

/// A scalar of the curve's prime field. Scalars can be inverted, negated, and
/// subtracted, none of which make sense for a generic group point.
pub trait Scalar: Element<RHS = Self> {
    /// Sets `self` to the field element corresponding to the integer `i`.
    fn set_int(&mut self, i: u64);

    /// Returns the multiplicative inverse, or `None` if `self` is zero.
    fn inverse(&self) -> Option<Self>;

    /// Negates `self` in place.
    fn negate(&mut self);

    /// Subtracts `other` from `self` in place.
    fn sub(&mut self, other: &Self);

    /// Attempts to interpret `bytes` as a field element, reducing modulo the
    /// field order. Used to derive ECIES session keys and the VSS session id.
    fn from_random_bytes(bytes: &[u8]) -> Option<Self>;

    /// The length in bytes of the canonical encoding of this scalar.
    fn serialized_size(&self) -> usize;
}

/// A point of the curve's group, multipliable by a [`Scalar`].
pub trait Point: Element {
    /// The error that can occur while hashing arbitrary bytes to the curve.
    type Error: Debug;

    /// Maps `data` to a group element via a domain-separated hash-to-curve.
    /// Used to derive independent, "nothing up my sleeve" generators such as
    /// the Pedersen commitment's second generator `H`.
    fn map(&mut self, data: &[u8]) -> Result<(), <Self as Point>::Error>;
}

/// Binds a scalar type and a point type into a single curve. Every layer
/// above this crate is generic over `Curve` rather than any concrete group.
pub trait Curve: Clone + Debug + Send + Sync {
    /// The curve's scalar field.
    type Scalar: Scalar;

    /// The curve's point group.
    type Point: Point<RHS = Self::Scalar>;

    /// Returns the additive identity of the scalar field.
    fn scalar() -> Self::Scalar {
        Self::Scalar::new()
    }

    /// Returns the curve's standard additive generator.
    fn point() -> Self::Point {
        Self::Point::one()
    }
}

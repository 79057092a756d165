//! Concrete curve instantiations of the [`crate::group`] traits.

pub mod bls12381;

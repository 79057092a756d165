//! Scalar/point abstraction over a prime-order group.
//!
//! This crate is the leaf of the workspace: the `group` module defines the
//! capability set (`Element`, `Scalar`, `Point`, `Curve`) that every other
//! crate in the workspace is generic over, and `curve::bls12381` ships one
//! concrete instantiation of it (BLS12-381's `G1` and scalar field) so the
//! rest of the workspace is directly usable without requiring callers to
//! bring their own curve.

pub mod curve;
pub mod group;

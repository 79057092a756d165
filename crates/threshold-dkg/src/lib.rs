//! Distributed key generation on top of Pedersen verifiable secret sharing:
//! a group of participants jointly produce a shared public key with no
//! single party ever holding the corresponding private key, each instead
//! holding a Shamir share of it.

mod dkg;
mod errors;
mod group;

pub use dkg::{DistKeyShare, Dkg, Phase, Policy};
pub use errors::DkgError;
pub use group::{default_threshold, minimum_threshold, Group, Node};

pub use threshold_vss::{Deal, Justification, Response, Status};

//! Pedersen verifiable secret sharing on top of [`threshold_poly`]: a
//! dealer seals shares of two blinded polynomials to every participant via
//! ECIES, each recipient verifies its share against broadcast Pedersen
//! commitments, and complaints are resolved via justifications until a deal
//! is either certified or disqualified.

pub mod ecies;
mod errors;
mod pedersen;

pub use ecies::EciesCipher;
pub use errors::VssError;
pub use pedersen::{generators, Dealer, Deal, Justification, Response, Status, Verifier};

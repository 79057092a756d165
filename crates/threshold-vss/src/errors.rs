use thiserror::Error;
use threshold_poly::{Idx, PolyError};

/// Errors raised while dealing, verifying, or certifying a Pedersen VSS
/// session.
#[derive(Debug, Error)]
pub enum VssError {
    /// The underlying polynomial layer rejected a construction or recovery.
    #[error(transparent)]
    Poly(#[from] PolyError),

    /// A share or deal payload could not be (de)serialized.
    #[error("(de)serialization failed: {0}")]
    Encoding(#[from] bincode::Error),

    /// A Deal names a recipient index outside `[0, n)`.
    #[error("recipient index {0} out of bounds for a group of size {1}")]
    OutOfBounds(Idx, usize),

    /// A response was already recorded for this `(dealer, verifier)` pair.
    #[error("duplicate response from verifier {0} for dealer {1}")]
    DuplicateResponse(Idx, Idx),

    /// The Deal's ciphertext could not be decrypted (tampered, or sealed to
    /// a different key).
    #[error("could not decrypt deal from dealer {0}")]
    InvalidCiphertext(Idx),

    /// The Deal's authentication tag does not match what the commitments
    /// and session id imply.
    #[error("invalid authentication tag on deal from dealer {0}")]
    InvalidTag(Idx),

    /// The decrypted share does not satisfy the Pedersen commitment check.
    #[error("share from dealer {0} does not match its commitments")]
    CommitmentMismatch(Idx),

    /// A justification still fails the commitment check after being
    /// revealed in the clear.
    #[error("justification from dealer {0} for verifier {1} is invalid")]
    InvalidJustification(Idx, Idx),

    /// A Response or Justification names a dealer this node has not yet
    /// processed a Deal for.
    #[error("no verifier tracking dealer {0} yet; process its Deal first")]
    UnknownDealer(Idx),

    /// `Certify`/equivalent was called before the certification predicate
    /// was satisfied.
    #[error("dealer {0} is not yet certified")]
    NotCertified(Idx),
}

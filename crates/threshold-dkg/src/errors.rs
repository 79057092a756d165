use thiserror::Error;
use threshold_poly::Idx;
use threshold_vss::VssError;

/// Errors raised while driving the DKG state machine.
#[derive(Debug, Error)]
pub enum DkgError {
    /// The VSS layer (polynomial construction, deal verification,
    /// certification bookkeeping) rejected an operation.
    #[error(transparent)]
    Vss(#[from] VssError),

    /// The private key supplied to [`crate::Dkg::new`] does not match any
    /// public key in the participant list.
    #[error("public key not found in participant list")]
    PublicKeyNotFound,

    /// A group was constructed with a threshold outside `[min, n]`.
    #[error("threshold {0} is not in range [{1}, {2}]")]
    InvalidGroupThreshold(usize, usize, usize),

    /// A Deal, Response, or Justification was already processed for this
    /// dealer/verifier pair.
    #[error("dealer {0} already processed")]
    Duplicate(Idx),

    /// A Response or Justification named a dealer this node has not yet
    /// seen a Deal for.
    #[error("no deal received yet for dealer {0}")]
    UnknownDealer(Idx),

    /// `dist_key_share` was requested before the QUAL set was finalized.
    #[error("dkg is not yet certified: only {0}/{1} participants qualified")]
    NotCertified(usize, usize),

    /// `Renew` was given two shares at different indices.
    #[error("renew operands have different share indices: {0} vs {1}")]
    IndexMismatch(Idx, Idx),

    /// `Renew`'s refresh share does not commit to a zero secret.
    #[error("renew's refresh share has a non-zero distributed public key")]
    NonZeroRefresh,
}

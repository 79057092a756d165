//! Private and public polynomials over a prime-order group, and Lagrange
//! recovery of a shared secret, its commitment, or the full sharing
//! polynomial from a threshold of shares.

mod errors;
mod poly;
mod recover;
mod share;

pub use errors::PolyError;
pub use poly::{PriPoly, PubPoly};
pub use recover::{recover_commit, recover_pri_poly, recover_secret};
pub use share::{Idx, PriShare, PubShare};

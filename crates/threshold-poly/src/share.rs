use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use threshold_group::group::Curve;

/// A share index. Shares are one-indexed in the scalar field (share `i` is
/// the polynomial evaluated at `i+1`), but are kept zero-indexed here so they
/// line up directly with a participant's position in a group/list.
pub type Idx = u32;

/// A share `(i, v)` of a private polynomial: `v = f(i+1)` for some `f`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "C::Scalar: DeserializeOwned")]
pub struct PriShare<C: Curve> {
    /// The share's index.
    pub index: Idx,
    /// The share's value, `f(index + 1)`.
    pub value: C::Scalar,
}

impl<C: Curve> PartialEq for PriShare<C> {
    fn eq(&self, other: &Self) -> bool {
        // Compare both fields unconditionally rather than short-circuiting
        // on the index first, to avoid branching on the (secret-derived)
        // share value before the index is known to differ.
        let index_eq = self.index == other.index;
        let value_eq = self.value == other.value;
        index_eq & value_eq
    }
}
impl<C: Curve> Eq for PriShare<C> {}

impl<C: Curve> fmt::Display for PriShare<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{ index: {}, value: {} }}", self.index, self.value)
    }
}

/// A share `(i, V)` of a public polynomial: `V = f(i+1)·B` for some `f`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "C::Scalar: DeserializeOwned")]
pub struct PubShare<C: Curve> {
    /// The share's index.
    pub index: Idx,
    /// The share's value, `f(index + 1)·B`.
    pub value: C::Point,
}

impl<C: Curve> PartialEq for PubShare<C> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.value == other.value
    }
}
impl<C: Curve> Eq for PubShare<C> {}

impl<C: Curve> fmt::Display for PubShare<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{ index: {}, value: {} }}", self.index, self.value)
    }
}

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use threshold_group::group::Curve;
use threshold_poly::Idx;

/// A participant in the DKG, identified by its index and its long-term
/// public key.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
pub struct Node<C: Curve>(Idx, C::Point);

impl<C: Curve> Node<C> {
    pub fn new(index: Idx, public: C::Point) -> Self {
        Self(index, public)
    }

    /// The node's index.
    pub fn id(&self) -> Idx {
        self.0
    }

    /// The node's long-term public key.
    pub fn key(&self) -> &C::Point {
        &self.1
    }
}

/// The minimum allowed threshold: a bare majority.
pub fn minimum_threshold(n: usize) -> usize {
    (((n as f64) / 2.0) + 1.0) as usize
}

/// The default threshold this crate suggests when none is specified: a
/// two-thirds supermajority.
pub fn default_threshold(n: usize) -> usize {
    (((n as f64) * 2.0 / 3.0) + 1.0) as usize
}

/// An ordered set of participants with an associated threshold.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq, Debug)]
#[serde(bound = "C::Scalar: DeserializeOwned")]
pub struct Group<C: Curve> {
    pub nodes: Vec<Node<C>>,
    pub threshold: usize,
}

impl<C: Curve> Group<C> {
    /// Builds a group with the default (two-thirds) threshold.
    pub fn from_list(nodes: Vec<Node<C>>) -> Self {
        let n = nodes.len();
        Self {
            nodes,
            threshold: default_threshold(n),
        }
    }

    /// Builds a group with an explicit threshold, rejecting one outside
    /// `[minimum_threshold(n), n]`.
    pub fn new(nodes: Vec<Node<C>>, threshold: usize) -> Result<Self, crate::errors::DkgError> {
        let min = minimum_threshold(nodes.len());
        let max = nodes.len();
        if threshold < min || threshold > max {
            return Err(crate::errors::DkgError::InvalidGroupThreshold(
                threshold, min, max,
            ));
        }
        Ok(Self { nodes, threshold })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finds the index of the node holding `public`, if any.
    pub fn index(&self, public: &C::Point) -> Option<Idx> {
        self.nodes.iter().find(|n| &n.1 == public).map(|n| n.0)
    }

    pub fn contains_index(&self, idx: Idx) -> bool {
        self.nodes.iter().any(|n| n.0 == idx)
    }

    /// The participants' public keys, in index order.
    pub fn public_keys(&self) -> Vec<C::Point> {
        self.nodes.iter().map(|n| n.1.clone()).collect()
    }
}

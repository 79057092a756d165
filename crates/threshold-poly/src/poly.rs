use rand_core::RngCore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use threshold_group::group::{Curve, Element, Point, Scalar};

use crate::errors::PolyError;
use crate::share::{Idx, PriShare, PubShare};

/// A private polynomial `f(x) = a_0 + a_1*x + ... + a_{t-1}*x^{t-1}` over the
/// curve's scalar field. `a_0` is the secret; the threshold `t` is the
/// number of coefficients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "C::Scalar: DeserializeOwned")]
pub struct PriPoly<C: Curve>(Vec<C::Scalar>);

impl<C: Curve> PartialEq for PriPoly<C> {
    /// Constant-time over the scalar representation: every coefficient pair
    /// is compared, and the lengths must match, before any short-circuit.
    fn eq(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        self.0
            .iter()
            .zip(other.0.iter())
            .fold(true, |acc, (a, b)| acc & (a == b))
    }
}
impl<C: Curve> Eq for PriPoly<C> {}

impl<C: Curve> PriPoly<C> {
    /// Samples a polynomial of threshold `t` (i.e. degree `t-1`). If `secret`
    /// is provided it becomes `a_0`; otherwise `a_0` is sampled too.
    pub fn new<R: RngCore>(
        t: usize,
        secret: Option<C::Scalar>,
        rng: &mut R,
    ) -> Result<Self, PolyError> {
        if t < 2 {
            return Err(PolyError::InvalidThreshold(t, "threshold must be >= 2"));
        }

        let mut coeffs: Vec<C::Scalar> = (0..t).map(|_| C::Scalar::rand(rng)).collect();
        if let Some(s) = secret {
            coeffs[0] = s;
        }

        Ok(Self(coeffs))
    }

    /// Builds a polynomial directly from its coefficients, `a_0` first. This
    /// is the inverse of [`PriPoly::coefficients`]; re-importing exported
    /// coefficients always yields an equal polynomial.
    pub fn from_coefficients(coeffs: Vec<C::Scalar>) -> Result<Self, PolyError> {
        if coeffs.len() < 2 {
            return Err(PolyError::InvalidThreshold(
                coeffs.len(),
                "threshold must be >= 2",
            ));
        }
        Ok(Self(coeffs))
    }

    /// Returns the polynomial's threshold (its number of coefficients).
    pub fn threshold(&self) -> usize {
        self.0.len()
    }

    /// Returns the free coefficient `a_0`, the shared secret.
    pub fn secret(&self) -> &C::Scalar {
        &self.0[0]
    }

    /// Exports the coefficients, `a_0` first.
    pub fn coefficients(&self) -> Vec<C::Scalar> {
        self.0.clone()
    }

    /// Evaluates the polynomial at `x = index + 1` via Horner's rule. Index
    /// `0` is never evaluated at `x = 0`, since that would reveal the secret.
    pub fn eval(&self, index: Idx) -> PriShare<C> {
        let mut x = C::Scalar::new();
        x.set_int(u64::from(index) + 1);

        PriShare {
            index,
            value: self.eval_at(&x),
        }
    }

    /// Evaluates the polynomial at an arbitrary scalar `x` via Horner's rule,
    /// rather than at a share index. Used to derive values tied to something
    /// other than a participant index, such as a session identifier.
    pub fn eval_at(&self, x: &C::Scalar) -> C::Scalar {
        self.0.iter().rev().fold(C::Scalar::zero(), |mut acc, a| {
            acc.mul(x);
            acc.add(a);
            acc
        })
    }

    /// Produces `n` ordered shares, share `i` being `(i, f(i+1))`.
    pub fn shares(&self, n: usize) -> Result<Vec<PriShare<C>>, PolyError> {
        let t = self.threshold();
        if n < t {
            return Err(PolyError::InvalidThreshold(n, "n must be >= threshold"));
        }
        Ok((0..n as Idx).map(|i| self.eval(i)).collect())
    }

    /// Commits the polynomial to the group, returning `A_k = a_k * base` for
    /// every coefficient. Uses the curve's standard generator if `base` is
    /// `None`.
    pub fn commit(&self, base: Option<&C::Point>) -> PubPoly<C> {
        let default_base = C::Point::one();
        let base = base.unwrap_or(&default_base).clone();

        let commits = self
            .0
            .iter()
            .map(|a| {
                let mut commitment = base.clone();
                commitment.mul(a);
                commitment
            })
            .collect();

        PubPoly { base, commits }
    }

    /// Returns `self + other`, coefficient-wise. Both polynomials must share
    /// the same threshold.
    pub fn add(&self, other: &Self) -> Result<Self, PolyError> {
        if self.threshold() != other.threshold() {
            return Err(PolyError::ThresholdMismatch(
                self.threshold(),
                other.threshold(),
            ));
        }

        let coeffs = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| {
                let mut sum = a.clone();
                sum.add(b);
                sum
            })
            .collect();

        Ok(Self(coeffs))
    }

    /// Returns the convolution `self * other`: a polynomial of length
    /// `len(self) + len(other) - 1`, i.e. degree `deg(self) + deg(other)`.
    pub fn mul(&self, other: &Self) -> Self {
        let d = self.0.len() + other.0.len() - 1;
        let mut coeffs = vec![C::Scalar::zero(); d];

        for (i, a) in self.0.iter().enumerate() {
            for (j, b) in other.0.iter().enumerate() {
                let mut term = a.clone();
                term.mul(b);
                coeffs[i + j].add(&term);
            }
        }

        Self(coeffs)
    }
}

impl<C: Curve> fmt::Display for PriPoly<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PriPoly(threshold={})", self.threshold())
    }
}

/// A public polynomial: a base point `B` plus the commitments `A_k = a_k*B`
/// to some private polynomial's coefficients. `A_0` is that polynomial's
/// commit (its distributed public key, in the DKG context).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "C::Scalar: DeserializeOwned")]
pub struct PubPoly<C: Curve> {
    base: C::Point,
    commits: Vec<C::Point>,
}

impl<C: Curve> PartialEq for PubPoly<C> {
    fn eq(&self, other: &Self) -> bool {
        self.base == other.base && self.commits == other.commits
    }
}
impl<C: Curve> Eq for PubPoly<C> {}

impl<C: Curve> PubPoly<C> {
    /// Builds a public polynomial directly from a base point and its
    /// commitments. Used when deserializing a received commitment vector.
    pub fn new(base: C::Point, commits: Vec<C::Point>) -> Self {
        Self { base, commits }
    }

    /// Returns the polynomial's threshold (its number of commitments).
    pub fn threshold(&self) -> usize {
        self.commits.len()
    }

    /// The base point every commitment is expressed against.
    pub fn base(&self) -> &C::Point {
        &self.base
    }

    /// Returns `A_0`, the commit to the underlying secret.
    pub fn commit(&self) -> &C::Point {
        &self.commits[0]
    }

    /// Exports the raw commitments, `A_0` first.
    pub fn commitments(&self) -> Vec<C::Point> {
        self.commits.clone()
    }

    /// Evaluates `Sum A_k * (index+1)^k` via Horner's rule.
    pub fn eval(&self, index: Idx) -> PubShare<C> {
        let mut x = C::Scalar::new();
        x.set_int(u64::from(index) + 1);

        PubShare {
            index,
            value: self.eval_at(&x),
        }
    }

    /// Evaluates `Sum A_k * x^k` at an arbitrary scalar `x`, rather than at a
    /// share index.
    pub fn eval_at(&self, x: &C::Scalar) -> C::Point {
        self.commits.iter().rev().fold(C::Point::zero(), |mut acc, a| {
            acc.mul(x);
            acc.add(a);
            acc
        })
    }

    /// Returns `self + other`. Both must share the same threshold and be
    /// committed against the same base point.
    pub fn add(&self, other: &Self) -> Result<Self, PolyError> {
        if self.threshold() != other.threshold() {
            return Err(PolyError::ThresholdMismatch(
                self.threshold(),
                other.threshold(),
            ));
        }
        if self.base != other.base {
            return Err(PolyError::BaseMismatch);
        }

        let commits = self
            .commits
            .iter()
            .zip(other.commits.iter())
            .map(|(a, b)| {
                let mut sum = a.clone();
                sum.add(b);
                sum
            })
            .collect();

        Ok(Self {
            base: self.base.clone(),
            commits,
        })
    }

    /// Checks that `share` is consistent with this commitment: that
    /// `share.value * base == eval(share.index).value`.
    pub fn check(&self, share: &PriShare<C>) -> bool {
        let mut expected = self.base.clone();
        expected.mul(&share.value);
        self.eval(share.index).value == expected
    }
}

impl<C: Curve> fmt::Display for PubPoly<C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PubPoly(threshold={})", self.threshold())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;
    use threshold_group::curve::bls12381::{Curve as BCurve, G1};

    type Sc = <BCurve as Curve>::Scalar;

    #[test]
    fn threshold_respected() {
        let p = PriPoly::<BCurve>::new(5, None, &mut thread_rng()).unwrap();
        assert_eq!(p.threshold(), 5);
    }

    #[test]
    fn rejects_low_threshold() {
        PriPoly::<BCurve>::new(1, None, &mut thread_rng()).unwrap_err();
    }

    #[test]
    fn secret_is_a0() {
        let secret = Sc::rand(&mut thread_rng());
        let p = PriPoly::<BCurve>::new(4, Some(secret.clone()), &mut thread_rng()).unwrap();
        assert_eq!(p.secret(), &secret);
    }

    #[test]
    fn eval_zero_would_leak_secret_so_is_not_offered() {
        // eval() is always called at i+1; there is no way to evaluate at x=0
        // through the public API.
        let p = PriPoly::<BCurve>::new(3, None, &mut thread_rng()).unwrap();
        let share0 = p.eval(0);
        assert_ne!(&share0.value, p.secret());
    }

    #[test]
    fn shares_rejects_n_below_threshold() {
        let p = PriPoly::<BCurve>::new(5, None, &mut thread_rng()).unwrap();
        p.shares(4).unwrap_err();
        assert_eq!(p.shares(5).unwrap().len(), 5);
    }

    #[test]
    fn commit_homomorphism() {
        let p = PriPoly::<BCurve>::new(4, None, &mut thread_rng()).unwrap();
        let q = PriPoly::<BCurve>::new(4, None, &mut thread_rng()).unwrap();

        let sum = p.add(&q).unwrap();
        let lhs = sum.commit(None);
        let rhs = p.commit(None).add(&q.commit(None)).unwrap();
        assert_eq!(lhs, rhs);

        let mut secret_sum = p.secret().clone();
        secret_sum.add(q.secret());
        assert_eq!(sum.secret(), &secret_sum);
    }

    #[test]
    fn add_commutative_and_associative() {
        let p = PriPoly::<BCurve>::new(3, None, &mut thread_rng()).unwrap();
        let q = PriPoly::<BCurve>::new(3, None, &mut thread_rng()).unwrap();
        let r = PriPoly::<BCurve>::new(3, None, &mut thread_rng()).unwrap();

        let pq_r = p.add(&q).unwrap().add(&r).unwrap();
        let pr_q = p.add(&r).unwrap().add(&q).unwrap();
        assert_eq!(pq_r, pr_q);

        let cpq_r = p.commit(None).add(&q.commit(None)).unwrap().add(&r.commit(None)).unwrap();
        let cpr_q = p.commit(None).add(&r.commit(None)).unwrap().add(&q.commit(None)).unwrap();
        assert_eq!(cpq_r, cpr_q);
    }

    #[test]
    fn add_rejects_threshold_mismatch() {
        let p = PriPoly::<BCurve>::new(3, None, &mut thread_rng()).unwrap();
        let q = PriPoly::<BCurve>::new(4, None, &mut thread_rng()).unwrap();
        p.add(&q).unwrap_err();
    }

    #[test]
    fn mul_shape_and_value() {
        let a = PriPoly::<BCurve>::new(3, None, &mut thread_rng()).unwrap();
        let b = PriPoly::<BCurve>::new(3, None, &mut thread_rng()).unwrap();
        let prod = a.mul(&b);
        assert_eq!(prod.threshold(), 5);

        let mut a0b0 = a.coefficients()[0].clone();
        a0b0.mul(&b.coefficients()[0]);
        assert_eq!(prod.coefficients()[0], a0b0);

        // evaluating the product at x=2 (i.e. index=1) equals a(2)*b(2)
        let mut expected = a.eval(1).value;
        expected.mul(&b.eval(1).value);
        assert_eq!(prod.eval(1).value, expected);
    }

    #[test]
    fn coefficients_roundtrip() {
        let p = PriPoly::<BCurve>::new(6, None, &mut thread_rng()).unwrap();
        let roundtripped = PriPoly::<BCurve>::from_coefficients(p.coefficients()).unwrap();
        assert_eq!(p, roundtripped);
    }

    #[test]
    fn pubpoly_check_every_share_and_rejects_tamper() {
        let p = PriPoly::<BCurve>::new(4, None, &mut thread_rng()).unwrap();
        let commit = p.commit(None);

        for share in p.shares(10).unwrap() {
            assert!(commit.check(&share));
        }

        let mut bad = p.eval(0);
        bad.value.add(&Sc::one());
        assert!(!commit.check(&bad));
    }

    #[test]
    fn commit_with_custom_base() {
        let mut base = G1::new();
        base.map(b"some-other-generator").unwrap();

        let p = PriPoly::<BCurve>::new(4, None, &mut thread_rng()).unwrap();
        let c = p.commit(Some(&base));
        assert_eq!(c.base(), &base);

        for share in p.shares(4).unwrap() {
            assert!(c.check(&share));
        }
    }
}

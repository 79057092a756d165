use std::collections::HashSet;

use tracing::trace;

use threshold_group::group::{Curve, Element, Point, Scalar};

use crate::errors::PolyError;
use crate::poly::{PriPoly, PubPoly};
use crate::share::{Idx, PriShare, PubShare};

/// Checks that every share's index is distinct, returning the offending
/// index as [`PolyError::DuplicateIndex`] otherwise. A repeat is treated as
/// a protocol violation rather than silently deduplicated.
fn assert_unique_indices(indices: impl Iterator<Item = Idx>) -> Result<(), PolyError> {
    let mut seen = HashSet::new();
    for idx in indices {
        if !seen.insert(idx) {
            return Err(PolyError::DuplicateIndex(idx));
        }
    }
    Ok(())
}

/// Computes the Lagrange coefficient `l_i(0) = Prod_{j != i} x_j / (x_j - x_i)`
/// for share `i` among the given indices, where `x_k = k + 1`.
fn lagrange_basis<S: Scalar>(i: Idx, indices: &[Idx]) -> Result<S, PolyError> {
    let mut xi = S::new();
    xi.set_int(u64::from(i) + 1);

    let mut acc = S::one();
    for &j in indices {
        if j == i {
            continue;
        }

        let mut xj = S::new();
        xj.set_int(u64::from(j) + 1);

        let mut num = xj.clone();
        let mut den = xj;
        den.sub(&xi);
        let den_inv = den.inverse().ok_or(PolyError::NoInverse)?;

        num.mul(&den_inv);
        acc.mul(&num);
    }

    trace!(share = i, basis_over = indices.len(), "computed lagrange basis");
    Ok(acc)
}

/// Recovers the secret `f(0)` from at least `t` distinct private shares via
/// Lagrange interpolation at `x = 0`.
pub fn recover_secret<C: Curve>(
    shares: &[PriShare<C>],
    t: usize,
) -> Result<C::Scalar, PolyError> {
    if shares.len() < t {
        return Err(PolyError::NotEnoughShares(shares.len(), t));
    }

    assert_unique_indices(shares.iter().map(|s| s.index))?;

    let indices: Vec<Idx> = shares.iter().take(t).map(|s| s.index).collect();

    let mut secret = C::Scalar::zero();
    for share in shares.iter().take(t) {
        let coeff: C::Scalar = lagrange_basis(share.index, &indices)?;
        let mut term = share.value.clone();
        term.mul(&coeff);
        secret.add(&term);
    }

    Ok(secret)
}

/// Recovers the commitment `A_0 = f(0)·B` from at least `t` distinct public
/// shares, without ever learning the secret itself.
pub fn recover_commit<C: Curve>(
    shares: &[PubShare<C>],
    t: usize,
) -> Result<C::Point, PolyError> {
    if shares.len() < t {
        return Err(PolyError::NotEnoughShares(shares.len(), t));
    }

    assert_unique_indices(shares.iter().map(|s| s.index))?;

    let indices: Vec<Idx> = shares.iter().take(t).map(|s| s.index).collect();

    let mut commit = C::Point::zero();
    for share in shares.iter().take(t) {
        let coeff: C::Scalar = lagrange_basis(share.index, &indices)?;
        let mut term = share.value.clone();
        term.mul(&coeff);
        commit.add(&term);
    }

    Ok(commit)
}

/// Recovers the full private polynomial from at least `t` distinct private
/// shares via Lagrange interpolation over all its coefficients, not just the
/// constant term. Used to recombine a refreshed sharing during `Renew`.
pub fn recover_pri_poly<C: Curve>(
    shares: &[PriShare<C>],
    t: usize,
) -> Result<PriPoly<C>, PolyError> {
    if shares.len() < t {
        return Err(PolyError::NotEnoughShares(shares.len(), t));
    }

    assert_unique_indices(shares.iter().map(|s| s.index))?;

    let indices: Vec<Idx> = shares.iter().take(t).map(|s| s.index).collect();

    // x_j values and their Lagrange basis polynomials' coefficients, built up
    // via the standard product-then-divide-out-factor construction.
    let mut acc: Option<PriPoly<C>> = None;
    for share in shares.iter().take(t) {
        let basis = lagrange_poly::<C>(share.index, &indices)?;
        let mut scaled = basis.coefficients();
        for c in scaled.iter_mut() {
            c.mul(&share.value);
        }
        let scaled_poly = PriPoly::<C>::from_coefficients(pad_to(scaled, t))?;

        acc = Some(match acc {
            None => scaled_poly,
            Some(sum) => sum.add(&scaled_poly)?,
        });
    }

    acc.ok_or(PolyError::NotEnoughShares(0, t))
}

fn pad_to<S: Scalar>(mut v: Vec<S>, t: usize) -> Vec<S> {
    while v.len() < t {
        v.push(S::zero());
    }
    v
}

/// Builds the Lagrange basis polynomial `l_i(x)` (as a full set of
/// coefficients, not just its value at 0) for share `i` among `indices`, via
/// repeated polynomial multiplication by `(x - x_j)/(x_j - x_i)` factors.
fn lagrange_poly<C: Curve>(i: Idx, indices: &[Idx]) -> Result<PriPoly<C>, PolyError> {
    let mut xi = C::Scalar::new();
    xi.set_int(u64::from(i) + 1);

    // Start from the constant polynomial "1".
    let mut coeffs = vec![C::Scalar::one()];

    for &j in indices {
        if j == i {
            continue;
        }

        let mut xj = C::Scalar::new();
        xj.set_int(u64::from(j) + 1);

        let mut den = xj.clone();
        den.sub(&xi);
        let den_inv = den.inverse().ok_or(PolyError::NoInverse)?;

        // Multiply the running product by (x - x_j) * den_inv, i.e. the
        // linear factor [-x_j, 1] scaled by den_inv.
        let mut neg_xj = xj;
        neg_xj.negate();

        let mut next = vec![C::Scalar::zero(); coeffs.len() + 1];
        for (k, c) in coeffs.iter().enumerate() {
            let mut const_term = c.clone();
            const_term.mul(&neg_xj);
            next[k].add(&const_term);

            next[k + 1].add(c);
        }
        for c in next.iter_mut() {
            c.mul(&den_inv);
        }
        coeffs = next;
    }

    if coeffs.len() < 2 {
        coeffs.push(C::Scalar::zero());
    }
    PriPoly::<C>::from_coefficients(coeffs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;
    use threshold_group::curve::bls12381::Curve as BCurve;

    #[test]
    fn recovers_secret_at_threshold() {
        let p = PriPoly::<BCurve>::new(5, None, &mut thread_rng()).unwrap();
        let shares = p.shares(10).unwrap();

        let recovered = recover_secret::<BCurve>(&shares[0..5], 5).unwrap();
        assert_eq!(&recovered, p.secret());
    }

    #[test]
    fn recovers_secret_from_any_subset() {
        let p = PriPoly::<BCurve>::new(4, None, &mut thread_rng()).unwrap();
        let shares = p.shares(10).unwrap();

        let subset_a: Vec<_> = shares[2..6].to_vec();
        let subset_b: Vec<_> = shares[4..8].to_vec();

        assert_eq!(
            recover_secret::<BCurve>(&subset_a, 4).unwrap(),
            *p.secret()
        );
        assert_eq!(
            recover_secret::<BCurve>(&subset_b, 4).unwrap(),
            *p.secret()
        );
    }

    #[test]
    fn rejects_too_few_shares() {
        let p = PriPoly::<BCurve>::new(5, None, &mut thread_rng()).unwrap();
        let shares = p.shares(10).unwrap();
        recover_secret::<BCurve>(&shares[0..4], 5).unwrap_err();
    }

    #[test]
    fn rejects_duplicate_indices() {
        let p = PriPoly::<BCurve>::new(3, None, &mut thread_rng()).unwrap();
        let mut shares = p.shares(5).unwrap();
        shares[1] = shares[0].clone();

        let err = recover_secret::<BCurve>(&shares[0..3], 3).unwrap_err();
        assert_eq!(err, PolyError::DuplicateIndex(shares[0].index));
    }

    #[test]
    fn recovers_commit_matching_poly_commit() {
        let p = PriPoly::<BCurve>::new(4, None, &mut thread_rng()).unwrap();
        let pub_poly = p.commit(None);
        let pub_shares: Vec<_> = p
            .shares(8)
            .unwrap()
            .iter()
            .map(|s| pub_poly.eval(s.index))
            .collect();

        let recovered = recover_commit::<BCurve>(&pub_shares[0..4], 4).unwrap();
        assert_eq!(&recovered, pub_poly.commit());
    }

    #[test]
    fn recovers_full_private_polynomial() {
        let p = PriPoly::<BCurve>::new(4, None, &mut thread_rng()).unwrap();
        let shares = p.shares(8).unwrap();

        let recovered = recover_pri_poly::<BCurve>(&shares[0..4], 4).unwrap();
        assert_eq!(recovered, p);
    }

    use proptest::prelude::*;

    proptest! {
        // any threshold-sized window of shares, anywhere in a larger
        // sharing, recovers the same secret.
        #[test]
        fn any_window_recovers_same_secret(t in 2..12usize, extra in 0..12usize, offset in 0..12usize) {
            let n = t + extra + offset;
            let p = PriPoly::<BCurve>::new(t, None, &mut thread_rng()).unwrap();
            let shares = p.shares(n).unwrap();

            let start = offset.min(n - t);
            let window = &shares[start..start + t];
            let recovered = recover_secret::<BCurve>(window, t).unwrap();
            prop_assert_eq!(&recovered, p.secret());
        }
    }
}

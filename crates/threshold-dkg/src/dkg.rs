use std::collections::HashMap;

use rand_core::RngCore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, trace, warn};

use threshold_group::group::{Curve, Element};
use threshold_poly::{Idx, PriShare, PubPoly};
use threshold_vss::{Dealer, Deal, Justification, Response, Status, Verifier};

use crate::errors::DkgError;
use crate::group::Group;

/// Which certification rule decides QUAL membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Every participant must be certified: `|QUAL| == n`.
    Strict,
    /// A bare threshold of certified participants suffices: `|QUAL| >= t`.
    Threshold,
}

impl Default for Policy {
    fn default() -> Self {
        Policy::Strict
    }
}

/// The coarse-grained phase a DKG instance is in. Transitions are driven by
/// calling the corresponding method on [`Dkg`], not by consuming it, since
/// individual Deals/Responses/Justifications arrive one at a time rather
/// than as pre-bundled rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    DealsOut,
    Responses,
    Justifications,
    Qualified,
    Shared,
}

/// The final output of a successful DKG run: this node's share of the
/// jointly generated secret, the distributed public polynomial, and this
/// node's own dealing polynomial (kept so the share can later be reshared
/// or audited).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "C::Scalar: DeserializeOwned")]
pub struct DistKeyShare<C: Curve> {
    /// The distributed public polynomial; `commits.commit()` is the group's
    /// public key.
    pub commits: PubPoly<C>,
    /// This node's share of the distributed secret.
    pub share: PriShare<C>,
    /// This node's own dealing polynomial's coefficients (`a_0` is the
    /// node's personal secret contribution).
    pub private_poly: Vec<C::Scalar>,
}

impl<C: Curve> DistKeyShare<C> {
    /// The distributed public key, `commits.commit()`.
    pub fn public_key(&self) -> &C::Point {
        self.commits.commit()
    }

    /// Combines this share with a zero-secret refresh share at the same
    /// index, producing a new share on the same public key. `refresh` must
    /// itself be the output of a DKG run whose distributed secret is zero
    /// (`refresh.public_key() == identity`).
    pub fn renew(&self, refresh: &DistKeyShare<C>) -> Result<DistKeyShare<C>, DkgError> {
        if self.share.index != refresh.share.index {
            return Err(DkgError::IndexMismatch(self.share.index, refresh.share.index));
        }
        if *refresh.public_key() != C::Point::zero() {
            return Err(DkgError::NonZeroRefresh);
        }

        let commits = self.commits.add(&refresh.commits)?;

        let mut value = self.share.value.clone();
        value.add(&refresh.share.value);

        let mut private_poly = self.private_poly.clone();
        for (a, b) in private_poly.iter_mut().zip(refresh.private_poly.iter()) {
            a.add(b);
        }

        Ok(DistKeyShare {
            commits,
            share: PriShare {
                index: self.share.index,
                value,
            },
            private_poly,
        })
    }
}

// bridges PolyError (surfaced by PubPoly::add) into DkgError without
// requiring every caller to reach into threshold-poly directly
impl From<threshold_poly::PolyError> for DkgError {
    fn from(e: threshold_poly::PolyError) -> Self {
        DkgError::Vss(threshold_vss::VssError::from(e))
    }
}

/// A single participant's view of a full distributed key generation run.
/// Owns one [`Dealer`] (this node's own contribution) and a table of
/// [`Verifier`]s, one per participant whose Deal has been seen, including a
/// self-entry for this node's own Deal.
pub struct Dkg<C: Curve> {
    index: Idx,
    private_key: C::Scalar,
    group: Group<C>,
    policy: Policy,
    dealer: Dealer<C>,
    verifiers: HashMap<Idx, Verifier<C>>,
    phase: Phase,
}

impl<C: Curve> Dkg<C> {
    /// Creates a new DKG instance for `private_key`'s holder, sharing
    /// `secret` among `group`.
    pub fn new<R: RngCore>(
        private_key: C::Scalar,
        secret: C::Scalar,
        group: Group<C>,
        policy: Policy,
        rng: &mut R,
    ) -> Result<Self, DkgError> {
        let mut public_key = C::Point::one();
        public_key.mul(&private_key);

        let index = group
            .index(&public_key)
            .ok_or(DkgError::PublicKeyNotFound)?;

        let dealer = Dealer::<C>::new(
            index,
            &private_key,
            secret,
            group.public_keys(),
            group.threshold,
            rng,
        )?;

        Ok(Self {
            index,
            private_key,
            group,
            policy,
            dealer,
            verifiers: HashMap::new(),
            phase: Phase::Init,
        })
    }

    /// This node's own index.
    pub fn index(&self) -> Idx {
        self.index
    }

    /// The current coarse-grained phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Produces this node's Deal for every participant, and self-processes
    /// its own Deal. Transitions `Init -> DealsOut`.
    ///
    /// Panics if this node's own Deal fails local processing: an honest
    /// dealer's own share always satisfies its own commitments, so failure
    /// here means a bug in this crate rather than misbehavior by a peer.
    pub fn deals<R: RngCore>(&mut self, rng: &mut R) -> Result<Vec<Deal<C>>, DkgError> {
        let deals = self.dealer.deals(rng)?;
        debug!(index = self.index, n = deals.len(), "produced deals");

        let own_deal = deals
            .iter()
            .find(|d| d.dealer_idx == self.index)
            .expect("a dealer always produces a deal addressed to itself")
            .clone();
        let own_response = self
            .process_deal(&own_deal)
            .unwrap_or_else(|e| panic!("self-deal could not be processed, this is a local bug: {e}"));
        assert_eq!(
            own_response.status,
            Status::Approval,
            "self-deal could not be approved, this is a local bug"
        );

        self.phase = Phase::DealsOut;
        Ok(deals)
    }

    /// Processes a Deal addressed to this node (decrypting its own share
    /// with its own private key), returning the Response to broadcast.
    pub fn process_deal(&mut self, deal: &Deal<C>) -> Result<Response, DkgError> {
        if deal.dealer_idx as usize >= self.group.len() {
            return Err(DkgError::Vss(threshold_vss::VssError::OutOfBounds(
                deal.dealer_idx,
                self.group.len(),
            )));
        }
        if self.verifiers.contains_key(&deal.dealer_idx) {
            return Err(DkgError::Duplicate(deal.dealer_idx));
        }

        let mut verifier = Verifier::<C>::new(deal.dealer_idx, self.index, self.group.len(), self.group.threshold);
        let response = verifier.process_deal(deal, &self.private_key)?;
        if response.status != Status::Approval {
            warn!(dealer = deal.dealer_idx, verifier = self.index, "complaint raised against deal");
        } else {
            trace!(dealer = deal.dealer_idx, verifier = self.index, "deal approved");
        }
        self.verifiers.insert(deal.dealer_idx, verifier);

        Ok(response)
    }

    /// Records a broadcast Response. If it concerns this node's own Deal and
    /// reports a `Complaint`, returns the Justification to broadcast.
    pub fn process_response(&mut self, response: &Response) -> Result<Option<Justification<C>>, DkgError> {
        let verifier = self
            .verifiers
            .get_mut(&response.dealer_idx)
            .ok_or(DkgError::UnknownDealer(response.dealer_idx))?;

        verifier.process_response(response)?;
        self.phase = Phase::Responses;

        if response.dealer_idx == self.index && response.status != Status::Approval {
            return Ok(Some(self.dealer.justify(response.verifier_idx)));
        }

        Ok(None)
    }

    /// Records a Justification for the dealer it names.
    pub fn process_justification(&mut self, justification: &Justification<C>) -> Result<(), DkgError> {
        let verifier = self
            .verifiers
            .get_mut(&justification.dealer_idx)
            .ok_or(DkgError::UnknownDealer(justification.dealer_idx))?;
        verifier.process_justification(justification)?;
        self.phase = Phase::Justifications;
        Ok(())
    }

    /// Forces every tracked verifier's missing responses into implicit
    /// complaints, making certification decidable.
    pub fn set_timeout(&mut self) {
        for verifier in self.verifiers.values_mut() {
            verifier.set_timeout();
        }
    }

    /// The set of dealer indices whose deal is certified, sorted ascending.
    pub fn qual(&self) -> Vec<Idx> {
        let mut qual: Vec<Idx> = self
            .verifiers
            .values()
            .filter(|v| v.certified())
            .map(|v| v.dealer_idx())
            .collect();
        qual.sort_unstable();
        qual
    }

    /// Whether the QUAL set satisfies this DKG's [`Policy`].
    pub fn certified(&self) -> bool {
        let qual_len = self.qual().len();
        match self.policy {
            Policy::Strict => qual_len == self.group.len(),
            Policy::Threshold => qual_len >= self.group.threshold,
        }
    }

    /// Derives this node's [`DistKeyShare`] from the qualified dealers.
    /// Fails with `NotCertified` unless [`Dkg::certified`] holds.
    pub fn dist_key_share(&mut self) -> Result<DistKeyShare<C>, DkgError> {
        if !self.certified() {
            return Err(DkgError::NotCertified(self.qual().len(), self.group.len()));
        }
        self.phase = Phase::Qualified;

        let qual = self.qual();
        let mut share_value = C::Scalar::zero();
        let mut global_commits: Option<PubPoly<C>> = None;

        for dealer_idx in &qual {
            let verifier = self
                .verifiers
                .get(dealer_idx)
                .expect("qual only names dealers this node has a verifier for");
            let f_share = verifier
                .own_share()
                .ok_or(DkgError::UnknownDealer(*dealer_idx))?;
            share_value.add(f_share);

            let f_commits = verifier
                .f_commits()
                .ok_or(DkgError::UnknownDealer(*dealer_idx))?;
            global_commits = Some(match global_commits {
                None => f_commits.clone(),
                Some(acc) => acc.add(f_commits)?,
            });
        }

        self.phase = Phase::Shared;
        debug!(index = self.index, qual = qual.len(), "derived distributed key share");

        Ok(DistKeyShare {
            commits: global_commits.ok_or(DkgError::NotCertified(0, self.group.len()))?,
            share: PriShare {
                index: self.index,
                value: share_value,
            },
            private_poly: self.dealer.private_poly_coefficients(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;
    use threshold_group::curve::bls12381::{Curve as BCurve, Scalar as BScalar, G1};

    fn keypair() -> (BScalar, G1) {
        let secret = BScalar::rand(&mut thread_rng());
        let mut public = G1::one();
        public.mul(&secret);
        (secret, public)
    }

    fn group(n: usize) -> (Vec<BScalar>, Group<BCurve>) {
        let pairs: Vec<_> = (0..n).map(|_| keypair()).collect();
        let nodes = pairs
            .iter()
            .enumerate()
            .map(|(i, (_, p))| crate::group::Node::new(i as Idx, p.clone()))
            .collect();
        let group = Group::from_list(nodes);
        (pairs.into_iter().map(|(s, _)| s).collect(), group)
    }

    fn run_honest_round(
        dkgs: &mut [Dkg<BCurve>],
    ) -> (Vec<Vec<Deal<BCurve>>>, Vec<Response>) {
        let n = dkgs.len();
        let deals: Vec<Vec<Deal<BCurve>>> =
            dkgs.iter_mut().map(|d| d.deals(&mut thread_rng()).unwrap()).collect();

        let mut responses = Vec::new();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let r = dkgs[j].process_deal(&deals[i][j]).unwrap();
                responses.push(r);
            }
        }
        (deals, responses)
    }

    fn broadcast_responses(dkgs: &mut [Dkg<BCurve>], responses: &[Response]) {
        for dkg in dkgs.iter_mut() {
            for r in responses {
                // a node already knows its own response, recorded locally
                // when it called process_deal.
                if r.verifier_idx == dkg.index() {
                    continue;
                }
                dkg.process_response(r).unwrap();
            }
        }
    }

    #[test]
    fn full_honest_dkg_certifies_and_agrees_on_public_key() {
        let n = 5;
        let t = 4;
        let (privs, group) = group(n);

        let mut dkgs: Vec<_> = privs
            .into_iter()
            .map(|p| {
                let secret = BScalar::rand(&mut thread_rng());
                Dkg::<BCurve>::new(p, secret, group.clone(), Policy::Strict, &mut thread_rng()).unwrap()
            })
            .collect();
        assert_eq!(group.threshold, t);

        let (_, responses) = run_honest_round(&mut dkgs);
        broadcast_responses(&mut dkgs, &responses);

        for dkg in &dkgs {
            assert!(dkg.certified(), "node {} not certified", dkg.index());
            assert_eq!(dkg.qual().len(), n);
        }

        let shares: Vec<_> = dkgs.iter_mut().map(|d| d.dist_key_share().unwrap()).collect();
        let expected_key = shares[0].public_key().clone();
        for s in &shares[1..] {
            assert_eq!(s.public_key(), &expected_key);
        }
    }

    #[test]
    fn one_undecryptable_deal_excludes_its_dealer_from_qual() {
        let n = 5;
        let (privs, group) = group(n);

        let mut dkgs: Vec<_> = privs
            .iter()
            .cloned()
            .map(|p| {
                let secret = BScalar::rand(&mut thread_rng());
                Dkg::<BCurve>::new(p, secret, group.clone(), Policy::Threshold, &mut thread_rng()).unwrap()
            })
            .collect();

        let mut deals: Vec<Vec<Deal<BCurve>>> =
            dkgs.iter_mut().map(|d| d.deals(&mut thread_rng()).unwrap()).collect();

        // dealer 0's deal to verifier 3 is sealed to the wrong key, so
        // verifier 3 raises a complaint; with no justification round run,
        // the complaint is never cleared and dealer 0 misses QUAL.
        let wrong_recipient = group.nodes[1].key().clone();
        deals[0][3].encrypted_share =
            threshold_vss::ecies::encrypt::<BCurve, _>(&wrong_recipient, b"not the real share", &mut thread_rng());

        let mut responses = Vec::new();
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                responses.push(dkgs[j].process_deal(&deals[i][j]).unwrap());
            }
        }
        broadcast_responses(&mut dkgs, &responses);
        for dkg in dkgs.iter_mut() {
            dkg.set_timeout();
        }

        for dkg in &dkgs {
            let qual = dkg.qual();
            assert!(
                !qual.contains(&0),
                "dealer 0's unjustifiable complaint should exclude it from QUAL"
            );
            assert!(dkg.certified());
        }
    }

    #[test]
    fn renew_preserves_public_key_and_changes_share() {
        let n = 4;
        let (privs, group) = group(n);

        let mut dkgs: Vec<_> = privs
            .iter()
            .cloned()
            .map(|p| {
                let secret = BScalar::rand(&mut thread_rng());
                Dkg::<BCurve>::new(p, secret, group.clone(), Policy::Strict, &mut thread_rng()).unwrap()
            })
            .collect();
        let (_, responses) = run_honest_round(&mut dkgs);
        broadcast_responses(&mut dkgs, &responses);
        let shares: Vec<_> = dkgs.iter_mut().map(|d| d.dist_key_share().unwrap()).collect();

        // a refresh round shares the zero secret among the same group, using
        // the same keypairs so each participant's share index lines up.
        let mut refresh_dkgs: Vec<_> = privs
            .into_iter()
            .map(|p| Dkg::<BCurve>::new(p, BScalar::zero(), group.clone(), Policy::Strict, &mut thread_rng()).unwrap())
            .collect();
        let (_, refresh_responses) = run_honest_round(&mut refresh_dkgs);
        broadcast_responses(&mut refresh_dkgs, &refresh_responses);
        let refresh_shares: Vec<_> = refresh_dkgs.iter_mut().map(|d| d.dist_key_share().unwrap()).collect();

        let renewed: Vec<_> = shares
            .iter()
            .zip(refresh_shares.iter())
            .map(|(s, r)| s.renew(r).unwrap())
            .collect();

        for (original, renewed) in shares.iter().zip(renewed.iter()) {
            assert_eq!(original.public_key(), renewed.public_key());
            assert_ne!(original.share.value, renewed.share.value);
        }
    }
}

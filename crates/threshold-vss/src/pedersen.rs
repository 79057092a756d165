//! Pedersen verifiable secret sharing: a dealer commits to two degree-`t-1`
//! polynomials `f` (the secret sharing) and `g` (a blinding mask) under two
//! independent generators, seals one share of each to every recipient, and
//! each recipient verifies its share against the broadcast commitments
//! before approving.

use std::collections::HashMap;

use hmac::{Hmac, Mac};
use rand_core::RngCore;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use threshold_group::group::{Curve, Element, Point, Scalar};
use threshold_poly::{Idx, PriPoly, PubPoly};

use crate::ecies::{self, EciesCipher};
use crate::errors::VssError;

const H_DOMAIN: &[u8] = b"threshold-vss-pedersen-H-v1";
const SID_DOMAIN: &[u8] = b"threshold-vss-session-id-v1";
type HmacSha256 = Hmac<Sha256>;

/// The status a verifier assigns to a dealer's share, from its own point of
/// view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Approval,
    Complaint,
}

/// A single recipient's encrypted share of a dealer's Pedersen sharing,
/// plus the commitments and session id it must be checked against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "C::Scalar: DeserializeOwned")]
pub struct Deal<C: Curve> {
    pub dealer_idx: Idx,
    pub dealer_public_key: C::Point,
    pub session_id: Vec<u8>,
    pub f_commits: PubPoly<C>,
    pub g_commits: PubPoly<C>,
    pub encrypted_share: EciesCipher<C>,
    pub tag: [u8; 32],
}

/// A verifier's judgment of one dealer's deal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub dealer_idx: Idx,
    pub verifier_idx: Idx,
    pub status: Status,
}

/// The plaintext share a dealer reveals in response to a complaint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound = "C::Scalar: DeserializeOwned")]
pub struct Justification<C: Curve> {
    pub dealer_idx: Idx,
    pub verifier_idx: Idx,
    pub f_share: C::Scalar,
    pub g_share: C::Scalar,
}

/// Returns the curve's standard generator `G` and a second, independent
/// generator `H` derived via domain-separated hash-to-curve, so that no
/// party ever learns `log_G(H)`.
pub fn generators<C: Curve>() -> (C::Point, C::Point) {
    let g = C::Point::one();
    let mut h = C::Point::new();
    h.map(H_DOMAIN)
        .expect("hashing a fixed domain-separation label to the curve cannot fail");
    (g, h)
}

/// Hashes arbitrary bytes down to a scalar, retrying with an incrementing
/// counter on the rare input the field rejects.
fn scalar_from_bytes<S: Scalar>(bytes: &[u8]) -> S {
    let mut input = bytes.to_vec();
    loop {
        if let Some(s) = S::from_random_bytes(&input) {
            return s;
        }
        input = Sha256::digest(&input).to_vec();
    }
}

fn session_id<C: Curve>(
    dealer_public_key: &C::Point,
    participants: &[C::Point],
    f_commits: &PubPoly<C>,
    g_commits: &PubPoly<C>,
) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(SID_DOMAIN);
    hasher.update(bincode::serialize(dealer_public_key).expect("point serializes"));
    hasher.update(bincode::serialize(participants).expect("points serialize"));
    hasher.update(bincode::serialize(&f_commits.commitments()).expect("points serialize"));
    hasher.update(bincode::serialize(&g_commits.commitments()).expect("points serialize"));
    hasher.finalize().to_vec()
}

fn compute_tag<C: Curve>(session_id: &[u8], f_commits: &PubPoly<C>, g_commits: &PubPoly<C>) -> [u8; 32] {
    let x: C::Scalar = scalar_from_bytes(session_id);
    let mut point = f_commits.eval_at(&x);
    point.add(&g_commits.eval_at(&x));

    let key = bincode::serialize(&point).expect("point serializes");
    let mut mac = HmacSha256::new_from_slice(&key).expect("HMAC accepts any key length");
    mac.update(session_id);
    let mut tag = [0u8; 32];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    tag
}

/// The dealer side of one Pedersen sharing. Produces a Deal for every
/// participant, and a Justification for any verifier that complains about
/// this dealer's own share.
#[derive(Debug, Clone)]
pub struct Dealer<C: Curve> {
    index: Idx,
    public_key: C::Point,
    participants: Vec<C::Point>,
    f: PriPoly<C>,
    g: PriPoly<C>,
    f_commits: PubPoly<C>,
    g_commits: PubPoly<C>,
    session_id: Vec<u8>,
    tag: [u8; 32],
}

impl<C: Curve> Dealer<C> {
    /// Builds a new dealer sharing `secret` among `participants` at
    /// threshold `t`. `index` must be this dealer's own position within
    /// `participants`.
    pub fn new<R: RngCore>(
        index: Idx,
        private_key: &C::Scalar,
        secret: C::Scalar,
        participants: Vec<C::Point>,
        threshold: usize,
        rng: &mut R,
    ) -> Result<Self, VssError> {
        if (index as usize) >= participants.len() {
            return Err(VssError::OutOfBounds(index, participants.len()));
        }

        let (g_gen, h_gen) = generators::<C>();

        let mut public_key = g_gen.clone();
        public_key.mul(private_key);

        let f = PriPoly::<C>::new(threshold, Some(secret), rng)?;
        let g = PriPoly::<C>::new(threshold, None, rng)?;

        let f_commits = f.commit(Some(&g_gen));
        let g_commits = g.commit(Some(&h_gen));

        let session_id = session_id::<C>(&public_key, &participants, &f_commits, &g_commits);
        let tag = compute_tag::<C>(&session_id, &f_commits, &g_commits);

        debug!(dealer = index, participants = participants.len(), threshold, "dealer initialized");

        Ok(Self {
            index,
            public_key,
            participants,
            f,
            g,
            f_commits,
            g_commits,
            session_id,
            tag,
        })
    }

    /// This dealer's index.
    pub fn index(&self) -> Idx {
        self.index
    }

    /// The session id binding every Deal/Response/Justification of this
    /// sharing together.
    pub fn session_id(&self) -> &[u8] {
        &self.session_id
    }

    /// The combined Pedersen commitment to the shared secret, `f(0)*G +
    /// g(0)*H`.
    pub fn public_commitment(&self) -> C::Point {
        let mut c = self.f_commits.commit().clone();
        c.add(self.g_commits.commit());
        c
    }

    /// The secret sharing polynomial's commit, `f(0)*G`, i.e. the
    /// contribution this dealer makes to the distributed public key.
    pub fn commit(&self) -> &C::Point {
        self.f_commits.commit()
    }

    /// Builds one sealed Deal per participant.
    pub fn deals<R: RngCore>(&self, rng: &mut R) -> Result<Vec<Deal<C>>, VssError> {
        self.participants
            .iter()
            .enumerate()
            .map(|(i, recipient)| {
                let idx = i as Idx;
                let share = (self.f.eval(idx).value, self.g.eval(idx).value);
                let plaintext = bincode::serialize(&share)?;
                let encrypted_share = ecies::encrypt::<C, _>(recipient, &plaintext, rng);

                Ok(Deal {
                    dealer_idx: self.index,
                    dealer_public_key: self.public_key.clone(),
                    session_id: self.session_id.clone(),
                    f_commits: self.f_commits.clone(),
                    g_commits: self.g_commits.clone(),
                    encrypted_share,
                    tag: self.tag,
                })
            })
            .collect()
    }

    /// This dealer's own sharing polynomial coefficients, `a_0` being its
    /// personal secret contribution to the distributed secret.
    pub fn private_poly_coefficients(&self) -> Vec<C::Scalar> {
        self.f.coefficients()
    }

    /// Reveals this dealer's cleartext share for `verifier_idx`, in response
    /// to a complaint against its own deal.
    pub fn justify(&self, verifier_idx: Idx) -> Justification<C> {
        Justification {
            dealer_idx: self.index,
            verifier_idx,
            f_share: self.f.eval(verifier_idx).value,
            g_share: self.g.eval(verifier_idx).value,
        }
    }
}

/// Checks that a decrypted `(f_share, g_share)` pair is consistent with the
/// broadcast commitments, for the recipient at `idx`.
fn share_correct<C: Curve>(
    idx: Idx,
    f_share: &C::Scalar,
    g_share: &C::Scalar,
    f_commits: &PubPoly<C>,
    g_commits: &PubPoly<C>,
) -> bool {
    let (g_gen, h_gen) = generators::<C>();

    let mut lhs = g_gen;
    lhs.mul(f_share);
    let mut rhs = h_gen;
    rhs.mul(g_share);
    lhs.add(&rhs);

    let mut expected = f_commits.eval(idx).value;
    expected.add(&g_commits.eval(idx).value);

    lhs == expected
}

/// Tracks the certification state of a single dealer's Pedersen sharing, as
/// observed by one local participant: the local node's own verification
/// outcome, plus every `Response` and `Justification` broadcast for this
/// dealer.
#[derive(Debug, Clone)]
pub struct Verifier<C: Curve> {
    dealer_idx: Idx,
    own_idx: Idx,
    n: usize,
    threshold: usize,
    commits: Option<(PubPoly<C>, PubPoly<C>)>,
    statuses: HashMap<Idx, Status>,
    justified: HashMap<Idx, bool>,
    own_f_share: Option<C::Scalar>,
}

impl<C: Curve> Verifier<C> {
    /// Builds an empty verifier for `dealer_idx`'s sharing, before any Deal
    /// has been seen.
    pub fn new(dealer_idx: Idx, own_idx: Idx, n: usize, threshold: usize) -> Self {
        Self {
            dealer_idx,
            own_idx,
            n,
            threshold,
            commits: None,
            statuses: HashMap::new(),
            justified: HashMap::new(),
            own_f_share: None,
        }
    }

    /// This verifier's tracked dealer index.
    pub fn dealer_idx(&self) -> Idx {
        self.dealer_idx
    }

    /// The dealer's secret-sharing commitment polynomial, once its Deal has
    /// been processed.
    pub fn f_commits(&self) -> Option<&PubPoly<C>> {
        self.commits.as_ref().map(|(f, _)| f)
    }

    /// This node's own decrypted Shamir share of the dealer's secret, once
    /// its Deal has been successfully processed.
    pub fn own_share(&self) -> Option<&C::Scalar> {
        self.own_f_share.as_ref()
    }

    /// Processes a freshly received Deal: verifies its authentication tag,
    /// decrypts and checks this node's own share, and returns the Response
    /// to broadcast.
    pub fn process_deal(
        &mut self,
        deal: &Deal<C>,
        private_key: &C::Scalar,
    ) -> Result<Response, VssError> {
        if deal.dealer_idx != self.dealer_idx {
            return Err(VssError::OutOfBounds(deal.dealer_idx, self.n));
        }

        let expected_tag = compute_tag::<C>(&deal.session_id, &deal.f_commits, &deal.g_commits);
        if expected_tag != deal.tag {
            warn!(dealer = deal.dealer_idx, verifier = self.own_idx, "deal tag forged or corrupted in transit");
            self.statuses.insert(self.own_idx, Status::Complaint);
            return Err(VssError::InvalidTag(deal.dealer_idx));
        }

        self.commits = Some((deal.f_commits.clone(), deal.g_commits.clone()));

        let decrypted = ecies::decrypt::<C>(private_key, &deal.encrypted_share)
            .ok()
            .and_then(|buf| bincode::deserialize::<(C::Scalar, C::Scalar)>(&buf).ok());

        let status = match &decrypted {
            Some((f_share, g_share))
                if share_correct::<C>(
                    self.own_idx,
                    f_share,
                    g_share,
                    &deal.f_commits,
                    &deal.g_commits,
                ) =>
            {
                self.own_f_share = Some(f_share.clone());
                Status::Approval
            }
            _ => Status::Complaint,
        };

        self.statuses.insert(self.own_idx, status);
        // the dealer always approves its own share; record that now so a
        // non-self verifier's table still reaches n entries once every other
        // verifier has responded.
        self.statuses.insert(self.dealer_idx, Status::Approval);
        debug!(dealer = self.dealer_idx, verifier = self.own_idx, ?status, "deal processed");

        Ok(Response {
            dealer_idx: self.dealer_idx,
            verifier_idx: self.own_idx,
            status,
        })
    }

    /// Records a broadcast Response from some verifier.
    pub fn process_response(&mut self, response: &Response) -> Result<(), VssError> {
        if response.dealer_idx != self.dealer_idx {
            return Err(VssError::OutOfBounds(response.dealer_idx, self.n));
        }
        if self.statuses.contains_key(&response.verifier_idx) {
            return Err(VssError::DuplicateResponse(
                response.verifier_idx,
                response.dealer_idx,
            ));
        }
        self.statuses.insert(response.verifier_idx, response.status);
        Ok(())
    }

    /// Verifies a Justification and, if valid, upgrades the complaining
    /// verifier's status to `Approval`.
    pub fn process_justification(&mut self, justification: &Justification<C>) -> Result<(), VssError> {
        if justification.dealer_idx != self.dealer_idx {
            return Err(VssError::OutOfBounds(justification.dealer_idx, self.n));
        }
        let (f_commits, g_commits) = self
            .commits
            .as_ref()
            .ok_or(VssError::UnknownDealer(self.dealer_idx))?;

        let valid = share_correct::<C>(
            justification.verifier_idx,
            &justification.f_share,
            &justification.g_share,
            f_commits,
            g_commits,
        );

        self.justified.insert(justification.verifier_idx, valid);
        if valid {
            self.statuses
                .insert(justification.verifier_idx, Status::Approval);
            if justification.verifier_idx == self.own_idx {
                self.own_f_share = Some(justification.f_share.clone());
            }
            debug!(dealer = self.dealer_idx, verifier = justification.verifier_idx, "justification accepted");
        } else {
            warn!(dealer = self.dealer_idx, verifier = justification.verifier_idx, "justification failed the commitment check");
        }
        Ok(())
    }

    /// Forces every verifier that has not yet responded into an implicit
    /// `Complaint`, so certification becomes decidable.
    pub fn set_timeout(&mut self) {
        for idx in 0..self.n as Idx {
            self.statuses.entry(idx).or_insert(Status::Complaint);
        }
    }

    /// A deal is certified once no valid complaint remains unjustified and
    /// at least `threshold` approvals are present.
    pub fn certified(&self) -> bool {
        if self.statuses.len() < self.n {
            return false;
        }

        let approvals = self
            .statuses
            .values()
            .filter(|s| **s == Status::Approval)
            .count();

        let unjustified_complaints = self.statuses.iter().any(|(idx, status)| {
            *status == Status::Complaint && !self.justified.get(idx).copied().unwrap_or(false)
        });

        approvals >= self.threshold && !unjustified_complaints
    }

    /// The number of `Approval` responses recorded so far.
    pub fn approvals(&self) -> usize {
        self.statuses
            .values()
            .filter(|s| **s == Status::Approval)
            .count()
    }
}

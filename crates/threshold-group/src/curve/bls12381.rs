//! BLS12-381's scalar field and `G1` group, wired up to the [`crate::group`]
//! traits on top of the `ark_bls12_381` / `ark_ec` / `ark_ff` crates.
//!
//! Only `G1`/`Fr` are exposed: nothing in this crate performs a pairing, so
//! there is no need to wire up `G2`, `GT`, or a `PairingCurve` analogue the
//! way a BLS-signature crate would.

use crate::group::{Curve as CurveTrait, Element, Point as PointTrait, Scalar as ScalarTrait};
use ark_bls12_381 as bls381;
use ark_ec::hashing::curve_maps::wb::WBMap;
use ark_ec::hashing::map_to_curve_hasher::MapToCurveBasedHasher;
use ark_ec::hashing::{HashToCurve, HashToCurveError};
use ark_ec::{AffineRepr, CurveGroup, Group as ArkGroup};
use ark_ff::field_hashers::DefaultFieldHasher;
use ark_ff::{Field, PrimeField, UniformRand, Zero};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize, Compress};
use rand_core::RngCore;
use serde::{
    de::{Error as DeserializeError, SeqAccess, Visitor},
    ser::{Error as SerializationError, SerializeTuple},
    Deserialize, Deserializer, Serialize, Serializer,
};
use sha2::Sha256;
use std::{fmt, ops::AddAssign, ops::MulAssign, ops::Neg, ops::SubAssign};

/// Domain separator for hash-to-curve operations (e.g. deriving the
/// Pedersen `H` generator).
pub const DOMAIN: &[u8] = b"threshold-group-BLS12381G1-v1";

type ZFr = bls381::Fr;
type ZG1 = bls381::G1Projective;

/// An element of BLS12-381's scalar field.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Scalar(
    #[serde(deserialize_with = "deserialize_field")]
    #[serde(serialize_with = "serialize_field")]
    ZFr,
);

/// A point of BLS12-381's `G1` group.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct G1(
    #[serde(deserialize_with = "deserialize_group")]
    #[serde(serialize_with = "serialize_group")]
    ZG1,
);

impl Element for Scalar {
    type RHS = Scalar;

    fn new() -> Self {
        Self(ZFr::from(0u64))
    }

    fn one() -> Self {
        Self(ZFr::from(1u64))
    }

    fn add(&mut self, s2: &Self) {
        self.0.add_assign(s2.0);
    }

    fn mul(&mut self, mul: &Scalar) {
        self.0.mul_assign(mul.0);
    }

    fn rand<R: RngCore>(rng: &mut R) -> Self {
        Self(ZFr::rand(rng))
    }
}

impl ScalarTrait for Scalar {
    fn set_int(&mut self, i: u64) {
        *self = Self(ZFr::from(i));
    }

    fn inverse(&self) -> Option<Self> {
        Some(Self(Field::inverse(&self.0)?))
    }

    fn negate(&mut self) {
        *self = Self(self.0.neg());
    }

    fn sub(&mut self, other: &Self) {
        self.0.sub_assign(other.0);
    }

    fn from_random_bytes(bytes: &[u8]) -> Option<Self> {
        let fr = ZFr::from_random_bytes(bytes)?;
        Some(Self(fr))
    }

    fn serialized_size(&self) -> usize {
        self.0.serialized_size(Compress::Yes)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{:?}}}", self.0)
    }
}

impl Element for G1 {
    type RHS = Scalar;

    fn new() -> Self {
        Self(ZG1::default())
    }

    fn one() -> Self {
        Self(ZG1::generator())
    }

    fn rand<R: RngCore>(rng: &mut R) -> Self {
        Self(ZG1::rand(rng))
    }

    fn add(&mut self, s2: &Self) {
        self.0.add_assign(s2.0);
    }

    fn mul(&mut self, mul: &Scalar) {
        self.0.mul_assign(mul.0);
    }
}

impl PointTrait for G1 {
    type Error = HashToCurveError;

    fn map(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let hasher = MapToCurveBasedHasher::<
            ZG1,
            DefaultFieldHasher<Sha256>,
            WBMap<bls381::g1::Config>,
        >::new(DOMAIN)?;

        let hash = hasher.hash(data)?;
        *self = Self(hash.into());

        Ok(())
    }
}

impl fmt::Display for G1 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{:?}}}", self.0)
    }
}

/// BLS12-381's `G1`/`Fr` pair, bound together as a [`CurveTrait`].
#[derive(Clone, Debug)]
pub struct Curve;

impl CurveTrait for Curve {
    type Scalar = Scalar;
    type Point = G1;
}

// The `ark_*` field/group types serialize via `CanonicalSerialize`, not
// `serde` directly; these helpers bridge the two, matching the approach the
// pack's arkworks-based curve layer uses until that support is upstreamed.

fn deserialize_field<'de, D, C>(deserializer: D) -> Result<C, D::Error>
where
    D: Deserializer<'de>,
    C: Field,
{
    struct FieldVisitor<C>(std::marker::PhantomData<C>);

    impl<'de, C> Visitor<'de> for FieldVisitor<C>
    where
        C: Field,
    {
        type Value = C;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a valid field element")
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<C, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let len = C::zero().serialized_size(Compress::Yes);
            let bytes: Vec<u8> = (0..len)
                .map(|_| {
                    seq.next_element()?
                        .ok_or_else(|| DeserializeError::custom("could not read bytes"))
                })
                .collect::<Result<Vec<_>, _>>()?;

            C::deserialize_compressed(&mut &bytes[..]).map_err(DeserializeError::custom)
        }
    }

    let visitor = FieldVisitor(std::marker::PhantomData);
    deserializer.deserialize_tuple(C::zero().serialized_size(Compress::Yes), visitor)
}

fn serialize_field<S, C>(c: &C, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    C: Field,
{
    let len = c.serialized_size(Compress::Yes);
    let mut bytes = Vec::with_capacity(len);
    c.serialize_compressed(&mut bytes)
        .map_err(SerializationError::custom)?;

    let mut tup = s.serialize_tuple(len)?;
    for byte in &bytes {
        tup.serialize_element(byte)?;
    }
    tup.end()
}

fn deserialize_group<'de, D, C>(deserializer: D) -> Result<C, D::Error>
where
    D: Deserializer<'de>,
    C: CurveGroup,
{
    struct GroupVisitor<C>(std::marker::PhantomData<C>);

    impl<'de, C> Visitor<'de> for GroupVisitor<C>
    where
        C: CurveGroup,
    {
        type Value = C;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a valid group element")
        }

        fn visit_seq<S>(self, mut seq: S) -> Result<C, S::Error>
        where
            S: SeqAccess<'de>,
        {
            let len = C::Affine::zero().serialized_size(Compress::Yes);
            let bytes: Vec<u8> = (0..len)
                .map(|_| {
                    seq.next_element()?
                        .ok_or_else(|| DeserializeError::custom("could not read bytes"))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let affine = C::Affine::deserialize_compressed(&mut &bytes[..])
                .map_err(DeserializeError::custom)?;
            Ok(affine.into())
        }
    }

    let visitor = GroupVisitor(std::marker::PhantomData);
    deserializer.deserialize_tuple(C::Affine::zero().serialized_size(Compress::Yes), visitor)
}

fn serialize_group<S, C>(c: &C, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    C: CurveGroup,
{
    let affine = c.into_affine();
    let len = affine.serialized_size(Compress::Yes);
    let mut bytes = Vec::with_capacity(len);
    affine
        .serialize_compressed(&mut bytes)
        .map_err(SerializationError::custom)?;

    let mut tup = s.serialize_tuple(len)?;
    for byte in &bytes {
        tup.serialize_element(byte)?;
    }
    tup.end()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;
    use static_assertions::assert_impl_all;

    assert_impl_all!(G1: Serialize, serde::de::DeserializeOwned, Clone);
    assert_impl_all!(Scalar: Serialize, serde::de::DeserializeOwned, Clone);

    #[test]
    fn serialize_roundtrip_scalar() {
        let rng = &mut thread_rng();
        let s = Scalar::rand(rng);
        let ser = bincode::serialize(&s).unwrap();
        assert_eq!(ser.len(), 32);
        let de: Scalar = bincode::deserialize(&ser).unwrap();
        assert_eq!(s, de);
    }

    #[test]
    fn serialize_roundtrip_g1() {
        let rng = &mut thread_rng();
        let p = G1::rand(rng);
        let ser = bincode::serialize(&p).unwrap();
        assert_eq!(ser.len(), 48);
        let de: G1 = bincode::deserialize(&ser).unwrap();
        assert_eq!(p, de);
    }

    #[test]
    fn scalar_inverse() {
        let rng = &mut thread_rng();
        let s = Scalar::rand(rng);
        let inv = s.inverse().unwrap();
        let mut one = s;
        one.mul(&inv);
        assert_eq!(one, Scalar::one());
    }

    #[test]
    fn map_to_curve_is_deterministic() {
        let mut a = G1::new();
        let mut b = G1::new();
        a.map(b"pedersen-h-generator").unwrap();
        b.map(b"pedersen-h-generator").unwrap();
        assert_eq!(a, b);

        let mut c = G1::new();
        c.map(b"some-other-label").unwrap();
        assert_ne!(a, c);
    }
}

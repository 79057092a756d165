//! Elliptic Curve Integrated Encryption Scheme, used to seal a dealer's
//! shares to each recipient's long-term public key.
//!
//! Ephemeral-static Diffie-Hellman derives a shared point, HKDF-SHA256
//! stretches it into a symmetric key, and ChaCha20-Poly1305 provides the
//! authenticated encryption itself.

use chacha20poly1305::{
    aead::{Aead, Error as AeadError, KeyInit},
    ChaCha20Poly1305,
};
use hkdf::Hkdf;
use rand_core::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use threshold_group::group::{Curve, Element};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const DOMAIN: &[u8] = b"threshold-vss-ecies-v1";

/// A sealed message, together with the ephemeral public key the recipient
/// needs to recompute the shared secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EciesCipher<C: Curve> {
    aead: Vec<u8>,
    ephemeral: C::Point,
    nonce: [u8; NONCE_LEN],
}

/// Encrypts `msg` to the recipient's public key `to`.
pub fn encrypt<C: Curve, R: RngCore>(to: &C::Point, msg: &[u8], rng: &mut R) -> EciesCipher<C> {
    let eph_secret = C::Scalar::rand(rng);

    let mut ephemeral = C::Point::one();
    ephemeral.mul(&eph_secret);

    let mut dh = to.clone();
    dh.mul(&eph_secret);

    let key = derive::<C>(&dh);
    let aead = ChaCha20Poly1305::new(&key.into());

    let mut nonce = [0u8; NONCE_LEN];
    rng.fill_bytes(&mut nonce);

    let aead = aead
        .encrypt(&nonce.into(), msg)
        .expect("chacha20poly1305 encryption is infallible for well-formed inputs");

    EciesCipher {
        aead,
        ephemeral,
        nonce,
    }
}

/// Decrypts `cipher` using the recipient's private key.
pub fn decrypt<C: Curve>(private: &C::Scalar, cipher: &EciesCipher<C>) -> Result<Vec<u8>, AeadError> {
    let mut dh = cipher.ephemeral.clone();
    dh.mul(private);

    let key = derive::<C>(&dh);
    let aead = ChaCha20Poly1305::new(&key.into());
    aead.decrypt(&cipher.nonce.into(), &cipher.aead[..])
}

fn derive<C: Curve>(dh: &C::Point) -> [u8; KEY_LEN] {
    let serialized = bincode::serialize(dh).expect("curve points are always serializable");

    let hk = Hkdf::<Sha256>::new(None, &serialized);
    let mut key = [0u8; KEY_LEN];
    hk.expand(DOMAIN, &mut key)
        .expect("KEY_LEN is a valid HKDF-SHA256 output length");
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;
    use threshold_group::curve::bls12381::{Curve as BCurve, Scalar, G1};

    fn keypair() -> (Scalar, G1) {
        let secret = Scalar::rand(&mut thread_rng());
        let mut public = G1::one();
        public.mul(&secret);
        (secret, public)
    }

    #[test]
    fn roundtrip() {
        let (secret, public) = keypair();
        let msg = b"a deal's share bytes";

        let cipher = encrypt::<BCurve, _>(&public, msg, &mut thread_rng());
        let cleartext = decrypt::<BCurve>(&secret, &cipher).unwrap();
        assert_eq!(&msg[..], &cleartext[..]);
    }

    #[test]
    fn wrong_key_fails() {
        let (_, public) = keypair();
        let (wrong_secret, _) = keypair();
        let msg = b"secret share";

        let cipher = encrypt::<BCurve, _>(&public, msg, &mut thread_rng());
        decrypt::<BCurve>(&wrong_secret, &cipher).unwrap_err();
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let (secret, public) = keypair();
        let mut cipher = encrypt::<BCurve, _>(&public, b"data", &mut thread_rng());
        cipher.aead[0] ^= 0xff;
        decrypt::<BCurve>(&secret, &cipher).unwrap_err();
    }
}

//  Copyright 2022, The Tari Project
//
//  Redistribution and use in source and binary forms, with or without modification, are permitted provided that the
//  following conditions are met:
//
//  1. Redistributions of source code must retain the above copyright notice, this list of conditions and the following
//  disclaimer.
//
//  2. Redistributions in binary form must reproduce the above copyright notice, this list of conditions and the
//  following disclaimer in the documentation and/or other materials provided with the distribution.
//
//  3. Neither the name of the copyright holder nor the names of its contributors may be used to endorse or promote
//  products derived from this software without specific prior written permission.
//
//  THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS" AND ANY EXPRESS OR IMPLIED WARRANTIES,
//  INCLUDING, BUT NOT LIMITED TO, THE IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
//  DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE FOR ANY DIRECT, INDIRECT, INCIDENTAL,
//  SPECIAL, EXEMPLARY, OR CONSEQUENTIAL DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
//  SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER CAUSED AND ON ANY THEORY OF LIABILITY,
//  WHETHER IN CONTRACT, STRICT LIABILITY, OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE
//  USE OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

//! The cryptographic seam. Hashing, signing and verification are consumed as black-box operations so that the mailbox
//! store never depends on a particular key type.

use blake2::{digest::consts::U32, Blake2b, Digest};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Secret key has an invalid length (expected {expected} bytes, got {actual})")]
    InvalidSecretKeyLength { expected: usize, actual: usize },
}

pub trait OverlayCrypto: Send + Sync + 'static {
    /// Returns the digest of `data`. Used for content addressing and public key hashes.
    fn hash(&self, data: &[u8]) -> Vec<u8>;

    /// Signs `message` with the given secret key bytes.
    fn sign(&self, message: &[u8], secret_key: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Returns true if `signature` is a valid signature of `message` for `public_key`. Malformed keys or signatures
    /// are never valid.
    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool;
}

type Blake2b256 = Blake2b<U32>;

/// Blake2b-256 hashing with Ed25519 signatures
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCrypto;

impl DefaultCrypto {
    /// Derives the public key bytes for the given secret key bytes
    pub fn public_key_from_secret(&self, secret_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(signing_key(secret_key)?.verifying_key().to_bytes().to_vec())
    }
}

impl OverlayCrypto for DefaultCrypto {
    fn hash(&self, data: &[u8]) -> Vec<u8> {
        Blake2b256::digest(data).to_vec()
    }

    fn sign(&self, message: &[u8], secret_key: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let key = signing_key(secret_key)?;
        Ok(key.sign(message).to_bytes().to_vec())
    }

    fn verify(&self, message: &[u8], signature: &[u8], public_key: &[u8]) -> bool {
        let public_key = match <[u8; 32]>::try_from(public_key)
            .ok()
            .and_then(|bytes| VerifyingKey::from_bytes(&bytes).ok())
        {
            Some(pk) => pk,
            None => return false,
        };
        let signature = match Signature::from_slice(signature) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        public_key.verify(message, &signature).is_ok()
    }
}

fn signing_key(secret_key: &[u8]) -> Result<SigningKey, CryptoError> {
    let bytes = <[u8; 32]>::try_from(secret_key).map_err(|_| CryptoError::InvalidSecretKeyLength {
        expected: 32,
        actual: secret_key.len(),
    })?;
    Ok(SigningKey::from_bytes(&bytes))
}

#[cfg(test)]
mod test {
    use rand::{rngs::OsRng, RngCore};

    use super::*;

    const MSG: &[u8] = b"100% genuine";

    fn random_secret() -> Vec<u8> {
        let mut secret = [0u8; 32];
        OsRng.fill_bytes(&mut secret);
        secret.to_vec()
    }

    #[test]
    fn it_signs_and_verifies() {
        let crypto = DefaultCrypto;
        let secret = random_secret();
        let public_key = crypto.public_key_from_secret(&secret).unwrap();
        let signature = crypto.sign(MSG, &secret).unwrap();
        assert!(crypto.verify(MSG, &signature, &public_key));
        assert!(!crypto.verify(b"99.9% genuine", &signature, &public_key));
    }

    #[test]
    fn it_rejects_a_signature_from_another_key() {
        let crypto = DefaultCrypto;
        let signature = crypto.sign(MSG, &random_secret()).unwrap();
        let other_public_key = crypto.public_key_from_secret(&random_secret()).unwrap();
        assert!(!crypto.verify(MSG, &signature, &other_public_key));
    }

    #[test]
    fn it_never_panics_on_malformed_input() {
        let crypto = DefaultCrypto;
        assert!(!crypto.verify(MSG, &[1, 2, 3], &[4, 5, 6]));
        assert!(!crypto.verify(MSG, &[0u8; 64], &[0u8; 31]));
        assert_eq!(
            crypto.sign(MSG, &[0u8; 10]),
            Err(CryptoError::InvalidSecretKeyLength {
                expected: 32,
                actual: 10
            })
        );
    }

    #[test]
    fn it_hashes_to_32_bytes() {
        let crypto = DefaultCrypto;
        assert_eq!(crypto.hash(MSG).len(), 32);
        assert_eq!(crypto.hash(MSG), crypto.hash(MSG));
        assert_ne!(crypto.hash(MSG), crypto.hash(b"other"));
    }
}

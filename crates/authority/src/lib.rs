//! Decryption authority collaborator.
//!
//! The engine never opens a ciphertext itself: after a sealed auction closes
//! it emits a decryption request, and settlement waits for an attestation
//! from the authority whose key was configured at deployment. This crate is
//! both sides of that boundary: the signing side used by the off-chain
//! relayer ([`DecryptionAuthority`]) and the verifying side plugged into the
//! engine ([`AuthorityVerifier`]).
//!
//! An attestation is an ed25519 signature over the bincode encoding of
//! `(handles, values)`. Verification proves the authority bound those exact
//! plaintexts to those exact handles, nothing more; whether the homomorphic
//! computation behind the handles was honest is the authority's problem.

#![forbid(unsafe_code)]

pub mod mock;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::Serialize;
use thiserror::Error;

use graze_engine::{AttestationVerifier, CiphertextHandle, DecryptionRequest};

pub use mock::MockFhe;

#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error("attestation encoding failed: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("no plaintext known for a requested handle")]
    UnknownHandle,
}

/// Canonical signing payload: handles first, then the claimed plaintexts.
#[derive(Serialize)]
struct AttestationMessage<'a> {
    handles: &'a [CiphertextHandle],
    values: &'a [u128],
}

/// Bytes the authority signs and the verifier checks.
pub fn attestation_bytes(
    handles: &[CiphertextHandle],
    values: &[u128],
) -> Result<Vec<u8>, AuthorityError> {
    Ok(bincode::serialize(&AttestationMessage { handles, values })?)
}

/// The signing side, held by the off-chain relayer.
pub struct DecryptionAuthority {
    key: SigningKey,
}

impl DecryptionAuthority {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(&seed),
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    /// Sign the claim that `values` are the plaintexts behind `handles`.
    pub fn attest(
        &self,
        handles: &[CiphertextHandle],
        values: &[u128],
    ) -> Result<Vec<u8>, AuthorityError> {
        let message = attestation_bytes(handles, values)?;
        Ok(self.key.sign(&message).to_bytes().to_vec())
    }

    /// Full relayer step: open the requested handles against the evaluator's
    /// plaintext table and sign the result.
    ///
    /// Returns `(winning_amount, winner_index, signature)`, ready for
    /// `fulfill_auction`.
    pub fn fulfill(
        &self,
        fhe: &MockFhe,
        request: &DecryptionRequest,
    ) -> Result<(u128, u32, Vec<u8>), AuthorityError> {
        let amount = fhe
            .reveal(&request.highest_bid)
            .ok_or(AuthorityError::UnknownHandle)?;
        let index = fhe
            .reveal(&request.winner_index)
            .ok_or(AuthorityError::UnknownHandle)?;
        let signature = self.attest(
            &[request.highest_bid, request.winner_index],
            &[amount, index],
        )?;
        log::debug!(
            "authority: attested auction {} (winner index {})",
            request.auction_id,
            index
        );
        Ok((amount, index as u32, signature))
    }
}

/// The verifying side, configured into the engine's settlement path.
#[derive(Clone, Copy, Debug)]
pub struct AuthorityVerifier {
    key: VerifyingKey,
}

impl AuthorityVerifier {
    pub fn new(key: VerifyingKey) -> Self {
        Self { key }
    }
}

impl AttestationVerifier for AuthorityVerifier {
    fn verify(&self, handles: &[CiphertextHandle], values: &[u128], signature: &[u8]) -> bool {
        let Ok(message) = attestation_bytes(handles, values) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        self.key.verify(&message, &signature).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    fn authority() -> DecryptionAuthority {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        DecryptionAuthority::from_seed(seed)
    }

    fn handles() -> Vec<CiphertextHandle> {
        vec![CiphertextHandle([1u8; 32]), CiphertextHandle([2u8; 32])]
    }

    #[test]
    fn attestation_round_trip() {
        let authority = authority();
        let verifier = AuthorityVerifier::new(authority.verifying_key());

        let handles = handles();
        let values = vec![200u128, 1u128];
        let signature = authority.attest(&handles, &values).unwrap();
        assert!(verifier.verify(&handles, &values, &signature));
    }

    #[test]
    fn tampered_values_fail_verification() {
        let authority = authority();
        let verifier = AuthorityVerifier::new(authority.verifying_key());

        let handles = handles();
        let signature = authority.attest(&handles, &[200, 1]).unwrap();
        assert!(!verifier.verify(&handles, &[201, 1], &signature));
        assert!(!verifier.verify(&handles, &[200, 0], &signature));
    }

    #[test]
    fn swapped_handles_fail_verification() {
        let authority = authority();
        let verifier = AuthorityVerifier::new(authority.verifying_key());

        let handles = handles();
        let swapped = vec![handles[1], handles[0]];
        let signature = authority.attest(&handles, &[200, 1]).unwrap();
        assert!(!verifier.verify(&swapped, &[200, 1], &signature));
    }

    #[test]
    fn foreign_key_fails_verification() {
        let imposter = authority();
        let authority = authority();
        let verifier = AuthorityVerifier::new(authority.verifying_key());

        let handles = handles();
        let signature = imposter.attest(&handles, &[200, 1]).unwrap();
        assert!(!verifier.verify(&handles, &[200, 1], &signature));
    }

    #[test]
    fn garbage_signatures_are_rejected() {
        let authority = authority();
        let verifier = AuthorityVerifier::new(authority.verifying_key());
        assert!(!verifier.verify(&handles(), &[200, 1], b"not a signature"));
    }
}

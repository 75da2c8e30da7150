//! Chip signing adapter.
//!
//! An NFC chip holds a secp256k1 key and signs EIP-712 digests when tapped.
//! The chip's address is not known until it answers, so every answer carries
//! the address alongside the signature.

use alloy_primitives::{Address, B256, Bytes, Signature};
use std::sync::Arc;

use crate::payment_auth::TypedPaymentAuth;

/// What a chip returns for one tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipSignature {
    /// Address of the chip key that produced `signature`.
    pub address: Address,
    /// 65-byte `r || s || v` signature over the EIP-712 digest.
    pub signature: Bytes,
}

#[derive(Debug, thiserror::Error)]
pub enum ChipError {
    /// The user dismissed the tap prompt or the chip refused to sign.
    #[error("Chip signing was rejected: {0}")]
    Rejected(String),
    /// The reader or bridge to the chip failed.
    #[error("Chip communication failed: {0}")]
    Transport(String),
    #[error("Chip returned a malformed signature: {0}")]
    MalformedSignature(String),
    #[error("Chip signature recovers to {recovered}, not the reported chip {reported}")]
    SignerMismatch { reported: Address, recovered: Address },
}

/// Signs typed payment authorizations with a physical (or emulated) chip.
///
/// Calls may be slow and are gated on a user gesture. Implementations must not
/// retry on their own; the flows decide what a failure means.
#[async_trait::async_trait]
pub trait ChipSigner: Send + Sync {
    async fn sign_typed_data(&self, request: &TypedPaymentAuth)
    -> Result<ChipSignature, ChipError>;
}

#[async_trait::async_trait]
impl<T: ChipSigner + ?Sized> ChipSigner for Arc<T> {
    async fn sign_typed_data(
        &self,
        request: &TypedPaymentAuth,
    ) -> Result<ChipSignature, ChipError> {
        (**self).sign_typed_data(request).await
    }
}

#[async_trait::async_trait]
impl<T: ChipSigner + ?Sized> ChipSigner for Box<T> {
    async fn sign_typed_data(
        &self,
        request: &TypedPaymentAuth,
    ) -> Result<ChipSignature, ChipError> {
        (**self).sign_typed_data(request).await
    }
}

/// Checks that `answer.signature` over `hash` was produced by `answer.address`.
///
/// Only 65-byte EOA signatures are accepted: chips are plain keys.
pub fn verify_chip_signature(hash: &B256, answer: &ChipSignature) -> Result<(), ChipError> {
    let signature = Signature::from_raw(&answer.signature)
        .map_err(|e| ChipError::MalformedSignature(e.to_string()))?;
    let recovered = signature
        .recover_address_from_prehash(hash)
        .map_err(|e| ChipError::MalformedSignature(e.to_string()))?;
    if recovered != answer.address {
        return Err(ChipError::SignerMismatch {
            reported: answer.address,
            recovered,
        });
    }
    Ok(())
}

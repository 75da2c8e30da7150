//! A chip emulated by an in-process private key.
//!
//! Useful for demos, load tests and integration tests where no NFC reader is
//! attached. It signs every request immediately.

use alloy_primitives::{Address, Bytes};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::chip::{ChipError, ChipSignature, ChipSigner};
use crate::payment_auth::TypedPaymentAuth;

#[derive(Debug, Clone)]
pub struct LocalChip {
    signer: PrivateKeySigner,
}

impl LocalChip {
    pub fn new(signer: PrivateKeySigner) -> Self {
        Self { signer }
    }

    /// A chip with a freshly generated key.
    pub fn random() -> Self {
        Self::new(PrivateKeySigner::random())
    }

    pub fn address(&self) -> Address {
        self.signer.address()
    }
}

impl From<PrivateKeySigner> for LocalChip {
    fn from(signer: PrivateKeySigner) -> Self {
        Self::new(signer)
    }
}

impl std::str::FromStr for LocalChip {
    type Err = ChipError;

    /// Parses a hex private key, with or without `0x`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<PrivateKeySigner>()
            .map(Self::new)
            .map_err(|e| ChipError::Transport(format!("invalid chip key: {e}")))
    }
}

#[async_trait::async_trait]
impl ChipSigner for LocalChip {
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(chip = %self.signer.address())))]
    async fn sign_typed_data(
        &self,
        request: &TypedPaymentAuth,
    ) -> Result<ChipSignature, ChipError> {
        let hash = request.signing_hash();
        let signature = self
            .signer
            .sign_hash(&hash)
            .await
            .map_err(|e| ChipError::Rejected(e.to_string()))?;
        Ok(ChipSignature {
            address: self.signer.address(),
            signature: Bytes::copy_from_slice(&signature.as_bytes()),
        })
    }
}

//! Read-only contract calls the payment flows depend on.

use alloy_primitives::{Address, U256};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("RPC transport error: {0}")]
    Transport(String),
    #[error("Contract call failed: {0}")]
    ContractCall(String),
}

/// On-chain state needed to build a `PaymentAuth`.
#[async_trait::async_trait]
pub trait PaymentsReader: Send + Sync {
    /// Owner wallet of `chip` in the chip registry. [`Address::ZERO`] means unregistered.
    async fn owner_of(&self, registry: Address, chip: Address) -> Result<Address, ReadError>;

    /// Next authorization nonce of `payer` in the payments contract.
    async fn nonces(&self, payments: Address, payer: Address) -> Result<U256, ReadError>;

    /// ERC-20 `decimals()` of `token`.
    async fn decimals(&self, token: Address) -> Result<u8, ReadError>;
}

#[async_trait::async_trait]
impl<T: PaymentsReader + ?Sized> PaymentsReader for Arc<T> {
    async fn owner_of(&self, registry: Address, chip: Address) -> Result<Address, ReadError> {
        (**self).owner_of(registry, chip).await
    }

    async fn nonces(&self, payments: Address, payer: Address) -> Result<U256, ReadError> {
        (**self).nonces(payments, payer).await
    }

    async fn decimals(&self, token: Address) -> Result<u8, ReadError> {
        (**self).decimals(token).await
    }
}

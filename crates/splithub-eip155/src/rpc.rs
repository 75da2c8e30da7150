//! [`PaymentsReader`] over JSON-RPC.

use alloy_primitives::{Address, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_sol_types::sol;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::reader::{PaymentsReader, ReadError};

sol! {
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IChipRegistry {
        function ownerOf(address chip) external view returns (address);
    }
}

sol! {
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface ISplitHubPayments {
        function nonces(address payer) external view returns (uint256);
    }
}

sol! {
    #[allow(missing_docs)]
    #[derive(Debug)]
    #[sol(rpc)]
    interface IERC20Metadata {
        function decimals() external view returns (uint8);
    }
}

impl From<alloy_contract::Error> for ReadError {
    fn from(e: alloy_contract::Error) -> Self {
        match e {
            alloy_contract::Error::TransportError(e) => Self::Transport(e.to_string()),
            other => Self::ContractCall(other.to_string()),
        }
    }
}

/// Reads SplitHub contract state through any alloy [`Provider`].
#[derive(Debug, Clone)]
pub struct RpcPaymentsReader<P> {
    provider: P,
}

impl<P> RpcPaymentsReader<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl RpcPaymentsReader<DynProvider> {
    /// Connects to an HTTP JSON-RPC endpoint.
    pub fn connect_http(rpc_url: Url) -> Self {
        let provider = ProviderBuilder::new().connect_http(rpc_url).erased();
        Self::new(provider)
    }
}

#[async_trait::async_trait]
impl<P> PaymentsReader for RpcPaymentsReader<P>
where
    P: Provider + Send + Sync,
{
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        registry = %registry,
        chip = %chip,
        otel.kind = "client"
    )))]
    async fn owner_of(&self, registry: Address, chip: Address) -> Result<Address, ReadError> {
        let contract = IChipRegistry::new(registry, &self.provider);
        let owner = contract.ownerOf(chip).call().await?;
        Ok(owner)
    }

    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        payments = %payments,
        payer = %payer,
        otel.kind = "client"
    )))]
    async fn nonces(&self, payments: Address, payer: Address) -> Result<U256, ReadError> {
        let contract = ISplitHubPayments::new(payments, &self.provider);
        let nonce = contract.nonces(payer).call().await?;
        Ok(nonce)
    }

    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        token = %token,
        otel.kind = "client"
    )))]
    async fn decimals(&self, token: Address) -> Result<u8, ReadError> {
        let contract = IERC20Metadata::new(token, &self.provider);
        let decimals = contract.decimals().call().await?;
        Ok(decimals)
    }
}

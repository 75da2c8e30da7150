use alloy_primitives::U256;
use splithub_eip155::PaymentsReader;
use splithub_types::amount::parse_units;
use splithub_types::deployment::{ContractDeployment, Deployments};
use splithub_types::timestamp::UnixTimestamp;

use crate::config::FlowConfig;
use crate::error::SetupError;
use crate::wallet::ConnectedWallet;

/// External collaborators of a flow.
///
/// - `C`: the [`ChipSigner`](splithub_eip155::ChipSigner) that taps are sent to
/// - `R`: the [`PaymentsReader`] for registry, nonce and decimals reads
/// - `L`: the [`Relay`](splithub_relay::Relay) that submits signed payments
#[derive(Debug, Clone)]
pub struct FlowServices<C, R, L> {
    pub chip: C,
    pub reader: R,
    pub relay: L,
    pub deployments: Deployments,
    pub config: FlowConfig,
}

impl<C, R, L> FlowServices<C, R, L> {
    pub fn new(chip: C, reader: R, relay: L, deployments: Deployments) -> Self {
        Self {
            chip,
            reader,
            relay,
            deployments,
            config: FlowConfig::default(),
        }
    }

    pub fn with_config(mut self, config: FlowConfig) -> Self {
        self.config = config;
        self
    }

    /// The connected wallet and the contracts on its chain.
    pub(crate) fn resolve(
        &self,
        wallet: Option<&ConnectedWallet>,
    ) -> Result<(ConnectedWallet, ContractDeployment), SetupError> {
        let wallet = *wallet.ok_or(SetupError::WalletNotConnected)?;
        let deployment = self
            .deployments
            .for_chain(&wallet.chain)
            .copied()
            .ok_or(SetupError::ContractsNotDeployed(wallet.chain))?;
        Ok((wallet, deployment))
    }

    /// Deadline for an authorization signed now.
    pub(crate) fn deadline(&self) -> UnixTimestamp {
        UnixTimestamp::now() + self.config.deadline_window
    }
}

impl<C, R: PaymentsReader, L> FlowServices<C, R, L> {
    /// Reads the token's decimals and converts `amount` into token units.
    pub(crate) async fn token_units(
        &self,
        deployment: &ContractDeployment,
        amount: &str,
    ) -> Result<U256, SetupError> {
        let decimals = self
            .reader
            .decimals(deployment.token)
            .await
            .map_err(SetupError::DecimalsUnavailable)?;
        parse_units(amount, decimals).map_err(SetupError::InvalidAmount)
    }
}

//! Contract deployments per chain.
//!
//! Every flow needs three contracts on the wallet's chain: the payments
//! contract (EIP-712 verifying contract and relay target), the chip registry
//! that maps chip addresses to owner wallets, and the stablecoin token.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::chain::ChainReference;

/// Addresses of the SplitHub contracts on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDeployment {
    /// Payments contract; verifying contract of the `PaymentAuth` domain.
    pub payments: Address,
    /// Chip registry exposing `ownerOf(chip)`.
    pub registry: Address,
    /// Token being transferred.
    pub token: Address,
}

/// Lookup table of [`ContractDeployment`]s keyed by chain.
///
/// Deserializes from a JSON object keyed by chain id:
///
/// ```
/// use splithub_types::chain::ChainReference;
/// use splithub_types::deployment::Deployments;
///
/// let deployments: Deployments = serde_json::from_str(r#"{
///     "84532": {
///         "payments": "0x1111111111111111111111111111111111111111",
///         "registry": "0x2222222222222222222222222222222222222222",
///         "token": "0x3333333333333333333333333333333333333333"
///     }
/// }"#).unwrap();
/// assert!(deployments.for_chain(&ChainReference::new(84532)).is_some());
/// assert!(deployments.for_chain(&ChainReference::new(1)).is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deployments(HashMap<ChainReference, ContractDeployment>);

impl Deployments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, chain: ChainReference, deployment: ContractDeployment) -> Self {
        self.0.insert(chain, deployment);
        self
    }

    pub fn for_chain(&self, chain: &ChainReference) -> Option<&ContractDeployment> {
        self.0.get(chain)
    }

    pub fn chains(&self) -> impl Iterator<Item = &ChainReference> {
        self.0.keys()
    }
}

impl FromIterator<(ChainReference, ContractDeployment)> for Deployments {
    fn from_iter<T: IntoIterator<Item = (ChainReference, ContractDeployment)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

//! EVM chain references.
//!
//! SplitHub only runs on EIP-155 chains, so a chain is identified by its
//! numeric chain id. For display it renders in CAIP-2 form (`eip155:84532`).
//!
//! # Examples
//!
//! ```
//! use splithub_types::chain::ChainReference;
//!
//! let base_sepolia: ChainReference = "base-sepolia".parse().unwrap();
//! assert_eq!(base_sepolia.inner(), 84532);
//! assert_eq!(base_sepolia.to_string(), "eip155:84532");
//!
//! let same: ChainReference = "eip155:84532".parse().unwrap();
//! assert_eq!(same, base_sepolia);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::networks;

/// Namespace of EVM chains in CAIP-2 identifiers.
pub const EIP155_NAMESPACE: &str = "eip155";

/// A numeric EIP-155 chain id.
///
/// Serializes as the bare number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainReference(u64);

impl ChainReference {
    pub const fn new(chain_id: u64) -> Self {
        Self(chain_id)
    }

    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// Returns the well-known network name for this chain, if any.
    pub fn as_network_name(&self) -> Option<&'static str> {
        networks::network_name_by_chain_id(self.0)
    }
}

impl fmt::Display for ChainReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", EIP155_NAMESPACE, self.0)
    }
}

impl From<u64> for ChainReference {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Error returned when parsing an invalid chain reference string.
#[derive(Debug, thiserror::Error)]
#[error("Invalid chain reference {0:?}")]
pub struct ChainReferenceFormatError(String);

impl FromStr for ChainReference {
    type Err = ChainReferenceFormatError;

    /// Accepts `eip155:<id>`, a bare `<id>`, or a known network name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(chain_id) = networks::chain_id_by_network_name(s) {
            return Ok(Self(chain_id));
        }
        let reference = match s.split_once(':') {
            Some((EIP155_NAMESPACE, reference)) => reference,
            Some(_) => return Err(ChainReferenceFormatError(s.into())),
            None => s,
        };
        reference
            .parse::<u64>()
            .map(Self)
            .map_err(|_| ChainReferenceFormatError(s.into()))
    }
}

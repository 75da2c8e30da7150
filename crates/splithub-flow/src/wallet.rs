use alloy_primitives::Address;
use splithub_types::chain::ChainReference;

/// The wallet the host app is connected with.
///
/// In a batch it is the recipient of every slot; in a single settlement it is
/// the payer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectedWallet {
    pub address: Address,
    pub chain: ChainReference,
}

impl ConnectedWallet {
    pub fn new(address: Address, chain: ChainReference) -> Self {
        Self { address, chain }
    }
}

//! Well-known EVM networks SplitHub is deployed on.

/// Network names and their EIP-155 chain ids.
pub static KNOWN_NETWORKS: &[(&str, u64)] = &[
    ("base", 8453),
    ("base-sepolia", 84532),
    ("etherlink", 42793),
    ("etherlink-testnet", 128123),
];

pub(crate) fn chain_id_by_network_name(name: &str) -> Option<u64> {
    KNOWN_NETWORKS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(name))
        .map(|(_, chain_id)| *chain_id)
}

pub(crate) fn network_name_by_chain_id(chain_id: u64) -> Option<&'static str> {
    KNOWN_NETWORKS
        .iter()
        .find(|(_, known)| *known == chain_id)
        .map(|(name, _)| *name)
}

//! Relay API wire format.
//!
//! The relay takes signed `PaymentAuth`s and submits the corresponding
//! transaction, paying gas on the payer's behalf.
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `POST` | `/api/relay/payment` | [`PaymentRequest`] |
//! | `POST` | `/api/relay/batch-payment` | [`BatchPaymentRequest`] |
//!
//! Both endpoints answer with `{"txHash": "0x…"}` on success and a non-2xx
//! status with `{"error": "…"}` on failure, see [`RelayResponse`].
//! `uint256` fields travel as decimal strings.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::timestamp::UnixTimestamp;

pub const PAYMENT_PATH: &str = "/api/relay/payment";
pub const BATCH_PAYMENT_PATH: &str = "/api/relay/batch-payment";

/// One signed authorization as the relay receives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedPayment {
    pub payer: Address,
    pub recipient: Address,
    pub token: Address,
    #[serde(with = "u256_decimal")]
    pub amount: U256,
    #[serde(with = "u256_decimal")]
    pub nonce: U256,
    pub deadline: UnixTimestamp,
    pub signature: Bytes,
}

/// Body of `POST /api/relay/payment`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[serde(flatten)]
    pub payment: SignedPayment,
    pub contract_address: Address,
}

/// Body of `POST /api/relay/batch-payment`. Settles atomically: every payment or none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPaymentRequest {
    pub payments: Vec<SignedPayment>,
    pub contract_address: Address,
}

/// Response of both relay endpoints.
///
/// The transaction identifier is kept as the relay reported it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RelayResponse {
    pub fn success(tx_hash: impl Into<String>) -> Self {
        Self {
            tx_hash: Some(tx_hash.into()),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            tx_hash: None,
            error: Some(error.into()),
        }
    }
}

/// Serde adapter writing `U256` as a base-10 string.
///
/// Reading accepts decimal or `0x`-prefixed hex strings.
pub mod u256_decimal {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer, de};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        let text = String::deserialize(deserializer)?;
        U256::from_str(&text).map_err(de::Error::custom)
    }
}

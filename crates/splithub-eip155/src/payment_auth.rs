//! The `PaymentAuth` EIP-712 message.
//!
//! A chip authorizes a stablecoin transfer by signing `PaymentAuth` under the
//! payments contract's domain:
//!
//! ```text
//! EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)
//! PaymentAuth(address payer,address recipient,address token,uint256 amount,uint256 nonce,uint256 deadline)
//! ```
//!
//! The contract checks that the recovered signer is a chip registered to
//! `payer`, that `nonce` equals `nonces(payer)` and that `deadline` has not
//! passed.

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, eip712_domain, sol};
use serde_json::{Value, json};
use splithub_types::chain::ChainReference;
use splithub_types::relay::SignedPayment;
use splithub_types::timestamp::UnixTimestamp;

/// EIP-712 domain name of the payments contract.
pub const PAYMENTS_DOMAIN_NAME: &str = "SplitHubPayments";
/// EIP-712 domain version of the payments contract.
pub const PAYMENTS_DOMAIN_VERSION: &str = "1";

sol!(
    /// Solidity-compatible definition of a chip payment authorization.
    ///
    /// `payer` is the wallet that owns the chip, not the chip itself.
    #[derive(Debug, PartialEq, Eq)]
    struct PaymentAuth {
        address payer;
        address recipient;
        address token;
        uint256 amount;
        uint256 nonce;
        uint256 deadline;
    }
);

impl PaymentAuth {
    /// An authorization whose payer is not known yet.
    ///
    /// Signing it reveals which chip is being tapped; the signature itself is
    /// never submitted.
    pub fn placeholder(
        recipient: Address,
        token: Address,
        amount: U256,
        deadline: UnixTimestamp,
    ) -> Self {
        Self {
            payer: Address::ZERO,
            recipient,
            token,
            amount,
            nonce: U256::ZERO,
            deadline: U256::from(deadline.as_secs()),
        }
    }

    /// The same authorization bound to a resolved payer and their current nonce.
    pub fn for_payer(&self, payer: Address, nonce: U256) -> Self {
        Self {
            payer,
            nonce,
            ..self.clone()
        }
    }

    pub fn deadline_timestamp(&self) -> UnixTimestamp {
        UnixTimestamp::from_secs(self.deadline.saturating_to::<u64>())
    }

    /// Pairs this authorization with its signature in relay wire form.
    pub fn signed(&self, signature: Bytes) -> SignedPayment {
        SignedPayment {
            payer: self.payer,
            recipient: self.recipient,
            token: self.token,
            amount: self.amount,
            nonce: self.nonce,
            deadline: self.deadline_timestamp(),
            signature,
        }
    }
}

/// The payments contract's EIP-712 domain on `chain`.
pub fn payments_domain(chain: ChainReference, payments: Address) -> Eip712Domain {
    eip712_domain! {
        name: PAYMENTS_DOMAIN_NAME,
        version: PAYMENTS_DOMAIN_VERSION,
        chain_id: chain.inner(),
        verifying_contract: payments,
    }
}

/// A `PaymentAuth` together with the domain it is signed under.
///
/// This is what a [`ChipSigner`](crate::ChipSigner) receives.
#[derive(Debug, Clone)]
pub struct TypedPaymentAuth {
    pub domain: Eip712Domain,
    pub message: PaymentAuth,
}

impl TypedPaymentAuth {
    pub fn new(domain: Eip712Domain, message: PaymentAuth) -> Self {
        Self { domain, message }
    }

    /// The EIP-712 digest a chip signs.
    pub fn signing_hash(&self) -> B256 {
        self.message.eip712_signing_hash(&self.domain)
    }

    /// Renders the `{domain, types, primaryType, message}` object accepted by
    /// chip SDKs and `eth_signTypedData_v4`-style APIs.
    ///
    /// `types` omits `EIP712Domain`; consumers derive it from `domain`.
    /// `uint256` values are decimal strings.
    pub fn to_typed_data_json(&self) -> Value {
        let mut domain = serde_json::Map::new();
        if let Some(name) = &self.domain.name {
            domain.insert("name".into(), json!(name));
        }
        if let Some(version) = &self.domain.version {
            domain.insert("version".into(), json!(version));
        }
        if let Some(chain_id) = &self.domain.chain_id {
            domain.insert("chainId".into(), json!(chain_id.saturating_to::<u64>()));
        }
        if let Some(verifying_contract) = &self.domain.verifying_contract {
            domain.insert("verifyingContract".into(), json!(verifying_contract));
        }
        let message = &self.message;
        json!({
            "domain": domain,
            "types": {
                "PaymentAuth": [
                    { "name": "payer", "type": "address" },
                    { "name": "recipient", "type": "address" },
                    { "name": "token", "type": "address" },
                    { "name": "amount", "type": "uint256" },
                    { "name": "nonce", "type": "uint256" },
                    { "name": "deadline", "type": "uint256" },
                ]
            },
            "primaryType": "PaymentAuth",
            "message": {
                "payer": message.payer,
                "recipient": message.recipient,
                "token": message.token,
                "amount": message.amount.to_string(),
                "nonce": message.nonce.to_string(),
                "deadline": message.deadline.to_string(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const RECIPIENT: Address = address!("0x2222222222222222222222222222222222222222");
    const TOKEN: Address = address!("0x3333333333333333333333333333333333333333");
    const PAYMENTS: Address = address!("0x4444444444444444444444444444444444444444");

    fn placeholder() -> PaymentAuth {
        PaymentAuth::placeholder(
            RECIPIENT,
            TOKEN,
            U256::from(10_000_000u64),
            UnixTimestamp::from_secs(1_700_003_600),
        )
    }

    #[test]
    fn test_placeholder_has_zero_payer_and_nonce() {
        let auth = placeholder();
        assert_eq!(auth.payer, Address::ZERO);
        assert_eq!(auth.nonce, U256::ZERO);
        assert_eq!(auth.deadline_timestamp().as_secs(), 1_700_003_600);
    }

    #[test]
    fn test_for_payer_keeps_deadline_and_amount() {
        let payer = address!("0x1111111111111111111111111111111111111111");
        let auth = placeholder().for_payer(payer, U256::from(7u64));
        assert_eq!(auth.payer, payer);
        assert_eq!(auth.nonce, U256::from(7u64));
        assert_eq!(auth.deadline, placeholder().deadline);
        assert_eq!(auth.amount, placeholder().amount);
    }

    #[test]
    fn test_signing_hash_depends_on_payer_and_domain() {
        let domain = payments_domain(ChainReference::new(84532), PAYMENTS);
        let zero = TypedPaymentAuth::new(domain.clone(), placeholder());
        let bound = TypedPaymentAuth::new(
            domain,
            placeholder().for_payer(address!("0x1111111111111111111111111111111111111111"), U256::ZERO),
        );
        assert_ne!(zero.signing_hash(), bound.signing_hash());

        let other_chain = TypedPaymentAuth::new(
            payments_domain(ChainReference::new(8453), PAYMENTS),
            placeholder(),
        );
        assert_ne!(zero.signing_hash(), other_chain.signing_hash());
    }

    #[test]
    fn test_typed_data_json() {
        let typed = TypedPaymentAuth::new(
            payments_domain(ChainReference::new(84532), PAYMENTS),
            placeholder(),
        );
        let value = typed.to_typed_data_json();
        assert_eq!(value["primaryType"], "PaymentAuth");
        assert_eq!(value["domain"]["name"], PAYMENTS_DOMAIN_NAME);
        assert_eq!(value["domain"]["chainId"], 84532);
        assert_eq!(value["message"]["amount"], "10000000");
        assert_eq!(value["message"]["deadline"], "1700003600");
        assert_eq!(value["types"]["PaymentAuth"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn test_signed_payment_carries_signed_fields() {
        let auth = placeholder().for_payer(address!("0x1111111111111111111111111111111111111111"), U256::from(2u64));
        let signed = auth.signed(Bytes::from(vec![1, 2, 3]));
        assert_eq!(signed.payer, auth.payer);
        assert_eq!(signed.nonce, U256::from(2u64));
        assert_eq!(signed.deadline, auth.deadline_timestamp());
        assert_eq!(signed.signature, Bytes::from(vec![1, 2, 3]));
    }
}

use alloy_primitives::{Address, Bytes, U256};
use splithub_eip155::PaymentAuth;
use splithub_types::timestamp::UnixTimestamp;
use std::fmt;

/// Signing status of one slot.
///
/// Valid transitions: `Waiting -> Signing`, `Error -> Signing` (retry),
/// `Signing -> Signed`, `Signing -> Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotStatus {
    Waiting,
    Signing,
    Signed,
    Error,
}

impl SlotStatus {
    pub fn can_transition_to(self, next: SlotStatus) -> bool {
        use SlotStatus::*;
        matches!(
            (self, next),
            (Waiting, Signing) | (Error, Signing) | (Signing, Signed) | (Signing, Error)
        )
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlotStatus::Waiting => "waiting",
            SlotStatus::Signing => "signing",
            SlotStatus::Signed => "signed",
            SlotStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Everything captured by a successful two-tap signature.
///
/// Stored as one value so a slot either has all of it or none of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotSignature {
    /// Chip that answered both taps.
    pub chip_address: Address,
    /// The authorization exactly as signed on the second tap.
    pub authorization: PaymentAuth,
    pub signature: Bytes,
}

impl SlotSignature {
    /// Wallet the chip is registered to.
    pub fn payer(&self) -> Address {
        self.authorization.payer
    }

    pub fn nonce(&self) -> U256 {
        self.authorization.nonce
    }

    pub fn deadline(&self) -> UnixTimestamp {
        self.authorization.deadline_timestamp()
    }
}

/// One expected contribution in a batch settlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub id: String,
    /// Decimal amount string as entered, e.g. `"10.00"`.
    pub expected_amount: String,
    pub status: SlotStatus,
    pub signature: Option<SlotSignature>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Slot {slot} cannot go from {from} to {to}")]
pub struct TransitionError {
    pub slot: String,
    pub from: SlotStatus,
    pub to: SlotStatus,
}

impl Participant {
    pub fn new(id: impl Into<String>, expected_amount: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            expected_amount: expected_amount.into(),
            status: SlotStatus::Waiting,
            signature: None,
            error: None,
        }
    }

    fn check(&self, to: SlotStatus) -> Result<(), TransitionError> {
        if self.status.can_transition_to(to) {
            Ok(())
        } else {
            Err(TransitionError {
                slot: self.id.clone(),
                from: self.status,
                to,
            })
        }
    }

    /// This slot in `signing`, with any previous error cleared.
    pub fn signing(&self) -> Result<Self, TransitionError> {
        self.check(SlotStatus::Signing)?;
        Ok(Self {
            status: SlotStatus::Signing,
            signature: None,
            error: None,
            ..self.clone()
        })
    }

    pub fn signed(&self, signature: SlotSignature) -> Result<Self, TransitionError> {
        self.check(SlotStatus::Signed)?;
        Ok(Self {
            status: SlotStatus::Signed,
            signature: Some(signature),
            error: None,
            ..self.clone()
        })
    }

    pub fn failed(&self, message: impl Into<String>) -> Result<Self, TransitionError> {
        self.check(SlotStatus::Error)?;
        Ok(Self {
            status: SlotStatus::Error,
            signature: None,
            error: Some(message.into()),
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SlotStatus; 4] = [
        SlotStatus::Waiting,
        SlotStatus::Signing,
        SlotStatus::Signed,
        SlotStatus::Error,
    ];

    #[test]
    fn test_transition_table() {
        let allowed: Vec<(SlotStatus, SlotStatus)> = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();
        assert_eq!(
            allowed,
            vec![
                (SlotStatus::Waiting, SlotStatus::Signing),
                (SlotStatus::Signing, SlotStatus::Signed),
                (SlotStatus::Signing, SlotStatus::Error),
                (SlotStatus::Error, SlotStatus::Signing),
            ]
        );
    }

    #[test]
    fn test_retry_clears_error() {
        let slot = Participant::new("slot-0", "1.00")
            .signing()
            .unwrap()
            .failed("chip went away")
            .unwrap();
        assert_eq!(slot.error.as_deref(), Some("chip went away"));
        let retry = slot.signing().unwrap();
        assert_eq!(retry.status, SlotStatus::Signing);
        assert!(retry.error.is_none());
    }

    #[test]
    fn test_signed_slot_cannot_be_resigned() {
        let slot = Participant::new("slot-0", "1.00");
        let err = slot.signed(dummy_signature()).unwrap_err();
        assert_eq!(err.from, SlotStatus::Waiting);
        assert_eq!(err.to, SlotStatus::Signed);

        let signed = slot.signing().unwrap().signed(dummy_signature()).unwrap();
        assert!(signed.signing().is_err());
        assert!(signed.failed("late").is_err());
    }

    fn dummy_signature() -> SlotSignature {
        SlotSignature {
            chip_address: Address::repeat_byte(0xc1),
            authorization: PaymentAuth::placeholder(
                Address::repeat_byte(0x22),
                Address::repeat_byte(0x33),
                U256::from(1u64),
                UnixTimestamp::from_secs(1),
            )
            .for_payer(Address::repeat_byte(0x11), U256::ZERO),
            signature: Bytes::from(vec![0u8; 65]),
        }
    }
}

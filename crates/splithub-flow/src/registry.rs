use splithub_types::amount::{AmountError, parse_amount, total_amount};
use std::sync::Arc;

use crate::slot::{Participant, SlotSignature, SlotStatus, TransitionError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Slot {index} does not exist ({total} slots)")]
    OutOfRange { index: usize, total: usize },
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// Ordered slots of one batch settlement.
///
/// Updates replace a single element. The slot list is shared copy-on-write,
/// so a [`snapshot`](Self::snapshot) taken before an update never observes it.
#[derive(Debug, Clone)]
pub struct ParticipantRegistry {
    slots: Arc<Vec<Participant>>,
}

impl ParticipantRegistry {
    /// One `waiting` slot per amount, with ids `slot-0`, `slot-1`, ...
    ///
    /// Fails if any amount is invalid or if their sum overflows.
    pub fn new<S: AsRef<str>>(amounts: &[S]) -> Result<Self, AmountError> {
        total_amount(amounts)?;
        let slots = amounts
            .iter()
            .enumerate()
            .map(|(index, amount)| {
                parse_amount(amount.as_ref())?;
                Ok(Participant::new(
                    format!("slot-{index}"),
                    amount.as_ref().trim(),
                ))
            })
            .collect::<Result<Vec<_>, AmountError>>()?;
        Ok(Self {
            slots: Arc::new(slots),
        })
    }

    /// Rebuilds every slot as `waiting`, keeping ids and amounts.
    pub fn reset(&mut self) {
        let slots = self
            .slots
            .iter()
            .map(|slot| Participant::new(slot.id.clone(), slot.expected_amount.clone()))
            .collect();
        self.slots = Arc::new(slots);
    }

    pub fn get(&self, index: usize) -> Option<&Participant> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.slots.iter()
    }

    pub fn snapshot(&self) -> Arc<Vec<Participant>> {
        Arc::clone(&self.slots)
    }

    pub fn total_count(&self) -> usize {
        self.slots.len()
    }

    pub fn signed_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.status == SlotStatus::Signed)
            .count()
    }

    pub fn all_signed(&self) -> bool {
        let total = self.total_count();
        total > 0 && self.signed_count() == total
    }

    /// Normalized sum of every expected amount.
    pub fn total_amount(&self) -> String {
        let amounts: Vec<&str> = self
            .slots
            .iter()
            .map(|slot| slot.expected_amount.as_str())
            .collect();
        // `new` rejects amounts whose total cannot be computed.
        total_amount(&amounts).unwrap_or_else(|_| "0".to_string())
    }

    pub fn begin_signing(&mut self, index: usize) -> Result<(), RegistryError> {
        self.update(index, |slot| slot.signing())
    }

    pub fn complete(&mut self, index: usize, signature: SlotSignature) -> Result<(), RegistryError> {
        self.update(index, |slot| slot.signed(signature))
    }

    pub fn fail(&mut self, index: usize, message: impl Into<String>) -> Result<(), RegistryError> {
        self.update(index, |slot| slot.failed(message))
    }

    fn update<F>(&mut self, index: usize, f: F) -> Result<(), RegistryError>
    where
        F: FnOnce(&Participant) -> Result<Participant, TransitionError>,
    {
        let total = self.total_count();
        let current = self
            .slots
            .get(index)
            .ok_or(RegistryError::OutOfRange { index, total })?;
        let next = f(current)?;
        Arc::make_mut(&mut self.slots)[index] = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creates_waiting_slots() {
        for n in 0..5 {
            let amounts: Vec<String> = (0..n).map(|i| format!("{i}.50")).collect();
            let registry = ParticipantRegistry::new(&amounts).unwrap();
            assert_eq!(registry.total_count(), n);
            assert!(registry.iter().all(|slot| slot.status == SlotStatus::Waiting));
            assert!(registry.iter().all(|slot| slot.signature.is_none()));
        }
    }

    #[test]
    fn test_new_rejects_invalid_amount() {
        assert!(ParticipantRegistry::new(&["1.00", "lots"]).is_err());
    }

    #[test]
    fn test_new_rejects_overflowing_total() {
        let max = "79228162514264337593543950335";
        let err = ParticipantRegistry::new(&[max, max]).unwrap_err();
        assert!(matches!(err, AmountError::Invalid(_)));
        assert_eq!(ParticipantRegistry::new(&[max]).unwrap().total_amount(), max);
    }

    #[test]
    fn test_all_signed_requires_slots() {
        let registry = ParticipantRegistry::new::<&str>(&[]).unwrap();
        assert_eq!(registry.signed_count(), 0);
        assert!(!registry.all_signed());
    }

    #[test]
    fn test_snapshot_is_not_affected_by_updates() {
        let mut registry = ParticipantRegistry::new(&["1.00", "2.00"]).unwrap();
        let before = registry.snapshot();
        registry.begin_signing(1).unwrap();
        assert_eq!(before[1].status, SlotStatus::Waiting);
        assert_eq!(registry.get(1).unwrap().status, SlotStatus::Signing);
        assert_eq!(registry.get(0), before.get(0));
    }

    #[test]
    fn test_update_out_of_range() {
        let mut registry = ParticipantRegistry::new(&["1.00"]).unwrap();
        assert_eq!(
            registry.begin_signing(3),
            Err(RegistryError::OutOfRange { index: 3, total: 1 })
        );
    }

    #[test]
    fn test_reset_keeps_ids_and_amounts() {
        let mut registry = ParticipantRegistry::new(&["10.00", "20.00"]).unwrap();
        registry.begin_signing(0).unwrap();
        registry.fail(0, "nope").unwrap();
        registry.reset();
        let slot = registry.get(0).unwrap();
        assert_eq!(slot.id, "slot-0");
        assert_eq!(slot.expected_amount, "10.00");
        assert_eq!(slot.status, SlotStatus::Waiting);
        assert!(slot.error.is_none());
        assert_eq!(registry.total_amount(), "30");
    }
}

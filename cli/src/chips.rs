use splithub_eip155::{ChipError, ChipSignature, ChipSigner, LocalChip, TypedPaymentAuth};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Emulated chips lined up for a batch, one per participant.
///
/// [`present`](Self::present) picks the chip that answers the next taps.
pub struct ChipRack {
    chips: Vec<LocalChip>,
    presented: AtomicUsize,
}

impl ChipRack {
    pub fn new(chips: Vec<LocalChip>) -> Self {
        Self {
            chips,
            presented: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.chips.len()
    }

    pub fn present(&self, index: usize) {
        self.presented.store(index, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ChipSigner for ChipRack {
    async fn sign_typed_data(
        &self,
        request: &TypedPaymentAuth,
    ) -> Result<ChipSignature, ChipError> {
        let index = self.presented.load(Ordering::SeqCst);
        match self.chips.get(index) {
            Some(chip) => chip.sign_typed_data(request).await,
            None => Err(ChipError::Rejected(format!("no chip in position {index}"))),
        }
    }
}

//! Multi-party batch settlement.

use alloy_primitives::Address;
use splithub_eip155::{
    ChipSigner, PaymentAuth, PaymentsReader, TypedPaymentAuth, payments_domain,
    verify_chip_signature,
};
use splithub_relay::Relay;
use splithub_types::relay::BatchPaymentRequest;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::callbacks::FlowCallbacks;
use crate::cancel::until_cancelled;
use crate::error::{FlowError, SignSlotError, SubmitError};
use crate::registry::ParticipantRegistry;
use crate::services::FlowServices;
use crate::slot::{Participant, SlotSignature};
use crate::wallet::ConnectedWallet;

/// Whole-batch state.
///
/// ```text
/// collecting --submit (all signed)--> submitting --relay ok--> confirming --delay--> success
/// collecting --submit (not all signed)--> collecting
/// submitting --relay error--> error
/// error | success --reset--> collecting
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchFlowState {
    Collecting,
    Submitting,
    Confirming,
    Success,
    Error,
}

impl BatchFlowState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchFlowState::Collecting => "collecting",
            BatchFlowState::Submitting => "submitting",
            BatchFlowState::Confirming => "confirming",
            BatchFlowState::Success => "success",
            BatchFlowState::Error => "error",
        }
    }
}

impl fmt::Display for BatchFlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a host UI renders for a batch, captured at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSnapshot {
    pub flow_state: BatchFlowState,
    pub participants: Arc<Vec<Participant>>,
    pub signed_count: usize,
    pub total_count: usize,
    pub all_signed: bool,
    pub total_amount: String,
    pub current_signing_index: Option<usize>,
    pub error: Option<String>,
    pub tx_hash: Option<String>,
}

/// Controller of one batch settlement attempt.
///
/// Owns the participant registry and sequences chip taps, contract reads and
/// the final relay submission. Methods that wait on external calls take
/// `&mut self`, so two slots can never be signed concurrently through the
/// same controller.
pub struct BatchSettleFlow<C, R, L> {
    services: FlowServices<C, R, L>,
    wallet: Option<ConnectedWallet>,
    callbacks: FlowCallbacks,
    registry: ParticipantRegistry,
    flow_state: BatchFlowState,
    current_signing_index: Option<usize>,
    error: Option<String>,
    tx_hash: Option<String>,
    updates: watch::Sender<BatchSnapshot>,
}

impl<C, R, L> BatchSettleFlow<C, R, L> {
    /// A batch with one `waiting` slot per amount.
    pub fn new<I>(services: FlowServices<C, R, L>, amounts: I) -> Result<Self, FlowError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let amounts: Vec<String> = amounts
            .into_iter()
            .map(|amount| amount.as_ref().to_string())
            .collect();
        let registry = ParticipantRegistry::new(&amounts)?;
        let (updates, _) = watch::channel(BatchSnapshot {
            flow_state: BatchFlowState::Collecting,
            participants: registry.snapshot(),
            signed_count: 0,
            total_count: registry.total_count(),
            all_signed: registry.all_signed(),
            total_amount: registry.total_amount(),
            current_signing_index: None,
            error: None,
            tx_hash: None,
        });
        Ok(Self {
            services,
            wallet: None,
            callbacks: FlowCallbacks::default(),
            registry,
            flow_state: BatchFlowState::Collecting,
            current_signing_index: None,
            error: None,
            tx_hash: None,
            updates,
        })
    }

    pub fn with_wallet(mut self, wallet: ConnectedWallet) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn with_callbacks(mut self, callbacks: FlowCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// The wallet that receives every slot's payment.
    pub fn connect_wallet(&mut self, wallet: ConnectedWallet) {
        self.wallet = Some(wallet);
    }

    pub fn disconnect_wallet(&mut self) {
        self.wallet = None;
    }

    pub fn wallet(&self) -> Option<&ConnectedWallet> {
        self.wallet.as_ref()
    }

    pub fn flow_state(&self) -> BatchFlowState {
        self.flow_state
    }

    pub fn participants(&self) -> Arc<Vec<Participant>> {
        self.registry.snapshot()
    }

    pub fn participant(&self, index: usize) -> Option<&Participant> {
        self.registry.get(index)
    }

    pub fn signed_count(&self) -> usize {
        self.registry.signed_count()
    }

    pub fn total_count(&self) -> usize {
        self.registry.total_count()
    }

    /// `true` when there is at least one slot and every slot is signed.
    pub fn all_signed(&self) -> bool {
        self.registry.all_signed()
    }

    pub fn total_amount(&self) -> String {
        self.registry.total_amount()
    }

    pub fn current_signing_index(&self) -> Option<usize> {
        self.current_signing_index
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn tx_hash(&self) -> Option<&str> {
        self.tx_hash.as_deref()
    }

    pub fn snapshot(&self) -> BatchSnapshot {
        BatchSnapshot {
            flow_state: self.flow_state,
            participants: self.registry.snapshot(),
            signed_count: self.registry.signed_count(),
            total_count: self.registry.total_count(),
            all_signed: self.registry.all_signed(),
            total_amount: self.registry.total_amount(),
            current_signing_index: self.current_signing_index,
            error: self.error.clone(),
            tx_hash: self.tx_hash.clone(),
        }
    }

    /// Receives a fresh [`BatchSnapshot`] after every state change.
    pub fn subscribe(&self) -> watch::Receiver<BatchSnapshot> {
        self.updates.subscribe()
    }

    /// Back to `collecting` with every slot `waiting` and the original amounts.
    ///
    /// Collected signatures are discarded and must be gathered again.
    pub fn reset(&mut self) {
        self.registry.reset();
        self.flow_state = BatchFlowState::Collecting;
        self.current_signing_index = None;
        self.error = None;
        self.tx_hash = None;
        #[cfg(feature = "telemetry")]
        tracing::debug!(slots = self.registry.total_count(), "Batch settlement reset");
        self.publish();
    }

    fn set_state(&mut self, state: BatchFlowState) {
        #[cfg(feature = "telemetry")]
        tracing::debug!(from = %self.flow_state, to = %state, "Batch settlement state change");
        self.flow_state = state;
        self.publish();
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}

impl<C, R, L> BatchSettleFlow<C, R, L>
where
    C: ChipSigner,
    R: PaymentsReader,
{
    /// Collects slot `index`'s signature with two chip taps.
    ///
    /// API misuse (unknown slot, slot already signed, another slot in
    /// progress, flow not collecting) is returned as [`SignSlotError::Flow`]
    /// without touching any state. Every other failure leaves the slot in
    /// `error` with the error's message and does not affect the flow state or
    /// the other slots.
    pub async fn sign_slot(&mut self, index: usize) -> Result<(), SignSlotError> {
        self.sign_slot_inner(index, None).await
    }

    /// [`sign_slot`](Self::sign_slot), abandoned once `cancel` fires.
    ///
    /// A cancelled slot ends in `error` and can be retried.
    pub async fn sign_slot_cancellable(
        &mut self,
        index: usize,
        cancel: &CancellationToken,
    ) -> Result<(), SignSlotError> {
        self.sign_slot_inner(index, Some(cancel)).await
    }

    async fn sign_slot_inner(
        &mut self,
        index: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<(), SignSlotError> {
        if self.flow_state != BatchFlowState::Collecting {
            return Err(FlowError::InvalidState {
                action: "sign a slot",
                state: self.flow_state.as_str(),
            }
            .into());
        }
        if let Some(busy) = self.current_signing_index {
            return Err(FlowError::Busy(busy).into());
        }
        self.registry
            .begin_signing(index)
            .map_err(FlowError::from)?;
        self.current_signing_index = Some(index);
        self.publish();

        let result = self.two_tap(index, cancel).await;
        self.current_signing_index = None;

        let outcome = match result {
            Ok(signature) => {
                #[cfg(feature = "telemetry")]
                tracing::info!(
                    slot = index,
                    chip = %signature.chip_address,
                    payer = %signature.payer(),
                    nonce = %signature.nonce(),
                    "Slot signed"
                );
                self.registry
                    .complete(index, signature)
                    .map_err(|e| SignSlotError::from(FlowError::from(e)))
            }
            Err(error) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(slot = index, error = %error, "Slot signing failed");
                match self.registry.fail(index, error.to_string()) {
                    Ok(()) => Err(error),
                    Err(e) => Err(FlowError::from(e).into()),
                }
            }
        };
        self.publish();
        outcome
    }

    /// Placeholder tap, owner lookup, nonce read, real tap.
    async fn two_tap(
        &self,
        index: usize,
        cancel: Option<&CancellationToken>,
    ) -> Result<SlotSignature, SignSlotError> {
        let cancelled = || SignSlotError::Cancelled;
        let amount = self
            .registry
            .get(index)
            .map(|slot| slot.expected_amount.clone())
            .unwrap_or_default();

        let (wallet, deployment) = self.services.resolve(self.wallet.as_ref())?;
        let units = until_cancelled(
            cancel,
            self.services.token_units(&deployment, &amount),
            cancelled,
        )
        .await?;

        let domain = payments_domain(wallet.chain, deployment.payments);
        let placeholder = TypedPaymentAuth::new(
            domain.clone(),
            PaymentAuth::placeholder(
                wallet.address,
                deployment.token,
                units,
                self.services.deadline(),
            ),
        );
        let first = until_cancelled(
            cancel,
            self.services.chip.sign_typed_data(&placeholder),
            cancelled,
        )
        .await?;
        verify_chip_signature(&placeholder.signing_hash(), &first)?;

        let payer = until_cancelled(
            cancel,
            self.services
                .reader
                .owner_of(deployment.registry, first.address),
            cancelled,
        )
        .await?;
        if payer == Address::ZERO {
            return Err(SignSlotError::ChipNotRegistered(first.address));
        }
        let nonce = until_cancelled(
            cancel,
            self.services.reader.nonces(deployment.payments, payer),
            cancelled,
        )
        .await?;

        // Same deadline as the placeholder: it is the one submitted later.
        let authorization =
            TypedPaymentAuth::new(domain, placeholder.message.for_payer(payer, nonce));
        let second = until_cancelled(
            cancel,
            self.services.chip.sign_typed_data(&authorization),
            cancelled,
        )
        .await?;
        if second.address != first.address {
            return Err(SignSlotError::ChipMismatch {
                expected: first.address,
                actual: second.address,
            });
        }
        verify_chip_signature(&authorization.signing_hash(), &second)?;

        Ok(SlotSignature {
            chip_address: first.address,
            authorization: authorization.message,
            signature: second.signature,
        })
    }
}

impl<C, R, L> BatchSettleFlow<C, R, L>
where
    L: Relay,
{
    /// Sends every slot's signed authorization to the relay as one batch.
    ///
    /// Requires all slots signed; otherwise the flow stays `collecting` and
    /// records the error. On relay failure the flow moves to `error` and
    /// only [`reset`](Self::reset) leaves it.
    pub async fn submit_batch(&mut self) -> Result<String, SubmitError> {
        if self.flow_state != BatchFlowState::Collecting {
            return Err(FlowError::InvalidState {
                action: "submit",
                state: self.flow_state.as_str(),
            }
            .into());
        }
        if !self.registry.all_signed() {
            let error = SubmitError::NotAllSigned {
                signed: self.registry.signed_count(),
                total: self.registry.total_count(),
            };
            return Err(self.reject_submit(error));
        }
        let deployment = match self.services.resolve(self.wallet.as_ref()) {
            Ok((_, deployment)) => deployment,
            Err(e) => return Err(self.reject_submit(e.into())),
        };

        let payments = self
            .registry
            .iter()
            .filter_map(|slot| slot.signature.as_ref())
            .map(|signed| signed.authorization.signed(signed.signature.clone()))
            .collect();
        let request = BatchPaymentRequest {
            payments,
            contract_address: deployment.payments,
        };

        self.error = None;
        self.set_state(BatchFlowState::Submitting);
        match self.services.relay.submit_batch(&request).await {
            Ok(tx_hash) => {
                #[cfg(feature = "telemetry")]
                tracing::info!(tx_hash = %tx_hash, payments = request.payments.len(), "Batch settlement relayed");
                self.tx_hash = Some(tx_hash.clone());
                self.set_state(BatchFlowState::Confirming);
                tokio::time::sleep(self.services.config.confirmation_delay).await;
                self.set_state(BatchFlowState::Success);
                self.callbacks.success(&tx_hash);
                Ok(tx_hash)
            }
            Err(e) => {
                let message = e.to_string();
                #[cfg(feature = "telemetry")]
                tracing::warn!(error = %message, "Batch settlement failed");
                self.error = Some(message.clone());
                self.set_state(BatchFlowState::Error);
                self.callbacks.error(&message);
                Err(e.into())
            }
        }
    }

    fn reject_submit(&mut self, error: SubmitError) -> SubmitError {
        self.error = Some(error.to_string());
        self.publish();
        error
    }
}

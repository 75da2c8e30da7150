//! Single-payer settlement: the connected wallet pays one recipient.

use alloy_primitives::{Address, U256};
use splithub_eip155::{
    ChipSigner, PaymentAuth, PaymentsReader, TypedPaymentAuth, payments_domain,
    verify_chip_signature,
};
use splithub_relay::Relay;
use splithub_types::relay::PaymentRequest;
use std::fmt;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::callbacks::FlowCallbacks;
use crate::cancel::until_cancelled;
use crate::error::{FlowError, SettleError};
use crate::services::FlowServices;
use crate::wallet::ConnectedWallet;

/// ```text
/// idle -> tapping -> signing -> submitting -> confirming -> success
///            \__________\____________\-> error
/// error | success --reset--> idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettleState {
    Idle,
    Tapping,
    Signing,
    Submitting,
    Confirming,
    Success,
    Error,
}

impl SettleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettleState::Idle => "idle",
            SettleState::Tapping => "tapping",
            SettleState::Signing => "signing",
            SettleState::Submitting => "submitting",
            SettleState::Confirming => "confirming",
            SettleState::Success => "success",
            SettleState::Error => "error",
        }
    }
}

impl fmt::Display for SettleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleSnapshot {
    pub state: SettleState,
    pub error: Option<String>,
    pub tx_hash: Option<String>,
    pub current_nonce: Option<U256>,
}

/// Controller of a one-tap payment from the connected wallet.
pub struct SettleFlow<C, R, L> {
    services: FlowServices<C, R, L>,
    wallet: Option<ConnectedWallet>,
    callbacks: FlowCallbacks,
    state: SettleState,
    error: Option<String>,
    tx_hash: Option<String>,
    current_nonce: Option<U256>,
    updates: watch::Sender<SettleSnapshot>,
}

impl<C, R, L> SettleFlow<C, R, L> {
    pub fn new(services: FlowServices<C, R, L>) -> Self {
        let (updates, _) = watch::channel(SettleSnapshot {
            state: SettleState::Idle,
            error: None,
            tx_hash: None,
            current_nonce: None,
        });
        Self {
            services,
            wallet: None,
            callbacks: FlowCallbacks::default(),
            state: SettleState::Idle,
            error: None,
            tx_hash: None,
            current_nonce: None,
            updates,
        }
    }

    pub fn with_wallet(mut self, wallet: ConnectedWallet) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn with_callbacks(mut self, callbacks: FlowCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Switching wallets forgets the cached nonce.
    pub fn connect_wallet(&mut self, wallet: ConnectedWallet) {
        if self.wallet.map(|w| w.address) != Some(wallet.address) {
            self.current_nonce = None;
        }
        self.wallet = Some(wallet);
        self.publish();
    }

    pub fn disconnect_wallet(&mut self) {
        self.wallet = None;
        self.current_nonce = None;
        self.publish();
    }

    pub fn wallet(&self) -> Option<&ConnectedWallet> {
        self.wallet.as_ref()
    }

    pub fn state(&self) -> SettleState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn tx_hash(&self) -> Option<&str> {
        self.tx_hash.as_deref()
    }

    /// Payer nonce as of the last read, if any.
    pub fn current_nonce(&self) -> Option<U256> {
        self.current_nonce
    }

    pub fn snapshot(&self) -> SettleSnapshot {
        SettleSnapshot {
            state: self.state,
            error: self.error.clone(),
            tx_hash: self.tx_hash.clone(),
            current_nonce: self.current_nonce,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SettleSnapshot> {
        self.updates.subscribe()
    }

    /// Back to `idle`. The cached nonce is kept.
    pub fn reset(&mut self) {
        self.state = SettleState::Idle;
        self.error = None;
        self.tx_hash = None;
        self.publish();
    }

    fn set_state(&mut self, state: SettleState) {
        #[cfg(feature = "telemetry")]
        tracing::debug!(from = %self.state, to = %state, "Settlement state change");
        self.state = state;
        self.publish();
    }

    fn publish(&self) {
        self.updates.send_replace(self.snapshot());
    }
}

impl<C, R, L> SettleFlow<C, R, L>
where
    C: ChipSigner,
    R: PaymentsReader,
    L: Relay,
{
    /// Pays `amount` (decimal string) of the deployment token to `recipient`.
    ///
    /// Only valid from `idle`; otherwise returns [`SettleError::Flow`] and
    /// changes nothing. Every other failure moves the flow to `error`.
    pub async fn pay(&mut self, recipient: Address, amount: &str) -> Result<String, SettleError> {
        self.pay_inner(recipient, amount, None).await
    }

    /// [`pay`](Self::pay), abandoned once `cancel` fires before the relay
    /// request is sent.
    pub async fn pay_cancellable(
        &mut self,
        recipient: Address,
        amount: &str,
        cancel: &CancellationToken,
    ) -> Result<String, SettleError> {
        self.pay_inner(recipient, amount, Some(cancel)).await
    }

    async fn pay_inner(
        &mut self,
        recipient: Address,
        amount: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<String, SettleError> {
        if self.state != SettleState::Idle {
            return Err(FlowError::InvalidState {
                action: "pay",
                state: self.state.as_str(),
            }
            .into());
        }
        self.error = None;
        self.tx_hash = None;
        match self.settle(recipient, amount, cancel).await {
            Ok(tx_hash) => {
                self.callbacks.success(&tx_hash);
                Ok(tx_hash)
            }
            Err(error) => {
                let message = error.to_string();
                #[cfg(feature = "telemetry")]
                tracing::warn!(error = %message, "Settlement failed");
                self.error = Some(message.clone());
                self.set_state(SettleState::Error);
                self.callbacks.error(&message);
                Err(error)
            }
        }
    }

    async fn settle(
        &mut self,
        recipient: Address,
        amount: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<String, SettleError> {
        let cancelled = || SettleError::Cancelled;
        let (wallet, deployment) = self.services.resolve(self.wallet.as_ref())?;
        let units = until_cancelled(
            cancel,
            self.services.token_units(&deployment, amount),
            cancelled,
        )
        .await?;
        let nonce = until_cancelled(
            cancel,
            self.services.reader.nonces(deployment.payments, wallet.address),
            cancelled,
        )
        .await?;
        self.current_nonce = Some(nonce);

        let authorization = TypedPaymentAuth::new(
            payments_domain(wallet.chain, deployment.payments),
            PaymentAuth::placeholder(recipient, deployment.token, units, self.services.deadline())
                .for_payer(wallet.address, nonce),
        );

        self.set_state(SettleState::Tapping);
        let answer = until_cancelled(
            cancel,
            self.services.chip.sign_typed_data(&authorization),
            cancelled,
        )
        .await?;
        self.set_state(SettleState::Signing);
        verify_chip_signature(&authorization.signing_hash(), &answer)?;

        let request = PaymentRequest {
            payment: authorization.message.signed(answer.signature),
            contract_address: deployment.payments,
        };
        self.set_state(SettleState::Submitting);
        let tx_hash = self.services.relay.submit_payment(&request).await?;
        #[cfg(feature = "telemetry")]
        tracing::info!(tx_hash = %tx_hash, payer = %wallet.address, recipient = %recipient, "Payment relayed");

        self.tx_hash = Some(tx_hash.clone());
        self.set_state(SettleState::Confirming);
        tokio::time::sleep(self.services.config.confirmation_delay).await;

        // The relayed payment consumed `nonce`; the next one signs with the new value.
        match self
            .services
            .reader
            .nonces(deployment.payments, wallet.address)
            .await
        {
            Ok(next) => self.current_nonce = Some(next),
            #[cfg(feature = "telemetry")]
            Err(e) => {
                tracing::warn!(error = %e, "Could not refresh payer nonce");
                self.current_nonce = None;
            }
            #[cfg(not(feature = "telemetry"))]
            Err(_) => self.current_nonce = None,
        }
        self.set_state(SettleState::Success);
        Ok(tx_hash)
    }

    /// Reads the connected wallet's current nonce into
    /// [`current_nonce`](Self::current_nonce).
    pub async fn refresh_nonce(&mut self) -> Result<U256, SettleError> {
        let (wallet, deployment) = self.services.resolve(self.wallet.as_ref())?;
        let nonce = self
            .services
            .reader
            .nonces(deployment.payments, wallet.address)
            .await?;
        self.current_nonce = Some(nonce);
        self.publish();
        Ok(nonce)
    }
}

//! Errors of the payment flows.
//!
//! `Display` strings are user-facing: they are what a slot or a flow stores
//! as its error message.

use alloy_primitives::Address;
use splithub_eip155::{ChipError, ReadError};
use splithub_relay::RelayError;
use splithub_types::amount::AmountError;
use splithub_types::chain::ChainReference;

use crate::registry::RegistryError;

/// Misuse of a flow's API. Returned without changing any state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Slot {0} is already being signed")]
    Busy(usize),
    #[error("Cannot {action} while the flow is {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
    #[error(transparent)]
    InvalidAmount(#[from] AmountError),
}

/// Missing prerequisites for building an authorization.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Wallet not connected")]
    WalletNotConnected,
    #[error("SplitHub contracts are not deployed on {0}")]
    ContractsNotDeployed(ChainReference),
    #[error("Could not read token decimals: {0}")]
    DecimalsUnavailable(ReadError),
    #[error(transparent)]
    InvalidAmount(AmountError),
}

/// Failure of [`BatchSettleFlow::sign_slot`](crate::BatchSettleFlow::sign_slot).
///
/// Every variant except `Flow` is also recorded on the slot.
#[derive(Debug, thiserror::Error)]
pub enum SignSlotError {
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error("Chip {0} is not registered. Complete chip registration before paying with it.")]
    ChipNotRegistered(Address),
    #[error("Different chip used for second tap (expected {expected}, got {actual})")]
    ChipMismatch { expected: Address, actual: Address },
    #[error(transparent)]
    Chip(#[from] ChipError),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("Signing cancelled")]
    Cancelled,
}

/// Failure of [`BatchSettleFlow::submit_batch`](crate::BatchSettleFlow::submit_batch).
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error("All slots must be signed before submitting ({signed} of {total} signed)")]
    NotAllSigned { signed: usize, total: usize },
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Relay(#[from] RelayError),
}

/// Failure of [`SettleFlow::pay`](crate::SettleFlow::pay).
#[derive(Debug, thiserror::Error)]
pub enum SettleError {
    #[error(transparent)]
    Flow(#[from] FlowError),
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Chip(#[from] ChipError),
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error("Payment cancelled")]
    Cancelled,
}

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! EVM support for SplitHub chip payments.
//!
//! A SplitHub payment is an EIP-712 `PaymentAuth` signed by an NFC chip and
//! later verified by the payments contract. This crate provides:
//!
//! - [`payment_auth`] - the `PaymentAuth` struct, its EIP-712 domain and the
//!   typed-data envelope handed to a chip
//! - [`chip`] - the [`ChipSigner`] adapter trait and signature verification
//! - [`reader`] - the [`PaymentsReader`] trait for the read-only contract calls
//!   (`ownerOf`, `nonces`, `decimals`)
//!
//! # Feature Flags
//!
//! - `local-chip` - [`LocalChip`], a chip emulated by an in-process secp256k1 key
//! - `rpc` - [`RpcPaymentsReader`], contract reads over JSON-RPC
//! - `telemetry` - tracing spans around chip and RPC calls

pub mod chip;
pub mod payment_auth;
pub mod reader;

#[cfg(feature = "local-chip")]
pub mod local_chip;
#[cfg(feature = "rpc")]
pub mod rpc;

pub use chip::*;
pub use payment_auth::*;
pub use reader::*;

#[cfg(feature = "local-chip")]
pub use local_chip::LocalChip;
#[cfg(feature = "rpc")]
pub use rpc::RpcPaymentsReader;

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types shared by the SplitHub settlement crates.
//!
//! This crate has no network or signing code. It provides:
//!
//! - [`amount`] - decimal amount strings and their conversion to token units
//! - [`timestamp`] - [`UnixTimestamp`](timestamp::UnixTimestamp) used for authorization deadlines
//! - [`chain`] - EVM chain references and well-known network names
//! - [`deployment`] - per-chain contract addresses (payments, chip registry, token)
//! - [`relay`] - wire format of the relay API

pub mod amount;
pub mod chain;
pub mod deployment;
pub mod relay;
pub mod timestamp;

mod networks;
pub use networks::*;

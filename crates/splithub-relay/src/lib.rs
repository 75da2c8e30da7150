#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Client for the SplitHub payment relay.
//!
//! The relay submits signed `PaymentAuth`s on-chain and pays the gas. This
//! crate provides the [`Relay`] trait the payment flows submit through, and
//! [`HttpRelay`], its implementation over HTTP with `reqwest`.
//!
//! ```ignore
//! use splithub_relay::{HttpRelay, Relay};
//!
//! let relay = HttpRelay::new("https://app.splithub.example".parse()?);
//! let tx_hash = relay.submit_batch(&request).await?;
//! ```

mod http;
mod relay;

pub use http::*;
pub use relay::*;

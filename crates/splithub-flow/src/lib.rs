#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Payment flows driven by NFC chip taps.
//!
//! Two controllers sequence the external calls (chip, contract reads, relay)
//! and own the state a host UI renders:
//!
//! - [`BatchSettleFlow`] - several participants each tap a chip to cover one
//!   slot of a bill; once every slot is signed the whole batch goes to the
//!   relay as one atomic request.
//! - [`SettleFlow`] - the connected wallet pays one recipient with one tap.
//!
//! # Two-tap identity resolution
//!
//! A chip's owner is unknown until the chip answers. A batch slot therefore
//! signs twice: first a placeholder authorization (payer = zero address) that
//! reveals the chip address, which the chip registry resolves to the owning
//! wallet; then the real authorization for that wallet and its current nonce.
//! Both answers must come from the same chip.
//!
//! # Example
//!
//! ```ignore
//! use splithub_flow::{BatchSettleFlow, ConnectedWallet, FlowServices};
//!
//! let services = FlowServices::new(chip, reader, relay, deployments);
//! let mut flow = BatchSettleFlow::new(services, ["10.00", "20.00"])?
//!     .with_wallet(ConnectedWallet::new(my_address, chain));
//! flow.sign_slot(0).await?;
//! flow.sign_slot(1).await?;
//! let tx_hash = flow.submit_batch().await?;
//! ```

mod batch;
mod callbacks;
mod cancel;
mod config;
mod error;
mod registry;
mod services;
mod single;
mod slot;
mod wallet;

pub use batch::*;
pub use callbacks::*;
pub use config::*;
pub use error::*;
pub use registry::*;
pub use services::*;
pub use single::*;
pub use slot::*;
pub use wallet::*;

#![allow(dead_code)]

use alloy_primitives::{Address, U256, address};
use splithub_eip155::{
    ChipError, ChipSignature, ChipSigner, LocalChip, PaymentsReader, ReadError, TypedPaymentAuth,
};
use splithub_flow::{ConnectedWallet, FlowConfig, FlowServices};
use splithub_relay::{Relay, RelayError};
use splithub_types::chain::ChainReference;
use splithub_types::deployment::{ContractDeployment, Deployments};
use splithub_types::relay::{BatchPaymentRequest, PaymentRequest};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CHAIN: ChainReference = ChainReference::new(84532);
pub const PAYMENTS: Address = address!("0x1111111111111111111111111111111111111111");
pub const REGISTRY: Address = address!("0x2222222222222222222222222222222222222222");
pub const TOKEN: Address = address!("0x3333333333333333333333333333333333333333");
pub const RECIPIENT: Address = address!("0x9999999999999999999999999999999999999999");

pub fn deployment() -> ContractDeployment {
    ContractDeployment {
        payments: PAYMENTS,
        registry: REGISTRY,
        token: TOKEN,
    }
}

pub fn deployments() -> Deployments {
    Deployments::new().with(CHAIN, deployment())
}

pub fn wallet() -> ConnectedWallet {
    ConnectedWallet::new(RECIPIENT, CHAIN)
}

pub fn config() -> FlowConfig {
    FlowConfig::default().with_confirmation_delay(Duration::ZERO)
}

/// Chips presented to the reader, one per tap, in order.
#[derive(Default)]
pub struct TapQueue {
    taps: Mutex<VecDeque<LocalChip>>,
}

impl TapQueue {
    /// The same chip held to the reader for both taps of one slot.
    pub fn present(&self, chip: &LocalChip) {
        self.tap(chip);
        self.tap(chip);
    }

    pub fn tap(&self, chip: &LocalChip) {
        self.taps.lock().unwrap().push_back(chip.clone());
    }

    pub fn remaining(&self) -> usize {
        self.taps.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ChipSigner for TapQueue {
    async fn sign_typed_data(
        &self,
        request: &TypedPaymentAuth,
    ) -> Result<ChipSignature, ChipError> {
        let chip = self.taps.lock().unwrap().pop_front();
        match chip {
            Some(chip) => chip.sign_typed_data(request).await,
            None => Err(ChipError::Rejected("no chip presented".into())),
        }
    }
}

/// A chip that never answers.
pub struct SilentChip;

#[async_trait::async_trait]
impl ChipSigner for SilentChip {
    async fn sign_typed_data(
        &self,
        _request: &TypedPaymentAuth,
    ) -> Result<ChipSignature, ChipError> {
        std::future::pending().await
    }
}

pub struct FakeReader {
    owners: Mutex<HashMap<Address, Address>>,
    nonces: Mutex<HashMap<Address, U256>>,
    nonce_reads_left: Mutex<Option<usize>>,
    decimals: Option<u8>,
}

impl Default for FakeReader {
    fn default() -> Self {
        Self {
            owners: Mutex::default(),
            nonces: Mutex::default(),
            nonce_reads_left: Mutex::default(),
            decimals: Some(6),
        }
    }
}

impl FakeReader {
    pub fn without_decimals() -> Self {
        Self {
            decimals: None,
            ..Self::default()
        }
    }

    pub fn register(&self, chip: &LocalChip, owner: Address) {
        self.owners.lock().unwrap().insert(chip.address(), owner);
    }

    pub fn set_nonce(&self, payer: Address, nonce: u64) {
        self.nonces.lock().unwrap().insert(payer, U256::from(nonce));
    }

    pub fn nonce(&self, payer: Address) -> U256 {
        self.nonces
            .lock()
            .unwrap()
            .get(&payer)
            .copied()
            .unwrap_or_default()
    }

    /// `nonces` answers `reads` more times, then fails.
    pub fn fail_nonces_after(&self, reads: usize) {
        *self.nonce_reads_left.lock().unwrap() = Some(reads);
    }

    pub fn consume_nonce(&self, payer: Address) {
        let next = self.nonce(payer) + U256::from(1);
        self.nonces.lock().unwrap().insert(payer, next);
    }
}

#[async_trait::async_trait]
impl PaymentsReader for FakeReader {
    async fn owner_of(&self, registry: Address, chip: Address) -> Result<Address, ReadError> {
        assert_eq!(registry, REGISTRY);
        Ok(self
            .owners
            .lock()
            .unwrap()
            .get(&chip)
            .copied()
            .unwrap_or(Address::ZERO))
    }

    async fn nonces(&self, payments: Address, payer: Address) -> Result<U256, ReadError> {
        assert_eq!(payments, PAYMENTS);
        if let Some(left) = self.nonce_reads_left.lock().unwrap().as_mut() {
            if *left == 0 {
                return Err(ReadError::Transport("connection reset".into()));
            }
            *left -= 1;
        }
        Ok(self.nonce(payer))
    }

    async fn decimals(&self, token: Address) -> Result<u8, ReadError> {
        assert_eq!(token, TOKEN);
        self.decimals
            .ok_or_else(|| ReadError::ContractCall("execution reverted".into()))
    }
}

/// Records every request; answers `0xabc` or fails with `failure`.
#[derive(Default)]
pub struct FakeRelay {
    pub batches: Mutex<Vec<BatchPaymentRequest>>,
    pub payments: Mutex<Vec<PaymentRequest>>,
    failure: Option<String>,
    reader: Option<Arc<FakeReader>>,
}

impl FakeRelay {
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// Consumes each relayed payer's nonce, like the payments contract would.
    pub fn settling_on(reader: Arc<FakeReader>) -> Self {
        Self {
            reader: Some(reader),
            ..Self::default()
        }
    }

    fn answer(&self, payers: impl IntoIterator<Item = Address>) -> Result<String, RelayError> {
        if let Some(message) = &self.failure {
            return Err(RelayError::Rejected {
                status: 500,
                message: message.clone(),
            });
        }
        if let Some(reader) = &self.reader {
            payers.into_iter().for_each(|payer| reader.consume_nonce(payer));
        }
        Ok("0xabc".to_string())
    }
}

#[async_trait::async_trait]
impl Relay for FakeRelay {
    async fn submit_payment(&self, request: &PaymentRequest) -> Result<String, RelayError> {
        self.payments.lock().unwrap().push(request.clone());
        self.answer([request.payment.payer])
    }

    async fn submit_batch(&self, request: &BatchPaymentRequest) -> Result<String, RelayError> {
        self.batches.lock().unwrap().push(request.clone());
        self.answer(request.payments.iter().map(|payment| payment.payer))
    }
}

pub type TestServices = FlowServices<Arc<TapQueue>, Arc<FakeReader>, Arc<FakeRelay>>;

pub struct Harness {
    pub chips: Arc<TapQueue>,
    pub reader: Arc<FakeReader>,
    pub relay: Arc<FakeRelay>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_relay(FakeRelay::default())
    }

    pub fn with_relay(relay: FakeRelay) -> Self {
        Self {
            chips: Arc::new(TapQueue::default()),
            reader: Arc::new(FakeReader::default()),
            relay: Arc::new(relay),
        }
    }

    /// The relay consumes payer nonces on the shared reader.
    pub fn settling() -> Self {
        let reader = Arc::new(FakeReader::default());
        Self {
            chips: Arc::new(TapQueue::default()),
            relay: Arc::new(FakeRelay::settling_on(Arc::clone(&reader))),
            reader,
        }
    }

    pub fn services(&self) -> TestServices {
        FlowServices::new(
            Arc::clone(&self.chips),
            Arc::clone(&self.reader),
            Arc::clone(&self.relay),
            deployments(),
        )
        .with_config(config())
    }

    /// A chip registered to a fresh payer wallet.
    pub fn registered_chip(&self) -> (LocalChip, Address) {
        let chip = LocalChip::random();
        let owner = LocalChip::random().address();
        self.reader.register(&chip, owner);
        (chip, owner)
    }
}

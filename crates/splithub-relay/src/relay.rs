use splithub_types::relay::{BatchPaymentRequest, PaymentRequest};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Relay request failed: {0}")]
    Transport(String),
    /// The relay refused the payment. `message` is the relay's own `error`
    /// text when it sent one.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("Unexpected relay response: {0}")]
    InvalidResponse(String),
}

/// Submits signed authorizations and returns the relay's transaction hash.
#[async_trait::async_trait]
pub trait Relay: Send + Sync {
    /// `POST /api/relay/payment`
    async fn submit_payment(&self, request: &PaymentRequest) -> Result<String, RelayError>;

    /// `POST /api/relay/batch-payment`
    async fn submit_batch(&self, request: &BatchPaymentRequest) -> Result<String, RelayError>;
}

#[async_trait::async_trait]
impl<T: Relay + ?Sized> Relay for Arc<T> {
    async fn submit_payment(&self, request: &PaymentRequest) -> Result<String, RelayError> {
        (**self).submit_payment(request).await
    }

    async fn submit_batch(&self, request: &BatchPaymentRequest) -> Result<String, RelayError> {
        (**self).submit_batch(request).await
    }
}

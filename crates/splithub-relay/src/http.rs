use reqwest::{Client, StatusCode};
use splithub_types::relay::{
    BATCH_PAYMENT_PATH, BatchPaymentRequest, PAYMENT_PATH, PaymentRequest, RelayResponse,
};
use std::time::Duration;
use url::Url;

use crate::relay::{Relay, RelayError};

/// [`Relay`] over HTTP.
///
/// Endpoint paths are absolute, so they replace any path on `base_url`.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    client: Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl HttpRelay {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: Url) -> Self {
        Self {
            client,
            base_url,
            timeout: None,
        }
    }

    /// Per-request timeout. Unset means the client's default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn post<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<String, RelayError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| RelayError::Transport(format!("invalid relay url: {e}")))?;
        let mut request = self.client.post(url).json(body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| RelayError::Transport(format!("failed to read relay response: {e}")))?;

        let parsed = serde_json::from_str::<RelayResponse>(&text).ok();
        interpret_response(status, parsed, &text)
    }
}

fn interpret_response(
    status: StatusCode,
    parsed: Option<RelayResponse>,
    raw: &str,
) -> Result<String, RelayError> {
    match parsed {
        Some(RelayResponse {
            error: Some(message),
            ..
        }) => Err(RelayError::Rejected {
            status: status.as_u16(),
            message,
        }),
        Some(RelayResponse {
            tx_hash: Some(tx_hash),
            ..
        }) if status.is_success() => Ok(tx_hash),
        _ if !status.is_success() => Err(RelayError::Rejected {
            status: status.as_u16(),
            message: format!("Relay request failed with status {status}"),
        }),
        _ => Err(RelayError::InvalidResponse(format!(
            "missing txHash in {raw:?}"
        ))),
    }
}

#[async_trait::async_trait]
impl Relay for HttpRelay {
    async fn submit_payment(&self, request: &PaymentRequest) -> Result<String, RelayError> {
        #[cfg(feature = "telemetry")]
        tracing::info!(payer = %request.payment.payer, amount = %request.payment.amount, "Submitting payment to relay");
        let result = self.post(PAYMENT_PATH, request).await;
        #[cfg(feature = "telemetry")]
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Relay rejected payment");
        }
        result
    }

    async fn submit_batch(&self, request: &BatchPaymentRequest) -> Result<String, RelayError> {
        #[cfg(feature = "telemetry")]
        tracing::info!(payments = request.payments.len(), "Submitting batch payment to relay");
        let result = self.post(BATCH_PAYMENT_PATH, request).await;
        #[cfg(feature = "telemetry")]
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Relay rejected batch payment");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, U256};
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use splithub_types::relay::SignedPayment;
    use splithub_types::timestamp::UnixTimestamp;

    async fn spawn_relay(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}").parse().unwrap()
    }

    fn payment() -> SignedPayment {
        SignedPayment {
            payer: Address::repeat_byte(0x11),
            recipient: Address::repeat_byte(0x22),
            token: Address::repeat_byte(0x33),
            amount: U256::from(10_000_000u64),
            nonce: U256::ZERO,
            deadline: UnixTimestamp::from_secs(1_700_000_000),
            signature: Bytes::from(vec![0u8; 65]),
        }
    }

    #[tokio::test]
    async fn test_batch_success_returns_tx_hash() {
        let router = Router::new().route(
            BATCH_PAYMENT_PATH,
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["payments"].as_array().unwrap().len(), 2);
                assert_eq!(body["payments"][0]["amount"], "10000000");
                Json(RelayResponse::success("0xabc"))
            }),
        );
        let relay = HttpRelay::new(spawn_relay(router).await);
        let request = BatchPaymentRequest {
            payments: vec![payment(), payment()],
            contract_address: Address::repeat_byte(0x44),
        };
        assert_eq!(relay.submit_batch(&request).await.unwrap(), "0xabc");
    }

    #[tokio::test]
    async fn test_batch_error_message_is_verbatim() {
        let router = Router::new().route(
            BATCH_PAYMENT_PATH,
            post(|| async {
                (
                    AxumStatus::INTERNAL_SERVER_ERROR,
                    Json(RelayResponse::failure("insufficient funds")),
                )
            }),
        );
        let relay = HttpRelay::new(spawn_relay(router).await);
        let request = BatchPaymentRequest {
            payments: vec![payment()],
            contract_address: Address::repeat_byte(0x44),
        };
        let err = relay.submit_batch(&request).await.unwrap_err();
        assert!(matches!(err, RelayError::Rejected { status: 500, .. }));
        assert_eq!(err.to_string(), "insufficient funds");
    }

    #[tokio::test]
    async fn test_single_payment_posts_flat_body() {
        let router = Router::new().route(
            PAYMENT_PATH,
            post(|Json(body): Json<Value>| async move {
                assert!(body["payer"].is_string());
                assert!(body["contractAddress"].is_string());
                Json(json!({ "txHash": "0xdef" }))
            }),
        );
        let relay = HttpRelay::new(spawn_relay(router).await);
        let request = PaymentRequest {
            payment: payment(),
            contract_address: Address::repeat_byte(0x44),
        };
        assert_eq!(relay.submit_payment(&request).await.unwrap(), "0xdef");
    }

    #[tokio::test]
    async fn test_slow_relay_times_out() {
        let router = Router::new().route(
            PAYMENT_PATH,
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(RelayResponse::success("0xlate"))
            }),
        );
        let relay =
            HttpRelay::new(spawn_relay(router).await).with_timeout(Duration::from_millis(100));
        let request = PaymentRequest {
            payment: payment(),
            contract_address: Address::repeat_byte(0x44),
        };
        let err = relay.submit_payment(&request).await.unwrap_err();
        assert!(matches!(err, RelayError::Transport(_)));
    }

    #[tokio::test]
    async fn test_endpoint_path_replaces_base_path() {
        let router = Router::new().route(
            PAYMENT_PATH,
            post(|| async { Json(RelayResponse::success("0xdef")) }),
        );
        let base = spawn_relay(router).await.join("/api/v1/").unwrap();
        let relay = HttpRelay::new(base.clone());
        assert_eq!(relay.base_url(), &base);
        let request = PaymentRequest {
            payment: payment(),
            contract_address: Address::repeat_byte(0x44),
        };
        assert_eq!(relay.submit_payment(&request).await.unwrap(), "0xdef");
    }

    #[test]
    fn test_interpret_status_without_body() {
        let err = interpret_response(StatusCode::BAD_GATEWAY, None, "<html>").unwrap_err();
        assert!(err.to_string().contains("502"));
        let err = interpret_response(StatusCode::OK, Some(RelayResponse::default()), "{}").unwrap_err();
        assert!(matches!(err, RelayError::InvalidResponse(_)));
    }
}

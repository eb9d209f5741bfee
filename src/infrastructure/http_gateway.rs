use crate::domain::payment::{ChargeOutcome, ChargeRequest, GatewayTransaction, codes};
use crate::domain::ports::PaymentGateway;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct Approval {
    transaction: GatewayTransaction,
}

#[derive(Deserialize)]
struct Rejection {
    errors: RejectionErrors,
}

#[derive(Deserialize)]
struct RejectionErrors {
    credit_card: RejectionDetail,
}

#[derive(Deserialize)]
struct RejectionDetail {
    code: String,
    name: String,
}

/// Charges cards through the remote payment service over HTTP.
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpPaymentGateway {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(&self, request: &ChargeRequest) -> ChargeOutcome {
        let response = match self
            .client
            .post(&self.url)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                return ChargeOutcome::Unreachable(format!("timed out after {} ms", self.timeout.as_millis()));
            }
            Err(e) => return ChargeOutcome::Unreachable(e.to_string()),
        };

        let status = response.status();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => return ChargeOutcome::Unreachable(e.to_string()),
        };
        debug!(%status, bytes = body.len(), "Gateway responded");

        if status == reqwest::StatusCode::OK {
            match serde_json::from_slice::<Approval>(&body) {
                Ok(approval) if approval.transaction.success => ChargeOutcome::Approved(approval.transaction),
                Ok(approval) => {
                    warn!(transaction_id = %approval.transaction.id, "Gateway answered 200 with an unsuccessful transaction");
                    ChargeOutcome::Declined {
                        code: codes::CARD_DECLINED.to_string(),
                        name: "The payment service reported an unsuccessful transaction".to_string(),
                    }
                }
                Err(e) => ChargeOutcome::Unreachable(format!("unreadable approval: {}", e)),
            }
        } else {
            match serde_json::from_slice::<Rejection>(&body) {
                Ok(rejection) => ChargeOutcome::Declined {
                    code: rejection.errors.credit_card.code,
                    name: rejection.errors.credit_card.name,
                },
                Err(_) => ChargeOutcome::Unreachable(format!("HTTP {}", status)),
            }
        }
    }
}

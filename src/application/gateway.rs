use crate::domain::card::CompleteCard;
use crate::domain::money::Money;
use crate::domain::payment::{ChargeOutcome, ChargeRequest};
use crate::domain::ports::PaymentGatewayBox;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Card numbers the sandbox gateway knows how to process.
pub const ACCEPTED_TEST_NUMBERS: [&str; 2] = ["4242 4242 4242 4242", "4000 0000 0000 0002"];

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Wraps a [`PaymentGateway`](crate::domain::ports::PaymentGateway) with the
/// number whitelist and a deadline on every charge.
///
/// There is no retry: one call per payment job.
pub struct GatewayClient {
    gateway: PaymentGatewayBox,
    timeout: Duration,
}

impl GatewayClient {
    pub fn new(gateway: PaymentGatewayBox) -> Self {
        Self {
            gateway,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn accepts(number: &str) -> bool {
        ACCEPTED_TEST_NUMBERS.contains(&number)
    }

    #[instrument(skip(self, card), fields(amount = %amount))]
    pub async fn charge(&self, card: CompleteCard, amount: Money) -> ChargeOutcome {
        let request = ChargeRequest {
            credit_card: card,
            amount_charged: amount,
        };
        let outcome = match tokio::time::timeout(self.timeout, self.gateway.charge(&request)).await {
            Ok(outcome) => outcome,
            Err(_) => ChargeOutcome::Unreachable(format!(
                "no response within {} ms",
                self.timeout.as_millis()
            )),
        };

        match &outcome {
            ChargeOutcome::Approved(tx) => info!(transaction_id = %tx.id, "Charge approved"),
            ChargeOutcome::Declined { code, .. } => info!(code = %code, "Charge declined"),
            ChargeOutcome::Unreachable(reason) => warn!(reason = %reason, "Gateway unreachable"),
        }
        outcome
    }
}

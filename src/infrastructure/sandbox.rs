use crate::domain::payment::{ChargeOutcome, ChargeRequest, GatewayTransaction, codes};
use crate::domain::ports::PaymentGateway;
use async_trait::async_trait;
use uuid::Uuid;

pub const APPROVED_NUMBER: &str = "4242 4242 4242 4242";

/// Offline stand-in for the remote payment service.
///
/// Behaves like the service's sandbox: the approved test number is charged,
/// every other number is declined.
#[derive(Debug, Default, Clone)]
pub struct SandboxGateway;

impl SandboxGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn charge(&self, request: &ChargeRequest) -> ChargeOutcome {
        if request.credit_card.number == APPROVED_NUMBER {
            ChargeOutcome::Approved(GatewayTransaction {
                id: Uuid::new_v4().simple().to_string().to_uppercase(),
                success: true,
                amount_charged: request.amount_charged,
            })
        } else {
            ChargeOutcome::Declined {
                code: codes::CARD_DECLINED.to_string(),
                name: "The credit card was declined".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::CompleteCard;
    use crate::domain::money::Money;

    fn request(number: &str) -> ChargeRequest {
        ChargeRequest {
            credit_card: CompleteCard {
                name: "John Doe".into(),
                number: number.into(),
                expiration_month: 9,
                expiration_year: 2030,
                cvv: "123".into(),
            },
            amount_charged: Money::from_units(45),
        }
    }

    #[tokio::test]
    async fn test_sandbox_cards() {
        let gateway = SandboxGateway::new();
        match gateway.charge(&request("4242 4242 4242 4242")).await {
            ChargeOutcome::Approved(tx) => {
                assert!(tx.success);
                assert_eq!(tx.amount_charged, Money::from_units(45));
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let declined = gateway.charge(&request("4000 0000 0000 0002")).await;
        assert!(matches!(declined, ChargeOutcome::Declined { ref code, .. } if code == "card-declined"));
    }
}

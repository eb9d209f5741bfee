use crate::application::gateway::GatewayClient;
use crate::application::ledger::OrderLedger;
use crate::domain::card::CompleteCard;
use crate::domain::job::PaymentJob;
use crate::domain::money::Money;
use crate::domain::order::{CreditCard, Order};
use crate::domain::payment::{ChargeOutcome, codes};
use crate::domain::ports::JobQueueRef;
use crate::error::{OrderError, Result};
use std::sync::Arc;
use tracing::{error, instrument, warn};

/// What a payment job did to its order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Paid,
    Failed { code: String },
    /// The order no longer exists.
    Skipped,
    /// Execution hit a storage failure; the outcome was not recorded.
    Aborted,
}

enum Precheck {
    Ready { card: CompleteCard, amount: Money },
    Rejected { code: &'static str, name: &'static str, amount: Money },
}

/// Runs queued payment jobs against the ledger and the gateway.
///
/// Every job ends with exactly one `record_success` or `record_failure`, so
/// the order lock is released whatever happens to the charge.
pub struct PaymentJobExecutor {
    ledger: Arc<OrderLedger>,
    gateway: GatewayClient,
    queue: JobQueueRef,
}

impl PaymentJobExecutor {
    pub fn new(ledger: Arc<OrderLedger>, gateway: GatewayClient, queue: JobQueueRef) -> Self {
        Self { ledger, gateway, queue }
    }

    #[instrument(skip(self, job), fields(order_id = %job.order_id, job_id = %job.id))]
    pub async fn execute(&self, job: PaymentJob) -> Result<JobOutcome> {
        let order = match self.ledger.get_order(job.order_id).await {
            Ok(order) => order,
            Err(OrderError::OrderNotFound(_)) => {
                warn!("Dropping payment job for an unknown order");
                return Ok(JobOutcome::Skipped);
            }
            Err(e) => return Err(e),
        };

        let lock = job.lock;
        let (card, amount) = match self.precheck(&order, &job).await? {
            Precheck::Ready { card, amount } => (card, amount),
            Precheck::Rejected { code, name, amount } => {
                self.ledger.record_failure(order.id, code, name, amount, lock).await?;
                return Ok(JobOutcome::Failed { code: code.to_string() });
            }
        };

        let summary = CreditCard::truncated(
            &card.name,
            &card.number,
            card.expiration_month,
            card.expiration_year,
        );
        match self.gateway.charge(card, amount).await {
            ChargeOutcome::Approved(tx) => {
                self.ledger.record_success(order.id, tx, summary, lock).await?;
                Ok(JobOutcome::Paid)
            }
            ChargeOutcome::Declined { code, name } => {
                self.ledger.record_failure(order.id, &code, &name, amount, lock).await?;
                Ok(JobOutcome::Failed { code })
            }
            ChargeOutcome::Unreachable(reason) => {
                let name = format!("Payment gateway unreachable: {}", reason);
                self.ledger
                    .record_failure(order.id, codes::GATEWAY_UNREACHABLE, &name, amount, lock)
                    .await?;
                Ok(JobOutcome::Failed {
                    code: codes::GATEWAY_UNREACHABLE.to_string(),
                })
            }
        }
    }

    async fn precheck(&self, order: &Order, job: &PaymentJob) -> Result<Precheck> {
        if order.paid {
            return Ok(Precheck::Rejected {
                code: codes::ALREADY_PAID,
                name: "The order has already been paid",
                amount: Money::ZERO,
            });
        }
        let amount = match self.ledger.price(order).await {
            Ok(pricing) => pricing.amount_due(),
            Err(OrderError::ProductNotFound(product_id)) => {
                warn!(product_id, "Ordered product is missing from the catalog");
                return Ok(Precheck::Rejected {
                    code: codes::PRODUCT_NOT_FOUND,
                    name: "A product of the order is no longer in the catalog",
                    amount: Money::ZERO,
                });
            }
            Err(e) => return Err(e),
        };
        let reject = |code: &'static str, name: &'static str| -> Result<Precheck> {
            Ok(Precheck::Rejected { code, name, amount })
        };

        let Some(card) = job.card.complete() else {
            return reject(codes::MISSING_FIELDS, "Credit card fields are missing");
        };
        if !order.has_customer_info() {
            return reject(
                codes::MISSING_FIELDS,
                "Customer information is required before submitting a credit card",
            );
        }
        if !GatewayClient::accepts(&card.number) {
            return reject(codes::INCORRECT_NUMBER, "The card number is invalid");
        }
        if order.lines.is_empty() {
            return reject(codes::NO_PRODUCTS, "The order has no products");
        }
        Ok(Precheck::Ready { card, amount })
    }

    /// Claims and executes the next queued job, if any.
    ///
    /// The job is acknowledged even when its execution failed on storage:
    /// the lock is then released best-effort and the failure is logged.
    pub async fn run_next(&self) -> Result<Option<JobOutcome>> {
        let Some((handle, job)) = self.queue.dequeue().await? else {
            return Ok(None);
        };
        let (order_id, lock) = (job.order_id, job.lock);
        let outcome = match self.execute(job).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(order_id = %order_id, error = %e, "Payment job failed");
                if let Err(e) = self.ledger.release_payment(order_id, lock).await {
                    error!(order_id = %order_id, error = %e, "Could not release payment lock");
                }
                JobOutcome::Aborted
            }
        };
        self.queue.ack(handle).await?;
        Ok(Some(outcome))
    }

    /// Executes queued jobs until the queue is empty. Returns how many ran.
    pub async fn run_pending(&self) -> Result<usize> {
        let mut count = 0;
        while self.run_next().await?.is_some() {
            count += 1;
        }
        Ok(count)
    }
}

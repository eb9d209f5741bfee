use crate::application::cache::OrderViewCache;
use crate::application::ledger::OrderLedger;
use crate::domain::card::CardPayload;
use crate::domain::job::{JobHandle, PaymentJob};
use crate::domain::order::{LineItem, OrderId, ShippingInfo};
use crate::domain::ports::JobQueueRef;
use crate::domain::view::OrderView;
use crate::error::{OrderError, Result};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Client-facing operations on orders.
///
/// Reads go through the view cache; writes go to the ledger. Card submission
/// only takes the payment lock and queues the job: the outcome is observed
/// later through [`OrderWorkflow::get_order`].
pub struct OrderWorkflow {
    ledger: Arc<OrderLedger>,
    cache: OrderViewCache,
    queue: JobQueueRef,
}

impl OrderWorkflow {
    pub fn new(ledger: Arc<OrderLedger>, cache: OrderViewCache, queue: JobQueueRef) -> Self {
        Self { ledger, cache, queue }
    }

    pub async fn create_order(&self, items: &[LineItem]) -> Result<OrderId> {
        Ok(self.ledger.create_order(items).await?.id)
    }

    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get_order(&self, id: OrderId) -> Result<OrderView> {
        if let Some(view) = self.cache.get(id).await? {
            return Ok(view);
        }
        let view = self.ledger.assemble_view(id).await?;
        self.cache.offer(&view).await?;
        Ok(view)
    }

    /// Returns the freshly assembled view, bypassing the cache.
    #[instrument(skip(self, info, email), fields(order_id = %id))]
    pub async fn update_shipping(&self, id: OrderId, info: ShippingInfo, email: String) -> Result<OrderView> {
        self.ledger.set_shipping_info(id, info, email).await?;
        self.ledger.assemble_view(id).await
    }

    /// Locks the order and queues a payment job for it.
    ///
    /// If the job cannot be queued the lock is released again and the
    /// caller gets `QueueUnavailable`.
    #[instrument(skip(self, card), fields(order_id = %id))]
    pub async fn submit_card(&self, id: OrderId, card: CardPayload) -> Result<JobHandle> {
        let lock = self.ledger.begin_payment(id).await?;

        match self.queue.enqueue(PaymentJob::new(id, card).with_lock(lock)).await {
            Ok(handle) => {
                info!(job = handle.0, "Payment job queued");
                Ok(handle)
            }
            Err(e) => {
                error!(error = %e, "Could not queue payment job");
                self.ledger.release_payment(id, Some(lock)).await?;
                Err(match e {
                    OrderError::QueueUnavailable(_) => e,
                    other => OrderError::QueueUnavailable(other.to_string()),
                })
            }
        }
    }
}

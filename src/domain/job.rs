use super::card::CardPayload;
use super::order::{LockToken, OrderId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A queued request to charge a card for an order.
///
/// The card is kept whole, number and CVV included, for as long as the job
/// is queued: a durable queue therefore holds raw card data until the job is
/// acknowledged. Nothing else persists it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PaymentJob {
    pub id: Uuid,
    pub order_id: OrderId,
    pub card: CardPayload,
    pub enqueued_at: DateTime<Utc>,
    /// The payment lock taken for this job. Without one the job releases
    /// whatever lock the order holds.
    #[serde(default)]
    pub lock: Option<LockToken>,
}

impl PaymentJob {
    pub fn new(order_id: OrderId, card: CardPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            card,
            enqueued_at: Utc::now(),
            lock: None,
        }
    }

    pub fn with_lock(mut self, lock: LockToken) -> Self {
        self.lock = Some(lock);
        self
    }
}

/// Queue-assigned position of a job, used to acknowledge it once executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobHandle(pub u64);

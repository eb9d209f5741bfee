use super::job::{JobHandle, PaymentJob};
use super::order::{Order, OrderId};
use super::payment::{ChargeOutcome, ChargeRequest, PaymentFailure, Transaction};
use super::product::Product;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Reserves the identifier for a new order.
    async fn next_id(&self) -> Result<OrderId>;
    async fn store(&self, order: Order) -> Result<()>;
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn store(&self, tx: Transaction) -> Result<()>;
    async fn get(&self, tx_id: &str) -> Result<Option<Transaction>>;
    async fn delete(&self, tx_id: &str) -> Result<()>;
    async fn get_all(&self) -> Result<Vec<Transaction>>;
}

#[async_trait]
pub trait FailureStore: Send + Sync {
    async fn store(&self, failure: PaymentFailure) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<PaymentFailure>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn get_all(&self) -> Result<Vec<PaymentFailure>>;
}

/// Read-only view of the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn lookup(&self, product_id: u64) -> Result<Option<Product>>;
}

/// Byte store backing the order view cache. Entries never expire.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, order_id: OrderId) -> Result<Option<Vec<u8>>>;
    async fn set(&self, order_id: OrderId, bytes: Vec<u8>) -> Result<()>;
}

/// Queue of payment jobs.
///
/// A dequeued job stays claimed by its worker until acknowledged; claimed
/// jobs are not handed to other workers. Durable implementations redeliver
/// unacknowledged jobs after a restart.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: PaymentJob) -> Result<JobHandle>;
    async fn dequeue(&self) -> Result<Option<(JobHandle, PaymentJob)>>;
    async fn ack(&self, handle: JobHandle) -> Result<()>;
    /// Jobs waiting or claimed but not yet acknowledged.
    async fn len(&self) -> Result<usize>;
}

/// Outbound connection to the card charging service.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn charge(&self, request: &ChargeRequest) -> ChargeOutcome;
}

pub type OrderStoreBox = Box<dyn OrderStore>;
pub type TransactionStoreBox = Box<dyn TransactionStore>;
pub type FailureStoreBox = Box<dyn FailureStore>;
pub type ProductCatalogBox = Box<dyn ProductCatalog>;
pub type CacheStoreBox = Box<dyn CacheStore>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;

/// Shared by the workflow facade (producer) and the workers (consumers).
pub type JobQueueRef = Arc<dyn JobQueue>;

/// Every storage-side port, opened once at start-up and handed to the
/// application layer.
pub struct Storage {
    pub orders: OrderStoreBox,
    pub transactions: TransactionStoreBox,
    pub failures: FailureStoreBox,
    pub cache: CacheStoreBox,
    pub queue: JobQueueRef,
}

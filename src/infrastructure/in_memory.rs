use crate::domain::job::{JobHandle, PaymentJob};
use crate::domain::order::{Order, OrderId};
use crate::domain::payment::{PaymentFailure, Transaction};
use crate::domain::ports::{
    CacheStore, FailureStore, JobQueue, OrderStore, ProductCatalog, Storage, TransactionStore,
};
use crate::domain::product::Product;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// A thread-safe in-memory store for orders.
///
/// Cloning shares the underlying map and id counter.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
    last_id: Arc<AtomicU64>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn next_id(&self) -> Result<OrderId> {
        Ok(OrderId(self.last_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn store(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id).cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn store(&self, tx: Transaction) -> Result<()> {
        let mut transactions = self.transactions.write().await;
        transactions.insert(tx.id.clone(), tx);
        Ok(())
    }

    async fn get(&self, tx_id: &str) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions.get(tx_id).cloned())
    }

    async fn delete(&self, tx_id: &str) -> Result<()> {
        self.transactions.write().await.remove(tx_id);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Transaction>> {
        Ok(self.transactions.read().await.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryFailureStore {
    failures: Arc<RwLock<HashMap<Uuid, PaymentFailure>>>,
}

impl InMemoryFailureStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FailureStore for InMemoryFailureStore {
    async fn store(&self, failure: PaymentFailure) -> Result<()> {
        self.failures.write().await.insert(failure.id, failure);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<PaymentFailure>> {
        Ok(self.failures.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.failures.write().await.remove(&id);
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<PaymentFailure>> {
        Ok(self.failures.read().await.values().cloned().collect())
    }
}

/// Product catalog loaded once at start-up. Read-only afterwards.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    products: Arc<HashMap<u64, Product>>,
}

impl InMemoryCatalog {
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id, p)).collect();
        Self {
            products: Arc::new(products),
        }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn lookup(&self, product_id: u64) -> Result<Option<Product>> {
        Ok(self.products.get(&product_id).cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryCache {
    entries: Arc<RwLock<HashMap<OrderId, Vec<u8>>>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, order_id: OrderId) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(&order_id).cloned())
    }

    async fn set(&self, order_id: OrderId, bytes: Vec<u8>) -> Result<()> {
        self.entries.write().await.insert(order_id, bytes);
        Ok(())
    }
}

#[derive(Default)]
struct QueueState {
    next: u64,
    waiting: VecDeque<(JobHandle, PaymentJob)>,
    claimed: BTreeMap<JobHandle, PaymentJob>,
}

/// FIFO job queue living in process memory. Jobs do not survive a restart.
#[derive(Default, Clone)]
pub struct InMemoryJobQueue {
    state: Arc<Mutex<QueueState>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: PaymentJob) -> Result<JobHandle> {
        let mut state = self.state.lock().await;
        state.next += 1;
        let handle = JobHandle(state.next);
        state.waiting.push_back((handle, job));
        Ok(handle)
    }

    async fn dequeue(&self) -> Result<Option<(JobHandle, PaymentJob)>> {
        let mut state = self.state.lock().await;
        let Some((handle, job)) = state.waiting.pop_front() else {
            return Ok(None);
        };
        state.claimed.insert(handle, job.clone());
        Ok(Some((handle, job)))
    }

    async fn ack(&self, handle: JobHandle) -> Result<()> {
        self.state.lock().await.claimed.remove(&handle);
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        let state = self.state.lock().await;
        Ok(state.waiting.len() + state.claimed.len())
    }
}

/// Fresh in-memory storage for every port.
pub fn storage() -> Storage {
    Storage {
        orders: Box::new(InMemoryOrderStore::new()),
        transactions: Box::new(InMemoryTransactionStore::new()),
        failures: Box::new(InMemoryFailureStore::new()),
        cache: Box::new(InMemoryCache::new()),
        queue: Arc::new(InMemoryJobQueue::new()),
    }
}

use crate::domain::job::{JobHandle, PaymentJob};
use crate::domain::order::{Order, OrderId};
use crate::domain::payment::{PaymentFailure, Transaction};
use crate::domain::ports::{CacheStore, FailureStore, JobQueue, OrderStore, Storage, TransactionStore};
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const CF_ORDERS: &str = "orders";
pub const CF_TRANSACTIONS: &str = "transactions";
pub const CF_FAILURES: &str = "failures";
pub const CF_CACHE: &str = "cache";
/// Payment jobs keyed by big-endian sequence number, so iteration is FIFO.
///
/// Each entry holds the full submitted card, number and CVV included, until
/// the job is acknowledged. This is the only place a raw card is written to
/// disk; orders keep only the masked `CreditCard` summary.
pub const CF_JOBS: &str = "jobs";
/// Order id counter.
pub const CF_META: &str = "meta";

const ORDER_SEQ_KEY: &[u8] = b"order_seq";

const COLUMN_FAMILIES: [&str; 6] = [CF_ORDERS, CF_TRANSACTIONS, CF_FAILURES, CF_CACHE, CF_JOBS, CF_META];

/// A persistent store implementation using RocksDB.
///
/// Every port lives in its own column family. The job queue is durable: a
/// job stays in `jobs` until acknowledged, and claims are held in memory
/// only, so jobs claimed but not acknowledged before a restart are delivered
/// again.
///
/// Cloning shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    counters: Arc<Mutex<()>>,
    claimed: Arc<Mutex<BTreeSet<u64>>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path` with every column
    /// family the stores need.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            counters: Arc::new(Mutex::new(())),
            claimed: Arc::new(Mutex::new(BTreeSet::new())),
        })
    }

    /// Hands every port to the application, all backed by this database.
    pub fn storage(self) -> Storage {
        Storage {
            orders: Box::new(self.clone()),
            transactions: Box::new(self.clone()),
            failures: Box::new(self.clone()),
            cache: Box::new(self.clone()),
            queue: Arc::new(self),
        }
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| OrderError::internal(format!("{} column family not found", name)))
    }

    fn put_json<T: Serialize>(&self, cf: &str, key: impl AsRef<[u8]>, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(self.cf(cf)?, key, bytes)?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, cf: &str, key: impl AsRef<[u8]>) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn all_json<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let mut values = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }

    fn job_seq(key: &[u8]) -> Result<u64> {
        let raw = <[u8; 8]>::try_from(key)
            .map_err(|_| OrderError::internal("corrupt key in jobs column family"))?;
        Ok(u64::from_be_bytes(raw))
    }

    /// Highest sequence number still in the queue, 0 when empty.
    fn last_job_seq(&self) -> Result<u64> {
        match self.db.iterator_cf(self.cf(CF_JOBS)?, IteratorMode::End).next() {
            Some(item) => {
                let (key, _value) = item?;
                Self::job_seq(&key)
            }
            None => Ok(0),
        }
    }

    fn read_counter(&self, key: &[u8]) -> Result<u64> {
        match self.db.get_cf(self.cf(CF_META)?, key)? {
            Some(bytes) => {
                let raw = <[u8; 8]>::try_from(bytes.as_slice())
                    .map_err(|_| OrderError::internal("corrupt counter in meta column family"))?;
                Ok(u64::from_be_bytes(raw))
            }
            None => Ok(0),
        }
    }
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn next_id(&self) -> Result<OrderId> {
        let _counters = self.counters.lock().await;
        let next = self.read_counter(ORDER_SEQ_KEY)? + 1;
        self.db.put_cf(self.cf(CF_META)?, ORDER_SEQ_KEY, next.to_be_bytes())?;
        Ok(OrderId(next))
    }

    async fn store(&self, order: Order) -> Result<()> {
        self.put_json(CF_ORDERS, order.id.0.to_be_bytes(), &order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        self.get_json(CF_ORDERS, id.0.to_be_bytes())
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn store(&self, tx: Transaction) -> Result<()> {
        self.put_json(CF_TRANSACTIONS, tx.id.as_bytes(), &tx)
    }

    async fn get(&self, tx_id: &str) -> Result<Option<Transaction>> {
        self.get_json(CF_TRANSACTIONS, tx_id.as_bytes())
    }

    async fn delete(&self, tx_id: &str) -> Result<()> {
        self.db.delete_cf(self.cf(CF_TRANSACTIONS)?, tx_id.as_bytes())?;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Transaction>> {
        self.all_json(CF_TRANSACTIONS)
    }
}

#[async_trait]
impl FailureStore for RocksDBStore {
    async fn store(&self, failure: PaymentFailure) -> Result<()> {
        self.put_json(CF_FAILURES, failure.id.as_bytes(), &failure)
    }

    async fn get(&self, id: Uuid) -> Result<Option<PaymentFailure>> {
        self.get_json(CF_FAILURES, id.as_bytes())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.db.delete_cf(self.cf(CF_FAILURES)?, id.as_bytes())?;
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<PaymentFailure>> {
        self.all_json(CF_FAILURES)
    }
}

#[async_trait]
impl CacheStore for RocksDBStore {
    async fn get(&self, order_id: OrderId) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get_cf(self.cf(CF_CACHE)?, order_id.0.to_be_bytes())?)
    }

    async fn set(&self, order_id: OrderId, bytes: Vec<u8>) -> Result<()> {
        self.db.put_cf(self.cf(CF_CACHE)?, order_id.0.to_be_bytes(), bytes)?;
        Ok(())
    }
}

#[async_trait]
impl JobQueue for RocksDBStore {
    /// Appends after the highest queued sequence number. Numbers of
    /// acknowledged jobs may be handed out again once the tail is drained.
    async fn enqueue(&self, job: PaymentJob) -> Result<JobHandle> {
        let _counters = self.counters.lock().await;
        let seq = self.last_job_seq()? + 1;
        let bytes = serde_json::to_vec(&job)?;
        self.db
            .put_cf(self.cf(CF_JOBS)?, seq.to_be_bytes(), bytes)
            .map_err(|e| OrderError::QueueUnavailable(e.to_string()))?;
        Ok(JobHandle(seq))
    }

    async fn dequeue(&self) -> Result<Option<(JobHandle, PaymentJob)>> {
        let mut claimed = self.claimed.lock().await;
        for item in self.db.iterator_cf(self.cf(CF_JOBS)?, IteratorMode::Start) {
            let (key, value) = item?;
            let seq = Self::job_seq(&key)?;
            if claimed.contains(&seq) {
                continue;
            }
            let job: PaymentJob = serde_json::from_slice(&value)?;
            claimed.insert(seq);
            return Ok(Some((JobHandle(seq), job)));
        }
        Ok(None)
    }

    async fn ack(&self, handle: JobHandle) -> Result<()> {
        let mut claimed = self.claimed.lock().await;
        self.db.delete_cf(self.cf(CF_JOBS)?, handle.0.to_be_bytes())?;
        claimed.remove(&handle.0);
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        let mut count = 0;
        for item in self.db.iterator_cf(self.cf(CF_JOBS)?, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }
}

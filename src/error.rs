use crate::domain::order::OrderId;
use thiserror::Error;

/// Coarse classification of an [`OrderError`], used to decide how a failure
/// is surfaced to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any state mutation; not retried.
    Validation,
    NotFound,
    /// Rejected because of the order's current state; caller may retry later.
    Conflict,
    Infrastructure,
}

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Missing fields: {0}")]
    MissingFields(String),
    #[error("Malformed request: {0}")]
    InvalidJson(String),
    #[error("Invalid quantity {0}: must be at least 1")]
    InvalidQuantity(i64),
    #[error("Invalid fields: {0}")]
    InvalidFields(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(u64),
    #[error("Product {0} is out of inventory")]
    OutOfStock(u64),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Order {0} is being processed")]
    OrderPending(OrderId),
    #[error("Order {0} has already been paid")]
    AlreadyPaid(OrderId),
    #[error("Job queue unavailable: {0}")]
    QueueUnavailable(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::MissingFields(_)
            | OrderError::InvalidJson(_)
            | OrderError::InvalidQuantity(_)
            | OrderError::InvalidFields(_)
            | OrderError::OutOfStock(_) => ErrorKind::Validation,
            OrderError::ProductNotFound(_) | OrderError::OrderNotFound(_) => ErrorKind::NotFound,
            OrderError::OrderPending(_) | OrderError::AlreadyPaid(_) => ErrorKind::Conflict,
            _ => ErrorKind::Infrastructure,
        }
    }

    /// Stable machine-readable code, shared with the codes recorded on orders.
    pub fn code(&self) -> &'static str {
        match self {
            OrderError::MissingFields(_) => "missing-fields",
            OrderError::InvalidJson(_) => "json-not-valid",
            OrderError::InvalidQuantity(_) => "invalid-quantity",
            OrderError::InvalidFields(_) => "invalid-fields",
            OrderError::ProductNotFound(_) => "product-does-not-exist",
            OrderError::OutOfStock(_) => "out-of-inventory",
            OrderError::OrderNotFound(_) => "order-not-found",
            OrderError::OrderPending(_) => "order-pending",
            OrderError::AlreadyPaid(_) => "already-paid",
            OrderError::QueueUnavailable(_) => "queue-unavailable",
            _ => "internal-error",
        }
    }

    /// The request entity the error is reported against.
    pub fn scope(&self) -> &'static str {
        match self {
            OrderError::ProductNotFound(_)
            | OrderError::OutOfStock(_)
            | OrderError::InvalidQuantity(_) => "product",
            _ => "order",
        }
    }

    pub fn status(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 422,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::Infrastructure => match self {
                OrderError::QueueUnavailable(_) => 503,
                _ => 500,
            },
        }
    }

    #[cfg(feature = "storage-rocksdb")]
    pub(crate) fn internal(message: impl Into<String>) -> Self {
        OrderError::InternalError(Box::new(std::io::Error::other(message.into())))
    }
}

pub type Result<T, E = OrderError> = std::result::Result<T, E>;

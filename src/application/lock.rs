use crate::domain::order::{LockToken, Order, OrderId};
use crate::error::{OrderError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

/// Per-order guards serializing read-modify-write cycles on order rows.
///
/// The stores only offer plain get/put, so every ledger operation that
/// mutates an order holds its row guard from the read to the write. Guards are
/// created lazily and shared by every caller asking for the same order.
#[derive(Default)]
pub struct RowGuards {
    guards: Mutex<HashMap<OrderId, Arc<Mutex<()>>>>,
}

impl RowGuards {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, id: OrderId) -> OwnedMutexGuard<()> {
        let guard = {
            let mut guards = self.guards.lock().await;
            guards.entry(id).or_default().clone()
        };
        guard.lock_owned().await
    }
}

/// Rules for the payment lock carried by every order (`pending`).
///
/// Without a lease a lock taken by a job that never finishes stays taken
/// forever. With a lease, a lock older than the lease is treated as released
/// by the next payment submission. Each acquisition gets a fresh
/// [`LockToken`]; only the holder of the current token releases the lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentLock {
    lease: Option<Duration>,
}

impl PaymentLock {
    pub fn new(lease: Option<Duration>) -> Self {
        Self { lease }
    }

    /// Check-and-set on an order already held under its row guard.
    pub fn acquire(&self, order: &mut Order, now: DateTime<Utc>) -> Result<LockToken> {
        if order.pending {
            if !self.is_expired(order, now) {
                return Err(OrderError::OrderPending(order.id));
            }
            warn!(
                order_id = %order.id,
                pending_since = ?order.pending_since,
                "Reclaiming payment lock past its lease"
            );
        }
        if order.paid {
            return Err(OrderError::AlreadyPaid(order.id));
        }
        let token = LockToken::new();
        order.pending = true;
        order.pending_since = Some(now);
        order.lock_token = Some(token);
        Ok(token)
    }

    pub fn release(order: &mut Order) {
        order.pending = false;
        order.pending_since = None;
        order.lock_token = None;
    }

    /// Releases the lock if `token` still owns it. A missing token releases
    /// any lock. Returns whether the order changed.
    pub fn release_held(order: &mut Order, token: Option<LockToken>) -> bool {
        if !order.pending {
            return false;
        }
        if let Some(token) = token {
            if order.lock_token != Some(token) {
                warn!(
                    order_id = %order.id,
                    "Payment lock was reclaimed by a newer submission; leaving it held"
                );
                return false;
            }
        }
        Self::release(order);
        true
    }

    pub fn is_expired(&self, order: &Order, now: DateTime<Utc>) -> bool {
        let (Some(lease), Some(since)) = (self.lease, order.pending_since) else {
            return false;
        };
        TimeDelta::from_std(lease)
            .map(|lease| now.signed_duration_since(since) >= lease)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order::new(OrderId(1), vec![])
    }

    #[test]
    fn test_acquire_sets_flag_once() {
        let lock = PaymentLock::default();
        let mut order = order();
        let now = Utc::now();

        lock.acquire(&mut order, now).unwrap();
        assert!(order.pending);
        assert_eq!(order.pending_since, Some(now));

        assert!(matches!(
            lock.acquire(&mut order, now),
            Err(OrderError::OrderPending(OrderId(1)))
        ));
    }

    #[test]
    fn test_paid_order_cannot_be_locked() {
        let mut order = order();
        order.paid = true;
        assert!(matches!(
            PaymentLock::default().acquire(&mut order, Utc::now()),
            Err(OrderError::AlreadyPaid(_))
        ));
        assert!(!order.pending);
    }

    #[test]
    fn test_release_clears_flag() {
        let mut order = order();
        PaymentLock::default().acquire(&mut order, Utc::now()).unwrap();
        PaymentLock::release(&mut order);
        assert!(!order.pending);
        assert!(order.pending_since.is_none());
    }

    #[test]
    fn test_stale_token_does_not_release_reclaimed_lock() {
        let lock = PaymentLock::new(Some(Duration::from_secs(60)));
        let mut order = order();
        let stale = lock
            .acquire(&mut order, Utc::now() - TimeDelta::seconds(120))
            .unwrap();
        let current = lock.acquire(&mut order, Utc::now()).unwrap();
        assert_ne!(stale, current);

        assert!(!PaymentLock::release_held(&mut order, Some(stale)));
        assert!(order.pending);
        assert_eq!(order.lock_token, Some(current));

        assert!(PaymentLock::release_held(&mut order, Some(current)));
        assert!(!order.pending);
        assert!(order.lock_token.is_none());
    }

    #[test]
    fn test_release_without_token_clears_any_lock() {
        let mut order = order();
        PaymentLock::default().acquire(&mut order, Utc::now()).unwrap();
        assert!(PaymentLock::release_held(&mut order, None));
        assert!(!order.pending);
        assert!(!PaymentLock::release_held(&mut order, None));
    }

    #[test]
    fn test_no_lease_never_expires() {
        let lock = PaymentLock::default();
        let mut order = order();
        let taken = Utc::now() - TimeDelta::days(30);
        lock.acquire(&mut order, taken).unwrap();
        assert!(!lock.is_expired(&order, Utc::now()));
    }

    #[test]
    fn test_stale_lock_is_reclaimed_with_lease() {
        let lock = PaymentLock::new(Some(Duration::from_secs(60)));
        let mut order = order();
        let taken = Utc::now() - TimeDelta::seconds(120);
        lock.acquire(&mut order, taken).unwrap();

        let now = Utc::now();
        assert!(lock.is_expired(&order, now));
        lock.acquire(&mut order, now).unwrap();
        assert_eq!(order.pending_since, Some(now));
    }

    #[tokio::test]
    async fn test_row_guard_is_exclusive_per_order() {
        let guards = RowGuards::new();
        let held = guards.acquire(OrderId(1)).await;

        // A different order is not blocked.
        let _other = guards.acquire(OrderId(2)).await;

        let blocked =
            tokio::time::timeout(Duration::from_millis(20), guards.acquire(OrderId(1))).await;
        assert!(blocked.is_err());

        drop(held);
        let reacquired =
            tokio::time::timeout(Duration::from_millis(200), guards.acquire(OrderId(1))).await;
        assert!(reacquired.is_ok());
    }
}

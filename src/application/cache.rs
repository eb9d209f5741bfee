use crate::domain::order::OrderId;
use crate::domain::ports::CacheStoreBox;
use crate::domain::view::OrderView;
use crate::error::Result;
use tracing::{debug, warn};

/// Read-through cache of assembled order views.
///
/// Only terminal views are stored: once an order carries a successful
/// transaction its view no longer changes, so entries never need
/// invalidation.
pub struct OrderViewCache {
    store: CacheStoreBox,
}

impl OrderViewCache {
    pub fn new(store: CacheStoreBox) -> Self {
        Self { store }
    }

    pub async fn get(&self, id: OrderId) -> Result<Option<OrderView>> {
        let Some(bytes) = self.store.get(id).await? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(view) => {
                debug!(order_id = %id, "Order view served from cache");
                Ok(Some(view))
            }
            Err(e) => {
                // Treated as a miss; the next terminal assembly overwrites it.
                warn!(order_id = %id, error = %e, "Discarding unreadable cache entry");
                Ok(None)
            }
        }
    }

    /// Stores the view if it is terminal. Returns whether it was stored.
    pub async fn offer(&self, view: &OrderView) -> Result<bool> {
        if !view.is_terminal() {
            return Ok(false);
        }
        let bytes = serde_json::to_vec(view)?;
        self.store.set(view.id, bytes).await?;
        debug!(order_id = %view.id, "Order view cached");
        Ok(true)
    }
}

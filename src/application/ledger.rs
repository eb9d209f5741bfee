use crate::application::lock::{PaymentLock, RowGuards};
use crate::domain::money::Money;
use crate::domain::order::{CreditCard, LineItem, LockToken, Order, OrderId, OrderLine, ShippingInfo};
use crate::domain::payment::{GatewayTransaction, PaymentFailure, Transaction};
use crate::domain::ports::{FailureStoreBox, OrderStoreBox, ProductCatalogBox, TransactionStoreBox};
use crate::domain::shipping::shipping_price;
use crate::domain::view::{FailureView, OrderView, ProductLine, TransactionView};
use crate::error::{OrderError, Result};
use chrono::Utc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Amounts derived from an order's lines and the current catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderPricing {
    pub total_price: Money,
    pub total_weight: u64,
    pub shipping_price: Money,
}

impl OrderPricing {
    pub fn amount_due(&self) -> Money {
        self.total_price + self.shipping_price
    }
}

/// Owns every order and the transaction/failure rows hanging off them.
///
/// All mutations of an order happen under its row guard, so a
/// read-check-write sequence is atomic with respect to other ledger calls on
/// the same order. Each order references at most one live transaction: a new
/// outcome replaces the previous transaction and deletes it together with its
/// failure row.
pub struct OrderLedger {
    orders: OrderStoreBox,
    transactions: TransactionStoreBox,
    failures: FailureStoreBox,
    catalog: ProductCatalogBox,
    guards: RowGuards,
    lock: PaymentLock,
}

impl OrderLedger {
    pub fn new(
        orders: OrderStoreBox,
        transactions: TransactionStoreBox,
        failures: FailureStoreBox,
        catalog: ProductCatalogBox,
    ) -> Self {
        Self {
            orders,
            transactions,
            failures,
            catalog,
            guards: RowGuards::new(),
            lock: PaymentLock::default(),
        }
    }

    pub fn with_lock(mut self, lock: PaymentLock) -> Self {
        self.lock = lock;
        self
    }

    /// Creates an order from the requested lines.
    ///
    /// Each line is checked in turn: the product must exist, be in stock, and
    /// be ordered at least once. Nothing is written unless every line passes.
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn create_order(&self, items: &[LineItem]) -> Result<Order> {
        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let product = self
                .catalog
                .lookup(item.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(item.product_id))?;
            if !product.in_stock {
                return Err(OrderError::OutOfStock(item.product_id));
            }
            lines.push(OrderLine::try_from_item(*item)?);
        }

        let id = self.orders.next_id().await?;
        let order = Order::new(id, lines);
        self.orders.store(order.clone()).await?;
        info!(order_id = %id, "Order created");
        Ok(order)
    }

    pub async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.orders
            .get(id)
            .await?
            .ok_or(OrderError::OrderNotFound(id))
    }

    /// Creates or replaces the order's shipping information and email.
    ///
    /// Not excluded by the payment lock: a job in flight has already read the
    /// customer info it needs. A paid order is frozen.
    #[instrument(skip(self, info, email), fields(order_id = %id))]
    pub async fn set_shipping_info(&self, id: OrderId, info: ShippingInfo, email: String) -> Result<Order> {
        info.validate()?;

        let _guard = self.guards.acquire(id).await;
        let mut order = self.get_order(id).await?;
        if order.paid {
            return Err(OrderError::AlreadyPaid(id));
        }
        order.shipping_info = Some(info);
        order.email = Some(email);
        self.orders.store(order.clone()).await?;
        debug!("Shipping information updated");
        Ok(order)
    }

    /// Takes the order's payment lock and returns its token.
    ///
    /// Fails with `OrderPending` while another payment is queued or running
    /// and with `AlreadyPaid` once the order is settled.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn begin_payment(&self, id: OrderId) -> Result<LockToken> {
        let _guard = self.guards.acquire(id).await;
        let mut order = self.get_order(id).await?;
        let token = self.lock.acquire(&mut order, Utc::now())?;
        self.orders.store(order).await?;
        debug!("Payment lock taken");
        Ok(token)
    }

    /// Drops the payment lock without recording an outcome, provided `lock`
    /// still owns it.
    #[instrument(skip(self, lock), fields(order_id = %id))]
    pub async fn release_payment(&self, id: OrderId, lock: Option<LockToken>) -> Result<()> {
        let _guard = self.guards.acquire(id).await;
        let mut order = self.get_order(id).await?;
        if PaymentLock::release_held(&mut order, lock) {
            self.orders.store(order).await?;
            debug!("Payment lock released");
        }
        Ok(())
    }

    /// Settles the order: attaches the approved transaction and the stored
    /// card, marks it paid and releases the lock if `lock` still owns it.
    #[instrument(skip(self, approved, card, lock), fields(order_id = %id, transaction_id = %approved.id))]
    pub async fn record_success(
        &self,
        id: OrderId,
        approved: GatewayTransaction,
        card: CreditCard,
        lock: Option<LockToken>,
    ) -> Result<()> {
        let _guard = self.guards.acquire(id).await;
        let mut order = self.get_order(id).await?;

        let transaction = Transaction {
            id: approved.id,
            success: true,
            amount_charged: approved.amount_charged,
            error: None,
        };
        let previous = order.transaction.replace(transaction.id.clone());
        self.transactions.store(transaction).await?;

        order.credit_card = Some(card);
        order.paid = true;
        PaymentLock::release_held(&mut order, lock);
        self.orders.store(order).await?;

        // New rows are written and referenced before old ones are removed, so
        // an interrupted update can only leave orphans behind, never a
        // dangling reference.
        if let Some(previous) = previous {
            self.discard_transaction(&previous).await?;
        }
        info!("Payment recorded");
        Ok(())
    }

    /// Records a failed attempt and releases the lock if `lock` still owns
    /// it.
    ///
    /// The new failed transaction replaces whatever the order referenced
    /// before. A paid order keeps its successful transaction; only the lock
    /// is released.
    #[instrument(skip(self, name, amount, lock), fields(order_id = %id))]
    pub async fn record_failure(
        &self,
        id: OrderId,
        code: &str,
        name: &str,
        amount: Money,
        lock: Option<LockToken>,
    ) -> Result<()> {
        let _guard = self.guards.acquire(id).await;
        let mut order = self.get_order(id).await?;

        if order.paid {
            warn!(code, "Ignoring failure for an order that is already paid");
            if PaymentLock::release_held(&mut order, lock) {
                self.orders.store(order).await?;
            }
            return Ok(());
        }

        let failure = PaymentFailure::new(code, name);
        let transaction = Transaction {
            id: Uuid::new_v4().to_string(),
            success: false,
            amount_charged: amount,
            error: Some(failure.id),
        };
        let previous = order.transaction.replace(transaction.id.clone());
        self.failures.store(failure).await?;
        self.transactions.store(transaction).await?;

        PaymentLock::release_held(&mut order, lock);
        self.orders.store(order).await?;

        if let Some(previous) = previous {
            self.discard_transaction(&previous).await?;
        }
        info!(code, "Payment failure recorded");
        Ok(())
    }

    async fn discard_transaction(&self, tx_id: &str) -> Result<()> {
        if let Some(old) = self.transactions.get(tx_id).await? {
            if let Some(failure_id) = old.error {
                self.failures.delete(failure_id).await?;
            }
            self.transactions.delete(tx_id).await?;
        }
        Ok(())
    }

    pub async fn price(&self, order: &Order) -> Result<OrderPricing> {
        let mut total_price = Money::ZERO;
        let mut total_weight = 0u64;
        for line in &order.lines {
            let product = self
                .catalog
                .lookup(line.product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(line.product_id))?;
            total_price += product.price * line.quantity;
            total_weight += product.weight * u64::from(line.quantity);
        }
        Ok(OrderPricing {
            total_price,
            total_weight,
            shipping_price: shipping_price(total_weight),
        })
    }

    /// Builds the client-facing view of an order from the ledger.
    pub async fn assemble_view(&self, id: OrderId) -> Result<OrderView> {
        let order = self.get_order(id).await?;
        let pricing = self.price(&order).await?;

        let transaction = match &order.transaction {
            Some(tx_id) => match self.transactions.get(tx_id).await? {
                Some(tx) => {
                    let error = match tx.error {
                        Some(failure_id) => self.failures.get(failure_id).await?.map(|f| FailureView {
                            code: f.code,
                            name: f.name,
                        }),
                        None => None,
                    };
                    Some(TransactionView {
                        id: tx.id,
                        success: tx.success,
                        amount_charged: tx.amount_charged,
                        error,
                    })
                }
                None => {
                    warn!(order_id = %id, transaction_id = %tx_id, "Order references a missing transaction");
                    None
                }
            },
            None => None,
        };

        Ok(OrderView {
            id: order.id,
            email: order.email,
            paid: order.paid,
            products: order
                .lines
                .iter()
                .map(|line| ProductLine {
                    id: line.product_id,
                    quantity: line.quantity,
                })
                .collect(),
            total_price: pricing.total_price,
            shipping_price: pricing.shipping_price,
            shipping_info: order.shipping_info,
            credit_card: order.credit_card,
            transaction,
        })
    }
}

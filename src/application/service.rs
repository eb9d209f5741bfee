use crate::application::cache::OrderViewCache;
use crate::application::executor::PaymentJobExecutor;
use crate::application::gateway::{DEFAULT_TIMEOUT, GatewayClient};
use crate::application::ledger::OrderLedger;
use crate::application::lock::PaymentLock;
use crate::application::workflow::OrderWorkflow;
use crate::domain::ports::{JobQueueRef, PaymentGatewayBox, ProductCatalogBox, Storage};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    pub gateway_timeout: Duration,
    pub lock_lease: Option<Duration>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            gateway_timeout: DEFAULT_TIMEOUT,
            lock_lease: None,
        }
    }
}

/// The wired application: one ledger shared by the client-facing workflow
/// and the payment job executor.
pub struct OrderService {
    pub workflow: OrderWorkflow,
    pub executor: Arc<PaymentJobExecutor>,
    pub ledger: Arc<OrderLedger>,
    pub queue: JobQueueRef,
}

impl OrderService {
    pub fn build(
        storage: Storage,
        catalog: ProductCatalogBox,
        gateway: PaymentGatewayBox,
        options: ServiceOptions,
    ) -> Self {
        let Storage {
            orders,
            transactions,
            failures,
            cache,
            queue,
        } = storage;

        let ledger = Arc::new(
            OrderLedger::new(orders, transactions, failures, catalog)
                .with_lock(PaymentLock::new(options.lock_lease)),
        );
        let gateway = GatewayClient::new(gateway).with_timeout(options.gateway_timeout);
        let executor = Arc::new(PaymentJobExecutor::new(ledger.clone(), gateway, queue.clone()));
        let workflow = OrderWorkflow::new(ledger.clone(), OrderViewCache::new(cache), queue.clone());

        Self {
            workflow,
            executor,
            ledger,
            queue,
        }
    }
}

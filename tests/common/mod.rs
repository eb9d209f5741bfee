#![allow(dead_code)]

use orderflow::application::service::{OrderService, ServiceOptions};
use orderflow::domain::card::CardPayload;
use orderflow::domain::money::Money;
use orderflow::domain::order::{LineItem, ShippingInfo};
use orderflow::domain::ports::Storage;
use orderflow::domain::product::Product;
use orderflow::infrastructure::in_memory::{
    InMemoryCache, InMemoryCatalog, InMemoryFailureStore, InMemoryJobQueue, InMemoryOrderStore,
    InMemoryTransactionStore,
};
use orderflow::infrastructure::sandbox::SandboxGateway;
use rust_decimal_macros::dec;
use std::sync::Arc;

pub const APPROVED: &str = "4242 4242 4242 4242";
pub const DECLINED: &str = "4000 0000 0000 0002";
pub const UNKNOWN: &str = "1234 5678 9012 3456";

/// A wired service plus handles on the stores it writes to.
pub struct Harness {
    pub service: OrderService,
    pub transactions: InMemoryTransactionStore,
    pub failures: InMemoryFailureStore,
    pub cache: InMemoryCache,
}

pub fn product(id: u64, price: Money, weight: u64, in_stock: bool) -> Product {
    Product {
        id,
        name: format!("Product {}", id),
        r#type: "grocery".into(),
        description: String::new(),
        image: format!("{}.jpg", id),
        height: 100,
        weight,
        price,
        in_stock,
    }
}

/// 1: 20.00, 100 g. 2: 9.99, 1500 g. 3: out of stock.
pub fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::from_products(vec![
        product(1, Money::from_units(20), 100, true),
        product(2, Money::new(dec!(9.99)), 1500, true),
        product(3, Money::from_units(5), 10, false),
    ])
}

pub fn harness() -> Harness {
    harness_with(ServiceOptions::default())
}

pub fn harness_with(options: ServiceOptions) -> Harness {
    let transactions = InMemoryTransactionStore::new();
    let failures = InMemoryFailureStore::new();
    let cache = InMemoryCache::new();
    let storage = Storage {
        orders: Box::new(InMemoryOrderStore::new()),
        transactions: Box::new(transactions.clone()),
        failures: Box::new(failures.clone()),
        cache: Box::new(cache.clone()),
        queue: Arc::new(InMemoryJobQueue::new()),
    };
    let service = OrderService::build(
        storage,
        Box::new(catalog()),
        Box::new(SandboxGateway::new()),
        options,
    );
    Harness {
        service,
        transactions,
        failures,
        cache,
    }
}

pub fn line(product_id: u64, quantity: i64) -> LineItem {
    LineItem { product_id, quantity }
}

pub fn shipping() -> ShippingInfo {
    ShippingInfo {
        country: "Canada".into(),
        address: "201, rue Président-Kennedy".into(),
        postal_code: "G7X 3Y7".into(),
        city: "Chicoutimi".into(),
        province: "QC".into(),
    }
}

pub fn card(number: &str) -> CardPayload {
    CardPayload {
        name: Some("John Doe".into()),
        number: Some(number.into()),
        expiration_month: Some(9),
        expiration_year: Some(2030),
        cvv: Some("123".into()),
    }
}

//! Application layer orchestrating the order workflow.
//!
//! The [`ledger::OrderLedger`] owns all order state; the
//! [`workflow::OrderWorkflow`] serves clients and queues payment jobs, which
//! the [`executor::PaymentJobExecutor`] runs on a [`worker::WorkerPool`].

pub mod cache;
pub mod executor;
pub mod gateway;
pub mod ledger;
pub mod lock;
pub mod service;
pub mod worker;
pub mod workflow;

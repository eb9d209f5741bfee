use crate::application::service::OrderService;
use crate::application::worker::WorkerPool;
use crate::domain::order::OrderId;
use crate::error::{OrderError, Result};
use crate::interfaces::json::requests::{UpdateOrderRequest, parse_create_order, parse_update_order};
use crate::interfaces::json::response::Reply;
use serde::Deserialize;
use serde_json::{Value, json};
use std::io::BufRead;
use tracing::debug;

/// One request of a script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    CreateOrder { body: Value },
    GetOrder { id: u64 },
    UpdateOrder { id: u64, body: Value },
    /// Runs every queued payment job before the next command.
    ProcessPayments,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateOrder { .. } => "create_order",
            Command::GetOrder { .. } => "get_order",
            Command::UpdateOrder { .. } => "update_order",
            Command::ProcessPayments => "process_payments",
        }
    }
}

/// Reads commands from a JSON-lines source. Blank lines are skipped.
pub struct ScriptReader<R: BufRead> {
    source: R,
}

impl<R: BufRead> ScriptReader<R> {
    pub fn new(source: R) -> Self {
        Self { source }
    }

    /// Lazily parses one command per line.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.source.lines().filter_map(|line| match line {
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => Some(
                serde_json::from_str(&line).map_err(|e| OrderError::InvalidJson(e.to_string())),
            ),
            Err(e) => Some(Err(OrderError::from(e))),
        })
    }
}

/// Dispatches script commands to the order service.
pub struct ScriptRunner {
    service: OrderService,
    workers: usize,
}

impl ScriptRunner {
    pub fn new(service: OrderService, workers: usize) -> Self {
        Self { service, workers }
    }

    pub fn service(&self) -> &OrderService {
        &self.service
    }

    pub async fn handle(&self, command: Command) -> Reply {
        // Bodies may carry card data; log the operation only.
        debug!(op = command.name(), "Handling command");
        match command {
            Command::CreateOrder { body } => self.create_order(&body).await,
            Command::GetOrder { id } => match self.service.workflow.get_order(OrderId(id)).await {
                Ok(view) => Reply::order(&view),
                Err(e) => Reply::error(&e),
            },
            Command::UpdateOrder { id, body } => self.update_order(OrderId(id), &body).await,
            Command::ProcessPayments => {
                let stats = WorkerPool::drain(self.service.executor.clone(), self.workers).await;
                Reply::ok(json!({
                    "executed": stats.executed(),
                    "paid": stats.paid,
                    "failed": stats.failed,
                }))
            }
        }
    }

    async fn create_order(&self, body: &Value) -> Reply {
        let items = match parse_create_order(body) {
            Ok(items) => items,
            Err(e) => return Reply::error(&e),
        };
        match self.service.workflow.create_order(&items).await {
            Ok(id) => Reply::created(id),
            Err(e) => Reply::error(&e),
        }
    }

    async fn update_order(&self, id: OrderId, body: &Value) -> Reply {
        let request = match parse_update_order(body) {
            Ok(request) => request,
            Err(e @ OrderError::InvalidJson(_)) if body.get("credit_card").is_some() => {
                return Reply::scoped_error("credit_card", &e);
            }
            Err(e) => return Reply::error(&e),
        };
        match request {
            UpdateOrderRequest::Shipping { email, info } => {
                match self.service.workflow.update_shipping(id, info, email).await {
                    Ok(view) => Reply::order(&view),
                    Err(e) => Reply::error(&e),
                }
            }
            UpdateOrderRequest::Card(card) => match self.service.workflow.submit_card(id, card).await {
                Ok(_) => Reply::accepted(),
                Err(e) => Reply::error(&e),
            },
        }
    }

    /// Handles every command of `reader`, passing each reply to `sink` in
    /// order. Unreadable lines produce an error reply and do not stop the
    /// script.
    pub async fn run<R, F>(&self, reader: ScriptReader<R>, mut sink: F) -> Result<usize>
    where
        R: BufRead,
        F: FnMut(&Reply) -> Result<()>,
    {
        let mut handled = 0;
        for command in reader.commands() {
            let reply = match command {
                Ok(command) => self.handle(command).await,
                Err(e) => Reply::error(&e),
            };
            sink(&reply)?;
            handled += 1;
        }
        Ok(handled)
    }
}

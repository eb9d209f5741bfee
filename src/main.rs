use clap::Parser;
use miette::{IntoDiagnostic, Result};
use orderflow::application::service::OrderService;
use orderflow::application::worker::WorkerPool;
use orderflow::config::{Cli, Command, Settings};
use orderflow::domain::ports::{PaymentGatewayBox, ProductCatalogBox, Storage};
use orderflow::infrastructure::http_gateway::HttpPaymentGateway;
use orderflow::infrastructure::in_memory::{self, InMemoryCatalog};
use orderflow::infrastructure::sandbox::SandboxGateway;
use orderflow::interfaces::json::catalog_reader::CatalogReader;
use orderflow::interfaces::json::script::{ScriptReader, ScriptRunner};
use serde_json::json;
use std::fs::File;
use std::io::{self, BufReader, IsTerminal, Write};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries replies only.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    let settings = cli.settings;

    let storage = open_storage(&settings)?;
    let catalog = load_catalog(&settings)?;
    let gateway: PaymentGatewayBox = match &settings.gateway_url {
        Some(url) => {
            info!(url = %url, "Using remote payment gateway");
            Box::new(HttpPaymentGateway::new(
                url.clone(),
                Duration::from_millis(settings.gateway_timeout_ms),
            ))
        }
        None => {
            info!("Using offline sandbox payment gateway");
            Box::new(SandboxGateway::new())
        }
    };
    let service = OrderService::build(storage, catalog, gateway, settings.service_options());

    match cli.command {
        Command::Run { script } => {
            let file = File::open(script).into_diagnostic()?;
            let runner = ScriptRunner::new(service, settings.workers);
            let stdout = io::stdout();
            let mut out = stdout.lock();
            let handled = runner
                .run(ScriptReader::new(BufReader::new(file)), |reply| {
                    serde_json::to_writer(&mut out, reply)?;
                    writeln!(out)?;
                    Ok(())
                })
                .await
                .into_diagnostic()?;
            info!(handled, "Script finished");
        }
        Command::Work { follow } => {
            let pending = service.queue.len().await.into_diagnostic()?;
            info!(pending, workers = settings.workers, "Starting payment workers");
            let stats = if follow {
                let pool = WorkerPool::spawn(
                    service.executor.clone(),
                    settings.workers,
                    settings.poll_interval(),
                );
                tokio::signal::ctrl_c().await.into_diagnostic()?;
                info!("Shutting down payment workers");
                pool.stop().await
            } else {
                WorkerPool::drain(service.executor.clone(), settings.workers).await
            };
            let summary = json!({
                "executed": stats.executed(),
                "paid": stats.paid,
                "failed": stats.failed,
            });
            println!("{}", summary);
        }
    }

    Ok(())
}

#[cfg(feature = "storage-rocksdb")]
fn open_storage(settings: &Settings) -> Result<Storage> {
    use orderflow::infrastructure::rocksdb::RocksDBStore;

    match &settings.db_path {
        Some(db_path) => {
            let store = RocksDBStore::open(db_path).into_diagnostic()?;
            info!(path = %db_path.display(), "Using RocksDB storage");
            Ok(store.storage())
        }
        None => Ok(in_memory::storage()),
    }
}

#[cfg(not(feature = "storage-rocksdb"))]
fn open_storage(settings: &Settings) -> Result<Storage> {
    if let Some(db_path) = &settings.db_path {
        warn!(
            path = %db_path.display(),
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
    }
    Ok(in_memory::storage())
}

fn load_catalog(settings: &Settings) -> Result<ProductCatalogBox> {
    let Some(path) = &settings.catalog else {
        warn!("No product catalog given; every product lookup will fail");
        return Ok(Box::new(InMemoryCatalog::default()));
    };
    let file = File::open(path).into_diagnostic()?;
    let products = CatalogReader::new(BufReader::new(file)).products().into_diagnostic()?;
    let catalog = InMemoryCatalog::from_products(products);
    info!(products = catalog.len(), "Catalog loaded");
    Ok(Box::new(catalog))
}

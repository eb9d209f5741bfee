use crate::application::service::ServiceOptions;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Order intake and asynchronous card payment", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a JSON-lines request script and print one reply per line
    Run {
        /// Script file, one JSON request per line
        script: PathBuf,
    },
    /// Execute queued payment jobs
    Work {
        /// Keep polling for new jobs until interrupted instead of exiting
        /// once the queue is empty
        #[arg(long)]
        follow: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true, env = "ORDERFLOW_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Product catalog JSON document
    #[arg(long, global = true, env = "ORDERFLOW_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Payment service endpoint. Without it the offline sandbox is used.
    #[arg(long, global = true, env = "ORDERFLOW_GATEWAY_URL")]
    pub gateway_url: Option<String>,

    #[arg(long, global = true, default_value_t = 10_000)]
    pub gateway_timeout_ms: u64,

    /// Payment workers
    #[arg(long, global = true, default_value_t = 4)]
    pub workers: usize,

    #[arg(long, global = true, default_value_t = 50)]
    pub poll_interval_ms: u64,

    /// Age after which a payment lock is considered abandoned. No lease by
    /// default.
    #[arg(long, global = true)]
    pub lock_lease_secs: Option<u64>,
}

impl Settings {
    pub fn service_options(&self) -> ServiceOptions {
        ServiceOptions {
            gateway_timeout: Duration::from_millis(self.gateway_timeout_ms),
            lock_lease: self.lock_lease_secs.map(Duration::from_secs),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

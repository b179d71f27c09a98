//! Door-lock node binary.
//!
//! Emulates the serial link over TCP. Run the custody node first, then point
//! the front node at it.
//!
//! # Usage
//!
//! ```bash
//! # Custody node: motor, alarm and credential store
//! doorlock custody --listen 127.0.0.1:7070 --store eeprom.bin
//!
//! # Front node: type digits, `+`, `-`, then Enter (or `#`)
//! doorlock front --connect 127.0.0.1:7070
//!
//! # Either node with a config file
//! doorlock --config doorlock.json custody
//! ```

use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use doorlock_core::{CustodyNode, FrontNode, LockConfig, MemoryStore};
use doorlock_node::{
    ByteLink, CustodyRuntime, FileStore, FrontRuntime, IntervalTicker, load_config,
    console::{LogActuator, LogDisplay, stdin_keypad},
};
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Two-node door lock
#[derive(Parser, Debug)]
#[command(name = "doorlock")]
#[command(about = "Two-node door lock over an emulated serial link")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// JSON config file; omitted fields keep their defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tick period in milliseconds, overriding the config file
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: Option<u64>,

    #[command(subcommand)]
    role: Role,
}

#[derive(Subcommand, Debug)]
enum Role {
    /// Run the custody node (motor, alarm, credential store)
    Custody {
        /// Address to accept the front node on
        #[arg(short, long, default_value = "127.0.0.1:7070")]
        listen: String,

        /// Store image file; omit for a volatile in-memory store
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Store size in bytes
        #[arg(long, default_value = "1024")]
        store_size: usize,
    },

    /// Run the front node (keypad on stdin, display in the log)
    Front {
        /// Custody node address
        #[arg(short, long, default_value = "127.0.0.1:7070")]
        connect: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    let mut config = match &args.config {
        Some(path) => {
            let config = load_config(path)?;
            tracing::info!(path = %path.display(), "config loaded");
            config
        },
        None => LockConfig::default(),
    };
    if let Some(tick_ms) = args.tick_ms {
        config.tick_interval = Duration::from_millis(tick_ms);
    }
    let ticker = IntervalTicker::new(config.tick_interval);

    match args.role {
        Role::Custody { listen, store, store_size } => {
            let listener = TcpListener::bind(&listen).await?;
            tracing::info!("waiting for front node on {}", listener.local_addr()?);
            let (stream, peer) = listener.accept().await?;
            stream.set_nodelay(true)?;
            tracing::info!("front node connected from {peer}");

            let link = ByteLink::new(stream);
            let node = CustodyNode::new(config);
            match store {
                Some(path) => {
                    let store = FileStore::open(&path, store_size)?;
                    tracing::info!(path = %store.path().display(), "credential store opened");
                    CustodyRuntime::new(node, link, LogActuator, ticker, store).run().await?;
                },
                None => {
                    tracing::warn!("no store image given, credential will not survive a restart");
                    let store = MemoryStore::new(store_size);
                    CustodyRuntime::new(node, link, LogActuator, ticker, store).run().await?;
                },
            }
        },
        Role::Front { connect } => {
            let stream = TcpStream::connect(&connect).await?;
            stream.set_nodelay(true)?;
            tracing::info!("connected to custody node at {connect}");

            let runtime = FrontRuntime::new(
                FrontNode::new(config),
                ByteLink::new(stream),
                stdin_keypad(),
                LogDisplay::default(),
                ticker,
            );
            runtime.run().await?;
        },
    }

    Ok(())
}

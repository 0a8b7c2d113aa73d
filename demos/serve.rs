//! Serving the extension over WebSocket.
//!
//! Demonstrates:
//! - Loading a `Config` from JSON or building one in code
//! - Waiting for the extension's READY handshake
//! - Routing host events until the extension disconnects
//!
//! Usage:
//!   cargo run --example serve -- --port 8765
//!   cargo run --example serve -- --config tabkit.json --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use anyhow::Context;
use common::Args;
use webext_tabkit::{Config, dispatch};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run(args).await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    println!("=== Serve ===\n");

    let mut config = match args.config {
        Some(ref path) => Config::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::new(),
    };
    if let Some(port) = args.port {
        config = config.with_port(port);
    }

    println!("[1] Apps: {:?}", config.apps);
    println!("[2] Listening on {}", config.socket_addr());
    println!("    Point the extension at ws://{}\n", config.socket_addr());

    dispatch::serve(config).await.context("serving extension")?;

    println!("\n=== Extension disconnected ===");
    Ok(())
}

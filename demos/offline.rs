//! Running selections and grouping against an in-memory browser.
//!
//! Demonstrates:
//! - Building a `MemoryHost` with an opener tree
//! - Dispatching commands without a live extension
//! - Inspecting highlights and groups afterwards
//!
//! Usage:
//!   cargo run --example offline
//!   cargo run --example offline -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use anyhow::Context;
use common::Args;
use webext_tabkit::{App, Config, Dispatcher, HostEvent, MemoryHost, Tab, TabId, WindowId};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

fn tab(id: u32, opener: Option<u32>, url: &str) -> anyhow::Result<Tab> {
    let tab_id = TabId::new(id).context("tab ids start at 1")?;
    let mut tab = Tab::new(tab_id, WindowId::new(1))
        .with_index(id - 1)
        .with_url(url);
    if let Some(opener) = opener.and_then(TabId::new) {
        tab = tab.with_opener(opener);
    }
    Ok(tab)
}

async fn run() -> anyhow::Result<()> {
    println!("=== Offline ===\n");

    let host = MemoryHost::new(WindowId::new(1)).with_tabs([
        tab(1, None, "https://www.rust-lang.org/")?.with_active(),
        tab(2, Some(1), "https://doc.rust-lang.org/book/")?,
        tab(3, Some(1), "https://crates.io/")?,
        tab(4, Some(2), "https://doc.rust-lang.org/std/")?,
        tab(5, None, "https://www.rust-lang.org/learn")?,
    ]);

    let config = Config::new()
        .with_extension_name("Tab Kit")
        .with_apps([App::SelectTabs, App::GroupSites]);
    let dispatcher = Dispatcher::new(Arc::new(host.clone()), config);

    // ========================================================================
    // Selection
    // ========================================================================

    println!("[1] Selecting descendants of the active tab...");
    dispatcher
        .handle(HostEvent::Command("Descendants".to_string()))
        .await?;
    for (window, indices) in host.highlights() {
        println!("    Window {window}: highlighted indices {indices:?}");
    }

    // ========================================================================
    // Grouping
    // ========================================================================

    println!("\n[2] Grouping every site...");
    dispatcher
        .handle(HostEvent::Command("group-all".to_string()))
        .await?;
    for (group, update) in host.group_updates() {
        println!("    Group {group}: {} (collapsed: {})", update.title, update.collapsed);
    }

    println!("\n=== Done ===");
    Ok(())
}

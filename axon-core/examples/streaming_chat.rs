//! Stream a chat response fragment by fragment.
//!
//! The consumer owns the receiving half of the channel and decides how much
//! to buffer; dropping it cancels generation.
//!
//! Usage:
//!   cargo run --example streaming_chat -- "Tell me a short story"

use axon_core::{ChatManager, Config, Session};
use axon_plugin::{Permission, PluginRegistry};
use std::io::Write;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Tell me a short story.".to_string());

    let config = Config::load_or_default();
    let manager = ChatManager::new(config, PluginRegistry::new(Permission::READ_ONLY)).await?;

    let mut session = Session::new();
    let (tx, mut rx) = mpsc::channel(8);

    let (response, _) = tokio::join!(manager.stream(&mut session, &prompt, tx), async {
        while let Some(fragment) = rx.recv().await {
            print!("{fragment}");
            let _ = std::io::stdout().flush();
        }
    });

    response?;
    println!();
    Ok(())
}

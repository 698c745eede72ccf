//! Index a PDF and ask a question about it.
//!
//! Uses the engine selected by `config.yaml` (keyword by default).
//!
//! Usage:
//!   cargo run --example rag_chat -- path/to/document.pdf "What is this about?"

use axon_core::{ChatManager, Config, Session};
use axon_plugin::{Permission, PluginRegistry};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let pdf_path = args.next().unwrap_or_else(|| "document.pdf".to_string());
    let question = args
        .next()
        .unwrap_or_else(|| "Summarize this document.".to_string());

    let config = Config::load_or_default();
    let registry = PluginRegistry::new(Permission::READ_ONLY);
    let manager = ChatManager::new(config, registry).await?;

    let outcome = manager.index_document(Path::new(&pdf_path)).await?;
    println!(
        "Indexed {} ({} pages, {} chunks)",
        outcome.file_name, outcome.page_count, outcome.num_chunks
    );

    let mut session = Session::new();
    let answer = manager.execute(&mut session, &question).await?;
    println!("\n{}", answer);

    Ok(())
}

//! Backend availability detection.
//!
//! Optional capabilities (the Ollama daemon that backs generation and
//! embeddings) are probed once at start-up. The result is an explicit value
//! consumed by the retrieval-engine factory, so a missing dependency surfaces
//! at construction time with a message naming the capability instead of
//! failing somewhere deep inside a call site.

use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Ollama is not installed or not in PATH")]
    NotInstalled,

    #[error("Ollama is installed but not running")]
    NotRunning,

    #[error("Failed to check Ollama status: {0}")]
    CheckFailed(String),
}

pub type Result<T> = std::result::Result<T, DetectionError>;

/// Capabilities available to this process, probed once at start-up.
///
/// The retrieval-engine factory refuses to construct the vector engine when
/// `ollama` is false, since embeddings cannot be generated without it. The
/// keyword engine has no entry here: it is always available.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub ollama: bool,
}

impl Capabilities {
    /// Probes every optional dependency. Never fails: a missing dependency is
    /// recorded as an unavailable capability.
    pub fn probe() -> Self {
        Self {
            ollama: check_ollama_silent().is_ok(),
        }
    }

    /// Capabilities with everything available. Useful for tests and for hosts
    /// that manage their own backends.
    pub fn assume_all() -> Self {
        Self { ollama: true }
    }
}

/// Checks if Ollama is available and prints guidance if not.
///
/// # Example
///
/// ```no_run
/// use axon_core::detection;
///
/// match detection::detect_ollama() {
///     Ok(_) => println!("Ready to go!"),
///     Err(e) => eprintln!("Setup required: {}", e),
/// }
/// ```
pub fn detect_ollama() -> Result<OllamaInfo> {
    if !is_ollama_installed() {
        print_installation_help();
        return Err(DetectionError::NotInstalled);
    }

    match is_ollama_running() {
        Ok(true) => Ok(OllamaInfo {
            installed: true,
            running: true,
        }),
        Ok(false) => {
            print_startup_help();
            Err(DetectionError::NotRunning)
        }
        Err(e) => {
            eprintln!("Could not verify Ollama status: {}", e);
            Err(DetectionError::CheckFailed(e))
        }
    }
}

/// Quietly checks if Ollama is available without printing help messages.
pub fn check_ollama_silent() -> Result<OllamaInfo> {
    if !is_ollama_installed() {
        return Err(DetectionError::NotInstalled);
    }

    match is_ollama_running() {
        Ok(true) => Ok(OllamaInfo {
            installed: true,
            running: true,
        }),
        Ok(false) => Err(DetectionError::NotRunning),
        Err(e) => Err(DetectionError::CheckFailed(e)),
    }
}

/// Information about Ollama availability.
#[derive(Debug, Clone)]
pub struct OllamaInfo {
    pub installed: bool,
    pub running: bool,
}

fn is_ollama_installed() -> bool {
    Command::new("which")
        .arg("ollama")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn is_ollama_running() -> std::result::Result<bool, String> {
    let output = Command::new("ollama")
        .arg("list")
        .output()
        .map_err(|e| e.to_string())?;

    Ok(output.status.success())
}

fn print_installation_help() {
    eprintln!("Ollama not found!");
    eprintln!();
    eprintln!("  The vector retrieval engine and chat generation require Ollama.");
    eprintln!();
    eprintln!("  Install Ollama:");

    #[cfg(target_os = "macos")]
    {
        eprintln!("   • macOS:  curl -fsSL https://ollama.ai/install.sh | sh");
        eprintln!("   • Or:     brew install ollama");
    }

    #[cfg(target_os = "linux")]
    {
        eprintln!("   • Linux:  curl -fsSL https://ollama.ai/install.sh | sh");
    }

    #[cfg(target_os = "windows")]
    {
        eprintln!("   • Windows: Download from https://ollama.ai/download");
    }

    eprintln!();
    eprintln!("  After installation, pull the models:");
    eprintln!("   ollama pull mistral");
    eprintln!("   ollama pull nomic-embed-text    (for the vector engine)");
}

fn print_startup_help() {
    eprintln!("Ollama is installed but not running!");
    eprintln!();
    eprintln!("  Start Ollama:");

    #[cfg(target_os = "macos")]
    {
        eprintln!("   • Run the Ollama app from Applications");
        eprintln!("   • Or:  ollama serve  (in a separate terminal)");
    }

    #[cfg(not(target_os = "macos"))]
    {
        eprintln!("   ollama serve");
    }

    eprintln!();
    eprintln!("  Verify it's running:");
    eprintln!("   ollama list");
}

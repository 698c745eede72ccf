//! axon - Privacy-first, local-first retrieval-augmented agent engine
//!
//! This is the convenience wrapper crate that re-exports axon components
//! with optional feature flags for easy usage.
//!
//! # Quick Start
//!
//! ```toml
//! [dependencies]
//! axon = "0.1"  # Includes core + std plugins by default
//! ```
//!
//! # Features
//!
//! - `std` (default): Include standard library plugins

// Re-export core
pub use axon_core::*;
pub use axon_plugin;

// Re-export std plugins if feature is enabled
#[cfg(feature = "std")]
pub use axon_std;

//! # EmberKV
//!
//! An in-memory key-value server with:
//! - A line-oriented, Redis-style text protocol
//! - A single-threaded, non-blocking event loop (mio)
//! - Per-connection input buffering and command framing
//! - A readers-writer locked store, safe for multi-threaded embedding
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Event Loop (mio)                        │
//! │        accept / drain reads / flush replies                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ raw lines (ConnectionBuffer)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Command Handler                             │
//! │        parse line → Command → Reply bytes                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!                ┌─────────────┐
//!                │    Store    │
//!                │  (RwLock)   │
//!                └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod store;
pub mod protocol;
pub mod network;
pub mod app;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{EmberError, Result};
pub use config::Config;
pub use store::Store;
pub use network::{LineHandler, Outcome, Server, ServerHandle};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Configuration for EmberKV
//!
//! Centralized configuration with sensible defaults.

use crate::error::{EmberError, Result};

/// Well-known default listening port
pub const DEFAULT_PORT: u16 = 6379;

/// Main configuration for an EmberKV server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Listener Configuration
    // -------------------------------------------------------------------------
    /// Interface to bind
    pub host: String,

    /// TCP port to bind (0 picks an ephemeral port)
    pub port: u16,

    /// Pending-connection queue length passed to listen(2)
    pub backlog: i32,

    // -------------------------------------------------------------------------
    // Connection Configuration
    // -------------------------------------------------------------------------
    /// Max concurrent client connections
    pub max_connections: usize,

    /// Size of the scratch buffer used for each read(2) call
    pub read_chunk_size: usize,

    /// Max bytes a client may have buffered without sending a line terminator
    pub max_buffered_bytes: usize,

    /// Queued reply bytes at which a connection stops reading until the
    /// peer catches up
    pub max_outbound_bytes: usize,

    // -------------------------------------------------------------------------
    // Event Loop Configuration
    // -------------------------------------------------------------------------
    /// Max readiness events handled per poll wakeup
    pub events_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            backlog: 128,
            max_connections: 1024,
            read_chunk_size: 4096,
            max_buffered_bytes: 1024 * 1024, // 1 MB
            max_outbound_bytes: 1024 * 1024, // 1 MB
            events_capacity: 64,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// `host:port` string handed to the resolver
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject settings the event loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.backlog <= 0 {
            return Err(EmberError::Config(format!(
                "backlog must be positive, got {}",
                self.backlog
            )));
        }
        if self.max_connections == 0 {
            return Err(EmberError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.read_chunk_size == 0 {
            return Err(EmberError::Config(
                "read_chunk_size must be at least 1".to_string(),
            ));
        }
        if self.max_buffered_bytes == 0 {
            return Err(EmberError::Config(
                "max_buffered_bytes must be at least 1".to_string(),
            ));
        }
        if self.max_outbound_bytes == 0 {
            return Err(EmberError::Config(
                "max_outbound_bytes must be at least 1".to_string(),
            ));
        }
        if self.events_capacity == 0 {
            return Err(EmberError::Config(
                "events_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the interface to bind
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the TCP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the listen backlog
    pub fn backlog(mut self, backlog: i32) -> Self {
        self.config.backlog = backlog;
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the per-read scratch buffer size (in bytes)
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.config.read_chunk_size = size;
        self
    }

    /// Set the inbound buffer bound per connection (in bytes)
    pub fn max_buffered_bytes(mut self, size: usize) -> Self {
        self.config.max_buffered_bytes = size;
        self
    }

    /// Set the queued reply bound per connection (in bytes)
    pub fn max_outbound_bytes(mut self, size: usize) -> Self {
        self.config.max_outbound_bytes = size;
        self
    }

    /// Set the number of events fetched per poll
    pub fn events_capacity(mut self, count: usize) -> Self {
        self.config.events_capacity = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

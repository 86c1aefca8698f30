//! EmberKV Server Binary
//!
//! Starts the event loop for EmberKV.

use clap::Parser;
use emberkv::config::DEFAULT_PORT;
use emberkv::{app, Config};
use tracing_subscriber::{fmt, EnvFilter};

/// EmberKV Server
#[derive(Parser, Debug)]
#[command(name = "emberkv-server")]
#[command(about = "In-memory key-value server with a line-oriented text protocol")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(default_value_t = DEFAULT_PORT, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Interface to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Bytes a client may send without a newline before it is dropped, in KB
    #[arg(long, default_value = "1024")]
    max_line_kb: usize,

    /// Queued reply bytes at which a client stops being read, in KB
    #[arg(long, default_value = "1024")]
    max_reply_kb: usize,
}

fn kb_to_bytes(flag: &str, kb: usize) -> Result<usize, String> {
    kb.checked_mul(1024)
        .ok_or_else(|| format!("--{} {} is too large", flag, kb))
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,emberkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let args = Args::parse();

    tracing::info!("EmberKV Server v{}", emberkv::VERSION);

    let limits = kb_to_bytes("max-line-kb", args.max_line_kb)
        .and_then(|line| Ok((line, kb_to_bytes("max-reply-kb", args.max_reply_kb)?)));
    let (max_line, max_reply) = match limits {
        Ok(limits) => limits,
        Err(e) => {
            tracing::error!("Invalid arguments: {}", e);
            std::process::exit(1);
        }
    };

    // Build config from args
    let config = Config::builder()
        .host(&args.host)
        .port(args.port)
        .max_connections(args.max_connections)
        .max_buffered_bytes(max_line)
        .max_outbound_bytes(max_reply)
        .build();

    if let Err(e) = app::run(config) {
        tracing::error!("Fatal error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kb_to_bytes() {
        assert_eq!(kb_to_bytes("max-line-kb", 1024), Ok(1024 * 1024));
        assert!(kb_to_bytes("max-line-kb", usize::MAX).is_err());
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::parse_from(["emberkv-server"]);
        assert_eq!(args.port, DEFAULT_PORT);
        assert_eq!(args.max_line_kb, 1024);
        assert_eq!(args.max_reply_kb, 1024);
    }
}

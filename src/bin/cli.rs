//! EmberKV CLI Client
//!
//! Sends one command to a running server and prints the reply.

use std::io::BufReader;
use std::net::TcpStream;

use clap::Parser;
use emberkv::protocol::{read_reply, write_request, Reply};

/// EmberKV CLI
#[derive(Parser, Debug)]
#[command(name = "emberkv-cli")]
#[command(about = "CLI for the EmberKV key-value server")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    server: String,

    /// Command verb followed by its arguments, e.g. `SET key value`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() {
    let args = Args::parse();

    match execute(&args) {
        Ok(reply) => {
            println!("{}", reply);
            if reply.is_error() {
                std::process::exit(1);
            }
        }
        Err(e) if e.is_eof() => {
            eprintln!("Server closed the connection");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

fn execute(args: &Args) -> emberkv::Result<Reply> {
    let stream = TcpStream::connect(&args.server)?;
    stream.set_nodelay(true)?;

    let mut reader = BufReader::new(stream.try_clone()?);
    let mut writer = stream;

    let (verb, rest) = args
        .command
        .split_first()
        .ok_or_else(|| emberkv::EmberError::Protocol("Missing command".to_string()))?;
    let rest: Vec<&[u8]> = rest.iter().map(|arg| arg.as_bytes()).collect();

    write_request(&mut writer, verb, &rest)?;
    read_reply(&mut reader)
}

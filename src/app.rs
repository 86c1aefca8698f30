//! Application wiring
//!
//! Builds the pipeline `raw line -> CommandHandler -> Store -> reply` and
//! hands it to the event loop. This is the only place that knows about all
//! three components; each one is constructed here and injected into the next.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::network::{LineHandler, Server};
use crate::protocol::CommandHandler;
use crate::store::Store;

/// Bind a server whose handler dispatches into `store`
pub fn build_server(config: Config, store: Arc<Store>) -> Result<Server<impl LineHandler + Send>> {
    let handler = CommandHandler::new(store);
    Server::bind(config, move |line: &[u8]| handler.handle_line(line))
}

/// Create a fresh store, bind, and run until the loop stops (blocking)
pub fn run(config: Config) -> Result<()> {
    let store = Arc::new(Store::new());
    let mut server = build_server(config, store)?;
    server.run()
}

//! Store Module
//!
//! The authoritative in-memory key/value map.
//!
//! ## Responsibilities
//! - Unconditional upsert, lookup, delete and existence checks
//! - Many concurrent readers, writers exclusive against everyone
//! - Hand out owned copies so no caller holds a reference into the map
//!
//! ## Data Structure Choice
//! `HashMap` wrapped in a `parking_lot::RwLock`:
//! - Key order is irrelevant, so hashing beats a tree
//! - parking_lot's lock is eventually fair, so a stream of readers
//!   cannot starve a waiting writer
//!
//! The store knows nothing about connections or the event loop.

mod table;

pub use table::Store;

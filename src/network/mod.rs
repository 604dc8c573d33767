//! Network Module
//!
//! TCP store client and the reference store server.
//!
//! ## Architecture
//! - Client: one connection, requests serialized behind a mutex
//! - Server: single acceptor thread, worker thread pool for connections
//! - Commands executed against a shared `MemoryStore`

mod server;
mod connection;
mod client;

pub use server::Server;
pub use connection::Connection;
pub use client::TcpStoreClient;

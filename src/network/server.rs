//! TCP Server
//!
//! Accepts connections and dispatches them to a fixed pool of worker threads.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::store::MemoryStore;

use super::Connection;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_BACKOFF: Duration = Duration::from_millis(10);

/// Reference store server
pub struct Server {
    config: ServerConfig,
    store: Arc<MemoryStore>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Bind the listen address from `config`
    pub fn bind(config: ServerConfig, store: Arc<MemoryStore>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            store,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Flag that stops [`Server::run`] once set
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Serve until shutdown is signalled (blocking)
    ///
    /// Open connections are served to completion before this returns.
    pub fn run(&self) -> Result<()> {
        let workers = self.config.workers.max(1);
        let (tx, rx) = channel::bounded(workers);

        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let rx = rx.clone();
                let store = Arc::clone(&self.store);
                let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);
                thread::Builder::new()
                    .name(format!("kvport-worker-{}", id))
                    .spawn(move || {
                        for stream in rx.iter() {
                            let served = Connection::new(stream, Arc::clone(&store)).and_then(|mut conn| {
                                conn.set_timeouts(read_ms, write_ms)?;
                                conn.handle()
                            });
                            if let Err(e) = served {
                                tracing::warn!("Connection error: {}", e);
                            }
                        }
                    })
            })
            .collect::<std::io::Result<_>>()?;

        tracing::info!("Listening on {} with {} workers", self.local_addr()?, workers);

        while !self.shutdown.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    stream.set_nonblocking(false)?;
                    tracing::trace!("Accepted {}", peer);
                    if tx.send(stream).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_BACKOFF),
                Err(e) => tracing::warn!("Accept failed: {}", e),
            }
        }

        drop(tx);
        for handle in handles {
            let _ = handle.join();
        }
        tracing::info!("Server stopped");
        Ok(())
    }
}

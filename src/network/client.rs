//! TCP store client
//!
//! Dials the first reachable endpoint and issues requests one at a time on
//! that connection. The client never reconnects: once a request fails at the
//! transport level, later requests fail too and the caller decides what to do.

use std::io::{BufReader, BufWriter};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{KvportError, Result};
use crate::protocol::{read_response, write_command, Command, Response};
use crate::store::{PutResult, RangeRequest, RangeResponse, StatusReport, StoreClient};

/// Buffered request/response channel to one endpoint
struct Link {
    endpoint: String,
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,

    /// Set once the stream is out of sync; later requests fail with it
    broken: Option<String>,
}

impl Link {
    fn dial(endpoint: &str, dial_timeout: Duration, request_timeout: Duration) -> Result<Self> {
        let addrs = endpoint
            .to_socket_addrs()
            .map_err(|e| KvportError::Connection(format!("resolve {}: {}", endpoint, e)))?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, dial_timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    stream.set_read_timeout(Some(request_timeout))?;
                    stream.set_write_timeout(Some(request_timeout))?;
                    let read_stream = stream.try_clone()?;
                    return Ok(Self {
                        endpoint: endpoint.to_string(),
                        reader: BufReader::new(read_stream),
                        writer: BufWriter::new(stream),
                        broken: None,
                    });
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(KvportError::Connection(match last_err {
            Some(e) => format!("dial {}: {}", endpoint, e),
            None => format!("dial {}: no addresses resolved", endpoint),
        }))
    }

    /// One request/response exchange
    ///
    /// Any transport or framing failure leaves unread bytes on the stream, so
    /// the link is shut down and every later request fails.
    fn request(&mut self, command: &Command) -> Result<Response> {
        if let Some(reason) = &self.broken {
            return Err(KvportError::Connection(format!(
                "{}: connection unusable after earlier failure: {}",
                self.endpoint, reason
            )));
        }

        let exchanged = write_command(&mut self.writer, command).and_then(|_| read_response(&mut self.reader));
        exchanged.map_err(|e| {
            tracing::warn!("Closing connection to {}: {}", self.endpoint, e);
            self.broken = Some(e.to_string());
            let _ = self.writer.get_ref().shutdown(Shutdown::Both);
            match e {
                KvportError::Io(io) => KvportError::Connection(format!("{}: {}", self.endpoint, io)),
                other => other,
            }
        })
    }
}

/// [`StoreClient`] speaking the wire protocol over TCP
pub struct TcpStoreClient {
    endpoints: Vec<String>,
    dial_timeout: Duration,
    request_timeout: Duration,
    link: Mutex<Link>,
}

impl TcpStoreClient {
    /// Dial the configured endpoints in order, keeping the first that answers
    pub fn connect(config: &Config) -> Result<Self> {
        if config.endpoints.is_empty() {
            return Err(KvportError::Config("no endpoints configured".to_string()));
        }

        let dial_timeout = Duration::from_millis(config.dial_timeout_ms.max(1));
        let request_timeout = Duration::from_millis(config.request_timeout_ms.max(1));

        let mut failures = Vec::new();
        for endpoint in &config.endpoints {
            match Link::dial(endpoint, dial_timeout, request_timeout) {
                Ok(link) => {
                    tracing::debug!("Connected to {}", endpoint);
                    return Ok(Self {
                        endpoints: config.endpoints.clone(),
                        dial_timeout,
                        request_timeout,
                        link: Mutex::new(link),
                    });
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    failures.push(e.to_string());
                }
            }
        }

        Err(KvportError::Connection(format!(
            "no endpoint reachable: {}",
            failures.join("; ")
        )))
    }

    /// Endpoint the client is connected to
    pub fn connected_endpoint(&self) -> String {
        self.link.lock().endpoint.clone()
    }

    /// Round-trip a PING
    pub fn ping(&self) -> Result<()> {
        self.request(&Command::Ping)?.into_pong()
    }

    /// Close the connection
    pub fn close(self) {
        let link = self.link.into_inner();
        let _ = link.writer.get_ref().shutdown(Shutdown::Both);
    }

    fn request(&self, command: &Command) -> Result<Response> {
        self.link.lock().request(command)
    }
}

impl StoreClient for TcpStoreClient {
    fn range(&self, request: &RangeRequest) -> Result<RangeResponse> {
        self.request(&Command::Range(request.clone()))?.into_range()
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<PutResult> {
        let command = Command::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        };
        self.request(&command)?.into_put()
    }

    /// Status of `endpoint`; endpoints other than the connected one get a
    /// short-lived connection of their own
    fn status(&self, endpoint: &str) -> Result<StatusReport> {
        let query = || -> Result<StatusReport> {
            let mut link = self.link.lock();
            let response = if link.endpoint == endpoint {
                link.request(&Command::Status)?
            } else {
                drop(link);
                Link::dial(endpoint, self.dial_timeout, self.request_timeout)?.request(&Command::Status)?
            };
            response.into_status()
        };

        query().map_err(|e| KvportError::StatusQuery {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    fn endpoints(&self) -> &[String] {
        &self.endpoints
    }
}

//! TCP transport
//!
//! DNS over TCP with the usual 2-byte length prefix. Each connection gets a
//! task, and each message on it another, so pipelined queries are delayed
//! independently. Responses share the connection's write half.

use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use hickory_proto::op::Message;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::time;
use tracing::{debug, error, trace};

use super::handler::QueryHandler;
use super::report_failure;
use super::stats::ResponderStats;
use super::writer::TcpResponseWriter;
use crate::error::ResponderError;

/// How long a connection may sit between messages before it is closed
pub const TCP_IDLE_TIMEOUT: Duration = Duration::from_secs(8);

/// Chaos DNS server over TCP
pub struct ChaosTcpServer {
    listener: TcpListener,
    handler: Arc<QueryHandler>,
    idle_timeout: Duration,
    fatal_tx: mpsc::UnboundedSender<ResponderError>,
    fatal_rx: mpsc::UnboundedReceiver<ResponderError>,
}

impl ChaosTcpServer {
    /// Bind to the given address; idle connections close after `idle_timeout`
    ///
    /// # Errors
    /// Returns `ResponderError::Bind` if binding fails.
    pub async fn bind(
        addr: SocketAddr,
        handler: Arc<QueryHandler>,
        idle_timeout: Duration,
    ) -> Result<Self, ResponderError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ResponderError::Bind { addr, source })?;
        let (fatal_tx, fatal_rx) = mpsc::unbounded_channel();
        Ok(Self {
            listener,
            handler,
            idle_timeout,
            fatal_tx,
            fatal_rx,
        })
    }

    /// Get the local address of the server
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    #[cfg(test)]
    pub(crate) fn fatal_sender(&self) -> mpsc::UnboundedSender<ResponderError> {
        self.fatal_tx.clone()
    }

    /// Run the accept loop
    ///
    /// Runs until a handler reports a fatal error.
    ///
    /// # Errors
    /// Returns the first fatal `ResponderError` raised by a handler task.
    pub async fn run(self) -> Result<(), ResponderError> {
        let Self {
            listener,
            handler,
            idle_timeout,
            fatal_tx,
            mut fatal_rx,
        } = self;

        loop {
            let (stream, peer_addr) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(s) => s,
                    Err(err) => {
                        error!("Failed to accept TCP connection: {}", err);
                        time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                },
                Some(err) = fatal_rx.recv() => return Err(err),
            };

            trace!("TCP accepted client {}", peer_addr);

            let handler = Arc::clone(&handler);
            let fatal_tx = fatal_tx.clone();
            tokio::spawn(async move {
                if let Err(err) =
                    Self::handle_client(stream, peer_addr, handler, idle_timeout, fatal_tx).await
                {
                    debug!("TCP client {} error: {}", peer_addr, err);
                }
            });
        }
    }

    /// Read framed queries from one connection until it closes
    async fn handle_client(
        stream: TcpStream,
        peer_addr: SocketAddr,
        handler: Arc<QueryHandler>,
        idle_timeout: Duration,
        fatal_tx: mpsc::UnboundedSender<ResponderError>,
    ) -> io::Result<()> {
        let (mut reader, writer) = stream.into_split();
        let writer = Arc::new(Mutex::new(writer));
        let mut length_buf = [0u8; 2];
        let mut message_buf = BytesMut::new();

        loop {
            match time::timeout(idle_timeout, reader.read_exact(&mut length_buf)).await {
                Ok(Ok(..)) => {}
                Ok(Err(ref err)) if err.kind() == ErrorKind::UnexpectedEof => break,
                Ok(Err(err)) => return Err(err),
                Err(_) => {
                    debug!("TCP client {} idle for {:?}, closing", peer_addr, idle_timeout);
                    break;
                }
            }

            let length = usize::from(u16::from_be_bytes(length_buf));
            if length == 0 {
                debug!("TCP {} sent a zero-length message", peer_addr);
                continue;
            }

            message_buf.resize(length, 0);
            reader.read_exact(&mut message_buf).await?;

            let request = match Message::from_vec(&message_buf) {
                Ok(m) => m,
                Err(err) => {
                    debug!("TCP {} parse error: {}", peer_addr, err);
                    ResponderStats::incr(&handler.stats().malformed);
                    continue;
                }
            };

            let handler = Arc::clone(&handler);
            let mut writer = TcpResponseWriter::new(Arc::clone(&writer));
            let fatal_tx = fatal_tx.clone();
            tokio::spawn(async move {
                if let Err(err) = handler.handle_request(&request, &mut writer).await {
                    report_failure(err, peer_addr, &fatal_tx);
                }
            });
        }

        trace!("TCP client {} closed", peer_addr);
        Ok(())
    }
}

//! UDP transport
//!
//! One receive loop; every parsed datagram is handled in its own task so a
//! long jitter never holds up reception of the next query.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hickory_proto::op::Message;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, error, trace};

use super::handler::QueryHandler;
use super::stats::ResponderStats;
use super::writer::UdpResponseWriter;
use super::{report_failure, MAX_MESSAGE_SIZE};
use crate::error::ResponderError;

/// Chaos DNS server over UDP
pub struct ChaosUdpServer {
    socket: Arc<UdpSocket>,
    handler: Arc<QueryHandler>,
    fatal_tx: mpsc::UnboundedSender<ResponderError>,
    fatal_rx: mpsc::UnboundedReceiver<ResponderError>,
}

impl ChaosUdpServer {
    /// Bind to the given address
    ///
    /// # Errors
    /// Returns `ResponderError::Bind` if binding fails.
    pub async fn bind(addr: SocketAddr, handler: Arc<QueryHandler>) -> Result<Self, ResponderError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| ResponderError::Bind { addr, source })?;
        let (fatal_tx, fatal_rx) = mpsc::unbounded_channel();
        Ok(Self {
            socket: Arc::new(socket),
            handler,
            fatal_tx,
            fatal_rx,
        })
    }

    /// Get the local address of the server
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    #[cfg(test)]
    pub(crate) fn fatal_sender(&self) -> mpsc::UnboundedSender<ResponderError> {
        self.fatal_tx.clone()
    }

    /// Run the receive loop
    ///
    /// Runs until a handler reports a fatal error.
    ///
    /// # Errors
    /// Returns the first fatal `ResponderError` raised by a handler task.
    pub async fn run(self) -> Result<(), ResponderError> {
        let Self {
            socket,
            handler,
            fatal_tx,
            mut fatal_rx,
        } = self;
        let mut buffer = vec![0u8; MAX_MESSAGE_SIZE];

        loop {
            let (n, peer_addr) = tokio::select! {
                received = socket.recv_from(&mut buffer) => match received {
                    Ok(r) => r,
                    Err(err) => {
                        error!("UDP recv error: {}", err);
                        time::sleep(Duration::from_secs(1)).await;
                        continue;
                    }
                },
                Some(err) = fatal_rx.recv() => return Err(err),
            };

            trace!("UDP received {} bytes from {}", n, peer_addr);

            let request = match Message::from_vec(&buffer[..n]) {
                Ok(m) => m,
                Err(err) => {
                    debug!("UDP parse error from {}: {}", peer_addr, err);
                    ResponderStats::incr(&handler.stats().malformed);
                    continue;
                }
            };

            let handler = Arc::clone(&handler);
            let mut writer = UdpResponseWriter::new(Arc::clone(&socket), peer_addr);
            let fatal_tx = fatal_tx.clone();
            tokio::spawn(async move {
                if let Err(err) = handler.handle_request(&request, &mut writer).await {
                    report_failure(err, peer_addr, &fatal_tx);
                }
            });
        }
    }
}

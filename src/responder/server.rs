//! Chaos DNS server
//!
//! Binds the configured transport and hands every received query to a
//! shared [`QueryHandler`].

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::handler::QueryHandler;
use super::stats::ResponderStats;
use super::tcp_server::{ChaosTcpServer, TCP_IDLE_TIMEOUT};
use super::udp_server::ChaosUdpServer;
use crate::chaos::ChaosEngine;
use crate::config::{Config, Transport};
use crate::error::{DoNotShoutError, ResponderError};

/// Builder for creating a chaos DNS server
pub struct ChaosDnsBuilder {
    listen_addr: SocketAddr,
    transport: Transport,
    tcp_idle_timeout: Duration,
}

impl ChaosDnsBuilder {
    /// Create a new builder with the given listen address (UDP by default)
    #[must_use]
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self {
            listen_addr,
            transport: Transport::Udp,
            tcp_idle_timeout: TCP_IDLE_TIMEOUT,
        }
    }

    /// Set the transport
    #[must_use]
    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    /// Set how long an idle TCP connection is kept open
    #[must_use]
    pub fn tcp_idle_timeout(mut self, timeout: Duration) -> Self {
        self.tcp_idle_timeout = timeout;
        self
    }

    /// Bind the listener
    ///
    /// # Errors
    /// Returns `ResponderError::Bind` if binding to the listen address fails.
    pub async fn build(self, handler: QueryHandler) -> Result<ChaosDns, ResponderError> {
        let handler = Arc::new(handler);

        let listener = match self.transport {
            Transport::Udp => {
                Listener::Udp(ChaosUdpServer::bind(self.listen_addr, Arc::clone(&handler)).await?)
            }
            Transport::Tcp => {
                Listener::Tcp(
                    ChaosTcpServer::bind(
                        self.listen_addr,
                        Arc::clone(&handler),
                        self.tcp_idle_timeout,
                    )
                    .await?,
                )
            }
        };

        Ok(ChaosDns { listener, handler })
    }
}

enum Listener {
    Udp(ChaosUdpServer),
    Tcp(ChaosTcpServer),
}

/// Chaos DNS server instance
pub struct ChaosDns {
    listener: Listener,
    handler: Arc<QueryHandler>,
}

impl ChaosDns {
    /// Create a new builder
    #[must_use]
    pub fn builder(listen_addr: SocketAddr) -> ChaosDnsBuilder {
        ChaosDnsBuilder::new(listen_addr)
    }

    /// Resolve the configured listen address and bind it
    ///
    /// # Errors
    /// Returns an error if the address does not resolve or cannot be bound.
    pub async fn bind(config: &Config, engine: ChaosEngine) -> Result<Self, DoNotShoutError> {
        config.validate()?;
        let addr = config.listen.socket_addr()?;
        let handler = QueryHandler::from_config(config, engine);
        Ok(Self::builder(addr)
            .transport(config.listen.transport)
            .tcp_idle_timeout(Duration::from_secs(config.listen.tcp_idle_timeout_secs))
            .build(handler)
            .await?)
    }

    /// Transport this server listens on
    #[must_use]
    pub fn transport(&self) -> Transport {
        match self.listener {
            Listener::Udp(_) => Transport::Udp,
            Listener::Tcp(_) => Transport::Tcp,
        }
    }

    /// Get the bound local address
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match &self.listener {
            Listener::Udp(udp) => udp.local_addr(),
            Listener::Tcp(tcp) => tcp.local_addr(),
        }
    }

    #[cfg(test)]
    fn fatal_sender(&self) -> tokio::sync::mpsc::UnboundedSender<ResponderError> {
        match &self.listener {
            Listener::Udp(udp) => udp.fatal_sender(),
            Listener::Tcp(tcp) => tcp.fatal_sender(),
        }
    }

    /// Get the handler's statistics
    #[must_use]
    pub fn stats(&self) -> Arc<ResponderStats> {
        Arc::clone(self.handler.stats())
    }

    /// Run the server
    ///
    /// Runs until a fatal error occurs.
    ///
    /// # Errors
    /// Returns the fatal `ResponderError` that stopped the server.
    pub async fn run(self) -> Result<(), ResponderError> {
        if let Ok(addr) = self.local_addr() {
            info!("Chaos DNS {} server listening on {}", self.transport(), addr);
        }

        match self.listener {
            Listener::Udp(udp) => udp.run().await,
            Listener::Tcp(tcp) => tcp.run().await,
        }
    }
}

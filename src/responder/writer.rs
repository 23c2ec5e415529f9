//! Response write-back
//!
//! The handler only ever sees a [`ResponseWriter`]; the transport decides how
//! bytes reach the requester. A dropped answer never calls the writer.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;

/// Sink for one requester's responses
#[async_trait]
pub trait ResponseWriter: Send {
    /// Send `data` to the requester as a single response
    async fn write_response(&mut self, data: &[u8]) -> io::Result<()>;
}

/// Writes datagrams back to the peer a query came from
#[derive(Debug, Clone)]
pub struct UdpResponseWriter {
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
}

impl UdpResponseWriter {
    /// Create a writer replying to `peer` over `socket`
    #[must_use]
    pub fn new(socket: Arc<UdpSocket>, peer: SocketAddr) -> Self {
        Self { socket, peer }
    }
}

#[async_trait]
impl ResponseWriter for UdpResponseWriter {
    async fn write_response(&mut self, data: &[u8]) -> io::Result<()> {
        self.socket.send_to(data, self.peer).await.map(|_| ())
    }
}

/// Writes length-prefixed frames to a shared TCP write half
///
/// Concurrent handlers on one connection serialize on the mutex so frames
/// never interleave.
#[derive(Debug, Clone)]
pub struct TcpResponseWriter {
    stream: Arc<Mutex<OwnedWriteHalf>>,
}

impl TcpResponseWriter {
    /// Create a writer over a shared write half
    #[must_use]
    pub fn new(stream: Arc<Mutex<OwnedWriteHalf>>) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl ResponseWriter for TcpResponseWriter {
    async fn write_response(&mut self, data: &[u8]) -> io::Result<()> {
        let length = u16::try_from(data.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "DNS message exceeds 65535 bytes")
        })?;

        let mut frame = Vec::with_capacity(2 + data.len());
        frame.extend_from_slice(&length.to_be_bytes());
        frame.extend_from_slice(data);

        let mut stream = self.stream.lock().await;
        stream.write_all(&frame).await?;
        stream.flush().await
    }
}

/// Collects responses in memory
#[derive(Debug, Default, Clone)]
pub struct BufferedWriter {
    responses: Vec<Vec<u8>>,
}

impl BufferedWriter {
    /// Create an empty writer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses written so far, in order
    #[must_use]
    pub fn responses(&self) -> &[Vec<u8>] {
        &self.responses
    }
}

#[async_trait]
impl ResponseWriter for BufferedWriter {
    async fn write_response(&mut self, data: &[u8]) -> io::Result<()> {
        self.responses.push(data.to_vec());
        Ok(())
    }
}

//! Shared helpers for the integration suite

use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use donotshout::chaos::ChaosEngine;
use donotshout::config::{ChaosConfig, Config, Transport};
use donotshout::responder::{ChaosDns, ResponderStats};
use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::{Name, RecordType};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time;

/// Loopback config with the given chaos parameters
pub fn loopback_config(transport: Transport, chaos: ChaosConfig) -> Config {
    let mut config = Config::default();
    config.listen.host = "127.0.0.1".into();
    config.listen.port = 0;
    config.listen.transport = transport;
    config.answer.ipv4_address = Ipv4Addr::new(10, 0, 0, 9);
    config.chaos = chaos;
    config
}

/// Chaos parameters with ~1ms of jitter
pub fn quiet_chaos(truncate_percent: u8, drop_percent: u8) -> ChaosConfig {
    ChaosConfig {
        min_jitter_ms: 0,
        max_jitter_ms: 1,
        truncate_percent,
        drop_percent,
    }
}

/// Bind and spawn a server, returning its address and stats
pub async fn spawn_server(config: &Config, seed: u64) -> (SocketAddr, Arc<ResponderStats>) {
    let server = ChaosDns::bind(config, ChaosEngine::seeded(seed))
        .await
        .expect("bind server");
    let addr = server.local_addr().expect("local addr");
    let stats = server.stats();
    tokio::spawn(server.run());
    (addr, stats)
}

/// Encode a single-question query
pub fn query_bytes(id: u16, name: &str, rtype: RecordType) -> Vec<u8> {
    let mut message = Message::new();
    message.set_id(id);
    message.set_message_type(MessageType::Query);
    message.set_op_code(OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(Query::query(Name::from_str(name).expect("name"), rtype));
    message.to_vec().expect("encode query")
}

/// Send one UDP query and wait up to `wait` for the raw reply
pub async fn udp_exchange(server: SocketAddr, query: &[u8], wait: Duration) -> Option<Vec<u8>> {
    let client = UdpSocket::bind("127.0.0.1:0").await.expect("bind client");
    client.send_to(query, server).await.expect("send");
    let mut buf = vec![0u8; 4096];
    match time::timeout(wait, client.recv_from(&mut buf)).await {
        Ok(Ok((n, _))) => Some(buf[..n].to_vec()),
        _ => None,
    }
}

/// Send one framed TCP query and read one framed reply
pub async fn tcp_exchange(server: SocketAddr, query: &[u8], wait: Duration) -> Option<Vec<u8>> {
    let mut stream = TcpStream::connect(server).await.expect("connect");
    stream
        .write_all(&(query.len() as u16).to_be_bytes())
        .await
        .expect("write length");
    stream.write_all(query).await.expect("write query");

    let read = async {
        let mut length_buf = [0u8; 2];
        stream.read_exact(&mut length_buf).await.ok()?;
        let mut buf = vec![0u8; u16::from_be_bytes(length_buf) as usize];
        stream.read_exact(&mut buf).await.ok()?;
        Some(buf)
    };
    time::timeout(wait, read).await.ok().flatten()
}

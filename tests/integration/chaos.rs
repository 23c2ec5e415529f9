//! Chaos behaviour as seen by a client

use std::time::{Duration, Instant};

use donotshout::config::{ChaosConfig, Transport};
use hickory_proto::op::Message;
use hickory_proto::rr::RecordType;

use super::common::{
    loopback_config, query_bytes, quiet_chaos, spawn_server, tcp_exchange, udp_exchange,
};

#[tokio::test]
async fn test_drop_all_udp() {
    let config = loopback_config(Transport::Udp, quiet_chaos(0, 100));
    let (addr, stats) = spawn_server(&config, 10).await;

    for (i, rtype) in [RecordType::A, RecordType::AAAA].into_iter().enumerate() {
        let rsp = udp_exchange(
            addr,
            &query_bytes(i as u16, "drop.example.", rtype),
            Duration::from_millis(200),
        )
        .await;
        assert!(rsp.is_none(), "{rtype} answer should be dropped");
    }

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.dropped, 2);
    assert_eq!(snapshot.emitted, 0);
}

#[tokio::test]
async fn test_truncate_all_udp() {
    let clean = loopback_config(Transport::Udp, quiet_chaos(0, 0));
    let (clean_addr, _) = spawn_server(&clean, 11).await;
    let config = loopback_config(Transport::Udp, quiet_chaos(100, 0));
    let (addr, stats) = spawn_server(&config, 11).await;

    let query = query_bytes(21, "cut.example.", RecordType::A);
    let full = udp_exchange(clean_addr, &query, Duration::from_secs(2))
        .await
        .expect("clean answer");

    for _ in 0..20 {
        let cut = udp_exchange(addr, &query, Duration::from_secs(2))
            .await
            .expect("truncated answer");
        assert!((1..=full.len() - 2).contains(&cut.len()));
        assert_eq!(&full[..cut.len()], &cut[..]);
    }
    assert_eq!(stats.snapshot().truncated, 20);
}

#[tokio::test]
async fn test_truncated_tcp_answer_does_not_parse() {
    let config = loopback_config(Transport::Tcp, quiet_chaos(100, 0));
    let (addr, _) = spawn_server(&config, 12).await;

    let rsp = tcp_exchange(
        addr,
        &query_bytes(3, "cut.example.", RecordType::AAAA),
        Duration::from_secs(2),
    )
    .await
    .expect("framed reply");
    // The last two bytes of the AAAA address are always cut
    assert!(Message::from_vec(&rsp).is_err());
}

#[tokio::test]
async fn test_dropped_aaaa_still_waits() {
    let chaos = ChaosConfig {
        min_jitter_ms: 300,
        max_jitter_ms: 1,
        truncate_percent: 0,
        drop_percent: 100,
    };
    let config = loopback_config(Transport::Udp, chaos);
    let (addr, stats) = spawn_server(&config, 13).await;

    let start = Instant::now();
    let rsp = udp_exchange(
        addr,
        &query_bytes(1, "late.example.", RecordType::AAAA),
        Duration::from_millis(100),
    )
    .await;
    assert!(rsp.is_none());
    assert!(start.elapsed() < Duration::from_millis(300));

    // The drop decision only happens after the 300ms jitter
    assert_eq!(stats.snapshot().dropped, 0);
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(stats.snapshot().dropped, 1);
}

#[tokio::test]
async fn test_dropped_a_decides_at_once() {
    let chaos = ChaosConfig {
        min_jitter_ms: 300,
        max_jitter_ms: 1,
        truncate_percent: 0,
        drop_percent: 100,
    };
    let config = loopback_config(Transport::Udp, chaos);
    let (addr, stats) = spawn_server(&config, 14).await;

    let rsp = udp_exchange(
        addr,
        &query_bytes(1, "now.example.", RecordType::A),
        Duration::from_millis(100),
    )
    .await;
    assert!(rsp.is_none());
    assert_eq!(stats.snapshot().dropped, 1);
    assert_eq!(stats.snapshot().jitter_ms_total, 0);
}

#[tokio::test]
async fn test_fixed_jitter_is_applied() {
    let chaos = ChaosConfig {
        min_jitter_ms: 150,
        max_jitter_ms: 1,
        truncate_percent: 0,
        drop_percent: 0,
    };
    let config = loopback_config(Transport::Udp, chaos);
    let (addr, stats) = spawn_server(&config, 15).await;

    let start = Instant::now();
    let rsp = udp_exchange(
        addr,
        &query_bytes(2, "slow.example.", RecordType::A),
        Duration::from_secs(2),
    )
    .await;
    assert!(rsp.is_some());
    assert!(start.elapsed() >= Duration::from_millis(150));
    assert_eq!(stats.snapshot().jitter_ms_total, 150);
}

//! Jitter isolation between concurrent queries

use std::time::{Duration, Instant};

use donotshout::config::{ChaosConfig, Transport};
use hickory_proto::op::Message;
use hickory_proto::rr::RecordType;

use super::common::{loopback_config, query_bytes, spawn_server, udp_exchange};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_jitter_does_not_serialize_queries() {
    let chaos = ChaosConfig {
        min_jitter_ms: 400,
        max_jitter_ms: 1,
        truncate_percent: 0,
        drop_percent: 0,
    };
    let config = loopback_config(Transport::Udp, chaos);
    let (addr, stats) = spawn_server(&config, 20).await;

    let start = Instant::now();
    let replies = futures::future::join_all((0..10u16).map(|id| {
        let query = query_bytes(id, "parallel.example.", RecordType::A);
        async move { udp_exchange(addr, &query, Duration::from_secs(3)).await }
    }))
    .await;

    // Ten sequential 400ms waits would take 4s
    assert!(start.elapsed() < Duration::from_secs(2));

    let mut ids: Vec<u16> = replies
        .into_iter()
        .map(|rsp| Message::from_vec(&rsp.expect("answer")).unwrap().id())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..10).collect::<Vec<_>>());
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(stats.snapshot().emitted, 10);
}

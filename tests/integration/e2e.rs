//! End-to-end tests: clean answers over both transports

use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::{Duration, Instant};

use donotshout::chaos::ChaosEngine;
use donotshout::config::Transport;
use donotshout::responder::AnswerBuilder;
use hickory_proto::op::{Message, MessageType, Query};
use hickory_proto::rr::{Name, RData, RecordType};
use std::str::FromStr;

use super::common::{
    loopback_config, query_bytes, quiet_chaos, spawn_server, tcp_exchange, udp_exchange,
};

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn test_a_query_over_udp() {
    let config = loopback_config(Transport::Udp, quiet_chaos(0, 0));
    let (addr, stats) = spawn_server(&config, 1).await;

    let start = Instant::now();
    let rsp = udp_exchange(addr, &query_bytes(0x0a0a, "example.com.", RecordType::A), WAIT)
        .await
        .expect("answer");
    assert!(start.elapsed() < Duration::from_secs(1));

    let response = Message::from_vec(&rsp).unwrap();
    assert_eq!(response.id(), 0x0a0a);
    assert_eq!(response.message_type(), MessageType::Response);
    assert!(response.authoritative());
    assert_eq!(response.answers().len(), 1);

    let record = &response.answers()[0];
    assert_eq!(record.name().to_string(), "example.com.");
    assert_eq!(record.ttl(), 1);
    match record.data() {
        Some(RData::A(a)) => assert_eq!(a.0, Ipv4Addr::new(10, 0, 0, 9)),
        other => panic!("Expected A record, got {other:?}"),
    }

    // emitted is counted after the write returns
    tokio::time::sleep(Duration::from_millis(50)).await;
    let snapshot = stats.snapshot();
    assert_eq!(snapshot.queries, 1);
    assert_eq!(snapshot.emitted, 1);
}

#[tokio::test]
async fn test_aaaa_query_over_tcp() {
    let mut config = loopback_config(Transport::Tcp, quiet_chaos(0, 0));
    config.answer.ipv6_address = "2001:db8::9".parse().unwrap();
    let (addr, _) = spawn_server(&config, 2).await;

    let rsp = tcp_exchange(addr, &query_bytes(77, "v6.example.", RecordType::AAAA), WAIT)
        .await
        .expect("answer");

    let response = Message::from_vec(&rsp).unwrap();
    assert_eq!(response.id(), 77);
    match response.answers()[0].data() {
        Some(RData::AAAA(aaaa)) => {
            assert_eq!(aaaa.0, "2001:db8::9".parse::<Ipv6Addr>().unwrap());
        }
        other => panic!("Expected AAAA record, got {other:?}"),
    }
}

#[tokio::test]
async fn test_clean_answer_matches_builder_encoding() {
    let config = loopback_config(Transport::Udp, quiet_chaos(0, 0));
    let (addr, _) = spawn_server(&config, 3).await;

    for rtype in [RecordType::A, RecordType::AAAA] {
        let rsp = udp_exchange(addr, &query_bytes(5, "exact.example.", rtype), WAIT)
            .await
            .expect("answer");

        let expected = AnswerBuilder::from(&config.answer)
            .encode(5, &Query::query(Name::from_str("exact.example.").unwrap(), rtype))
            .unwrap()
            .unwrap();
        assert_eq!(rsp, expected);
    }
}

#[tokio::test]
async fn test_other_types_get_no_reply() {
    let config = loopback_config(Transport::Udp, quiet_chaos(0, 0));
    let (addr, stats) = spawn_server(&config, 4).await;

    let rsp = udp_exchange(
        addr,
        &query_bytes(9, "example.com.", RecordType::MX),
        Duration::from_millis(200),
    )
    .await;
    assert!(rsp.is_none());
    assert_eq!(stats.snapshot().ignored, 1);
    assert_eq!(stats.snapshot().queries, 0);
}

#[tokio::test]
async fn test_invalid_config_rejected_before_bind() {
    let mut config = loopback_config(Transport::Udp, quiet_chaos(0, 0));
    config.listen.host = "  ".into();
    let result = donotshout::ChaosDns::bind(&config, ChaosEngine::seeded(1)).await;
    assert!(matches!(result, Err(donotshout::DoNotShoutError::Config(_))));

    let mut config = loopback_config(Transport::Udp, quiet_chaos(0, 0));
    config.chaos.drop_percent = 101;
    let result = donotshout::ChaosDns::bind(&config, ChaosEngine::seeded(1)).await;
    assert!(result.is_err());
}

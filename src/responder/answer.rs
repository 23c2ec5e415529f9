//! Synthetic answer construction
//!
//! Builds the single-record response for an A or AAAA question from the
//! configured addresses. Wire encoding is left to hickory-proto.

use std::net::{Ipv4Addr, Ipv6Addr};

use hickory_proto::op::{Message, MessageType, OpCode, Query};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{DNSClass, RData, Record, RecordType};

use crate::config::AnswerConfig;
use crate::error::ResponderError;

/// TTL carried by every synthetic record, in seconds
pub const ANSWER_TTL: u32 = 1;

/// Builds answers bound to the configured addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerBuilder {
    ipv4: Ipv4Addr,
    ipv6: Ipv6Addr,
}

impl AnswerBuilder {
    /// Create a builder returning `ipv4` for A and `ipv6` for AAAA
    #[must_use]
    pub const fn new(ipv4: Ipv4Addr, ipv6: Ipv6Addr) -> Self {
        Self { ipv4, ipv6 }
    }

    /// Address returned for A questions
    #[must_use]
    pub const fn ipv4(&self) -> Ipv4Addr {
        self.ipv4
    }

    /// Address returned for AAAA questions
    #[must_use]
    pub const fn ipv6(&self) -> Ipv6Addr {
        self.ipv6
    }

    /// Build the answer for `query`, or `None` when it is neither A nor AAAA
    ///
    /// The response echoes `id` and the question, is flagged authoritative,
    /// and carries exactly one IN-class record with a TTL of one second.
    #[must_use]
    pub fn build(&self, id: u16, query: &Query) -> Option<Message> {
        let rdata = match query.query_type() {
            RecordType::A => RData::A(A(self.ipv4)),
            RecordType::AAAA => RData::AAAA(AAAA(self.ipv6)),
            _ => return None,
        };

        let mut record = Record::from_rdata(query.name().clone(), ANSWER_TTL, rdata);
        record.set_dns_class(DNSClass::IN);

        let mut response = Message::new();
        response
            .set_id(id)
            .set_message_type(MessageType::Response)
            .set_op_code(OpCode::Query)
            .set_authoritative(true);
        response.add_query(query.clone());
        response.add_answer(record);

        Some(response)
    }

    /// Build and serialize the answer for `query`
    ///
    /// # Errors
    ///
    /// Returns `ResponderError::Encode` if the codec rejects the message.
    pub fn encode(&self, id: u16, query: &Query) -> Result<Option<Vec<u8>>, ResponderError> {
        match self.build(id, query) {
            Some(message) => Ok(Some(message.to_vec()?)),
            None => Ok(None),
        }
    }
}

impl From<&AnswerConfig> for AnswerBuilder {
    fn from(config: &AnswerConfig) -> Self {
        Self::new(config.ipv4_address, config.ipv6_address)
    }
}

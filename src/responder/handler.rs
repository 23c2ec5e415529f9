//! Per-query chaos pipeline
//!
//! Each A or AAAA question gets its own synthetic answer, which then goes
//! through drop, truncate and delay decisions before it is written or
//! discarded. The two record types run through separate pipelines because
//! their decision order differs:
//!
//! ```text
//! A:     build -> drop? -> truncate? -> delay -> write
//! AAAA:  build -> delay -> drop? -> truncate? -> write
//! ```
//!
//! A dropped A answer returns at once; a dropped AAAA answer has already
//! slept for its jitter. Clients that time A and AAAA lookups separately can
//! observe the difference, so the two orders are kept apart here rather than
//! folded into one parameterized pipeline.

use std::sync::Arc;
use std::time::Duration;

use hickory_proto::op::{Message, Query};
use hickory_proto::rr::RecordType;
use tokio::time;
use tracing::{debug, info};

use super::answer::AnswerBuilder;
use super::corrupt::{maybe_truncate, Truncation};
use super::stats::ResponderStats;
use super::writer::ResponseWriter;
use crate::chaos::ChaosEngine;
use crate::config::{ChaosConfig, Config};
use crate::error::ResponderError;

/// Jitter at or above this is logged
pub const JITTER_LOG_THRESHOLD: Duration = Duration::from_millis(1000);

/// Final state of one question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// The (possibly truncated) answer was written
    Emitted {
        /// Bytes handed to the writer
        len: usize,
        /// What the corruptor did
        truncation: Truncation,
        /// Delay spent before writing
        jitter: Duration,
    },
    /// The answer was dropped; `jitter` is the delay already spent, if any
    Discarded { jitter: Option<Duration> },
    /// Not an A or AAAA question; nothing was built or decided
    Ignored { rtype: RecordType },
}

/// Drives every question of a request through its chaos pipeline
#[derive(Debug, Clone)]
pub struct QueryHandler {
    engine: ChaosEngine,
    answers: AnswerBuilder,
    chaos: ChaosConfig,
    stats: Arc<ResponderStats>,
}

impl QueryHandler {
    /// Create a handler
    #[must_use]
    pub fn new(engine: ChaosEngine, answers: AnswerBuilder, chaos: ChaosConfig) -> Self {
        Self {
            engine,
            answers,
            chaos,
            stats: Arc::new(ResponderStats::new()),
        }
    }

    /// Create a handler from the loaded configuration
    #[must_use]
    pub fn from_config(config: &Config, engine: ChaosEngine) -> Self {
        Self::new(engine, AnswerBuilder::from(&config.answer), config.chaos)
    }

    /// Shared statistics
    #[must_use]
    pub fn stats(&self) -> &Arc<ResponderStats> {
        &self.stats
    }

    /// Chaos parameters in effect
    #[must_use]
    pub const fn chaos(&self) -> &ChaosConfig {
        &self.chaos
    }

    /// Handle every question in `request`, in order
    ///
    /// Each question is answered (or not) on its own; dropping one does not
    /// affect the next beyond the shared randomness sequence.
    ///
    /// # Errors
    ///
    /// Returns `ResponderError::Encode` if an answer cannot be serialized and
    /// `ResponderError::Write` if the writer fails. Questions after the
    /// failing one are not processed.
    pub async fn handle_request<W>(
        &self,
        request: &Message,
        writer: &mut W,
    ) -> Result<Vec<QueryOutcome>, ResponderError>
    where
        W: ResponseWriter + ?Sized,
    {
        let mut outcomes = Vec::with_capacity(request.queries().len());
        for query in request.queries() {
            outcomes.push(self.handle_query(request.id(), query, writer).await?);
        }
        Ok(outcomes)
    }

    /// Handle a single question
    ///
    /// # Errors
    ///
    /// See [`handle_request`](Self::handle_request).
    pub async fn handle_query<W>(
        &self,
        id: u16,
        query: &Query,
        writer: &mut W,
    ) -> Result<QueryOutcome, ResponderError>
    where
        W: ResponseWriter + ?Sized,
    {
        match query.query_type() {
            RecordType::A => self.answer_a_then_corrupt(id, query, writer).await,
            RecordType::AAAA => self.answer_aaaa_then_corrupt(id, query, writer).await,
            rtype => {
                debug!("Ignoring {} query for {} (id {})", rtype, query.name(), id);
                ResponderStats::incr(&self.stats.ignored);
                Ok(QueryOutcome::Ignored { rtype })
            }
        }
    }

    /// Drop before delay: a dropped A answer costs no jitter
    async fn answer_a_then_corrupt<W>(
        &self,
        id: u16,
        query: &Query,
        writer: &mut W,
    ) -> Result<QueryOutcome, ResponderError>
    where
        W: ResponseWriter + ?Sized,
    {
        info!("A query for {} (id {})", query.name(), id);
        ResponderStats::incr(&self.stats.queries);

        let Some(mut data) = self.answers.encode(id, query)? else {
            return Ok(QueryOutcome::Ignored { rtype: query.query_type() });
        };

        if self.should_drop(query) {
            return Ok(QueryOutcome::Discarded { jitter: None });
        }

        let truncation = self.truncate(query, &mut data);
        let jitter = self.delay().await;
        self.emit(writer, &data, truncation, jitter).await
    }

    /// Delay before drop: a dropped AAAA answer still sleeps its jitter
    async fn answer_aaaa_then_corrupt<W>(
        &self,
        id: u16,
        query: &Query,
        writer: &mut W,
    ) -> Result<QueryOutcome, ResponderError>
    where
        W: ResponseWriter + ?Sized,
    {
        info!("AAAA query for {} (id {})", query.name(), id);
        ResponderStats::incr(&self.stats.queries);

        let Some(mut data) = self.answers.encode(id, query)? else {
            return Ok(QueryOutcome::Ignored { rtype: query.query_type() });
        };

        let jitter = self.delay().await;

        if self.should_drop(query) {
            return Ok(QueryOutcome::Discarded { jitter: Some(jitter) });
        }

        let truncation = self.truncate(query, &mut data);
        self.emit(writer, &data, truncation, jitter).await
    }

    fn should_drop(&self, query: &Query) -> bool {
        let drop = self.engine.percent_chance(self.chaos.drop_percent);
        if drop {
            info!("Dropped {} answer for {}", query.query_type(), query.name());
            ResponderStats::incr(&self.stats.dropped);
        }
        drop
    }

    fn truncate(&self, query: &Query, data: &mut Vec<u8>) -> Truncation {
        let truncation = maybe_truncate(&self.engine, self.chaos.truncate_percent, data);
        match truncation {
            Truncation::Truncated { original, kept } => {
                info!(
                    "Truncated {} answer for {} from {} to {} bytes",
                    query.query_type(),
                    query.name(),
                    original,
                    kept
                );
                ResponderStats::incr(&self.stats.truncated);
            }
            Truncation::TooShort { len } => {
                debug!("Answer of {} bytes too short to truncate", len);
            }
            Truncation::Untouched => {}
        }
        truncation
    }

    async fn delay(&self) -> Duration {
        let jitter = self
            .engine
            .sample_jitter(self.chaos.min_jitter_ms, self.chaos.max_jitter_ms);
        if jitter >= JITTER_LOG_THRESHOLD {
            info!("jitter={}ms", jitter.as_millis());
        }
        self.stats.record_jitter(jitter);
        time::sleep(jitter).await;
        jitter
    }

    async fn emit<W>(
        &self,
        writer: &mut W,
        data: &[u8],
        truncation: Truncation,
        jitter: Duration,
    ) -> Result<QueryOutcome, ResponderError>
    where
        W: ResponseWriter + ?Sized,
    {
        writer
            .write_response(data)
            .await
            .map_err(ResponderError::Write)?;
        ResponderStats::incr(&self.stats.emitted);
        Ok(QueryOutcome::Emitted {
            len: data.len(),
            truncation,
            jitter,
        })
    }
}

//! Position feed: NMEA stream exposed by the streaming engine
use std::{
    io::{ErrorKind, Read},
    net::{SocketAddr, TcpStream},
    time::Instant,
};

use log::{debug, info, warn};

use crate::{
    constants::{FEED_BUFFER_SIZE, GGA_IDENTIFIER},
    error::Error,
    nmea::{Error as DecodeError, FixSample, GgaDecoder},
    prelude::Duration,
    utils::std_duration,
};

/// Lines longer than this are dropped
const MAX_PENDING: usize = 4 * FEED_BUFFER_SIZE;

/// Smallest socket read timeout we apply
const MIN_READ_TIMEOUT_S: f64 = 1.0E-3;

/// [PositionFeed] produces at most one [FixSample] per call.
pub trait PositionFeed {
    /// Returns
    /// - Ok(Some(sample)) on a successfully decoded GGA sentence
    /// - Ok(None) when nothing usable arrived in time (read timeout, or
    ///   malformed sentence): try again
    /// - Err([Error::StreamClosed]) when the peer is gone
    fn next_sample(&mut self) -> Result<Option<FixSample>, Error>;
}

/// [FeedConnector] opens a new [PositionFeed], once per survey stage.
pub trait FeedConnector {
    type Feed: PositionFeed;
    fn connect(&mut self) -> Result<Self::Feed, Error>;
}

/// [NmeaFeed] splits a byte stream into sentences and decodes
/// the GGA ones.
pub struct NmeaFeed<R: Read> {
    reader: R,
    decoder: GgaDecoder,
    pending: Vec<u8>,
    /// Only the newest GGA sentence already received is considered
    newest_only: bool,
    /// Maximal duration of a single [PositionFeed::next_sample] call
    budget: Option<Duration>,
}

impl<R: Read> NmeaFeed<R> {
    pub fn new(reader: R, decoder: GgaDecoder) -> Self {
        Self {
            reader,
            decoder,
            budget: None,
            newest_only: false,
            pending: Vec::with_capacity(FEED_BUFFER_SIZE),
        }
    }

    /// Bounds each [PositionFeed::next_sample] call, which matters
    /// when the stream is busy with sentences other than GGA.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Skips the GGA sentences that piled up in the receive buffer, so
    /// a receiver that outputs faster than the caller consumes never
    /// makes one sample stand for more than its share of time.
    pub fn newest_only(mut self) -> Self {
        self.newest_only = true;
        self
    }

    fn pop_line(&mut self) -> Option<Vec<u8>> {
        let eol = self.pending.iter().position(|b| *b == b'\n')?;
        Some(self.pending.drain(..=eol).collect())
    }

    /// Decodes a single line, None when it does not contain a GGA sentence.
    fn decode_line(&self, line: &[u8]) -> Option<Result<FixSample, DecodeError>> {
        if !line.windows(GGA_IDENTIFIER.len()).any(|w| w == GGA_IDENTIFIER) {
            return None;
        }
        Some(self.decoder.decode(line))
    }
}

impl<R: Read> PositionFeed for NmeaFeed<R> {
    fn next_sample(&mut self) -> Result<Option<FixSample>, Error> {
        let t0 = Instant::now();
        let mut chunk = [0u8; FEED_BUFFER_SIZE];

        loop {
            let mut newest = None;

            while let Some(line) = self.pop_line() {
                if let Some(decoded) = self.decode_line(&line) {
                    if newest.is_some() {
                        debug!("position feed: skipping stale sentence");
                    }
                    newest = Some(decoded);
                    if !self.newest_only {
                        break;
                    }
                }
            }

            match newest {
                Some(Ok(sample)) => return Ok(Some(sample)),
                Some(Err(e)) => {
                    debug!("position feed: {}", e);
                    return Ok(None);
                },
                None => {},
            }

            if let Some(budget) = self.budget {
                if t0.elapsed() >= std_duration(budget) {
                    return Ok(None);
                }
            }

            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    if self.pending.is_empty() {
                        info!("position feed: no data, peer closed");
                        return Err(Error::StreamClosed);
                    }
                    // unterminated last sentence
                    let line = std::mem::take(&mut self.pending);
                    return match self.decode_line(&line) {
                        Some(Ok(sample)) => Ok(Some(sample)),
                        _ => Err(Error::StreamClosed),
                    };
                },
                Ok(size) => {
                    self.pending.extend_from_slice(&chunk[..size]);
                    if self.pending.len() > MAX_PENDING && !self.pending.contains(&b'\n') {
                        warn!("position feed: dropping {} bytes of garbage", self.pending.len());
                        self.pending.clear();
                    }
                },
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(None);
                },
                Err(e) if e.kind() == ErrorKind::Interrupted => {},
                Err(e) => {
                    warn!("position feed: {}", e);
                    return Err(Error::StreamClosed);
                },
            }
        }
    }
}

/// [TcpConnector] connects to the local TCP position feed.
/// Every read is bounded by the survey tick, so the caller
/// regains control (and polls the operator) at least once per tick.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: SocketAddr,
    connect_timeout: Duration,
    read_timeout: Duration,
    decoder: GgaDecoder,
}

impl TcpConnector {
    pub fn new(
        addr: SocketAddr,
        connect_timeout: Duration,
        read_timeout: Duration,
        decoder: GgaDecoder,
    ) -> Self {
        let min = Duration::from_seconds(MIN_READ_TIMEOUT_S);
        Self {
            addr,
            decoder,
            connect_timeout,
            read_timeout: if read_timeout < min { min } else { read_timeout },
        }
    }
}

impl FeedConnector for TcpConnector {
    type Feed = NmeaFeed<TcpStream>;

    fn connect(&mut self) -> Result<Self::Feed, Error> {
        let stream = TcpStream::connect_timeout(&self.addr, std_duration(self.connect_timeout))
            .map_err(|e| Error::SocketConnect(format!("{}: {}", self.addr, e)))?;

        stream
            .set_read_timeout(Some(std_duration(self.read_timeout)))
            .map_err(|e| Error::SocketConnect(e.to_string()))?;

        info!("position feed connected to {}", self.addr);
        Ok(NmeaFeed::new(stream, self.decoder)
            .with_budget(self.read_timeout)
            .newest_only())
    }
}

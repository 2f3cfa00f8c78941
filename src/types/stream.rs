use crate::error::RillError;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A stream entry ID: milliseconds-sequence, ordered lexicographically.
/// Signed so that out-of-range input can be rejected after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct StreamId {
    pub ms: i64,
    pub seq: i64,
}

impl StreamId {
    pub const MIN: StreamId = StreamId { ms: 0, seq: 0 };
    pub const MAX: StreamId = StreamId {
        ms: i64::MAX,
        seq: i64::MAX,
    };

    pub fn new(ms: i64, seq: i64) -> Self {
        StreamId { ms, seq }
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.ms, self.seq)
    }
}

/// One record in a stream: its ID plus a flat field/value list
/// (f1, v1, f2, v2, ...) in insertion order.
#[derive(Debug, Clone)]
pub struct StreamEntry {
    pub id: StreamId,
    pub fields: Vec<Vec<u8>>,
}

/// Append-only stream. Entries are kept in a vec that stays sorted because
/// every append commits a new maximum ID first.
#[derive(Debug, Clone, Default)]
pub struct Stream {
    entries: Vec<StreamEntry>,
    last_id: StreamId,
}

impl Stream {
    pub fn new() -> Self {
        Stream {
            entries: Vec::new(),
            last_id: StreamId::MIN,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_id(&self) -> StreamId {
        self.last_id
    }

    /// Resolve an XADD ID token against this stream's last ID.
    ///
    /// `*` auto-generates from the wall clock; `<ms>-*` auto-generates the
    /// sequence; `<ms>-<seq>` is taken literally. Anything else is invalid.
    pub fn resolve_entry_id(&self, token: &str) -> Result<StreamId, RillError> {
        if token == "*" {
            let ms = now_unix_ms();
            let seq = if ms == self.last_id.ms {
                self.last_id.seq + 1
            } else {
                0
            };
            return Ok(StreamId::new(ms, seq));
        }

        let (ms_str, seq_str) = token.split_once('-').ok_or(RillError::InvalidStreamId)?;
        let ms: i64 = ms_str.parse().map_err(|_| RillError::InvalidStreamId)?;

        if seq_str == "*" {
            // ms 0 starts at seq 1 because 0-0 is reserved as the floor.
            let seq = if ms == self.last_id.ms {
                self.last_id.seq + 1
            } else if ms == 0 {
                1
            } else {
                0
            };
            return Ok(StreamId::new(ms, seq));
        }

        let seq: i64 = seq_str.parse().map_err(|_| RillError::InvalidStreamId)?;
        Ok(StreamId::new(ms, seq))
    }

    /// Validate a resolved ID against the monotonicity rules and, on success,
    /// commit it as the stream's new maximum.
    pub fn validate_and_commit_id(&mut self, id: StreamId) -> Result<(), RillError> {
        if id.ms < 0 || id.seq < 0 || id == StreamId::MIN {
            return Err(RillError::StreamIdTooSmall);
        }
        if id <= self.last_id {
            return Err(RillError::StreamIdNotMonotonic);
        }
        self.last_id = id;
        Ok(())
    }

    /// Append an entry whose ID has already been committed via
    /// `validate_and_commit_id`.
    pub fn append(&mut self, id: StreamId, fields: Vec<Vec<u8>>) {
        debug_assert!(id == self.last_id);
        self.entries.push(StreamEntry { id, fields });
    }

    /// Entries with `start <= id <= end`, in order.
    pub fn range(&self, start: StreamId, end: StreamId) -> &[StreamEntry] {
        let from = self.entries.partition_point(|e| e.id < start);
        let to = self.entries.partition_point(|e| e.id <= end);
        &self.entries[from..to]
    }

    /// Entries with `id > after`, in order.
    pub fn entries_after(&self, after: StreamId) -> &[StreamEntry] {
        let from = self.entries.partition_point(|e| e.id <= after);
        &self.entries[from..]
    }
}

/// Parse an XRANGE/XREAD bound token. `-` and `+` are the absolute extremes;
/// a bare `<ms>` defaults the sequence to 0 for a start bound and to the
/// maximum for an end bound.
pub fn parse_range_id(token: &str, is_start: bool) -> Result<StreamId, RillError> {
    match token {
        "-" => return Ok(StreamId::MIN),
        "+" => return Ok(StreamId::MAX),
        _ => {}
    }

    match token.split_once('-') {
        Some((ms_str, seq_str)) => {
            let ms = ms_str.parse().map_err(|_| RillError::InvalidStreamId)?;
            let seq = seq_str.parse().map_err(|_| RillError::InvalidStreamId)?;
            Ok(StreamId::new(ms, seq))
        }
        None => {
            let ms = token.parse().map_err(|_| RillError::InvalidStreamId)?;
            let seq = if is_start { 0 } else { i64::MAX };
            Ok(StreamId::new(ms, seq))
        }
    }
}

fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_millis() as i64
}

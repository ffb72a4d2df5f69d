use rand::Rng;
use serde::Serialize;
use std::io::{self, Read, Write};
use thiserror::Error;

use crate::consts::MIN_MATE_SCORE;

/// Longest board string a record can carry (length is a single byte).
pub const MAX_BOARD_LEN: usize = u8::MAX as usize;
/// Bytes after the board string: i16 score + i8 outcome.
pub const RECORD_TAIL: usize = 3;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("board string is {len} bytes, at most 255 fit in a record")]
    TooLarge { len: usize },
    #[error("outcome {outcome} is not one of -1, 0, 1")]
    InvalidOutcome { outcome: i8 },
    #[error("record {index} truncated: needed {needed} more bytes, got {got}")]
    Truncated { index: u64, needed: usize, got: usize },
    #[error("record {index} board string is not valid UTF-8")]
    InvalidBoard { index: u64 },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// One labeled position: board string, centipawn score, outcome for the side to move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingRecord {
    pub board: String,
    pub score: i16,
    pub outcome: i8,
}

impl TrainingRecord {
    pub fn new(board: impl Into<String>, score: i16, outcome: i8) -> Self {
        Self { board: board.into(), score, outcome }
    }

    pub fn encoded_len(&self) -> usize { 1 + self.board.len() + RECORD_TAIL }

    pub fn encode_into(&self, out: &mut Vec<u8>) -> Result<(), RecordError> {
        encode_into(out, &self.board, self.score, self.outcome)
    }
}

pub fn encode(board: &str, score: i16, outcome: i8) -> Result<Vec<u8>, RecordError> {
    let mut out = Vec::with_capacity(1 + board.len() + RECORD_TAIL);
    encode_into(&mut out, board, score, outcome)?;
    Ok(out)
}

/// Appends `[len:u8][board][score:i16 LE][outcome:i8]`. Nothing is written on error.
pub fn encode_into(out: &mut Vec<u8>, board: &str, score: i16, outcome: i8) -> Result<(), RecordError> {
    let len = board.len();
    if len > MAX_BOARD_LEN { return Err(RecordError::TooLarge { len }); }
    if !(-1..=1).contains(&outcome) { return Err(RecordError::InvalidOutcome { outcome }); }
    out.push(len as u8);
    out.extend_from_slice(board.as_bytes());
    out.extend_from_slice(&score.to_le_bytes());
    out.push(outcome as u8);
    Ok(())
}

/// Sequential reader over a record stream. End of stream is end of input at a
/// record boundary; a zero-length board is an ordinary record.
pub struct RecordReader<R> {
    inner: R,
    index: u64,
    failed: bool,
    scratch: Vec<u8>,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self { Self { inner, index: 0, failed: false, scratch: Vec::with_capacity(MAX_BOARD_LEN + RECORD_TAIL) } }

    /// Records consumed so far, skipped ones included.
    pub fn position(&self) -> u64 { self.index }

    pub fn into_inner(self) -> R { self.inner }

    pub fn next_record(&mut self) -> Result<Option<TrainingRecord>, RecordError> {
        if !self.fill_next()? { return Ok(None); }
        let len = self.scratch.len() - RECORD_TAIL;
        let board = std::str::from_utf8(&self.scratch[..len])
            .map_err(|_| RecordError::InvalidBoard { index: self.index })?
            .to_owned();
        let score = i16::from_le_bytes([self.scratch[len], self.scratch[len + 1]]);
        let outcome = self.scratch[len + 2] as i8;
        self.index += 1;
        Ok(Some(TrainingRecord { board, score, outcome }))
    }

    /// Advances past one record without decoding it. `Ok(false)` at end of stream.
    pub fn skip_record(&mut self) -> Result<bool, RecordError> {
        if !self.fill_next()? { return Ok(false); }
        self.index += 1;
        Ok(true)
    }

    /// Thins the stream: with probability `skip_prob` one record is dropped
    /// before the next one is returned.
    pub fn sampled<G: Rng>(self, skip_prob: f64, rng: G) -> Sampled<R, G> {
        Sampled { reader: self, skip_prob: skip_prob.clamp(0.0, 1.0), rng }
    }

    // Loads board + tail of the next record into `scratch`.
    fn fill_next(&mut self) -> Result<bool, RecordError> {
        let mut len = [0u8; 1];
        if read_full(&mut self.inner, &mut len)? == 0 { return Ok(false); }
        let needed = len[0] as usize + RECORD_TAIL;
        self.scratch.resize(needed, 0);
        let got = read_full(&mut self.inner, &mut self.scratch)?;
        if got < needed {
            return Err(RecordError::Truncated { index: self.index, needed, got });
        }
        Ok(true)
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<TrainingRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed { return None; }
        match self.next_record() {
            Ok(Some(r)) => Some(Ok(r)),
            Ok(None) => None,
            Err(e) => { self.failed = true; Some(Err(e)) }
        }
    }
}

/// Reads one record from `r`; `Ok(None)` when `r` is exhausted at a record boundary.
pub fn decode<R: Read>(r: &mut R) -> Result<Option<TrainingRecord>, RecordError> {
    RecordReader::new(r).next_record()
}

// Like read_exact, but reports how much was read instead of failing on EOF.
fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut off = 0usize;
    while off < buf.len() {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(k) => off += k,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(off)
}

pub struct Sampled<R, G> {
    reader: RecordReader<R>,
    skip_prob: f64,
    rng: G,
}

impl<R: Read, G: Rng> Iterator for Sampled<R, G> {
    type Item = Result<TrainingRecord, RecordError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.skip_prob > 0.0 && self.rng.gen_bool(self.skip_prob) {
            match self.reader.skip_record() {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => { self.reader.failed = true; return Some(Err(e)); }
            }
        }
        self.reader.next()
    }
}

/// Streaming writer; counts what it wrote.
pub struct RecordWriter<W: Write> {
    inner: W,
    records: u64,
    bytes: u64,
    scratch: Vec<u8>,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(inner: W) -> Self { Self { inner, records: 0, bytes: 0, scratch: Vec::with_capacity(MAX_BOARD_LEN + 4) } }

    pub fn write(&mut self, board: &str, score: i16, outcome: i8) -> Result<(), RecordError> {
        self.scratch.clear();
        encode_into(&mut self.scratch, board, score, outcome)?;
        self.inner.write_all(&self.scratch)?;
        self.records += 1;
        self.bytes += self.scratch.len() as u64;
        Ok(())
    }

    pub fn write_record(&mut self, r: &TrainingRecord) -> Result<(), RecordError> { self.write(&r.board, r.score, r.outcome) }

    pub fn records(&self) -> u64 { self.records }
    pub fn bytes(&self) -> u64 { self.bytes }

    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

/// Aggregate view of a record stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StreamSummary {
    pub records: u64,
    pub wins: u64,
    pub draws: u64,
    pub losses: u64,
    pub bad_outcomes: u64,
    pub mate_scores: u64,
    pub empty_boards: u64,
    pub min_score: Option<i16>,
    pub max_score: Option<i16>,
    pub mean_score: f64,
    pub max_board_len: usize,
}

impl StreamSummary {
    pub fn add(&mut self, r: &TrainingRecord) {
        self.records += 1;
        match r.outcome {
            1 => self.wins += 1,
            0 => self.draws += 1,
            -1 => self.losses += 1,
            _ => self.bad_outcomes += 1,
        }
        if (r.score as i32).abs() >= MIN_MATE_SCORE { self.mate_scores += 1; }
        if r.board.is_empty() { self.empty_boards += 1; }
        self.min_score = Some(self.min_score.map_or(r.score, |m| m.min(r.score)));
        self.max_score = Some(self.max_score.map_or(r.score, |m| m.max(r.score)));
        self.mean_score += (r.score as f64 - self.mean_score) / self.records as f64;
        self.max_board_len = self.max_board_len.max(r.board.len());
    }
}

pub fn summarize<R: Read>(reader: RecordReader<R>) -> Result<StreamSummary, RecordError> {
    let mut s = StreamSummary::default();
    for rec in reader { s.add(&rec?); }
    Ok(s)
}

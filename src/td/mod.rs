//! Training data: the append-only labeled-position stream (`.td`).
pub mod record;

pub use record::{
    decode, encode, encode_into, summarize, RecordError, RecordReader, RecordWriter, StreamSummary, TrainingRecord,
    MAX_BOARD_LEN,
};

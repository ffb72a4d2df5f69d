//! PGN game logs to training records.
pub mod annotation;
pub mod reader;
pub mod transcoder;

pub use annotation::{parse_annotation, AnnotationError, Score, ScoreBand};
pub use reader::{read_games, PgnGame, PgnMove, PgnReader};
pub use transcoder::{TranscodeConfig, TranscodeStats, Transcoder};

use std::io::{self, BufRead, Write};
use std::path::Path;

use cozy_chess::Color;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::annotation::{annotation_token, parse_annotation, AnnotationError, ScoreBand};
use super::reader::{PgnGame, PgnReader};
use crate::board::cozy::Position;
use crate::consts::{MATE_SCORE, MAX_EVAL_SCORE, MIN_MATE_SCORE};
use crate::td::{encode_into, RecordError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    pub max_eval_score: i32,
    pub min_mate_score: i32,
    pub mate_score: i32,
    /// Treat a move without an evaluation as an invalid score instead of skipping it.
    pub strict_annotations: bool,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self { max_eval_score: MAX_EVAL_SCORE, min_mate_score: MIN_MATE_SCORE, mate_score: MATE_SCORE, strict_annotations: false }
    }
}

impl TranscodeConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("read transcode config: {}", path.as_ref().display()))?;
        let cfg: Self = serde_json::from_str(&s).context("parse transcode config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_eval_score < 0 { anyhow::bail!("max_eval_score must be non-negative, got {}", self.max_eval_score); }
        if self.max_eval_score >= self.min_mate_score {
            anyhow::bail!("max_eval_score ({}) must be below min_mate_score ({})", self.max_eval_score, self.min_mate_score);
        }
        if self.min_mate_score > self.mate_score { anyhow::bail!("min_mate_score exceeds mate_score"); }
        if self.mate_score > i16::MAX as i32 { anyhow::bail!("mate_score {} does not fit a record score", self.mate_score); }
        Ok(())
    }

    pub fn band(&self) -> ScoreBand {
        ScoreBand { max_eval_score: self.max_eval_score, min_mate_score: self.min_mate_score, mate_score: self.mate_score }
    }
}

/// Counters for one transcoding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TranscodeStats {
    pub games: u64,
    pub positions: u64,
    pub skipped_unannotated: u64,
    pub invalid_scores: u64,
    pub malformed_games: u64,
    pub oversized_records: u64,
}

impl TranscodeStats {
    pub fn merge(&mut self, o: &TranscodeStats) {
        self.games += o.games;
        self.positions += o.positions;
        self.skipped_unannotated += o.skipped_unannotated;
        self.invalid_scores += o.invalid_scores;
        self.malformed_games += o.malformed_games;
        self.oversized_records += o.oversized_records;
    }

    pub fn accepted_games(&self) -> u64 { self.games - self.invalid_scores - self.malformed_games }

    pub fn log(&self) {
        log::info!(
            "games={} accepted={} positions={} unannotated={} malformed={} oversized={}",
            self.games, self.accepted_games(), self.positions, self.skipped_unannotated, self.malformed_games, self.oversized_records
        );
        if self.invalid_scores > 0 {
            log::warn!("number of invalid scores: {}", self.invalid_scores);
        }
    }
}

// Why a game was dropped.
#[derive(Debug)]
enum Rejection {
    InvalidScore(AnnotationError),
    Malformed(String),
}

/// Scanning -> WalkingMoves -> (Scanning | Rejected), one game at a time.
/// Records go to a single growing buffer; a rejected game is cut back to
/// the offset it started at.
pub struct Transcoder {
    config: TranscodeConfig,
    out: Vec<u8>,
    stats: TranscodeStats,
}

impl Transcoder {
    pub fn new(config: TranscodeConfig) -> Self { Self { config, out: Vec::new(), stats: TranscodeStats::default() } }

    pub fn config(&self) -> &TranscodeConfig { &self.config }
    pub fn stats(&self) -> &TranscodeStats { &self.stats }
    pub fn output(&self) -> &[u8] { &self.out }

    pub fn push_game(&mut self, game: &PgnGame) {
        transcode_game(&self.config, game, &mut self.out, &mut self.stats);
    }

    /// Sequential pass over a PGN stream.
    pub fn transcode<R: BufRead>(&mut self, reader: PgnReader<R>) -> io::Result<()> {
        for game in reader {
            self.push_game(&game?);
        }
        Ok(())
    }

    /// Games are transcoded in parallel and appended in input order, so the
    /// output is byte-identical to pushing them one by one.
    pub fn transcode_parallel(&mut self, games: &[PgnGame]) {
        let cfg = self.config;
        let parts: Vec<(Vec<u8>, TranscodeStats)> = games
            .par_iter()
            .map(|g| {
                let mut out = Vec::new();
                let mut st = TranscodeStats::default();
                transcode_game(&cfg, g, &mut out, &mut st);
                (out, st)
            })
            .collect();
        for (bytes, st) in parts {
            self.out.extend_from_slice(&bytes);
            self.stats.merge(&st);
        }
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.out)?;
        w.flush()
    }

    pub fn finish(self) -> (Vec<u8>, TranscodeStats) { (self.out, self.stats) }
}

fn transcode_game(cfg: &TranscodeConfig, game: &PgnGame, out: &mut Vec<u8>, stats: &mut TranscodeStats) {
    stats.games += 1;
    let start = out.len();
    let mut local = TranscodeStats::default();
    match walk_moves(cfg, game, out, &mut local) {
        Ok(()) => {
            stats.positions += local.positions;
            stats.skipped_unannotated += local.skipped_unannotated;
            stats.oversized_records += local.oversized_records;
        }
        Err(r) => {
            out.truncate(start);
            match r {
                Rejection::InvalidScore(e) => {
                    log::debug!("game {}: {}", stats.games, e);
                    stats.invalid_scores += 1;
                }
                Rejection::Malformed(why) => {
                    log::debug!("game {}: malformed: {}", stats.games, why);
                    stats.malformed_games += 1;
                }
            }
        }
    }
}

fn walk_moves(cfg: &TranscodeConfig, game: &PgnGame, out: &mut Vec<u8>, tally: &mut TranscodeStats) -> Result<(), Rejection> {
    let result_tag = game.header("Result").or(game.termination.as_deref());
    let result: i8 = match result_tag {
        Some("1-0") => 1,
        Some("0-1") => -1,
        Some("1/2-1/2") => 0,
        other => return Err(Rejection::Malformed(format!("unknown result {:?}", other))),
    };
    let mut pos = match game.header("FEN") {
        Some(fen) => Position::from_fen(fen).map_err(|e| Rejection::Malformed(e.to_string()))?,
        None => Position::startpos(),
    };
    let band = cfg.band();

    for mv in &game.moves {
        let token = mv.comment.as_deref().map(annotation_token).unwrap_or("");
        if token.is_empty() || token.eq_ignore_ascii_case("book") {
            if cfg.strict_annotations {
                return Err(Rejection::InvalidScore(AnnotationError::Unparsable(token.to_string())));
            }
            tally.skipped_unannotated += 1;
        } else {
            let score = parse_annotation(token).and_then(|s| band.check(s)).map_err(Rejection::InvalidScore)?;
            let outcome = if pos.side_to_move() == Color::White { result } else { -result };
            match encode_into(out, &pos.fen(), score, outcome) {
                Ok(()) => tally.positions += 1,
                Err(RecordError::TooLarge { len }) => {
                    log::debug!("skipping {} byte board string", len);
                    tally.oversized_records += 1;
                }
                Err(e) => return Err(Rejection::Malformed(e.to_string())),
            }
        }
        pos.make_move_san(&mv.san).map_err(|e| Rejection::Malformed(e.to_string()))?;
    }
    Ok(())
}

//! Engine evaluations carried in move comments, e.g. `{+0.31/18 0.52s}` or `{-M4/30}`.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{MATE_SCORE, MAX_EVAL_SCORE, MIN_MATE_SCORE};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("unparsable annotation {0:?}")]
    Unparsable(String),
    #[error("score {score} outside the accepted band")]
    OutOfBand { score: i64 },
}

/// A parsed evaluation, already mapped to score units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i64),
    /// `±(MATE_SCORE - n)` for a mate in `n` plies.
    Mate(i64),
}

impl Score {
    pub fn value(self) -> i64 {
        match self { Score::Centipawns(v) | Score::Mate(v) => v }
    }
}

/// Text of the comment before its first `/`, trimmed.
pub fn annotation_token(comment: &str) -> &str {
    comment.split('/').next().unwrap_or("").trim()
}

/// Parses `±<int>[.<frac>]`, unsigned zero, or `±M<n>`.
pub fn parse_annotation(comment: &str) -> Result<Score, AnnotationError> {
    let tok = annotation_token(comment);
    let bad = || AnnotationError::Unparsable(tok.to_string());
    let (negative, signed, body) = match tok.as_bytes().first() {
        Some(b'+') => (false, true, &tok[1..]),
        Some(b'-') => (true, true, &tok[1..]),
        Some(_) => (false, false, tok),
        None => return Err(bad()),
    };
    let sign = if negative { -1 } else { 1 };

    if let Some(n) = body.strip_prefix('M') {
        if !signed || n.is_empty() || !n.bytes().all(|b| b.is_ascii_digit()) { return Err(bad()); }
        let n: i64 = n.parse().map_err(|_| AnnotationError::OutOfBand { score: i64::MIN })?;
        let magnitude = MATE_SCORE as i64 - n;
        if magnitude < 0 { return Err(AnnotationError::OutOfBand { score: sign * magnitude }); }
        return Ok(Score::Mate(sign * magnitude));
    }

    let cp = parse_centipawns(body).ok_or_else(bad)?;
    if !signed && cp != 0 { return Err(bad()); }
    Ok(Score::Centipawns(sign * cp))
}

// "12.34" -> 1234 exactly; a third fraction digit rounds half away from zero.
fn parse_centipawns(s: &str) -> Option<i64> {
    let (int, frac) = s.split_once('.').unwrap_or((s, ""));
    if int.is_empty() || !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) { return None; }
    let f = frac.as_bytes();
    let digit = |i: usize| f.get(i).map_or(0, |b| (b - b'0') as i64);
    let mut cp = int.parse::<i64>().ok()?.checked_mul(100)?;
    cp = cp.checked_add(digit(0) * 10 + digit(1))?;
    if digit(2) >= 5 { cp = cp.checked_add(1)?; }
    Some(cp)
}

/// Accepted score ranges. Centipawn scores live in `[-max_eval, max_eval]`,
/// mate scores in `min_mate..=mate` by magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreBand {
    pub max_eval_score: i32,
    pub min_mate_score: i32,
    pub mate_score: i32,
}

impl Default for ScoreBand {
    fn default() -> Self {
        Self { max_eval_score: MAX_EVAL_SCORE, min_mate_score: MIN_MATE_SCORE, mate_score: MATE_SCORE }
    }
}

impl ScoreBand {
    pub fn check(&self, score: Score) -> Result<i16, AnnotationError> {
        let v = score.value();
        let ok = match score {
            Score::Centipawns(_) => v.abs() <= self.max_eval_score as i64,
            Score::Mate(_) => (self.min_mate_score as i64..=self.mate_score as i64).contains(&v.abs()),
        };
        if !ok { return Err(AnnotationError::OutOfBand { score: v }); }
        i16::try_from(v).map_err(|_| AnnotationError::OutOfBand { score: v })
    }
}

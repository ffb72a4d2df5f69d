//! Network shapes and score constants shared by the codec, the trainer and the engine.
//! Changing any of these is a format change that must be coordinated with the engine.

#[inline]
pub const fn ceil_to_multiple(n: usize, r: usize) -> usize { (n + r - 1) / r * r }

pub const PIECE_INPUT_SIZE: usize = 41916;
pub const CASTLING_SIZE: usize = 4;
pub const EN_PASSANT_SIZE: usize = 8;
pub const MISC_INPUT_SIZE: usize = 64 * (CASTLING_SIZE + EN_PASSANT_SIZE);
pub const NUM_FEATURES: usize = PIECE_INPUT_SIZE + MISC_INPUT_SIZE; // 42684
pub const INPUT_HSIZE: usize = ceil_to_multiple(NUM_FEATURES, 16); // 42688

pub const ACCUMULATOR_HSIZE: usize = 256;
pub const ACCUMULATOR_SIZE: usize = 2 * ACCUMULATOR_HSIZE;
pub const HIDDEN_1_SIZE: usize = 32;
pub const HIDDEN_2_SIZE: usize = 32;
pub const OUTPUT_SIZE: usize = 1;
pub const MAX_ACTIVE_FEATURES: usize = 37;

/// Network output (float domain) to centipawns.
pub const OUTPUT_SCALE: f32 = 301.0;
/// Centipawns to win/draw/loss space.
pub const WDL_SCALE: f32 = 360.0;

pub const MATE_SCORE: i32 = 32000;
pub const MAX_EVAL_SCORE: i32 = 30000;
/// Longest mate distance accepted from annotations.
pub const MAX_MATE_PLY: i32 = 1000;
pub const MIN_MATE_SCORE: i32 = MATE_SCORE - MAX_MATE_PLY;

#[inline]
pub fn score_to_wdl(cp: f32) -> f32 { 1.0 / (1.0 + (-cp / WDL_SCALE).exp()) }

/// Maps an outcome in {-1, 0, 1} to the WDL target {0, 0.5, 1}.
#[inline]
pub fn outcome_to_wdl(outcome: i8) -> f32 { (outcome as f32 + 1.0) / 2.0 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padded_input_size() {
        assert_eq!(NUM_FEATURES, 42684);
        assert_eq!(INPUT_HSIZE, 42688);
        assert_eq!(INPUT_HSIZE % 16, 0);
    }

    #[test]
    fn wdl_helpers() {
        assert!((score_to_wdl(0.0) - 0.5).abs() < 1e-6);
        assert!(score_to_wdl(400.0) > 0.7);
        assert_eq!(outcome_to_wdl(-1), 0.0);
        assert_eq!(outcome_to_wdl(0), 0.5);
        assert_eq!(outcome_to_wdl(1), 1.0);
    }
}

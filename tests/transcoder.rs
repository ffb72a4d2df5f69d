use evalnet::pgn::{read_games, PgnReader, TranscodeConfig, TranscodeStats, Transcoder};
use evalnet::td::RecordReader;
use pretty_assertions::assert_eq;

const GAMES: &str = r#"[Event "accepted"]
[Result "1-0"]

1. e4 {+0.30/10 0.1s} e5 {-0.25/10 0.1s} 2. Nf3 {book} Nc6 3. Bb5 {+0.40/12} 1-0

[Event "bad score"]
[Result "0-1"]

1. d4 {+0.10/5} d5 {+350.00/5} 2. c4 {garbage/5} 0-1

[Event "illegal move"]
[Result "1/2-1/2"]

1. e4 {+0.1/1} e4 {+0.1/1} 1/2-1/2

[Event "from fen"]
[Result "1/2-1/2"]
[FEN "4k3/8/8/8/8/8/4P3/4K3 b - - 0 1"]

1... Kd7 {-0.50/3} 2. e4 {+M5/3} 1/2-1/2
"#;

fn run(pgn: &str, cfg: TranscodeConfig) -> Transcoder {
    let mut tr = Transcoder::new(cfg);
    tr.transcode(PgnReader::new(pgn.as_bytes())).unwrap();
    tr
}

#[test]
fn accepted_games_and_rejections() {
    let tr = run(GAMES, TranscodeConfig::default());
    assert_eq!(
        *tr.stats(),
        TranscodeStats { games: 4, positions: 5, skipped_unannotated: 2, invalid_scores: 1, malformed_games: 1, oversized_records: 0 }
    );
    let recs: Vec<_> = RecordReader::new(tr.output()).collect::<Result<_, _>>().unwrap();
    let labels: Vec<(i16, i8)> = recs.iter().map(|r| (r.score, r.outcome)).collect();
    assert_eq!(labels, vec![(30, 1), (-25, -1), (40, 1), (-50, 0), (31995, 0)]);

    assert_eq!(recs[0].board, "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    // no en-passant square after 1. e4: nothing can capture on e3
    assert_eq!(recs[1].board, "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
    assert_eq!(recs[3].board, "4k3/8/8/8/8/8/4P3/4K3 b - - 0 1");
    assert_eq!(recs[4].board, "8/3k4/8/8/8/8/4P3/4K3 w - - 1 2");
}

#[test]
fn rejected_game_leaves_no_bytes() {
    let bad = GAMES.split("[Event \"bad score\"]").nth(1).map(|g| format!("[Event \"bad score\"]{}", g)).unwrap();
    let only_bad: String = bad.split("[Event \"illegal move\"]").next().unwrap().to_string();
    let tr = run(&only_bad, TranscodeConfig::default());
    assert_eq!(tr.stats().invalid_scores, 1);
    assert_eq!(tr.stats().games, 1);
    assert!(tr.output().is_empty());
}

#[test]
fn strict_mode_rejects_unannotated_moves() {
    let cfg = TranscodeConfig { strict_annotations: true, ..TranscodeConfig::default() };
    let tr = run(GAMES, cfg);
    assert_eq!(tr.stats().invalid_scores, 2);
    assert_eq!(tr.stats().positions, 2);
}

#[test]
fn unknown_result_is_malformed() {
    let tr = run("[Result \"*\"]\n\n1. e4 {+0.1/1} *\n", TranscodeConfig::default());
    assert_eq!(tr.stats().malformed_games, 1);
    assert!(tr.output().is_empty());
}

#[test]
fn parallel_matches_sequential() {
    let big = GAMES.repeat(25);
    let seq = run(&big, TranscodeConfig::default());

    let games = read_games(big.as_bytes()).unwrap();
    assert_eq!(games.len(), 100);
    let mut par = Transcoder::new(TranscodeConfig::default());
    par.transcode_parallel(&games);

    assert_eq!(par.stats(), seq.stats());
    assert!(par.output() == seq.output());
}

#[test]
fn narrower_band_from_config_file() {
    let path = "target/transcode_config.json";
    std::fs::write(path, r#"{ "max_eval_score": 45 }"#).unwrap();
    let cfg = TranscodeConfig::load(path).unwrap();
    let tr = run(GAMES, cfg);
    // Kd7 at -0.50 now rejects the last game
    assert_eq!(tr.stats().invalid_scores, 2);
    assert_eq!(tr.stats().positions, 3);

    std::fs::write(path, r#"{ "max_eval_score": 31500 }"#).unwrap();
    assert!(TranscodeConfig::load(path).is_err());
}

#[test]
fn written_file_is_readable() {
    let tr = run(GAMES, TranscodeConfig::default());
    let path = "target/transcoder_test.td";
    let mut f = std::fs::File::create(path).unwrap();
    tr.write_to(&mut f).unwrap();
    drop(f);
    let bytes = std::fs::read(path).unwrap();
    assert_eq!(bytes.as_slice(), tr.output());
    assert_eq!(RecordReader::new(bytes.as_slice()).count(), 5);
}

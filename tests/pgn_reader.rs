use evalnet::pgn::{PgnMove, PgnReader};
use pretty_assertions::assert_eq;

const PGN: &str = "[Event \"x\"]\n[Result \"1-0\"]\n\n\
1. e4 {+0.30/10\nmulti line} (1. d4 {+9.99/1} d5 (1... Nf6)) 1... e5 $1 {-0.2/9} ; rest of line\n\
2. Qh5?! {+0.1/9} {second} 1-0\n\
\n[Event \"y\"]\n[Result \"*\"]\n\n3...Nc6 *\n";

fn mv(san: &str, comment: Option<&str>) -> PgnMove {
    PgnMove { san: san.to_string(), comment: comment.map(str::to_string) }
}

#[test]
fn mainline_and_comments() {
    let mut r = PgnReader::new(PGN.as_bytes());
    let g = r.next_game().unwrap().unwrap();
    assert_eq!(g.header("Event"), Some("x"));
    assert_eq!(g.header("Result"), Some("1-0"));
    assert_eq!(g.termination.as_deref(), Some("1-0"));
    assert_eq!(
        g.moves,
        vec![mv("e4", Some("+0.30/10\nmulti line")), mv("e5", Some("-0.2/9")), mv("Qh5?!", Some("+0.1/9"))]
    );

    let g = r.next_game().unwrap().unwrap();
    assert_eq!(g.header("Event"), Some("y"));
    assert_eq!(g.moves, vec![mv("Nc6", None)]);
    assert_eq!(g.termination.as_deref(), Some("*"));

    assert!(r.next_game().unwrap().is_none());
    assert_eq!(r.games_read(), 2);
}

#[test]
fn castling_with_zeros_is_a_move() {
    let games: Vec<_> = PgnReader::new("[Result \"0-1\"]\n1. 0-0 O-O-O 0-1\n".as_bytes()).collect::<Result<_, _>>().unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].moves.iter().map(|m| m.san.as_str()).collect::<Vec<_>>(), vec!["0-0", "O-O-O"]);
}

use evalnet::board::{MoveError, Position};

#[test]
fn castling_both_sides() {
    let mut p = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    p.make_move_san("O-O").unwrap();
    assert!(p.fen().starts_with("r3k2r/8/8/8/8/8/8/R4RK1 b kq"));
    p.make_move_san("O-O-O+").unwrap();
    assert!(p.fen().starts_with("2kr3r/8/8/8/8/8/8/R4RK1 w"));
}

#[test]
fn promotion_and_underpromotion() {
    let p = Position::from_fen("8/4P1k1/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let mut q = p.clone();
    q.make_move_san("e8=Q").unwrap();
    assert!(q.fen().starts_with("4Q3/6k1"));
    let mut n = p.clone();
    n.make_move_san("e8N+").unwrap();
    assert!(n.fen().starts_with("4N3/6k1"));
    assert!(matches!(p.parse_san("e8"), Err(MoveError::Illegal(_))));
}

#[test]
fn disambiguation() {
    // knights on b1 and f1 can both reach d2; rooks on a1 and a5 both reach a3
    let p = Position::from_fen("4k3/8/8/R7/8/8/8/RN2KN2 w - - 0 1").unwrap();
    assert!(matches!(p.parse_san("Nd2"), Err(MoveError::Ambiguous(_))));
    assert_eq!(p.parse_san("Nbd2").unwrap().to_string(), "b1d2");
    assert_eq!(p.parse_san("Nfd2").unwrap().to_string(), "f1d2");
    assert!(matches!(p.parse_san("Ra3"), Err(MoveError::Ambiguous(_))));
    assert_eq!(p.parse_san("R1a3").unwrap().to_string(), "a1a3");
    assert_eq!(p.parse_san("R5a3").unwrap().to_string(), "a5a3");
}

#[test]
fn en_passant_capture() {
    let mut p = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
    p.make_move_san("exd6").unwrap();
    assert!(p.fen().starts_with("4k3/8/3P4/8/8/8/8/4K3 b"));
}

#[test]
fn bad_fen() {
    assert!(matches!(Position::from_fen("not a fen"), Err(MoveError::Fen(_))));
}

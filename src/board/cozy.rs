use cozy_chess::{Board as CozyBoard, Color, File, Move, Piece, Rank, Square};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    #[error("FEN error: {0}")]
    Fen(String),
    #[error("malformed move: {0}")]
    Malformed(String),
    #[error("illegal move: {0}")]
    Illegal(String),
    #[error("ambiguous move: {0}")]
    Ambiguous(String),
}

#[derive(Clone, Debug)]
pub struct Position {
    board: CozyBoard,
}

impl Position {
    pub fn startpos() -> Self {
        Self { board: CozyBoard::default() }
    }

    pub fn from_fen(fen: &str) -> Result<Self, MoveError> {
        CozyBoard::from_fen(fen.trim(), false).map(|b| Self { board: b }).map_err(|e| MoveError::Fen(format!("{e:?}")))
    }

    pub fn board(&self) -> &CozyBoard { &self.board }

    /// FEN of the position. The en-passant square is written only when an
    /// en-passant capture is legal, so a plain double push leaves `-`.
    pub fn fen(&self) -> String {
        let fen = format!("{}", self.board);
        if self.board.en_passant().is_none() || self.has_ep_capture() { return fen; }
        fen.split(' ').enumerate().map(|(i, f)| if i == 3 { "-" } else { f }).collect::<Vec<_>>().join(" ")
    }

    fn has_ep_capture(&self) -> bool {
        let Some(file) = self.board.en_passant() else { return false };
        let rank = if self.board.side_to_move() == Color::White { Rank::Sixth } else { Rank::Third };
        let target = Square::new(file, rank);
        let mut found = false;
        self.board.generate_moves(|moves| {
            let piece = moves.piece;
            if piece != Piece::Pawn { return false; }
            found = moves.into_iter().any(|m| m.to == target);
            found
        });
        found
    }

    pub fn side_to_move(&self) -> Color { self.board.side_to_move() }

    /// Plays a move written in standard algebraic notation.
    pub fn make_move_san(&mut self, san: &str) -> Result<Move, MoveError> {
        let m = self.parse_san(san)?;
        self.board.play(m);
        Ok(m)
    }

    /// Resolves SAN against the legal moves of the current position.
    pub fn parse_san(&self, san: &str) -> Result<Move, MoveError> {
        let text = san.trim_end_matches(|c| matches!(c, '+' | '#' | '!' | '?'));
        let pat = SanPattern::parse(text).ok_or_else(|| MoveError::Malformed(san.to_string()))?;

        let stm = self.board.side_to_move();
        let own = self.board.colors(stm);
        let mut hits: Vec<Move> = Vec::with_capacity(2);
        self.board.generate_moves(|moves| {
            let piece = moves.piece;
            if piece != pat.piece() { return false; }
            for m in moves {
                // cozy-chess encodes castling as the king capturing its own rook
                let is_castle = piece == Piece::King && own.has(m.to);
                let ok = match pat {
                    SanPattern::Castle { long } => is_castle && (((m.to.file() as usize) < (m.from.file() as usize)) == long),
                    SanPattern::Normal { to, from_file, from_rank, promotion, .. } => {
                        !is_castle
                            && m.to == to
                            && m.promotion == promotion
                            && from_file.map_or(true, |f| m.from.file() == f)
                            && from_rank.map_or(true, |r| m.from.rank() == r)
                    }
                };
                if ok { hits.push(m); }
            }
            false
        });
        match hits.len() {
            1 => Ok(hits[0]),
            0 => Err(MoveError::Illegal(san.to_string())),
            _ => Err(MoveError::Ambiguous(san.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum SanPattern {
    Castle { long: bool },
    Normal { piece: Piece, to: Square, from_file: Option<File>, from_rank: Option<Rank>, promotion: Option<Piece> },
}

impl SanPattern {
    fn piece(&self) -> Piece {
        match self {
            SanPattern::Castle { .. } => Piece::King,
            SanPattern::Normal { piece, .. } => *piece,
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text {
            "O-O" | "0-0" => return Some(SanPattern::Castle { long: false }),
            "O-O-O" | "0-0-0" => return Some(SanPattern::Castle { long: true }),
            _ => {}
        }
        let b = text.as_bytes();
        if !b.is_ascii() || b.len() < 2 { return None; }

        let (piece, mut body) = match piece_from_char(b[0] as char) {
            Some(p) if b[0].is_ascii_uppercase() => (p, &b[1..]),
            _ => (Piece::Pawn, b),
        };

        let mut promotion = None;
        if let Some(&last) = body.last() {
            if let Some(p) = piece_from_char(last as char).filter(|_| last.is_ascii_uppercase()) {
                promotion = Some(p);
                body = &body[..body.len() - 1];
                if body.last() == Some(&b'=') { body = &body[..body.len() - 1]; }
            }
        }
        if body.len() < 2 { return None; }
        let to = square(body[body.len() - 2], body[body.len() - 1])?;

        let mut from_file = None;
        let mut from_rank = None;
        for &c in &body[..body.len() - 2] {
            match c {
                b'a'..=b'h' => from_file = Some(File::index((c - b'a') as usize)),
                b'1'..=b'8' => from_rank = Some(Rank::index((c - b'1') as usize)),
                b'x' | b':' => {}
                _ => return None,
            }
        }
        if promotion.is_some() && piece != Piece::Pawn { return None; }
        Some(SanPattern::Normal { piece, to, from_file, from_rank, promotion })
    }
}

fn piece_from_char(c: char) -> Option<Piece> {
    match c.to_ascii_uppercase() {
        'N' => Some(Piece::Knight),
        'B' => Some(Piece::Bishop),
        'R' => Some(Piece::Rook),
        'Q' => Some(Piece::Queen),
        'K' => Some(Piece::King),
        _ => None,
    }
}

fn square(file: u8, rank: u8) -> Option<Square> {
    if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(&rank) { return None; }
    Some(Square::new(File::index((file - b'a') as usize), Rank::index((rank - b'1') as usize)))
}

use std::io::{self, BufRead};

/// One mainline move and the first comment that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgnMove {
    pub san: String,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PgnGame {
    pub headers: Vec<(String, String)>,
    pub moves: Vec<PgnMove>,
    /// Termination marker from the movetext (`1-0`, `0-1`, `1/2-1/2`, `*`).
    pub termination: Option<String>,
}

impl PgnGame {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    fn is_empty(&self) -> bool { self.headers.is_empty() && self.moves.is_empty() && self.termination.is_none() }
}

/// Streams games out of a PGN file. Only the mainline is kept; variations,
/// NAGs, move numbers and `;` comments are dropped.
pub struct PgnReader<R> {
    inner: R,
    buf: Vec<u8>,
    pending: Option<String>,
    game: PgnGame,
    in_movetext: bool,
    in_comment: bool,
    comment: String,
    depth: usize,
    terminated: bool,
    games: u64,
    lines: u64,
}

impl<R: BufRead> PgnReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(256),
            pending: None,
            game: PgnGame::default(),
            in_movetext: false,
            in_comment: false,
            comment: String::new(),
            depth: 0,
            terminated: false,
            games: 0,
            lines: 0,
        }
    }

    pub fn games_read(&self) -> u64 { self.games }

    pub fn next_game(&mut self) -> io::Result<Option<PgnGame>> {
        if let Some(line) = self.pending.take() {
            self.feed(&line);
        }
        loop {
            self.buf.clear();
            if self.inner.read_until(b'\n', &mut self.buf)? == 0 {
                return Ok(self.take_game());
            }
            self.lines += 1;
            let line = String::from_utf8_lossy(&self.buf).into_owned();
            let t = line.trim_start();
            if !self.in_comment && t.starts_with('[') && self.in_movetext {
                // tag section of the next game
                self.pending = Some(line);
                if let Some(g) = self.take_game() { return Ok(Some(g)); }
                if let Some(line) = self.pending.take() { self.feed(&line); }
                continue;
            }
            self.feed(&line);
        }
    }

    fn take_game(&mut self) -> Option<PgnGame> {
        self.flush_comment();
        let g = std::mem::take(&mut self.game);
        self.in_movetext = false;
        self.in_comment = false;
        self.depth = 0;
        self.terminated = false;
        if g.is_empty() { return None; }
        self.games += 1;
        Some(g)
    }

    fn feed(&mut self, line: &str) {
        let t = line.trim();
        if !self.in_comment {
            if t.is_empty() || t.starts_with('%') { return; }
            if t.starts_with('[') && !self.in_movetext {
                match parse_tag(t) {
                    Some(kv) => self.game.headers.push(kv),
                    None => log::debug!("line {}: ignoring malformed tag {:?}", self.lines, t),
                }
                return;
            }
        }
        self.in_movetext = true;
        self.scan_movetext(line);
    }

    fn scan_movetext(&mut self, line: &str) {
        let mut rest = line;
        while !rest.is_empty() {
            if self.in_comment {
                match rest.find('}') {
                    Some(i) => {
                        self.comment.push_str(&rest[..i]);
                        self.in_comment = false;
                        self.flush_comment();
                        rest = &rest[i + 1..];
                    }
                    None => {
                        self.comment.push_str(rest);
                        return;
                    }
                }
                continue;
            }
            let c = rest.as_bytes()[0];
            match c {
                b'{' => { self.in_comment = true; rest = &rest[1..]; }
                b';' => return,
                b'(' => { self.depth += 1; rest = &rest[1..]; }
                b')' => { self.depth = self.depth.saturating_sub(1); rest = &rest[1..]; }
                _ if c.is_ascii_whitespace() => rest = &rest[1..],
                _ => {
                    let end = rest.find(|ch: char| ch.is_ascii_whitespace() || "{}();".contains(ch)).unwrap_or(rest.len());
                    self.token(&rest[..end]);
                    rest = &rest[end..];
                }
            }
        }
    }

    fn token(&mut self, tok: &str) {
        if self.depth > 0 || self.terminated { return; }
        if matches!(tok, "1-0" | "0-1" | "1/2-1/2" | "*") {
            self.game.termination = Some(tok.to_string());
            self.terminated = true;
            return;
        }
        if tok.starts_with('$') { return; }
        let san = strip_move_number(tok);
        if san.is_empty() || san.bytes().all(|b| b == b'!' || b == b'?') { return; }
        self.game.moves.push(PgnMove { san: san.to_string(), comment: None });
    }

    fn flush_comment(&mut self) {
        let text = std::mem::take(&mut self.comment);
        if self.depth > 0 || self.terminated { return; }
        if let Some(m) = self.game.moves.last_mut() {
            if m.comment.is_none() { m.comment = Some(text); }
        }
    }
}

impl<R: BufRead> Iterator for PgnReader<R> {
    type Item = io::Result<PgnGame>;

    fn next(&mut self) -> Option<Self::Item> { self.next_game().transpose() }
}

/// Reads every game from `r`.
pub fn read_games<R: BufRead>(r: R) -> io::Result<Vec<PgnGame>> {
    PgnReader::new(r).collect()
}

// "12." / "12..." / "12...e5" -> "" / "" / "e5"
fn strip_move_number(tok: &str) -> &str {
    let digits = tok.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || tok.as_bytes().get(digits) != Some(&b'.') { return tok; }
    tok[digits..].trim_start_matches('.')
}

fn parse_tag(line: &str) -> Option<(String, String)> {
    let inner = line.strip_prefix('[')?.trim_end().strip_suffix(']')?;
    let (name, rest) = inner.trim_start().split_once(char::is_whitespace)?;
    let quoted = rest.trim();
    let body = quoted.strip_prefix('"')?.strip_suffix('"')?;
    let mut value = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(esc) = chars.next() { value.push(esc); }
        } else {
            value.push(ch);
        }
    }
    Some((name.to_string(), value))
}

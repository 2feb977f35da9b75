use serde::Serialize;
use smallvec::SmallVec;

use crate::board::{BoardState, Move};
use crate::nag::Nag;

/// A game loaded from PGN: its tag pairs, the mainline, and the position it starts from.
#[derive(Debug, Clone, Serialize)]
pub struct Game {
    headers: Headers,
    nodes: Vec<MoveNode>,
    result: GameResult,
    #[serde(skip)]
    initial: BoardState,
}

/// One mainline move with the commentary attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveNode {
    pub mv: Move,
    /// SAN as written in the source, without annotation glyphs.
    pub san: String,
    /// Joined text of the `{...}` comments following the move; empty when none.
    pub comment: String,
    /// NAG codes, sorted and without duplicates.
    pub nags: SmallVec<[u8; 2]>,
    /// 1-based half-move number counted from the game's initial position.
    pub ply: u32,
    /// Full-move number printed before this move (`12.` / `12...`).
    pub move_number: u32,
    pub white_to_move: bool,
}

impl MoveNode {
    /// The first NAG on this move that carries a move-quality glyph.
    pub fn annotation(&self) -> Option<Nag> {
        self.nags.iter().find_map(|&code| Nag::from_code(code))
    }

    pub fn has_nag(&self, code: u8) -> bool {
        self.nags.binary_search(&code).is_ok()
    }

    /// Add a NAG, keeping the set sorted.
    pub fn add_nag(&mut self, code: u8) {
        if let Err(pos) = self.nags.binary_search(&code) {
            self.nags.insert(pos, code);
        }
    }

    pub fn add_comment(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.comment.is_empty() {
            self.comment.push(' ');
        }
        self.comment.push_str(text);
    }

    /// Move label such as `12. e4` or `12... e5`.
    pub fn label(&self) -> String {
        if self.white_to_move {
            format!("{}. {}", self.move_number, self.san)
        } else {
            format!("{}... {}", self.move_number, self.san)
        }
    }
}

/// Game outcome from the termination marker or the `Result` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
    #[default]
    Ongoing,
}

impl GameResult {
    pub fn from_marker(marker: &str) -> Option<Self> {
        match marker {
            "1-0" => Some(Self::WhiteWins),
            "0-1" => Some(Self::BlackWins),
            "1/2-1/2" => Some(Self::Draw),
            "*" => Some(Self::Ongoing),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::WhiteWins => "1-0",
            Self::BlackWins => "0-1",
            Self::Draw => "1/2-1/2",
            Self::Ongoing => "*",
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PGN tag pairs in source order. Setting an existing tag replaces its value
/// in place, so the last duplicate wins without reordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Game {
    pub fn new(
        headers: Headers,
        nodes: Vec<MoveNode>,
        result: GameResult,
        initial: BoardState,
    ) -> Self {
        Self {
            headers,
            nodes,
            result,
            initial,
        }
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn nodes(&self) -> &[MoveNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&MoveNode> {
        self.nodes.get(index)
    }

    /// Number of mainline moves.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    /// Position before the first move: the standard start or the `FEN` tag.
    pub fn initial_board(&self) -> BoardState {
        self.initial
    }

    pub fn white(&self) -> &str {
        self.header("White").unwrap_or("?")
    }

    pub fn black(&self) -> &str {
        self.header("Black").unwrap_or("?")
    }

    pub fn event(&self) -> &str {
        self.header("Event").unwrap_or("?")
    }

    pub fn date(&self) -> &str {
        self.header("Date").unwrap_or("?")
    }

    /// `White vs Black`, as shown in game selection lists.
    pub fn title(&self) -> String {
        format!("{} vs {}", self.white(), self.black())
    }

    /// Replay the first `count` moves from the initial position.
    pub fn board_after(&self, count: usize) -> BoardState {
        self.nodes
            .iter()
            .take(count)
            .fold(self.initial, |board, node| board.apply(node.mv))
    }
}

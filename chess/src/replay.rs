//! Cursor over the mainline of a loaded game.
//!
//! The cursor index is `None` for the initial position and `Some(i)` once
//! `nodes[i]` has been played. Boards are replayed from the game's initial
//! position and memoized, so stepping back and forth is cheap and always
//! reproduces the same states.

use crate::board::BoardState;
use crate::game::{Game, MoveNode};
use crate::types::Square;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("No games to replay")]
    NoGames,
}

/// Navigation state for a collection of games.
#[derive(Debug, Clone)]
pub struct ReplayCursor {
    games: Vec<Game>,
    game_index: usize,
    index: Option<usize>,
    /// `states[0]` is the initial board; `states[i + 1]` follows `nodes[i]`.
    states: Vec<BoardState>,
}

impl ReplayCursor {
    /// Start at the initial position of the first game.
    pub fn new(games: Vec<Game>) -> Result<Self, ReplayError> {
        let first = games.first().ok_or(ReplayError::NoGames)?;
        let states = vec![first.initial_board()];
        Ok(Self {
            games,
            game_index: 0,
            index: None,
            states,
        })
    }

    pub fn games(&self) -> &[Game] {
        &self.games
    }

    /// The selected game.
    pub fn game(&self) -> &Game {
        &self.games[self.game_index]
    }

    pub fn game_index(&self) -> usize {
        self.game_index
    }

    /// Index of the last played node, `None` at the initial position.
    pub fn index(&self) -> Option<usize> {
        self.index
    }

    /// Number of moves in the selected game.
    pub fn len(&self) -> usize {
        self.game().len()
    }

    pub fn is_empty(&self) -> bool {
        self.game().is_empty()
    }

    /// Switch games and rewind to the initial position.
    pub fn select_game(&mut self, index: usize) -> Result<(), ReplayError> {
        let game = self.games.get(index).ok_or(ReplayError::IndexOutOfRange {
            index,
            len: self.games.len(),
        })?;
        self.states.clear();
        self.states.push(game.initial_board());
        self.game_index = index;
        self.index = None;
        tracing::trace!(game = index, "selected game");
        Ok(())
    }

    /// Play the next node. Returns `false` at the end of the game.
    pub fn step_forward(&mut self) -> bool {
        let next = self.index.map_or(0, |i| i + 1);
        if next >= self.len() {
            return false;
        }
        self.index = Some(next);
        tracing::trace!(index = next, "step forward");
        true
    }

    /// Take back the current node. Returns `false` at the initial position.
    pub fn step_backward(&mut self) -> bool {
        match self.index {
            Some(i) => {
                self.index = i.checked_sub(1);
                tracing::trace!(index = ?self.index, "step backward");
                true
            }
            None => false,
        }
    }

    pub fn go_to_start(&mut self) {
        self.index = None;
    }

    pub fn go_to_end(&mut self) {
        self.index = self.len().checked_sub(1);
    }

    /// Jump to `index` (`None` for the initial position).
    pub fn seek(&mut self, index: Option<usize>) -> Result<(), ReplayError> {
        if let Some(i) = index {
            let len = self.len();
            if i >= len {
                return Err(ReplayError::IndexOutOfRange { index: i, len });
            }
        }
        self.index = index;
        Ok(())
    }

    /// Board after every node up to and including the current one.
    pub fn current_board(&mut self) -> BoardState {
        let target = self.index.map_or(0, |i| i + 1);
        let game = &self.games[self.game_index];
        while self.states.len() <= target {
            let played = self.states.len() - 1;
            let last = self.states[played];
            self.states.push(last.apply(game.nodes()[played].mv));
        }
        self.states[target]
    }

    pub fn current_node(&self) -> Option<&MoveNode> {
        self.game().node(self.index?)
    }

    /// Origin and destination of the current move, for highlighting.
    pub fn last_move_squares(&self) -> Option<(Square, Square)> {
        self.current_node().map(|node| (node.mv.from, node.mv.to))
    }
}

//! PGN game model and position replay.
//!
//! Load games with [`load_from_file`] or [`parse_all`], then walk one with a
//! [`ReplayCursor`] to get the [`BoardState`] after each move.

pub mod board;
pub mod fen;
pub mod game;
pub mod nag;
pub mod pgn;
pub mod replay;
pub mod types;

pub use board::{BoardState, Move, MoveKind};
pub use fen::{format_fen, parse_fen, FenError, STANDARD_FEN};
pub use game::{Game, GameResult, Headers, MoveNode};
pub use nag::{Nag, NagClass};
pub use pgn::{
    load_from_file, parse_all, parse_san, PgnCollection, PgnError, SanError, SkipReason,
    SkippedGame,
};
pub use replay::{ReplayCursor, ReplayError};
pub use types::{CastlingRights, Piece, PieceColor, PieceKind, Square};

//! Standard Algebraic Notation move parsing.
//!
//! A SAN token names a destination and (usually) a piece letter; the origin has
//! to be recovered from the board the move is played on.

use smallvec::SmallVec;

use crate::board::{BoardState, Move, MoveKind};
use crate::types::{file_from_char, rank_from_char, Piece, PieceColor, PieceKind, Square};

/// Shape of a non-castling SAN token after lexical analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SanShape {
    piece: PieceKind,
    from_file: Option<u8>,
    from_rank: Option<u8>,
    capture: bool,
    to: Square,
    promotion: Option<PieceKind>,
}

/// Parse a SAN move (e.g. `Nf3`, `exd6`, `O-O-O`, `e8=Q+`) against `board`.
pub fn parse_san(board: &BoardState, san: &str) -> Result<Move, SanError> {
    let token = strip_suffixes(san);
    if token.is_empty() {
        return Err(SanError::MalformedMove(san.to_string()));
    }

    match token {
        "O-O" | "0-0" => return Ok(Move::castle(board.side_to_move(), true)),
        "O-O-O" | "0-0-0" => return Ok(Move::castle(board.side_to_move(), false)),
        _ => {}
    }

    let shape = parse_shape(token).ok_or_else(|| SanError::MalformedMove(san.to_string()))?;
    let side = board.side_to_move();

    if let Some(promo) = shape.promotion {
        let valid_piece = !matches!(promo, PieceKind::Pawn | PieceKind::King);
        if shape.piece != PieceKind::Pawn
            || !valid_piece
            || shape.to.rank() != side.promotion_rank()
        {
            return Err(SanError::MissingPromotion(san.to_string()));
        }
    } else if shape.piece == PieceKind::Pawn && shape.to.rank() == side.promotion_rank() {
        return Err(SanError::MissingPromotion(san.to_string()));
    }

    if board
        .piece_at(shape.to)
        .is_some_and(|occupant| occupant.color == side)
    {
        return Err(SanError::UnresolvableMove(san.to_string()));
    }

    let mover = Piece::new(shape.piece, side);
    let mut candidates: SmallVec<[Square; 4]> = board
        .pieces()
        .filter(|(sq, piece)| {
            *piece == mover
                && shape.from_file.map_or(true, |f| sq.file() == f)
                && shape.from_rank.map_or(true, |r| sq.rank() == r)
        })
        .map(|(sq, _)| sq)
        .filter(|&from| reaches(board, &shape, from, side))
        .collect();

    if candidates.len() > 1 {
        candidates.retain(|from| {
            let mv = build_move(board, &shape, *from);
            !board.apply(mv).mover_in_check()
        });
    }

    match candidates.as_slice() {
        [] => Err(SanError::UnresolvableMove(san.to_string())),
        [from] => Ok(build_move(board, &shape, *from)),
        _ => Err(SanError::AmbiguousMove(san.to_string())),
    }
}

/// Drop check/mate markers and any annotation glyphs glued to the token.
fn strip_suffixes(san: &str) -> &str {
    san.trim().trim_end_matches(['!', '?', '+', '#'])
}

fn parse_shape(token: &str) -> Option<SanShape> {
    let chars: Vec<char> = token.chars().collect();
    let mut end = chars.len();

    let mut promotion = None;
    if let Some(&last) = chars.last() {
        let after_equals = end >= 2 && chars[end - 2] == '=';
        // Promotions are sometimes written with a lowercase letter (`e8=q`).
        let kind = PieceKind::from_san_char(last)
            .or_else(|| after_equals.then(|| PieceKind::from_char(last)).flatten());
        if let Some(kind) = kind {
            promotion = Some(kind);
            end -= if after_equals { 2 } else { 1 };
        }
    }

    if end < 2 {
        return None;
    }
    let to_file = file_from_char(chars[end - 2])?;
    let to_rank = rank_from_char(chars[end - 1])?;
    let to = Square::new(to_file, to_rank)?;
    end -= 2;

    let mut start = 0;
    let piece = match chars.first().and_then(|&c| PieceKind::from_san_char(c)) {
        Some(kind) if end > 0 => {
            start = 1;
            kind
        }
        _ => PieceKind::Pawn,
    };

    let mut capture = false;
    if end > start && matches!(chars[end - 1], 'x' | ':') {
        capture = true;
        end -= 1;
    }

    let (mut from_file, mut from_rank) = (None, None);
    for &c in &chars[start..end] {
        if let (Some(f), None, None) = (file_from_char(c), from_file, from_rank) {
            from_file = Some(f);
        } else if let (Some(r), None) = (rank_from_char(c), from_rank) {
            from_rank = Some(r);
        } else {
            return None;
        }
    }

    Some(SanShape {
        piece,
        from_file,
        from_rank,
        capture,
        to,
        promotion,
    })
}

/// Whether the piece on `from` can reach the destination under the token's semantics.
fn reaches(board: &BoardState, shape: &SanShape, from: Square, side: PieceColor) -> bool {
    if shape.piece != PieceKind::Pawn {
        let capture_ok = !shape.capture
            || board
                .piece_at(shape.to)
                .is_some_and(|target| target.color != side);
        return capture_ok && board.piece_reaches(shape.piece, from, shape.to);
    }

    let forward = side.forward();
    let df = shape.to.file() as i8 - from.file() as i8;
    let dr = shape.to.rank() as i8 - from.rank() as i8;
    let target = board.piece_at(shape.to);

    match df.abs() {
        0 => {
            if target.is_some() || shape.capture {
                return false;
            }
            if dr == forward {
                return true;
            }
            dr == 2 * forward
                && from.rank() == side.pawn_rank()
                && from
                    .offset(0, forward)
                    .is_some_and(|mid| board.piece_at(mid).is_none())
        }
        1 => {
            (shape.capture || shape.from_file.is_some())
                && dr == forward
                && (target.is_some_and(|p| p.color != side)
                    || (target.is_none() && board.en_passant() == Some(shape.to)))
        }
        _ => false,
    }
}

fn build_move(board: &BoardState, shape: &SanShape, from: Square) -> Move {
    if let Some(promo) = shape.promotion {
        return Move::promotion(from, shape.to, promo);
    }
    let kind = if shape.piece != PieceKind::Pawn {
        MoveKind::Normal
    } else if board.piece_at(shape.to).is_none()
        && board.en_passant() == Some(shape.to)
        && from.file() != shape.to.file()
    {
        MoveKind::EnPassant
    } else if shape.to.rank().abs_diff(from.rank()) == 2 {
        MoveKind::DoublePawnPush
    } else {
        MoveKind::Normal
    };
    Move::new(from, shape.to, kind)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanError {
    #[error("Malformed move: {0}")]
    MalformedMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("No piece can play: {0}")]
    UnresolvableMove(String),
    #[error("Invalid or missing promotion: {0}")]
    MissingPromotion(String),
}

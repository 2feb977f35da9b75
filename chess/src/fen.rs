use crate::board::BoardState;
use crate::types::{CastlingRights, Piece, PieceColor, PieceKind, Square};

pub const STANDARD_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Parse a FEN string into a BoardState.
///
/// The halfmove clock and fullmove number are optional, since PGN `FEN` tags
/// in the wild sometimes omit them.
pub fn parse_fen(fen: &str) -> Result<BoardState, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() < 4 || parts.len() > 6 {
        return Err(FenError::InvalidFormat);
    }

    let placement = parse_placement(parts[0])?;

    let side_to_move = match parts[1] {
        "w" => PieceColor::White,
        "b" => PieceColor::Black,
        other => return Err(FenError::InvalidSideToMove(other.to_string())),
    };

    let castling_rights = parse_castling(parts[2])?;

    let en_passant = match parts[3] {
        "-" => None,
        sq => Some(
            sq.parse::<Square>()
                .map_err(|_| FenError::InvalidEnPassant(sq.to_string()))?,
        ),
    };

    let halfmove_clock = match parts.get(4) {
        Some(n) => n.parse().map_err(|_| FenError::InvalidCounter(n.to_string()))?,
        None => 0,
    };
    let fullmove_number = match parts.get(5) {
        Some(n) => n.parse().map_err(|_| FenError::InvalidCounter(n.to_string()))?,
        None => 1,
    };

    let board = BoardState::from_parts(
        placement,
        side_to_move,
        castling_rights,
        en_passant,
        halfmove_clock,
        fullmove_number,
    );

    for color in [PieceColor::White, PieceColor::Black] {
        let kings = board
            .pieces()
            .filter(|(_, p)| p.color == color && p.kind == PieceKind::King)
            .count();
        if kings != 1 {
            return Err(FenError::KingCount(color));
        }
    }

    Ok(board)
}

fn parse_placement(field: &str) -> Result<[Option<Piece>; 64], FenError> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::InvalidBoardLayout);
    }

    let mut placement = [None; 64];
    for (rank_idx, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - rank_idx as u8;
        let mut file = 0u8;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                if !(1..=8).contains(&skip) {
                    return Err(FenError::InvalidBoardLayout);
                }
                file += skip as u8;
            } else {
                let piece = Piece::from_fen_char(c).ok_or(FenError::InvalidPiece(c))?;
                let sq = Square::new(file, rank).ok_or(FenError::InvalidBoardLayout)?;
                placement[sq.index()] = Some(piece);
                file += 1;
            }
            if file > 8 {
                return Err(FenError::InvalidBoardLayout);
            }
        }
        if file != 8 {
            return Err(FenError::InvalidBoardLayout);
        }
    }
    Ok(placement)
}

fn parse_castling(field: &str) -> Result<CastlingRights, FenError> {
    let mut rights = CastlingRights::NONE;
    if field == "-" {
        return Ok(rights);
    }
    for c in field.chars() {
        let right = match c {
            'K' => CastlingRights::WHITE_KINGSIDE,
            'Q' => CastlingRights::WHITE_QUEENSIDE,
            'k' => CastlingRights::BLACK_KINGSIDE,
            'q' => CastlingRights::BLACK_QUEENSIDE,
            _ => return Err(FenError::InvalidCastling(field.to_string())),
        };
        rights.insert(right);
    }
    Ok(rights)
}

/// Format a BoardState as a FEN string
pub fn format_fen(board: &BoardState) -> String {
    let mut fen = String::with_capacity(90);
    for rank in (0..8u8).rev() {
        let mut empty = 0;
        for file in 0..8u8 {
            match Square::new(file, rank).and_then(|sq| board.piece_at(sq)) {
                Some(piece) => {
                    if empty > 0 {
                        fen.push_str(&empty.to_string());
                        empty = 0;
                    }
                    fen.push(piece.to_fen_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            fen.push_str(&empty.to_string());
        }
        if rank > 0 {
            fen.push('/');
        }
    }

    let side = match board.side_to_move() {
        PieceColor::White => 'w',
        PieceColor::Black => 'b',
    };
    let en_passant = board
        .en_passant()
        .map(|sq| sq.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{} {} {} {} {} {}",
        fen,
        side,
        board.castling_rights(),
        en_passant,
        board.halfmove_clock(),
        board.fullmove_number()
    )
}

#[derive(Debug, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format")]
    InvalidFormat,
    #[error("Invalid board layout")]
    InvalidBoardLayout,
    #[error("Invalid piece character: {0}")]
    InvalidPiece(char),
    #[error("Invalid side to move: {0}")]
    InvalidSideToMove(String),
    #[error("Invalid castling field: {0}")]
    InvalidCastling(String),
    #[error("Invalid en passant square: {0}")]
    InvalidEnPassant(String),
    #[error("Invalid move counter: {0}")]
    InvalidCounter(String),
    #[error("Expected exactly one {0} king")]
    KingCount(PieceColor),
}

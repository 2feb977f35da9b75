//! Value-typed chess position and move application.
//!
//! [`BoardState`] is `Copy`: [`BoardState::apply`] never mutates its receiver and
//! always returns the next position, so any earlier position stays valid for
//! backward navigation and caching.

use serde::Serialize;

use crate::types::{CastlingRights, Piece, PieceColor, PieceKind, Square};

/// What a move does beyond relocating one piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Normal,
    DoublePawnPush,
    EnPassant,
    CastleKingside,
    CastleQueenside,
    Promotion,
}

/// A fully specified move: enough to update a board without looking anything up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub kind: MoveKind,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn new(from: Square, to: Square, kind: MoveKind) -> Self {
        Self {
            from,
            to,
            kind,
            promotion: None,
        }
    }

    pub fn promotion(from: Square, to: Square, piece: PieceKind) -> Self {
        Self {
            from,
            to,
            kind: MoveKind::Promotion,
            promotion: Some(piece),
        }
    }

    /// The castling move for `color`. `kingside` selects O-O over O-O-O.
    pub fn castle(color: PieceColor, kingside: bool) -> Self {
        let (from, to, kind) = match (color, kingside) {
            (PieceColor::White, true) => (Square::E1, Square::G1, MoveKind::CastleKingside),
            (PieceColor::White, false) => (Square::E1, Square::C1, MoveKind::CastleQueenside),
            (PieceColor::Black, true) => (Square::E8, Square::G8, MoveKind::CastleKingside),
            (PieceColor::Black, false) => (Square::E8, Square::C8, MoveKind::CastleQueenside),
        };
        Self::new(from, to, kind)
    }

    /// UCI-style coordinate notation, e.g. `e2e4` or `e7e8q`.
    pub fn to_uci(&self) -> String {
        let mut s = format!("{}{}", self.from, self.to);
        if let Some(promo) = self.promotion {
            s.push(promo.to_char_lower());
        }
        s
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

/// A complete chess position.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoardState {
    placement: [Option<Piece>; 64],
    side_to_move: PieceColor,
    castling_rights: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

impl BoardState {
    /// The standard starting position.
    pub fn initial() -> Self {
        let mut board = Self::empty();
        let back = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (file, kind) in back.into_iter().enumerate() {
            let file = file as u8;
            for color in [PieceColor::White, PieceColor::Black] {
                if let Some(sq) = Square::new(file, color.back_rank()) {
                    board.placement[sq.index()] = Some(Piece::new(kind, color));
                }
                if let Some(sq) = Square::new(file, color.pawn_rank()) {
                    board.placement[sq.index()] = Some(Piece::new(PieceKind::Pawn, color));
                }
            }
        }
        board.castling_rights = CastlingRights::ALL;
        board
    }

    /// A board with no pieces, white to move and no castling rights.
    pub fn empty() -> Self {
        Self {
            placement: [None; 64],
            side_to_move: PieceColor::White,
            castling_rights: CastlingRights::NONE,
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Assemble a position from its parts. Used by the FEN reader.
    pub fn from_parts(
        placement: [Option<Piece>; 64],
        side_to_move: PieceColor,
        castling_rights: CastlingRights,
        en_passant: Option<Square>,
        halfmove_clock: u32,
        fullmove_number: u32,
    ) -> Self {
        Self {
            placement,
            side_to_move,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
        }
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.placement[sq.index()]
    }

    /// Occupied squares with their pieces, a1 to h8.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.piece_at(sq).map(|p| (sq, p)))
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.side_to_move
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn king_square(&self, color: PieceColor) -> Option<Square> {
        self.pieces()
            .find(|(_, p)| *p == Piece::new(PieceKind::King, color))
            .map(|(sq, _)| sq)
    }

    /// Apply one move and return the resulting position.
    ///
    /// The move is trusted: nothing here checks legality. `kind` drives the
    /// side effects (rook relocation, en-passant removal, promotion).
    pub fn apply(&self, mv: Move) -> BoardState {
        let mut next = *self;
        let mover = self.placement[mv.from.index()];
        let captured = self.placement[mv.to.index()];
        let color = mover.map(|p| p.color).unwrap_or(self.side_to_move);

        next.placement[mv.from.index()] = None;
        next.placement[mv.to.index()] = match (mv.kind, mv.promotion) {
            (MoveKind::Promotion, Some(kind)) => Some(Piece::new(kind, color)),
            _ => mover,
        };

        match mv.kind {
            MoveKind::EnPassant => {
                if let Some(victim) = Square::new(mv.to.file(), mv.from.rank()) {
                    next.placement[victim.index()] = None;
                }
            }
            MoveKind::CastleKingside | MoveKind::CastleQueenside => {
                let rank = mv.from.rank();
                let (rook_from, rook_to) = if mv.kind == MoveKind::CastleKingside {
                    (Square::new(7, rank), Square::new(5, rank))
                } else {
                    (Square::new(0, rank), Square::new(3, rank))
                };
                if let (Some(rook_from), Some(rook_to)) = (rook_from, rook_to) {
                    let rook = next.placement[rook_from.index()].take();
                    next.placement[rook_to.index()] = rook;
                }
                next.castling_rights.remove(CastlingRights::both(color));
            }
            MoveKind::Normal | MoveKind::DoublePawnPush | MoveKind::Promotion => {}
        }

        if matches!(mover, Some(Piece { kind: PieceKind::King, .. })) {
            next.castling_rights.remove(CastlingRights::both(color));
        }
        next.castling_rights
            .remove(CastlingRights::for_rook_home(mv.from));
        next.castling_rights.remove(CastlingRights::for_rook_home(mv.to));

        next.en_passant = match mv.kind {
            MoveKind::DoublePawnPush => {
                Square::new(mv.from.file(), (mv.from.rank() + mv.to.rank()) / 2)
            }
            _ => None,
        };

        let is_pawn_move = matches!(mover, Some(Piece { kind: PieceKind::Pawn, .. }));
        if is_pawn_move || captured.is_some() || mv.kind == MoveKind::EnPassant {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock = self.halfmove_clock + 1;
        }
        if self.side_to_move == PieceColor::Black {
            next.fullmove_number = self.fullmove_number + 1;
        }
        next.side_to_move = !self.side_to_move;
        next
    }

    /// Whether any piece of color `by` attacks `target`.
    pub fn is_attacked(&self, target: Square, by: PieceColor) -> bool {
        // Pawns of `by` attack diagonally forward, so look one rank behind the target.
        let pawn = Piece::new(PieceKind::Pawn, by);
        let pawn_hit = [-1, 1].into_iter().any(|df| {
            target
                .offset(df, -by.forward())
                .is_some_and(|sq| self.piece_at(sq) == Some(pawn))
        });
        if pawn_hit {
            return true;
        }

        let leaper_hit = |offsets: &[(i8, i8)], kind: PieceKind| {
            offsets.iter().any(|&(df, dr)| {
                target
                    .offset(df, dr)
                    .is_some_and(|sq| self.piece_at(sq) == Some(Piece::new(kind, by)))
            })
        };
        if leaper_hit(&KNIGHT_OFFSETS, PieceKind::Knight) || leaper_hit(&KING_OFFSETS, PieceKind::King)
        {
            return true;
        }

        let slider_hit = |directions: &[(i8, i8)], kinds: [PieceKind; 2]| {
            directions.iter().any(|&(df, dr)| {
                match self.first_piece_along(target, df, dr) {
                    Some(p) => p.color == by && kinds.contains(&p.kind),
                    None => false,
                }
            })
        };
        slider_hit(&ROOK_DIRECTIONS, [PieceKind::Rook, PieceKind::Queen])
            || slider_hit(&BISHOP_DIRECTIONS, [PieceKind::Bishop, PieceKind::Queen])
    }

    /// Whether the side that just moved left its own king attacked.
    pub fn mover_in_check(&self) -> bool {
        let mover = !self.side_to_move;
        self.king_square(mover)
            .is_some_and(|king| self.is_attacked(king, self.side_to_move))
    }

    /// Whether the side to move is in check.
    pub fn in_check(&self) -> bool {
        self.king_square(self.side_to_move)
            .is_some_and(|king| self.is_attacked(king, !self.side_to_move))
    }

    /// Whether a piece of `kind` standing on `from` could move to `to` by its
    /// movement geometry. Pawns are handled by the move parser because their
    /// reach depends on capture semantics.
    pub(crate) fn piece_reaches(&self, kind: PieceKind, from: Square, to: Square) -> bool {
        let df = to.file() as i8 - from.file() as i8;
        let dr = to.rank() as i8 - from.rank() as i8;
        match kind {
            PieceKind::Knight => KNIGHT_OFFSETS.contains(&(df, dr)),
            PieceKind::King => KING_OFFSETS.contains(&(df, dr)),
            PieceKind::Rook => (df == 0 || dr == 0) && self.ray_clear(from, to),
            PieceKind::Bishop => df.abs() == dr.abs() && self.ray_clear(from, to),
            PieceKind::Queen => {
                (df == 0 || dr == 0 || df.abs() == dr.abs()) && self.ray_clear(from, to)
            }
            PieceKind::Pawn => false,
        }
    }

    /// Whether every square strictly between `from` and `to` is empty.
    /// The squares must share a line or diagonal.
    fn ray_clear(&self, from: Square, to: Square) -> bool {
        if from == to {
            return false;
        }
        let step_f = (to.file() as i8 - from.file() as i8).signum();
        let step_r = (to.rank() as i8 - from.rank() as i8).signum();
        let mut current = from.offset(step_f, step_r);
        while let Some(sq) = current {
            if sq == to {
                return true;
            }
            if self.piece_at(sq).is_some() {
                return false;
            }
            current = sq.offset(step_f, step_r);
        }
        false
    }

    fn first_piece_along(&self, from: Square, df: i8, dr: i8) -> Option<Piece> {
        let mut current = from.offset(df, dr);
        while let Some(sq) = current {
            if let Some(piece) = self.piece_at(sq) {
                return Some(piece);
            }
            current = sq.offset(df, dr);
        }
        None
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Debug for BoardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BoardState({})", crate::fen::format_fen(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn piece(kind: PieceKind, color: PieceColor) -> Option<Piece> {
        Some(Piece::new(kind, color))
    }

    #[test]
    fn test_initial_position() {
        let board = BoardState::initial();
        assert_eq!(
            board.piece_at(sq("a1")),
            piece(PieceKind::Rook, PieceColor::White)
        );
        assert_eq!(
            board.piece_at(sq("e1")),
            piece(PieceKind::King, PieceColor::White)
        );
        assert_eq!(
            board.piece_at(sq("d8")),
            piece(PieceKind::Queen, PieceColor::Black)
        );
        assert_eq!(board.piece_at(sq("e4")), None);
        assert_eq!(board.pieces().count(), 32);
        assert_eq!(board.side_to_move(), PieceColor::White);
        assert_eq!(board.castling_rights(), CastlingRights::ALL);
        assert_eq!(board.en_passant(), None);
    }

    #[test]
    fn test_apply_does_not_mutate_receiver() {
        let board = BoardState::initial();
        let next = board.apply(Move::new(sq("e2"), sq("e4"), MoveKind::DoublePawnPush));
        assert_eq!(board, BoardState::initial());
        assert_ne!(board, next);
    }

    #[test]
    fn test_double_push_sets_en_passant_target() {
        let board = BoardState::initial();
        let next = board.apply(Move::new(sq("e2"), sq("e4"), MoveKind::DoublePawnPush));
        assert_eq!(next.en_passant(), Some(sq("e3")));
        assert_eq!(next.side_to_move(), PieceColor::Black);

        let after = next.apply(Move::new(sq("g8"), sq("f6"), MoveKind::Normal));
        assert_eq!(after.en_passant(), None);
        assert_eq!(after.fullmove_number(), 2);
    }

    #[test]
    fn test_en_passant_removes_passed_pawn() {
        let board = BoardState::initial()
            .apply(Move::new(sq("e2"), sq("e4"), MoveKind::DoublePawnPush))
            .apply(Move::new(sq("a7"), sq("a6"), MoveKind::Normal))
            .apply(Move::new(sq("e4"), sq("e5"), MoveKind::Normal))
            .apply(Move::new(sq("d7"), sq("d5"), MoveKind::DoublePawnPush));
        assert_eq!(board.en_passant(), Some(sq("d6")));

        let next = board.apply(Move::new(sq("e5"), sq("d6"), MoveKind::EnPassant));
        assert_eq!(
            next.piece_at(sq("d6")),
            piece(PieceKind::Pawn, PieceColor::White)
        );
        assert_eq!(next.piece_at(sq("d5")), None);
        assert_eq!(next.piece_at(sq("e5")), None);
        assert_eq!(next.halfmove_clock(), 0);
    }

    #[test]
    fn test_castle_moves_rook_and_clears_rights() {
        let mut placement = [None; 64];
        placement[Square::E1.index()] = piece(PieceKind::King, PieceColor::White);
        placement[Square::H1.index()] = piece(PieceKind::Rook, PieceColor::White);
        placement[Square::A1.index()] = piece(PieceKind::Rook, PieceColor::White);
        placement[Square::E8.index()] = piece(PieceKind::King, PieceColor::Black);
        let board = BoardState::from_parts(
            placement,
            PieceColor::White,
            CastlingRights::ALL,
            None,
            0,
            1,
        );

        let kingside = board.apply(Move::castle(PieceColor::White, true));
        assert_eq!(
            kingside.piece_at(Square::G1),
            piece(PieceKind::King, PieceColor::White)
        );
        assert_eq!(
            kingside.piece_at(Square::F1),
            piece(PieceKind::Rook, PieceColor::White)
        );
        assert_eq!(kingside.piece_at(Square::H1), None);
        assert_eq!(kingside.castling_rights().to_string(), "kq");

        let queenside = board.apply(Move::castle(PieceColor::White, false));
        assert_eq!(
            queenside.piece_at(Square::C1),
            piece(PieceKind::King, PieceColor::White)
        );
        assert_eq!(
            queenside.piece_at(Square::D1),
            piece(PieceKind::Rook, PieceColor::White)
        );
        assert_eq!(queenside.piece_at(Square::A1), None);
    }

    #[test]
    fn test_rook_capture_on_home_square_revokes_right() {
        let mut placement = [None; 64];
        placement[Square::E1.index()] = piece(PieceKind::King, PieceColor::White);
        placement[Square::H1.index()] = piece(PieceKind::Rook, PieceColor::White);
        placement[Square::E8.index()] = piece(PieceKind::King, PieceColor::Black);
        placement[sq("h5").index()] = piece(PieceKind::Rook, PieceColor::Black);
        let board = BoardState::from_parts(
            placement,
            PieceColor::Black,
            CastlingRights::WHITE_KINGSIDE,
            None,
            0,
            1,
        );
        let next = board.apply(Move::new(sq("h5"), Square::H1, MoveKind::Normal));
        assert!(next.castling_rights().is_empty());
    }

    #[test]
    fn test_promotion_places_new_piece() {
        let mut placement = [None; 64];
        placement[sq("a7").index()] = piece(PieceKind::Pawn, PieceColor::White);
        let board =
            BoardState::from_parts(placement, PieceColor::White, CastlingRights::NONE, None, 3, 40);
        let next = board.apply(Move::promotion(sq("a7"), sq("a8"), PieceKind::Knight));
        assert_eq!(
            next.piece_at(sq("a8")),
            piece(PieceKind::Knight, PieceColor::White)
        );
        assert_eq!(next.piece_at(sq("a7")), None);
    }

    #[test]
    fn test_is_attacked_respects_blockers() {
        let board = BoardState::initial();
        assert!(board.is_attacked(sq("f3"), PieceColor::White));
        assert!(!board.is_attacked(sq("e4"), PieceColor::White));
        assert!(board.is_attacked(sq("d6"), PieceColor::Black));
        assert!(board.is_attacked(sq("a3"), PieceColor::White));
        assert!(!board.in_check());
    }

    #[test]
    fn test_piece_reaches_sliding_blocked() {
        let board = BoardState::initial();
        assert!(!board.piece_reaches(PieceKind::Rook, Square::A1, sq("a4")));
        assert!(!board.piece_reaches(PieceKind::Bishop, Square::C1, sq("e3")));
        assert!(board.piece_reaches(PieceKind::Knight, sq("g1"), sq("f3")));
        assert!(board.piece_reaches(PieceKind::Rook, Square::A1, sq("a2")));
    }
}

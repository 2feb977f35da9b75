//! Plain-text rendering of positions and move details.

use std::fmt::Write as _;

use chess::{format_fen, BoardState, Game, MoveNode, Piece, PieceColor, PieceKind, Square};

/// Unicode figurine for a piece.
pub fn piece_to_unicode(piece: Piece) -> char {
    match (piece.kind, piece.color) {
        (PieceKind::King, PieceColor::White) => '\u{2654}',
        (PieceKind::Queen, PieceColor::White) => '\u{2655}',
        (PieceKind::Rook, PieceColor::White) => '\u{2656}',
        (PieceKind::Bishop, PieceColor::White) => '\u{2657}',
        (PieceKind::Knight, PieceColor::White) => '\u{2658}',
        (PieceKind::Pawn, PieceColor::White) => '\u{2659}',
        (PieceKind::King, PieceColor::Black) => '\u{265a}',
        (PieceKind::Queen, PieceColor::Black) => '\u{265b}',
        (PieceKind::Rook, PieceColor::Black) => '\u{265c}',
        (PieceKind::Bishop, PieceColor::Black) => '\u{265d}',
        (PieceKind::Knight, PieceColor::Black) => '\u{265e}',
        (PieceKind::Pawn, PieceColor::Black) => '\u{265f}',
    }
}

/// Draw the board from White's side. Squares in `highlight` are bracketed.
pub fn render_board(
    board: &BoardState,
    highlight: Option<(Square, Square)>,
    unicode: bool,
) -> String {
    let mut out = String::new();
    for rank in (0..8u8).rev() {
        let _ = write!(out, "{} ", rank + 1);
        for file in 0..8u8 {
            let Some(sq) = Square::new(file, rank) else {
                continue;
            };
            let symbol = match board.piece_at(sq) {
                Some(piece) if unicode => piece_to_unicode(piece),
                Some(piece) => piece.to_fen_char(),
                None => '.',
            };
            let marked = highlight.is_some_and(|(from, to)| sq == from || sq == to);
            if marked {
                let _ = write!(out, "[{}]", symbol);
            } else {
                let _ = write!(out, " {} ", symbol);
            }
        }
        out.push('\n');
    }
    out.push_str("   a  b  c  d  e  f  g  h\n");
    out
}

/// Game title with result, then every tag pair.
pub fn render_headers(game: &Game) -> String {
    let mut out = format!("{} ({})\n", game.title(), game.result());
    for (name, value) in game.headers().iter() {
        let _ = writeln!(out, "  {}: {}", name, value);
    }
    out
}

/// Status line for the cursor position: move label, glyph and comment.
pub fn render_move(node: Option<&MoveNode>, ply: usize, len: usize) -> String {
    let Some(node) = node else {
        return format!("Start position (0/{})\n", len);
    };
    let mut out = node.label();
    if let Some(nag) = node.annotation() {
        out.push_str(nag.glyph());
    }
    let _ = writeln!(out, " ({}/{})", ply, len);
    if !node.comment.is_empty() {
        let _ = writeln!(out, "  {}", node.comment);
    }
    out
}

/// Full view of one cursor position.
pub fn render_position(
    game: &Game,
    board: &BoardState,
    node: Option<&MoveNode>,
    ply: usize,
    unicode: bool,
) -> String {
    let highlight = node.map(|n| (n.mv.from, n.mv.to));
    let mut out = render_board(board, highlight, unicode);
    let _ = writeln!(out, "FEN: {}", format_fen(board));
    out.push_str(&render_move(node, ply, game.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_board_ascii() {
        let text = render_board(&BoardState::initial(), None, false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "8  r  n  b  q  k  b  n  r ");
        assert_eq!(lines[4], "4  .  .  .  .  .  .  .  . ");
        assert_eq!(lines[7], "1  R  N  B  Q  K  B  N  R ");
    }

    #[test]
    fn test_highlighted_squares() {
        let collection = chess::parse_all("1. e4 *").unwrap();
        let game = &collection.games[0];
        let node = &game.nodes()[0];
        let text = render_board(&game.board_after(1), Some((node.mv.from, node.mv.to)), false);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[4], "4  .  .  .  . [P] .  .  . ");
        assert_eq!(lines[6], "2  P  P  P  P [.] P  P  P ");
    }

    #[test]
    fn test_unicode_figurines() {
        let text = render_board(&BoardState::initial(), None, true);
        assert!(text.starts_with("8  \u{265c}  \u{265e} "));
        assert!(text.contains('\u{2654}'));
    }

    #[test]
    fn test_render_move_with_glyph_and_comment() {
        let collection = chess::parse_all("1. e4 e5 2. Nf3 $1 {Develops} *").unwrap();
        let game = &collection.games[0];
        assert_eq!(render_move(None, 0, 3), "Start position (0/3)\n");
        assert_eq!(
            render_move(game.node(2), 3, 3),
            "2. Nf3! (3/3)\n  Develops\n"
        );
        assert_eq!(render_move(game.node(1), 2, 3), "1... e5 (2/3)\n");
    }

    #[test]
    fn test_render_headers() {
        let collection =
            chess::parse_all("[White \"Tal\"]\n[Black \"Botvinnik\"]\n\n1. e4 1-0").unwrap();
        let text = render_headers(&collection.games[0]);
        assert_eq!(text, "Tal vs Botvinnik (1-0)\n  White: Tal\n  Black: Botvinnik\n");
    }
}

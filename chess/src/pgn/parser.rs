use std::path::{Path, PathBuf};

use smallvec::SmallVec;

use super::lexer::{Lexer, Token};
use super::san::{parse_san, SanError};
use crate::board::BoardState;
use crate::fen::{parse_fen, FenError};
use crate::game::{Game, GameResult, Headers, MoveNode};
use crate::types::PieceColor;

/// Everything recovered from one PGN stream.
#[derive(Debug, Clone)]
pub struct PgnCollection {
    /// Games that parsed completely, in stream order.
    pub games: Vec<Game>,
    /// Games that were recognized but could not be replayed.
    pub skipped: Vec<SkippedGame>,
}

/// Diagnostic for a game left out of a [`PgnCollection`].
#[derive(Debug, Clone, thiserror::Error)]
#[error("game {ordinal} ({title}) skipped at line {line}: {reason}")]
pub struct SkippedGame {
    /// 1-based position of the game in the stream.
    pub ordinal: usize,
    pub title: String,
    /// Source line of the offending token.
    pub line: u32,
    /// Ply of the move that failed, if a move failed.
    pub ply: Option<u32>,
    /// The offending SAN token, if a move failed.
    pub san: Option<String>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SkipReason {
    #[error(transparent)]
    Move(#[from] SanError),
    #[error("bad FEN tag: {0}")]
    Fen(String),
    #[error("unrecognized text: {0}")]
    Syntax(String),
}

impl From<FenError> for SkipReason {
    fn from(err: FenError) -> Self {
        Self::Fen(err.to_string())
    }
}

/// Parse every game in `text`.
///
/// Games with unparsable moves are reported in [`PgnCollection::skipped`] and do
/// not stop the rest of the stream from loading. Only a stream that yields no
/// usable game at all is an error.
pub fn parse_all(text: &str) -> Result<PgnCollection, PgnError> {
    let mut lexer = Lexer::new(text);
    let mut collection = PgnCollection {
        games: Vec::new(),
        skipped: Vec::new(),
    };
    let mut builder = GameBuilder::new(1);

    while let Some(token) = lexer.next() {
        let line = lexer.line();
        match token {
            Token::Tag { name, value } => {
                if builder.in_movetext {
                    builder = builder.finish_into(&mut collection);
                }
                builder.recognized = true;
                builder.headers.insert(name, value);
            }
            Token::Result(result) => {
                // A result inside a variation means the variation was never closed.
                if builder.variation_depth > 0 {
                    builder.fail(SkipReason::Syntax("unclosed variation".to_string()), line);
                }
                builder.recognized = true;
                builder.result = Some(result);
                builder = builder.finish_into(&mut collection);
            }
            other => {
                if matches!(other, Token::San(_) | Token::MoveNumber(_)) {
                    builder.in_movetext = true;
                }
                builder.movetext_token(other, line);
            }
        }
    }
    builder.finish_into(&mut collection);

    if collection.games.is_empty() {
        return Err(PgnError::EmptyInput {
            skipped: collection.skipped.len(),
        });
    }
    Ok(collection)
}

/// Read and parse a PGN file. Bytes that are not valid UTF-8 are replaced
/// rather than rejected, since older PGN files are often Latin-1.
pub fn load_from_file(path: impl AsRef<Path>) -> Result<PgnCollection, PgnError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| PgnError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    let collection = parse_all(&text)?;
    tracing::info!(
        path = %path.display(),
        games = collection.games.len(),
        skipped = collection.skipped.len(),
        "loaded PGN file"
    );
    Ok(collection)
}

struct Failure {
    reason: SkipReason,
    line: u32,
    ply: Option<u32>,
    san: Option<String>,
}

/// Accumulates one game while tokens stream past.
struct GameBuilder {
    ordinal: usize,
    headers: Headers,
    nodes: Vec<MoveNode>,
    result: Option<GameResult>,
    board: Option<BoardState>,
    initial: BoardState,
    pending_comment: String,
    pending_nags: SmallVec<[u8; 2]>,
    variation_depth: usize,
    /// Line of the outermost open `(`.
    variation_line: u32,
    in_movetext: bool,
    recognized: bool,
    failure: Option<Failure>,
}

impl GameBuilder {
    fn new(ordinal: usize) -> Self {
        Self {
            ordinal,
            headers: Headers::new(),
            nodes: Vec::new(),
            result: None,
            board: None,
            initial: BoardState::initial(),
            pending_comment: String::new(),
            pending_nags: SmallVec::new(),
            variation_depth: 0,
            variation_line: 0,
            in_movetext: false,
            recognized: false,
            failure: None,
        }
    }

    fn fail(&mut self, reason: SkipReason, line: u32) {
        self.fail_at(reason, line, None, None);
    }

    fn fail_at(&mut self, reason: SkipReason, line: u32, ply: Option<u32>, san: Option<String>) {
        if self.failure.is_none() {
            self.failure = Some(Failure {
                reason,
                line,
                ply,
                san,
            });
        }
    }

    /// The running board, created from the `FEN` tag on first use.
    fn board(&mut self, line: u32) -> Option<BoardState> {
        if self.board.is_none() {
            let initial = match self.headers.get("FEN") {
                Some(fen) => match parse_fen(fen) {
                    Ok(board) => board,
                    Err(err) => {
                        self.fail(err.into(), line);
                        return None;
                    }
                },
                None => BoardState::initial(),
            };
            self.initial = initial;
            self.board = Some(initial);
        }
        self.board
    }

    fn movetext_token(&mut self, token: Token, line: u32) {
        match token {
            Token::VariationStart => {
                if self.variation_depth == 0 {
                    self.variation_line = line;
                }
                self.variation_depth += 1;
            }
            Token::VariationEnd => {
                if self.variation_depth == 0 {
                    self.fail(SkipReason::Syntax(")".to_string()), line);
                }
                self.variation_depth = self.variation_depth.saturating_sub(1);
            }
            _ if self.variation_depth > 0 => {}
            Token::MoveNumber(_) => {}
            Token::San(san) => {
                self.recognized = true;
                self.play(san, line);
            }
            Token::Comment(text) => match self.nodes.last_mut() {
                Some(node) => node.add_comment(&text),
                None => {
                    let text = text.trim();
                    if !text.is_empty() {
                        if !self.pending_comment.is_empty() {
                            self.pending_comment.push(' ');
                        }
                        self.pending_comment.push_str(text);
                    }
                }
            },
            Token::Nag(code) => match self.nodes.last_mut() {
                Some(node) => node.add_nag(code),
                None => {
                    if let Err(pos) = self.pending_nags.binary_search(&code) {
                        self.pending_nags.insert(pos, code);
                    }
                }
            },
            Token::Invalid(text) => {
                self.recognized = true;
                self.fail(SkipReason::Syntax(text), line);
            }
            Token::Tag { .. } | Token::Result(_) => {}
        }
    }

    fn play(&mut self, san: String, line: u32) {
        if self.failure.is_some() {
            return;
        }
        let Some(board) = self.board(line) else {
            return;
        };
        let ply = self.nodes.len() as u32 + 1;
        match parse_san(&board, &san) {
            Ok(mv) => {
                self.board = Some(board.apply(mv));
                self.nodes.push(MoveNode {
                    mv,
                    san,
                    comment: std::mem::take(&mut self.pending_comment),
                    nags: std::mem::take(&mut self.pending_nags),
                    ply,
                    move_number: board.fullmove_number(),
                    white_to_move: board.side_to_move() == PieceColor::White,
                });
            }
            Err(err) => self.fail_at(err.into(), line, Some(ply), Some(san)),
        }
    }

    /// Close this game, record it, and return a builder for the next one.
    fn finish_into(mut self, collection: &mut PgnCollection) -> GameBuilder {
        let next = GameBuilder::new(self.ordinal + usize::from(self.recognized));
        if !self.recognized {
            return next;
        }

        let title = format!(
            "{} vs {}",
            self.headers.get("White").unwrap_or("?"),
            self.headers.get("Black").unwrap_or("?")
        );

        if self.variation_depth > 0 {
            let line = self.variation_line;
            self.fail(SkipReason::Syntax("unclosed variation".to_string()), line);
        }

        // A game with tags but no moves still needs its FEN checked.
        if self.failure.is_none() {
            self.board(0);
        }

        if let Some(failure) = self.failure.take() {
            let skipped = SkippedGame {
                ordinal: self.ordinal,
                title,
                line: failure.line,
                ply: failure.ply,
                san: failure.san,
                reason: failure.reason,
            };
            tracing::warn!("{}", skipped);
            collection.skipped.push(skipped);
            return next;
        }

        let result = self
            .result
            .or_else(|| self.headers.get("Result").and_then(GameResult::from_marker))
            .unwrap_or_default();
        tracing::debug!(
            ordinal = self.ordinal,
            %title,
            moves = self.nodes.len(),
            "parsed game"
        );
        collection
            .games
            .push(Game::new(self.headers, self.nodes, result, self.initial));
        next
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("no games loaded ({skipped} skipped)")]
    EmptyInput { skipped: usize },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Piece, PieceKind};

    fn sq(s: &str) -> crate::Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_single_game_without_headers() {
        let collection = parse_all("1. e4 e5 2. Nf3 Nc6 *").unwrap();
        assert_eq!(collection.games.len(), 1);
        let game = &collection.games[0];
        assert!(game.headers().is_empty());
        assert_eq!(game.len(), 4);
        assert_eq!(game.result(), GameResult::Ongoing);
        let sans: Vec<_> = game.nodes().iter().map(|n| n.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Nf3", "Nc6"]);
    }

    #[test]
    fn test_headers_and_result() {
        let pgn = "[Event \"Club\"]\n[White \"Ann\"]\n[Black \"Bob\"]\n[Event \"Club Final\"]\n\n1. d4 d5 1/2-1/2\n";
        let collection = parse_all(pgn).unwrap();
        let game = &collection.games[0];
        assert_eq!(game.event(), "Club Final");
        assert_eq!(game.title(), "Ann vs Bob");
        assert_eq!(game.headers().len(), 3);
        assert_eq!(game.result(), GameResult::Draw);
    }

    #[test]
    fn test_result_falls_back_to_header() {
        let pgn = "[Result \"0-1\"]\n\n1. f3 e5 2. g4 Qh4#";
        let game = &parse_all(pgn).unwrap().games[0];
        assert_eq!(game.result(), GameResult::BlackWins);
        assert_eq!(game.len(), 4);
    }

    #[test]
    fn test_multiple_games() {
        let pgn = "[White \"A\"]\n\n1. e4 *\n\n[White \"B\"]\n\n1. d4 d5 *\n";
        let collection = parse_all(pgn).unwrap();
        assert_eq!(collection.games.len(), 2);
        assert_eq!(collection.games[0].white(), "A");
        assert_eq!(collection.games[1].white(), "B");
        assert_eq!(collection.games[1].len(), 2);
    }

    #[test]
    fn test_games_split_on_tags_without_result() {
        let pgn = "[White \"A\"]\n1. e4\n[White \"B\"]\n1. c4";
        let collection = parse_all(pgn).unwrap();
        assert_eq!(collection.games.len(), 2);
        assert_eq!(collection.games[1].nodes()[0].san, "c4");
    }

    #[test]
    fn test_comments_and_nags_attach_to_preceding_move() {
        let pgn = "1. e4 {King pawn} $1 $14 e5 ?! {Symmetric} {again} *";
        let game = &parse_all(pgn).unwrap().games[0];
        let e4 = &game.nodes()[0];
        assert_eq!(e4.comment, "King pawn");
        assert_eq!(e4.nags.as_slice(), &[1, 14]);
        let e5 = &game.nodes()[1];
        assert_eq!(e5.comment, "Symmetric again");
        assert_eq!(e5.nags.as_slice(), &[6]);
    }

    #[test]
    fn test_leading_comment_attaches_to_first_move() {
        let pgn = "[FEN \"rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1\"]\n\n{Good move!} 1... e5 $1 *";
        let game = &parse_all(pgn).unwrap().games[0];
        let node = &game.nodes()[0];
        assert_eq!(node.san, "e5");
        assert_eq!(node.comment, "Good move!");
        assert_eq!(node.nags.as_slice(), &[1]);
        assert_eq!(node.annotation().map(|n| n.glyph()), Some("!"));
        assert_eq!(node.label(), "1... e5");
    }

    #[test]
    fn test_variations_are_skipped() {
        let pgn = "1. e4 (1. d4 d5 (1... Nf6 2. c4) 2. c4 {QGD}) e5 {main} 2. Nf3 *";
        let game = &parse_all(pgn).unwrap().games[0];
        let sans: Vec<_> = game.nodes().iter().map(|n| n.san.as_str()).collect();
        assert_eq!(sans, vec!["e4", "e5", "Nf3"]);
        assert_eq!(game.nodes()[0].comment, "");
        assert_eq!(game.nodes()[1].comment, "main");
    }

    #[test]
    fn test_bad_game_is_skipped_and_loading_continues() {
        let pgn = "[White \"Bad\"]\n\n1. e4 e5 2. Nf3 Nc6 3. Nc3 Nf6 4. d3 d6 5. Rxe4 *\n\n[White \"Good\"]\n\n1. e4 *\n";
        let collection = parse_all(pgn).unwrap();
        assert_eq!(collection.games.len(), 1);
        assert_eq!(collection.games[0].white(), "Good");
        assert_eq!(collection.skipped.len(), 1);
        let skipped = &collection.skipped[0];
        assert_eq!(skipped.ordinal, 1);
        assert_eq!(skipped.ply, Some(9));
        assert_eq!(skipped.san.as_deref(), Some("Rxe4"));
        assert_eq!(skipped.line, 3);
        assert!(matches!(
            skipped.reason,
            SkipReason::Move(SanError::UnresolvableMove(_))
        ));
    }

    #[test]
    fn test_ambiguous_move_skips_game() {
        let pgn = "[FEN \"4k3/8/8/8/R3p2R/8/8/4K3 w - - 0 1\"]\n\n1. Rxe4 *\n\n1. e4 *";
        let collection = parse_all(pgn).unwrap();
        assert_eq!(collection.games.len(), 1);
        assert!(matches!(
            collection.skipped[0].reason,
            SkipReason::Move(SanError::AmbiguousMove(_))
        ));
        assert_eq!(collection.skipped[0].ordinal, 1);
    }

    #[test]
    fn test_malformed_tag_skips_whole_game() {
        let pgn = "[Event \"Club\"]\n[Site Berlin]\n[White \"A\"]\n[Black \"B\"]\n\n1. e4 e5 *\n\n1. d4 *";
        let collection = parse_all(pgn).unwrap();
        assert_eq!(collection.games.len(), 1);
        assert_eq!(collection.games[0].nodes()[0].san, "d4");
        assert_eq!(collection.skipped.len(), 1);
        let skipped = &collection.skipped[0];
        assert_eq!(skipped.ordinal, 1);
        assert_eq!(skipped.title, "A vs B");
        assert_eq!(skipped.line, 2);
        assert!(matches!(skipped.reason, SkipReason::Syntax(_)));
    }

    #[test]
    fn test_comment_between_tags_keeps_one_game() {
        let pgn = "[Event \"Club\"]\n{annotator note}\n[White \"A\"]\n\n1. e4 e5 *";
        let collection = parse_all(pgn).unwrap();
        assert_eq!(collection.games.len(), 1);
        let game = &collection.games[0];
        assert_eq!(game.event(), "Club");
        assert_eq!(game.white(), "A");
        assert_eq!(game.len(), 2);
        assert_eq!(game.nodes()[0].comment, "annotator note");
    }

    #[test]
    fn test_nag_in_tag_section_keeps_one_game() {
        let pgn = "[Event \"Club\"]\n$14\n[White \"A\"]\n\n1. e4 *";
        let collection = parse_all(pgn).unwrap();
        assert_eq!(collection.games.len(), 1);
        assert_eq!(collection.games[0].event(), "Club");
        assert_eq!(collection.games[0].nodes()[0].nags.as_slice(), &[14]);
    }

    #[test]
    fn test_unclosed_variation_skips_only_that_game() {
        let pgn = "1. e4 (1. d4 *\n\n1. c4 c5 *\n";
        let collection = parse_all(pgn).unwrap();
        assert_eq!(collection.games.len(), 1);
        let sans: Vec<_> = collection.games[0]
            .nodes()
            .iter()
            .map(|n| n.san.as_str())
            .collect();
        assert_eq!(sans, vec!["c4", "c5"]);
        assert_eq!(collection.skipped.len(), 1);
        let skipped = &collection.skipped[0];
        assert_eq!(skipped.ordinal, 1);
        assert!(matches!(&skipped.reason, SkipReason::Syntax(text) if text == "unclosed variation"));
    }

    #[test]
    fn test_unclosed_variation_at_end_of_input() {
        let pgn = "1. d4 *\n\n[White \"Cut\"]\n\n1. e4 (1. c4";
        let collection = parse_all(pgn).unwrap();
        assert_eq!(collection.games.len(), 1);
        let skipped = &collection.skipped[0];
        assert_eq!(skipped.title, "Cut vs ?");
        assert_eq!(skipped.line, 5);
        assert!(matches!(&skipped.reason, SkipReason::Syntax(text) if text == "unclosed variation"));
    }

    #[test]
    fn test_glyph_before_check_marker_is_kept() {
        let collection = parse_all("1. e4 e5 2. Qh5!+ Nc6 *\n\n1. e4!!! *").unwrap();
        let game = &collection.games[0];
        let queen = &game.nodes()[2];
        assert_eq!(queen.san, "Qh5+");
        assert_eq!(queen.nags.as_slice(), &[1]);
        assert_eq!(game.len(), 4);

        assert_eq!(collection.skipped.len(), 1);
        assert!(matches!(&collection.skipped[0].reason, SkipReason::Syntax(text) if text == "!!!"));
    }

    #[test]
    fn test_bad_fen_skips_game() {
        let pgn = "[FEN \"not a fen\"]\n\n1. e4 *\n\n1. d4 *";
        let collection = parse_all(pgn).unwrap();
        assert_eq!(collection.games.len(), 1);
        assert!(matches!(collection.skipped[0].reason, SkipReason::Fen(_)));
    }

    #[test]
    fn test_fen_header_sets_initial_position() {
        let pgn = "[SetUp \"1\"]\n[FEN \"4k3/P7/8/8/8/8/8/4K3 w - - 0 60\"]\n\n60. a8=Q+ Kd7 *";
        let game = &parse_all(pgn).unwrap().games[0];
        assert_eq!(game.initial_board().fullmove_number(), 60);
        let board = game.board_after(2);
        assert_eq!(
            board.piece_at(sq("a8")),
            Some(Piece::new(PieceKind::Queen, PieceColor::White))
        );
        assert_eq!(game.nodes()[1].move_number, 60);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            parse_all(""),
            Err(PgnError::EmptyInput { skipped: 0 })
        ));
        assert!(matches!(
            parse_all("  \n{just a comment}\n"),
            Err(PgnError::EmptyInput { skipped: 0 })
        ));
        assert!(matches!(
            parse_all("1. e5 *"),
            Err(PgnError::EmptyInput { skipped: 1 })
        ));
    }

    #[test]
    fn test_header_only_game_is_kept() {
        let collection = parse_all("[Event \"Adjourned\"]\n\n*").unwrap();
        assert_eq!(collection.games.len(), 1);
        assert!(collection.games[0].is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("games.pgn");
        std::fs::write(&path, "[White \"File\"]\n\n1. e4 e5 1-0\n").unwrap();
        let collection = load_from_file(&path).unwrap();
        assert_eq!(collection.games[0].white(), "File");
        assert_eq!(collection.games[0].result(), GameResult::WhiteWins);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_from_file(dir.path().join("absent.pgn")).unwrap_err();
        assert!(matches!(err, PgnError::Io { .. }));
    }
}

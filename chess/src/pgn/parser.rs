use cozy_chess::Move;
use std::io::BufRead;

use super::game::PgnGame;
use super::san::SanError;
use super::stream::PgnStream;
use crate::board::{Board, BoardError};
use crate::fen::FenError;
use crate::result::GameResult;
use crate::variant::VariantError;

/// One lexical item of PGN text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PgnItem {
    Tag { key: String, value: String },
    Move(Move),
    MoveNumber(u32),
    Nag(u8),
    /// `;` line comment or a `{...}` / `(...)` block. Variations are read
    /// as comments.
    Comment(String),
    /// Termination marker.
    Result(GameResult),
    /// Nothing left before the end of the line or stream.
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum PgnError {
    #[error("line {line}: malformed tag: [{tag}]")]
    MalformedTag { line: usize, tag: String },
    #[error("line {line}: {source}")]
    UnknownVariant {
        line: usize,
        #[source]
        source: VariantError,
    },
    #[error("line {line}: invalid FEN \"{fen}\": {source}")]
    InvalidFen {
        line: usize,
        fen: String,
        #[source]
        source: FenError,
    },
    #[error("line {line}: illegal move {san}: {source}")]
    IllegalMove {
        line: usize,
        san: String,
        #[source]
        source: SanError,
    },
    #[error("line {line}: invalid NAG: ${nag}")]
    InvalidNag { line: usize, nag: String },
    #[error("line {line}: moves before any tag")]
    MovesBeforeTags { line: usize },
    #[error("line {line}: no termination marker before the next game")]
    TagAfterMoves { line: usize },
    /// The recorded moves do not replay from the starting position.
    #[error("Cannot replay game: {0}")]
    Replay(#[from] BoardError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PgnError {
    /// Line the error was detected on, if it came from parsing.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MalformedTag { line, .. }
            | Self::UnknownVariant { line, .. }
            | Self::InvalidFen { line, .. }
            | Self::IllegalMove { line, .. }
            | Self::InvalidNag { line, .. }
            | Self::MovesBeforeTags { line }
            | Self::TagAfterMoves { line } => Some(*line),
            Self::Replay(_) | Self::Io(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemKind {
    Tag,
    Move,
    MoveNumber,
    Nag,
    Comment,
}

impl PgnGame {
    /// Read one game from `stream`, playing its moves on `board`.
    ///
    /// Reading stops at the termination marker, at the end of the stream,
    /// at the first error, or once `max_moves` moves have been read. An
    /// error does not discard the moves read so far; it is kept in
    /// [`error`](Self::error) and the stream is left where the next game
    /// can be found.
    pub fn read<R: BufRead>(stream: &mut PgnStream<R>, board: &mut Board, max_moves: usize) -> Self {
        let variant = stream.variant();
        board.set_variant(variant);
        let mut game = Self {
            variant,
            is_random_variant: variant.is_random(),
            ..Self::default()
        };

        while stream.status().is_ok() {
            // Past the cap only a termination marker or annotations may follow
            let at_cap = !game.moves.is_empty() && game.moves.len() >= max_moves;
            match game.read_item(stream, board) {
                Ok(PgnItem::Tag { .. }) => game.has_tags = true,
                Ok(PgnItem::Result(_)) => break,
                Ok(PgnItem::Empty) => {
                    if game.has_tags {
                        tracing::debug!(
                            line = stream.line_number(),
                            moves = game.moves.len(),
                            "Empty line ended the game"
                        );
                    }
                    break;
                }
                Ok(PgnItem::Move(_)) if at_cap || max_moves == 0 => {
                    // The board is scratch space, only the move list is kept
                    game.moves.pop();
                    game.truncated = true;
                    break;
                }
                Ok(_) => {}
                Err(err) if at_cap && !matches!(err, PgnError::TagAfterMoves { .. }) => {
                    tracing::debug!(line = stream.line_number(), "Ignoring error past the move cap: {}", err);
                    game.truncated = true;
                    break;
                }
                Err(err) => {
                    tracing::debug!(line = stream.line_number(), "PGN error: {}", err);
                    game.error = Some(err);
                    break;
                }
            }
        }

        if let Some(err) = stream.take_error() {
            game.error.get_or_insert(PgnError::Io(err));
        }
        game
    }

    /// Read the next item from `stream` and apply it to this game.
    ///
    /// Until the first tag has been read everything except `[` is skipped.
    /// A `[` after the first move is not consumed: it most likely opens the
    /// next game, so it is pushed back and [`PgnError::TagAfterMoves`]
    /// returned.
    pub fn read_item<R: BufRead>(
        &mut self,
        stream: &mut PgnStream<R>,
        board: &mut Board,
    ) -> Result<PgnItem, PgnError> {
        stream.skip_white_space();

        let mut line = stream.line_number();
        let mut kind = ItemKind::Move;
        let mut opening: Option<char> = None;
        let mut closing: Option<char> = None;
        let mut level = 0i32;
        let mut text = String::new();

        while stream.status().is_ok() {
            let Some(c) = stream.read_char() else {
                break;
            };
            if !self.has_tags && kind != ItemKind::Tag && c != '[' {
                continue;
            }
            if (c == '\n' || c == '\r') && kind != ItemKind::Comment {
                break;
            }

            if opening.is_none() {
                if text.is_empty() {
                    line = stream.line_number();
                    match c {
                        ';' => {
                            kind = ItemKind::Comment;
                            text = stream.read_line();
                            break;
                        }
                        // Escape: the rest of the line is ignored
                        '%' => {
                            stream.read_line();
                            continue;
                        }
                        '.' => {
                            stream.skip_white_space();
                            continue;
                        }
                        '$' => {
                            kind = ItemKind::Nag;
                            continue;
                        }
                        c if c.is_ascii_digit() && kind == ItemKind::Move => {
                            kind = ItemKind::MoveNumber;
                        }
                        _ => {}
                    }
                }

                match c {
                    '[' => {
                        if !self.moves.is_empty() {
                            stream.rewind_char();
                            return Err(PgnError::TagAfterMoves {
                                line: stream.line_number(),
                            });
                        }
                        kind = ItemKind::Tag;
                        closing = Some(']');
                    }
                    '(' => {
                        kind = ItemKind::Comment;
                        closing = Some(')');
                    }
                    '{' => {
                        kind = ItemKind::Comment;
                        closing = Some('}');
                    }
                    _ => {}
                }
                if closing.is_some() {
                    opening = Some(c);
                }
            }

            if Some(c) == opening {
                level += 1;
            } else if Some(c) == closing {
                level -= 1;
                if level <= 0 {
                    break;
                }
            } else if matches!(kind, ItemKind::Move | ItemKind::Nag) && c.is_whitespace() {
                break;
            } else if kind == ItemKind::MoveNumber && (c.is_whitespace() || c == '.') {
                break;
            } else {
                text.push(c);
            }
        }

        let text = text.trim();

        match kind {
            ItemKind::Move | ItemKind::MoveNumber if text.is_empty() => Ok(PgnItem::Empty),
            ItemKind::Move | ItemKind::MoveNumber => {
                if let Ok(marker) = text.parse::<GameResult>() {
                    self.apply_termination_marker(marker, line);
                    return Ok(PgnItem::Result(marker));
                }
                match text.parse::<u32>() {
                    Ok(number) if kind == ItemKind::MoveNumber => Ok(PgnItem::MoveNumber(number)),
                    // Digit-led tokens such as "0-0" are moves
                    _ => self.read_move(text, board, line),
                }
            }
            ItemKind::Tag => self.read_tag(text, board, line),
            ItemKind::Nag => match text.parse::<u8>() {
                Ok(nag) => Ok(PgnItem::Nag(nag)),
                Err(_) => Err(PgnError::InvalidNag {
                    line,
                    nag: text.to_string(),
                }),
            },
            ItemKind::Comment => Ok(PgnItem::Comment(text.to_string())),
        }
    }

    fn apply_termination_marker(&mut self, marker: GameResult, line: usize) {
        match self.result_tag {
            Some(tag) if tag != marker => tracing::warn!(
                line,
                tag = %tag,
                marker = %marker,
                "Termination marker differs from the Result tag, keeping the tag"
            ),
            Some(_) => {}
            None => self.result = marker,
        }
    }

    fn read_tag(&mut self, text: &str, board: &mut Board, line: usize) -> Result<PgnItem, PgnError> {
        let (key, raw_value) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        if key.is_empty() || key.contains('"') {
            return Err(PgnError::MalformedTag {
                line,
                tag: text.to_string(),
            });
        }
        let value = unquote(raw_value);

        match key {
            "White" => self.white = value.clone(),
            "Black" => self.black = value.clone(),
            "Result" => match value.parse::<GameResult>() {
                Ok(result) => {
                    self.result = result;
                    self.result_tag = Some(result);
                }
                Err(err) => {
                    tracing::warn!(line, "{}", err);
                    self.result = GameResult::Unknown;
                }
            },
            "Variant" => {
                let variant = value
                    .parse()
                    .map_err(|source| PgnError::UnknownVariant { line, source })?;
                self.variant = variant;
                self.is_random_variant = variant.is_random();
                board.set_variant(variant);
                // Changing the variant resets the board
                if !self.fen.is_empty() {
                    board
                        .set_board(&self.fen)
                        .map_err(|source| PgnError::InvalidFen {
                            line,
                            fen: self.fen.clone(),
                            source,
                        })?;
                }
            }
            "FEN" => {
                board.set_board(&value).map_err(|source| PgnError::InvalidFen {
                    line,
                    fen: value.clone(),
                    source,
                })?;
                self.fen = value.trim().to_string();
            }
            "Round" => self.round = value.trim().parse().unwrap_or(0),
            _ => tracing::trace!(line, key, "Ignoring tag"),
        }

        Ok(PgnItem::Tag {
            key: key.to_string(),
            value,
        })
    }

    fn read_move(&mut self, san: &str, board: &mut Board, line: usize) -> Result<PgnItem, PgnError> {
        if !self.has_tags {
            return Err(PgnError::MovesBeforeTags { line });
        }

        if self.fen.is_empty() {
            let fen = board.variant().starting_fen();
            board.set_board(fen).map_err(|source| PgnError::InvalidFen {
                line,
                fen: fen.to_string(),
                source,
            })?;
            self.fen = fen.to_string();
        }

        let illegal = |source| PgnError::IllegalMove {
            line,
            san: san.to_string(),
            source,
        };
        let mv = board.move_from_string(san).map_err(illegal)?;
        board
            .make_move(mv)
            .map_err(|_| illegal(SanError::NoLegalMove(san.to_string())))?;
        self.moves.push(mv);
        Ok(PgnItem::Move(mv))
    }
}

/// Strip the enclosing quotes of a tag value and undo `\"` / `\\` escapes.
/// A value without quotes is taken as is.
fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    let inner = trimmed.strip_prefix('"').unwrap_or(trimmed);
    let inner = inner.strip_suffix('"').unwrap_or(inner);

    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next @ ('"' | '\\')) => value.push(next),
                Some(next) => {
                    value.push(c);
                    value.push(next);
                }
                None => value.push(c),
            }
        } else {
            value.push(c);
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::{Variant, STANDARD_START_FEN};
    use proptest::prelude::*;

    fn items(text: &str) -> (PgnGame, Vec<Result<PgnItem, PgnError>>) {
        let mut stream = PgnStream::from_text(text);
        let mut board = Board::default();
        let mut game = PgnGame {
            has_tags: true,
            ..PgnGame::default()
        };
        let mut out = Vec::new();
        while stream.status().is_ok() {
            let item = game.read_item(&mut stream, &mut board);
            let stop = item.is_err();
            out.push(item);
            if stop {
                break;
            }
        }
        (game, out)
    }

    fn read(text: &str) -> PgnGame {
        let mut stream = PgnStream::from_text(text);
        let mut board = Board::default();
        PgnGame::read(&mut stream, &mut board, usize::MAX)
    }

    #[test]
    fn test_classifies_movetext_items() {
        let (game, out) = items("1. e4 $1 {best by test} e5 ; open game\n2. Nf3 (2. f4) *");
        let out: Vec<PgnItem> = out.into_iter().map(Result::unwrap).collect();

        assert_eq!(out[0], PgnItem::MoveNumber(1));
        assert!(matches!(out[1], PgnItem::Move(_)));
        assert_eq!(out[2], PgnItem::Nag(1));
        assert_eq!(out[3], PgnItem::Comment("best by test".to_string()));
        assert!(matches!(out[4], PgnItem::Move(_)));
        assert_eq!(out[5], PgnItem::Comment("open game".to_string()));
        assert_eq!(out[6], PgnItem::MoveNumber(2));
        assert!(matches!(out[7], PgnItem::Move(_)));
        assert_eq!(out[8], PgnItem::Comment("2. f4".to_string()));
        assert_eq!(out[9], PgnItem::Result(GameResult::Unknown));
        assert_eq!(game.moves().len(), 3);
        assert_eq!(game.starting_fen(), STANDARD_START_FEN);
    }

    #[test]
    fn test_black_move_number_continuation() {
        let (game, out) = items("1. e4 1... e5 2. Nf3");
        assert_eq!(out[2].as_ref().unwrap(), &PgnItem::MoveNumber(1));
        assert!(out.iter().all(Result::is_ok));
        assert_eq!(game.moves().len(), 3);
    }

    #[test]
    fn test_nested_brackets_are_balanced() {
        let (_, out) = items("{outer {inner} tail} (1. d4 (1. c4) d5)");
        assert_eq!(
            out[0].as_ref().unwrap(),
            &PgnItem::Comment("outer inner tail".to_string())
        );
        assert_eq!(
            out[1].as_ref().unwrap(),
            &PgnItem::Comment("1. d4 1. c4 d5".to_string())
        );
    }

    #[test]
    fn test_multiline_brace_comment() {
        let (_, out) = items("{first line\nsecond line} e4");
        assert_eq!(
            out[0].as_ref().unwrap(),
            &PgnItem::Comment("first line\nsecond line".to_string())
        );
        assert!(matches!(out[1], Ok(PgnItem::Move(_))));
    }

    #[test]
    fn test_empty_comment_is_not_empty_item() {
        let (_, out) = items("{} e4");
        assert_eq!(out[0].as_ref().unwrap(), &PgnItem::Comment(String::new()));
        assert!(matches!(out[1], Ok(PgnItem::Move(_))));
    }

    #[test]
    fn test_escape_line_is_skipped() {
        let (_, out) = items("%engine output\ne4");
        assert!(matches!(out[0], Ok(PgnItem::Move(_))));
    }

    #[test]
    fn test_castling_with_zeros_is_a_move() {
        let (game, out) = items("1. e4 e5 2. Nf3 Nc6 3. Bc4 Bc5 4. 0-0");
        assert!(out.iter().all(Result::is_ok));
        assert_eq!(game.moves().len(), 7);
    }

    #[test]
    fn test_invalid_nag() {
        let (_, out) = items("e4 $300");
        assert!(matches!(
            out.last(),
            Some(Err(PgnError::InvalidNag { nag, .. })) if nag == "300"
        ));
    }

    #[test]
    fn test_illegal_move() {
        let (game, out) = items("1. e4 e4");
        assert!(matches!(
            out.last(),
            Some(Err(PgnError::IllegalMove { san, .. })) if san == "e4"
        ));
        assert_eq!(game.moves().len(), 1);
    }

    #[test]
    fn test_tag_after_moves_is_rewound() {
        let mut stream = PgnStream::from_text("e4 [White \"X\"]");
        let mut board = Board::default();
        let mut game = PgnGame {
            has_tags: true,
            ..PgnGame::default()
        };
        assert!(matches!(game.read_item(&mut stream, &mut board), Ok(PgnItem::Move(_))));
        assert!(matches!(
            game.read_item(&mut stream, &mut board),
            Err(PgnError::TagAfterMoves { line: 1 })
        ));
        assert_eq!(stream.read_char(), Some('['));
    }

    #[test]
    fn test_tag_values() {
        let game = read(
            "[White \"Doe, \\\"JD\\\" John\"]\n[Black Smith]\n[Round \"3\"]\n[Event \"?\"]\n*",
        );
        assert_eq!(game.white_player(), "Doe, \"JD\" John");
        assert_eq!(game.black_player(), "Smith");
        assert_eq!(game.round(), 3);
        assert!(game.error().is_none());
    }

    #[test]
    fn test_non_numeric_round_is_ignored() {
        let game = read("[Round \"?\"]\n*");
        assert_eq!(game.round(), 0);
    }

    #[test]
    fn test_malformed_tag() {
        let game = read("[]\n");
        assert!(matches!(game.error(), Some(PgnError::MalformedTag { .. })));
    }

    #[test]
    fn test_unknown_variant() {
        let game = read("[Variant \"bughouse\"]\n*");
        assert!(matches!(game.error(), Some(PgnError::UnknownVariant { .. })));
    }

    #[test]
    fn test_invalid_fen() {
        let game = read("[FEN \"8/8/8 w\"]\n*");
        assert!(matches!(
            game.error(),
            Some(PgnError::InvalidFen { line: 1, .. })
        ));
    }

    #[test]
    fn test_variant_after_fen_keeps_position() {
        let fen = "8/8/8/8/8/8/4K2k/8 b - - 0 1";
        let game = read(&format!(
            "[FEN \"{}\"]\n[Variant \"Fischerandom\"]\n1... Kg1 *",
            fen
        ));
        assert!(game.error().is_none(), "{:?}", game.error());
        assert_eq!(game.variant(), Variant::Fischerandom);
        assert!(game.is_random_variant());
        assert_eq!(game.starting_fen(), fen);
        assert_eq!(game.moves().len(), 1);
    }

    #[test]
    fn test_junk_before_first_tag_is_skipped() {
        let game = read("garbage 1. e4 {x}\n[White \"A\"]\n1. d4 *");
        assert_eq!(game.white_player(), "A");
        assert_eq!(game.moves().len(), 1);
        assert!(game.error().is_none());
    }

    #[test]
    fn test_moves_before_tags_rejected() {
        let mut stream = PgnStream::from_text("[e4");
        let mut board = Board::default();
        let mut game = PgnGame::default();
        // The bracket opens a tag, so the token never reaches move parsing
        assert!(matches!(
            game.read_item(&mut stream, &mut board),
            Ok(PgnItem::Tag { .. })
        ));
        assert!(matches!(
            game.read_move("e4", &mut board, 1),
            Err(PgnError::MovesBeforeTags { line: 1 })
        ));
    }

    #[test]
    fn test_marker_conflicting_with_tag_keeps_tag() {
        let game = read("[Result \"1-0\"]\n1. e4 0-1");
        assert_eq!(game.result(), GameResult::WhiteWins);
    }

    #[test]
    fn test_marker_without_tag_sets_result() {
        let game = read("[White \"A\"]\n1. e4 1/2-1/2");
        assert_eq!(game.result(), GameResult::Draw);
    }

    #[test]
    fn test_invalid_result_tag_is_unknown() {
        let game = read("[Result \"2-0\"]\n1. e4");
        assert_eq!(game.result(), GameResult::Unknown);
        assert!(game.error().is_none());
    }

    #[test]
    fn test_max_moves_truncates() {
        let mut stream = PgnStream::from_text("[White \"A\"]\n1. e4 e5 2. Nf3 Nc6 *");
        let mut board = Board::default();
        let game = PgnGame::read(&mut stream, &mut board, 2);
        assert_eq!(game.moves().len(), 2);
        assert!(game.is_truncated());

        let game = read("[White \"A\"]\n1. e4 e5 *");
        assert!(!game.is_truncated());
    }

    #[test]
    fn test_game_filling_the_cap_keeps_its_marker() {
        let mut stream = PgnStream::from_text("[White \"A\"]\n1. e4 e5 {done} 1-0\n[White \"B\"]");
        let mut board = Board::default();
        let game = PgnGame::read(&mut stream, &mut board, 2);
        assert_eq!(game.moves().len(), 2);
        assert!(!game.is_truncated());
        assert_eq!(game.result(), GameResult::WhiteWins);
        assert!(game.error().is_none());
    }

    #[test]
    fn test_illegal_move_past_the_cap_is_truncation() {
        let mut stream = PgnStream::from_text("[White \"A\"]\n1. e4 e5 2. Ke3 *");
        let mut board = Board::default();
        let game = PgnGame::read(&mut stream, &mut board, 2);
        assert!(game.is_truncated());
        assert!(game.error().is_none());
    }

    #[test]
    fn test_error_line_is_where_the_token_starts() {
        let game = read("[White \"A\"]\n1. e4 e4\n2. d4 *");
        assert!(matches!(game.error(), Some(PgnError::IllegalMove { line: 2, .. })));

        let game = read("junk\n\n[FEN \"8/8 w\"]\n*");
        assert!(matches!(game.error(), Some(PgnError::InvalidFen { line: 3, .. })));
    }

    #[test]
    fn test_escape_line_then_blank_line_ends_game() {
        let game = read("[White \"A\"]\n%note\n\n1. e4 e5 *");
        assert!(game.has_tags());
        assert!(game.moves().is_empty());
        assert!(game.error().is_none());
    }

    #[test]
    fn test_io_error_is_reported() {
        struct Broken;
        impl std::io::Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk on fire"))
            }
        }

        let mut stream = PgnStream::new(std::io::BufReader::new(Broken));
        let mut board = Board::default();
        let game = PgnGame::read(&mut stream, &mut board, usize::MAX);
        assert!(matches!(game.error(), Some(PgnError::Io(_))));
        assert_eq!(game.error().and_then(PgnError::line), None);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"plain\""), "plain");
        assert_eq!(unquote("  bare "), "bare");
        assert_eq!(unquote("\"back\\\\slash\""), "back\\slash");
        assert_eq!(unquote("\"unterminated"), "unterminated");
    }

    proptest! {
        #[test]
        fn prop_read_item_always_terminates(text in "[ -~\\n]{0,80}") {
            let mut stream = PgnStream::from_text(format!("[White \"A\"]\n{}", text));
            let mut board = Board::default();
            let game = PgnGame::read(&mut stream, &mut board, usize::MAX);
            prop_assert!(game.has_tags());
        }

        #[test]
        fn prop_result_markers_are_never_moves(
            marker in prop::sample::select(vec!["1-0", "0-1", "1/2-1/2", "*"]),
            number in 1u32..200,
        ) {
            let (game, out) = items(&format!("{}. {}", number, marker));
            let out: Vec<PgnItem> = out.into_iter().map(Result::unwrap).collect();
            prop_assert_eq!(&out[0], &PgnItem::MoveNumber(number));
            prop_assert!(matches!(out[1], PgnItem::Result(_)));
            prop_assert!(game.moves().is_empty());
        }
    }
}

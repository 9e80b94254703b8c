use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use super::game::PgnGame;
use super::parser::PgnError;
use super::stream::PgnStream;
use crate::board::Board;
use crate::result::GameResult;
use crate::variant::Variant;

/// Iterator over the games of a PGN source.
///
/// Games that stopped on an error are still yielded with whatever was read
/// before the error; check [`PgnGame::error`] to tell them apart.
pub struct PgnReader<R> {
    stream: PgnStream<R>,
    board: Board,
    max_moves: usize,
}

impl<R: BufRead> PgnReader<R> {
    pub fn new(reader: R) -> Self {
        Self::from_stream(PgnStream::new(reader))
    }

    pub fn from_stream(stream: PgnStream<R>) -> Self {
        Self {
            stream,
            board: Board::default(),
            max_moves: usize::MAX,
        }
    }

    /// Variant for games without a `Variant` tag.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.stream.set_variant(variant);
        self
    }

    /// Stop reading a game's moves after `max_moves`.
    pub fn with_max_moves(mut self, max_moves: usize) -> Self {
        self.max_moves = max_moves;
        self
    }

    pub fn line_number(&self) -> usize {
        self.stream.line_number()
    }
}

impl PgnReader<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::from_stream(PgnStream::open(path)?))
    }
}

impl PgnReader<io::Cursor<String>> {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_stream(PgnStream::from_text(text))
    }
}

impl<R: BufRead> Iterator for PgnReader<R> {
    type Item = PgnGame;

    fn next(&mut self) -> Option<PgnGame> {
        if self.max_moves == 0 {
            return None;
        }
        while self.stream.status().is_ok() {
            let game = PgnGame::read(&mut self.stream, &mut self.board, self.max_moves);
            let broken_tags = game.error().is_some_and(is_tag_error) && game.moves().is_empty();
            if broken_tags {
                // The record's remaining tags must not start a game of their own
                skip_rest_of_record(&mut self.stream);
            }
            if game.has_tags() || broken_tags {
                return Some(game);
            }
            if let Some(err) = game.error() {
                tracing::debug!("Skipping PGN fragment without tags: {}", err);
            }
        }
        None
    }
}

fn is_tag_error(err: &PgnError) -> bool {
    matches!(
        err,
        PgnError::MalformedTag { .. } | PgnError::UnknownVariant { .. } | PgnError::InvalidFen { .. }
    )
}

/// Skip to the first tag that follows a blank line or a termination marker.
fn skip_rest_of_record<R: BufRead>(stream: &mut PgnStream<R>) {
    let mut record_ended = !stream.at_line_start() && has_termination_marker(&stream.read_line());

    while stream.status().is_ok() {
        let first = loop {
            match stream.read_char() {
                Some(' ' | '\t' | '\r') => continue,
                other => break other,
            }
        };
        match first {
            None => break,
            Some('\n') => record_ended = true,
            Some('[') if record_ended => {
                stream.rewind_char();
                break;
            }
            Some(c) => {
                let line = format!("{}{}", c, stream.read_line());
                record_ended |= has_termination_marker(&line);
            }
        }
    }
    tracing::debug!(line = stream.line_number(), "Skipped the rest of a broken PGN record");
}

fn has_termination_marker(line: &str) -> bool {
    line.split_whitespace()
        .any(|token| token.parse::<GameResult>().is_ok())
}

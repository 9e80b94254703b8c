use chrono::{Local, NaiveDate};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::game::PgnGame;
use super::parser::PgnError;
use crate::board::{Board, BoardError};
use crate::types::Side;
use crate::variant::Variant;

/// Half-moves per line of movetext.
const HALF_MOVES_PER_LINE: usize = 8;

impl PgnGame {
    /// Append this game to the PGN file at `path`, dated today.
    ///
    /// Does nothing for a game without tags.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), PgnError> {
        if !self.has_tags {
            return Ok(());
        }

        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut out = BufWriter::new(file);
        self.write_to(&mut out, Local::now().date_naive())?;
        out.flush()?;

        tracing::debug!(path = %path.display(), moves = self.moves.len(), "Wrote PGN game");
        Ok(())
    }

    /// Render this game as a PGN record with the given `Date` tag.
    pub fn write_to<W: Write>(&self, out: &mut W, date: NaiveDate) -> Result<(), PgnError> {
        if !self.has_tags {
            return Ok(());
        }

        let default_fen = self.variant.starting_fen();
        let fen = if self.fen.is_empty() {
            default_fen
        } else {
            self.fen.as_str()
        };

        write_tag(out, "Date", &date.format("%Y.%m.%d").to_string())?;
        if self.round > 0 {
            write_tag(out, "Round", &self.round.to_string())?;
        }
        write_tag(out, "White", &self.white)?;
        write_tag(out, "Black", &self.black)?;
        write_tag(out, "Result", self.result.to_simple_string())?;
        if self.variant != Variant::Standard {
            write_tag(out, "Variant", self.variant.name())?;
        }
        if self.is_random_variant || fen != default_fen {
            write_tag(out, "FEN", fen)?;
        }

        writeln!(out)?;
        for line in self.movetext(fen)? {
            writeln!(out, "{}", line)?;
        }
        writeln!(out)?;
        Ok(())
    }

    /// SAN movetext split into lines, the last one ending with the
    /// termination marker.
    fn movetext(&self, fen: &str) -> Result<Vec<String>, PgnError> {
        let mut board = Board::new(self.variant);
        board.set_board(fen).map_err(BoardError::from)?;

        let mut lines = Vec::new();
        let mut tokens: Vec<String> = Vec::new();
        for (i, &mv) in self.moves.iter().enumerate() {
            if i > 0 && i % HALF_MOVES_PER_LINE == 0 {
                lines.push(tokens.join(" "));
                tokens.clear();
            }
            match board.side_to_move() {
                Side::White => tokens.push(format!("{}.", board.fullmove_number())),
                Side::Black if i == 0 => tokens.push(format!("{}...", board.fullmove_number())),
                Side::Black => {}
            }
            tokens.push(board.move_string(mv));
            board.make_move(mv)?;
        }
        tokens.push(self.result.to_simple_string().to_string());
        lines.push(tokens.join(" "));
        Ok(lines)
    }
}

fn write_tag<W: Write>(out: &mut W, key: &str, value: &str) -> std::io::Result<()> {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    writeln!(out, "[{} \"{}\"]", key, escaped)
}

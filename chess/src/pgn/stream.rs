use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::variant::Variant;

/// State of a [`PgnStream`] after its last read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Ok,
    EndOfStream,
    /// The underlying reader failed; the stream yields nothing further.
    Error,
}

impl StreamStatus {
    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// A character-level cursor over PGN text.
///
/// The stream is shared by successive game reads, so one reader can drain
/// a whole file game by game. It keeps a single-character rewind slot: after
/// [`rewind_char`](Self::rewind_char) the next read returns that character
/// again, exactly once.
pub struct PgnStream<R> {
    reader: R,
    buffer: Vec<char>,
    pos: usize,
    line_number: usize,
    last_char: Option<char>,
    rewound: Option<char>,
    status: StreamStatus,
    error: Option<io::Error>,
    variant: Variant,
}

impl<R: BufRead> PgnStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            pos: 0,
            line_number: 1,
            last_char: None,
            rewound: None,
            status: StreamStatus::Ok,
            error: None,
            variant: Variant::Standard,
        }
    }

    /// Set the variant assumed for games that carry no `Variant` tag.
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    pub fn set_variant(&mut self, variant: Variant) {
        self.variant = variant;
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    /// Take the I/O error that moved the stream into
    /// [`StreamStatus::Error`], if it has not been taken yet.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }

    /// 1-based number of the line the cursor is on.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Whether the next character read starts a new line.
    pub fn at_line_start(&self) -> bool {
        self.rewound.is_none() && matches!(self.last_char, None | Some('\n'))
    }

    /// Read the next character, or `None` once the stream is exhausted.
    pub fn read_char(&mut self) -> Option<char> {
        let c = match self.rewound.take() {
            Some(c) => c,
            None => self.next_buffered()?,
        };
        if c == '\n' {
            self.line_number += 1;
        }
        self.last_char = Some(c);
        Some(c)
    }

    /// Push the last character read back onto the stream. Only one
    /// character can be pending; a second rewind without a read in between
    /// does nothing.
    pub fn rewind_char(&mut self) {
        if let Some(c) = self.last_char.take() {
            if c == '\n' {
                self.line_number -= 1;
            }
            self.rewound = Some(c);
        }
    }

    /// Read up to and including the next newline. The returned line has no
    /// line terminator.
    pub fn read_line(&mut self) -> String {
        let mut line = String::new();
        while let Some(c) = self.read_char() {
            if c == '\n' {
                break;
            }
            line.push(c);
        }
        if line.ends_with('\r') {
            line.pop();
        }
        line
    }

    /// Consume whitespace up to the next significant character.
    pub fn skip_white_space(&mut self) {
        while let Some(c) = self.read_char() {
            if !c.is_whitespace() {
                self.rewind_char();
                break;
            }
        }
    }

    fn next_buffered(&mut self) -> Option<char> {
        while self.pos >= self.buffer.len() {
            if !self.status.is_ok() {
                return None;
            }
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    self.status = StreamStatus::EndOfStream;
                    return None;
                }
                Ok(_) => {
                    self.buffer = line.chars().collect();
                    self.pos = 0;
                }
                Err(e) => {
                    tracing::warn!(line = self.line_number, "Failed to read PGN input: {}", e);
                    self.status = StreamStatus::Error;
                    self.error = Some(e);
                    return None;
                }
            }
        }
        let c = self.buffer[self.pos];
        self.pos += 1;
        Some(c)
    }
}

impl PgnStream<BufReader<File>> {
    /// Open a PGN file for buffered reading.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl PgnStream<io::Cursor<String>> {
    /// Build a stream over owned PGN text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(io::Cursor::new(text.into()))
    }
}

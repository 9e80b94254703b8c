//! Portable Game Notation: reading games from a stream and writing them
//! back out.

mod game;
mod parser;
mod reader;
pub mod san;
mod stream;
mod writer;

pub use game::PgnGame;
pub use parser::{PgnError, PgnItem};
pub use reader::PgnReader;
pub use san::{format_san, parse_san, SanError};
pub use stream::{PgnStream, StreamStatus};

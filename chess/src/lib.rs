pub mod board;
pub mod converters;
pub mod fen;
pub mod pgn;
pub mod result;
pub mod time_control;
pub mod types;
pub mod uci;
pub mod variant;

pub use board::{Board, BoardError};
pub use converters::*;
pub use fen::FenError;
pub use pgn::{PgnError, PgnGame, PgnItem, PgnReader, PgnStream, SanError, StreamStatus};
pub use result::{GameResult, ResultParseError};
pub use time_control::{TimeControl, TimeControlError};
pub use types::{PieceKind, Side};
pub use uci::{convert_cozy_castling_to_uci, convert_uci_castling_to_cozy, format_uci_move};
pub use variant::{Variant, VariantError, STANDARD_START_FEN};

pub use cozy_chess::Move;

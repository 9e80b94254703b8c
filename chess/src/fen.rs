use cozy_chess::Board;

/// Parse a FEN string into a Board.
///
/// Both X-FEN (`KQkq`) and Shredder-FEN (`HAha`) castling fields are
/// accepted, so Fischer random positions parse the same way standard ones
/// do. A four-field EPD-style string gets default move counters.
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let mut parts: Vec<String> = fen.split_whitespace().map(str::to_string).collect();
    match parts.len() {
        0 => return Err(FenError::InvalidFormat),
        4 => parts.extend(["0".to_string(), "1".to_string()]),
        6 => {}
        n => return Err(FenError::InvalidFieldCount(n)),
    }
    let invalid = || FenError::InvalidPosition(fen.to_string());

    if let Ok(board) = parts.join(" ").parse() {
        return Ok(board);
    }

    // X-FEN with rooks off the corner files: name the rooks by file instead
    let castling = shredder_castling(&parts[0], &parts[2]).ok_or_else(invalid)?;
    if castling == parts[2] {
        return Err(invalid());
    }
    parts[2] = castling;
    Board::from_fen(&parts.join(" "), true).map_err(|_| invalid())
}

/// Rewrite the `KQkq` letters of an X-FEN castling field as the files of
/// the outermost rook on that side of the king. File letters and `-` are
/// kept as they are.
fn shredder_castling(placement: &str, castling: &str) -> Option<String> {
    let ranks: Vec<Vec<char>> = placement.split('/').map(expand_rank).collect();
    if ranks.len() != 8 {
        return None;
    }

    let mut out = String::with_capacity(castling.len());
    for c in castling.chars() {
        let (back_rank, king, rook) = match c {
            'K' | 'Q' => (&ranks[7], 'K', 'R'),
            'k' | 'q' => (&ranks[0], 'k', 'r'),
            _ => {
                out.push(c);
                continue;
            }
        };
        let king_file = back_rank.iter().position(|&p| p == king)?;
        let mut rooks = back_rank
            .iter()
            .enumerate()
            .filter(|&(_, &p)| p == rook)
            .map(|(file, _)| file);
        let rook_file = if c.eq_ignore_ascii_case(&'K') {
            rooks.filter(|&file| file > king_file).max()?
        } else {
            rooks.find(|&file| file < king_file)?
        };

        let letter = char::from(b'a' + u8::try_from(rook_file).ok()?);
        out.push(if c.is_ascii_uppercase() {
            letter.to_ascii_uppercase()
        } else {
            letter
        });
    }
    Some(out)
}

/// One FEN rank as eight squares, empty squares as `' '`.
fn expand_rank(rank: &str) -> Vec<char> {
    let mut squares = Vec::with_capacity(8);
    for c in rank.chars() {
        match c.to_digit(10) {
            Some(n) => squares.extend(std::iter::repeat(' ').take(n as usize)),
            None => squares.push(c),
        }
    }
    squares
}

/// Format a Board as a FEN string
pub fn format_fen(board: &Board) -> String {
    board.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format")]
    InvalidFormat,
    #[error("Expected 4 or 6 FEN fields, found {0}")]
    InvalidFieldCount(usize),
    #[error("Invalid FEN position: {0}")]
    InvalidPosition(String),
}
